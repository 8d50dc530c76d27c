//! Location qualifiers attached to path segments

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LocationError;

/// A validated location such as `1`, `P`, `2FIPU`.
///
/// Only [`Locations::parse`] and [`LocationBuilder::build`] create values,
/// so every `Location` has passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(String);

impl Location {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading number, if any.
    pub fn number(&self) -> Option<u32> {
        let digits: String = self.0.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    /// Letter codes after the number.
    pub fn codes(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().skip_while(char::is_ascii_digit)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mutually exclusive families of location codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocationGroup {
    Number,
    Side,
    Vertical,
    Transverse,
    Longitudinal,
}

impl LocationGroup {
    /// Group of a letter code. `H` and `V` belong to no group.
    pub fn of(code: char) -> Option<LocationGroup> {
        match code {
            'N' => Some(LocationGroup::Number),
            'P' | 'C' | 'S' => Some(LocationGroup::Side),
            'U' | 'M' | 'L' => Some(LocationGroup::Vertical),
            'I' | 'O' => Some(LocationGroup::Transverse),
            'F' | 'A' => Some(LocationGroup::Longitudinal),
            _ => None,
        }
    }
}

impl fmt::Display for LocationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocationGroup::Number => "Number",
            LocationGroup::Side => "Side",
            LocationGroup::Vertical => "Vertical",
            LocationGroup::Transverse => "Transverse",
            LocationGroup::Longitudinal => "Longitudinal",
        };
        f.write_str(name)
    }
}

/// One entry of a location rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeLocation {
    pub code: char,
    pub name: String,
    #[serde(default)]
    pub definition: Option<String>,
}

/// Serialized form of a location rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsDto {
    pub vis_release: String,
    pub items: Vec<RelativeLocation>,
}

const STANDARD_LOCATIONS: &[(char, &str)] = &[
    ('N', "Number"),
    ('P', "Port"),
    ('C', "Centre"),
    ('S', "Starboard"),
    ('U', "Upper"),
    ('M', "Middle"),
    ('L', "Lower"),
    ('I', "Inside"),
    ('O', "Outside"),
    ('F', "Forward"),
    ('A', "Aft"),
    ('H', "Horizontal"),
    ('V', "Vertical"),
];

/// The rule set locations are validated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    relative_locations: Vec<RelativeLocation>,
}

impl Default for Locations {
    /// The standard relative locations.
    fn default() -> Self {
        let relative_locations = STANDARD_LOCATIONS
            .iter()
            .map(|&(code, name)| RelativeLocation {
                code,
                name: name.to_string(),
                definition: None,
            })
            .collect();
        Locations { relative_locations }
    }
}

impl Locations {
    pub fn new(relative_locations: Vec<RelativeLocation>) -> Self {
        Locations { relative_locations }
    }

    pub fn from_dto(dto: &LocationsDto) -> Self {
        Self::new(dto.items.clone())
    }

    pub fn relative_locations(&self) -> &[RelativeLocation] {
        &self.relative_locations
    }

    fn is_known_code(&self, code: char) -> bool {
        code != 'N' && self.relative_locations.iter().any(|r| r.code == code)
    }

    /// Validate `text`: digits first, then known uppercase codes in
    /// alphabetical order with at most one code per group.
    pub fn parse(&self, text: &str) -> Result<Location, LocationError> {
        if text.trim().is_empty() {
            return Err(LocationError::Empty);
        }
        if text.chars().any(char::is_whitespace) {
            return Err(LocationError::Whitespace(text.to_string()));
        }

        let letters: Vec<char> = text.chars().filter(|c| !c.is_ascii_digit()).collect();
        if let Some(&code) = letters.iter().find(|&&c| !self.is_known_code(c)) {
            return Err(LocationError::InvalidCode {
                location: text.to_string(),
                code,
            });
        }

        let number_len = text.chars().take_while(char::is_ascii_digit).count();
        if text.chars().skip(number_len).any(|c| c.is_ascii_digit()) {
            return Err(LocationError::NumberNotLeading(text.to_string()));
        }

        if letters.windows(2).any(|w| w[0] > w[1]) {
            return Err(LocationError::NotSorted(text.to_string()));
        }

        let mut seen: Vec<(LocationGroup, char)> = Vec::new();
        for &code in &letters {
            let Some(group) = LocationGroup::of(code) else {
                continue;
            };
            if let Some(&(_, first)) = seen.iter().find(|(g, _)| *g == group) {
                return Err(LocationError::GroupConflict {
                    location: text.to_string(),
                    group,
                    first,
                    second: code,
                });
            }
            seen.push((group, code));
        }

        Ok(Location(text.to_string()))
    }

    pub fn is_valid(&self, text: &str) -> bool {
        self.parse(text).is_ok()
    }

    pub fn builder(&self) -> LocationBuilder<'_> {
        LocationBuilder {
            locations: self,
            number: None,
            side: None,
            vertical: None,
            transverse: None,
            longitudinal: None,
        }
    }
}

/// Composes a [`Location`] from its typed parts.
#[derive(Debug, Clone)]
pub struct LocationBuilder<'a> {
    locations: &'a Locations,
    number: Option<u32>,
    side: Option<char>,
    vertical: Option<char>,
    transverse: Option<char>,
    longitudinal: Option<char>,
}

impl<'a> LocationBuilder<'a> {
    pub fn with_number(mut self, number: i64) -> Result<Self, LocationError> {
        match u32::try_from(number) {
            Ok(n) if n >= 1 => {
                self.number = Some(n);
                Ok(self)
            }
            _ => Err(LocationError::InvalidNumber(number)),
        }
    }

    pub fn with_side(self, code: char) -> Result<Self, LocationError> {
        self.with_code(LocationGroup::Side, code)
    }

    pub fn with_vertical(self, code: char) -> Result<Self, LocationError> {
        self.with_code(LocationGroup::Vertical, code)
    }

    pub fn with_transverse(self, code: char) -> Result<Self, LocationError> {
        self.with_code(LocationGroup::Transverse, code)
    }

    pub fn with_longitudinal(self, code: char) -> Result<Self, LocationError> {
        self.with_code(LocationGroup::Longitudinal, code)
    }

    /// Set a number or a single letter code, routed by its group.
    pub fn with_value(self, value: &str) -> Result<Self, LocationError> {
        if let Ok(number) = value.parse::<i64>() {
            return self.with_number(number);
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => match LocationGroup::of(code) {
                Some(group) if group != LocationGroup::Number => self.with_code(group, code),
                _ => Err(LocationError::InvalidCode {
                    location: value.to_string(),
                    code,
                }),
            },
            _ => Err(LocationError::InvalidCode {
                location: value.to_string(),
                code: value.chars().next().unwrap_or(' '),
            }),
        }
    }

    fn with_code(mut self, group: LocationGroup, code: char) -> Result<Self, LocationError> {
        if LocationGroup::of(code) != Some(group) {
            return Err(LocationError::WrongGroup { code, group });
        }
        if !self.locations.is_known_code(code) {
            return Err(LocationError::InvalidCode {
                location: code.to_string(),
                code,
            });
        }
        let slot = match group {
            LocationGroup::Side => &mut self.side,
            LocationGroup::Vertical => &mut self.vertical,
            LocationGroup::Transverse => &mut self.transverse,
            LocationGroup::Longitudinal => &mut self.longitudinal,
            LocationGroup::Number => return Err(LocationError::WrongGroup { code, group }),
        };
        *slot = Some(code);
        Ok(self)
    }

    /// Render the parts as number first, then codes in alphabetical order.
    pub fn build(&self) -> Result<Location, LocationError> {
        let mut codes: Vec<char> = [self.side, self.vertical, self.transverse, self.longitudinal]
            .into_iter()
            .flatten()
            .collect();
        codes.sort_unstable();

        let mut text = self.number.map(|n| n.to_string()).unwrap_or_default();
        text.extend(codes);
        if text.is_empty() {
            return Err(LocationError::Empty);
        }
        Ok(Location(text))
    }
}
