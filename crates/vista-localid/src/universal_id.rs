//! Vessel-scoped identifiers: an IMO number in front of a LocalId
//!
//! ```text
//! data.dnv.com/IMO<number>/dnv-v2/vis-<version>/...
//! ```

use std::fmt;
use std::str::FromStr;

use vista_core::VisVersion;

use crate::errors::{InvalidImoNumber, LocalIdError, ParsingState};
use crate::local_id::{LocalId, LocalIdBuilder};

/// Authority segment that opens every UniversalId.
pub const NAMING_ENTITY: &str = "data.dnv.com";
const IMO_PREFIX: &str = "IMO";

/// Seven-digit IMO ship identification number with a valid check digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImoNumber(u32);

impl ImoNumber {
    pub fn new(value: u32) -> Result<Self, InvalidImoNumber> {
        if Self::is_valid(value) {
            Ok(ImoNumber(value))
        } else {
            Err(InvalidImoNumber(value.to_string()))
        }
    }

    /// The last digit must equal the weighted sum of the first six, where
    /// weights run from 2 at the rightmost to 7 at the leftmost, modulo 10.
    pub fn is_valid(value: u32) -> bool {
        if !(1_000_000..=9_999_999).contains(&value) {
            return false;
        }
        let check: u32 = (1..7)
            .map(|position| {
                let digit = value / 10u32.pow(position) % 10;
                (position + 1) * digit
            })
            .sum();
        value % 10 == check % 10
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl FromStr for ImoNumber {
    type Err = InvalidImoNumber;

    /// Accepts the bare number or one prefixed with `IMO` in any case.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let digits = match text.get(..IMO_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(IMO_PREFIX) => &text[IMO_PREFIX.len()..],
            _ => text,
        };
        digits
            .parse::<u32>()
            .ok()
            .filter(|&value| Self::is_valid(value))
            .map(ImoNumber)
            .ok_or_else(|| InvalidImoNumber(text.to_string()))
    }
}

impl fmt::Display for ImoNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{IMO_PREFIX}{}", self.0)
    }
}

/// A LocalId bound to one vessel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniversalId<'g> {
    imo_number: ImoNumber,
    local_id: LocalId<'g>,
}

impl<'g> UniversalId<'g> {
    pub fn new(imo_number: ImoNumber, local_id: LocalId<'g>) -> Self {
        UniversalId { imo_number, local_id }
    }

    pub fn imo_number(&self) -> ImoNumber {
        self.imo_number
    }

    pub fn local_id(&self) -> &LocalId<'g> {
        &self.local_id
    }

    pub fn to_builder(&self) -> UniversalIdBuilder<'g> {
        UniversalIdBuilder {
            imo_number: Some(self.imo_number),
            local_id: self.local_id.to_builder(),
        }
    }
}

impl fmt::Display for UniversalId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NAMING_ENTITY}/{}{}", self.imo_number, self.local_id)
    }
}

/// Incrementally assembles a [`UniversalId`].
#[derive(Debug, Clone, Default)]
pub struct UniversalIdBuilder<'g> {
    imo_number: Option<ImoNumber>,
    local_id: LocalIdBuilder<'g>,
}

impl<'g> UniversalIdBuilder<'g> {
    pub fn create(version: VisVersion) -> Self {
        UniversalIdBuilder {
            imo_number: None,
            local_id: LocalIdBuilder::create(version),
        }
    }

    pub fn with_imo_number(mut self, imo_number: ImoNumber) -> Self {
        self.imo_number = Some(imo_number);
        self
    }

    pub fn without_imo_number(mut self) -> Self {
        self.imo_number = None;
        self
    }

    pub fn with_local_id(mut self, local_id: LocalIdBuilder<'g>) -> Self {
        self.local_id = local_id;
        self
    }

    pub fn imo_number(&self) -> Option<ImoNumber> {
        self.imo_number
    }

    pub fn local_id(&self) -> &LocalIdBuilder<'g> {
        &self.local_id
    }

    pub fn is_valid(&self) -> bool {
        self.imo_number.is_some() && self.local_id.is_valid()
    }

    pub fn build(self) -> Result<UniversalId<'g>, LocalIdError> {
        let imo_number = self
            .imo_number
            .ok_or_else(|| LocalIdError::predefined(ParsingState::ImoNumber))?;
        Ok(UniversalId::new(imo_number, self.local_id.build()?))
    }
}
