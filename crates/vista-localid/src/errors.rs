//! Parsing stages and the errors collected while walking them

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage of the LocalId grammar an error belongs to.
///
/// Declaration order is the order in which the parser visits the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParsingState {
    NamingRule,
    VisVersion,
    PrimaryItem,
    SecondaryItem,
    ItemDescription,
    MetaQuantity,
    MetaContent,
    MetaCalculation,
    MetaState,
    MetaCommand,
    MetaType,
    MetaPosition,
    MetaDetail,
    EmptyState,
    Formatting,
    NamingEntity,
    ImoNumber,
}

impl ParsingState {
    /// Message used when an error is recorded without one.
    pub fn predefined_message(self) -> &'static str {
        match self {
            ParsingState::NamingRule => "Missing or invalid naming rule",
            ParsingState::VisVersion => "Missing or invalid vis version",
            ParsingState::PrimaryItem => "Missing or invalid primary item",
            ParsingState::SecondaryItem => "Invalid secondary item",
            ParsingState::ItemDescription => "Missing or invalid /meta prefix",
            ParsingState::MetaQuantity => "Invalid metadata tag: Quantity",
            ParsingState::MetaContent => "Invalid metadata tag: Content",
            ParsingState::MetaCalculation => "Invalid metadata tag: Calculation",
            ParsingState::MetaState => "Invalid metadata tag: State",
            ParsingState::MetaCommand => "Invalid metadata tag: Command",
            ParsingState::MetaType => "Invalid metadata tag: Type",
            ParsingState::MetaPosition => "Invalid metadata tag: Position",
            ParsingState::MetaDetail => "Invalid metadata tag: Detail",
            ParsingState::EmptyState => "Missing primary path or metadata",
            ParsingState::Formatting => "Invalid LocalId format",
            ParsingState::NamingEntity => "Missing or invalid naming entity",
            ParsingState::ImoNumber => "Missing or invalid IMO number",
        }
    }
}

impl fmt::Display for ParsingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Text that is not a valid IMO number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IMO number '{0}'")]
pub struct InvalidImoNumber(pub String);

/// A single LocalId failure: the stage it was found in and a description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{state}: {message}")]
pub struct LocalIdError {
    pub state: ParsingState,
    pub message: String,
}

impl LocalIdError {
    pub fn new(state: ParsingState, message: impl Into<String>) -> Self {
        LocalIdError {
            state,
            message: message.into(),
        }
    }

    /// Error carrying the stage's predefined message.
    pub fn predefined(state: ParsingState) -> Self {
        Self::new(state, state.predefined_message())
    }
}

/// Every error found while parsing one LocalId, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsingErrors {
    errors: Vec<LocalIdError>,
}

impl ParsingErrors {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_error_type(&self, state: ParsingState) -> bool {
        self.errors.iter().any(|e| e.state == state)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalIdError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&LocalIdError> {
        self.errors.first()
    }
}

impl fmt::Display for ParsingErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("Success");
        }
        f.write_str("Parsing errors:")?;
        for error in &self.errors {
            write!(f, "\n\t{} - {}", error.state, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParsingErrors {}

impl IntoIterator for ParsingErrors {
    type Item = LocalIdError;
    type IntoIter = std::vec::IntoIter<LocalIdError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl From<ParsingErrors> for LocalIdError {
    /// The first error decides the kind; the rest are summarised in the message.
    fn from(errors: ParsingErrors) -> Self {
        match errors.errors.as_slice() {
            [] => LocalIdError::predefined(ParsingState::EmptyState),
            [only] => only.clone(),
            [first, rest @ ..] => LocalIdError::new(
                first.state,
                format!("{} (and {} more)", first.message, rest.len()),
            ),
        }
    }
}

/// Accumulates errors while the parser keeps going.
#[derive(Debug, Default)]
pub struct LocalIdErrorCollector {
    errors: Vec<LocalIdError>,
}

impl LocalIdErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error with the stage's predefined message.
    pub fn add(&mut self, state: ParsingState) {
        self.errors.push(LocalIdError::predefined(state));
    }

    /// Record an error; a blank message falls back to the predefined one.
    pub fn add_with_message(&mut self, state: ParsingState, message: impl Into<String>) {
        let message = message.into();
        if message.trim().is_empty() {
            self.add(state);
        } else {
            self.errors.push(LocalIdError::new(state, message));
        }
    }

    pub fn push(&mut self, error: LocalIdError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn build(self) -> ParsingErrors {
        ParsingErrors {
            errors: self.errors,
        }
    }
}
