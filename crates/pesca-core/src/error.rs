use thiserror::Error;

/// Validation errors for request-supplied input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid date token '{value}', expected YYYY-M-D")]
    InvalidDateToken { value: String },

    #[error("'{value}' is not a calendar date")]
    InvalidCalendarDate { value: String },

    #[error("market cannot be empty")]
    EmptyMarket,
    #[error("species cannot be empty")]
    EmptySpecies,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}
