//! Core contracts for pesca.
//!
//! This crate contains:
//! - Calendar-day domain types and validation
//! - Store-agnostic query descriptors (filter + grouping specifications)
//! - The read-only store trait implemented by storage backends
//! - Series normalization (sparse grouped rows to dense daily series)
//! - The request-level query service composing the above

pub mod domain;
pub mod error;
pub mod query;
pub mod series;
pub mod service;
pub mod store;

pub use domain::{DateRange, DayQuote, Days, RawPoint, SeriesPoint, TradeDay, TradeRecord};
pub use error::ValidationError;
pub use query::{
    series_in_range, species_in_range, quotes_on_day, DateSelector, GroupKey, SeriesQuery,
    SpeciesQuery, TradeFilter, ALL_MARKETS,
};
pub use series::SeriesError;
pub use service::{MarketQueries, QueryError};
pub use store::{StoreError, TradeStore};
