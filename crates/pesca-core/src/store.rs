//! Read-only store contract.
//!
//! A backend receives the descriptors from [`crate::query`] and executes them
//! against its dataset. The service owns one store value per process; all
//! methods take `&self` and must be safe to call concurrently.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::domain::{DayQuote, RawPoint};
use crate::query::{SeriesQuery, SpeciesQuery, TradeFilter};

/// Failure raised by a backend executing a query descriptor. Propagated
/// unchanged to the boundary layer; the core performs no retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Query(String),
}

pub trait TradeStore {
    /// Grouped set-aggregate: de-duplicated species per group.
    ///
    /// For [`crate::query::GroupKey::PerMarket`] the map is keyed by market
    /// and holds one entry per market with at least one matching trade. For
    /// [`crate::query::GroupKey::AllMarkets`] the single surviving group is
    /// keyed [`crate::query::ALL_MARKETS`]. No matches yields an empty map.
    fn species_sets(
        &self,
        query: &SpeciesQuery,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, StoreError>;

    /// Filter-and-list over an exact-day filter, keyed by market.
    fn quotes_for_day(&self, filter: &TradeFilter) -> Result<BTreeMap<String, DayQuote>, StoreError>;

    /// Grouped list-aggregate: unordered (date, price, volume) tuples per
    /// market. Markets without a matching trade are absent; there is no
    /// combined cross-market bucket.
    fn point_groups(
        &self,
        query: &SeriesQuery,
    ) -> Result<BTreeMap<String, Vec<RawPoint>>, StoreError>;
}
