//! Request-level query service.
//!
//! One value of [`MarketQueries`] is shared by the whole process; the store
//! is injected at construction and all working data is request-local, so the
//! operations are safe to run concurrently without locking.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{DateRange, DayQuote, SeriesPoint, TradeDay};
use crate::query::{self, GroupKey, ALL_MARKETS};
use crate::series::{self, SeriesError};
use crate::store::{StoreError, TradeStore};

/// Top-level error for a query operation. Store failures pass through
/// unchanged; series errors mark a data-integrity violation in the store's
/// grouped rows.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Debug, Clone)]
pub struct MarketQueries<S> {
    store: S,
}

impl<S: TradeStore> MarketQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Species traded in `range`, keyed by market, plus the
    /// [`ALL_MARKETS`] pseudo-key holding the union over every market.
    ///
    /// A market absent from the result saw zero trades in the range. When
    /// nothing at all traded, the result is empty: no `"all"` key is
    /// synthesized.
    pub fn species_traded(
        &self,
        range: DateRange,
    ) -> Result<BTreeMap<String, Vec<String>>, QueryError> {
        let overall = self
            .store
            .species_sets(&query::species_in_range(range, GroupKey::AllMarkets))?;

        let mut result = BTreeMap::new();
        let Some(union) = overall.get(ALL_MARKETS) else {
            return Ok(result);
        };
        result.insert(ALL_MARKETS.to_owned(), union.iter().cloned().collect());

        let per_market = self
            .store
            .species_sets(&query::species_in_range(range, GroupKey::PerMarket))?;
        for (market, species) in per_market {
            result.insert(market, species.into_iter().collect());
        }
        Ok(result)
    }

    /// Price/volume for `species` on `day`, keyed by market. `market: None`
    /// returns every market with a matching record.
    pub fn quotes_on_day(
        &self,
        day: TradeDay,
        species: &str,
        market: Option<&str>,
    ) -> Result<BTreeMap<String, DayQuote>, QueryError> {
        let quotes = self
            .store
            .quotes_for_day(&query::quotes_on_day(day, species, market))?;
        Ok(quotes)
    }

    /// Dense daily price/volume series for `species` over `range`, one
    /// gap-free ascending sequence per market with at least one trade.
    pub fn price_series(
        &self,
        range: DateRange,
        species: &str,
        market: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<SeriesPoint>>, QueryError> {
        let groups = self
            .store
            .point_groups(&query::series_in_range(range, species, market))?;
        Ok(series::normalize_groups(range, groups)?)
    }
}
