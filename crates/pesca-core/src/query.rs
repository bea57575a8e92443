//! Store-agnostic query descriptors.
//!
//! Each request builds an immutable filter + grouping specification which the
//! store executes; nothing here touches a connection. The descriptors carry
//! full-day-inclusive date semantics: a range covers its start and end days
//! entirely, and an exact-day selector matches the stored trading day.

use crate::domain::{DateRange, TradeDay};

/// Pseudo-key for the cross-market species bucket, and the request sentinel
/// meaning "do not constrain the market dimension".
pub const ALL_MARKETS: &str = "all";

/// Day selection for a trade query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelector {
    /// Exact trading-day match.
    On(TradeDay),
    /// Inclusive on both boundary days. A reversed range matches nothing.
    Between(DateRange),
}

/// Field-equality and date predicates over the trade dataset. `None` leaves
/// a dimension unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeFilter {
    pub dates: DateSelector,
    pub species: Option<String>,
    pub market: Option<String>,
}

/// Grouping applied by the species set-aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// One group per market present in the filtered rows.
    PerMarket,
    /// A single group holding the union over every market.
    AllMarkets,
}

/// Grouped de-duplicating species aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesQuery {
    pub filter: TradeFilter,
    pub group: GroupKey,
}

/// Per-market grouped list aggregate of (date, price, volume) tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    pub filter: TradeFilter,
}

/// Species traded in `range`, grouped per market or collapsed into the
/// cross-market union.
pub fn species_in_range(range: DateRange, group: GroupKey) -> SpeciesQuery {
    SpeciesQuery {
        filter: TradeFilter {
            dates: DateSelector::Between(range),
            species: None,
            market: None,
        },
        group,
    }
}

/// Price/volume for one species on one day, optionally restricted to a
/// single market.
pub fn quotes_on_day(day: TradeDay, species: &str, market: Option<&str>) -> TradeFilter {
    TradeFilter {
        dates: DateSelector::On(day),
        species: Some(species.to_owned()),
        market: market.map(str::to_owned),
    }
}

/// Per-market point lists for one species over `range`, optionally
/// restricted to a single market.
pub fn series_in_range(range: DateRange, species: &str, market: Option<&str>) -> SeriesQuery {
    SeriesQuery {
        filter: TradeFilter {
            dates: DateSelector::Between(range),
            species: Some(species.to_owned()),
            market: market.map(str::to_owned),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_query_leaves_dimensions_unconstrained() {
        let range = DateRange::parse_tokens("2019-7-2", "2019-7-3").expect("range");
        let query = species_in_range(range, GroupKey::PerMarket);
        assert_eq!(query.filter.dates, DateSelector::Between(range));
        assert_eq!(query.filter.species, None);
        assert_eq!(query.filter.market, None);
    }

    #[test]
    fn day_filter_constrains_species_and_market() {
        let day = TradeDay::parse_token("2019-7-3").expect("day");
        let filter = quotes_on_day(day, "黑鯛", Some("佳里"));
        assert_eq!(filter.dates, DateSelector::On(day));
        assert_eq!(filter.species.as_deref(), Some("黑鯛"));
        assert_eq!(filter.market.as_deref(), Some("佳里"));
    }

    #[test]
    fn series_query_with_all_markets_has_no_market_predicate() {
        let range = DateRange::parse_tokens("2019-7-2", "2019-7-3").expect("range");
        let query = series_in_range(range, "黑鯛", None);
        assert_eq!(query.filter.market, None);
        assert_eq!(query.filter.species.as_deref(), Some("黑鯛"));
    }
}
