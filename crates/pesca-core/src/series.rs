//! Series normalization: sparse grouped rows to dense daily series.
//!
//! The store only returns days on which a trade happened. Charting wants one
//! point per calendar day, so every missing day inside the requested range is
//! filled with a zero-valued point. Sorting is by parsed calendar value; the
//! wire form stays zero-padded so a downstream lexical sort agrees with it.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{DateRange, RawPoint, SeriesPoint, TradeDay};

/// Fatal data-integrity failure while normalizing a bucket. The store is
/// trusted to emit well-formed dates, so there is no partial recovery: the
/// whole request fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("store returned malformed date '{value}'")]
    MalformedDate { value: String },
}

/// Normalize one market bucket to a dense ascending daily series covering
/// `range` inclusively.
///
/// An empty bucket stays empty: markets with zero matching trades contribute
/// no series at all rather than an all-zero one. Otherwise the result holds
/// exactly one point per calendar day of the range, observed days keeping
/// their price/volume and every other day zero-filled.
pub fn normalize(range: DateRange, points: &[RawPoint]) -> Result<Vec<SeriesPoint>, SeriesError> {
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let mut observed = BTreeMap::new();
    for point in points {
        let day = TradeDay::parse_wire(&point.date).map_err(|_| SeriesError::MalformedDate {
            value: point.date.clone(),
        })?;
        observed.insert(day, (point.price, point.volume));
    }

    let mut series = Vec::with_capacity(range.day_count());
    for day in range.days() {
        let point = match observed.get(&day) {
            Some(&(price, volume)) => SeriesPoint { date: day, price, volume },
            None => SeriesPoint::filled(day),
        };
        series.push(point);
    }
    Ok(series)
}

/// Normalize every market bucket of a grouped result. Bucket order and the
/// no-bucket-for-untraded-markets behavior carry through from the store.
pub fn normalize_groups(
    range: DateRange,
    groups: BTreeMap<String, Vec<RawPoint>>,
) -> Result<BTreeMap<String, Vec<SeriesPoint>>, SeriesError> {
    let mut normalized = BTreeMap::new();
    for (market, points) in groups {
        let series = normalize(range, &points)?;
        if !series.is_empty() {
            normalized.insert(market, series);
        }
    }
    Ok(normalized)
}
