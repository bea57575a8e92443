use serde::{Deserialize, Serialize};

use crate::domain::TradeDay;
use crate::error::ValidationError;

/// One observed transaction aggregate for a (day, market, species) triple.
/// Records are read-only inputs; the query layer never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: TradeDay,
    pub market: String,
    pub species: String,
    /// Average price for the trading day.
    pub price: f64,
    /// Quantity traded over the day.
    pub volume: f64,
}

impl TradeRecord {
    pub fn new(
        date: TradeDay,
        market: impl Into<String>,
        species: impl Into<String>,
        price: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            date,
            market: market.into(),
            species: species.into(),
            price,
            volume,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the constructor's invariants on a record built elsewhere,
    /// e.g. deserialized from a data file.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.market.trim().is_empty() {
            return Err(ValidationError::EmptyMarket);
        }
        if self.species.trim().is_empty() {
            return Err(ValidationError::EmptySpecies);
        }
        validate_non_negative("price", self.price)?;
        validate_non_negative("volume", self.volume)?;
        Ok(())
    }
}

/// Per-market price/volume for a single trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayQuote {
    pub price: f64,
    pub volume: f64,
}

/// Raw grouped row as the store returns it: the date is still text in the
/// zero-padded wire form and the per-market list is unordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub date: String,
    pub price: f64,
    pub volume: f64,
}

/// One day of a dense market series. Days without a trade carry zeros and
/// are indistinguishable from observed zero values in the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: TradeDay,
    pub price: f64,
    pub volume: f64,
}

impl SeriesPoint {
    pub fn filled(date: TradeDay) -> Self {
        Self {
            date,
            price: 0.0,
            volume: 0.0,
        }
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(wire: &str) -> TradeDay {
        TradeDay::parse_wire(wire).expect("date")
    }

    #[test]
    fn builds_valid_record() {
        let record =
            TradeRecord::new(day("2019/07/03"), "佳里", "黑鯛", 15.0, 17.0).expect("record");
        assert_eq!(record.market, "佳里");
        assert_eq!(record.species, "黑鯛");
    }

    #[test]
    fn rejects_empty_identifiers() {
        let err = TradeRecord::new(day("2019/07/03"), "", "黑鯛", 15.0, 17.0).expect_err("fail");
        assert!(matches!(err, ValidationError::EmptyMarket));
        let err = TradeRecord::new(day("2019/07/03"), "佳里", " ", 15.0, 17.0).expect_err("fail");
        assert!(matches!(err, ValidationError::EmptySpecies));
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        let err =
            TradeRecord::new(day("2019/07/03"), "佳里", "黑鯛", -1.0, 17.0).expect_err("fail");
        assert!(matches!(err, ValidationError::NegativeValue { field: "price" }));
        let err = TradeRecord::new(day("2019/07/03"), "佳里", "黑鯛", 15.0, f64::NAN)
            .expect_err("fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { field: "volume" }));
    }

    #[test]
    fn deserialized_record_can_be_revalidated() {
        let json = r#"{"date":"2019/07/03","market":"佳里","species":"黑鯛","price":-1.0,"volume":17.0}"#;
        let record: TradeRecord = serde_json::from_str(json).expect("deserialize");
        let err = record.validate().expect_err("fail");
        assert!(matches!(err, ValidationError::NegativeValue { field: "price" }));
    }

    #[test]
    fn series_point_serializes_wire_date() {
        let point = SeriesPoint {
            date: day("2019/07/03"),
            price: 15.0,
            volume: 17.0,
        };
        let json = serde_json::to_value(&point).expect("serialize");
        assert_eq!(json["date"], "2019/07/03");
    }
}
