use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month};

use crate::error::ValidationError;

/// Wire form for series points and stored dates. Zero-padded so the textual
/// form sorts in chronological order.
const WIRE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]/[month]/[day]");

/// ISO form used when binding dates as SQL parameters.
const ISO_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar trading day. A trade record carries no intra-day component;
/// there is one aggregate per (day, market, species).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDay(Date);

impl TradeDay {
    /// Parse a request token shaped like `2019-7-2`. Zero padding is not
    /// required; each component must be a plain decimal integer.
    pub fn parse_token(input: &str) -> Result<Self, ValidationError> {
        let token_err = || ValidationError::InvalidDateToken {
            value: input.to_owned(),
        };

        let mut parts = input.split('-');
        let year: i32 = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(token_err)?;
        let month: u8 = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(token_err)?;
        let day: u8 = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(token_err)?;
        if parts.next().is_some() {
            return Err(token_err());
        }

        let calendar_err = || ValidationError::InvalidCalendarDate {
            value: input.to_owned(),
        };
        let month = Month::try_from(month).map_err(|_| calendar_err())?;
        let date = Date::from_calendar_date(year, month, day).map_err(|_| calendar_err())?;
        Ok(Self(date))
    }

    /// Parse the zero-padded wire form `2019/07/02`.
    pub fn parse_wire(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input, WIRE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidCalendarDate {
                value: input.to_owned(),
            })
    }

    pub fn format_wire(self) -> String {
        self.0
            .format(WIRE_FORMAT)
            .expect("TradeDay must be formattable in wire form")
    }

    /// ISO `2019-07-02` text, suitable for casting to a SQL DATE.
    pub fn format_iso(self) -> String {
        self.0
            .format(ISO_FORMAT)
            .expect("TradeDay must be formattable in ISO form")
    }

    /// The following calendar day, if representable.
    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    pub fn into_inner(self) -> Date {
        self.0
    }
}

impl Display for TradeDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_wire())
    }
}

impl Serialize for TradeDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_wire())
    }
}

impl<'de> Deserialize<'de> for TradeDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse_wire(&value).map_err(D::Error::custom)
    }
}

/// Inclusive `[start, end]` day range.
///
/// Ordering is not enforced: a reversed range selects nothing at the store
/// and yields empty results, matching the documented query behavior. Callers
/// that need to reject reversed input can compare `start` and `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: TradeDay,
    pub end: TradeDay,
}

impl DateRange {
    pub fn new(start: TradeDay, end: TradeDay) -> Self {
        Self { start, end }
    }

    /// Parse a pair of request tokens into a range.
    pub fn parse_tokens(start: &str, end: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            start: TradeDay::parse_token(start)?,
            end: TradeDay::parse_token(end)?,
        })
    }

    pub fn contains(self, day: TradeDay) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of calendar days covered; zero for a reversed range.
    pub fn day_count(self) -> usize {
        let days = (self.end.into_inner() - self.start.into_inner()).whole_days() + 1;
        usize::try_from(days).unwrap_or(0)
    }

    /// Iterate every day from start to end inclusive, ascending.
    pub fn days(self) -> Days {
        let next = if self.start <= self.end {
            Some(self.start)
        } else {
            None
        };
        Days {
            next,
            end: self.end,
        }
    }
}

/// Ascending iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<TradeDay>,
    end: TradeDay,
}

impl Iterator for Days {
    type Item = TradeDay;

    fn next(&mut self) -> Option<TradeDay> {
        let current = self.next?;
        self.next = match current.next() {
            Some(following) if following <= self.end => Some(following),
            _ => None,
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unpadded_token() {
        let day = TradeDay::parse_token("2019-7-2").expect("must parse");
        assert_eq!(day.format_wire(), "2019/07/02");
        assert_eq!(day.format_iso(), "2019-07-02");
    }

    #[test]
    fn parses_padded_token() {
        let day = TradeDay::parse_token("2019-07-02").expect("must parse");
        assert_eq!(day.format_wire(), "2019/07/02");
    }

    #[test]
    fn rejects_malformed_token() {
        for input in ["2019-7", "2019-7-2-1", "2019/7/2", "abc", ""] {
            let err = TradeDay::parse_token(input).expect_err("must fail");
            assert!(matches!(err, ValidationError::InvalidDateToken { .. }));
        }
    }

    #[test]
    fn rejects_impossible_calendar_date() {
        let err = TradeDay::parse_token("2019-2-30").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidCalendarDate { .. }));
        let err = TradeDay::parse_token("2019-13-1").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidCalendarDate { .. }));
    }

    #[test]
    fn wire_form_round_trips() {
        let day = TradeDay::parse_wire("2019/07/02").expect("must parse");
        assert_eq!(day.format_wire(), "2019/07/02");
        assert_eq!(day.to_string(), "2019/07/02");
    }

    #[test]
    fn serde_uses_wire_form() {
        let day = TradeDay::parse_wire("2019/07/02").expect("must parse");
        let json = serde_json::to_string(&day).expect("serialize");
        assert_eq!(json, "\"2019/07/02\"");
        let back: TradeDay = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, day);
    }

    #[test]
    fn range_iterates_every_day_inclusive() {
        let range = DateRange::parse_tokens("2019-6-28", "2019-7-2").expect("range");
        let days: Vec<String> = range.days().map(|day| day.format_wire()).collect();
        assert_eq!(
            days,
            [
                "2019/06/28",
                "2019/06/29",
                "2019/06/30",
                "2019/07/01",
                "2019/07/02"
            ]
        );
        assert_eq!(range.day_count(), 5);
    }

    #[test]
    fn single_day_range_yields_one_day() {
        let range = DateRange::parse_tokens("2019-7-2", "2019-7-2").expect("range");
        assert_eq!(range.day_count(), 1);
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn reversed_range_is_empty() {
        let range = DateRange::parse_tokens("2019-7-3", "2019-7-2").expect("range");
        assert_eq!(range.day_count(), 0);
        assert_eq!(range.days().count(), 0);
    }

    #[test]
    fn range_crosses_month_boundary() {
        let range = DateRange::parse_tokens("2019-12-30", "2020-1-2").expect("range");
        let days: Vec<String> = range.days().map(|day| day.format_wire()).collect();
        assert_eq!(
            days,
            ["2019/12/30", "2019/12/31", "2020/01/01", "2020/01/02"]
        );
    }
}
