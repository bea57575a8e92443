pub mod date;
pub mod models;

pub use date::{DateRange, Days, TradeDay};
pub use models::{DayQuote, RawPoint, SeriesPoint, TradeRecord};
