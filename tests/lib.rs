// Shared fixtures for end-to-end query behavior tests.
use tempfile::TempDir;

pub use pesca_core::{DateRange, MarketQueries, TradeDay, TradeRecord, ALL_MARKETS};
pub use pesca_warehouse::{Warehouse, WarehouseConfig};

/// Open a fresh warehouse under `dir`. The query service shares the store's
/// connection pool, so the pair operates on the same data.
pub fn open_store(dir: &TempDir) -> (Warehouse, MarketQueries<Warehouse>) {
    let warehouse = Warehouse::open(WarehouseConfig {
        pesca_home: dir.path().to_path_buf(),
        db_path: dir.path().join("market.duckdb"),
        max_pool_size: 2,
    })
    .expect("warehouse open");
    let queries = MarketQueries::new(warehouse.clone());
    (warehouse, queries)
}

pub fn record(date: &str, market: &str, species: &str, price: f64, volume: f64) -> TradeRecord {
    TradeRecord::new(
        TradeDay::parse_wire(date).expect("date"),
        market,
        species,
        price,
        volume,
    )
    .expect("record")
}

pub fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse_tokens(start, end).expect("range")
}
