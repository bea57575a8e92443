//! DuckDB-backed trade store for pesca.
//!
//! Holds the `trades` dataset (one row per trading day, market, and species)
//! and executes the query descriptors from `pesca-core`: the grouped species
//! set-aggregate, the exact-day quote lookup, and the per-market point-list
//! aggregate feeding series normalization.
//!
//! All request-supplied values are bound as query parameters, never
//! interpolated. Dates travel as ISO text cast to `DATE` on the way in and
//! are formatted to the zero-padded `YYYY/MM/DD` wire form on the way out.

pub mod duckdb;
pub mod migrations;

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use thiserror::Error;

use pesca_core::{
    DateSelector, DayQuote, GroupKey, RawPoint, SeriesQuery, SpeciesQuery, StoreError,
    TradeFilter, TradeRecord, TradeStore, ALL_MARKETS,
};

pub use duckdb::{AccessMode, ConnectionPool, PooledConnection};

/// Errors raised by warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<WarehouseError> for StoreError {
    fn from(error: WarehouseError) -> Self {
        StoreError::Query(error.to_string())
    }
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for pesca data.
    pub pesca_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept per access mode.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let pesca_home = resolve_pesca_home();
        let db_path = pesca_home.join("cache").join("market.duckdb");
        Self {
            pesca_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl WarehouseConfig {
    /// Default configuration with the database at an explicit path.
    #[must_use]
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }
}

/// The trade store. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct Warehouse {
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse, creating the database file and applying schema
    /// migrations as needed.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::new(config.db_path, config.max_pool_size);
        let warehouse = Self { pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply schema migrations. Idempotent.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Upsert trade records in one transaction. Returns the row count.
    ///
    /// This is the data-loading path; the query service itself never writes.
    pub fn ingest_trades(
        &self,
        source: &str,
        rows: &[TradeRecord],
    ) -> Result<usize, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            for row in rows {
                let trade_date = row.date.format_iso();
                let params: [&dyn ToSql; 6] = [
                    &trade_date,
                    &row.market,
                    &row.species,
                    &row.price,
                    &row.volume,
                    &source,
                ];
                connection.execute(
                    "INSERT OR REPLACE INTO trades \
                     (trade_date, market, species, price, volume, source, updated_at) \
                     VALUES (CAST(? AS DATE), ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }

            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }

    fn species_sets_inner(
        &self,
        query: &SpeciesQuery,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, WarehouseError> {
        let (where_sql, params) = render_filter(&query.filter);
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        match query.group {
            GroupKey::PerMarket => {
                let sql = format!("SELECT DISTINCT market, species FROM trades WHERE {where_sql}");
                let mut statement = connection.prepare(sql.as_str())?;
                let mut rows = statement.query(param_refs(&params).as_slice())?;
                while let Some(row) = rows.next()? {
                    let market: String = row.get(0)?;
                    let species: String = row.get(1)?;
                    sets.entry(market).or_default().insert(species);
                }
            }
            GroupKey::AllMarkets => {
                let sql = format!("SELECT DISTINCT species FROM trades WHERE {where_sql}");
                let mut statement = connection.prepare(sql.as_str())?;
                let mut rows = statement.query(param_refs(&params).as_slice())?;
                while let Some(row) = rows.next()? {
                    let species: String = row.get(0)?;
                    sets.entry(ALL_MARKETS.to_owned()).or_default().insert(species);
                }
            }
        }

        Ok(sets)
    }

    fn quotes_for_day_inner(
        &self,
        filter: &TradeFilter,
    ) -> Result<BTreeMap<String, DayQuote>, WarehouseError> {
        let (where_sql, params) = render_filter(filter);
        let sql = format!("SELECT market, price, volume FROM trades WHERE {where_sql}");

        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(sql.as_str())?;
        let mut rows = statement.query(param_refs(&params).as_slice())?;

        let mut quotes = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let market: String = row.get(0)?;
            let price: f64 = row.get(1)?;
            let volume: f64 = row.get(2)?;
            quotes.insert(market, DayQuote { price, volume });
        }
        Ok(quotes)
    }

    fn point_groups_inner(
        &self,
        query: &SeriesQuery,
    ) -> Result<BTreeMap<String, Vec<RawPoint>>, WarehouseError> {
        let (where_sql, params) = render_filter(&query.filter);
        let sql = format!(
            "SELECT market, strftime(trade_date, '%Y/%m/%d'), price, volume \
             FROM trades WHERE {where_sql}"
        );

        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(sql.as_str())?;
        let mut rows = statement.query(param_refs(&params).as_slice())?;

        let mut groups: BTreeMap<String, Vec<RawPoint>> = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let market: String = row.get(0)?;
            let date: String = row.get(1)?;
            let price: f64 = row.get(2)?;
            let volume: f64 = row.get(3)?;
            groups
                .entry(market)
                .or_default()
                .push(RawPoint { date, price, volume });
        }
        Ok(groups)
    }
}

impl TradeStore for Warehouse {
    fn species_sets(
        &self,
        query: &SpeciesQuery,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, StoreError> {
        self.species_sets_inner(query).map_err(StoreError::from)
    }

    fn quotes_for_day(
        &self,
        filter: &TradeFilter,
    ) -> Result<BTreeMap<String, DayQuote>, StoreError> {
        self.quotes_for_day_inner(filter).map_err(StoreError::from)
    }

    fn point_groups(
        &self,
        query: &SeriesQuery,
    ) -> Result<BTreeMap<String, Vec<RawPoint>>, StoreError> {
        self.point_groups_inner(query).map_err(StoreError::from)
    }
}

/// Render a `TradeFilter` to a WHERE clause plus its positional parameters.
/// Every value binds as a parameter; dates bind as ISO text cast to `DATE`.
fn render_filter(filter: &TradeFilter) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    match filter.dates {
        DateSelector::On(day) => {
            clauses.push("trade_date = CAST(? AS DATE)");
            params.push(day.format_iso());
        }
        DateSelector::Between(range) => {
            clauses.push("trade_date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)");
            params.push(range.start.format_iso());
            params.push(range.end.format_iso());
        }
    }
    if let Some(species) = &filter.species {
        clauses.push("species = ?");
        params.push(species.clone());
    }
    if let Some(market) = &filter.market {
        clauses.push("market = ?");
        params.push(market.clone());
    }

    (clauses.join(" AND "), params)
}

fn param_refs(params: &[String]) -> Vec<&dyn ToSql> {
    params.iter().map(|param| param as &dyn ToSql).collect()
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the pesca home directory from the environment or default.
fn resolve_pesca_home() -> PathBuf {
    if let Some(path) = env::var_os("PESCA_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".pesca");
    }

    PathBuf::from(".pesca")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pesca_core::{query, DateRange, TradeDay};
    use tempfile::tempdir;

    fn open_warehouse(dir: &tempfile::TempDir) -> Warehouse {
        Warehouse::open(WarehouseConfig {
            pesca_home: dir.path().to_path_buf(),
            db_path: dir.path().join("market.duckdb"),
            max_pool_size: 2,
        })
        .expect("warehouse open")
    }

    fn record(date: &str, market: &str, species: &str, price: f64, volume: f64) -> TradeRecord {
        TradeRecord::new(
            TradeDay::parse_wire(date).expect("date"),
            market,
            species,
            price,
            volume,
        )
        .expect("record")
    }

    fn seed(warehouse: &Warehouse) {
        let rows = vec![
            record("2019/07/02", "台北", "白鯧", 230.0, 120.0),
            record("2019/07/03", "佳里", "黑鯛", 15.0, 17.0),
            record("2019/07/03", "台北", "黑鯛", 18.0, 40.0),
            record("2019/07/05", "佳里", "黑鯛", 20.0, 9.0),
        ];
        warehouse.ingest_trades("test", &rows).expect("ingest");
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::parse_tokens(start, end).expect("range")
    }

    #[test]
    fn open_is_idempotent_across_restarts() {
        let temp = tempdir().expect("tempdir");
        {
            let warehouse = open_warehouse(&temp);
            seed(&warehouse);
        }
        // Second open re-applies migrations against the existing file.
        let warehouse = open_warehouse(&temp);
        let quotes = warehouse
            .quotes_for_day_inner(&query::quotes_on_day(
                TradeDay::parse_token("2019-7-3").expect("day"),
                "黑鯛",
                None,
            ))
            .expect("query");
        assert_eq!(quotes.len(), 2);
    }

    #[test]
    fn ingest_upserts_on_the_primary_key() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        seed(&warehouse);
        warehouse
            .ingest_trades("test", &[record("2019/07/03", "佳里", "黑鯛", 99.0, 1.0)])
            .expect("second ingest");

        let quotes = warehouse
            .quotes_for_day_inner(&query::quotes_on_day(
                TradeDay::parse_token("2019-7-3").expect("day"),
                "黑鯛",
                Some("佳里"),
            ))
            .expect("query");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes["佳里"].price, 99.0);
    }

    #[test]
    fn species_sets_group_per_market_and_overall() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        seed(&warehouse);

        let per_market = warehouse
            .species_sets_inner(&query::species_in_range(
                range("2019-7-1", "2019-7-10"),
                GroupKey::PerMarket,
            ))
            .expect("query");
        assert_eq!(per_market.len(), 2);
        assert!(per_market["台北"].contains("白鯧"));
        assert!(per_market["台北"].contains("黑鯛"));
        assert_eq!(per_market["佳里"].len(), 1);

        let overall = warehouse
            .species_sets_inner(&query::species_in_range(
                range("2019-7-1", "2019-7-10"),
                GroupKey::AllMarkets,
            ))
            .expect("query");
        assert_eq!(overall.len(), 1);
        assert_eq!(overall[ALL_MARKETS].len(), 2);
    }

    #[test]
    fn range_boundaries_are_full_days_inclusive() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        seed(&warehouse);

        // Both boundary days carry trades; both must match.
        let overall = warehouse
            .species_sets_inner(&query::species_in_range(
                range("2019-7-2", "2019-7-3"),
                GroupKey::AllMarkets,
            ))
            .expect("query");
        assert_eq!(overall[ALL_MARKETS].len(), 2);
    }

    #[test]
    fn point_groups_emit_wire_dates_per_market() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        seed(&warehouse);

        let groups = warehouse
            .point_groups_inner(&query::series_in_range(
                range("2019-7-1", "2019-7-10"),
                "黑鯛",
                None,
            ))
            .expect("query");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["佳里"].len(), 2);

        let dates: Vec<&str> = groups["佳里"].iter().map(|p| p.date.as_str()).collect();
        assert!(dates.contains(&"2019/07/03"));
        assert!(dates.contains(&"2019/07/05"));
        assert_eq!(groups["台北"][0].date, "2019/07/03");
    }

    #[test]
    fn market_predicate_restricts_groups() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        seed(&warehouse);

        let groups = warehouse
            .point_groups_inner(&query::series_in_range(
                range("2019-7-1", "2019-7-10"),
                "黑鯛",
                Some("佳里"),
            ))
            .expect("query");
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("佳里"));
    }

    #[test]
    fn reversed_range_matches_nothing() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);
        seed(&warehouse);

        let overall = warehouse
            .species_sets_inner(&query::species_in_range(
                range("2019-7-10", "2019-7-1"),
                GroupKey::AllMarkets,
            ))
            .expect("query");
        assert!(overall.is_empty());

        let groups = warehouse
            .point_groups_inner(&query::series_in_range(
                range("2019-7-10", "2019-7-1"),
                "黑鯛",
                None,
            ))
            .expect("query");
        assert!(groups.is_empty());
    }

    #[test]
    fn hostile_identifiers_stay_inert() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_warehouse(&temp);

        let hostile = "黑鯛'; DROP TABLE trades; --";
        warehouse
            .ingest_trades("test", &[record("2019/07/03", "佳里", hostile, 15.0, 17.0)])
            .expect("ingest");

        let quotes = warehouse
            .quotes_for_day_inner(&query::quotes_on_day(
                TradeDay::parse_token("2019-7-3").expect("day"),
                hostile,
                None,
            ))
            .expect("query");
        assert_eq!(quotes.len(), 1);

        // The table is still there and still queryable.
        let overall = warehouse
            .species_sets_inner(&query::species_in_range(
                range("2019-7-1", "2019-7-10"),
                GroupKey::AllMarkets,
            ))
            .expect("query");
        assert!(overall[ALL_MARKETS].contains(hostile));
    }
}
