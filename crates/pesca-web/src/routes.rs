//! The three query routes.
//!
//! Path layout follows the service's public contract:
//! - `GET /fish/{start}/{end}`: species traded in the range
//! - `GET /fish/{date}/{market}/{species}/price`: one-day quotes
//! - `GET /fish/{start}/{end}/{market}/{species}/price`: daily series
//!
//! `{market} == "all"` leaves the market dimension unconstrained.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use pesca_core::{
    DateRange, DayQuote, MarketQueries, QueryError, SeriesPoint, TradeDay, ALL_MARKETS,
};
use pesca_warehouse::Warehouse;

use crate::error::ApiError;

/// Shared request state: one query service over the process-wide store.
pub type Queries = Arc<MarketQueries<Warehouse>>;

pub fn router(queries: Queries) -> Router {
    Router::new()
        .route("/fish/:start/:end", get(species_in_range))
        .route("/fish/:date/:market/:species/price", get(quotes_on_day))
        .route(
            "/fish/:start/:end/:market/:species/price",
            get(price_series),
        )
        .layer(CorsLayer::permissive())
        .with_state(queries)
}

async fn species_in_range(
    State(queries): State<Queries>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<BTreeMap<String, Vec<String>>>, ApiError> {
    let range = DateRange::parse_tokens(&start, &end)?;
    let result = run_query(move || queries.species_traded(range)).await?;
    Ok(Json(result))
}

async fn quotes_on_day(
    State(queries): State<Queries>,
    Path((date, market, species)): Path<(String, String, String)>,
) -> Result<Json<BTreeMap<String, DayQuote>>, ApiError> {
    let day = TradeDay::parse_token(&date)?;
    let market = market_filter(&market);
    let result =
        run_query(move || queries.quotes_on_day(day, &species, market.as_deref())).await?;
    Ok(Json(result))
}

async fn price_series(
    State(queries): State<Queries>,
    Path((start, end, market, species)): Path<(String, String, String, String)>,
) -> Result<Json<BTreeMap<String, Vec<SeriesPoint>>>, ApiError> {
    let range = DateRange::parse_tokens(&start, &end)?;
    let market = market_filter(&market);
    let result =
        run_query(move || queries.price_series(range, &species, market.as_deref())).await?;
    Ok(Json(result))
}

fn market_filter(raw: &str) -> Option<String> {
    (raw != ALL_MARKETS).then(|| raw.to_owned())
}

/// Store access is synchronous; run it on the blocking pool.
async fn run_query<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, QueryError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(task).await??)
}
