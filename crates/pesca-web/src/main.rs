use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use pesca_core::{MarketQueries, TradeRecord};
use pesca_warehouse::{Warehouse, WarehouseConfig, WarehouseError};
use pesca_web::cli::{Cli, Command, LoadArgs, ServeArgs};
use pesca_web::error::ServerError;
use pesca_web::routes;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

async fn run() -> Result<(), ServerError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Load(args) => load(&args),
    }
}

async fn serve(args: ServeArgs) -> Result<(), ServerError> {
    let warehouse = open_warehouse(args.db)?;
    tracing::info!(db = %warehouse.db_path().display(), "warehouse ready");

    let queries = Arc::new(MarketQueries::new(warehouse));
    let app = routes::router(queries);

    let listener = TcpListener::bind(args.addr).await?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn load(args: &LoadArgs) -> Result<(), ServerError> {
    let warehouse = open_warehouse(args.db.clone())?;
    let text = fs::read_to_string(&args.file)?;
    let rows: Vec<TradeRecord> = serde_json::from_str(&text)?;
    for row in &rows {
        row.validate()?;
    }
    let count = warehouse.ingest_trades(&args.source, &rows)?;
    tracing::info!(count, file = %args.file.display(), "trades loaded");
    Ok(())
}

fn open_warehouse(db: Option<PathBuf>) -> Result<Warehouse, WarehouseError> {
    let config = match db {
        Some(path) => WarehouseConfig::with_db_path(path),
        None => WarehouseConfig::default(),
    };
    Warehouse::open(config)
}
