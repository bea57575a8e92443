//! CLI argument definitions for the pesca service.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Fish-market price query service.
#[derive(Debug, Parser)]
#[command(name = "pesca", version, about = "Fish-market price query service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP query service.
    Serve(ServeArgs),
    /// Load trade records from a JSON file into the warehouse.
    Load(LoadArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Socket address to bind.
    #[arg(long, default_value = "0.0.0.0:4011")]
    pub addr: SocketAddr,

    /// Path to the DuckDB database file.
    /// Defaults to `$PESCA_HOME/cache/market.duckdb`.
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Path to the DuckDB database file.
    /// Defaults to `$PESCA_HOME/cache/market.duckdb`.
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Source tag recorded with each ingested row.
    #[arg(long, default_value = "file")]
    pub source: String,

    /// JSON file holding an array of trade records, dates in `YYYY/MM/DD`
    /// form.
    pub file: PathBuf,
}
