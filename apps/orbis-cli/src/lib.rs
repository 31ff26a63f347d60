//! # orbis-cli: Command-Line Frontend for Orbis ERP
//!
//! A thin layer over `orbis-db`: every command opens the database, runs
//! one operation and prints JSON.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          orbis (binary)                                 │
//! │                                                                         │
//! │  main.rs ────► logging, argument parsing, output                       │
//! │                                                                         │
//! │  lib.rs ─────► configuration + database setup, dispatch                │
//! │                                                                         │
//! │  commands/ ──► customer, product, stock, order handlers + DTOs         │
//! │                                                                         │
//! │  error.rs ───► ApiError {code, message}                                │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  orbis-db: repositories + order lifecycle  ─►  SQLite (WAL)      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use orbis_db::{Database, DbConfig};

use commands::{AppContext, Command};
use config::AppConfig;
use error::ApiError;

/// Orbis ERP: customers, products, stock and sales orders.
#[derive(Debug, Parser)]
#[command(name = "orbis", version, about)]
pub struct Cli {
    /// SQLite database file (overrides ORBIS_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Resolves configuration, opens the database and runs the command.
pub async fn run(cli: Cli) -> Result<Value, ApiError> {
    let config = AppConfig::from_env(cli.db)?;
    info!(db_path = ?config.database_path, tax_rate_bps = config.tax_rate_bps, "Configuration resolved");

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.max_connections),
    )
    .await?
    .with_tax_rate(config.tax_rate());

    let ctx = AppContext { db, config };
    let result = commands::execute(&ctx, cli.command).await;
    ctx.db.close().await;

    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout carries only command output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=orbis=trace` - Show trace for orbis crates only
/// - Default: `info,orbis=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,orbis=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .init();
}

/// Serializes command output, compact unless `pretty`.
pub fn render(value: &Value, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}
