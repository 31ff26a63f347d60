//! # CLI Commands
//!
//! One module per resource. Each handler takes the [`AppContext`] and its
//! parsed arguments and returns a serializable DTO; the dispatcher turns
//! that into the JSON printed on stdout.
//!
//! ## Command Categories
//! - [`customer`] - add, list, show, update, delete
//! - [`product`] - add, list, show, update, delete
//! - [`stock`] - receive, adjust, show
//! - [`order`] - create, update, confirm, cancel, show, list

pub mod customer;
pub mod order;
pub mod product;
pub mod stock;

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use orbis_db::Database;

use crate::config::AppConfig;
use crate::error::ApiError;

/// Everything a command needs: the open database and the resolved config.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub db: Database,
    pub config: AppConfig,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage customers
    #[command(subcommand)]
    Customer(customer::CustomerCommand),

    /// Manage the product catalog
    #[command(subcommand)]
    Product(product::ProductCommand),

    /// Record and inspect stock movements
    #[command(subcommand)]
    Stock(stock::StockCommand),

    /// Create, edit, confirm and cancel sales orders
    #[command(subcommand)]
    Order(order::OrderCommand),

    /// Print the resolved configuration
    Config,
}

pub async fn execute(ctx: &AppContext, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::Customer(cmd) => customer::execute(ctx, cmd).await,
        Command::Product(cmd) => product::execute(ctx, cmd).await,
        Command::Stock(cmd) => stock::execute(ctx, cmd).await,
        Command::Order(cmd) => order::execute(ctx, cmd).await,
        Command::Config => to_output(&ctx.config),
    }
}

pub(crate) fn to_output<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Could not serialize output: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use orbis_db::DbConfig;
    use std::path::PathBuf;

    pub async fn test_context() -> AppContext {
        let db = Database::new(DbConfig::in_memory())
            .await
            .expect("Failed to create test database");

        AppContext {
            db,
            config: AppConfig {
                database_path: PathBuf::from(":memory:"),
                tax_rate_bps: 2100,
                default_currency: "EUR".to_string(),
                max_connections: 1,
            },
        }
    }
}
