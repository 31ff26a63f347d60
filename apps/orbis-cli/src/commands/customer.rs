//! # Customer Commands

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use orbis_core::{Customer, CustomerInput};

use super::{to_output, AppContext};
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    /// Add a customer
    Add(CustomerArgs),

    /// List customers, optionally filtered by name or email
    List {
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one customer
    Show { id: String },

    /// Replace a customer's details
    Update {
        id: String,
        #[command(flatten)]
        args: CustomerArgs,
    },

    /// Delete a customer that has no orders
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct CustomerArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub address: Option<String>,
}

impl From<CustomerArgs> for CustomerInput {
    fn from(args: CustomerArgs) -> Self {
        CustomerInput {
            name: args.name,
            email: args.email,
            phone: args.phone,
            address: args.address,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl From<Customer> for CustomerDto {
    fn from(c: Customer) -> Self {
        CustomerDto {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            address: c.address,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

pub async fn execute(ctx: &AppContext, command: CustomerCommand) -> Result<Value, ApiError> {
    match command {
        CustomerCommand::Add(args) => to_output(&add_customer(ctx, args).await?),
        CustomerCommand::List { search } => to_output(&list_customers(ctx, search.as_deref()).await?),
        CustomerCommand::Show { id } => to_output(&show_customer(ctx, &id).await?),
        CustomerCommand::Update { id, args } => to_output(&update_customer(ctx, &id, args).await?),
        CustomerCommand::Delete { id } => {
            delete_customer(ctx, &id).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

pub async fn add_customer(ctx: &AppContext, args: CustomerArgs) -> Result<CustomerDto, ApiError> {
    let customer = ctx.db.customers().create(&args.into()).await?;
    Ok(customer.into())
}

pub async fn list_customers(
    ctx: &AppContext,
    search: Option<&str>,
) -> Result<Vec<CustomerDto>, ApiError> {
    debug!(search = ?search, "customer list command");
    let customers = ctx.db.customers().list(search).await?;
    Ok(customers.into_iter().map(CustomerDto::from).collect())
}

pub async fn show_customer(ctx: &AppContext, id: &str) -> Result<CustomerDto, ApiError> {
    ctx.db
        .customers()
        .get_by_id(id)
        .await?
        .map(CustomerDto::from)
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

pub async fn update_customer(
    ctx: &AppContext,
    id: &str,
    args: CustomerArgs,
) -> Result<CustomerDto, ApiError> {
    let customer = ctx.db.customers().update(id, &args.into()).await?;
    Ok(customer.into())
}

pub async fn delete_customer(ctx: &AppContext, id: &str) -> Result<(), ApiError> {
    ctx.db.customers().delete(id).await?;
    Ok(())
}
