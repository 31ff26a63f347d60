//! # Product Commands
//!
//! Catalog maintenance. Prices are entered as decimals (`1499.99`) and
//! stored as cents.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info};

use orbis_core::stock::StockSummary;
use orbis_core::{Money, Product, ProductDetail, ProductInput, ProductWithStock, ValidationError};

use super::{to_output, AppContext};
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Add a product to the catalog
    Add(ProductArgs),

    /// List products with their current stock
    List {
        /// Substring of name or SKU
        #[arg(long)]
        search: Option<String>,
    },

    /// Show a product with its stock breakdown
    Show { id: String },

    /// Replace a product's catalog details
    Update {
        id: String,
        #[command(flatten)]
        args: ProductArgs,
    },

    /// Delete a product and its stock history
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub sku: String,

    /// Sale price, e.g. 1499.99
    #[arg(long)]
    pub price: String,

    /// Purchase cost, e.g. 1100.00
    #[arg(long)]
    pub cost: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Add the product as inactive
    #[arg(long)]
    pub inactive: bool,
}

impl ProductArgs {
    fn to_input(&self) -> Result<ProductInput, ValidationError> {
        let price = parse_amount("price", &self.price)?;
        let cost = self
            .cost
            .as_deref()
            .map(|raw| parse_amount("cost", raw))
            .transpose()?;

        Ok(ProductInput {
            name: self.name.clone(),
            sku: self.sku.clone(),
            description: self.description.clone(),
            price_cents: price.cents(),
            cost_cents: cost.map(|c| c.cents()),
            is_active: !self.inactive,
        })
    }
}

/// Parses a decimal amount, naming `field` in the error.
pub(crate) fn parse_amount(field: &str, raw: &str) -> Result<Money, ValidationError> {
    Money::parse_decimal(raw).map_err(|e| match e {
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason,
        },
        other => other,
    })
}

/// Product DTO.
///
/// `price` is the display form of `priceCents`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub price: String,
    pub cost_cents: Option<i64>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stock: Option<i64>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            price: p.price().to_string(),
            id: p.id,
            sku: p.sku,
            name: p.name,
            description: p.description,
            price_cents: p.price_cents,
            cost_cents: p.cost_cents,
            is_active: p.is_active,
            current_stock: None,
        }
    }
}

impl From<ProductWithStock> for ProductDto {
    fn from(p: ProductWithStock) -> Self {
        ProductDto {
            current_stock: Some(p.current_stock),
            ..ProductDto::from(p.product)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailDto {
    #[serde(flatten)]
    pub product: ProductDto,
    pub stock: StockSummary,
}

impl From<ProductDetail> for ProductDetailDto {
    fn from(d: ProductDetail) -> Self {
        ProductDetailDto {
            product: ProductDto {
                current_stock: Some(d.stock.current),
                ..ProductDto::from(d.product)
            },
            stock: d.stock,
        }
    }
}

pub async fn execute(ctx: &AppContext, command: ProductCommand) -> Result<Value, ApiError> {
    match command {
        ProductCommand::Add(args) => to_output(&add_product(ctx, &args).await?),
        ProductCommand::List { search } => to_output(&list_products(ctx, search.as_deref()).await?),
        ProductCommand::Show { id } => to_output(&show_product(ctx, &id).await?),
        ProductCommand::Update { id, args } => to_output(&update_product(ctx, &id, &args).await?),
        ProductCommand::Delete { id } => {
            delete_product(ctx, &id).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

pub async fn add_product(ctx: &AppContext, args: &ProductArgs) -> Result<ProductDto, ApiError> {
    let input = args.to_input().map_err(|e| ApiError::validation(e.to_string()))?;
    let product = ctx.db.products().create(&input).await?;
    Ok(product.into())
}

pub async fn list_products(
    ctx: &AppContext,
    search: Option<&str>,
) -> Result<Vec<ProductDto>, ApiError> {
    let start = Instant::now();
    let products = ctx.db.products().list(search).await?;
    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = dtos.len(),
        "product list complete"
    );
    Ok(dtos)
}

pub async fn show_product(ctx: &AppContext, id: &str) -> Result<ProductDetailDto, ApiError> {
    debug!(id = %id, "product show command");
    ctx.db
        .products()
        .detail(id)
        .await?
        .map(ProductDetailDto::from)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn update_product(
    ctx: &AppContext,
    id: &str,
    args: &ProductArgs,
) -> Result<ProductDto, ApiError> {
    let input = args.to_input().map_err(|e| ApiError::validation(e.to_string()))?;
    let product = ctx.db.products().update(id, &input).await?;
    Ok(product.into())
}

pub async fn delete_product(ctx: &AppContext, id: &str) -> Result<(), ApiError> {
    ctx.db.products().delete(id).await?;
    Ok(())
}
