//! # Sales Order Commands
//!
//! ## Order Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Sales Order Workflow                                 │
//! │                                                                         │
//! │  orbis order create --customer C --line P1:2:1499.99 --line P2:4       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────┐   order update <id> …   (lines replaced, totals redone)  │
//! │  │  DRAFT   │◄──────────────┐                                          │
//! │  └────┬─────┘───────────────┘                                          │
//! │       │                                                                 │
//! │       ├── order confirm <id> ──► CONFIRMED   (one OUT per line)        │
//! │       │                                                                 │
//! │       └── order cancel <id> ───► CANCELLED   (stock untouched)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A line without a price takes the product's catalog price.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use orbis_core::{
    Money, SalesOrder, SalesOrderDetail, SalesOrderInput, SalesOrderLineDetail,
    SalesOrderLineInput, SalesOrderStatus, SalesOrderSummary, SalesStatusFilter, ValidationError,
};

use super::product::parse_amount;
use super::{to_output, AppContext};
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Create a draft order
    Create(OrderArgs),

    /// Replace the header and all lines of a draft order
    Update {
        id: String,
        #[command(flatten)]
        order: OrderArgs,
    },

    /// Confirm a draft order and debit stock
    Confirm { id: String },

    /// Cancel a draft order
    Cancel { id: String },

    /// Show an order with its customer and lines
    Show { id: String },

    /// List orders, newest first
    List {
        /// DRAFT, CONFIRMED, CANCELLED or ALL
        #[arg(long)]
        status: Option<String>,

        /// Substring of the customer's name or email
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct OrderArgs {
    #[arg(long)]
    pub customer: String,

    /// Defaults to ORBIS_DEFAULT_CURRENCY
    #[arg(long)]
    pub currency: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// PRODUCT_ID:QTY[:UNIT_PRICE], repeatable
    #[arg(long = "line", value_name = "PRODUCT_ID:QTY[:UNIT_PRICE]")]
    pub lines: Vec<String>,
}

/// One `--line` argument before catalog prices are filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpec {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Option<Money>,
}

/// Parses `PRODUCT_ID:QTY[:UNIT_PRICE]`.
pub fn parse_line(index: usize, raw: &str) -> Result<LineSpec, ValidationError> {
    let field = format!("lines[{index}]");
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.clone(),
        reason: reason.to_string(),
    };

    let mut parts = raw.splitn(3, ':');
    let product_id = parts.next().unwrap_or_default().trim();
    let quantity = parts
        .next()
        .ok_or_else(|| invalid("expected PRODUCT_ID:QTY[:UNIT_PRICE]"))?;
    let price = parts.next();

    if product_id.is_empty() {
        return Err(invalid("product id is empty"));
    }
    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid("quantity must be a whole number"))?;
    let unit_price = price
        .map(|raw| parse_amount(&format!("{field}.unitPrice"), raw))
        .transpose()?;

    Ok(LineSpec {
        product_id: product_id.to_string(),
        quantity,
        unit_price,
    })
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub customer_id: String,
    pub status: SalesOrderStatus,
    pub currency: String,
    pub notes: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub total: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SalesOrder> for OrderDto {
    fn from(o: SalesOrder) -> Self {
        OrderDto {
            total: o.total().to_string(),
            id: o.id,
            customer_id: o.customer_id,
            status: o.status,
            currency: o.currency,
            notes: o.notes,
            subtotal_cents: o.subtotal_cents,
            tax_cents: o.tax_cents,
            total_cents: o.total_cents,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDto {
    pub position: i64,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<SalesOrderLineDetail> for OrderLineDto {
    fn from(l: SalesOrderLineDetail) -> Self {
        OrderLineDto {
            position: l.position,
            product_id: l.product_id,
            product_name: l.product_name,
            product_sku: l.product_sku,
            quantity: l.quantity,
            unit_price_cents: l.unit_price_cents,
            line_total_cents: l.line_total_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailDto {
    #[serde(flatten)]
    pub order: OrderDto,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub lines: Vec<OrderLineDto>,
}

impl From<SalesOrderDetail> for OrderDetailDto {
    fn from(d: SalesOrderDetail) -> Self {
        OrderDetailDto {
            order: d.order.into(),
            customer_name: d.customer.name,
            customer_email: d.customer.email,
            lines: d.lines.into_iter().map(OrderLineDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryDto {
    pub id: String,
    pub status: SalesOrderStatus,
    pub currency: String,
    pub total_cents: i64,
    pub customer_id: String,
    pub customer_name: String,
    pub line_count: i64,
    pub created_at: String,
}

impl From<SalesOrderSummary> for OrderSummaryDto {
    fn from(s: SalesOrderSummary) -> Self {
        OrderSummaryDto {
            id: s.id,
            status: s.status,
            currency: s.currency,
            total_cents: s.total_cents,
            customer_id: s.customer_id,
            customer_name: s.customer_name,
            line_count: s.line_count,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn execute(ctx: &AppContext, command: OrderCommand) -> Result<Value, ApiError> {
    match command {
        OrderCommand::Create(args) => to_output(&create_order(ctx, &args).await?),
        OrderCommand::Update { id, order } => to_output(&update_order(ctx, &id, &order).await?),
        OrderCommand::Confirm { id } => to_output(&confirm_order(ctx, &id).await?),
        OrderCommand::Cancel { id } => to_output(&cancel_order(ctx, &id).await?),
        OrderCommand::Show { id } => to_output(&show_order(ctx, &id).await?),
        OrderCommand::List { status, search } => {
            to_output(&list_orders(ctx, status.as_deref(), search.as_deref()).await?)
        }
    }
}

pub async fn create_order(ctx: &AppContext, args: &OrderArgs) -> Result<OrderDto, ApiError> {
    let input = build_input(ctx, args).await?;
    let order = ctx.db.orders().create_draft(&input).await?;
    Ok(order.into())
}

pub async fn update_order(
    ctx: &AppContext,
    id: &str,
    args: &OrderArgs,
) -> Result<OrderDto, ApiError> {
    let input = build_input(ctx, args).await?;
    let order = ctx.db.orders().update_draft(id, &input).await?;
    Ok(order.into())
}

pub async fn confirm_order(ctx: &AppContext, id: &str) -> Result<OrderDto, ApiError> {
    let order = ctx.db.orders().confirm(id).await?;
    info!(order_id = %id, total = %order.total(), "order confirm command complete");
    Ok(order.into())
}

pub async fn cancel_order(ctx: &AppContext, id: &str) -> Result<OrderDto, ApiError> {
    let order = ctx.db.orders().cancel(id).await?;
    Ok(order.into())
}

pub async fn show_order(ctx: &AppContext, id: &str) -> Result<OrderDetailDto, ApiError> {
    ctx.db
        .sales_orders()
        .get_detail(id)
        .await?
        .map(OrderDetailDto::from)
        .ok_or_else(|| ApiError::not_found("Sales order", id))
}

pub async fn list_orders(
    ctx: &AppContext,
    status: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<OrderSummaryDto>, ApiError> {
    let filter = SalesStatusFilter::parse(status);
    debug!(filter = ?filter, "order list command");

    let orders = ctx.db.sales_orders().list(filter, search).await?;
    Ok(orders.into_iter().map(OrderSummaryDto::from).collect())
}

/// Turns CLI arguments into an order input, filling missing prices from
/// the catalog. Unknown products keep price 0 so the lifecycle engine
/// reports them as unknown references.
async fn build_input(ctx: &AppContext, args: &OrderArgs) -> Result<SalesOrderInput, ApiError> {
    let specs = args
        .lines
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_line(i, raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let unpriced: Vec<&str> = specs
        .iter()
        .filter(|s| s.unit_price.is_none())
        .map(|s| s.product_id.as_str())
        .collect();
    let catalog = if unpriced.is_empty() {
        Vec::new()
    } else {
        ctx.db.products().get_by_ids(&unpriced).await?
    };

    let lines = specs
        .into_iter()
        .map(|spec| {
            let unit_price = spec.unit_price.unwrap_or_else(|| {
                catalog
                    .iter()
                    .find(|p| p.id == spec.product_id)
                    .map(|p| p.price())
                    .unwrap_or_default()
            });
            SalesOrderLineInput {
                product_id: spec.product_id,
                quantity: spec.quantity,
                unit_price_cents: unit_price.cents(),
            }
        })
        .collect();

    Ok(SalesOrderInput {
        customer_id: args.customer.clone(),
        currency: args
            .currency
            .clone()
            .unwrap_or_else(|| ctx.config.default_currency.clone()),
        notes: args.notes.clone(),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::test_context;
    use crate::error::ErrorCode;
    use orbis_core::{CustomerInput, ProductInput, StockAdjustmentInput};

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line(0, "p-1:2:1499.99").unwrap(),
            LineSpec {
                product_id: "p-1".to_string(),
                quantity: 2,
                unit_price: Some(Money::from_cents(149_999)),
            }
        );
        assert_eq!(parse_line(0, "p-1:4").unwrap().unit_price, None);

        let err = parse_line(1, "p-1").unwrap_err();
        assert_eq!(err.field(), "lines[1]");
        let err = parse_line(2, "p-1:two").unwrap_err();
        assert_eq!(err.field(), "lines[2]");
        let err = parse_line(3, "p-1:2:1,999").unwrap_err();
        assert_eq!(err.field(), "lines[3].unitPrice");
        assert!(parse_line(0, ":2").is_err());
    }

    struct Seeded {
        customer_id: String,
        laptop_id: String,
        monitor_id: String,
    }

    async fn seed(ctx: &AppContext) -> Seeded {
        let customer = ctx
            .db
            .customers()
            .create(&CustomerInput {
                name: "Ana Silva".to_string(),
                email: Some("ana@example.com".to_string()),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (name, sku, price) in [("Laptop Pro 14", "LAP-14", 149_999), ("Monitor 27", "MON-27", 32_950)] {
            let product = ctx
                .db
                .products()
                .create(&ProductInput {
                    name: name.to_string(),
                    sku: sku.to_string(),
                    description: None,
                    price_cents: price,
                    cost_cents: None,
                    is_active: true,
                })
                .await
                .unwrap();
            ctx.db
                .stock()
                .record_receipt(&StockAdjustmentInput {
                    product_id: product.id.clone(),
                    quantity: 4,
                    note: None,
                })
                .await
                .unwrap();
            ids.push(product.id);
        }

        Seeded {
            customer_id: customer.id,
            monitor_id: ids.pop().unwrap_or_default(),
            laptop_id: ids.pop().unwrap_or_default(),
        }
    }

    fn args(customer_id: &str, lines: &[String]) -> OrderArgs {
        OrderArgs {
            customer: customer_id.to_string(),
            currency: None,
            notes: None,
            lines: lines.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_create_with_catalog_price_then_confirm() {
        let ctx = test_context().await;
        let s = seed(&ctx).await;

        let order = create_order(
            &ctx,
            &args(
                &s.customer_id,
                &[format!("{}:2", s.laptop_id), format!("{}:4:329.50", s.monitor_id)],
            ),
        )
        .await
        .unwrap();

        assert_eq!(order.status, SalesOrderStatus::Draft);
        assert_eq!(order.currency, "EUR");
        assert_eq!(order.subtotal_cents, 431_798);
        assert_eq!(order.total_cents, 522_476);
        assert_eq!(order.total, "5224.76");

        let confirmed = confirm_order(&ctx, &order.id).await.unwrap();
        assert_eq!(confirmed.status, SalesOrderStatus::Confirmed);

        let detail = show_order(&ctx, &order.id).await.unwrap();
        assert_eq!(detail.customer_name, "Ana Silva");
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.lines[0].line_total_cents, 299_998);

        let err = cancel_order(&ctx, &order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert!(err.message.contains("already confirmed"));

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["status"], "CONFIRMED");
        assert_eq!(json["lines"][1]["productSku"], "MON-27");
    }

    #[tokio::test]
    async fn test_insufficient_stock_and_filters() {
        let ctx = test_context().await;
        let s = seed(&ctx).await;

        let big = create_order(&ctx, &args(&s.customer_id, &[format!("{}:5", s.laptop_id)]))
            .await
            .unwrap();
        let err = confirm_order(&ctx, &big.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Only 4 of Laptop Pro 14 in stock, order needs 5");

        let small = create_order(&ctx, &args(&s.customer_id, &[format!("{}:1", s.laptop_id)]))
            .await
            .unwrap();
        cancel_order(&ctx, &small.id).await.unwrap();

        let drafts = list_orders(&ctx, Some("draft"), None).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, big.id);

        let all = list_orders(&ctx, Some("bogus"), Some("ana")).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, small.id);
    }

    #[tokio::test]
    async fn test_update_and_bad_input() {
        let ctx = test_context().await;
        let s = seed(&ctx).await;

        let order = create_order(&ctx, &args(&s.customer_id, &[format!("{}:1", s.laptop_id)]))
            .await
            .unwrap();

        let mut replacement = args(&s.customer_id, &[format!("{}:2:300", s.monitor_id)]);
        replacement.currency = Some("usd".to_string());
        let updated = update_order(&ctx, &order.id, &replacement).await.unwrap();
        assert_eq!(updated.currency, "USD");
        assert_eq!(updated.subtotal_cents, 60_000);

        let err = create_order(&ctx, &args(&s.customer_id, &["nope:1".to_string()]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "productId refers to an unknown record: nope");

        let err = create_order(&ctx, &args(&s.customer_id, &[])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = confirm_order(&ctx, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
