//! # Stock Commands
//!
//! Goods receipts, manual corrections and the per-product ledger view.
//! Outbound movements are only written by order confirmation.

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use orbis_core::stock::StockSummary;
use orbis_core::{StockAdjustmentInput, StockMovement, StockMovementType, DEFAULT_MOVEMENT_HISTORY_LIMIT};

use super::{to_output, AppContext};
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// Record goods received (IN movement)
    Receive {
        product_id: String,
        quantity: i64,
        #[arg(long)]
        note: Option<String>,
    },

    /// Record a signed correction (ADJUSTMENT movement), e.g. -2 for breakage
    Adjust {
        product_id: String,
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
        #[arg(long)]
        note: Option<String>,
    },

    /// Show current stock and recent movements of a product
    Show {
        product_id: String,
        #[arg(long, default_value_t = DEFAULT_MOVEMENT_HISTORY_LIMIT)]
        limit: u32,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDto {
    pub id: String,
    pub product_id: String,
    pub movement_type: StockMovementType,
    pub quantity: i64,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<StockMovement> for MovementDto {
    fn from(m: StockMovement) -> Self {
        MovementDto {
            id: m.id,
            product_id: m.product_id,
            movement_type: m.movement_type,
            quantity: m.quantity,
            note: m.note,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDto {
    pub product_id: String,
    pub product_name: String,
    #[serde(flatten)]
    pub summary: StockSummary,
    pub movements: Vec<MovementDto>,
}

pub async fn execute(ctx: &AppContext, command: StockCommand) -> Result<Value, ApiError> {
    match command {
        StockCommand::Receive {
            product_id,
            quantity,
            note,
        } => to_output(&receive(ctx, product_id, quantity, note).await?),
        StockCommand::Adjust {
            product_id,
            quantity,
            note,
        } => to_output(&adjust(ctx, product_id, quantity, note).await?),
        StockCommand::Show { product_id, limit } => to_output(&show(ctx, &product_id, limit).await?),
    }
}

pub async fn receive(
    ctx: &AppContext,
    product_id: String,
    quantity: i64,
    note: Option<String>,
) -> Result<MovementDto, ApiError> {
    let input = StockAdjustmentInput {
        product_id,
        quantity,
        note,
    };
    let movement = ctx.db.stock().record_receipt(&input).await?;
    Ok(movement.into())
}

pub async fn adjust(
    ctx: &AppContext,
    product_id: String,
    quantity: i64,
    note: Option<String>,
) -> Result<MovementDto, ApiError> {
    let input = StockAdjustmentInput {
        product_id,
        quantity,
        note,
    };
    let movement = ctx.db.stock().record_adjustment(&input).await?;
    Ok(movement.into())
}

pub async fn show(ctx: &AppContext, product_id: &str, limit: u32) -> Result<StockDto, ApiError> {
    let product = ctx
        .db
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    let stock = ctx.db.stock();
    let summary = stock.summary(product_id).await?;
    let movements = stock.recent_movements(product_id, limit).await?;

    Ok(StockDto {
        product_id: product.id,
        product_name: product.name,
        summary,
        movements: movements.into_iter().map(MovementDto::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::commands::test_support::test_context;
    use orbis_core::ProductInput;

    #[tokio::test]
    async fn test_receive_adjust_show() {
        let ctx = test_context().await;
        let product = ctx
            .db
            .products()
            .create(&ProductInput {
                name: "Monitor 27".to_string(),
                sku: "MON-27".to_string(),
                description: None,
                price_cents: 32_950,
                cost_cents: None,
                is_active: true,
            })
            .await
            .unwrap();

        receive(&ctx, product.id.clone(), 10, Some("supplier delivery".to_string()))
            .await
            .unwrap();
        let adjustment = adjust(&ctx, product.id.clone(), -2, None).await.unwrap();
        assert_eq!(adjustment.movement_type, StockMovementType::Adjustment);

        let view = show(&ctx, &product.id, 1).await.unwrap();
        assert_eq!(view.summary.current, 8);
        assert_eq!(view.summary.received, 10);
        assert_eq!(view.summary.adjustment, -2);
        assert_eq!(view.movements.len(), 1);
        assert_eq!(view.movements[0].quantity, -2);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["current"], 8);
        assert_eq!(json["in"], 10);
        assert_eq!(json["movements"][0]["movementType"], "ADJUSTMENT");
    }

    #[tokio::test]
    async fn test_rejected_movements() {
        let ctx = test_context().await;

        let err = receive(&ctx, "missing".to_string(), 1, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = adjust(&ctx, "missing".to_string(), 0, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = show(&ctx, "missing", 20).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
