//! # Stock Ledger Arithmetic
//!
//! Stock is never stored. It is the signed sum of a product's movements:
//!
//! ```text
//! current = Σ IN − Σ OUT + Σ ADJUSTMENT
//!
//!   IN  20 ─┐
//!   OUT  4 ─┼──► 20 − 4 + (−1) = 15
//!   ADJ −1 ─┘
//! ```
//!
//! The database groups movements by `(product_id, movement_type)`; the
//! functions here fold those grouped rows into stock figures. Folding is
//! checked: a sum that leaves the `i64` range is
//! [`CoreError::StockOverflow`](crate::error::CoreError::StockOverflow).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::StockMovementType;

/// `current` after applying a movement total, or `None` on overflow.
#[inline]
pub const fn apply(current: i64, movement_type: StockMovementType, quantity: i64) -> Option<i64> {
    match movement_type {
        StockMovementType::In | StockMovementType::Adjustment => current.checked_add(quantity),
        StockMovementType::Out => current.checked_sub(quantity),
    }
}

fn overflow(product_id: &str) -> CoreError {
    CoreError::StockOverflow {
        product_id: product_id.to_string(),
    }
}

/// Sum of quantities for one product and movement type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MovementTotal {
    pub product_id: String,
    pub movement_type: StockMovementType,
    pub quantity: i64,
}

/// Per-type breakdown of a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummary {
    #[serde(rename = "in")]
    pub received: i64,
    #[serde(rename = "out")]
    pub issued: i64,
    /// Net of all adjustments, may be negative.
    pub adjustment: i64,
    pub current: i64,
}

impl StockSummary {
    /// Folds grouped totals into a summary. Rows for other products are the
    /// caller's concern; every row given is counted.
    pub fn from_totals<'a>(totals: impl IntoIterator<Item = &'a MovementTotal>) -> CoreResult<Self> {
        let mut summary = StockSummary::default();
        for row in totals {
            let bucket = match row.movement_type {
                StockMovementType::In => &mut summary.received,
                StockMovementType::Out => &mut summary.issued,
                StockMovementType::Adjustment => &mut summary.adjustment,
            };
            *bucket = bucket
                .checked_add(row.quantity)
                .ok_or_else(|| overflow(&row.product_id))?;
            summary.current = apply(summary.current, row.movement_type, row.quantity)
                .ok_or_else(|| overflow(&row.product_id))?;
        }
        Ok(summary)
    }
}

/// Current stock for every requested product.
///
/// Every id in `product_ids` is present in the result, with 0 when it has
/// no movements. Rows for ids that were not requested are ignored.
pub fn current_by_product<S: AsRef<str>>(
    product_ids: &[S],
    totals: &[MovementTotal],
) -> CoreResult<HashMap<String, i64>> {
    let mut stock: HashMap<String, i64> = product_ids
        .iter()
        .map(|id| (id.as_ref().to_string(), 0))
        .collect();

    for row in totals {
        if let Some(current) = stock.get_mut(&row.product_id) {
            *current = apply(*current, row.movement_type, row.quantity)
                .ok_or_else(|| overflow(&row.product_id))?;
        }
    }

    Ok(stock)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(product_id: &str, movement_type: StockMovementType, quantity: i64) -> MovementTotal {
        MovementTotal {
            product_id: product_id.to_string(),
            movement_type,
            quantity,
        }
    }

    #[test]
    fn test_apply_signs() {
        assert_eq!(apply(0, StockMovementType::In, 5), Some(5));
        assert_eq!(apply(0, StockMovementType::Out, 5), Some(-5));
        assert_eq!(apply(0, StockMovementType::Adjustment, -2), Some(-2));
        assert_eq!(apply(i64::MAX, StockMovementType::In, 1), None);
        assert_eq!(apply(i64::MIN, StockMovementType::Out, 1), None);
    }

    #[test]
    fn test_summary_in_out_adjustment() {
        let rows = vec![
            total("p1", StockMovementType::In, 20),
            total("p1", StockMovementType::Out, 4),
            total("p1", StockMovementType::Adjustment, -1),
        ];

        let summary = StockSummary::from_totals(&rows).unwrap();
        assert_eq!(
            summary,
            StockSummary {
                received: 20,
                issued: 4,
                adjustment: -1,
                current: 15,
            }
        );
    }

    #[test]
    fn test_summary_serializes_with_short_names() {
        let json = serde_json::to_value(StockSummary {
            received: 3,
            issued: 1,
            adjustment: 0,
            current: 2,
        })
        .unwrap();
        assert_eq!(json["in"], 3);
        assert_eq!(json["out"], 1);
        assert_eq!(json["current"], 2);
    }

    #[test]
    fn test_current_by_product_includes_every_requested_id() {
        let rows = vec![
            total("a", StockMovementType::In, 10),
            total("a", StockMovementType::Out, 3),
            total("stray", StockMovementType::In, 99),
        ];

        let stock = current_by_product(&["a", "b"], &rows).unwrap();
        assert_eq!(stock.len(), 2);
        assert_eq!(stock["a"], 7);
        assert_eq!(stock["b"], 0);
    }

    #[test]
    fn test_overflowing_totals_are_errors() {
        let rows = vec![
            total("big", StockMovementType::In, i64::MAX),
            total("big", StockMovementType::Adjustment, 1),
        ];

        let expected = CoreError::StockOverflow {
            product_id: "big".to_string(),
        };
        assert_eq!(StockSummary::from_totals(&rows), Err(expected.clone()));
        assert_eq!(current_by_product(&["big"], &rows), Err(expected));

        // the stray row would overflow but is not requested
        assert_eq!(current_by_product(&["other"], &rows).unwrap()["other"], 0);
    }
}
