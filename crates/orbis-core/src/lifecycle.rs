//! # Sales Order Lifecycle
//!
//! Pure decisions behind the draft → confirmed / cancelled workflow.
//! The database layer supplies the facts (order status, lines, stock) and
//! executes the writes these functions plan.
//!
//! ## Confirmation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  confirm(order)                                                         │
//! │                                                                         │
//! │  status != DRAFT ?  ──────────────► InvalidState(status)               │
//! │  no lines ?         ──────────────► EmptyOrder                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  demand_by_product(lines)      Laptop: 2 + 1 = 3, Mouse: 4             │
//! │       │                                                                 │
//! │       ▼  (stock read in the same transaction)                           │
//! │  check_availability            first product short ──► InsufficientStock│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  outbound_movements            one OUT per line, "Sale order {id}"     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::totals::{OrderLineAmount, OrderTotals, TotalsCalculator};
use crate::types::{
    NewStockMovement, SalesOrderInput, SalesOrderLineDetail, SalesOrderStatus, StockMovementType,
};
use crate::validation::validate_sales_order;

// =============================================================================
// State Guards
// =============================================================================

/// Fails with `InvalidState` unless the order is still a draft.
pub fn ensure_draft(order_id: &str, status: SalesOrderStatus) -> CoreResult<()> {
    match status {
        SalesOrderStatus::Draft => Ok(()),
        other => Err(CoreError::invalid_state(order_id, other)),
    }
}

/// Fails with `InvalidState(current)` unless `current → next` is allowed.
pub fn ensure_transition(
    order_id: &str,
    current: SalesOrderStatus,
    next: SalesOrderStatus,
) -> CoreResult<()> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(CoreError::invalid_state(order_id, current))
    }
}

// =============================================================================
// Draft Preparation
// =============================================================================

/// A line ready to be written, with its computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A validated draft with totals computed from its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOrder {
    pub customer_id: String,
    pub currency: String,
    pub notes: Option<String>,
    pub lines: Vec<DraftLine>,
    pub totals: OrderTotals,
}

impl DraftOrder {
    /// Validates editor input and prices it. Unit prices are taken as given.
    pub fn prepare(
        input: &SalesOrderInput,
        calculator: &TotalsCalculator,
    ) -> Result<Self, ValidationError> {
        let input = validate_sales_order(input)?;

        let lines: Vec<DraftLine> = input
            .lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let unit_price = Money::from_cents(line.unit_price_cents);
                let line_total = calculator
                    .line_total(line.quantity, unit_price)
                    .map_err(|_| ValidationError::TooLarge {
                        field: format!("lines[{i}].lineTotal"),
                    })?;
                Ok(DraftLine {
                    line_total,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price,
                })
            })
            .collect::<Result<_, ValidationError>>()?;

        let amounts: Vec<OrderLineAmount> = lines
            .iter()
            .map(|line| OrderLineAmount::new(line.quantity, line.unit_price))
            .collect();
        let totals = calculator.order_totals(&amounts)?;

        Ok(DraftOrder {
            customer_id: input.customer_id,
            currency: input.currency,
            notes: input.notes,
            lines,
            totals,
        })
    }

    /// Distinct product ids in first-appearance order.
    pub fn product_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id.clone());
            }
        }
        ids
    }
}

// =============================================================================
// Confirmation
// =============================================================================

/// Total quantity one confirmation takes of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDemand {
    pub product_id: String,
    pub product_name: String,
    pub requested: i64,
}

/// Checks the order can be confirmed and sums demand per product.
///
/// Products appear in the order of their first line, which decides which
/// shortage is reported when several products are short.
pub fn demand_by_product(
    order_id: &str,
    status: SalesOrderStatus,
    lines: &[SalesOrderLineDetail],
) -> CoreResult<Vec<ProductDemand>> {
    ensure_transition(order_id, status, SalesOrderStatus::Confirmed)?;

    if lines.is_empty() {
        return Err(CoreError::EmptyOrder {
            order_id: order_id.to_string(),
        });
    }

    let mut demand: Vec<ProductDemand> = Vec::new();
    for line in lines {
        match demand.iter_mut().find(|d| d.product_id == line.product_id) {
            // past i64::MAX no ledger could cover the demand anyway
            Some(existing) => existing.requested = existing.requested.saturating_add(line.quantity),
            None => demand.push(ProductDemand {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                requested: line.quantity,
            }),
        }
    }

    Ok(demand)
}

/// Fails with the first product whose available stock is below demand.
/// A product missing from `stock` has 0 available.
pub fn check_availability(demand: &[ProductDemand], stock: &HashMap<String, i64>) -> CoreResult<()> {
    for item in demand {
        let available = stock.get(&item.product_id).copied().unwrap_or(0);
        if available < item.requested {
            return Err(CoreError::InsufficientStock {
                product_name: item.product_name.clone(),
                available,
                requested: item.requested,
            });
        }
    }

    Ok(())
}

/// Note written on the OUT movements of a confirmed order.
pub fn sale_movement_note(order_id: &str) -> String {
    format!("Sale order {order_id}")
}

/// One OUT movement per order line.
pub fn outbound_movements(order_id: &str, lines: &[SalesOrderLineDetail]) -> Vec<NewStockMovement> {
    let note = sale_movement_note(order_id);
    lines
        .iter()
        .map(|line| NewStockMovement {
            product_id: line.product_id.clone(),
            movement_type: StockMovementType::Out,
            quantity: line.quantity,
            note: Some(note.clone()),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SalesOrderLineInput;
    use crate::{MAX_PRICE_CENTS, MAX_QUANTITY};

    fn line(product_id: &str, name: &str, quantity: i64) -> SalesOrderLineDetail {
        SalesOrderLineDetail {
            id: format!("line-{product_id}-{quantity}"),
            product_id: product_id.to_string(),
            product_name: name.to_string(),
            product_sku: name.to_uppercase(),
            position: 0,
            quantity,
            unit_price_cents: 100,
            line_total_cents: quantity.saturating_mul(100),
        }
    }

    #[test]
    fn test_ensure_draft() {
        assert!(ensure_draft("o1", SalesOrderStatus::Draft).is_ok());
        assert_eq!(
            ensure_draft("o1", SalesOrderStatus::Cancelled),
            Err(CoreError::invalid_state("o1", SalesOrderStatus::Cancelled))
        );
    }

    #[test]
    fn test_demand_sums_lines_in_first_appearance_order() {
        let lines = vec![
            line("laptop", "Laptop", 2),
            line("mouse", "Mouse", 4),
            line("laptop", "Laptop", 1),
        ];

        let demand = demand_by_product("o1", SalesOrderStatus::Draft, &lines).unwrap();
        assert_eq!(demand.len(), 2);
        assert_eq!(demand[0].product_id, "laptop");
        assert_eq!(demand[0].requested, 3);
        assert_eq!(demand[1].requested, 4);
    }

    #[test]
    fn test_demand_rejects_non_draft_before_empty_check() {
        let err = demand_by_product("o1", SalesOrderStatus::Confirmed, &[]).unwrap_err();
        assert_eq!(err, CoreError::invalid_state("o1", SalesOrderStatus::Confirmed));

        let err = demand_by_product("o1", SalesOrderStatus::Draft, &[]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyOrder { .. }));
    }

    #[test]
    fn test_check_availability_reports_first_shortage() {
        let demand = demand_by_product(
            "o1",
            SalesOrderStatus::Draft,
            &[line("a", "Alpha", 5), line("b", "Beta", 9), line("c", "Gamma", 9)],
        )
        .unwrap();

        let stock = HashMap::from([("a".to_string(), 5), ("b".to_string(), 1)]);
        assert_eq!(
            check_availability(&demand, &stock),
            Err(CoreError::InsufficientStock {
                product_name: "Beta".to_string(),
                available: 1,
                requested: 9,
            })
        );

        let plenty = HashMap::from([
            ("a".to_string(), 5),
            ("b".to_string(), 9),
            ("c".to_string(), 10),
        ]);
        assert!(check_availability(&demand, &plenty).is_ok());
    }

    #[test]
    fn test_outbound_movements_one_per_line() {
        let lines = vec![line("a", "Alpha", 2), line("a", "Alpha", 3)];
        let movements = outbound_movements("o1", &lines);

        assert_eq!(movements.len(), 2);
        assert!(movements
            .iter()
            .all(|m| m.movement_type == StockMovementType::Out
                && m.note.as_deref() == Some("Sale order o1")));
        assert_eq!(movements[1].quantity, 3);
    }

    #[test]
    fn test_prepare_draft_prices_lines() {
        let input = SalesOrderInput {
            customer_id: "c1".to_string(),
            currency: String::new(),
            notes: None,
            lines: vec![
                SalesOrderLineInput {
                    product_id: "laptop".to_string(),
                    quantity: 2,
                    unit_price_cents: 149_999,
                },
                SalesOrderLineInput {
                    product_id: "mouse".to_string(),
                    quantity: 4,
                    unit_price_cents: 32_950,
                },
                SalesOrderLineInput {
                    product_id: "laptop".to_string(),
                    quantity: 1,
                    unit_price_cents: 0,
                },
            ],
        };

        let draft = DraftOrder::prepare(&input, &TotalsCalculator::default()).unwrap();
        assert_eq!(draft.currency, "EUR");
        assert_eq!(draft.lines[0].line_total.cents(), 299_998);
        assert_eq!(draft.totals.total.cents(), 522_476);
        assert_eq!(draft.product_ids(), vec!["laptop".to_string(), "mouse".to_string()]);
    }

    fn single_line_order(quantity: i64, unit_price_cents: i64, copies: usize) -> SalesOrderInput {
        SalesOrderInput {
            customer_id: "c1".to_string(),
            currency: "EUR".to_string(),
            notes: None,
            lines: vec![
                SalesOrderLineInput {
                    product_id: "laptop".to_string(),
                    quantity,
                    unit_price_cents,
                };
                copies
            ],
        }
    }

    #[test]
    fn test_prepare_rejects_amounts_past_the_caps() {
        let calc = TotalsCalculator::default();

        let err = DraftOrder::prepare(&single_line_order(3, i64::MAX / 2, 1), &calc).unwrap_err();
        assert_eq!(err.field(), "lines[0].unitPrice");

        let err = DraftOrder::prepare(&single_line_order(MAX_QUANTITY + 1, 100, 1), &calc)
            .unwrap_err();
        assert_eq!(err.field(), "lines[0].quantity");

        // every line is within the caps, the order as a whole is not
        let err = DraftOrder::prepare(
            &single_line_order(MAX_QUANTITY, MAX_PRICE_CENTS, 10),
            &calc,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::TooLarge { field: "subtotal".to_string() });

        let draft =
            DraftOrder::prepare(&single_line_order(MAX_QUANTITY, MAX_PRICE_CENTS, 1), &calc)
                .unwrap();
        assert_eq!(draft.totals.subtotal.cents(), MAX_QUANTITY * MAX_PRICE_CENTS);
    }

    #[test]
    fn test_demand_saturates_instead_of_wrapping() {
        let lines = vec![line("a", "Alpha", i64::MAX), line("a", "Alpha", 1)];
        let demand = demand_by_product("o1", SalesOrderStatus::Draft, &lines).unwrap();
        assert_eq!(demand[0].requested, i64::MAX);
    }
}
