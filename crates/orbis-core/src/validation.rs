//! # Validation Module
//!
//! Input validation and normalization for Orbis ERP.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (form / CLI argument parsing)                         │
//! │  └── Types and basic formats (numbers, decimal prices)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, ranges                                  │
//! │  └── Normalization (trim, upper-case SKU/currency, empty → None)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (sku)                                                      │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that normalize return the cleaned value, so callers never
//! persist untrimmed input.
//!
//! ## Usage
//! ```rust
//! use orbis_core::validation::{validate_sku, validate_quantity};
//!
//! assert_eq!(validate_sku(" lap-14 ").unwrap(), "LAP-14");
//! assert!(validate_quantity("quantity", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{CustomerInput, ProductInput, SalesOrderInput, SalesOrderLineInput, StockAdjustmentInput};
use crate::{
    DEFAULT_CURRENCY, MAX_CURRENCY_LEN, MAX_MOVEMENT_NOTE_LEN, MAX_ORDER_NOTES_LEN, MAX_PRICE_CENTS,
    MAX_QUANTITY,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_PRODUCT_NAME_LEN: usize = 150;
pub const MAX_SKU_LEN: usize = 80;
pub const MAX_PRODUCT_DESCRIPTION_LEN: usize = 500;
pub const MAX_CUSTOMER_NAME_LEN: usize = 120;
pub const MAX_EMAIL_LEN: usize = 190;
pub const MAX_PHONE_LEN: usize = 30;
pub const MAX_ADDRESS_LEN: usize = 255;
pub const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Trims a required text field and enforces its maximum length.
pub fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }

    Ok(value.to_string())
}

/// Trims an optional text field. Blank input becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }

    Ok(Some(value.to_string()))
}

/// Validates a SKU (Stock Keeping Unit) and returns it upper-cased.
///
/// ## Rules
/// - Must not be empty
/// - At most 80 characters
/// - Letters, digits, hyphens, underscores and dots only
///
/// ## Example
/// ```rust
/// use orbis_core::validation::validate_sku;
///
/// assert_eq!(validate_sku("kbd-us.2").unwrap(), "KBD-US.2");
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<String> {
    let sku = required_text("sku", sku, MAX_SKU_LEN)?;

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores and dots".to_string(),
        });
    }

    Ok(sku.to_uppercase())
}

/// Validates an optional email address.
///
/// Accepts `local@domain.tld` shapes: one `@`, no whitespace, and a dot
/// inside the domain part.
pub fn validate_email(email: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(email) = optional_text("email", email, MAX_EMAIL_LEN)? else {
        return Ok(None);
    };

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let dotted = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !dotted {
        return Err(invalid());
    }

    Ok(Some(email))
}

/// Normalizes a currency code: blank → default, upper-cased, max 8 chars.
pub fn validate_currency(currency: &str) -> ValidationResult<String> {
    let currency = currency.trim();
    if currency.is_empty() {
        return Ok(DEFAULT_CURRENCY.to_string());
    }
    if currency.chars().count() > MAX_CURRENCY_LEN {
        return Err(ValidationError::too_long("currency", MAX_CURRENCY_LEN));
    }

    Ok(currency.to_uppercase())
}

/// Validates a search query. Blank means "no filter".
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    optional_text("query", query, MAX_SEARCH_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line or receipt quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most [`MAX_QUANTITY`]
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the signed quantity of a manual adjustment: non-zero and
/// within ±[`MAX_QUANTITY`].
pub fn validate_adjustment_quantity(qty: i64) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: "quantity".to_string(),
        });
    }
    if !(-MAX_QUANTITY..=MAX_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: -MAX_QUANTITY,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - At most [`MAX_PRICE_CENTS`]
///
/// ## Example
/// ```rust
/// use orbis_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("price", 1099).is_ok());
/// assert!(validate_price_cents("price", 0).is_ok());
/// assert!(validate_price_cents("price", -100).is_err());
/// assert!(validate_price_cents("price", i64::MAX).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates and normalizes a product form.
pub fn validate_product(input: &ProductInput) -> ValidationResult<ProductInput> {
    let name = required_text("name", &input.name, MAX_PRODUCT_NAME_LEN)?;
    let sku = validate_sku(&input.sku)?;
    let description = optional_text(
        "description",
        input.description.as_deref(),
        MAX_PRODUCT_DESCRIPTION_LEN,
    )?;
    validate_price_cents("price", input.price_cents)?;
    if let Some(cost) = input.cost_cents {
        validate_price_cents("cost", cost)?;
    }

    Ok(ProductInput {
        name,
        sku,
        description,
        price_cents: input.price_cents,
        cost_cents: input.cost_cents,
        is_active: input.is_active,
    })
}

/// Validates and normalizes a customer form.
pub fn validate_customer(input: &CustomerInput) -> ValidationResult<CustomerInput> {
    Ok(CustomerInput {
        name: required_text("name", &input.name, MAX_CUSTOMER_NAME_LEN)?,
        email: validate_email(input.email.as_deref())?,
        phone: optional_text("phone", input.phone.as_deref(), MAX_PHONE_LEN)?,
        address: optional_text("address", input.address.as_deref(), MAX_ADDRESS_LEN)?,
    })
}

/// Validates a manual adjustment (signed, non-zero).
pub fn validate_adjustment(input: &StockAdjustmentInput) -> ValidationResult<StockAdjustmentInput> {
    let product_id = required_text("productId", &input.product_id, 64)?;
    validate_adjustment_quantity(input.quantity)?;

    Ok(StockAdjustmentInput {
        product_id,
        quantity: input.quantity,
        note: optional_text("note", input.note.as_deref(), MAX_MOVEMENT_NOTE_LEN)?,
    })
}

/// Validates a goods receipt (positive quantity).
pub fn validate_receipt(input: &StockAdjustmentInput) -> ValidationResult<StockAdjustmentInput> {
    let product_id = required_text("productId", &input.product_id, 64)?;
    validate_quantity("quantity", input.quantity)?;

    Ok(StockAdjustmentInput {
        product_id,
        quantity: input.quantity,
        note: optional_text("note", input.note.as_deref(), MAX_MOVEMENT_NOTE_LEN)?,
    })
}

/// Validates and normalizes a draft order submitted by the editor.
///
/// Existence of the customer and products is checked later, against the
/// database.
pub fn validate_sales_order(input: &SalesOrderInput) -> ValidationResult<SalesOrderInput> {
    let customer_id = required_text("customerId", &input.customer_id, 64)?;
    let currency = validate_currency(&input.currency)?;
    let notes = optional_text("notes", input.notes.as_deref(), MAX_ORDER_NOTES_LEN)?;

    if input.lines.is_empty() {
        return Err(ValidationError::required("lines"));
    }

    let lines = input
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let product_id = required_text(&format!("lines[{i}].productId"), &line.product_id, 64)?;
            validate_quantity(&format!("lines[{i}].quantity"), line.quantity)?;
            validate_price_cents(&format!("lines[{i}].unitPrice"), line.unit_price_cents)?;

            Ok(SalesOrderLineInput {
                product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    Ok(SalesOrderInput {
        customer_id,
        currency,
        notes,
        lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
