//! # Customer Repository
//!
//! Database operations for customers.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use orbis_core::validation::{validate_customer, validate_search_query};
use orbis_core::{CoreError, Customer, CustomerInput};

use super::{generate_id, like_pattern};
use crate::error::{DbResult, ServiceResult};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Validates and inserts a customer.
    pub async fn create(&self, input: &CustomerInput) -> ServiceResult<Customer> {
        let input = validate_customer(input)?;
        let now = Utc::now();

        let customer = Customer {
            id: generate_id(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers by name, optionally filtered by a name/email substring.
    pub async fn list(&self, search: Option<&str>) -> ServiceResult<Vec<Customer>> {
        let pattern = validate_search_query(search)?.map(|q| like_pattern(&q));

        debug!(search = ?pattern, "Listing customers");

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE ?1 IS NULL
               OR name LIKE ?1 ESCAPE '\'
               OR email LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE, created_at
            "#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Validates and updates a customer.
    pub async fn update(&self, id: &str, input: &CustomerInput) -> ServiceResult<Customer> {
        let input = validate_customer(input)?;
        let now = Utc::now();

        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                email = ?3,
                phone = ?4,
                address = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Customer", id).into());
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Customer", id).into())
    }

    /// Deletes a customer. Fails with a foreign key violation while orders
    /// still reference it.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Customer", id).into());
        }

        Ok(())
    }
}

/// Whether a customer exists, within the caller's transaction.
pub(crate) async fn customer_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}
