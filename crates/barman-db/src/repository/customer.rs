//! # Customer Repository
//!
//! Database operations for the customer credit ledger.
//!
//! ## Derived Balances
//! A customer's outstanding balance is never stored. It is always
//! `SUM(total_kobo)` over their committed pending sales, computed at read
//! time. Payment-status flips and new batches therefore can never leave a
//! stale counter behind; the balance a credit check sees inside its
//! transaction is exact.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, EngineError};
use barman_core::validation::{validate_kobo_amount, validate_name, validate_phone_number};
use barman_core::{CoreError, Customer, CustomerTab, Money};

const CUSTOMER_COLUMNS: &str = "id, name, phone_number, tab_limit_kobo, created_at, updated_at";

/// Repository for customer credit ledger operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_tx(&mut conn, id).await
    }

    /// Lists all customers, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Inserts a new customer.
    ///
    /// Input is validated before any SQL runs, so a malformed name, phone
    /// number, or negative limit comes back as a rejection rather than a
    /// constraint failure from the database.
    pub async fn insert(&self, customer: &Customer) -> Result<(), EngineError> {
        validate_customer_input(
            &customer.name,
            customer.phone_number.as_deref(),
            customer.tab_limit_kobo,
        )?;

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers \
             (id, name, phone_number, tab_limit_kobo, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone_number)
        .bind(customer.tab_limit_kobo)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a customer's tab limit.
    ///
    /// The explicit administrative path for granting (or shrinking) credit
    /// room. The batch engine reports what limit a rejected batch would have
    /// needed; only this call actually changes it. Shrinking below the
    /// current balance is allowed - existing debt stands, new pending
    /// batches are simply rejected until it is paid down. A negative limit
    /// is a validation rejection.
    pub async fn update_limit(
        &self,
        customer_id: &str,
        new_limit_kobo: i64,
    ) -> Result<(), EngineError> {
        validate_kobo_amount("tab_limit_kobo", new_limit_kobo).map_err(CoreError::from)?;

        debug!(id = %customer_id, limit = %new_limit_kobo, "Updating tab limit");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE customers SET tab_limit_kobo = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(customer_id)
                .bind(new_limit_kobo)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer_id).into());
        }

        Ok(())
    }

    /// Updates a customer's contact details.
    pub async fn update_details(
        &self,
        customer_id: &str,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<(), EngineError> {
        validate_name(name).map_err(CoreError::from)?;
        if let Some(phone) = phone_number {
            validate_phone_number(phone).map_err(CoreError::from)?;
        }

        debug!(id = %customer_id, "Updating customer details");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET name = ?2, phone_number = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(customer_id)
        .bind(name)
        .bind(phone_number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer_id).into());
        }

        Ok(())
    }

    /// Returns a customer's current outstanding balance.
    pub async fn tab_balance(&self, customer_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        Self::tab_balance_tx(&mut conn, customer_id).await
    }

    /// Lists every customer with their live outstanding balance, sorted by
    /// name. Customers with no pending sales show a zero balance.
    pub async fn list_tabs(&self) -> DbResult<Vec<CustomerTab>> {
        let tabs = sqlx::query_as::<_, CustomerTab>(
            "SELECT \
                 c.id AS customer_id, \
                 c.name AS customer_name, \
                 c.phone_number AS phone_number, \
                 c.tab_limit_kobo AS tab_limit_kobo, \
                 COALESCE(SUM(CASE WHEN s.payment_status = 'pending' THEN s.total_kobo ELSE 0 END), 0) \
                     AS balance_kobo \
             FROM customers c \
             LEFT JOIN sales s ON s.customer_id = c.id \
             GROUP BY c.id \
             ORDER BY c.name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tabs)
    }

    // =========================================================================
    // Transaction-scoped operations (used by the batch engine)
    // =========================================================================

    /// Fetches one customer inside an open transaction.
    pub async fn fetch_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(customer)
    }

    /// Recomputes the customer's outstanding pending balance inside an open
    /// transaction. Credit decisions must call this, not a cached value.
    pub async fn tab_balance_tx(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Money> {
        let balance: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_kobo), 0) FROM sales \
             WHERE customer_id = ?1 AND payment_status = 'pending'",
        )
        .bind(customer_id)
        .fetch_one(conn)
        .await?;

        Ok(Money::from_kobo(balance))
    }
}

/// Shape checks shared by the customer write paths.
fn validate_customer_input(
    name: &str,
    phone_number: Option<&str>,
    tab_limit_kobo: i64,
) -> Result<(), EngineError> {
    validate_name(name).map_err(CoreError::from)?;
    if let Some(phone) = phone_number {
        validate_phone_number(phone).map_err(CoreError::from)?;
    }
    validate_kobo_amount("tab_limit_kobo", tab_limit_kobo).map_err(CoreError::from)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
