use sqlx::PgPool;

use crate::customers::models::Customer;
use crate::pagination::Page;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, password_hash";

/// Insert payload with the password already hashed
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password_hash: String,
}

/// Repository for customer rows
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers ORDER BY id LIMIT $1 OFFSET $2",
            CUSTOMER_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Case-insensitive lookup used by login
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE LOWER(email) = LOWER($1)",
            CUSTOMER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
    }

    /// True when another customer already uses `email`
    pub async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(email.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    pub async fn create(&self, customer: NewCustomer) -> Result<Customer, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, email, phone, address, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(customer.name)
        .bind(customer.email)
        .bind(customer.phone)
        .bind(customer.address)
        .bind(customer.password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// Writes every mutable column of an already merged record
    pub async fn update(&self, customer: &Customer) -> Result<Customer, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, address = $5, password_hash = $6
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes the customer; their tickets go with them
    pub async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
