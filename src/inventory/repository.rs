use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::db::escape_like;
use crate::inventory::models::Part;
use crate::pagination::Page;

pub(crate) const PART_COLUMNS: &str = "id, name, description, price, quantity";

#[derive(Debug, Clone)]
pub struct NewPart {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
}

/// Repository for inventory parts
#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Part>, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            "SELECT {} FROM inventory ORDER BY id LIMIT $1 OFFSET $2",
            PART_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Part>, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            "SELECT {} FROM inventory WHERE id = $1",
            PART_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Exact, case-insensitive name lookup
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Part>, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            "SELECT {} FROM inventory WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1",
            PART_COLUMNS
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
    }

    /// Substring search on the part name
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Part>, sqlx::Error> {
        let pattern = format!("%{}%", escape_like(query));
        sqlx::query_as::<_, Part>(&format!(
            "SELECT {} FROM inventory WHERE name ILIKE $1 ORDER BY name LIMIT $2",
            PART_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Parts with `quantity <= threshold`, scarcest first
    pub async fn low_stock(&self, threshold: i64) -> Result<Vec<Part>, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            "SELECT {} FROM inventory WHERE quantity <= $1 ORDER BY quantity, id",
            PART_COLUMNS
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM inventory WHERE LOWER(name) = LOWER($1) AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    pub async fn create(&self, part: NewPart) -> Result<Part, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            r#"
            INSERT INTO inventory (name, description, price, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            PART_COLUMNS
        ))
        .bind(part.name)
        .bind(part.description)
        .bind(part.price)
        .bind(part.quantity)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(&self, part: &Part) -> Result<Part, sqlx::Error> {
        sqlx::query_as::<_, Part>(&format!(
            r#"
            UPDATE inventory
            SET name = $2, description = $3, price = $4, quantity = $5
            WHERE id = $1
            RETURNING {}
            "#,
            PART_COLUMNS
        ))
        .bind(part.id)
        .bind(&part.name)
        .bind(&part.description)
        .bind(part.price)
        .bind(part.quantity)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes the part; ticket links are removed by cascade
    pub async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
