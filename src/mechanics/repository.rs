use sqlx::PgPool;

use crate::mechanics::models::Mechanic;
use crate::pagination::Page;

pub(crate) const MECHANIC_COLUMNS: &str =
    "id, name, username, email, phone, address, hours_worked, specialty, password_hash";

/// Insert payload with the password already hashed
#[derive(Debug, Clone)]
pub struct NewMechanic {
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub specialty: Option<String>,
    pub hours_worked: i32,
    pub password_hash: String,
}

/// Repository for mechanic rows
#[derive(Clone)]
pub struct MechanicRepository {
    pool: PgPool,
}

impl MechanicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM mechanics")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Mechanic>, sqlx::Error> {
        sqlx::query_as::<_, Mechanic>(&format!(
            "SELECT {} FROM mechanics ORDER BY id LIMIT $1 OFFSET $2",
            MECHANIC_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Mechanic>, sqlx::Error> {
        sqlx::query_as::<_, Mechanic>(&format!(
            "SELECT {} FROM mechanics WHERE id = $1",
            MECHANIC_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Mechanic>, sqlx::Error> {
        sqlx::query_as::<_, Mechanic>(&format!(
            "SELECT {} FROM mechanics WHERE LOWER(email) = LOWER($1)",
            MECHANIC_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM mechanics WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(email.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    pub async fn username_taken(
        &self,
        username: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM mechanics WHERE username = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(username.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    pub async fn create(&self, mechanic: NewMechanic) -> Result<Mechanic, sqlx::Error> {
        sqlx::query_as::<_, Mechanic>(&format!(
            r#"
            INSERT INTO mechanics (name, username, email, phone, address, specialty, hours_worked, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            MECHANIC_COLUMNS
        ))
        .bind(mechanic.name)
        .bind(mechanic.username)
        .bind(mechanic.email)
        .bind(mechanic.phone)
        .bind(mechanic.address)
        .bind(mechanic.specialty)
        .bind(mechanic.hours_worked)
        .bind(mechanic.password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// Writes every mutable column of an already merged record
    pub async fn update(&self, mechanic: &Mechanic) -> Result<Mechanic, sqlx::Error> {
        sqlx::query_as::<_, Mechanic>(&format!(
            r#"
            UPDATE mechanics
            SET name = $2, username = $3, email = $4, phone = $5, address = $6,
                hours_worked = $7, specialty = $8, password_hash = $9
            WHERE id = $1
            RETURNING {}
            "#,
            MECHANIC_COLUMNS
        ))
        .bind(mechanic.id)
        .bind(&mechanic.name)
        .bind(&mechanic.username)
        .bind(&mechanic.email)
        .bind(&mechanic.phone)
        .bind(&mechanic.address)
        .bind(mechanic.hours_worked)
        .bind(&mechanic.specialty)
        .bind(&mechanic.password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes the mechanic; ticket assignments are removed by cascade
    pub async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mechanics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
