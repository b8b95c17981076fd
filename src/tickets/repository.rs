use sqlx::{FromRow, PgPool};

use crate::inventory::models::Part;
use crate::inventory::repository::PART_COLUMNS;
use crate::mechanics::models::Mechanic;
use crate::mechanics::repository::MECHANIC_COLUMNS;
use crate::pagination::Page;
use crate::tickets::models::{ServiceTicket, TicketStatus};

const TICKET_COLUMNS: &str =
    "id, customer_id, description, status, created_at, vehicle_id, hours_worked, repair";

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub customer_id: i32,
    pub description: String,
    pub status: TicketStatus,
    pub vehicle_id: Option<String>,
    pub hours_worked: i32,
    pub repair: Option<String>,
}

/// A mechanic together with the ticket it is assigned to
#[derive(Debug, FromRow)]
pub struct TicketMechanicRow {
    pub ticket_id: i32,
    #[sqlx(flatten)]
    pub mechanic: Mechanic,
}

/// A part together with the ticket it was added to
#[derive(Debug, FromRow)]
pub struct TicketPartRow {
    pub ticket_id: i32,
    #[sqlx(flatten)]
    pub part: Part,
}

/// Outcome of linking a part to a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartLink {
    /// Stock seen inside the transaction
    Added { quantity: i32 },
    AlreadyAdded,
    OutOfStock(i32),
    PartMissing,
}

/// Repository for service tickets and their join tables
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the ticket and assigns its creator in one transaction
    pub async fn create(
        &self,
        ticket: NewTicket,
        creator_id: i32,
    ) -> Result<ServiceTicket, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, ServiceTicket>(&format!(
            r#"
            INSERT INTO service_tickets (customer_id, description, status, vehicle_id, hours_worked, repair)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TICKET_COLUMNS
        ))
        .bind(ticket.customer_id)
        .bind(ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.vehicle_id)
        .bind(ticket.hours_worked)
        .bind(ticket.repair)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO service_ticket_mechanics (ticket_id, mechanic_id) VALUES ($1, $2)")
            .bind(created.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<ServiceTicket>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTicket>(&format!(
            "SELECT {} FROM service_tickets WHERE id = $1",
            TICKET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<ServiceTicket>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTicket>(&format!(
            "SELECT {} FROM service_tickets ORDER BY id",
            TICKET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_for_customer(&self, customer_id: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM service_tickets WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list_for_customer(
        &self,
        customer_id: i32,
        page: Page,
    ) -> Result<Vec<ServiceTicket>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTicket>(&format!(
            "SELECT {} FROM service_tickets WHERE customer_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            TICKET_COLUMNS
        ))
        .bind(customer_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    pub async fn all_for_customer(&self, customer_id: i32) -> Result<Vec<ServiceTicket>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTicket>(&format!(
            "SELECT {} FROM service_tickets WHERE customer_id = $1 ORDER BY id",
            TICKET_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Tickets assigned to the mechanic, optionally restricted to one status
    pub async fn count_for_mechanic(
        &self,
        mechanic_id: i32,
        status: Option<TicketStatus>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM service_tickets
            JOIN service_ticket_mechanics tm ON tm.ticket_id = service_tickets.id
            WHERE tm.mechanic_id = $1 AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(mechanic_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_for_mechanic(
        &self,
        mechanic_id: i32,
        status: Option<TicketStatus>,
        page: Page,
    ) -> Result<Vec<ServiceTicket>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTicket>(&format!(
            r#"
            SELECT {} FROM service_tickets
            JOIN service_ticket_mechanics tm ON tm.ticket_id = service_tickets.id
            WHERE tm.mechanic_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
            TICKET_COLUMNS
        ))
        .bind(mechanic_id)
        .bind(status.map(|s| s.as_str()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    pub async fn all_for_mechanic(&self, mechanic_id: i32) -> Result<Vec<ServiceTicket>, sqlx::Error> {
        sqlx::query_as::<_, ServiceTicket>(&format!(
            r#"
            SELECT {} FROM service_tickets
            JOIN service_ticket_mechanics tm ON tm.ticket_id = service_tickets.id
            WHERE tm.mechanic_id = $1
            ORDER BY id
            "#,
            TICKET_COLUMNS
        ))
        .bind(mechanic_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn mechanic_ids(&self, ticket_id: i32) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT mechanic_id FROM service_ticket_mechanics WHERE ticket_id = $1 ORDER BY mechanic_id",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Assigned mechanics of every ticket in `ticket_ids`
    pub async fn mechanics_for(&self, ticket_ids: &[i32]) -> Result<Vec<TicketMechanicRow>, sqlx::Error> {
        sqlx::query_as::<_, TicketMechanicRow>(&format!(
            r#"
            SELECT tm.ticket_id, {} FROM service_ticket_mechanics tm
            JOIN mechanics ON mechanics.id = tm.mechanic_id
            WHERE tm.ticket_id = ANY($1)
            ORDER BY tm.ticket_id, mechanics.id
            "#,
            MECHANIC_COLUMNS
        ))
        .bind(ticket_ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Parts of every ticket in `ticket_ids`
    pub async fn parts_for(&self, ticket_ids: &[i32]) -> Result<Vec<TicketPartRow>, sqlx::Error> {
        sqlx::query_as::<_, TicketPartRow>(&format!(
            r#"
            SELECT tp.ticket_id, {} FROM service_ticket_parts tp
            JOIN inventory ON inventory.id = tp.part_id
            WHERE tp.ticket_id = ANY($1)
            ORDER BY tp.ticket_id, inventory.id
            "#,
            PART_COLUMNS
        ))
        .bind(ticket_ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Returns false when the mechanic was already assigned
    pub async fn assign_mechanic(&self, ticket_id: i32, mechanic_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO service_ticket_mechanics (ticket_id, mechanic_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(ticket_id)
        .bind(mechanic_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_mechanic(&self, ticket_id: i32, mechanic_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM service_ticket_mechanics WHERE ticket_id = $1 AND mechanic_id = $2",
        )
        .bind(ticket_id)
        .bind(mechanic_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Links a part to a ticket if it is in stock. The existing-link check,
    /// the stock read and the insert share one transaction; the part row is
    /// locked so a concurrent stock change waits for the commit.
    pub async fn add_part(&self, ticket_id: i32, part_id: i32) -> Result<PartLink, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let linked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM service_ticket_parts WHERE ticket_id = $1 AND part_id = $2)",
        )
        .bind(ticket_id)
        .bind(part_id)
        .fetch_one(&mut *tx)
        .await?;
        if linked {
            return Ok(PartLink::AlreadyAdded);
        }

        let quantity: Option<i32> =
            sqlx::query_scalar("SELECT quantity FROM inventory WHERE id = $1 FOR SHARE")
                .bind(part_id)
                .fetch_optional(&mut *tx)
                .await?;
        let quantity = match quantity {
            Some(q) if q > 0 => q,
            Some(q) => return Ok(PartLink::OutOfStock(q)),
            None => return Ok(PartLink::PartMissing),
        };

        let result = sqlx::query(
            "INSERT INTO service_ticket_parts (ticket_id, part_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(ticket_id)
        .bind(part_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(if result.rows_affected() > 0 {
            PartLink::Added { quantity }
        } else {
            PartLink::AlreadyAdded
        })
    }

    pub async fn remove_part(&self, ticket_id: i32, part_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM service_ticket_parts WHERE ticket_id = $1 AND part_id = $2")
            .bind(ticket_id)
            .bind(part_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Writes the mutable columns of an already merged ticket
    pub async fn update(&self, ticket: &ServiceTicket) -> Result<ServiceTicket, sqlx::Error> {
        sqlx::query_as::<_, ServiceTicket>(&format!(
            r#"
            UPDATE service_tickets
            SET description = $2, status = $3, vehicle_id = $4, hours_worked = $5, repair = $6
            WHERE id = $1
            RETURNING {}
            "#,
            TICKET_COLUMNS
        ))
        .bind(ticket.id)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(&ticket.vehicle_id)
        .bind(ticket.hours_worked)
        .bind(&ticket.repair)
        .fetch_one(&self.pool)
        .await
    }
}
