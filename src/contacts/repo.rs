use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: OffsetDateTime,
}

/// Validated, cleaned contact fields ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl Contact {
    /// All contacts belonging to `owner_id`, in insertion order.
    pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, user_id, name, email, phone, address, created_at
            FROM contacts
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(db: &PgPool, owner_id: Uuid, fields: &NewContact) -> anyhow::Result<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (user_id, name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, email, phone, address, created_at
            "#,
        )
        .bind(owner_id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.address)
        .fetch_one(db)
        .await?;
        Ok(contact)
    }

    /// Delete a contact only when both id and owner match. Returns whether a
    /// row was removed; a miss (including someone else's contact) is a
    /// no-op, not an error.
    pub async fn delete_by_owner(
        db: &PgPool,
        contact_id: Uuid,
        owner_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM contacts
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(contact_id)
        .bind(owner_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
