use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const SERVICE_COLUMNS: &str =
    "id, name, description, duration, price, is_active, created_at, updated_at, deleted_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub duration: i64, // minutes
    pub price: i64,    // minor currency units
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub duration: i64,
    pub price: i64,
}

impl Service {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        new: &NewService,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO services (name, description, duration, price, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, TRUE, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.duration)
        .bind(new.price)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?
        .last_insert_rowid();

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Looks up a service that has not been deleted, active or not.
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_active(
        pool: &sqlx::SqlitePool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = TRUE AND deleted_at IS NULL ORDER BY id"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_all(
        pool: &sqlx::SqlitePool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE deleted_at IS NULL ORDER BY id"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn count_active(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM services WHERE is_active = TRUE AND deleted_at IS NULL"
        )
        .fetch_one(pool)
        .await
    }

    /// Persists name, description, duration, price and the active flag.
    /// Returns false when the service no longer exists.
    pub async fn save(&self, pool: &sqlx::SqlitePool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET name = ?, description = ?, duration = ?, price = ?, is_active = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.duration)
        .bind(self.price)
        .bind(self.is_active)
        .bind(Utc::now())
        .bind(self.id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft delete; bookings keep resolving the service for display and durations.
    pub async fn soft_delete(pool: &sqlx::SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE services SET deleted_at = ?, is_active = FALSE, updated_at = ? WHERE id = ? AND deleted_at IS NULL"
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_all(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services")
            .fetch_one(pool)
            .await
    }
}
