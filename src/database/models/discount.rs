use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const DISCOUNT_COLUMNS: &str =
    "id, service_id, name, percentage, start_at, end_at, is_active, created_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Discount {
    pub id: i64,
    pub service_id: i64,
    pub name: String,
    pub percentage: i64, // 1..=99
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiscount {
    pub service_id: i64,
    pub name: String,
    pub percentage: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl Discount {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        new: &NewDiscount,
    ) -> Result<Self, sqlx::Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO discounts (service_id, name, percentage, start_at, end_at, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(new.service_id)
        .bind(&new.name)
        .bind(new.percentage)
        .bind(new.start_at)
        .bind(new.end_at)
        .bind(Utc::now())
        .execute(pool)
        .await?
        .last_insert_rowid();

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Discount>(&format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_service(
        pool: &sqlx::SqlitePool,
        service_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE service_id = ? ORDER BY id"
        ))
        .bind(service_id)
        .fetch_all(pool)
        .await
    }

    /// Flips `is_active`. Returns false when the discount does not exist.
    pub async fn toggle_active(pool: &sqlx::SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE discounts SET is_active = NOT is_active WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &sqlx::SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the discount applies at `now` (both ends inclusive).
    pub fn applies_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_at <= now && now <= self.end_at
    }
}
