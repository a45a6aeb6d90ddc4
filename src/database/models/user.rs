use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64, // Telegram user id
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates the user or refreshes the profile fields of an existing one.
    pub async fn upsert(
        pool: &sqlx::SqlitePool,
        id: i64,
        username: Option<String>,
        first_name: String,
        last_name: String,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, first_name, last_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(&username)
        .bind(&first_name)
        .bind(&last_name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, first_name, last_name, created_at, updated_at FROM users WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    pub fn display_name(&self) -> String {
        display_name(self.username.as_deref(), &self.first_name, &self.last_name)
    }
}

/// "First Last (@username)", degrading gracefully when parts are missing.
pub fn display_name(username: Option<&str>, first_name: &str, last_name: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string();
    match (full.is_empty(), username) {
        (false, Some(u)) => format!("{full} (@{u})"),
        (false, None) => full,
        (true, Some(u)) => format!("@{u}"),
        (true, None) => "Unknown client".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_variants() {
        assert_eq!(display_name(Some("anna"), "Anna", "K"), "Anna K (@anna)");
        assert_eq!(display_name(None, "Anna", ""), "Anna");
        assert_eq!(display_name(Some("anna"), "", ""), "@anna");
        assert_eq!(display_name(None, " ", ""), "Unknown client");
    }
}
