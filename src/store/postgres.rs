use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::{ExpenseStore, StoreError};
use crate::config::DatabaseConfig;
use crate::models::{timestamp_now, Category, Expense, NewExpense};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS expenses (
        seq         BIGSERIAL,
        id          UUID PRIMARY KEY,
        owner_id    UUID NOT NULL,
        title       TEXT NOT NULL,
        category    TEXT NOT NULL,
        value       DOUBLE PRECISION NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
"#;

const CREATE_OWNER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS expenses_owner_seq_idx ON expenses (owner_id, seq)";

const COLUMNS: &str = "id, owner_id, title, category, value, created_at, updated_at";

/// Row shape as stored; `category` is plain TEXT
#[derive(Debug, FromRow)]
struct ExpenseRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    category: String,
    value: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = StoreError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse::<Category>()
            .map_err(|reason| StoreError::Corrupt { id: row.id, reason })?;

        Ok(Expense {
            id: row.id,
            title: row.title,
            category,
            value: row.value,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the `expenses` table exists
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        info!("Connected expense store to PostgreSQL");
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_OWNER_INDEX).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ExpenseStore for PgStore {
    async fn create(&self, owner: Uuid, fields: NewExpense) -> Result<Expense, StoreError> {
        let expense = Expense::new(owner, fields);

        sqlx::query(
            "INSERT INTO expenses (id, owner_id, title, category, value, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(expense.id)
        .bind(expense.owner_id)
        .bind(&expense.title)
        .bind(expense.category.as_str())
        .bind(expense.value)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Expense>, StoreError> {
        let sql = format!("SELECT {} FROM expenses WHERE owner_id = $1 ORDER BY seq", COLUMNS);
        let rows = sqlx::query_as::<_, ExpenseRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Expense::try_from).collect()
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Expense>, StoreError> {
        let sql = format!("SELECT {} FROM expenses WHERE id = $1 AND owner_id = $2", COLUMNS);
        let row = sqlx::query_as::<_, ExpenseRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Expense::try_from).transpose()
    }

    async fn update(&self, owner: Uuid, id: Uuid, fields: NewExpense) -> Result<Option<Expense>, StoreError> {
        let sql = format!(
            "UPDATE expenses SET title = $3, category = $4, value = $5, updated_at = $6
             WHERE id = $1 AND owner_id = $2
             RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query_as::<_, ExpenseRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(&fields.title)
            .bind(fields.category.as_str())
            .bind(fields.value)
            .bind(timestamp_now())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Expense::try_from).transpose()
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
