use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{format_cents, Cents, MoneyFormat, TransactionRecord};

use super::MIGRATION_001_INITIAL;

pub type ReceiptId = Uuid;

/// A receipt as it is written to the store. Date and amount are text so the
/// store can hold whatever the upstream system produced.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub received_on: Option<String>,
    pub category: String,
    pub item: String,
    pub amount: Option<String>,
}

impl NewReceipt {
    /// A receipt with already-validated values.
    pub fn new(
        received_on: NaiveDate,
        category: impl Into<String>,
        item: impl Into<String>,
        amount_cents: Cents,
    ) -> Self {
        Self {
            received_on: Some(received_on.format("%Y-%m-%d").to_string()),
            category: category.into(),
            item: item.into(),
            amount: Some(format_cents(amount_cents, &MoneyFormat::plain())),
        }
    }
}

/// Repository for persisting and reading receipts.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Save a receipt and return its generated ID.
    pub async fn save_receipt(&self, receipt: &NewReceipt) -> Result<ReceiptId> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO receipts (id, received_on, category, item, amount, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&receipt.received_on)
        .bind(&receipt.category)
        .bind(&receipt.item)
        .bind(&receipt.amount)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save receipt")?;

        Ok(id)
    }

    /// Save many receipts in one transaction. Either all are stored or none.
    pub async fn save_receipts(&self, receipts: &[NewReceipt]) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let recorded_at = Utc::now().to_rfc3339();

        for receipt in receipts {
            sqlx::query(
                r#"
                INSERT INTO receipts (id, received_on, category, item, amount, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&receipt.received_on)
            .bind(&receipt.category)
            .bind(&receipt.item)
            .bind(&receipt.amount)
            .bind(&recorded_at)
            .execute(&mut *tx)
            .await
            .context("Failed to save receipt")?;
        }

        tx.commit().await.context("Failed to commit receipts")?;
        Ok(receipts.len())
    }

    /// Load every receipt as a transaction record.
    /// Unreadable dates and amounts are kept on the record, not rejected.
    pub async fn list_records(&self) -> Result<Vec<TransactionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT received_on, category, item, amount
            FROM receipts
            ORDER BY recorded_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list receipts")?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    pub async fn count_receipts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM receipts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count receipts")?;
        Ok(row.get("count"))
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> TransactionRecord {
        let received_on: Option<String> = row.get("received_on");
        let amount: Option<String> = row.get("amount");
        let category: String = row.get("category");
        let item: String = row.get("item");

        TransactionRecord::from_raw(received_on.as_deref(), category, item, amount.as_deref())
    }
}
