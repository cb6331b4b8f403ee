//! PostgreSQL implementation of RecordStore.
//!
//! Persists savings records to the `savings_records` table.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{Amount, DomainError, RecordId, Timestamp};
use crate::domain::savings::{NewRecord, Record, RecordAggregate};
use crate::ports::RecordStore;

const RECORD_COLUMNS: &str = "id, amount_cents, description, date, created_at, updated_at";
const RECORD_ORDER: &str = "ORDER BY date DESC, created_at DESC, id DESC";

/// PostgreSQL implementation of RecordStore.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a new PostgresRecordStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(action: &str) -> impl FnOnce(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(format!("Failed to {}: {}", action, e))
}

fn row_to_record(row: PgRow) -> Result<Record, DomainError> {
    let decode = |e: sqlx::Error| DomainError::database(format!("Failed to decode record: {}", e));

    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    Ok(Record {
        id: RecordId::new(row.try_get("id").map_err(decode)?),
        amount: Amount::from_cents(row.try_get("amount_cents").map_err(decode)?),
        description: row.try_get("description").map_err(decode)?,
        date: row.try_get("date").map_err(decode)?,
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn list_all(&self) -> Result<Vec<Record>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM savings_records {}",
            RECORD_COLUMNS, RECORD_ORDER
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list records"))?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn aggregate(&self) -> Result<RecordAggregate, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*)::BIGINT AS count,
                   COALESCE(SUM(amount_cents), 0)::BIGINT AS sum_cents,
                   COALESCE(MIN(amount_cents), 0)::BIGINT AS min_cents,
                   COALESCE(MAX(amount_cents), 0)::BIGINT AS max_cents,
                   MIN(date) AS first_date,
                   MAX(date) AS last_date
            FROM savings_records
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("aggregate records"))?;

        let decode =
            |e: sqlx::Error| DomainError::database(format!("Failed to decode aggregate: {}", e));
        let count: i64 = row.try_get("count").map_err(decode)?;
        let first_date: Option<NaiveDate> = row.try_get("first_date").map_err(decode)?;
        let last_date: Option<NaiveDate> = row.try_get("last_date").map_err(decode)?;

        Ok(RecordAggregate {
            count: count.max(0) as u64,
            sum: Amount::from_cents(row.try_get("sum_cents").map_err(decode)?),
            min: Amount::from_cents(row.try_get("min_cents").map_err(decode)?),
            max: Amount::from_cents(row.try_get("max_cents").map_err(decode)?),
            first_date,
            last_date,
        })
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM savings_records WHERE id = $1",
            RECORD_COLUMNS
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch record"))?;

        row.map(row_to_record).transpose()
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Record>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM savings_records WHERE date BETWEEN $1 AND $2 {}",
            RECORD_COLUMNS, RECORD_ORDER
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("query records by date"))?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn create(&self, fields: NewRecord) -> Result<Record, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO savings_records (amount_cents, description, date)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(fields.amount().cents())
        .bind(fields.description())
        .bind(fields.date())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("insert record"))?;

        row_to_record(row)
    }

    async fn update(&self, id: RecordId, fields: NewRecord) -> Result<Option<Record>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE savings_records SET
                amount_cents = $2,
                description = $3,
                date = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(id.as_i64())
        .bind(fields.amount().cents())
        .bind(fields.description())
        .bind(fields.date())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update record"))?;

        row.map(row_to_record).transpose()
    }

    async fn delete(&self, id: RecordId) -> Result<Option<Record>, DomainError> {
        let row = sqlx::query(&format!(
            "DELETE FROM savings_records WHERE id = $1 RETURNING {}",
            RECORD_COLUMNS
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("delete record"))?;

        row.map(row_to_record).transpose()
    }

    async fn delete_all(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM savings_records")
            .execute(&self.pool)
            .await
            .map_err(db_error("clear records"))?;

        Ok(result.rows_affected())
    }
}
