use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use eshop_core::domain::customer::{
    Customer, CustomerId, CustomerInput, LifetimeValue, NewCustomer,
};
use eshop_core::query::{fold_case, Predicate};

use super::{
    BulkWriteFailure, BulkWriteResult, CustomerCollection, FindOptions, RepositoryError,
};
use crate::DbPool;

/// Index label and the column it covers. Email and city are searched through
/// their folded copies; containment (`instr`) still scans, the indexes serve
/// exact folded lookups and the created_at range plus ordering.
const INDEXES: [(&str, &str); 3] =
    [("email", "email_folded"), ("city", "city_folded"), ("created_at", "created_at")];

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A customer collection backed by one SQLite table.
///
/// Alongside the display fields every row carries case-folded copies of name,
/// email and city so containment filters stay case-insensitive beyond ASCII.
#[derive(Debug)]
pub struct SqlCustomerCollection {
    pool: DbPool,
    name: String,
    table: String,
    insert_sql: String,
    update_sql: String,
    select_sql: String,
}

impl SqlCustomerCollection {
    /// `table` must already be a validated identifier.
    pub(crate) fn new(pool: DbPool, name: String, table: String) -> Self {
        let insert_sql = format!(
            "INSERT INTO \"{table}\" (
                id, name, email, city, state, country, phone, is_vip, lifetime_value,
                name_folded, email_folded, city_folded, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        let update_sql = format!(
            "UPDATE \"{table}\" SET
                name = ?, email = ?, city = ?, state = ?, country = ?, phone = ?,
                is_vip = ?, lifetime_value = ?,
                name_folded = ?, email_folded = ?, city_folded = ?
             WHERE id = ?"
        );
        let select_sql = format!(
            "SELECT id, name, email, city, state, country, phone, is_vip, lifetime_value, created_at
             FROM \"{table}\""
        );
        Self { pool, name, table, insert_sql, update_sql, select_sql }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub(crate) async fn create_table(&self) -> Result<(), RepositoryError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                country TEXT NOT NULL,
                phone TEXT NOT NULL,
                is_vip INTEGER NOT NULL DEFAULT 0,
                lifetime_value TEXT NOT NULL DEFAULT '0',
                created_at TEXT NOT NULL,
                name_folded TEXT NOT NULL,
                email_folded TEXT NOT NULL,
                city_folded TEXT NOT NULL
             )",
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    fn insert_query<'q>(&'q self, id: CustomerId, record: &NewCustomer) -> SqliteQuery<'q> {
        let query = sqlx::query(&self.insert_sql).bind(id.to_string());
        bind_fields(query, &record.fields).bind(format_timestamp(record.created_at))
    }
}

#[async_trait::async_trait]
impl CustomerCollection for SqlCustomerCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, record: NewCustomer) -> Result<Customer, RepositoryError> {
        let id = CustomerId::generate();
        self.insert_query(id, &record).execute(&self.pool).await?;
        Ok(record.into_customer(id))
    }

    async fn find(
        &self,
        predicate: &Predicate,
        options: FindOptions,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(self.select_sql.as_str());
        push_predicate(&mut query, predicate);
        query.push(" ORDER BY created_at ASC, id ASC");
        // OFFSET needs a LIMIT in SQLite; -1 is unbounded.
        query.push(" LIMIT ");
        query.push_bind(options.limit.map_or(-1, clamp_i64));
        query.push(" OFFSET ");
        query.push_bind(clamp_i64(options.skip));

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(customer_from_row).collect()
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT COUNT(1) AS total FROM \"{}\"",
            self.table
        ));
        push_predicate(&mut query, predicate);

        let row = query.build().fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("total")?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("{} WHERE id = ?", self.select_sql);
        let row = sqlx::query(&sql).bind(id.to_string()).fetch_optional(&self.pool).await?;

        row.as_ref().map(customer_from_row).transpose()
    }

    async fn update_one(
        &self,
        id: &CustomerId,
        fields: CustomerInput,
    ) -> Result<u64, RepositoryError> {
        let query = bind_fields(sqlx::query(&self.update_sql), &fields).bind(id.to_string());
        let outcome = query.execute(&self.pool).await?;
        Ok(outcome.rows_affected())
    }

    async fn delete_one(&self, id: &CustomerId) -> Result<u64, RepositoryError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = ?", self.table);
        let outcome = sqlx::query(&sql).bind(id.to_string()).execute(&self.pool).await?;
        Ok(outcome.rows_affected())
    }

    async fn bulk_insert_unordered(
        &self,
        records: Vec<NewCustomer>,
    ) -> Result<BulkWriteResult, RepositoryError> {
        let mut result = BulkWriteResult::default();
        if records.is_empty() {
            return Ok(result);
        }

        let mut tx = self.pool.begin().await?;
        for (index, record) in records.iter().enumerate() {
            let id = CustomerId::generate();
            match self.insert_query(id, record).execute(&mut *tx).await {
                Ok(_) => result.inserted += 1,
                Err(error) => {
                    result.failures.push(BulkWriteFailure { index, message: error.to_string() })
                }
            }
        }
        tx.commit().await?;

        Ok(result)
    }

    async fn ensure_indexes(&self) -> Result<(), RepositoryError> {
        for (label, column) in INDEXES {
            let sql = format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{table}_{label}\" ON \"{table}\" ({column})",
                table = self.table
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Binds the mutable fields followed by their folded search copies.
fn bind_fields<'q>(query: SqliteQuery<'q>, fields: &CustomerInput) -> SqliteQuery<'q> {
    query
        .bind(fields.name.clone())
        .bind(fields.email.clone())
        .bind(fields.city.clone())
        .bind(fields.state.clone())
        .bind(fields.country.clone())
        .bind(fields.phone.clone())
        .bind(fields.is_vip)
        .bind(fields.lifetime_value.amount().to_string())
        .bind(fold_case(&fields.name))
        .bind(fold_case(&fields.email))
        .bind(fold_case(&fields.city))
}

fn push_predicate(query: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    query.push(" WHERE 1=1");

    let containment = [
        ("name_folded", &predicate.name_contains),
        ("email_folded", &predicate.email_contains),
        ("city_folded", &predicate.city_contains),
    ];
    for (column, needle) in containment {
        if let Some(needle) = needle {
            query.push(format!(" AND instr({column}, "));
            query.push_bind(needle.clone());
            query.push(") > 0");
        }
    }

    if let Some(range) = predicate.created_at {
        if let Some(from) = range.from {
            query.push(" AND created_at >= ");
            query.push_bind(format_timestamp(from));
        }
        if let Some(to) = range.to {
            query.push(" AND created_at <= ");
            query.push_bind(format_timestamp(to));
        }
    }
}

/// Fixed-width UTC form, so text order equals chronological order.
fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid created_at `{value}`: {error}")))
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn customer_from_row(row: &SqliteRow) -> Result<Customer, RepositoryError> {
    let raw_id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&raw_id)
        .map(CustomerId)
        .map_err(|error| RepositoryError::Decode(format!("invalid id `{raw_id}`: {error}")))?;

    let raw_value: String = row.try_get("lifetime_value")?;
    let lifetime_value = Decimal::from_str(&raw_value)
        .map_err(|error| error.to_string())
        .and_then(|amount| LifetimeValue::new(amount).map_err(|error| error.to_string()))
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid lifetime_value `{raw_value}`: {error}"))
        })?;

    let raw_created_at: String = row.try_get("created_at")?;

    Ok(Customer {
        id,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        phone: row.try_get("phone")?,
        is_vip: row.try_get("is_vip")?,
        lifetime_value,
        created_at: parse_timestamp(&raw_created_at)?,
    })
}
