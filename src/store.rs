//! Record store adapter.
//!
//! Maps the two owner-scoped collections onto their tables. Every read and
//! delete takes the owner id so no query can cross tenants; rows come back
//! untyped and are decoded into domain records by the managers.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{AppointmentRow, ServiceRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Appointments,
    Services,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Collection::Appointments => "appointments",
            Collection::Services => "services",
        }
    }

    fn columns(self) -> &'static str {
        match self {
            Collection::Appointments => {
                "id, owner_id, service_id, scheduled_at, client_name, client_phone, status, created_at"
            }
            Collection::Services => {
                "id, owner_id, name, price_cents, duration_minutes, payment_method, created_at"
            }
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fixed-width RFC 3339 in UTC, so stored timestamps sort lexically.
pub fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub async fn query_by_owner<R>(
    pool: &SqlitePool,
    collection: Collection,
    owner_id: &str,
) -> Result<Vec<R>, sqlx::Error>
where
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE owner_id = ?",
        collection.columns(),
        collection.table()
    );
    sqlx::query_as::<_, R>(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await
}

pub async fn fetch<R>(
    pool: &SqlitePool,
    collection: Collection,
    owner_id: &str,
    id: &str,
) -> Result<Option<R>, sqlx::Error>
where
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ? AND owner_id = ? LIMIT 1",
        collection.columns(),
        collection.table()
    );
    sqlx::query_as::<_, R>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

/// Returns whether a record was removed.
pub async fn remove(
    pool: &SqlitePool,
    collection: Collection,
    owner_id: &str,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE id = ? AND owner_id = ?",
        collection.table()
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_appointment(pool: &SqlitePool, row: &AppointmentRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO appointments
           (id, owner_id, service_id, scheduled_at, client_name, client_phone, status, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&row.id)
    .bind(&row.owner_id)
    .bind(&row.service_id)
    .bind(&row.scheduled_at)
    .bind(&row.client_name)
    .bind(&row.client_phone)
    .bind(&row.status)
    .bind(&row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Writes the mutable appointment fields. `id`, `owner_id` and `created_at` are never touched.
pub async fn patch_appointment(pool: &SqlitePool, row: &AppointmentRow) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE appointments
           SET service_id = ?, scheduled_at = ?, client_name = ?, client_phone = ?, status = ?
           WHERE id = ? AND owner_id = ?"#,
    )
    .bind(&row.service_id)
    .bind(&row.scheduled_at)
    .bind(&row.client_name)
    .bind(&row.client_phone)
    .bind(&row.status)
    .bind(&row.id)
    .bind(&row.owner_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_service(pool: &SqlitePool, row: &ServiceRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO services
           (id, owner_id, name, price_cents, duration_minutes, payment_method, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&row.id)
    .bind(&row.owner_id)
    .bind(&row.name)
    .bind(row.price_cents)
    .bind(row.duration_minutes)
    .bind(&row.payment_method)
    .bind(&row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn patch_service(pool: &SqlitePool, row: &ServiceRow) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE services
           SET name = ?, price_cents = ?, duration_minutes = ?, payment_method = ?
           WHERE id = ? AND owner_id = ?"#,
    )
    .bind(&row.name)
    .bind(row.price_cents)
    .bind(row.duration_minutes)
    .bind(&row.payment_method)
    .bind(&row.id)
    .bind(&row.owner_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
