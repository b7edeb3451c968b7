//! Appointment manager: owner-scoped CRUD plus the restricted status write.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{Appointment, AppointmentRow, AppointmentStatus},
    store::{self, Collection},
};

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub service_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub client_name: String,
    pub client_phone: String,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub service_id: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
}

pub async fn create(
    pool: &SqlitePool,
    owner_id: &str,
    new: NewAppointment,
) -> AppResult<Appointment> {
    let row = AppointmentRow {
        id: store::new_id(),
        owner_id: owner_id.to_string(),
        service_id: new.service_id,
        scheduled_at: store::timestamp(&new.scheduled_at),
        client_name: new.client_name,
        client_phone: new.client_phone,
        status: AppointmentStatus::Pending.as_str().to_string(),
        created_at: store::timestamp(&Utc::now()),
    };
    store::insert_appointment(pool, &row).await?;
    log::debug!("Created appointment {} for owner {}", row.id, owner_id);
    Appointment::try_from(row)
}

/// Newest first. Callers that aggregate must not rely on the order.
pub async fn list(pool: &SqlitePool, owner_id: &str) -> AppResult<Vec<Appointment>> {
    let rows: Vec<AppointmentRow> =
        store::query_by_owner(pool, Collection::Appointments, owner_id).await?;
    let mut appointments = rows
        .into_iter()
        .map(Appointment::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    appointments.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
    Ok(appointments)
}

pub async fn get(pool: &SqlitePool, owner_id: &str, id: &str) -> AppResult<Appointment> {
    let row = fetch_row(pool, owner_id, id).await?;
    Appointment::try_from(row)
}

pub async fn update(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    patch: AppointmentPatch,
) -> AppResult<Appointment> {
    let mut row = fetch_row(pool, owner_id, id).await?;
    if let Some(service_id) = patch.service_id {
        row.service_id = service_id;
    }
    if let Some(scheduled_at) = patch.scheduled_at {
        row.scheduled_at = store::timestamp(&scheduled_at);
    }
    if let Some(client_name) = patch.client_name {
        row.client_name = client_name;
    }
    if let Some(client_phone) = patch.client_phone {
        row.client_phone = client_phone;
    }

    if !store::patch_appointment(pool, &row).await? {
        return Err(AppError::NotFound("Appointment"));
    }
    Appointment::try_from(row)
}

/// Only `pending -> completed` changes anything; re-applying the current
/// status is accepted and leaves the record as is.
pub async fn set_status(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    raw_status: &str,
) -> AppResult<Appointment> {
    let next: AppointmentStatus = raw_status.trim().parse()?;
    let mut row = fetch_row(pool, owner_id, id).await?;
    let current = Appointment::try_from(row.clone())?;

    if !current.status.can_transition_to(next) {
        return Err(AppError::InvalidStatus(format!(
            "{} appointments cannot be moved back to {}",
            current.status, next
        )));
    }
    if current.status == next {
        return Ok(current);
    }

    row.status = next.as_str().to_string();
    if !store::patch_appointment(pool, &row).await? {
        return Err(AppError::NotFound("Appointment"));
    }
    log::info!("Appointment {id} marked {next}");
    Appointment::try_from(row)
}

/// Deleting an id that does not exist (or belongs to another owner) is not
/// an error; the return value tells whether anything was removed.
pub async fn delete(pool: &SqlitePool, owner_id: &str, id: &str) -> AppResult<bool> {
    let removed = store::remove(pool, Collection::Appointments, owner_id, id).await?;
    if !removed {
        log::debug!("Delete of missing appointment {id} ignored");
    }
    Ok(removed)
}

async fn fetch_row(pool: &SqlitePool, owner_id: &str, id: &str) -> AppResult<AppointmentRow> {
    store::fetch(pool, Collection::Appointments, owner_id, id)
        .await?
        .ok_or(AppError::NotFound("Appointment"))
}
