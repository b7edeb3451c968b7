use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 2] = [AppointmentStatus::Pending, AppointmentStatus::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Completed => "completed",
        }
    }

    /// Completed work is never reopened; re-applying the current status is a no-op.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        !matches!(
            (self, next),
            (AppointmentStatus::Completed, AppointmentStatus::Pending)
        )
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AppointmentStatus::Pending),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(AppError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Cash,
    Pix,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Cash,
        PaymentMethod::Pix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit card",
            PaymentMethod::DebitCard => "Debit card",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Pix => "Pix",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarbershopSize {
    Small,
    Medium,
    Large,
}

impl BarbershopSize {
    pub fn as_str(self) -> &'static str {
        match self {
            BarbershopSize::Small => "small",
            BarbershopSize::Medium => "medium",
            BarbershopSize::Large => "large",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "small" => Some(BarbershopSize::Small),
            "medium" => Some(BarbershopSize::Medium),
            "large" => Some(BarbershopSize::Large),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Local,
    Cloud,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Local => "local",
            Plan::Cloud => "cloud",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Plan::Local),
            "cloud" => Some(Plan::Cloud),
            _ => None,
        }
    }
}

/// Entitlement state of an owner's paid plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Inactive,
    Active,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanStatus::Inactive => "inactive",
            PlanStatus::Active => "active",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inactive" => Some(PlanStatus::Inactive),
            "active" => Some(PlanStatus::Active),
            _ => None,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnerRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub barbershop_size: String,
    pub plan: String,
    pub plan_status: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: String,
    pub owner_id: String,
    pub service_id: String,
    pub scheduled_at: String,
    pub client_name: String,
    pub client_phone: String,
    pub status: String,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub payment_method: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Owner {
    pub id: String,
    pub email: String,
    pub username: String,
    pub barbershop_size: BarbershopSize,
    pub plan: Plan,
    pub plan_status: PlanStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub id: String,
    pub owner_id: String,
    pub service_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub client_name: String,
    pub client_phone: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    /// Minor currency units.
    pub price_cents: i64,
    pub duration_minutes: u32,
    pub payment_method: Option<PaymentMethod>,
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| AppError::CorruptRecord(format!("{field} `{value}`: {err}")))
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = AppError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<AppointmentStatus>().map_err(|_| {
            AppError::CorruptRecord(format!("appointment {} has status `{}`", row.id, row.status))
        })?;
        Ok(Appointment {
            scheduled_at: parse_timestamp("scheduled_at", &row.scheduled_at)?,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            id: row.id,
            owner_id: row.owner_id,
            service_id: row.service_id,
            client_name: row.client_name,
            client_phone: row.client_phone,
            status,
        })
    }
}

impl TryFrom<ServiceRow> for Service {
    type Error = AppError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let payment_method = match row.payment_method.as_deref() {
            None => None,
            Some(raw) => Some(PaymentMethod::parse(raw).ok_or_else(|| {
                AppError::CorruptRecord(format!("service {} has payment method `{raw}`", row.id))
            })?),
        };
        let duration_minutes = u32::try_from(row.duration_minutes).map_err(|_| {
            AppError::CorruptRecord(format!(
                "service {} has duration {}",
                row.id, row.duration_minutes
            ))
        })?;
        Ok(Service {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            price_cents: row.price_cents,
            duration_minutes,
            payment_method,
        })
    }
}

impl TryFrom<&OwnerRow> for Owner {
    type Error = AppError;

    fn try_from(row: &OwnerRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, value: &str| {
            AppError::CorruptRecord(format!("owner {} has {field} `{value}`", row.id))
        };
        Ok(Owner {
            id: row.id.clone(),
            email: row.email.clone(),
            username: row.username.clone(),
            barbershop_size: BarbershopSize::parse(&row.barbershop_size)
                .ok_or_else(|| corrupt("barbershop_size", &row.barbershop_size))?,
            plan: Plan::parse(&row.plan).ok_or_else(|| corrupt("plan", &row.plan))?,
            plan_status: PlanStatus::parse(&row.plan_status)
                .ok_or_else(|| corrupt("plan_status", &row.plan_status))?,
        })
    }
}
