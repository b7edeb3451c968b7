//! Service catalog manager.
//!
//! Inputs are trusted: name, price and duration are validated by the HTTP
//! form layer before they reach this module.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{PaymentMethod, Service, ServiceRow},
    store::{self, Collection},
};

#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: u32,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<u32>,
    /// `Some(None)` clears the payment method.
    pub payment_method: Option<Option<PaymentMethod>>,
}

pub async fn create(pool: &SqlitePool, owner_id: &str, new: NewService) -> AppResult<Service> {
    let row = ServiceRow {
        id: store::new_id(),
        owner_id: owner_id.to_string(),
        name: new.name,
        price_cents: new.price_cents,
        duration_minutes: i64::from(new.duration_minutes),
        payment_method: new.payment_method.map(|method| method.as_str().to_string()),
        created_at: store::timestamp(&Utc::now()),
    };
    store::insert_service(pool, &row).await?;
    Service::try_from(row)
}

/// Sorted by name for the catalog table and the booking select.
pub async fn list(pool: &SqlitePool, owner_id: &str) -> AppResult<Vec<Service>> {
    let rows: Vec<ServiceRow> = store::query_by_owner(pool, Collection::Services, owner_id).await?;
    let mut services = rows
        .into_iter()
        .map(Service::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    services.sort_by_key(|service| service.name.to_lowercase());
    Ok(services)
}

pub async fn get(pool: &SqlitePool, owner_id: &str, id: &str) -> AppResult<Service> {
    Service::try_from(fetch_row(pool, owner_id, id).await?)
}

pub async fn update(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    patch: ServicePatch,
) -> AppResult<Service> {
    let mut row = fetch_row(pool, owner_id, id).await?;
    if let Some(name) = patch.name {
        row.name = name;
    }
    if let Some(price_cents) = patch.price_cents {
        row.price_cents = price_cents;
    }
    if let Some(duration_minutes) = patch.duration_minutes {
        row.duration_minutes = i64::from(duration_minutes);
    }
    if let Some(payment_method) = patch.payment_method {
        row.payment_method = payment_method.map(|method| method.as_str().to_string());
    }

    if !store::patch_service(pool, &row).await? {
        return Err(AppError::NotFound("Service"));
    }
    Service::try_from(row)
}

/// Appointments referencing the service are left untouched.
pub async fn delete(pool: &SqlitePool, owner_id: &str, id: &str) -> AppResult<bool> {
    Ok(store::remove(pool, Collection::Services, owner_id, id).await?)
}

async fn fetch_row(pool: &SqlitePool, owner_id: &str, id: &str) -> AppResult<ServiceRow> {
    store::fetch(pool, Collection::Services, owner_id, id)
        .await?
        .ok_or(AppError::NotFound("Service"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        appointments::{self, NewAppointment},
        db::test_pool,
    };

    fn haircut() -> NewService {
        NewService {
            name: "Haircut".to_string(),
            price_cents: 3000,
            duration_minutes: 30,
            payment_method: Some(PaymentMethod::Pix),
        }
    }

    #[actix_web::test]
    async fn create_and_list_are_owner_scoped() {
        let pool = test_pool().await;
        let created = create(&pool, "owner-a", haircut()).await.unwrap();
        create(&pool, "owner-b", haircut()).await.unwrap();

        let listed = list(&pool, "owner-a").await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[actix_web::test]
    async fn list_is_sorted_by_name() {
        let pool = test_pool().await;
        for name in ["shave", "Beard", "haircut"] {
            create(
                &pool,
                "owner-a",
                NewService {
                    name: name.to_string(),
                    ..haircut()
                },
            )
            .await
            .unwrap();
        }
        let names: Vec<String> = list(&pool, "owner-a")
            .await
            .unwrap()
            .into_iter()
            .map(|service| service.name)
            .collect();
        assert_eq!(names, vec!["Beard", "haircut", "shave"]);
    }

    #[actix_web::test]
    async fn update_can_clear_payment_method() {
        let pool = test_pool().await;
        let created = create(&pool, "owner-a", haircut()).await.unwrap();

        let updated = update(
            &pool,
            "owner-a",
            &created.id,
            ServicePatch {
                price_cents: Some(3500),
                payment_method: Some(None),
                ..ServicePatch::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.price_cents, 3500);
        assert_eq!(updated.payment_method, None);
        assert_eq!(updated.name, "Haircut");
        assert_eq!(updated.duration_minutes, 30);
    }

    #[actix_web::test]
    async fn update_of_foreign_service_is_not_found() {
        let pool = test_pool().await;
        let created = create(&pool, "owner-a", haircut()).await.unwrap();
        let result = update(&pool, "owner-b", &created.id, ServicePatch::default()).await;
        assert!(matches!(result, Err(AppError::NotFound("Service"))));
    }

    #[actix_web::test]
    async fn delete_leaves_referencing_appointments_in_place() {
        let pool = test_pool().await;
        let service = create(&pool, "owner-a", haircut()).await.unwrap();
        let appointment = appointments::create(
            &pool,
            "owner-a",
            NewAppointment {
                service_id: service.id.clone(),
                scheduled_at: Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap(),
                client_name: "Rafa".to_string(),
                client_phone: "555-0100".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(delete(&pool, "owner-a", &service.id).await.unwrap());
        assert!(!delete(&pool, "owner-a", &service.id).await.unwrap());

        let still_there = appointments::get(&pool, "owner-a", &appointment.id).await.unwrap();
        assert_eq!(still_there.service_id, service.id);
    }
}
