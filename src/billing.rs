//! Subscription checkout and the payment provider's completion webhook.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use sqlx::SqlitePool;

use crate::{
    accounts,
    error::{AppError, AppResult},
    models::PlanStatus,
    payments::{CheckoutRequest, CheckoutSession},
    state::AppState,
    store,
};

type HmacSha256 = Hmac<Sha256>;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const OWNER_METADATA_KEY: &str = "owner_id";
/// Signed timestamps older (or newer) than this are treated as replays.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Activated { owner_id: String },
    Duplicate { event_id: String },
    Ignored { event_type: String },
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Debug, Deserialize)]
struct EventObject {
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

pub async fn start_checkout(state: &AppState, owner_id: &str) -> AppResult<CheckoutSession> {
    let price_id = state
        .config
        .stripe
        .price_id
        .clone()
        .ok_or_else(|| AppError::PaymentProvider("STRIPE_PRICE_ID is not configured".into()))?;
    let owner = accounts::find_owner(&state.db, owner_id)
        .await?
        .ok_or(AppError::NotFound("Owner"))?;

    let app_url = &state.config.app_url;
    let request = CheckoutRequest {
        price_id,
        client_reference_id: owner.id.clone(),
        customer_email: Some(owner.email),
        metadata: BTreeMap::from([(OWNER_METADATA_KEY.to_string(), owner.id.clone())]),
        success_url: format!("{app_url}/?payment=success"),
        cancel_url: format!("{app_url}/?payment=cancelled"),
    };

    let session = state.payments.create_checkout_session(&request).await?;
    log::info!("Checkout session {} created for owner {}", session.id, owner.id);
    Ok(session)
}

/// Checks a `t=<unix>,v1=<hex>` signature header against the raw payload.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(AppError::SignatureInvalid)?;
    if signatures.is_empty() {
        return Err(AppError::SignatureInvalid);
    }
    if now.timestamp().abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(AppError::SignatureInvalid);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AppError::SignatureInvalid)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if matched {
        Ok(())
    } else {
        Err(AppError::SignatureInvalid)
    }
}

/// Verifies and applies a completion event. Redelivery of an event id that
/// was already applied is reported as `Duplicate` and changes nothing.
pub async fn handle_completion_event(
    state: &AppState,
    payload: &[u8],
    signature: Option<&str>,
) -> AppResult<WebhookOutcome> {
    let Some(secret) = state.config.stripe.webhook_secret.as_deref() else {
        log::warn!("Webhook rejected: no signing secret configured");
        return Err(AppError::SignatureInvalid);
    };
    let signature = signature.ok_or(AppError::SignatureInvalid)?;
    if let Err(err) = verify_signature(payload, signature, secret, Utc::now()) {
        log::warn!("Webhook signature rejected");
        return Err(err);
    }

    let event: WebhookEvent = serde_json::from_slice(payload)
        .map_err(|err| AppError::MalformedEvent(err.to_string()))?;

    if event.event_type != CHECKOUT_COMPLETED {
        log::debug!("Ignoring webhook event {} of type {}", event.id, event.event_type);
        return Ok(WebhookOutcome::Ignored {
            event_type: event.event_type,
        });
    }

    let owner_id = event
        .data
        .object
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get(OWNER_METADATA_KEY))
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .ok_or_else(|| {
            AppError::MalformedEvent("owner id not found in session metadata".to_string())
        })?;

    if activate_entitlement(&state.db, &event.id, &event.event_type, &owner_id).await? {
        log::info!("Plan activated for owner {owner_id} by event {}", event.id);
        Ok(WebhookOutcome::Activated { owner_id })
    } else {
        log::info!("Duplicate delivery of event {} ignored", event.id);
        Ok(WebhookOutcome::Duplicate { event_id: event.id })
    }
}

/// Records the event id and activates the owner's plan in one transaction.
/// Returns `false` when the event id was already recorded.
async fn activate_entitlement(
    pool: &SqlitePool,
    event_id: &str,
    event_type: &str,
    owner_id: &str,
) -> AppResult<bool> {
    let mut tx = pool.begin().await?;

    let recorded = sqlx::query(
        r#"INSERT INTO billing_events (event_id, owner_id, event_type, processed_at)
           VALUES (?, ?, ?, ?)
           ON CONFLICT(event_id) DO NOTHING"#,
    )
    .bind(event_id)
    .bind(owner_id)
    .bind(event_type)
    .bind(store::timestamp(&Utc::now()))
    .execute(&mut *tx)
    .await?;
    if recorded.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    let updated = sqlx::query("UPDATE owners SET plan_status = ? WHERE id = ?")
        .bind(PlanStatus::Active.as_str())
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound("Owner"));
    }

    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
pub(crate) fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
pub(crate) fn completed_event(event_id: &str, owner_id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": event_id,
        "type": CHECKOUT_COMPLETED,
        "data": { "object": { "id": "cs_test_1", "metadata": { OWNER_METADATA_KEY: owner_id } } }
    })
    .to_string()
    .into_bytes()
}
