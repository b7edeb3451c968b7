use actix_web::{http::header, middleware::from_fn, web, HttpRequest, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Serialize;

use crate::{
    auth::{logout_guard, owner_validator, AuthOwner},
    billing::{self, WebhookOutcome},
    error::AppError,
    state::AppState,
};

const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Serialize)]
struct CheckoutResponse {
    session_id: String,
    url: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/webhooks/stripe").route(web::post().to(stripe_webhook)))
        .service(
            web::scope("/billing")
                .wrap(HttpAuthentication::basic(owner_validator))
                .wrap(from_fn(logout_guard))
                .service(web::resource("/checkout").route(web::post().to(checkout_redirect))),
        )
        .service(
            web::scope("/api/checkout")
                .wrap(HttpAuthentication::basic(owner_validator))
                .wrap(from_fn(logout_guard))
                .service(web::resource("").route(web::post().to(checkout_json))),
        );
}

async fn checkout_redirect(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
) -> Result<HttpResponse> {
    let session = billing::start_checkout(&state, &auth.id).await?;
    let url = session
        .url
        .ok_or_else(|| AppError::PaymentProvider("checkout session has no url".into()))?;
    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, url))
        .finish())
}

async fn checkout_json(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
) -> Result<HttpResponse> {
    let session = billing::start_checkout(&state, &auth.id).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

async fn stripe_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Bytes,
) -> Result<HttpResponse> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match billing::handle_completion_event(&state, &payload, signature).await? {
        WebhookOutcome::Activated { .. } | WebhookOutcome::Duplicate { .. } => {
            Ok(HttpResponse::Ok().body("OK"))
        }
        WebhookOutcome::Ignored { event_type } => {
            Ok(HttpResponse::Ok().body(format!("ignored {event_type}")))
        }
    }
}
