use actix_web::{
    body::BoxBody,
    cookie::{time::Duration, Cookie, SameSite},
    dev::{ServiceRequest, ServiceResponse},
    error::ErrorUnauthorized,
    http::header,
    middleware::Next,
    web, Error, HttpMessage, HttpRequest, HttpResponse,
};
use actix_web_httpauth::extractors::basic::BasicAuth;

use crate::{accounts, state::AppState};

pub const AUTH_REALM: &str = "BarberDesk";
const LOGOUT_COOKIE: &str = "bd_logged_out";

/// The signed-in owner; every dashboard query is scoped to `id`.
#[derive(Clone, Debug)]
pub struct AuthOwner {
    pub id: String,
    pub username: String,
}

pub async fn authenticate_credentials(
    state: &AppState,
    email: &str,
    password: &str,
) -> Option<AuthOwner> {
    match accounts::sign_in(&state.db, email, password).await {
        Ok(owner) => Some(AuthOwner {
            id: owner.id,
            username: owner.username,
        }),
        Err(err) => {
            log::debug!("Sign-in rejected for {email}: {err}");
            None
        }
    }
}

pub async fn owner_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        return Err((ErrorUnauthorized("Unauthorized"), req));
    };
    let password = credentials.password().unwrap_or_default();
    match authenticate_credentials(&state, credentials.user_id(), password).await {
        Some(owner) => {
            req.extensions_mut().insert(owner);
            Ok(req)
        }
        None => Err((ErrorUnauthorized("Unauthorized"), req)),
    }
}

fn build_logout_cookie(req: &HttpRequest, value: &'static str, max_age: Duration) -> Cookie<'static> {
    let mut builder = Cookie::build(LOGOUT_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age);
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn logout_cookie(req: &HttpRequest) -> Cookie<'static> {
    build_logout_cookie(req, "1", Duration::days(365))
}

pub fn clear_logout_cookie(req: &HttpRequest) -> Cookie<'static> {
    build_logout_cookie(req, "", Duration::seconds(0))
}

pub fn is_logged_out(req: &HttpRequest) -> bool {
    req.cookie(LOGOUT_COOKIE).is_some()
}

/// Basic auth has no real logout, so a cookie marks the browser as signed
/// out until `/login` clears it.
pub async fn logout_guard<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: actix_web::body::MessageBody + 'static,
{
    if is_logged_out(req.request()) {
        let body = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Logged out</title>
    <link rel="stylesheet" href="/static/app.css" />
  </head>
  <body>
    <main class="card narrow">
      <h1>You're logged out</h1>
      <p>Your session has been closed.</p>
      <p><a href="/login">Log in again</a> or <a href="/">return to the home page</a>.</p>
    </main>
  </body>
</html>"#;
        let response = HttpResponse::Unauthorized()
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .content_type("text/html; charset=utf-8")
            .body(body);
        return Ok(req.into_response(response));
    }

    let res = next.call(req).await?;
    Ok(res.map_into_boxed_body())
}
