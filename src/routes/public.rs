use actix_web::http::header::Header;
use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use actix_web_httpauth::headers::authorization::{Authorization, Basic};
use askama::Template;
use serde::Deserialize;

use crate::{
    accounts::{self, NewAccount},
    auth::{authenticate_credentials, clear_logout_cookie, logout_cookie, AUTH_REALM},
    error::AppError,
    models::{BarbershopSize, Plan},
    state::AppState,
    templates::render,
};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    payment_notice: String,
    has_payment_notice: bool,
}

#[derive(Clone, Debug, Default)]
struct SignupView {
    username: String,
    email: String,
    barbershop_size: String,
    plan: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate {
    form: SignupView,
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct SignupForm {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
    barbershop_size: String,
    plan: String,
}

impl SignupForm {
    fn validate(&self) -> Result<NewAccount, Vec<String>> {
        let mut errors = Vec::new();
        if self.username.trim().chars().count() < 3 {
            errors.push("Username must be at least 3 characters.".to_string());
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            errors.push("Enter a valid email address.".to_string());
        }
        if self.password.chars().count() < 6 {
            errors.push("Password must be at least 6 characters.".to_string());
        }
        if self.password != self.confirm_password {
            errors.push("Passwords do not match.".to_string());
        }
        let barbershop_size = BarbershopSize::parse(&self.barbershop_size);
        if barbershop_size.is_none() {
            errors.push("Choose a barbershop size.".to_string());
        }
        let plan = Plan::parse(&self.plan);
        if plan.is_none() {
            errors.push("Choose a plan.".to_string());
        }

        match (barbershop_size, plan) {
            (Some(barbershop_size), Some(plan)) if errors.is_empty() => Ok(NewAccount {
                email: email.to_string(),
                password: self.password.clone(),
                username: self.username.trim().to_string(),
                barbershop_size,
                plan,
            }),
            _ => Err(errors),
        }
    }

    fn view(&self) -> SignupView {
        SignupView {
            username: self.username.clone(),
            email: self.email.clone(),
            barbershop_size: self.barbershop_size.clone(),
            plan: self.plan.clone(),
        }
    }
}

#[derive(Deserialize)]
struct HomeQuery {
    payment: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(
            web::resource("/signup")
                .route(web::get().to(show_signup))
                .route(web::post().to(signup)),
        )
        .service(web::resource("/login").route(web::get().to(login)))
        .service(web::resource("/logout").route(web::get().to(logout)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn home(query: web::Query<HomeQuery>) -> HttpResponse {
    let payment_notice = match query.payment.as_deref() {
        Some("success") => "Payment received. Your plan will be active in a moment.",
        Some("cancelled") => "Checkout was cancelled. You have not been charged.",
        _ => "",
    };
    render(HomeTemplate {
        payment_notice: payment_notice.to_string(),
        has_payment_notice: !payment_notice.is_empty(),
    })
}

async fn show_signup() -> HttpResponse {
    render(SignupTemplate {
        form: SignupView {
            barbershop_size: BarbershopSize::Small.as_str().to_string(),
            plan: Plan::Local.as_str().to_string(),
            ..SignupView::default()
        },
        errors: Vec::new(),
    })
}

async fn signup(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let account = match form.validate() {
        Ok(account) => account,
        Err(errors) => {
            return Ok(render(SignupTemplate {
                form: form.view(),
                errors,
            }))
        }
    };

    match accounts::create_account(&state.db, account).await {
        Ok(_) => Ok(HttpResponse::SeeOther()
            .append_header((header::LOCATION, "/login"))
            .cookie(clear_logout_cookie(&req))
            .finish()),
        Err(AppError::Auth(message)) => Ok(render(SignupTemplate {
            form: form.view(),
            errors: vec![message],
        })),
        Err(err) => Err(err.into()),
    }
}

async fn logout(req: HttpRequest) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(logout_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

async fn login(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let auth = match Authorization::<Basic>::parse(&req) {
        Ok(auth) => auth,
        Err(_) => return auth_challenge(),
    };
    let credentials = auth.into_scheme();
    let email = credentials.user_id();
    let password = credentials.password().unwrap_or_default();

    if authenticate_credentials(&state, email, password).await.is_none() {
        return auth_challenge();
    }

    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/dashboard"))
        .cookie(clear_logout_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

fn auth_challenge() -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header((header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", AUTH_REALM)))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{
        http::StatusCode,
        test::{call_and_read_body, call_service, init_service, TestRequest},
        App,
    };

    use super::*;
    use crate::{
        db::test_pool,
        routes::basic_auth,
        state::testing::{test_state, FakePayments},
    };

    fn signup_form(email: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            username: "navalha".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            barbershop_size: "medium".to_string(),
            plan: "cloud".to_string(),
        }
    }

    #[test]
    fn signup_validation_collects_every_problem() {
        let errors = SignupForm {
            username: "ab".to_string(),
            barbershop_size: "huge".to_string(),
            ..signup_form("not-an-email", "123", "456")
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn valid_signup_form_becomes_an_account() {
        let account = signup_form(" shop@example.com ", "secret1", "secret1")
            .validate()
            .unwrap();
        assert_eq!(account.email, "shop@example.com");
        assert_eq!(account.barbershop_size, BarbershopSize::Medium);
        assert_eq!(account.plan, Plan::Cloud);
    }

    #[actix_web::test]
    async fn signup_then_login_redirects_to_dashboard() {
        let state = test_state(test_pool().await, Arc::new(FakePayments::default()));
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = TestRequest::post()
            .uri("/signup")
            .set_form([
                ("username", "navalha"),
                ("email", "shop@example.com"),
                ("password", "secret1"),
                ("confirm_password", "secret1"),
                ("barbershop_size", "small"),
                ("plan", "local"),
            ])
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let req = TestRequest::get()
            .uri("/login")
            .insert_header(basic_auth("shop@example.com", "secret1"))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");

        let req = TestRequest::get()
            .uri("/login")
            .insert_header(basic_auth("shop@example.com", "wrong"))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn duplicate_signup_re_renders_the_form() {
        let state = test_state(test_pool().await, Arc::new(FakePayments::default()));
        accounts::create_account(&state.db, accounts::sample_account("shop@example.com"))
            .await
            .unwrap();
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = TestRequest::post()
            .uri("/signup")
            .set_form([
                ("username", "navalha"),
                ("email", "shop@example.com"),
                ("password", "secret1"),
                ("confirm_password", "secret1"),
                ("barbershop_size", "small"),
                ("plan", "local"),
            ])
            .to_request();
        let body = call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("already exists"));
    }

    #[actix_web::test]
    async fn health_answers_ok() {
        let state = test_state(test_pool().await, Arc::new(FakePayments::default()));
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;
        let body = call_and_read_body(&app, TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(body, "ok");
    }
}
