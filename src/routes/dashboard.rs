use std::collections::HashMap;

use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use askama::Template;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    accounts,
    appointments::{self, AppointmentPatch, NewAppointment},
    auth::{logout_guard, owner_validator, AuthOwner},
    error::AppResult,
    models::{Appointment, AppointmentStatus, PaymentMethod, PlanStatus, Service},
    revenue::{self, RevenueSummary},
    services::{self, NewService, ServicePatch},
    state::AppState,
    templates::{format_amount, render},
};

const REMOVED_SERVICE: &str = "Removed service";
/// 1,000,000.00 in minor units.
const MAX_PRICE_CENTS: i64 = 100_000_000;

#[derive(Clone, Debug)]
struct AppointmentView {
    id: String,
    client_name: String,
    client_phone: String,
    service_name: String,
    price: String,
    scheduled_for: String,
    status: &'static str,
    is_completed: bool,
}

#[derive(Clone, Debug)]
struct ServiceView {
    id: String,
    name: String,
    price: String,
    duration_minutes: u32,
    payment_method: &'static str,
}

#[derive(Clone, Debug)]
struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Clone, Debug, Default)]
struct AppointmentFormView {
    service_id: String,
    date: String,
    time: String,
    client_name: String,
    client_phone: String,
}

#[derive(Clone, Debug, Default)]
struct ServiceFormView {
    name: String,
    price: String,
    duration_minutes: String,
    payment_method: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    username: String,
    plan_active: bool,
    daily_revenue: String,
    monthly_revenue: String,
    daily_count: u32,
    appointments: Vec<AppointmentView>,
    services: Vec<ServiceView>,
    service_options: Vec<SelectOption>,
    payment_options: Vec<SelectOption>,
    appointment_form: AppointmentFormView,
    appointment_errors: Vec<String>,
    service_form: ServiceFormView,
    service_errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "appointment_edit.html")]
struct AppointmentEditTemplate {
    appointment_id: String,
    status: &'static str,
    is_completed: bool,
    form: AppointmentFormView,
    service_options: Vec<SelectOption>,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "service_edit.html")]
struct ServiceEditTemplate {
    service_id: String,
    form: ServiceFormView,
    payment_options: Vec<SelectOption>,
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct AppointmentForm {
    service_id: String,
    date: String,
    time: String,
    client_name: String,
    client_phone: String,
}

impl AppointmentForm {
    fn validate<Tz: TimeZone>(&self, services: &[Service], zone: &Tz) -> Result<NewAppointment, Vec<String>> {
        let mut errors = Vec::new();
        let service_id = self.service_id.trim();
        if service_id.is_empty() {
            errors.push("Select a service.".to_string());
        } else if !services.iter().any(|service| service.id == service_id) {
            errors.push("Select one of your services.".to_string());
        }
        if self.client_name.trim().is_empty() {
            errors.push("Client name is required.".to_string());
        }
        if self.client_phone.trim().is_empty() {
            errors.push("Client phone is required.".to_string());
        }
        let scheduled_at = parse_local_datetime(&self.date, &self.time, zone);
        if scheduled_at.is_none() {
            errors.push("Pick a valid date and time.".to_string());
        }

        match scheduled_at {
            Some(scheduled_at) if errors.is_empty() => Ok(NewAppointment {
                service_id: service_id.to_string(),
                scheduled_at,
                client_name: self.client_name.trim().to_string(),
                client_phone: self.client_phone.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }

    fn view(&self) -> AppointmentFormView {
        AppointmentFormView {
            service_id: self.service_id.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            client_name: self.client_name.clone(),
            client_phone: self.client_phone.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ServiceForm {
    name: String,
    price: String,
    duration_minutes: String,
    #[serde(default)]
    payment_method: Option<String>,
}

impl ServiceForm {
    fn validate(&self) -> Result<NewService, Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Service name is required.".to_string());
        }
        let price_cents = parse_amount(&self.price);
        match price_cents {
            None => errors
                .push("Price must be a non-negative amount with at most two decimals.".to_string()),
            Some(cents) if cents > MAX_PRICE_CENTS => errors.push(format!(
                "Price cannot exceed {}.",
                format_amount(MAX_PRICE_CENTS)
            )),
            Some(_) => {}
        }
        let duration_minutes = self
            .duration_minutes
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|minutes| *minutes > 0);
        if duration_minutes.is_none() {
            errors.push("Duration must be a positive number of minutes.".to_string());
        }
        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") | Some("none") => Ok(None),
            Some(raw) => PaymentMethod::parse(raw).map(Some).ok_or(raw),
        };
        if payment_method.is_err() {
            errors.push("Unknown payment method.".to_string());
        }

        match (price_cents, duration_minutes, payment_method) {
            (Some(price_cents), Some(duration_minutes), Ok(payment_method)) if errors.is_empty() => {
                Ok(NewService {
                    name: self.name.trim().to_string(),
                    price_cents,
                    duration_minutes,
                    payment_method,
                })
            }
            _ => Err(errors),
        }
    }

    fn view(&self) -> ServiceFormView {
        ServiceFormView {
            name: self.name.clone(),
            price: self.price.clone(),
            duration_minutes: self.duration_minutes.clone(),
            payment_method: self.payment_method.clone().unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct StatusForm {
    status: String,
}

#[derive(Serialize)]
struct SummaryResponse {
    #[serde(flatten)]
    summary: RevenueSummary,
    daily_revenue: String,
    monthly_revenue: String,
}

/// Everything the dashboard shows, rebuilt from the store on each request.
pub struct ReadModel {
    pub appointments: Vec<Appointment>,
    pub services: Vec<Service>,
    pub summary: RevenueSummary,
}

pub async fn load_read_model<Tz: TimeZone>(
    pool: &SqlitePool,
    owner_id: &str,
    now: &DateTime<Tz>,
) -> AppResult<ReadModel> {
    let appointments = appointments::list(pool, owner_id).await?;
    let services = services::list(pool, owner_id).await?;
    let summary = revenue::summarize(&appointments, &services, now);
    Ok(ReadModel {
        appointments,
        services,
        summary,
    })
}

#[derive(Default)]
struct DashboardForms {
    appointment: AppointmentFormView,
    appointment_errors: Vec<String>,
    service: ServiceFormView,
    service_errors: Vec<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .wrap(HttpAuthentication::basic(owner_validator))
            .wrap(from_fn(logout_guard))
            .service(web::resource("").route(web::get().to(index)))
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/summary").route(web::get().to(summary)))
            .service(web::resource("/appointments").route(web::post().to(create_appointment)))
            .service(
                web::resource("/appointments/{id}")
                    .route(web::get().to(edit_appointment))
                    .route(web::post().to(update_appointment)),
            )
            .service(
                web::resource("/appointments/{id}/status").route(web::post().to(update_status)),
            )
            .service(
                web::resource("/appointments/{id}/delete")
                    .route(web::post().to(delete_appointment)),
            )
            .service(web::resource("/services").route(web::post().to(create_service)))
            .service(
                web::resource("/services/{id}")
                    .route(web::get().to(edit_service))
                    .route(web::post().to(update_service)),
            )
            .service(web::resource("/services/{id}/delete").route(web::post().to(delete_service))),
    );
}

fn back_to_dashboard() -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/dashboard"))
        .finish()
}

async fn index(state: web::Data<AppState>, auth: web::ReqData<AuthOwner>) -> Result<HttpResponse> {
    render_dashboard(&state, &auth, DashboardForms::default()).await
}

async fn render_dashboard(
    state: &AppState,
    auth: &AuthOwner,
    forms: DashboardForms,
) -> Result<HttpResponse> {
    let model = load_read_model(&state.db, &auth.id, &Local::now()).await?;
    let plan_active = accounts::find_owner(&state.db, &auth.id)
        .await?
        .is_some_and(|owner| owner.plan_status == PlanStatus::Active);

    Ok(render(DashboardTemplate {
        username: auth.username.clone(),
        plan_active,
        daily_revenue: format_amount(model.summary.daily_revenue_cents),
        monthly_revenue: format_amount(model.summary.monthly_revenue_cents),
        daily_count: model.summary.daily_appointment_count,
        appointments: appointment_views(&model.appointments, &model.services),
        services: model.services.iter().map(service_view).collect(),
        service_options: service_options(&model.services, &forms.appointment.service_id),
        payment_options: payment_options(&forms.service.payment_method),
        appointment_form: forms.appointment,
        appointment_errors: forms.appointment_errors,
        service_form: forms.service,
        service_errors: forms.service_errors,
    }))
}

async fn summary(state: web::Data<AppState>, auth: web::ReqData<AuthOwner>) -> Result<HttpResponse> {
    let model = load_read_model(&state.db, &auth.id, &Local::now()).await?;
    Ok(HttpResponse::Ok().json(SummaryResponse {
        daily_revenue: format_amount(model.summary.daily_revenue_cents),
        monthly_revenue: format_amount(model.summary.monthly_revenue_cents),
        summary: model.summary,
    }))
}

async fn create_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    form: web::Form<AppointmentForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let services = services::list(&state.db, &auth.id).await?;
    match form.validate(&services, &Local) {
        Ok(new) => {
            appointments::create(&state.db, &auth.id, new).await?;
            Ok(back_to_dashboard())
        }
        Err(errors) => {
            render_dashboard(
                &state,
                &auth,
                DashboardForms {
                    appointment: form.view(),
                    appointment_errors: errors,
                    ..DashboardForms::default()
                },
            )
            .await
        }
    }
}

async fn edit_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let appointment = appointments::get(&state.db, &auth.id, &path.into_inner()).await?;
    let services = services::list(&state.db, &auth.id).await?;
    let local = appointment.scheduled_at.with_timezone(&Local);
    let form = AppointmentFormView {
        service_id: appointment.service_id.clone(),
        date: local.format("%Y-%m-%d").to_string(),
        time: local.format("%H:%M").to_string(),
        client_name: appointment.client_name.clone(),
        client_phone: appointment.client_phone.clone(),
    };

    Ok(render(AppointmentEditTemplate {
        service_options: service_options(&services, &form.service_id),
        appointment_id: appointment.id,
        status: appointment.status.as_str(),
        is_completed: appointment.status == AppointmentStatus::Completed,
        form,
        errors: Vec::new(),
    }))
}

async fn update_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    path: web::Path<String>,
    form: web::Form<AppointmentForm>,
) -> Result<HttpResponse> {
    let appointment_id = path.into_inner();
    let form = form.into_inner();
    let current = appointments::get(&state.db, &auth.id, &appointment_id).await?;
    let mut services = services::list(&state.db, &auth.id).await?;
    // Keep a dangling reference editable without forcing a new service.
    if !services.iter().any(|service| service.id == current.service_id) {
        services.push(Service {
            id: current.service_id.clone(),
            owner_id: auth.id.clone(),
            name: REMOVED_SERVICE.to_string(),
            price_cents: 0,
            duration_minutes: 0,
            payment_method: None,
        });
    }

    match form.validate(&services, &Local) {
        Ok(valid) => {
            let patch = AppointmentPatch {
                service_id: Some(valid.service_id),
                scheduled_at: Some(valid.scheduled_at),
                client_name: Some(valid.client_name),
                client_phone: Some(valid.client_phone),
            };
            appointments::update(&state.db, &auth.id, &appointment_id, patch).await?;
            Ok(back_to_dashboard())
        }
        Err(errors) => Ok(render(AppointmentEditTemplate {
            service_options: service_options(&services, &form.service_id),
            appointment_id,
            status: current.status.as_str(),
            is_completed: current.status == AppointmentStatus::Completed,
            form: form.view(),
            errors,
        })),
    }
}

async fn update_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    path: web::Path<String>,
    form: web::Form<StatusForm>,
) -> Result<HttpResponse> {
    appointments::set_status(&state.db, &auth.id, &path.into_inner(), &form.status).await?;
    Ok(back_to_dashboard())
}

async fn delete_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    appointments::delete(&state.db, &auth.id, &path.into_inner()).await?;
    Ok(back_to_dashboard())
}

async fn create_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    form: web::Form<ServiceForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    match form.validate() {
        Ok(new) => {
            services::create(&state.db, &auth.id, new).await?;
            Ok(back_to_dashboard())
        }
        Err(errors) => {
            render_dashboard(
                &state,
                &auth,
                DashboardForms {
                    service: form.view(),
                    service_errors: errors,
                    ..DashboardForms::default()
                },
            )
            .await
        }
    }
}

async fn edit_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let service = services::get(&state.db, &auth.id, &path.into_inner()).await?;
    let form = ServiceFormView {
        name: service.name.clone(),
        price: format_amount(service.price_cents),
        duration_minutes: service.duration_minutes.to_string(),
        payment_method: service
            .payment_method
            .map(|method| method.as_str().to_string())
            .unwrap_or_default(),
    };

    Ok(render(ServiceEditTemplate {
        payment_options: payment_options(&form.payment_method),
        service_id: service.id,
        form,
        errors: Vec::new(),
    }))
}

async fn update_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    path: web::Path<String>,
    form: web::Form<ServiceForm>,
) -> Result<HttpResponse> {
    let service_id = path.into_inner();
    let form = form.into_inner();
    match form.validate() {
        Ok(valid) => {
            let patch = ServicePatch {
                name: Some(valid.name),
                price_cents: Some(valid.price_cents),
                duration_minutes: Some(valid.duration_minutes),
                payment_method: Some(valid.payment_method),
            };
            services::update(&state.db, &auth.id, &service_id, patch).await?;
            Ok(back_to_dashboard())
        }
        Err(errors) => {
            // Surface a 404 rather than a form for ids the owner does not have.
            services::get(&state.db, &auth.id, &service_id).await?;
            let view = form.view();
            Ok(render(ServiceEditTemplate {
                payment_options: payment_options(&view.payment_method),
                service_id,
                form: view,
                errors,
            }))
        }
    }
}

async fn delete_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthOwner>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    services::delete(&state.db, &auth.id, &path.into_inner()).await?;
    Ok(back_to_dashboard())
}

fn appointment_views(appointments: &[Appointment], services: &[Service]) -> Vec<AppointmentView> {
    let by_id: HashMap<&str, &Service> = services
        .iter()
        .map(|service| (service.id.as_str(), service))
        .collect();

    appointments
        .iter()
        .map(|appointment| {
            let service = by_id.get(appointment.service_id.as_str());
            AppointmentView {
                id: appointment.id.clone(),
                client_name: appointment.client_name.clone(),
                client_phone: appointment.client_phone.clone(),
                service_name: service
                    .map(|service| service.name.clone())
                    .unwrap_or_else(|| REMOVED_SERVICE.to_string()),
                price: service
                    .map(|service| format_amount(service.price_cents))
                    .unwrap_or_else(|| "-".to_string()),
                scheduled_for: appointment
                    .scheduled_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
                status: appointment.status.as_str(),
                is_completed: appointment.status == AppointmentStatus::Completed,
            }
        })
        .collect()
}

fn service_view(service: &Service) -> ServiceView {
    ServiceView {
        id: service.id.clone(),
        name: service.name.clone(),
        price: format_amount(service.price_cents),
        duration_minutes: service.duration_minutes,
        payment_method: service.payment_method.map(PaymentMethod::label).unwrap_or("None"),
    }
}

fn service_options(services: &[Service], selected: &str) -> Vec<SelectOption> {
    services
        .iter()
        .map(|service| SelectOption {
            value: service.id.clone(),
            label: format!("{} ({})", service.name, format_amount(service.price_cents)),
            selected: service.id == selected,
        })
        .collect()
}

fn payment_options(selected: &str) -> Vec<SelectOption> {
    let mut options = vec![SelectOption {
        value: String::new(),
        label: "None".to_string(),
        selected: selected.is_empty() || selected == "none",
    }];
    options.extend(PaymentMethod::ALL.into_iter().map(|method| SelectOption {
        value: method.as_str().to_string(),
        label: method.label().to_string(),
        selected: method.as_str() == selected,
    }));
    options
}

fn parse_local_datetime<Tz: TimeZone>(date: &str, time: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    zone.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Parses `"30"`, `"30.5"` or `"30,50"` into minor units.
fn parse_amount(raw: &str) -> Option<i64> {
    let normalized = raw.trim().replace(',', ".");
    let (whole, fraction) = normalized
        .split_once('.')
        .unwrap_or((normalized.as_str(), ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) || fraction.len() > 2 {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(fraction)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{
        http::StatusCode,
        test::{call_and_read_body, call_and_read_body_json, call_service, init_service, TestRequest},
        App,
    };
    use chrono::{Datelike, FixedOffset, Timelike};

    use super::*;
    use crate::{
        accounts::{create_account, sample_account},
        db::test_pool,
        routes::basic_auth,
        state::testing::{test_state, FakePayments},
    };

    fn service(id: &str) -> Service {
        Service {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            name: "Cut".to_string(),
            price_cents: 3000,
            duration_minutes: 30,
            payment_method: None,
        }
    }

    fn appointment_form(service_id: &str, date: &str, time: &str) -> AppointmentForm {
        AppointmentForm {
            service_id: service_id.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            client_name: " Ana ".to_string(),
            client_phone: "555-0101".to_string(),
        }
    }

    #[test]
    fn parses_amounts_into_cents() {
        assert_eq!(parse_amount("30"), Some(3000));
        assert_eq!(parse_amount("30.5"), Some(3050));
        assert_eq!(parse_amount("30,05"), Some(3005));
        assert_eq!(parse_amount(".99"), Some(99));
        assert_eq!(parse_amount("0"), Some(0));
        assert_eq!(parse_amount("-1"), None);
        assert_eq!(parse_amount("1.234"), None);
        assert_eq!(parse_amount("1.2.3"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn appointment_form_converts_local_time_to_utc() {
        let zone = FixedOffset::west_opt(3 * 3600).unwrap();
        let new = appointment_form("s1", "2026-10-19", "21:30")
            .validate(&[service("s1")], &zone)
            .unwrap();

        assert_eq!(new.scheduled_at.day(), 20);
        assert_eq!(new.scheduled_at.hour(), 0);
        assert_eq!(new.scheduled_at.minute(), 30);
        assert_eq!(new.client_name, "Ana");
    }

    #[test]
    fn appointment_form_rejects_foreign_services_and_blank_fields() {
        let mut form = appointment_form("other-owners-service", "2026-13-01", "10:00");
        form.client_phone = "  ".to_string();
        let errors = form.validate(&[service("s1")], &Utc).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn service_form_validation_happens_at_the_edge() {
        let form = ServiceForm {
            name: "".to_string(),
            price: "-10".to_string(),
            duration_minutes: "0".to_string(),
            payment_method: Some("barter".to_string()),
        };
        assert_eq!(form.validate().unwrap_err().len(), 4);

        let form = ServiceForm {
            name: "Beard".to_string(),
            price: "25,00".to_string(),
            duration_minutes: "20".to_string(),
            payment_method: Some("none".to_string()),
        };
        let new = form.validate().unwrap();
        assert_eq!(new.price_cents, 2500);
        assert_eq!(new.payment_method, None);
    }

    #[test]
    fn service_price_has_an_upper_bound() {
        let form = |price: &str| ServiceForm {
            name: "Gold cut".to_string(),
            price: price.to_string(),
            duration_minutes: "60".to_string(),
            payment_method: None,
        };
        assert_eq!(form("1000000.00").validate().unwrap().price_cents, MAX_PRICE_CENTS);
        assert_eq!(form("1000000.01").validate().unwrap_err().len(), 1);
        assert_eq!(form("92233720368547758").validate().unwrap_err().len(), 1);
    }

    #[test]
    fn dangling_appointments_render_as_removed() {
        let appointment = Appointment {
            id: "a1".to_string(),
            owner_id: "owner".to_string(),
            service_id: "gone".to_string(),
            scheduled_at: Utc::now(),
            client_name: "Ana".to_string(),
            client_phone: "555".to_string(),
            status: AppointmentStatus::Completed,
            created_at: Utc::now(),
        };
        let views = appointment_views(&[appointment], &[service("s1")]);
        assert_eq!(views[0].service_name, REMOVED_SERVICE);
        assert_eq!(views[0].price, "-");
    }

    macro_rules! dashboard_app {
        ($state:expr) => {
            init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn requires_credentials() {
        let state = test_state(test_pool().await, Arc::new(FakePayments::default()));
        let app = dashboard_app!(state);
        let resp = call_service(&app, TestRequest::get().uri("/dashboard").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn booking_flow_updates_the_summary() {
        let pool = test_pool().await;
        create_account(&pool, sample_account("shop@example.com")).await.unwrap();
        let state = test_state(pool.clone(), Arc::new(FakePayments::default()));
        let app = dashboard_app!(state);
        let auth = || basic_auth("shop@example.com", "s3cret-pass");

        let req = TestRequest::post()
            .uri("/dashboard/services")
            .insert_header(auth())
            .set_form([
                ("name", "Haircut"),
                ("price", "30.00"),
                ("duration_minutes", "30"),
                ("payment_method", "pix"),
            ])
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

        let owner = accounts::sign_in(&pool, "shop@example.com", "s3cret-pass").await.unwrap();
        let service = services::list(&pool, &owner.id).await.unwrap().remove(0);
        let today = Local::now().format("%Y-%m-%d").to_string();

        for client in ["Ana", "Bia"] {
            let req = TestRequest::post()
                .uri("/dashboard/appointments")
                .insert_header(auth())
                .set_form([
                    ("service_id", service.id.as_str()),
                    ("date", today.as_str()),
                    ("time", "00:00"),
                    ("client_name", client),
                    ("client_phone", "555-0101"),
                ])
                .to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::SEE_OTHER);
        }

        let booked = appointments::list(&pool, &owner.id).await.unwrap();
        let req = TestRequest::post()
            .uri(&format!("/dashboard/appointments/{}/status", booked[0].id))
            .insert_header(auth())
            .set_form([("status", "completed")])
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

        let req = TestRequest::get()
            .uri("/dashboard/summary")
            .insert_header(auth())
            .to_request();
        let summary: serde_json::Value = call_and_read_body_json(&app, req).await;
        assert_eq!(summary["daily_revenue"], "30.00");
        assert_eq!(summary["monthly_revenue"], "30.00");
        assert_eq!(summary["daily_appointment_count"], 1);

        let req = TestRequest::get().uri("/dashboard").insert_header(auth()).to_request();
        let body = call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Haircut"));
        assert!(body.contains("Bia"));
    }

    #[actix_web::test]
    async fn deleting_a_billed_service_drops_it_from_the_totals() {
        let pool = test_pool().await;
        let owner = create_account(&pool, sample_account("shop@example.com")).await.unwrap();
        let haircut = services::create(
            &pool,
            &owner.id,
            NewService {
                name: "Haircut".to_string(),
                price_cents: 3000,
                duration_minutes: 30,
                payment_method: None,
            },
        )
        .await
        .unwrap();
        let now = Utc::now();
        let appointment = appointments::create(
            &pool,
            &owner.id,
            NewAppointment {
                service_id: haircut.id.clone(),
                scheduled_at: now,
                client_name: "Ana".to_string(),
                client_phone: "555".to_string(),
            },
        )
        .await
        .unwrap();
        appointments::set_status(&pool, &owner.id, &appointment.id, "completed")
            .await
            .unwrap();

        let before = load_read_model(&pool, &owner.id, &now).await.unwrap();
        assert_eq!(before.summary.daily_revenue_cents, 3000);
        assert_eq!(before.summary.monthly_revenue_cents, 3000);

        assert!(services::delete(&pool, &owner.id, &haircut.id).await.unwrap());

        let after = load_read_model(&pool, &owner.id, &now).await.unwrap();
        assert_eq!(after.appointments.len(), 1);
        assert_eq!(after.summary, RevenueSummary::default());
        assert_eq!(
            appointment_views(&after.appointments, &after.services)[0].service_name,
            REMOVED_SERVICE
        );
    }

    #[actix_web::test]
    async fn bogus_status_is_a_bad_request() {
        let pool = test_pool().await;
        let owner = create_account(&pool, sample_account("shop@example.com")).await.unwrap();
        let appointment = appointments::create(
            &pool,
            &owner.id,
            NewAppointment {
                service_id: "s1".to_string(),
                scheduled_at: Utc::now(),
                client_name: "Ana".to_string(),
                client_phone: "555".to_string(),
            },
        )
        .await
        .unwrap();
        let app = dashboard_app!(test_state(pool, Arc::new(FakePayments::default())));

        let req = TestRequest::post()
            .uri(&format!("/dashboard/appointments/{}/status", appointment.id))
            .insert_header(basic_auth("shop@example.com", "s3cret-pass"))
            .set_form([("status", "bogus")])
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn other_owners_records_are_not_found() {
        let pool = test_pool().await;
        let owner_a = create_account(&pool, sample_account("a@example.com")).await.unwrap();
        create_account(&pool, sample_account("b@example.com")).await.unwrap();
        let appointment = appointments::create(
            &pool,
            &owner_a.id,
            NewAppointment {
                service_id: "s1".to_string(),
                scheduled_at: Utc::now(),
                client_name: "Ana".to_string(),
                client_phone: "555".to_string(),
            },
        )
        .await
        .unwrap();
        let app = dashboard_app!(test_state(pool.clone(), Arc::new(FakePayments::default())));

        let req = TestRequest::get()
            .uri(&format!("/dashboard/appointments/{}", appointment.id))
            .insert_header(basic_auth("b@example.com", "s3cret-pass"))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = TestRequest::post()
            .uri(&format!("/dashboard/appointments/{}/delete", appointment.id))
            .insert_header(basic_auth("b@example.com", "s3cret-pass"))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::SEE_OTHER);
        assert!(appointments::get(&pool, &owner_a.id, &appointment.id).await.is_ok());
    }
}
