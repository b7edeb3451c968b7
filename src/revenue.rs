//! Revenue totals for the owner dashboard.
//!
//! Pure computation over already-loaded records. The reference instant is
//! passed in, and its time zone decides where the owner's day and month begin.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus, Service};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevenueSummary {
    pub daily_revenue_cents: i64,
    pub monthly_revenue_cents: i64,
    pub daily_appointment_count: u32,
}

/// Sums the prices of completed appointments scheduled since the start of
/// `now`'s day and month.
///
/// Both windows are lower bounds, so the monthly total always includes the
/// daily one. Totals saturate at `i64::MAX`. Pending appointments and appointments whose service no longer
/// exists contribute nothing.
pub fn summarize<Tz: TimeZone>(
    appointments: &[Appointment],
    services: &[Service],
    now: &DateTime<Tz>,
) -> RevenueSummary {
    let zone = now.timezone();
    let today = now.date_naive();
    let first_of_month = today - Duration::days(i64::from(today.day0()));
    let start_of_day = local_midnight(&zone, today);
    let start_of_month = local_midnight(&zone, first_of_month);

    let prices: HashMap<&str, i64> = services
        .iter()
        .map(|service| (service.id.as_str(), service.price_cents))
        .collect();

    let mut summary = RevenueSummary::default();
    for appointment in appointments {
        if appointment.status != AppointmentStatus::Completed {
            continue;
        }
        let Some(&price) = prices.get(appointment.service_id.as_str()) else {
            continue;
        };
        if appointment.scheduled_at >= start_of_day {
            summary.daily_revenue_cents = summary.daily_revenue_cents.saturating_add(price);
            summary.daily_appointment_count = summary.daily_appointment_count.saturating_add(1);
        }
        if appointment.scheduled_at >= start_of_month {
            summary.monthly_revenue_cents = summary.monthly_revenue_cents.saturating_add(price);
        }
    }
    summary
}

/// First instant of `date` in `zone`. Skips forward when a DST transition
/// removes midnight.
fn local_midnight<Tz: TimeZone>(zone: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let mut local = date.and_time(NaiveTime::MIN);
    for _ in 0..(24 * 4) {
        match zone.from_local_datetime(&local) {
            LocalResult::Single(instant) => return instant.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => local += Duration::minutes(15),
        }
    }
    date.and_time(NaiveTime::MIN).and_utc()
}
