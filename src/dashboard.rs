//! BHW dashboard: one fetch for every panel on the landing page.
//!
//! Panels load independently. A panel whose query fails is logged and
//! rendered empty so one bad table never blanks the whole page.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::allocation::{self, ProgramSummary};
use crate::announcements;
use crate::config::DashboardSettings;
use crate::db::DatabaseError;
use crate::duty;
use crate::inventory::{self, BatchView, StockSummary};
use crate::models::enums::{Audience, RequestStatus};
use crate::models::{Announcement, DutySchedule, User};
use crate::requests;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestCounts {
    pub submitted: u32,
    pub ready_to_dispense: u32,
    pub dispensed_today: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub bhw_name: String,
    pub on_duty_today: bool,
    pub requests: RequestCounts,
    pub low_stock: Vec<StockSummary>,
    pub expiring_batches: Vec<BatchView>,
    pub upcoming_duty: Vec<DutySchedule>,
    pub announcements: Vec<Announcement>,
    pub programs: Vec<ProgramSummary>,
}

fn panel<T: Default>(name: &'static str, result: Result<T, DatabaseError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(panel = name, error = %e, "Dashboard panel failed to load");
        T::default()
    })
}

pub fn bhw_dashboard(
    conn: &Connection,
    bhw: &User,
    now: NaiveDateTime,
    settings: &DashboardSettings,
) -> Dashboard {
    let today = now.date();
    let scope = bhw.list_scope();
    let scope = scope.as_ref();

    let requests = RequestCounts {
        submitted: panel(
            "submitted_requests",
            requests::count_requests(conn, scope, RequestStatus::Submitted, false),
        ),
        ready_to_dispense: panel(
            "ready_requests",
            requests::count_requests(conn, scope, RequestStatus::Approved, true),
        ),
        dispensed_today: panel(
            "dispensed_today",
            requests::count_dispensed_on(conn, scope, today),
        ),
    };

    Dashboard {
        bhw_name: bhw.full_name.clone(),
        on_duty_today: panel("on_duty", duty::is_on_duty(conn, &bhw.id, today)),
        requests,
        low_stock: panel(
            "low_stock",
            inventory::low_stock(conn, today, settings.expiry_warning_days),
        ),
        expiring_batches: panel(
            "expiring_batches",
            inventory::expiring_batches(conn, today, settings.expiry_warning_days),
        ),
        upcoming_duty: panel(
            "upcoming_duty",
            duty::schedule_for(conn, &bhw.id, today, settings.upcoming_duty_days),
        ),
        announcements: panel(
            "announcements",
            announcements::active_announcements(
                conn,
                Audience::Bhw,
                now,
                settings.announcement_limit,
            ),
        ),
        programs: panel("programs", allocation::active_programs(conn, scope, today)),
    }
}
