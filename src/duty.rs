//! BHW duty schedules: who may dispense on which day.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::MAX_WINDOW_DAYS;
use crate::db::{self, DatabaseError};
use crate::error::WorkflowError;
use crate::models::enums::{DutyShift, UserRole};
use crate::models::{DutySchedule, User};

/// Admin form for assigning a BHW to a day.
#[derive(Debug, Clone, Deserialize)]
pub struct DutyAssignment {
    pub bhw_id: Uuid,
    pub duty_date: NaiveDate,
    pub shift: DutyShift,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_active() -> bool {
    true
}

pub fn is_on_duty(
    conn: &Connection,
    bhw_id: &Uuid,
    date: NaiveDate,
) -> Result<bool, DatabaseError> {
    db::has_active_duty(conn, bhw_id, date)
}

/// Active assignments from `from` through the following `days` days.
/// The window is clamped to `0..=MAX_WINDOW_DAYS`.
pub fn schedule_for(
    conn: &Connection,
    bhw_id: &Uuid,
    from: NaiveDate,
    days: i64,
) -> Result<Vec<DutySchedule>, DatabaseError> {
    let until = from + Duration::days(days.clamp(0, MAX_WINDOW_DAYS));
    db::get_duty_schedules_between(conn, bhw_id, from, until)
}

pub fn assign_duty(
    conn: &Connection,
    actor: &User,
    assignment: &DutyAssignment,
) -> Result<DutySchedule, WorkflowError> {
    if !actor.is_admin() {
        return Err(WorkflowError::Forbidden("Only administrators can assign duty"));
    }
    let bhw = db::get_user(conn, &assignment.bhw_id)?
        .filter(|u| u.is_active && u.role == UserRole::Bhw)
        .ok_or_else(|| WorkflowError::not_found("BHW", assignment.bhw_id))?;

    let mut schedule = DutySchedule {
        id: Uuid::new_v4(),
        bhw_id: bhw.id,
        duty_date: assignment.duty_date,
        shift: assignment.shift,
        is_active: assignment.is_active,
        notes: assignment.notes.clone(),
    };
    schedule.id = db::upsert_duty_schedule(conn, &schedule)?;
    tracing::info!(
        bhw_id = %bhw.id,
        date = %schedule.duty_date,
        shift = %schedule.shift,
        "Duty assigned"
    );
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    fn assignment(bhw_id: Uuid, day: NaiveDate) -> DutyAssignment {
        DutyAssignment {
            bhw_id,
            duty_date: day,
            shift: DutyShift::Morning,
            is_active: true,
            notes: Some("Health center".into()),
        }
    }

    #[test]
    fn admin_assigns_and_bhw_is_on_duty() {
        let conn = open_memory_database().unwrap();
        let admin = make_user(&conn, UserRole::Admin, "Municipal", None);
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        let day = date(2026, 10, 19);

        assign_duty(&conn, &admin, &assignment(bhw.id, day)).unwrap();
        assert!(is_on_duty(&conn, &bhw.id, day).unwrap());
        assert!(!is_on_duty(&conn, &bhw.id, date(2026, 10, 20)).unwrap());
    }

    #[test]
    fn reassigning_a_day_keeps_the_stored_id() {
        let conn = open_memory_database().unwrap();
        let admin = make_user(&conn, UserRole::Admin, "Municipal", None);
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        let day = date(2026, 10, 19);

        let first = assign_duty(&conn, &admin, &assignment(bhw.id, day)).unwrap();
        let mut change = assignment(bhw.id, day);
        change.shift = DutyShift::Afternoon;
        let second = assign_duty(&conn, &admin, &change).unwrap();
        assert_eq!(second.id, first.id);

        let stored = schedule_for(&conn, &bhw.id, day, 0).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, second.id);
        assert_eq!(stored[0].shift, DutyShift::Afternoon);
    }

    #[test]
    fn bhw_cannot_assign_duty() {
        let conn = open_memory_database().unwrap();
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        let err = assign_duty(&conn, &bhw, &assignment(bhw.id, date(2026, 10, 19))).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn cannot_assign_admin_to_duty() {
        let conn = open_memory_database().unwrap();
        let admin = make_user(&conn, UserRole::Admin, "Municipal", None);
        let form = assignment(admin.id, date(2026, 10, 19));
        let err = assign_duty(&conn, &admin, &form).unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { entity: "BHW", .. }));
    }

    #[test]
    fn schedule_window_is_bounded() {
        let conn = open_memory_database().unwrap();
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        make_duty(&conn, bhw.id, date(2026, 10, 19), true);
        make_duty(&conn, bhw.id, date(2026, 10, 26), true);
        make_duty(&conn, bhw.id, date(2026, 10, 27), true);

        let week = schedule_for(&conn, &bhw.id, date(2026, 10, 19), 7).unwrap();
        assert_eq!(week.len(), 2);
    }

    #[test]
    fn huge_schedule_window_is_clamped() {
        let conn = open_memory_database().unwrap();
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        make_duty(&conn, bhw.id, date(2026, 10, 19), true);
        make_duty(&conn, bhw.id, date(2030, 1, 6), true);
        make_duty(&conn, bhw.id, date(2040, 1, 6), true);

        let all = schedule_for(&conn, &bhw.id, date(2026, 10, 19), i64::MAX).unwrap();
        assert_eq!(all.len(), 2);
        let none_back = schedule_for(&conn, &bhw.id, date(2026, 10, 19), i64::MIN).unwrap();
        assert_eq!(none_back.len(), 1);
    }
}
