//! Resident registry views for BHWs.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::error::WorkflowError;
use crate::models::{MedicineRequest, Resident, Scope, User};

#[derive(Debug, Clone, Serialize)]
pub struct ResidentSummary {
    #[serde(flatten)]
    pub resident: Resident,
    pub age: u32,
    pub is_senior: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResidentDetail {
    #[serde(flatten)]
    pub summary: ResidentSummary,
    pub requests: Vec<MedicineRequest>,
}

fn summarize(resident: Resident, today: NaiveDate) -> ResidentSummary {
    ResidentSummary {
        age: resident.age_on(today),
        is_senior: resident.is_senior_on(today),
        resident,
    }
}

/// Active residents inside `scope` (everyone for `None`), by name.
pub fn list_residents(
    conn: &Connection,
    scope: Option<&Scope>,
    today: NaiveDate,
) -> Result<Vec<ResidentSummary>, DatabaseError> {
    Ok(db::list_residents_in_scope(conn, scope)?
        .into_iter()
        .map(|r| summarize(r, today))
        .collect())
}

/// One resident with their request history, newest first.
pub fn get_resident(
    conn: &Connection,
    actor: &User,
    id: &Uuid,
    today: NaiveDate,
) -> Result<ResidentDetail, WorkflowError> {
    let resident =
        db::get_resident(conn, id)?.ok_or_else(|| WorkflowError::not_found("Resident", id))?;
    if !actor.can_access(&resident.barangay, resident.purok.as_deref()) {
        return Err(WorkflowError::OutOfScope("Resident"));
    }
    let requests = db::get_requests_for_resident(conn, id)?;
    Ok(ResidentDetail {
        summary: summarize(resident, today),
        requests,
    })
}
