//! Medicine request queue: list views, detail, and lifecycle transitions
//! (submit → approve/reject → mark ready). Dispensing itself lives in
//! `crate::dispensing`.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, format_date, parse_timestamp, DatabaseError};
use crate::dispensing;
use crate::error::WorkflowError;
use crate::models::enums::RequestStatus;
use crate::models::*;

// ═══════════════════════════════════════════
// View types
// ═══════════════════════════════════════════

/// One row of the request queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestListItem {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub resident_name: String,
    pub barangay: String,
    pub purok: Option<String>,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub quantity_requested: i64,
    pub status: RequestStatus,
    pub is_ready_to_dispense: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    #[serde(default)]
    pub ready_only: bool,
}

/// Full request view with dispensing candidates and history.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    pub request: MedicineRequest,
    pub resident: Option<Resident>,
    pub medicine: Option<Medicine>,
    pub candidate_batches: Vec<MedicineBatch>,
    /// Unexpired units of the requested medicine across all batches.
    pub stock_on_hand: i64,
    pub fulfillments: Vec<RequestFulfillment>,
    pub dispensings: Vec<RequestDispensing>,
}

/// Submission form for a new request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRequest {
    pub resident_id: Uuid,
    pub medicine_id: Uuid,
    pub quantity_requested: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

// ═══════════════════════════════════════════
// Queries
// ═══════════════════════════════════════════

/// Requests from residents inside `scope` (all for `None`), newest first.
pub fn list_requests(
    conn: &Connection,
    scope: Option<&Scope>,
    filter: &RequestFilter,
) -> Result<Vec<RequestListItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.resident_id, res.first_name || ' ' || res.last_name, res.barangay,
                res.purok, r.medicine_id, m.name, r.quantity_requested, r.status,
                r.is_ready_to_dispense, r.created_at
         FROM requests r
         JOIN residents res ON res.id = r.resident_id
         JOIN medicines m ON m.id = r.medicine_id
         WHERE (?1 IS NULL OR LOWER(res.barangay) = LOWER(?1))
           AND (?2 IS NULL OR LOWER(res.purok) = LOWER(?2))
           AND (?3 IS NULL OR r.status = ?3)
           AND (?4 = 0 OR r.is_ready_to_dispense = 1)
         ORDER BY r.created_at DESC",
    )?;

    let rows = stmt.query_map(
        params![
            scope.map(|s| s.barangay.as_str()),
            scope.and_then(|s| s.purok.as_deref()),
            filter.status.map(|s| s.as_str()),
            filter.ready_only as i32,
        ],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, i32>(9)?,
                row.get::<_, String>(10)?,
            ))
        },
    )?;

    let mut items = Vec::new();
    for row in rows {
        let (
            id,
            resident_id,
            resident_name,
            barangay,
            purok,
            medicine_id,
            medicine_name,
            qty,
            status,
            ready,
            created_at,
        ) = row?;
        items.push(RequestListItem {
            id: db::parse_uuid(&id)?,
            resident_id: db::parse_uuid(&resident_id)?,
            resident_name,
            barangay,
            purok,
            medicine_id: db::parse_uuid(&medicine_id)?,
            medicine_name,
            quantity_requested: qty,
            status: status.parse()?,
            is_ready_to_dispense: ready != 0,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(items)
}

/// Approved requests flagged ready, i.e. the dispensing queue.
pub fn ready_to_dispense(
    conn: &Connection,
    scope: Option<&Scope>,
) -> Result<Vec<RequestListItem>, DatabaseError> {
    list_requests(
        conn,
        scope,
        &RequestFilter {
            status: Some(RequestStatus::Approved),
            ready_only: true,
        },
    )
}

/// Number of requests in `status` within `scope`.
pub fn count_requests(
    conn: &Connection,
    scope: Option<&Scope>,
    status: RequestStatus,
    ready_only: bool,
) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM requests r
         JOIN residents res ON res.id = r.resident_id
         WHERE (?1 IS NULL OR LOWER(res.barangay) = LOWER(?1))
           AND (?2 IS NULL OR LOWER(res.purok) = LOWER(?2))
           AND r.status = ?3
           AND (?4 = 0 OR r.is_ready_to_dispense = 1)",
        params![
            scope.map(|s| s.barangay.as_str()),
            scope.and_then(|s| s.purok.as_deref()),
            status.as_str(),
            ready_only as i32,
        ],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Requests dispensed on `date` within `scope`.
pub fn count_dispensed_on(
    conn: &Connection,
    scope: Option<&Scope>,
    date: NaiveDate,
) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM requests r
         JOIN residents res ON res.id = r.resident_id
         WHERE (?1 IS NULL OR LOWER(res.barangay) = LOWER(?1))
           AND (?2 IS NULL OR LOWER(res.purok) = LOWER(?2))
           AND r.status = 'dispensed'
           AND substr(r.dispensed_at, 1, 10) = ?3",
        params![
            scope.map(|s| s.barangay.as_str()),
            scope.and_then(|s| s.purok.as_deref()),
            format_date(date),
        ],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_request_detail(
    conn: &Connection,
    actor: &User,
    id: &Uuid,
    today: NaiveDate,
) -> Result<RequestDetail, WorkflowError> {
    let request =
        db::get_request(conn, id)?.ok_or_else(|| WorkflowError::not_found("Request", id))?;
    let resident = db::get_resident(conn, &request.resident_id)?;
    if let Some(r) = &resident {
        if !actor.can_access(&r.barangay, r.purok.as_deref()) {
            return Err(WorkflowError::OutOfScope("Request"));
        }
    }
    let medicine = db::get_medicine(conn, &request.medicine_id)?;
    let candidate_batches = if request.status.is_terminal() {
        Vec::new()
    } else {
        dispensing::fefo_batches(conn, &request.medicine_id, today)?
    };
    let stock_on_hand = db::available_stock(conn, &request.medicine_id, today)?;
    let fulfillments = db::get_fulfillments_for_request(conn, id)?;
    let dispensings = dispensing::dispensing_history(conn, id)?;

    Ok(RequestDetail {
        request,
        resident,
        medicine,
        candidate_batches,
        stock_on_hand,
        fulfillments,
        dispensings,
    })
}

// ═══════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════

pub fn submit_request(
    conn: &Connection,
    actor: &User,
    form: &NewRequest,
    now: NaiveDateTime,
) -> Result<MedicineRequest, WorkflowError> {
    if form.quantity_requested <= 0 {
        return Err(WorkflowError::Validation(
            "Quantity requested must be greater than zero".into(),
        ));
    }
    let resident = db::get_resident(conn, &form.resident_id)?
        .filter(|r| r.is_active)
        .ok_or_else(|| WorkflowError::not_found("Resident", form.resident_id))?;
    if !actor.can_access(&resident.barangay, resident.purok.as_deref()) {
        return Err(WorkflowError::OutOfScope("Resident"));
    }
    db::get_medicine(conn, &form.medicine_id)?
        .filter(|m| m.is_active)
        .ok_or_else(|| WorkflowError::not_found("Medicine", form.medicine_id))?;

    let request = MedicineRequest {
        id: Uuid::new_v4(),
        resident_id: form.resident_id,
        medicine_id: form.medicine_id,
        quantity_requested: form.quantity_requested,
        reason: form.reason.clone().filter(|r| !r.trim().is_empty()),
        status: RequestStatus::Submitted,
        is_ready_to_dispense: false,
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
        dispensed_by: None,
        dispensed_at: None,
        created_at: now,
    };
    db::insert_request(conn, &request)?;
    tracing::info!(
        request_id = %request.id,
        resident_id = %request.resident_id,
        "Request submitted"
    );
    Ok(request)
}

pub fn approve_request(
    conn: &Connection,
    actor: &User,
    id: &Uuid,
    now: NaiveDateTime,
) -> Result<MedicineRequest, WorkflowError> {
    review(conn, actor, id, RequestStatus::Approved, None, now)
}

pub fn reject_request(
    conn: &Connection,
    actor: &User,
    id: &Uuid,
    reason: &str,
    now: NaiveDateTime,
) -> Result<MedicineRequest, WorkflowError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(WorkflowError::Validation("A rejection reason is required".into()));
    }
    review(conn, actor, id, RequestStatus::Rejected, Some(reason), now)
}

/// Flag an approved request as ready for pickup/dispensing.
pub fn mark_ready(
    conn: &Connection,
    actor: &User,
    id: &Uuid,
) -> Result<MedicineRequest, WorkflowError> {
    let request = load_in_scope(conn, actor, id)?;
    if request.status != RequestStatus::Approved {
        return Err(WorkflowError::NotApproved(request.status));
    }
    db::set_ready_to_dispense(conn, id, true)?;
    tracing::info!(request_id = %id, "Request marked ready to dispense");
    Ok(MedicineRequest {
        is_ready_to_dispense: true,
        ..request
    })
}

fn review(
    conn: &Connection,
    actor: &User,
    id: &Uuid,
    next: RequestStatus,
    rejection_reason: Option<&str>,
    now: NaiveDateTime,
) -> Result<MedicineRequest, WorkflowError> {
    let request = load_in_scope(conn, actor, id)?;
    if !request.status.can_transition_to(next) || next == RequestStatus::Dispensed {
        return Err(WorkflowError::InvalidTransition {
            from: request.status,
            to: next,
        });
    }
    db::update_request_review(conn, id, next, &actor.id, now, rejection_reason)?;
    tracing::info!(request_id = %id, status = %next, reviewer = %actor.id, "Request reviewed");

    db::get_request(conn, id)?.ok_or_else(|| WorkflowError::not_found("Request", id))
}

fn load_in_scope(
    conn: &Connection,
    actor: &User,
    id: &Uuid,
) -> Result<MedicineRequest, WorkflowError> {
    let request =
        db::get_request(conn, id)?.ok_or_else(|| WorkflowError::not_found("Request", id))?;
    let resident = db::get_resident(conn, &request.resident_id)?
        .ok_or_else(|| WorkflowError::not_found("Resident", request.resident_id))?;
    if !actor.can_access(&resident.barangay, resident.purok.as_deref()) {
        return Err(WorkflowError::OutOfScope("Request"));
    }
    Ok(request)
}
