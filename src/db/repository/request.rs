use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::RequestStatus;
use crate::models::{MedicineRequest, RequestDispensing, RequestFulfillment};

const REQUEST_COLUMNS: &str = "id, resident_id, medicine_id, quantity_requested, reason, status,
     is_ready_to_dispense, reviewed_by, reviewed_at, rejection_reason, dispensed_by,
     dispensed_at, created_at";

pub fn insert_request(conn: &Connection, req: &MedicineRequest) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO requests (id, resident_id, medicine_id, quantity_requested, reason, status,
         is_ready_to_dispense, reviewed_by, reviewed_at, rejection_reason, dispensed_by,
         dispensed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            req.id.to_string(),
            req.resident_id.to_string(),
            req.medicine_id.to_string(),
            req.quantity_requested,
            req.reason,
            req.status.as_str(),
            req.is_ready_to_dispense as i32,
            req.reviewed_by.map(|id| id.to_string()),
            req.reviewed_at.map(format_timestamp),
            req.rejection_reason,
            req.dispensed_by.map(|id| id.to_string()),
            req.dispensed_at.map(format_timestamp),
            format_timestamp(req.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_request(conn: &Connection, id: &Uuid) -> Result<Option<MedicineRequest>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1"),
            params![id.to_string()],
            request_row_from_rusqlite,
        )
        .optional()?;
    row.map(request_from_row).transpose()
}

pub fn get_requests_for_resident(
    conn: &Connection,
    resident_id: &Uuid,
) -> Result<Vec<MedicineRequest>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM requests WHERE resident_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![resident_id.to_string()], request_row_from_rusqlite)?;

    let mut requests = Vec::new();
    for row in rows {
        requests.push(request_from_row(row?)?);
    }
    Ok(requests)
}

/// Record a review decision (approve or reject).
pub fn update_request_review(
    conn: &Connection,
    id: &Uuid,
    status: RequestStatus,
    reviewer: &Uuid,
    reviewed_at: NaiveDateTime,
    rejection_reason: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE requests SET status = ?1, reviewed_by = ?2, reviewed_at = ?3,
         rejection_reason = ?4, is_ready_to_dispense = 0
         WHERE id = ?5",
        params![
            status.as_str(),
            reviewer.to_string(),
            format_timestamp(reviewed_at),
            rejection_reason,
            id.to_string(),
        ],
    )?;
    ensure_changed(changed, id)
}

pub fn set_ready_to_dispense(
    conn: &Connection,
    id: &Uuid,
    ready: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE requests SET is_ready_to_dispense = ?1 WHERE id = ?2",
        params![ready as i32, id.to_string()],
    )?;
    ensure_changed(changed, id)
}

/// Flip an approved request to dispensed. Guarded on the current status so a
/// concurrent dispense of the same request updates zero rows.
pub fn mark_request_dispensed(
    conn: &Connection,
    id: &Uuid,
    bhw_id: &Uuid,
    dispensed_at: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE requests SET status = 'dispensed', is_ready_to_dispense = 0,
         dispensed_by = ?1, dispensed_at = ?2
         WHERE id = ?3 AND status = 'approved' AND is_ready_to_dispense = 1",
        params![bhw_id.to_string(), format_timestamp(dispensed_at), id.to_string()],
    )?;
    Ok(changed == 1)
}

fn ensure_changed(changed: usize, id: &Uuid) -> Result<(), DatabaseError> {
    if changed == 0 {
        return Err(DatabaseError::not_found("request", id));
    }
    Ok(())
}

pub fn insert_fulfillment(conn: &Connection, f: &RequestFulfillment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO request_fulfillments (id, request_id, batch_id, quantity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            f.id.to_string(),
            f.request_id.to_string(),
            f.batch_id.to_string(),
            f.quantity,
            format_timestamp(f.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_fulfillments_for_request(
    conn: &Connection,
    request_id: &Uuid,
) -> Result<Vec<RequestFulfillment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, request_id, batch_id, quantity, created_at
         FROM request_fulfillments WHERE request_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map(params![request_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut fulfillments = Vec::new();
    for row in rows {
        let (id, request_id, batch_id, quantity, created_at) = row?;
        fulfillments.push(RequestFulfillment {
            id: parse_uuid(&id)?,
            request_id: parse_uuid(&request_id)?,
            batch_id: parse_uuid(&batch_id)?,
            quantity,
            created_at: parse_timestamp(&created_at)?,
        });
    }
    Ok(fulfillments)
}

pub fn insert_dispensing(conn: &Connection, d: &RequestDispensing) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO request_dispensings (id, request_id, batch_id, bhw_id, quantity_released,
         dispensing_notes, dispensed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            d.id.to_string(),
            d.request_id.to_string(),
            d.batch_id.to_string(),
            d.bhw_id.to_string(),
            d.quantity_released,
            d.dispensing_notes,
            format_timestamp(d.dispensed_at),
        ],
    )?;
    Ok(())
}

pub fn get_dispensings_for_request(
    conn: &Connection,
    request_id: &Uuid,
) -> Result<Vec<RequestDispensing>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, request_id, batch_id, bhw_id, quantity_released, dispensing_notes, dispensed_at
         FROM request_dispensings WHERE request_id = ?1 ORDER BY dispensed_at ASC",
    )?;
    let rows = stmt.query_map(params![request_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut dispensings = Vec::new();
    for row in rows {
        let (id, request_id, batch_id, bhw_id, quantity_released, dispensing_notes, dispensed_at) =
            row?;
        dispensings.push(RequestDispensing {
            id: parse_uuid(&id)?,
            request_id: parse_uuid(&request_id)?,
            batch_id: parse_uuid(&batch_id)?,
            bhw_id: parse_uuid(&bhw_id)?,
            quantity_released,
            dispensing_notes,
            dispensed_at: parse_timestamp(&dispensed_at)?,
        });
    }
    Ok(dispensings)
}

// Internal row type for MedicineRequest mapping
struct RequestRow {
    id: String,
    resident_id: String,
    medicine_id: String,
    quantity_requested: i64,
    reason: Option<String>,
    status: String,
    is_ready_to_dispense: i32,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
    rejection_reason: Option<String>,
    dispensed_by: Option<String>,
    dispensed_at: Option<String>,
    created_at: String,
}

fn request_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RequestRow, rusqlite::Error> {
    Ok(RequestRow {
        id: row.get(0)?,
        resident_id: row.get(1)?,
        medicine_id: row.get(2)?,
        quantity_requested: row.get(3)?,
        reason: row.get(4)?,
        status: row.get(5)?,
        is_ready_to_dispense: row.get(6)?,
        reviewed_by: row.get(7)?,
        reviewed_at: row.get(8)?,
        rejection_reason: row.get(9)?,
        dispensed_by: row.get(10)?,
        dispensed_at: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn request_from_row(row: RequestRow) -> Result<MedicineRequest, DatabaseError> {
    Ok(MedicineRequest {
        id: parse_uuid(&row.id)?,
        resident_id: parse_uuid(&row.resident_id)?,
        medicine_id: parse_uuid(&row.medicine_id)?,
        quantity_requested: row.quantity_requested,
        reason: row.reason,
        status: RequestStatus::from_str(&row.status)?,
        is_ready_to_dispense: row.is_ready_to_dispense != 0,
        reviewed_by: row.reviewed_by.as_deref().map(parse_uuid).transpose()?,
        reviewed_at: row.reviewed_at.as_deref().map(parse_timestamp).transpose()?,
        rejection_reason: row.rejection_reason,
        dispensed_by: row.dispensed_by.as_deref().map(parse_uuid).transpose()?,
        dispensed_at: row.dispensed_at.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::UserRole;

    #[test]
    fn request_insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let resident = make_resident(&conn, date(1950, 1, 1), "San Isidro", None);
        let med = make_medicine(&conn, "Amlodipine", 0);
        let req = make_request(&conn, resident.id, med.id, 30, RequestStatus::Submitted, false);

        let loaded = get_request(&conn, &req.id).unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::Submitted);
        assert_eq!(loaded.quantity_requested, 30);
        assert!(!loaded.is_ready_to_dispense);
        assert!(loaded.reviewed_at.is_none());
    }

    #[test]
    fn corrupt_dispenser_id_is_an_error() {
        let conn = open_memory_database().unwrap();
        let resident = make_resident(&conn, date(1950, 1, 1), "San Isidro", None);
        let med = make_medicine(&conn, "Amlodipine", 0);
        let req = make_request(&conn, resident.id, med.id, 30, RequestStatus::Approved, false);

        conn.execute_batch("PRAGMA foreign_keys = OFF").unwrap();
        conn.execute(
            "UPDATE requests SET dispensed_by = 'not-a-uuid' WHERE id = ?1",
            [req.id.to_string()],
        )
        .unwrap();

        let err = get_request(&conn, &req.id).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidValue(_)));
    }

    #[test]
    fn review_clears_ready_flag() {
        let conn = open_memory_database().unwrap();
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        let resident = make_resident(&conn, date(1950, 1, 1), "San Isidro", None);
        let med = make_medicine(&conn, "Amlodipine", 0);
        let req = make_request(&conn, resident.id, med.id, 30, RequestStatus::Approved, true);

        update_request_review(
            &conn,
            &req.id,
            RequestStatus::Rejected,
            &bhw.id,
            at(date(2026, 10, 19), 9),
            Some("Duplicate request"),
        )
        .unwrap();

        let loaded = get_request(&conn, &req.id).unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::Rejected);
        assert!(!loaded.is_ready_to_dispense);
        assert_eq!(loaded.reviewed_by, Some(bhw.id));
        assert_eq!(loaded.rejection_reason.as_deref(), Some("Duplicate request"));
    }

    #[test]
    fn mark_dispensed_requires_ready_approved() {
        let conn = open_memory_database().unwrap();
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        let resident = make_resident(&conn, date(1950, 1, 1), "San Isidro", None);
        let med = make_medicine(&conn, "Amlodipine", 0);
        let not_ready =
            make_request(&conn, resident.id, med.id, 30, RequestStatus::Approved, false);
        let ready = make_request(&conn, resident.id, med.id, 30, RequestStatus::Approved, true);
        let now = at(date(2026, 10, 19), 10);

        assert!(!mark_request_dispensed(&conn, &not_ready.id, &bhw.id, now).unwrap());
        assert!(mark_request_dispensed(&conn, &ready.id, &bhw.id, now).unwrap());
        // Second flip is a no-op
        assert!(!mark_request_dispensed(&conn, &ready.id, &bhw.id, now).unwrap());
    }

    #[test]
    fn updating_unknown_request_is_not_found() {
        let conn = open_memory_database().unwrap();
        let result = set_ready_to_dispense(&conn, &Uuid::new_v4(), true);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
