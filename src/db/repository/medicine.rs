use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_date, format_timestamp, parse_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Medicine, MedicineBatch};

const BATCH_COLUMNS: &str = "id, medicine_id, batch_number, quantity_received, quantity_available,
     expiry_date, received_at";

pub fn insert_medicine(conn: &Connection, medicine: &Medicine) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (id, name, dosage_form, strength, unit, reorder_level, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            medicine.id.to_string(),
            medicine.name,
            medicine.dosage_form,
            medicine.strength,
            medicine.unit,
            medicine.reorder_level,
            medicine.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_medicine(conn: &Connection, id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, dosage_form, strength, unit, reorder_level, is_active
             FROM medicines WHERE id = ?1",
            params![id.to_string()],
            medicine_tuple,
        )
        .optional()?;
    row.map(medicine_from_tuple).transpose()
}

pub fn list_active_medicines(conn: &Connection) -> Result<Vec<Medicine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, dosage_form, strength, unit, reorder_level, is_active
         FROM medicines WHERE is_active = 1 ORDER BY name",
    )?;
    let rows = stmt.query_map([], medicine_tuple)?;

    let mut medicines = Vec::new();
    for row in rows {
        medicines.push(medicine_from_tuple(row?)?);
    }
    Ok(medicines)
}

type MedicineTuple = (String, String, Option<String>, Option<String>, String, i64, i32);

fn medicine_tuple(row: &rusqlite::Row<'_>) -> Result<MedicineTuple, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn medicine_from_tuple(t: MedicineTuple) -> Result<Medicine, DatabaseError> {
    let (id, name, dosage_form, strength, unit, reorder_level, is_active) = t;
    Ok(Medicine {
        id: parse_uuid(&id)?,
        name,
        dosage_form,
        strength,
        unit,
        reorder_level,
        is_active: is_active != 0,
    })
}

pub fn insert_batch(conn: &Connection, batch: &MedicineBatch) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medicine_batches (id, medicine_id, batch_number, quantity_received,
         quantity_available, expiry_date, received_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            batch.id.to_string(),
            batch.medicine_id.to_string(),
            batch.batch_number,
            batch.quantity_received,
            batch.quantity_available,
            format_date(batch.expiry_date),
            format_timestamp(batch.received_at),
        ],
    )?;
    Ok(())
}

pub fn get_batch(conn: &Connection, id: &Uuid) -> Result<Option<MedicineBatch>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {BATCH_COLUMNS} FROM medicine_batches WHERE id = ?1"),
            params![id.to_string()],
            batch_row_from_rusqlite,
        )
        .optional()?;
    row.map(batch_from_row).transpose()
}

/// All batches of a medicine in FEFO order (earliest expiry first, then oldest receipt).
pub fn get_batches_for_medicine(
    conn: &Connection,
    medicine_id: &Uuid,
) -> Result<Vec<MedicineBatch>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BATCH_COLUMNS} FROM medicine_batches
         WHERE medicine_id = ?1
         ORDER BY expiry_date ASC, received_at ASC"
    ))?;
    let batches = collect_batches(
        stmt.query_map(params![medicine_id.to_string()], batch_row_from_rusqlite)?,
    )?;
    Ok(batches)
}

/// Non-empty, unexpired batches of a medicine in FEFO order.
pub fn get_dispensable_batches(
    conn: &Connection,
    medicine_id: &Uuid,
    today: NaiveDate,
) -> Result<Vec<MedicineBatch>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BATCH_COLUMNS} FROM medicine_batches
         WHERE medicine_id = ?1 AND quantity_available > 0 AND expiry_date >= ?2
         ORDER BY expiry_date ASC, received_at ASC"
    ))?;
    let batches = collect_batches(stmt.query_map(
        params![medicine_id.to_string(), format_date(today)],
        batch_row_from_rusqlite,
    )?)?;
    Ok(batches)
}

/// Non-empty batches expiring between `today` and `until` (inclusive), soonest first.
pub fn get_batches_expiring_between(
    conn: &Connection,
    today: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<MedicineBatch>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BATCH_COLUMNS} FROM medicine_batches
         WHERE quantity_available > 0 AND expiry_date >= ?1 AND expiry_date <= ?2
         ORDER BY expiry_date ASC"
    ))?;
    let batches = collect_batches(stmt.query_map(
        params![format_date(today), format_date(until)],
        batch_row_from_rusqlite,
    )?)?;
    Ok(batches)
}

/// Guarded stock decrement. Returns `false` (and changes nothing) when the
/// batch does not hold `quantity` units.
pub fn decrement_batch(
    conn: &Connection,
    batch_id: &Uuid,
    quantity: i64,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE medicine_batches SET quantity_available = quantity_available - ?1
         WHERE id = ?2 AND quantity_available >= ?1",
        params![quantity, batch_id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Total unexpired stock on hand for a medicine.
pub fn available_stock(
    conn: &Connection,
    medicine_id: &Uuid,
    today: NaiveDate,
) -> Result<i64, DatabaseError> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(quantity_available), 0) FROM medicine_batches
         WHERE medicine_id = ?1 AND expiry_date >= ?2",
        params![medicine_id.to_string(), format_date(today)],
        |row| row.get(0),
    )?;
    Ok(total)
}

fn collect_batches(
    rows: impl Iterator<Item = Result<BatchRow, rusqlite::Error>>,
) -> Result<Vec<MedicineBatch>, DatabaseError> {
    let mut batches = Vec::new();
    for row in rows {
        batches.push(batch_from_row(row?)?);
    }
    Ok(batches)
}

// Internal row type for MedicineBatch mapping
struct BatchRow {
    id: String,
    medicine_id: String,
    batch_number: String,
    quantity_received: i64,
    quantity_available: i64,
    expiry_date: String,
    received_at: String,
}

fn batch_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<BatchRow, rusqlite::Error> {
    Ok(BatchRow {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        batch_number: row.get(2)?,
        quantity_received: row.get(3)?,
        quantity_available: row.get(4)?,
        expiry_date: row.get(5)?,
        received_at: row.get(6)?,
    })
}

fn batch_from_row(row: BatchRow) -> Result<MedicineBatch, DatabaseError> {
    Ok(MedicineBatch {
        id: parse_uuid(&row.id)?,
        medicine_id: parse_uuid(&row.medicine_id)?,
        batch_number: row.batch_number,
        quantity_received: row.quantity_received,
        quantity_available: row.quantity_available,
        expiry_date: parse_date(&row.expiry_date)?,
        received_at: parse_timestamp(&row.received_at)?,
    })
}
