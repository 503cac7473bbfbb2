use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_date, format_timestamp, parse_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{DistributionStatus, ProgramFrequency, ScopeType};
use crate::models::{AllocationDistribution, AllocationProgram, DistributionBatch};

const PROGRAM_COLUMNS: &str = "id, name, medicine_id, quantity_per_resident, frequency, scope_type,
     barangay, purok, start_date, end_date, is_active";

pub fn insert_program(conn: &Connection, p: &AllocationProgram) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO allocation_programs (id, name, medicine_id, quantity_per_resident, frequency,
         scope_type, barangay, purok, start_date, end_date, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            p.id.to_string(),
            p.name,
            p.medicine_id.to_string(),
            p.quantity_per_resident,
            p.frequency.as_str(),
            p.scope_type.as_str(),
            p.barangay,
            p.purok,
            format_date(p.start_date),
            p.end_date.map(format_date),
            p.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_program(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<AllocationProgram>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PROGRAM_COLUMNS} FROM allocation_programs WHERE id = ?1"),
            params![id.to_string()],
            program_row_from_rusqlite,
        )
        .optional()?;
    row.map(program_from_row).transpose()
}

/// Active programs registered for a barangay, by start date.
pub fn get_programs_for_barangay(
    conn: &Connection,
    barangay: &str,
) -> Result<Vec<AllocationProgram>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROGRAM_COLUMNS} FROM allocation_programs
         WHERE is_active = 1 AND LOWER(barangay) = LOWER(?1)
         ORDER BY start_date ASC, name ASC"
    ))?;
    let rows = stmt.query_map(params![barangay], program_row_from_rusqlite)?;

    let mut programs = Vec::new();
    for row in rows {
        programs.push(program_from_row(row?)?);
    }
    Ok(programs)
}

/// Every active program, by barangay then start date.
pub fn list_active_programs(conn: &Connection) -> Result<Vec<AllocationProgram>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROGRAM_COLUMNS} FROM allocation_programs
         WHERE is_active = 1
         ORDER BY barangay ASC, start_date ASC, name ASC"
    ))?;
    let rows = stmt.query_map([], program_row_from_rusqlite)?;

    let mut programs = Vec::new();
    for row in rows {
        programs.push(program_from_row(row?)?);
    }
    Ok(programs)
}

/// Record a claim. A second claim for the same program, resident and
/// period fails with a UNIQUE violation.
pub fn insert_distribution(
    conn: &Connection,
    d: &AllocationDistribution,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO allocation_distributions (id, program_id, resident_id, period, quantity,
         status, distributed_by, claimed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            d.id.to_string(),
            d.program_id.to_string(),
            d.resident_id.to_string(),
            d.period,
            d.quantity,
            d.status.as_str(),
            d.distributed_by.to_string(),
            format_timestamp(d.claimed_at),
        ],
    )?;
    Ok(())
}

pub fn insert_distribution_batch(
    conn: &Connection,
    line: &DistributionBatch,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO allocation_distribution_batches (distribution_id, batch_id, quantity)
         VALUES (?1, ?2, ?3)",
        params![
            line.distribution_id.to_string(),
            line.batch_id.to_string(),
            line.quantity,
        ],
    )?;
    Ok(())
}

pub fn get_distribution_batches(
    conn: &Connection,
    distribution_id: &Uuid,
) -> Result<Vec<DistributionBatch>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.distribution_id, l.batch_id, l.quantity
         FROM allocation_distribution_batches l
         JOIN medicine_batches b ON b.id = l.batch_id
         WHERE l.distribution_id = ?1
         ORDER BY b.expiry_date ASC, b.received_at ASC",
    )?;
    let rows = stmt.query_map(params![distribution_id.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
    })?;

    let mut lines = Vec::new();
    for row in rows {
        let (distribution_id, batch_id, quantity) = row?;
        lines.push(DistributionBatch {
            distribution_id: parse_uuid(&distribution_id)?,
            batch_id: parse_uuid(&batch_id)?,
            quantity,
        });
    }
    Ok(lines)
}

/// Claim rows of a program for one period.
pub fn get_distributions_for_period(
    conn: &Connection,
    program_id: &Uuid,
    period: &str,
) -> Result<Vec<AllocationDistribution>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, program_id, resident_id, period, quantity, status, distributed_by, claimed_at
         FROM allocation_distributions
         WHERE program_id = ?1 AND period = ?2
         ORDER BY claimed_at ASC",
    )?;
    let rows = stmt.query_map(params![program_id.to_string(), period], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut distributions = Vec::new();
    for row in rows {
        let (id, program_id, resident_id, period, quantity, status, distributed_by, claimed_at) =
            row?;
        distributions.push(AllocationDistribution {
            id: parse_uuid(&id)?,
            program_id: parse_uuid(&program_id)?,
            resident_id: parse_uuid(&resident_id)?,
            period,
            quantity,
            status: DistributionStatus::from_str(&status)?,
            distributed_by: parse_uuid(&distributed_by)?,
            claimed_at: parse_timestamp(&claimed_at)?,
        });
    }
    Ok(distributions)
}

pub fn has_claimed(
    conn: &Connection,
    program_id: &Uuid,
    resident_id: &Uuid,
    period: &str,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM allocation_distributions
         WHERE program_id = ?1 AND resident_id = ?2 AND period = ?3",
        params![program_id.to_string(), resident_id.to_string(), period],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// Internal row type for AllocationProgram mapping
struct ProgramRow {
    id: String,
    name: String,
    medicine_id: String,
    quantity_per_resident: i64,
    frequency: String,
    scope_type: String,
    barangay: String,
    purok: Option<String>,
    start_date: String,
    end_date: Option<String>,
    is_active: i32,
}

fn program_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ProgramRow, rusqlite::Error> {
    Ok(ProgramRow {
        id: row.get(0)?,
        name: row.get(1)?,
        medicine_id: row.get(2)?,
        quantity_per_resident: row.get(3)?,
        frequency: row.get(4)?,
        scope_type: row.get(5)?,
        barangay: row.get(6)?,
        purok: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        is_active: row.get(10)?,
    })
}

fn program_from_row(row: ProgramRow) -> Result<AllocationProgram, DatabaseError> {
    Ok(AllocationProgram {
        id: parse_uuid(&row.id)?,
        name: row.name,
        medicine_id: parse_uuid(&row.medicine_id)?,
        quantity_per_resident: row.quantity_per_resident,
        frequency: ProgramFrequency::from_str(&row.frequency)?,
        scope_type: ScopeType::from_str(&row.scope_type)?,
        barangay: row.barangay,
        purok: row.purok,
        start_date: parse_date(&row.start_date)?,
        end_date: row.end_date.as_deref().map(parse_date).transpose()?,
        is_active: row.is_active != 0,
    })
}
