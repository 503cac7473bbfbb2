use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_date, parse_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::DutyShift;
use crate::models::DutySchedule;

/// Insert a duty assignment, replacing any existing row for the same BHW and day.
/// Returns the id of the stored row, which keeps its original id on replace.
pub fn upsert_duty_schedule(conn: &Connection, s: &DutySchedule) -> Result<Uuid, DatabaseError> {
    let id: String = conn.query_row(
        "INSERT INTO bhw_duty_schedules (id, bhw_id, duty_date, shift, is_active, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (bhw_id, duty_date) DO UPDATE SET
             shift = excluded.shift,
             is_active = excluded.is_active,
             notes = excluded.notes
         RETURNING id",
        params![
            s.id.to_string(),
            s.bhw_id.to_string(),
            format_date(s.duty_date),
            s.shift.as_str(),
            s.is_active as i32,
            s.notes,
        ],
        |row| row.get(0),
    )?;
    parse_uuid(&id)
}

pub fn has_active_duty(
    conn: &Connection,
    bhw_id: &Uuid,
    date: NaiveDate,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bhw_duty_schedules
         WHERE bhw_id = ?1 AND duty_date = ?2 AND is_active = 1",
        params![bhw_id.to_string(), format_date(date)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Active assignments for a BHW in `[from, until]`, earliest first.
pub fn get_duty_schedules_between(
    conn: &Connection,
    bhw_id: &Uuid,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<DutySchedule>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, bhw_id, duty_date, shift, is_active, notes FROM bhw_duty_schedules
         WHERE bhw_id = ?1 AND duty_date >= ?2 AND duty_date <= ?3 AND is_active = 1
         ORDER BY duty_date ASC",
    )?;
    let rows = stmt.query_map(
        params![bhw_id.to_string(), format_date(from), format_date(until)],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        },
    )?;

    let mut schedules = Vec::new();
    for row in rows {
        let (id, bhw_id, duty_date, shift, is_active, notes) = row?;
        schedules.push(DutySchedule {
            id: parse_uuid(&id)?,
            bhw_id: parse_uuid(&bhw_id)?,
            duty_date: parse_date(&duty_date)?,
            shift: DutyShift::from_str(&shift)?,
            is_active: is_active != 0,
            notes,
        });
    }
    Ok(schedules)
}
