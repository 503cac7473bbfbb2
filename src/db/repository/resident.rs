use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_date, format_timestamp, parse_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Resident, Scope};

const RESIDENT_COLUMNS: &str = "id, first_name, last_name, birth_date, sex, barangay, purok,
     contact_number, is_active, created_at";

pub fn insert_resident(conn: &Connection, resident: &Resident) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO residents (id, first_name, last_name, birth_date, sex, barangay, purok,
         contact_number, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            resident.id.to_string(),
            resident.first_name,
            resident.last_name,
            format_date(resident.birth_date),
            resident.sex,
            resident.barangay,
            resident.purok,
            resident.contact_number,
            resident.is_active as i32,
            format_timestamp(resident.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_resident(conn: &Connection, id: &Uuid) -> Result<Option<Resident>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {RESIDENT_COLUMNS} FROM residents WHERE id = ?1"),
            params![id.to_string()],
            resident_row_from_rusqlite,
        )
        .optional()?;
    row.map(resident_from_row).transpose()
}

/// Active residents living inside `scope` (all residents for `None`), ordered by name.
pub fn list_residents_in_scope(
    conn: &Connection,
    scope: Option<&Scope>,
) -> Result<Vec<Resident>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESIDENT_COLUMNS} FROM residents
         WHERE is_active = 1
           AND (?1 IS NULL OR LOWER(barangay) = LOWER(?1))
           AND (?2 IS NULL OR LOWER(purok) = LOWER(?2))
         ORDER BY last_name, first_name"
    ))?;

    let barangay = scope.map(|s| s.barangay.as_str());
    let purok = scope.and_then(|s| s.purok.as_deref());
    let rows = stmt.query_map(params![barangay, purok], resident_row_from_rusqlite)?;

    let mut residents = Vec::new();
    for row in rows {
        residents.push(resident_from_row(row?)?);
    }
    Ok(residents)
}

// Internal row type for Resident mapping
struct ResidentRow {
    id: String,
    first_name: String,
    last_name: String,
    birth_date: String,
    sex: Option<String>,
    barangay: String,
    purok: Option<String>,
    contact_number: Option<String>,
    is_active: i32,
    created_at: String,
}

fn resident_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ResidentRow, rusqlite::Error> {
    Ok(ResidentRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        birth_date: row.get(3)?,
        sex: row.get(4)?,
        barangay: row.get(5)?,
        purok: row.get(6)?,
        contact_number: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn resident_from_row(row: ResidentRow) -> Result<Resident, DatabaseError> {
    Ok(Resident {
        id: parse_uuid(&row.id)?,
        first_name: row.first_name,
        last_name: row.last_name,
        birth_date: parse_date(&row.birth_date)?,
        sex: row.sex,
        barangay: row.barangay,
        purok: row.purok,
        contact_number: row.contact_number,
        is_active: row.is_active != 0,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn resident_insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let r = make_resident(&conn, date(1950, 3, 14), "San Isidro", Some("Purok 1"));
        let loaded = get_resident(&conn, &r.id).unwrap().unwrap();
        assert_eq!(loaded.birth_date, date(1950, 3, 14));
        assert_eq!(loaded.full_name(), "Jose Rizal");
    }

    #[test]
    fn scope_filters_by_barangay_and_purok() {
        let conn = open_memory_database().unwrap();
        make_resident(&conn, date(1950, 1, 1), "San Isidro", Some("Purok 1"));
        make_resident(&conn, date(1950, 1, 1), "San Isidro", Some("Purok 2"));
        make_resident(&conn, date(1950, 1, 1), "Poblacion", Some("Purok 1"));

        let whole = Scope { barangay: "san isidro".into(), purok: None };
        assert_eq!(list_residents_in_scope(&conn, Some(&whole)).unwrap().len(), 2);

        let purok = Scope { barangay: "San Isidro".into(), purok: Some("Purok 2".into()) };
        assert_eq!(list_residents_in_scope(&conn, Some(&purok)).unwrap().len(), 1);

        assert_eq!(list_residents_in_scope(&conn, None).unwrap().len(), 3);
    }
}
