use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::enums::UserRole;
use crate::models::User;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, full_name, role, barangay, purok, contact_number, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.full_name,
            user.role.as_str(),
            user.barangay,
            user.purok,
            user.contact_number,
            user.is_active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, full_name, role, barangay, purok, contact_number, is_active
             FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, i32>(6)?,
                ))
            },
        )
        .optional()?;

    match row {
        None => Ok(None),
        Some((id, full_name, role, barangay, purok, contact_number, is_active)) => Ok(Some(User {
            id: parse_uuid(&id)?,
            full_name,
            role: UserRole::from_str(&role)?,
            barangay,
            purok,
            contact_number,
            is_active: is_active != 0,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn user_insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let user = make_user(&conn, UserRole::Bhw, "San Isidro", Some("Purok 2"));
        let loaded = get_user(&conn, &user.id).unwrap().unwrap();
        assert_eq!(loaded.role, UserRole::Bhw);
        assert_eq!(loaded.purok.as_deref(), Some("Purok 2"));
        assert!(loaded.is_active);
    }

    #[test]
    fn unknown_user_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_user(&conn, &Uuid::new_v4()).unwrap().is_none());
    }
}
