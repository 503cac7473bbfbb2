//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a borrowed `Connection` so callers can run it
//! either directly or inside a transaction (`Transaction` derefs to
//! `Connection`).

mod allocation;
mod announcement;
mod duty;
mod medicine;
mod request;
mod resident;
mod user;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::{DATE_FORMAT, TIMESTAMP_FORMAT};

pub use allocation::*;
pub use announcement::*;
pub use duty::*;
pub use medicine::*;
pub use request::*;
pub use resident::*;
pub use user::*;

pub fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::InvalidValue(e.to_string()))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| DatabaseError::InvalidValue(format!("bad date '{s}': {e}")))
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| DatabaseError::InvalidValue(format!("bad timestamp '{s}': {e}")))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared row builders for module tests.

    use chrono::{NaiveDate, NaiveDateTime};
    use rusqlite::Connection;
    use uuid::Uuid;

    use super::*;
    use crate::models::enums::*;
    use crate::models::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn at(date: NaiveDate, h: u32) -> NaiveDateTime {
        date.and_hms_opt(h, 0, 0).unwrap()
    }

    pub fn make_user(
        conn: &Connection,
        role: UserRole,
        barangay: &str,
        purok: Option<&str>,
    ) -> User {
        let user = User {
            id: Uuid::new_v4(),
            full_name: "Maria Santos".into(),
            role,
            barangay: barangay.into(),
            purok: purok.map(String::from),
            contact_number: None,
            is_active: true,
        };
        insert_user(conn, &user).unwrap();
        user
    }

    pub fn make_resident(
        conn: &Connection,
        birth_date: NaiveDate,
        barangay: &str,
        purok: Option<&str>,
    ) -> Resident {
        let resident = Resident {
            id: Uuid::new_v4(),
            first_name: "Jose".into(),
            last_name: "Rizal".into(),
            birth_date,
            sex: Some("M".into()),
            barangay: barangay.into(),
            purok: purok.map(String::from),
            contact_number: None,
            is_active: true,
            created_at: at(date(2026, 1, 5), 9),
        };
        insert_resident(conn, &resident).unwrap();
        resident
    }

    pub fn make_medicine(conn: &Connection, name: &str, reorder_level: i64) -> Medicine {
        let medicine = Medicine {
            id: Uuid::new_v4(),
            name: name.into(),
            dosage_form: Some("tablet".into()),
            strength: Some("500mg".into()),
            unit: "pcs".into(),
            reorder_level,
            is_active: true,
        };
        insert_medicine(conn, &medicine).unwrap();
        medicine
    }

    pub fn make_batch(
        conn: &Connection,
        medicine_id: Uuid,
        number: &str,
        quantity: i64,
        expiry: NaiveDate,
    ) -> MedicineBatch {
        let batch = MedicineBatch {
            id: Uuid::new_v4(),
            medicine_id,
            batch_number: number.into(),
            quantity_received: quantity,
            quantity_available: quantity,
            expiry_date: expiry,
            received_at: at(date(2026, 1, 10), 8),
        };
        insert_batch(conn, &batch).unwrap();
        batch
    }

    pub fn make_request(
        conn: &Connection,
        resident_id: Uuid,
        medicine_id: Uuid,
        quantity: i64,
        status: RequestStatus,
        ready: bool,
    ) -> MedicineRequest {
        let request = MedicineRequest {
            id: Uuid::new_v4(),
            resident_id,
            medicine_id,
            quantity_requested: quantity,
            reason: Some("Maintenance".into()),
            status,
            is_ready_to_dispense: ready,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            dispensed_by: None,
            dispensed_at: None,
            created_at: at(date(2026, 10, 1), 10),
        };
        insert_request(conn, &request).unwrap();
        request
    }

    pub fn make_duty(
        conn: &Connection,
        bhw_id: Uuid,
        day: NaiveDate,
        active: bool,
    ) -> DutySchedule {
        let mut schedule = DutySchedule {
            id: Uuid::new_v4(),
            bhw_id,
            duty_date: day,
            shift: DutyShift::WholeDay,
            is_active: active,
            notes: None,
        };
        schedule.id = upsert_duty_schedule(conn, &schedule).unwrap();
        schedule
    }
}
