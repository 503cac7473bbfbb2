use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ExpiryState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub unit: String,
    pub reorder_level: i64,
    pub is_active: bool,
}

/// A stock lot of one medicine with its own expiry date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineBatch {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub batch_number: String,
    pub quantity_received: i64,
    pub quantity_available: i64,
    pub expiry_date: NaiveDate,
    pub received_at: NaiveDateTime,
}

impl MedicineBatch {
    pub fn is_expired_on(&self, date: NaiveDate) -> bool {
        self.expiry_date < date
    }

    /// A batch expiring on `today` is still dispensable.
    pub fn expiry_state(&self, today: NaiveDate, warning_days: i64) -> ExpiryState {
        if self.is_expired_on(today) {
            ExpiryState::Expired
        } else if (self.expiry_date - today).num_days() <= warning_days {
            ExpiryState::ExpiringSoon
        } else {
            ExpiryState::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(expiry: NaiveDate) -> MedicineBatch {
        MedicineBatch {
            id: Uuid::new_v4(),
            medicine_id: Uuid::new_v4(),
            batch_number: "B-001".into(),
            quantity_received: 100,
            quantity_available: 100,
            expiry_date: expiry,
            received_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn expiry_states() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            batch(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()).expiry_state(today, 30),
            ExpiryState::Expired
        );
        assert_eq!(batch(today).expiry_state(today, 30), ExpiryState::ExpiringSoon);
        assert_eq!(
            batch(NaiveDate::from_ymd_opt(2026, 11, 18).unwrap()).expiry_state(today, 30),
            ExpiryState::ExpiringSoon
        );
        assert_eq!(
            batch(NaiveDate::from_ymd_opt(2026, 11, 19).unwrap()).expiry_state(today, 30),
            ExpiryState::Ok
        );
    }
}
