use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum age for the senior-citizen programs.
pub const SENIOR_AGE: u32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub sex: Option<String>,
    pub barangay: String,
    pub purok: Option<String>,
    pub contact_number: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Resident {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn age_on(&self, date: NaiveDate) -> u32 {
        age_on(self.birth_date, date)
    }

    pub fn is_senior_on(&self, date: NaiveDate) -> bool {
        self.age_on(date) >= SENIOR_AGE
    }
}

/// Completed years between `birth_date` and `date` (0 if born after `date`).
pub fn age_on(birth_date: NaiveDate, date: NaiveDate) -> u32 {
    let mut years = date.year() - birth_date.year();
    if (date.month(), date.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn age_counts_completed_years() {
        assert_eq!(age_on(d(1966, 10, 19), d(2026, 10, 19)), 60);
        assert_eq!(age_on(d(1966, 10, 20), d(2026, 10, 19)), 59);
        assert_eq!(age_on(d(1950, 1, 1), d(2026, 10, 19)), 76);
    }

    #[test]
    fn age_never_negative() {
        assert_eq!(age_on(d(2030, 1, 1), d(2026, 1, 1)), 0);
    }

    #[test]
    fn leap_day_birthday() {
        assert_eq!(age_on(d(1964, 2, 29), d(2024, 2, 28)), 59);
        assert_eq!(age_on(d(1964, 2, 29), d(2024, 2, 29)), 60);
    }
}
