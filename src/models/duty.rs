use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DutyShift;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutySchedule {
    pub id: Uuid,
    pub bhw_id: Uuid,
    pub duty_date: NaiveDate,
    pub shift: DutyShift,
    pub is_active: bool,
    pub notes: Option<String>,
}
