use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RequestStatus;

/// A resident's request for a medicine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineRequest {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub medicine_id: Uuid,
    pub quantity_requested: i64,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub is_ready_to_dispense: bool,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub dispensed_by: Option<Uuid>,
    pub dispensed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl MedicineRequest {
    pub fn is_dispensable(&self) -> bool {
        self.status == RequestStatus::Approved && self.is_ready_to_dispense
    }
}

/// Stock drawn from one batch to fill a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFulfillment {
    pub id: Uuid,
    pub request_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i64,
    pub created_at: NaiveDateTime,
}

/// Dispensing log entry: who released what from which batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDispensing {
    pub id: Uuid,
    pub request_id: Uuid,
    pub batch_id: Uuid,
    pub bhw_id: Uuid,
    pub quantity_released: i64,
    pub dispensing_notes: Option<String>,
    pub dispensed_at: NaiveDateTime,
}
