use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DistributionStatus, ProgramFrequency, ScopeType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationProgram {
    pub id: Uuid,
    pub name: String,
    pub medicine_id: Uuid,
    pub quantity_per_resident: i64,
    pub frequency: ProgramFrequency,
    pub scope_type: ScopeType,
    pub barangay: String,
    pub purok: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl AllocationProgram {
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.is_active
            && self.start_date <= date
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// Whether a resident living in `barangay`/`purok` is covered.
    pub fn covers(&self, barangay: &str, purok: Option<&str>) -> bool {
        if !self.barangay.eq_ignore_ascii_case(barangay) {
            return false;
        }
        match self.scope_type {
            ScopeType::Barangay => true,
            ScopeType::Purok => match (&self.purok, purok) {
                (Some(p), Some(r)) => p.eq_ignore_ascii_case(r),
                _ => false,
            },
        }
    }
}

/// One resident's claim against a program for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationDistribution {
    pub id: Uuid,
    pub program_id: Uuid,
    pub resident_id: Uuid,
    pub period: String,
    pub quantity: i64,
    pub status: DistributionStatus,
    pub distributed_by: Uuid,
    pub claimed_at: NaiveDateTime,
}

/// Stock one claim took from one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionBatch {
    pub distribution_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i64,
}
