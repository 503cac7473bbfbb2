use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::RequestStatus;

/// Reasons a dispense is refused. The `Display` text is the message shown
/// to the BHW after the transaction is rolled back.
#[derive(Error, Debug)]
pub enum DispenseError {
    #[error("You are not scheduled for duty today and cannot dispense medicine")]
    NotOnDuty,

    #[error("Quantity to release must be greater than zero (got {0})")]
    InvalidQuantity(i64),

    #[error("Request {0} was not found")]
    RequestNotFound(Uuid),

    #[error("Request is {status} and not ready to dispense")]
    RequestNotReady { status: RequestStatus },

    #[error("Cannot release {released}; only {requested} were requested")]
    QuantityExceedsRequest { requested: i64, released: i64 },

    #[error("Batch {0} was not found")]
    BatchNotFound(Uuid),

    #[error("Batch {batch_number} does not contain the requested medicine")]
    BatchMedicineMismatch { batch_number: String },

    #[error("Batch {batch_number} expired on {expiry_date}")]
    BatchExpired { batch_number: String, expiry_date: NaiveDate },

    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for DispenseError {
    fn from(err: rusqlite::Error) -> Self {
        DispenseError::Database(DatabaseError::Sqlite(err))
    }
}

impl DispenseError {
    /// Whether the refusal is a business rule (vs. a storage failure).
    pub fn is_rule_violation(&self) -> bool {
        !matches!(self, DispenseError::Database(_))
    }
}
