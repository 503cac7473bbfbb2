//! API endpoint handlers.
//!
//! Each module corresponds to a portal screen or action. Handlers reuse the
//! domain modules and open one SQLite connection per request.

pub mod announcements;
pub mod dashboard;
pub mod dispense;
pub mod duty;
pub mod health;
pub mod inventory;
pub mod programs;
pub mod requests;
pub mod residents;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path id, reporting which entity was malformed.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {entity} ID: {e}")))
}
