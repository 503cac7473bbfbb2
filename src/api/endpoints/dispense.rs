//! Dispense endpoint.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};
use crate::db;
use crate::dispensing::{self, DispenseOutcome, DispenseRequest};

/// `POST /api/dispense`: release stock for a ready request.
///
/// The request must be inside the caller's area; duty, state and stock
/// checks happen inside the dispense transaction.
pub async fn dispense(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Json(form): Json<DispenseRequest>,
) -> Result<Json<DispenseOutcome>, ApiError> {
    let conn = ctx.open_db()?;

    let request = db::get_request(&conn, &form.request_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Request {} was not found", form.request_id)))?;
    if let Some(resident) = db::get_resident(&conn, &request.resident_id)? {
        if !bhw.user.can_access(&resident.barangay, resident.purok.as_deref()) {
            return Err(ApiError::Forbidden("Request is outside your assigned area".into()));
        }
    }

    let outcome = dispensing::dispense(&conn, &form, &bhw.user.id, local_now())?;
    Ok(Json(outcome))
}
