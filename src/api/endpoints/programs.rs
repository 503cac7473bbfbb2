//! Allocation program endpoints.
//!
//! - `GET /api/programs`: programs running today in the caller's area
//! - `GET /api/programs/:id/roster`: seniors with current-period claim status
//! - `POST /api/programs/:id/claims`: record a claim

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parse_id;
use crate::allocation::{self, ClaimOutcome, ProgramRoster, ProgramSummary};
use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};

#[derive(Serialize)]
pub struct ProgramsResponse {
    pub programs: Vec<ProgramSummary>,
}

#[derive(Deserialize)]
pub struct ClaimBody {
    pub resident_id: Uuid,
}

/// `GET /api/programs`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
) -> Result<Json<ProgramsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let scope = bhw.user.list_scope();
    let programs = allocation::active_programs(&conn, scope.as_ref(), local_now().date())?;
    Ok(Json(ProgramsResponse { programs }))
}

/// `GET /api/programs/:id/roster`
pub async fn roster(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Path(program_id): Path<String>,
) -> Result<Json<ProgramRoster>, ApiError> {
    let id = parse_id(&program_id, "program")?;
    let conn = ctx.open_db()?;
    let scope = bhw.user.list_scope();
    let roster = allocation::program_roster(&conn, &id, scope.as_ref(), local_now().date())?;
    Ok(Json(roster))
}

/// `POST /api/programs/:id/claims`
pub async fn claim(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Path(program_id): Path<String>,
    Json(body): Json<ClaimBody>,
) -> Result<(StatusCode, Json<ClaimOutcome>), ApiError> {
    let id = parse_id(&program_id, "program")?;
    let conn = ctx.open_db()?;
    let outcome =
        allocation::record_claim(&conn, &id, &body.resident_id, &bhw.user.id, local_now())?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
