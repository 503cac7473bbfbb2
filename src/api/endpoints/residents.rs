//! Resident endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};
use crate::residents::{self, ResidentDetail, ResidentSummary};

#[derive(Serialize)]
pub struct ResidentsResponse {
    pub residents: Vec<ResidentSummary>,
    pub seniors: usize,
}

/// `GET /api/residents`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
) -> Result<Json<ResidentsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let scope = bhw.user.list_scope();
    let residents = residents::list_residents(&conn, scope.as_ref(), local_now().date())?;
    Ok(Json(ResidentsResponse {
        seniors: residents.iter().filter(|r| r.is_senior).count(),
        residents,
    }))
}

/// `GET /api/residents/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Path(resident_id): Path<String>,
) -> Result<Json<ResidentDetail>, ApiError> {
    let id = parse_id(&resident_id, "resident")?;
    let conn = ctx.open_db()?;
    Ok(Json(residents::get_resident(&conn, &bhw.user, &id, local_now().date())?))
}
