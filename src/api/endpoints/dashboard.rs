//! Dashboard endpoint.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};
use crate::dashboard::{self, Dashboard};

/// `GET /api/dashboard`: every landing-page panel in one fetch.
pub async fn show(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
) -> Result<Json<Dashboard>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(dashboard::bhw_dashboard(
        &conn,
        &bhw.user,
        local_now(),
        &ctx.settings,
    )))
}
