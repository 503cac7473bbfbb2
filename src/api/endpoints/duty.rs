//! Duty schedule endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};
use crate::config::MAX_WINDOW_DAYS;
use crate::duty::{self, DutyAssignment};
use crate::models::DutySchedule;

#[derive(Deserialize)]
pub struct DutyQuery {
    pub days: Option<i64>,
}

#[derive(Serialize)]
pub struct DutyResponse {
    pub on_duty_today: bool,
    pub schedule: Vec<DutySchedule>,
}

/// `GET /api/duty`: the caller's own upcoming schedule.
pub async fn upcoming(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Query(query): Query<DutyQuery>,
) -> Result<Json<DutyResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let today = local_now().date();
    let days = query.days.unwrap_or(ctx.settings.upcoming_duty_days);
    if !(0..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 0 and {MAX_WINDOW_DAYS}"
        )));
    }

    Ok(Json(DutyResponse {
        on_duty_today: duty::is_on_duty(&conn, &bhw.user.id, today)?,
        schedule: duty::schedule_for(&conn, &bhw.user.id, today, days)?,
    }))
}

/// `POST /api/duty`: assign or replace a day's duty (admin).
pub async fn assign(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Json(form): Json<DutyAssignment>,
) -> Result<(StatusCode, Json<DutySchedule>), ApiError> {
    bhw.require_admin()?;
    let conn = ctx.open_db()?;
    let schedule = duty::assign_duty(&conn, &bhw.user, &form)?;
    Ok((StatusCode::CREATED, Json(schedule)))
}
