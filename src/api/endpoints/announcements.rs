//! Announcement endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::announcements::{self, NewAnnouncement};
use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};
use crate::models::enums::Audience;
use crate::models::Announcement;

const MAX_LIMIT: u32 = 50;

#[derive(Deserialize)]
pub struct AnnouncementQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct AnnouncementsResponse {
    pub announcements: Vec<Announcement>,
}

/// `GET /api/announcements`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(_bhw): Extension<BhwContext>,
    Query(query): Query<AnnouncementQuery>,
) -> Result<Json<AnnouncementsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let limit = query
        .limit
        .unwrap_or(ctx.settings.announcement_limit)
        .clamp(1, MAX_LIMIT);
    let announcements =
        announcements::active_announcements(&conn, Audience::Bhw, local_now(), limit)?;
    Ok(Json(AnnouncementsResponse { announcements }))
}

/// `POST /api/announcements` (admin)
pub async fn publish(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Json(form): Json<NewAnnouncement>,
) -> Result<(StatusCode, Json<Announcement>), ApiError> {
    bhw.require_admin()?;
    let conn = ctx.open_db()?;
    let announcement = announcements::publish_announcement(&conn, &bhw.user, &form, local_now())?;
    Ok((StatusCode::CREATED, Json(announcement)))
}
