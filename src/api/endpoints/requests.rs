//! Medicine request endpoints.
//!
//! - `GET /api/requests`: queue with `status` / `ready` filters
//! - `POST /api/requests`: submit
//! - `GET /api/requests/:id`: detail with FEFO candidates and history
//! - `POST /api/requests/:id/{approve,reject,ready}`: lifecycle

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};
use crate::models::enums::RequestStatus;
use crate::models::MedicineRequest;
use crate::requests::{self, NewRequest, RequestDetail, RequestFilter, RequestListItem};

#[derive(Deserialize)]
pub struct RequestListQuery {
    pub status: Option<RequestStatus>,
    pub ready: Option<bool>,
}

#[derive(Serialize)]
pub struct RequestListResponse {
    pub requests: Vec<RequestListItem>,
    pub total: usize,
}

#[derive(Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

/// `GET /api/requests`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let filter = RequestFilter {
        status: query.status,
        ready_only: query.ready.unwrap_or(false),
    };
    let scope = bhw.user.list_scope();
    let requests = requests::list_requests(&conn, scope.as_ref(), &filter)?;

    Ok(Json(RequestListResponse {
        total: requests.len(),
        requests,
    }))
}

/// `POST /api/requests`
pub async fn submit(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Json(form): Json<NewRequest>,
) -> Result<(StatusCode, Json<MedicineRequest>), ApiError> {
    let conn = ctx.open_db()?;
    let request = requests::submit_request(&conn, &bhw.user, &form, local_now())?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /api/requests/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Path(request_id): Path<String>,
) -> Result<Json<RequestDetail>, ApiError> {
    let id = parse_id(&request_id, "request")?;
    let conn = ctx.open_db()?;
    let detail = requests::get_request_detail(&conn, &bhw.user, &id, local_now().date())?;
    Ok(Json(detail))
}

/// `POST /api/requests/:id/approve`
pub async fn approve(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Path(request_id): Path<String>,
) -> Result<Json<MedicineRequest>, ApiError> {
    let id = parse_id(&request_id, "request")?;
    let conn = ctx.open_db()?;
    Ok(Json(requests::approve_request(&conn, &bhw.user, &id, local_now())?))
}

/// `POST /api/requests/:id/reject`
pub async fn reject(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Path(request_id): Path<String>,
    Json(body): Json<RejectBody>,
) -> Result<Json<MedicineRequest>, ApiError> {
    let id = parse_id(&request_id, "request")?;
    let conn = ctx.open_db()?;
    Ok(Json(requests::reject_request(
        &conn,
        &bhw.user,
        &id,
        &body.reason,
        local_now(),
    )?))
}

/// `POST /api/requests/:id/ready`
pub async fn ready(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Path(request_id): Path<String>,
) -> Result<Json<MedicineRequest>, ApiError> {
    let id = parse_id(&request_id, "request")?;
    let conn = ctx.open_db()?;
    Ok(Json(requests::mark_ready(&conn, &bhw.user, &id)?))
}
