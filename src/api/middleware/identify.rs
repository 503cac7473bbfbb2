//! Acting-user identification middleware.
//!
//! Reads `X-Bhw-Id`, loads the user, and injects `BhwContext` into request
//! extensions for downstream handlers. This identifies the caller; it does
//! not authenticate them.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, BhwContext, BHW_ID_HEADER};
use crate::db;

/// Require a known, active user.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_user(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_user_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_user_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let user_id = req
        .headers()
        .get(BHW_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or(ApiError::Unauthorized)?;

    // Connection dropped before the handler runs.
    let user = {
        let conn = ctx.open_db()?;
        db::get_user(&conn, &user_id)?
    };
    let user = user.filter(|u| u.is_active).ok_or_else(|| {
        tracing::debug!(%user_id, "Rejected unknown or inactive user");
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(BhwContext { user });
    Ok(next.run(req).await)
}
