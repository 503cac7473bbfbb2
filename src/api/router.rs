//! Portal API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Audit logger → 2. Identify (all routes but `/api/health`)

use std::path::PathBuf;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::DashboardSettings;

/// Build the portal API router over the database at `db_path`.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn portal_router(db_path: PathBuf, settings: DashboardSettings) -> Router {
    build_router(ApiContext::new(db_path, settings))
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Audit → Identify (innermost) → Handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let identified = Router::new()
        .route("/dashboard", get(endpoints::dashboard::show))
        .route(
            "/requests",
            get(endpoints::requests::list).post(endpoints::requests::submit),
        )
        .route("/requests/:id", get(endpoints::requests::detail))
        .route("/requests/:id/approve", post(endpoints::requests::approve))
        .route("/requests/:id/reject", post(endpoints::requests::reject))
        .route("/requests/:id/ready", post(endpoints::requests::ready))
        .route("/dispense", post(endpoints::dispense::dispense))
        .route("/inventory", get(endpoints::inventory::overview))
        .route("/inventory/batches", post(endpoints::inventory::receive))
        .route(
            "/inventory/:medicine_id/batches",
            get(endpoints::inventory::batches),
        )
        .route("/programs", get(endpoints::programs::list))
        .route("/programs/:id/roster", get(endpoints::programs::roster))
        .route("/programs/:id/claims", post(endpoints::programs::claim))
        .route(
            "/duty",
            get(endpoints::duty::upcoming).post(endpoints::duty::assign),
        )
        .route(
            "/announcements",
            get(endpoints::announcements::list).post(endpoints::announcements::publish),
        )
        .route("/residents", get(endpoints::residents::list))
        .route("/residents/:id", get(endpoints::residents::detail))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::identify::require_user))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx.clone()));

    let open = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new().nest("/api", identified).nest("/api", open)
}
