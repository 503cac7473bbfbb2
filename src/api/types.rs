//! Shared types for the API layer.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::config::DashboardSettings;
use crate::db;
use crate::models::User;

/// Header carrying the acting user's id.
pub const BHW_ID_HEADER: &str = "X-Bhw-Id";

// ═══════════════════════════════════════════════════════════
// API context: shared state for the portal router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
    pub settings: DashboardSettings,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, settings: DashboardSettings) -> Self {
        Self {
            db_path: Arc::new(db_path),
            settings,
        }
    }

    /// One connection per request; SQLite serializes writers.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_connection(&self.db_path).map_err(ApiError::from)
    }
}

// ═══════════════════════════════════════════════════════════
// BHW context: injected by identify middleware
// ═══════════════════════════════════════════════════════════

/// The acting user, resolved from `X-Bhw-Id` and injected into request
/// extensions for downstream handlers.
#[derive(Debug, Clone)]
pub struct BhwContext {
    pub user: User,
}

impl BhwContext {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Administrator access required".into()))
        }
    }
}

/// Local wall-clock time, truncated to whole seconds to match storage.
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
