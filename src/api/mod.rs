//! Portal HTTP API.
//!
//! Exposes the request queue, dispensing, inventory, programs, duty and
//! announcements as JSON endpoints. Routes are nested under `/api/`;
//! every route except `/api/health` runs behind the middleware stack
//! Audit → Identify → Handler.
//!
//! `portal_router()` returns a `Router` that can be mounted on any axum
//! server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::portal_router;
pub use server::{start_server, PortalServer};
pub use types::ApiContext;
