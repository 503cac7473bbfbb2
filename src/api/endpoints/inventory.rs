//! Inventory endpoints.
//!
//! - `GET /api/inventory`: stock overview
//! - `GET /api/inventory/:medicine_id/batches`: FEFO batches with expiry state
//! - `POST /api/inventory/batches`: receive a batch (admin)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{local_now, ApiContext, BhwContext};
use crate::db;
use crate::inventory::{self, BatchView, NewBatch, StockSummary};
use crate::models::{Medicine, MedicineBatch};

#[derive(Serialize)]
pub struct InventoryResponse {
    pub medicines: Vec<StockSummary>,
    pub low_stock_count: usize,
}

#[derive(Serialize)]
pub struct BatchesResponse {
    pub medicine: Medicine,
    pub batches: Vec<BatchView>,
}

/// `GET /api/inventory`
pub async fn overview(
    State(ctx): State<ApiContext>,
    Extension(_bhw): Extension<BhwContext>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let medicines =
        inventory::stock_overview(&conn, local_now().date(), ctx.settings.expiry_warning_days)?;
    Ok(Json(InventoryResponse {
        low_stock_count: medicines.iter().filter(|m| m.is_low_stock).count(),
        medicines,
    }))
}

/// `GET /api/inventory/:medicine_id/batches`
pub async fn batches(
    State(ctx): State<ApiContext>,
    Extension(_bhw): Extension<BhwContext>,
    Path(medicine_id): Path<String>,
) -> Result<Json<BatchesResponse>, ApiError> {
    let id = parse_id(&medicine_id, "medicine")?;
    let conn = ctx.open_db()?;
    let medicine = db::get_medicine(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Medicine not found".into()))?;
    let batches = inventory::batches_for_medicine(
        &conn,
        &id,
        local_now().date(),
        ctx.settings.expiry_warning_days,
    )?;
    Ok(Json(BatchesResponse { medicine, batches }))
}

/// `POST /api/inventory/batches`
pub async fn receive(
    State(ctx): State<ApiContext>,
    Extension(bhw): Extension<BhwContext>,
    Json(form): Json<NewBatch>,
) -> Result<(StatusCode, Json<MedicineBatch>), ApiError> {
    bhw.require_admin()?;
    let conn = ctx.open_db()?;
    let batch = inventory::receive_batch(&conn, &bhw.user, &form, local_now())?;
    Ok((StatusCode::CREATED, Json(batch)))
}
