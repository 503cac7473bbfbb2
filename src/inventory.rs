//! Stock overview: per-medicine totals, low-stock flags and
//! expiry-annotated batch lists.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MAX_WINDOW_DAYS;
use crate::db::{self, DatabaseError};
use crate::error::WorkflowError;
use crate::models::enums::ExpiryState;
use crate::models::{MedicineBatch, User};

#[derive(Debug, Clone, Serialize)]
pub struct StockSummary {
    pub medicine_id: Uuid,
    pub name: String,
    pub strength: Option<String>,
    pub unit: String,
    pub total_available: i64,
    pub reorder_level: i64,
    pub is_low_stock: bool,
    pub nearest_expiry: Option<NaiveDate>,
    /// Units in batches that expire within the warning window.
    pub expiring_soon: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: MedicineBatch,
    pub expiry_state: ExpiryState,
    pub days_to_expiry: i64,
}

/// Stock-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub medicine_id: Uuid,
    pub batch_number: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
}

/// Every active medicine with its unexpired stock.
pub fn stock_overview(
    conn: &Connection,
    today: NaiveDate,
    warning_days: i64,
) -> Result<Vec<StockSummary>, DatabaseError> {
    let medicines = db::list_active_medicines(conn)?;
    let mut summaries = Vec::with_capacity(medicines.len());
    for medicine in medicines {
        let batches = db::get_dispensable_batches(conn, &medicine.id, today)?;
        let total_available: i64 = batches.iter().map(|b| b.quantity_available).sum();
        let expiring_soon: i64 = batches
            .iter()
            .filter(|b| b.expiry_state(today, warning_days) == ExpiryState::ExpiringSoon)
            .map(|b| b.quantity_available)
            .sum();
        summaries.push(StockSummary {
            medicine_id: medicine.id,
            is_low_stock: total_available < medicine.reorder_level,
            nearest_expiry: batches.first().map(|b| b.expiry_date),
            name: medicine.name,
            strength: medicine.strength,
            unit: medicine.unit,
            total_available,
            reorder_level: medicine.reorder_level,
            expiring_soon,
        });
    }
    Ok(summaries)
}

/// Medicines whose unexpired stock is below their reorder level.
pub fn low_stock(
    conn: &Connection,
    today: NaiveDate,
    warning_days: i64,
) -> Result<Vec<StockSummary>, DatabaseError> {
    Ok(stock_overview(conn, today, warning_days)?
        .into_iter()
        .filter(|s| s.is_low_stock)
        .collect())
}

/// All batches of a medicine (expired included) in FEFO order.
pub fn batches_for_medicine(
    conn: &Connection,
    medicine_id: &Uuid,
    today: NaiveDate,
    warning_days: i64,
) -> Result<Vec<BatchView>, DatabaseError> {
    Ok(db::get_batches_for_medicine(conn, medicine_id)?
        .into_iter()
        .map(|batch| annotate(batch, today, warning_days))
        .collect())
}

/// Non-empty batches that expire within `warning_days` of `today`.
pub fn expiring_batches(
    conn: &Connection,
    today: NaiveDate,
    warning_days: i64,
) -> Result<Vec<BatchView>, DatabaseError> {
    let until = today + chrono::Duration::days(warning_days.clamp(0, MAX_WINDOW_DAYS));
    Ok(db::get_batches_expiring_between(conn, today, until)?
        .into_iter()
        .map(|batch| annotate(batch, today, warning_days))
        .collect())
}

pub fn receive_batch(
    conn: &Connection,
    actor: &User,
    form: &NewBatch,
    now: NaiveDateTime,
) -> Result<MedicineBatch, WorkflowError> {
    if !actor.is_admin() {
        return Err(WorkflowError::Forbidden("Only administrators can receive stock"));
    }
    if form.quantity <= 0 {
        return Err(WorkflowError::Validation("Quantity must be greater than zero".into()));
    }
    if form.batch_number.trim().is_empty() {
        return Err(WorkflowError::Validation("Batch number is required".into()));
    }
    if form.expiry_date < now.date() {
        return Err(WorkflowError::Validation("Cannot receive an already expired batch".into()));
    }
    db::get_medicine(conn, &form.medicine_id)?
        .ok_or_else(|| WorkflowError::not_found("Medicine", form.medicine_id))?;

    let batch = MedicineBatch {
        id: Uuid::new_v4(),
        medicine_id: form.medicine_id,
        batch_number: form.batch_number.trim().to_string(),
        quantity_received: form.quantity,
        quantity_available: form.quantity,
        expiry_date: form.expiry_date,
        received_at: now,
    };
    db::insert_batch(conn, &batch)?;
    tracing::info!(
        batch_id = %batch.id,
        medicine_id = %batch.medicine_id,
        quantity = batch.quantity_received,
        "Batch received"
    );
    Ok(batch)
}

fn annotate(batch: MedicineBatch, today: NaiveDate, warning_days: i64) -> BatchView {
    BatchView {
        expiry_state: batch.expiry_state(today, warning_days),
        days_to_expiry: (batch.expiry_date - today).num_days(),
        batch,
    }
}
