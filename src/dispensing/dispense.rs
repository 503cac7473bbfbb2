use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DispenseError;
use super::stock::{draw_stock, BatchDraw};
use crate::db::{self, DatabaseError};
use crate::models::enums::RequestStatus;
use crate::models::{MedicineBatch, RequestDispensing, RequestFulfillment};

/// Dispense form: which request, optionally which batch, how much.
#[derive(Debug, Clone, Deserialize)]
pub struct DispenseRequest {
    pub request_id: Uuid,
    #[serde(default)]
    pub batch_id: Option<Uuid>,
    pub quantity_released: i64,
    #[serde(default)]
    pub dispensing_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispenseOutcome {
    pub request_id: Uuid,
    pub status: RequestStatus,
    pub quantity_released: i64,
    pub draws: Vec<BatchDraw>,
    pub message: String,
}

/// Dispensable batches for a medicine, earliest expiry first.
pub fn fefo_batches(
    conn: &Connection,
    medicine_id: &Uuid,
    today: NaiveDate,
) -> Result<Vec<MedicineBatch>, DatabaseError> {
    db::get_dispensable_batches(conn, medicine_id, today)
}

/// Dispensing log for one request.
pub fn dispensing_history(
    conn: &Connection,
    request_id: &Uuid,
) -> Result<Vec<RequestDispensing>, DatabaseError> {
    db::get_dispensings_for_request(conn, request_id)
}

/// Release stock for an approved, ready request.
///
/// Runs as one `BEGIN IMMEDIATE` transaction: the duty gate, request state,
/// and batch stock are all re-read under the write lock, then the batch is
/// decremented, fulfillment and dispensing rows are appended, and the request
/// is flipped to `dispensed`. Any failure rolls back every statement.
pub fn dispense(
    conn: &Connection,
    form: &DispenseRequest,
    bhw_id: &Uuid,
    now: NaiveDateTime,
) -> Result<DispenseOutcome, DispenseError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    match dispense_in_tx(&tx, form, bhw_id, now) {
        Ok(outcome) => {
            tx.commit()?;
            tracing::info!(
                request_id = %form.request_id,
                bhw_id = %bhw_id,
                quantity = outcome.quantity_released,
                batches = outcome.draws.len(),
                "Medicine dispensed"
            );
            Ok(outcome)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(error = %rollback_err, "Dispense rollback failed");
            }
            tracing::warn!(
                request_id = %form.request_id,
                bhw_id = %bhw_id,
                error = %err,
                "Dispense rolled back"
            );
            Err(err)
        }
    }
}

fn dispense_in_tx(
    conn: &Connection,
    form: &DispenseRequest,
    bhw_id: &Uuid,
    now: NaiveDateTime,
) -> Result<DispenseOutcome, DispenseError> {
    let today = now.date();

    if !db::has_active_duty(conn, bhw_id, today)? {
        return Err(DispenseError::NotOnDuty);
    }
    if form.quantity_released <= 0 {
        return Err(DispenseError::InvalidQuantity(form.quantity_released));
    }

    let request = db::get_request(conn, &form.request_id)?
        .ok_or(DispenseError::RequestNotFound(form.request_id))?;
    if !request.is_dispensable() {
        return Err(DispenseError::RequestNotReady { status: request.status });
    }
    if form.quantity_released > request.quantity_requested {
        return Err(DispenseError::QuantityExceedsRequest {
            requested: request.quantity_requested,
            released: form.quantity_released,
        });
    }

    let draws = draw_stock(
        conn,
        &request.medicine_id,
        form.batch_id,
        form.quantity_released,
        today,
    )?;

    let notes = form
        .dispensing_notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);

    for draw in &draws {
        db::insert_fulfillment(
            conn,
            &RequestFulfillment {
                id: Uuid::new_v4(),
                request_id: request.id,
                batch_id: draw.batch_id,
                quantity: draw.quantity,
                created_at: now,
            },
        )?;
        db::insert_dispensing(
            conn,
            &RequestDispensing {
                id: Uuid::new_v4(),
                request_id: request.id,
                batch_id: draw.batch_id,
                bhw_id: *bhw_id,
                quantity_released: draw.quantity,
                dispensing_notes: notes.clone(),
                dispensed_at: now,
            },
        )?;
    }

    if !db::mark_request_dispensed(conn, &request.id, bhw_id, now)? {
        return Err(DispenseError::RequestNotReady { status: request.status });
    }

    let (medicine_name, unit) = db::get_medicine(conn, &request.medicine_id)?
        .map(|m| (m.name, m.unit))
        .unwrap_or_else(|| ("medicine".into(), "units".into()));
    let resident_name = db::get_resident(conn, &request.resident_id)?
        .map(|r| r.full_name())
        .unwrap_or_else(|| "resident".into());

    Ok(DispenseOutcome {
        request_id: request.id,
        status: RequestStatus::Dispensed,
        quantity_released: form.quantity_released,
        draws,
        message: format!(
            "Released {} {unit} of {medicine_name} to {resident_name}",
            form.quantity_released
        ),
    })
}
