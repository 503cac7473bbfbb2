use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::error::DispenseError;
use super::fefo::plan_fefo;
use crate::db;
use crate::models::MedicineBatch;

/// Stock actually removed from one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
}

/// Remove `quantity` units of `medicine_id` from stock.
///
/// With `batch_id` the whole quantity must come from that batch; without it
/// the quantity is planned FEFO across dispensable batches. Must run inside a
/// transaction: a failed guarded decrement returns an error and leaves earlier
/// decrements for the caller to roll back.
pub fn draw_stock(
    conn: &Connection,
    medicine_id: &Uuid,
    batch_id: Option<Uuid>,
    quantity: i64,
    today: NaiveDate,
) -> Result<Vec<BatchDraw>, DispenseError> {
    if quantity <= 0 {
        return Err(DispenseError::InvalidQuantity(quantity));
    }

    let planned: Vec<(MedicineBatch, i64)> = match batch_id {
        Some(id) => {
            let batch = db::get_batch(conn, &id)?.ok_or(DispenseError::BatchNotFound(id))?;
            check_batch(&batch, medicine_id, quantity, today)?;
            vec![(batch, quantity)]
        }
        None => {
            let batches = db::get_dispensable_batches(conn, medicine_id, today)?;
            let plan = plan_fefo(&batches, quantity)?;
            plan.into_iter()
                .filter_map(|draw| {
                    batches
                        .iter()
                        .find(|b| b.id == draw.batch_id)
                        .map(|b| (b.clone(), draw.quantity))
                })
                .collect()
        }
    };

    take_planned(conn, planned)
}

/// Apply planned draws with guarded decrements, stopping at the first batch
/// that no longer holds its planned quantity.
fn take_planned(
    conn: &Connection,
    planned: Vec<(MedicineBatch, i64)>,
) -> Result<Vec<BatchDraw>, DispenseError> {
    let mut draws = Vec::with_capacity(planned.len());
    for (batch, take) in planned {
        if !db::decrement_batch(conn, &batch.id, take)? {
            // Another writer drained the batch between read and update.
            let current = db::get_batch(conn, &batch.id)?
                .map(|b| b.quantity_available)
                .unwrap_or(0);
            return Err(DispenseError::InsufficientStock {
                available: current,
                requested: take,
            });
        }
        draws.push(BatchDraw {
            batch_id: batch.id,
            batch_number: batch.batch_number,
            expiry_date: batch.expiry_date,
            quantity: take,
        });
    }
    Ok(draws)
}

fn check_batch(
    batch: &MedicineBatch,
    medicine_id: &Uuid,
    quantity: i64,
    today: NaiveDate,
) -> Result<(), DispenseError> {
    if batch.medicine_id != *medicine_id {
        return Err(DispenseError::BatchMedicineMismatch {
            batch_number: batch.batch_number.clone(),
        });
    }
    if batch.is_expired_on(today) {
        return Err(DispenseError::BatchExpired {
            batch_number: batch.batch_number.clone(),
            expiry_date: batch.expiry_date,
        });
    }
    if batch.quantity_available < quantity {
        return Err(DispenseError::InsufficientStock {
            available: batch.quantity_available,
            requested: quantity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn explicit_batch_is_decremented() {
        let conn = open_memory_database().unwrap();
        let med = make_medicine(&conn, "Amlodipine", 0);
        let batch = make_batch(&conn, med.id, "B1", 20, date(2027, 1, 1));

        let draws = draw_stock(&conn, &med.id, Some(batch.id), 8, date(2026, 10, 19)).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].quantity, 8);
        assert_eq!(db::get_batch(&conn, &batch.id).unwrap().unwrap().quantity_available, 12);
    }

    #[test]
    fn explicit_batch_short_of_stock_is_refused() {
        let conn = open_memory_database().unwrap();
        let med = make_medicine(&conn, "Amlodipine", 0);
        let batch = make_batch(&conn, med.id, "B1", 5, date(2027, 1, 1));
        make_batch(&conn, med.id, "B2", 50, date(2027, 6, 1));

        let err = draw_stock(&conn, &med.id, Some(batch.id), 8, date(2026, 10, 19)).unwrap_err();
        assert!(matches!(
            err,
            DispenseError::InsufficientStock { available: 5, requested: 8 }
        ));
        assert_eq!(db::get_batch(&conn, &batch.id).unwrap().unwrap().quantity_available, 5);
    }

    #[test]
    fn batch_drained_after_planning_is_not_overdrawn() {
        let conn = open_memory_database().unwrap();
        let med = make_medicine(&conn, "Amlodipine", 0);
        let first = make_batch(&conn, med.id, "FIRST", 20, date(2027, 1, 1));
        let stale = db::get_batch(&conn, &first.id).unwrap().unwrap();
        let second = make_batch(&conn, med.id, "SECOND", 20, date(2027, 6, 1));
        let stale_second = db::get_batch(&conn, &second.id).unwrap().unwrap();

        // Another writer takes most of FIRST after the plan was read.
        assert!(db::decrement_batch(&conn, &first.id, 15).unwrap());

        let err = take_planned(&conn, vec![(stale_second, 4), (stale, 10)]).unwrap_err();
        assert!(matches!(
            err,
            DispenseError::InsufficientStock { available: 5, requested: 10 }
        ));
        assert_eq!(db::get_batch(&conn, &first.id).unwrap().unwrap().quantity_available, 5);
        // Earlier draws are left for the caller's transaction to roll back.
        assert_eq!(db::get_batch(&conn, &second.id).unwrap().unwrap().quantity_available, 16);
    }

    #[test]
    fn explicit_batch_of_other_medicine_refused() {
        let conn = open_memory_database().unwrap();
        let med = make_medicine(&conn, "Amlodipine", 0);
        let other = make_medicine(&conn, "Metformin", 0);
        let batch = make_batch(&conn, other.id, "M1", 20, date(2027, 1, 1));

        let err = draw_stock(&conn, &med.id, Some(batch.id), 1, date(2026, 10, 19)).unwrap_err();
        assert!(matches!(err, DispenseError::BatchMedicineMismatch { .. }));
    }

    #[test]
    fn explicit_expired_batch_refused() {
        let conn = open_memory_database().unwrap();
        let med = make_medicine(&conn, "Amlodipine", 0);
        let batch = make_batch(&conn, med.id, "OLD", 20, date(2026, 10, 18));

        let err = draw_stock(&conn, &med.id, Some(batch.id), 1, date(2026, 10, 19)).unwrap_err();
        assert!(matches!(err, DispenseError::BatchExpired { .. }));
    }

    #[test]
    fn fefo_spans_batches_and_skips_expired() {
        let conn = open_memory_database().unwrap();
        let med = make_medicine(&conn, "Amlodipine", 0);
        let expired = make_batch(&conn, med.id, "OLD", 50, date(2026, 9, 1));
        let first = make_batch(&conn, med.id, "FIRST", 5, date(2026, 11, 1));
        let second = make_batch(&conn, med.id, "SECOND", 20, date(2027, 3, 1));

        let draws = draw_stock(&conn, &med.id, None, 12, date(2026, 10, 19)).unwrap();
        let taken: Vec<(String, i64)> = draws
            .iter()
            .map(|d| (d.batch_number.clone(), d.quantity))
            .collect();
        assert_eq!(taken, vec![("FIRST".to_string(), 5), ("SECOND".to_string(), 7)]);

        assert_eq!(db::get_batch(&conn, &expired.id).unwrap().unwrap().quantity_available, 50);
        assert_eq!(db::get_batch(&conn, &first.id).unwrap().unwrap().quantity_available, 0);
        assert_eq!(db::get_batch(&conn, &second.id).unwrap().unwrap().quantity_available, 13);
    }
}
