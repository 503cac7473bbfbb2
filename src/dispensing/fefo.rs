use serde::Serialize;
use uuid::Uuid;

use super::error::DispenseError;
use crate::models::MedicineBatch;

/// Quantity to take from one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FefoDraw {
    pub batch_id: Uuid,
    pub quantity: i64,
}

/// Split `quantity` across `batches` first-expiry-first-out.
///
/// `batches` must already be in FEFO order and contain only dispensable
/// lots; the plan drains each batch before touching the next.
pub fn plan_fefo(batches: &[MedicineBatch], quantity: i64) -> Result<Vec<FefoDraw>, DispenseError> {
    if quantity <= 0 {
        return Err(DispenseError::InvalidQuantity(quantity));
    }

    let available: i64 = batches.iter().map(|b| b.quantity_available.max(0)).sum();
    if available < quantity {
        return Err(DispenseError::InsufficientStock {
            available,
            requested: quantity,
        });
    }

    let mut remaining = quantity;
    let mut draws = Vec::new();
    for batch in batches {
        if remaining == 0 {
            break;
        }
        let take = batch.quantity_available.min(remaining);
        if take <= 0 {
            continue;
        }
        draws.push(FefoDraw {
            batch_id: batch.id,
            quantity: take,
        });
        remaining -= take;
    }
    Ok(draws)
}
