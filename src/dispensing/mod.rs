//! Medicine dispensing: FEFO batch selection and the guarded
//! dispense transaction.
//!
//! Stock only ever leaves a batch through `stock::draw_stock`, which runs
//! inside a caller-owned `BEGIN IMMEDIATE` transaction and decrements with
//! a `quantity_available >= ?` guard. Request dispensing and program claims
//! both go through it.

pub mod dispense;
pub mod error;
pub mod fefo;
pub mod stock;

pub use dispense::{dispense, dispensing_history, fefo_batches, DispenseOutcome, DispenseRequest};
pub use error::DispenseError;
pub use fefo::{plan_fefo, FefoDraw};
pub use stock::{draw_stock, BatchDraw};
