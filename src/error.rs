//! Errors for request, duty, program and announcement workflows.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::enums::RequestStatus;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Cannot move a {from} request to {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },

    #[error("Only approved requests can be marked ready (request is {0})")]
    NotApproved(RequestStatus),

    #[error("{0} is outside your assigned area")]
    OutOfScope(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl WorkflowError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        WorkflowError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
