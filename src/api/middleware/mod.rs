//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Audit logger: logs every call, including rejected ones
//! 2. Identify: resolves `X-Bhw-Id` to an active user

pub mod audit;
pub mod identify;
