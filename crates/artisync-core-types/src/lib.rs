//! Core types shared across Artisync facilities
//!
//! This crate provides foundational types used by the error facility,
//! the logging facility and the reconciliation engine:
//!
//! - **Correlation types**: PassId, PassContext, TriggerSource
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{PassContext, PassId, TriggerSource};
pub use sensitive::Sensitive;
