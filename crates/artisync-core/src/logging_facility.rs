//! Structured logging facility for artisync
//!
//! - Single initialization point via `init(profile)`
//! - Pass operation macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//!   and the per-artifact `log_artifact_failure!`
//! - Test capture mode for assertions on pass and artifact events
//!
//! # Usage
//!
//! ```rust
//! use artisync_core::logging_facility::{init, Profile};
//!
//! // Initialize once at process startup
//! init(Profile::Development);
//! ```
//!
//! # Logging Macros
//!
//! - `log_op_start!(op, ...)` - Log operation start
//! - `log_op_end!(op, duration_ms = ...)` - Log operation end
//! - `log_op_error!(op, err, duration_ms = ...)` - Log operation error
//! - `log_artifact_failure!(phase, location, &err, pass_id = ...)` - One artifact failed

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
