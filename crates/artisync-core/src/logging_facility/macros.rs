//! Logging macros for pass operations and artifact failures
//!
//! Every macro stamps `component`, `op` and `event`, so a pass can be
//! followed from its `start` to its `end`/`end_error` event by `pass_id`.
//! Callers must depend on `artisync-core-types` for the schema constants.

/// Log the start of a pass operation (`sync_pass`, `resolve`, `deplete`, ...)
///
/// # Example
///
/// ```
/// # use artisync_core::log_op_start;
/// log_op_start!("resolve", pass_id = "p-1", artifacts = 4);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = artisync_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = artisync_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of a pass operation
///
/// # Example
///
/// ```
/// # use artisync_core::log_op_end;
/// log_op_end!("deplete", duration_ms = 3, pass_id = "p-1", rounds = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = artisync_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = artisync_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a pass operation that ended in error, e.g. a cycle abort
///
/// `$err` must convert into `ExError`; its kind and code are logged.
///
/// # Example
///
/// ```
/// # use artisync_core::{log_op_error, errors::SyncError};
/// let err = SyncError::CyclicDependency { members: vec!["roles".into(), "access".into()] };
/// log_op_error!("sync_pass", err, duration_ms = 1, pass_id = "p-1");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = artisync_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            "{}",
            ex_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = artisync_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($field)*,
            "{}",
            ex_err,
        );
    }};
}

/// Log one artifact failing a lifecycle phase
///
/// Emitted at `warn`: the artifact is recorded as failed and the pass
/// continues. `$err` is a `&ExError`.
///
/// # Example
///
/// ```
/// # use artisync_core::log_artifact_failure;
/// # use artisync_core::errors::{ExError, ExErrorKind};
/// # use artisync_core::ArtifactPhase;
/// let err = ExError::new(ExErrorKind::ApplyFailed).with_message("grant refused");
/// log_artifact_failure!(ArtifactPhase::CreateUpdate, "/acl/roles.res", &err, pass_id = "p-1");
/// ```
#[macro_export]
macro_rules! log_artifact_failure {
    ($phase:expr, $location:expr, $err:expr) => {{
        let ex_err: &$crate::errors::ExError = $err;
        tracing::warn!(
            component = module_path!(),
            op = artisync_core_types::schema::OP_ARTIFACT,
            event = artisync_core_types::schema::EVENT_ARTIFACT_FAILED,
            location = %$location,
            phase = %$phase,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            "{}",
            ex_err,
        );
    }};
    ($phase:expr, $location:expr, $err:expr, $($field:tt)*) => {{
        let ex_err: &$crate::errors::ExError = $err;
        tracing::warn!(
            component = module_path!(),
            op = artisync_core_types::schema::OP_ARTIFACT,
            event = artisync_core_types::schema::EVENT_ARTIFACT_FAILED,
            location = %$location,
            phase = %$phase,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($field)*,
            "{}",
            ex_err,
        );
    }};
}
