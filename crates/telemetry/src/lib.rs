//! Per-request route tracing for Strata.
//!
//! A [`TraceRecorder`] is started at request entry, shared by every stage
//! (including concurrently running layer fetches), and finalized into an
//! immutable [`TraceRecord`] once the response is ready. Finalized records
//! are emitted on the `strata::trace` tracing target and can be retained in
//! a bounded [`TraceLog`].

pub mod log;
pub mod model;
pub mod recorder;

pub use log::{LoggedTrace, TraceLog, TraceStats};
pub use model::{TraceRecord, stage};
pub use recorder::TraceRecorder;

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
