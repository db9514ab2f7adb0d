#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives shared across the Homedash workspace.
//!
//! Logging is installed once per process through [`init_logging`]; request
//! scoped helpers in [`context`] let the dispatcher and its transports agree on
//! the correlation identifier of the call currently being served.

pub mod context;
pub mod error;
pub mod init;

pub use context::{current_request_id, request_span, with_request_context};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
