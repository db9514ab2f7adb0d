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
#![allow(clippy::redundant_pub_crate)]

//! Background REST dispatcher for the Homedash dashboard.
//!
//! The UI side ([`Requestor`]) builds a [`RequestDescriptor`], hands it to the
//! background [`Dispatcher`] over a channel, and later receives exactly one
//! [`OutcomeMessage`] naming the continuation to run. Closures never cross the
//! channel: only [`ContinuationId`] tokens do, and the requestor resolves them
//! against its own lookup table.
//!
//! Layout:
//! - `descriptor.rs`: request descriptors, parameters, and target resolution
//! - `outcome.rs`: terminal success/failure messages
//! - `dispatcher.rs`: the background worker and its handle
//! - `requestor.rs`: continuation registry and outcome correlation
//! - `transport.rs`: injected HTTP capability and the `reqwest` adapter
//! - `config.rs`: dispatcher configuration and validation
//! - `error.rs`: dispatch and requestor error types

pub mod config;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod requestor;
pub mod transport;

pub use config::{ConfigError, DispatchConfig};
pub use descriptor::{ContinuationId, Parameter, RequestDescriptor, RequestId, ResolvedTarget};
pub use dispatcher::{Dispatcher, DispatcherHandle, spawn};
pub use error::{DispatchError, RequestorError};
pub use outcome::{Outcome, OutcomeMessage};
pub use requestor::{Completion, Continuation, Delivery, Requestor};
pub use transport::{HttpTransport, Transport};
