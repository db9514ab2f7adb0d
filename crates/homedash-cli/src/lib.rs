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
#![allow(clippy::redundant_pub_crate, clippy::future_not_send)]

//! Command-line client that dispatches a single dashboard request.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `client.rs`: error type and the one-shot requestor round trip
//! - `output.rs`: renderers for outcomes and resolved targets
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod output;

pub use cli::run;
