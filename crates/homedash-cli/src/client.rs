//! Error type and the one-shot requestor round trip used by `get`.

use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::anyhow;
use homedash_dispatch::{Completion, ConfigError, DispatchConfig, HttpTransport, Outcome, Requestor};
use tracing::debug;

pub(crate) const ON_SUCCESS: &str = "cli.success";
pub(crate) const ON_ERROR: &str = "cli.error";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ClientBuild { .. } => Self::failure(err),
            other => Self::validation(other.to_string()),
        }
    }
}

/// Spawn a dispatcher, issue one request through a requestor, and wait for
/// its terminal outcome.
pub(crate) async fn dispatch_once(
    config: &DispatchConfig,
    base_target: &str,
    parameters: &[String],
) -> CliResult<Outcome> {
    let transport = HttpTransport::from_config(config)?;
    let mut requestor = Requestor::connect(Arc::new(transport), config);

    let settled: Rc<RefCell<Option<Outcome>>> = Rc::default();
    for id in [ON_SUCCESS, ON_ERROR] {
        let slot = Rc::clone(&settled);
        requestor.register(id, move |completion: Completion| {
            *slot.borrow_mut() = Some(completion.outcome);
        });
    }

    let request_id = requestor
        .request(
            base_target,
            parameters.iter().map(String::as_str),
            ON_SUCCESS,
            ON_ERROR,
        )
        .await
        .map_err(CliError::failure)?;
    debug!(request_id = %request_id, "awaiting outcome");

    for delivery in requestor.drain().await {
        delivery.map_err(CliError::failure)?;
    }

    let outcome = settled.borrow_mut().take();
    outcome.ok_or_else(|| {
        CliError::failure(anyhow!("dispatcher stopped before reporting an outcome"))
    })
}
