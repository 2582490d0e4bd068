use thiserror::Error;

use crate::barrier::BarrierError;

/// Internal errors of the request coordinator.
///
/// These never reach the page; page-visible failures travel as
/// [`crate::AuthenticatorStatus`] inside an [`super::Outcome`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Rendezvous protocol violation
    #[error("Barrier error: {0}")]
    Barrier(BarrierError),

    /// A request is already being processed by this coordinator
    #[error("Another request is outstanding")]
    Busy,

    /// The request sequence task has shut down
    #[error("Request sequence is closed")]
    SequenceClosed,

    /// The request was dropped without an outcome being delivered
    #[error("Request abandoned before an outcome was delivered")]
    Abandoned,

    /// Invalid state error
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl CoordinatorError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::Barrier(err) => tracing::error!("Barrier error: {}", err),
            Self::Busy => tracing::error!("Another request is outstanding"),
            Self::SequenceClosed => tracing::error!("Request sequence is closed"),
            Self::Abandoned => tracing::error!("Request abandoned before an outcome was delivered"),
            Self::InvalidState(message) => tracing::error!("Invalid state: {}", message),
        }
        self
    }
}

impl From<BarrierError> for CoordinatorError {
    fn from(err: BarrierError) -> Self {
        let error = Self::Barrier(err);
        tracing::error!("{}", error);
        error
    }
}
