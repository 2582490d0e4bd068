use tokio::sync::oneshot;

use crate::barrier::Provenance;
use crate::status::AuthenticatorStatus;

use super::types::{AssertionResponse, RegistrationResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Assertion(AssertionResponse),
    Registration(RegistrationResponse),
}

/// The single terminal result of one `get()` or `create()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        provenance: Provenance,
        payload: Payload,
    },
    Cancel,
    Error(AuthenticatorStatus),
}

impl From<AuthenticatorStatus> for Outcome {
    /// `Abort` becomes [`Outcome::Cancel`]; every other status is an error.
    fn from(status: AuthenticatorStatus) -> Self {
        match status {
            AuthenticatorStatus::Abort => Self::Cancel,
            status => Self::Error(status),
        }
    }
}

impl Outcome {
    /// The status the page observes: `None` for success, `Abort` for a
    /// cancelled request.
    pub fn status(&self) -> Option<AuthenticatorStatus> {
        match self {
            Self::Success { .. } => None,
            Self::Cancel => Some(AuthenticatorStatus::Abort),
            Self::Error(status) => Some(*status),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn assertion(&self) -> Option<&AssertionResponse> {
        match self {
            Self::Success {
                payload: Payload::Assertion(response),
                ..
            } => Some(response),
            _ => None,
        }
    }

    pub fn registration(&self) -> Option<&RegistrationResponse> {
        match self {
            Self::Success {
                payload: Payload::Registration(response),
                ..
            } => Some(response),
            _ => None,
        }
    }
}

/// Single-use destination of a request's [`Outcome`].
///
/// [`OutcomeSink::deliver`] consumes the sink, so an outcome can be delivered
/// at most once. Dropping an undelivered sink abandons the request; the
/// receiving side then observes a closed channel.
#[derive(Debug)]
pub struct OutcomeSink {
    sender: oneshot::Sender<Outcome>,
}

impl OutcomeSink {
    pub fn channel() -> (Self, oneshot::Receiver<Outcome>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    pub fn deliver(self, outcome: Outcome) {
        if let Err(outcome) = self.sender.send(outcome) {
            tracing::debug!("Caller went away before outcome {:?} was delivered", outcome);
        }
    }
}
