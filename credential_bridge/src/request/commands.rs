use crate::barrier::Party;
use crate::status::AuthenticatorStatus;

use super::types::{
    AssertionDispatch, AssertionResponse, Candidate, CreateDispatch, CredentialSummary,
    RegistrationResponse, Selection, ValidationInfo,
};

/// Effects requested by the [`Coordinator`](super::Coordinator).
///
/// Each command that starts asynchronous work is answered by exactly one
/// [`Event`] once that work completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check that the origin may act for the RP ID. Answered by
    /// [`Event::RpIdValidated`].
    ValidateRpId { rp_id: String, origin: String },
    /// List the FIDO2 API's credentials for the RP ID. Answered by
    /// [`Event::ProviderAEnumerated`].
    EnumerateProviderA { rp_id: String },
    /// Ask Credential Manager to prepare the request. Answered by
    /// [`Event::ProviderBPrefetched`].
    PrefetchProviderB { dispatch: AssertionDispatch },
    /// Abandon Credential Manager's pending prefetch or selection.
    CancelProviderB,
    /// Show the credential selection UI. Answered by
    /// [`Event::CredentialSelected`].
    PresentCredentials {
        candidates: Vec<Candidate>,
        conditional: bool,
    },
    /// Tear down the selection UI.
    CleanupUi,
    /// Answered by [`Event::AssertionCompleted`].
    GetAssertion {
        provider: Party,
        dispatch: AssertionDispatch,
    },
    /// Answered by [`Event::RegistrationCompleted`].
    MakeCredential {
        provider: Party,
        dispatch: CreateDispatch,
    },
}

/// Completions of asynchronous work, fed back into the coordinator on its
/// owning sequence. Provider failures are already translated to page status
/// codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RpIdValidated(Result<ValidationInfo, AuthenticatorStatus>),
    ProviderAEnumerated(Result<Vec<CredentialSummary>, AuthenticatorStatus>),
    ProviderBPrefetched(Result<Vec<CredentialSummary>, AuthenticatorStatus>),
    CredentialSelected(Selection),
    AssertionCompleted {
        provider: Party,
        result: Result<AssertionResponse, AuthenticatorStatus>,
    },
    RegistrationCompleted {
        provider: Party,
        result: Result<RegistrationResponse, AuthenticatorStatus>,
    },
}

impl Event {
    pub(super) fn name(&self) -> &'static str {
        match self {
            Self::RpIdValidated(_) => "RpIdValidated",
            Self::ProviderAEnumerated(_) => "ProviderAEnumerated",
            Self::ProviderBPrefetched(_) => "ProviderBPrefetched",
            Self::CredentialSelected(_) => "CredentialSelected",
            Self::AssertionCompleted { .. } => "AssertionCompleted",
            Self::RegistrationCompleted { .. } => "RegistrationCompleted",
        }
    }
}
