//! Collaborators the request sequence drives.
//!
//! The coordinator never talks to a platform API directly; these traits are
//! the whole of its view of the two credential providers, the selection UI
//! and the origin check.

mod errors;

use std::sync::Arc;

use async_trait::async_trait;

use crate::request::{
    AssertionDispatch, AssertionResponse, Candidate, CreateDispatch, CredentialSummary,
    RegistrationResponse, Selection, ValidationInfo,
};
use crate::status::AuthenticatorStatus;

pub use errors::{ProviderAError, ProviderBError};

/// The legacy FIDO2 API ("Provider A").
#[async_trait]
pub trait ProviderAClient: Send + Sync + 'static {
    /// List the credentials stored for `rp_id`, discoverable or not.
    async fn enumerate(&self, rp_id: &str) -> Result<Vec<CredentialSummary>, ProviderAError>;

    async fn get_assertion(
        &self,
        dispatch: AssertionDispatch,
    ) -> Result<AssertionResponse, ProviderAError>;

    async fn make_credential(
        &self,
        dispatch: CreateDispatch,
    ) -> Result<RegistrationResponse, ProviderAError>;

    async fn is_user_verifying_platform_authenticator_available(
        &self,
    ) -> Result<bool, ProviderAError>;
}

/// The platform Credential Manager ("Provider B").
#[async_trait]
pub trait ProviderBClient: Send + Sync + 'static {
    /// Prepare a get request ahead of the user's selection and report the
    /// credentials it can offer.
    async fn prefetch(
        &self,
        dispatch: AssertionDispatch,
    ) -> Result<Vec<CredentialSummary>, ProviderBError>;

    async fn get_assertion(
        &self,
        dispatch: AssertionDispatch,
    ) -> Result<AssertionResponse, ProviderBError>;

    async fn make_credential(
        &self,
        dispatch: CreateDispatch,
    ) -> Result<RegistrationResponse, ProviderBError>;

    /// Abandon the pending prefetch or selection.
    ///
    /// Calls already in flight must still complete, typically with an error.
    async fn cancel(&self);
}

/// The account selection UI.
#[async_trait]
pub trait DisambiguationUi: Send + Sync + 'static {
    async fn present_credentials(&self, candidates: Vec<Candidate>, conditional: bool)
    -> Selection;

    /// Tear down whatever UI is showing. A pending `present_credentials`
    /// call should then return.
    async fn cleanup(&self);
}

/// Security check that the caller origin may act for the RP ID.
#[async_trait]
pub trait RpIdValidator: Send + Sync + 'static {
    async fn validate(
        &self,
        rp_id: &str,
        origin: &str,
    ) -> Result<ValidationInfo, AuthenticatorStatus>;
}

/// Everything a [`RequestSequence`](crate::RequestSequence) needs to execute
/// coordinator commands.
#[derive(Clone)]
pub struct Collaborators {
    pub provider_a: Arc<dyn ProviderAClient>,
    pub provider_b: Arc<dyn ProviderBClient>,
    pub ui: Arc<dyn DisambiguationUi>,
    pub validator: Arc<dyn RpIdValidator>,
}
