//! In-memory stand-ins for the platform services a real embedder would
//! wire up: both credential providers, the account picker and the RP ID
//! check.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use credential_bridge::{
    AssertionDispatch, AssertionResponse, AuthenticatorStatus, Candidate, CreateDispatch,
    CredentialId, CredentialSummary, DisambiguationUi, ProviderAClient, ProviderAError,
    ProviderBClient, ProviderBError, RegistrationResponse, RpIdValidator, Selection,
    ValidationInfo,
};

const PROVIDER_LATENCY: Duration = Duration::from_millis(50);

fn assertion(dispatch: &AssertionDispatch) -> AssertionResponse {
    let credential_id = dispatch
        .request
        .allow_credentials
        .first()
        .cloned()
        .unwrap_or_default();
    AssertionResponse {
        credential_id,
        authenticator_data: vec![0u8; 37],
        signature: vec![0x30, 0x44],
        user_handle: None,
        client_data_json: Vec::new(),
        echo_appid_extension: false,
    }
}

fn registration(id: u8) -> RegistrationResponse {
    RegistrationResponse {
        credential_id: CredentialId::new(vec![id; 16]),
        attestation_object: vec![0xa3],
        client_data_json: Vec::new(),
        echo_cred_props: false,
    }
}

pub struct LocalFido2 {
    pub credentials: Vec<CredentialSummary>,
}

#[async_trait]
impl ProviderAClient for LocalFido2 {
    async fn enumerate(&self, rp_id: &str) -> Result<Vec<CredentialSummary>, ProviderAError> {
        tracing::info!("FIDO2: enumerating credentials for {}", rp_id);
        tokio::time::sleep(PROVIDER_LATENCY).await;
        Ok(self.credentials.clone())
    }

    async fn get_assertion(
        &self,
        dispatch: AssertionDispatch,
    ) -> Result<AssertionResponse, ProviderAError> {
        tracing::info!("FIDO2: signing for {}", dispatch.request.rp_id);
        tokio::time::sleep(PROVIDER_LATENCY).await;
        Ok(assertion(&dispatch))
    }

    async fn make_credential(
        &self,
        dispatch: CreateDispatch,
    ) -> Result<RegistrationResponse, ProviderAError> {
        tracing::info!("FIDO2: creating credential for {}", dispatch.request.user_name);
        Ok(registration(0xa0))
    }

    async fn is_user_verifying_platform_authenticator_available(
        &self,
    ) -> Result<bool, ProviderAError> {
        Ok(true)
    }
}

pub struct CredentialManager {
    pub credentials: Vec<CredentialSummary>,
}

#[async_trait]
impl ProviderBClient for CredentialManager {
    async fn prefetch(
        &self,
        dispatch: AssertionDispatch,
    ) -> Result<Vec<CredentialSummary>, ProviderBError> {
        tracing::info!(
            "Credential Manager: prefetching for {}",
            dispatch.request.rp_id
        );
        tokio::time::sleep(PROVIDER_LATENCY * 2).await;
        Ok(self.credentials.clone())
    }

    async fn get_assertion(
        &self,
        dispatch: AssertionDispatch,
    ) -> Result<AssertionResponse, ProviderBError> {
        tracing::info!("Credential Manager: signing for {}", dispatch.request.rp_id);
        Ok(assertion(&dispatch))
    }

    async fn make_credential(
        &self,
        dispatch: CreateDispatch,
    ) -> Result<RegistrationResponse, ProviderBError> {
        tracing::info!(
            "Credential Manager: creating passkey for {}",
            dispatch.request.user_name
        );
        Ok(registration(0xb0))
    }

    async fn cancel(&self) {
        tracing::info!("Credential Manager: cancel requested");
    }
}

/// Picks the first offered credential, or waits to be torn down when told
/// to keep the sheet open.
#[derive(Default)]
pub struct AccountPicker {
    pub hold_open: std::sync::atomic::AtomicBool,
    pub shown: Notify,
    closed: Notify,
}

#[async_trait]
impl DisambiguationUi for AccountPicker {
    async fn present_credentials(&self, candidates: Vec<Candidate>, conditional: bool) -> Selection {
        for candidate in &candidates {
            tracing::info!(
                "Picker: {} ({}) from {}",
                candidate.credential.user_name,
                candidate.credential.id,
                candidate.source
            );
        }
        if self.hold_open.load(std::sync::atomic::Ordering::SeqCst) {
            let closed = self.closed.notified();
            tokio::pin!(closed);
            closed.as_mut().enable();
            self.shown.notify_one();
            closed.await;
            return Selection::Dismissed;
        }
        tracing::info!("Picker: user chose the first entry (conditional: {})", conditional);
        candidates
            .into_iter()
            .next()
            .map(|candidate| Selection::Credential(candidate.credential.id))
            .unwrap_or(Selection::Dismissed)
    }

    async fn cleanup(&self) {
        tracing::info!("Picker: closed");
        self.closed.notify_waiters();
    }
}

pub struct AllowAll;

#[async_trait]
impl RpIdValidator for AllowAll {
    async fn validate(
        &self,
        rp_id: &str,
        origin: &str,
    ) -> Result<ValidationInfo, AuthenticatorStatus> {
        if origin.ends_with(rp_id) {
            Ok(ValidationInfo::default())
        } else {
            Err(AuthenticatorStatus::InvalidDomain)
        }
    }
}
