use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::barrier::Party;

/// Identifier attached to every log line of one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for raw credential ID bytes.
///
/// Displayed as unpadded base64url, the encoding used on the web side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CredentialId(Vec<u8>);

impl CredentialId {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for CredentialId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for CredentialId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", URL_SAFE_NO_PAD.encode(&self.0))
    }
}

/// How the page asked for the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mediation {
    /// A modal account picker
    #[default]
    Modal,
    /// Autofill-style: credentials are offered inline in a form field
    Conditional,
    /// Resolve at once with locally available credentials, or fail
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidentKeyRequirement {
    Discouraged,
    #[default]
    Preferred,
    Required,
}

/// Secure payment confirmation data carried by a payment assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOptions {
    pub payee_origin: Option<String>,
    pub payee_name: Option<String>,
    pub currency: String,
    pub total: String,
    pub instrument_display_name: String,
    pub instrument_icon: String,
}

/// A `get()` request after it has been parsed from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub rp_id: String,
    /// Caller origin, e.g. `https://example.com`
    pub origin: String,
    /// Top-level origin when called from a cross-origin iframe
    pub top_origin: Option<String>,
    pub challenge: Vec<u8>,
    pub allow_credentials: Vec<CredentialId>,
    pub mediation: Mediation,
    pub payment: Option<PaymentOptions>,
    /// The legacy `appid` extension value, if the page sent one
    pub appid: Option<String>,
    pub user_verification_methods: bool,
    /// Whether the calling context is off the record
    pub is_incognito: bool,
}

impl GetRequest {
    pub fn new(rp_id: impl Into<String>, origin: impl Into<String>, challenge: Vec<u8>) -> Self {
        Self {
            rp_id: rp_id.into(),
            origin: origin.into(),
            top_origin: None,
            challenge,
            allow_credentials: Vec::new(),
            mediation: Mediation::Modal,
            payment: None,
            appid: None,
            user_verification_methods: false,
            is_incognito: false,
        }
    }

    pub fn has_allow_list(&self) -> bool {
        !self.allow_credentials.is_empty()
    }

    pub fn is_conditional(&self) -> bool {
        self.mediation == Mediation::Conditional
    }

    pub fn allows(&self, id: &CredentialId) -> bool {
        self.allow_credentials.iter().any(|allowed| allowed == id)
    }
}

/// A `create()` request after it has been parsed from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub rp_id: String,
    pub origin: String,
    pub challenge: Vec<u8>,
    pub user_handle: Vec<u8>,
    pub user_name: String,
    pub resident_key: ResidentKeyRequirement,
    pub exclude_credentials: Vec<CredentialId>,
    pub is_payment_credential_creation: bool,
    /// Echo the `credProps` extension in the response
    pub cred_props: bool,
}

impl CreateRequest {
    pub fn new(
        rp_id: impl Into<String>,
        origin: impl Into<String>,
        challenge: Vec<u8>,
        user_handle: Vec<u8>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            rp_id: rp_id.into(),
            origin: origin.into(),
            challenge,
            user_handle,
            user_name: user_name.into(),
            resident_key: ResidentKeyRequirement::Preferred,
            exclude_credentials: Vec::new(),
            is_payment_credential_creation: false,
            cred_props: false,
        }
    }
}

/// A credential as reported by a provider's enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: CredentialId,
    pub user_name: String,
    pub user_display_name: String,
    pub user_handle: Vec<u8>,
    pub is_discoverable: bool,
    pub is_payment: bool,
}

impl CredentialSummary {
    pub fn discoverable(id: impl Into<CredentialId>, user_name: impl Into<String>) -> Self {
        let user_name = user_name.into();
        Self {
            id: id.into(),
            user_display_name: user_name.clone(),
            user_name,
            user_handle: Vec::new(),
            is_discoverable: true,
            is_payment: false,
        }
    }
}

/// A credential offered in the selection UI, tagged with the provider that
/// will serve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub credential: CredentialSummary,
    pub source: Party,
}

/// Result of the asynchronous RP ID / origin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationInfo {
    pub is_cross_origin: bool,
}

/// What the selection UI reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The user picked a credential; an empty ID signals an embedder problem
    Credential(CredentialId),
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResponse {
    pub credential_id: CredentialId,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
    pub client_data_json: Vec<u8>,
    pub echo_appid_extension: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub credential_id: CredentialId,
    pub attestation_object: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub echo_cred_props: bool,
}

/// An assertion request as handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionDispatch {
    /// The request, with `allow_credentials` narrowed to the selected
    /// credential when one was picked
    pub request: GetRequest,
    /// SHA-256 of the client data JSON built by the coordinator, if any
    pub client_data_hash: Option<[u8; 32]>,
}

/// A registration request as handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDispatch {
    pub request: CreateRequest,
    pub client_data_hash: Option<[u8; 32]>,
}
