//! credential_bridge - WebAuthn request coordination across two credential providers
//!
//! This crate decides whether a WebAuthn request goes to the legacy FIDO2 API,
//! to Credential Manager, or to both in parallel, and reconciles their
//! independently failing and cancellable results into exactly one outcome
//! for the caller.

mod barrier;
mod config;
mod provider;
mod request;
mod status;

pub use barrier::{Barrier, BarrierError, BarrierMode, Party, PartyStatus, Provenance, Resolution};

pub use config::{BridgeConfig, CredManSupport};

pub use provider::{
    Collaborators, DisambiguationUi, ProviderAClient, ProviderAError, ProviderBClient,
    ProviderBError, RpIdValidator,
};

pub use request::{
    AssertionDispatch, AssertionResponse, Candidate, ClientData, ClientDataError,
    ClientDataRequestType, Command, ConditionalUiState, Coordinator, CoordinatorError,
    CreateDispatch, CreateRequest, CredentialId, CredentialSummary, Event, GetRequest, GetRoute,
    Mediation, Outcome, OutcomeSink, Payload, PaymentOptions, RegistrationResponse, RequestId,
    RequestSequence, ResidentKeyRequirement, Selection, SequenceHandle, ValidationInfo,
    build_client_data, matching_credential_ids, select_create_route, select_get_route,
    serialize_origin,
};

pub use status::{
    AuthenticatorStatus, PROVIDER_A_CONSTRAINT_ERR, PROVIDER_A_DATA_ERR, PROVIDER_A_ENCODING_ERR,
    PROVIDER_A_INVALID_STATE_ERR, PROVIDER_A_NOT_ALLOWED_ERR, PROVIDER_A_NOT_SUPPORTED_ERR,
    PROVIDER_A_SECURITY_ERR, PROVIDER_A_TIMEOUT_ERR, PROVIDER_A_UNKNOWN_ERR,
    translate_provider_a_error, translate_provider_b_error,
};
