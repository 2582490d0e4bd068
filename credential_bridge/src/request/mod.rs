//! Credential request coordination
//!
//! This module drives WebAuthn `get()` and `create()` calls across the two
//! credential providers:
//! - `coordinator`: the sans-IO state machine for one outstanding request
//! - `dispatch`: which provider(s) a request goes to
//! - `client_data`: client data JSON built on the bridge side
//! - `sequence`: the tokio task that owns a coordinator and runs its commands

mod client_data;
mod commands;
mod coordinator;
mod dispatch;
mod errors;
mod matching;
mod outcome;
mod sequence;
mod types;

pub use client_data::{
    ClientData, ClientDataError, ClientDataRequestType, build_client_data, serialize_origin,
};
pub use commands::{Command, Event};
pub use coordinator::{ConditionalUiState, Coordinator};
pub use dispatch::{GetRoute, select_create_route, select_get_route};
pub use errors::CoordinatorError;
pub use matching::matching_credential_ids;
pub use outcome::{Outcome, OutcomeSink, Payload};
pub use sequence::{RequestSequence, SequenceHandle};
pub use types::{
    AssertionDispatch, AssertionResponse, Candidate, CreateDispatch, CreateRequest, CredentialId,
    CredentialSummary, GetRequest, Mediation, PaymentOptions, RegistrationResponse, RequestId,
    ResidentKeyRequirement, Selection, ValidationInfo,
};
