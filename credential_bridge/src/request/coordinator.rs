use crate::barrier::{Barrier, BarrierMode, Party, PartyStatus, Resolution};
use crate::config::BridgeConfig;
use crate::status::AuthenticatorStatus;

use super::client_data::{ClientData, ClientDataError, ClientDataRequestType, build_client_data};
use super::commands::{Command, Event};
use super::dispatch::{GetRoute, select_create_route, select_get_route};
use super::errors::CoordinatorError;
use super::outcome::{Outcome, OutcomeSink, Payload};
use super::types::{
    AssertionDispatch, AssertionResponse, Candidate, CreateDispatch, CreateRequest, CredentialId,
    CredentialSummary, GetRequest, Mediation, RegistrationResponse, RequestId, Selection,
    ValidationInfo,
};

/// Phase of the request currently held by a [`Coordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalUiState {
    None,
    WaitingForRpIdValidation,
    WaitingForCredentialList,
    WaitingForSelection,
    RequestSentToPlatform,
    CancelPending,
    CancelPendingRpIdValidationComplete,
}

#[derive(Debug)]
enum PendingRequest {
    Get {
        request: GetRequest,
        sink: OutcomeSink,
    },
    Create {
        request: CreateRequest,
        sink: OutcomeSink,
    },
}

impl PendingRequest {
    fn into_sink(self) -> OutcomeSink {
        match self {
            Self::Get { sink, .. } | Self::Create { sink, .. } => sink,
        }
    }
}

#[derive(Debug)]
struct GetContext {
    id: RequestId,
    request: GetRequest,
    sink: OutcomeSink,
    validation: ValidationInfo,
    ui_presented: bool,
}

#[derive(Debug)]
struct CreateContext {
    id: RequestId,
    request: CreateRequest,
    sink: OutcomeSink,
    validation: ValidationInfo,
}

#[derive(Debug)]
enum ActiveRequest {
    Get(GetContext),
    Create(CreateContext),
}

impl ActiveRequest {
    fn id(&self) -> RequestId {
        match self {
            Self::Get(ctx) => ctx.id,
            Self::Create(ctx) => ctx.id,
        }
    }

    fn ui_presented(&self) -> bool {
        match self {
            Self::Get(ctx) => ctx.ui_presented,
            Self::Create(_) => false,
        }
    }

    fn into_sink(self) -> OutcomeSink {
        match self {
            Self::Get(ctx) => ctx.sink,
            Self::Create(ctx) => ctx.sink,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumerationPurpose {
    /// Offer the enumerated credentials in the selection UI
    Selection,
    /// Decide whether the allow-list names a non-discoverable local credential
    AllowListProbe,
}

#[derive(Debug)]
struct Enumeration {
    ctx: GetContext,
    barrier: Barrier<Vec<CredentialSummary>>,
    purpose: EnumerationPurpose,
}

/// Candidates to re-present if a conditional dispatch is declined.
#[derive(Debug)]
struct Resume {
    candidates: Vec<Candidate>,
    mode: BarrierMode,
}

#[derive(Debug)]
struct Dispatched {
    request: ActiveRequest,
    provider: Party,
    client_data: Option<ClientData>,
    resume: Option<Resume>,
}

#[derive(Debug)]
enum CancelPhase {
    Enumeration(Enumeration),
    Dispatch(Dispatched),
}

#[derive(Debug, Default)]
enum RequestState {
    #[default]
    Idle,
    WaitingForRpIdValidation {
        id: RequestId,
        pending: PendingRequest,
    },
    CancelPendingRpIdValidationComplete {
        id: RequestId,
        pending: PendingRequest,
    },
    WaitingForCredentialList(Enumeration),
    WaitingForSelection {
        ctx: GetContext,
        candidates: Vec<Candidate>,
        mode: BarrierMode,
    },
    RequestSentToPlatform(Dispatched),
    CancelPending(CancelPhase),
}

/// Drives one `get()` or `create()` call at a time through RP ID validation,
/// provider selection, credential enumeration, user selection and the final
/// platform call.
///
/// The coordinator performs no I/O. Every input returns the [`Command`]s the
/// owner must execute; their completions come back through
/// [`Coordinator::handle`]. All inputs must arrive on one sequence.
#[derive(Debug)]
pub struct Coordinator {
    config: BridgeConfig,
    state: RequestState,
}

impl Coordinator {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            state: RequestState::Idle,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> ConditionalUiState {
        match &self.state {
            RequestState::Idle => ConditionalUiState::None,
            RequestState::WaitingForRpIdValidation { .. } => {
                ConditionalUiState::WaitingForRpIdValidation
            }
            RequestState::CancelPendingRpIdValidationComplete { .. } => {
                ConditionalUiState::CancelPendingRpIdValidationComplete
            }
            RequestState::WaitingForCredentialList(_) => {
                ConditionalUiState::WaitingForCredentialList
            }
            RequestState::WaitingForSelection { .. } => ConditionalUiState::WaitingForSelection,
            RequestState::RequestSentToPlatform(_) => ConditionalUiState::RequestSentToPlatform,
            RequestState::CancelPending(_) => ConditionalUiState::CancelPending,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, RequestState::Idle)
    }

    /// Begin a `get()` call. A request arriving while another is outstanding
    /// is rejected with `NotAllowed` at once.
    pub fn start_get(
        &mut self,
        mut request: GetRequest,
        sink: OutcomeSink,
    ) -> Result<Vec<Command>, CoordinatorError> {
        if !self.is_idle() {
            tracing::warn!(
                "{}: rejecting get request for {}",
                CoordinatorError::Busy,
                request.rp_id
            );
            sink.deliver(Outcome::Error(AuthenticatorStatus::NotAllowed));
            return Ok(Vec::new());
        }

        // No UVM support for discoverable credentials.
        if !request.has_allow_list() {
            request.user_verification_methods = false;
        }

        let id = RequestId::new();
        tracing::debug!(
            request_id = %id,
            "Starting get request for {} ({:?})",
            request.rp_id,
            request.mediation
        );
        let command = Command::ValidateRpId {
            rp_id: request.rp_id.clone(),
            origin: request.origin.clone(),
        };
        self.state = RequestState::WaitingForRpIdValidation {
            id,
            pending: PendingRequest::Get { request, sink },
        };
        Ok(vec![command])
    }

    /// Begin a `create()` call.
    pub fn start_create(
        &mut self,
        request: CreateRequest,
        sink: OutcomeSink,
    ) -> Result<Vec<Command>, CoordinatorError> {
        if !self.is_idle() {
            tracing::warn!(
                "{}: rejecting create request for {}",
                CoordinatorError::Busy,
                request.rp_id
            );
            sink.deliver(Outcome::Error(AuthenticatorStatus::NotAllowed));
            return Ok(Vec::new());
        }

        let id = RequestId::new();
        tracing::debug!(request_id = %id, "Starting create request for {}", request.rp_id);
        let command = Command::ValidateRpId {
            rp_id: request.rp_id.clone(),
            origin: request.origin.clone(),
        };
        self.state = RequestState::WaitingForRpIdValidation {
            id,
            pending: PendingRequest::Create { request, sink },
        };
        Ok(vec![command])
    }

    /// Cancel the outstanding request.
    ///
    /// Cancellation takes effect once the in-flight asynchronous step
    /// returns; only a request waiting for the user's selection is cancelled
    /// at once.
    pub fn cancel(&mut self) -> Result<Vec<Command>, CoordinatorError> {
        match std::mem::take(&mut self.state) {
            RequestState::Idle => {
                tracing::debug!("Cancel with no outstanding request");
                Ok(Vec::new())
            }
            RequestState::WaitingForRpIdValidation { id, pending } => {
                tracing::debug!(request_id = %id, "Cancel pending RP ID validation");
                self.state = RequestState::CancelPendingRpIdValidationComplete { id, pending };
                Ok(Vec::new())
            }
            RequestState::WaitingForCredentialList(enumeration) => {
                tracing::debug!(request_id = %enumeration.ctx.id, "Cancel pending enumeration");
                let mut commands = Vec::new();
                if enumeration.barrier.status(Party::ProviderB) == PartyStatus::Waiting {
                    commands.push(Command::CancelProviderB);
                }
                self.state = RequestState::CancelPending(CancelPhase::Enumeration(enumeration));
                Ok(commands)
            }
            RequestState::WaitingForSelection { ctx, mode, .. } => {
                tracing::debug!(request_id = %ctx.id, "Cancelled during selection");
                let mut commands = Vec::new();
                if mode.includes(Party::ProviderB) {
                    commands.push(Command::CancelProviderB);
                }
                commands.extend(self.finish(ActiveRequest::Get(ctx), Outcome::Cancel));
                Ok(commands)
            }
            RequestState::RequestSentToPlatform(dispatched) => {
                tracing::debug!(
                    request_id = %dispatched.request.id(),
                    "Cancel pending {} call",
                    dispatched.provider
                );
                let commands = if dispatched.provider == Party::ProviderB {
                    vec![Command::CancelProviderB]
                } else {
                    Vec::new()
                };
                self.state = RequestState::CancelPending(CancelPhase::Dispatch(dispatched));
                Ok(commands)
            }
            state @ (RequestState::CancelPending(_)
            | RequestState::CancelPendingRpIdValidationComplete { .. }) => {
                tracing::debug!("Request is already being cancelled");
                self.state = state;
                Ok(Vec::new())
            }
        }
    }

    /// Feed the completion of a previously issued [`Command`].
    pub fn handle(&mut self, event: Event) -> Result<Vec<Command>, CoordinatorError> {
        tracing::debug!("Handling {} in {:?}", event.name(), self.state());
        match event {
            Event::RpIdValidated(result) => self.on_rp_id_validated(result),
            Event::ProviderAEnumerated(result) => self.on_enumerated(Party::ProviderA, result),
            Event::ProviderBPrefetched(result) => self.on_enumerated(Party::ProviderB, result),
            Event::CredentialSelected(selection) => self.on_credential_selected(selection),
            Event::AssertionCompleted { provider, result } => {
                self.on_assertion_completed(provider, result)
            }
            Event::RegistrationCompleted { provider, result } => {
                self.on_registration_completed(provider, result)
            }
        }
    }

    fn on_rp_id_validated(
        &mut self,
        result: Result<ValidationInfo, AuthenticatorStatus>,
    ) -> Result<Vec<Command>, CoordinatorError> {
        let (id, pending) = match std::mem::take(&mut self.state) {
            RequestState::WaitingForRpIdValidation { id, pending } => (id, pending),
            RequestState::CancelPendingRpIdValidationComplete { id, pending } => {
                tracing::debug!(request_id = %id, "RP ID validation finished after cancel");
                pending.into_sink().deliver(Outcome::Cancel);
                return Ok(Vec::new());
            }
            state => {
                self.state = state;
                return Ok(self.ignore("RpIdValidated"));
            }
        };

        let validation = match result {
            Ok(validation) => validation,
            Err(status) => {
                tracing::error!(request_id = %id, "RP ID validation failed: {}", status);
                pending.into_sink().deliver(Outcome::Error(status));
                return Ok(Vec::new());
            }
        };

        match pending {
            PendingRequest::Get { request, sink } => self.route_get(GetContext {
                id,
                request,
                sink,
                validation,
                ui_presented: false,
            }),
            PendingRequest::Create { request, sink } => Ok(self.route_create(CreateContext {
                id,
                request,
                sink,
                validation,
            })),
        }
    }

    fn route_get(&mut self, ctx: GetContext) -> Result<Vec<Command>, CoordinatorError> {
        let route = select_get_route(&self.config, &ctx.request);
        tracing::debug!(request_id = %ctx.id, "Get route: {:?}", route);
        match route {
            GetRoute::Reject(status) => Ok(self.finish(ActiveRequest::Get(ctx), status.into())),
            GetRoute::Dispatch(provider) => Ok(self.dispatch_assertion(ctx, provider, None, None)),
            GetRoute::Enumerate(mode) => {
                self.start_enumeration(ctx, mode, EnumerationPurpose::Selection)
            }
            GetRoute::ProbeLocalCredentials => self.start_enumeration(
                ctx,
                BarrierMode::OnlyProviderA,
                EnumerationPurpose::AllowListProbe,
            ),
        }
    }

    fn start_enumeration(
        &mut self,
        ctx: GetContext,
        mode: BarrierMode,
        purpose: EnumerationPurpose,
    ) -> Result<Vec<Command>, CoordinatorError> {
        let mut barrier = Barrier::new();
        if ctx.request.mediation == Mediation::Immediate && ctx.request.is_incognito {
            barrier.set_immediate_incognito();
        }
        barrier.reset_and_set_wait_status(mode)?;

        let mut commands = Vec::new();
        if mode.includes(Party::ProviderA) {
            commands.push(Command::EnumerateProviderA {
                rp_id: ctx.request.rp_id.clone(),
            });
        }
        if mode.includes(Party::ProviderB) {
            let client_data = match self.assertion_client_data(&ctx, Party::ProviderB) {
                Ok(client_data) => client_data,
                Err(e) => {
                    tracing::error!(request_id = %ctx.id, "Client data generation failed: {}", e);
                    return Ok(self.finish(
                        ActiveRequest::Get(ctx),
                        Outcome::Error(AuthenticatorStatus::NotAllowed),
                    ));
                }
            };
            commands.push(Command::PrefetchProviderB {
                dispatch: AssertionDispatch {
                    request: ctx.request.clone(),
                    client_data_hash: client_data.map(|client_data| client_data.hash),
                },
            });
        }

        self.state = RequestState::WaitingForCredentialList(Enumeration {
            ctx,
            barrier,
            purpose,
        });
        Ok(commands)
    }

    fn on_enumerated(
        &mut self,
        party: Party,
        result: Result<Vec<CredentialSummary>, AuthenticatorStatus>,
    ) -> Result<Vec<Command>, CoordinatorError> {
        let resolution = match &mut self.state {
            RequestState::WaitingForCredentialList(enumeration) => match result {
                Ok(credentials) => {
                    tracing::debug!(
                        request_id = %enumeration.ctx.id,
                        "{} returned {} credentials",
                        party,
                        credentials.len()
                    );
                    enumeration.barrier.report_success(party, credentials)?
                }
                Err(status) => {
                    tracing::error!(
                        request_id = %enumeration.ctx.id,
                        "{} enumeration failed: {}",
                        party,
                        status
                    );
                    enumeration.barrier.report_failure(party, status)?
                }
            },
            RequestState::CancelPending(CancelPhase::Enumeration(enumeration)) => {
                enumeration.barrier.report_cancelled(party, None)?
            }
            _ => {
                return Ok(self.ignore(match party {
                    Party::ProviderA => "ProviderAEnumerated",
                    Party::ProviderB => "ProviderBPrefetched",
                }));
            }
        };

        let Some(resolution) = resolution else {
            return Ok(Vec::new());
        };

        match std::mem::take(&mut self.state) {
            RequestState::WaitingForCredentialList(enumeration) => {
                self.on_enumeration_resolved(enumeration, resolution)
            }
            RequestState::CancelPending(CancelPhase::Enumeration(enumeration)) => {
                tracing::debug!(request_id = %enumeration.ctx.id, "Enumeration finished after cancel");
                Ok(self.finish(ActiveRequest::Get(enumeration.ctx), Outcome::Cancel))
            }
            state => {
                self.state = state;
                Err(CoordinatorError::InvalidState(
                    "enumeration resolved outside of an enumeration phase".to_string(),
                )
                .log())
            }
        }
    }

    fn on_enumeration_resolved(
        &mut self,
        enumeration: Enumeration,
        resolution: Resolution<Vec<CredentialSummary>>,
    ) -> Result<Vec<Command>, CoordinatorError> {
        let Enumeration {
            ctx,
            barrier,
            purpose,
        } = enumeration;
        let mode = barrier.mode().unwrap_or(BarrierMode::OnlyProviderA);

        let (from_a, from_b) = match resolution {
            Resolution::Failure(status) => {
                return Ok(self.finish(ActiveRequest::Get(ctx), status.into()));
            }
            Resolution::Success {
                provider_a,
                provider_b,
            } => (provider_a.unwrap_or_default(), provider_b.unwrap_or_default()),
        };

        match purpose {
            EnumerationPurpose::AllowListProbe => {
                // The FIDO2 API is authoritative for non-discoverable local credentials.
                let has_local_credential = from_a
                    .iter()
                    .any(|credential| !credential.is_discoverable && ctx.request.allows(&credential.id));
                let provider = if has_local_credential {
                    Party::ProviderA
                } else {
                    Party::ProviderB
                };
                Ok(self.dispatch_assertion(ctx, provider, None, None))
            }
            EnumerationPurpose::Selection => Ok(self.offer_candidates(ctx, mode, from_a, from_b)),
        }
    }

    fn offer_candidates(
        &mut self,
        mut ctx: GetContext,
        mode: BarrierMode,
        from_a: Vec<CredentialSummary>,
        from_b: Vec<CredentialSummary>,
    ) -> Vec<Command> {
        let has_allow_list = ctx.request.has_allow_list();
        let candidates: Vec<Candidate> = from_a
            .into_iter()
            .filter(|credential| {
                credential.is_discoverable
                    && (!has_allow_list || ctx.request.allows(&credential.id))
            })
            .map(|credential| Candidate {
                credential,
                source: Party::ProviderA,
            })
            .chain(from_b.into_iter().map(|credential| Candidate {
                credential,
                source: Party::ProviderB,
            }))
            .collect();

        match ctx.request.mediation {
            Mediation::Immediate if candidates.is_empty() => {
                tracing::debug!(request_id = %ctx.id, "No credentials for immediate request");
                self.finish(
                    ActiveRequest::Get(ctx),
                    Outcome::Error(AuthenticatorStatus::NotAllowed),
                )
            }
            Mediation::Modal if candidates.is_empty() && mode != BarrierMode::Both => {
                tracing::debug!(
                    request_id = %ctx.id,
                    "No discoverable credentials, handing over to the FIDO2 API"
                );
                self.dispatch_assertion(ctx, Party::ProviderA, None, None)
            }
            _ => {
                ctx.ui_presented = true;
                let command = Command::PresentCredentials {
                    candidates: candidates.clone(),
                    conditional: ctx.request.is_conditional(),
                };
                self.state = RequestState::WaitingForSelection {
                    ctx,
                    candidates,
                    mode,
                };
                vec![command]
            }
        }
    }

    fn on_credential_selected(
        &mut self,
        selection: Selection,
    ) -> Result<Vec<Command>, CoordinatorError> {
        let (ctx, candidates, mode) = match std::mem::take(&mut self.state) {
            RequestState::WaitingForSelection {
                ctx,
                candidates,
                mode,
            } => (ctx, candidates, mode),
            state => {
                self.state = state;
                return Ok(self.ignore("CredentialSelected"));
            }
        };

        let conditional = ctx.request.is_conditional();
        let id = match selection {
            Selection::Dismissed => {
                tracing::debug!(request_id = %ctx.id, "Selection dismissed");
                return Ok(self.finish(
                    ActiveRequest::Get(ctx),
                    Outcome::Error(AuthenticatorStatus::NotAllowed),
                ));
            }
            Selection::Credential(id) if id.is_empty() => {
                let status = if conditional {
                    tracing::error!(request_id = %ctx.id, "Empty credential ID from account selection");
                    AuthenticatorStatus::Unknown
                } else {
                    AuthenticatorStatus::NotAllowed
                };
                return Ok(self.finish(ActiveRequest::Get(ctx), Outcome::Error(status)));
            }
            Selection::Credential(id) => id,
        };

        let provider = candidates
            .iter()
            .find(|candidate| candidate.credential.id == id)
            .map(|candidate| candidate.source)
            .unwrap_or_else(|| {
                tracing::warn!(request_id = %ctx.id, "Selected credential {} was not offered", id);
                Party::ProviderA
            });
        let resume = conditional.then_some(Resume { candidates, mode });
        Ok(self.dispatch_assertion(ctx, provider, Some(id), resume))
    }

    fn dispatch_assertion(
        &mut self,
        ctx: GetContext,
        provider: Party,
        selected: Option<CredentialId>,
        resume: Option<Resume>,
    ) -> Vec<Command> {
        let client_data = match self.assertion_client_data(&ctx, provider) {
            Ok(client_data) => client_data,
            Err(e) => {
                tracing::error!(request_id = %ctx.id, "Client data generation failed: {}", e);
                return self.finish(
                    ActiveRequest::Get(ctx),
                    Outcome::Error(AuthenticatorStatus::NotAllowed),
                );
            }
        };

        let mut request = ctx.request.clone();
        if let Some(id) = selected {
            request.allow_credentials = vec![id];
        }

        tracing::debug!(request_id = %ctx.id, "Sending assertion request to {}", provider);
        let command = Command::GetAssertion {
            provider,
            dispatch: AssertionDispatch {
                request,
                client_data_hash: client_data.as_ref().map(|client_data| client_data.hash),
            },
        };
        self.state = RequestState::RequestSentToPlatform(Dispatched {
            request: ActiveRequest::Get(ctx),
            provider,
            client_data,
            resume,
        });
        vec![command]
    }

    /// Client data the bridge must build itself for an assertion sent to
    /// `provider`, if any.
    fn assertion_client_data(
        &self,
        ctx: &GetContext,
        provider: Party,
    ) -> Result<Option<ClientData>, ClientDataError> {
        let request_type = match (&ctx.request.payment, provider) {
            (Some(_), _) if self.config.secure_payment_confirmation => {
                ClientDataRequestType::PaymentGet
            }
            (None, Party::ProviderB) => ClientDataRequestType::WebAuthnGet,
            _ => return Ok(None),
        };
        let request = &ctx.request;
        build_client_data(
            request_type,
            &request.origin,
            request.top_origin.as_deref(),
            &request.challenge,
            ctx.validation.is_cross_origin,
            &request.rp_id,
            request.payment.as_ref(),
        )
        .map(Some)
    }

    fn on_assertion_completed(
        &mut self,
        provider: Party,
        result: Result<AssertionResponse, AuthenticatorStatus>,
    ) -> Result<Vec<Command>, CoordinatorError> {
        let (dispatched, cancelled) = match std::mem::take(&mut self.state) {
            RequestState::RequestSentToPlatform(dispatched)
                if dispatched.provider == provider
                    && matches!(dispatched.request, ActiveRequest::Get(_)) =>
            {
                (dispatched, false)
            }
            RequestState::CancelPending(CancelPhase::Dispatch(dispatched))
                if dispatched.provider == provider
                    && matches!(dispatched.request, ActiveRequest::Get(_)) =>
            {
                (dispatched, true)
            }
            state => {
                self.state = state;
                return Ok(self.ignore("AssertionCompleted"));
            }
        };

        let Dispatched {
            request,
            client_data,
            resume,
            ..
        } = dispatched;
        let ActiveRequest::Get(ctx) = request else {
            return Err(CoordinatorError::InvalidState(
                "assertion completed for a create request".to_string(),
            )
            .log());
        };

        match (result, resume) {
            (Ok(mut response), _) => {
                if cancelled {
                    tracing::debug!(request_id = %ctx.id, "Assertion completed despite cancel");
                }
                if let Some(client_data) = client_data {
                    response.client_data_json = client_data.json.into_bytes();
                }
                if ctx.request.appid.is_some() {
                    response.echo_appid_extension = true;
                }
                Ok(self.finish(
                    ActiveRequest::Get(ctx),
                    Outcome::Success {
                        provenance: provider.into(),
                        payload: Payload::Assertion(response),
                    },
                ))
            }
            (Err(status), _) if cancelled => {
                tracing::debug!(request_id = %ctx.id, "{} failed after cancel: {}", provider, status);
                Ok(self.finish(ActiveRequest::Get(ctx), Outcome::Cancel))
            }
            (Err(AuthenticatorStatus::NotAllowed), Some(resume)) => {
                tracing::debug!(request_id = %ctx.id, "User declined, returning to selection");
                let command = Command::PresentCredentials {
                    candidates: resume.candidates.clone(),
                    conditional: true,
                };
                self.state = RequestState::WaitingForSelection {
                    ctx,
                    candidates: resume.candidates,
                    mode: resume.mode,
                };
                Ok(vec![command])
            }
            (Err(status), _) => {
                tracing::error!(request_id = %ctx.id, "{} assertion failed: {}", provider, status);
                Ok(self.finish(ActiveRequest::Get(ctx), Outcome::Error(status)))
            }
        }
    }

    fn route_create(&mut self, ctx: CreateContext) -> Vec<Command> {
        let provider = select_create_route(&self.config, &ctx.request);

        let client_data = match provider {
            Party::ProviderA => None,
            Party::ProviderB => {
                let request = &ctx.request;
                match build_client_data(
                    ClientDataRequestType::WebAuthnCreate,
                    &request.origin,
                    None,
                    &request.challenge,
                    ctx.validation.is_cross_origin,
                    &request.rp_id,
                    None,
                ) {
                    Ok(client_data) => Some(client_data),
                    Err(e) => {
                        tracing::error!(request_id = %ctx.id, "Client data generation failed: {}", e);
                        return self.finish(
                            ActiveRequest::Create(ctx),
                            Outcome::Error(AuthenticatorStatus::NotAllowed),
                        );
                    }
                }
            }
        };

        tracing::debug!(request_id = %ctx.id, "Sending registration request to {}", provider);
        let command = Command::MakeCredential {
            provider,
            dispatch: CreateDispatch {
                request: ctx.request.clone(),
                client_data_hash: client_data.as_ref().map(|client_data| client_data.hash),
            },
        };
        self.state = RequestState::RequestSentToPlatform(Dispatched {
            request: ActiveRequest::Create(ctx),
            provider,
            client_data,
            resume: None,
        });
        vec![command]
    }

    fn on_registration_completed(
        &mut self,
        provider: Party,
        result: Result<RegistrationResponse, AuthenticatorStatus>,
    ) -> Result<Vec<Command>, CoordinatorError> {
        let (dispatched, cancelled) = match std::mem::take(&mut self.state) {
            RequestState::RequestSentToPlatform(dispatched)
                if dispatched.provider == provider
                    && matches!(dispatched.request, ActiveRequest::Create(_)) =>
            {
                (dispatched, false)
            }
            RequestState::CancelPending(CancelPhase::Dispatch(dispatched))
                if dispatched.provider == provider
                    && matches!(dispatched.request, ActiveRequest::Create(_)) =>
            {
                (dispatched, true)
            }
            state => {
                self.state = state;
                return Ok(self.ignore("RegistrationCompleted"));
            }
        };

        let Dispatched {
            request,
            client_data,
            ..
        } = dispatched;
        let ActiveRequest::Create(ctx) = request else {
            return Err(CoordinatorError::InvalidState(
                "registration completed for a get request".to_string(),
            )
            .log());
        };

        let outcome = match result {
            Ok(mut response) => {
                if let Some(client_data) = client_data {
                    response.client_data_json = client_data.json.into_bytes();
                }
                if ctx.request.cred_props {
                    response.echo_cred_props = true;
                }
                Outcome::Success {
                    provenance: provider.into(),
                    payload: Payload::Registration(response),
                }
            }
            Err(_) if cancelled => Outcome::Cancel,
            Err(status) => {
                tracing::error!(request_id = %ctx.id, "{} registration failed: {}", provider, status);
                Outcome::Error(status)
            }
        };
        Ok(self.finish(ActiveRequest::Create(ctx), outcome))
    }

    /// Deliver the terminal outcome and return to idle.
    fn finish(&mut self, request: ActiveRequest, outcome: Outcome) -> Vec<Command> {
        self.state = RequestState::Idle;
        let ui_presented = request.ui_presented();
        tracing::debug!(
            request_id = %request.id(),
            "Request finished: {}",
            match outcome.status() {
                Some(status) => status.to_string(),
                None => "success".to_string(),
            }
        );
        request.into_sink().deliver(outcome);

        if ui_presented {
            vec![Command::CleanupUi]
        } else {
            Vec::new()
        }
    }

    fn ignore(&self, event: &str) -> Vec<Command> {
        tracing::warn!("Ignoring {} in {:?}", event, self.state());
        Vec::new()
    }
}
