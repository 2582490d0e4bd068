use std::sync::Arc;

use tokio::sync::mpsc;

use crate::barrier::Party;
use crate::config::BridgeConfig;
use crate::provider::{Collaborators, ProviderAClient};
use crate::status::AuthenticatorStatus;

use super::commands::{Command, Event};
use super::coordinator::Coordinator;
use super::errors::CoordinatorError;
use super::matching::matching_credential_ids;
use super::outcome::{Outcome, OutcomeSink};
use super::types::{CreateRequest, CredentialId, GetRequest};

#[derive(Debug)]
enum Message {
    Get {
        request: GetRequest,
        sink: OutcomeSink,
    },
    Create {
        request: CreateRequest,
        sink: OutcomeSink,
    },
    Cancel,
    /// A command completion, tagged with the request it belongs to
    Event { generation: u64, event: Event },
}

/// The task that owns a [`Coordinator`] and executes its commands.
///
/// Inputs from callers and completions from providers all pass through one
/// inbox, so the coordinator is only ever touched from this task.
pub struct RequestSequence {
    coordinator: Coordinator,
    collaborators: Collaborators,
    inbox: mpsc::UnboundedReceiver<Message>,
    sender: mpsc::WeakUnboundedSender<Message>,
    generation: u64,
}

impl RequestSequence {
    /// Start the sequence on the current tokio runtime.
    ///
    /// The task stops once every [`SequenceHandle`] has been dropped and no
    /// command is in flight.
    pub fn spawn(config: BridgeConfig, collaborators: Collaborators) -> SequenceHandle {
        let (sender, inbox) = mpsc::unbounded_channel();
        let handle = SequenceHandle {
            sender: sender.clone(),
            provider_a: collaborators.provider_a.clone(),
            config,
        };
        let sequence = Self {
            coordinator: Coordinator::new(config),
            collaborators,
            inbox,
            sender: sender.downgrade(),
            generation: 0,
        };
        tokio::spawn(sequence.run());
        handle
    }

    async fn run(mut self) {
        tracing::debug!("Request sequence started: {:?}", self.coordinator.config());
        while let Some(message) = self.inbox.recv().await {
            let result = match message {
                Message::Get { request, sink } => {
                    self.next_generation();
                    self.coordinator.start_get(request, sink)
                }
                Message::Create { request, sink } => {
                    self.next_generation();
                    self.coordinator.start_create(request, sink)
                }
                Message::Cancel => self.coordinator.cancel(),
                Message::Event { generation, event } if generation == self.generation => {
                    self.coordinator.handle(event)
                }
                Message::Event { event, .. } => {
                    tracing::debug!("Dropping {} from a finished request", event.name());
                    continue;
                }
            };

            match result {
                Ok(commands) => {
                    for command in commands {
                        self.execute(command);
                    }
                }
                Err(e) => tracing::error!("Coordinator error: {}", e),
            }
        }
        tracing::debug!("Request sequence stopped");
    }

    fn next_generation(&mut self) {
        // A busy coordinator rejects the request without replacing the
        // current one.
        if self.coordinator.is_idle() {
            self.generation += 1;
        }
    }

    fn execute(&self, command: Command) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let generation = self.generation;
        let post = move |event: Event| {
            if sender.send(Message::Event { generation, event }).is_err() {
                tracing::debug!("Request sequence closed before a completion arrived");
            }
        };

        let Collaborators {
            provider_a,
            provider_b,
            ui,
            validator,
        } = self.collaborators.clone();

        match command {
            Command::ValidateRpId { rp_id, origin } => {
                tokio::spawn(async move {
                    let result = validator.validate(&rp_id, &origin).await;
                    post(Event::RpIdValidated(result));
                });
            }
            Command::EnumerateProviderA { rp_id } => {
                tokio::spawn(async move {
                    let result = provider_a.enumerate(&rp_id).await.map_err(|e| {
                        tracing::error!("FIDO2 API enumeration failed: {}", e);
                        e.status()
                    });
                    post(Event::ProviderAEnumerated(result));
                });
            }
            Command::PrefetchProviderB { dispatch } => {
                tokio::spawn(async move {
                    // A prefetch cannot be cancelled by the user, so every
                    // failure is unknown.
                    let result = provider_b.prefetch(dispatch).await.map_err(|e| {
                        tracing::error!("Credential Manager prefetch failed: {}", e);
                        AuthenticatorStatus::Unknown
                    });
                    post(Event::ProviderBPrefetched(result));
                });
            }
            Command::CancelProviderB => {
                tokio::spawn(async move { provider_b.cancel().await });
            }
            Command::PresentCredentials {
                candidates,
                conditional,
            } => {
                tokio::spawn(async move {
                    let selection = ui.present_credentials(candidates, conditional).await;
                    post(Event::CredentialSelected(selection));
                });
            }
            Command::CleanupUi => {
                tokio::spawn(async move { ui.cleanup().await });
            }
            Command::GetAssertion { provider, dispatch } => {
                tokio::spawn(async move {
                    let result = match provider {
                        Party::ProviderA => {
                            provider_a.get_assertion(dispatch).await.map_err(|e| {
                                tracing::error!("FIDO2 API call resulted in error: {}", e);
                                e.status()
                            })
                        }
                        Party::ProviderB => {
                            provider_b.get_assertion(dispatch).await.map_err(|e| {
                                tracing::error!("Credential Manager getCredential failed: {}", e);
                                e.status()
                            })
                        }
                    };
                    post(Event::AssertionCompleted { provider, result });
                });
            }
            Command::MakeCredential { provider, dispatch } => {
                tokio::spawn(async move {
                    let result = match provider {
                        Party::ProviderA => {
                            provider_a.make_credential(dispatch).await.map_err(|e| {
                                tracing::error!("FIDO2 API call resulted in error: {}", e);
                                e.status()
                            })
                        }
                        Party::ProviderB => {
                            provider_b.make_credential(dispatch).await.map_err(|e| {
                                tracing::error!("Credential Manager createCredential failed: {}", e);
                                e.status()
                            })
                        }
                    };
                    post(Event::RegistrationCompleted { provider, result });
                });
            }
        }
    }
}

/// Cloneable entry point to a running [`RequestSequence`].
#[derive(Clone)]
pub struct SequenceHandle {
    sender: mpsc::UnboundedSender<Message>,
    provider_a: Arc<dyn ProviderAClient>,
    config: BridgeConfig,
}

impl SequenceHandle {
    /// Run a `get()` call to completion.
    pub async fn get(&self, request: GetRequest) -> Result<Outcome, CoordinatorError> {
        let (sink, receiver) = OutcomeSink::channel();
        self.send(Message::Get { request, sink })?;
        receiver.await.map_err(|_| CoordinatorError::Abandoned.log())
    }

    /// Run a `create()` call to completion.
    pub async fn create(&self, request: CreateRequest) -> Result<Outcome, CoordinatorError> {
        let (sink, receiver) = OutcomeSink::channel();
        self.send(Message::Create { request, sink })?;
        receiver.await.map_err(|_| CoordinatorError::Abandoned.log())
    }

    /// Cancel the outstanding request, if any.
    pub fn cancel(&self) -> Result<(), CoordinatorError> {
        self.send(Message::Cancel)
    }

    /// Whether a user-verifying platform authenticator can be used.
    ///
    /// Always true with Credential Manager; otherwise the FIDO2 API is asked
    /// and any failure counts as unavailable.
    pub async fn is_user_verifying_platform_authenticator_available(&self) -> bool {
        if self.config.cred_man_support.is_available() {
            return true;
        }
        match self
            .provider_a
            .is_user_verifying_platform_authenticator_available()
            .await
        {
            Ok(available) => available,
            Err(e) => {
                tracing::error!("FIDO2 API call failed: {}", e);
                false
            }
        }
    }

    /// The FIDO2 API's credentials for `rp_id` that appear in `allow_ids`.
    pub async fn get_matching_credential_ids(
        &self,
        rp_id: &str,
        allow_ids: &[CredentialId],
        require_third_party_payment: bool,
    ) -> Result<Vec<CredentialId>, AuthenticatorStatus> {
        let credentials = self.provider_a.enumerate(rp_id).await.map_err(|e| {
            tracing::error!("FIDO2 API enumeration failed: {}", e);
            e.status()
        })?;
        Ok(matching_credential_ids(
            &credentials,
            allow_ids,
            require_third_party_payment,
        ))
    }

    fn send(&self, message: Message) -> Result<(), CoordinatorError> {
        self.sender
            .send(message)
            .map_err(|_| CoordinatorError::SequenceClosed.log())
    }
}
