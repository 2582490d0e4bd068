use crate::status::AuthenticatorStatus;

use super::errors::BarrierError;
use super::types::{BarrierMode, Party, PartyStatus, Resolution};

#[derive(Debug)]
struct PartySlot<T> {
    status: PartyStatus,
    continuation: Option<T>,
    cancel_pending: Option<AuthenticatorStatus>,
}

impl<T> Default for PartySlot<T> {
    fn default() -> Self {
        Self {
            status: PartyStatus::None,
            continuation: None,
            cancel_pending: None,
        }
    }
}

impl<T> PartySlot<T> {
    fn has_reported(&self) -> bool {
        matches!(self.status, PartyStatus::Success | PartyStatus::Failure)
    }
}

/// Rendezvous of the two providers' asynchronous results.
///
/// `T` is the success payload ("continuation") each provider hands over. The
/// report methods return `Ok(None)` while the rendezvous is still waiting and
/// `Ok(Some(resolution))` exactly once, when it resolves. Reports arriving
/// after resolution are discarded.
///
/// Precedence rules:
/// - A success is never overridden by the other provider's failure.
/// - When both providers fail, the FIDO2 API's failure code is delivered.
/// - With the immediate-incognito override set, a successful resolution is
///   replaced by `NotAllowed`, still only after the normal completion signals.
#[derive(Debug)]
pub struct Barrier<T> {
    mode: Option<BarrierMode>,
    provider_a: PartySlot<T>,
    provider_b: PartySlot<T>,
    provider_a_error: Option<AuthenticatorStatus>,
    immediate_incognito: bool,
    resolved: bool,
}

impl<T> Default for Barrier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Barrier<T> {
    pub fn new() -> Self {
        Self {
            mode: None,
            provider_a: PartySlot::default(),
            provider_b: PartySlot::default(),
            provider_a_error: None,
            immediate_incognito: false,
            resolved: false,
        }
    }

    /// Clear all state from the previous rendezvous and arm the parties
    /// required by `mode`.
    ///
    /// Fails with [`BarrierError::RendezvousPending`] if the previous
    /// rendezvous was armed and has not resolved. The immediate-incognito
    /// override is kept.
    pub fn reset_and_set_wait_status(&mut self, mode: BarrierMode) -> Result<(), BarrierError> {
        if self.is_pending() {
            return Err(BarrierError::RendezvousPending);
        }

        self.provider_a = PartySlot::default();
        self.provider_b = PartySlot::default();
        self.provider_a_error = None;
        self.resolved = false;
        self.mode = Some(mode);

        if mode.includes(Party::ProviderA) {
            self.provider_a.status = PartyStatus::Waiting;
        }
        if mode.includes(Party::ProviderB) {
            self.provider_b.status = PartyStatus::Waiting;
        }

        tracing::debug!("Barrier armed: {:?}", mode);
        Ok(())
    }

    /// Make every successful resolution deliver `NotAllowed` instead.
    pub fn set_immediate_incognito(&mut self) {
        self.immediate_incognito = true;
    }

    pub fn mode(&self) -> Option<BarrierMode> {
        self.mode
    }

    pub fn status(&self, party: Party) -> PartyStatus {
        self.slot(party).status
    }

    pub fn is_cancel_pending(&self, party: Party) -> bool {
        self.slot(party).cancel_pending.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// True while armed parties may still change the outcome.
    pub fn is_pending(&self) -> bool {
        self.mode.is_some() && !self.resolved
    }

    pub fn on_provider_a_success(
        &mut self,
        continuation: T,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        self.report_success(Party::ProviderA, continuation)
    }

    pub fn on_provider_b_success(
        &mut self,
        continuation: T,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        self.report_success(Party::ProviderB, continuation)
    }

    pub fn on_provider_a_failure(
        &mut self,
        code: AuthenticatorStatus,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        self.report_failure(Party::ProviderA, code)
    }

    pub fn on_provider_b_failure(
        &mut self,
        code: AuthenticatorStatus,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        self.report_failure(Party::ProviderB, code)
    }

    /// Report that the FIDO2 API side was cancelled. `None` means `Abort`.
    pub fn on_provider_a_cancelled(
        &mut self,
        code: Option<AuthenticatorStatus>,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        self.report_cancelled(Party::ProviderA, code)
    }

    /// Report that the Credential Manager side was cancelled. `None` means `Abort`.
    pub fn on_provider_b_cancelled(
        &mut self,
        code: Option<AuthenticatorStatus>,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        self.report_cancelled(Party::ProviderB, code)
    }

    pub fn report_success(
        &mut self,
        party: Party,
        continuation: T,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        if !self.accept_report(party)? {
            return Ok(None);
        }
        self.slot_mut(party).status = PartyStatus::Success;

        let other = party.other();
        if let Some(code) = self.slot(other).cancel_pending {
            tracing::debug!("{} succeeded while {} was cancelled", party, other);
            return Ok(Some(self.resolve_failure(code)));
        }

        match self.slot(other).status {
            PartyStatus::Success => {
                let other_continuation = self.slot_mut(other).continuation.take();
                let (provider_a, provider_b) = match party {
                    Party::ProviderA => (Some(continuation), other_continuation),
                    Party::ProviderB => (other_continuation, Some(continuation)),
                };
                Ok(Some(self.resolve_success(Resolution::Success {
                    provider_a,
                    provider_b,
                })))
            }
            PartyStatus::Waiting => {
                self.slot_mut(party).continuation = Some(continuation);
                Ok(None)
            }
            PartyStatus::None | PartyStatus::Failure => {
                Ok(Some(self.resolve_success(Resolution::only(party, continuation))))
            }
        }
    }

    pub fn report_failure(
        &mut self,
        party: Party,
        code: AuthenticatorStatus,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        if !self.accept_report(party)? {
            return Ok(None);
        }
        self.slot_mut(party).status = PartyStatus::Failure;
        tracing::debug!("{} failed: {}", party, code);

        let other = party.other();
        if let Some(pending) = self.slot(other).cancel_pending {
            return Ok(Some(self.resolve_failure(pending)));
        }

        match self.slot(other).status {
            PartyStatus::Success => match self.slot_mut(other).continuation.take() {
                Some(continuation) => {
                    Ok(Some(self.resolve_success(Resolution::only(other, continuation))))
                }
                None => Ok(Some(self.resolve_failure(code))),
            },
            PartyStatus::Waiting => {
                if party == Party::ProviderA {
                    self.provider_a_error = Some(code);
                }
                Ok(None)
            }
            PartyStatus::None => Ok(Some(self.resolve_failure(code))),
            PartyStatus::Failure => {
                // The FIDO2 API's failure is privileged over Credential Manager's.
                let code = match party {
                    Party::ProviderA => code,
                    Party::ProviderB => self.provider_a_error.unwrap_or(code),
                };
                Ok(Some(self.resolve_failure(code)))
            }
        }
    }

    pub fn report_cancelled(
        &mut self,
        party: Party,
        code: Option<AuthenticatorStatus>,
    ) -> Result<Option<Resolution<T>>, BarrierError> {
        if !self.accept_report(party)? {
            return Ok(None);
        }
        let code = code.unwrap_or(AuthenticatorStatus::Abort);
        let other = party.other();
        let other_slot = self.slot(other);

        if other_slot.status == PartyStatus::None
            || other_slot.cancel_pending.is_some()
            || other_slot.has_reported()
        {
            self.slot_mut(other).cancel_pending = None;
            tracing::debug!("{} cancelled, nothing left to wait for", party);
            return Ok(Some(self.resolve_failure(code)));
        }

        tracing::debug!("{} cancelled, waiting for {}", party, other);
        self.slot_mut(party).cancel_pending = Some(code);
        Ok(None)
    }

    /// Validate a report for `party`. Returns `Ok(false)` when the
    /// rendezvous has already resolved and the report must be discarded.
    fn accept_report(&self, party: Party) -> Result<bool, BarrierError> {
        let slot = self.slot(party);
        if slot.status == PartyStatus::None {
            tracing::error!("Report for unarmed party {}", party);
            return Err(BarrierError::PartyNotArmed(party));
        }
        if self.resolved {
            tracing::debug!("Discarding late report from {}", party);
            return Ok(false);
        }
        if slot.status != PartyStatus::Waiting || slot.cancel_pending.is_some() {
            tracing::error!("Duplicate report from {}", party);
            return Err(BarrierError::DuplicateReport(party));
        }
        Ok(true)
    }

    fn resolve_success(&mut self, resolution: Resolution<T>) -> Resolution<T> {
        self.resolved = true;
        if self.immediate_incognito {
            tracing::debug!("Immediate incognito request: reporting no credentials");
            return Resolution::Failure(AuthenticatorStatus::NotAllowed);
        }
        resolution
    }

    fn resolve_failure(&mut self, code: AuthenticatorStatus) -> Resolution<T> {
        self.resolved = true;
        Resolution::Failure(code)
    }

    fn slot(&self, party: Party) -> &PartySlot<T> {
        match party {
            Party::ProviderA => &self.provider_a,
            Party::ProviderB => &self.provider_b,
        }
    }

    fn slot_mut(&mut self, party: Party) -> &mut PartySlot<T> {
        match party {
            Party::ProviderA => &mut self.provider_a,
            Party::ProviderB => &mut self.provider_b,
        }
    }
}
