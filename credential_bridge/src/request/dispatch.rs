//! Provider selection for incoming requests.

use crate::barrier::{BarrierMode, Party};
use crate::config::{BridgeConfig, CredManSupport};
use crate::status::AuthenticatorStatus;

use super::types::{CreateRequest, GetRequest, Mediation, ResidentKeyRequirement};

/// What to do with a `get()` request once its RP ID has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetRoute {
    /// Send the assertion request straight to one provider.
    Dispatch(Party),
    /// Enumerate credentials from the provider(s) in `mode` and let the user
    /// pick one.
    Enumerate(BarrierMode),
    /// Look for a non-discoverable local credential in the allow-list before
    /// choosing a provider.
    ProbeLocalCredentials,
    /// Fail the request without contacting any provider.
    Reject(AuthenticatorStatus),
}

fn enumeration_mode(support: CredManSupport) -> BarrierMode {
    match support {
        CredManSupport::Unavailable => BarrierMode::OnlyProviderA,
        CredManSupport::Parallel => BarrierMode::Both,
        CredManSupport::Full => BarrierMode::OnlyProviderB,
    }
}

pub fn select_get_route(config: &BridgeConfig, request: &GetRequest) -> GetRoute {
    // Payment assertions only exist on the FIDO2 API.
    if request.payment.is_some() {
        return GetRoute::Dispatch(Party::ProviderA);
    }

    let has_allow_list = request.has_allow_list();
    match request.mediation {
        Mediation::Immediate if has_allow_list => {
            GetRoute::Reject(AuthenticatorStatus::NotAllowed)
        }
        Mediation::Immediate => GetRoute::Enumerate(enumeration_mode(config.cred_man_support)),
        Mediation::Conditional => GetRoute::Enumerate(enumeration_mode(config.cred_man_support)),
        Mediation::Modal => match config.cred_man_support {
            CredManSupport::Unavailable if config.touch_to_fill_selection && !has_allow_list => {
                GetRoute::Enumerate(BarrierMode::OnlyProviderA)
            }
            CredManSupport::Unavailable => GetRoute::Dispatch(Party::ProviderA),
            CredManSupport::Parallel | CredManSupport::Full if has_allow_list => {
                GetRoute::ProbeLocalCredentials
            }
            CredManSupport::Parallel => GetRoute::Enumerate(BarrierMode::Both),
            CredManSupport::Full => GetRoute::Dispatch(Party::ProviderB),
        },
    }
}

pub fn select_create_route(config: &BridgeConfig, request: &CreateRequest) -> Party {
    if !config.cred_man_support.is_available()
        || request.is_payment_credential_creation
        || request.resident_key == ResidentKeyRequirement::Discouraged
    {
        Party::ProviderA
    } else {
        Party::ProviderB
    }
}
