use serde::{Deserialize, Serialize};

use crate::status::AuthenticatorStatus;

/// Which provider(s) a rendezvous waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierMode {
    /// Only the legacy FIDO2 API
    OnlyProviderA,
    /// Only Credential Manager
    OnlyProviderB,
    /// Both providers in parallel
    Both,
}

impl BarrierMode {
    pub fn includes(self, party: Party) -> bool {
        matches!(
            (self, party),
            (Self::Both, _)
                | (Self::OnlyProviderA, Party::ProviderA)
                | (Self::OnlyProviderB, Party::ProviderB)
        )
    }
}

/// One of the two providers taking part in a rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The legacy FIDO2 (Play Services) API
    ProviderA,
    /// The platform Credential Manager API
    ProviderB,
}

impl Party {
    pub fn other(self) -> Self {
        match self {
            Self::ProviderA => Self::ProviderB,
            Self::ProviderB => Self::ProviderA,
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderA => write!(f, "FIDO2 API"),
            Self::ProviderB => write!(f, "Credential Manager"),
        }
    }
}

/// Progress of a single party within the current rendezvous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartyStatus {
    /// Not waited on
    #[default]
    None,
    /// Armed, no report yet
    Waiting,
    Success,
    Failure,
}

/// Which provider(s) produced a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    ProviderA,
    ProviderB,
    Both,
}

impl From<Party> for Provenance {
    fn from(party: Party) -> Self {
        match party {
            Party::ProviderA => Self::ProviderA,
            Party::ProviderB => Self::ProviderB,
        }
    }
}

/// The single terminal result of a rendezvous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The success payloads of every provider whose success counts.
    /// At least one side is always present.
    Success {
        provider_a: Option<T>,
        provider_b: Option<T>,
    },
    Failure(AuthenticatorStatus),
}

impl<T> Resolution<T> {
    pub(super) fn only(party: Party, payload: T) -> Self {
        match party {
            Party::ProviderA => Self::Success {
                provider_a: Some(payload),
                provider_b: None,
            },
            Party::ProviderB => Self::Success {
                provider_a: None,
                provider_b: Some(payload),
            },
        }
    }

    /// Which provider(s) contributed to a successful resolution.
    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            Self::Success {
                provider_a: Some(_),
                provider_b: Some(_),
            } => Some(Provenance::Both),
            Self::Success {
                provider_a: Some(_),
                provider_b: None,
            } => Some(Provenance::ProviderA),
            Self::Success {
                provider_a: None,
                provider_b: Some(_),
            } => Some(Provenance::ProviderB),
            Self::Success { .. } | Self::Failure(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
