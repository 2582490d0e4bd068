//! Runtime configuration for the credential bridge
//!
//! Platform capability and feature switches are read once from the
//! environment into a [`BridgeConfig`] value which is then handed to each
//! coordinator, so tests and embedders can vary them freely.

use std::env;

use serde::{Deserialize, Serialize};

/// How much of the Credential Manager (Provider B) API the platform offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredManSupport {
    /// Credential Manager is unavailable; everything goes to the FIDO2 API
    #[default]
    Unavailable,
    /// Both APIs run side by side and their results are merged
    Parallel,
    /// Credential Manager handles every request it is able to
    Full,
}

impl CredManSupport {
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub cred_man_support: CredManSupport,
    /// Show the selection UI for modal requests without an allow-list
    pub touch_to_fill_selection: bool,
    /// Build payment client data for assertions carrying payment options
    pub secure_payment_confirmation: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cred_man_support: CredManSupport::Unavailable,
            touch_to_fill_selection: false,
            secure_payment_confirmation: true,
        }
    }
}

impl BridgeConfig {
    pub fn new(cred_man_support: CredManSupport) -> Self {
        Self {
            cred_man_support,
            ..Self::default()
        }
    }

    /// Read the configuration from `BRIDGE_*` environment variables.
    ///
    /// Unset variables take their defaults; invalid values are logged and
    /// replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cred_man_support: parse_support(env::var("BRIDGE_CRED_MAN_SUPPORT").ok()),
            touch_to_fill_selection: parse_flag(
                "BRIDGE_TOUCH_TO_FILL",
                env::var("BRIDGE_TOUCH_TO_FILL").ok(),
                defaults.touch_to_fill_selection,
            ),
            secure_payment_confirmation: parse_flag(
                "BRIDGE_SECURE_PAYMENT_CONFIRMATION",
                env::var("BRIDGE_SECURE_PAYMENT_CONFIRMATION").ok(),
                defaults.secure_payment_confirmation,
            ),
        }
    }
}

fn parse_support(value: Option<String>) -> CredManSupport {
    match value {
        None => CredManSupport::Unavailable,
        Some(v) => match v.to_lowercase().as_str() {
            "none" | "unavailable" => CredManSupport::Unavailable,
            "parallel" => CredManSupport::Parallel,
            "full" => CredManSupport::Full,
            invalid => {
                tracing::warn!(
                    "Invalid BRIDGE_CRED_MAN_SUPPORT: {}. Using default 'none'",
                    invalid
                );
                CredManSupport::Unavailable
            }
        },
    }
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> bool {
    value.map_or(default, |v| match v.to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        invalid => {
            tracing::warn!("Invalid {}: {}. Using default '{}'", name, invalid, default);
            default
        }
    })
}
