//! Page-visible status codes and translation of provider-specific failures.

use serde::{Deserialize, Serialize};

/// Status values surfaced to the calling page.
///
/// Every terminal failure of a request is reported as exactly one of these
/// values. The discriminants follow the authenticator status numbering used
/// by the renderer so they can be passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AuthenticatorStatus {
    /// A provider returned an unexpected or unparseable result
    Unknown = 1,
    /// The user or a provider declined, or the incognito override fired
    NotAllowed = 2,
    /// The relying party ID failed origin validation
    InvalidDomain = 3,
    /// An excluded credential already exists on the device
    CredentialExcluded = 5,
    /// None of the requested algorithms are supported
    AlgorithmUnsupported = 7,
    /// The provider rejected the request parameters
    NotSupported = 12,
    /// Request required an allow-list but none was usable
    EmptyAllowCredentials = 13,
    /// User verification was required but the device has no screen lock
    UserVerificationUnsupported = 15,
    /// The request was cancelled by the caller
    Abort = 20,
}

impl AuthenticatorStatus {
    /// Alias used by the error taxonomy for origin validation failures.
    pub const SECURITY_ERROR: Self = Self::InvalidDomain;

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for AuthenticatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotAllowed => "NotAllowedError",
            Self::InvalidDomain => "SecurityError",
            Self::CredentialExcluded => "CredentialExcluded",
            Self::AlgorithmUnsupported => "AlgorithmUnsupported",
            Self::NotSupported => "NotSupportedError",
            Self::EmptyAllowCredentials => "EmptyAllowCredentials",
            Self::UserVerificationUnsupported => "UserVerificationUnsupported",
            Self::Abort => "AbortError",
            Self::Unknown => "UnknownError",
        };
        write!(f, "{name} ({})", self.code())
    }
}

// Legacy FIDO2 API error codes.
pub const PROVIDER_A_NOT_SUPPORTED_ERR: i32 = 9;
pub const PROVIDER_A_INVALID_STATE_ERR: i32 = 11;
pub const PROVIDER_A_SECURITY_ERR: i32 = 18;
pub const PROVIDER_A_TIMEOUT_ERR: i32 = 23;
pub const PROVIDER_A_ENCODING_ERR: i32 = 27;
pub const PROVIDER_A_UNKNOWN_ERR: i32 = 28;
pub const PROVIDER_A_CONSTRAINT_ERR: i32 = 29;
pub const PROVIDER_A_DATA_ERR: i32 = 30;
pub const PROVIDER_A_NOT_ALLOWED_ERR: i32 = 35;

const NON_EMPTY_ALLOWLIST_ERROR_MSG: &str = "Authentication request must have non-empty allowList";
const NON_VALID_ALLOWED_CREDENTIALS_ERROR_MSG: &str =
    "Request doesn't have a valid list of allowed credentials.";
const NO_SCREENLOCK_ERROR_MSG: &str = "The device is not secured with any screen lock";
const CREDENTIAL_EXISTS_ERROR_MSG: &str =
    "One of the excluded credentials exists on the local device";
const LOW_LEVEL_ERROR_MSG: &str = "Low level error 0x6a80";

const PROVIDER_B_USER_CANCELED_SUFFIX: &str = "TYPE_USER_CANCELED";

/// Translate a legacy provider error (numeric code plus optional message)
/// into the status reported to the page.
///
/// Several legacy codes are overloaded and only distinguishable by their
/// message text, so the message is matched exactly.
pub fn translate_provider_a_error(code: i32, message: Option<&str>) -> AuthenticatorStatus {
    match code {
        PROVIDER_A_SECURITY_ERR => AuthenticatorStatus::InvalidDomain,
        PROVIDER_A_TIMEOUT_ERR => AuthenticatorStatus::NotAllowed,
        PROVIDER_A_ENCODING_ERR => AuthenticatorStatus::Unknown,
        PROVIDER_A_NOT_ALLOWED_ERR => match message {
            Some(NON_EMPTY_ALLOWLIST_ERROR_MSG) | Some(NON_VALID_ALLOWED_CREDENTIALS_ERROR_MSG) => {
                AuthenticatorStatus::EmptyAllowCredentials
            }
            _ => AuthenticatorStatus::NotAllowed,
        },
        PROVIDER_A_DATA_ERR | PROVIDER_A_NOT_SUPPORTED_ERR => AuthenticatorStatus::NotSupported,
        PROVIDER_A_CONSTRAINT_ERR => match message {
            Some(NO_SCREENLOCK_ERROR_MSG) => AuthenticatorStatus::UserVerificationUnsupported,
            _ => AuthenticatorStatus::Unknown,
        },
        PROVIDER_A_INVALID_STATE_ERR | PROVIDER_A_UNKNOWN_ERR => match message {
            Some(CREDENTIAL_EXISTS_ERROR_MSG) if code == PROVIDER_A_INVALID_STATE_ERR => {
                AuthenticatorStatus::CredentialExcluded
            }
            Some(LOW_LEVEL_ERROR_MSG) => AuthenticatorStatus::NotAllowed,
            _ => AuthenticatorStatus::Unknown,
        },
        _ => AuthenticatorStatus::Unknown,
    }
}

/// Translate a Credential Manager exception type into a page status.
///
/// Only an explicit user cancellation is distinguishable; everything else
/// (unknown, interrupted, no options) is reported as `Unknown`.
pub fn translate_provider_b_error(exception_type: &str) -> AuthenticatorStatus {
    if exception_type.ends_with(PROVIDER_B_USER_CANCELED_SUFFIX) {
        AuthenticatorStatus::NotAllowed
    } else {
        AuthenticatorStatus::Unknown
    }
}
