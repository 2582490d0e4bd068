use thiserror::Error;

use crate::status::{AuthenticatorStatus, translate_provider_a_error, translate_provider_b_error};

/// Failure reported by the legacy FIDO2 API: a numeric error code plus an
/// optional message that disambiguates overloaded codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("FIDO2 API error {code}: {}", .message.as_deref().unwrap_or(""))]
pub struct ProviderAError {
    pub code: i32,
    pub message: Option<String>,
}

impl ProviderAError {
    pub fn new(code: i32, message: Option<&str>) -> Self {
        Self {
            code,
            message: message.map(str::to_string),
        }
    }

    pub fn status(&self) -> AuthenticatorStatus {
        translate_provider_a_error(self.code, self.message.as_deref())
    }
}

/// Failure reported by Credential Manager, identified by its exception type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Credential Manager error {exception_type}: {message}")]
pub struct ProviderBError {
    pub exception_type: String,
    pub message: String,
}

impl ProviderBError {
    pub fn new(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception_type: exception_type.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> AuthenticatorStatus {
        translate_provider_b_error(&self.exception_type)
    }
}
