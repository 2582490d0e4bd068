//! Client data JSON built on the bridge side, for providers that expect the
//! caller to supply the client data hash.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use super::types::PaymentOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataRequestType {
    WebAuthnGet,
    WebAuthnCreate,
    PaymentGet,
}

impl ClientDataRequestType {
    fn as_str(self) -> &'static str {
        match self {
            Self::WebAuthnGet => "webauthn.get",
            Self::WebAuthnCreate => "webauthn.create",
            Self::PaymentGet => "payment.get",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientDataError {
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Payment client data requires payment options")]
    MissingPaymentOptions,

    #[error("Serialization error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for ClientDataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Serialized client data JSON and its SHA-256 hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientData {
    pub json: String,
    pub hash: [u8; 32],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientDataJson<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    challenge: String,
    origin: String,
    cross_origin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment: Option<PaymentJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentJson<'a> {
    rp_id: &'a str,
    top_origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payee_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payee_origin: Option<String>,
    total: PaymentTotal<'a>,
    instrument: PaymentInstrument<'a>,
}

#[derive(Serialize)]
struct PaymentTotal<'a> {
    value: &'a str,
    currency: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentInstrument<'a> {
    icon: &'a str,
    display_name: &'a str,
}

/// Serialize an origin the way it appears in client data: scheme, host and
/// non-default port only.
pub fn serialize_origin(origin: &str) -> Result<String, ClientDataError> {
    let url = Url::parse(origin).map_err(|e| ClientDataError::InvalidOrigin(e.to_string()))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(ClientDataError::InvalidOrigin(url.to_string()));
    }
    Ok(origin.ascii_serialization())
}

/// Build the client data JSON for a request and hash it.
pub fn build_client_data(
    request_type: ClientDataRequestType,
    origin: &str,
    top_origin: Option<&str>,
    challenge: &[u8],
    is_cross_origin: bool,
    rp_id: &str,
    payment: Option<&PaymentOptions>,
) -> Result<ClientData, ClientDataError> {
    let origin = serialize_origin(origin)?;
    let top_origin = top_origin.map(serialize_origin).transpose()?;

    let payment = match request_type {
        ClientDataRequestType::PaymentGet => {
            let options = payment.ok_or(ClientDataError::MissingPaymentOptions)?;
            Some(PaymentJson {
                rp_id,
                top_origin: top_origin.clone().unwrap_or_else(|| origin.clone()),
                payee_name: options.payee_name.as_deref(),
                payee_origin: options
                    .payee_origin
                    .as_deref()
                    .map(serialize_origin)
                    .transpose()?,
                total: PaymentTotal {
                    value: &options.total,
                    currency: &options.currency,
                },
                instrument: PaymentInstrument {
                    icon: &options.instrument_icon,
                    display_name: &options.instrument_display_name,
                },
            })
        }
        ClientDataRequestType::WebAuthnGet | ClientDataRequestType::WebAuthnCreate => None,
    };

    let json = serde_json::to_string(&ClientDataJson {
        kind: request_type.as_str(),
        challenge: URL_SAFE_NO_PAD.encode(challenge),
        origin,
        cross_origin: is_cross_origin,
        top_origin: if is_cross_origin { top_origin } else { None },
        payment,
    })?;

    let hash: [u8; 32] = Sha256::digest(json.as_bytes()).into();
    Ok(ClientData { json, hash })
}
