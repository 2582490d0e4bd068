use credential_bridge::{
    AssertionResponse, CreateRequest, CredentialId, CredentialSummary, GetRequest, Mediation,
    RegistrationResponse,
};

pub const RP_ID: &str = "example.com";
pub const ORIGIN: &str = "https://example.com";

/// A passkey as a provider would enumerate it
pub fn passkey(id: u8, user: &str) -> CredentialSummary {
    CredentialSummary::discoverable(vec![id], user)
}

/// A security-key style credential that cannot be discovered without an allow-list
pub fn security_key(id: u8) -> CredentialSummary {
    CredentialSummary {
        is_discoverable: false,
        ..passkey(id, "security-key")
    }
}

pub fn get_request(mediation: Mediation) -> GetRequest {
    let mut request = GetRequest::new(RP_ID, ORIGIN, b"get-challenge".to_vec());
    request.mediation = mediation;
    request
}

pub fn create_request() -> CreateRequest {
    CreateRequest::new(
        RP_ID,
        ORIGIN,
        b"create-challenge".to_vec(),
        b"user-1".to_vec(),
        "alice@example.com",
    )
}

pub fn assertion_for(id: &CredentialId) -> AssertionResponse {
    AssertionResponse {
        credential_id: id.clone(),
        authenticator_data: vec![0x49, 0x96],
        signature: vec![0x30, 0x45],
        user_handle: Some(b"user-1".to_vec()),
        client_data_json: b"{\"from\":\"provider\"}".to_vec(),
        echo_appid_extension: false,
    }
}

pub fn registration() -> RegistrationResponse {
    RegistrationResponse {
        credential_id: CredentialId::new(vec![0xc0, 0xde]),
        attestation_object: vec![0xa3],
        client_data_json: b"{\"from\":\"provider\"}".to_vec(),
        echo_cred_props: false,
    }
}
