use credential_bridge::{
    AuthenticatorStatus, BridgeConfig, CredManSupport, Outcome, PROVIDER_A_INVALID_STATE_ERR,
    ProviderAError, Provenance, RequestSequence, ResidentKeyRequirement,
};

use crate::common::{MockProviderA, MockProviderB, MockSet, MockUi, create_request};

fn mocks(provider_a: MockProviderA) -> MockSet {
    MockSet::new(provider_a, MockProviderB::default(), MockUi::default())
}

#[tokio::test]
async fn test_create_with_credential_manager() {
    // Given Credential Manager and a request asking for credProps
    let mocks = mocks(MockProviderA::default());
    let handle = RequestSequence::spawn(
        BridgeConfig::new(CredManSupport::Full),
        mocks.collaborators(),
    );
    let mut request = create_request();
    request.cred_props = true;

    // When the credential is created
    let outcome = handle.create(request).await.unwrap();

    // Then Credential Manager made it, with client data built by the bridge
    let Outcome::Success { provenance, .. } = &outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(*provenance, Provenance::ProviderB);
    let response = outcome.registration().expect("registration");
    let client_data = String::from_utf8(response.client_data_json.clone()).unwrap();
    assert!(client_data.starts_with(r#"{"type":"webauthn.create""#));
    assert!(response.echo_cred_props);

    let created = mocks.provider_b.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert!(created[0].client_data_hash.is_some());
    assert!(mocks.provider_a.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_non_discoverable_stays_on_provider_a() {
    let mocks = mocks(MockProviderA::default());
    let handle = RequestSequence::spawn(
        BridgeConfig::new(CredManSupport::Full),
        mocks.collaborators(),
    );
    let mut request = create_request();
    request.resident_key = ResidentKeyRequirement::Discouraged;

    let outcome = handle.create(request).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::Success {
            provenance: Provenance::ProviderA,
            ..
        }
    ));
    let created = mocks.provider_a.created.lock().unwrap();
    assert_eq!(created[0].client_data_hash, None);
}

#[tokio::test]
async fn test_create_reports_excluded_credential() {
    // Given a FIDO2 API that already holds an excluded credential
    let provider_a = MockProviderA::default();
    *provider_a.registration_error.lock().unwrap() = Some(ProviderAError::new(
        PROVIDER_A_INVALID_STATE_ERR,
        Some("One of the excluded credentials exists on the local device"),
    ));
    let mocks = mocks(provider_a);
    let handle = RequestSequence::spawn(
        BridgeConfig::new(CredManSupport::Unavailable),
        mocks.collaborators(),
    );

    // When a credential is created
    let outcome = handle.create(create_request()).await.unwrap();

    // Then the page learns the credential is excluded
    assert_eq!(
        outcome,
        Outcome::Error(AuthenticatorStatus::CredentialExcluded)
    );
}

#[tokio::test]
async fn test_payment_credential_creation_uses_provider_a() {
    let mocks = mocks(MockProviderA::default());
    let handle = RequestSequence::spawn(
        BridgeConfig::new(CredManSupport::Parallel),
        mocks.collaborators(),
    );
    let mut request = create_request();
    request.is_payment_credential_creation = true;

    let outcome = handle.create(request).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(mocks.provider_a.created.lock().unwrap().len(), 1);
    assert!(mocks.provider_b.created.lock().unwrap().is_empty());
}
