use credential_bridge::{
    AuthenticatorStatus, BridgeConfig, CredManSupport, CredentialId, PROVIDER_A_SECURITY_ERR,
    ProviderAError, RequestSequence, SequenceHandle,
};

use crate::common::{
    MockProviderA, MockProviderB, MockSet, MockUi, RP_ID, passkey, security_key,
};

fn spawn(support: CredManSupport, provider_a: MockProviderA) -> (MockSet, SequenceHandle) {
    let mocks = MockSet::new(provider_a, MockProviderB::default(), MockUi::default());
    let handle = RequestSequence::spawn(BridgeConfig::new(support), mocks.collaborators());
    (mocks, handle)
}

#[tokio::test]
async fn test_uvpaa_with_credential_manager() {
    // Given a FIDO2 API that would say no
    let provider_a = MockProviderA::default();
    *provider_a.uvpaa.lock().unwrap() = Some(Ok(false));

    // When Credential Manager is available
    let (_mocks, handle) = spawn(CredManSupport::Parallel, provider_a);

    // Then a platform authenticator is reported regardless
    assert!(
        handle
            .is_user_verifying_platform_authenticator_available()
            .await
    );
}

#[tokio::test]
async fn test_uvpaa_asks_provider_a() {
    let provider_a = MockProviderA::default();
    *provider_a.uvpaa.lock().unwrap() = Some(Ok(false));
    let (_mocks, handle) = spawn(CredManSupport::Unavailable, provider_a);

    assert!(
        !handle
            .is_user_verifying_platform_authenticator_available()
            .await
    );
}

#[tokio::test]
async fn test_uvpaa_failure_counts_as_unavailable() {
    let provider_a = MockProviderA::default();
    *provider_a.uvpaa.lock().unwrap() = Some(Err(ProviderAError::new(
        PROVIDER_A_SECURITY_ERR,
        None,
    )));
    let (_mocks, handle) = spawn(CredManSupport::Unavailable, provider_a);

    assert!(
        !handle
            .is_user_verifying_platform_authenticator_available()
            .await
    );
}

#[tokio::test]
async fn test_matching_credential_ids() {
    // Given two local credentials, one of them a payment credential
    let mut payment = passkey(2, "alice");
    payment.is_payment = true;
    let (_mocks, handle) = spawn(
        CredManSupport::Unavailable,
        MockProviderA::with_credentials(vec![security_key(1), payment]),
    );
    let allow = vec![
        CredentialId::new(vec![1]),
        CredentialId::new(vec![2]),
        CredentialId::new(vec![9]),
    ];

    // When matched with and without the payment requirement
    let all = handle
        .get_matching_credential_ids(RP_ID, &allow, false)
        .await
        .unwrap();
    let payment_only = handle
        .get_matching_credential_ids(RP_ID, &allow, true)
        .await
        .unwrap();

    // Then only enumerated, allow-listed credentials come back
    assert_eq!(
        all,
        vec![CredentialId::new(vec![1]), CredentialId::new(vec![2])]
    );
    assert_eq!(payment_only, vec![CredentialId::new(vec![2])]);
}

#[tokio::test]
async fn test_matching_credential_ids_enumeration_failure() {
    let provider_a = MockProviderA::default();
    *provider_a.enumerate_error.lock().unwrap() =
        Some(ProviderAError::new(PROVIDER_A_SECURITY_ERR, None));
    let (_mocks, handle) = spawn(CredManSupport::Unavailable, provider_a);

    let result = handle
        .get_matching_credential_ids(RP_ID, &[CredentialId::new(vec![1])], false)
        .await;

    assert_eq!(result, Err(AuthenticatorStatus::InvalidDomain));
}
