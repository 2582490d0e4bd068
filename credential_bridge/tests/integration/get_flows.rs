use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use credential_bridge::{
    AuthenticatorStatus, BridgeConfig, CredManSupport, CredentialId, Mediation, Outcome,
    PROVIDER_A_CONSTRAINT_ERR, PROVIDER_A_NOT_ALLOWED_ERR, Party, ProviderAError, Provenance,
    RequestSequence, Selection, SequenceHandle,
};

use crate::common::{
    Gate, MockProviderA, MockProviderB, MockSet, MockUi, MockValidator, get_request, passkey,
    security_key,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn spawn(support: CredManSupport, mocks: &MockSet) -> SequenceHandle {
    RequestSequence::spawn(BridgeConfig::new(support), mocks.collaborators())
}

async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}

fn select(id: u8) -> Selection {
    Selection::Credential(CredentialId::new(vec![id]))
}

#[tokio::test]
async fn test_modal_request_goes_to_provider_a() {
    // Given a device without Credential Manager
    let mocks = MockSet::new(
        MockProviderA::default(),
        MockProviderB::default(),
        MockUi::default(),
    );
    let handle = spawn(CredManSupport::Unavailable, &mocks);

    // When a modal request is made
    let outcome = handle.get(get_request(Mediation::Modal)).await.unwrap();

    // Then the FIDO2 API answers it without any selection UI
    let Outcome::Success { provenance, .. } = &outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(*provenance, Provenance::ProviderA);
    assert_eq!(mocks.provider_a.enumerations.load(Ordering::SeqCst), 0);
    assert!(mocks.ui.presented.lock().unwrap().is_empty());

    let dispatched = mocks.provider_a.dispatched.lock().unwrap();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].client_data_hash, None);
}

#[tokio::test]
async fn test_conditional_request_merges_both_providers() {
    // Given credentials on both providers
    let mocks = MockSet::new(
        MockProviderA::with_credentials(vec![passkey(1, "alice"), security_key(2)]),
        MockProviderB::with_credentials(vec![passkey(3, "bob")]),
        MockUi::selecting(vec![select(3)]),
    );
    let handle = spawn(CredManSupport::Parallel, &mocks);

    // When a conditional request picks the Credential Manager passkey
    let outcome = handle
        .get(get_request(Mediation::Conditional))
        .await
        .unwrap();

    // Then Credential Manager produced the assertion with bridge-built client data
    let response = outcome.assertion().expect("assertion");
    assert_eq!(response.credential_id, CredentialId::new(vec![3]));
    assert!(String::from_utf8_lossy(&response.client_data_json).contains("webauthn.get"));
    assert!(matches!(
        outcome,
        Outcome::Success {
            provenance: Provenance::ProviderB,
            ..
        }
    ));

    // And the selection UI offered the union of discoverable credentials
    {
        let presented = mocks.ui.presented.lock().unwrap();
        assert_eq!(presented.len(), 1);
        let (candidates, conditional) = &presented[0];
        assert!(*conditional);
        let offered: Vec<(CredentialId, Party)> = candidates
            .iter()
            .map(|candidate| (candidate.credential.id.clone(), candidate.source))
            .collect();
        assert_eq!(
            offered,
            vec![
                (CredentialId::new(vec![1]), Party::ProviderA),
                (CredentialId::new(vec![3]), Party::ProviderB),
            ]
        );
    }

    // And the UI is torn down once
    eventually(|| mocks.ui.cleanups.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn test_cancel_during_enumeration_resolves_after_enumeration() {
    // Given an enumeration that blocks until released
    let gate = Arc::new(Gate::default());
    let mocks = MockSet::new(
        MockProviderA {
            enumerate_gate: Some(gate.clone()),
            ..MockProviderA::with_credentials(vec![passkey(1, "alice")])
        },
        MockProviderB::default(),
        MockUi::default(),
    );
    let handle = spawn(CredManSupport::Unavailable, &mocks);

    let request = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.get(get_request(Mediation::Conditional)).await })
    };
    gate.wait_entered().await;

    // When the request is cancelled and enumeration then completes
    handle.cancel().unwrap();
    gate.release();

    // Then the outcome is a cancellation and no UI was shown
    let outcome = tokio::time::timeout(TIMEOUT, request)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, Outcome::Cancel);
    assert!(mocks.ui.presented.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_during_parallel_enumeration_signals_credential_manager() {
    let gate = Arc::new(Gate::default());
    let mocks = MockSet::new(
        MockProviderA {
            enumerate_gate: Some(gate.clone()),
            ..MockProviderA::default()
        },
        MockProviderB::blocking_prefetch(),
        MockUi::default(),
    );
    let handle = spawn(CredManSupport::Parallel, &mocks);

    let request = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.get(get_request(Mediation::Conditional)).await })
    };
    gate.wait_entered().await;

    handle.cancel().unwrap();
    eventually(|| mocks.provider_b.cancels.load(Ordering::SeqCst) == 1).await;
    gate.release();

    let outcome = tokio::time::timeout(TIMEOUT, request)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, Outcome::Cancel);
}

#[tokio::test]
async fn test_cancel_during_selection() {
    // Given a selection UI the user never answers
    let mocks = MockSet::new(
        MockProviderA::with_credentials(vec![passkey(1, "alice")]),
        MockProviderB::default(),
        MockUi::default(),
    );
    let handle = spawn(CredManSupport::Unavailable, &mocks);

    let request = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.get(get_request(Mediation::Conditional)).await })
    };
    mocks.ui.wait_shown().await;

    // When cancelled
    handle.cancel().unwrap();

    // Then the request resolves as cancelled and the UI is cleaned up
    let outcome = tokio::time::timeout(TIMEOUT, request)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, Outcome::Cancel);
    eventually(|| mocks.ui.cleanups.load(Ordering::SeqCst) == 1).await;

    // And the dismissal the UI reports afterwards does not leak into the next request
    let outcome = handle.get(get_request(Mediation::Modal)).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_second_request_is_rejected_while_busy() {
    let gate = Arc::new(Gate::default());
    let mocks = MockSet::new(
        MockProviderA {
            enumerate_gate: Some(gate.clone()),
            ..MockProviderA::with_credentials(vec![passkey(1, "alice")])
        },
        MockProviderB::default(),
        MockUi::selecting(vec![select(1)]),
    );
    let handle = spawn(CredManSupport::Unavailable, &mocks);

    // Given a request waiting for enumeration
    let first = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.get(get_request(Mediation::Conditional)).await })
    };
    gate.wait_entered().await;

    // When a second request arrives
    let second = handle.get(get_request(Mediation::Modal)).await.unwrap();

    // Then it is rejected without disturbing the first
    assert_eq!(second, Outcome::Error(AuthenticatorStatus::NotAllowed));
    gate.release();
    let first = tokio::time::timeout(TIMEOUT, first)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(first.is_success());
}

#[tokio::test]
async fn test_conditional_request_retries_after_user_denial() {
    // Given a FIDO2 API that declines the first assertion
    let provider_a = MockProviderA::with_credentials(vec![passkey(1, "alice"), passkey(2, "bob")]);
    provider_a
        .assertion_errors
        .lock()
        .unwrap()
        .push_back(ProviderAError::new(PROVIDER_A_NOT_ALLOWED_ERR, None));
    let mocks = MockSet::new(
        provider_a,
        MockProviderB::default(),
        MockUi::selecting(vec![select(1), select(2)]),
    );
    let handle = spawn(CredManSupport::Unavailable, &mocks);

    // When the conditional request runs
    let outcome = handle
        .get(get_request(Mediation::Conditional))
        .await
        .unwrap();

    // Then the credentials were offered again and the second pick succeeded
    assert_eq!(
        outcome.assertion().map(|response| response.credential_id.clone()),
        Some(CredentialId::new(vec![2]))
    );
    assert_eq!(mocks.ui.presented.lock().unwrap().len(), 2);
    assert_eq!(mocks.provider_a.dispatched.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_provider_a_errors_are_translated() {
    let provider_a = MockProviderA::default();
    provider_a
        .assertion_errors
        .lock()
        .unwrap()
        .push_back(ProviderAError::new(
            PROVIDER_A_CONSTRAINT_ERR,
            Some("The device is not secured with any screen lock"),
        ));
    let mocks = MockSet::new(provider_a, MockProviderB::default(), MockUi::default());
    let handle = spawn(CredManSupport::Unavailable, &mocks);

    let outcome = handle.get(get_request(Mediation::Modal)).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Error(AuthenticatorStatus::UserVerificationUnsupported)
    );
}

#[tokio::test]
async fn test_rp_id_validation_failure() {
    let mocks = MockSet {
        validator: Arc::new(MockValidator {
            failure: Some(AuthenticatorStatus::SECURITY_ERROR),
        }),
        ..MockSet::new(
            MockProviderA::default(),
            MockProviderB::default(),
            MockUi::default(),
        )
    };
    let handle = spawn(CredManSupport::Full, &mocks);

    let outcome = handle.get(get_request(Mediation::Modal)).await.unwrap();

    assert_eq!(outcome, Outcome::Error(AuthenticatorStatus::InvalidDomain));
    assert!(mocks.provider_b.dispatched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_allow_listed_security_key_stays_on_provider_a() {
    // Given Credential Manager fully available and a local security key
    let mocks = MockSet::new(
        MockProviderA::with_credentials(vec![security_key(7)]),
        MockProviderB::default(),
        MockUi::default(),
    );
    let handle = spawn(CredManSupport::Full, &mocks);

    // When a modal request names that key
    let mut request = get_request(Mediation::Modal);
    request.allow_credentials = vec![CredentialId::new(vec![7])];
    let outcome = handle.get(request).await.unwrap();

    // Then the FIDO2 API serves it
    assert!(matches!(
        outcome,
        Outcome::Success {
            provenance: Provenance::ProviderA,
            ..
        }
    ));
    assert!(mocks.provider_b.dispatched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_full_mode_modal_request_goes_to_credential_manager() {
    let mocks = MockSet::new(
        MockProviderA::default(),
        MockProviderB::default(),
        MockUi::default(),
    );
    let handle = spawn(CredManSupport::Full, &mocks);

    let outcome = handle.get(get_request(Mediation::Modal)).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::Success {
            provenance: Provenance::ProviderB,
            ..
        }
    ));
    let dispatched = mocks.provider_b.dispatched.lock().unwrap();
    assert!(dispatched[0].client_data_hash.is_some());
}
