use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credential_bridge::{
    BridgeConfig, Collaborators, CreateRequest, CredentialSummary, GetRequest, Mediation, Outcome,
    RequestSequence,
};

mod platform;

use platform::{AccountPicker, AllowAll, CredentialManager, LocalFido2};

const RP_ID: &str = "example.com";
const ORIGIN: &str = "https://login.example.com";

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success { provenance, .. } => format!("success via {provenance:?}"),
        Outcome::Cancel => "cancelled".to_string(),
        Outcome::Error(status) => format!("failed with {status}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,credential_bridge=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BridgeConfig::from_env();
    tracing::info!("Starting with {:?}", config);

    let picker = Arc::new(AccountPicker::default());
    let collaborators = Collaborators {
        provider_a: Arc::new(LocalFido2 {
            credentials: vec![CredentialSummary::discoverable(vec![1; 16], "alice")],
        }),
        provider_b: Arc::new(CredentialManager {
            credentials: vec![CredentialSummary::discoverable(vec![2; 16], "alice@sync")],
        }),
        ui: picker.clone(),
        validator: Arc::new(AllowAll),
    };
    let handle = RequestSequence::spawn(config, collaborators);

    tracing::info!(
        "Platform authenticator available: {}",
        handle
            .is_user_verifying_platform_authenticator_available()
            .await
    );

    // Autofill sign-in
    let mut request = GetRequest::new(RP_ID, ORIGIN, b"demo-challenge-1".to_vec());
    request.mediation = Mediation::Conditional;
    let outcome = handle.get(request).await?;
    tracing::info!("Conditional sign-in {}", describe(&outcome));

    // Passkey registration
    let request = CreateRequest::new(
        RP_ID,
        ORIGIN,
        b"demo-challenge-2".to_vec(),
        b"alice".to_vec(),
        "alice@example.com",
    );
    let outcome = handle.create(request).await?;
    tracing::info!("Registration {}", describe(&outcome));

    // The page aborts while the picker is open
    picker.hold_open.store(true, Ordering::SeqCst);
    let mut request = GetRequest::new(RP_ID, ORIGIN, b"demo-challenge-3".to_vec());
    request.mediation = Mediation::Conditional;
    let pending = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.get(request).await })
    };
    picker.shown.notified().await;
    handle.cancel()?;
    let outcome = pending.await??;
    tracing::info!("Aborted sign-in {}", describe(&outcome));

    Ok(())
}
