use super::types::{CredentialId, CredentialSummary};

/// IDs of the enumerated credentials that appear in `allow_ids`, in
/// enumeration order. With `require_third_party_payment` only payment
/// credentials qualify.
pub fn matching_credential_ids(
    credentials: &[CredentialSummary],
    allow_ids: &[CredentialId],
    require_third_party_payment: bool,
) -> Vec<CredentialId> {
    credentials
        .iter()
        .filter(|credential| !require_third_party_payment || credential.is_payment)
        .filter(|credential| allow_ids.contains(&credential.id))
        .map(|credential| credential.id.clone())
        .collect()
}
