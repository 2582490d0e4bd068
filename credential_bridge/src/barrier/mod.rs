//! Two-party rendezvous between the legacy FIDO2 provider and Credential Manager.
//!
//! The barrier collects one report from each armed provider and resolves to
//! exactly one terminal [`Resolution`]: either the success payloads of the
//! provider(s) that matter, or a single status code.

mod errors;
mod rendezvous;
mod types;


pub use errors::BarrierError;
pub use rendezvous::Barrier;
pub use types::{BarrierMode, Party, PartyStatus, Provenance, Resolution};
