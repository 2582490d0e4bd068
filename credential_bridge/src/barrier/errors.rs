use thiserror::Error;

use super::types::Party;

/// Protocol violations detected by the [`Barrier`](super::Barrier).
///
/// These indicate a bug in the caller rather than a provider failure;
/// provider failures travel inside [`Resolution::Failure`](super::Resolution).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BarrierError {
    /// A result was reported for a provider the current mode does not wait on
    #[error("{0} is not armed for this rendezvous")]
    PartyNotArmed(Party),

    /// A provider reported more than once for the same rendezvous
    #[error("{0} already reported for this rendezvous")]
    DuplicateReport(Party),

    /// The barrier was re-armed while the previous rendezvous was unresolved
    #[error("Previous rendezvous has not resolved yet")]
    RendezvousPending,
}
