use thiserror::Error;

use crate::types::{CrewId, VesselId};

/// Failures while applying inbound messages. All of them are logged and the
/// offending message is skipped whole; no partial mutation is left behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// A snapshot missing the fields required to respawn a vessel.
    #[error("Snapshot for {vessel} is malformed and was skipped")]
    MalformedSnapshot { vessel: VesselId },

    /// A crew record missing required fields.
    #[error("Crew record for {crew} is malformed and was skipped")]
    MalformedCrewRecord { crew: CrewId },

    /// The update references a reference body unknown to the simulation.
    #[error("Update for {vessel} references an unknown body")]
    UnresolvedBody { vessel: VesselId },
}
