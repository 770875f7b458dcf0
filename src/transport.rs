//! Contracts exposed to the transport and UI collaborators.

use crate::{
    messages::{CrewRecord, DestructiveOp, VesselSnapshot, VesselUpdate},
    spectate::SpectateReason,
    types::{CrewId, VesselId},
};

/// Outbound sink. The transport owns serialization and delivery; delivery is
/// assumed at-least-once and order-preserving per subspace.
pub trait Transport {
    fn send_snapshot(&mut self, snapshot: &VesselSnapshot);
    fn send_update(&mut self, update: &VesselUpdate);
    fn send_remove(&mut self, vessel: VesselId);
    fn send_crew(&mut self, crew: CrewId, record: &CrewRecord);
    /// Claim the given vessel as actively driven, or release with `None`.
    fn send_active_claim(&mut self, vessel: Option<VesselId>);
}

/// Transient on-screen notices. Content only, no behavioral contract; every
/// method defaults to a no-op so headless hosts can ignore the surface.
pub trait Notices {
    fn spectating(&mut self, _reason: SpectateReason) {}
    fn spectating_cleared(&mut self) {}
    fn banned_parts(&mut self, _vessel: VesselId, _parts: &[String]) {}
    fn destructive_rejected(&mut self, _op: DestructiveOp, _vessel: VesselId) {}
}

/// Notice sink for hosts without a UI surface.
pub struct NoNotices;

impl Notices for NoNotices {}
