//! Local-authority state machine. Once per tick the engine decides whether
//! the local peer may drive its active vessel or must spectate it, and
//! toggles the visible input-lock side effect only on transitions.

use log::debug;

use crate::{
    ownership::OwnershipArbiter, queue::InboundQueues, sim::Simulation, types::PlayerId,
};

/// Why the local peer is spectating, if it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpectateReason {
    /// Driving: full local authority over the active vessel.
    #[default]
    None,
    /// Another peer holds the authoritative claim on the active vessel.
    ForeignOwned,
    /// A peer in a more time-advanced subspace has already mutated the
    /// active vessel past our local "now".
    FutureMutated,
}

impl SpectateReason {
    pub fn is_spectating(self) -> bool {
        self != SpectateReason::None
    }
}

/// Compute the spectate reason for the current tick. Foreign ownership
/// outranks future mutation, matching the arbitration order peers expect.
pub fn current_reason(
    sim: &dyn Simulation,
    ownership: &OwnershipArbiter,
    queues: &InboundQueues,
    local_player: PlayerId,
) -> SpectateReason {
    let Some(active) = sim.active_vessel() else {
        return SpectateReason::None;
    };
    if ownership.is_foreign_owned(active, local_player) {
        return SpectateReason::ForeignOwned;
    }
    if queues.is_future_mutated(active, sim.planet_time()) {
        return SpectateReason::FutureMutated;
    }
    SpectateReason::None
}

/// Tracks the previous tick's spectate state so the input-lock toggle fires
/// only on edges.
#[derive(Default)]
pub struct SpectateTracker {
    was_spectating: bool,
    reason: SpectateReason,
}

impl SpectateTracker {
    pub fn reason(&self) -> SpectateReason {
        self.reason
    }

    pub fn is_spectating(&self) -> bool {
        self.reason.is_spectating()
    }

    /// Record this tick's reason and apply the lock side effect when the
    /// driving/spectating edge flips.
    pub fn apply(&mut self, sim: &mut dyn Simulation, reason: SpectateReason) {
        self.reason = reason;
        let spectating = reason.is_spectating();
        if spectating != self.was_spectating {
            self.was_spectating = spectating;
            if spectating {
                debug!("Setting spectate input lock ({reason:?})");
                sim.set_input_lock(true);
            } else {
                debug!("Releasing spectate input lock");
                sim.set_input_lock(false);
            }
        }
    }
}
