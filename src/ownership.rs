//! Ownership arbiter: the single source of truth for which player is
//! authoritatively driving which vessel. Tick-thread only; claims arrive
//! through the inbound queues and are applied here once per tick.

use std::collections::HashMap;

use crate::types::{PlayerId, VesselId};

#[derive(Default)]
pub struct OwnershipArbiter {
    controllers: HashMap<VesselId, PlayerId>,
}

impl OwnershipArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `player` as the controller of `vessel`. A player controls at
    /// most one vessel at a time, so any previous claim by the same player
    /// is evicted first.
    pub fn claim(&mut self, vessel: VesselId, player: PlayerId) {
        self.release(player);
        self.controllers.insert(vessel, player);
    }

    /// Drop whatever claim `player` currently holds. No-op if absent.
    pub fn release(&mut self, player: PlayerId) {
        self.controllers.retain(|_, controller| *controller != player);
    }

    pub fn owner_of(&self, vessel: VesselId) -> Option<PlayerId> {
        self.controllers.get(&vessel).copied()
    }

    pub fn is_claimed(&self, vessel: VesselId) -> bool {
        self.controllers.contains_key(&vessel)
    }

    /// True when a controller is recorded and it is not the local player.
    pub fn is_foreign_owned(&self, vessel: VesselId, local_player: PlayerId) -> bool {
        self.owner_of(vessel)
            .is_some_and(|controller| controller != local_player)
    }

    /// Vessels currently claimed by peers other than the local player.
    pub fn foreign_owned_vessels(&self, local_player: PlayerId) -> Vec<VesselId> {
        self.controllers
            .iter()
            .filter(|(_, controller)| **controller != local_player)
            .map(|(vessel, _)| *vessel)
            .collect()
    }
}
