//! Conflict guard: destruction-validity state machine.
//!
//! Scene transitions fire spurious destroyed notifications for every vessel
//! being unloaded. The guard treats any destructive event that arrives while
//! validity is off as an engine-internal artifact and drops it silently.
//! Validity flips off on a scene-change request, back on when the simulation
//! reports ready, and is forced off for the duration of the engine's own
//! despawn-then-respawn while applying an inbound snapshot.

use log::debug;

#[derive(Default)]
pub struct ConflictGuard {
    destroy_valid: bool,
}

impl ConflictGuard {
    pub fn new() -> Self {
        // Initial state is Invalid until the simulation reports ready.
        Self::default()
    }

    pub fn destructions_valid(&self) -> bool {
        self.destroy_valid
    }

    pub fn on_scene_change_requested(&mut self) {
        if self.destroy_valid {
            debug!("Vessel destructions are now invalid");
            self.destroy_valid = false;
        }
    }

    pub fn on_simulation_ready(&mut self) {
        if !self.destroy_valid {
            debug!("Vessel destructions are now valid");
            self.destroy_valid = true;
        }
    }

    /// Force validity off, returning the prior value for [`Self::restore`].
    /// Wraps the despawn of a vessel's old copies during snapshot
    /// application, so it is never mistaken for a user-caused destruction.
    pub fn suspend(&mut self) -> bool {
        std::mem::replace(&mut self.destroy_valid, false)
    }

    pub fn restore(&mut self, prior: bool) {
        self.destroy_valid = prior;
    }
}
