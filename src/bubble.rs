//! Safety-bubble filter: a fixed geofence around the designated spawn and
//! recovery sites. Vessels inside it are never published, and inbound
//! snapshots that resolve inside it are removed instead of spawned.

use crate::{
    messages::VesselSnapshot,
    sim::Simulation,
    types::{distance, BodyId},
};

/// A ground position on the designated body's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceAnchor {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Two anchor points (launch pad and runway of the home site) on one
/// designated body, each protected by the same radius.
#[derive(Clone, Debug)]
pub struct SafetyBubble {
    pub body: BodyId,
    pub anchors: [SurfaceAnchor; 2],
    pub radius: f64,
}

impl SafetyBubble {
    /// True iff `world_pos` lies within `radius` of either anchor. Any body
    /// other than the designated one is clear by definition.
    pub fn contains(&self, sim: &dyn Simulation, world_pos: [f64; 3], body: BodyId) -> bool {
        if body != self.body {
            return false;
        }
        self.anchors.iter().any(|anchor| {
            sim.surface_position(self.body, anchor.latitude, anchor.longitude, anchor.altitude)
                .is_some_and(|anchor_pos| distance(world_pos, anchor_pos) < self.radius)
        })
    }

    /// Bubble check for a snapshot that has not been spawned yet, using its
    /// recorded surface coordinates.
    pub fn contains_snapshot(&self, sim: &dyn Simulation, snapshot: &VesselSnapshot) -> bool {
        if snapshot.body != self.body {
            return false;
        }
        let Some(pos) = sim.surface_position(
            snapshot.body,
            snapshot.latitude,
            snapshot.longitude,
            snapshot.altitude,
        ) else {
            return false;
        };
        self.contains(sim, pos, snapshot.body)
    }
}
