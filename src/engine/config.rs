use crate::{
    bubble::{SafetyBubble, SurfaceAnchor},
    types::{BodyId, Seconds},
};

/// Config properties used by the sync engine. Set once at construction and
/// consulted every tick; no run-time mutation.
#[derive(Clone)]
pub struct SyncConfig {
    /// Seconds between full snapshots of the same vessel.
    pub snapshot_interval: Seconds,
    /// Incremental updates per second; the per-vessel gate is `1 / send_rate`.
    pub send_rate: f64,
    /// Per-tick budget of secondary vessels evaluated for publish. The
    /// active vessel is always evaluated and does not count against it.
    pub max_secondary_vessels_per_tick: usize,
    /// Minimum seconds between refreshes of on-screen notices.
    pub notice_interval: Seconds,
    /// Altitude below which incremental updates carry a surface-fixed frame
    /// instead of orbital elements.
    pub surface_frame_ceiling: f64,
    /// Roster size the crew reconciler tops up to at world-load priming.
    pub minimum_roster: usize,
    /// Protected spawn/recovery geofence.
    pub safety_bubble: SafetyBubble,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 30.0,
            send_rate: 5.0,
            max_secondary_vessels_per_tick: 3,
            notice_interval: 1.0,
            surface_frame_ceiling: 10_000.0,
            minimum_roster: 50,
            safety_bubble: SafetyBubble {
                // Launch pad and runway of the home space center.
                body: BodyId(1),
                anchors: [
                    SurfaceAnchor {
                        latitude: -0.0971978130377757,
                        longitude: 285.44237039111,
                        altitude: 60.0,
                    },
                    SurfaceAnchor {
                        latitude: -0.0486001121594686,
                        longitude: 285.275552559723,
                        altitude: 60.0,
                    },
                ],
                radius: 100.0,
            },
        }
    }
}
