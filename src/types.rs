use std::fmt;

/// Absolute in-simulation time shared across all subspaces. Used to order
/// events causally regardless of local time-acceleration.
pub type PlanetTime = f64;

/// Wall-clock seconds since engine start, used for interval gating
/// (snapshot interval, send-rate interval, notice refresh).
pub type Seconds = f64;

/// A group of peers sharing one local time-acceleration rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubspaceId(pub i32);

/// Unique identity of a synchronized vessel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VesselId(pub u64);

/// Unique identity of a connected player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerId(pub u64);

/// Roster index of a crew member. Reassignment scans upward from zero, so
/// ids are kept small and dense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrewId(pub u32);

/// Identity of a celestial reference body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyId(pub u32);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vessel-{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

impl fmt::Display for CrewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crew-{}", self.0)
    }
}

/// Euclidean distance between two world positions.
pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
