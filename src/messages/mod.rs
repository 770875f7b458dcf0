//! Payload model for the messages the engine exchanges with the transport
//! collaborator. Wire encoding is the transport's concern; these types only
//! fix the fields and their meaning.

use crate::types::{BodyId, CrewId, PlanetTime, VesselId};

/// The seven classical orbital elements, relative to a reference body.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct OrbitalElements {
    pub inclination: f64,
    pub eccentricity: f64,
    pub semi_major_axis: f64,
    pub longitude_of_ascending_node: f64,
    pub argument_of_periapsis: f64,
    pub mean_anomaly_at_epoch: f64,
    pub epoch: f64,
}

/// Kinematic frame of an incremental update: surface-fixed below the
/// configured altitude ceiling, orbital elements above it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KinematicFrame {
    Surface {
        latitude: f64,
        longitude: f64,
        altitude: f64,
        /// Velocity relative to the rotating surface frame.
        velocity: [f64; 3],
    },
    Orbital(OrbitalElements),
}

/// Player control axes, mirrored so a spectator's input channel can track
/// the driving peer.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ControlState {
    pub throttle: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// The named boolean toggles replicated with every incremental update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionGroup {
    Gear,
    Light,
    Brakes,
    StabilityAssist,
    ReactionControl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ActionGroups {
    pub gear: bool,
    pub light: bool,
    pub brakes: bool,
    pub stability_assist: bool,
    pub reaction_control: bool,
}

impl ActionGroups {
    pub fn entries(&self) -> [(ActionGroup, bool); 5] {
        [
            (ActionGroup::Gear, self.gear),
            (ActionGroup::Light, self.light),
            (ActionGroup::Brakes, self.brakes),
            (ActionGroup::StabilityAssist, self.stability_assist),
            (ActionGroup::ReactionControl, self.reaction_control),
        ]
    }
}

/// Incremental state update for a single vessel.
#[derive(Clone, Debug, PartialEq)]
pub struct VesselUpdate {
    pub vessel: VesselId,
    pub planet_time: PlanetTime,
    pub body: BodyId,
    /// Forward unit vector in the reference body's rotating frame.
    pub forward: [f32; 3],
    /// Up unit vector in the reference body's rotating frame.
    pub up: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub control: ControlState,
    pub action_groups: ActionGroups,
    pub frame: KinematicFrame,
}

/// One construction part of a vessel snapshot, with the crew seated in it.
#[derive(Clone, Debug, PartialEq)]
pub struct PartSnapshot {
    pub part_name: String,
    pub crew: Vec<CrewId>,
}

/// Full-fidelity snapshot of a vessel: identity, geometry reference and
/// crew manifest. The simulation owns true geometry; the snapshot carries
/// enough to respawn the vessel on another peer.
#[derive(Clone, Debug, PartialEq)]
pub struct VesselSnapshot {
    pub vessel: VesselId,
    pub name: String,
    pub body: BodyId,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub flying: bool,
    pub parts: Vec<PartSnapshot>,
}

impl VesselSnapshot {
    /// A snapshot with no parts cannot respawn a vessel; treat it as
    /// malformed before any state is touched.
    pub fn is_well_formed(&self) -> bool {
        !self.parts.is_empty()
    }
}

/// Roster state of one crew member. The fixed field set below is what the
/// crew reconciler compares to decide whether a record must be republished.
#[derive(Clone, Debug, PartialEq)]
pub struct CrewRecord {
    pub name: String,
    pub courage: f32,
    pub veteran: bool,
    pub status: CrewStatus,
    pub seat_index: u32,
    pub aptitude: f32,
    pub tolerance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrewStatus {
    Available,
    Assigned,
    Missing,
    Dead,
}

/// Destructive local events gated by the conflict guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestructiveOp {
    Destroyed,
    Recovered,
    Terminated,
}
