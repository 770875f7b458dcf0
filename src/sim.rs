//! Contract consumed from the physics/world simulation collaborator.
//!
//! The engine never holds live vessel handles across ticks; every operation
//! resolves a [`VesselId`] at the point of use through this trait. True
//! geometry, physics integration and orbital propagation stay on the other
//! side of the boundary.

use thiserror::Error;

use crate::{
    messages::{
        ActionGroup, ActionGroups, ControlState, CrewRecord, CrewStatus, OrbitalElements,
        VesselSnapshot,
    },
    types::{BodyId, CrewId, PlanetTime, Seconds, VesselId},
};

/// Errors the simulation collaborator may surface. None of them are fatal to
/// the engine; every failure degrades to skipping that tick's action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("Vessel {vessel} not found in the simulation")]
    VesselNotFound { vessel: String },

    #[error("Reference body not found in the simulation")]
    BodyNotFound,

    #[error("Failed to instantiate vessel {vessel} from snapshot")]
    SpawnFailed { vessel: String },

    /// Any failure while deriving an outbound update from live entity state.
    /// Discarded for the current tick; the interval gate retries next tick.
    #[error("Failed to extract state for vessel {vessel}: {reason}")]
    ExtractionFailed { vessel: String, reason: String },
}

/// Raw per-tick observation of a live vessel, from which the engine derives
/// an outbound incremental update. The frame decision (surface vs orbital)
/// belongs to the engine, so both representations are carried.
#[derive(Clone, Debug)]
pub struct VesselObservation {
    pub body: BodyId,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub surface_velocity: [f64; 3],
    pub orbit: OrbitalElements,
    pub forward: [f32; 3],
    pub up: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub control: ControlState,
    pub action_groups: ActionGroups,
}

/// Pack-distance class applied to a vessel after spawn. Vessels driven by
/// other players stay under full physics at much larger ranges than idle
/// ones, so their inbound updates keep applying cleanly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProximityClass {
    /// Standard pack/unpack thresholds.
    Normal,
    /// Extended thresholds for vessels another peer is actively driving.
    RemotePiloted,
}

pub trait Simulation {
    // Clocks

    /// Current local universal time on the shared planet-time axis.
    fn planet_time(&self) -> PlanetTime;
    /// Wall-clock seconds since startup, for interval gating.
    fn realtime(&self) -> Seconds;

    // Scene & active vessel

    fn in_flight(&self) -> bool;
    fn active_vessel(&self) -> Option<VesselId>;
    fn set_active_vessel(&mut self, vessel: VesselId);
    /// Suppress or restore local physical-control input. Toggled only on
    /// spectate-state transitions, never every tick.
    fn set_input_lock(&mut self, locked: bool);

    // Queries

    fn vessel_ids(&self) -> Vec<VesselId>;
    fn vessel_exists(&self, vessel: VesselId) -> bool;
    /// Whether the vessel is loaded and under full physics (unpacked).
    fn is_full_fidelity(&self, vessel: VesselId) -> bool;
    fn world_position(&self, vessel: VesselId) -> Option<[f64; 3]>;
    fn body_of(&self, vessel: VesselId) -> Option<BodyId>;
    fn part_count(&self, vessel: VesselId) -> usize;
    /// Names of the construction parts the vessel is built from, for the
    /// allow-list check.
    fn part_names(&self, vessel: VesselId) -> Vec<String>;
    fn body_exists(&self, body: BodyId) -> bool;
    /// World position of a point fixed to a body's surface.
    fn surface_position(
        &self,
        body: BodyId,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> Option<[f64; 3]>;

    // Extraction

    fn observe(&self, vessel: VesselId) -> Result<VesselObservation, SimulationError>;
    fn snapshot(&self, vessel: VesselId) -> Result<VesselSnapshot, SimulationError>;

    // Mutation

    fn set_surface_state(
        &mut self,
        vessel: VesselId,
        body: BodyId,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        velocity: [f64; 3],
    ) -> Result<(), SimulationError>;
    fn set_orbital_state(
        &mut self,
        vessel: VesselId,
        body: BodyId,
        elements: OrbitalElements,
    ) -> Result<(), SimulationError>;
    fn set_orientation(&mut self, vessel: VesselId, forward: [f32; 3], up: [f32; 3]);
    fn set_angular_velocity(&mut self, vessel: VesselId, angular_velocity: [f32; 3]);
    /// Apply control state to the authoritative channel of a vessel.
    fn set_control_state(&mut self, vessel: VesselId, control: ControlState);
    /// Apply control state to the local shadow/input channel, used while
    /// spectating so inbound control never drives the authoritative state.
    fn set_shadow_control_state(&mut self, control: ControlState);
    fn set_action_group(&mut self, vessel: VesselId, group: ActionGroup, enabled: bool);
    fn set_proximity_class(&mut self, vessel: VesselId, class: ProximityClass);

    // Lifecycle

    fn despawn(&mut self, vessel: VesselId);
    fn spawn_from_snapshot(&mut self, snapshot: &VesselSnapshot)
        -> Result<VesselId, SimulationError>;

    // Crew roster

    fn roster_len(&self) -> usize;
    fn crew_record(&self, crew: CrewId) -> Option<CrewRecord>;
    fn crew_name_exists(&self, name: &str) -> bool;
    /// Append a crew member to the roster, returning its new id.
    fn add_crew(&mut self, record: CrewRecord) -> CrewId;
    fn update_crew(&mut self, crew: CrewId, record: CrewRecord);
    fn set_crew_assignment(&mut self, crew: CrewId, status: CrewStatus, seat_index: u32);
}
