//! Mock collaborators shared by the integration tests: an in-memory
//! simulation world, a recording transport, and a recording notice sink.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};

pub use vessel_sync::{
    ActionGroup, ActionGroups, BodyId, ControlState, CrewId, CrewRecord, CrewStatus,
    DestructiveOp, KinematicFrame, OrbitalElements, PartSnapshot, PlanetTime, PlayerId,
    ProximityClass, Seconds, Simulation, SimulationError, SpectateReason, SyncConfig,
    SurfaceAnchor, SafetyBubble, Transport, Notices, VesselId, VesselObservation,
    VesselSnapshot, VesselUpdate,
};

pub const LOCAL_PLAYER: PlayerId = PlayerId(1);
pub const PEER: PlayerId = PlayerId(2);
pub const HOME_BODY: BodyId = BodyId(1);

/// Config with the safety bubble parked on a body the tests never use,
/// unless a test opts into the real one.
pub fn test_config() -> SyncConfig {
    let mut config = SyncConfig::default();
    config.safety_bubble.body = BodyId(99);
    config
}

pub fn bubble_at_origin() -> SafetyBubble {
    SafetyBubble {
        body: HOME_BODY,
        anchors: [
            SurfaceAnchor {
                latitude: 0.0,
                longitude: 0.0,
                altitude: 0.0,
            },
            SurfaceAnchor {
                latitude: 0.0,
                longitude: 50.0,
                altitude: 0.0,
            },
        ],
        radius: 100.0,
    }
}

#[derive(Clone)]
pub struct MockVessel {
    pub name: String,
    pub body: BodyId,
    pub position: [f64; 3],
    pub full_fidelity: bool,
    pub parts: Vec<PartSnapshot>,
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
    pub proximity: Option<ProximityClass>,
    pub flying: bool,
}

impl MockVessel {
    pub fn at(position: [f64; 3]) -> Self {
        Self {
            name: "craft".into(),
            body: HOME_BODY,
            position,
            full_fidelity: true,
            parts: vec![PartSnapshot {
                part_name: "pod".into(),
                crew: Vec::new(),
            }],
            latitude: 0.0,
            longitude: 0.0,
            altitude: 500.0,
            surface_velocity: [0.0; 3],
            orbit: OrbitalElements::default(),
            forward: [0.0, 0.0, 1.0],
            up: [0.0, 1.0, 0.0],
            angular_velocity: [0.0; 3],
            control: ControlState::default(),
            action_groups: ActionGroups::default(),
            proximity: None,
            flying: false,
        }
    }
}

pub struct MockSim {
    pub planet_time: PlanetTime,
    pub realtime: Seconds,
    pub in_flight: bool,
    pub active: Option<VesselId>,
    pub vessels: BTreeMap<VesselId, MockVessel>,
    pub bodies: HashSet<BodyId>,
    pub roster: Vec<CrewRecord>,
    pub input_locked: bool,
    pub lock_toggles: usize,
    pub shadow_control: Option<ControlState>,
    pub despawned: Vec<VesselId>,
    pub activated: Vec<VesselId>,
    pub fail_observe: HashSet<VesselId>,
    pub fail_spawn: bool,
}

impl MockSim {
    pub fn new() -> Self {
        let mut bodies = HashSet::new();
        bodies.insert(HOME_BODY);
        bodies.insert(BodyId(2));
        Self {
            planet_time: 1000.0,
            realtime: 100.0,
            in_flight: true,
            active: None,
            vessels: BTreeMap::new(),
            bodies,
            roster: Vec::new(),
            input_locked: false,
            lock_toggles: 0,
            shadow_control: None,
            despawned: Vec::new(),
            activated: Vec::new(),
            fail_observe: HashSet::new(),
            fail_spawn: false,
        }
    }

    pub fn add_vessel(&mut self, id: VesselId, vessel: MockVessel) {
        self.vessels.insert(id, vessel);
    }

    pub fn add_active_vessel(&mut self, id: VesselId, vessel: MockVessel) {
        self.vessels.insert(id, vessel);
        self.active = Some(id);
    }

    pub fn advance(&mut self, seconds: f64) {
        self.planet_time += seconds;
        self.realtime += seconds;
    }

    pub fn add_crew_named(&mut self, name: &str) -> CrewId {
        self.add_crew(record_named(name))
    }
}

pub fn record_named(name: &str) -> CrewRecord {
    CrewRecord {
        name: name.into(),
        courage: 0.5,
        veteran: false,
        status: CrewStatus::Available,
        seat_index: 0,
        aptitude: 0.5,
        tolerance: 0.5,
    }
}

impl Simulation for MockSim {
    fn planet_time(&self) -> PlanetTime {
        self.planet_time
    }

    fn realtime(&self) -> Seconds {
        self.realtime
    }

    fn in_flight(&self) -> bool {
        self.in_flight
    }

    fn active_vessel(&self) -> Option<VesselId> {
        self.active
    }

    fn set_active_vessel(&mut self, vessel: VesselId) {
        self.active = Some(vessel);
        self.activated.push(vessel);
    }

    fn set_input_lock(&mut self, locked: bool) {
        self.input_locked = locked;
        self.lock_toggles += 1;
    }

    fn vessel_ids(&self) -> Vec<VesselId> {
        self.vessels.keys().copied().collect()
    }

    fn vessel_exists(&self, vessel: VesselId) -> bool {
        self.vessels.contains_key(&vessel)
    }

    fn is_full_fidelity(&self, vessel: VesselId) -> bool {
        self.vessels
            .get(&vessel)
            .map(|v| v.full_fidelity)
            .unwrap_or(false)
    }

    fn world_position(&self, vessel: VesselId) -> Option<[f64; 3]> {
        self.vessels.get(&vessel).map(|v| v.position)
    }

    fn body_of(&self, vessel: VesselId) -> Option<BodyId> {
        self.vessels.get(&vessel).map(|v| v.body)
    }

    fn part_count(&self, vessel: VesselId) -> usize {
        self.vessels
            .get(&vessel)
            .map(|v| v.parts.len())
            .unwrap_or(0)
    }

    fn part_names(&self, vessel: VesselId) -> Vec<String> {
        self.vessels
            .get(&vessel)
            .map(|v| v.parts.iter().map(|p| p.part_name.clone()).collect())
            .unwrap_or_default()
    }

    fn body_exists(&self, body: BodyId) -> bool {
        self.bodies.contains(&body)
    }

    fn surface_position(
        &self,
        body: BodyId,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> Option<[f64; 3]> {
        if !self.bodies.contains(&body) {
            return None;
        }
        // Flat test world: surface coordinates are world coordinates.
        Some([latitude, longitude, altitude])
    }

    fn observe(&self, vessel: VesselId) -> Result<VesselObservation, SimulationError> {
        if self.fail_observe.contains(&vessel) {
            return Err(SimulationError::ExtractionFailed {
                vessel: vessel.to_string(),
                reason: "induced".into(),
            });
        }
        let v = self
            .vessels
            .get(&vessel)
            .ok_or(SimulationError::VesselNotFound {
                vessel: vessel.to_string(),
            })?;
        Ok(VesselObservation {
            body: v.body,
            latitude: v.latitude,
            longitude: v.longitude,
            altitude: v.altitude,
            surface_velocity: v.surface_velocity,
            orbit: v.orbit,
            forward: v.forward,
            up: v.up,
            angular_velocity: v.angular_velocity,
            control: v.control,
            action_groups: v.action_groups,
        })
    }

    fn snapshot(&self, vessel: VesselId) -> Result<VesselSnapshot, SimulationError> {
        let v = self
            .vessels
            .get(&vessel)
            .ok_or(SimulationError::VesselNotFound {
                vessel: vessel.to_string(),
            })?;
        Ok(VesselSnapshot {
            vessel,
            name: v.name.clone(),
            body: v.body,
            latitude: v.latitude,
            longitude: v.longitude,
            altitude: v.altitude,
            flying: v.flying,
            parts: v.parts.clone(),
        })
    }

    fn set_surface_state(
        &mut self,
        vessel: VesselId,
        body: BodyId,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        velocity: [f64; 3],
    ) -> Result<(), SimulationError> {
        let v = self
            .vessels
            .get_mut(&vessel)
            .ok_or(SimulationError::VesselNotFound {
                vessel: vessel.to_string(),
            })?;
        v.body = body;
        v.latitude = latitude;
        v.longitude = longitude;
        v.altitude = altitude;
        v.surface_velocity = velocity;
        v.position = [latitude, longitude, altitude];
        Ok(())
    }

    fn set_orbital_state(
        &mut self,
        vessel: VesselId,
        body: BodyId,
        elements: OrbitalElements,
    ) -> Result<(), SimulationError> {
        let v = self
            .vessels
            .get_mut(&vessel)
            .ok_or(SimulationError::VesselNotFound {
                vessel: vessel.to_string(),
            })?;
        v.body = body;
        v.orbit = elements;
        Ok(())
    }

    fn set_orientation(&mut self, vessel: VesselId, forward: [f32; 3], up: [f32; 3]) {
        if let Some(v) = self.vessels.get_mut(&vessel) {
            v.forward = forward;
            v.up = up;
        }
    }

    fn set_angular_velocity(&mut self, vessel: VesselId, angular_velocity: [f32; 3]) {
        if let Some(v) = self.vessels.get_mut(&vessel) {
            v.angular_velocity = angular_velocity;
        }
    }

    fn set_control_state(&mut self, vessel: VesselId, control: ControlState) {
        if let Some(v) = self.vessels.get_mut(&vessel) {
            v.control = control;
        }
    }

    fn set_shadow_control_state(&mut self, control: ControlState) {
        self.shadow_control = Some(control);
    }

    fn set_action_group(&mut self, vessel: VesselId, group: ActionGroup, enabled: bool) {
        if let Some(v) = self.vessels.get_mut(&vessel) {
            match group {
                ActionGroup::Gear => v.action_groups.gear = enabled,
                ActionGroup::Light => v.action_groups.light = enabled,
                ActionGroup::Brakes => v.action_groups.brakes = enabled,
                ActionGroup::StabilityAssist => v.action_groups.stability_assist = enabled,
                ActionGroup::ReactionControl => v.action_groups.reaction_control = enabled,
            }
        }
    }

    fn set_proximity_class(&mut self, vessel: VesselId, class: ProximityClass) {
        if let Some(v) = self.vessels.get_mut(&vessel) {
            v.proximity = Some(class);
        }
    }

    fn despawn(&mut self, vessel: VesselId) {
        self.vessels.remove(&vessel);
        self.despawned.push(vessel);
    }

    fn spawn_from_snapshot(
        &mut self,
        snapshot: &VesselSnapshot,
    ) -> Result<VesselId, SimulationError> {
        if self.fail_spawn {
            return Err(SimulationError::SpawnFailed {
                vessel: snapshot.vessel.to_string(),
            });
        }
        let mut vessel = MockVessel::at([
            snapshot.latitude,
            snapshot.longitude,
            snapshot.altitude,
        ]);
        vessel.name = snapshot.name.clone();
        vessel.body = snapshot.body;
        vessel.latitude = snapshot.latitude;
        vessel.longitude = snapshot.longitude;
        vessel.altitude = snapshot.altitude;
        vessel.parts = snapshot.parts.clone();
        vessel.flying = snapshot.flying;
        // Freshly spawned vessels start packed, on rails.
        vessel.full_fidelity = false;
        self.vessels.insert(snapshot.vessel, vessel);
        Ok(snapshot.vessel)
    }

    fn roster_len(&self) -> usize {
        self.roster.len()
    }

    fn crew_record(&self, crew: CrewId) -> Option<CrewRecord> {
        self.roster.get(crew.0 as usize).cloned()
    }

    fn crew_name_exists(&self, name: &str) -> bool {
        self.roster.iter().any(|r| r.name == name)
    }

    fn add_crew(&mut self, record: CrewRecord) -> CrewId {
        self.roster.push(record);
        CrewId(self.roster.len() as u32 - 1)
    }

    fn update_crew(&mut self, crew: CrewId, record: CrewRecord) {
        if let Some(slot) = self.roster.get_mut(crew.0 as usize) {
            *slot = record;
        }
    }

    fn set_crew_assignment(&mut self, crew: CrewId, status: CrewStatus, seat_index: u32) {
        if let Some(slot) = self.roster.get_mut(crew.0 as usize) {
            slot.status = status;
            slot.seat_index = seat_index;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Snapshot(VesselSnapshot),
    Update(VesselUpdate),
    Remove(VesselId),
    Crew(CrewId, CrewRecord),
    Claim(Option<VesselId>),
}

#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<Sent>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<&VesselSnapshot> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Sent::Snapshot(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<&VesselUpdate> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Sent::Update(u) => Some(u),
                _ => None,
            })
            .collect()
    }

    pub fn removes(&self) -> Vec<VesselId> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Sent::Remove(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn crew_sent(&self) -> Vec<CrewId> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Sent::Crew(id, _) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn claims(&self) -> Vec<Option<VesselId>> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Sent::Claim(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn published_vessels(&self) -> Vec<VesselId> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Sent::Snapshot(s) => Some(s.vessel),
                Sent::Update(u) => Some(u.vessel),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Transport for MockTransport {
    fn send_snapshot(&mut self, snapshot: &VesselSnapshot) {
        self.sent.push(Sent::Snapshot(snapshot.clone()));
    }

    fn send_update(&mut self, update: &VesselUpdate) {
        self.sent.push(Sent::Update(update.clone()));
    }

    fn send_remove(&mut self, vessel: VesselId) {
        self.sent.push(Sent::Remove(vessel));
    }

    fn send_crew(&mut self, crew: CrewId, record: &CrewRecord) {
        self.sent.push(Sent::Crew(crew, record.clone()));
    }

    fn send_active_claim(&mut self, vessel: Option<VesselId>) {
        self.sent.push(Sent::Claim(vessel));
    }
}

#[derive(Default)]
pub struct MockNotices {
    pub spectate_notices: Vec<SpectateReason>,
    pub cleared: usize,
    pub banned: Vec<(VesselId, Vec<String>)>,
    pub rejections: Vec<(DestructiveOp, VesselId)>,
}

impl MockNotices {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notices for MockNotices {
    fn spectating(&mut self, reason: SpectateReason) {
        self.spectate_notices.push(reason);
    }

    fn spectating_cleared(&mut self) {
        self.cleared += 1;
    }

    fn banned_parts(&mut self, vessel: VesselId, parts: &[String]) {
        self.banned.push((vessel, parts.to_vec()));
    }

    fn destructive_rejected(&mut self, op: DestructiveOp, vessel: VesselId) {
        self.rejections.push((op, vessel));
    }
}

/// One-part snapshot anchored on the home body.
pub fn snapshot_of(vessel: VesselId, latitude: f64, longitude: f64) -> VesselSnapshot {
    VesselSnapshot {
        vessel,
        name: "probe".into(),
        body: HOME_BODY,
        latitude,
        longitude,
        altitude: 200.0,
        flying: false,
        parts: vec![PartSnapshot {
            part_name: "pod".into(),
            crew: Vec::new(),
        }],
    }
}

/// Minimal orbital update, for gating and mutation-mark scenarios.
pub fn update_for(vessel: VesselId, planet_time: PlanetTime) -> VesselUpdate {
    VesselUpdate {
        vessel,
        planet_time,
        body: HOME_BODY,
        forward: [0.0, 0.0, 1.0],
        up: [0.0, 1.0, 0.0],
        angular_velocity: [0.0; 3],
        control: ControlState::default(),
        action_groups: ActionGroups::default(),
        frame: KinematicFrame::Orbital(OrbitalElements::default()),
    }
}

/// Allow-list covering the default mock part names.
pub fn default_allowed_parts() -> HashSet<String> {
    ["pod", "tank", "engine", "wing"]
        .into_iter()
        .map(String::from)
        .collect()
}
