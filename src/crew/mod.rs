//! Crew reconciler.
//!
//! Crew identities are referenced by index from vessel snapshots, and two
//! peers can ship overlapping snapshots that claim the same crew member for
//! different vessels. The reconciler keeps a crew→vessel assignment table,
//! reassigns conflicting slots to fresh ids, synthesizes roster entries for
//! out-of-range references, and decides which crew records are worth
//! republishing by diffing against the last record each peer has seen.

use std::collections::HashMap;

use log::debug;

use crate::{
    engine::error::ApplyError,
    messages::{CrewRecord, CrewStatus, VesselSnapshot},
    sim::Simulation,
    transport::Transport,
    types::{CrewId, VesselId},
};

#[derive(Default)]
pub struct CrewReconciler {
    /// Last record published (or received) per crew id; the delta baseline.
    known: HashMap<CrewId, CrewRecord>,
    /// Which vessel each crew member currently belongs to.
    assignments: HashMap<CrewId, VesselId>,
}

impl CrewReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assigned_vessel(&self, crew: CrewId) -> Option<VesselId> {
        self.assignments.get(&crew).copied()
    }

    /// Compare the crew referenced by an outbound snapshot against the
    /// remembered records, publishing any new or changed crew member.
    pub fn publish_changes(
        &mut self,
        snapshot: &VesselSnapshot,
        sim: &dyn Simulation,
        transport: &mut dyn Transport,
    ) {
        for part in &snapshot.parts {
            for &crew in &part.crew {
                let Some(live) = sim.crew_record(crew) else {
                    debug!("Snapshot for {} references unknown {crew}", snapshot.vessel);
                    continue;
                };
                match self.known.get(&crew) {
                    None => {
                        debug!("Found new {crew}, sending");
                        transport.send_crew(crew, &live);
                        self.known.insert(crew, live);
                    }
                    Some(remembered) if *remembered != live => {
                        debug!("Found changed {crew}, sending");
                        transport.send_crew(crew, &live);
                        self.known.insert(crew, live);
                    }
                    Some(_) => {}
                }
            }
        }
    }

    /// Validate and repair the crew indices of a snapshot about to be
    /// spawned. A referenced id already assigned to another vessel gets the
    /// lowest unassigned id instead; out-of-range ids get synthesized roster
    /// entries so every index resolves. Idempotent for repeated identical
    /// snapshots of the same vessel.
    pub fn validate_snapshot_crew(
        &mut self,
        snapshot: &mut VesselSnapshot,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
    ) {
        let vessel = snapshot.vessel;
        for part in &mut snapshot.parts {
            for (seat_index, slot) in part.crew.iter_mut().enumerate() {
                let seat_index = seat_index as u32;
                let crew = *slot;
                let taken_elsewhere = self
                    .assignments
                    .get(&crew)
                    .is_some_and(|owner| *owner != vessel);
                if taken_elsewhere {
                    let replacement = self.lowest_free_crew_id();
                    debug!(
                        "{crew} already belongs to another vessel, reassigning slot to {replacement}"
                    );
                    *slot = replacement;
                    self.ensure_crew_exists(replacement, sim, transport);
                    sim.set_crew_assignment(replacement, CrewStatus::Assigned, seat_index);
                    self.assignments.insert(replacement, vessel);
                    // Force a republish of the reassigned record.
                    self.known.remove(&replacement);
                } else {
                    self.ensure_crew_exists(crew, sim, transport);
                    sim.set_crew_assignment(crew, CrewStatus::Assigned, seat_index);
                    self.assignments.insert(crew, vessel);
                }
            }
        }
    }

    /// Clear the assignment rows belonging to `vessel`, republishing the
    /// affected crew unless the local peer is spectating.
    pub fn unassign_vessel(
        &mut self,
        vessel: VesselId,
        sim: &dyn Simulation,
        transport: &mut dyn Transport,
        spectating: bool,
    ) {
        let released: Vec<CrewId> = self
            .assignments
            .iter()
            .filter(|(_, owner)| **owner == vessel)
            .map(|(crew, _)| *crew)
            .collect();
        for crew in released {
            debug!("{crew} unassigned from {vessel}");
            self.assignments.remove(&crew);
            if !spectating {
                if let Some(record) = sim.crew_record(crew) {
                    transport.send_crew(crew, &record);
                    self.known.insert(crew, record);
                }
            }
        }
    }

    /// Apply an inbound crew record to the roster, synthesizing any missing
    /// lower indices so the id resolves.
    pub fn apply_record(
        &mut self,
        crew: CrewId,
        record: CrewRecord,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
    ) -> Result<(), ApplyError> {
        if record.name.is_empty() {
            return Err(ApplyError::MalformedCrewRecord { crew });
        }
        self.ensure_crew_exists(crew, sim, transport);
        sim.update_crew(crew, record.clone());
        self.known.insert(crew, record);
        Ok(())
    }

    /// Top up the roster with synthesized crew until it reaches `minimum`,
    /// publishing each new member. Called once at world-load priming.
    pub fn prime_roster(
        &mut self,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
        minimum: usize,
    ) {
        if sim.roster_len() < minimum {
            debug!("Generating {} new crew members", minimum - sim.roster_len());
        }
        while sim.roster_len() < minimum {
            self.synthesize_one(sim, transport);
        }
    }

    /// Reset baseline used when the engine resets: forget everything.
    pub fn clear(&mut self) {
        self.known.clear();
        self.assignments.clear();
    }

    fn lowest_free_crew_id(&self) -> CrewId {
        let mut candidate = 0;
        while self.assignments.contains_key(&CrewId(candidate)) {
            candidate += 1;
        }
        CrewId(candidate)
    }

    /// Grow the roster until `crew` is a valid index.
    fn ensure_crew_exists(
        &mut self,
        crew: CrewId,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
    ) {
        let wanted = crew.0 as usize + 1;
        if sim.roster_len() < wanted {
            debug!(
                "Generating {} new crew for referenced index {crew}",
                wanted - sim.roster_len()
            );
        }
        while sim.roster_len() < wanted {
            self.synthesize_one(sim, transport);
        }
    }

    fn synthesize_one(&mut self, sim: &mut dyn Simulation, transport: &mut dyn Transport) {
        loop {
            let record = random_record();
            if sim.crew_name_exists(&record.name) {
                continue;
            }
            let id = sim.add_crew(record.clone());
            debug!("Generated new crew member {} as {id}", record.name);
            transport.send_crew(id, &record);
            self.known.insert(id, record);
            break;
        }
    }
}

/// Generate a plausible random crew member.
fn random_record() -> CrewRecord {
    const FIRST: &[&str] = &[
        "Ada", "Bel", "Cor", "Dud", "Edl", "Fer", "Gil", "Han", "Ivo", "Jeb",
        "Kel", "Lem", "Mer", "Ned", "Obe", "Pat", "Ron", "Sam", "Tedd", "Val",
    ];
    const LAST: &[&str] = &[
        "bart", "bles", "dorf", "fred", "gard", "lock", "ming", "ney", "rick",
        "son", "ster", "ton", "vey", "wig", "zor",
    ];
    let name = format!(
        "{}{} Kerman",
        FIRST[fastrand::usize(..FIRST.len())],
        LAST[fastrand::usize(..LAST.len())]
    );
    CrewRecord {
        name,
        courage: fastrand::f32(),
        veteran: fastrand::u8(..20) == 0,
        status: CrewStatus::Available,
        seat_index: 0,
        aptitude: fastrand::f32(),
        tolerance: fastrand::f64(),
    }
}
