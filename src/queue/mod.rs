//! Subspace delay queues.
//!
//! Per-(subspace, kind) FIFO buffers that release a network event only once
//! the local universal time has passed its planet-time stamp. Peers in
//! faster-time subspaces must not observe events before their local clock
//! reaches that instant; peers who are ahead drain backlog immediately.
//!
//! The queues are a delay line, not a priority queue: entries are appended
//! in arrival order and never reordered internally. Correctness depends on
//! the transport preserving per-subspace send order.
//!
//! This is the only structure shared with the network-receipt thread. Lazy
//! creation of a subspace's four queues plus the append is the single
//! critical section; one mutex serializes all producers with the tick
//! consumer's drain. The latest-mutation marks live under the same mutex so
//! the conflict guard sees a mark as soon as the producer has appended.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use log::warn;

use crate::{
    messages::{CrewRecord, VesselSnapshot, VesselUpdate},
    types::{CrewId, PlanetTime, PlayerId, SubspaceId, VesselId},
};

struct TimedEntry<T> {
    planet_time: PlanetTime,
    payload: T,
}

/// A claim (or release, when `vessel` is `None`) of active-vessel control by
/// a peer. Not time-gated; applied on the next tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveClaim {
    pub player: PlayerId,
    pub vessel: Option<VesselId>,
}

/// Everything drained as due in one tick, in application order: removes,
/// then crew records, then snapshots, then incremental updates.
#[derive(Default)]
pub struct DueBatch {
    pub removes: Vec<VesselId>,
    pub crew: Vec<(CrewId, CrewRecord)>,
    pub snapshots: Vec<VesselSnapshot>,
    pub updates: Vec<VesselUpdate>,
}

#[derive(Default)]
struct QueueSet {
    removes: HashMap<SubspaceId, VecDeque<TimedEntry<VesselId>>>,
    crew: HashMap<SubspaceId, VecDeque<TimedEntry<(CrewId, CrewRecord)>>>,
    snapshots: HashMap<SubspaceId, VecDeque<TimedEntry<VesselSnapshot>>>,
    updates: HashMap<SubspaceId, VecDeque<VesselUpdate>>,
    active_claims: VecDeque<ActiveClaim>,
    /// Greatest planet time of any mutation observed per vessel, advanced at
    /// enqueue time. The logical clock used to reject stale destructive
    /// operations.
    mutation_marks: HashMap<VesselId, PlanetTime>,
}

impl QueueSet {
    fn ensure_subspace(&mut self, subspace: SubspaceId) {
        // Idempotent: all four queues are created together.
        self.removes.entry(subspace).or_default();
        self.crew.entry(subspace).or_default();
        self.snapshots.entry(subspace).or_default();
        self.updates.entry(subspace).or_default();
    }

    fn advance_mark(&mut self, vessel: VesselId, planet_time: PlanetTime) {
        let mark = self.mutation_marks.entry(vessel).or_insert(planet_time);
        if *mark < planet_time {
            *mark = planet_time;
        }
    }
}

/// Shared handle to the inbound queues. Clone one per producer; the engine
/// keeps its own for the per-tick drain.
#[derive(Clone)]
pub struct InboundQueues {
    inner: Arc<Mutex<QueueSet>>,
}

impl InboundQueues {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueSet::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueSet> {
        // A poisoned lock means a producer panicked mid-append. The queues
        // are still structurally sound, so recover rather than bringing the
        // whole engine down.
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Inbound queue lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn enqueue_remove(&self, subspace: SubspaceId, planet_time: PlanetTime, vessel: VesselId) {
        let mut set = self.lock();
        set.ensure_subspace(subspace);
        set.removes.entry(subspace).or_default().push_back(TimedEntry {
                planet_time,
                payload: vessel,
            });
        set.advance_mark(vessel, planet_time);
    }

    pub fn enqueue_crew(
        &self,
        subspace: SubspaceId,
        planet_time: PlanetTime,
        crew: CrewId,
        record: CrewRecord,
    ) {
        let mut set = self.lock();
        set.ensure_subspace(subspace);
        set.crew.entry(subspace).or_default().push_back(TimedEntry {
                planet_time,
                payload: (crew, record),
            });
    }

    pub fn enqueue_snapshot(
        &self,
        subspace: SubspaceId,
        planet_time: PlanetTime,
        snapshot: VesselSnapshot,
    ) {
        let mut set = self.lock();
        set.ensure_subspace(subspace);
        set.snapshots.entry(subspace).or_default().push_back(TimedEntry {
                planet_time,
                payload: snapshot,
            });
    }

    pub fn enqueue_update(&self, subspace: SubspaceId, update: VesselUpdate) {
        let mut set = self.lock();
        set.ensure_subspace(subspace);
        set.advance_mark(update.vessel, update.planet_time);
        set.updates.entry(subspace).or_default().push_back(update);
    }

    pub fn enqueue_active_claim(&self, player: PlayerId, vessel: Option<VesselId>) {
        self.lock().active_claims.push_back(ActiveClaim { player, vessel });
    }

    /// Pop every entry whose planet time is strictly less than `local_time`,
    /// preserving arrival order within each subspace and kind.
    pub fn drain_due(&self, local_time: PlanetTime) -> DueBatch {
        let mut set = self.lock();
        let mut batch = DueBatch::default();
        for queue in set.removes.values_mut() {
            while queue.front().is_some_and(|e| e.planet_time < local_time) {
                let Some(entry) = queue.pop_front() else { break };
                batch.removes.push(entry.payload);
            }
        }
        for queue in set.crew.values_mut() {
            while queue.front().is_some_and(|e| e.planet_time < local_time) {
                let Some(entry) = queue.pop_front() else { break };
                batch.crew.push(entry.payload);
            }
        }
        for queue in set.snapshots.values_mut() {
            while queue.front().is_some_and(|e| e.planet_time < local_time) {
                let Some(entry) = queue.pop_front() else { break };
                batch.snapshots.push(entry.payload);
            }
        }
        for queue in set.updates.values_mut() {
            while queue.front().is_some_and(|u| u.planet_time < local_time) {
                let Some(update) = queue.pop_front() else { break };
                batch.updates.push(update);
            }
        }
        batch
    }

    /// Take all pending active-vessel claims, in arrival order.
    pub fn take_active_claims(&self) -> Vec<ActiveClaim> {
        self.lock().active_claims.drain(..).collect()
    }

    /// Flush every queued crew record regardless of planet time. Used once
    /// at world-load priming, before the tick loop starts gating.
    pub fn drain_all_crew(&self) -> Vec<(CrewId, CrewRecord)> {
        let mut set = self.lock();
        let mut out = Vec::new();
        for queue in set.crew.values_mut() {
            out.extend(queue.drain(..).map(|e| e.payload));
        }
        out
    }

    /// Flush every queued snapshot regardless of planet time, for priming.
    pub fn drain_all_snapshots(&self) -> Vec<VesselSnapshot> {
        let mut set = self.lock();
        let mut out = Vec::new();
        for queue in set.snapshots.values_mut() {
            out.extend(queue.drain(..).map(|e| e.payload));
        }
        out
    }

    /// Greatest planet time of any mutation observed for the vessel.
    pub fn latest_mutation(&self, vessel: VesselId) -> Option<PlanetTime> {
        self.lock().mutation_marks.get(&vessel).copied()
    }

    /// Whether the vessel has been mutated past the given local time by a
    /// more time-advanced peer.
    pub fn is_future_mutated(&self, vessel: VesselId, local_time: PlanetTime) -> bool {
        self.latest_mutation(vessel)
            .is_some_and(|mark| mark > local_time)
    }

    /// Count of incremental updates still held back by the time gate.
    pub fn pending_updates(&self) -> usize {
        self.lock().updates.values().map(VecDeque::len).sum()
    }

    /// Count of full snapshots still held back by the time gate.
    pub fn pending_snapshots(&self) -> usize {
        self.lock().snapshots.values().map(VecDeque::len).sum()
    }

    /// Drop all queued entries and marks. Part of a full engine reset.
    pub fn clear(&self) {
        *self.lock() = QueueSet::default();
    }
}

impl Default for InboundQueues {
    fn default() -> Self {
        Self::new()
    }
}
