use std::collections::HashSet;

use log::{debug, info, warn};

use crate::{
    crew::CrewReconciler,
    engine::config::SyncConfig,
    engine::error::ApplyError,
    guard::ConflictGuard,
    messages::{DestructiveOp, KinematicFrame, VesselSnapshot, VesselUpdate},
    ownership::OwnershipArbiter,
    queue::InboundQueues,
    scheduler::{OutboundCtx, UpdateScheduler},
    sim::{ProximityClass, Simulation},
    spectate::{self, SpectateReason, SpectateTracker},
    transport::{Notices, Transport},
    types::{PlayerId, Seconds, VesselId},
};

/// All per-session mutable state, grouped so a full reset is a single
/// replace-with-fresh-instance rather than field-by-field clearing.
#[derive(Default)]
struct SessionState {
    ownership: OwnershipArbiter,
    spectate: SpectateTracker,
    guard: ConflictGuard,
    crew: CrewReconciler,
    scheduler: UpdateScheduler,
    /// Vessel ids the local peer currently advertises as server-known.
    registered: HashSet<VesselId>,
    /// The vessel we last published a claim for, if any.
    claimed: Option<VesselId>,
    last_part_count: usize,
    /// Re-activation deferred to the next tick after a snapshot replaced
    /// the active vessel.
    switch_active: Option<VesselId>,
    last_spectate_notice: Seconds,
}

/// The orchestrator: ties queues, arbitration, reconciliation and the
/// outbound scheduler together, once per simulation tick.
///
/// All state is touched only from the tick thread; the single concession to
/// concurrency is the [`InboundQueues`] handle, which network producers
/// share.
pub struct SyncEngine {
    config: SyncConfig,
    local_player: PlayerId,
    allowed_parts: HashSet<String>,
    queues: InboundQueues,
    state: SessionState,
}

impl SyncEngine {
    pub fn new(
        config: SyncConfig,
        local_player: PlayerId,
        allowed_parts: HashSet<String>,
    ) -> Self {
        Self {
            config,
            local_player,
            allowed_parts,
            queues: InboundQueues::new(),
            state: SessionState::default(),
        }
    }

    /// Handle for the network-receipt thread to enqueue inbound messages.
    pub fn queues(&self) -> InboundQueues {
        self.queues.clone()
    }

    pub fn local_player(&self) -> PlayerId {
        self.local_player
    }

    pub fn is_spectating(&self) -> bool {
        self.state.spectate.is_spectating()
    }

    pub fn spectate_reason(&self) -> SpectateReason {
        self.state.spectate.reason()
    }

    /// Incremental updates buffered ahead of the local clock.
    pub fn pending_future_updates(&self) -> usize {
        self.queues.pending_updates()
    }

    /// Full snapshots buffered ahead of the local clock.
    pub fn pending_future_snapshots(&self) -> usize {
        self.queues.pending_snapshots()
    }

    /// Replace the whole session state with a fresh instance and drop all
    /// queued inbound messages.
    pub fn reset(&mut self) {
        info!("Resetting vessel synchronization state");
        self.state = SessionState::default();
        self.queues.clear();
    }

    /// One cooperative pass: drain due queue entries, apply them, recompute
    /// local authority, and run the outbound scheduler.
    pub fn tick(
        &mut self,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
        notices: &mut dyn Notices,
    ) {
        // Activation deferred by a snapshot that replaced the active vessel.
        if let Some(vessel) = self.state.switch_active.take() {
            sim.set_active_vessel(vessel);
        }

        self.apply_active_claims();
        self.drain_and_apply(sim, transport);
        self.refresh_spectate(sim, notices);
        self.publish_claim_state(sim, transport);
        self.check_active_vessel_changed(sim);
        self.run_scheduler(sim, transport, notices);
    }

    /// Arbitrate claims announced by peers since the last tick.
    fn apply_active_claims(&mut self) {
        for claim in self.queues.take_active_claims() {
            match claim.vessel {
                Some(vessel) => {
                    debug!("{} is now flying {vessel}", claim.player);
                    self.state.ownership.claim(vessel, claim.player);
                }
                None => {
                    debug!("{} has released their vessel", claim.player);
                    self.state.ownership.release(claim.player);
                }
            }
        }
    }

    fn drain_and_apply(&mut self, sim: &mut dyn Simulation, transport: &mut dyn Transport) {
        let batch = self.queues.drain_due(sim.planet_time());
        for vessel in batch.removes {
            self.apply_remove(vessel, sim);
        }
        for (crew, record) in batch.crew {
            if let Err(err) = self
                .state
                .crew
                .apply_record(crew, record, sim, transport)
            {
                warn!("{err}");
            }
        }
        for snapshot in batch.snapshots {
            self.apply_snapshot(snapshot, sim, transport);
        }
        for update in batch.updates {
            self.apply_update(update, sim);
        }
    }

    fn apply_remove(&mut self, vessel: VesselId, sim: &mut dyn Simulation) {
        if sim.active_vessel() == Some(vessel) {
            if !self.live_spectate_reason(sim).is_spectating() {
                // A peer removed the vessel we are flying; zero the snapshot
                // timer so we publish it right back.
                debug!("Our vessel {vessel} was removed by another player, resending");
                self.state.scheduler.force_snapshot(vessel);
            }
            return;
        }
        if sim.vessel_exists(vessel) {
            debug!("Removing {vessel}");
            sim.despawn(vessel);
        }
    }

    fn apply_snapshot(
        &mut self,
        mut snapshot: VesselSnapshot,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
    ) {
        if !snapshot.is_well_formed() {
            warn!(
                "{}",
                ApplyError::MalformedSnapshot {
                    vessel: snapshot.vessel
                }
            );
            return;
        }

        // Repair duplicate or out-of-range crew references first.
        self.state
            .crew
            .validate_snapshot_crew(&mut snapshot, sim, transport);

        // Never spawn inside the protected zone; tell the sender to drop it.
        if self
            .config
            .safety_bubble
            .contains_snapshot(sim, &snapshot)
        {
            debug!(
                "Removing {} ({}) from server: inside the safety bubble",
                snapshot.vessel, snapshot.name
            );
            transport.send_remove(snapshot.vessel);
            return;
        }

        self.state.registered.insert(snapshot.vessel);
        debug!("Loading {} ({})", snapshot.vessel, snapshot.name);

        let was_active = sim.active_vessel() == Some(snapshot.vessel);

        // Despawning our own copy must not look like a user destruction.
        let prior = self.state.guard.suspend();
        if sim.vessel_exists(snapshot.vessel) {
            sim.despawn(snapshot.vessel);
        }
        self.state.guard.restore(prior);

        // A freshly applied snapshot is as good as a sent one; do not
        // publish it straight back.
        self.state
            .scheduler
            .mark_snapshot_applied(snapshot.vessel, sim.realtime());

        match sim.spawn_from_snapshot(&snapshot) {
            Ok(vessel) => {
                let class = if self.state.ownership.is_foreign_owned(vessel, self.local_player)
                {
                    ProximityClass::RemotePiloted
                } else {
                    ProximityClass::Normal
                };
                sim.set_proximity_class(vessel, class);
                if was_active {
                    self.state.switch_active = Some(vessel);
                }
                debug!("Snapshot for {vessel} loaded");
            }
            Err(err) => {
                debug!("{err}");
            }
        }
    }

    fn apply_update(&mut self, update: VesselUpdate, sim: &mut dyn Simulation) {
        let spectating = self.live_spectate_reason(sim).is_spectating();
        let is_active = sim.active_vessel() == Some(update.vessel);

        if !spectating && is_active {
            debug!("Ignoring inbound update for our driven vessel {}", update.vessel);
            return;
        }
        if !sim.vessel_exists(update.vessel) {
            return;
        }
        if !sim.body_exists(update.body) {
            debug!(
                "{}",
                ApplyError::UnresolvedBody {
                    vessel: update.vessel
                }
            );
            return;
        }

        let applied = match update.frame {
            KinematicFrame::Surface {
                latitude,
                longitude,
                altitude,
                velocity,
            } => sim.set_surface_state(
                update.vessel,
                update.body,
                latitude,
                longitude,
                altitude,
                velocity,
            ),
            KinematicFrame::Orbital(elements) => {
                sim.set_orbital_state(update.vessel, update.body, elements)
            }
        };
        if let Err(err) = applied {
            debug!("{err}");
            return;
        }

        sim.set_orientation(update.vessel, update.forward, update.up);
        if sim.is_full_fidelity(update.vessel) {
            sim.set_angular_velocity(update.vessel, update.angular_velocity);
        }

        // While spectating, the controls of the vessel we are watching feed
        // the local input shadow, never the authoritative channel.
        if spectating && is_active {
            sim.set_shadow_control_state(update.control);
        } else {
            sim.set_control_state(update.vessel, update.control);
        }
        for (group, enabled) in update.action_groups.entries() {
            sim.set_action_group(update.vessel, group, enabled);
        }
    }

    /// Refresh the interval-gated spectate notice and the edge-triggered
    /// input lock. The cleared notice fires once, on the transition back to
    /// driving, never while a peer simply keeps driving.
    fn refresh_spectate(&mut self, sim: &mut dyn Simulation, notices: &mut dyn Notices) {
        let reason = self.live_spectate_reason(sim);

        if reason.is_spectating() {
            let now = sim.realtime();
            if (now - self.state.last_spectate_notice) > self.config.notice_interval {
                self.state.last_spectate_notice = now;
                notices.spectating(reason);
            }
        } else if self.state.spectate.is_spectating() {
            notices.spectating_cleared();
        }

        self.state.spectate.apply(sim, reason);
    }

    /// Claim the active vessel when we are driving it; release when we
    /// started spectating or left flight.
    fn publish_claim_state(&mut self, sim: &mut dyn Simulation, transport: &mut dyn Transport) {
        let flying = sim.in_flight()
            && sim
                .active_vessel()
                .is_some_and(|active| sim.is_full_fidelity(active));

        if flying && !self.state.spectate.is_spectating() {
            if let Some(active) = sim.active_vessel() {
                if !self.state.ownership.is_claimed(active) {
                    self.state.ownership.claim(active, self.local_player);
                    transport.send_active_claim(Some(active));
                    self.state.claimed = Some(active);
                }
            }
            return;
        }

        if self.state.claimed.take().is_some() {
            self.state.ownership.release(self.local_player);
            transport.send_active_claim(None);
        }
    }

    /// A part-count change on the active vessel means geometry changed:
    /// force a fresh snapshot and drop the stale allow-list verdict.
    fn check_active_vessel_changed(&mut self, sim: &dyn Simulation) {
        if !sim.in_flight() || self.state.spectate.is_spectating() {
            return;
        }
        let Some(active) = sim.active_vessel() else {
            return;
        };
        if !sim.is_full_fidelity(active) {
            return;
        }
        let part_count = sim.part_count(active);
        if part_count != self.state.last_part_count {
            self.state.last_part_count = part_count;
            self.state.scheduler.force_snapshot(active);
            self.state.scheduler.invalidate_parts(active);
        }
    }

    fn run_scheduler(
        &mut self,
        sim: &mut dyn Simulation,
        transport: &mut dyn Transport,
        notices: &mut dyn Notices,
    ) {
        if self.state.spectate.is_spectating() {
            return;
        }
        let mut ctx = OutboundCtx {
            sim,
            transport,
            notices,
            ownership: &self.state.ownership,
            queues: &self.queues,
            crew: &mut self.state.crew,
            registered: &mut self.state.registered,
            bubble: &self.config.safety_bubble,
            allowed_parts: &self.allowed_parts,
            config: &self.config,
            local_player: self.local_player,
        };
        self.state.scheduler.run(&mut ctx);
    }

    // Lifecycle notifications from the host, forwarded by the collaborator.

    pub fn on_scene_change_requested(&mut self) {
        self.state.guard.on_scene_change_requested();
    }

    pub fn on_simulation_ready(&mut self) {
        self.state.guard.on_simulation_ready();
    }

    pub fn on_vessel_destroyed(
        &mut self,
        vessel: VesselId,
        sim: &dyn Simulation,
        transport: &mut dyn Transport,
        notices: &mut dyn Notices,
    ) {
        self.handle_destructive(DestructiveOp::Destroyed, vessel, sim, transport, notices);
    }

    pub fn on_vessel_recovered(
        &mut self,
        vessel: VesselId,
        sim: &dyn Simulation,
        transport: &mut dyn Transport,
        notices: &mut dyn Notices,
    ) {
        self.handle_destructive(DestructiveOp::Recovered, vessel, sim, transport, notices);
    }

    pub fn on_vessel_terminated(
        &mut self,
        vessel: VesselId,
        sim: &dyn Simulation,
        transport: &mut dyn Transport,
        notices: &mut dyn Notices,
    ) {
        self.handle_destructive(DestructiveOp::Terminated, vessel, sim, transport, notices);
    }

    /// Two-part gate for destructive local events: destructions must be
    /// valid (scene settled), and the vessel must not have been mutated in
    /// the future by a more advanced peer.
    fn handle_destructive(
        &mut self,
        op: DestructiveOp,
        vessel: VesselId,
        sim: &dyn Simulation,
        transport: &mut dyn Transport,
        notices: &mut dyn Notices,
    ) {
        if !self.state.guard.destructions_valid() {
            // Scene-transition artifact, not a real user action.
            debug!("Skipping {op:?} for {vessel}: destructions are not valid");
            return;
        }
        if self.queues.is_future_mutated(vessel, sim.planet_time()) {
            debug!("Rejecting {op:?} for {vessel}: changed in the future");
            notices.destructive_rejected(op, vessel);
            return;
        }
        if self
            .state
            .ownership
            .is_foreign_owned(vessel, self.local_player)
        {
            debug!("Skipping {op:?} for {vessel}: owned by another player");
            return;
        }
        if self.state.registered.remove(&vessel) {
            debug!("Removing {vessel} from the server: {op:?}");
            let spectating = self.state.spectate.is_spectating();
            self.state
                .crew
                .unassign_vessel(vessel, sim, transport, spectating);
            transport.send_remove(vessel);
        }
    }

    // World-load priming, before the tick loop starts time-gating.

    /// Flush all queued crew records and top the roster up to the configured
    /// minimum with synthesized members.
    pub fn prime_roster(&mut self, sim: &mut dyn Simulation, transport: &mut dyn Transport) {
        for (crew, record) in self.queues.drain_all_crew() {
            if let Err(err) = self.state.crew.apply_record(crew, record, sim, transport) {
                warn!("{err}");
            }
        }
        self.state
            .crew
            .prime_roster(sim, transport, self.config.minimum_roster);
    }

    /// Flush and apply all queued snapshots regardless of planet time.
    pub fn prime_vessels(&mut self, sim: &mut dyn Simulation, transport: &mut dyn Transport) {
        for snapshot in self.queues.drain_all_snapshots() {
            self.apply_snapshot(snapshot, sim, transport);
        }
    }

    fn live_spectate_reason(&self, sim: &dyn Simulation) -> SpectateReason {
        spectate::current_reason(sim, &self.state.ownership, &self.queues, self.local_player)
    }

    /// True when a controller is recorded for the vessel and it is not us.
    pub fn is_foreign_owned(&self, vessel: VesselId) -> bool {
        self.state
            .ownership
            .is_foreign_owned(vessel, self.local_player)
    }

    /// The registered-vessel set is intentionally narrower than the
    /// simulation's full vessel list; untracked foreign vessels exist
    /// locally but are not re-published.
    pub fn is_registered(&self, vessel: VesselId) -> bool {
        self.state.registered.contains(&vessel)
    }
}
