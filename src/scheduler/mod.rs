//! Outbound update scheduler.
//!
//! Once per tick, decide which vessels to publish and at what fidelity. The
//! active vessel always goes first; the remaining full-fidelity vessels are
//! ranked by distance to the active vessel and evaluated up to a per-tick
//! budget. A full snapshot is sent when one was never sent or the snapshot
//! interval elapsed; otherwise an incremental update is sent at the
//! configured rate. At most one message per vessel per tick.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    bubble::SafetyBubble,
    crew::CrewReconciler,
    engine::config::SyncConfig,
    messages::{KinematicFrame, VesselUpdate},
    ownership::OwnershipArbiter,
    queue::InboundQueues,
    sim::Simulation,
    transport::{Notices, Transport},
    types::{distance, PlayerId, Seconds, VesselId},
};

/// Everything the scheduler consults but does not own.
pub(crate) struct OutboundCtx<'a> {
    pub sim: &'a dyn Simulation,
    pub transport: &'a mut dyn Transport,
    pub notices: &'a mut dyn Notices,
    pub ownership: &'a OwnershipArbiter,
    pub queues: &'a InboundQueues,
    pub crew: &'a mut CrewReconciler,
    pub registered: &'a mut HashSet<VesselId>,
    pub bubble: &'a SafetyBubble,
    pub allowed_parts: &'a HashSet<String>,
    pub config: &'a SyncConfig,
    pub local_player: PlayerId,
}

#[derive(Default)]
pub struct UpdateScheduler {
    /// Allow-list verdict per vessel, computed once and cached.
    parts_ok: HashMap<VesselId, bool>,
    /// Banned part names of the active vessel, kept for the throttled notice.
    active_banned_parts: Vec<String>,
    last_snapshot_sent: HashMap<VesselId, Seconds>,
    last_update_sent: HashMap<VesselId, Seconds>,
    last_banned_notice: Seconds,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear a vessel's snapshot timestamp so the next scheduler pass
    /// publishes a full snapshot, regardless of how recently one went out.
    /// Used when our active vessel was removed by a peer and when its part
    /// count changes.
    pub fn force_snapshot(&mut self, vessel: VesselId) {
        self.last_snapshot_sent.remove(&vessel);
    }

    /// Drop the cached allow-list verdict, forcing a re-check. Invoked on
    /// the same part-count-change signal that forces a snapshot, so docking
    /// and undocking cannot leave a stale verdict behind.
    pub fn invalidate_parts(&mut self, vessel: VesselId) {
        self.parts_ok.remove(&vessel);
    }

    /// Stamp a vessel as freshly synchronized, so a snapshot we just applied
    /// from the network is not immediately published back.
    pub fn mark_snapshot_applied(&mut self, vessel: VesselId, now: Seconds) {
        self.last_snapshot_sent.insert(vessel, now);
    }

    pub(crate) fn run(&mut self, ctx: &mut OutboundCtx<'_>) {
        if !ctx.sim.in_flight() {
            return;
        }
        let Some(active) = ctx.sim.active_vessel() else {
            return;
        };
        if !ctx.sim.is_full_fidelity(active) {
            return;
        }
        let Some(active_pos) = ctx.sim.world_position(active) else {
            return;
        };
        let Some(active_body) = ctx.sim.body_of(active) else {
            return;
        };
        if ctx.bubble.contains(ctx.sim, active_pos, active_body) {
            return;
        }

        // The active vessel is unconditional, at priority distance zero.
        self.send_if_needed(ctx, active, active, 0.0);

        // Candidate secondaries: loaded full-fidelity vessels that are not
        // claimed by anyone, not in the bubble, and not already mutated in
        // the future by a more advanced peer.
        let local_time = ctx.sim.planet_time();
        let mut secondaries: Vec<(f64, VesselId)> = Vec::new();
        for vessel in ctx.sim.vessel_ids() {
            if vessel == active || !ctx.sim.is_full_fidelity(vessel) {
                continue;
            }
            let (Some(pos), Some(body)) =
                (ctx.sim.world_position(vessel), ctx.sim.body_of(vessel))
            else {
                continue;
            };
            if ctx.bubble.contains(ctx.sim, pos, body) {
                continue;
            }
            if ctx.ownership.is_claimed(vessel) {
                continue;
            }
            if ctx.queues.is_future_mutated(vessel, local_time) {
                continue;
            }
            secondaries.push((distance(active_pos, pos), vessel));
        }
        secondaries.sort_by(|a, b| a.0.total_cmp(&b.0));

        for &(dist, vessel) in secondaries
            .iter()
            .take(ctx.config.max_secondary_vessels_per_tick)
        {
            self.send_if_needed(ctx, vessel, active, dist);
        }
    }

    fn send_if_needed(
        &mut self,
        ctx: &mut OutboundCtx<'_>,
        vessel: VesselId,
        active: VesselId,
        our_distance: f64,
    ) {
        let now = ctx.sim.realtime();
        let is_active = vessel == active;

        if !self.parts_allowed(ctx, vessel, is_active) {
            if is_active && (now - self.last_banned_notice) > ctx.config.notice_interval {
                self.last_banned_notice = now;
                ctx.notices.banned_parts(vessel, &self.active_banned_parts);
            }
            return;
        }

        // Closer-peer suppression: when a foreign-owned vessel sits closer
        // to the candidate than we do, that peer is the better observer.
        // Never applies to the active vessel.
        if !is_active {
            for foreign in ctx.ownership.foreign_owned_vessels(ctx.local_player) {
                let (Some(foreign_pos), Some(candidate_pos)) = (
                    ctx.sim.world_position(foreign),
                    ctx.sim.world_position(vessel),
                ) else {
                    continue;
                };
                if our_distance > distance(foreign_pos, candidate_pos) {
                    return;
                }
            }
        }

        let snapshot_due = self
            .last_snapshot_sent
            .get(&vessel)
            .is_none_or(|sent| (now - sent) > ctx.config.snapshot_interval);
        let update_due = self
            .last_update_sent
            .get(&vessel)
            .is_none_or(|sent| (now - sent) > 1.0 / ctx.config.send_rate);

        if snapshot_due {
            match ctx.sim.snapshot(vessel) {
                Ok(snapshot) if snapshot.is_well_formed() => {
                    self.last_snapshot_sent.insert(vessel, now);
                    // A snapshot carries position too; hold the next
                    // incremental back a full interval.
                    self.last_update_sent.insert(vessel, now);
                    ctx.crew.publish_changes(&snapshot, ctx.sim, ctx.transport);
                    ctx.registered.insert(vessel);
                    ctx.transport.send_snapshot(&snapshot);
                }
                Ok(_) => {
                    debug!("Extracted snapshot for {vessel} has no parts, not sending");
                }
                Err(err) => {
                    // Transient: the interval re-triggers next tick.
                    debug!("Failed to extract snapshot for {vessel}: {err}");
                }
            }
        } else if update_due {
            match build_update(ctx.sim, vessel, ctx.config) {
                Ok(update) => {
                    self.last_update_sent.insert(vessel, now);
                    ctx.transport.send_update(&update);
                }
                Err(err) => {
                    debug!("Failed to extract update for {vessel}: {err}");
                }
            }
        }
    }

    /// Check the vessel's parts against the allow-list, caching the verdict
    /// per vessel id.
    fn parts_allowed(&mut self, ctx: &mut OutboundCtx<'_>, vessel: VesselId, is_active: bool) -> bool {
        if let Some(ok) = self.parts_ok.get(&vessel) {
            return *ok;
        }
        let mut banned: Vec<String> = Vec::new();
        for part in ctx.sim.part_names(vessel) {
            if !ctx.allowed_parts.contains(&part) && !banned.contains(&part) {
                banned.push(part);
            }
        }
        let ok = banned.is_empty();
        if is_active {
            self.active_banned_parts = banned;
        }
        self.parts_ok.insert(vessel, ok);
        ok
    }
}

/// Derive an incremental update from the live vessel state: surface frame
/// below the altitude ceiling, orbital elements above it.
fn build_update(
    sim: &dyn Simulation,
    vessel: VesselId,
    config: &SyncConfig,
) -> Result<VesselUpdate, crate::sim::SimulationError> {
    let obs = sim.observe(vessel)?;
    let frame = if obs.altitude < config.surface_frame_ceiling {
        KinematicFrame::Surface {
            latitude: obs.latitude,
            longitude: obs.longitude,
            altitude: obs.altitude,
            velocity: obs.surface_velocity,
        }
    } else {
        KinematicFrame::Orbital(obs.orbit)
    };
    Ok(VesselUpdate {
        vessel,
        planet_time: sim.planet_time(),
        body: obs.body,
        forward: obs.forward,
        up: obs.up,
        angular_velocity: obs.angular_velocity,
        control: obs.control,
        action_groups: obs.action_groups,
        frame,
    })
}
