//! # vessel-sync
//!
//! Authority arbitration and state synchronization for a real-time
//! multiplayer space simulation. Many peers observe and mutate a shared set
//! of physically simulated vessels whose state must converge despite
//! independent local clocks running at different time-acceleration rates
//! ("subspaces"), and despite the impossibility of two peers driving the
//! same vessel's physics at once.
//!
//! The crate is the arbitration core only. Physics, rendering, wire
//! encoding and delivery live behind the [`Simulation`], [`Transport`] and
//! [`Notices`] collaborator traits; the engine holds shadows of identity,
//! timestamps and ownership, never geometry.
//!
//! One [`SyncEngine::tick`] per simulation frame drains the due entries of
//! the per-subspace delay queues, applies them, recomputes who may drive
//! what, and schedules outbound publishes under a per-tick budget.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bubble;
mod crew;
mod engine;
mod guard;
mod messages;
mod ownership;
mod queue;
mod scheduler;
mod sim;
mod spectate;
mod transport;
mod types;

pub use bubble::{SafetyBubble, SurfaceAnchor};
pub use crew::CrewReconciler;
pub use engine::{
    config::SyncConfig,
    error::ApplyError,
    SyncEngine,
};
pub use guard::ConflictGuard;
pub use messages::{
    ActionGroup, ActionGroups, ControlState, CrewRecord, CrewStatus, DestructiveOp,
    KinematicFrame, OrbitalElements, PartSnapshot, VesselSnapshot, VesselUpdate,
};
pub use ownership::OwnershipArbiter;
pub use queue::{ActiveClaim, DueBatch, InboundQueues};
pub use scheduler::UpdateScheduler;
pub use sim::{ProximityClass, Simulation, SimulationError, VesselObservation};
pub use spectate::{SpectateReason, SpectateTracker};
pub use transport::{NoNotices, Notices, Transport};
pub use types::{distance, BodyId, CrewId, PlanetTime, PlayerId, Seconds, SubspaceId, VesselId};
