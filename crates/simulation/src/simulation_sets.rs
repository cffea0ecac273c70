//! Deterministic control-cycle ordering via `SystemSet` phases.
//!
//! These sets establish a contract for system execution order within the
//! `FixedUpdate` schedule. Plugins place their systems into the appropriate
//! set so inter-plugin ordering is explicit rather than relying on implicit
//! timing assumptions.
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Tick bookkeeping and inbound signal updates (the world-state
//!   collaborator writes `PrecipitationSignal` here).
//! * **Simulation** – The control cycle proper: per-partition storm evaluation
//!   and authoritative store mutation. Exactly one evaluation per partition
//!   per tick.
//! * **PostSim** – Fan-out and reporting: replica synchronization, transition
//!   announcements, notification collection, persistence flush. These consume
//!   what the control cycle produced and never feed back into it within the
//!   same tick.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain: `PreSim` → `Simulation` → `PostSim`. Plugins use
/// `.in_set(SimulationSet::X)` when registering systems, which gives automatic
/// ordering relative to the other phases while retaining the ability to add
/// fine-grained `.after()` / `.before()` constraints within a phase.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Tick bookkeeping and inbound signal updates.
    PreSim,
    /// The per-partition control cycle.
    Simulation,
    /// Replica fan-out, announcements, persistence.
    PostSim,
}
