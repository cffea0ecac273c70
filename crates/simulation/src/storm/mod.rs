//! Per-partition storm intensity: the authoritative store and control cycle.
//!
//! Each partition carries one `StormRecord` (intensity in `[0, 1]` plus a
//! phase). The control cycle evaluates every signaled partition once per
//! `FixedUpdate` tick: when precipitation begins, a fresh intensity is rolled
//! and the record enters `Starting`; when it ends, the intensity drops to
//! zero and the record enters `Stopping`. Both transient phases dwell for
//! exactly one cycle before collapsing to their steady successor.
//!
//! Replication is change-driven: a `StormSync` message and a
//! `StormTransition` event are emitted only on the cycle where a transition
//! fired, never on steady-state cycles.

mod systems;
mod tests;
mod types;

pub use systems::{announce_transitions, update_storms};
pub use types::{
    PrecipitationSignal, StormPhase, StormRecord, StormSaveEntry, StormStore, StormSync,
    StormTransition, TransitionKind, MAX_INTENSITY, MIN_INTENSITY, STORM_ROLL_MAX,
    STORM_ROLL_MIN,
};

use bevy::prelude::*;

pub struct StormPlugin;

impl Plugin for StormPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StormStore>()
            .init_resource::<PrecipitationSignal>()
            .add_event::<StormSync>()
            .add_event::<StormTransition>()
            .add_systems(
                FixedUpdate,
                update_storms.in_set(crate::SimulationSet::Simulation),
            )
            .add_systems(
                FixedUpdate,
                announce_transitions.in_set(crate::SimulationSet::PostSim),
            );

        app.init_resource::<crate::SaveableRegistry>();
        app.world_mut()
            .resource_mut::<crate::SaveableRegistry>()
            .register::<StormStore>();
    }
}
