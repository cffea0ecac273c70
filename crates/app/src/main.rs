//! Headless demo binary.
//!
//! Wires the simulation and save plugins into a `MinimalPlugins` app, drives
//! a scripted precipitation signal across two partitions (one of them with
//! weather disabled), and logs what the attached observers derive. Run it
//! twice to watch the second run recover the persisted state.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use save::{SavePlugin, StormSavePath};
use simulation::partitions::{PartitionId, PartitionRegistry};
use simulation::replication::{apply_storm_sync, StormReplica};
use simulation::storm::PrecipitationSignal;
use simulation::{SimulationPlugin, SimulationSet, TickCounter};

/// The partition the demo rains on.
const SURFACE: PartitionId = PartitionId(0);

/// A partition with weather disabled; its observer stays on stock behavior.
const CAVERNS: PartitionId = PartitionId(-1);

/// Control cycles the demo runs before exiting.
const DEMO_TICKS: u64 = 60;

fn main() {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(50))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins((SimulationPlugin, SavePlugin))
        .insert_resource(StormSavePath(
            std::env::temp_dir().join("squall_storms.bin"),
        ))
        .add_systems(
            Startup,
            attach_observers.after(save::load_storm_save),
        )
        .add_systems(
            FixedUpdate,
            drive_precipitation.in_set(SimulationSet::PreSim),
        )
        .add_systems(
            FixedUpdate,
            report_observers
                .in_set(SimulationSet::PostSim)
                .after(apply_storm_sync),
        )
        .run();
}

fn attach_observers(mut commands: Commands, mut registry: ResMut<PartitionRegistry>) {
    registry.set_weather_enabled(CAVERNS, false);
    commands.spawn(StormReplica::new(SURFACE));
    commands.spawn(StormReplica::new(CAVERNS));
    info!(
        "observers attached to partitions {} and {}",
        SURFACE.0, CAVERNS.0
    );
}

/// Scripted stand-in for the world-state collaborator: twenty wet cycles,
/// twenty dry, twenty wet again, then exit.
fn drive_precipitation(
    tick: Res<TickCounter>,
    mut signal: ResMut<PrecipitationSignal>,
    mut exit: EventWriter<AppExit>,
) {
    if tick.0 >= DEMO_TICKS {
        exit.send(AppExit::Success);
        return;
    }
    let raining = !(20..40).contains(&tick.0);
    signal.report(SURFACE, raining);
    signal.report(CAVERNS, raining);
}

/// Log every observer whose derived state changed this cycle.
fn report_observers(observers: Query<&StormReplica, Changed<StormReplica>>) {
    for replica in &observers {
        info!(
            "observer[partition {}]: {} (intensity {:.2}, fog {:.4}, assets '{}')",
            replica.partition.0,
            replica.classification.level.name(),
            replica.snapshot.intensity,
            replica.classification.fog_density,
            replica.classification.resource_key
        );
    }
}
