//! Load-at-startup and flush-on-dirty systems.
//!
//! The flush is driven by the `StormStore` dirty flag: any cycle that
//! mutated a record ends with one atomic write of the full (tiny) state.
//! A failed write is logged, surfaced as a notification, and leaves the
//! flag set so the next cycle retries -- the control loop itself never
//! stalls on persistence.

use bevy::prelude::*;
use std::path::PathBuf;

use simulation::notifications::{NotificationEvent, NotificationPriority};
use simulation::storm::StormStore;
use simulation::{SaveableRegistry, SimulationSet};

use crate::atomic_write::atomic_write;
use crate::codec::{decode_save, encode_save};
use crate::save_error::SaveError;

/// Location of the weather save file: an opaque per-install path supplied
/// by the embedding application.
#[derive(Resource, Debug, Clone)]
pub struct StormSavePath(pub PathBuf);

impl Default for StormSavePath {
    fn default() -> Self {
        Self(PathBuf::from("squall_storms.bin"))
    }
}

/// Exclusive startup system: recover all registered resources from the save
/// file. A missing file means a fresh install; a corrupt one is logged and
/// everything stays at defaults.
pub fn load_storm_save(world: &mut World) {
    match load_inner(world) {
        Ok(true) => info!("weather state recovered from save file"),
        Ok(false) => info!("no weather save file; starting from defaults"),
        Err(e) => warn!("failed to load weather save, starting from defaults: {e}"),
    }
}

fn load_inner(world: &mut World) -> Result<bool, SaveError> {
    let path = world.resource::<StormSavePath>().0.clone();
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let extensions = decode_save(&bytes)?;
    world.resource_scope(|world, registry: Mut<SaveableRegistry>| {
        registry.load_all(world, &extensions);
    });
    Ok(true)
}

/// Exclusive post-simulation system: persist the cycle's mutations.
///
/// Runs every cycle but only touches the disk when the store is dirty. On
/// success the dirty flag clears; on failure it stays set and the write is
/// retried next cycle.
pub fn flush_storm_save(world: &mut World) {
    if !world.resource::<StormStore>().is_dirty() {
        return;
    }

    match flush_inner(world) {
        Ok(()) => {
            world.resource_mut::<StormStore>().mark_clean();
        }
        Err(e) => {
            warn!("weather save failed, will retry next cycle: {e}");
            world.send_event(NotificationEvent {
                text: format!("Could not save weather state: {e}"),
                priority: NotificationPriority::Warning,
                partition: None,
            });
        }
    }
}

fn flush_inner(world: &mut World) -> Result<(), SaveError> {
    let extensions = world.resource_scope(|world, registry: Mut<SaveableRegistry>| {
        registry.save_all(world)
    });
    let bytes = encode_save(&extensions);
    let path = world.resource::<StormSavePath>().0.clone();
    atomic_write(&path, &bytes)?;
    Ok(())
}

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StormSavePath>()
            .add_systems(Startup, load_storm_save)
            .add_systems(
                FixedUpdate,
                flush_storm_save.in_set(SimulationSet::PostSim),
            );
    }
}
