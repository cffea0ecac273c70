//! Observer-side replicas and message application.
//!
//! The control cycle publishes `StormSync` messages; event fan-out is the
//! in-process stand-in for whatever transport carries them to real clients.
//! Each observer holds a `StormReplica`: the last applied record plus the
//! classification cached from it. Applying a message overwrites the replica
//! wholesale -- there is no merging, so delivery only has to be last-value-
//! wins and applying the same message twice is a no-op.
//!
//! A freshly attached replica is resynchronized from the current
//! authoritative record rather than waiting for the next change broadcast.

use bevy::prelude::*;

use crate::classifier::{classify, Classification};
use crate::partitions::{PartitionId, PartitionRegistry};
use crate::storm::{StormPhase, StormRecord, StormStore, StormSync, MAX_INTENSITY, MIN_INTENSITY};

/// One observer's view of a partition's storm state.
#[derive(Component, Debug, Clone)]
pub struct StormReplica {
    /// The partition this replica observes.
    pub partition: PartitionId,
    /// Whether the partition is unmanaged; drives the `Disabled` sentinel.
    pub disabled: bool,
    /// Last applied record.
    pub snapshot: StormRecord,
    /// Classification cached from `snapshot`, read by presentation consumers
    /// once per frame.
    pub classification: Classification,
}

impl StormReplica {
    pub fn new(partition: PartitionId) -> Self {
        Self {
            partition,
            disabled: false,
            snapshot: StormRecord::default(),
            classification: Classification::default(),
        }
    }
}

/// Apply one replication message to a replica.
///
/// Overwrites the snapshot wholesale and recomputes the cached
/// classification. Idempotent. A message with an unknown phase ordinal is
/// dropped rather than poisoning the replica.
pub fn apply_sync(replica: &mut StormReplica, message: &StormSync) {
    let Some(phase) = StormPhase::from_ordinal(message.phase_ordinal) else {
        warn!(
            "replica for partition {}: dropping sync with unknown phase ordinal {}",
            message.partition.0, message.phase_ordinal
        );
        return;
    };
    let intensity = if message.intensity.is_nan() {
        0.0
    } else {
        message.intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
    };

    replica.snapshot = StormRecord { intensity, phase };
    replica.classification = classify(intensity, replica.disabled);
}

/// Resynchronize replicas attached this cycle from the authoritative store.
///
/// A reconnecting observer must receive the current record on attach, not
/// only future deltas; the partition registry decides whether the replica
/// runs disabled.
pub fn resync_new_replicas(
    store: Res<StormStore>,
    registry: Res<PartitionRegistry>,
    mut fresh: Query<&mut StormReplica, Added<StormReplica>>,
) {
    for mut replica in &mut fresh {
        let partition = replica.partition;
        replica.disabled = !registry.weather_enabled(partition);
        let record = store.snapshot(partition);
        replica.snapshot = record;
        replica.classification = classify(record.intensity, replica.disabled);
    }
}

/// Fan the cycle's replication messages out to every replica of the
/// partition they concern.
pub fn apply_storm_sync(
    mut messages: EventReader<StormSync>,
    mut replicas: Query<&mut StormReplica>,
) {
    for message in messages.read() {
        for mut replica in &mut replicas {
            if replica.partition == message.partition {
                apply_sync(&mut replica, message);
            }
        }
    }
}

pub struct ReplicationPlugin;

impl Plugin for ReplicationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (resync_new_replicas, apply_storm_sync)
                .chain()
                .in_set(crate::SimulationSet::PostSim),
        );
    }
}
