//! Control-cycle systems: transient decay, the transition rule, and
//! change-only emission.

use bevy::prelude::*;
use rand::Rng;

use crate::notifications::{NotificationEvent, NotificationPriority};
use crate::partitions::PartitionRegistry;
use crate::sim_rng::SimRng;

use super::types::{
    PrecipitationSignal, StormPhase, StormStore, StormSync, StormTransition, TransitionKind,
    STORM_ROLL_MAX, STORM_ROLL_MIN,
};

/// Evaluate every signaled partition once.
///
/// Partitions with weather disabled are skipped outright: their records stay
/// at defaults and their observers keep stock behavior.
///
/// Per partition, in order:
/// 1. Collapse a transient phase left over from the previous cycle
///    (`Starting → Active`, `Stopping → NotActive`). The collapse is
///    persisted but not broadcast -- replicas collapse identically.
/// 2. Apply the transition rule against the precipitation signal: a dry
///    partition turning wet rolls a fresh intensity and enters `Starting`;
///    a wet partition turning dry zeroes out and enters `Stopping`.
///    Anything else is steady state and leaves the record untouched.
/// 3. On a fired transition, publish one `StormSync` and one
///    `StormTransition`. Steady cycles publish nothing.
pub fn update_storms(
    signal: Res<PrecipitationSignal>,
    registry: Res<PartitionRegistry>,
    mut store: ResMut<StormStore>,
    mut rng: ResMut<SimRng>,
    mut sync: EventWriter<StormSync>,
    mut transitions: EventWriter<StormTransition>,
) {
    for (partition, precipitating) in signal.iter() {
        if !registry.weather_enabled(partition) {
            continue;
        }

        let current = store.record(partition);

        let mut next = current;
        next.phase = next.phase.collapse();

        let mut fired = None;
        if precipitating && next.intensity == 0.0 {
            next.intensity = rng.0.gen_range(STORM_ROLL_MIN..=STORM_ROLL_MAX);
            next.phase = StormPhase::Starting;
            fired = Some(TransitionKind::Starting);
            info!(
                "partition {}: storm starting, intensity {:.3}",
                partition.0, next.intensity
            );
        } else if !precipitating && next.intensity > 0.0 {
            next.intensity = 0.0;
            next.phase = StormPhase::Stopping;
            fired = Some(TransitionKind::Stopping);
            info!("partition {}: storm stopping", partition.0);
        }

        if next != current {
            store.set(partition, next.intensity, next.phase);
        }

        if let Some(kind) = fired {
            sync.send(StormSync::from_record(partition, &next));
            transitions.send(StormTransition { partition, kind });
        }
    }
}

/// Turn transition events into user-facing notifications, one per transition.
/// Text rendering and localization belong to the messaging collaborator; the
/// notification carries plain English and the partition it happened in.
pub fn announce_transitions(
    mut transitions: EventReader<StormTransition>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    for transition in transitions.read() {
        let text = match transition.kind {
            TransitionKind::Starting => "Rain is starting".to_string(),
            TransitionKind::Stopping => "Rain is stopping".to_string(),
        };
        notifications.send(NotificationEvent {
            text,
            priority: NotificationPriority::Info,
            partition: Some(transition.partition),
        });
    }
}
