//! Unit tests for the storm store and control cycle.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::notifications::{NotificationEvent, NotificationPriority};
    use crate::partitions::{PartitionId, PartitionRegistry};
    use crate::sim_rng::SimRng;
    use crate::storm::systems::{announce_transitions, update_storms};
    use crate::storm::types::{
        PrecipitationSignal, StormPhase, StormRecord, StormSaveEntry, StormStore, StormSync,
        StormTransition, TransitionKind, STORM_ROLL_MAX, STORM_ROLL_MIN,
    };
    use crate::Saveable;

    // -------------------------------------------------------------------------
    // StormStore tests
    // -------------------------------------------------------------------------

    #[test]
    fn first_reference_creates_defaults() {
        let mut store = StormStore::default();
        let record = store.record(PartitionId(99));

        assert_eq!(record, StormRecord::default());
        assert_eq!(store.partition_count(), 1);
        assert!(!store.is_dirty(), "lazy creation is not a mutation");
    }

    #[test]
    fn set_marks_dirty_and_clamps() {
        let mut store = StormStore::default();
        store.set(PartitionId(0), 1.7, StormPhase::Active);

        assert!(store.is_dirty());
        assert_eq!(store.snapshot(PartitionId(0)).intensity, 1.0);

        store.mark_clean();
        assert!(!store.is_dirty());

        store.set(PartitionId(0), f32::NAN, StormPhase::Active);
        assert_eq!(store.snapshot(PartitionId(0)).intensity, 0.0);
    }

    #[test]
    fn restore_recovers_persisted_record() {
        let entries = vec![StormSaveEntry {
            partition: 7,
            intensity: 0.5,
            phase: StormPhase::Active.as_ordinal(),
        }];
        let store = StormStore::restore(entries);

        let record = store.snapshot(PartitionId(7));
        assert_eq!(record.intensity, 0.5);
        assert_eq!(record.phase, StormPhase::Active);
        assert!(!store.is_dirty());
    }

    #[test]
    fn restore_clamps_out_of_domain_intensity() {
        let entries = vec![StormSaveEntry {
            partition: 1,
            intensity: 3.0,
            phase: StormPhase::Active.as_ordinal(),
        }];
        let store = StormStore::restore(entries);
        assert_eq!(store.snapshot(PartitionId(1)).intensity, 1.0);
    }

    #[test]
    fn restore_drops_unsanitizable_entries() {
        let entries = vec![
            StormSaveEntry {
                partition: 1,
                intensity: f32::NAN,
                phase: 2,
            },
            StormSaveEntry {
                partition: 2,
                intensity: 0.4,
                phase: 200,
            },
        ];
        let store = StormStore::restore(entries);

        // Both entries dropped; the partitions revert to defaults.
        assert_eq!(store.partition_count(), 0);
        assert_eq!(store.snapshot(PartitionId(1)), StormRecord::default());
        assert_eq!(store.snapshot(PartitionId(2)), StormRecord::default());
    }

    #[test]
    fn restore_collapses_transient_phases() {
        let entries = vec![
            StormSaveEntry {
                partition: 1,
                intensity: 0.3,
                phase: StormPhase::Starting.as_ordinal(),
            },
            StormSaveEntry {
                partition: 2,
                intensity: 0.0,
                phase: StormPhase::Stopping.as_ordinal(),
            },
        ];
        let store = StormStore::restore(entries);

        assert_eq!(store.snapshot(PartitionId(1)).phase, StormPhase::Active);
        assert_eq!(store.snapshot(PartitionId(2)).phase, StormPhase::NotActive);
    }

    #[test]
    fn restore_repairs_phase_intensity_mismatch() {
        let entries = vec![
            StormSaveEntry {
                partition: 1,
                intensity: 0.6,
                phase: StormPhase::NotActive.as_ordinal(),
            },
            StormSaveEntry {
                partition: 2,
                intensity: 0.0,
                phase: StormPhase::Active.as_ordinal(),
            },
        ];
        let store = StormStore::restore(entries);

        assert_eq!(store.snapshot(PartitionId(1)).phase, StormPhase::Active);
        assert_eq!(store.snapshot(PartitionId(2)).phase, StormPhase::NotActive);
    }

    #[test]
    fn saveable_roundtrip() {
        let mut store = StormStore::default();
        store.set(PartitionId(7), 0.5, StormPhase::Active);
        store.set(PartitionId(-3), 0.0, StormPhase::NotActive);

        let bytes = store.save_to_bytes().expect("non-empty store saves");
        let restored = StormStore::load_from_bytes(&bytes);

        assert_eq!(restored.snapshot(PartitionId(7)).intensity, 0.5);
        assert_eq!(restored.snapshot(PartitionId(7)).phase, StormPhase::Active);
        assert_eq!(
            restored.snapshot(PartitionId(-3)),
            StormRecord::default()
        );
        assert_eq!(restored.partition_count(), 2);
    }

    #[test]
    fn saveable_skips_empty_store() {
        assert!(StormStore::default().save_to_bytes().is_none());
    }

    #[test]
    fn saveable_corrupt_bytes_fall_back_to_defaults() {
        let restored = StormStore::load_from_bytes(&[0x00, 0x01, 0x02]);
        assert_eq!(restored.partition_count(), 0);
    }

    // -------------------------------------------------------------------------
    // PrecipitationSignal tests
    // -------------------------------------------------------------------------

    #[test]
    fn unreported_partition_reads_dry() {
        let mut signal = PrecipitationSignal::default();
        assert!(!signal.is_precipitating(PartitionId(5)));

        signal.report(PartitionId(5), true);
        assert!(signal.is_precipitating(PartitionId(5)));

        signal.clear(PartitionId(5));
        assert!(!signal.is_precipitating(PartitionId(5)));
        assert_eq!(signal.iter().count(), 0);
    }

    // -------------------------------------------------------------------------
    // Control cycle tests
    // -------------------------------------------------------------------------

    /// Minimal app running the control cycle under `Update` so plain
    /// `app.update()` advances one cycle.
    fn storm_test_app(seed: u64) -> App {
        let mut app = App::new();
        app.init_resource::<StormStore>()
            .init_resource::<PrecipitationSignal>()
            .init_resource::<PartitionRegistry>()
            .insert_resource(SimRng::from_seed_u64(seed))
            .add_event::<StormSync>()
            .add_event::<StormTransition>()
            .add_systems(Update, update_storms);
        app
    }

    fn report(app: &mut App, partition: i32, precipitating: bool) {
        app.world_mut()
            .resource_mut::<PrecipitationSignal>()
            .report(PartitionId(partition), precipitating);
    }

    fn drain_syncs(app: &mut App) -> Vec<StormSync> {
        app.world_mut()
            .resource_mut::<Events<StormSync>>()
            .drain()
            .collect()
    }

    fn drain_transitions(app: &mut App) -> Vec<StormTransition> {
        app.world_mut()
            .resource_mut::<Events<StormTransition>>()
            .drain()
            .collect()
    }

    fn snapshot(app: &App, partition: i32) -> StormRecord {
        app.world()
            .resource::<StormStore>()
            .snapshot(PartitionId(partition))
    }

    #[test]
    fn start_stop_scenario() {
        let mut app = storm_test_app(7);

        // Cycle 1: precipitation begins.
        report(&mut app, 0, true);
        app.update();

        let record = snapshot(&app, 0);
        assert_eq!(record.phase, StormPhase::Starting);
        assert!(
            (STORM_ROLL_MIN..=STORM_ROLL_MAX).contains(&record.intensity),
            "rolled intensity {} outside roll range",
            record.intensity
        );

        let syncs = drain_syncs(&mut app);
        assert_eq!(syncs.len(), 1);
        assert_eq!(syncs[0].partition, PartitionId(0));
        assert_eq!(syncs[0].intensity, record.intensity);
        assert_eq!(syncs[0].phase_ordinal, StormPhase::Starting.as_ordinal());

        let transitions = drain_transitions(&mut app);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].kind, TransitionKind::Starting);

        // Cycle 2: still precipitating. The transient collapses to Active,
        // the intensity is untouched (no re-roll while active), and nothing
        // is broadcast.
        let rolled = record.intensity;
        app.update();

        let record = snapshot(&app, 0);
        assert_eq!(record.phase, StormPhase::Active);
        assert_eq!(record.intensity, rolled);
        assert!(drain_syncs(&mut app).is_empty());
        assert!(drain_transitions(&mut app).is_empty());

        // Cycle 3: precipitation ends.
        report(&mut app, 0, false);
        app.update();

        let record = snapshot(&app, 0);
        assert_eq!(record.phase, StormPhase::Stopping);
        assert_eq!(record.intensity, 0.0);

        let syncs = drain_syncs(&mut app);
        assert_eq!(syncs.len(), 1);
        assert_eq!(syncs[0].intensity, 0.0);
        assert_eq!(syncs[0].phase_ordinal, StormPhase::Stopping.as_ordinal());

        let transitions = drain_transitions(&mut app);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].kind, TransitionKind::Stopping);

        // Cycle 4: the transient collapses and the wire stays quiet.
        app.update();
        assert_eq!(snapshot(&app, 0).phase, StormPhase::NotActive);
        assert!(drain_syncs(&mut app).is_empty());
        assert!(drain_transitions(&mut app).is_empty());
    }

    #[test]
    fn steady_cycles_never_broadcast() {
        let mut app = storm_test_app(1);
        report(&mut app, 4, true);
        app.update();
        app.update();
        drain_syncs(&mut app);
        drain_transitions(&mut app);

        // Two further steady cycles in active rain: zero publishes.
        app.update();
        app.update();
        assert!(drain_syncs(&mut app).is_empty());
        assert!(drain_transitions(&mut app).is_empty());
    }

    #[test]
    fn dry_partition_never_broadcasts() {
        let mut app = storm_test_app(1);
        report(&mut app, 0, false);
        app.update();
        app.update();

        assert!(drain_syncs(&mut app).is_empty());
        assert_eq!(snapshot(&app, 0), StormRecord::default());
        assert!(
            !app.world().resource::<StormStore>().is_dirty(),
            "steady cycles must not dirty the store"
        );
    }

    #[test]
    fn rain_restarting_right_after_stop() {
        let mut app = storm_test_app(3);
        report(&mut app, 0, true);
        app.update(); // Starting
        report(&mut app, 0, false);
        app.update(); // collapses to Active, then fires Stopping
        assert_eq!(snapshot(&app, 0).phase, StormPhase::Stopping);
        drain_syncs(&mut app);
        drain_transitions(&mut app);

        report(&mut app, 0, true);
        app.update(); // collapses to NotActive, then fires Starting again

        let record = snapshot(&app, 0);
        assert_eq!(record.phase, StormPhase::Starting);
        assert!(record.intensity > 0.0);
        assert_eq!(drain_syncs(&mut app).len(), 1);
        let transitions = drain_transitions(&mut app);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].kind, TransitionKind::Starting);
    }

    #[test]
    fn partitions_evolve_independently() {
        let mut app = storm_test_app(11);
        report(&mut app, 1, true);
        report(&mut app, 2, false);
        app.update();

        assert_eq!(snapshot(&app, 1).phase, StormPhase::Starting);
        assert_eq!(snapshot(&app, 2), StormRecord::default());

        let syncs = drain_syncs(&mut app);
        assert_eq!(syncs.len(), 1);
        assert_eq!(syncs[0].partition, PartitionId(1));
    }

    #[test]
    fn unsignaled_partition_is_left_alone() {
        let mut app = storm_test_app(5);
        app.world_mut()
            .resource_mut::<StormStore>()
            .set(PartitionId(9), 0.5, StormPhase::Active);
        app.world_mut().resource_mut::<StormStore>().mark_clean();

        // Partition 9 is not in the signal set: its record must not move.
        report(&mut app, 0, false);
        app.update();

        let record = snapshot(&app, 9);
        assert_eq!(record.intensity, 0.5);
        assert_eq!(record.phase, StormPhase::Active);
        assert!(drain_syncs(&mut app).is_empty());
    }

    #[test]
    fn phase_tracks_intensity_invariant() {
        let mut app = storm_test_app(13);
        report(&mut app, 0, true);

        for cycle in 0..6 {
            if cycle == 3 {
                report(&mut app, 0, false);
            }
            app.update();

            let record = snapshot(&app, 0);
            match record.phase {
                StormPhase::NotActive | StormPhase::Stopping => {
                    assert_eq!(record.intensity, 0.0, "cycle {cycle}: {record:?}");
                }
                StormPhase::Starting | StormPhase::Active => {
                    assert!(record.intensity > 0.0, "cycle {cycle}: {record:?}");
                }
            }
        }
    }

    #[test]
    fn transitions_surface_exactly_one_notification_each() {
        let mut app = storm_test_app(9);
        app.add_event::<NotificationEvent>();
        app.add_systems(Update, announce_transitions.after(update_storms));

        let drain_notifications = |app: &mut App| -> Vec<NotificationEvent> {
            app.world_mut()
                .resource_mut::<Events<NotificationEvent>>()
                .drain()
                .collect()
        };

        // Starting edge: one notification.
        report(&mut app, 0, true);
        app.update();
        let fired = drain_notifications(&mut app);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].text, "Rain is starting");
        assert_eq!(fired[0].priority, NotificationPriority::Info);
        assert_eq!(fired[0].partition, Some(PartitionId(0)));

        // Steady rain: silence.
        app.update();
        assert!(drain_notifications(&mut app).is_empty());

        // Stopping edge: one notification.
        report(&mut app, 0, false);
        app.update();
        let fired = drain_notifications(&mut app);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].text, "Rain is stopping");

        // Back to quiet.
        app.update();
        assert!(drain_notifications(&mut app).is_empty());
    }

    #[test]
    fn weather_disabled_partition_is_never_simulated() {
        let mut app = storm_test_app(2);
        app.world_mut()
            .resource_mut::<PartitionRegistry>()
            .set_weather_enabled(PartitionId(6), false);

        report(&mut app, 6, true);
        app.update();
        app.update();

        assert_eq!(snapshot(&app, 6), StormRecord::default());
        assert!(drain_syncs(&mut app).is_empty());
        assert!(drain_transitions(&mut app).is_empty());
    }

    #[test]
    fn identical_seeds_roll_identical_intensities() {
        let mut a = storm_test_app(42);
        let mut b = storm_test_app(42);
        for app in [&mut a, &mut b] {
            report(app, 0, true);
            app.update();
        }

        assert_eq!(snapshot(&a, 0).intensity, snapshot(&b, 0).intensity);
    }
}
