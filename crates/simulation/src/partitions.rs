//! Partition identity and per-partition settings.
//!
//! A partition is an independent simulation domain. Partitions have no
//! ordering or hierarchy between them; the id is an opaque handle supplied
//! by the world-state collaborator.
//!
//! Settings are created lazily with defaults the first time a partition is
//! referenced, and can be overridden programmatically (parsing overrides out
//! of config files is a collaborator concern). A partition with weather
//! disabled is never simulated and its replicas classify as `Disabled`,
//! falling back to whatever stock behavior the presentation layer has.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Saveable;

/// Opaque identifier for an independent simulation domain.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct PartitionId(pub i32);

/// Per-partition behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PartitionSettings {
    /// Whether the weather simulation manages this partition. When `false`,
    /// observers of the partition render stock weather untouched.
    pub weather_enabled: bool,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            weather_enabled: true,
        }
    }
}

/// Registry of per-partition settings overrides.
///
/// Partitions without an explicit entry use `PartitionSettings::default()`,
/// so looking up a never-seen partition is not an error.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize, Encode, Decode)]
pub struct PartitionRegistry {
    overrides: BTreeMap<PartitionId, PartitionSettings>,
}

impl PartitionRegistry {
    /// Settings for a partition, falling back to defaults when no override
    /// has been recorded.
    pub fn settings(&self, partition: PartitionId) -> PartitionSettings {
        self.overrides
            .get(&partition)
            .copied()
            .unwrap_or_default()
    }

    /// Whether the weather simulation manages this partition.
    pub fn weather_enabled(&self, partition: PartitionId) -> bool {
        self.settings(partition).weather_enabled
    }

    /// Record an override for a partition, creating its entry if absent.
    pub fn set_weather_enabled(&mut self, partition: PartitionId, enabled: bool) {
        self.overrides.entry(partition).or_default().weather_enabled = enabled;
    }

    /// Number of partitions with explicit overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Saveable for PartitionRegistry {
    const SAVE_KEY: &'static str = "partition_settings";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.overrides.is_empty() {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_or_warn(Self::SAVE_KEY, bytes)
    }
}

pub struct PartitionsPlugin;

impl Plugin for PartitionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PartitionRegistry>();
        app.init_resource::<crate::SaveableRegistry>();
        app.world_mut()
            .resource_mut::<crate::SaveableRegistry>()
            .register::<PartitionRegistry>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_partition_defaults_to_enabled() {
        let registry = PartitionRegistry::default();
        assert!(registry.weather_enabled(PartitionId(42)));
        assert_eq!(registry.override_count(), 0);
    }

    #[test]
    fn override_sticks() {
        let mut registry = PartitionRegistry::default();
        registry.set_weather_enabled(PartitionId(-1), false);

        assert!(!registry.weather_enabled(PartitionId(-1)));
        assert!(registry.weather_enabled(PartitionId(0)));
        assert_eq!(registry.override_count(), 1);
    }

    #[test]
    fn save_skips_empty_registry() {
        let registry = PartitionRegistry::default();
        assert!(registry.save_to_bytes().is_none());
    }

    #[test]
    fn save_roundtrip_preserves_overrides() {
        let mut registry = PartitionRegistry::default();
        registry.set_weather_enabled(PartitionId(7), false);
        registry.set_weather_enabled(PartitionId(3), true);

        let bytes = registry.save_to_bytes().expect("non-empty registry saves");
        let restored = PartitionRegistry::load_from_bytes(&bytes);

        assert!(!restored.weather_enabled(PartitionId(7)));
        assert!(restored.weather_enabled(PartitionId(3)));
        assert_eq!(restored.override_count(), 2);
    }
}
