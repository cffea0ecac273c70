//! Storm types, constants, and resources.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::partitions::PartitionId;
use crate::Saveable;

// =============================================================================
// Constants
// =============================================================================

/// Lower bound of the intensity domain.
pub const MIN_INTENSITY: f32 = 0.0;

/// Upper bound of the intensity domain.
pub const MAX_INTENSITY: f32 = 1.0;

/// Lower bound of a freshly rolled storm intensity.
pub const STORM_ROLL_MIN: f32 = 0.05;

/// Upper bound of a freshly rolled storm intensity.
pub const STORM_ROLL_MAX: f32 = 0.95;

// =============================================================================
// Phase
// =============================================================================

/// Where a partition sits in the storm cycle.
///
/// `Starting` and `Stopping` are transient: they are reported for exactly one
/// control cycle on entry/exit and then collapse to `Active`/`NotActive`.
/// The collapse is deterministic, so replicas perform it locally and the
/// steady phase never needs its own broadcast.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum StormPhase {
    NotActive,
    Starting,
    Active,
    Stopping,
}

impl StormPhase {
    /// Stable wire/persistence ordinal.
    pub fn as_ordinal(self) -> u8 {
        match self {
            StormPhase::NotActive => 0,
            StormPhase::Starting => 1,
            StormPhase::Active => 2,
            StormPhase::Stopping => 3,
        }
    }

    /// Inverse of [`as_ordinal`](Self::as_ordinal). Unknown ordinals are the
    /// caller's problem to drop or default.
    pub fn from_ordinal(ordinal: u8) -> Option<StormPhase> {
        match ordinal {
            0 => Some(StormPhase::NotActive),
            1 => Some(StormPhase::Starting),
            2 => Some(StormPhase::Active),
            3 => Some(StormPhase::Stopping),
            _ => None,
        }
    }

    /// The steady phase a transient collapses to after its one-cycle dwell.
    /// Steady phases return themselves.
    pub fn collapse(self) -> StormPhase {
        match self {
            StormPhase::Starting => StormPhase::Active,
            StormPhase::Stopping => StormPhase::NotActive,
            steady => steady,
        }
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            StormPhase::NotActive => "NotActive",
            StormPhase::Starting => "Starting",
            StormPhase::Active => "Active",
            StormPhase::Stopping => "Stopping",
        }
    }
}

// =============================================================================
// Record + store
// =============================================================================

/// Authoritative per-partition storm state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StormRecord {
    /// Rain strength in `[MIN_INTENSITY, MAX_INTENSITY]`. Never NaN.
    pub intensity: f32,
    pub phase: StormPhase,
}

impl Default for StormRecord {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            phase: StormPhase::NotActive,
        }
    }
}

/// One persisted store entry. Absent partitions imply defaults.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct StormSaveEntry {
    pub partition: i32,
    pub intensity: f32,
    pub phase: u8,
}

/// Authoritative map of partition to storm record.
///
/// Single-writer: only the control cycle mutates records, via [`set`]
/// (which also marks the store dirty for the persistence layer). Everyone
/// else reads snapshots through [`snapshot`].
///
/// [`set`]: Self::set
/// [`snapshot`]: Self::snapshot
#[derive(Resource, Debug, Clone, Default)]
pub struct StormStore {
    records: BTreeMap<PartitionId, StormRecord>,
    dirty: bool,
}

impl StormStore {
    /// Current record for a partition, creating the default entry on first
    /// reference. Lazy creation is not a mutation: an entry that was never
    /// `set` recovers to defaults anyway.
    pub fn record(&mut self, partition: PartitionId) -> StormRecord {
        *self.records.entry(partition).or_default()
    }

    /// Read-only view of a partition's record; absent entries read as the
    /// default record.
    pub fn snapshot(&self, partition: PartitionId) -> StormRecord {
        self.records.get(&partition).copied().unwrap_or_default()
    }

    /// Overwrite a partition's record and mark the store dirty.
    ///
    /// Enforces the intensity invariant at the boundary: the stored value is
    /// clamped to the domain and NaN collapses to zero.
    pub fn set(&mut self, partition: PartitionId, intensity: f32, phase: StormPhase) {
        let intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
        };
        self.records
            .insert(partition, StormRecord { intensity, phase });
        self.dirty = true;
    }

    /// Whether a mutation since the last flush is awaiting persistence.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by the persistence layer after a successful flush.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Number of partitions that have ever been referenced.
    pub fn partition_count(&self) -> usize {
        self.records.len()
    }

    /// Snapshot of every record for the persistence boundary.
    pub fn entries(&self) -> Vec<StormSaveEntry> {
        self.records
            .iter()
            .map(|(partition, record)| StormSaveEntry {
                partition: partition.0,
                intensity: record.intensity,
                phase: record.phase.as_ordinal(),
            })
            .collect()
    }

    /// Rebuild a store from persisted entries, sanitizing as it goes.
    ///
    /// Out-of-domain intensities are clamped; transient phases collapse to
    /// their steady successor (their one-cycle dwell is a promise to live
    /// observers, not something to replay after a restart); a phase that
    /// contradicts the intensity is repaired toward the steady phase the
    /// intensity implies. Entries that cannot be sanitized (non-finite
    /// intensity, unknown ordinal) are dropped and revert to defaults.
    pub fn restore(entries: Vec<StormSaveEntry>) -> Self {
        let mut records = BTreeMap::new();
        for entry in entries {
            let partition = PartitionId(entry.partition);

            if !entry.intensity.is_finite() {
                warn!(
                    "StormStore: dropping partition {} with non-finite intensity",
                    partition.0
                );
                continue;
            }
            let Some(phase) = StormPhase::from_ordinal(entry.phase) else {
                warn!(
                    "StormStore: dropping partition {} with unknown phase ordinal {}",
                    partition.0, entry.phase
                );
                continue;
            };

            let intensity = entry.intensity.clamp(MIN_INTENSITY, MAX_INTENSITY);
            let mut phase = phase.collapse();
            if intensity > 0.0 && phase == StormPhase::NotActive {
                phase = StormPhase::Active;
            } else if intensity == 0.0 && phase == StormPhase::Active {
                phase = StormPhase::NotActive;
            }

            records.insert(partition, StormRecord { intensity, phase });
        }
        Self {
            records,
            dirty: false,
        }
    }
}

impl Saveable for StormStore {
    const SAVE_KEY: &'static str = "storms";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.records.is_empty() {
            return None;
        }
        Some(bitcode::encode(&self.entries()))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        match bitcode::decode::<Vec<StormSaveEntry>>(bytes) {
            Ok(entries) => Self::restore(entries),
            Err(e) => {
                warn!(
                    "StormStore: failed to decode save data, falling back to defaults: {}",
                    e
                );
                Self::default()
            }
        }
    }
}

// =============================================================================
// Inbound signal
// =============================================================================

/// Inbound world-state signal: which partitions are currently precipitating.
///
/// Written by the out-of-scope world-state collaborator once per cycle; the
/// partitions present in the map are the ones the control cycle evaluates.
/// A partition absent from the map is not simulated this cycle (its record
/// keeps its last value).
#[derive(Resource, Debug, Clone, Default)]
pub struct PrecipitationSignal {
    signals: BTreeMap<PartitionId, bool>,
}

impl PrecipitationSignal {
    /// Report the precipitation state for a partition, adding it to the
    /// evaluated set.
    pub fn report(&mut self, partition: PartitionId, precipitating: bool) {
        self.signals.insert(partition, precipitating);
    }

    /// Remove a partition from the evaluated set (e.g. its world unloaded).
    pub fn clear(&mut self, partition: PartitionId) {
        self.signals.remove(&partition);
    }

    /// Whether a partition is currently precipitating; unreported partitions
    /// read as dry.
    pub fn is_precipitating(&self, partition: PartitionId) -> bool {
        self.signals.get(&partition).copied().unwrap_or(false)
    }

    /// Iterate the evaluated set.
    pub fn iter(&self) -> impl Iterator<Item = (PartitionId, bool)> + '_ {
        self.signals.iter().map(|(&p, &b)| (p, b))
    }
}

// =============================================================================
// Outbound events
// =============================================================================

/// The replication message: the entire wire contract this core exposes.
///
/// Delivery is best-effort and last-value-wins per partition; there is no
/// ordering requirement across partitions. The byte encoding is the
/// transport's concern.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct StormSync {
    pub partition: PartitionId,
    /// Intensity in `[0, 1]`.
    pub intensity: f32,
    /// `StormPhase` ordinal, `0..=3`.
    pub phase_ordinal: u8,
}

impl StormSync {
    pub fn from_record(partition: PartitionId, record: &StormRecord) -> Self {
        Self {
            partition,
            intensity: record.intensity,
            phase_ordinal: record.phase.as_ordinal(),
        }
    }
}

/// Which edge of the storm cycle a transition event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Starting,
    Stopping,
}

/// Fired exactly once per transition into `Starting` or `Stopping`, for the
/// user-messaging collaborator.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StormTransition {
    pub partition: PartitionId,
    pub kind: TransitionKind,
}
