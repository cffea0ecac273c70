//! User-facing notifications.
//!
//! Simulation systems emit `NotificationEvent`s; the collector archives them
//! in `NotificationLog` for the messaging collaborator to drain and render.
//! How (and whether) a notification is displayed, localized, or voiced is
//! out of scope here.

use bevy::prelude::*;

use crate::partitions::PartitionId;
use crate::TickCounter;

/// How many archived notifications the log retains before trimming the
/// oldest.
pub const MAX_LOG_ENTRIES: usize = 256;

/// Notification priority, from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NotificationPriority {
    /// Something went wrong and the user should know (e.g. a failed save).
    Warning,
    /// General information (storm transitions).
    Info,
    /// Good news.
    Positive,
}

impl NotificationPriority {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            NotificationPriority::Warning => "WARNING",
            NotificationPriority::Info => "INFO",
            NotificationPriority::Positive => "POSITIVE",
        }
    }
}

/// Event emitted by simulation systems to create a notification.
#[derive(Event, Debug, Clone)]
pub struct NotificationEvent {
    pub text: String,
    pub priority: NotificationPriority,
    /// The partition the notification concerns, if any.
    pub partition: Option<PartitionId>,
}

/// A collected notification.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Unique id, monotonically increasing.
    pub id: u64,
    pub text: String,
    pub priority: NotificationPriority,
    pub partition: Option<PartitionId>,
    /// Control cycle on which the notification was collected.
    pub tick: u64,
}

/// Archive of collected notifications, oldest first.
#[derive(Resource, Debug)]
pub struct NotificationLog {
    pub entries: Vec<Notification>,
    next_id: u64,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl NotificationLog {
    fn push(&mut self, event: &NotificationEvent, tick: u64) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Notification {
            id,
            text: event.text.clone(),
            priority: event.priority,
            partition: event.partition,
            tick,
        });
        if self.entries.len() > MAX_LOG_ENTRIES {
            let excess = self.entries.len() - MAX_LOG_ENTRIES;
            self.entries.drain(..excess);
        }
    }
}

/// Collect the cycle's notification events into the log.
pub fn collect_notifications(
    mut events: EventReader<NotificationEvent>,
    mut log: ResMut<NotificationLog>,
    tick: Res<TickCounter>,
) {
    for event in events.read() {
        log.push(event, tick.0);
    }
}

pub struct NotificationsPlugin;

impl Plugin for NotificationsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NotificationLog>()
            .add_event::<NotificationEvent>()
            .add_systems(
                FixedUpdate,
                collect_notifications
                    .in_set(crate::SimulationSet::PostSim)
                    .after(crate::storm::announce_transitions),
            );
    }
}
