//! Synchronous change notification.
//!
//! Observers run inside the mutating call, after the mutation is complete. They see the chart
//! through a shared reference and cannot mutate it while handling an event.

use crate::chart::SseqChart;
use crate::message::TargetType;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    ClassAdded(Uuid),
    StructlineAdded(Uuid),
    DifferentialAdded(Uuid),
    ExtensionAdded(Uuid),
    /// Fired for every edge, after the variant-specific event.
    EdgeAdded(Uuid),
    ObjectUpdated {
        uuid: Uuid,
        target_type: TargetType,
    },
    ObjectDeleted {
        uuid: Uuid,
        target_type: TargetType,
    },
    ChartUpdated,
    Cleared,
    /// Fired once at the end of every mutating call.
    Update,
}

pub type ObserverId = u64;

type Observer = Box<dyn FnMut(&SseqChart, &ChartEvent)>;

#[derive(Default)]
pub(crate) struct Observers {
    next_id: ObserverId,
    listeners: BTreeMap<ObserverId, Observer>,
}

impl Observers {
    pub(crate) fn insert(&mut self, observer: Observer) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, observer);
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn notify(&mut self, chart: &SseqChart, event: &ChartEvent) {
        for listener in self.listeners.values_mut() {
            listener(chart, event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
