use std::sync::{Arc, Mutex};

use agentflow::{EventSink, EventType, StreamEvent};

/// Event sink that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<StreamEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events in delivery order.
    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events sorted by sequence number.
    pub fn ordered(&self) -> Vec<StreamEvent> {
        let mut events = self.events();
        events.sort_by_key(|e| e.sequence_number());
        events
    }

    pub fn of_type(&self, event_type: &EventType) -> Vec<StreamEvent> {
        self.ordered()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Values of `data.task` for events of the given type, in sequence order.
    pub fn tasks_for(&self, event_type: &EventType) -> Vec<String> {
        self.of_type(event_type)
            .iter()
            .filter_map(|e| e.data().get("task")?.as_str().map(str::to_string))
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &StreamEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
