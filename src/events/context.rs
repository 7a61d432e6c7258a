// src/events/context.rs

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::warn;

use crate::config::EventConfig;
use crate::events::ids::IdGenerator;
use crate::events::sequencer::Sequencer;
use crate::events::sink::{EventSink, NullSink};
use crate::events::{EventType, StreamEvent};
use crate::utils::panic_message;

/// Publishing handle for one logical run scope.
///
/// A root context is created by the driver with a sink; every task gets a
/// [`fork`](Self::fork) of it. All forks share the root's [`Sequencer`] and
/// sink, so events from concurrently running tasks still form one total
/// order.
///
/// Publishing never fails: a sink error or panic is logged and swallowed.
#[derive(Clone)]
pub struct EventContext {
    sequencer: Sequencer,
    id_counter: Sequencer,
    sink: Arc<dyn EventSink>,
    ids: Arc<IdGenerator>,
    run_id: String,
    parent_run_id: Option<String>,
    scope: Option<String>,
    message_id: String,
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("run_id", &self.run_id)
            .field("parent_run_id", &self.parent_run_id)
            .field("scope", &self.scope)
            .field("message_id", &self.message_id)
            .field("sequence", &self.sequencer.current())
            .finish_non_exhaustive()
    }
}

impl EventContext {
    /// Root context with default id settings.
    pub fn new(sink: impl EventSink + 'static) -> Self {
        Self::with_config(Arc::new(sink), &EventConfig::default())
    }

    /// Root context whose events go nowhere.
    pub fn detached() -> Self {
        Self::new(NullSink)
    }

    /// Root context with explicit id settings.
    pub fn with_config(sink: Arc<dyn EventSink>, config: &EventConfig) -> Self {
        Self::with_sequencer(sink, config, Sequencer::new())
    }

    /// Root context continuing an existing sequence (e.g. a resumed session).
    pub fn with_sequencer(
        sink: Arc<dyn EventSink>,
        config: &EventConfig,
        sequencer: Sequencer,
    ) -> Self {
        let ids = IdGenerator::new(config);
        let run_id = ids.run_id();
        let message_id = ids.message_id();
        Self {
            sequencer,
            id_counter: Sequencer::new(),
            sink,
            ids: Arc::new(ids),
            run_id,
            parent_run_id: None,
            scope: None,
            message_id,
        }
    }

    /// Replace the message id stamped on subsequent events.
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    /// Build, stamp and deliver one event. The event is returned for callers
    /// that want to keep it.
    pub fn publish(&self, event_type: impl Into<EventType>, data: Value) -> StreamEvent {
        let event = StreamEvent::new(
            self.ids.event_id(),
            event_type.into(),
            data,
            self.run_id.clone(),
            self.parent_run_id.clone(),
            self.scope.clone(),
            self.message_id.clone(),
            self.sequencer.next(),
        );
        self.deliver(&event);
        event
    }

    /// Child context sharing sequencer and sink, with `parent_run_id` set to
    /// this context's run id.
    pub fn fork(&self, run_id: impl Into<String>, scope: impl Into<String>) -> EventContext {
        EventContext {
            sequencer: self.sequencer.clone(),
            id_counter: self.id_counter.clone(),
            sink: Arc::clone(&self.sink),
            ids: Arc::clone(&self.ids),
            run_id: run_id.into(),
            parent_run_id: Some(self.run_id.clone()),
            scope: Some(scope.into()),
            message_id: self.message_id.clone(),
        }
    }

    /// [`fork`](Self::fork) with a freshly generated run id.
    pub fn child(&self, scope: impl Into<String>) -> EventContext {
        self.fork(self.ids.run_id(), scope)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn parent_run_id(&self) -> Option<&str> {
        self.parent_run_id.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// A new part id, unique across every context of this tree.
    pub fn new_part_id(&self) -> String {
        self.ids.part_id(&self.message_id, self.id_counter.next())
    }

    /// Publish `step_start` and return the new step id.
    pub fn step_start(&self, name: &str) -> String {
        let step_id = self.ids.step_id(&self.message_id, self.id_counter.next());
        self.publish(
            EventType::StepStart,
            json!({ "step_id": step_id, "name": name }),
        );
        step_id
    }

    pub fn step_finish(&self, step_id: &str, data: Value) {
        self.publish(
            EventType::StepFinish,
            json!({ "step_id": step_id, "data": data }),
        );
    }

    /// Publish `text_start` and return the part id the deltas should use.
    pub fn text_start(&self) -> String {
        let part_id = self.new_part_id();
        self.publish(EventType::TextStart, json!({ "part_id": part_id }));
        part_id
    }

    pub fn text_delta(&self, part_id: &str, delta: &str) {
        self.publish(
            EventType::TextDelta,
            json!({ "part_id": part_id, "delta": delta }),
        );
    }

    pub fn text_end(&self, part_id: &str) {
        self.publish(EventType::TextEnd, json!({ "part_id": part_id }));
    }

    fn deliver(&self, event: &StreamEvent) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.sink.emit(event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(
                    seq = event.sequence_number(),
                    event_type = %event.event_type(),
                    run_id = %self.run_id,
                    error = %err,
                    "event sink returned an error; event dropped"
                );
            }
            Err(payload) => {
                warn!(
                    seq = event.sequence_number(),
                    event_type = %event.event_type(),
                    run_id = %self.run_id,
                    panic = %panic_message(payload.as_ref()),
                    "event sink panicked; event dropped"
                );
            }
        }
    }
}
