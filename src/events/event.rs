// src/events/event.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of stream events.
///
/// The lifecycle kinds are emitted by the scheduler itself; handlers publish
/// the step/text kinds or their own [`EventType::Custom`] kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStarted,
    RunFinished,
    RunHalted,
    TaskStarted,
    TaskCompleted,
    TaskFailed,
    TaskActivated,
    TaskSkipped,
    StepStart,
    StepFinish,
    TextStart,
    TextDelta,
    TextEnd,
    Custom(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::RunStarted => "run_started",
            EventType::RunFinished => "run_finished",
            EventType::RunHalted => "run_halted",
            EventType::TaskStarted => "task_started",
            EventType::TaskCompleted => "task_completed",
            EventType::TaskFailed => "task_failed",
            EventType::TaskActivated => "task_activated",
            EventType::TaskSkipped => "task_skipped",
            EventType::StepStart => "step_start",
            EventType::StepFinish => "step_finish",
            EventType::TextStart => "text_start",
            EventType::TextDelta => "text_delta",
            EventType::TextEnd => "text_end",
            EventType::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "run_started" => EventType::RunStarted,
            "run_finished" => EventType::RunFinished,
            "run_halted" => EventType::RunHalted,
            "task_started" => EventType::TaskStarted,
            "task_completed" => EventType::TaskCompleted,
            "task_failed" => EventType::TaskFailed,
            "task_activated" => EventType::TaskActivated,
            "task_skipped" => EventType::TaskSkipped,
            "step_start" => EventType::StepStart,
            "step_finish" => EventType::StepFinish,
            "text_start" => EventType::TextStart,
            "text_delta" => EventType::TextDelta,
            "text_end" => EventType::TextEnd,
            other => EventType::Custom(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        EventType::from(s.as_str())
    }
}

/// One emitted event.
///
/// Built only by [`crate::events::EventContext::publish`]; the sequence
/// number is assigned exactly once at that point and the record is never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    id: String,
    event_type: EventType,
    data: Value,
    run_id: String,
    parent_run_id: Option<String>,
    scope: Option<String>,
    message_id: String,
    sequence_number: u64,
    timestamp: DateTime<Utc>,
}

impl StreamEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        event_type: EventType,
        data: Value,
        run_id: String,
        parent_run_id: Option<String>,
        scope: Option<String>,
        message_id: String,
        sequence_number: u64,
    ) -> Self {
        Self {
            id,
            event_type,
            data,
            run_id,
            parent_run_id,
            scope,
            message_id,
            sequence_number,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn data(&self) -> &Value {
        &self.data
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

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
