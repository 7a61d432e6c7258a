// src/events/mod.rs

//! Globally ordered progress events.
//!
//! - [`sequencer`] holds the shared monotonic counter.
//! - [`event`] defines the immutable [`StreamEvent`] record.
//! - [`context`] provides [`EventContext`], which stamps events and hands
//!   them to a sink, and forks child contexts sharing one sequencer.
//! - [`ids`] generates message, part and step identifiers.
//! - [`sink`] defines the observer interface and a few implementations.
//!
//! ## Ordering guarantees
//! Every event published through contexts forked from one root carries a
//! distinct `sequence_number`, strictly increasing in emission order. Sinks
//! may observe events from concurrent contexts out of order; sorting by
//! `sequence_number` restores the total order.

pub mod context;
pub mod event;
pub mod ids;
pub mod sequencer;
pub mod sink;

pub use context::EventContext;
pub use event::{EventType, StreamEvent};
pub use ids::IdGenerator;
pub use sequencer::Sequencer;
pub use sink::{ChannelSink, EventSink, NullSink, TracingSink};
