// src/events/sink.rs

//! Observers of the event stream.
//!
//! A sink receives every event published through a context tree. Delivery is
//! synchronous on the publishing thread, so a slow sink slows the publisher
//! down; errors and panics raised by a sink are caught by
//! [`crate::events::EventContext`] and only logged.

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tracing::debug;

use crate::events::StreamEvent;

/// Receives published events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &StreamEvent) -> Result<()>;
}

impl<F> EventSink for F
where
    F: Fn(&StreamEvent) -> Result<()> + Send + Sync,
{
    fn emit(&self, event: &StreamEvent) -> Result<()> {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &StreamEvent) -> Result<()> {
        Ok(())
    }
}

/// Logs every event at `debug` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &StreamEvent) -> Result<()> {
        debug!(
            seq = event.sequence_number(),
            event_type = %event.event_type(),
            run_id = %event.run_id(),
            scope = event.scope().unwrap_or("-"),
            data = %event.data(),
            "stream event"
        );
        Ok(())
    }
}

/// Forwards events into an unbounded Tokio channel the driver reads from.
///
/// Sending never blocks; once the receiver is dropped every emit fails
/// (and is logged by the publishing context).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &StreamEvent) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow!("event receiver dropped"))
    }
}
