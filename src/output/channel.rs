//! In-process channel sink
//!
//! Hands records to a consumer task over a bounded channel. The sink never
//! waits for capacity: a full channel is reported as backpressure so the
//! crawl cycle fails and is retried on the next tick.

use crate::output::traits::{IncidentEvent, IncidentSink, OutputError, OutputResult};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Sink feeding a bounded `tokio` channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<IncidentEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that consumes its records
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<IncidentEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Wraps an existing sender
    pub fn new(sender: mpsc::Sender<IncidentEvent>) -> Self {
        Self { sender }
    }
}

impl IncidentSink for ChannelSink {
    fn emit(&mut self, event: &IncidentEvent) -> OutputResult<()> {
        self.sender
            .try_send(event.clone())
            .map_err(|e| match e {
                TrySendError::Full(_) => OutputError::Backpressure,
                TrySendError::Closed(_) => OutputError::Closed,
            })
    }

    fn flush(&mut self) -> OutputResult<()> {
        if self.sender.is_closed() {
            return Err(OutputError::Closed);
        }
        Ok(())
    }
}
