//! Per-connection control state.
//!
//! A [`Connection`] exists from the moment the WebSocket upgrade succeeds
//! (authentication has already been checked by then) until the transport
//! closes. It owns at most one [`StreamingLoop`] at a time.
//!
//! A `read_camera` that arrives while a loop is running is ignored. If the
//! previous loop ended on its own (camera error, closed channel), the next
//! `read_camera` starts a fresh one. Closing or dropping the connection
//! cancels the active loop.

use std::time::Duration;

use uuid::Uuid;

use super::{FrameSink, StreamingLoop};
use crate::camera::SharedFrameSource;

pub const READ_CAMERA: &str = "read_camera";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    ReadCamera,
    Unsupported(String),
}

impl ControlMessage {
    /// Exact, case-sensitive match; anything else is unsupported.
    pub fn parse(text: &str) -> Self {
        if text == READ_CAMERA {
            ControlMessage::ReadCamera
        } else {
            ControlMessage::Unsupported(text.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upgraded,
    Streaming,
    Closed,
}

/// Outcome of handling one control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Started,
    AlreadyStreaming,
    Ignored,
    Closed,
}

pub struct Connection {
    id: Uuid,
    source: SharedFrameSource,
    sink: FrameSink,
    interval: Duration,
    active: Option<StreamingLoop>,
    closed: bool,
}

impl Connection {
    pub fn new(source: SharedFrameSource, sink: FrameSink, interval: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            sink,
            interval,
            active: None,
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        if self.closed {
            Phase::Closed
        } else if self.active.as_ref().is_some_and(StreamingLoop::is_running) {
            Phase::Streaming
        } else {
            Phase::Upgraded
        }
    }

    /// Id of the running loop, if any.
    pub fn active_loop(&self) -> Option<Uuid> {
        self.active
            .as_ref()
            .filter(|l| l.is_running())
            .map(StreamingLoop::id)
    }

    pub fn handle_text(&mut self, text: &str) -> Dispatch {
        self.dispatch(ControlMessage::parse(text))
    }

    pub fn dispatch(&mut self, message: ControlMessage) -> Dispatch {
        if self.closed {
            return Dispatch::Closed;
        }

        match message {
            ControlMessage::ReadCamera => {
                if let Some(running) = self.active.as_ref().filter(|l| l.is_running()) {
                    tracing::debug!(
                        conn_id = %self.id,
                        loop_id = %running.id(),
                        "Ignoring read_camera: stream already running"
                    );
                    return Dispatch::AlreadyStreaming;
                }

                let stream =
                    StreamingLoop::spawn(self.source.clone(), self.sink.clone(), self.interval);
                tracing::info!(conn_id = %self.id, loop_id = %stream.id(), "Camera stream started");
                self.active = Some(stream);
                Dispatch::Started
            }
            ControlMessage::Unsupported(text) => {
                tracing::warn!(conn_id = %self.id, "Unsupported function: {text}");
                Dispatch::Ignored
            }
        }
    }

    /// Marks the connection closed and cancels its loop. Idempotent.
    ///
    /// Returns the cancelled loop so the caller can await its exit.
    pub fn close(&mut self) -> Option<StreamingLoop> {
        if !self.closed {
            tracing::debug!(conn_id = %self.id, "Connection closed");
        }
        self.closed = true;
        let stream = self.active.take()?;
        stream.cancel();
        Some(stream)
    }
}
