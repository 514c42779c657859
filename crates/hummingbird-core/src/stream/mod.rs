//! The per-connection streaming loop.
//!
//! A [`StreamingLoop`] is a spawned task that, once per tick, captures a frame
//! from the shared camera, base64-encodes it and pushes it into the owning
//! connection's outbound channel. It stops for good on the first of:
//!
//! - cancellation by the owner ([`StopReason::Cancelled`]),
//! - a closed outbound channel ([`StopReason::PushFailed`]),
//! - a capture error ([`StopReason::CaptureFailed`]).
//!
//! Cycles run one after another inside the task and the timer skips missed
//! ticks, so a slow camera lowers the frame rate instead of stacking up
//! overlapping captures. Frames therefore arrive in capture order.

pub mod connection;

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::camera::SharedFrameSource;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Sender half of a connection's outbound text channel.
pub type FrameSink = mpsc::Sender<String>;

/// Text-safe wire form of one frame.
pub fn encode_frame(jpeg: &[u8]) -> String {
    BASE64.encode(jpeg)
}

/// Why a streaming loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    PushFailed,
    CaptureFailed(String),
}

pub struct StreamingLoop {
    id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<StopReason>,
}

impl StreamingLoop {
    /// Spawns the loop on the current tokio runtime. The first tick fires immediately.
    pub fn spawn(source: SharedFrameSource, sink: FrameSink, interval: Duration) -> Self {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(id, source, sink, interval, cancel.clone()));
        tracing::debug!(loop_id = %id, ?interval, "Streaming loop started");

        Self { id, cancel, handle }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Requests a stop. Safe to call any number of times, including while a
    /// tick is in flight: no capture or push starts after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Waits for the task to end and reports why it did.
    pub async fn stopped(mut self) -> StopReason {
        match (&mut self.handle).await {
            Ok(reason) => reason,
            Err(e) => StopReason::CaptureFailed(format!("streaming task aborted: {e}")),
        }
    }
}

impl Drop for StreamingLoop {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    id: Uuid,
    source: SharedFrameSource,
    sink: FrameSink,
    interval: Duration,
    cancel: CancellationToken,
) -> StopReason {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let reason = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break StopReason::Cancelled,
            _ = ticker.tick() => {}
        }

        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => break StopReason::Cancelled,
            frame = source.capture() => frame,
        };

        let jpeg = match frame {
            Ok(jpeg) => jpeg,
            Err(e) => {
                tracing::warn!(loop_id = %id, "Stopping stream: {e}");
                break StopReason::CaptureFailed(e.to_string());
            }
        };

        let payload = encode_frame(&jpeg);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break StopReason::Cancelled,
            sent = sink.send(payload) => {
                if sent.is_err() {
                    break StopReason::PushFailed;
                }
            }
        }
    };

    tracing::debug!(loop_id = %id, ?reason, "Streaming loop stopped");
    reason
}
