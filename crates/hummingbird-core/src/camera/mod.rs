//! Frame capture.
//!
//! A [`FrameSource`] produces one JPEG still per call and may block while
//! doing so. The server owns exactly one source and hands out
//! [`SharedFrameSource`] clones, which serialise access behind a mutex and run
//! the blocking call on tokio's blocking pool.

pub mod command;
pub mod test_pattern;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub use command::CommandSource;
pub use test_pattern::TestPatternSource;

/// Something that can produce one encoded (JPEG) still image per call.
pub trait FrameSource: Send {
    fn capture(&mut self) -> CoreResult<Vec<u8>>;
}

/// Capture resolution presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    High,
    Medium,
    #[default]
    Low,
}

impl Resolution {
    /// Width and height in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::High => (1280, 720),
            Resolution::Medium => (640, 480),
            Resolution::Low => (320, 240),
        }
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Resolution::High),
            "medium" => Ok(Resolution::Medium),
            "low" => Ok(Resolution::Low),
            other => Err(CoreError::InvalidResolution(other.to_string())),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::High => "high",
            Resolution::Medium => "medium",
            Resolution::Low => "low",
        };
        f.write_str(name)
    }
}

/// Cloneable handle to the process-wide frame source.
///
/// Every capture takes the mutex for the duration of the call, so at most one
/// capture runs against the device at a time no matter how many connections
/// are streaming.
#[derive(Clone)]
pub struct SharedFrameSource {
    inner: Arc<Mutex<Box<dyn FrameSource>>>,
}

impl SharedFrameSource {
    pub fn new(source: impl FrameSource + 'static) -> Self {
        let source: Box<dyn FrameSource> = Box::new(source);
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    /// Captures one frame on the blocking pool.
    ///
    /// A panic inside the source is reported as [`CoreError::Capture`] rather
    /// than unwinding into the caller. The source stays usable afterwards.
    pub async fn capture(&self) -> CoreResult<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut source = inner.lock().unwrap_or_else(|poisoned| {
                tracing::warn!("Frame source panicked during an earlier capture; reusing it");
                inner.clear_poison();
                PoisonError::into_inner(poisoned)
            });
            source.capture()
        })
        .await
        .map_err(|e| CoreError::Capture(format!("capture task failed: {e}")))?
    }
}

impl fmt::Debug for SharedFrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedFrameSource").finish_non_exhaustive()
    }
}
