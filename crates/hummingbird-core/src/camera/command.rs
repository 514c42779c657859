use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{FrameSource, Resolution};
use crate::error::{CoreError, CoreResult};

const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// How long a single capture may run before the child is killed.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Captures stills by running an external program that writes a JPEG to stdout.
///
/// This covers both supported cameras without linking vendor libraries:
/// `rpicam-still` for the Raspberry Pi camera module and `fswebcam` for USB
/// webcams.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    /// Kills the capture program if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a source from a full command line, program first.
    pub fn from_argv(argv: &[String]) -> CoreResult<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| CoreError::Capture("capture command is empty".to_string()))?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    /// Raspberry Pi camera module, mounted upside down.
    pub fn pi_camera(resolution: Resolution) -> Self {
        let (width, height) = resolution.dimensions();
        let args = vec![
            "--nopreview".to_string(),
            "--immediate".to_string(),
            "--hflip".to_string(),
            "--vflip".to_string(),
            "--width".to_string(),
            width.to_string(),
            "--height".to_string(),
            height.to_string(),
            "--encoding".to_string(),
            "jpg".to_string(),
            "--output".to_string(),
            "-".to_string(),
        ];
        Self::new("rpicam-still", args)
    }

    pub fn usb_camera(device: &Path, resolution: Resolution) -> Self {
        let (width, height) = resolution.dimensions();
        let args = vec![
            "--quiet".to_string(),
            "--device".to_string(),
            device.display().to_string(),
            "--resolution".to_string(),
            format!("{width}x{height}"),
            "--no-banner".to_string(),
            "--jpeg".to_string(),
            "85".to_string(),
            "-".to_string(),
        ];
        Self::new("fswebcam", args)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits for the child, killing it once the deadline passes.
    fn wait_bounded(&self, child: &mut Child) -> CoreResult<std::process::ExitStatus> {
        // No deadline when the timeout is too large to represent.
        let deadline = Instant::now().checked_add(self.timeout);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoreError::Capture(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Drains a child pipe on its own thread so a full pipe cannot stall the child.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl FrameSource for CommandSource {
    fn capture(&mut self) -> CoreResult<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CoreError::Capture(format!("failed to run {}: {e}", self.program)))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = self.wait_bounded(&mut child)?;

        let stdout = stdout
            .join()
            .map_err(|_| CoreError::Capture("stdout reader panicked".to_string()))?;
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(CoreError::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            )));
        }

        if !stdout.starts_with(&JPEG_MAGIC) {
            return Err(CoreError::Capture(format!(
                "{} did not produce a JPEG ({} bytes)",
                self.program,
                stdout.len()
            )));
        }

        Ok(stdout)
    }
}
