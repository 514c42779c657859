use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use hummingbird_core::camera::{CommandSource, TestPatternSource};
use hummingbird_core::{CoreResult, PasswordDigest, Resolution, SharedFrameSource};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub require_login: bool,
    /// Hex SHA-512 of the password, or an Argon2 PHC string.
    #[serde(default)]
    pub password_hash: String,
    /// File holding `password_hash`; read when `password_hash` is empty.
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    #[serde(default)]
    pub session_secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
    #[serde(default = "default_failed_login_delay_ms")]
    pub failed_login_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub use_usb: bool,
    #[serde(default = "default_usb_device")]
    pub usb_device: PathBuf,
    /// Full capture command line; replaces the built-in camera commands.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub test_pattern: bool,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// A capture command still running after this long is killed.
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Zero disables rate limiting.
    #[serde(default = "default_login_rpm")]
    pub login_requests_per_minute: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    #[serde(default = "default_acme_challenge_dir")]
    pub acme_challenge_dir: PathBuf,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_port() -> u16 { 8080 }
fn default_session_ttl_hours() -> u64 { 720 }
fn default_failed_login_delay_ms() -> u64 { 1000 }
fn default_usb_device() -> PathBuf { PathBuf::from("/dev/video0") }
fn default_tick_interval_ms() -> u64 { 10 }
fn default_capture_timeout_ms() -> u64 { 5000 }
fn default_login_rpm() -> u32 { 10 }
fn default_acme_challenge_dir() -> PathBuf { PathBuf::from(".well-known/acme-challenge") }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_login: false,
            password_hash: String::new(),
            password_file: None,
            session_secret: String::new(),
            session_ttl_hours: default_session_ttl_hours(),
            failed_login_delay_ms: default_failed_login_delay_ms(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            use_usb: false,
            usb_device: default_usb_device(),
            command: None,
            test_pattern: false,
            tick_interval_ms: default_tick_interval_ms(),
            capture_timeout_ms: default_capture_timeout_ms(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { login_requests_per_minute: default_login_rpm() }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self { acme_challenge_dir: default_acme_challenge_dir() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth: AuthConfig::default(),
            camera: CameraConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

const SECS_PER_HOUR: u64 = 3600;

/// Upper bound on `session_ttl_hours` (ten years).
const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

impl AuthConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours.saturating_mul(SECS_PER_HOUR))
    }

    pub fn failed_login_delay(&self) -> Duration {
        Duration::from_millis(self.failed_login_delay_ms)
    }

    /// The configured digest, if a password is set.
    pub fn password_digest(&self) -> anyhow::Result<Option<PasswordDigest>> {
        if self.password_hash.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(PasswordDigest::parse(&self.password_hash)?))
    }
}

impl CameraConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Builds the frame source this configuration selects.
    pub fn frame_source(&self) -> CoreResult<SharedFrameSource> {
        if self.test_pattern {
            tracing::info!("Using synthetic test pattern ({})", self.resolution);
            return Ok(SharedFrameSource::new(TestPatternSource::new(self.resolution)));
        }

        let source = match &self.command {
            Some(argv) => CommandSource::from_argv(argv)?,
            None if self.use_usb => CommandSource::usb_camera(&self.usb_device, self.resolution),
            None => CommandSource::pi_camera(self.resolution),
        }
        .with_timeout(self.capture_timeout());
        tracing::info!(
            "Capturing with `{} {}` ({})",
            source.program(),
            source.args().join(" "),
            self.resolution
        );
        Ok(SharedFrameSource::new(source))
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("invalid configuration file")
    }

    /// Reads `HUMMINGBIRD_CONFIG` (if set), then environment overrides, then
    /// validates. Any error here is fatal.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("HUMMINGBIRD_CONFIG")
            .map(PathBuf::from)
            .ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Self::from_toml_str(&contents)?
        } else {
            ServerConfig::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.resolve()?;
        Ok(config)
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(host) = var("HUMMINGBIRD_HOST") {
            self.host = host.parse().context("HUMMINGBIRD_HOST")?;
        }
        if let Some(port) = var("HUMMINGBIRD_PORT") {
            self.port = port.parse().context("HUMMINGBIRD_PORT")?;
        }
        if let Some(value) = var("HUMMINGBIRD_REQUIRE_LOGIN") {
            self.auth.require_login = parse_bool("HUMMINGBIRD_REQUIRE_LOGIN", &value)?;
        }
        if let Some(hash) = var("HUMMINGBIRD_PASSWORD_HASH") {
            self.auth.password_hash = hash;
        }
        if let Some(path) = var("HUMMINGBIRD_PASSWORD_FILE") {
            self.auth.password_file = Some(PathBuf::from(path));
        }
        if let Some(secret) = var("HUMMINGBIRD_SESSION_SECRET") {
            self.auth.session_secret = secret;
        }
        if let Some(resolution) = var("HUMMINGBIRD_RESOLUTION") {
            self.camera.resolution = resolution.parse().context("HUMMINGBIRD_RESOLUTION")?;
        }
        if let Some(value) = var("HUMMINGBIRD_USE_USB") {
            self.camera.use_usb = parse_bool("HUMMINGBIRD_USE_USB", &value)?;
        }
        if let Some(value) = var("HUMMINGBIRD_TEST_PATTERN") {
            self.camera.test_pattern = parse_bool("HUMMINGBIRD_TEST_PATTERN", &value)?;
        }
        if let Some(cert) = var("HUMMINGBIRD_TLS_CERT") {
            self.tls.cert_path = Some(cert);
        }
        if let Some(key) = var("HUMMINGBIRD_TLS_KEY") {
            self.tls.key_path = Some(key);
        }
        Ok(())
    }

    /// Loads the password file, fills in a session secret and rejects
    /// settings the server cannot run with.
    pub fn resolve(&mut self) -> anyhow::Result<()> {
        if self.auth.password_hash.trim().is_empty() {
            if let Some(path) = &self.auth.password_file {
                self.auth.password_hash = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read password file {}", path.display()))?
                    .trim()
                    .to_string();
            }
        }

        // Fail at startup, not at first login.
        self.auth.password_digest()?;

        if self.auth.require_login && self.auth.password_hash.trim().is_empty() {
            anyhow::bail!(
                "require_login is set but no password is configured. \
                 Set auth.password_hash, auth.password_file or HUMMINGBIRD_PASSWORD_HASH."
            );
        }

        if self.auth.session_secret.is_empty() {
            self.auth.session_secret =
                format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
            tracing::warn!(
                "No session secret configured. Generated random secret (sessions end on restart)."
            );
        }

        if self.auth.require_login {
            const WEAK_SECRETS: &[&str] = &["change-me", "secret", "password", "session-secret"];
            if WEAK_SECRETS.iter().any(|&w| self.auth.session_secret == w) {
                anyhow::bail!(
                    "Session secret matches a known weak/placeholder value. \
                     Set a strong random secret via HUMMINGBIRD_SESSION_SECRET."
                );
            }
            if self.auth.session_secret.len() < 32 {
                tracing::warn!(
                    "Session secret is shorter than 32 characters. \
                     Consider using a stronger secret via HUMMINGBIRD_SESSION_SECRET."
                );
            }
        } else if self.host.is_unspecified() {
            tracing::warn!(
                "Login is not required and the server listens on all interfaces ({}). \
                 Anyone on the network can view the camera.",
                self.bind_addr()
            );
        }

        if self.camera.tick_interval_ms == 0 {
            anyhow::bail!("camera.tick_interval_ms must be greater than zero");
        }

        if self.camera.capture_timeout_ms == 0 {
            anyhow::bail!("camera.capture_timeout_ms must be greater than zero");
        }

        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            anyhow::bail!(
                "auth.session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
                self.auth.session_ttl_hours
            );
        }

        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("{name}: expected a boolean, got {other:?}"),
    }
}
