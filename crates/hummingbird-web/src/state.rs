use std::sync::Arc;

use hummingbird_core::{CredentialVerifier, SessionIssuer, SharedFrameSource};
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// `None` when no password is configured; every login attempt then fails.
    pub verifier: Option<Arc<CredentialVerifier>>,
    pub issuer: Arc<SessionIssuer>,
    pub camera: SharedFrameSource,
    /// Cancelled on server shutdown; every open WebSocket watches it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds the immutable credential store from a resolved configuration.
    pub fn new(config: ServerConfig, camera: SharedFrameSource) -> anyhow::Result<Self> {
        let verifier = config
            .auth
            .password_digest()?
            .map(|digest| Arc::new(CredentialVerifier::new(digest)));
        let issuer = SessionIssuer::new(config.auth.session_secret.as_bytes(), config.auth.session_ttl());

        Ok(Self {
            config: Arc::new(config),
            verifier,
            issuer: Arc::new(issuer),
            camera,
            shutdown: CancellationToken::new(),
        })
    }
}
