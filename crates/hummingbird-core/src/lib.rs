//! Hummingbird core library: the parts of the camera server that do not
//! depend on HTTP.
//!
//! # Modules
//!
//! - [`auth`] — Password verification ([`CredentialVerifier`]) and stateless
//!   signed session tokens ([`SessionIssuer`]).
//! - [`camera`] — The [`FrameSource`] capability, its implementations and the
//!   mutex-guarded [`SharedFrameSource`] handle.
//! - [`stream`] — The per-connection [`StreamingLoop`] and the [`Connection`]
//!   state machine that owns it.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod auth;
pub mod camera;
pub mod error;
pub mod stream;

pub use auth::password::{CredentialVerifier, PasswordDigest};
pub use auth::token::{SessionIssuer, SessionToken};
pub use camera::{FrameSource, Resolution, SharedFrameSource};
pub use error::{CoreError, CoreResult};
pub use stream::connection::{Connection, ControlMessage, Dispatch, Phase};
pub use stream::{encode_frame, StopReason, StreamingLoop};
