//! Credential verification and session issuance.
//!
//! Both types are built once at startup from immutable configuration and
//! shared read-only across all requests.

pub mod password;
pub mod token;
