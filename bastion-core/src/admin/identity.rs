//! Transport-provided caller identity
//!
//! Bastion does not authenticate anyone. Whatever sits in front of it (a
//! reverse proxy, an SSO gateway, the embedding application) establishes who
//! the caller is; an [`IdentityProvider`] turns that into a [`Session`].

use crate::rbac::Session;
use http::header::{HeaderMap, HeaderName};

/// Default header carrying the authenticated user name
pub const USER_HEADER: &str = "x-auth-user";

/// Resolves the session of an incoming request
pub trait IdentityProvider: Send + Sync {
    /// Session for a request with these headers
    fn identify(&self, headers: &HeaderMap) -> Session;

    /// Provider name for logging and identification
    fn name(&self) -> &str;
}

/// Reads the user name from a trusted header (`X-Auth-User` by default).
///
/// A missing, empty or non-UTF-8 header yields [`Session::Anonymous`].
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    pub fn new() -> Self {
        Self { header: HeaderName::from_static(USER_HEADER) }
    }

    pub fn with_header(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for HeaderIdentity {
    fn identify(&self, headers: &HeaderMap) -> Session {
        headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(Session::authenticated)
            .unwrap_or(Session::Anonymous)
    }

    fn name(&self) -> &str {
        "header"
    }
}
