//! Admin HTTP surface
//!
//! [`AdminHandlers`] exposes role and user administration under a path prefix
//! chosen by the embedding application. Every request goes through the same
//! steps: resolve the caller's session, check the escalation guard against a
//! single captured snapshot, delegate to the registry or reload controller,
//! and turn the outcome into a JSON response.
//!
//! # Routes (relative to the prefix)
//!
//! | Route | Required right |
//! |---|---|
//! | `POST /roles` | role's manage right and every right it grants |
//! | `DELETE /roles/{name}` | role's manage right |
//! | `POST /users` | target role's manage right |
//! | `DELETE /users/{name}` | user's role manage right |
//! | `POST /reload`, `POST /unload`, `PUT /anonymous-rights`, `GET /status` | superuser |
//! | `GET /whoami` | none |
//!
//! The superuser right passes every guard. Requests outside the prefix yield
//! `None` so the dispatch layer can route them elsewhere.

mod handlers;
mod identity;
mod response;

pub use identity::{HeaderIdentity, IdentityProvider, USER_HEADER};
pub use response::{
    body_from, error_response, json_error_response, json_response, method_not_allowed_response,
    not_found_response, ok_response, Resp, RespBody,
};

use crate::rbac::{Authorizer, RbacError, Registry, Session};
use crate::reload::ReloadController;
use crate::rights::Right;
use bytes::Bytes;
use http::{Method, Request};
use http_body::Body;
use http_body_util::BodyExt;
use std::borrow::Cow;
use std::sync::Arc;

/// Failure of a single admin request
#[derive(thiserror::Error, Debug)]
enum AdminError {
    #[error(transparent)]
    Rbac(#[from] RbacError),
    #[error("{0}")]
    InvalidRequest(String),
}

impl AdminError {
    fn into_response(self) -> Resp {
        match self {
            AdminError::Rbac(err) => error_response(&err),
            AdminError::InvalidRequest(message) => response::invalid_request_response(&message),
        }
    }
}

type AdminResult = Result<Resp, AdminError>;

/// Admin endpoint handlers mounted under one path prefix
pub struct AdminHandlers {
    prefix: String,
    authorizer: Arc<Authorizer>,
    reload: Arc<ReloadController>,
    identity: Arc<dyn IdentityProvider>,
    superuser: Right,
}

impl AdminHandlers {
    /// Handlers under `prefix` (e.g. `/_admin/users`); sessions come from
    /// [`HeaderIdentity`] until [`with_identity`](Self::with_identity) says otherwise
    pub fn new(
        prefix: impl Into<String>,
        authorizer: Arc<Authorizer>,
        reload: Arc<ReloadController>,
        superuser: Right,
    ) -> Self {
        let prefix = prefix.into();
        let prefix = match prefix.trim_end_matches('/') {
            "" => String::new(),
            trimmed => trimmed.to_string(),
        };
        Self { prefix, authorizer, reload, identity: Arc::new(HeaderIdentity::new()), superuser }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    /// Whether `path` falls under this handler's prefix
    pub fn matches(&self, path: &str) -> bool {
        self.route(path).is_some()
    }

    /// Handle `req` if its path is under the prefix, `None` otherwise
    pub async fn handle<B>(&self, req: Request<B>) -> Option<Resp>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let path = req.uri().path().to_string();
        let rest = self.route(&path)?;
        let decoded = match decode_segments(rest) {
            Ok(decoded) => decoded,
            Err(err) => return Some(err.into_response()),
        };
        let segments: Vec<&str> = decoded.iter().map(|segment| segment.as_ref()).collect();

        let session = self.identity.identify(req.headers());
        log::debug!("Admin {} {} from {}", req.method(), path, session);

        let response = self
            .dispatch(&session, &segments, req)
            .await
            .unwrap_or_else(AdminError::into_response);
        Some(response)
    }

    async fn dispatch<B>(&self, session: &Session, segments: &[&str], req: Request<B>) -> AdminResult
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        match (req.method().clone(), segments) {
            (Method::POST, ["roles"]) => self.create_role(session, &read_body(req).await?),
            (Method::DELETE, ["roles", name]) => self.delete_role(session, name),
            (Method::POST, ["users"]) => self.create_user(session, &read_body(req).await?),
            (Method::DELETE, ["users", name]) => self.delete_user(session, name),
            (Method::POST, ["reload"]) => self.reload(session).await,
            (Method::POST, ["unload"]) => self.unload(session, &read_body(req).await?).await,
            (Method::PUT, ["anonymous-rights"]) => {
                self.set_anonymous_rights(session, &read_body(req).await?)
            }
            (Method::GET, ["status"]) => self.status(session),
            (Method::GET, ["whoami"]) => self.whoami(session),
            (
                _,
                ["roles"] | ["roles", _] | ["users"] | ["users", _] | ["reload"] | ["unload"]
                | ["anonymous-rights"] | ["status"] | ["whoami"],
            ) => Ok(method_not_allowed_response()),
            _ => Ok(not_found_response("Admin endpoint")),
        }
    }

    fn registry(&self) -> &Registry {
        self.authorizer.registry()
    }

    /// Remainder of `path` after the prefix, if `path` is under it
    fn route<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for AdminHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminHandlers")
            .field("prefix", &self.prefix())
            .field("identity", &self.identity.name())
            .field("superuser", &self.superuser)
            .finish()
    }
}

/// Split a path remainder into percent-decoded segments; `%2F` stays inside its segment
fn decode_segments(rest: &str) -> Result<Vec<Cow<'_, str>>, AdminError> {
    rest.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map_err(|e| AdminError::InvalidRequest(format!("invalid path segment '{}': {}", segment, e)))
        })
        .collect()
}

async fn read_body<B>(req: Request<B>) -> Result<Bytes, AdminError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    req.into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| AdminError::InvalidRequest(format!("failed to read request body: {}", e)))
}
