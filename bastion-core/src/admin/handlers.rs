//! Route handlers and the escalation guard

use super::{ok_response, AdminError, AdminHandlers, AdminResult};
use crate::rbac::{RbacError, RbacResult, RegistrySnapshot, Session};
use crate::rights::{Right, RightSet};
use bytes::Bytes;
use chrono::Utc;
use hyper::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct CreateRoleRequest {
    name: String,
    #[serde(default)]
    rights: Vec<String>,
    manage_right: String,
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    name: String,
    role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UnloadRequest {
    roles: bool,
    users: bool,
}

#[derive(Debug, Deserialize)]
struct AnonymousRightsRequest {
    rights: Vec<String>,
}

fn parse<T: DeserializeOwned>(body: &Bytes) -> Result<T, AdminError> {
    serde_json::from_slice(body).map_err(|e| AdminError::InvalidRequest(format!("invalid JSON body: {}", e)))
}

impl AdminHandlers {
    pub(super) fn create_role(&self, session: &Session, body: &Bytes) -> AdminResult {
        let request: CreateRoleRequest = parse(body)?;
        let universe = self.registry().universe();
        let rights = universe.resolve_all(request.rights.as_slice())?;
        let manage_right = universe.resolve(&request.manage_right)?;

        // a caller can never mint a role more powerful than itself
        let required = RightSet::from_rights(rights.iter().copied()).with(manage_right);
        self.registry().create_role_guarded(&request.name, &rights, manage_right, |snapshot| {
            if self.is_superuser(session, snapshot) {
                return Ok(());
            }
            self.require_all(session, required, snapshot)
        })?;
        Ok(ok_response(StatusCode::CREATED, json!({ "role": request.name })))
    }

    pub(super) fn delete_role(&self, session: &Session, name: &str) -> AdminResult {
        self.registry().delete_role_guarded(name, |snapshot| match snapshot.role(name) {
            Some(role) => self.require_or_superuser(session, role.manage_right, snapshot),
            None => self.require_superuser(session, snapshot),
        })?;
        Ok(ok_response(StatusCode::OK, json!({ "role": name })))
    }

    pub(super) fn create_user(&self, session: &Session, body: &Bytes) -> AdminResult {
        let request: CreateUserRequest = parse(body)?;

        self.registry().create_user_guarded(&request.name, &request.role, |snapshot| {
            match snapshot.role(&request.role) {
                Some(role) => self.require_or_superuser(session, role.manage_right, snapshot),
                // unknown role names are only disclosed to superusers
                None => self.require_superuser(session, snapshot),
            }
        })?;
        Ok(ok_response(StatusCode::CREATED, json!({ "user": request.name, "role": request.role })))
    }

    pub(super) fn delete_user(&self, session: &Session, name: &str) -> AdminResult {
        self.registry().delete_user_guarded(name, |snapshot| {
            let manage_right = snapshot
                .user(name)
                .and_then(|user| snapshot.role(&user.role))
                .map(|role| role.manage_right);
            match manage_right {
                Some(right) => self.require_or_superuser(session, right, snapshot),
                // unknown user or dangling role reference
                None => self.require_superuser(session, snapshot),
            }
        })?;
        Ok(ok_response(StatusCode::OK, json!({ "user": name })))
    }

    pub(super) async fn reload(&self, session: &Session) -> AdminResult {
        self.require_superuser(session, &self.registry().snapshot())?;

        log::info!("Reload requested by {}", session);
        let report = self.reload.load_user().await?;
        Ok(ok_response(
            StatusCode::OK,
            json!({
                "version": report.version,
                "roles": report.roles,
                "users": report.users,
                "duration_ms": report.duration_ms,
            }),
        ))
    }

    pub(super) async fn unload(&self, session: &Session, body: &Bytes) -> AdminResult {
        let request: UnloadRequest = if body.is_empty() { UnloadRequest::default() } else { parse(body)? };
        self.require_superuser(session, &self.registry().snapshot())?;

        if !request.roles && !request.users {
            return Err(RbacError::ValidationError(
                "nothing to unload: set \"roles\" and/or \"users\"".to_string(),
            )
            .into());
        }

        log::info!("Unload requested by {} (roles: {}, users: {})", session, request.roles, request.users);
        if request.users {
            self.reload.unload_users().await;
        }
        if request.roles {
            self.reload.unload_roles().await;
        }
        let snapshot = self.registry().snapshot();

        Ok(ok_response(
            StatusCode::OK,
            json!({
                "version": snapshot.version(),
                "roles": snapshot.role_count(),
                "users": snapshot.user_count(),
            }),
        ))
    }

    pub(super) fn set_anonymous_rights(&self, session: &Session, body: &Bytes) -> AdminResult {
        let request: AnonymousRightsRequest = parse(body)?;
        self.require_superuser(session, &self.registry().snapshot())?;

        let rights = self.registry().universe().resolve_all(request.rights.as_slice())?;
        self.authorizer.set_anonymous_rights(&rights)?;

        let names = self.registry().universe().names(self.authorizer.anonymous_rights());
        Ok(ok_response(StatusCode::OK, json!({ "anonymous_rights": names })))
    }

    pub(super) fn status(&self, session: &Session) -> AdminResult {
        let snapshot = self.registry().snapshot();
        self.require_superuser(session, &snapshot)?;

        let universe = self.registry().universe();
        let dangling: Vec<&str> = snapshot.dangling_users().map(|user| user.name.as_str()).collect();
        Ok(ok_response(
            StatusCode::OK,
            json!({
                "version": snapshot.version(),
                "roles": snapshot.role_count(),
                "users": snapshot.user_count(),
                "dangling_users": dangling,
                "anonymous_rights": universe.names(self.authorizer.anonymous_rights()),
                "rights": universe.names(universe.all()),
                "store": self.reload.store_name(),
                "last_reload": self.reload.last_report().as_deref(),
                "timestamp": Utc::now().to_rfc3339(),
            }),
        ))
    }

    pub(super) fn whoami(&self, session: &Session) -> AdminResult {
        let snapshot = self.registry().snapshot();
        let rights = self.authorizer.effective_rights(session, &snapshot);

        Ok(ok_response(
            StatusCode::OK,
            json!({
                "user": session.user(),
                "authenticated": session.is_authenticated(),
                "role": session.user().and_then(|name| snapshot.user(name)).map(|user| user.role.as_str()),
                "rights": self.registry().universe().names(rights),
                "superuser": rights.contains_right(self.superuser),
                "version": snapshot.version(),
            }),
        ))
    }

    fn is_superuser(&self, session: &Session, snapshot: &RegistrySnapshot) -> bool {
        self.authorizer.authorize(session, self.superuser, snapshot)
    }

    fn require_superuser(&self, session: &Session, snapshot: &RegistrySnapshot) -> RbacResult<()> {
        self.authorizer.require(session, self.superuser, snapshot)
    }

    fn require_or_superuser(
        &self,
        session: &Session,
        right: Right,
        snapshot: &RegistrySnapshot,
    ) -> RbacResult<()> {
        if self.is_superuser(session, snapshot) {
            return Ok(());
        }
        self.authorizer.require(session, right, snapshot)
    }

    /// Fails with `Unauthorized` naming the first right of `required` the caller lacks
    fn require_all(&self, session: &Session, required: RightSet, snapshot: &RegistrySnapshot) -> RbacResult<()> {
        let held = self.authorizer.effective_rights(session, snapshot);
        match required.difference(held).iter().next() {
            None => Ok(()),
            Some(missing) => self.authorizer.require(session, missing, snapshot),
        }
    }
}
