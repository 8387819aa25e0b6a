//! Sessions and the authorization predicate
//!
//! Every protected operation asks [`Authorizer::authorize`] (or
//! [`Authorizer::decide`], which captures the snapshot itself) before it runs.
//! Lookups that miss (unknown user, user whose role is gone) resolve to the
//! empty right set: authorization fails closed, it never errors.

use super::error::{RbacError, RbacResult};
use super::{Registry, RegistrySnapshot};
use crate::rights::{Right, RightSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-request identity context, owned by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// No identity; holds the process-wide anonymous rights
    Anonymous,
    /// Bound to a user name, resolved against the registry on every decision
    Authenticated { user: String },
}

impl Session {
    pub fn anonymous() -> Self {
        Session::Anonymous
    }

    pub fn authenticated(user: impl Into<String>) -> Self {
        Session::Authenticated { user: user.into() }
    }

    /// Bound user name, if any
    pub fn user(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { user } => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Anonymous => write!(f, "<anonymous>"),
            Session::Authenticated { user } => write!(f, "{}", user),
        }
    }
}

/// Resolves sessions to effective rights and answers authorization queries
pub struct Authorizer {
    registry: Arc<Registry>,
    anonymous: AtomicU64,
}

impl Authorizer {
    /// Create an authorizer whose anonymous sessions hold no rights
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry, anonymous: AtomicU64::new(RightSet::EMPTY.bits()) }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Replace the rights held by anonymous sessions
    pub fn set_anonymous_rights(&self, rights: &[Right]) -> RbacResult<()> {
        let universe = self.registry.universe();
        if let Some(outside) = rights.iter().find(|right| !universe.contains(**right)) {
            return Err(RbacError::InvalidRight(outside.to_string()));
        }

        let set = RightSet::from_rights(rights.iter().copied());
        self.anonymous.store(set.bits(), Ordering::Release);
        log::info!("Anonymous rights set to {:?}", universe.names(set));
        Ok(())
    }

    pub fn anonymous_rights(&self) -> RightSet {
        RightSet::from_bits(self.anonymous.load(Ordering::Acquire))
    }

    /// Rights held by `session` in `snapshot`
    pub fn effective_rights(&self, session: &Session, snapshot: &RegistrySnapshot) -> RightSet {
        match session {
            Session::Anonymous => self.anonymous_rights(),
            Session::Authenticated { user } => {
                let user = match snapshot.user(user) {
                    Some(user) => user,
                    None => return RightSet::EMPTY,
                };
                match snapshot.role(&user.role) {
                    Some(role) => role.granted,
                    None => RightSet::EMPTY,
                }
            }
        }
    }

    pub fn authorize(&self, session: &Session, required: Right, snapshot: &RegistrySnapshot) -> bool {
        self.authorize_all(session, RightSet::from(required), snapshot)
    }

    /// Whether `session` holds every right in `required`
    pub fn authorize_all(
        &self,
        session: &Session,
        required: RightSet,
        snapshot: &RegistrySnapshot,
    ) -> bool {
        self.effective_rights(session, snapshot).contains(required)
    }

    /// Authorize against the current snapshot, captured once for this decision
    pub fn decide(&self, session: &Session, required: Right) -> bool {
        let snapshot = self.registry.snapshot();
        self.authorize(session, required, &snapshot)
    }

    /// Like [`authorize`](Self::authorize) but returns `Unauthorized` naming the missing right
    pub fn require(
        &self,
        session: &Session,
        required: Right,
        snapshot: &RegistrySnapshot,
    ) -> RbacResult<()> {
        if self.authorize(session, required, snapshot) {
            return Ok(());
        }
        let name = self.registry.universe().name(required).unwrap_or("unknown").to_string();
        log::warn!("Denied {} (missing right '{}')", session, name);
        Err(RbacError::Unauthorized(name))
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("registry", &self.registry)
            .field("anonymous", &self.anonymous_rights())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rights::RightUniverse;

    struct Fixture {
        authorizer: Authorizer,
        read: Right,
        write: Right,
        manage_users: Right,
    }

    fn fixture() -> Fixture {
        let universe = RightUniverse::new(["read", "write", "manage-users"]).unwrap();
        let read = universe.resolve("read").unwrap();
        let write = universe.resolve("write").unwrap();
        let manage_users = universe.resolve("manage-users").unwrap();
        let registry = Arc::new(Registry::new(Arc::new(universe)));
        Fixture { authorizer: Authorizer::new(registry), read, write, manage_users }
    }

    #[test]
    fn test_editor_scenario() {
        let f = fixture();
        let registry = f.authorizer.registry();
        registry.create_role("editor", &[f.read, f.write], f.manage_users).unwrap();
        registry.create_user("alice", "editor").unwrap();

        let alice = Session::authenticated("alice");
        let snapshot = registry.snapshot();

        assert_eq!(
            f.authorizer.effective_rights(&alice, &snapshot),
            RightSet::from_rights([f.read, f.write])
        );
        assert!(f.authorizer.authorize(&alice, f.write, &snapshot));
        assert!(!f.authorizer.authorize(&alice, f.manage_users, &snapshot));
    }

    #[test]
    fn test_anonymous_rights_ignore_registry() {
        let f = fixture();
        f.authorizer.set_anonymous_rights(&[f.read]).unwrap();

        let empty = f.authorizer.registry().snapshot();
        assert_eq!(
            f.authorizer.effective_rights(&Session::Anonymous, &empty),
            RightSet::from(f.read)
        );

        let registry = f.authorizer.registry();
        registry.create_role("editor", &[f.read, f.write], f.manage_users).unwrap();
        registry.create_user("alice", "editor").unwrap();
        let full = registry.snapshot();
        assert_eq!(f.authorizer.effective_rights(&Session::Anonymous, &full), RightSet::from(f.read));
        assert!(!f.authorizer.decide(&Session::Anonymous, f.write));
    }

    #[test]
    fn test_unknown_user_has_no_rights() {
        let f = fixture();
        f.authorizer.set_anonymous_rights(&[f.read]).unwrap();
        let snapshot = f.authorizer.registry().snapshot();

        let ghost = Session::authenticated("ghost");
        assert_eq!(f.authorizer.effective_rights(&ghost, &snapshot), RightSet::EMPTY);
        assert!(!f.authorizer.authorize(&ghost, f.read, &snapshot));
    }

    #[test]
    fn test_unloaded_roles_fail_closed() {
        let f = fixture();
        let registry = f.authorizer.registry();
        registry.create_role("editor", &[f.read, f.write], f.manage_users).unwrap();
        registry.create_user("alice", "editor").unwrap();
        let alice = Session::authenticated("alice");
        assert!(f.authorizer.decide(&alice, f.read));

        registry.unload_roles();

        let snapshot = registry.snapshot();
        assert!(snapshot.has_user("alice"));
        assert_eq!(f.authorizer.effective_rights(&alice, &snapshot), RightSet::EMPTY);
        assert!(!f.authorizer.decide(&alice, f.read));
    }

    #[test]
    fn test_require_reports_missing_right() {
        let f = fixture();
        let snapshot = f.authorizer.registry().snapshot();
        let err = f.authorizer.require(&Session::Anonymous, f.manage_users, &snapshot).unwrap_err();
        assert_eq!(err, RbacError::Unauthorized("manage-users".into()));
    }

    #[test]
    fn test_anonymous_rights_must_be_in_universe() {
        let f = fixture();
        let outside = Right::from_bit(30).unwrap();
        assert!(matches!(
            f.authorizer.set_anonymous_rights(&[f.read, outside]),
            Err(RbacError::InvalidRight(_))
        ));
        assert_eq!(f.authorizer.anonymous_rights(), RightSet::EMPTY);
    }
}
