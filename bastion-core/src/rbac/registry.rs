//! Role and user registry with atomic snapshot publication
//!
//! Readers call [`Registry::snapshot`] once per decision and keep the returned
//! `Arc` for its whole duration. The load is wait-free and the `Arc` keeps that
//! snapshot alive even if a writer publishes a newer one meanwhile.
//!
//! Writers take the single writer lock, derive a new snapshot from the current
//! one, and store it. Holding the lock across read-modify-publish is what makes
//! two concurrent `create_role("x")` calls end with exactly one success.
//!
//! The `*_guarded` variants run a caller check against that same current
//! snapshot under the lock, so a permission decision and the mutation it
//! allows always see one registry version.

use super::error::{RbacError, RbacResult};
use super::{RegistrySnapshot, Role, User};
use crate::rights::{Right, RightSet, RightUniverse};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Versioned, swappable role and user registry
pub struct Registry {
    universe: Arc<RightUniverse>,
    current: ArcSwap<RegistrySnapshot>,
    writer: Mutex<()>,
}

impl Registry {
    /// Create an empty registry over a right universe
    pub fn new(universe: Arc<RightUniverse>) -> Self {
        Self {
            universe,
            current: ArcSwap::from_pointee(RegistrySnapshot::default()),
            writer: Mutex::new(()),
        }
    }

    pub fn universe(&self) -> &RightUniverse {
        &self.universe
    }

    /// Current published snapshot
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Create a role.
    ///
    /// # Errors
    /// - `ValidationError` if `name` is blank
    /// - `InvalidRight` if a granted right or `manage_right` is outside the universe
    /// - `DuplicateName` if a role with this name already exists
    pub fn create_role(&self, name: &str, rights: &[Right], manage_right: Right) -> RbacResult<()> {
        self.create_role_guarded(name, rights, manage_right, |_| Ok(()))
    }

    /// [`create_role`](Self::create_role), publishing only if `guard` accepts
    /// the snapshot the role is added to
    pub fn create_role_guarded<G>(
        &self,
        name: &str,
        rights: &[Right],
        manage_right: Right,
        guard: G,
    ) -> RbacResult<()>
    where
        G: FnOnce(&RegistrySnapshot) -> RbacResult<()>,
    {
        validate_name("role", name)?;
        for right in rights.iter().chain(std::iter::once(&manage_right)) {
            if !self.universe.contains(*right) {
                return Err(RbacError::InvalidRight(right.to_string()));
            }
        }

        let role = Role::new(name, RightSet::from_rights(rights.iter().copied()), manage_right);
        let published = self.publish(|current| {
            guard(current)?;
            if current.has_role(name) {
                return Err(RbacError::DuplicateName(name.to_string()));
            }
            let mut next = current.next();
            next.insert_role(role);
            Ok(next)
        })?;

        log::info!("Created role '{}' (registry v{})", name, published.version());
        Ok(())
    }

    /// Create a role from right names, resolving them through the universe first
    pub fn create_role_named<S: AsRef<str>>(
        &self,
        name: &str,
        rights: &[S],
        manage_right: &str,
    ) -> RbacResult<()> {
        let rights = self.universe.resolve_all(rights)?;
        let manage_right = self.universe.resolve(manage_right)?;
        self.create_role(name, &rights, manage_right)
    }

    /// Create a user assigned to an existing role.
    ///
    /// # Errors
    /// - `ValidationError` if `name` is blank
    /// - `DuplicateName` if the user already exists
    /// - `UnknownRole` if `role` is not in the current snapshot
    pub fn create_user(&self, name: &str, role: &str) -> RbacResult<()> {
        self.create_user_guarded(name, role, |_| Ok(()))
    }

    /// [`create_user`](Self::create_user), publishing only if `guard` accepts
    /// the snapshot the user is added to
    pub fn create_user_guarded<G>(&self, name: &str, role: &str, guard: G) -> RbacResult<()>
    where
        G: FnOnce(&RegistrySnapshot) -> RbacResult<()>,
    {
        validate_name("user", name)?;

        let published = self.publish(|current| {
            guard(current)?;
            if current.has_user(name) {
                return Err(RbacError::DuplicateName(name.to_string()));
            }
            if !current.has_role(role) {
                return Err(RbacError::UnknownRole(role.to_string()));
            }
            let mut next = current.next();
            next.insert_user(User::new(name, role));
            Ok(next)
        })?;

        log::info!("Created user '{}' with role '{}' (registry v{})", name, role, published.version());
        Ok(())
    }

    /// Delete a role that no user is assigned to
    pub fn delete_role(&self, name: &str) -> RbacResult<()> {
        self.delete_role_guarded(name, |_| Ok(()))
    }

    pub fn delete_role_guarded<G>(&self, name: &str, guard: G) -> RbacResult<()>
    where
        G: FnOnce(&RegistrySnapshot) -> RbacResult<()>,
    {
        let published = self.publish(|current| {
            guard(current)?;
            if !current.has_role(name) {
                return Err(RbacError::UnknownRole(name.to_string()));
            }
            let members = current.members_of(name).count();
            if members > 0 {
                return Err(RbacError::ValidationError(format!(
                    "role '{}' is still assigned to {} user(s)",
                    name, members
                )));
            }
            let mut next = current.next();
            next.remove_role(name);
            Ok(next)
        })?;

        log::info!("Deleted role '{}' (registry v{})", name, published.version());
        Ok(())
    }

    pub fn delete_user(&self, name: &str) -> RbacResult<()> {
        self.delete_user_guarded(name, |_| Ok(()))
    }

    pub fn delete_user_guarded<G>(&self, name: &str, guard: G) -> RbacResult<()>
    where
        G: FnOnce(&RegistrySnapshot) -> RbacResult<()>,
    {
        let published = self.publish(|current| {
            guard(current)?;
            if !current.has_user(name) {
                return Err(RbacError::UnknownUser(name.to_string()));
            }
            let mut next = current.next();
            next.remove_user(name);
            Ok(next)
        })?;

        log::info!("Deleted user '{}' (registry v{})", name, published.version());
        Ok(())
    }

    /// Publish a snapshot with no roles. Users are kept; those left without a
    /// role resolve to the empty right set until their role comes back.
    pub fn unload_roles(&self) -> Arc<RegistrySnapshot> {
        let published = self.publish_infallible(|next| next.clear_roles());
        log::info!("Unloaded all roles (registry v{})", published.version());
        published
    }

    /// Publish a snapshot with no users
    pub fn unload_users(&self) -> Arc<RegistrySnapshot> {
        let published = self.publish_infallible(|next| next.clear_users());
        log::info!("Unloaded all users (registry v{})", published.version());
        published
    }

    /// Check a complete batch of roles and users without publishing it.
    ///
    /// Names must be non-blank and unique, rights must belong to the universe,
    /// and every user must reference a role of the same batch (not of the
    /// currently published snapshot).
    pub fn validate_batch(
        &self,
        roles: Vec<Role>,
        users: Vec<User>,
    ) -> RbacResult<(HashMap<String, Role>, HashMap<String, User>)> {
        let mut role_map = HashMap::with_capacity(roles.len());
        for role in roles {
            validate_name("role", &role.name)?;
            if !self.universe.contains_set(role.granted) || !self.universe.contains(role.manage_right)
            {
                return Err(RbacError::ValidationError(format!(
                    "role '{}' uses rights outside the universe",
                    role.name
                )));
            }
            if role_map.contains_key(&role.name) {
                return Err(RbacError::ValidationError(format!("duplicate role '{}'", role.name)));
            }
            role_map.insert(role.name.clone(), role);
        }

        let mut user_map = HashMap::with_capacity(users.len());
        for user in users {
            validate_name("user", &user.name)?;
            if !role_map.contains_key(&user.role) {
                return Err(RbacError::ValidationError(format!(
                    "user '{}' references unknown role '{}'",
                    user.name, user.role
                )));
            }
            if user_map.contains_key(&user.name) {
                return Err(RbacError::ValidationError(format!("duplicate user '{}'", user.name)));
            }
            user_map.insert(user.name.clone(), user);
        }

        Ok((role_map, user_map))
    }

    /// Replace both mappings at once.
    ///
    /// The batch goes through [`validate_batch`](Self::validate_batch) first;
    /// on error the current snapshot is left untouched.
    pub fn replace_all(&self, roles: Vec<Role>, users: Vec<User>) -> RbacResult<Arc<RegistrySnapshot>> {
        let (role_map, user_map) = self.validate_batch(roles, users)?;

        let published = self.publish(move |current| {
            Ok(RegistrySnapshot::from_parts(current.version() + 1, role_map, user_map))
        })?;
        log::debug!(
            "Replaced registry contents: {} roles, {} users (registry v{})",
            published.role_count(),
            published.user_count(),
            published.version()
        );
        Ok(published)
    }

    /// Run `build` against the current snapshot under the writer lock and
    /// publish its result
    fn publish<F>(&self, build: F) -> RbacResult<Arc<RegistrySnapshot>>
    where
        F: FnOnce(&RegistrySnapshot) -> RbacResult<RegistrySnapshot>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load_full();
        let next = Arc::new(build(current.as_ref())?);
        self.current.store(next.clone());
        log::debug!("Published registry snapshot v{}", next.version());
        Ok(next)
    }

    fn publish_infallible<F>(&self, edit: F) -> Arc<RegistrySnapshot>
    where
        F: FnOnce(&mut RegistrySnapshot),
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.current.load().next();
        edit(&mut next);
        let next = Arc::new(next);
        self.current.store(next.clone());
        log::debug!("Published registry snapshot v{}", next.version());
        next
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("Registry")
            .field("version", &snapshot.version())
            .field("roles", &snapshot.role_count())
            .field("users", &snapshot.user_count())
            .finish()
    }
}

/// Names end up as admin path segments, so `/` and control characters are out
fn validate_name(kind: &str, name: &str) -> RbacResult<()> {
    if name.trim().is_empty() {
        return Err(RbacError::ValidationError(format!("{} name must not be empty", kind)));
    }
    if name.chars().any(|c| c == '/' || c.is_control()) {
        return Err(RbacError::ValidationError(format!(
            "{} name '{}' must not contain '/' or control characters",
            kind,
            name.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::new(Arc::new(RightUniverse::new(["read", "write", "manage-users"]).unwrap()))
    }

    fn right(registry: &Registry, name: &str) -> Right {
        registry.universe().resolve(name).unwrap()
    }

    #[test]
    fn test_create_role_publishes_new_snapshot() {
        let registry = registry();
        let before = registry.snapshot();

        registry.create_role_named("editor", &["read", "write"], "manage-users").unwrap();

        let after = registry.snapshot();
        assert_eq!(before.role_count(), 0);
        assert_eq!(after.role_count(), 1);
        assert_eq!(after.version(), before.version() + 1);

        let editor = after.role("editor").unwrap();
        assert!(editor.grants(right(&registry, "write")));
        assert!(!editor.grants(right(&registry, "manage-users")));
        assert_eq!(editor.manage_right, right(&registry, "manage-users"));
    }

    #[test]
    fn test_duplicate_role_is_rejected() {
        let registry = registry();
        registry.create_role_named("editor", &["read"], "manage-users").unwrap();

        let err = registry.create_role_named("editor", &["write"], "manage-users").unwrap_err();
        assert_eq!(err, RbacError::DuplicateName("editor".into()));
        assert_eq!(registry.snapshot().role_count(), 1);
    }

    #[test]
    fn test_rights_outside_universe_are_invalid() {
        let registry = registry();
        let outside = Right::from_bit(9).unwrap();
        let read = right(&registry, "read");

        assert!(matches!(
            registry.create_role("a", &[read, outside], read),
            Err(RbacError::InvalidRight(_))
        ));
        assert!(matches!(registry.create_role("b", &[read], outside), Err(RbacError::InvalidRight(_))));
        assert!(matches!(
            registry.create_role_named("c", &["fly"], "read"),
            Err(RbacError::InvalidRight(_))
        ));
        assert_eq!(registry.snapshot().role_count(), 0);
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let registry = registry();
        assert!(matches!(
            registry.create_role_named(" ", &["read"], "read"),
            Err(RbacError::ValidationError(_))
        ));
        registry.create_role_named("viewer", &["read"], "read").unwrap();
        assert!(matches!(registry.create_user("", "viewer"), Err(RbacError::ValidationError(_))));
    }

    #[test]
    fn test_names_reject_slash_and_control_characters() {
        let registry = registry();
        assert!(matches!(
            registry.create_role_named("a/b", &["read"], "read"),
            Err(RbacError::ValidationError(_))
        ));
        assert!(matches!(
            registry.create_role_named("bad\nrole", &["read"], "read"),
            Err(RbacError::ValidationError(_))
        ));

        registry.create_role_named("night shift", &["read"], "read").unwrap();
        assert!(matches!(registry.create_user("x/y", "night shift"), Err(RbacError::ValidationError(_))));
        assert!(matches!(registry.create_user("tab\tuser", "night shift"), Err(RbacError::ValidationError(_))));
        assert_eq!(registry.snapshot().user_count(), 0);
    }

    #[test]
    fn test_guard_sees_snapshot_being_modified() {
        let registry = registry();
        let read = right(&registry, "read");
        let manage_users = right(&registry, "manage-users");
        registry.create_role("editor", &[read], read).unwrap();
        let checked = registry.snapshot();

        // role recreated with a stronger manage right after the caller looked
        registry.delete_role("editor").unwrap();
        registry.create_role("editor", &[read], manage_users).unwrap();
        assert_eq!(checked.role("editor").unwrap().manage_right, read);

        let guard = |current: &RegistrySnapshot| match current.role("editor") {
            Some(role) if role.manage_right == read => Ok(()),
            _ => Err(RbacError::Unauthorized("manage-users".into())),
        };
        let before = registry.snapshot();
        assert_eq!(
            registry.create_user_guarded("alice", "editor", guard).unwrap_err(),
            RbacError::Unauthorized("manage-users".into())
        );
        assert_eq!(registry.snapshot().version(), before.version());
        assert!(!registry.snapshot().has_user("alice"));

        let mut seen = None;
        registry
            .delete_role_guarded("editor", |current| {
                seen = Some(current.version());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, Some(before.version()));
    }

    #[test]
    fn test_create_user_requires_existing_role() {
        let registry = registry();
        let before = registry.snapshot();

        assert_eq!(
            registry.create_user("alice", "editor").unwrap_err(),
            RbacError::UnknownRole("editor".into())
        );
        let after = registry.snapshot();
        assert_eq!(after.user_count(), 0);
        assert_eq!(after.version(), before.version());

        registry.create_role_named("editor", &["read"], "manage-users").unwrap();
        registry.create_user("alice", "editor").unwrap();
        assert_eq!(
            registry.create_user("alice", "editor").unwrap_err(),
            RbacError::DuplicateName("alice".into())
        );
        assert_eq!(registry.snapshot().user_count(), 1);
    }

    #[test]
    fn test_old_snapshot_survives_publish() {
        let registry = registry();
        registry.create_role_named("editor", &["read"], "manage-users").unwrap();

        let pinned = registry.snapshot();
        registry.unload_roles();

        assert!(pinned.has_role("editor"));
        assert!(!registry.snapshot().has_role("editor"));
    }

    #[test]
    fn test_unload_roles_keeps_users() {
        let registry = registry();
        registry.create_role_named("editor", &["read"], "manage-users").unwrap();
        registry.create_user("alice", "editor").unwrap();

        let snapshot = registry.unload_roles();
        assert_eq!(snapshot.role_count(), 0);
        assert_eq!(snapshot.user_count(), 1);
        assert_eq!(snapshot.dangling_users().count(), 1);

        let snapshot = registry.unload_users();
        assert_eq!(snapshot.user_count(), 0);
    }

    #[test]
    fn test_delete_role_and_user() {
        let registry = registry();
        registry.create_role_named("editor", &["read"], "manage-users").unwrap();
        registry.create_user("alice", "editor").unwrap();

        assert!(matches!(registry.delete_role("editor"), Err(RbacError::ValidationError(_))));
        assert_eq!(registry.delete_user("bob").unwrap_err(), RbacError::UnknownUser("bob".into()));

        registry.delete_user("alice").unwrap();
        registry.delete_role("editor").unwrap();
        assert_eq!(registry.delete_role("editor").unwrap_err(), RbacError::UnknownRole("editor".into()));

        let snapshot = registry.snapshot();
        assert_eq!((snapshot.role_count(), snapshot.user_count()), (0, 0));
    }

    #[test]
    fn test_replace_all_is_all_or_nothing() {
        let registry = registry();
        registry.create_role_named("keep", &["read"], "read").unwrap();
        let before = registry.snapshot();

        let read = right(&registry, "read");
        let result = registry.replace_all(
            vec![Role::new("editor", RightSet::from(read), read)],
            vec![User::new("alice", "editor"), User::new("bob", "missing")],
        );
        assert!(matches!(result, Err(RbacError::ValidationError(_))));
        assert_eq!(registry.snapshot().version(), before.version());
        assert!(registry.snapshot().has_role("keep"));

        let published = registry
            .replace_all(
                vec![Role::new("editor", RightSet::from(read), read)],
                vec![User::new("alice", "editor")],
            )
            .unwrap();
        assert!(!published.has_role("keep"));
        assert!(published.has_user("alice"));
        assert_eq!(published.version(), before.version() + 1);
    }
}
