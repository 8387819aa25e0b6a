//! Immutable registry snapshots
//!
//! A snapshot is the complete role + user state at one version. Snapshots are
//! never mutated once published: writers derive a new snapshot from the
//! current one and swap it in (see [`super::Registry`]).

use super::{Role, User};
use std::collections::HashMap;

/// Role and user mappings published together as a single unit
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    version: u64,
    roles: HashMap<String, Role>,
    users: HashMap<String, User>,
}

impl RegistrySnapshot {
    /// Build a snapshot from complete mappings
    pub fn from_parts(
        version: u64,
        roles: HashMap<String, Role>,
        users: HashMap<String, User>,
    ) -> Self {
        Self { version, roles, users }
    }

    /// Publication counter, incremented by every write
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Users assigned to `role`
    pub fn members_of<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a User> + 'a {
        self.users.values().filter(move |user| user.role == role)
    }

    /// Users whose role is missing from this snapshot
    pub fn dangling_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|user| !self.roles.contains_key(&user.role))
    }

    pub(crate) fn next(&self) -> Self {
        Self { version: self.version + 1, roles: self.roles.clone(), users: self.users.clone() }
    }

    pub(crate) fn insert_role(&mut self, role: Role) {
        self.roles.insert(role.name.clone(), role);
    }

    pub(crate) fn insert_user(&mut self, user: User) {
        self.users.insert(user.name.clone(), user);
    }

    pub(crate) fn remove_role(&mut self, name: &str) -> Option<Role> {
        self.roles.remove(name)
    }

    pub(crate) fn remove_user(&mut self, name: &str) -> Option<User> {
        self.users.remove(name)
    }

    pub(crate) fn clear_roles(&mut self) {
        self.roles.clear();
    }

    pub(crate) fn clear_users(&mut self) {
        self.users.clear();
    }
}
