//! In-memory user store
//!
//! Holds a record set behind a `RwLock`. Can be switched to "unavailable" to
//! exercise reload failure paths.

use super::{RoleRecord, StoreError, StoreSnapshot, UserRecord, UserStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory user store
///
/// # Example
///
/// ```rust,ignore
/// use bastion_core::store::{MemoryUserStore, RoleRecord, UserRecord};
///
/// let store = MemoryUserStore::new();
/// store.add_role(RoleRecord::new("editor", ["read"], "manage-users"));
/// store.add_user(UserRecord::new("alice", "editor"));
/// ```
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    contents: Arc<RwLock<StoreSnapshot>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: StoreSnapshot) -> Self {
        Self { contents: Arc::new(RwLock::new(contents)), unavailable: Arc::default() }
    }

    /// Replace the whole record set
    pub fn set_contents(&self, contents: StoreSnapshot) {
        *self.contents.write().unwrap_or_else(PoisonError::into_inner) = contents;
    }

    pub fn add_role(&self, role: RoleRecord) {
        self.contents.write().unwrap_or_else(PoisonError::into_inner).roles.push(role);
    }

    pub fn add_user(&self, user: UserRecord) {
        self.contents.write().unwrap_or_else(PoisonError::into_inner).users.push(user);
    }

    /// Make subsequent fetches fail with `StoreError::Unavailable`
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn fetch(&self) -> Result<StoreSnapshot, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(self.contents.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryUserStore::new();
        store.add_role(RoleRecord::new("editor", ["read"], "manage-users"));
        store.add_user(UserRecord::new("alice", "editor"));

        let snapshot = store.fetch().await.unwrap();
        assert_eq!(snapshot.roles.len(), 1);
        assert_eq!(snapshot.users[0].role, "editor");
    }

    #[tokio::test]
    async fn test_memory_store_unavailable() {
        let store = MemoryUserStore::new();
        store.set_available(false);
        assert!(matches!(store.fetch().await, Err(StoreError::Unavailable(_))));

        store.set_available(true);
        assert!(store.fetch().await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_contents() {
        let store = MemoryUserStore::new();
        let handle = store.clone();
        handle.set_contents(StoreSnapshot {
            roles: vec![RoleRecord::new("viewer", ["read"], "superuser")],
            users: vec![],
        });

        assert_eq!(store.fetch().await.unwrap().roles[0].name, "viewer");
    }
}
