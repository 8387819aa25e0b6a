//! Backing store for persisted role and user records
//!
//! The store is read-only from Bastion's point of view: the reload controller
//! fetches the full record set and decides whether to publish it. Nothing is
//! ever written back.
//!
//! - [`JsonFileStore`] reads a JSON document from disk
//! - [`MemoryUserStore`] keeps records in memory (tests, embedding apps)
//!
//! # Document shape
//!
//! ```json
//! {
//!   "roles": [{ "name": "editor", "rights": ["read", "write"], "manage_right": "manage-users" }],
//!   "users": [{ "name": "alice", "role": "editor" }]
//! }
//! ```

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryUserStore;

use crate::rbac::RbacError;
use serde::{Deserialize, Serialize};

/// Persisted role record, rights still as loosely-typed names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub name: String,
    #[serde(default)]
    pub rights: Vec<String>,
    pub manage_right: String,
}

impl RoleRecord {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        rights: impl IntoIterator<Item = S>,
        manage_right: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rights: rights.into_iter().map(Into::into).collect(),
            manage_right: manage_right.into(),
        }
    }
}

/// Persisted user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub role: String,
}

impl UserRecord {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self { name: name.into(), role: role.into() }
    }
}

/// Full contents of a store at fetch time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// Store failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store could not be reached or read
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Store answered with something that is not a record set
    #[error("malformed store contents: {0}")]
    Malformed(String),
}

impl From<StoreError> for RbacError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => RbacError::LoadError(msg),
            StoreError::Malformed(msg) => RbacError::ValidationError(msg),
        }
    }
}

/// Read-only source of persisted roles and users
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch every persisted role and user record
    async fn fetch(&self) -> Result<StoreSnapshot, StoreError>;

    /// Store name for logging
    fn name(&self) -> &str;
}

// Implement UserStore for Arc<S> to allow sharing a store with its owner
#[async_trait::async_trait]
impl<S: UserStore + ?Sized> UserStore for std::sync::Arc<S> {
    async fn fetch(&self) -> Result<StoreSnapshot, StoreError> {
        (**self).fetch().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
