//! Bastion RBAC (Role-Based Access Control) core
//!
//! This module holds the role and user registries and the session authorizer.
//!
//! # Model
//! - A [`Role`] grants a [`RightSet`](crate::rights::RightSet) and names the
//!   right required to manage it
//! - A [`User`] is bound to exactly one role
//! - A [`Session`] is anonymous or bound to a user name
//! - A [`RegistrySnapshot`] is the immutable roles + users state at one version
//!
//! # Concurrency
//! Readers never lock: [`Registry::snapshot`] returns the current snapshot as
//! an `Arc`. Writers are serialized and publish whole new snapshots.
//!
//! # Example
//! ```rust,ignore
//! let registry = Arc::new(Registry::new(Arc::new(RightUniverse::default())));
//! registry.create_role_named("editor", &["read", "write"], "manage-users")?;
//! registry.create_user("alice", "editor")?;
//!
//! let authorizer = Authorizer::new(registry.clone());
//! let write = registry.universe().resolve("write")?;
//! assert!(authorizer.decide(&Session::authenticated("alice"), write));
//! ```

mod error;
mod registry;
mod roles;
mod session;
mod snapshot;
mod users;

// Public exports
pub use error::{RbacError, RbacResult};
pub use registry::Registry;
pub use roles::Role;
pub use session::{Authorizer, Session};
pub use snapshot::RegistrySnapshot;
pub use users::User;
