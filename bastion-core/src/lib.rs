//! Bastion - Core
//!
//! The authorization core of a server: roles, users, rights and sessions held
//! in memory, consulted on every request, and reloadable without a restart.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bastion_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BastionConfig::load()?;
//!     let manager = UserManager::from_config(&config)?;
//!     manager.load_user().await?;
//!
//!     let alice = Session::authenticated("alice");
//!     if manager.authorize(&alice, "write")? {
//!         // ...
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`rights`] - Fixed right universe and `u64` right sets
//! - [`rbac`] - Role/user registry snapshots and the session authorizer
//! - [`store`] - Backing stores the user database is loaded from
//! - [`reload`] - All-or-nothing reloads from a store
//! - [`admin`] - Admin HTTP endpoints with the privilege-escalation guard
//! - [`manager`] - `UserManager`, the feature object applications install
//! - [`server`] - Minimal hyper dispatch loop
//! - [`config`] / [`logging`] - TOML + env configuration and logger setup
//!
//! # Guarantees
//!
//! - **Wait-free reads**: every decision reads one immutable snapshot
//! - **Atomic publication**: writers never expose a partial state
//! - **Fail-closed**: unknown users and missing roles hold no rights

pub mod admin;
pub mod config; // Configuration system with TOML support
pub mod logging;
pub mod manager;
pub mod rbac; // Role-Based Access Control system
pub mod reload;
pub mod rights;
pub mod server;
pub mod store;

pub use manager::UserManager;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::admin::{AdminHandlers, HeaderIdentity, IdentityProvider};
    pub use crate::config::BastionConfig;
    pub use crate::manager::UserManager;
    pub use crate::rbac::{Authorizer, RbacError, RbacResult, Registry, Session};
    pub use crate::reload::{ReloadController, ReloadReport};
    pub use crate::rights::{Right, RightSet, RightUniverse};
    pub use crate::store::{JsonFileStore, MemoryUserStore, UserStore};
}
