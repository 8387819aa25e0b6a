//! User manager feature
//!
//! [`UserManager`] is what an application installs: it owns the registry, the
//! authorizer and the reload controller, wires them from [`BastionConfig`],
//! and hands out [`AdminHandlers`] for whatever prefix the application mounts
//! them under.

use crate::admin::AdminHandlers;
use crate::config::BastionConfig;
use crate::rbac::{Authorizer, RbacResult, Registry, RegistrySnapshot, Session};
use crate::reload::{ReloadController, ReloadReport, DEFAULT_LOAD_TIMEOUT};
use crate::rights::{Right, RightSet, RightUniverse};
use crate::store::{JsonFileStore, UserStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Roles, users and sessions for one server
pub struct UserManager {
    registry: Arc<Registry>,
    authorizer: Arc<Authorizer>,
    reload: Arc<ReloadController>,
    superuser: Right,
}

impl UserManager {
    /// Empty manager over `universe`, reloading from `store`
    pub fn new(universe: RightUniverse, superuser: &str, store: Arc<dyn UserStore>) -> RbacResult<Self> {
        Self::assemble(universe, superuser, store, DEFAULT_LOAD_TIMEOUT)
    }

    /// Build from config, reading the user database from `storage.user_database`
    pub fn from_config(config: &BastionConfig) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(&config.storage.user_database));
        Self::with_store(config, store)
    }

    /// Build from config with an explicit backing store
    pub fn with_store(config: &BastionConfig, store: Arc<dyn UserStore>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let universe = config.rights.universe().context("Invalid right universe")?;
        let manager =
            Self::assemble(universe, &config.rights.superuser, store, config.storage.load_timeout())
                .context("Invalid superuser right")?;
        manager
            .set_anonymous_rights(config.rights.anonymous.as_slice())
            .context("Invalid anonymous rights")?;

        log::info!(
            "User manager ready: {} rights, superuser '{}', store {}",
            manager.registry.universe().len(),
            config.rights.superuser,
            manager.reload.store_name()
        );
        Ok(manager)
    }

    fn assemble(
        universe: RightUniverse,
        superuser: &str,
        store: Arc<dyn UserStore>,
        load_timeout: Duration,
    ) -> RbacResult<Self> {
        let superuser = universe.resolve(superuser)?;
        let registry = Arc::new(Registry::new(Arc::new(universe)));
        let authorizer = Arc::new(Authorizer::new(registry.clone()));
        let reload =
            Arc::new(ReloadController::new(registry.clone(), store).with_timeout(load_timeout));
        Ok(Self { registry, authorizer, reload, superuser })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn authorizer(&self) -> &Arc<Authorizer> {
        &self.authorizer
    }

    pub fn reload_controller(&self) -> &Arc<ReloadController> {
        &self.reload
    }

    pub fn universe(&self) -> &RightUniverse {
        self.registry.universe()
    }

    pub fn superuser(&self) -> Right {
        self.superuser
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.registry.snapshot()
    }

    /// Create a role from right names
    pub fn create_role<S: AsRef<str>>(&self, name: &str, rights: &[S], manage_right: &str) -> RbacResult<()> {
        self.registry.create_role_named(name, rights, manage_right)
    }

    pub fn create_user(&self, name: &str, role: &str) -> RbacResult<()> {
        self.registry.create_user(name, role)
    }

    pub fn delete_role(&self, name: &str) -> RbacResult<()> {
        self.registry.delete_role(name)
    }

    pub fn delete_user(&self, name: &str) -> RbacResult<()> {
        self.registry.delete_user(name)
    }

    /// Reload roles and users from the backing store
    pub async fn load_user(&self) -> RbacResult<ReloadReport> {
        self.reload.load_user().await
    }

    pub async fn unload_roles(&self) -> Arc<RegistrySnapshot> {
        self.reload.unload_roles().await
    }

    pub async fn unload_users(&self) -> Arc<RegistrySnapshot> {
        self.reload.unload_users().await
    }

    /// Replace the anonymous rights by name
    pub fn set_anonymous_rights<S: AsRef<str>>(&self, names: &[S]) -> RbacResult<()> {
        let rights = self.universe().resolve_all(names)?;
        self.authorizer.set_anonymous_rights(&rights)
    }

    /// Effective rights of `session` in the current snapshot
    pub fn effective_rights(&self, session: &Session) -> RightSet {
        self.authorizer.effective_rights(session, &self.registry.snapshot())
    }

    /// Per-request check by right name; an unknown name is `InvalidRight`
    pub fn authorize(&self, session: &Session, right: &str) -> RbacResult<bool> {
        let right = self.universe().resolve(right)?;
        Ok(self.authorizer.decide(session, right))
    }

    /// Admin handlers mounted under `prefix`
    pub fn admin_handlers(&self, prefix: &str) -> AdminHandlers {
        AdminHandlers::new(prefix, self.authorizer.clone(), self.reload.clone(), self.superuser)
    }
}

impl std::fmt::Debug for UserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserManager")
            .field("registry", &self.registry)
            .field("reload", &self.reload)
            .field("superuser", &self.superuser)
            .finish()
    }
}
