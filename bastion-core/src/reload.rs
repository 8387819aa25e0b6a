//! Reload controller
//!
//! A reload is one logical transaction: fetch every record from the backing
//! store, validate the batch as a unit, and publish it as the next snapshot.
//! Any failure leaves the published snapshot exactly as it was, so the server
//! keeps answering from the last known good state.
//!
//! Only one reload runs at a time. The fetch happens outside the registry's
//! writer lock, so create operations and readers are never held up by a slow
//! store.

use crate::rbac::{RbacError, RbacResult, Registry, RegistrySnapshot, Role, User};
use crate::store::{StoreSnapshot, UserStore};
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default bound on a store fetch
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of the last successful reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    /// Registry version published by the reload
    pub version: u64,
    pub roles: usize,
    pub users: usize,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Coordinates bulk loads and unloads of the registry
pub struct ReloadController {
    registry: Arc<Registry>,
    store: Arc<dyn UserStore>,
    timeout: Duration,
    reload_lock: tokio::sync::Mutex<()>,
    last_report: ArcSwapOption<ReloadReport>,
}

impl ReloadController {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn UserStore>) -> Self {
        Self {
            registry,
            store,
            timeout: DEFAULT_LOAD_TIMEOUT,
            reload_lock: tokio::sync::Mutex::new(()),
            last_report: ArcSwapOption::empty(),
        }
    }

    /// Set the bound on a single store fetch
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Report of the last successful reload, if any
    pub fn last_report(&self) -> Option<Arc<ReloadReport>> {
        self.last_report.load_full()
    }

    /// Load the user database: fetch, validate the whole batch, publish.
    ///
    /// # Errors
    /// - `LoadError` if the store is unreachable or exceeds the timeout
    /// - `ValidationError` if the batch is malformed or inconsistent
    ///
    /// Both leave the published snapshot untouched.
    pub async fn load_user(&self) -> RbacResult<ReloadReport> {
        let _reload = self.reload_lock.lock().await;
        let started = Instant::now();

        let result = self.fetch_batch().await.and_then(|(roles, users)| {
            self.registry.replace_all(roles, users)
        });

        match result {
            Ok(snapshot) => {
                let report = self.report(&snapshot, started);
                log::info!(
                    "Loaded user database from {}: {} roles, {} users in {}ms (registry v{})",
                    self.store.name(),
                    report.roles,
                    report.users,
                    report.duration_ms,
                    report.version
                );
                self.last_report.store(Some(Arc::new(report.clone())));
                Ok(report)
            }
            Err(err) => {
                log::warn!(
                    "Reload from {} failed, keeping registry v{}: {}",
                    self.store.name(),
                    self.registry.snapshot().version(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Fetch and validate without publishing; returns `(roles, users)` counts
    pub async fn check(&self) -> RbacResult<(usize, usize)> {
        let (roles, users) = self.fetch_batch().await?;
        let (roles, users) = self.registry.validate_batch(roles, users)?;
        Ok((roles.len(), users.len()))
    }

    /// Empty the user mapping, serialized with reloads
    pub async fn unload_users(&self) -> Arc<RegistrySnapshot> {
        let _reload = self.reload_lock.lock().await;
        self.registry.unload_users()
    }

    /// Empty the role mapping, serialized with reloads
    pub async fn unload_roles(&self) -> Arc<RegistrySnapshot> {
        let _reload = self.reload_lock.lock().await;
        self.registry.unload_roles()
    }

    async fn fetch_batch(&self) -> RbacResult<(Vec<Role>, Vec<User>)> {
        let fetched = match tokio::time::timeout(self.timeout, self.store.fetch()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(RbacError::LoadError(format!(
                    "{} did not answer within {}ms",
                    self.store.name(),
                    self.timeout.as_millis()
                )))
            }
        };
        self.convert(fetched)
    }

    /// Turn loosely-typed records into roles and users. Unknown right names
    /// make the whole batch invalid.
    fn convert(&self, fetched: StoreSnapshot) -> RbacResult<(Vec<Role>, Vec<User>)> {
        let universe = self.registry.universe();

        let roles = fetched
            .roles
            .into_iter()
            .map(|record| {
                let granted = universe.right_set(record.rights.as_slice()).and_then(|granted| {
                    Ok((granted, universe.resolve(&record.manage_right)?))
                });
                match granted {
                    Ok((granted, manage_right)) => Ok(Role::new(record.name, granted, manage_right)),
                    Err(err) => Err(RbacError::ValidationError(format!(
                        "role '{}': {}",
                        record.name, err
                    ))),
                }
            })
            .collect::<RbacResult<Vec<_>>>()?;

        let users = fetched.users.into_iter().map(|record| User::new(record.name, record.role)).collect();

        Ok((roles, users))
    }

    fn report(&self, snapshot: &RegistrySnapshot, started: Instant) -> ReloadReport {
        ReloadReport {
            version: snapshot.version(),
            roles: snapshot.role_count(),
            users: snapshot.user_count(),
            finished_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

impl std::fmt::Debug for ReloadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadController")
            .field("store", &self.store.name())
            .field("timeout", &self.timeout)
            .field("last_report", &self.last_report())
            .finish()
    }
}
