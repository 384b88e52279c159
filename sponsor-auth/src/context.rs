//! Process-wide auth context.
//!
//! One instance per process (per tab, in browser terms), constructed in the
//! shell and handed to every consumer. Cloning shares the underlying store;
//! there is exactly one writer no matter how many clones exist.

use crate::guard::{AccessGuard, RouteRequirement};
use crate::navigation::NavigationMap;
use crate::provider::IdentityProvider;
use crate::roles::RoleResolver;
use crate::session::{SessionStore, SessionWatch};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthContext {
    store: Arc<SessionStore>,
    nav: NavigationMap,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn IdentityProvider>, resolver: RoleResolver) -> Self {
        AuthContext {
            store: Arc::new(SessionStore::new(provider, resolver)),
            nav: NavigationMap,
        }
    }

    /// Kick off session recovery. Safe to call more than once; resolutions
    /// are shared, not raced.
    pub async fn initialize(&self) {
        self.store.initialize().await;
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn resolver(&self) -> &RoleResolver {
        self.store.resolver()
    }

    pub fn navigation(&self) -> &NavigationMap {
        &self.nav
    }

    pub fn subscribe(&self) -> SessionWatch {
        self.store.subscribe()
    }

    /// Mint a guard for a protected screen, starting in `Hydrating`.
    pub fn guard_for(&self, requirement: RouteRequirement) -> AccessGuard {
        AccessGuard::new(requirement)
    }

    /// Landing path for the current snapshot's role; where login success and
    /// the index route send the user.
    pub fn landing_path(&self) -> &'static str {
        self.nav.landing_path(self.store.snapshot().role)
    }
}
