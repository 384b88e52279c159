pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;
pub mod utils;

use service_core::middleware::rate_limit::IpRateLimiter;
use services::rpc::SponsorshipRpc;
use sponsor_auth::provider::IdentityProvider;
use sponsor_auth::{NavigationMap, RoleResolver};
use std::sync::Arc;

/// Shared application state: the two remote boundaries plus the auth kernel's
/// resolver and navigation table. One resolver and one navigation map for the
/// whole process, so guard decisions and login redirects can never diverge.
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub provider: Arc<dyn IdentityProvider>,
    pub rpc: Arc<dyn SponsorshipRpc>,
    pub resolver: RoleResolver,
    pub nav: NavigationMap,
    pub login_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        provider: Arc<dyn IdentityProvider>,
        rpc: Arc<dyn SponsorshipRpc>,
    ) -> Self {
        let login_rate_limiter = service_core::middleware::rate_limit::create_ip_rate_limiter(
            settings.rate_limit.login_attempts,
            settings.rate_limit.login_window_seconds,
        );
        AppState {
            settings,
            provider,
            rpc,
            resolver: RoleResolver::default(),
            nav: NavigationMap,
            login_rate_limiter,
        }
    }
}
