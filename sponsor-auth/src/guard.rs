//! The access guard: a small state machine gating protected screens.
//!
//! `Hydrating → Checking → {Allowed, Redirecting}`. While the store has not
//! resolved its first snapshot the guard stays in `Hydrating` and makes no
//! redirect decision, so a recoverable session never flashes through the
//! login screen. Once resolved, every snapshot change re-evaluates the
//! requirement; the decision itself is a pure function of (snapshot,
//! requirement).

use crate::navigation::{NavigationMap, LOGIN_PATH};
use crate::roles::{NormalizedRole, RoleResolver};
use crate::session::SessionSnapshot;

/// What a protected screen demands. Immutable for the screen's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequirement {
    pub required_role: Option<NormalizedRole>,
    pub fallback_path: String,
}

impl RouteRequirement {
    /// Any authenticated session may pass.
    pub fn authenticated() -> Self {
        RouteRequirement {
            required_role: None,
            fallback_path: LOGIN_PATH.to_string(),
        }
    }

    /// Only sessions satisfying `role` may pass.
    pub fn role(role: NormalizedRole) -> Self {
        RouteRequirement {
            required_role: Some(role),
            fallback_path: LOGIN_PATH.to_string(),
        }
    }
}

/// Transient allow/redirect outcome. Computed fresh on every relevant state
/// change; never cached across evaluations, since staleness would leak access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub allow: bool,
    pub redirect_to: Option<String>,
}

impl AuthDecision {
    fn allow() -> Self {
        AuthDecision {
            allow: true,
            redirect_to: None,
        }
    }

    fn redirect(path: String) -> Self {
        AuthDecision {
            allow: false,
            redirect_to: Some(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Store has not resolved its first snapshot; render a neutral loading
    /// indicator, decide nothing.
    Hydrating,
    /// Resolved but not yet evaluated against the requirement; resolves in
    /// the same evaluation pass.
    Checking,
    /// Session satisfies the requirement; protected content may render.
    Allowed,
    /// Navigate to the contained path; nothing renders before navigation.
    Redirecting(String),
}

/// Pure decision for one (snapshot, requirement) pair.
///
/// Unauthenticated traffic goes to the requirement's fallback path. An
/// authenticated session that fails a role check is sent to its own role's
/// landing area instead, so a student hitting a vendor screen lands on the
/// student dashboard rather than the login form. If that landing target would
/// itself reject the session, fall back to the login path rather than loop.
pub fn decide(
    resolver: &RoleResolver,
    nav: &NavigationMap,
    snapshot: &SessionSnapshot,
    requirement: &RouteRequirement,
) -> AuthDecision {
    let Some(session) = snapshot.session.as_ref() else {
        return AuthDecision::redirect(requirement.fallback_path.clone());
    };

    let Some(required) = requirement.required_role else {
        return AuthDecision::allow();
    };

    if resolver.satisfies_any(session, &[required]) {
        return AuthDecision::allow();
    }

    let target = nav.landing_path(snapshot.role);
    let target_accepts = match nav.requirement_for(target) {
        Some(role) => resolver.satisfies_any(session, &[role]),
        None => true,
    };

    if target_accepts && target != LOGIN_PATH {
        AuthDecision::redirect(target.to_string())
    } else {
        AuthDecision::redirect(LOGIN_PATH.to_string())
    }
}

/// One guard instance per protected screen. Feed it snapshots as they arrive;
/// it re-evaluates on every change and never leaves `Hydrating` until the
/// store has resolved.
#[derive(Debug)]
pub struct AccessGuard {
    requirement: RouteRequirement,
    state: GuardState,
}

impl AccessGuard {
    pub fn new(requirement: RouteRequirement) -> Self {
        AccessGuard {
            requirement,
            state: GuardState::Hydrating,
        }
    }

    pub fn requirement(&self) -> &RouteRequirement {
        &self.requirement
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// Re-evaluate against a new snapshot.
    pub fn observe(
        &mut self,
        resolver: &RoleResolver,
        nav: &NavigationMap,
        snapshot: &SessionSnapshot,
    ) -> &GuardState {
        if !snapshot.resolved {
            self.state = GuardState::Hydrating;
            return &self.state;
        }

        self.state = GuardState::Checking;
        let decision = decide(resolver, nav, snapshot, &self.requirement);
        self.state = if decision.allow {
            GuardState::Allowed
        } else {
            GuardState::Redirecting(
                decision
                    .redirect_to
                    .unwrap_or_else(|| LOGIN_PATH.to_string()),
            )
        };
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::ROLE_CLAIM;
    use crate::session::{Session, SessionTokens};
    use serde_json::json;
    use std::collections::HashMap;

    fn snapshot_for(role: Option<&str>) -> SessionSnapshot {
        let resolver = RoleResolver::default();
        let session = role.map(|r| Session {
            user_id: format!("user-{r}"),
            email: None,
            claims: HashMap::from([(ROLE_CLAIM.to_string(), json!(r))]),
            tokens: SessionTokens {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
            },
            expires_at: None,
        });
        let role = session
            .as_ref()
            .map(|s| resolver.normalize(s))
            .unwrap_or(NormalizedRole::None);
        SessionSnapshot {
            resolved: true,
            session,
            role,
        }
    }

    fn unresolved() -> SessionSnapshot {
        SessionSnapshot {
            resolved: false,
            session: None,
            role: NormalizedRole::None,
        }
    }

    #[test]
    fn hydrating_guard_never_redirects() {
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let mut guard = AccessGuard::new(RouteRequirement::role(NormalizedRole::Donor));
        let state = guard.observe(&resolver, &nav, &unresolved());
        assert_eq!(*state, GuardState::Hydrating);
    }

    #[test]
    fn unauthenticated_visit_redirects_to_login() {
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let mut guard = AccessGuard::new(RouteRequirement::role(NormalizedRole::Donor));
        let state = guard.observe(&resolver, &nav, &snapshot_for(None));
        assert_eq!(*state, GuardState::Redirecting(LOGIN_PATH.to_string()));
    }

    #[test]
    fn role_mismatch_redirects_to_own_landing_area() {
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let mut guard = AccessGuard::new(RouteRequirement::role(NormalizedRole::Vendor));
        let state = guard.observe(&resolver, &nav, &snapshot_for(Some("student")));
        assert_eq!(
            *state,
            GuardState::Redirecting("/student/dashboard".to_string())
        );
    }

    #[test]
    fn matching_role_is_allowed() {
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let mut guard = AccessGuard::new(RouteRequirement::role(NormalizedRole::Student));
        let state = guard.observe(&resolver, &nav, &snapshot_for(Some("student")));
        assert_eq!(*state, GuardState::Allowed);
    }

    #[test]
    fn no_required_role_admits_any_session() {
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let mut guard = AccessGuard::new(RouteRequirement::authenticated());
        assert_eq!(
            *guard.observe(&resolver, &nav, &snapshot_for(Some("donor"))),
            GuardState::Allowed
        );
        // But an absent session still redirects even with no role required.
        assert_eq!(
            *guard.observe(&resolver, &nav, &snapshot_for(None)),
            GuardState::Redirecting(LOGIN_PATH.to_string())
        );
    }

    #[test]
    fn admin_alias_session_passes_admin_guard() {
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let mut guard = AccessGuard::new(RouteRequirement::role(NormalizedRole::Admin));
        let state = guard.observe(&resolver, &nav, &snapshot_for(Some("System Manager")));
        assert_eq!(*state, GuardState::Allowed);
    }

    #[test]
    fn unrecognized_role_falls_back_to_login_not_a_loop() {
        // A session whose role normalizes to None fails every role check, and
        // its landing path is the login screen; the guard must send it there
        // rather than bounce between dashboards.
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let mut guard = AccessGuard::new(RouteRequirement::role(NormalizedRole::Donor));
        let state = guard.observe(&resolver, &nav, &snapshot_for(Some("mentor")));
        assert_eq!(*state, GuardState::Redirecting(LOGIN_PATH.to_string()));
    }

    #[test]
    fn decision_is_pure_over_inputs() {
        let resolver = RoleResolver::default();
        let nav = NavigationMap;
        let requirement = RouteRequirement::role(NormalizedRole::Vendor);
        let snapshot = snapshot_for(Some("vendor"));
        let first = decide(&resolver, &nav, &snapshot, &requirement);
        let second = decide(&resolver, &nav, &snapshot, &requirement);
        assert_eq!(first, second);
        assert!(first.allow);
        assert_eq!(first.redirect_to, None);
    }
}
