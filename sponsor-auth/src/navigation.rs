//! Role-derived navigation: landing paths and menu entries.
//!
//! The role→landing-path mapping here is the single source of truth for both
//! post-login redirection and the guard's role-mismatch redirection. Menus are
//! a pure function of the current role, so they can never lag a logout.

use crate::roles::NormalizedRole;
use serde::Serialize;

/// Where unauthenticated traffic goes.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub path: &'static str,
}

/// The route table for the portal shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationMap;

impl NavigationMap {
    /// Preferred landing path per role. Consumed by login-success redirection
    /// and by the guard's role-mismatch redirect alike.
    pub fn landing_path(&self, role: NormalizedRole) -> &'static str {
        match role {
            NormalizedRole::Student => "/student/dashboard",
            NormalizedRole::Donor => "/donor/dashboard",
            NormalizedRole::Vendor => "/vendor/dashboard",
            NormalizedRole::Admin => "/admin/dashboard",
            NormalizedRole::None => LOGIN_PATH,
        }
    }

    /// Reverse lookup: the role a protected path requires, if any. Backs the
    /// guard's redirect-loop check.
    pub fn requirement_for(&self, path: &str) -> Option<NormalizedRole> {
        match path {
            "/student/dashboard" => Some(NormalizedRole::Student),
            "/donor/dashboard" => Some(NormalizedRole::Donor),
            "/vendor/dashboard" => Some(NormalizedRole::Vendor),
            "/admin/dashboard" => Some(NormalizedRole::Admin),
            _ => None,
        }
    }

    /// Menu entries for the current role. Derived purely from the role value;
    /// recompute on every snapshot change.
    pub fn menu_entries(&self, role: NormalizedRole) -> Vec<MenuEntry> {
        match role {
            NormalizedRole::Student => vec![
                MenuEntry {
                    label: "Dashboard",
                    path: "/student/dashboard",
                },
                MenuEntry {
                    label: "My Sponsorship",
                    path: "/student/sponsorship",
                },
            ],
            NormalizedRole::Donor => vec![
                MenuEntry {
                    label: "Dashboard",
                    path: "/donor/dashboard",
                },
                MenuEntry {
                    label: "Browse Students",
                    path: "/donor/students",
                },
                MenuEntry {
                    label: "My Sponsorships",
                    path: "/donor/sponsorships",
                },
            ],
            NormalizedRole::Vendor => vec![
                MenuEntry {
                    label: "Dashboard",
                    path: "/vendor/dashboard",
                },
                MenuEntry {
                    label: "Purchase Orders",
                    path: "/vendor/orders",
                },
            ],
            NormalizedRole::Admin => vec![
                MenuEntry {
                    label: "Dashboard",
                    path: "/admin/dashboard",
                },
                MenuEntry {
                    label: "Users",
                    path: "/admin/users",
                },
                MenuEntry {
                    label: "Sponsorships",
                    path: "/admin/sponsorships",
                },
                MenuEntry {
                    label: "Purchase Orders",
                    path: "/admin/orders",
                },
            ],
            NormalizedRole::None => vec![MenuEntry {
                label: "Login",
                path: LOGIN_PATH,
            }],
        }
    }
}
