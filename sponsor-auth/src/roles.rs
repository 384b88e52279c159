//! Role normalization.
//!
//! Raw role claims arrive as free-form strings from the identity platform.
//! They are coerced into the closed [`NormalizedRole`] set at this boundary so
//! downstream code never branches on raw strings.

use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claim key the provider stores the application role under.
pub const ROLE_CLAIM: &str = "role";

/// Closed set of application roles. A session with no recognized role claim
/// normalizes to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizedRole {
    Student,
    Donor,
    Vendor,
    Admin,
    None,
}

impl NormalizedRole {
    /// Parse a raw claim value. Case-insensitive; anything outside the four
    /// known role strings maps to `None`.
    pub fn parse(raw: &str) -> NormalizedRole {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => NormalizedRole::Student,
            "donor" => NormalizedRole::Donor,
            "vendor" => NormalizedRole::Vendor,
            "admin" => NormalizedRole::Admin,
            _ => NormalizedRole::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizedRole::Student => "student",
            NormalizedRole::Donor => "donor",
            NormalizedRole::Vendor => "vendor",
            NormalizedRole::Admin => "admin",
            NormalizedRole::None => "none",
        }
    }
}

impl fmt::Display for NormalizedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives normalized roles from session claims and answers role-requirement
/// checks, including the widened admin check via alias claims.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    admin_aliases: Vec<String>,
}

impl Default for RoleResolver {
    fn default() -> Self {
        RoleResolver::new(["administrator", "system manager", "system-manager"])
    }
}

impl RoleResolver {
    /// Build a resolver with an explicit admin alias set. Aliases are matched
    /// case-insensitively with surrounding whitespace ignored.
    pub fn new<I, S>(admin_aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RoleResolver {
            admin_aliases: admin_aliases
                .into_iter()
                .map(|s| s.into().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Map a session's claims to its normalized role. Pure and total:
    /// missing, non-string, or unrecognized claims yield `None`.
    pub fn normalize(&self, session: &Session) -> NormalizedRole {
        session
            .claims
            .get(ROLE_CLAIM)
            .and_then(|value| value.as_str())
            .map(NormalizedRole::parse)
            .unwrap_or(NormalizedRole::None)
    }

    /// True iff the session's normalized role is a member of `roles`, or
    /// `roles` asks for `Admin` and any string-valued claim matches the
    /// configured alias set. The alias widening is deliberate: identity
    /// vocabularies that predate this application label their operators
    /// "administrator" or "System Manager".
    pub fn satisfies_any(&self, session: &Session, roles: &[NormalizedRole]) -> bool {
        if roles.contains(&self.normalize(session)) {
            return true;
        }

        roles.contains(&NormalizedRole::Admin)
            && session
                .claims
                .values()
                .filter_map(|value| value.as_str())
                .any(|raw| self.is_admin_alias(raw))
    }

    fn is_admin_alias(&self, raw: &str) -> bool {
        let normalized = raw.trim().to_ascii_lowercase();
        self.admin_aliases.iter().any(|alias| *alias == normalized)
    }
}
