//! sponsor-auth: the session, role, and routing kernel behind the sponsorhub
//! portal.
//!
//! The identity platform owns tokens, password resets, and user records; this
//! crate owns what the application does with them: recovering and observing a
//! session, collapsing raw claims into a closed role set, and deciding which
//! screen a session may see and where it lands otherwise.

pub mod context;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod provider;
pub mod roles;
pub mod session;

pub use context::AuthContext;
pub use error::AuthError;
pub use guard::{decide, AccessGuard, AuthDecision, GuardState, RouteRequirement};
pub use navigation::{MenuEntry, NavigationMap, LOGIN_PATH};
pub use roles::{NormalizedRole, RoleResolver};
pub use session::{Session, SessionSnapshot, SessionStore, SessionTokens, SessionWatch};
