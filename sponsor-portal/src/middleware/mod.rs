pub mod auth;

pub use auth::{authorize_api, guard_middleware, load_snapshot, SESSION_KEY};
