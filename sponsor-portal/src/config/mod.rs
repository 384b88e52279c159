use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub identity: IdentitySettings,
    pub platform: PlatformSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// The identity platform boundary (token grants, invites, password ops).
#[derive(Deserialize, Clone)]
pub struct IdentitySettings {
    /// Platform base URL, e.g. `https://project.example.co`.
    pub url: String,
    /// Publishable key sent with end-user auth calls.
    pub anon_key: Secret<String>,
    /// Privileged key for the admin surface. Never exposed to clients.
    pub service_key: Secret<String>,
    /// Refresh token persistence for session recovery across restarts.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

/// The data platform boundary (remote stored procedures).
#[derive(Deserialize, Clone)]
pub struct PlatformSettings {
    /// REST base URL, e.g. `https://project.example.co/rest/v1`.
    pub rest_url: String,
    pub service_key: Secret<String>,
}

#[derive(Deserialize, Clone)]
pub struct RateLimitSettings {
    #[serde(default = "default_login_attempts")]
    pub login_attempts: u32,
    #[serde(default = "default_login_window_seconds")]
    pub login_window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        RateLimitSettings {
            login_attempts: default_login_attempts(),
            login_window_seconds: default_login_window_seconds(),
        }
    }
}

fn default_login_attempts() -> u32 {
    5
}

fn default_login_window_seconds() -> u64 {
    900
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    // Works both from the workspace root and from inside the crate directory.
    let configuration_directory = if base_path.ends_with("sponsor-portal") {
        base_path.join("config")
    } else {
        base_path.join("sponsor-portal").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
