//! Session configuration.
//!
//! Reads the CF `config.json` written by `cf login` and layers the
//! environment overrides on top:
//! - `CF_HOME` relocates the `.cf` directory
//! - `CF_DOCKER_PASSWORD` supplies the registry password for docker pushes
//! - `CF_STAGING_TIMEOUT` / `CF_STARTUP_TIMEOUT` in minutes
//! - `CF_DIAL_TIMEOUT` in seconds
//! - `CF_TRACE` turns on request tracing

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cf_actor::TargetConfig;

use crate::error::CliError;

const DEFAULT_STAGING_TIMEOUT_MINUTES: u64 = 15;
const DEFAULT_STARTUP_TIMEOUT_MINUTES: u64 = 5;
const DEFAULT_DIAL_TIMEOUT_SECONDS: u64 = 5;
const POLLING_INTERVAL: Duration = Duration::from_secs(3);

/// Targeted organization as stored in `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationFields {
    /// Organization GUID.
    #[serde(rename = "GUID")]
    pub guid: String,
    /// Organization name.
    #[serde(rename = "Name")]
    pub name: String,
}

/// Targeted space as stored in `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceFields {
    /// Space GUID.
    #[serde(rename = "GUID")]
    pub guid: String,
    /// Space name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Whether SSH is allowed in the space.
    #[serde(rename = "AllowSSH")]
    pub allow_ssh: bool,
}

/// The subset of `config.json` this CLI uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ConfigFile {
    /// API endpoint, e.g. `https://api.example.com`.
    pub target: String,
    /// Version recorded at login.
    #[serde(rename = "APIVersion")]
    pub api_version: String,
    /// `bearer <jwt>`.
    pub access_token: String,
    /// UAA refresh token.
    pub refresh_token: String,
    /// Skip TLS verification.
    #[serde(rename = "SSLDisabled")]
    pub ssl_disabled: bool,
    /// UAA endpoint.
    pub uaa_endpoint: String,
    /// Targeted org.
    pub organization_fields: OrganizationFields,
    /// Targeted space.
    pub space_fields: SpaceFields,
}

/// Values taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `CF_DOCKER_PASSWORD`.
    pub docker_password: String,
    /// `CF_STAGING_TIMEOUT`, minutes.
    pub staging_timeout: Option<u64>,
    /// `CF_STARTUP_TIMEOUT`, minutes.
    pub startup_timeout: Option<u64>,
    /// `CF_DIAL_TIMEOUT`, seconds.
    pub dial_timeout: Option<u64>,
    /// `CF_TRACE` set to `true` or `1`.
    pub trace: bool,
}

impl EnvOverrides {
    /// Collect overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Collect overrides through `lookup`, usually [`std::env::var`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse().ok());
        Self {
            docker_password: lookup("CF_DOCKER_PASSWORD").unwrap_or_default(),
            staging_timeout: number("CF_STAGING_TIMEOUT"),
            startup_timeout: number("CF_STARTUP_TIMEOUT"),
            dial_timeout: number("CF_DIAL_TIMEOUT"),
            trace: lookup("CF_TRACE")
                .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
        }
    }
}

/// The logged-in user, decoded from the access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// User name, or client id for client credentials.
    pub name: String,
    /// User GUID, empty for clients.
    pub guid: String,
    /// Identity provider origin.
    pub origin: String,
    /// Whether the token was issued to a client rather than a user.
    pub is_client: bool,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    user_name: Option<String>,
    user_id: Option<String>,
    origin: Option<String>,
    client_id: Option<String>,
}

/// Session config plus environment overrides.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Persisted session state.
    pub file: ConfigFile,
    /// Environment overrides.
    pub env: EnvOverrides,
    /// Name the CLI was invoked as.
    pub binary_name: String,
}

impl Config {
    /// Load the config for `binary_name` from the default location and the
    /// process environment.
    ///
    /// A missing file is an empty, logged-out config.
    pub fn load(binary_name: impl Into<String>) -> Result<Self, CliError> {
        let path = config_path(std::env::var_os("CF_HOME").map(PathBuf::from));
        Self::load_from(path.as_deref(), EnvOverrides::from_env(), binary_name)
    }

    /// Load from an explicit path.
    pub fn load_from(
        path: Option<&Path>,
        env: EnvOverrides,
        binary_name: impl Into<String>,
    ) -> Result<Self, CliError> {
        let file = match path {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "reading config");
                let content = std::fs::read_to_string(path).map_err(|e| {
                    CliError::Config(format!(
                        "failed to read config file '{}': {e}",
                        path.display()
                    ))
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    CliError::Config(format!("invalid config file '{}': {e}", path.display()))
                })?
            }
            _ => ConfigFile::default(),
        };
        Ok(Self {
            file,
            env,
            binary_name: binary_name.into(),
        })
    }

    /// Name to use in "Use 'cf3 login'" style hints.
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// API endpoint, possibly empty.
    pub fn target(&self) -> &str {
        &self.file.target
    }

    /// Targeted org, with empty fields if none.
    pub const fn targeted_organization(&self) -> &OrganizationFields {
        &self.file.organization_fields
    }

    /// Targeted space, with empty fields if none.
    pub const fn targeted_space(&self) -> &SpaceFields {
        &self.file.space_fields
    }

    /// Password for `--docker-username`, empty when unset.
    pub fn docker_password(&self) -> &str {
        &self.env.docker_password
    }

    /// Upper bound on waiting for staging.
    pub fn staging_timeout(&self) -> Duration {
        minutes(self.env.staging_timeout.unwrap_or(DEFAULT_STAGING_TIMEOUT_MINUTES))
    }

    /// Upper bound on waiting for instances to start.
    pub fn startup_timeout(&self) -> Duration {
        minutes(self.env.startup_timeout.unwrap_or(DEFAULT_STARTUP_TIMEOUT_MINUTES))
    }

    /// HTTP connect timeout.
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.env.dial_timeout.unwrap_or(DEFAULT_DIAL_TIMEOUT_SECONDS))
    }

    /// Delay between polls.
    pub const fn polling_interval(&self) -> Duration {
        POLLING_INTERVAL
    }

    /// Whether to skip TLS verification.
    pub const fn skip_ssl_validation(&self) -> bool {
        self.file.ssl_disabled
    }

    /// Decode the user from the access token's JWT payload.
    ///
    /// An empty token gives an empty user.
    pub fn current_user(&self) -> Result<User, CliError> {
        let token = self.file.access_token.trim();
        if token.is_empty() {
            return Ok(User::default());
        }
        let token = token
            .strip_prefix("bearer ")
            .or_else(|| token.strip_prefix("Bearer "))
            .unwrap_or(token);

        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| CliError::InvalidToken("token is not a JWT".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| CliError::InvalidToken(e.to_string()))?;
        let claims: TokenClaims =
            serde_json::from_slice(&bytes).map_err(|e| CliError::InvalidToken(e.to_string()))?;

        Ok(match claims.user_name {
            Some(name) => User {
                name,
                guid: claims.user_id.unwrap_or_default(),
                origin: claims.origin.unwrap_or_default(),
                is_client: false,
            },
            None => User {
                name: claims.client_id.unwrap_or_default(),
                is_client: true,
                ..User::default()
            },
        })
    }
}

impl TargetConfig for Config {
    fn access_token(&self) -> &str {
        &self.file.access_token
    }

    fn refresh_token(&self) -> &str {
        &self.file.refresh_token
    }

    fn has_targeted_organization(&self) -> bool {
        !self.file.organization_fields.guid.is_empty()
    }

    fn has_targeted_space(&self) -> bool {
        !self.file.space_fields.guid.is_empty()
    }
}

fn config_path(cf_home: Option<PathBuf>) -> Option<PathBuf> {
    cf_home
        .or_else(dirs::home_dir)
        .map(|home| home.join(".cf").join("config.json"))
}

const fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}
