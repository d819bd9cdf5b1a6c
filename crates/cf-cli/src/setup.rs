//! Building a connected [`Actor`] from the config.
//!
//! Discovery happens once per invocation, before any command runs. A target
//! without a v3 API is reported as a version problem rather than a missing
//! resource.

use tracing::debug;

use cf_actor::ccv3::ClientSettings;
use cf_actor::{Actor, ActorSettings, CcError};

use crate::config::Config;
use crate::error::CliError;
use crate::version::MIN_VERSION_V3;

/// `User-Agent` sent with every request.
const USER_AGENT: &str = concat!("cf3/", env!("CARGO_PKG_VERSION"));

/// HTTP settings taken from the config.
pub fn client_settings(config: &Config) -> ClientSettings {
    ClientSettings {
        skip_ssl_validation: config.skip_ssl_validation(),
        dial_timeout: config.dial_timeout(),
        user_agent: USER_AGENT.to_string(),
    }
}

/// Polling settings taken from the config.
pub fn actor_settings(config: &Config) -> ActorSettings {
    ActorSettings {
        polling_interval: config.polling_interval(),
        staging_timeout: config.staging_timeout(),
        startup_timeout: config.startup_timeout(),
    }
}

/// Connect to the targeted API.
///
/// # Errors
///
/// Returns [`CliError::NoApiSet`] when no endpoint is configured,
/// [`CliError::MinimumVersionNotMet`] when the endpoint has no v3 API, and
/// any other discovery failure as is.
pub async fn connect(config: &Config) -> Result<Actor, CliError> {
    if config.target().is_empty() {
        return Err(CliError::NoApiSet);
    }
    debug!(target = %config.target(), "connecting");

    Actor::connect(
        config.target(),
        &config.file.access_token,
        &client_settings(config),
        actor_settings(config),
    )
    .await
    .map_err(|err| match err {
        CcError::ResourceNotFound => CliError::MinimumVersionNotMet {
            current: String::new(),
            minimum: MIN_VERSION_V3.to_string(),
        },
        other => other.into(),
    })
}
