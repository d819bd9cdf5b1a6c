//! The actor: domain operations composed from API calls.
//!
//! Operations are grouped by resource in submodules. Each public operation
//! returns an [`ActionOutcome`](crate::ActionOutcome) carrying every warning
//! gathered across the requests it made.

mod application;
mod bits;
mod isolation_segment;
mod network_policy;
mod package;
mod process;
mod route;
mod service_instance;
mod summary;
mod task;

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::ccv3::{self, ClientSettings};
use crate::error::{ActionError, CcError};
use crate::networking;

pub use application::new_application;
pub use bits::{DEFAULT_IGNORED_PATHS, zip_directory};
pub use network_policy::{NetworkPolicy, PolicyRequest};

/// Timing knobs for the polling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorSettings {
    /// Delay between polls.
    pub polling_interval: Duration,
    /// Upper bound on waiting for a build.
    pub staging_timeout: Duration,
    /// Upper bound on waiting for instances to run.
    pub startup_timeout: Duration,
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_secs(3),
            staging_timeout: Duration::from_secs(15 * 60),
            startup_timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// Performs domain operations against one target.
#[derive(Debug, Clone)]
pub struct Actor {
    cc: ccv3::Client,
    networking: Option<networking::Client>,
    settings: ActorSettings,
    api_version: String,
}

impl Actor {
    /// Assemble an actor from already-built clients.
    pub fn new(
        cc: ccv3::Client,
        networking: Option<networking::Client>,
        settings: ActorSettings,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            cc,
            networking,
            settings,
            api_version: api_version.into(),
        }
    }

    /// Discover the APIs behind `target` and build clients for them.
    ///
    /// Fails with [`CcError::ResourceNotFound`] when the target does not
    /// expose the v3 API at all.
    pub async fn connect(
        target: &str,
        access_token: &str,
        client_settings: &ClientSettings,
        settings: ActorSettings,
    ) -> Result<Self, CcError> {
        let http = ccv3::http_client(client_settings)?;
        let info = ccv3::root_info(&http, target).await?;

        let Some(v3) = info.links.cloud_controller_v3.as_ref() else {
            return Err(CcError::ResourceNotFound);
        };
        debug!(v3 = %v3.href, version = %info.v3_version(), "discovered cloud controller");

        let networking = info
            .links
            .network_policy_v1
            .as_ref()
            .map(|link| networking::Client::new(http.clone(), link.href.clone(), access_token));

        Ok(Self::new(
            ccv3::Client::new(http, v3.href.clone(), access_token),
            networking,
            settings,
            info.v3_version(),
        ))
    }

    /// Version string of the targeted v3 API.
    pub fn cloud_controller_api_version(&self) -> &str {
        &self.api_version
    }

    /// Polling settings in effect.
    pub const fn settings(&self) -> ActorSettings {
        self.settings
    }

    fn networking(&self) -> Result<&networking::Client, ActionError> {
        self.networking.as_ref().ok_or(ActionError::NetworkingUnavailable)
    }
}

/// Ten years; stands in for "never" when a timeout overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// When a wait of `timeout` starting now should give up.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Map a 404 onto a domain "not found" error, passing everything else through.
pub(crate) fn not_found_as(err: CcError, not_found: impl FnOnce() -> ActionError) -> ActionError {
    match err {
        CcError::ResourceNotFound => not_found(),
        other => ActionError::CloudController(other),
    }
}
