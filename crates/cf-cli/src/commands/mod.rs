//! CLI command implementations.
//!
//! Every command runs the same preamble before touching the API. The `v3-*`
//! commands first print the experimental banner, even when a later step fails.
//! 1. check the target's API version against the command's minimum
//! 2. check login and, as needed, the targeted org and space
//! 3. decode the current user for the "as USER..." flavor text
//!
//! Each submodule declares the slice of the actor it needs as a trait, so
//! commands can be exercised against fakes:
//! - [`apps`] - listing and showing apps
//! - [`app`] - creating, deleting, starting, stopping and restarting apps
//! - [`env`] - user-provided environment variables
//! - [`process`] - scaling and instance restarts
//! - [`package`] - packages, staging and droplets
//! - [`push`] - the whole push flow
//! - [`task`] - one-off tasks
//! - [`isolation_segment`] - isolation segments and their entitlements
//! - [`service`] - sharing service instances across spaces
//! - [`network_policy`] - container-to-container policies

pub mod app;
pub mod apps;
pub mod env;
pub mod isolation_segment;
pub mod network_policy;
pub mod package;
pub mod process;
pub mod push;
pub mod service;
pub mod task;

pub use app::AppCommand;
pub use apps::AppsCommand;
pub use env::EnvCommand;
pub use isolation_segment::IsolationSegmentCommand;
pub use network_policy::NetworkPolicyCommand;
pub use package::PackageCommand;
pub use process::ProcessCommand;
pub use push::PushCommand;
pub use service::ServiceCommand;
pub use task::TaskCommand;

use std::future::Future;
use std::pin::pin;

use tokio::sync::mpsc::UnboundedReceiver;

use cf_actor::{ActionError, Actor, SharedActor, Warnings};

use crate::config::{Config, User};
use crate::error::CliError;
use crate::ui::Ui;
use crate::version::{MIN_VERSION_V3, minimum_version_check};

/// What every command needs from the actor before its real work.
pub trait CloudControllerActor: Send + Sync {
    /// Version string of the targeted v3 API.
    fn cloud_controller_api_version(&self) -> &str;
}

impl CloudControllerActor for Actor {
    fn cloud_controller_api_version(&self) -> &str {
        Actor::cloud_controller_api_version(self)
    }
}

/// Which parts of the target a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Requires {
    /// Logged in is enough.
    Login,
    /// An org must be targeted.
    Org,
    /// An org and a space must be targeted.
    Space,
}

/// Version check, target check and current user, in that order.
pub(crate) fn preflight<A: CloudControllerActor>(
    config: &Config,
    actor: &A,
    minimum_version: &str,
    requires: Requires,
) -> Result<User, CliError> {
    minimum_version_check(actor.cloud_controller_api_version(), minimum_version)?;
    let (org, space) = match requires {
        Requires::Login => (false, false),
        Requires::Org => (true, false),
        Requires::Space => (true, true),
    };
    SharedActor::new(config).check_target(org, space)?;
    config.current_user()
}

/// The experimental banner, then [`preflight`] against the v3 minimum.
pub(crate) fn v3_preflight<A: CloudControllerActor>(
    ui: &mut Ui,
    config: &Config,
    actor: &A,
    requires: Requires,
) -> Result<User, CliError> {
    ui.display_experimental_warning()?;
    preflight(config, actor, MIN_VERSION_V3, requires)
}

/// Drive `poll` to completion, printing each batch of warnings it sends as
/// soon as it arrives. Anything still queued when `poll` finishes is printed
/// before returning.
pub(crate) async fn relay_warnings<F>(
    ui: &mut Ui,
    mut warnings_rx: UnboundedReceiver<Warnings>,
    poll: F,
) -> Result<(), CliError>
where
    F: Future<Output = Result<(), ActionError>>,
{
    let mut poll = pin!(poll);
    let result = loop {
        tokio::select! {
            result = &mut poll => break result,
            Some(warnings) = warnings_rx.recv() => ui.display_warnings(&warnings)?,
        }
    };
    while let Ok(warnings) = warnings_rx.try_recv() {
        ui.display_warnings(&warnings)?;
    }
    Ok(result?)
}

/// `in org O / space S as U...` for the targeted org and space.
pub(crate) fn flavor(config: &Config, user: &User) -> String {
    format!(
        "in org {} / space {} as {}...",
        config.targeted_organization().name,
        config.targeted_space().name,
        user.name
    )
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::targeted_config;
    use cf_actor::ActionError;

    struct Versioned(&'static str);

    impl CloudControllerActor for Versioned {
        fn cloud_controller_api_version(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn old_api_fails_before_target_check() {
        let config = Config::default();
        let err = preflight(&config, &Versioned("3.0.0"), "3.27.0", Requires::Space).expect_err("too old");
        assert!(matches!(err, CliError::MinimumVersionNotMet { .. }));
    }

    #[test]
    fn logged_out_fails_target_check() {
        let config = Config::default();
        let err = preflight(&config, &Versioned("3.80.0"), "3.27.0", Requires::Login).expect_err("logged out");
        assert!(matches!(err, CliError::Actor(ActionError::NotLoggedIn)));
    }

    #[test]
    fn missing_space_fails_when_required() {
        let mut config = targeted_config();
        config.file.space_fields = Default::default();

        assert!(preflight(&config, &Versioned("3.80.0"), "", Requires::Org).is_ok());
        let err = preflight(&config, &Versioned("3.80.0"), "", Requires::Space).expect_err("no space");
        assert!(matches!(err, CliError::Actor(ActionError::NoSpaceTargeted)));
    }

    #[test]
    fn v3_banner_prints_even_when_version_check_fails() {
        let config = targeted_config();
        let (mut ui, captured) = Ui::for_test("");

        let err = v3_preflight(&mut ui, &config, &Versioned("3.26.0"), Requires::Space).expect_err("too old");

        assert!(matches!(err, CliError::MinimumVersionNotMet { .. }));
        assert_eq!(testing::after_banner(&captured.out()), "");
    }

    #[tokio::test]
    async fn relay_prints_warnings_sent_during_poll() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let (mut ui, captured) = Ui::for_test("");

        let poll = async move {
            let _ = tx.send(vec!["first".to_string()]);
            tokio::task::yield_now().await;
            let _ = tx.send(vec!["second".to_string(), "third".to_string()]);
            Ok(())
        };
        relay_warnings(&mut ui, rx, poll).await.expect("relay");

        assert_eq!(captured.err(), "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn relay_returns_poll_error_after_draining() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let (mut ui, captured) = Ui::for_test("");

        let poll = async move {
            let _ = tx.send(vec!["late".to_string()]);
            Err(ActionError::StartupTimeout { name: "dora".into() })
        };
        let err = relay_warnings(&mut ui, rx, poll).await.expect_err("timeout");

        assert!(matches!(err, CliError::Actor(ActionError::StartupTimeout { .. })));
        assert_eq!(captured.err(), "late\n");
    }

    #[test]
    fn flavor_names_org_space_and_user() {
        let config = targeted_config();
        let user = preflight(&config, &Versioned(""), "", Requires::Space).expect("preflight");
        assert_eq!(flavor(&config, &user), "in org some-org / space some-space as steve...");
    }
}
