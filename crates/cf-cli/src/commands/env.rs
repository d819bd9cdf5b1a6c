//! `v3-set-env` and `v3-unset-env`.

use std::future::Future;

use cf_actor::{ActionError, ActionOutcome, Actor};

use crate::cli::{SetEnvArgs, UnsetEnvArgs};
use crate::commands::{CloudControllerActor, Requires, flavor, v3_preflight};
use crate::config::Config;
use crate::error::CliError;
use crate::ui::Ui;

/// Actor operations on user-provided environment variables.
pub trait EnvActor: CloudControllerActor {
    /// Set one variable.
    fn set_environment_variable_by_application_name_and_space(
        &self,
        space_guid: &str,
        app_name: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Remove one variable.
    fn unset_environment_variable_by_application_name_and_space(
        &self,
        space_guid: &str,
        app_name: &str,
        key: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;
}

impl EnvActor for Actor {
    fn set_environment_variable_by_application_name_and_space(
        &self,
        space_guid: &str,
        app_name: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::set_environment_variable_by_application_name_and_space(self, space_guid, app_name, key, value)
    }

    fn unset_environment_variable_by_application_name_and_space(
        &self,
        space_guid: &str,
        app_name: &str,
        key: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::unset_environment_variable_by_application_name_and_space(self, space_guid, app_name, key)
    }
}

/// Environment variable command executor.
pub struct EnvCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: EnvActor> EnvCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    /// `v3-set-env`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the variable cannot be set.
    pub async fn set(&self, ui: &mut Ui, args: &SetEnvArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Setting env variable {} for app {} {}",
            args.env_var_name,
            args.app_name,
            flavor(self.config, &user)
        ))?;

        let (result, warnings) = self
            .actor
            .set_environment_variable_by_application_name_and_space(
                &self.config.targeted_space().guid,
                &args.app_name,
                &args.env_var_name,
                &args.env_var_value,
            )
            .await;
        ui.display_warnings(&warnings)?;
        result?;

        ui.display_ok()?;
        self.display_restage_tip(ui, &args.app_name)?;
        Ok(())
    }

    /// `v3-unset-env`. A variable that was never set is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the variable cannot be removed.
    pub async fn unset(&self, ui: &mut Ui, args: &UnsetEnvArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Removing env variable {} from app {} {}",
            args.env_var_name,
            args.app_name,
            flavor(self.config, &user)
        ))?;

        let (result, warnings) = self
            .actor
            .unset_environment_variable_by_application_name_and_space(
                &self.config.targeted_space().guid,
                &args.app_name,
                &args.env_var_name,
            )
            .await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(()) => {
                ui.display_ok()?;
                self.display_restage_tip(ui, &args.app_name)?;
            }
            Err(err @ ActionError::EnvironmentVariableNotSet { .. }) => {
                ui.display_warning(&err.to_string())?;
                ui.display_ok()?;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    fn display_restage_tip(&self, ui: &mut Ui, app_name: &str) -> std::io::Result<()> {
        ui.display_text(&format!(
            "TIP: Use '{} v3-stage {app_name}' to ensure your env variable changes take effect.",
            self.config.binary_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{Calls, Canned, after_banner};
    use crate::config::tests::targeted_config;

    #[derive(Default)]
    struct FakeEnvActor {
        calls: Calls,
        set: Canned<()>,
        unset: Canned<()>,
    }

    impl CloudControllerActor for FakeEnvActor {
        fn cloud_controller_api_version(&self) -> &str {
            "3.27.0"
        }
    }

    impl EnvActor for FakeEnvActor {
        async fn set_environment_variable_by_application_name_and_space(
            &self,
            space_guid: &str,
            app_name: &str,
            key: &str,
            value: &str,
        ) -> ActionOutcome<()> {
            self.calls.record(format!("set {space_guid} {app_name} {key}={value}"));
            self.set.take()
        }

        async fn unset_environment_variable_by_application_name_and_space(
            &self,
            space_guid: &str,
            app_name: &str,
            key: &str,
        ) -> ActionOutcome<()> {
            self.calls.record(format!("unset {space_guid} {app_name} {key}"));
            self.unset.take()
        }
    }

    fn unset_args() -> UnsetEnvArgs {
        UnsetEnvArgs { app_name: "dora".into(), env_var_name: "FOO".into() }
    }

    #[tokio::test]
    async fn set_env_prints_tip() {
        let config = targeted_config();
        let actor = FakeEnvActor::default();
        actor.set.set(Ok(()), &["set-warning"]);
        let (mut ui, captured) = Ui::for_test("");
        let args = SetEnvArgs {
            app_name: "dora".into(),
            env_var_name: "FOO".into(),
            env_var_value: "bar".into(),
        };

        EnvCommand::new(&config, &actor).set(&mut ui, &args).await.expect("set");

        assert_eq!(actor.calls.all(), vec!["set some-space-guid dora FOO=bar"]);
        assert_eq!(
            after_banner(&captured.out()),
            "Setting env variable FOO for app dora in org some-org / space some-space as steve...\n\
             OK\n\
             TIP: Use 'faceman v3-stage dora' to ensure your env variable changes take effect.\n"
        );
        assert_eq!(captured.err(), "set-warning\n");
    }

    #[tokio::test]
    async fn set_env_missing_app_fails_without_ok() {
        let config = targeted_config();
        let actor = FakeEnvActor::default();
        actor
            .set
            .set(Err(ActionError::ApplicationNotFound { name: "dora".into() }), &["w"]);
        let (mut ui, captured) = Ui::for_test("");
        let args = SetEnvArgs {
            app_name: "dora".into(),
            env_var_name: "FOO".into(),
            env_var_value: "bar".into(),
        };

        let err = EnvCommand::new(&config, &actor).set(&mut ui, &args).await.expect_err("fails");

        assert_eq!(err.message("cf3"), "App dora not found");
        assert!(!after_banner(&captured.out()).contains("OK"));
        assert_eq!(captured.err(), "w\n");
    }

    #[tokio::test]
    async fn unset_env() {
        let config = targeted_config();
        let actor = FakeEnvActor::default();
        let (mut ui, captured) = Ui::for_test("");

        EnvCommand::new(&config, &actor).unset(&mut ui, &unset_args()).await.expect("unset");

        assert_eq!(actor.calls.all(), vec!["unset some-space-guid dora FOO"]);
        assert!(after_banner(&captured.out()).starts_with(
            "Removing env variable FOO from app dora in org some-org / space some-space as steve...\nOK\nTIP:"
        ));
    }

    #[tokio::test]
    async fn unset_env_not_set_is_benign() {
        let config = targeted_config();
        let actor = FakeEnvActor::default();
        actor
            .unset
            .set(Err(ActionError::EnvironmentVariableNotSet { name: "FOO".into() }), &[]);
        let (mut ui, captured) = Ui::for_test("");

        EnvCommand::new(&config, &actor).unset(&mut ui, &unset_args()).await.expect("benign");

        assert_eq!(captured.err(), "Env variable FOO was not set.\n");
        assert!(after_banner(&captured.out()).ends_with("OK\n"));
        assert!(!after_banner(&captured.out()).contains("TIP"));
    }
}
