//! App lifecycle commands: `v3-create-app`, `v3-delete`, `v3-start`,
//! `v3-stop` and `v3-restart`.

use std::future::Future;

use cf_actor::resources::Application;
use cf_actor::actor::new_application;
use cf_actor::{ActionError, ActionOutcome, Actor};

use crate::cli::{AppNameArgs, CreateAppArgs, DeleteAppArgs};
use crate::commands::{CloudControllerActor, Requires, flavor, v3_preflight};
use crate::config::{Config, User};
use crate::error::CliError;
use crate::ui::Ui;

/// Actor operations for the app lifecycle.
pub trait AppActor: CloudControllerActor {
    /// Look up an app by name.
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send;

    /// Create an app.
    fn create_application_in_space(
        &self,
        app: &Application,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send;

    /// Delete an app by name.
    fn delete_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Request the app to run.
    fn start_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Request the app to stop.
    fn stop_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send;
}

impl AppActor for Actor {
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::get_application_by_name_and_space(self, app_name, space_guid)
    }

    fn create_application_in_space(
        &self,
        app: &Application,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::create_application_in_space(self, app, space_guid)
    }

    fn delete_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::delete_application_by_name_and_space(self, app_name, space_guid)
    }

    fn start_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::start_application(self, app_guid)
    }

    fn stop_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::stop_application(self, app_guid)
    }
}

/// App lifecycle command executor.
pub struct AppCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: AppActor> AppCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    fn space_guid(&self) -> &str {
        &self.config.targeted_space().guid
    }

    /// `v3-create-app`. An existing app with the same name is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the app cannot be created.
    pub async fn create(&self, ui: &mut Ui, args: &CreateAppArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Creating V3 app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;

        let app = new_application(&args.app_name, args.app_type.into());
        let (result, warnings) = self.actor.create_application_in_space(&app, self.space_guid()).await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(_) => {}
            Err(ActionError::ApplicationAlreadyExists { .. }) => {
                ui.display_warning(&format!("App {} already exists", args.app_name))?;
            }
            Err(err) => return Err(err.into()),
        }
        ui.display_ok()?;
        Ok(())
    }

    /// `v3-delete`. Asks first unless forced; a missing app is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the delete fails.
    pub async fn delete(&self, ui: &mut Ui, args: &DeleteAppArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;

        if !args.force {
            let confirmed = ui.display_bool_prompt(false, &format!("Really delete the app {}?", args.app_name))?;
            if !confirmed {
                ui.display_text("Delete cancelled")?;
                return Ok(());
            }
        }

        ui.display_text(&format!(
            "Deleting app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;
        let (result, warnings) = self
            .actor
            .delete_application_by_name_and_space(&args.app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(()) => {}
            Err(ActionError::ApplicationNotFound { .. }) => {
                ui.display_warning(&format!("App {} does not exist", args.app_name))?;
            }
            Err(err) => return Err(err.into()),
        }
        ui.display_ok()?;
        Ok(())
    }

    /// `v3-start`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the app cannot be started.
    pub async fn start(&self, ui: &mut Ui, args: &AppNameArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        let app = self.application(ui, &args.app_name).await?;

        if app.started() {
            ui.display_text(&format!("App {} is already started", args.app_name))?;
            ui.display_ok()?;
            return Ok(());
        }
        self.start_app(ui, &app, &user).await
    }

    /// `v3-stop`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the app cannot be stopped.
    pub async fn stop(&self, ui: &mut Ui, args: &AppNameArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        let app = self.application(ui, &args.app_name).await?;

        if !app.started() {
            ui.display_text(&format!("App {} is already stopped", args.app_name))?;
            ui.display_ok()?;
            return Ok(());
        }
        self.stop_app(ui, &app, &user).await
    }

    /// `v3-restart`: stop if running, then start.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or either step fails.
    pub async fn restart(&self, ui: &mut Ui, args: &AppNameArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        let app = self.application(ui, &args.app_name).await?;

        if app.started() {
            self.stop_app(ui, &app, &user).await?;
        }
        self.start_app(ui, &app, &user).await
    }

    async fn application(&self, ui: &mut Ui, app_name: &str) -> Result<Application, CliError> {
        let (result, warnings) = self
            .actor
            .get_application_by_name_and_space(app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        Ok(result?)
    }

    async fn start_app(&self, ui: &mut Ui, app: &Application, user: &User) -> Result<(), CliError> {
        ui.display_text(&format!("Starting app {} {}", app.name, flavor(self.config, user)))?;
        let (result, warnings) = self.actor.start_application(&app.guid).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }

    async fn stop_app(&self, ui: &mut Ui, app: &Application, user: &User) -> Result<(), CliError> {
        ui.display_text(&format!("Stopping app {} {}", app.name, flavor(self.config, user)))?;
        let (result, warnings) = self.actor.stop_application(&app.guid).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::AppType;
    use crate::commands::testing::{Calls, Canned, after_banner};
    use crate::config::tests::targeted_config;
    use cf_actor::resources::{ApplicationState, LifecycleType};

    #[derive(Default)]
    struct FakeAppActor {
        calls: Calls,
        app: Canned<Application>,
        create: Canned<Application>,
        delete: Canned<()>,
        start: Canned<()>,
        stop: Canned<()>,
    }

    impl FakeAppActor {
        fn with_app(state: ApplicationState) -> Self {
            let actor = Self::default();
            actor.app.set(
                Ok(Application {
                    guid: "app-guid".into(),
                    name: "dora".into(),
                    state,
                    ..Default::default()
                }),
                &[],
            );
            actor
        }
    }

    impl CloudControllerActor for FakeAppActor {
        fn cloud_controller_api_version(&self) -> &str {
            "3.80.0"
        }
    }

    impl AppActor for FakeAppActor {
        async fn get_application_by_name_and_space(&self, app_name: &str, space_guid: &str) -> ActionOutcome<Application> {
            self.calls.record(format!("get {app_name} {space_guid}"));
            self.app.take()
        }

        async fn create_application_in_space(&self, app: &Application, space_guid: &str) -> ActionOutcome<Application> {
            self.calls
                .record(format!("create {} {} {space_guid}", app.name, app.lifecycle.kind.as_str()));
            self.create.take()
        }

        async fn delete_application_by_name_and_space(&self, app_name: &str, space_guid: &str) -> ActionOutcome<()> {
            self.calls.record(format!("delete {app_name} {space_guid}"));
            self.delete.take()
        }

        async fn start_application(&self, app_guid: &str) -> ActionOutcome<()> {
            self.calls.record(format!("start {app_guid}"));
            self.start.take()
        }

        async fn stop_application(&self, app_guid: &str) -> ActionOutcome<()> {
            self.calls.record(format!("stop {app_guid}"));
            self.stop.take()
        }
    }

    fn create_args(app_type: AppType) -> CreateAppArgs {
        CreateAppArgs { app_name: "dora".into(), app_type }
    }

    fn delete_args(force: bool) -> DeleteAppArgs {
        DeleteAppArgs { app_name: "dora".into(), force }
    }

    fn name_args() -> AppNameArgs {
        AppNameArgs { app_name: "dora".into() }
    }

    #[tokio::test]
    async fn create_passes_lifecycle_and_prints_ok() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        actor.create.set(Ok(Application::default()), &["w1", "w2"]);
        let (mut ui, captured) = Ui::for_test("");

        AppCommand::new(&config, &actor)
            .create(&mut ui, &create_args(AppType::Docker))
            .await
            .expect("create");

        assert_eq!(actor.calls.all(), vec!["create dora docker some-space-guid"]);
        assert_eq!(
            after_banner(&captured.out()),
            "Creating V3 app dora in org some-org / space some-space as steve...\nOK\n"
        );
        assert_eq!(captured.err(), "w1\nw2\n");
        assert_eq!(LifecycleType::from(AppType::Buildpack), LifecycleType::Buildpack);
    }

    #[tokio::test]
    async fn create_existing_app_is_benign() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        actor
            .create
            .set(Err(ActionError::ApplicationAlreadyExists { name: "dora".into() }), &["w"]);
        let (mut ui, captured) = Ui::for_test("");

        AppCommand::new(&config, &actor)
            .create(&mut ui, &create_args(AppType::Buildpack))
            .await
            .expect("benign");

        assert_eq!(captured.err(), "w\nApp dora already exists\n");
        assert!(after_banner(&captured.out()).ends_with("OK\n"));
    }

    #[tokio::test]
    async fn create_other_error_has_no_ok() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        actor.create.set(Err(ActionError::NoSpaceTargeted), &["w"]);
        let (mut ui, captured) = Ui::for_test("");

        let result = AppCommand::new(&config, &actor)
            .create(&mut ui, &create_args(AppType::Buildpack))
            .await;

        assert!(result.is_err());
        assert!(!after_banner(&captured.out()).contains("OK"));
        assert_eq!(captured.err(), "w\n");
    }

    #[tokio::test]
    async fn create_requires_logged_in_target() {
        let config = Config::default();
        let actor = FakeAppActor::default();
        let (mut ui, _) = Ui::for_test("");

        let err = AppCommand::new(&config, &actor)
            .create(&mut ui, &create_args(AppType::Buildpack))
            .await
            .expect_err("not logged in");

        assert!(matches!(err, CliError::Actor(ActionError::NotLoggedIn)));
        assert!(actor.calls.all().is_empty());
    }

    #[tokio::test]
    async fn delete_declined_does_not_delete() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        let (mut ui, captured) = Ui::for_test("n\n");

        AppCommand::new(&config, &actor)
            .delete(&mut ui, &delete_args(false))
            .await
            .expect("cancelled");

        assert_eq!(actor.calls.count("delete"), 0);
        assert_eq!(after_banner(&captured.out()), "Really delete the app dora? [yN]: Delete cancelled\n");
    }

    #[tokio::test]
    async fn delete_default_answer_does_not_delete() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        let (mut ui, _) = Ui::for_test("\n");

        AppCommand::new(&config, &actor)
            .delete(&mut ui, &delete_args(false))
            .await
            .expect("cancelled");

        assert!(actor.calls.all().is_empty());
    }

    #[tokio::test]
    async fn delete_confirmed() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        let (mut ui, captured) = Ui::for_test("y\n");

        AppCommand::new(&config, &actor)
            .delete(&mut ui, &delete_args(false))
            .await
            .expect("delete");

        assert_eq!(actor.calls.all(), vec!["delete dora some-space-guid"]);
        assert!(after_banner(&captured.out()).ends_with(
            "Deleting app dora in org some-org / space some-space as steve...\nOK\n"
        ));
    }

    #[tokio::test]
    async fn force_delete_missing_app_is_benign() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        actor
            .delete
            .set(Err(ActionError::ApplicationNotFound { name: "dora".into() }), &[]);
        let (mut ui, captured) = Ui::for_test("");

        AppCommand::new(&config, &actor)
            .delete(&mut ui, &delete_args(true))
            .await
            .expect("benign");

        assert_eq!(captured.err(), "App dora does not exist\n");
        assert!(after_banner(&captured.out()).ends_with("OK\n"));
        assert!(!after_banner(&captured.out()).contains("Really delete"));
    }

    #[tokio::test]
    async fn start_stopped_app() {
        let config = targeted_config();
        let actor = FakeAppActor::with_app(ApplicationState::Stopped);
        let (mut ui, captured) = Ui::for_test("");

        AppCommand::new(&config, &actor).start(&mut ui, &name_args()).await.expect("start");

        assert_eq!(actor.calls.all(), vec!["get dora some-space-guid", "start app-guid"]);
        assert_eq!(
            after_banner(&captured.out()),
            "Starting app dora in org some-org / space some-space as steve...\nOK\n"
        );
    }

    #[tokio::test]
    async fn start_already_started_app() {
        let config = targeted_config();
        let actor = FakeAppActor::with_app(ApplicationState::Started);
        let (mut ui, captured) = Ui::for_test("");

        AppCommand::new(&config, &actor).start(&mut ui, &name_args()).await.expect("start");

        assert_eq!(actor.calls.count("start"), 0);
        assert_eq!(after_banner(&captured.out()), "App dora is already started\nOK\n");
    }

    #[tokio::test]
    async fn stop_already_stopped_app() {
        let config = targeted_config();
        let actor = FakeAppActor::with_app(ApplicationState::Stopped);
        let (mut ui, captured) = Ui::for_test("");

        AppCommand::new(&config, &actor).stop(&mut ui, &name_args()).await.expect("stop");

        assert_eq!(actor.calls.count("stop"), 0);
        assert_eq!(after_banner(&captured.out()), "App dora is already stopped\nOK\n");
    }

    #[tokio::test]
    async fn stop_error_has_no_ok() {
        let config = targeted_config();
        let actor = FakeAppActor::with_app(ApplicationState::Started);
        actor.stop.set(Err(ActionError::NoSpaceTargeted), &["stop-warning"]);
        let (mut ui, captured) = Ui::for_test("");

        assert!(AppCommand::new(&config, &actor).stop(&mut ui, &name_args()).await.is_err());
        assert!(!after_banner(&captured.out()).contains("OK"));
        assert_eq!(captured.err(), "stop-warning\n");
    }

    #[tokio::test]
    async fn restart_started_app_stops_then_starts() {
        let config = targeted_config();
        let actor = FakeAppActor::with_app(ApplicationState::Started);
        let (mut ui, captured) = Ui::for_test("");

        AppCommand::new(&config, &actor).restart(&mut ui, &name_args()).await.expect("restart");

        assert_eq!(
            actor.calls.all(),
            vec!["get dora some-space-guid", "stop app-guid", "start app-guid"]
        );
        assert_eq!(
            after_banner(&captured.out()),
            "Stopping app dora in org some-org / space some-space as steve...\nOK\n\
             Starting app dora in org some-org / space some-space as steve...\nOK\n"
        );
    }

    #[tokio::test]
    async fn restart_stopped_app_only_starts() {
        let config = targeted_config();
        let actor = FakeAppActor::with_app(ApplicationState::Stopped);
        let (mut ui, _) = Ui::for_test("");

        AppCommand::new(&config, &actor).restart(&mut ui, &name_args()).await.expect("restart");

        assert_eq!(actor.calls.all(), vec!["get dora some-space-guid", "start app-guid"]);
    }

    #[tokio::test]
    async fn restart_missing_app_fails() {
        let config = targeted_config();
        let actor = FakeAppActor::default();
        actor
            .app
            .set(Err(ActionError::ApplicationNotFound { name: "dora".into() }), &["w"]);
        let (mut ui, captured) = Ui::for_test("");

        let err = AppCommand::new(&config, &actor)
            .restart(&mut ui, &name_args())
            .await
            .expect_err("missing");

        assert!(matches!(err, CliError::Actor(ActionError::ApplicationNotFound { .. })));
        assert_eq!(captured.err(), "w\n");
    }
}
