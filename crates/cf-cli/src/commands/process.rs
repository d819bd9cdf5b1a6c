//! `v3-scale` and `v3-restart-app-instance`.

use std::future::Future;

use tokio::sync::mpsc::{self, UnboundedSender};

use cf_actor::ccv3::ScaleRequest;
use cf_actor::resources::{Application, ApplicationSummary, Process};
use cf_actor::{ActionError, ActionOutcome, Actor, Warnings};

use crate::cli::{RestartInstanceArgs, ScaleArgs};
use crate::commands::{CloudControllerActor, Requires, flavor, relay_warnings, v3_preflight};
use crate::config::{Config, User};
use crate::error::CliError;
use crate::output::display_app_processes;
use crate::ui::Ui;

/// Actor operations on processes.
pub trait ProcessActor: CloudControllerActor {
    /// Look up an app by name.
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send;

    /// An app with its processes and their instance stats.
    fn get_application_summary_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<ApplicationSummary>> + Send;

    /// Scale one process.
    fn scale_process_by_application(
        &self,
        app_guid: &str,
        process_type: &str,
        scale: ScaleRequest,
    ) -> impl Future<Output = ActionOutcome<Process>> + Send;

    /// Stop one instance so the platform replaces it.
    fn delete_instance_by_application_name_space_process_type_and_index(
        &self,
        app_name: &str,
        space_guid: &str,
        process_type: &str,
        index: u32,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Request the app to run.
    fn start_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Request the app to stop.
    fn stop_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Wait for the app's processes to run, sending warnings as they arrive.
    fn poll_start(
        &self,
        app: &Application,
        warnings_tx: UnboundedSender<Warnings>,
    ) -> impl Future<Output = Result<(), ActionError>> + Send;
}

impl ProcessActor for Actor {
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::get_application_by_name_and_space(self, app_name, space_guid)
    }

    fn get_application_summary_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<ApplicationSummary>> + Send {
        Actor::get_application_summary_by_name_and_space(self, app_name, space_guid)
    }

    fn scale_process_by_application(
        &self,
        app_guid: &str,
        process_type: &str,
        scale: ScaleRequest,
    ) -> impl Future<Output = ActionOutcome<Process>> + Send {
        Actor::scale_process_by_application(self, app_guid, process_type, scale)
    }

    fn delete_instance_by_application_name_space_process_type_and_index(
        &self,
        app_name: &str,
        space_guid: &str,
        process_type: &str,
        index: u32,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::delete_instance_by_application_name_space_process_type_and_index(
            self,
            app_name,
            space_guid,
            process_type,
            index,
        )
    }

    fn start_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::start_application(self, app_guid)
    }

    fn stop_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::stop_application(self, app_guid)
    }

    fn poll_start(
        &self,
        app: &Application,
        warnings_tx: UnboundedSender<Warnings>,
    ) -> impl Future<Output = Result<(), ActionError>> + Send {
        Actor::poll_start(self, app, warnings_tx)
    }
}

/// Process command executor.
pub struct ProcessCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: ProcessActor> ProcessCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    fn space_guid(&self) -> &str {
        &self.config.targeted_space().guid
    }

    /// `v3-scale`.
    ///
    /// Without flags this only shows the current scale. Changing memory or
    /// disk restarts the app, so it asks first unless forced, then waits for
    /// the app to come back.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails, scaling fails, or the app
    /// does not start again.
    pub async fn scale(&self, ui: &mut Ui, args: &ScaleArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;

        let (result, warnings) = self
            .actor
            .get_application_by_name_and_space(&args.app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        let app = result?;

        if !args.has_changes() {
            return self.show_current_scale(ui, &args.app_name, &user).await;
        }

        ui.display_text(&format!("Scaling app {} {}", args.app_name, flavor(self.config, &user)))?;

        let restart = args.memory_limit.is_some() || args.disk_limit.is_some();
        if restart && !args.force {
            let prompt = format!(
                "This will cause the app to restart. Are you sure you want to scale {}?",
                args.app_name
            );
            if !ui.display_bool_prompt(false, &prompt)? {
                ui.display_text("Scaling cancelled")?;
                return Ok(());
            }
        }

        let scale = ScaleRequest {
            instances: args.instances,
            memory_in_mb: args.memory_limit,
            disk_in_mb: args.disk_limit,
        };
        let (result, warnings) = self
            .actor
            .scale_process_by_application(&app.guid, &args.process, scale)
            .await;
        ui.display_warnings(&warnings)?;
        result?;

        if restart {
            self.restart_and_wait(ui, &app, &user).await?;
        }
        self.show_current_scale(ui, &args.app_name, &user).await
    }

    async fn restart_and_wait(&self, ui: &mut Ui, app: &Application, user: &User) -> Result<(), CliError> {
        ui.display_text(&format!("Stopping app {} {}", app.name, flavor(self.config, user)))?;
        let (result, warnings) = self.actor.stop_application(&app.guid).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;

        ui.display_text(&format!("Starting app {} {}", app.name, flavor(self.config, user)))?;
        let (result, warnings) = self.actor.start_application(&app.guid).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;

        ui.display_text("Waiting for app to start...")?;
        let (tx, rx) = mpsc::unbounded_channel();
        relay_warnings(ui, rx, self.actor.poll_start(app, tx)).await
    }

    async fn show_current_scale(&self, ui: &mut Ui, app_name: &str, user: &User) -> Result<(), CliError> {
        ui.display_text(&format!(
            "Showing current scale of app {} {}",
            app_name,
            flavor(self.config, user)
        ))?;

        let (result, warnings) = self
            .actor
            .get_application_summary_by_name_and_space(app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        display_app_processes(ui, &result?)?;
        Ok(())
    }

    /// `v3-restart-app-instance`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the instance does not exist.
    pub async fn restart_instance(&self, ui: &mut Ui, args: &RestartInstanceArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Restarting instance {} of process {} of app {} {}",
            args.index,
            args.process,
            args.app_name,
            flavor(self.config, &user)
        ))?;

        let (result, warnings) = self
            .actor
            .delete_instance_by_application_name_space_process_type_and_index(
                &args.app_name,
                self.space_guid(),
                &args.process,
                args.index,
            )
            .await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{Calls, Canned, after_banner};
    use crate::config::tests::targeted_config;
    use cf_actor::resources::ProcessSummary;

    #[derive(Default)]
    struct FakeProcessActor {
        calls: Calls,
        app: Canned<Application>,
        summary: Canned<ApplicationSummary>,
        scale: Canned<Process>,
        delete_instance: Canned<()>,
        start: Canned<()>,
        stop: Canned<()>,
        poll: Canned<()>,
    }

    fn process(process_type: &str, instances: u32, memory_in_mb: u64) -> ProcessSummary {
        ProcessSummary {
            process: Process {
                process_type: process_type.into(),
                instances,
                memory_in_mb,
                ..Default::default()
            },
            instances: Vec::new(),
        }
    }

    impl FakeProcessActor {
        fn new() -> Self {
            let actor = Self::default();
            actor.app.set(
                Ok(Application {
                    guid: "app-guid".into(),
                    name: "dora".into(),
                    ..Default::default()
                }),
                &["app-warning"],
            );
            actor.summary.set(
                Ok(ApplicationSummary {
                    application: Application {
                        guid: "app-guid".into(),
                        name: "dora".into(),
                        ..Default::default()
                    },
                    processes: vec![process("worker", 1, 64), process("web", 2, 256)],
                    ..Default::default()
                }),
                &["summary-warning"],
            );
            actor
        }
    }

    impl CloudControllerActor for FakeProcessActor {
        fn cloud_controller_api_version(&self) -> &str {
            "3.30.0"
        }
    }

    impl ProcessActor for FakeProcessActor {
        async fn get_application_by_name_and_space(&self, app_name: &str, _space_guid: &str) -> ActionOutcome<Application> {
            self.calls.record(format!("get {app_name}"));
            self.app.take()
        }

        async fn get_application_summary_by_name_and_space(
            &self,
            app_name: &str,
            _space_guid: &str,
        ) -> ActionOutcome<ApplicationSummary> {
            self.calls.record(format!("summary {app_name}"));
            self.summary.take()
        }

        async fn scale_process_by_application(
            &self,
            app_guid: &str,
            process_type: &str,
            scale: ScaleRequest,
        ) -> ActionOutcome<Process> {
            self.calls.record(format!(
                "scale {app_guid} {process_type} {:?} {:?} {:?}",
                scale.instances, scale.memory_in_mb, scale.disk_in_mb
            ));
            self.scale.take()
        }

        async fn delete_instance_by_application_name_space_process_type_and_index(
            &self,
            app_name: &str,
            space_guid: &str,
            process_type: &str,
            index: u32,
        ) -> ActionOutcome<()> {
            self.calls
                .record(format!("delete-instance {app_name} {space_guid} {process_type} {index}"));
            self.delete_instance.take()
        }

        async fn start_application(&self, app_guid: &str) -> ActionOutcome<()> {
            self.calls.record(format!("start {app_guid}"));
            self.start.take()
        }

        async fn stop_application(&self, app_guid: &str) -> ActionOutcome<()> {
            self.calls.record(format!("stop {app_guid}"));
            self.stop.take()
        }

        async fn poll_start(&self, app: &Application, warnings_tx: UnboundedSender<Warnings>) -> Result<(), ActionError> {
            self.calls.record(format!("poll {}", app.guid));
            let (result, warnings) = self.poll.take();
            let _ = warnings_tx.send(warnings);
            result
        }
    }

    fn scale_args() -> ScaleArgs {
        ScaleArgs {
            app_name: "dora".into(),
            process: "web".into(),
            instances: None,
            memory_limit: None,
            disk_limit: None,
            force: false,
        }
    }

    #[tokio::test]
    async fn scale_without_flags_shows_every_process_web_first() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        let (mut ui, captured) = Ui::for_test("");

        ProcessCommand::new(&config, &actor)
            .scale(&mut ui, &scale_args())
            .await
            .expect("show");

        assert_eq!(actor.calls.all(), vec!["get dora", "summary dora"]);
        assert_eq!(
            after_banner(&captured.out()),
            "Showing current scale of app dora in org some-org / space some-space as steve...\n\n\
             type:         web\n\
             instances:    0/2\n\
             memory usage: 256M\n\
             There are no running instances of this process.\n\n\
             type:         worker\n\
             instances:    0/1\n\
             memory usage: 64M\n\
             There are no running instances of this process.\n"
        );
        assert_eq!(captured.err(), "app-warning\nsummary-warning\n");
    }

    #[tokio::test]
    async fn scaling_another_process_still_shows_the_whole_app() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        let (mut ui, captured) = Ui::for_test("");
        let args = ScaleArgs {
            process: "some-process-type".into(),
            instances: Some(2),
            ..scale_args()
        };

        ProcessCommand::new(&config, &actor).scale(&mut ui, &args).await.expect("scale");

        assert_eq!(
            actor.calls.all(),
            vec!["get dora", "scale app-guid some-process-type Some(2) None None", "summary dora"]
        );
        let out = after_banner(&captured.out());
        assert!(out.contains("type:         web\n"));
        assert!(out.contains("type:         worker\n"));
    }

    #[tokio::test]
    async fn scale_instances_does_not_restart() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        let (mut ui, captured) = Ui::for_test("");
        let args = ScaleArgs { instances: Some(3), ..scale_args() };

        ProcessCommand::new(&config, &actor).scale(&mut ui, &args).await.expect("scale");

        assert_eq!(
            actor.calls.all(),
            vec!["get dora", "scale app-guid web Some(3) None None", "summary dora"]
        );
        assert!(after_banner(&captured.out()).starts_with("Scaling app dora in org some-org / space some-space as steve...\n"));
        assert!(!after_banner(&captured.out()).contains("[yN]"));
    }

    #[tokio::test]
    async fn scale_memory_declined_does_not_scale() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        let (mut ui, captured) = Ui::for_test("no\n");
        let args = ScaleArgs { memory_limit: Some(512), ..scale_args() };

        ProcessCommand::new(&config, &actor).scale(&mut ui, &args).await.expect("cancelled");

        assert_eq!(actor.calls.count("scale"), 0);
        assert!(after_banner(&captured.out()).ends_with(
            "This will cause the app to restart. Are you sure you want to scale dora? [yN]: Scaling cancelled\n"
        ));
    }

    #[tokio::test]
    async fn forced_memory_scale_restarts_and_waits() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        actor.poll.set(Ok(()), &["poll-warning"]);
        let (mut ui, captured) = Ui::for_test("");
        let args = ScaleArgs {
            memory_limit: Some(512),
            disk_limit: Some(1024),
            force: true,
            ..scale_args()
        };

        ProcessCommand::new(&config, &actor).scale(&mut ui, &args).await.expect("scale");

        assert_eq!(
            actor.calls.all(),
            vec![
                "get dora",
                "scale app-guid web None Some(512) Some(1024)",
                "stop app-guid",
                "start app-guid",
                "poll app-guid",
                "summary dora",
            ]
        );
        let out = after_banner(&captured.out());
        let stopping = out.find("Stopping app dora").expect("stopping");
        let starting = out.find("Starting app dora").expect("starting");
        let waiting = out.find("Waiting for app to start...").expect("waiting");
        let showing = out.find("Showing current scale").expect("showing");
        assert!(stopping < starting && starting < waiting && waiting < showing);
        assert_eq!(captured.err(), "app-warning\npoll-warning\nsummary-warning\n");
    }

    #[tokio::test]
    async fn scale_startup_timeout_is_an_error() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        actor.poll.set(Err(ActionError::StartupTimeout { name: "dora".into() }), &[]);
        let (mut ui, _) = Ui::for_test("");
        let args = ScaleArgs { memory_limit: Some(512), force: true, ..scale_args() };

        let err = ProcessCommand::new(&config, &actor)
            .scale(&mut ui, &args)
            .await
            .expect_err("timeout");

        assert!(err.message("cf3").starts_with("Start app timeout"));
        assert_eq!(actor.calls.count("summary"), 0);
    }

    #[tokio::test]
    async fn scale_unknown_process_fails() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        let (mut ui, _) = Ui::for_test("");
        let args = ScaleArgs { process: "console".into(), ..scale_args() };

        let err = ProcessCommand::new(&config, &actor)
            .scale(&mut ui, &args)
            .await
            .expect_err("missing");

        assert_eq!(err.to_string(), "Process console not found");
    }

    #[tokio::test]
    async fn restart_instance() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        actor.delete_instance.set(Ok(()), &["w"]);
        let (mut ui, captured) = Ui::for_test("");
        let args = RestartInstanceArgs {
            app_name: "dora".into(),
            index: 1,
            process: "worker".into(),
        };

        ProcessCommand::new(&config, &actor)
            .restart_instance(&mut ui, &args)
            .await
            .expect("restart");

        assert_eq!(actor.calls.all(), vec!["delete-instance dora some-space-guid worker 1"]);
        assert_eq!(
            after_banner(&captured.out()),
            "Restarting instance 1 of process worker of app dora in org some-org / space some-space as steve...\nOK\n"
        );
    }

    #[tokio::test]
    async fn restart_missing_instance_has_no_ok() {
        let config = targeted_config();
        let actor = FakeProcessActor::new();
        actor.delete_instance.set(
            Err(ActionError::ProcessInstanceNotFound { process_type: "web".into(), index: 9 }),
            &[],
        );
        let (mut ui, captured) = Ui::for_test("");
        let args = RestartInstanceArgs {
            app_name: "dora".into(),
            index: 9,
            process: "web".into(),
        };

        let err = ProcessCommand::new(&config, &actor)
            .restart_instance(&mut ui, &args)
            .await
            .expect_err("missing");

        assert_eq!(err.to_string(), "Instance 9 of process web not found");
        assert!(!after_banner(&captured.out()).contains("OK"));
    }
}
