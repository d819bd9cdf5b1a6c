//! `run-task`, `tasks` and `terminate-task`.

use std::future::Future;

use cf_actor::resources::{Application, Task, TaskRequest};
use cf_actor::{ActionOutcome, Actor};

use crate::cli::{AppNameArgs, RunTaskArgs, TerminateTaskArgs};
use crate::commands::{CloudControllerActor, Requires, flavor, preflight};
use crate::config::Config;
use crate::error::CliError;
use crate::output::user_friendly_date_or_blank;
use crate::ui::{DEFAULT_TABLE_PADDING, Ui};
use crate::version::MIN_VERSION_RUN_TASK;

/// Actor operations on tasks.
pub trait TaskActor: CloudControllerActor {
    /// Look up an app by name.
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send;

    /// Start a task.
    fn run_task(&self, app_guid: &str, task: &TaskRequest) -> impl Future<Output = ActionOutcome<Task>> + Send;

    /// Tasks of an app, newest first.
    fn get_application_tasks(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<Vec<Task>>> + Send;

    /// A task by its sequence id.
    fn get_task_by_sequence_id_and_application(
        &self,
        sequence_id: u64,
        app_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Task>> + Send;

    /// Cancel a task.
    fn terminate_task(&self, task_guid: &str) -> impl Future<Output = ActionOutcome<Task>> + Send;
}

impl TaskActor for Actor {
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::get_application_by_name_and_space(self, app_name, space_guid)
    }

    fn run_task(&self, app_guid: &str, task: &TaskRequest) -> impl Future<Output = ActionOutcome<Task>> + Send {
        Actor::run_task(self, app_guid, task)
    }

    fn get_application_tasks(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<Vec<Task>>> + Send {
        Actor::get_application_tasks(self, app_guid)
    }

    fn get_task_by_sequence_id_and_application(
        &self,
        sequence_id: u64,
        app_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Task>> + Send {
        Actor::get_task_by_sequence_id_and_application(self, sequence_id, app_guid)
    }

    fn terminate_task(&self, task_guid: &str) -> impl Future<Output = ActionOutcome<Task>> + Send {
        Actor::terminate_task(self, task_guid)
    }
}

/// Task command executor.
pub struct TaskCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: TaskActor> TaskCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    async fn application(&self, ui: &mut Ui, app_name: &str) -> Result<Application, CliError> {
        let (result, warnings) = self
            .actor
            .get_application_by_name_and_space(app_name, &self.config.targeted_space().guid)
            .await;
        ui.display_warnings(&warnings)?;
        Ok(result?)
    }

    /// `run-task`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails, the app does not exist, or
    /// the task is rejected.
    pub async fn run(&self, ui: &mut Ui, args: &RunTaskArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_RUN_TASK, Requires::Space)?;
        let app = self.application(ui, &args.app_name).await?;

        ui.display_text(&format!(
            "Creating task for app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;
        let request = TaskRequest {
            command: args.command.clone(),
            name: args.name.clone(),
            memory_in_mb: args.memory,
            disk_in_mb: args.disk,
        };
        let (result, warnings) = self.actor.run_task(&app.guid, &request).await;
        ui.display_warnings(&warnings)?;
        let task = result?;

        ui.display_ok()?;
        ui.display_newline()?;
        ui.display_text("Task has been submitted successfully for execution.")?;
        ui.display_table(
            "",
            &[
                vec!["task name:".to_string(), task.name],
                vec!["task id:".to_string(), task.sequence_id.to_string()],
            ],
            DEFAULT_TABLE_PADDING,
        )?;
        Ok(())
    }

    /// `tasks`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the app does not exist.
    pub async fn list(&self, ui: &mut Ui, args: &AppNameArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_RUN_TASK, Requires::Space)?;
        let app = self.application(ui, &args.app_name).await?;

        ui.display_text(&format!(
            "Getting tasks for app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;
        let (result, warnings) = self.actor.get_application_tasks(&app.guid).await;
        ui.display_warnings(&warnings)?;
        let tasks = result?;

        ui.display_ok()?;
        ui.display_newline()?;

        let mut table = vec![
            ["id", "name", "state", "start time", "command"]
                .map(String::from)
                .to_vec(),
        ];
        table.extend(tasks.into_iter().map(|task| {
            let command = if task.command.is_empty() {
                "[hidden]".to_string()
            } else {
                task.command
            };
            vec![
                task.sequence_id.to_string(),
                task.name,
                task.state,
                user_friendly_date_or_blank(task.created_at.as_ref()),
                command,
            ]
        }));
        ui.display_table("", &table, DEFAULT_TABLE_PADDING)?;
        Ok(())
    }

    /// `terminate-task`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails, the app or task does not
    /// exist, or the task cannot be cancelled.
    pub async fn terminate(&self, ui: &mut Ui, args: &TerminateTaskArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_RUN_TASK, Requires::Space)?;
        let app = self.application(ui, &args.app_name).await?;

        let (result, warnings) = self
            .actor
            .get_task_by_sequence_id_and_application(args.task_id, &app.guid)
            .await;
        ui.display_warnings(&warnings)?;
        let task = result?;

        ui.display_text(&format!(
            "Terminating task {} of app {} {}",
            args.task_id,
            args.app_name,
            flavor(self.config, &user)
        ))?;
        let (result, warnings) = self.actor.terminate_task(&task.guid).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{Calls, Canned};
    use crate::config::tests::targeted_config;
    use cf_actor::ActionError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTaskActor {
        calls: Calls,
        app: Canned<Application>,
        run: Canned<Task>,
        tasks: Canned<Vec<Task>>,
        task: Canned<Task>,
        terminate: Canned<Task>,
        last_request: Mutex<Option<TaskRequest>>,
    }

    impl FakeTaskActor {
        fn new() -> Self {
            let actor = Self::default();
            actor.app.set(
                Ok(Application {
                    guid: "app-guid".into(),
                    name: "dora".into(),
                    ..Default::default()
                }),
                &["get-application-warning"],
            );
            actor
        }
    }

    impl CloudControllerActor for FakeTaskActor {
        fn cloud_controller_api_version(&self) -> &str {
            "3.0.0"
        }
    }

    impl TaskActor for FakeTaskActor {
        async fn get_application_by_name_and_space(&self, app_name: &str, space_guid: &str) -> ActionOutcome<Application> {
            self.calls.record(format!("get-app {app_name} {space_guid}"));
            self.app.take()
        }

        async fn run_task(&self, app_guid: &str, task: &TaskRequest) -> ActionOutcome<Task> {
            self.calls.record(format!("run {app_guid}"));
            *self.last_request.lock().expect("lock") = Some(task.clone());
            self.run.take()
        }

        async fn get_application_tasks(&self, app_guid: &str) -> ActionOutcome<Vec<Task>> {
            self.calls.record(format!("tasks {app_guid}"));
            self.tasks.take()
        }

        async fn get_task_by_sequence_id_and_application(&self, sequence_id: u64, app_guid: &str) -> ActionOutcome<Task> {
            self.calls.record(format!("task {sequence_id} {app_guid}"));
            self.task.take()
        }

        async fn terminate_task(&self, task_guid: &str) -> ActionOutcome<Task> {
            self.calls.record(format!("terminate {task_guid}"));
            self.terminate.take()
        }
    }

    #[tokio::test]
    async fn run_task_prints_name_and_id() {
        let config = targeted_config();
        let actor = FakeTaskActor::new();
        actor.run.set(
            Ok(Task {
                name: "31337ddd".into(),
                sequence_id: 3,
                ..Default::default()
            }),
            &["run-task-warning"],
        );
        let (mut ui, captured) = Ui::for_test("");
        let args = RunTaskArgs {
            app_name: "dora".into(),
            command: "some command".into(),
            name: None,
            memory: Some(256),
            disk: None,
        };

        TaskCommand::new(&config, &actor).run(&mut ui, &args).await.expect("run");

        assert_eq!(actor.calls.all(), vec!["get-app dora some-space-guid", "run app-guid"]);
        let request = actor.last_request.lock().expect("lock").clone().expect("request");
        assert_eq!(request.command, "some command");
        assert_eq!(request.memory_in_mb, Some(256));
        assert_eq!(
            captured.out(),
            "Creating task for app dora in org some-org / space some-space as steve...\n\
             OK\n\n\
             Task has been submitted successfully for execution.\n\
             task name:   31337ddd\n\
             task id:     3\n"
        );
        assert_eq!(captured.err(), "get-application-warning\nrun-task-warning\n");
    }

    #[tokio::test]
    async fn run_task_on_missing_app_creates_nothing() {
        let config = targeted_config();
        let actor = FakeTaskActor::default();
        actor
            .app
            .set(Err(ActionError::ApplicationNotFound { name: "dora".into() }), &[]);
        let (mut ui, captured) = Ui::for_test("");
        let args = RunTaskArgs {
            app_name: "dora".into(),
            command: "echo".into(),
            name: None,
            memory: None,
            disk: None,
        };

        let err = TaskCommand::new(&config, &actor)
            .run(&mut ui, &args)
            .await
            .expect_err("missing");

        assert_eq!(err.to_string(), "App dora not found");
        assert_eq!(actor.calls.count("run"), 0);
        assert_eq!(captured.out(), "");
    }

    #[tokio::test]
    async fn tasks_table_hides_empty_commands() {
        let config = targeted_config();
        let actor = FakeTaskActor::new();
        actor.tasks.set(
            Ok(vec![
                Task {
                    sequence_id: 2,
                    name: "migrate".into(),
                    state: "RUNNING".into(),
                    command: "rake db:migrate".into(),
                    ..Default::default()
                },
                Task {
                    sequence_id: 1,
                    name: "secret".into(),
                    state: "SUCCEEDED".into(),
                    ..Default::default()
                },
            ]),
            &[],
        );
        let (mut ui, captured) = Ui::for_test("");
        let args = AppNameArgs { app_name: "dora".into() };

        TaskCommand::new(&config, &actor).list(&mut ui, &args).await.expect("tasks");

        let out = captured.out();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Getting tasks for app dora in org some-org / space some-space as steve...");
        assert_eq!(lines[1], "OK");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "id   name      state       start time   command");
        assert_eq!(lines[4], "2    migrate   RUNNING                  rake db:migrate");
        assert_eq!(lines[5], "1    secret    SUCCEEDED                [hidden]");
    }

    #[tokio::test]
    async fn terminate_looks_up_task_by_sequence_id() {
        let config = targeted_config();
        let actor = FakeTaskActor::new();
        actor
            .task
            .set(Ok(Task { guid: "task-guid".into(), sequence_id: 3, ..Default::default() }), &[]);
        let (mut ui, captured) = Ui::for_test("");
        let args = TerminateTaskArgs { app_name: "dora".into(), task_id: 3 };

        TaskCommand::new(&config, &actor).terminate(&mut ui, &args).await.expect("terminate");

        assert_eq!(
            actor.calls.all(),
            vec!["get-app dora some-space-guid", "task 3 app-guid", "terminate task-guid"]
        );
        assert_eq!(
            captured.out(),
            "Terminating task 3 of app dora in org some-org / space some-space as steve...\nOK\n"
        );
    }

    #[tokio::test]
    async fn terminate_unknown_task_fails() {
        let config = targeted_config();
        let actor = FakeTaskActor::new();
        actor.task.set(Err(ActionError::TaskNotFound { sequence_id: 9 }), &[]);
        let (mut ui, _) = Ui::for_test("");
        let args = TerminateTaskArgs { app_name: "dora".into(), task_id: 9 };

        let err = TaskCommand::new(&config, &actor)
            .terminate(&mut ui, &args)
            .await
            .expect_err("missing task");

        assert_eq!(err.to_string(), "Task sequence ID 9 not found.");
        assert_eq!(actor.calls.count("terminate"), 0);
    }
}
