use super::Actor;
use crate::ActionOutcome;
use crate::error::ActionError;
use crate::resources::{Task, TaskRequest};
use crate::warnings::Warnings;

impl Actor {
    /// Start a one-off task on an app.
    pub async fn run_task(&self, app_guid: &str, task: &TaskRequest) -> ActionOutcome<Task> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .create_application_task(app_guid, task, &mut warnings)
            .await
            .map_err(ActionError::from);
        (result, warnings)
    }

    /// Tasks of an app, newest first.
    pub async fn get_application_tasks(&self, app_guid: &str) -> ActionOutcome<Vec<Task>> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .get_application_tasks(app_guid, &[("order_by", "-created_at".to_string())], &mut warnings)
            .await
            .map_err(ActionError::from);
        (result, warnings)
    }

    /// Find a task by its app-scoped sequence id.
    pub async fn get_task_by_sequence_id_and_application(&self, sequence_id: u64, app_guid: &str) -> ActionOutcome<Task> {
        let mut warnings = Warnings::new();
        let result = async {
            let tasks = self
                .cc
                .get_application_tasks(app_guid, &[("sequence_ids", sequence_id.to_string())], &mut warnings)
                .await?;
            tasks
                .into_iter()
                .find(|task| task.sequence_id == sequence_id)
                .ok_or(ActionError::TaskNotFound { sequence_id })
        }
        .await;
        (result, warnings)
    }

    /// Cancel a running task.
    pub async fn terminate_task(&self, task_guid: &str) -> ActionOutcome<Task> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .cancel_task(task_guid, &mut warnings)
            .await
            .map_err(ActionError::from);
        (result, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::tests::actor_for;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn task_lookup_by_sequence_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v3/apps/a1/tasks")
                .query_param("sequence_ids", "3");
            then.status(200).json_body(serde_json::json!({
                "pagination": {"next": null},
                "resources": [{"guid": "t3", "sequence_id": 3, "name": "migrate", "state": "RUNNING"}]
            }));
        });

        let (result, _) = actor_for(&server)
            .get_task_by_sequence_id_and_application(3, "a1")
            .await;

        mock.assert();
        assert_eq!(result.expect("task").guid, "t3");
    }

    #[tokio::test]
    async fn missing_sequence_id_is_task_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v3/apps/a1/tasks");
            then.status(200)
                .json_body(serde_json::json!({"pagination": {"next": null}, "resources": []}));
        });

        let (result, _) = actor_for(&server)
            .get_task_by_sequence_id_and_application(9, "a1")
            .await;
        assert!(matches!(result, Err(ActionError::TaskNotFound { sequence_id: 9 })));
    }

    #[tokio::test]
    async fn run_task_posts_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v3/apps/a1/tasks")
                .json_body(serde_json::json!({"command": "rake db:migrate", "name": "migrate"}));
            then.status(202).json_body(serde_json::json!({
                "guid": "t1", "sequence_id": 1, "name": "migrate", "command": "rake db:migrate", "state": "RUNNING"
            }));
        });

        let request = TaskRequest {
            command: "rake db:migrate".into(),
            name: Some("migrate".into()),
            ..Default::default()
        };
        let (result, _) = actor_for(&server).run_task("a1", &request).await;

        mock.assert();
        assert_eq!(result.expect("task").sequence_id, 1);
    }
}
