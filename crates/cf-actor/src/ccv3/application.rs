use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Client, Query};
use crate::error::CcError;
use crate::resources::{
    Application, Droplet, LifecycleType, Package, Process, ProcessInstance, Relationship, Route,
    Task, TaskRequest,
};
use crate::warnings::Warnings;

/// User-provided environment variables of an app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariables {
    /// Variables by name.
    #[serde(default)]
    pub var: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Resources<T> {
    #[serde(default = "Vec::new")]
    resources: Vec<T>,
}

/// Body of a scale request. Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScaleRequest {
    /// Desired instance count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    /// Memory per instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_in_mb: Option<u64>,
    /// Disk per instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_in_mb: Option<u64>,
}

fn lifecycle_body(app: &Application) -> serde_json::Value {
    match app.lifecycle.kind {
        LifecycleType::Docker => json!({"type": "docker", "data": {}}),
        LifecycleType::Buildpack => {
            let mut data = json!({"buildpacks": app.lifecycle.data.buildpacks});
            if let Some(stack) = &app.lifecycle.data.stack {
                data["stack"] = json!(stack);
            }
            json!({"type": "buildpack", "data": data})
        }
    }
}

impl Client {
    // ===================================================================
    // Apps
    // ===================================================================

    /// `GET /v3/apps`
    pub async fn get_applications(
        &self,
        query: &Query<'_>,
        warnings: &mut Warnings,
    ) -> Result<Vec<Application>, CcError> {
        self.list("/apps", query, warnings).await
    }

    /// `POST /v3/apps` in `space_guid`.
    pub async fn create_application(
        &self,
        app: &Application,
        space_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Application, CcError> {
        let body = json!({
            "name": app.name,
            "relationships": {"space": Relationship::to(space_guid)},
            "lifecycle": lifecycle_body(app),
        });
        self.post("/apps", &body, warnings).await
    }

    /// `PATCH /v3/apps/:guid`, updating the lifecycle.
    pub async fn update_application(
        &self,
        app: &Application,
        warnings: &mut Warnings,
    ) -> Result<Application, CcError> {
        let body = json!({"lifecycle": lifecycle_body(app)});
        self.patch(&format!("/apps/{}", app.guid), &body, warnings).await
    }

    /// `DELETE /v3/apps/:guid`
    pub async fn delete_application(&self, app_guid: &str, warnings: &mut Warnings) -> Result<(), CcError> {
        self.delete(&format!("/apps/{app_guid}"), warnings).await
    }

    /// `POST /v3/apps/:guid/actions/start`
    pub async fn start_application(&self, app_guid: &str, warnings: &mut Warnings) -> Result<(), CcError> {
        self.post_action(&format!("/apps/{app_guid}/actions/start"), warnings)
            .await
    }

    /// `POST /v3/apps/:guid/actions/stop`
    pub async fn stop_application(&self, app_guid: &str, warnings: &mut Warnings) -> Result<(), CcError> {
        self.post_action(&format!("/apps/{app_guid}/actions/stop"), warnings)
            .await
    }

    // ===================================================================
    // Processes
    // ===================================================================

    /// `GET /v3/apps/:guid/processes`
    pub async fn get_application_processes(
        &self,
        app_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<Process>, CcError> {
        self.list(&format!("/apps/{app_guid}/processes"), &[], warnings)
            .await
    }

    /// `GET /v3/processes/:guid/stats`
    pub async fn get_process_instances(
        &self,
        process_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<ProcessInstance>, CcError> {
        let stats: Resources<ProcessInstance> = self
            .get(&format!("/processes/{process_guid}/stats"), &[], warnings)
            .await?;
        Ok(stats.resources)
    }

    /// `POST /v3/apps/:guid/processes/:type/actions/scale`
    pub async fn scale_application_process(
        &self,
        app_guid: &str,
        process_type: &str,
        scale: &ScaleRequest,
        warnings: &mut Warnings,
    ) -> Result<Process, CcError> {
        self.post(
            &format!("/apps/{app_guid}/processes/{process_type}/actions/scale"),
            scale,
            warnings,
        )
        .await
    }

    /// `DELETE /v3/apps/:guid/processes/:type/instances/:index`
    pub async fn delete_application_process_instance(
        &self,
        app_guid: &str,
        process_type: &str,
        index: u32,
        warnings: &mut Warnings,
    ) -> Result<(), CcError> {
        self.delete(
            &format!("/apps/{app_guid}/processes/{process_type}/instances/{index}"),
            warnings,
        )
        .await
    }

    // ===================================================================
    // Droplets and packages of an app
    // ===================================================================

    /// `GET /v3/apps/:guid/droplets/current`
    pub async fn get_application_current_droplet(
        &self,
        app_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Droplet, CcError> {
        self.get(&format!("/apps/{app_guid}/droplets/current"), &[], warnings)
            .await
    }

    /// `PATCH /v3/apps/:guid/relationships/current_droplet`
    pub async fn set_application_droplet(
        &self,
        app_guid: &str,
        droplet_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Relationship, CcError> {
        self.patch(
            &format!("/apps/{app_guid}/relationships/current_droplet"),
            &Relationship::to(droplet_guid),
            warnings,
        )
        .await
    }

    /// `GET /v3/apps/:guid/droplets`
    pub async fn get_application_droplets(
        &self,
        app_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<Droplet>, CcError> {
        self.list(&format!("/apps/{app_guid}/droplets"), &[], warnings)
            .await
    }

    /// `GET /v3/apps/:guid/packages`
    pub async fn get_application_packages(
        &self,
        app_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<Package>, CcError> {
        self.list(&format!("/apps/{app_guid}/packages"), &[], warnings)
            .await
    }

    // ===================================================================
    // Tasks
    // ===================================================================

    /// `GET /v3/apps/:guid/tasks`
    pub async fn get_application_tasks(
        &self,
        app_guid: &str,
        query: &Query<'_>,
        warnings: &mut Warnings,
    ) -> Result<Vec<Task>, CcError> {
        self.list(&format!("/apps/{app_guid}/tasks"), query, warnings)
            .await
    }

    /// `POST /v3/apps/:guid/tasks`
    pub async fn create_application_task(
        &self,
        app_guid: &str,
        task: &TaskRequest,
        warnings: &mut Warnings,
    ) -> Result<Task, CcError> {
        self.post(&format!("/apps/{app_guid}/tasks"), task, warnings)
            .await
    }

    /// `POST /v3/tasks/:guid/actions/cancel`
    pub async fn cancel_task(&self, task_guid: &str, warnings: &mut Warnings) -> Result<Task, CcError> {
        self.post(
            &format!("/tasks/{task_guid}/actions/cancel"),
            &json!({}),
            warnings,
        )
        .await
    }

    // ===================================================================
    // Environment and routes
    // ===================================================================

    /// `GET /v3/apps/:guid/environment_variables`
    pub async fn get_application_environment_variables(
        &self,
        app_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<EnvironmentVariables, CcError> {
        self.get(&format!("/apps/{app_guid}/environment_variables"), &[], warnings)
            .await
    }

    /// `PATCH /v3/apps/:guid/environment_variables`. A `None` value unsets the variable.
    pub async fn update_application_environment_variables(
        &self,
        app_guid: &str,
        changes: &BTreeMap<String, Option<String>>,
        warnings: &mut Warnings,
    ) -> Result<EnvironmentVariables, CcError> {
        self.patch(
            &format!("/apps/{app_guid}/environment_variables"),
            &json!({"var": changes}),
            warnings,
        )
        .await
    }

    /// `GET /v3/apps/:guid/routes`
    pub async fn get_application_routes(
        &self,
        app_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<Route>, CcError> {
        self.list(&format!("/apps/{app_guid}/routes"), &[], warnings)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccv3::tests::client_for;
    use crate::resources::{Lifecycle, LifecycleData};
    use httpmock::Method::PATCH;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn create_docker_app_sends_empty_lifecycle_data() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v3/apps").json_body(serde_json::json!({
                "name": "dora",
                "relationships": {"space": {"data": {"guid": "space-guid"}}},
                "lifecycle": {"type": "docker", "data": {}}
            }));
            then.status(201)
                .json_body(serde_json::json!({"guid": "app-guid", "name": "dora", "state": "STOPPED"}));
        });

        let app = Application {
            name: "dora".into(),
            lifecycle: Lifecycle {
                kind: LifecycleType::Docker,
                data: LifecycleData::default(),
            },
            ..Default::default()
        };
        let mut warnings = Warnings::new();
        let created = client_for(&server)
            .create_application(&app, "space-guid", &mut warnings)
            .await
            .expect("create");

        mock.assert();
        assert_eq!(created.guid, "app-guid");
    }

    #[tokio::test]
    async fn process_stats_unwraps_resources() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v3/processes/p1/stats");
            then.status(200).json_body(serde_json::json!({
                "resources": [
                    {"index": 0, "state": "RUNNING", "uptime": 10, "usage": {"cpu": 0.5, "mem": 1024, "disk": 2048}, "mem_quota": 4096, "disk_quota": 8192},
                    {"index": 1, "state": "DOWN"}
                ]
            }));
        });

        let mut warnings = Warnings::new();
        let instances = client_for(&server)
            .get_process_instances("p1", &mut warnings)
            .await
            .expect("stats");

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].usage.mem, 1024);
    }

    #[tokio::test]
    async fn unset_env_sends_null() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/v3/apps/a1/environment_variables")
                .json_body(serde_json::json!({"var": {"GONE": null}}));
            then.status(200).json_body(serde_json::json!({"var": {}}));
        });

        let mut changes = BTreeMap::new();
        changes.insert("GONE".to_string(), None);
        let mut warnings = Warnings::new();
        client_for(&server)
            .update_application_environment_variables("a1", &changes, &mut warnings)
            .await
            .expect("patch");

        mock.assert();
    }

    #[tokio::test]
    async fn scale_omits_unset_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v3/apps/a1/processes/web/actions/scale")
                .json_body(serde_json::json!({"instances": 3}));
            then.status(202)
                .json_body(serde_json::json!({"guid": "p1", "type": "web", "instances": 3}));
        });

        let scale = ScaleRequest {
            instances: Some(3),
            ..Default::default()
        };
        let mut warnings = Warnings::new();
        let process = client_for(&server)
            .scale_application_process("a1", "web", &scale, &mut warnings)
            .await
            .expect("scale");

        mock.assert();
        assert_eq!(process.instances, 3);
    }
}
