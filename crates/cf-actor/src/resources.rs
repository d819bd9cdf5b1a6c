//! Cloud controller resources as the v3 API returns them.
//!
//! These are plain data carriers. Only the fields the commands display or the
//! actor needs for follow-up requests are decoded; everything else is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired state of an app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationState {
    /// Not running.
    #[default]
    Stopped,
    /// Running or requested to run.
    Started,
}

impl ApplicationState {
    /// Lowercase form used in command output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Started => "started",
        }
    }
}

/// How an app is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleType {
    /// Staged from source with buildpacks.
    #[default]
    Buildpack,
    /// Run from a docker image.
    Docker,
}

impl LifecycleType {
    /// Name used by the API and the `--app-type` flag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buildpack => "buildpack",
            Self::Docker => "docker",
        }
    }
}

/// Lifecycle-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleData {
    /// Requested buildpacks, in order.
    #[serde(default)]
    pub buildpacks: Vec<String>,
    /// Requested stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// App lifecycle block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Lifecycle type.
    #[serde(rename = "type")]
    pub kind: LifecycleType,
    /// Lifecycle settings.
    #[serde(default)]
    pub data: LifecycleData,
}

/// An application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// App guid.
    pub guid: String,
    /// App name.
    pub name: String,
    /// Desired state.
    #[serde(default)]
    pub state: ApplicationState,
    /// Lifecycle.
    #[serde(default)]
    pub lifecycle: Lifecycle,
    /// Owning space.
    #[serde(default)]
    pub relationships: ApplicationRelationships,
}

/// Relationships block of an app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRelationships {
    /// Owning space.
    #[serde(default)]
    pub space: Relationship,
}

impl Application {
    /// Whether the app is requested to run.
    pub fn started(&self) -> bool {
        self.state == ApplicationState::Started
    }
}

/// Process type of the main web process.
pub const PROCESS_TYPE_WEB: &str = "web";

/// A process belonging to an app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    /// Process guid.
    pub guid: String,
    /// Process type, e.g. `web` or `worker`.
    #[serde(rename = "type")]
    pub process_type: String,
    /// Desired instance count.
    #[serde(default)]
    pub instances: u32,
    /// Memory limit per instance.
    #[serde(default)]
    pub memory_in_mb: u64,
    /// Disk limit per instance.
    #[serde(default)]
    pub disk_in_mb: u64,
}

/// Lifecycle state of a single process instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceState {
    /// Up and serving.
    Running,
    /// Booting.
    Starting,
    /// Exited unexpectedly.
    Crashed,
    /// Stopped or unplaced.
    #[default]
    Down,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl InstanceState {
    /// Lowercase form used in command output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Starting => "starting",
            Self::Crashed => "crashed",
            Self::Down => "down",
            Self::Unknown => "unknown",
        }
    }
}

/// Resource usage of a process instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceUsage {
    /// CPU fraction, 0.0 to 1.0 per core.
    #[serde(default)]
    pub cpu: f64,
    /// Memory in bytes.
    #[serde(default)]
    pub mem: u64,
    /// Disk in bytes.
    #[serde(default)]
    pub disk: u64,
}

/// Runtime stats of one process instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessInstance {
    /// Instance index.
    pub index: u32,
    /// Current state.
    #[serde(default)]
    pub state: InstanceState,
    /// Seconds since the instance started.
    #[serde(default)]
    pub uptime: u64,
    /// Current usage.
    #[serde(default)]
    pub usage: InstanceUsage,
    /// Memory quota in bytes.
    #[serde(default)]
    pub mem_quota: u64,
    /// Disk quota in bytes.
    #[serde(default)]
    pub disk_quota: u64,
}

/// A process together with its instance stats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessSummary {
    /// The process.
    pub process: Process,
    /// Per-instance stats.
    pub instances: Vec<ProcessInstance>,
}

impl ProcessSummary {
    /// Number of instances currently running.
    pub fn running_instances(&self) -> usize {
        self.instances
            .iter()
            .filter(|instance| instance.state == InstanceState::Running)
            .count()
    }

    /// `running/desired`, e.g. `web:1/2` when prefixed with the type.
    pub fn instance_ratio(&self) -> String {
        format!("{}/{}", self.running_instances(), self.process.instances)
    }
}

/// A one-off task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task guid.
    pub guid: String,
    /// App-scoped sequence number shown to users.
    pub sequence_id: u64,
    /// Task name.
    #[serde(default)]
    pub name: String,
    /// Command line.
    #[serde(default)]
    pub command: String,
    /// `RUNNING`, `SUCCEEDED`, `FAILED`, `CANCELING`.
    #[serde(default)]
    pub state: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Options for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskRequest {
    /// Command line.
    pub command: String,
    /// Task name; the API picks one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Memory limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_in_mb: Option<u64>,
    /// Disk limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_in_mb: Option<u64>,
}

/// An uploaded package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package guid.
    pub guid: String,
    /// `bits` or `docker`.
    #[serde(rename = "type", default)]
    pub package_type: String,
    /// `AWAITING_UPLOAD`, `PROCESSING_UPLOAD`, `READY`, `FAILED`, ...
    #[serde(default)]
    pub state: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Docker image reference for a docker package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerImageCredentials {
    /// Image path.
    pub path: String,
    /// Registry user, if the registry is private.
    pub username: Option<String>,
    /// Registry password.
    pub password: Option<String>,
}

/// Buildpack that staged a droplet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropletBuildpack {
    /// Buildpack name.
    pub name: String,
    /// Output of the buildpack's detect step.
    #[serde(default)]
    pub detect_output: Option<String>,
}

/// A staged droplet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Droplet {
    /// Droplet guid.
    pub guid: String,
    /// `STAGED`, `FAILED`, `EXPIRED`, ...
    #[serde(default)]
    pub state: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Stack the droplet was built on.
    #[serde(default)]
    pub stack: Option<String>,
    /// Buildpacks that ran.
    #[serde(default)]
    pub buildpacks: Vec<DropletBuildpack>,
    /// Docker image for docker droplets.
    #[serde(default)]
    pub image: Option<String>,
}

/// A build, the staging record linking a package to a droplet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Build {
    /// Build guid.
    pub guid: String,
    /// `STAGING`, `STAGED`, `FAILED`.
    #[serde(default)]
    pub state: String,
    /// Failure reason.
    #[serde(default)]
    pub error: Option<String>,
    /// Resulting droplet once staged.
    #[serde(default)]
    pub droplet: Option<GuidRef>,
}

/// A bare `{ "guid": ... }` reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidRef {
    /// Referenced guid.
    pub guid: String,
}

/// An isolation segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationSegment {
    /// Segment guid.
    pub guid: String,
    /// Segment name.
    pub name: String,
}

/// An isolation segment and the orgs entitled to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsolationSegmentSummary {
    /// Segment name.
    pub name: String,
    /// Names of entitled orgs.
    pub entitled_orgs: Vec<String>,
}

/// An organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Org guid.
    pub guid: String,
    /// Org name.
    pub name: String,
}

/// A space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Space guid.
    pub guid: String,
    /// Space name.
    pub name: String,
    /// Owning org.
    #[serde(default)]
    pub relationships: SpaceRelationships,
}

/// Relationships block of a space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRelationships {
    /// Owning org.
    #[serde(default)]
    pub organization: Relationship,
}

/// A to-one relationship, `{ "data": { "guid": ... } }` or `{ "data": null }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Target, if set.
    #[serde(default)]
    pub data: Option<GuidRef>,
}

impl Relationship {
    /// Relationship pointing at `guid`.
    pub fn to(guid: impl Into<String>) -> Self {
        Self {
            data: Some(GuidRef { guid: guid.into() }),
        }
    }

    /// Relationship pointing nowhere, used to reset assignments.
    pub const fn none() -> Self {
        Self { data: None }
    }

    /// Target guid, if set.
    pub fn guid(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.guid.as_str())
    }
}

/// A domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain guid.
    pub guid: String,
    /// Domain name.
    pub name: String,
}

/// A route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route guid.
    pub guid: String,
    /// Host part.
    #[serde(default)]
    pub host: String,
    /// Path part.
    #[serde(default)]
    pub path: String,
    /// Full URL, e.g. `app.example.com/path`.
    #[serde(default)]
    pub url: String,
}

/// A service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Instance guid.
    pub guid: String,
    /// Instance name.
    pub name: String,
    /// `managed` or `user-provided`.
    #[serde(rename = "type", default)]
    pub instance_type: String,
}

impl ServiceInstance {
    /// Whether the instance is broker-managed and therefore shareable.
    pub fn is_managed(&self) -> bool {
        self.instance_type.is_empty() || self.instance_type == "managed"
    }
}

/// Everything `v3-app` shows about an app.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationSummary {
    /// The app.
    pub application: Application,
    /// Currently assigned droplet.
    pub current_droplet: Option<Droplet>,
    /// Processes in the order the API returned them.
    pub processes: Vec<ProcessSummary>,
    /// Mapped routes.
    pub routes: Vec<Route>,
}

impl ApplicationSummary {
    /// Processes with `web` first, the rest in API order.
    pub fn processes_web_first(&self) -> Vec<&ProcessSummary> {
        let mut processes: Vec<&ProcessSummary> = self.processes.iter().collect();
        processes.sort_by_key(|summary| summary.process.process_type != PROCESS_TYPE_WEB);
        processes
    }
}
