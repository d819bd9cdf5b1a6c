//! Command-line argument parsing with clap.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

use cf_actor::resources::LifecycleType;

/// Cloud Foundry v3 command line client.
#[derive(Parser, Debug, Clone)]
#[command(name = "cf3")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List all apps in the target space.
    #[command(name = "v3-apps")]
    V3Apps,

    /// Display health and status for an app.
    #[command(name = "v3-app")]
    V3App(AppShowArgs),

    /// Create a V3 app.
    #[command(name = "v3-create-app")]
    V3CreateApp(CreateAppArgs),

    /// Delete a V3 app.
    #[command(name = "v3-delete")]
    V3Delete(DeleteAppArgs),

    /// Start an app.
    #[command(name = "v3-start")]
    V3Start(AppNameArgs),

    /// Stop an app.
    #[command(name = "v3-stop")]
    V3Stop(AppNameArgs),

    /// Stop all instances of the app, then start them again.
    #[command(name = "v3-restart")]
    V3Restart(AppNameArgs),

    /// Terminate, then instantiate an app instance.
    #[command(name = "v3-restart-app-instance")]
    V3RestartAppInstance(RestartInstanceArgs),

    /// Change or view the instance count, disk space limit, and memory limit for an app.
    #[command(name = "v3-scale")]
    V3Scale(ScaleArgs),

    /// Create a new droplet for an app.
    #[command(name = "v3-stage")]
    V3Stage(StageArgs),

    /// Set the droplet used to run an app.
    #[command(name = "v3-set-droplet")]
    V3SetDroplet(SetDropletArgs),

    /// List droplets of an app.
    #[command(name = "v3-droplets")]
    V3Droplets(AppNameArgs),

    /// List packages of an app.
    #[command(name = "v3-packages")]
    V3Packages(AppNameArgs),

    /// Upload a V3 package.
    #[command(name = "v3-create-package")]
    V3CreatePackage(CreatePackageArgs),

    /// Set an env variable for an app.
    #[command(name = "v3-set-env")]
    V3SetEnv(SetEnvArgs),

    /// Remove an env variable from an app.
    #[command(name = "v3-unset-env")]
    V3UnsetEnv(UnsetEnvArgs),

    /// Push a new app or sync changes to an existing app.
    #[command(name = "v3-push")]
    V3Push(PushArgs),

    /// Run a one-off task on an app.
    #[command(name = "run-task", visible_alias = "rt")]
    RunTask(RunTaskArgs),

    /// List tasks of an app.
    Tasks(AppNameArgs),

    /// Terminate a running task of an app.
    #[command(name = "terminate-task")]
    TerminateTask(TerminateTaskArgs),

    /// List all isolation segments.
    #[command(name = "isolation-segments")]
    IsolationSegments,

    /// Create an isolation segment.
    #[command(name = "create-isolation-segment")]
    CreateIsolationSegment(SegmentNameArgs),

    /// Delete an isolation segment.
    #[command(name = "delete-isolation-segment")]
    DeleteIsolationSegment(DeleteSegmentArgs),

    /// Entitle an organization to an isolation segment.
    #[command(name = "enable-org-isolation")]
    EnableOrgIsolation(OrgSegmentArgs),

    /// Revoke an organization's entitlement to an isolation segment.
    #[command(name = "disable-org-isolation")]
    DisableOrgIsolation(OrgSegmentArgs),

    /// Set the default isolation segment used for apps in spaces in an org.
    #[command(name = "set-org-default-isolation-segment")]
    SetOrgDefaultIsolationSegment(OrgSegmentArgs),

    /// Reset the default isolation segment used for apps in spaces of an org.
    #[command(name = "reset-org-default-isolation-segment")]
    ResetOrgDefaultIsolationSegment(OrgNameArgs),

    /// Assign the isolation segment for a space.
    #[command(name = "set-space-isolation-segment")]
    SetSpaceIsolationSegment(SpaceSegmentArgs),

    /// Reset the space's isolation segment to the org default.
    #[command(name = "reset-space-isolation-segment")]
    ResetSpaceIsolationSegment(SpaceNameArgs),

    /// Share a service instance with another space.
    #[command(name = "share-service")]
    ShareService(ShareServiceArgs),

    /// Unshare a shared service instance from a space.
    #[command(name = "unshare-service")]
    UnshareService(UnshareServiceArgs),

    /// Create policy to allow direct network traffic from one app to another.
    #[command(name = "add-network-policy")]
    AddNetworkPolicy(AddNetworkPolicyArgs),

    /// Remove network traffic policy of an app.
    #[command(name = "remove-network-policy")]
    RemoveNetworkPolicy(RemoveNetworkPolicyArgs),

    /// List direct network traffic policies.
    #[command(name = "network-policies")]
    NetworkPolicies(NetworkPoliciesArgs),
}

/// A single app name.
#[derive(Parser, Debug, Clone)]
pub struct AppNameArgs {
    /// Name of the app.
    pub app_name: String,
}

/// Arguments for `v3-app`.
#[derive(Parser, Debug, Clone)]
pub struct AppShowArgs {
    /// Name of the app.
    pub app_name: String,

    /// Retrieve and display the given app's guid. All other health and status output for the app is suppressed.
    #[arg(long)]
    pub guid: bool,
}

/// App lifecycle accepted by `--app-type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AppType {
    /// Staged from source with buildpacks.
    #[default]
    Buildpack,
    /// Run from a docker image.
    Docker,
}

impl From<AppType> for LifecycleType {
    fn from(app_type: AppType) -> Self {
        match app_type {
            AppType::Buildpack => Self::Buildpack,
            AppType::Docker => Self::Docker,
        }
    }
}

/// Arguments for `v3-create-app`.
#[derive(Parser, Debug, Clone)]
pub struct CreateAppArgs {
    /// Name of the app.
    pub app_name: String,

    /// App lifecycle type to stage and run the app.
    #[arg(long, value_enum, default_value_t = AppType::Buildpack)]
    pub app_type: AppType,
}

/// Arguments for `v3-delete`.
#[derive(Parser, Debug, Clone)]
pub struct DeleteAppArgs {
    /// Name of the app.
    pub app_name: String,

    /// Force deletion without confirmation.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for `v3-restart-app-instance`.
#[derive(Parser, Debug, Clone)]
pub struct RestartInstanceArgs {
    /// Name of the app.
    pub app_name: String,

    /// Index of the instance to restart.
    pub index: u32,

    /// Process to restart.
    #[arg(long, default_value = "web")]
    pub process: String,
}

/// Arguments for `v3-scale`.
#[derive(Parser, Debug, Clone)]
pub struct ScaleArgs {
    /// Name of the app.
    pub app_name: String,

    /// App process to scale.
    #[arg(long, default_value = "web")]
    pub process: String,

    /// Number of instances.
    #[arg(short, long)]
    pub instances: Option<u32>,

    /// Memory limit (e.g. 256M, 1024M, 1G).
    #[arg(short = 'm', long = "memory", value_parser = parse_megabytes)]
    pub memory_limit: Option<u64>,

    /// Disk limit (e.g. 256M, 1024M, 1G).
    #[arg(short = 'k', long = "disk", value_parser = parse_megabytes)]
    pub disk_limit: Option<u64>,

    /// Force restart of app without prompt.
    #[arg(short, long)]
    pub force: bool,
}

impl ScaleArgs {
    /// Whether any scaling flag was given.
    pub const fn has_changes(&self) -> bool {
        self.instances.is_some() || self.memory_limit.is_some() || self.disk_limit.is_some()
    }
}

/// Arguments for `v3-stage`.
#[derive(Parser, Debug, Clone)]
pub struct StageArgs {
    /// Name of the app.
    pub app_name: String,

    /// The guid of the package to stage.
    #[arg(long, required = true)]
    pub package_guid: String,
}

/// Arguments for `v3-set-droplet`.
#[derive(Parser, Debug, Clone)]
pub struct SetDropletArgs {
    /// Name of the app.
    pub app_name: String,

    /// The guid of the droplet to use.
    #[arg(short, long, required = true)]
    pub droplet_guid: String,
}

/// Arguments for `v3-create-package`.
#[derive(Parser, Debug, Clone)]
pub struct CreatePackageArgs {
    /// Name of the app.
    pub app_name: String,

    /// Docker image to use (e.g. user/docker-image-name).
    #[arg(short = 'o', long)]
    pub docker_image: Option<String>,

    /// Path to app directory.
    #[arg(short = 'p')]
    pub app_path: Option<PathBuf>,
}

/// Arguments for `v3-set-env`.
#[derive(Parser, Debug, Clone)]
pub struct SetEnvArgs {
    /// Name of the app.
    pub app_name: String,
    /// Variable name.
    pub env_var_name: String,
    /// Variable value.
    pub env_var_value: String,
}

/// Arguments for `v3-unset-env`.
#[derive(Parser, Debug, Clone)]
pub struct UnsetEnvArgs {
    /// Name of the app.
    pub app_name: String,
    /// Variable name.
    pub env_var_name: String,
}

/// Arguments for `v3-push`.
#[derive(Parser, Debug, Clone)]
pub struct PushArgs {
    /// Name of the app.
    pub app_name: String,

    /// Custom buildpack by name or Git URL. To use built-in buildpacks only, specify 'default' or 'null'.
    #[arg(short = 'b', value_name = "BUILDPACK")]
    pub buildpacks: Vec<String>,

    /// Docker image to use (e.g. user/docker-image-name).
    #[arg(short = 'o', long)]
    pub docker_image: Option<String>,

    /// Repository username; used with password from environment variable CF_DOCKER_PASSWORD.
    #[arg(long)]
    pub docker_username: Option<String>,

    /// Do not map a route to this app.
    #[arg(long)]
    pub no_route: bool,

    /// Do not stage and start the app after pushing.
    #[arg(long)]
    pub no_start: bool,

    /// Path to app directory.
    #[arg(short = 'p')]
    pub app_path: Option<PathBuf>,
}

/// Arguments for `run-task`.
#[derive(Parser, Debug, Clone)]
pub struct RunTaskArgs {
    /// Name of the app.
    pub app_name: String,

    /// The command to execute.
    pub command: String,

    /// Name to give the task (generated if omitted).
    #[arg(long)]
    pub name: Option<String>,

    /// Memory limit (e.g. 256M, 1024M, 1G).
    #[arg(short = 'm', value_parser = parse_megabytes)]
    pub memory: Option<u64>,

    /// Disk limit (e.g. 256M, 1024M, 1G).
    #[arg(short = 'k', value_parser = parse_megabytes)]
    pub disk: Option<u64>,
}

/// Arguments for `terminate-task`.
#[derive(Parser, Debug, Clone)]
pub struct TerminateTaskArgs {
    /// Name of the app.
    pub app_name: String,

    /// Sequence id of the task, as shown by `tasks`.
    pub task_id: u64,
}

/// A single isolation segment name.
#[derive(Parser, Debug, Clone)]
pub struct SegmentNameArgs {
    /// Name of the isolation segment.
    pub segment_name: String,
}

/// Arguments for `delete-isolation-segment`.
#[derive(Parser, Debug, Clone)]
pub struct DeleteSegmentArgs {
    /// Name of the isolation segment.
    pub segment_name: String,

    /// Force deletion without confirmation.
    #[arg(short, long)]
    pub force: bool,
}

/// An org and an isolation segment.
#[derive(Parser, Debug, Clone)]
pub struct OrgSegmentArgs {
    /// Name of the organization.
    pub organization_name: String,
    /// Name of the isolation segment.
    pub segment_name: String,
}

/// A single org name.
#[derive(Parser, Debug, Clone)]
pub struct OrgNameArgs {
    /// Name of the organization.
    pub organization_name: String,
}

/// A space in the targeted org and an isolation segment.
#[derive(Parser, Debug, Clone)]
pub struct SpaceSegmentArgs {
    /// Name of the space.
    pub space_name: String,
    /// Name of the isolation segment.
    pub segment_name: String,
}

/// A single space name in the targeted org.
#[derive(Parser, Debug, Clone)]
pub struct SpaceNameArgs {
    /// Name of the space.
    pub space_name: String,
}

/// Arguments for `share-service`.
#[derive(Parser, Debug, Clone)]
pub struct ShareServiceArgs {
    /// Name of the service instance.
    pub service_instance: String,

    /// Space to share the service instance into.
    #[arg(short = 's', required = true)]
    pub space: String,

    /// Org of the other space (Default: targeted org).
    #[arg(short = 'o')]
    pub org: Option<String>,
}

/// Arguments for `unshare-service`.
#[derive(Parser, Debug, Clone)]
pub struct UnshareServiceArgs {
    /// Name of the service instance.
    pub service_instance: String,

    /// Space to unshare the service instance from.
    #[arg(short = 's', required = true)]
    pub space: String,

    /// Org of the other space (Default: targeted org).
    #[arg(short = 'o')]
    pub org: Option<String>,

    /// Force unshare without confirmation.
    #[arg(short, long)]
    pub force: bool,
}

/// Transport protocol of a network policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    /// TCP.
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl Protocol {
    /// Name used by the policy API.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// A port or an inclusive port range, `8080` or `8080-8090`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    /// First port.
    pub start: u16,
    /// Last port, equal to `start` for a single port.
    pub end: u16,
}

impl Default for PortRange {
    fn default() -> Self {
        Self { start: 8080, end: 8080 }
    }
}

impl FromStr for PortRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid port or port range '{s}'");
        let port = |p: &str| p.trim().parse::<u16>().ok().filter(|port| *port > 0).ok_or_else(invalid);

        let range = match s.split_once('-') {
            Some((start, end)) => Self { start: port(start)?, end: port(end)? },
            None => {
                let single = port(s)?;
                Self { start: single, end: single }
            }
        };
        if range.start > range.end {
            return Err(invalid());
        }
        Ok(range)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Arguments for `add-network-policy`.
#[derive(Parser, Debug, Clone)]
pub struct AddNetworkPolicyArgs {
    /// Name of the source app.
    pub source_app: String,

    /// Name of app to connect to.
    #[arg(long, required = true)]
    pub destination_app: String,

    /// The space of the destination app (Default: targeted space).
    #[arg(short = 's')]
    pub destination_space: Option<String>,

    /// The org of the destination app (Default: targeted org).
    #[arg(short = 'o')]
    pub destination_org: Option<String>,

    /// Protocol to connect apps with (Default: tcp).
    #[arg(long, value_enum)]
    pub protocol: Option<Protocol>,

    /// Port or range of ports for connection to destination app (Default: 8080).
    #[arg(long)]
    pub port: Option<PortRange>,
}

/// Arguments for `remove-network-policy`.
#[derive(Parser, Debug, Clone)]
pub struct RemoveNetworkPolicyArgs {
    /// Name of the source app.
    pub source_app: String,

    /// Name of app to connect to.
    #[arg(long, required = true)]
    pub destination_app: String,

    /// The space of the destination app (Default: targeted space).
    #[arg(short = 's')]
    pub destination_space: Option<String>,

    /// The org of the destination app (Default: targeted org).
    #[arg(short = 'o')]
    pub destination_org: Option<String>,

    /// Protocol that apps are connected with.
    #[arg(long, value_enum, required = true)]
    pub protocol: Protocol,

    /// Port or range of ports that destination app is connected with.
    #[arg(long, required = true)]
    pub port: PortRange,
}

/// Arguments for `network-policies`.
#[derive(Parser, Debug, Clone)]
pub struct NetworkPoliciesArgs {
    /// Source app to filter results by.
    #[arg(long)]
    pub source: Option<String>,
}

/// Parse a size with a unit into megabytes: `256M`, `256MB`, `1G`, `1GB`.
pub fn parse_megabytes(s: &str) -> Result<u64, String> {
    let invalid = || "Byte quantity must be an integer with a unit of measurement like M, MB, G, or GB".to_string();
    let upper = s.trim().to_ascii_uppercase();
    let (digits, factor) = if let Some(n) = upper.strip_suffix("GB").or_else(|| upper.strip_suffix('G')) {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix("MB").or_else(|| upper.strip_suffix('M')) {
        (n, 1)
    } else {
        return Err(invalid());
    };
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    value.checked_mul(factor).ok_or_else(invalid)
}
