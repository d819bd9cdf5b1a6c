//! Error types for the API clients and the actor layer.

use thiserror::Error;

/// Errors raised by the HTTP clients.
#[derive(Debug, Error)]
pub enum CcError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A URL could not be built from the configured endpoint.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The response body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// 401 from the API.
    #[error("Invalid auth token")]
    Unauthorized,

    /// 403 from the API.
    #[error("You are not authorized to perform the requested action")]
    Forbidden,

    /// 404 from the API.
    #[error("resource not found")]
    ResourceNotFound,

    /// 422 from the API, carrying the server's detail text.
    #[error("{0}")]
    UnprocessableEntity(String),

    /// Any other non-success status.
    #[error("Server error, status code: {status}, error code: {code}, message: {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Numeric API error code.
        code: i64,
        /// Error title, e.g. `CF-AppNotFound`.
        title: String,
        /// Human readable detail.
        detail: String,
    },
}

/// Errors returned by actor operations.
#[derive(Debug, Error)]
pub enum ActionError {
    /// No access or refresh token in the config.
    #[error("not logged in")]
    NotLoggedIn,

    /// No organization in the config.
    #[error("no organization targeted")]
    NoOrganizationTargeted,

    /// No space in the config.
    #[error("no space targeted")]
    NoSpaceTargeted,

    /// App lookup by name came back empty.
    #[error("App {name} not found")]
    ApplicationNotFound {
        /// App name.
        name: String,
    },

    /// An app with this name already exists in the space.
    #[error("App {name} already exists")]
    ApplicationAlreadyExists {
        /// App name.
        name: String,
    },

    /// The app has no process of this type.
    #[error("Process {process_type} not found")]
    ProcessNotFound {
        /// Process type, e.g. `web`.
        process_type: String,
    },

    /// The process has no instance at this index.
    #[error("Instance {index} of process {process_type} not found")]
    ProcessInstanceNotFound {
        /// Process type.
        process_type: String,
        /// Instance index.
        index: u32,
    },

    /// No task with this sequence id on the app.
    #[error("Task sequence ID {sequence_id} not found.")]
    TaskNotFound {
        /// App-scoped task sequence id.
        sequence_id: u64,
    },

    /// The package never reached `READY`.
    #[error("Package {guid} failed to process")]
    PackageProcessingFailed {
        /// Package guid.
        guid: String,
    },

    /// Staging reported a failure.
    #[error("{reason}")]
    StagingFailed {
        /// Error text reported by the build.
        reason: String,
    },

    /// Staging did not finish in time.
    #[error("Timed out waiting for package to stage")]
    StagingTimeout,

    /// No instance started in time.
    #[error("Timed out waiting for application {name} to start")]
    StartupTimeout {
        /// App name.
        name: String,
    },

    /// Every instance of a process crashed while starting.
    #[error("All instances of process {process_type} crashed")]
    AllInstancesCrashed {
        /// Process type.
        process_type: String,
    },

    /// Organization lookup by name came back empty.
    #[error("Organization '{name}' not found.")]
    OrganizationNotFound {
        /// Org name.
        name: String,
    },

    /// Space lookup by name came back empty.
    #[error("Space '{name}' not found.")]
    SpaceNotFound {
        /// Space name.
        name: String,
    },

    /// Isolation segment lookup by name came back empty.
    #[error("Isolation segment '{name}' not found.")]
    IsolationSegmentNotFound {
        /// Segment name.
        name: String,
    },

    /// A segment with this name already exists.
    #[error("Isolation segment '{name}' already exists.")]
    IsolationSegmentAlreadyExists {
        /// Segment name.
        name: String,
    },

    /// Service instance lookup by name came back empty.
    #[error("Service instance {name} not found")]
    ServiceInstanceNotFound {
        /// Service instance name.
        name: String,
    },

    /// The instance to share does not exist or is user-provided.
    #[error("Specified instance not found or not a managed service instance. Sharing is not supported for user provided services.")]
    SharedServiceInstanceNotFound,

    /// The instance is already shared into the target space.
    #[error("Service instance is already shared with that space.")]
    ServiceInstanceAlreadyShared,

    /// The instance is not shared into the given space.
    #[error("Service instance {service_instance} is not shared with space {space} in organization {org}.")]
    ServiceInstanceNotSharedToSpace {
        /// Service instance name.
        service_instance: String,
        /// Space name.
        space: String,
        /// Org name.
        org: String,
    },

    /// Unsetting a variable that is not set.
    #[error("Env variable {name} was not set.")]
    EnvironmentVariableNotSet {
        /// Variable name.
        name: String,
    },

    /// Removing a policy that does not exist.
    #[error("Policy does not exist.")]
    PolicyDoesNotExist,

    /// The target does not expose the network policy API.
    #[error("The network policy API is not available on this target.")]
    NetworkingUnavailable,

    /// Bits could not be read or archived.
    #[error("could not package application bits: {0}")]
    Archive(String),

    /// Local IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Any API failure without a domain meaning.
    #[error(transparent)]
    CloudController(#[from] CcError),
}

impl From<zip::result::ZipError> for ActionError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}
