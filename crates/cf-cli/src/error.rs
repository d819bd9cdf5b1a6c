//! CLI error types.
//!
//! Most failures arrive from the actor as [`ActionError`]s. The command layer
//! adds its own argument and environment errors, and [`CliError::message`]
//! renders the user-facing text, which sometimes needs the binary name.

use cf_actor::{ActionError, CcError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// No API endpoint in the config.
    #[error("No API endpoint set.")]
    NoApiSet,

    /// The target's API is older than the command needs.
    #[error("{}", minimum_version_message(.current, .minimum))]
    MinimumVersionNotMet {
        /// Version reported by the target, possibly empty.
        current: String,
        /// Version the command requires.
        minimum: String,
    },

    /// Flags that may not be combined.
    #[error("Incorrect Usage: The following arguments cannot be used together: {}", .args.join(", "))]
    ArgumentCombination {
        /// Offending flags, in display order.
        args: Vec<String>,
    },

    /// Flags that must be given together.
    #[error("Incorrect Usage: '{arg1}' and '{arg2}' must be used together.")]
    RequiredFlags {
        /// First flag.
        arg1: String,
        /// Second flag.
        arg2: String,
    },

    /// `--docker-username` without a password in the environment.
    #[error("Environment variable CF_DOCKER_PASSWORD not set.")]
    DockerPasswordNotSet,

    /// `default` or `null` mixed with other buildpacks.
    #[error("Multiple buildpacks flags cannot have null/default option.")]
    ConflictingBuildpacks,

    /// Only one of `--protocol` and `--port`.
    #[error("Incorrect Usage: --protocol and --port flags must be specified together")]
    NetworkPolicyProtocolOrPortNotProvided,

    /// `-o` without `-s`.
    #[error("Incorrect Usage: --destination-org/-o requires --destination-space/-s")]
    NetworkPolicyDestinationOrgWithoutSpace,

    /// The stored access token could not be decoded.
    #[error("Invalid auth token: {0}")]
    InvalidToken(String),

    /// The config file could not be read.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error reported by the actor.
    #[error(transparent)]
    Actor(#[from] ActionError),

    /// Terminal IO failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CcError> for CliError {
    fn from(err: CcError) -> Self {
        Self::Actor(ActionError::CloudController(err))
    }
}

impl CliError {
    /// The text shown to the user. `binary` is the name the CLI was invoked as.
    pub fn message(&self, binary: &str) -> String {
        match self {
            Self::NoApiSet => format!(
                "No API endpoint set. Use '{binary} login' or '{binary} api' to target an endpoint."
            ),
            Self::Actor(ActionError::NotLoggedIn) => {
                format!("Not logged in. Use '{binary} login' to log in.")
            }
            Self::Actor(ActionError::NoOrganizationTargeted) => {
                format!("No org targeted, use '{binary} target -o ORG' to target an org.")
            }
            Self::Actor(ActionError::NoSpaceTargeted) => {
                format!("No space targeted, use '{binary} target -s SPACE' to target a space.")
            }
            Self::Actor(ActionError::StartupTimeout { name }) => format!(
                "Start app timeout\n\nTIP: Application must be listening on the right port. \
                 Instead of hard coding the port, use the $PORT environment variable.\n\n\
                 Use '{binary} logs {name} --recent' for more information"
            ),
            Self::Actor(ActionError::StagingTimeout) => format!(
                "Error staging application: Timed out waiting for package to stage\n\n\
                 TIP: Use '{binary} logs --recent' for more information"
            ),
            other => other.to_string(),
        }
    }
}

fn minimum_version_message(current: &str, minimum: &str) -> String {
    if current.is_empty() {
        format!("This command requires CF API version {minimum} or higher.")
    } else {
        format!("This command requires CF API version {minimum} or higher. Your target is {current}.")
    }
}
