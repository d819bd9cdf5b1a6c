//! Checks against local session state that need no API call.

use crate::error::ActionError;

/// Session and target state the shared actor inspects.
pub trait TargetConfig {
    /// Stored access token, possibly empty.
    fn access_token(&self) -> &str;
    /// Stored refresh token, possibly empty.
    fn refresh_token(&self) -> &str;
    /// Whether an organization is targeted.
    fn has_targeted_organization(&self) -> bool;
    /// Whether a space is targeted.
    fn has_targeted_space(&self) -> bool;
}

/// Actor for operations shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct SharedActor<'a, C: TargetConfig> {
    config: &'a C,
}

impl<'a, C: TargetConfig> SharedActor<'a, C> {
    /// Create a shared actor over `config`.
    pub const fn new(config: &'a C) -> Self {
        Self { config }
    }

    /// Whether any token is stored.
    pub fn is_logged_in(&self) -> bool {
        !self.config.access_token().is_empty() || !self.config.refresh_token().is_empty()
    }

    /// Ensure the user is logged in and, as requested, has an org and space targeted.
    ///
    /// The space is only checked when the org is required too.
    pub fn check_target(&self, require_org: bool, require_space: bool) -> Result<(), ActionError> {
        if !self.is_logged_in() {
            return Err(ActionError::NotLoggedIn);
        }
        if require_org {
            if !self.config.has_targeted_organization() {
                return Err(ActionError::NoOrganizationTargeted);
            }
            if require_space && !self.config.has_targeted_space() {
                return Err(ActionError::NoSpaceTargeted);
            }
        }
        Ok(())
    }
}
