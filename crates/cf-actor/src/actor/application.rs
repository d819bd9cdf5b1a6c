use std::collections::BTreeMap;

use super::{Actor, not_found_as};
use crate::ActionOutcome;
use crate::error::{ActionError, CcError};
use crate::resources::{Application, LifecycleType};
use crate::warnings::Warnings;

impl Actor {
    pub(crate) async fn application_by_name(
        &self,
        name: &str,
        space_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Application, ActionError> {
        let apps = self
            .cc
            .get_applications(
                &[
                    ("names", name.to_string()),
                    ("space_guids", space_guid.to_string()),
                ],
                warnings,
            )
            .await?;
        apps.into_iter()
            .next()
            .ok_or_else(|| ActionError::ApplicationNotFound { name: name.to_string() })
    }

    /// Look up an app by name within a space.
    pub async fn get_application_by_name_and_space(&self, name: &str, space_guid: &str) -> ActionOutcome<Application> {
        let mut warnings = Warnings::new();
        let result = self.application_by_name(name, space_guid, &mut warnings).await;
        (result, warnings)
    }

    /// All apps in a space, in API order.
    pub async fn get_applications_by_space(&self, space_guid: &str) -> ActionOutcome<Vec<Application>> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .get_applications(&[("space_guids", space_guid.to_string())], &mut warnings)
            .await
            .map_err(ActionError::from);
        (result, warnings)
    }

    /// Create an app. A name clash becomes [`ActionError::ApplicationAlreadyExists`].
    pub async fn create_application_in_space(&self, app: &Application, space_guid: &str) -> ActionOutcome<Application> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .create_application(app, space_guid, &mut warnings)
            .await
            .map_err(|err| match err {
                CcError::UnprocessableEntity(detail) if detail.contains("must be unique") => {
                    ActionError::ApplicationAlreadyExists { name: app.name.clone() }
                }
                other => other.into(),
            });
        (result, warnings)
    }

    /// Update an app's lifecycle, e.g. its buildpacks.
    pub async fn update_application(&self, app: &Application) -> ActionOutcome<Application> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .update_application(app, &mut warnings)
            .await
            .map_err(ActionError::from);
        (result, warnings)
    }

    /// Delete an app by name.
    pub async fn delete_application_by_name_and_space(&self, name: &str, space_guid: &str) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(name, space_guid, &mut warnings).await?;
            self.cc
                .delete_application(&app.guid, &mut warnings)
                .await
                .map_err(|err| not_found_as(err, || ActionError::ApplicationNotFound { name: name.to_string() }))
        }
        .await;
        (result, warnings)
    }

    /// Request the app to start.
    pub async fn start_application(&self, app_guid: &str) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .start_application(app_guid, &mut warnings)
            .await
            .map_err(ActionError::from);
        (result, warnings)
    }

    /// Request the app to stop.
    pub async fn stop_application(&self, app_guid: &str) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .stop_application(app_guid, &mut warnings)
            .await
            .map_err(ActionError::from);
        (result, warnings)
    }

    /// Set one user-provided environment variable.
    pub async fn set_environment_variable_by_application_name_and_space(
        &self,
        space_guid: &str,
        app_name: &str,
        key: &str,
        value: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            let mut changes = BTreeMap::new();
            changes.insert(key.to_string(), Some(value.to_string()));
            self.cc
                .update_application_environment_variables(&app.guid, &changes, &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Remove one user-provided environment variable.
    ///
    /// Fails with [`ActionError::EnvironmentVariableNotSet`] when it was never set.
    pub async fn unset_environment_variable_by_application_name_and_space(
        &self,
        space_guid: &str,
        app_name: &str,
        key: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            let current = self
                .cc
                .get_application_environment_variables(&app.guid, &mut warnings)
                .await?;
            if !current.var.contains_key(key) {
                return Err(ActionError::EnvironmentVariableNotSet { name: key.to_string() });
            }
            let mut changes = BTreeMap::new();
            changes.insert(key.to_string(), None);
            self.cc
                .update_application_environment_variables(&app.guid, &changes, &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }
}

/// Build an app record for creation.
pub fn new_application(name: &str, kind: LifecycleType) -> Application {
    let mut app = Application {
        name: name.to_string(),
        ..Default::default()
    };
    app.lifecycle.kind = kind;
    app
}
