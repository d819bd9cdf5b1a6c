use super::Actor;
use crate::ActionOutcome;
use crate::error::{ActionError, CcError};
use crate::resources::{Application, ApplicationSummary};
use crate::warnings::Warnings;

impl Actor {
    async fn summarize(&self, application: Application, warnings: &mut Warnings) -> Result<ApplicationSummary, ActionError> {
        let processes = self.process_summaries(&application.guid, warnings).await?;
        let routes = self.cc.get_application_routes(&application.guid, warnings).await?;
        let current_droplet = match self
            .cc
            .get_application_current_droplet(&application.guid, warnings)
            .await
        {
            Ok(droplet) => Some(droplet),
            Err(CcError::ResourceNotFound) => None,
            Err(err) => return Err(err.into()),
        };

        Ok(ApplicationSummary {
            application,
            current_droplet,
            processes,
            routes,
        })
    }

    /// App, processes with instance stats, routes and current droplet.
    pub async fn get_application_summary_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> ActionOutcome<ApplicationSummary> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            self.summarize(app, &mut warnings).await
        }
        .await;
        (result, warnings)
    }

    /// A summary of every app in the space, in API order.
    pub async fn get_application_summaries_by_space(&self, space_guid: &str) -> ActionOutcome<Vec<ApplicationSummary>> {
        let mut warnings = Warnings::new();
        let result = async {
            let apps = self
                .cc
                .get_applications(&[("space_guids", space_guid.to_string())], &mut warnings)
                .await?;
            let mut summaries = Vec::with_capacity(apps.len());
            for app in apps {
                summaries.push(self.summarize(app, &mut warnings).await?);
            }
            Ok::<_, ActionError>(summaries)
        }
        .await;
        (result, warnings)
    }
}
