use tracing::debug;

use super::Actor;
use crate::ActionOutcome;
use crate::error::ActionError;
use crate::resources::Application;
use crate::warnings::Warnings;

impl Actor {
    /// Ensure `<app-name>.<org default domain>` exists and routes to the app.
    pub async fn create_and_map_default_application_route(
        &self,
        org_guid: &str,
        space_guid: &str,
        app: &Application,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let domain = self
                .cc
                .get_organization_default_domain(org_guid, &mut warnings)
                .await?;
            let existing = self
                .cc
                .get_routes(
                    &[
                        ("hosts", app.name.clone()),
                        ("domain_guids", domain.guid.clone()),
                    ],
                    &mut warnings,
                )
                .await?;

            let route = match existing.into_iter().next() {
                Some(route) => route,
                None => {
                    debug!(host = %app.name, domain = %domain.name, "creating default route");
                    self.cc
                        .create_route(space_guid, &domain.guid, &app.name, &mut warnings)
                        .await?
                }
            };
            self.cc.map_route(&route.guid, &app.guid, &mut warnings).await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }
}
