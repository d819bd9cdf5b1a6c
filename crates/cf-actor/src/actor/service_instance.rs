use super::Actor;
use crate::ActionOutcome;
use crate::error::ActionError;
use crate::resources::ServiceInstance;
use crate::warnings::Warnings;

impl Actor {
    async fn service_instance_by_name(
        &self,
        name: &str,
        space_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<ServiceInstance, ActionError> {
        let instances = self
            .cc
            .get_service_instances(
                &[
                    ("names", name.to_string()),
                    ("space_guids", space_guid.to_string()),
                ],
                warnings,
            )
            .await?;
        instances
            .into_iter()
            .next()
            .ok_or_else(|| ActionError::ServiceInstanceNotFound { name: name.to_string() })
    }

    /// Share a managed service instance from `source_space_guid` into space
    /// `space_name` of org `org_guid`.
    pub async fn share_service_instance_to_space_and_org_by_name(
        &self,
        service_instance_name: &str,
        source_space_guid: &str,
        org_guid: &str,
        space_name: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let instance = match self
                .service_instance_by_name(service_instance_name, source_space_guid, &mut warnings)
                .await
            {
                Ok(instance) if instance.is_managed() => instance,
                Ok(_) | Err(ActionError::ServiceInstanceNotFound { .. }) => {
                    return Err(ActionError::SharedServiceInstanceNotFound);
                }
                Err(err) => return Err(err),
            };
            let shared = self
                .cc
                .get_service_instance_shared_spaces(&instance.guid, &mut warnings)
                .await?;
            let space = self.space_by_name(space_name, org_guid, &mut warnings).await?;
            if shared.contains(&space.guid) {
                return Err(ActionError::ServiceInstanceAlreadyShared);
            }
            self.cc
                .share_service_instance_to_spaces(&instance.guid, &[space.guid.as_str()], &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Stop sharing a service instance with space `space_name` of org `org_name`.
    pub async fn unshare_service_instance_by_service_instance_and_space(
        &self,
        service_instance_name: &str,
        source_space_guid: &str,
        org_guid: &str,
        org_name: &str,
        space_name: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let instance = self
                .service_instance_by_name(service_instance_name, source_space_guid, &mut warnings)
                .await?;
            let space = self.space_by_name(space_name, org_guid, &mut warnings).await?;
            let shared = self
                .cc
                .get_service_instance_shared_spaces(&instance.guid, &mut warnings)
                .await?;
            if !shared.contains(&space.guid) {
                return Err(ActionError::ServiceInstanceNotSharedToSpace {
                    service_instance: service_instance_name.to_string(),
                    space: space_name.to_string(),
                    org: org_name.to_string(),
                });
            }
            self.cc
                .delete_service_instance_shared_space(&instance.guid, &space.guid, &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }
}
