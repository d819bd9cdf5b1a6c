use super::isolation_segment::{RelationshipList, relationship_list_body};
use super::{Client, Query};
use crate::error::CcError;
use crate::resources::ServiceInstance;
use crate::warnings::Warnings;

impl Client {
    /// `GET /v3/service_instances`
    pub async fn get_service_instances(
        &self,
        query: &Query<'_>,
        warnings: &mut Warnings,
    ) -> Result<Vec<ServiceInstance>, CcError> {
        self.list("/service_instances", query, warnings).await
    }

    /// Guids of the spaces a service instance is shared into.
    pub async fn get_service_instance_shared_spaces(
        &self,
        guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<String>, CcError> {
        let shared: RelationshipList = self
            .get(
                &format!("/service_instances/{guid}/relationships/shared_spaces"),
                &[],
                warnings,
            )
            .await?;
        Ok(shared.guids().map(str::to_string).collect())
    }

    /// `POST /v3/service_instances/:guid/relationships/shared_spaces`
    pub async fn share_service_instance_to_spaces(
        &self,
        guid: &str,
        space_guids: &[&str],
        warnings: &mut Warnings,
    ) -> Result<(), CcError> {
        let _: RelationshipList = self
            .post(
                &format!("/service_instances/{guid}/relationships/shared_spaces"),
                &relationship_list_body(space_guids.iter().copied()),
                warnings,
            )
            .await?;
        Ok(())
    }

    /// `DELETE /v3/service_instances/:guid/relationships/shared_spaces/:space_guid`
    pub async fn delete_service_instance_shared_space(
        &self,
        guid: &str,
        space_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<(), CcError> {
        self.delete(
            &format!("/service_instances/{guid}/relationships/shared_spaces/{space_guid}"),
            warnings,
        )
        .await
    }
}
