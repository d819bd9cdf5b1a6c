use serde::Deserialize;
use serde_json::json;

use super::{Client, Query};
use crate::error::CcError;
use crate::resources::{GuidRef, IsolationSegment, Organization, Relationship};
use crate::warnings::Warnings;

/// A to-many relationship, `{ "data": [ { "guid": ... } ] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RelationshipList {
    #[serde(default)]
    pub(crate) data: Vec<GuidRef>,
}

impl RelationshipList {
    pub(crate) fn guids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|item| item.guid.as_str())
    }
}

pub(crate) fn relationship_list_body<'a>(guids: impl IntoIterator<Item = &'a str>) -> serde_json::Value {
    let data: Vec<_> = guids.into_iter().map(|guid| json!({"guid": guid})).collect();
    json!({"data": data})
}

fn optional_relationship(guid: &str) -> Relationship {
    if guid.is_empty() {
        Relationship::none()
    } else {
        Relationship::to(guid)
    }
}

impl Client {
    /// `GET /v3/isolation_segments`
    pub async fn get_isolation_segments(
        &self,
        query: &Query<'_>,
        warnings: &mut Warnings,
    ) -> Result<Vec<IsolationSegment>, CcError> {
        self.list("/isolation_segments", query, warnings).await
    }

    /// `POST /v3/isolation_segments`
    pub async fn create_isolation_segment(
        &self,
        name: &str,
        warnings: &mut Warnings,
    ) -> Result<IsolationSegment, CcError> {
        self.post("/isolation_segments", &json!({"name": name}), warnings)
            .await
    }

    /// `DELETE /v3/isolation_segments/:guid`
    pub async fn delete_isolation_segment(&self, guid: &str, warnings: &mut Warnings) -> Result<(), CcError> {
        self.delete(&format!("/isolation_segments/{guid}"), warnings).await
    }

    /// `GET /v3/isolation_segments/:guid/organizations`
    pub async fn get_isolation_segment_organizations(
        &self,
        guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<Organization>, CcError> {
        self.list(&format!("/isolation_segments/{guid}/organizations"), &[], warnings)
            .await
    }

    /// `POST /v3/isolation_segments/:guid/relationships/organizations`
    pub async fn entitle_isolation_segment_to_organizations(
        &self,
        guid: &str,
        org_guids: &[&str],
        warnings: &mut Warnings,
    ) -> Result<(), CcError> {
        let _: RelationshipList = self
            .post(
                &format!("/isolation_segments/{guid}/relationships/organizations"),
                &relationship_list_body(org_guids.iter().copied()),
                warnings,
            )
            .await?;
        Ok(())
    }

    /// `DELETE /v3/isolation_segments/:guid/relationships/organizations/:org_guid`
    pub async fn delete_isolation_segment_organization(
        &self,
        guid: &str,
        org_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<(), CcError> {
        self.delete(
            &format!("/isolation_segments/{guid}/relationships/organizations/{org_guid}"),
            warnings,
        )
        .await
    }

    /// `GET /v3/organizations/:guid/relationships/default_isolation_segment`
    pub async fn get_organization_default_isolation_segment(
        &self,
        org_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Relationship, CcError> {
        self.get(
            &format!("/organizations/{org_guid}/relationships/default_isolation_segment"),
            &[],
            warnings,
        )
        .await
    }

    /// `PATCH /v3/organizations/:guid/relationships/default_isolation_segment`.
    /// An empty segment guid clears the default.
    pub async fn update_organization_default_isolation_segment(
        &self,
        org_guid: &str,
        segment_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Relationship, CcError> {
        self.patch(
            &format!("/organizations/{org_guid}/relationships/default_isolation_segment"),
            &optional_relationship(segment_guid),
            warnings,
        )
        .await
    }

    /// `PATCH /v3/spaces/:guid/relationships/isolation_segment`.
    /// An empty segment guid clears the assignment.
    pub async fn update_space_isolation_segment(
        &self,
        space_guid: &str,
        segment_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Relationship, CcError> {
        self.patch(
            &format!("/spaces/{space_guid}/relationships/isolation_segment"),
            &optional_relationship(segment_guid),
            warnings,
        )
        .await
    }

    /// `GET /v3/isolation_segments/:guid`
    pub async fn get_isolation_segment(
        &self,
        guid: &str,
        warnings: &mut Warnings,
    ) -> Result<IsolationSegment, CcError> {
        self.get(&format!("/isolation_segments/{guid}"), &[], warnings)
            .await
    }
}
