use super::{Actor, not_found_as};
use crate::ActionOutcome;
use crate::error::{ActionError, CcError};
use crate::resources::{IsolationSegment, IsolationSegmentSummary, Organization, Space};
use crate::warnings::Warnings;

impl Actor {
    pub(crate) async fn organization_by_name(
        &self,
        name: &str,
        warnings: &mut Warnings,
    ) -> Result<Organization, ActionError> {
        let orgs = self
            .cc
            .get_organizations(&[("names", name.to_string())], warnings)
            .await?;
        orgs.into_iter()
            .next()
            .ok_or_else(|| ActionError::OrganizationNotFound { name: name.to_string() })
    }

    pub(crate) async fn space_by_name(
        &self,
        name: &str,
        org_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Space, ActionError> {
        let spaces = self
            .cc
            .get_spaces(
                &[
                    ("names", name.to_string()),
                    ("organization_guids", org_guid.to_string()),
                ],
                warnings,
            )
            .await?;
        spaces
            .into_iter()
            .next()
            .ok_or_else(|| ActionError::SpaceNotFound { name: name.to_string() })
    }

    async fn isolation_segment_by_name(
        &self,
        name: &str,
        warnings: &mut Warnings,
    ) -> Result<IsolationSegment, ActionError> {
        let segments = self
            .cc
            .get_isolation_segments(&[("names", name.to_string())], warnings)
            .await?;
        segments
            .into_iter()
            .next()
            .ok_or_else(|| ActionError::IsolationSegmentNotFound { name: name.to_string() })
    }

    /// Look up an organization by name.
    pub async fn get_organization_by_name(&self, name: &str) -> ActionOutcome<Organization> {
        let mut warnings = Warnings::new();
        let result = self.organization_by_name(name, &mut warnings).await;
        (result, warnings)
    }

    /// Look up a space by name within an organization.
    pub async fn get_space_by_name_and_organization(&self, name: &str, org_guid: &str) -> ActionOutcome<Space> {
        let mut warnings = Warnings::new();
        let result = self.space_by_name(name, org_guid, &mut warnings).await;
        (result, warnings)
    }

    /// Create a segment. A name clash becomes [`ActionError::IsolationSegmentAlreadyExists`].
    pub async fn create_isolation_segment_by_name(&self, name: &str) -> ActionOutcome<IsolationSegment> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .create_isolation_segment(name, &mut warnings)
            .await
            .map_err(|err| match err {
                CcError::UnprocessableEntity(_) => ActionError::IsolationSegmentAlreadyExists {
                    name: name.to_string(),
                },
                other => other.into(),
            });
        (result, warnings)
    }

    /// Delete a segment by name.
    pub async fn delete_isolation_segment_by_name(&self, name: &str) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let segment = self.isolation_segment_by_name(name, &mut warnings).await?;
            self.cc
                .delete_isolation_segment(&segment.guid, &mut warnings)
                .await
                .map_err(|err| not_found_as(err, || ActionError::IsolationSegmentNotFound { name: name.to_string() }))
        }
        .await;
        (result, warnings)
    }

    /// Every visible segment with the names of the orgs entitled to it.
    pub async fn get_isolation_segment_summaries(&self) -> ActionOutcome<Vec<IsolationSegmentSummary>> {
        let mut warnings = Warnings::new();
        let result = async {
            let segments = self.cc.get_isolation_segments(&[], &mut warnings).await?;
            let mut summaries = Vec::with_capacity(segments.len());
            for segment in segments {
                let orgs = self
                    .cc
                    .get_isolation_segment_organizations(&segment.guid, &mut warnings)
                    .await?;
                summaries.push(IsolationSegmentSummary {
                    name: segment.name,
                    entitled_orgs: orgs.into_iter().map(|org| org.name).collect(),
                });
            }
            Ok::<_, ActionError>(summaries)
        }
        .await;
        (result, warnings)
    }

    /// Entitle an org to a segment.
    pub async fn entitle_isolation_segment_to_organization_by_name(
        &self,
        segment_name: &str,
        org_name: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let segment = self.isolation_segment_by_name(segment_name, &mut warnings).await?;
            let org = self.organization_by_name(org_name, &mut warnings).await?;
            self.cc
                .entitle_isolation_segment_to_organizations(&segment.guid, &[org.guid.as_str()], &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Revoke an org's entitlement to a segment.
    pub async fn delete_isolation_segment_organization_by_name(
        &self,
        segment_name: &str,
        org_name: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let segment = self.isolation_segment_by_name(segment_name, &mut warnings).await?;
            let org = self.organization_by_name(org_name, &mut warnings).await?;
            self.cc
                .delete_isolation_segment_organization(&segment.guid, &org.guid, &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Make a segment the default for an org.
    pub async fn set_organization_default_isolation_segment(&self, org_name: &str, segment_name: &str) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let org = self.organization_by_name(org_name, &mut warnings).await?;
            let segment = self.isolation_segment_by_name(segment_name, &mut warnings).await?;
            self.cc
                .update_organization_default_isolation_segment(&org.guid, &segment.guid, &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Clear an org's default segment.
    pub async fn reset_organization_default_isolation_segment(&self, org_name: &str) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let org = self.organization_by_name(org_name, &mut warnings).await?;
            self.cc
                .update_organization_default_isolation_segment(&org.guid, "", &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Assign a segment to a space in `org_guid`.
    pub async fn assign_isolation_segment_to_space_by_name_and_space(
        &self,
        segment_name: &str,
        space_name: &str,
        org_guid: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let segment = self.isolation_segment_by_name(segment_name, &mut warnings).await?;
            let space = self.space_by_name(space_name, org_guid, &mut warnings).await?;
            self.cc
                .update_space_isolation_segment(&space.guid, &segment.guid, &mut warnings)
                .await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Clear a space's segment and return the name of the org default that now
    /// applies, or an empty string for the platform default.
    pub async fn reset_space_isolation_segment(&self, org_guid: &str, space_name: &str) -> ActionOutcome<String> {
        let mut warnings = Warnings::new();
        let result = async {
            let space = self.space_by_name(space_name, org_guid, &mut warnings).await?;
            self.cc
                .update_space_isolation_segment(&space.guid, "", &mut warnings)
                .await?;
            let default = self
                .cc
                .get_organization_default_isolation_segment(org_guid, &mut warnings)
                .await?;
            let Some(segment_guid) = default.guid() else {
                return Ok(String::new());
            };
            let segment = self.cc.get_isolation_segment(segment_guid, &mut warnings).await?;
            Ok::<_, ActionError>(segment.name)
        }
        .await;
        (result, warnings)
    }
}
