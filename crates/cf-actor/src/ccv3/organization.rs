use serde_json::json;

use super::{Client, Query};
use crate::error::CcError;
use crate::resources::{Domain, Organization, Relationship, Route, Space};
use crate::warnings::Warnings;

impl Client {
    /// `GET /v3/organizations`
    pub async fn get_organizations(
        &self,
        query: &Query<'_>,
        warnings: &mut Warnings,
    ) -> Result<Vec<Organization>, CcError> {
        self.list("/organizations", query, warnings).await
    }

    /// `GET /v3/spaces`
    pub async fn get_spaces(&self, query: &Query<'_>, warnings: &mut Warnings) -> Result<Vec<Space>, CcError> {
        self.list("/spaces", query, warnings).await
    }

    /// `GET /v3/organizations/:guid/domains/default`
    pub async fn get_organization_default_domain(
        &self,
        org_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Domain, CcError> {
        self.get(&format!("/organizations/{org_guid}/domains/default"), &[], warnings)
            .await
    }

    /// `GET /v3/routes`
    pub async fn get_routes(&self, query: &Query<'_>, warnings: &mut Warnings) -> Result<Vec<Route>, CcError> {
        self.list("/routes", query, warnings).await
    }

    /// `POST /v3/routes`
    pub async fn create_route(
        &self,
        space_guid: &str,
        domain_guid: &str,
        host: &str,
        warnings: &mut Warnings,
    ) -> Result<Route, CcError> {
        let body = json!({
            "host": host,
            "relationships": {
                "space": Relationship::to(space_guid),
                "domain": Relationship::to(domain_guid),
            },
        });
        self.post("/routes", &body, warnings).await
    }

    /// `POST /v3/routes/:guid/destinations`
    pub async fn map_route(&self, route_guid: &str, app_guid: &str, warnings: &mut Warnings) -> Result<(), CcError> {
        let body = json!({"destinations": [{"app": {"guid": app_guid}}]});
        let _: serde_json::Value = self
            .post(&format!("/routes/{route_guid}/destinations"), &body, warnings)
            .await?;
        Ok(())
    }
}
