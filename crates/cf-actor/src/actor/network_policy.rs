use std::collections::HashMap;

use super::Actor;
use crate::ActionOutcome;
use crate::error::ActionError;
use crate::networking::{Policy, PolicyDestination, PolicySource, Ports};
use crate::resources::Application;
use crate::warnings::Warnings;

/// A policy with app, space and org names resolved for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkPolicy {
    /// Source app name.
    pub source_name: String,
    /// Destination app name.
    pub destination_name: String,
    /// `tcp` or `udp`.
    pub protocol: String,
    /// First allowed port.
    pub start_port: u16,
    /// Last allowed port.
    pub end_port: u16,
    /// Space of the destination app.
    pub destination_space_name: String,
    /// Org of the destination app.
    pub destination_org_name: String,
}

/// What to allow: traffic from one app to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRequest<'a> {
    /// Space of the source app.
    pub source_space_guid: &'a str,
    /// Source app name.
    pub source_app_name: &'a str,
    /// Space of the destination app.
    pub destination_space_guid: &'a str,
    /// Destination app name.
    pub destination_app_name: &'a str,
    /// `tcp` or `udp`.
    pub protocol: &'a str,
    /// First port.
    pub start_port: u16,
    /// Last port.
    pub end_port: u16,
}

impl Actor {
    async fn policy_for(&self, request: &PolicyRequest<'_>, warnings: &mut Warnings) -> Result<Policy, ActionError> {
        let source = self
            .application_by_name(request.source_app_name, request.source_space_guid, warnings)
            .await?;
        let destination = self
            .application_by_name(request.destination_app_name, request.destination_space_guid, warnings)
            .await?;
        Ok(Policy {
            source: PolicySource { id: source.guid },
            destination: PolicyDestination {
                id: destination.guid,
                protocol: request.protocol.to_string(),
                ports: Ports {
                    start: request.start_port,
                    end: request.end_port,
                },
            },
        })
    }

    /// Allow traffic from one app to another.
    pub async fn add_network_policy(&self, request: &PolicyRequest<'_>) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let networking = self.networking()?;
            let policy = self.policy_for(request, &mut warnings).await?;
            networking.create_policies(&[policy], &mut warnings).await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Remove an existing policy. Fails with [`ActionError::PolicyDoesNotExist`] if there is none.
    pub async fn remove_network_policy(&self, request: &PolicyRequest<'_>) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let networking = self.networking()?;
            let wanted = self.policy_for(request, &mut warnings).await?;
            let existing = networking
                .list_policies(&[wanted.source.id.as_str()], &mut warnings)
                .await?;
            if !existing.contains(&wanted) {
                return Err(ActionError::PolicyDoesNotExist);
            }
            networking.remove_policies(&[wanted], &mut warnings).await?;
            Ok::<_, ActionError>(())
        }
        .await;
        (result, warnings)
    }

    /// Policies whose source is an app in the space.
    pub async fn network_policies_by_space(&self, space_guid: &str) -> ActionOutcome<Vec<NetworkPolicy>> {
        let mut warnings = Warnings::new();
        let result = async {
            let networking = self.networking()?;
            let apps = self
                .cc
                .get_applications(&[("space_guids", space_guid.to_string())], &mut warnings)
                .await?;
            if apps.is_empty() {
                return Ok(Vec::new());
            }
            let guids: Vec<&str> = apps.iter().map(|app| app.guid.as_str()).collect();
            let policies = networking.list_policies(&guids, &mut warnings).await?;
            self.resolve_policies(&apps, policies, &mut warnings).await
        }
        .await;
        (result, warnings)
    }

    /// Policies whose source is the named app.
    pub async fn network_policies_by_space_and_app_name(
        &self,
        space_guid: &str,
        app_name: &str,
    ) -> ActionOutcome<Vec<NetworkPolicy>> {
        let mut warnings = Warnings::new();
        let result = async {
            let networking = self.networking()?;
            let apps = self
                .cc
                .get_applications(&[("space_guids", space_guid.to_string())], &mut warnings)
                .await?;
            let source = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            let policies = networking
                .list_policies(&[source.guid.as_str()], &mut warnings)
                .await?
                .into_iter()
                .filter(|policy| policy.source.id == source.guid)
                .collect();
            self.resolve_policies(&apps, policies, &mut warnings).await
        }
        .await;
        (result, warnings)
    }

    async fn resolve_policies(
        &self,
        space_apps: &[Application],
        policies: Vec<Policy>,
        warnings: &mut Warnings,
    ) -> Result<Vec<NetworkPolicy>, ActionError> {
        let mut apps: HashMap<String, Application> = space_apps
            .iter()
            .map(|app| (app.guid.clone(), app.clone()))
            .collect();
        let policies: Vec<Policy> = policies
            .into_iter()
            .filter(|policy| apps.contains_key(&policy.source.id))
            .collect();

        let mut foreign: Vec<&str> = policies
            .iter()
            .map(|policy| policy.destination.id.as_str())
            .filter(|guid| !apps.contains_key(*guid))
            .collect();
        foreign.sort_unstable();
        foreign.dedup();
        if !foreign.is_empty() {
            let found = self
                .cc
                .get_applications(&[("guids", foreign.join(","))], warnings)
                .await?;
            apps.extend(found.into_iter().map(|app| (app.guid.clone(), app)));
        }

        let mut space_guids: Vec<&str> = apps
            .values()
            .filter_map(|app| app.relationships.space.guid())
            .collect();
        space_guids.sort_unstable();
        space_guids.dedup();
        let spaces = if space_guids.is_empty() {
            Vec::new()
        } else {
            self.cc
                .get_spaces(&[("guids", space_guids.join(","))], warnings)
                .await?
        };

        let mut org_guids: Vec<&str> = spaces
            .iter()
            .filter_map(|space| space.relationships.organization.guid())
            .collect();
        org_guids.sort_unstable();
        org_guids.dedup();
        let orgs = if org_guids.is_empty() {
            Vec::new()
        } else {
            self.cc
                .get_organizations(&[("guids", org_guids.join(","))], warnings)
                .await?
        };

        let space_of = |app: &Application| {
            let space = spaces
                .iter()
                .find(|space| Some(space.guid.as_str()) == app.relationships.space.guid());
            let org = space.and_then(|space| {
                orgs.iter()
                    .find(|org| Some(org.guid.as_str()) == space.relationships.organization.guid())
            });
            (
                space.map(|space| space.name.clone()).unwrap_or_default(),
                org.map(|org| org.name.clone()).unwrap_or_default(),
            )
        };

        Ok(policies
            .iter()
            .filter_map(|policy| {
                let source = apps.get(&policy.source.id)?;
                let destination = apps.get(&policy.destination.id)?;
                let (destination_space_name, destination_org_name) = space_of(destination);
                Some(NetworkPolicy {
                    source_name: source.name.clone(),
                    destination_name: destination.name.clone(),
                    protocol: policy.destination.protocol.clone(),
                    start_port: policy.destination.ports.start,
                    end_port: policy.destination.ports.end,
                    destination_space_name,
                    destination_org_name,
                })
            })
            .collect())
    }
}
