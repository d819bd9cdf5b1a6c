//! Container-to-container network policies.

use std::future::Future;

use cf_actor::actor::{NetworkPolicy, PolicyRequest};
use cf_actor::resources::{Organization, Space};
use cf_actor::{ActionError, ActionOutcome, Actor};

use crate::cli::{AddNetworkPolicyArgs, NetworkPoliciesArgs, PortRange, Protocol, RemoveNetworkPolicyArgs};
use crate::commands::{CloudControllerActor, Requires, flavor, preflight};
use crate::config::{Config, User};
use crate::error::CliError;
use crate::ui::{DEFAULT_TABLE_PADDING, Ui};
use crate::version::MIN_VERSION_NETWORKING;

/// Actor operations on network policies.
pub trait NetworkPolicyActor: CloudControllerActor {
    /// Look up an organization by name.
    fn get_organization_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<Organization>> + Send;

    /// Look up a space by name within an org.
    fn get_space_by_name_and_organization(
        &self,
        name: &str,
        org_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Space>> + Send;

    /// Allow traffic between two apps.
    fn add_network_policy(&self, request: &PolicyRequest<'_>) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Remove an existing policy.
    fn remove_network_policy(&self, request: &PolicyRequest<'_>) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Policies whose source is in the space.
    fn network_policies_by_space(&self, space_guid: &str) -> impl Future<Output = ActionOutcome<Vec<NetworkPolicy>>> + Send;

    /// Policies whose source is the named app.
    fn network_policies_by_space_and_app_name(
        &self,
        space_guid: &str,
        app_name: &str,
    ) -> impl Future<Output = ActionOutcome<Vec<NetworkPolicy>>> + Send;
}

impl NetworkPolicyActor for Actor {
    fn get_organization_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<Organization>> + Send {
        Actor::get_organization_by_name(self, name)
    }

    fn get_space_by_name_and_organization(
        &self,
        name: &str,
        org_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Space>> + Send {
        Actor::get_space_by_name_and_organization(self, name, org_guid)
    }

    fn add_network_policy(&self, request: &PolicyRequest<'_>) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::add_network_policy(self, request)
    }

    fn remove_network_policy(&self, request: &PolicyRequest<'_>) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::remove_network_policy(self, request)
    }

    fn network_policies_by_space(&self, space_guid: &str) -> impl Future<Output = ActionOutcome<Vec<NetworkPolicy>>> + Send {
        Actor::network_policies_by_space(self, space_guid)
    }

    fn network_policies_by_space_and_app_name(
        &self,
        space_guid: &str,
        app_name: &str,
    ) -> impl Future<Output = ActionOutcome<Vec<NetworkPolicy>>> + Send {
        Actor::network_policies_by_space_and_app_name(self, space_guid, app_name)
    }
}

/// Where the destination app lives, resolved from `-s` and `-o`.
struct Destination {
    space_guid: String,
    /// `in org O / space S as U...` naming the destination.
    flavor: String,
}

/// Network policy command executor.
pub struct NetworkPolicyCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: NetworkPolicyActor> NetworkPolicyCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    async fn destination(
        &self,
        ui: &mut Ui,
        space: Option<&str>,
        org: Option<&str>,
        user: &User,
    ) -> Result<Destination, CliError> {
        let Some(space_name) = space else {
            return Ok(Destination {
                space_guid: self.config.targeted_space().guid.clone(),
                flavor: flavor(self.config, user),
            });
        };

        let (org_guid, org_name) = match org {
            Some(name) => {
                let (result, warnings) = self.actor.get_organization_by_name(name).await;
                ui.display_warnings(&warnings)?;
                let found = result?;
                (found.guid, found.name)
            }
            None => {
                let targeted = self.config.targeted_organization();
                (targeted.guid.clone(), targeted.name.clone())
            }
        };
        let (result, warnings) = self
            .actor
            .get_space_by_name_and_organization(space_name, &org_guid)
            .await;
        ui.display_warnings(&warnings)?;
        let found = result?;

        Ok(Destination {
            space_guid: found.guid,
            flavor: format!("in org {org_name} / space {} as {}...", found.name, user.name),
        })
    }

    /// `add-network-policy`. Protocol and port default to `tcp` and `8080`
    /// but must be given together.
    ///
    /// # Errors
    ///
    /// Returns an error if the flags are inconsistent, a precondition fails,
    /// either app cannot be found, or the policy is rejected.
    pub async fn add(&self, ui: &mut Ui, args: &AddNetworkPolicyArgs) -> Result<(), CliError> {
        if args.protocol.is_some() != args.port.is_some() {
            return Err(CliError::NetworkPolicyProtocolOrPortNotProvided);
        }
        if args.destination_org.is_some() && args.destination_space.is_none() {
            return Err(CliError::NetworkPolicyDestinationOrgWithoutSpace);
        }
        let user = preflight(self.config, self.actor, MIN_VERSION_NETWORKING, Requires::Space)?;
        let destination = self
            .destination(ui, args.destination_space.as_deref(), args.destination_org.as_deref(), &user)
            .await?;

        ui.display_text(&format!(
            "Adding network policy from app {} to app {} {}",
            args.source_app, args.destination_app, destination.flavor
        ))?;
        let protocol = args.protocol.unwrap_or_default();
        let port = args.port.unwrap_or_default();
        let request = self.request(&args.source_app, &args.destination_app, &destination, protocol, port);
        let (result, warnings) = self.actor.add_network_policy(&request).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }

    /// `remove-network-policy`. A policy that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `-o` is given without `-s`, a precondition fails,
    /// or removal fails.
    pub async fn remove(&self, ui: &mut Ui, args: &RemoveNetworkPolicyArgs) -> Result<(), CliError> {
        if args.destination_org.is_some() && args.destination_space.is_none() {
            return Err(CliError::NetworkPolicyDestinationOrgWithoutSpace);
        }
        let user = preflight(self.config, self.actor, MIN_VERSION_NETWORKING, Requires::Space)?;
        let destination = self
            .destination(ui, args.destination_space.as_deref(), args.destination_org.as_deref(), &user)
            .await?;

        ui.display_text(&format!(
            "Removing network policy from app {} to app {} {}",
            args.source_app, args.destination_app, destination.flavor
        ))?;
        let request = self.request(&args.source_app, &args.destination_app, &destination, args.protocol, args.port);
        let (result, warnings) = self.actor.remove_network_policy(&request).await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(()) => {}
            Err(err @ ActionError::PolicyDoesNotExist) => ui.display_warning(&err.to_string())?,
            Err(err) => return Err(err.into()),
        }
        ui.display_ok()?;
        Ok(())
    }

    fn request<'r>(
        &'r self,
        source_app: &'r str,
        destination_app: &'r str,
        destination: &'r Destination,
        protocol: Protocol,
        port: PortRange,
    ) -> PolicyRequest<'r> {
        PolicyRequest {
            source_space_guid: &self.config.targeted_space().guid,
            source_app_name: source_app,
            destination_space_guid: &destination.space_guid,
            destination_app_name: destination_app,
            protocol: protocol.as_str(),
            start_port: port.start,
            end_port: port.end,
        }
    }

    /// `network-policies`, optionally only those from `--source`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails, the source app does not
    /// exist, or the policies cannot be listed.
    pub async fn list(&self, ui: &mut Ui, args: &NetworkPoliciesArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_NETWORKING, Requires::Space)?;
        let space_guid = &self.config.targeted_space().guid;

        let (result, warnings) = match &args.source {
            Some(source) => {
                ui.display_text(&format!(
                    "Listing network policies of app {source} {}",
                    flavor(self.config, &user)
                ))?;
                self.actor.network_policies_by_space_and_app_name(space_guid, source).await
            }
            None => {
                ui.display_text(&format!("Listing network policies {}", flavor(self.config, &user)))?;
                self.actor.network_policies_by_space(space_guid).await
            }
        };
        ui.display_warnings(&warnings)?;
        let policies = result?;

        ui.display_newline()?;
        let mut table = vec![
            [
                "source",
                "destination",
                "protocol",
                "ports",
                "destination space",
                "destination org",
            ]
            .map(String::from)
            .to_vec(),
        ];
        table.extend(policies.into_iter().map(|policy| {
            let ports = PortRange {
                start: policy.start_port,
                end: policy.end_port,
            };
            vec![
                policy.source_name,
                policy.destination_name,
                policy.protocol,
                ports.to_string(),
                policy.destination_space_name,
                policy.destination_org_name,
            ]
        }));
        ui.display_table("", &table, DEFAULT_TABLE_PADDING)?;
        Ok(())
    }
}
