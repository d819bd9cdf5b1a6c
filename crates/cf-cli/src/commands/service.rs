//! `share-service` and `unshare-service`.

use std::future::Future;

use cf_actor::resources::Organization;
use cf_actor::{ActionError, ActionOutcome, Actor};

use crate::cli::{ShareServiceArgs, UnshareServiceArgs};
use crate::commands::{CloudControllerActor, Requires, preflight};
use crate::config::Config;
use crate::error::CliError;
use crate::ui::Ui;
use crate::version::MIN_VERSION_SHARE_SERVICE;

const UNSHARE_WARNING: &str = "WARNING: Unsharing this service instance will remove any service bindings that \
     exist in any spaces that this instance is shared into. This could cause applications to stop working.";

/// Actor operations on service instance sharing.
pub trait ServiceActor: CloudControllerActor {
    /// Look up an organization by name.
    fn get_organization_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<Organization>> + Send;

    /// Share an instance from the source space into another space.
    fn share_service_instance_to_space_and_org_by_name(
        &self,
        service_instance_name: &str,
        source_space_guid: &str,
        org_guid: &str,
        space_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Stop sharing an instance with a space.
    fn unshare_service_instance_by_service_instance_and_space(
        &self,
        service_instance_name: &str,
        source_space_guid: &str,
        org_guid: &str,
        org_name: &str,
        space_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;
}

impl ServiceActor for Actor {
    fn get_organization_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<Organization>> + Send {
        Actor::get_organization_by_name(self, name)
    }

    fn share_service_instance_to_space_and_org_by_name(
        &self,
        service_instance_name: &str,
        source_space_guid: &str,
        org_guid: &str,
        space_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::share_service_instance_to_space_and_org_by_name(
            self,
            service_instance_name,
            source_space_guid,
            org_guid,
            space_name,
        )
    }

    fn unshare_service_instance_by_service_instance_and_space(
        &self,
        service_instance_name: &str,
        source_space_guid: &str,
        org_guid: &str,
        org_name: &str,
        space_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::unshare_service_instance_by_service_instance_and_space(
            self,
            service_instance_name,
            source_space_guid,
            org_guid,
            org_name,
            space_name,
        )
    }
}

/// Service sharing command executor.
pub struct ServiceCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: ServiceActor> ServiceCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    /// The org named by `-o`, or the targeted one.
    async fn destination_org(&self, ui: &mut Ui, org: Option<&str>) -> Result<Organization, CliError> {
        let Some(name) = org else {
            let targeted = self.config.targeted_organization();
            return Ok(Organization {
                guid: targeted.guid.clone(),
                name: targeted.name.clone(),
            });
        };
        let (result, warnings) = self.actor.get_organization_by_name(name).await;
        ui.display_warnings(&warnings)?;
        Ok(result?)
    }

    /// `share-service`. Sharing into a space that already has the instance
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails, the org, space or instance
    /// does not exist, or sharing fails.
    pub async fn share(&self, ui: &mut Ui, args: &ShareServiceArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_SHARE_SERVICE, Requires::Space)?;
        let org = self.destination_org(ui, args.org.as_deref()).await?;

        ui.display_text(&format!(
            "Sharing service instance {} into org {} / space {} as {}...",
            args.service_instance, org.name, args.space, user.name
        ))?;
        let (result, warnings) = self
            .actor
            .share_service_instance_to_space_and_org_by_name(
                &args.service_instance,
                &self.config.targeted_space().guid,
                &org.guid,
                &args.space,
            )
            .await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(()) => {}
            Err(err @ ActionError::ServiceInstanceAlreadyShared) => ui.display_warning(&err.to_string())?,
            Err(err) => return Err(err.into()),
        }
        ui.display_ok()?;
        Ok(())
    }

    /// `unshare-service`. Warns and asks first unless forced; an instance
    /// that is not shared with the space is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails, the org, space or instance
    /// does not exist, or unsharing fails.
    pub async fn unshare(&self, ui: &mut Ui, args: &UnshareServiceArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_SHARE_SERVICE, Requires::Space)?;

        if !args.force {
            ui.display_warning(UNSHARE_WARNING)?;
            if !ui.display_bool_prompt(false, "Really unshare the service instance?")? {
                ui.display_text("Unshare cancelled")?;
                return Ok(());
            }
        }

        let org = self.destination_org(ui, args.org.as_deref()).await?;
        ui.display_text(&format!(
            "Unsharing service instance {} from org {} / space {} as {}...",
            args.service_instance, org.name, args.space, user.name
        ))?;
        let (result, warnings) = self
            .actor
            .unshare_service_instance_by_service_instance_and_space(
                &args.service_instance,
                &self.config.targeted_space().guid,
                &org.guid,
                &org.name,
                &args.space,
            )
            .await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(()) => {}
            Err(err @ ActionError::ServiceInstanceNotSharedToSpace { .. }) => ui.display_text(&err.to_string())?,
            Err(err) => return Err(err.into()),
        }
        ui.display_ok()?;
        Ok(())
    }
}
