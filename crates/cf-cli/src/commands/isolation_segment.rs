//! Isolation segments, org entitlements and space assignments.

use std::future::Future;

use cf_actor::resources::{IsolationSegment, IsolationSegmentSummary};
use cf_actor::{ActionError, ActionOutcome, Actor};

use crate::cli::{
    DeleteSegmentArgs, OrgNameArgs, OrgSegmentArgs, SegmentNameArgs, SpaceNameArgs, SpaceSegmentArgs,
};
use crate::commands::{CloudControllerActor, Requires, preflight};
use crate::config::{Config, User};
use crate::error::CliError;
use crate::ui::{DEFAULT_TABLE_PADDING, Ui};
use crate::version::MIN_VERSION_ISOLATION_SEGMENT;

const RESTART_NOTE: &str =
    "In order to move running applications to this isolation segment, they must be restarted.";

/// Actor operations on isolation segments.
pub trait IsolationSegmentActor: CloudControllerActor {
    /// All segments with their entitled orgs.
    fn get_isolation_segment_summaries(&self) -> impl Future<Output = ActionOutcome<Vec<IsolationSegmentSummary>>> + Send;

    /// Create a segment.
    fn create_isolation_segment_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<IsolationSegment>> + Send;

    /// Delete a segment.
    fn delete_isolation_segment_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Entitle an org to a segment.
    fn entitle_isolation_segment_to_organization_by_name(
        &self,
        segment_name: &str,
        org_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Revoke an org's entitlement.
    fn delete_isolation_segment_organization_by_name(
        &self,
        segment_name: &str,
        org_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Set an org's default segment.
    fn set_organization_default_isolation_segment(
        &self,
        org_name: &str,
        segment_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Clear an org's default segment.
    fn reset_organization_default_isolation_segment(&self, org_name: &str) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Assign a segment to a space.
    fn assign_isolation_segment_to_space_by_name_and_space(
        &self,
        segment_name: &str,
        space_name: &str,
        org_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Clear a space's segment, returning the org default's name.
    fn reset_space_isolation_segment(
        &self,
        org_guid: &str,
        space_name: &str,
    ) -> impl Future<Output = ActionOutcome<String>> + Send;
}

impl IsolationSegmentActor for Actor {
    fn get_isolation_segment_summaries(&self) -> impl Future<Output = ActionOutcome<Vec<IsolationSegmentSummary>>> + Send {
        Actor::get_isolation_segment_summaries(self)
    }

    fn create_isolation_segment_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<IsolationSegment>> + Send {
        Actor::create_isolation_segment_by_name(self, name)
    }

    fn delete_isolation_segment_by_name(&self, name: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::delete_isolation_segment_by_name(self, name)
    }

    fn entitle_isolation_segment_to_organization_by_name(
        &self,
        segment_name: &str,
        org_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::entitle_isolation_segment_to_organization_by_name(self, segment_name, org_name)
    }

    fn delete_isolation_segment_organization_by_name(
        &self,
        segment_name: &str,
        org_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::delete_isolation_segment_organization_by_name(self, segment_name, org_name)
    }

    fn set_organization_default_isolation_segment(
        &self,
        org_name: &str,
        segment_name: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::set_organization_default_isolation_segment(self, org_name, segment_name)
    }

    fn reset_organization_default_isolation_segment(&self, org_name: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::reset_organization_default_isolation_segment(self, org_name)
    }

    fn assign_isolation_segment_to_space_by_name_and_space(
        &self,
        segment_name: &str,
        space_name: &str,
        org_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::assign_isolation_segment_to_space_by_name_and_space(self, segment_name, space_name, org_guid)
    }

    fn reset_space_isolation_segment(
        &self,
        org_guid: &str,
        space_name: &str,
    ) -> impl Future<Output = ActionOutcome<String>> + Send {
        Actor::reset_space_isolation_segment(self, org_guid, space_name)
    }
}

/// Isolation segment command executor.
pub struct IsolationSegmentCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: IsolationSegmentActor> IsolationSegmentCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    fn logged_in(&self) -> Result<User, CliError> {
        preflight(self.config, self.actor, MIN_VERSION_ISOLATION_SEGMENT, Requires::Login)
    }

    /// `isolation-segments`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the segments cannot be listed.
    pub async fn list(&self, ui: &mut Ui) -> Result<(), CliError> {
        let user = self.logged_in()?;
        ui.display_text(&format!("Getting isolation segments as {}...", user.name))?;

        let (result, warnings) = self.actor.get_isolation_segment_summaries().await;
        ui.display_warnings(&warnings)?;
        let summaries = result?;
        ui.display_ok()?;
        ui.display_newline()?;

        let mut table = vec![vec!["name".to_string(), "orgs".to_string()]];
        table.extend(
            summaries
                .into_iter()
                .map(|summary| vec![summary.name, summary.entitled_orgs.join(", ")]),
        );
        ui.display_table("", &table, DEFAULT_TABLE_PADDING)?;
        Ok(())
    }

    /// `create-isolation-segment`. An existing segment is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or creation fails.
    pub async fn create(&self, ui: &mut Ui, args: &SegmentNameArgs) -> Result<(), CliError> {
        let user = self.logged_in()?;
        ui.display_text(&format!(
            "Creating isolation segment {} as {}...",
            args.segment_name, user.name
        ))?;

        let (result, warnings) = self.actor.create_isolation_segment_by_name(&args.segment_name).await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(_) => {}
            Err(ActionError::IsolationSegmentAlreadyExists { name }) => {
                ui.display_warning(&format!("Isolation segment {name} already exists."))?;
            }
            Err(err) => return Err(err.into()),
        }
        ui.display_ok()?;
        Ok(())
    }

    /// `delete-isolation-segment`. Asks first unless forced; a missing
    /// segment is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or deletion fails.
    pub async fn delete(&self, ui: &mut Ui, args: &DeleteSegmentArgs) -> Result<(), CliError> {
        let user = self.logged_in()?;

        if !args.force {
            let prompt = format!("Really delete the isolation segment {}?", args.segment_name);
            if !ui.display_bool_prompt(false, &prompt)? {
                ui.display_text("Delete cancelled")?;
                return Ok(());
            }
        }

        ui.display_text(&format!(
            "Deleting isolation segment {} as {}...",
            args.segment_name, user.name
        ))?;
        let (result, warnings) = self.actor.delete_isolation_segment_by_name(&args.segment_name).await;
        ui.display_warnings(&warnings)?;
        match result {
            Ok(()) => {}
            Err(ActionError::IsolationSegmentNotFound { name }) => {
                ui.display_warning(&format!("Isolation segment {name} does not exist."))?;
            }
            Err(err) => return Err(err.into()),
        }
        ui.display_ok()?;
        Ok(())
    }

    /// `enable-org-isolation`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the org or segment does not exist.
    pub async fn enable_org(&self, ui: &mut Ui, args: &OrgSegmentArgs) -> Result<(), CliError> {
        let user = self.logged_in()?;
        ui.display_text(&format!(
            "Enabling isolation segment {} for org {} as {}...",
            args.segment_name, args.organization_name, user.name
        ))?;

        let (result, warnings) = self
            .actor
            .entitle_isolation_segment_to_organization_by_name(&args.segment_name, &args.organization_name)
            .await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }

    /// `disable-org-isolation`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the entitlement cannot be removed.
    pub async fn disable_org(&self, ui: &mut Ui, args: &OrgSegmentArgs) -> Result<(), CliError> {
        let user = self.logged_in()?;
        ui.display_text(&format!(
            "Removing entitlement to isolation segment {} from org {} as {}...",
            args.segment_name, args.organization_name, user.name
        ))?;

        let (result, warnings) = self
            .actor
            .delete_isolation_segment_organization_by_name(&args.segment_name, &args.organization_name)
            .await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }

    /// `set-org-default-isolation-segment`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the default cannot be set.
    pub async fn set_org_default(&self, ui: &mut Ui, args: &OrgSegmentArgs) -> Result<(), CliError> {
        let user = self.logged_in()?;
        ui.display_text(&format!(
            "Setting isolation segment {} to default on org {} as {}...",
            args.segment_name, args.organization_name, user.name
        ))?;

        let (result, warnings) = self
            .actor
            .set_organization_default_isolation_segment(&args.organization_name, &args.segment_name)
            .await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        ui.display_newline()?;
        ui.display_text(RESTART_NOTE)?;
        Ok(())
    }

    /// `reset-org-default-isolation-segment`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the default cannot be cleared.
    pub async fn reset_org_default(&self, ui: &mut Ui, args: &OrgNameArgs) -> Result<(), CliError> {
        let user = self.logged_in()?;
        ui.display_text(&format!(
            "Resetting default isolation segment of org {} as {}...",
            args.organization_name, user.name
        ))?;

        let (result, warnings) = self
            .actor
            .reset_organization_default_isolation_segment(&args.organization_name)
            .await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        ui.display_newline()?;
        ui.display_text(
            "Applications in spaces of this org that have no isolation segment assigned \
             will be placed in the platform default isolation segment.",
        )?;
        ui.display_text("Running applications need a restart to be moved there.")?;
        Ok(())
    }

    /// `set-space-isolation-segment`, within the targeted org.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the assignment fails.
    pub async fn set_space(&self, ui: &mut Ui, args: &SpaceSegmentArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_ISOLATION_SEGMENT, Requires::Org)?;
        let org = self.config.targeted_organization();
        ui.display_text(&format!(
            "Updating isolation segment of space {} in org {} as {}...",
            args.space_name, org.name, user.name
        ))?;

        let (result, warnings) = self
            .actor
            .assign_isolation_segment_to_space_by_name_and_space(&args.segment_name, &args.space_name, &org.guid)
            .await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        ui.display_newline()?;
        ui.display_text(RESTART_NOTE)?;
        Ok(())
    }

    /// `reset-space-isolation-segment`, within the targeted org. Reports which
    /// segment the space falls back to.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the reset fails.
    pub async fn reset_space(&self, ui: &mut Ui, args: &SpaceNameArgs) -> Result<(), CliError> {
        let user = preflight(self.config, self.actor, MIN_VERSION_ISOLATION_SEGMENT, Requires::Org)?;
        let org = self.config.targeted_organization();
        ui.display_text(&format!(
            "Resetting isolation segment assignment of space {} in org {} as {}...",
            args.space_name, org.name, user.name
        ))?;

        let (result, warnings) = self
            .actor
            .reset_space_isolation_segment(&org.guid, &args.space_name)
            .await;
        ui.display_warnings(&warnings)?;
        let default_segment = result?;
        ui.display_ok()?;
        ui.display_newline()?;
        if default_segment.is_empty() {
            ui.display_text("Applications in this space will be placed in the platform default isolation segment.")?;
        } else {
            ui.display_text(&format!(
                "Applications in this space will be placed in isolation segment {default_segment}."
            ))?;
        }
        ui.display_text("Running applications need a restart to be moved there.")?;
        Ok(())
    }
}
