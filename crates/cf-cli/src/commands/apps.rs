//! `v3-apps` and `v3-app`.

use std::future::Future;

use cf_actor::resources::{Application, ApplicationSummary};
use cf_actor::{ActionOutcome, Actor};

use crate::cli::AppShowArgs;
use crate::commands::{CloudControllerActor, Requires, flavor, v3_preflight};
use crate::config::Config;
use crate::error::CliError;
use crate::output::{display_app_summary, process_ratios};
use crate::ui::{DEFAULT_TABLE_PADDING, Ui};

/// Actor operations used to show apps.
pub trait AppSummaryActor: CloudControllerActor {
    /// Summaries of every app in a space.
    fn get_application_summaries_by_space(
        &self,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Vec<ApplicationSummary>>> + Send;

    /// Summary of one app.
    fn get_application_summary_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<ApplicationSummary>> + Send;

    /// Look up an app by name.
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send;
}

impl AppSummaryActor for Actor {
    fn get_application_summaries_by_space(
        &self,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Vec<ApplicationSummary>>> + Send {
        Actor::get_application_summaries_by_space(self, space_guid)
    }

    fn get_application_summary_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<ApplicationSummary>> + Send {
        Actor::get_application_summary_by_name_and_space(self, app_name, space_guid)
    }

    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::get_application_by_name_and_space(self, app_name, space_guid)
    }
}

/// Listing and showing apps.
pub struct AppsCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: AppSummaryActor> AppsCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    /// `v3-apps`: one row per app in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the apps cannot be listed.
    pub async fn list(&self, ui: &mut Ui) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Getting apps {}",
            flavor(self.config, &user)
        ))?;
        ui.display_newline()?;

        let (result, warnings) = self
            .actor
            .get_application_summaries_by_space(&self.config.targeted_space().guid)
            .await;
        ui.display_warnings(&warnings)?;
        let summaries = result?;

        if summaries.is_empty() {
            ui.display_text("No apps found")?;
            return Ok(());
        }

        let mut table = vec![vec![
            "name".to_string(),
            "requested state".to_string(),
            "processes".to_string(),
            "routes".to_string(),
        ]];
        for summary in &summaries {
            table.push(vec![
                summary.application.name.clone(),
                summary.application.state.as_str().to_string(),
                process_ratios(&summary.processes_web_first()),
                summary
                    .routes
                    .iter()
                    .map(|route| route.url.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ]);
        }
        ui.display_table("", &table, DEFAULT_TABLE_PADDING)?;
        Ok(())
    }

    /// `v3-app`: health and status of one app, or just its GUID.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the app cannot be found.
    pub async fn show(&self, ui: &mut Ui, args: &AppShowArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        let space_guid = &self.config.targeted_space().guid;

        if args.guid {
            let (result, warnings) = self
                .actor
                .get_application_by_name_and_space(&args.app_name, space_guid)
                .await;
            ui.display_warnings(&warnings)?;
            ui.display_text(&result?.guid)?;
            return Ok(());
        }

        ui.display_text(&format!(
            "Showing health and status for app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;
        ui.display_newline()?;

        let (result, warnings) = self
            .actor
            .get_application_summary_by_name_and_space(&args.app_name, space_guid)
            .await;
        ui.display_warnings(&warnings)?;
        display_app_summary(ui, &result?)?;
        Ok(())
    }
}
