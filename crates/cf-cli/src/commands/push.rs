//! `v3-push`: create or update an app, upload a package, stage it, map a
//! default route, start the app and show its summary.

use std::future::Future;
use std::path::Path;

use tokio::sync::mpsc::{self, UnboundedSender};

use cf_actor::actor::new_application;
use cf_actor::resources::{Application, ApplicationSummary, DockerImageCredentials, Droplet, LifecycleType, Package};
use cf_actor::{ActionError, ActionOutcome, Actor, Warnings};

use crate::cli::PushArgs;
use crate::commands::package::{bits_path, package_setup_message};
use crate::commands::{CloudControllerActor, Requires, flavor, preflight, relay_warnings};
use crate::config::{Config, User};
use crate::error::CliError;
use crate::output::display_app_summary;
use crate::ui::{EXPERIMENTAL_WARNING, Ui};
use crate::version::MIN_VERSION_V3;

/// Actor operations used by push.
pub trait PushActor: CloudControllerActor {
    /// Look up an app by name.
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send;

    /// Create an app.
    fn create_application_in_space(
        &self,
        app: &Application,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send;

    /// Update an app's lifecycle.
    fn update_application(&self, app: &Application) -> impl Future<Output = ActionOutcome<Application>> + Send;

    /// Create a docker package.
    fn create_docker_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        image: &DockerImageCredentials,
    ) -> impl Future<Output = ActionOutcome<Package>> + Send;

    /// Zip and upload a bits package.
    fn create_and_upload_bits_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        path: &Path,
    ) -> impl Future<Output = ActionOutcome<Package>> + Send;

    /// Stop an app.
    fn stop_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Stage a package.
    fn stage_package(&self, package_guid: &str) -> impl Future<Output = ActionOutcome<Droplet>> + Send;

    /// Point an app at a droplet.
    fn set_application_droplet(
        &self,
        app_guid: &str,
        droplet_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Make sure the app's default route exists and is mapped.
    fn create_and_map_default_application_route(
        &self,
        org_guid: &str,
        space_guid: &str,
        app: &Application,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Start an app.
    fn start_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Wait for the app's processes to run.
    fn poll_start(
        &self,
        app: &Application,
        warnings_tx: UnboundedSender<Warnings>,
    ) -> impl Future<Output = Result<(), ActionError>> + Send;

    /// Summary shown at the end.
    fn get_application_summary_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<ApplicationSummary>> + Send;
}

impl PushActor for Actor {
    fn get_application_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::get_application_by_name_and_space(self, app_name, space_guid)
    }

    fn create_application_in_space(
        &self,
        app: &Application,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::create_application_in_space(self, app, space_guid)
    }

    fn update_application(&self, app: &Application) -> impl Future<Output = ActionOutcome<Application>> + Send {
        Actor::update_application(self, app)
    }

    fn create_docker_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        image: &DockerImageCredentials,
    ) -> impl Future<Output = ActionOutcome<Package>> + Send {
        Actor::create_docker_package_by_application_name_and_space(self, app_name, space_guid, image)
    }

    fn create_and_upload_bits_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        path: &Path,
    ) -> impl Future<Output = ActionOutcome<Package>> + Send {
        Actor::create_and_upload_bits_package_by_application_name_and_space(self, app_name, space_guid, path)
    }

    fn stop_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::stop_application(self, app_guid)
    }

    fn stage_package(&self, package_guid: &str) -> impl Future<Output = ActionOutcome<Droplet>> + Send {
        Actor::stage_package(self, package_guid)
    }

    fn set_application_droplet(
        &self,
        app_guid: &str,
        droplet_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::set_application_droplet(self, app_guid, droplet_guid)
    }

    fn create_and_map_default_application_route(
        &self,
        org_guid: &str,
        space_guid: &str,
        app: &Application,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::create_and_map_default_application_route(self, org_guid, space_guid, app)
    }

    fn start_application(&self, app_guid: &str) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::start_application(self, app_guid)
    }

    fn poll_start(
        &self,
        app: &Application,
        warnings_tx: UnboundedSender<Warnings>,
    ) -> impl Future<Output = Result<(), ActionError>> + Send {
        Actor::poll_start(self, app, warnings_tx)
    }

    fn get_application_summary_by_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<ApplicationSummary>> + Send {
        Actor::get_application_summary_by_name_and_space(self, app_name, space_guid)
    }
}

/// `default` and `null` only make sense on their own.
fn verify_buildpacks(buildpacks: &[String]) -> Result<(), CliError> {
    if buildpacks.len() >= 2 && buildpacks.iter().any(|bp| bp == "default" || bp == "null") {
        return Err(CliError::ConflictingBuildpacks);
    }
    Ok(())
}

/// Push command executor.
pub struct PushCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: PushActor> PushCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    fn space_guid(&self) -> &str {
        &self.config.targeted_space().guid
    }

    fn validate_args(&self, args: &PushArgs) -> Result<(), CliError> {
        if args.docker_image.is_some() && args.app_path.is_some() {
            return Err(CliError::ArgumentCombination {
                args: vec!["--docker-image".into(), "-o".into(), "-p".into()],
            });
        }
        if args.docker_image.is_some() && !args.buildpacks.is_empty() {
            return Err(CliError::ArgumentCombination {
                args: vec!["-b".into(), "--docker-image".into(), "-o".into()],
            });
        }
        if args.docker_username.is_some() {
            if args.docker_image.is_none() {
                return Err(CliError::RequiredFlags {
                    arg1: "--docker-image, -o".into(),
                    arg2: "--docker-username".into(),
                });
            }
            if self.config.docker_password().is_empty() {
                return Err(CliError::DockerPasswordNotSet);
            }
        }
        Ok(())
    }

    /// `v3-push`.
    ///
    /// An app that already exists is updated in place and, if running,
    /// stopped before the new droplet is staged. With `--no-start` the flow
    /// ends after the package is uploaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the flags conflict, a precondition fails, or any
    /// step of the flow fails. Nothing after the failing step runs.
    pub async fn push(&self, ui: &mut Ui, args: &PushArgs) -> Result<(), CliError> {
        ui.display_warning(EXPERIMENTAL_WARNING)?;
        self.validate_args(args)?;
        let user = preflight(self.config, self.actor, MIN_VERSION_V3, Requires::Space)?;
        verify_buildpacks(&args.buildpacks)?;

        let (result, warnings) = self
            .actor
            .get_application_by_name_and_space(&args.app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        let app = match result {
            Ok(existing) => self.update_application(ui, args, &existing, &user).await?,
            Err(ActionError::ApplicationNotFound { .. }) => self.create_application(ui, args, &user).await?,
            Err(err) => return Err(err.into()),
        };

        let package = self.create_package(ui, args, &user).await?;

        if app.started() {
            self.announce(ui, "Stopping app", &args.app_name, &user)?;
            let (result, warnings) = self.actor.stop_application(&app.guid).await;
            ui.display_warnings(&warnings)?;
            result?;
            ui.display_ok()?;
            ui.display_newline()?;
        }

        if args.no_start {
            return Ok(());
        }

        self.announce(ui, "Staging package for app", &args.app_name, &user)?;
        let (result, warnings) = self.actor.stage_package(&package.guid).await;
        ui.display_warnings(&warnings)?;
        let droplet = result?;
        ui.display_ok()?;

        ui.display_text(&format!(
            "Setting app {} to droplet {} {}",
            args.app_name,
            droplet.guid,
            flavor(self.config, &user)
        ))?;
        let (result, warnings) = self.actor.set_application_droplet(&app.guid, &droplet.guid).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;

        if !args.no_route {
            ui.display_text("Mapping routes...")?;
            let (result, warnings) = self
                .actor
                .create_and_map_default_application_route(
                    &self.config.targeted_organization().guid,
                    self.space_guid(),
                    &app,
                )
                .await;
            ui.display_warnings(&warnings)?;
            result?;
            ui.display_ok()?;
        }

        self.announce(ui, "Starting app", &args.app_name, &user)?;
        let (result, warnings) = self.actor.start_application(&app.guid).await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;

        ui.display_text("Waiting for app to start...")?;
        let (tx, rx) = mpsc::unbounded_channel();
        relay_warnings(ui, rx, self.actor.poll_start(&app, tx)).await?;

        ui.display_text(&format!(
            "Showing health and status for app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;
        ui.display_newline()?;
        let (result, warnings) = self
            .actor
            .get_application_summary_by_name_and_space(&args.app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        display_app_summary(ui, &result?)?;
        Ok(())
    }

    fn announce(&self, ui: &mut Ui, action: &str, app_name: &str, user: &User) -> std::io::Result<()> {
        ui.display_text(&format!("{action} {app_name} {}", flavor(self.config, user)))
    }

    fn lifecycle_for(args: &PushArgs, app: &mut Application) {
        if args.docker_image.is_some() {
            app.lifecycle.kind = LifecycleType::Docker;
        } else {
            app.lifecycle.kind = LifecycleType::Buildpack;
            app.lifecycle.data.buildpacks.clone_from(&args.buildpacks);
        }
    }

    async fn create_application(&self, ui: &mut Ui, args: &PushArgs, user: &User) -> Result<Application, CliError> {
        let mut app = new_application(&args.app_name, LifecycleType::Buildpack);
        Self::lifecycle_for(args, &mut app);

        let (result, warnings) = self.actor.create_application_in_space(&app, self.space_guid()).await;
        ui.display_warnings(&warnings)?;
        let created = result?;

        self.announce(ui, "Creating app", &args.app_name, user)?;
        ui.display_ok()?;
        Ok(created)
    }

    async fn update_application(
        &self,
        ui: &mut Ui,
        args: &PushArgs,
        existing: &Application,
        user: &User,
    ) -> Result<Application, CliError> {
        self.announce(ui, "Updating app", &args.app_name, user)?;

        let mut app = Application {
            guid: existing.guid.clone(),
            ..Default::default()
        };
        Self::lifecycle_for(args, &mut app);

        let (result, warnings) = self.actor.update_application(&app).await;
        ui.display_warnings(&warnings)?;
        let updated = result?;
        ui.display_ok()?;
        Ok(updated)
    }

    async fn create_package(&self, ui: &mut Ui, args: &PushArgs, user: &User) -> Result<Package, CliError> {
        ui.display_text(&package_setup_message(
            &args.app_name,
            args.docker_image.is_some(),
            &flavor(self.config, user),
        ))?;

        let (result, warnings) = match &args.docker_image {
            Some(image) => {
                let credentials = DockerImageCredentials {
                    path: image.clone(),
                    username: args.docker_username.clone(),
                    password: args
                        .docker_username
                        .as_ref()
                        .map(|_| self.config.docker_password().to_string()),
                };
                self.actor
                    .create_docker_package_by_application_name_and_space(&args.app_name, self.space_guid(), &credentials)
                    .await
            }
            None => {
                let path = bits_path(args.app_path.as_ref());
                self.actor
                    .create_and_upload_bits_package_by_application_name_and_space(&args.app_name, self.space_guid(), &path)
                    .await
            }
        };
        ui.display_warnings(&warnings)?;
        let package = result?;
        ui.display_ok()?;
        Ok(package)
    }
}
