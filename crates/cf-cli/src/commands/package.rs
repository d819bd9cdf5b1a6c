//! Packages and droplets: `v3-create-package`, `v3-packages`, `v3-stage`,
//! `v3-droplets` and `v3-set-droplet`.

use std::future::Future;
use std::path::{Path, PathBuf};

use cf_actor::resources::{DockerImageCredentials, Droplet, Package};
use cf_actor::{ActionOutcome, Actor};

use crate::cli::{AppNameArgs, CreatePackageArgs, SetDropletArgs, StageArgs};
use crate::commands::{CloudControllerActor, Requires, flavor, preflight, v3_preflight};
use crate::config::{Config, User};
use crate::error::CliError;
use crate::output::user_friendly_date_or_blank;
use crate::ui::{DEFAULT_TABLE_PADDING, Ui};
use crate::version::MIN_VERSION_V3;

/// Actor operations on packages and droplets.
pub trait PackageActor: CloudControllerActor {
    /// Create a docker package for an app.
    fn create_docker_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        image: &DockerImageCredentials,
    ) -> impl Future<Output = ActionOutcome<Package>> + Send;

    /// Zip a directory and upload it as a bits package.
    fn create_and_upload_bits_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        path: &Path,
    ) -> impl Future<Output = ActionOutcome<Package>> + Send;

    /// Stage a package and wait for its droplet.
    fn stage_package(&self, package_guid: &str) -> impl Future<Output = ActionOutcome<Droplet>> + Send;

    /// Point an app at a droplet.
    fn set_application_droplet_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        droplet_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send;

    /// Droplets of an app and the GUID of the current one.
    fn get_application_droplets(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<(Vec<Droplet>, Option<String>)>> + Send;

    /// Packages of an app.
    fn get_application_packages(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Vec<Package>>> + Send;
}

impl PackageActor for Actor {
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

    fn stage_package(&self, package_guid: &str) -> impl Future<Output = ActionOutcome<Droplet>> + Send {
        Actor::stage_package(self, package_guid)
    }

    fn set_application_droplet_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        droplet_guid: &str,
    ) -> impl Future<Output = ActionOutcome<()>> + Send {
        Actor::set_application_droplet_by_application_name_and_space(self, app_name, space_guid, droplet_guid)
    }

    fn get_application_droplets(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<(Vec<Droplet>, Option<String>)>> + Send {
        Actor::get_application_droplets(self, app_name, space_guid)
    }

    fn get_application_packages(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> impl Future<Output = ActionOutcome<Vec<Package>>> + Send {
        Actor::get_application_packages(self, app_name, space_guid)
    }
}

/// First line printed before a package is created.
pub(crate) fn package_setup_message(app_name: &str, docker: bool, flavor: &str) -> String {
    if docker {
        format!("Creating docker package for app {app_name} {flavor}")
    } else {
        format!("Uploading and creating bits package for app {app_name} {flavor}")
    }
}

/// Bits directory, defaulting to the working directory.
pub(crate) fn bits_path(path: Option<&PathBuf>) -> PathBuf {
    path.cloned().unwrap_or_else(|| PathBuf::from("."))
}

/// Package and droplet command executor.
pub struct PackageCommand<'a, A> {
    config: &'a Config,
    actor: &'a A,
}

impl<'a, A: PackageActor> PackageCommand<'a, A> {
    /// Create the command over a config and an actor.
    #[must_use]
    pub const fn new(config: &'a Config, actor: &'a A) -> Self {
        Self { config, actor }
    }

    fn space_guid(&self) -> &str {
        &self.config.targeted_space().guid
    }

    /// `v3-create-package`: a docker package with `-o`, otherwise a bits
    /// package from `-p` or the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if both `-o` and `-p` are given, a precondition
    /// fails, or the package cannot be created.
    pub async fn create(&self, ui: &mut Ui, args: &CreatePackageArgs) -> Result<(), CliError> {
        ui.display_experimental_warning()?;
        if args.docker_image.is_some() && args.app_path.is_some() {
            return Err(CliError::ArgumentCombination {
                args: vec!["--docker-image".into(), "-o".into(), "-p".into()],
            });
        }
        let user = preflight(self.config, self.actor, MIN_VERSION_V3, Requires::Space)?;

        ui.display_text(&package_setup_message(
            &args.app_name,
            args.docker_image.is_some(),
            &flavor(self.config, &user),
        ))?;
        let (result, warnings) = match &args.docker_image {
            Some(image) => {
                let credentials = DockerImageCredentials {
                    path: image.clone(),
                    ..Default::default()
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

        ui.display_text(&format!("Package with guid '{}' has been created.", package.guid))?;
        ui.display_ok()?;
        Ok(())
    }

    /// `v3-packages`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the app cannot be found.
    pub async fn packages(&self, ui: &mut Ui, args: &AppNameArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Listing packages of app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;

        let (result, warnings) = self
            .actor
            .get_application_packages(&args.app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        let packages = result?;

        ui.display_newline()?;
        if packages.is_empty() {
            ui.display_text("No packages found")?;
            return Ok(());
        }

        let mut table = vec![vec!["guid".to_string(), "state".to_string(), "created".to_string()]];
        table.extend(packages.iter().map(|package| {
            vec![
                package.guid.clone(),
                package.state.to_lowercase(),
                user_friendly_date_or_blank(package.created_at.as_ref()),
            ]
        }));
        ui.display_table("", &table, DEFAULT_TABLE_PADDING)?;
        Ok(())
    }

    /// `v3-stage`: build a droplet from a package.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or staging fails or times out.
    pub async fn stage(&self, ui: &mut Ui, args: &StageArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Staging package for {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;

        let (result, warnings) = self.actor.stage_package(&args.package_guid).await;
        ui.display_warnings(&warnings)?;
        let droplet = result?;

        ui.display_newline()?;
        ui.display_text("Package staged")?;
        ui.display_key_value_table(
            "",
            &[
                vec!["droplet guid:".to_string(), droplet.guid.clone()],
                vec!["state:".to_string(), droplet.state.to_lowercase()],
                vec![
                    "created:".to_string(),
                    user_friendly_date_or_blank(droplet.created_at.as_ref()),
                ],
            ],
        )?;
        Ok(())
    }

    /// `v3-droplets`, marking the current droplet.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the app cannot be found.
    pub async fn droplets(&self, ui: &mut Ui, args: &AppNameArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        ui.display_text(&format!(
            "Listing droplets of app {} {}",
            args.app_name,
            flavor(self.config, &user)
        ))?;

        let (result, warnings) = self
            .actor
            .get_application_droplets(&args.app_name, self.space_guid())
            .await;
        ui.display_warnings(&warnings)?;
        let (droplets, current) = result?;

        ui.display_newline()?;
        if droplets.is_empty() {
            ui.display_text("No droplets found")?;
            return Ok(());
        }

        let mut table = vec![vec!["guid".to_string(), "state".to_string(), "created".to_string()]];
        for droplet in &droplets {
            let guid = if current.as_deref() == Some(droplet.guid.as_str()) {
                format!("{} (current)", droplet.guid)
            } else {
                droplet.guid.clone()
            };
            table.push(vec![
                guid,
                droplet.state.to_lowercase(),
                user_friendly_date_or_blank(droplet.created_at.as_ref()),
            ]);
        }
        ui.display_table("", &table, DEFAULT_TABLE_PADDING)?;
        Ok(())
    }

    /// `v3-set-droplet`.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition fails or the droplet cannot be set.
    pub async fn set_droplet(&self, ui: &mut Ui, args: &SetDropletArgs) -> Result<(), CliError> {
        let user = v3_preflight(ui, self.config, self.actor, Requires::Space)?;
        self.display_setting_droplet(ui, &args.app_name, &args.droplet_guid, &user)?;

        let (result, warnings) = self
            .actor
            .set_application_droplet_by_application_name_and_space(&args.app_name, self.space_guid(), &args.droplet_guid)
            .await;
        ui.display_warnings(&warnings)?;
        result?;
        ui.display_ok()?;
        Ok(())
    }

    fn display_setting_droplet(&self, ui: &mut Ui, app_name: &str, droplet_guid: &str, user: &User) -> std::io::Result<()> {
        ui.display_text(&format!(
            "Setting app {app_name} to droplet {droplet_guid} {}",
            flavor(self.config, user)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{Calls, Canned, after_banner};
    use crate::config::tests::targeted_config;
    use cf_actor::ActionError;
    use chrono::{TimeZone, Utc};

    #[derive(Default)]
    struct FakePackageActor {
        calls: Calls,
        docker: Canned<Package>,
        bits: Canned<Package>,
        stage: Canned<Droplet>,
        set_droplet: Canned<()>,
        droplets: Canned<(Vec<Droplet>, Option<String>)>,
        packages: Canned<Vec<Package>>,
    }

    impl CloudControllerActor for FakePackageActor {
        fn cloud_controller_api_version(&self) -> &str {
            "3.27.0"
        }
    }

    impl PackageActor for FakePackageActor {
        async fn create_docker_package_by_application_name_and_space(
            &self,
            app_name: &str,
            space_guid: &str,
            image: &DockerImageCredentials,
        ) -> ActionOutcome<Package> {
            self.calls.record(format!("docker {app_name} {space_guid} {}", image.path));
            self.docker.take()
        }

        async fn create_and_upload_bits_package_by_application_name_and_space(
            &self,
            app_name: &str,
            space_guid: &str,
            path: &Path,
        ) -> ActionOutcome<Package> {
            self.calls
                .record(format!("bits {app_name} {space_guid} {}", path.display()));
            self.bits.take()
        }

        async fn stage_package(&self, package_guid: &str) -> ActionOutcome<Droplet> {
            self.calls.record(format!("stage {package_guid}"));
            self.stage.take()
        }

        async fn set_application_droplet_by_application_name_and_space(
            &self,
            app_name: &str,
            space_guid: &str,
            droplet_guid: &str,
        ) -> ActionOutcome<()> {
            self.calls.record(format!("set-droplet {app_name} {space_guid} {droplet_guid}"));
            self.set_droplet.take()
        }

        async fn get_application_droplets(
            &self,
            app_name: &str,
            _space_guid: &str,
        ) -> ActionOutcome<(Vec<Droplet>, Option<String>)> {
            self.calls.record(format!("droplets {app_name}"));
            self.droplets.take()
        }

        async fn get_application_packages(&self, app_name: &str, _space_guid: &str) -> ActionOutcome<Vec<Package>> {
            self.calls.record(format!("packages {app_name}"));
            self.packages.take()
        }
    }

    fn created() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 8, 14, 21, 16, 42).single().expect("date")
    }

    fn droplet(guid: &str, state: &str) -> Droplet {
        Droplet {
            guid: guid.into(),
            state: state.into(),
            created_at: Some(created()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_bits_package_defaults_to_working_dir() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        actor
            .bits
            .set(Ok(Package { guid: "pkg-guid".into(), ..Default::default() }), &["w"]);
        let (mut ui, captured) = Ui::for_test("");
        let args = CreatePackageArgs { app_name: "dora".into(), docker_image: None, app_path: None };

        PackageCommand::new(&config, &actor).create(&mut ui, &args).await.expect("create");

        assert_eq!(actor.calls.all(), vec!["bits dora some-space-guid ."]);
        assert_eq!(
            after_banner(&captured.out()),
            "Uploading and creating bits package for app dora in org some-org / space some-space as steve...\n\
             Package with guid 'pkg-guid' has been created.\nOK\n"
        );
    }

    #[tokio::test]
    async fn create_docker_package() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        let (mut ui, captured) = Ui::for_test("");
        let args = CreatePackageArgs {
            app_name: "dora".into(),
            docker_image: Some("cloudfoundry/diego-docker-app".into()),
            app_path: None,
        };

        PackageCommand::new(&config, &actor).create(&mut ui, &args).await.expect("create");

        assert_eq!(
            actor.calls.all(),
            vec!["docker dora some-space-guid cloudfoundry/diego-docker-app"]
        );
        assert!(after_banner(&captured.out()).starts_with("Creating docker package for app dora"));
    }

    #[tokio::test]
    async fn create_package_rejects_image_with_path_before_any_check() {
        let config = Config::default();
        let actor = FakePackageActor::default();
        let (mut ui, captured) = Ui::for_test("");
        let args = CreatePackageArgs {
            app_name: "dora".into(),
            docker_image: Some("img".into()),
            app_path: Some(PathBuf::from("./app")),
        };

        let err = PackageCommand::new(&config, &actor)
            .create(&mut ui, &args)
            .await
            .expect_err("combination");

        assert!(matches!(err, CliError::ArgumentCombination { .. }));
        assert!(actor.calls.all().is_empty());
        assert_eq!(after_banner(&captured.out()), "");
    }

    #[tokio::test]
    async fn stage_prints_droplet() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        actor.stage.set(Ok(droplet("droplet-guid", "STAGED")), &["stage-warning"]);
        let (mut ui, captured) = Ui::for_test("");
        let args = StageArgs { app_name: "dora".into(), package_guid: "pkg-guid".into() };

        PackageCommand::new(&config, &actor).stage(&mut ui, &args).await.expect("stage");

        assert_eq!(actor.calls.all(), vec!["stage pkg-guid"]);
        assert_eq!(
            after_banner(&captured.out()),
            "Staging package for dora in org some-org / space some-space as steve...\n\n\
             Package staged\n\
             droplet guid: droplet-guid\n\
             state:        staged\n\
             created:      Mon 14 Aug 21:16:42 UTC 2017\n"
        );
        assert_eq!(captured.err(), "stage-warning\n");
    }

    #[tokio::test]
    async fn stage_failure_propagates() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        actor
            .stage
            .set(Err(ActionError::StagingFailed { reason: "no buildpack".into() }), &[]);
        let (mut ui, captured) = Ui::for_test("");
        let args = StageArgs { app_name: "dora".into(), package_guid: "pkg-guid".into() };

        let err = PackageCommand::new(&config, &actor)
            .stage(&mut ui, &args)
            .await
            .expect_err("fails");

        assert_eq!(err.to_string(), "no buildpack");
        assert!(!after_banner(&captured.out()).contains("Package staged"));
    }

    #[tokio::test]
    async fn droplets_mark_current_in_order() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        actor.droplets.set(
            Ok((
                vec![droplet("d-new", "STAGED"), droplet("d-old", "FAILED")],
                Some("d-new".into()),
            )),
            &[],
        );
        let (mut ui, captured) = Ui::for_test("");
        let args = AppNameArgs { app_name: "dora".into() };

        PackageCommand::new(&config, &actor).droplets(&mut ui, &args).await.expect("droplets");

        let out = after_banner(&captured.out());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Listing droplets of app dora in org some-org / space some-space as steve...");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "guid              state    created");
        assert_eq!(lines[3], "d-new (current)   staged   Mon 14 Aug 21:16:42 UTC 2017");
        assert_eq!(lines[4], "d-old             failed   Mon 14 Aug 21:16:42 UTC 2017");
        assert_eq!(lines.len(), 5);
    }

    #[tokio::test]
    async fn droplets_empty() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        let (mut ui, captured) = Ui::for_test("");
        let args = AppNameArgs { app_name: "dora".into() };

        PackageCommand::new(&config, &actor).droplets(&mut ui, &args).await.expect("droplets");

        assert!(after_banner(&captured.out()).ends_with("\n\nNo droplets found\n"));
    }

    #[tokio::test]
    async fn packages_table() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        actor.packages.set(
            Ok(vec![Package {
                guid: "pkg-1".into(),
                state: "READY".into(),
                created_at: None,
                ..Default::default()
            }]),
            &["pkg-warning"],
        );
        let (mut ui, captured) = Ui::for_test("");
        let args = AppNameArgs { app_name: "dora".into() };

        PackageCommand::new(&config, &actor).packages(&mut ui, &args).await.expect("packages");

        let out = after_banner(&captured.out());
        assert!(out.contains("guid    state   created\npkg-1   ready\n"));
        assert_eq!(captured.err(), "pkg-warning\n");
    }

    #[tokio::test]
    async fn set_droplet() {
        let config = targeted_config();
        let actor = FakePackageActor::default();
        let (mut ui, captured) = Ui::for_test("");
        let args = SetDropletArgs { app_name: "dora".into(), droplet_guid: "d-1".into() };

        PackageCommand::new(&config, &actor).set_droplet(&mut ui, &args).await.expect("set");

        assert_eq!(actor.calls.all(), vec!["set-droplet dora some-space-guid d-1"]);
        assert_eq!(
            after_banner(&captured.out()),
            "Setting app dora to droplet d-1 in org some-org / space some-space as steve...\nOK\n"
        );
    }
}
