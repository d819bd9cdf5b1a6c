use std::path::{Path, PathBuf};

use tokio::time::{Instant, sleep};
use tracing::debug;

use super::{Actor, bits, deadline_after};
use crate::ActionOutcome;
use crate::error::{ActionError, CcError};
use crate::resources::{DockerImageCredentials, Droplet, Package};
use crate::warnings::Warnings;

const PACKAGE_READY: &str = "READY";
const PACKAGE_FAILED: &str = "FAILED";
const PACKAGE_EXPIRED: &str = "EXPIRED";
const BUILD_STAGED: &str = "STAGED";
const BUILD_FAILED: &str = "FAILED";

impl Actor {
    async fn poll_package(&self, mut package: Package, warnings: &mut Warnings) -> Result<Package, ActionError> {
        let deadline = deadline_after(self.settings.staging_timeout);
        loop {
            match package.state.as_str() {
                PACKAGE_READY => return Ok(package),
                PACKAGE_FAILED | PACKAGE_EXPIRED => {
                    return Err(ActionError::PackageProcessingFailed { guid: package.guid });
                }
                _ => {}
            }
            if Instant::now() >= deadline {
                return Err(ActionError::StagingTimeout);
            }
            sleep(self.settings.polling_interval).await;
            package = self.cc.get_package(&package.guid, warnings).await?;
        }
    }

    /// Create a docker package for an app and wait for it to be ready.
    pub async fn create_docker_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        image: &DockerImageCredentials,
    ) -> ActionOutcome<Package> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            let package = self
                .cc
                .create_docker_package(&app.guid, image, &mut warnings)
                .await?;
            self.poll_package(package, &mut warnings).await
        }
        .await;
        (result, warnings)
    }

    /// Archive `path`, upload it as a bits package and wait for processing.
    pub async fn create_and_upload_bits_package_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        path: &Path,
    ) -> ActionOutcome<Package> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            let package = self.cc.create_bits_package(&app.guid, &mut warnings).await?;

            let source: PathBuf = path.to_path_buf();
            let archive = tokio::task::spawn_blocking(move || bits::zip_directory(&source))
                .await
                .map_err(|err| ActionError::Archive(err.to_string()))??;
            debug!(package = %package.guid, bytes = archive.len(), "uploading bits");

            let package = self
                .cc
                .upload_package(&package.guid, archive, &mut warnings)
                .await?;
            self.poll_package(package, &mut warnings).await
        }
        .await;
        (result, warnings)
    }

    /// Stage a package and return the droplet it produced.
    pub async fn stage_package(&self, package_guid: &str) -> ActionOutcome<Droplet> {
        let mut warnings = Warnings::new();
        let result = async {
            let deadline = deadline_after(self.settings.staging_timeout);
            let mut build = self.cc.create_build(package_guid, &mut warnings).await?;
            loop {
                match build.state.as_str() {
                    BUILD_STAGED => {
                        let Some(droplet) = build.droplet else {
                            return Err(ActionError::StagingFailed {
                                reason: "build staged without a droplet".into(),
                            });
                        };
                        return Ok(self.cc.get_droplet(&droplet.guid, &mut warnings).await?);
                    }
                    BUILD_FAILED => {
                        return Err(ActionError::StagingFailed {
                            reason: build.error.unwrap_or_else(|| "staging failed".into()),
                        });
                    }
                    _ => {}
                }
                if Instant::now() >= deadline {
                    return Err(ActionError::StagingTimeout);
                }
                sleep(self.settings.polling_interval).await;
                build = self.cc.get_build(&build.guid, &mut warnings).await?;
            }
        }
        .await;
        (result, warnings)
    }

    /// Assign a droplet to an app.
    pub async fn set_application_droplet(&self, app_guid: &str, droplet_guid: &str) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .set_application_droplet(app_guid, droplet_guid, &mut warnings)
            .await
            .map(|_| ())
            .map_err(ActionError::from);
        (result, warnings)
    }

    /// Assign a droplet to an app looked up by name.
    pub async fn set_application_droplet_by_application_name_and_space(
        &self,
        app_name: &str,
        space_guid: &str,
        droplet_guid: &str,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            self.cc
                .set_application_droplet(&app.guid, droplet_guid, &mut warnings)
                .await
                .map(|_| ())
                .map_err(ActionError::from)
        }
        .await;
        (result, warnings)
    }

    /// Droplets of an app, with the current one (if any) identified.
    pub async fn get_application_droplets(
        &self,
        app_name: &str,
        space_guid: &str,
    ) -> ActionOutcome<(Vec<Droplet>, Option<String>)> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            let droplets = self.cc.get_application_droplets(&app.guid, &mut warnings).await?;
            let current = match self
                .cc
                .get_application_current_droplet(&app.guid, &mut warnings)
                .await
            {
                Ok(droplet) => Some(droplet.guid),
                Err(CcError::ResourceNotFound) => None,
                Err(err) => return Err(err.into()),
            };
            Ok::<_, ActionError>((droplets, current))
        }
        .await;
        (result, warnings)
    }

    /// Packages of an app.
    pub async fn get_application_packages(&self, app_name: &str, space_guid: &str) -> ActionOutcome<Vec<Package>> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            self.cc
                .get_application_packages(&app.guid, &mut warnings)
                .await
                .map_err(ActionError::from)
        }
        .await;
        (result, warnings)
    }
}
