use reqwest::multipart::{Form, Part};
use serde_json::json;

use super::{Client, decode};
use crate::error::CcError;
use crate::resources::{Build, DockerImageCredentials, Droplet, Package, Relationship};
use crate::warnings::Warnings;

impl Client {
    /// `POST /v3/packages` of type `bits`.
    pub async fn create_bits_package(&self, app_guid: &str, warnings: &mut Warnings) -> Result<Package, CcError> {
        let body = json!({
            "type": "bits",
            "relationships": {"app": Relationship::to(app_guid)},
        });
        self.post("/packages", &body, warnings).await
    }

    /// `POST /v3/packages` of type `docker`.
    pub async fn create_docker_package(
        &self,
        app_guid: &str,
        image: &DockerImageCredentials,
        warnings: &mut Warnings,
    ) -> Result<Package, CcError> {
        let mut data = json!({"image": image.path});
        if let Some(username) = &image.username {
            data["username"] = json!(username);
            data["password"] = json!(image.password.clone().unwrap_or_default());
        }
        let body = json!({
            "type": "docker",
            "data": data,
            "relationships": {"app": Relationship::to(app_guid)},
        });
        self.post("/packages", &body, warnings).await
    }

    /// `GET /v3/packages/:guid`
    pub async fn get_package(&self, package_guid: &str, warnings: &mut Warnings) -> Result<Package, CcError> {
        self.get(&format!("/packages/{package_guid}"), &[], warnings).await
    }

    /// `POST /v3/packages/:guid/upload` with a zip archive as the `bits` part.
    pub async fn upload_package(
        &self,
        package_guid: &str,
        archive: Vec<u8>,
        warnings: &mut Warnings,
    ) -> Result<Package, CcError> {
        let part = Part::bytes(archive)
            .file_name("package.zip")
            .mime_str("application/zip")?;
        let form = Form::new().part("bits", part);
        let response = self
            .upload(&format!("/packages/{package_guid}/upload"), form, warnings)
            .await?;
        decode(response).await
    }

    /// `POST /v3/builds`
    pub async fn create_build(&self, package_guid: &str, warnings: &mut Warnings) -> Result<Build, CcError> {
        let body = json!({"package": {"guid": package_guid}});
        self.post("/builds", &body, warnings).await
    }

    /// `GET /v3/builds/:guid`
    pub async fn get_build(&self, build_guid: &str, warnings: &mut Warnings) -> Result<Build, CcError> {
        self.get(&format!("/builds/{build_guid}"), &[], warnings).await
    }

    /// `GET /v3/droplets/:guid`
    pub async fn get_droplet(&self, droplet_guid: &str, warnings: &mut Warnings) -> Result<Droplet, CcError> {
        self.get(&format!("/droplets/{droplet_guid}"), &[], warnings).await
    }
}
