//! Container networking policy client (`/networking/v1/external`).

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ccv3::{decode, execute};
use crate::error::CcError;
use crate::warnings::Warnings;

/// Policy source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySource {
    /// Source app guid.
    pub id: String,
}

/// Port range, inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ports {
    /// First port.
    pub start: u16,
    /// Last port.
    pub end: u16,
}

/// Policy destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDestination {
    /// Destination app guid.
    pub id: String,
    /// `tcp` or `udp`.
    pub protocol: String,
    /// Allowed ports.
    pub ports: Ports,
}

/// A policy as stored by the policy server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Source.
    pub source: PolicySource,
    /// Destination.
    pub destination: PolicyDestination,
}

#[derive(Debug, Deserialize)]
struct PolicyList {
    #[serde(default)]
    policies: Vec<Policy>,
}

/// Client for the external policy API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl Client {
    /// Create a client rooted at the `network_policy_v1` link.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{path}", self.base_url))
            .header(reqwest::header::AUTHORIZATION, &self.token)
    }

    /// Policies whose source or destination is one of `app_guids`.
    pub async fn list_policies(&self, app_guids: &[&str], warnings: &mut Warnings) -> Result<Vec<Policy>, CcError> {
        let mut request = self
            .http
            .get(format!("{}/policies", self.base_url))
            .header(reqwest::header::AUTHORIZATION, &self.token);
        if !app_guids.is_empty() {
            request = request.query(&[("id", app_guids.join(","))]);
        }
        let list: PolicyList = decode(execute(request, warnings).await?).await?;
        Ok(list.policies)
    }

    /// Create policies.
    pub async fn create_policies(&self, policies: &[Policy], warnings: &mut Warnings) -> Result<(), CcError> {
        let request = self.post("/policies").json(&json!({"policies": policies}));
        execute(request, warnings).await?;
        Ok(())
    }

    /// Delete policies.
    pub async fn remove_policies(&self, policies: &[Policy], warnings: &mut Warnings) -> Result<(), CcError> {
        let request = self
            .post("/policies/delete")
            .json(&json!({"policies": policies}));
        execute(request, warnings).await?;
        Ok(())
    }
}
