//! Cloud controller v3 client.
//!
//! Thin typed wrappers over `reqwest`. Every call appends the response's
//! `X-Cf-Warnings` to the caller's [`Warnings`], including on failure, and maps
//! non-success statuses onto [`CcError`].

mod application;
mod isolation_segment;
mod organization;
mod package;
mod service_instance;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::CcError;
use crate::warnings::{self, Warnings};

pub use application::{EnvironmentVariables, ScaleRequest};

/// Settings for building the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Accept any TLS certificate.
    pub skip_ssl_validation: bool,
    /// TCP connect timeout.
    pub dial_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            skip_ssl_validation: false,
            dial_timeout: Duration::from_secs(5),
            user_agent: concat!("cf3/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Build the shared HTTP client used by every API client.
pub fn http_client(settings: &ClientSettings) -> Result<reqwest::Client, CcError> {
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(settings.skip_ssl_validation)
        .connect_timeout(settings.dial_timeout)
        .user_agent(settings.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// A link from the root document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiLink {
    /// Absolute URL.
    pub href: String,
    /// Link metadata.
    #[serde(default)]
    pub meta: LinkMeta,
}

/// Metadata attached to a root link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LinkMeta {
    /// API version behind the link.
    #[serde(default)]
    pub version: Option<String>,
}

/// The API root document (`GET /`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RootInfo {
    /// Advertised APIs.
    #[serde(default)]
    pub links: RootLinks,
}

/// Links in the root document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RootLinks {
    /// Cloud controller v3.
    #[serde(default)]
    pub cloud_controller_v3: Option<ApiLink>,
    /// Container networking policy server.
    #[serde(default)]
    pub network_policy_v1: Option<ApiLink>,
}

impl RootInfo {
    /// Version of the v3 API, or empty if not advertised.
    pub fn v3_version(&self) -> &str {
        self.links
            .cloud_controller_v3
            .as_ref()
            .and_then(|link| link.meta.version.as_deref())
            .unwrap_or_default()
    }
}

/// Fetch the root document of `target`.
pub async fn root_info(http: &reqwest::Client, target: &str) -> Result<RootInfo, CcError> {
    let url = format!("{}/", target.trim_end_matches('/'));
    let mut ignored = Warnings::new();
    let response = execute(http.get(&url), &mut ignored).await?;
    decode(response).await
}

/// A cloud controller v3 client bound to one target and token.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    pagination: Pagination,
    resources: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<Href>,
}

#[derive(Debug, Deserialize)]
struct Href {
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

/// Query parameters as `(name, value)` pairs.
pub type Query<'a> = [(&'a str, String)];

impl Client {
    /// Create a client for the v3 API rooted at `base_url` (e.g. `https://api.example.com/v3`).
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// The v3 root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.http.request(method, url);
        if self.token.is_empty() {
            request
        } else {
            request.header(reqwest::header::AUTHORIZATION, &self.token)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
        warnings: &mut Warnings,
    ) -> Result<T, CcError> {
        let request = self.request(Method::GET, &self.url(path)).query(query);
        decode(execute(request, warnings).await?).await
    }

    /// GET every page of a paginated collection.
    pub(crate) async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
        warnings: &mut Warnings,
    ) -> Result<Vec<T>, CcError> {
        let first = self.request(Method::GET, &self.url(path)).query(query);
        let mut page: Page<T> = decode(execute(first, warnings).await?).await?;
        let mut resources = std::mem::take(&mut page.resources);

        while let Some(next) = page.pagination.next.take() {
            trace!(url = %next.href, "following pagination");
            let request = self.request(Method::GET, &next.href);
            page = decode(execute(request, warnings).await?).await?;
            resources.append(&mut page.resources);
        }
        Ok(resources)
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        warnings: &mut Warnings,
    ) -> Result<T, CcError> {
        let request = self.request(Method::POST, &self.url(path)).json(body);
        decode(execute(request, warnings).await?).await
    }

    /// POST without a body, ignoring whatever comes back.
    pub(crate) async fn post_action(&self, path: &str, warnings: &mut Warnings) -> Result<(), CcError> {
        let request = self.request(Method::POST, &self.url(path));
        execute(request, warnings).await?;
        Ok(())
    }

    pub(crate) async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        warnings: &mut Warnings,
    ) -> Result<T, CcError> {
        let request = self.request(Method::PATCH, &self.url(path)).json(body);
        decode(execute(request, warnings).await?).await
    }

    pub(crate) async fn delete(&self, path: &str, warnings: &mut Warnings) -> Result<(), CcError> {
        let request = self.request(Method::DELETE, &self.url(path));
        execute(request, warnings).await?;
        Ok(())
    }

    pub(crate) async fn upload(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        warnings: &mut Warnings,
    ) -> Result<Response, CcError> {
        let request = self.request(Method::POST, &self.url(path)).multipart(form);
        execute(request, warnings).await
    }
}

/// Send `request`, collect its warnings and map error statuses.
pub(crate) async fn execute(request: RequestBuilder, warnings: &mut Warnings) -> Result<Response, CcError> {
    let (client, request) = request.build_split();
    let request = request?;
    debug!(method = %request.method(), url = %request.url(), "request");

    let response = client.execute(request).await?;
    let status = response.status();
    trace!(status = status.as_u16(), "response");

    warnings.extend(warnings::from_headers(response.headers()));

    if status.is_success() {
        return Ok(response);
    }
    Err(error_from_response(status, response).await)
}

async fn error_from_response(status: StatusCode, response: Response) -> CcError {
    let body = response.bytes().await.unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
    let first = parsed.errors.into_iter().next().unwrap_or_default();
    let detail = if first.detail.is_empty() {
        parsed.error.unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned())
    } else {
        first.detail
    };

    match status {
        StatusCode::UNAUTHORIZED => CcError::Unauthorized,
        StatusCode::FORBIDDEN => CcError::Forbidden,
        StatusCode::NOT_FOUND => CcError::ResourceNotFound,
        StatusCode::UNPROCESSABLE_ENTITY => CcError::UnprocessableEntity(detail),
        _ => CcError::Api {
            status: status.as_u16(),
            code: first.code,
            title: first.title,
            detail,
        },
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CcError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    pub(crate) fn client_for(server: &MockServer) -> Client {
        Client::new(reqwest::Client::new(), server.url("/v3"), "bearer token")
    }

    #[tokio::test]
    async fn list_follows_pagination_and_collects_warnings() {
        let server = MockServer::start();
        let second_page = server.url("/v3/apps?page=2");

        let first = server.mock(|when, then| {
            when.method(GET).path("/v3/apps").query_param("names", "dora");
            then.status(200)
                .header("X-Cf-Warnings", "page+one")
                .json_body(serde_json::json!({
                    "pagination": {"next": {"href": second_page}},
                    "resources": [{"guid": "g1", "name": "dora"}]
                }));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/v3/apps").query_param("page", "2");
            then.status(200)
                .header("X-Cf-Warnings", "page+two")
                .json_body(serde_json::json!({
                    "pagination": {"next": null},
                    "resources": [{"guid": "g2", "name": "dora"}]
                }));
        });

        let client = client_for(&server);
        let mut warnings = Warnings::new();
        let apps: Vec<crate::resources::Application> = client
            .list("/apps", &[("names", "dora".to_string())], &mut warnings)
            .await
            .expect("list");

        first.assert();
        second.assert();
        assert_eq!(apps.len(), 2);
        assert_eq!(warnings, vec!["page one", "page two"]);
    }

    #[tokio::test]
    async fn sends_authorization_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v3/apps/g1")
                .header("Authorization", "bearer token");
            then.status(200).json_body(serde_json::json!({"guid": "g1", "name": "a"}));
        });

        let mut warnings = Warnings::new();
        let app: crate::resources::Application = client_for(&server)
            .get("/apps/g1", &[], &mut warnings)
            .await
            .expect("get");

        mock.assert();
        assert_eq!(app.guid, "g1");
    }

    #[tokio::test]
    async fn error_statuses_map_and_keep_warnings() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v3/apps");
            then.status(422)
                .header("X-Cf-Warnings", "careful")
                .json_body(serde_json::json!({
                    "errors": [{"code": 10008, "title": "CF-UnprocessableEntity", "detail": "name must be unique in space"}]
                }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/v3/apps/missing");
            then.status(404).json_body(serde_json::json!({"errors": []}));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/v3/apps/broken");
            then.status(500).json_body(serde_json::json!({
                "errors": [{"code": 10001, "title": "CF-Unknown", "detail": "boom"}]
            }));
        });

        let client = client_for(&server);
        let mut warnings = Warnings::new();

        let err = client
            .post::<_, serde_json::Value>("/apps", &serde_json::json!({}), &mut warnings)
            .await
            .expect_err("422");
        assert!(matches!(err, CcError::UnprocessableEntity(ref d) if d == "name must be unique in space"));
        assert_eq!(warnings, vec!["careful"]);

        let err = client
            .get::<serde_json::Value>("/apps/missing", &[], &mut warnings)
            .await
            .expect_err("404");
        assert!(matches!(err, CcError::ResourceNotFound));

        let err = client.delete("/apps/broken", &mut warnings).await.expect_err("500");
        assert!(matches!(err, CcError::Api { status: 500, code: 10001, .. }));
    }

    #[tokio::test]
    async fn root_info_reads_links() {
        let server = MockServer::start();
        let v3 = server.url("/v3");
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).json_body(serde_json::json!({
                "links": {
                    "cloud_controller_v3": {"href": v3, "meta": {"version": "3.76.0"}},
                    "network_policy_v1": {"href": "https://api.example.com/networking/v1/external"}
                }
            }));
        });

        let info = root_info(&reqwest::Client::new(), &server.base_url())
            .await
            .expect("root");
        assert_eq!(info.v3_version(), "3.76.0");
        assert!(info.links.network_policy_v1.is_some());
    }

    #[test]
    fn empty_root_has_no_version() {
        assert_eq!(RootInfo::default().v3_version(), "");
    }
}
