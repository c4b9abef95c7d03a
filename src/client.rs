//! Authenticated HTTP client for one SharePoint site.
//!
//! `SpClient` pairs a `reqwest::Client` with the site URL and the bearer token
//! acquired for this run. It sends a command (a server-relative REST path
//! built by [`crate::endpoint`]) with one of the header styles SharePoint
//! expects and hands back status plus raw body. Interpreting the status is
//! left to the executor, so a failure keeps the body SharePoint sent.
//!
//! There is no 401 retry and no token refresh: the token lives exactly as
//! long as the client, which lives for one operation.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::auth::{self, AccessToken, Credentials, DEFAULT_AUTHORITY_URL};
use crate::endpoint;
use crate::error::Result;

/// OData verbose JSON, the default content type and accept value.
/// SharePoint's REST endpoints wrap verbose answers in a `{"d": ...}`
/// envelope, which is what upload results and metadata are reported as.
pub const ODATA_VERBOSE: &str = "application/json;odata=verbose";

/// OData JSON without metadata, used for listings. The answer is a flat
/// `{"value": [...]}` with PascalCase fields and no `__metadata` blocks.
pub const ODATA_NOMETADATA: &str = "application/json;odata=nometadata";

/// Header SharePoint reads to treat a POST as another verb. File and folder
/// deletes are sent as `POST` + `X-HTTP-Method: DELETE`.
pub const X_HTTP_METHOD: &str = "X-HTTP-Method";

/// Covers TCP + TLS handshake only. An unreachable tenant host fails after
/// this rather than after the full request timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Full round trip including body download. `get` buffers the whole file
/// before writing it and `put` sends the whole file in one request, so this
/// bounds the largest transfer a slow link can finish. The CLI overrides it
/// with `--timeout`.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Where and how long to talk. Defaults point at production ACS and
/// `https://{tenant_name}.sharepoint.com`; tests override both base URLs to
/// point at a mock server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub authority_url: String,
    /// SharePoint host. `None` derives it from the tenant name.
    pub sharepoint_url: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            authority_url: DEFAULT_AUTHORITY_URL.to_string(),
            sharepoint_url: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Config with both base URLs overridden, used by tests.
    pub fn with_base_urls(authority_url: &str, sharepoint_url: &str) -> Self {
        ClientConfig {
            authority_url: authority_url.to_string(),
            sharepoint_url: Some(sharepoint_url.to_string()),
            ..ClientConfig::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the `reqwest::Client` shared by the token request and the
    /// operation requests of one run.
    pub fn build_http(&self) -> Result<Client> {
        Ok(Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()?)
    }

    fn sharepoint_url(&self, credentials: &Credentials) -> String {
        self.sharepoint_url
            .clone()
            .unwrap_or_else(|| endpoint::tenant_url(&credentials.tenant_name))
    }
}

/// Header variants of SharePoint requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStyle {
    /// Verbose OData content type and accept.
    Verbose,
    /// Verbose OData plus `X-HTTP-Method: DELETE`, sent on a POST.
    Delete,
    /// Verbose content type, `Accept: application/json;odata=nometadata`.
    NoMetadata,
}

impl RequestStyle {
    fn accept(self) -> &'static str {
        match self {
            RequestStyle::Verbose | RequestStyle::Delete => ODATA_VERBOSE,
            RequestStyle::NoMetadata => ODATA_NOMETADATA,
        }
    }
}

/// Status and body of a SharePoint response, status not yet judged.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Client for one site, holding the run's bearer token.
///
/// Every request goes to `{sharepoint_url}/sites/{site_name}` + command and
/// carries `Authorization: Bearer`, the verbose OData content type and the
/// accept value of its [`RequestStyle`]. Requests are sent one at a time by
/// the executor; the client does no pooling of its own beyond reqwest's.
pub struct SpClient {
    http: Client,
    site_url: String,
    site_name: String,
    token: AccessToken,
}

impl SpClient {
    /// Wraps an already acquired token.
    pub fn new(
        http: Client,
        credentials: &Credentials,
        config: &ClientConfig,
        token: AccessToken,
    ) -> Self {
        SpClient {
            http,
            site_url: endpoint::site_url(&config.sharepoint_url(credentials), &credentials.site_name),
            site_name: credentials.site_name.clone(),
            token,
        }
    }

    /// Authenticates once and returns a client bound to the credentials'
    /// site.
    ///
    /// # Errors
    ///
    /// - `SpError::Auth` when ACS refuses or answers without a token.
    /// - `SpError::Network` when the HTTP client cannot be built.
    pub async fn connect(credentials: &Credentials, config: &ClientConfig) -> Result<Self> {
        let http = config.build_http()?;
        let token = auth::authenticate(&http, credentials, &config.authority_url).await?;
        Ok(SpClient::new(http, credentials, config, token))
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Full URL of `command` on this site.
    pub fn url(&self, command: &str) -> Result<Url> {
        endpoint::resolve(&self.site_url, command)
    }

    /// Sends `command` and returns the unjudged response.
    ///
    /// POST requests always carry a body, empty when `body` is `None`, so
    /// SharePoint receives a `Content-Length`.
    pub async fn send(
        &self,
        method: Method,
        command: &str,
        style: RequestStyle,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let url = self.url(command)?;
        debug!(%method, %url, ?style, "sending SharePoint request");

        let mut req = self
            .http
            .request(method.clone(), url)
            .bearer_auth(self.token.secret())
            .header(CONTENT_TYPE, ODATA_VERBOSE)
            .header(ACCEPT, style.accept());
        if style == RequestStyle::Delete {
            req = req.header(X_HTTP_METHOD, "DELETE");
        }
        if let Some(payload) = body {
            req = req.body(payload);
        } else if method == Method::POST {
            req = req.body(Vec::new());
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(%status, bytes = body.len(), "SharePoint responded");

        Ok(RawResponse { status, body })
    }

    /// `GET` of `command`. Used by download, metadata and both listing
    /// halves.
    ///
    /// # Errors
    ///
    /// - `SpError::InvalidUrl` when `command` does not resolve on this site;
    ///   nothing is sent.
    /// - `SpError::Network` on transport failure. A non-2xx status is not an
    ///   error here.
    pub async fn get(&self, command: &str, style: RequestStyle) -> Result<RawResponse> {
        self.send(Method::GET, command, style, None).await
    }

    /// `POST` of `command` with `body`, or an empty body when `None`. Used
    /// by upload, folder creation and (with [`RequestStyle::Delete`]) both
    /// deletes.
    ///
    /// # Errors
    ///
    /// Same as [`SpClient::get`].
    pub async fn post(
        &self,
        command: &str,
        style: RequestStyle,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        self.send(Method::POST, command, style, body).await
    }
}
