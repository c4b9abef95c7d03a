//! OAuth2 client-credentials authentication against SharePoint's ACS.
//!
//! SharePoint app-only principals get their bearer tokens from the Azure
//! Access Control Service endpoint
//! `https://accounts.accesscontrol.windows.net/{tenant_id}/tokens/oAuth/2`.
//! A token is requested once per run, handed to the executor, and dropped
//! with it. Nothing is cached and nothing is refreshed.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SpError};

/// ACS authority. `{tenant_id}/tokens/oAuth/2` is appended at runtime.
pub const DEFAULT_AUTHORITY_URL: &str = "https://accounts.accesscontrol.windows.net";

/// Application ID of "Office 365 SharePoint Online".
pub const SHAREPOINT_PRINCIPAL_ID: &str = "00000003-0000-0ff1-ce00-000000000000";

/// The only grant this client performs.
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";

/// Tenant and app credentials for one run.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    /// Tenant host prefix, as in `{tenant_name}.sharepoint.com`.
    pub tenant_name: String,
    /// Site name, as in `/sites/{site_name}`.
    pub site_name: String,
    /// Explicit token resource. `None` selects the SharePoint Online
    /// principal scoped to this tenant, see [`Credentials::resource`].
    pub resource: Option<String>,
    pub grant_type: String,
}

impl Credentials {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        tenant_id: &str,
        tenant_name: &str,
        site_name: &str,
    ) -> Self {
        Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            tenant_id: tenant_id.to_string(),
            tenant_name: tenant_name.to_string(),
            site_name: site_name.to_string(),
            resource: None,
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
        }
    }

    /// Overrides the token resource, for shares that are not served by the
    /// "Office 365 SharePoint Online" principal.
    pub fn with_resource(mut self, resource: &str) -> Self {
        self.resource = Some(resource.to_string());
        self
    }

    pub fn with_grant_type(mut self, grant_type: &str) -> Self {
        self.grant_type = grant_type.to_string();
        self
    }

    /// The resource sent to ACS: the explicit value when one was given,
    /// otherwise `{principal}/{tenant_name}.sharepoint.com@{tenant_id}`.
    pub fn resource(&self) -> String {
        match &self.resource {
            Some(resource) => resource.clone(),
            None => format!(
                "{SHAREPOINT_PRINCIPAL_ID}/{}.sharepoint.com@{}",
                self.tenant_name, self.tenant_id
            ),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("tenant_name", &self.tenant_name)
            .field("site_name", &self.site_name)
            .field("resource", &self.resource)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

/// Bearer token for a single run. Not `Clone`: it moves into one client and
/// is dropped with it.
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: &str) -> Self {
        AccessToken(token.to_string())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Form body sent to the token endpoint (`application/x-www-form-urlencoded`).
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    resource: &'a str,
}

/// The part of the ACS token response we read. ACS also sends
/// `expires_in`, `not_before` and friends as strings; they are ignored.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Token URL for `tenant_id` under `authority`.
pub fn token_url(authority: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/tokens/oAuth/2",
        authority.trim_end_matches('/'),
        tenant_id
    )
}

/// Failure for a token response whose status arrived but whose body could
/// not be read (connection reset mid-body, decode error).
fn body_read_failure(status: StatusCode, err: reqwest::Error) -> SpError {
    SpError::Auth {
        status: Some(status),
        body: String::new(),
        message: format!(
            "failed to read token response (code: {})",
            status.as_u16()
        ),
        source: Some(Box::new(err)),
    }
}

/// Exchanges `credentials` for a bearer token in exactly one round trip.
///
/// The body is read as text before the status is checked so that a failure
/// carries ACS's own error description.
///
/// # Errors
///
/// - `SpError::Auth` for a non-2xx answer, an unreadable or unparseable
///   body, a body without `access_token`, or a transport failure reaching
///   ACS. The cause is chained through `source()` when there is one.
pub async fn authenticate(
    http: &reqwest::Client,
    credentials: &Credentials,
    authority: &str,
) -> Result<AccessToken> {
    let resource = credentials.resource();
    let form = TokenRequest {
        grant_type: &credentials.grant_type,
        client_id: &credentials.client_id,
        client_secret: &credentials.client_secret,
        resource: &resource,
    };
    let url = token_url(authority, &credentials.tenant_id);
    debug!(%url, %resource, "requesting access token");

    let response = http
        .post(&url)
        .form(&form)
        .send()
        .await
        .map_err(|err| SpError::Auth {
            status: None,
            body: String::new(),
            message: "token endpoint unreachable".to_string(),
            source: Some(Box::new(err)),
        })?;

    // Read body before checking status so ACS's error description survives
    // into the failure. A body that cannot be read is itself an auth failure.
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| body_read_failure(status, err))?;

    if !status.is_success() {
        return Err(SpError::Auth {
            status: Some(status),
            message: format!(
                "The OAuth 2.0 authorization failed (code: {})",
                status.as_u16()
            ),
            body,
            source: None,
        });
    }

    let parsed: TokenResponse = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Err(SpError::Auth {
                status: Some(status),
                message: "token response is not valid JSON".to_string(),
                body,
                source: Some(Box::new(err)),
            });
        }
    };

    match parsed.access_token {
        Some(token) if !token.is_empty() => {
            info!(tenant_id = %credentials.tenant_id, "access token acquired");
            Ok(AccessToken(token))
        }
        _ => Err(SpError::Auth {
            status: Some(status),
            message: "token response has no access_token".to_string(),
            body,
            source: None,
        }),
    }
}
