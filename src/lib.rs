//! Single-shot async client for SharePoint Online files and folders.
//!
//! A run authenticates once against the Azure Access Control Service with
//! OAuth2 client credentials, executes exactly one operation against a site's
//! REST API, and drops the token.
//!
//! # Modules
//!
//! - [`auth`] — Credentials, resource defaulting and the ACS token exchange.
//! - [`client`] — Authenticated HTTP wrapper bound to one site.
//! - [`endpoint`] — Pure builders for every REST command, escaping included.
//! - [`error`] — Typed error hierarchy (`SpError`).
//! - [`executor`] — Exhaustive dispatch over the seven operation kinds.
//! - [`operation`] — Requests, name defaulting, listing entries, outcomes.
//! - [`report`] — JSON report of a finished run for the operator.
//!
//! # Quick Start
//!
//! ```ignore
//! use sharepoint_files::auth::Credentials;
//! use sharepoint_files::client::ClientConfig;
//! use sharepoint_files::operation::{OperationKind, OperationRequest};
//!
//! let creds = Credentials::new("client-id", "secret", "tenant-id", "mycompany", "Ops");
//! let request = OperationRequest::new(OperationKind::Put, "/Shared Documents/Dev")
//!     .with_local_file_path("/home/me/Documents")
//!     .with_local_file_name("test.txt");
//! let outcome = sharepoint_files::run(&creds, &request, &ClientConfig::default()).await?;
//! ```

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod operation;
pub mod report;

use crate::auth::Credentials;
use crate::client::{ClientConfig, SpClient};
use crate::operation::{OperationRequest, OperationResult};

/// Authenticates, executes `request`, and returns its terminal state.
///
/// An authentication failure ends the run before any SharePoint call.
pub async fn run(
    credentials: &Credentials,
    request: &OperationRequest,
    config: &ClientConfig,
) -> OperationResult {
    let client = SpClient::connect(credentials, config).await?;
    executor::execute(&client, request).await
}
