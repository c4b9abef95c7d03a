//! Dispatch of one operation against an authenticated site client.
//!
//! [`execute`] matches exhaustively on [`OperationKind`]; adding a kind
//! without a handler does not compile. Each handler builds its command via
//! [`crate::endpoint`], sends it through [`SpClient`], and turns the response
//! into an [`Outcome`] or a typed [`SpError`]. Nothing is retried.

use reqwest::StatusCode;
use serde_json::json;
use tracing::{info, warn};

use crate::client::{RawResponse, RequestStyle, SpClient};
use crate::endpoint;
use crate::error::{ListingPart, SpError};
use crate::operation::{
    EntryKind, ListedItem, ODataList, OperationKind, OperationRequest, OperationResult, Outcome,
    Payload,
};

/// Runs `request` with `client` and returns its terminal state.
pub async fn execute(client: &SpClient, request: &OperationRequest) -> OperationResult {
    info!(
        operation = %request.kind,
        remote_path = %request.remote_file_path,
        site = client.site_name(),
        "dispatching operation"
    );
    let result = match request.kind {
        OperationKind::Put => put(client, request).await,
        OperationKind::Get => get(client, request).await,
        OperationKind::Metadata => metadata(client, request).await,
        OperationKind::Delete => delete(client, request).await,
        OperationKind::List => list(client, request).await,
        OperationKind::Mkdir => mkdir(client, request).await,
        OperationKind::Rmdir => rmdir(client, request).await,
    };
    if let Err(err) = &result {
        warn!(operation = %request.kind, error = %err, "operation failed");
    }
    result
}

fn remote_failure(resp: &RawResponse, payload: Option<serde_json::Value>) -> SpError {
    SpError::Remote {
        status: resp.status,
        body: resp.text(),
        payload,
    }
}

fn done(status: StatusCode, payload: Payload) -> OperationResult {
    Ok(Outcome { status, payload })
}

/// Uploads the local file to the remote folder, overwriting.
///
/// The local file is read before any request is built, so a missing file
/// never reaches SharePoint.
async fn put(client: &SpClient, request: &OperationRequest) -> OperationResult {
    let local = request.local_full_path()?;
    let remote_name = request.require_remote_name()?;

    let content = tokio::fs::read(&local)
        .await
        .map_err(|source| SpError::LocalFile {
            path: local.clone(),
            source,
        })?;

    let command = endpoint::upload_file(client.site_name(), &request.remote_file_path, remote_name);
    let resp = client
        .post(&command, RequestStyle::Verbose, Some(content))
        .await?;
    if !resp.status.is_success() {
        return Err(remote_failure(&resp, None));
    }

    // The file is already stored once the status is 2xx; a body that is not
    // JSON (proxies, plain-text gateways) is reported verbatim.
    let uploaded = if resp.body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&resp.body)
            .unwrap_or_else(|_| serde_json::Value::String(resp.text()))
    };
    done(resp.status, Payload::Uploaded(uploaded))
}

/// Downloads the remote file and overwrites the local one with its bytes.
async fn get(client: &SpClient, request: &OperationRequest) -> OperationResult {
    let remote_name = request.require_remote_name()?;
    let local = request.local_full_path()?;

    let command = endpoint::file_content(client.site_name(), &request.remote_file_path, remote_name);
    let resp = client.get(&command, RequestStyle::Verbose).await?;
    if !resp.status.is_success() {
        return Err(remote_failure(&resp, None));
    }

    tokio::fs::write(&local, &resp.body)
        .await
        .map_err(|source| SpError::LocalFile {
            path: local.clone(),
            source,
        })?;

    done(
        resp.status,
        Payload::Downloaded {
            path: local,
            bytes: resp.body.len() as u64,
        },
    )
}

async fn metadata(client: &SpClient, request: &OperationRequest) -> OperationResult {
    let remote_name = request.require_remote_name()?;
    let command =
        endpoint::file_metadata(client.site_name(), &request.remote_file_path, remote_name);
    let resp = client.get(&command, RequestStyle::Verbose).await?;
    if !resp.status.is_success() {
        return Err(remote_failure(&resp, None));
    }
    done(resp.status, Payload::Metadata(resp.text()))
}

async fn delete(client: &SpClient, request: &OperationRequest) -> OperationResult {
    let remote_name = request.require_remote_name()?;
    let command = endpoint::file(client.site_name(), &request.remote_file_path, remote_name);
    let resp = client.post(&command, RequestStyle::Delete, None).await?;
    if !resp.status.is_success() {
        return Err(remote_failure(&resp, None));
    }
    done(resp.status, Payload::Empty)
}

/// Lists files, then folders. The first failing half aborts the listing and
/// whatever was collected is dropped.
async fn list(client: &SpClient, request: &OperationRequest) -> OperationResult {
    let mut entries = Vec::new();
    let mut last = None;

    for (part, kind) in [
        (ListingPart::Files, EntryKind::File),
        (ListingPart::Folders, EntryKind::Folder),
    ] {
        let command = endpoint::folder_listing(&request.remote_file_path, part);
        let resp = client.get(&command, RequestStyle::NoMetadata).await?;
        if !resp.status.is_success() {
            return Err(SpError::PartialList {
                part,
                status: resp.status,
                body: resp.text(),
                command,
            });
        }

        let items: ODataList<ListedItem> = serde_json::from_slice(&resp.body)?;
        entries.extend(items.value.into_iter().map(|item| item.into_entry(kind)));
        last = Some((resp.status, command));
    }

    let (status, command) = last.unwrap_or((StatusCode::OK, String::new()));
    info!(entries = entries.len(), "listing complete");
    done(status, Payload::Listing { entries, command })
}

async fn mkdir(client: &SpClient, request: &OperationRequest) -> OperationResult {
    let payload = json!({
        "__metadata": { "type": "SP.Folder" },
        "ServerRelativeUrl": endpoint::new_folder_server_relative_url(
            client.site_name(),
            &request.remote_file_path,
        ),
    });
    let body = serde_json::to_vec(&payload)?;
    let resp = client
        .post(&endpoint::folders(), RequestStyle::Verbose, Some(body))
        .await?;
    if !resp.status.is_success() {
        return Err(remote_failure(&resp, Some(payload)));
    }
    done(resp.status, Payload::Empty)
}

async fn rmdir(client: &SpClient, request: &OperationRequest) -> OperationResult {
    let command = endpoint::folder(client.site_name(), &request.remote_file_path);
    let resp = client.post(&command, RequestStyle::Delete, None).await?;
    if !resp.status.is_success() {
        return Err(remote_failure(&resp, None));
    }
    done(resp.status, Payload::Empty)
}
