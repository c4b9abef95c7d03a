//! Integration tests for the folder operations (list, mkdir, rmdir) using
//! wiremock.

use sharepoint_files::auth::{AccessToken, Credentials};
use sharepoint_files::client::{ClientConfig, SpClient};
use sharepoint_files::error::{ListingPart, SpError};
use sharepoint_files::executor::execute;
use sharepoint_files::operation::{EntryKind, OperationKind, OperationRequest, Payload};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// wiremock's `path` matcher compares the percent-encoded path, hence
// `%20`. Listing paths carry no `/sites/{site}` prefix inside the literal.
const FILES_PATH: &str =
    "/sites/Ops/_api/web/GetFolderByServerRelativeUrl('/Shared%20Documents/Dev')/files";
const FOLDERS_PATH: &str =
    "/sites/Ops/_api/web/GetFolderByServerRelativeUrl('/Shared%20Documents/Dev')/folders";
const NEW_FOLDER_PATH: &str = "/sites/Ops/_api/web/folders";
const FOLDER_PATH: &str =
    "/sites/Ops/_api/web/GetFolderByServerRelativeUrl('/sites/Ops//Shared%20Documents/Dev/foo')";

/// Client for site "Ops" on the mock server with a pre-set token, so no
/// token exchange happens here.
fn mock_client(server: &MockServer) -> SpClient {
    let creds = Credentials::new("cid", "secret", "tid", "mycompany", "Ops");
    let config = ClientConfig::with_base_urls(&server.uri(), &server.uri());
    SpClient::new(
        reqwest::Client::new(),
        &creds,
        &config,
        AccessToken::new("mock-token"),
    )
}

/// One entry as SharePoint returns it under `odata=nometadata`. `Exists` is
/// an extra field the client must ignore.
fn item(name: &str, created: &str) -> serde_json::Value {
    serde_json::json!({
        "Name": name,
        "ServerRelativeUrl": format!("/sites/Ops/Shared Documents/Dev/{name}"),
        "TimeCreated": created,
        "TimeLastModified": created,
        "Exists": true
    })
}

// ── list ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_concatenates_files_then_folders_in_server_order() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    // Files are deliberately not in name order: the listing must keep the
    // server's order, files first.
    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .and(header("Accept", "application/json;odata=nometadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [item("z.txt", "2024-01-01T00:00:00Z"), item("a.txt", "2024-01-02T00:00:00Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FOLDERS_PATH))
        .and(header("Accept", "application/json;odata=nometadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [item("Forms", "2023-12-31T00:00:00Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = OperationRequest::new(OperationKind::List, "/Shared Documents/Dev");
    let outcome = execute(&client, &req).await.unwrap();

    let Payload::Listing { entries, command } = outcome.payload else {
        panic!("expected a listing");
    };
    let names: Vec<(&str, EntryKind)> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
    assert_eq!(
        names,
        vec![
            ("z.txt", EntryKind::File),
            ("a.txt", EntryKind::File),
            ("Forms", EntryKind::Folder),
        ]
    );
    assert_eq!(
        entries[0].server_relative_url,
        "/sites/Ops/Shared Documents/Dev/z.txt"
    );
    assert_eq!(
        command,
        "/_api/web/GetFolderByServerRelativeUrl('/Shared Documents/Dev')/folders"
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2, "list must issue exactly two GETs");
    assert!(requests[0].url.path().ends_with("/files"));
    assert!(requests[1].url.path().ends_with("/folders"));
}

#[tokio::test]
async fn list_of_empty_folder_is_empty_success() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    for p in [FILES_PATH, FOLDERS_PATH] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})),
            )
            .mount(&server)
            .await;
    }

    let req = OperationRequest::new(OperationKind::List, "/Shared Documents/Dev");
    let outcome = execute(&client, &req).await.unwrap();
    assert!(matches!(outcome.payload, Payload::Listing { ref entries, .. } if entries.is_empty()));
}

#[tokio::test]
async fn list_folders_failure_discards_file_results() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [item("a.txt", "2024-01-01T00:00:00Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FOLDERS_PATH))
        // The files half already succeeded when this one fails.
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let req = OperationRequest::new(OperationKind::List, "/Shared Documents/Dev");
    let err = execute(&client, &req).await.unwrap_err();

    match err {
        SpError::PartialList {
            part, status, body, ..
        } => {
            assert_eq!(part, ListingPart::Folders);
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected PartialList, got {other:?}"),
    }
}

#[tokio::test]
async fn list_files_failure_skips_folders_call() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("folder not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FOLDERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})))
        // Verified on drop: the folders half is never requested.
        .expect(0)
        .mount(&server)
        .await;

    let req = OperationRequest::new(OperationKind::List, "/Shared Documents/Dev");
    let err = execute(&client, &req).await.unwrap_err();
    assert!(matches!(
        err,
        SpError::PartialList {
            part: ListingPart::Files,
            ..
        }
    ));
}

// ── mkdir ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn mkdir_posts_folder_payload() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path(NEW_FOLDER_PATH))
        .and(header("Content-Type", "application/json;odata=verbose"))
        .and(body_json(serde_json::json!({
            "__metadata": {"type": "SP.Folder"},
            "ServerRelativeUrl": "/sites/Ops/Shared Documents/Dev/foo"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"d": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let req = OperationRequest::new(OperationKind::Mkdir, "/Shared Documents/Dev/foo");
    let outcome = execute(&client, &req).await.unwrap();
    assert_eq!(outcome.status.as_u16(), 201);
    assert_eq!(outcome.payload, Payload::Empty);
}

#[tokio::test]
async fn mkdir_failure_reports_attempted_payload() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path(NEW_FOLDER_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"bad"}"#))
        .mount(&server)
        .await;

    let req = OperationRequest::new(OperationKind::Mkdir, "/Shared Documents/Dev/foo");
    let err = execute(&client, &req).await.unwrap_err();

    match err {
        SpError::Remote {
            status, payload, ..
        } => {
            assert_eq!(status.as_u16(), 400);
            let payload = payload.expect("mkdir failure should carry its payload");
            assert_eq!(payload["__metadata"]["type"], "SP.Folder");
            assert_eq!(
                payload["ServerRelativeUrl"],
                "/sites/Ops/Shared Documents/Dev/foo"
            );
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

// ── rmdir ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn rmdir_posts_with_method_override() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path(FOLDER_PATH))
        .and(header("X-HTTP-Method", "DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let req = OperationRequest::new(OperationKind::Rmdir, "/Shared Documents/Dev/foo");
    let outcome = execute(&client, &req).await.unwrap();
    assert_eq!(outcome.payload, Payload::Empty);
}

#[tokio::test]
async fn rmdir_failure_carries_no_payload() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path(FOLDER_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let req = OperationRequest::new(OperationKind::Rmdir, "/Shared Documents/Dev/foo");
    let err = execute(&client, &req).await.unwrap_err();
    match err {
        SpError::Remote { payload, body, .. } => {
            assert!(payload.is_none());
            assert_eq!(body, "not found");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}
