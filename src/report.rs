//! Operator-facing report of a finished run.
//!
//! A [`Report`] is the JSON object the binary prints on stdout. Successes are
//! reported as `changed`, failures as `failed` with a message, the HTTP status
//! and the raw server response. Response bodies that parse as JSON are
//! embedded as JSON, anything else as a string.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::error::SpError;
use crate::operation::{OperationResult, Payload, RemoteEntry};

const REMOTE_FAILURE_MSG: &str = "Something went wrong...";

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct Report {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<Vec<RemoteEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Request payload of a failed folder creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn body_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl Report {
    pub fn from_result(result: &OperationResult) -> Self {
        match result {
            Ok(outcome) => {
                let mut report = Report {
                    changed: true,
                    code: Some(outcome.status.as_u16()),
                    ..Report::default()
                };
                match &outcome.payload {
                    Payload::Empty => {}
                    Payload::Uploaded(value) => report.response = Some(value.clone()),
                    Payload::Downloaded { path, .. } => report.path = Some(path.clone()),
                    Payload::Metadata(raw) => report.metadata = Some(raw.clone()),
                    Payload::Listing { entries, command } => {
                        report.listing = Some(entries.clone());
                        report.command = Some(command.clone());
                    }
                }
                report
            }
            Err(err) => Report::from_error(err),
        }
    }

    fn from_error(err: &SpError) -> Self {
        let mut report = Report {
            failed: true,
            code: err.status().map(|s| s.as_u16()),
            response: err.raw_response().map(body_value),
            ..Report::default()
        };
        let msg = match err {
            SpError::Auth { message, .. } => message.clone(),
            SpError::LocalFile { path, .. } => format!("The file {} is missing.", path.display()),
            SpError::Remote { payload, .. } => {
                report.data = payload.clone();
                REMOTE_FAILURE_MSG.to_string()
            }
            SpError::PartialList { command, .. } => {
                report.command = Some(command.clone());
                REMOTE_FAILURE_MSG.to_string()
            }
            other => other.to_string(),
        };
        report.msg = Some(msg);
        report
    }

    pub fn is_failure(&self) -> bool {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{EntryKind, Outcome};
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn empty_success_reports_changed_and_code() {
        let result: OperationResult = Ok(Outcome {
            status: StatusCode::OK,
            payload: Payload::Empty,
        });
        let value = serde_json::to_value(Report::from_result(&result)).unwrap();
        assert_eq!(value, json!({"changed": true, "code": 200}));
    }

    #[test]
    fn listing_success_includes_entries_and_command() {
        let result: OperationResult = Ok(Outcome {
            status: StatusCode::OK,
            payload: Payload::Listing {
                entries: vec![RemoteEntry {
                    kind: EntryKind::File,
                    name: "a.txt".to_string(),
                    server_relative_url: "/sites/Ops/Docs/a.txt".to_string(),
                    time_created: "t1".to_string(),
                    time_last_modified: "t2".to_string(),
                }],
                command: "/_api/web/GetFolderByServerRelativeUrl('/Docs')/folders".to_string(),
            },
        });
        let value = serde_json::to_value(Report::from_result(&result)).unwrap();
        assert_eq!(value["listing"][0]["Name"], "a.txt");
        assert_eq!(value["listing"][0]["Kind"], "file");
        assert!(value["command"].as_str().unwrap().ends_with("/folders"));
    }

    #[test]
    fn auth_failure_reports_code_and_raw_text() {
        let result: OperationResult = Err(SpError::Auth {
            status: Some(StatusCode::BAD_REQUEST),
            body: "plain text error".to_string(),
            message: "The OAuth 2.0 authorization failed (code: 400)".to_string(),
            source: None,
        });
        let report = Report::from_result(&result);
        assert!(report.is_failure());
        assert_eq!(report.code, Some(400));
        assert_eq!(
            report.msg.as_deref(),
            Some("The OAuth 2.0 authorization failed (code: 400)")
        );
        assert_eq!(report.response, Some(json!("plain text error")));
    }

    #[test]
    fn mkdir_failure_carries_payload_as_data() {
        let payload = json!({"__metadata": {"type": "SP.Folder"}, "ServerRelativeUrl": "/sites/Ops/x"});
        let result: OperationResult = Err(SpError::Remote {
            status: StatusCode::FORBIDDEN,
            body: r#"{"error":{"code":"-2147024891"}}"#.to_string(),
            payload: Some(payload.clone()),
        });
        let report = Report::from_result(&result);
        assert_eq!(report.msg.as_deref(), Some("Something went wrong..."));
        assert_eq!(report.data, Some(payload));
        assert_eq!(report.response.unwrap()["error"]["code"], "-2147024891");
    }

    #[test]
    fn partial_list_failure_reports_failing_command() {
        let command = "/_api/web/GetFolderByServerRelativeUrl('/Docs')/folders";
        let result: OperationResult = Err(SpError::PartialList {
            part: crate::error::ListingPart::Folders,
            status: StatusCode::FORBIDDEN,
            body: r#"{"odata.error":{"message":{"value":"Access denied."}}}"#.to_string(),
            command: command.to_string(),
        });
        let report = Report::from_result(&result);

        assert!(report.is_failure());
        assert_eq!(report.msg.as_deref(), Some("Something went wrong..."));
        assert_eq!(report.code, Some(403));
        assert_eq!(report.command.as_deref(), Some(command));
        assert_eq!(
            report.response.unwrap()["odata.error"]["message"]["value"],
            "Access denied."
        );
        // Entries collected before the failure are never reported.
        assert!(report.listing.is_none());
        assert!(report.data.is_none());
    }

    #[test]
    fn download_success_reports_local_path() {
        let result: OperationResult = Ok(Outcome {
            status: StatusCode::OK,
            payload: Payload::Downloaded {
                path: PathBuf::from("/data/test.txt"),
                bytes: 8,
            },
        });
        let value = serde_json::to_value(Report::from_result(&result)).unwrap();
        assert_eq!(
            value,
            json!({"changed": true, "code": 200, "path": "/data/test.txt"})
        );
    }

    #[test]
    fn metadata_success_reports_body_verbatim() {
        let raw = r#"{"d":{"Id":7,"Title":null}}"#;
        let result: OperationResult = Ok(Outcome {
            status: StatusCode::OK,
            payload: Payload::Metadata(raw.to_string()),
        });
        let report = Report::from_result(&result);

        assert!(!report.is_failure());
        assert_eq!(report.metadata.as_deref(), Some(raw));
        // Kept as the raw string, not re-encoded as JSON.
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metadata"], json!(raw));
        assert!(value.get("response").is_none());
    }

    #[test]
    fn local_file_failure_names_the_path() {
        let result: OperationResult = Err(SpError::LocalFile {
            path: PathBuf::from("/data/test.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        let report = Report::from_result(&result);
        assert_eq!(
            report.msg.as_deref(),
            Some("The file /data/test.txt is missing.")
        );
        assert_eq!(report.code, None);
        assert!(report.response.is_none());
    }
}
