//! Operation requests, listing entries and outcomes.
//!
//! An [`OperationRequest`] names one of seven [`OperationKind`]s plus the
//! remote and local locations it acts on. The kind alone decides which names
//! are needed:
//!
//! | Kind | Remote name | Local name |
//! |------|-------------|------------|
//! | `put` | defaults to the local name | required |
//! | `get` | required | defaults to the remote name |
//! | `metadata`, `delete` | required | unused |
//! | `list`, `mkdir`, `rmdir` | unused | unused |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpError};

/// The seven things a run can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Upload a local file, overwriting the remote one.
    Put,
    /// Download a remote file, overwriting the local one.
    Get,
    /// Fetch the list item fields of a remote file.
    Metadata,
    /// Delete a remote file.
    Delete,
    /// List files then folders of a remote folder.
    List,
    /// Create a remote folder.
    Mkdir,
    /// Delete a remote folder.
    Rmdir,
}

impl OperationKind {
    /// Every kind, in declaration order.
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Put,
        OperationKind::Get,
        OperationKind::Metadata,
        OperationKind::Delete,
        OperationKind::List,
        OperationKind::Mkdir,
        OperationKind::Rmdir,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Put => "put",
            OperationKind::Get => "get",
            OperationKind::Metadata => "metadata",
            OperationKind::Delete => "delete",
            OperationKind::List => "list",
            OperationKind::Mkdir => "mkdir",
            OperationKind::Rmdir => "rmdir",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = OperationKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown method '{s}', expected one of {}", names.join(", "))
            })
    }
}

/// One operation to run against the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub kind: OperationKind,
    /// Remote folder, e.g. `/Shared Documents/Dev`.
    pub remote_file_path: String,
    pub remote_file_name: Option<String>,
    /// Local directory the local file name is joined onto.
    pub local_file_path: PathBuf,
    pub local_file_name: Option<String>,
}

impl OperationRequest {
    /// Request with no file names and the current directory as local path.
    pub fn new(kind: OperationKind, remote_file_path: &str) -> Self {
        OperationRequest {
            kind,
            remote_file_path: remote_file_path.to_string(),
            remote_file_name: None,
            local_file_path: PathBuf::from("."),
            local_file_name: None,
        }
    }

    pub fn with_remote_file_name(mut self, name: &str) -> Self {
        self.remote_file_name = Some(name.to_string());
        self
    }

    pub fn with_local_file_name(mut self, name: &str) -> Self {
        self.local_file_name = Some(name.to_string());
        self
    }

    pub fn with_local_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.local_file_path = path.as_ref().to_path_buf();
        self
    }

    /// Remote file name after defaulting. `put` falls back to the local name.
    pub fn remote_name(&self) -> Option<&str> {
        match (self.kind, &self.remote_file_name) {
            (_, Some(name)) => Some(name.as_str()),
            (OperationKind::Put, None) => self.local_file_name.as_deref(),
            _ => None,
        }
    }

    /// Local file name after defaulting. `get` falls back to the remote name.
    pub fn local_name(&self) -> Option<&str> {
        match (self.kind, &self.local_file_name) {
            (_, Some(name)) => Some(name.as_str()),
            (OperationKind::Get, None) => self.remote_file_name.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn require_remote_name(&self) -> Result<&str> {
        self.remote_name().ok_or(SpError::MissingParameter {
            operation: self.kind.as_str(),
            parameter: "remote_file_name",
        })
    }

    /// Local directory joined with the (defaulted) local file name.
    pub(crate) fn local_full_path(&self) -> Result<PathBuf> {
        let name = self.local_name().ok_or(SpError::MissingParameter {
            operation: self.kind.as_str(),
            parameter: "local_file_name",
        })?;
        Ok(self.local_file_path.join(name))
    }
}

/// Generic OData collection wrapper: `{"value": [...]}`.
#[derive(Debug, Deserialize)]
pub struct ODataList<T> {
    pub value: Vec<T>,
}

/// Whether a listed entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// A file or folder as returned by a listing, in the shape it is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteEntry {
    pub kind: EntryKind,
    pub name: String,
    pub server_relative_url: String,
    pub time_created: String,
    pub time_last_modified: String,
}

/// A file or folder item in an `odata=nometadata` collection. SharePoint
/// sends many more properties; only these are kept.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListedItem {
    pub name: String,
    pub server_relative_url: String,
    #[serde(default)]
    pub time_created: String,
    #[serde(default)]
    pub time_last_modified: String,
}

impl ListedItem {
    pub(crate) fn into_entry(self, kind: EntryKind) -> RemoteEntry {
        RemoteEntry {
            kind,
            name: self.name,
            server_relative_url: self.server_relative_url,
            time_created: self.time_created,
            time_last_modified: self.time_last_modified,
        }
    }
}

/// What a successful operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Nothing beyond the status (delete, mkdir, rmdir).
    Empty,
    /// The JSON SharePoint returned for the uploaded file.
    Uploaded(serde_json::Value),
    /// Where the downloaded bytes were written.
    Downloaded { path: PathBuf, bytes: u64 },
    /// Raw `ListItemAllFields` body.
    Metadata(String),
    /// Files first, then folders, each in server order, plus the last command
    /// issued.
    Listing {
        entries: Vec<RemoteEntry>,
        command: String,
    },
}

/// Successful terminal state of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: StatusCode,
    pub payload: Payload,
}

/// Terminal state of a run: success payload or a typed failure.
pub type OperationResult = std::result::Result<Outcome, SpError>;
