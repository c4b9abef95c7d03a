//! Typed error hierarchy for the sharepoint-files crate.
//!
//! `SpError` is the failure half of an operation result. Every variant maps
//! to a real boundary of a run (the token endpoint, the SharePoint REST API,
//! the local filesystem, the transport) and keeps the raw diagnostic context
//! the server sent back, so callers branch on the variant rather than on
//! message text.

use std::path::PathBuf;

use reqwest::StatusCode;

/// Which half of a folder listing a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingPart {
    /// The `/files` sub-request.
    Files,
    /// The `/folders` sub-request.
    Folders,
}

impl ListingPart {
    /// Path segment used by SharePoint for this half of the listing.
    pub fn as_str(self) -> &'static str {
        match self {
            ListingPart::Files => "files",
            ListingPart::Folders => "folders",
        }
    }
}

impl std::fmt::Display for ListingPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for every sharepoint-files operation.
#[derive(Debug, thiserror::Error)]
pub enum SpError {
    /// The ACS token endpoint rejected the credentials or answered with a
    /// body that has no `access_token`. Fatal: no operation call follows.
    #[error("authentication failed: {message}")]
    Auth {
        /// HTTP status of the token response, when one was received.
        status: Option<StatusCode>,
        /// Raw token endpoint body (ACS error JSON or empty).
        body: String,
        /// Human-readable description of the failure.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The local source file for `put` is missing, or the local target of
    /// `get` could not be written.
    #[error("local file {} is missing or unwritable", .path.display())]
    LocalFile {
        /// Fully resolved local path (directory joined with file name).
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A SharePoint REST call returned a non-success status.
    #[error("SharePoint API error {status}: {body}")]
    Remote {
        status: StatusCode,
        /// Raw response body as sent by SharePoint.
        body: String,
        /// The request payload that was sent, when the operation had one
        /// worth reporting (folder creation).
        payload: Option<serde_json::Value>,
    },

    /// One of the two listing sub-requests failed. The whole listing is
    /// discarded.
    #[error("listing {part} failed with {status}: {body}")]
    PartialList {
        part: ListingPart,
        status: StatusCode,
        body: String,
        /// Server-relative command path of the failing sub-request.
        command: String,
    },

    /// The operation needs a file name that was neither given nor derivable.
    #[error("operation {operation} requires {parameter}")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },

    /// An endpoint could not be assembled into a valid URL, or it contains
    /// segments URL parsing would rewrite (`.`, `..`, `\`).
    #[error("invalid endpoint URL {url}: {reason}")]
    InvalidUrl {
        url: String,
        reason: String,
        #[source]
        source: Option<url::ParseError>,
    },

    /// JSON decoding of a response body failed.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Transport-level failure (DNS, TCP, TLS, timeout). No status code.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SpError {
    /// HTTP status attached to this failure, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SpError::Auth { status, .. } => *status,
            SpError::Remote { status, .. } | SpError::PartialList { status, .. } => Some(*status),
            SpError::Network(err) => err.status(),
            _ => None,
        }
    }

    /// Raw server response body carried by this failure.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            SpError::Auth { body, .. }
            | SpError::Remote { body, .. }
            | SpError::PartialList { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, SpError>;
