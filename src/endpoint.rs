//! SharePoint REST endpoint construction.
//!
//! Every URL this crate sends is assembled here from typed fields. Commands
//! are first built as readable server-relative strings (the form reported
//! back to operators and listed in `manifest/endpoints.toml`), then escaped
//! once in [`resolve`]:
//!
//! - single quotes inside OData string literals are doubled (`'` → `''`);
//! - characters that are not legal in a URL path (spaces, `#`, `?`, `%`, ...)
//!   are percent-encoded, so `Shared Documents` goes out as
//!   `Shared%20Documents`.
//!
//! Path values are concatenated exactly as given. A `remote_file_path` with a
//! leading slash produces `/sites/{site}//...`, which SharePoint accepts.
//!
//! | Function | Command |
//! |----------|---------|
//! | [`upload_file`] | `/_api/web/GetFolderByServerRelativeURL('/sites/{site}/{path}')/Files/add(url='{name}',overwrite=true)` |
//! | [`file_content`] | `/_api/web/GetFileByServerRelativeUrl('/sites/{site}/{path}/{name}')/$value` |
//! | [`file_metadata`] | `/_api/web/GetFileByServerRelativeUrl('/sites/{site}/{path}/{name}')/ListItemAllFields` |
//! | [`file`] | `/_api/web/GetFileByServerRelativeUrl('/sites/{site}/{path}/{name}')` |
//! | [`folder_listing`] | `/_api/web/GetFolderByServerRelativeUrl('{path}')/{files,folders}` |
//! | [`folders`] | `/_api/web/folders` |
//! | [`folder`] | `/_api/web/GetFolderByServerRelativeUrl('/sites/{site}/{path}')` |

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use crate::error::{ListingPart, Result, SpError};

/// Characters escaped in a command path. `/`, `'`, `(`, `)`, `=`, `,` and `$`
/// stay literal because SharePoint's REST grammar depends on them.
const COMMAND_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Production SharePoint Online host for `tenant_name`.
pub fn tenant_url(tenant_name: &str) -> String {
    format!("https://{tenant_name}.sharepoint.com")
}

/// Site root, `{sharepoint_url}/sites/{site}`.
pub fn site_url(sharepoint_url: &str, site: &str) -> String {
    format!("{}/sites/{}", sharepoint_url.trim_end_matches('/'), site)
}

/// Doubles single quotes so the value is safe inside an OData `'...'` literal.
fn literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Server-relative URL of a file, quoted for an OData literal.
fn file_url(site: &str, path: &str, name: &str) -> String {
    literal(&format!("/sites/{site}/{path}/{name}"))
}

/// Upload into the folder `/sites/{site}/{path}` under `name`, replacing any
/// file of that name. The request body is the raw file content.
///
/// ```
/// use sharepoint_files::endpoint::upload_file;
///
/// assert_eq!(
///     upload_file("Ops", "Docs", "q1's.xlsx"),
///     "/_api/web/GetFolderByServerRelativeURL('/sites/Ops/Docs')/Files/add(url='q1''s.xlsx',overwrite=true)"
/// );
/// ```
pub fn upload_file(site: &str, path: &str, name: &str) -> String {
    format!(
        "/_api/web/GetFolderByServerRelativeURL('{}')/Files/add(url='{}',overwrite=true)",
        literal(&format!("/sites/{site}/{path}")),
        literal(name)
    )
}

/// The file resource itself. Deletes POST here with `X-HTTP-Method: DELETE`;
/// [`file_content`] and [`file_metadata`] append their selector to it.
pub fn file(site: &str, path: &str, name: &str) -> String {
    format!(
        "/_api/web/GetFileByServerRelativeUrl('{}')",
        file_url(site, path, name)
    )
}

/// Raw file bytes (`$value` selector).
pub fn file_content(site: &str, path: &str, name: &str) -> String {
    format!("{}/$value", file(site, path, name))
}

/// List item fields of a file (`ListItemAllFields` selector).
pub fn file_metadata(site: &str, path: &str, name: &str) -> String {
    format!("{}/ListItemAllFields", file(site, path, name))
}

/// One half of a folder listing. `path` is used as given, without the site
/// prefix.
pub fn folder_listing(path: &str, part: ListingPart) -> String {
    format!(
        "/_api/web/GetFolderByServerRelativeUrl('{}')/{}",
        literal(path),
        part.as_str()
    )
}

/// Folder collection; folder creation POSTs here.
pub fn folders() -> String {
    "/_api/web/folders".to_string()
}

/// The folder `/sites/{site}/{path}`, target of folder deletion.
///
/// Unlike [`new_folder_server_relative_url`] a `/` is always inserted after
/// the site, so a leading slash in `path` yields `//`:
///
/// ```
/// use sharepoint_files::endpoint::folder;
///
/// assert_eq!(
///     folder("Ops", "/Docs/old"),
///     "/_api/web/GetFolderByServerRelativeUrl('/sites/Ops//Docs/old')"
/// );
/// ```
pub fn folder(site: &str, path: &str) -> String {
    format!(
        "/_api/web/GetFolderByServerRelativeUrl('{}')",
        literal(&format!("/sites/{site}/{path}"))
    )
}

/// `ServerRelativeUrl` of a folder to create. No separator is inserted
/// between the site and `path`.
pub fn new_folder_server_relative_url(site: &str, path: &str) -> String {
    format!("/sites/{site}{path}")
}

/// Refuses commands that URL parsing would silently rewrite. `Url::parse`
/// resolves `.` and `..` path segments and reads `\` as `/`, which would
/// move the target of a server-relative literal to another file or folder.
fn check_rewritable(command: &str) -> std::result::Result<(), String> {
    if command.contains('\\') {
        return Err("backslash in path".to_string());
    }
    if let Some(segment) = command.split('/').find(|s| *s == "." || *s == "..") {
        return Err(format!("'{segment}' path segment"));
    }
    Ok(())
}

/// Joins a command onto the site URL, escapes it and parses the result.
///
/// The parsed URL carries the command exactly as built; nothing is
/// normalized away.
///
/// # Errors
///
/// - `SpError::InvalidUrl` when the command contains `.`/`..` segments or a
///   backslash, or when the joined string is not a valid URL (for example an
///   empty or malformed tenant host).
pub fn resolve(site_url: &str, command: &str) -> Result<Url> {
    let command = command.trim_start_matches('/');
    let joined = format!(
        "{}/{}",
        site_url.trim_end_matches('/'),
        utf8_percent_encode(command, COMMAND_PATH)
    );
    if let Err(reason) = check_rewritable(command) {
        return Err(SpError::InvalidUrl {
            url: joined,
            reason,
            source: None,
        });
    }
    Url::parse(&joined).map_err(|source| SpError::InvalidUrl {
        url: joined,
        reason: source.to_string(),
        source: Some(source),
    })
}
