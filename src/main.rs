//! CLI entry point for sharepoint-files.
//!
//! Resolves credentials from flags or `SHAREPOINT_*` environment variables,
//! runs one operation, and prints the JSON report on stdout. Logs go to
//! stderr, filtered by `RUST_LOG` (default `warn`).
//!
//! Exit codes:
//! - 0: success
//! - 1: the operation failed (auth, remote, local file, network)
//! - 2: argument validation error (clap handles this automatically)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sharepoint_files::auth::{Credentials, DEFAULT_GRANT_TYPE};
use sharepoint_files::client::ClientConfig;
use sharepoint_files::operation::{OperationKind, OperationRequest};
use sharepoint_files::report::Report;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Operation to run.
    #[arg(long, default_value = "put", value_parser = parse_kind)]
    method: OperationKind,

    /// Local directory. Defaults to the current directory.
    #[arg(long)]
    local_file_path: Option<PathBuf>,

    /// Local file name. For `get` it defaults to the remote file name.
    #[arg(long)]
    local_file_name: Option<String>,

    /// Remote folder, e.g. "/Shared Documents/Dev".
    #[arg(long)]
    remote_file_path: String,

    /// Remote file name. For `put` it defaults to the local file name.
    #[arg(long)]
    remote_file_name: Option<String>,

    /// Public identifier of the app principal.
    #[arg(long, env = "SHAREPOINT_CLIENT_ID")]
    client_id: String,

    /// App principal secret. Prefer the environment variable to keep it out
    /// of process listings and shell history.
    #[arg(long, env = "SHAREPOINT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Tenant ID used for OAuth.
    #[arg(long, env = "SHAREPOINT_TENANT_ID")]
    tenant_id: String,

    /// Tenant name, as in {tenant_name}.sharepoint.com.
    #[arg(long, env = "SHAREPOINT_TENANT_NAME")]
    tenant_name: String,

    /// Site name, as in {tenant_name}.sharepoint.com/sites/{site_name}.
    #[arg(long, env = "SHAREPOINT_SITE_NAME")]
    site_name: String,

    /// Token resource, for shares not served by "Office 365 SharePoint Online".
    #[arg(long)]
    resource: Option<String>,

    #[arg(long, default_value = DEFAULT_GRANT_TYPE)]
    grant_type: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 300)]
    timeout: u64,
}

fn parse_kind(s: &str) -> Result<OperationKind, String> {
    s.parse()
}

impl Cli {
    fn credentials(&self) -> Credentials {
        let creds = Credentials::new(
            &self.client_id,
            &self.client_secret,
            &self.tenant_id,
            &self.tenant_name,
            &self.site_name,
        )
        .with_grant_type(&self.grant_type);
        match &self.resource {
            Some(resource) => creds.with_resource(resource),
            None => creds,
        }
    }

    fn request(&self) -> OperationRequest {
        let local_dir = self
            .local_file_path
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        OperationRequest {
            kind: self.method,
            remote_file_path: self.remote_file_path.clone(),
            remote_file_name: self.remote_file_name.clone(),
            local_file_path: local_dir,
            local_file_name: self.local_file_name.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config =
        ClientConfig::default().with_request_timeout(Duration::from_secs(args.timeout));
    let result = sharepoint_files::run(&args.credentials(), &args.request(), &config).await;
    let report = Report::from_result(&result);

    match serde_json::to_string(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: could not render report: {e}");
            return ExitCode::FAILURE;
        }
    }

    if report.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
