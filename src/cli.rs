//! CLI interface for Lapor.
//!
//! Each subcommand is non-interactive: arguments in, text out. The one
//! exception is `dashboard watch`, which keeps refreshing until told to quit.
//!
//! Commands split into four groups:
//!
//! - `lapor form ...`: fill in, check, and submit a report draft.
//! - `lapor ref list`: show the reference lists the forms draw from.
//! - `lapor auth ...`: dashboard login and logout.
//! - `lapor dashboard ...`: browse and update submitted reports.
//!
//! Navigation is printed as a route (`/success`, `/failed?error=...`) on stdout.

mod auth;
mod dashboard;
mod form;
mod format;
mod reference;

use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::config::Config;
use crate::engine::Policy;
use crate::storage::Storage;

use auth::AuthCommand;
use dashboard::DashboardCommand;
use form::FormCommand;
use reference::RefCommand;

/// Lapor: file and follow up complaint reports.
#[derive(Debug, Parser)]
#[command(name = "lapor", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Backend origin. Overrides `API_URL` and the config file.
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: filing a suggestion
  1. lapor form new laporan
  2. lapor form set nama="Sari" no_telepon=081234567890 email=sari@gmail.com
  3. lapor form set klasifikasi=saran isi_saran="Perpanjang jam perpustakaan"
  4. lapor form validate
  5. lapor form submit
     → prints /success and the tracking code, or /failed?error=...

Complaints with evidence:
  lapor form set klasifikasi=pengaduan jenis_pengaduan=fasilitas
  lapor form attach foto-kelas.jpg

Dashboard:
  lapor auth login --username admin
  lapor dashboard list dumas --page 2 --search jalan
  lapor dashboard watch saran"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Work on the report draft.
    Form {
        #[command(subcommand)]
        command: FormCommand,
    },

    /// Reference lists served by the backend.
    Ref {
        #[command(subcommand)]
        command: RefCommand,
    },

    /// Dashboard session management.
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Browse and update submitted reports. Requires a session.
    Dashboard {
        #[command(subcommand)]
        command: DashboardCommand,
    },
}

/// What every command may need: config, storage, and the backend origin.
pub(crate) struct Context<'a> {
    pub config: &'a Config,
    pub storage: &'a Storage,
    pub api_url: Option<String>,
}

impl Context<'_> {
    fn api(&self) -> Result<ApiClient, String> {
        let origin = self.config.api_origin(self.api_url.as_deref());
        ApiClient::new(&origin, self.config.timeout()).map_err(|e| e.to_string())
    }

    fn policy(&self) -> Policy {
        Policy::new(&self.config.email_domain)
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();
    let ctx = Context {
        config,
        storage,
        api_url: cli.api_url,
    };

    match cli.command {
        Command::Form { command } => form::run(&ctx, command),
        Command::Ref { command } => reference::run(&ctx, &command),
        Command::Auth { command } => auth::run(&ctx, command),
        Command::Dashboard { command } => dashboard::run(&ctx, command),
    }
}

/// Split `key=value`. The value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(parse_assignment("nama=Budi").unwrap(), ("nama", "Budi"));
        assert_eq!(
            parse_assignment("uraian=a=b").unwrap(),
            ("uraian", "a=b")
        );
        assert_eq!(parse_assignment("email=").unwrap(), ("email", ""));
        assert!(parse_assignment("nama").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn parses_global_api_url() {
        let cli = Cli::try_parse_from([
            "lapor",
            "form",
            "show",
            "--api-url",
            "http://127.0.0.1:3000",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://127.0.0.1:3000"));
    }
}
