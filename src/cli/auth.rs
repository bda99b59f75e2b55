//! Session commands: login, logout, status.

use std::io::{self, BufRead};

use clap::Subcommand;
use jiff::Timestamp;

use crate::auth;

use super::Context;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in to the dashboard.
    ///
    /// Without `--password`, the password is read from the first line of stdin.
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session.
    Logout,

    /// Show who is logged in and until when.
    Status,
}

pub(super) fn run(ctx: &Context<'_>, command: AuthCommand) -> Result<(), String> {
    match command {
        AuthCommand::Login { username, password } => cmd_login(ctx, &username, password),
        AuthCommand::Logout => cmd_logout(ctx),
        AuthCommand::Status => cmd_status(ctx),
    }
}

fn cmd_login(ctx: &Context<'_>, username: &str, password: Option<String>) -> Result<(), String> {
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };
    if password.is_empty() {
        return Err("password is empty".to_string());
    }

    let session = auth::login(ctx.storage, &ctx.api()?, username, &password, Timestamp::now())
        .map_err(|e| format!("login failed: {e}"))?;

    println!("/dashboard");
    eprintln!("Logged in as {} until {}", session.username, session.expires_at);
    Ok(())
}

fn read_password() -> Result<String, String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("failed to read password from stdin: {e}"))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn cmd_logout(ctx: &Context<'_>) -> Result<(), String> {
    auth::logout(ctx.storage).map_err(|e| e.to_string())?;
    println!("{}", auth::LOGIN_ROUTE);
    eprintln!("Logged out");
    Ok(())
}

fn cmd_status(ctx: &Context<'_>) -> Result<(), String> {
    let session = ctx
        .storage
        .load_session()
        .map_err(|e| format!("failed to read session: {e}"))?;

    match session {
        Some(s) if s.expires_at > Timestamp::now() => {
            println!("Logged in as {} until {}", s.username, s.expires_at);
        }
        Some(s) => println!(
            "Session for {} expired at {} (refreshed on next use)",
            s.username, s.expires_at
        ),
        None => println!("Not logged in"),
    }
    Ok(())
}
