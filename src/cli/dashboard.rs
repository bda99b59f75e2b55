//! Dashboard commands: summary, list, watch, update.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Subcommand, ValueEnum};
use jiff::{Timestamp, Zoned};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth;
use crate::dashboard::{ListWatch, Ticket, page_view};
use crate::model::{ListQuery, ReportKind, ReportPage};

use super::format::{format_summary, format_table};
use super::{Context, parse_assignment};

#[derive(Debug, Subcommand)]
pub enum DashboardCommand {
    /// Show the summary cards.
    Summary {
        /// Period filter passed through to the backend (e.g. `bulanan`).
        #[arg(long)]
        period: Option<String>,

        #[arg(long)]
        year: Option<i32>,
    },

    /// List one page of reports.
    List {
        kind: ReportArg,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Rows per page. Defaults to `page-size` from the config.
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        search: Option<String>,
    },

    /// Keep a list on screen, refreshing it periodically.
    ///
    /// Commands on stdin: `n` next page, `p` previous page, `r` refresh now,
    /// `/text` search (empty `/` clears), `q` quit.
    Watch {
        kind: ReportArg,

        #[arg(long)]
        search: Option<String>,
    },

    /// Change fields of a submitted report, e.g. `status=diproses`.
    Update {
        kind: ReportArg,

        id: String,

        #[arg(required = true, value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportArg {
    Dumas,
    Saran,
    Gratifikasi,
    Benturan,
    Informasi,
}

impl ReportArg {
    fn to_domain(self) -> ReportKind {
        match self {
            Self::Dumas => ReportKind::Dumas,
            Self::Saran => ReportKind::Saran,
            Self::Gratifikasi => ReportKind::Gratifikasi,
            Self::Benturan => ReportKind::BenturanKepentingan,
            Self::Informasi => ReportKind::PermintaanInformasi,
        }
    }
}

pub(super) fn run(ctx: &Context<'_>, command: DashboardCommand) -> Result<(), String> {
    match command {
        DashboardCommand::Summary { period, year } => cmd_summary(ctx, period.as_deref(), year),
        DashboardCommand::List {
            kind,
            page,
            limit,
            search,
        } => {
            let query = ListQuery {
                page,
                limit: limit.unwrap_or(ctx.config.page_size),
                search,
            };
            cmd_list(ctx, kind.to_domain(), &query)
        }
        DashboardCommand::Watch { kind, search } => cmd_watch(ctx, kind.to_domain(), search),
        DashboardCommand::Update {
            kind,
            id,
            assignments,
        } => cmd_update(ctx, kind.to_domain(), &id, &assignments),
    }
}

/// A client carrying a valid session token.
fn authed(ctx: &Context<'_>) -> Result<ApiClient, String> {
    let api = ctx.api()?;
    let session = auth::authorize(ctx.storage, &api, Timestamp::now()).map_err(|e| e.to_string())?;
    Ok(api.with_token(session.access_token))
}

/// Turn a backend error into a message, dropping the session on a 401.
fn rejected(ctx: &Context<'_>, err: ApiError) -> String {
    match err {
        ApiError::Unauthorized(_) => auth::expire(ctx.storage).to_string(),
        other => other.to_string(),
    }
}

fn cmd_summary(ctx: &Context<'_>, period: Option<&str>, year: Option<i32>) -> Result<(), String> {
    let api = authed(ctx)?;
    let summary = api.summary(period, year).map_err(|e| rejected(ctx, e))?;
    println!("{}", format_summary(&summary));
    Ok(())
}

fn cmd_list(ctx: &Context<'_>, kind: ReportKind, query: &ListQuery) -> Result<(), String> {
    let api = authed(ctx)?;
    let page = api.list_reports(kind, query).map_err(|e| rejected(ctx, e))?;
    println!("{}", format_table(kind, &page_view(page, query)));
    Ok(())
}

fn cmd_update(
    ctx: &Context<'_>,
    kind: ReportKind,
    id: &str,
    assignments: &[String],
) -> Result<(), String> {
    let mut fields = Map::new();
    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        fields.insert(key.to_string(), Value::String(value.to_string()));
    }

    let api = authed(ctx)?;
    let reply = api
        .update_report(kind, id, &fields)
        .map_err(|e| rejected(ctx, e))?;
    eprintln!("{}", reply.message.as_deref().unwrap_or("Report updated"));
    Ok(())
}

// ── Watch ──

enum Event {
    Line(String),
    Closed,
    Fetched {
        ticket: Ticket,
        query: ListQuery,
        result: Result<ReportPage, ApiError>,
    },
}

enum Input {
    Next,
    Prev,
    Refresh,
    Search(String),
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if let Some(search) = line.strip_prefix('/') {
        return Input::Search(search.trim().to_string());
    }
    match line {
        "n" => Input::Next,
        "p" => Input::Prev,
        "r" | "" => Input::Refresh,
        "q" => Input::Quit,
        _ => Input::Unknown,
    }
}

fn spawn_stdin(tx: Sender<Event>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::Closed);
    });
}

fn spawn_fetch(
    tx: Sender<Event>,
    api: ApiClient,
    kind: ReportKind,
    ticket: Ticket,
    query: ListQuery,
) {
    thread::spawn(move || {
        let result = api.list_reports(kind, &query);
        // The receiver is gone once the loop has quit.
        let _ = tx.send(Event::Fetched {
            ticket,
            query,
            result,
        });
    });
}

fn cmd_watch(ctx: &Context<'_>, kind: ReportKind, search: Option<String>) -> Result<(), String> {
    let initial = ListQuery {
        page: 1,
        limit: ctx.config.page_size,
        search,
    };
    let mut watch = ListWatch::new(
        initial,
        ctx.config.poll_interval(),
        ctx.config.debounce(),
        Instant::now(),
    );

    let (tx, rx) = mpsc::channel();
    spawn_stdin(tx.clone());
    eprintln!("Watching {}. n/p page, r refresh, /text search, q quit", kind.segment());

    let outcome = loop {
        if let Some((ticket, query)) = watch.tick(Instant::now()) {
            let api = match authed(ctx) {
                Ok(api) => api,
                Err(e) => break Err(e),
            };
            debug!(page = query.page, search = ?query.search, "watch fetch");
            spawn_fetch(tx.clone(), api, kind, ticket, query);
        }

        let wait = watch.wake_at().saturating_duration_since(Instant::now());
        let event = match rx.recv_timeout(wait.max(Duration::from_millis(10))) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break Ok(()),
        };

        match event {
            Event::Fetched {
                ticket,
                query,
                result,
            } => match watch.accept(ticket, &query, result) {
                None => debug!("dropped stale watch result"),
                Some(Ok(view)) => render(kind, &query, &format_table(kind, &view)),
                Some(Err(e @ ApiError::Unauthorized(_))) => break Err(rejected(ctx, e)),
                Some(Err(e)) => warn!(error = %e, "watch refresh failed, retrying next tick"),
            },
            Event::Line(line) => {
                let now = Instant::now();
                match parse_input(&line) {
                    Input::Next => {
                        if !watch.turn(true, now) {
                            eprintln!("Already on the last page");
                        }
                    }
                    Input::Prev => {
                        if !watch.turn(false, now) {
                            eprintln!("Already on the first page");
                        }
                    }
                    Input::Refresh => watch.refresh(now),
                    Input::Search(text) => watch.search(text, now),
                    Input::Quit => break Ok(()),
                    Input::Unknown => eprintln!("Unknown command: {}", line.trim()),
                }
            }
            Event::Closed => break Ok(()),
        }
    };

    watch.stop();
    outcome
}

fn render(kind: ReportKind, query: &ListQuery, table: &str) {
    let stamp = Zoned::now().strftime("%H:%M:%S");
    match query.search.as_deref() {
        Some(search) => println!("\n{} matching \"{search}\" at {stamp}", kind.segment()),
        None => println!("\n{} at {stamp}", kind.segment()),
    }
    println!("{table}");
}
