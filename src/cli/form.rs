//! Draft commands: new, set, anonymous, attach, detach, show, validate,
//! submit, resume, discard.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use crate::dispatch::{self, Submission, SubmissionResult};
use crate::engine::FormEngine;
use crate::model::{AttachmentHandle, FormKind};
use crate::reference;
use crate::storage::DraftStore;

use super::format::{format_attachments, format_entries, format_errors};
use super::{Context, parse_assignment};

#[derive(Debug, Subcommand)]
pub enum FormCommand {
    /// Start a new draft. Prints the form's route.
    New {
        form: FormArg,

        /// Replace a draft that is already in progress.
        #[arg(long)]
        force: bool,
    },

    /// Set one or more fields.
    ///
    /// Selector fields (`klasifikasi`, `jenis_pengaduan`, `jenis_laporan`,
    /// `bentuk`, `jenis_pelaporan`, `kategori_fasilitas`) switch branches.
    /// An empty value clears a field.
    Set {
        /// `key=value` pairs, applied in order.
        #[arg(required = true, value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },

    /// Report anonymously, or stop.
    ///
    /// While on, the name is fixed to `Anonim`. Turning it off leaves the
    /// name empty unless `--restore` brings back the earlier one.
    Anonymous {
        state: Toggle,

        /// With `off`: restore the name typed before going anonymous.
        #[arg(long)]
        restore: bool,
    },

    /// Attach files to the active branch.
    Attach {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove an attachment by its position in `form show` (1-based).
    Detach { index: usize },

    /// Show the draft.
    Show {
        /// Print the stored draft as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check the draft against every rule without submitting.
    Validate,

    /// Validate and submit. Prints the route the outcome leads to.
    Submit,

    /// Print the route of the draft in progress.
    Resume,

    /// Throw the draft away.
    Discard,
}

/// CLI-facing form, mapped to the domain `FormKind`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormArg {
    /// School service form: complaint, information request, suggestion.
    Laporan,
    /// General public complaint.
    Dumas,
    /// Gratification report.
    Gratifikasi,
    /// Conflict-of-interest report.
    Benturan,
}

impl FormArg {
    fn to_domain(self) -> FormKind {
        match self {
            Self::Laporan => FormKind::Laporan,
            Self::Dumas => FormKind::Dumas,
            Self::Gratifikasi => FormKind::Gratifikasi,
            Self::Benturan => FormKind::Benturan,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

pub(super) fn run(ctx: &Context<'_>, command: FormCommand) -> Result<(), String> {
    match command {
        FormCommand::New { form, force } => cmd_new(ctx, form.to_domain(), force),
        FormCommand::Set { assignments } => cmd_set(ctx, &assignments),
        FormCommand::Anonymous { state, restore } => cmd_anonymous(ctx, state, restore),
        FormCommand::Attach { paths } => cmd_attach(ctx, &paths),
        FormCommand::Detach { index } => cmd_detach(ctx, index),
        FormCommand::Show { json } => cmd_show(ctx, json),
        FormCommand::Validate => cmd_validate(ctx),
        FormCommand::Submit => cmd_submit(ctx),
        FormCommand::Resume => cmd_resume(ctx),
        FormCommand::Discard => cmd_discard(ctx),
    }
}

/// Mount the stored draft or explain how to start one.
fn require_draft<'s>(ctx: &Context<'s>) -> Result<FormEngine<'s>, String> {
    FormEngine::mount(ctx.storage, ctx.policy())
        .ok_or_else(|| "no draft in progress: start one with `lapor form new <form>`".to_string())
}

fn cmd_new(ctx: &Context<'_>, kind: FormKind, force: bool) -> Result<(), String> {
    if !force && let Some(existing) = FormEngine::mount(ctx.storage, ctx.policy()) {
        return Err(format!(
            "a {} draft is already in progress at {}\n\
             Continue it with `lapor form show`, or pass --force to start over.",
            existing.kind().name(),
            existing.kind().route()
        ));
    }

    let engine = FormEngine::start(kind, ctx.storage, ctx.policy());
    println!("{}", kind.route());
    eprintln!("Started {} draft {}", kind.name(), engine.draft().id);
    Ok(())
}

fn cmd_set(ctx: &Context<'_>, assignments: &[String]) -> Result<(), String> {
    let mut engine = require_draft(ctx)?;

    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        engine.set(key, value).map_err(|e| e.to_string())?;
    }

    let chain = engine.draft().form.fields().selection();
    if !chain.is_empty() {
        eprintln!("Branch: {}", chain.join(" › "));
    }
    if engine.shows_error_summary() {
        eprintln!("Still to fix:\n{}", format_errors(&engine.errors()));
    }
    Ok(())
}

fn cmd_anonymous(ctx: &Context<'_>, state: Toggle, restore: bool) -> Result<(), String> {
    let mut engine = require_draft(ctx)?;

    match state {
        Toggle::On => {
            if restore {
                return Err("--restore only applies to `off`".to_string());
            }
            engine.set_anonymous(true);
            eprintln!("Reporting anonymously");
        }
        Toggle::Off => {
            engine.set_anonymous(false);
            if restore && !engine.restore_name() {
                eprintln!("No earlier name to restore; set one with `lapor form set nama=...`");
            }
            let name = &engine.draft().reporter.nama;
            if name.is_empty() {
                eprintln!("Reporting by name (name is empty)");
            } else {
                eprintln!("Reporting as {name}");
            }
        }
    }
    Ok(())
}

fn cmd_attach(ctx: &Context<'_>, paths: &[PathBuf]) -> Result<(), String> {
    let mut engine = require_draft(ctx)?;

    for path in paths {
        let handle = AttachmentHandle::from_path(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        let name = handle.name().to_string();
        engine.attach(handle).map_err(|e| e.to_string())?;
        eprintln!("Attached {name}");
    }
    Ok(())
}

fn cmd_detach(ctx: &Context<'_>, index: usize) -> Result<(), String> {
    let mut engine = require_draft(ctx)?;
    let position = index
        .checked_sub(1)
        .ok_or("attachment positions start at 1")?;

    // The client must exist before an uploaded file leaves the draft, or its
    // server copy could never be reverted.
    let uploaded = engine
        .attachments()
        .get(position)
        .is_some_and(|h| h.server_id().is_some());
    let api = if uploaded { Some(ctx.api()?) } else { None };

    let handle = engine.detach(position).map_err(|e| e.to_string())?;
    if let Some(api) = api {
        dispatch::revert_attachment(&api, &handle);
    }
    eprintln!("Removed {}", handle.name());
    Ok(())
}

fn cmd_show(ctx: &Context<'_>, json: bool) -> Result<(), String> {
    let engine = require_draft(ctx)?;
    let draft = engine.draft();

    if json {
        let out = serde_json::to_string_pretty(draft)
            .map_err(|e| format!("failed to serialize draft: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    let chain = draft.form.fields().selection();
    println!("{} draft {} ({})", draft.kind().name(), draft.id, draft.kind().route());
    if !chain.is_empty() {
        println!("Branch: {}", chain.join(" › "));
    }
    if draft.reporter.anonim {
        println!("Anonymous: yes");
    }
    println!("{}", format_entries(&engine.entries()));
    let attachments = engine.attachments();
    if !attachments.is_empty() {
        println!("Attachments:\n{}", format_attachments(attachments));
    }
    if engine.shows_error_summary() {
        println!("Errors:\n{}", format_errors(&engine.errors()));
    }
    Ok(())
}

fn cmd_validate(ctx: &Context<'_>) -> Result<(), String> {
    let engine = require_draft(ctx)?;
    let engine = engine.with_options(load_options(ctx)?);

    let errors = engine.errors();
    if errors.is_empty() {
        println!("Ready to submit");
        return Ok(());
    }
    println!("{}", format_errors(&errors));
    Err(format!("{} field(s) need attention", errors.len()))
}

fn cmd_submit(ctx: &Context<'_>) -> Result<(), String> {
    let engine = require_draft(ctx)?;
    let api = ctx.api()?;
    let engine = engine.with_options(load_options(ctx)?);

    match dispatch::submit(engine, &api) {
        Submission::Blocked(errors) => {
            eprintln!("{}", format_errors(&errors));
            Err(format!("fix {} field(s) before submitting", errors.len()))
        }
        Submission::Sent(result) => {
            println!("{}", result.route());
            match result {
                SubmissionResult::Success {
                    tracking_code,
                    message,
                } => {
                    if let Some(message) = message {
                        eprintln!("{message}");
                    }
                    if let Some(code) = tracking_code {
                        eprintln!("Tracking code: {code}");
                    }
                    Ok(())
                }
                SubmissionResult::Failure { message } => Err(format!(
                    "submission failed: {message}\n\
                     The draft is kept. Run `lapor form resume` to return to it."
                )),
            }
        }
    }
}

fn cmd_resume(ctx: &Context<'_>) -> Result<(), String> {
    let route = ctx
        .storage
        .last_form_path()
        .map_err(|e| format!("failed to read draft route: {e}"))?;

    match route {
        Some(route) => {
            println!("{route}");
            if let Some(kind) = FormKind::from_route(&route) {
                eprintln!("Continue the {} draft with `lapor form show`", kind.name());
            }
        }
        None => println!("No draft in progress"),
    }
    Ok(())
}

fn cmd_discard(ctx: &Context<'_>) -> Result<(), String> {
    ctx.storage
        .clear()
        .map_err(|e| format!("failed to discard draft: {e}"))?;
    eprintln!("Draft discarded");
    Ok(())
}

/// Reference lists for membership checks. Lists that fail are reported and skipped.
fn load_options(ctx: &Context<'_>) -> Result<crate::model::ReferenceData, String> {
    let loaded = reference::load(&ctx.api()?);
    for notice in &loaded.notices {
        eprintln!("Warning: {notice}");
    }
    Ok(loaded.data)
}
