//! Reference list commands.

use clap::Subcommand;

use crate::model::ReferenceList;
use crate::reference;

use super::Context;

#[derive(Debug, Subcommand)]
pub enum RefCommand {
    /// List work units and conflict types with their ids.
    ///
    /// Use the ids for `program_keahlian`, `unit_kerja`, and `jenis_benturan`.
    List,
}

pub(super) fn run(ctx: &Context<'_>, command: &RefCommand) -> Result<(), String> {
    match command {
        RefCommand::List => cmd_list(ctx),
    }
}

fn cmd_list(ctx: &Context<'_>) -> Result<(), String> {
    let loaded = reference::load(&ctx.api()?);
    for notice in &loaded.notices {
        eprintln!("Warning: {notice}");
    }

    for list in ReferenceList::ALL {
        let options = loaded.data.options(list);
        println!("{}:", list.label());
        if options.is_empty() {
            println!("  (none)");
        }
        for option in options {
            println!("  {:>4}  {}", option.id, option.label);
        }
    }
    Ok(())
}
