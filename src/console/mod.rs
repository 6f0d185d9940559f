//! Interactive consoles: the inventory, the shop and the gradebook.

mod command;
mod grades;
mod interpreter;
mod inventory;
mod lexer;
mod shop;

pub use command::{CommandFactory, ExecutableCommand, Flow, Session};
pub use grades::{GradesSession, grades_console};
pub use interpreter::{Interpreter, LineSource};
pub use inventory::{InventorySession, inventory_console};
pub use lexer::{LexingError, split_into_words};
pub use shop::{ShopSession, shop_console};

use crate::persist::{self, LoadMode, TabularRecord};
use crate::record::Stocked;
use crate::store::RecordStore;
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::Path;

fn parse_load_mode(mode: Option<&str>) -> Result<Option<LoadMode>> {
    mode.map(|m| m.parse::<LoadMode>().map_err(anyhow::Error::msg))
        .transpose()
}

/// Save `store` to `path` and report the row count.
fn save_store<R: TabularRecord>(
    store: &RecordStore<R>,
    path: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    let written = persist::save(store.list(), path)
        .with_context(|| format!("could not save to {}", path.display()))?;
    writeln!(out, "Saved {written} record(s) to {}.", path.display())?;
    Ok(())
}

/// Load `path` into `store`.
///
/// A non-empty store needs an explicit `mode`; an empty one takes the rows
/// as they are.
fn load_store<R: TabularRecord + Stocked>(
    store: &mut RecordStore<R>,
    path: &Path,
    mode: Option<LoadMode>,
    out: &mut dyn Write,
) -> Result<()> {
    let mode = match (mode, store.is_empty()) {
        (Some(mode), _) => mode,
        (None, true) => LoadMode::Overwrite,
        (None, false) => bail!(
            "the store already has {} record(s); pass --mode merge or --mode overwrite",
            store.len()
        ),
    };
    let loaded = persist::load::<R>(path)
        .with_context(|| format!("could not load {}", path.display()))?;
    for skipped in &loaded.skipped {
        writeln!(out, "  skipped line {}: {}", skipped.line, skipped.reason)?;
    }
    let outcome = persist::apply(mode, store, loaded.records)?;
    writeln!(
        out,
        "Loaded {}: {} added, {} merged, {} skipped.",
        path.display(),
        outcome.added,
        outcome.updated,
        loaded.skipped.len()
    )?;
    Ok(())
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}
