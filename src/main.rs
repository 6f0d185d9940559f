use anyhow::{Context, Result};
use argh::FromArgs;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use stockroom::config::{Mode, Settings, SettingsLoader};
use stockroom::console::{
    GradesSession, Interpreter, InventorySession, Session, ShopSession, grades_console,
    inventory_console, shop_console,
};
use stockroom::gradebook::Gradebook;
use stockroom::persist::{self, TabularRecord};
use stockroom::record::Stocked;
use stockroom::shop::Shop;
use stockroom::store::RecordStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Inventory, shop and gradebook consoles.
struct Args {
    #[argh(option)]
    /// console to run: inventory, shop or grades.
    mode: Option<Mode>,

    #[argh(option)]
    /// extra TOML config file, applied over stockroom.toml.
    config: Option<PathBuf>,

    #[argh(option)]
    /// CSV file to load before the console starts (inventory and shop).
    load: Option<PathBuf>,

    #[argh(switch)]
    /// start the shop with an empty catalog.
    no_seed: bool,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let mut loader = SettingsLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let mut settings = loader.load()?;
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    // A preloaded catalog replaces the built-in one.
    if args.no_seed || (settings.mode == Mode::Shop && args.load.is_some()) {
        settings.shop.seed_catalog = false;
    }

    init_tracing(&settings.log_filter);
    info!(mode = %settings.mode, "starting");

    match settings.mode {
        Mode::Inventory => {
            let mut session = InventorySession::new(settings.data_file.clone());
            if let Some(path) = &args.load {
                preload(&mut session.store, path)?;
            }
            run(inventory_console(session), &settings)
        }
        Mode::Shop => {
            let mut shop = Shop::new(settings.shop.clone());
            if let Some(path) = &args.load {
                preload(shop.catalog_mut(), path)?;
            }
            let session = ShopSession::new(shop, settings.catalog_file.clone());
            run(shop_console(session), &settings)
        }
        Mode::Grades => {
            if args.load.is_some() {
                warn!("--load is ignored by the gradebook");
            }
            let book = Gradebook::new(settings.grades.scale());
            run(grades_console(GradesSession::new(book)), &settings)
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn preload<R: TabularRecord + Stocked>(store: &mut RecordStore<R>, path: &Path) -> Result<()> {
    let loaded = persist::load::<R>(path)
        .with_context(|| format!("could not preload {}", path.display()))?;
    for skipped in &loaded.skipped {
        eprintln!("skipped line {}: {}", skipped.line, skipped.reason);
    }
    let outcome = persist::merge(store, loaded.records)?;
    println!("Loaded {} record(s) from {}.", outcome.added + outcome.updated, path.display());
    Ok(())
}

fn run<S: Session>(mut console: Interpreter<S>, settings: &Settings) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    if let Some(history) = &settings.history_file {
        if let Err(err) = editor.load_history(history) {
            info!(path = %history.display(), %err, "no history loaded");
        }
    }

    let mut stdout = io::stdout();
    console.repl(&mut editor, &mut stdout)?;
    stdout.flush()?;

    if let Some(history) = &settings.history_file {
        if let Err(err) = editor.save_history(history) {
            warn!(path = %history.display(), %err, "could not save history");
        }
    }
    Ok(())
}
