use super::command::{CommandFactory, Exit, Factory, Flow, MenuCommand, Session};
use super::{Interpreter, load_store, money, parse_load_mode, save_store};
use crate::inventory::{InventoryItem, ItemPatch};
use crate::record::{Stocked, parse_amount, parse_count, require_text};
use crate::store::{RecordStore, Statistics};
use anyhow::Result;
use argh::FromArgs;
use regex::RegexBuilder;
use std::io::{self, Write};
use std::path::PathBuf;

pub struct InventorySession {
    pub store: RecordStore<InventoryItem>,
    /// Used by save and load when no path is given.
    pub data_file: PathBuf,
}

impl InventorySession {
    pub fn new(data_file: PathBuf) -> Self {
        Self {
            store: RecordStore::new(),
            data_file,
        }
    }
}

impl Session for InventorySession {
    fn title(&self) -> &str {
        "Inventory"
    }

    fn summary(&self, out: &mut dyn Write) -> io::Result<()> {
        let value: f64 = self.store.list().iter().map(Stocked::value).sum();
        writeln!(
            out,
            "Closing inventory: {} item(s), total value {}.",
            self.store.len(),
            money(value)
        )
    }
}

pub fn inventory_console(session: InventorySession) -> Interpreter<InventorySession> {
    let commands: Vec<Box<dyn CommandFactory<InventorySession>>> = vec![
        Box::new(Factory::<AddItem>::default()),
        Box::new(Factory::<ListItems>::default()),
        Box::new(Factory::<FindItem>::default()),
        Box::new(Factory::<UpdateItem>::default()),
        Box::new(Factory::<DeleteItem>::default()),
        Box::new(Factory::<ItemStats>::default()),
        Box::new(Factory::<SaveItems>::default()),
        Box::new(Factory::<LoadItems>::default()),
        Box::new(Factory::<SearchItems>::default()),
        Box::new(Factory::<Exit>::default()),
    ];
    Interpreter::new(session, commands)
}

fn write_item(out: &mut dyn Write, item: &InventoryItem) -> io::Result<()> {
    writeln!(
        out,
        "  {:<24} {:>10}  x{:<6} = {}",
        item.name,
        money(item.price),
        item.quantity,
        money(item.value())
    )
}

#[derive(FromArgs)]
/// Add a new product to the inventory.
pub struct AddItem {
    #[argh(positional)]
    /// product name; quote it if it has spaces.
    pub name: String,

    #[argh(positional)]
    /// unit price, zero or more.
    pub price: String,

    #[argh(positional)]
    /// units in stock.
    pub quantity: String,
}

impl MenuCommand<InventorySession> for AddItem {
    const NAME: &'static str = "add";
    const OPTION: u32 = 1;
    const SUMMARY: &'static str = "Add product";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        let name = require_text("name", &self.name)?;
        let item = InventoryItem::new(
            name,
            parse_amount("price", &self.price)?,
            parse_count("quantity", &self.quantity)?,
        );
        session.store.insert(item)?;
        writeln!(out, "Added '{name}'.")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List every product in insertion order.
pub struct ListItems {}

impl MenuCommand<InventorySession> for ListItems {
    const NAME: &'static str = "list";
    const OPTION: u32 = 2;
    const SUMMARY: &'static str = "List products";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        if session.store.is_empty() {
            writeln!(out, "The inventory is empty.")?;
            return Ok(Flow::Continue);
        }
        for item in session.store.list() {
            write_item(out, item)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Show one product by name (case-insensitive).
pub struct FindItem {
    #[argh(positional)]
    /// product name.
    pub name: String,
}

impl MenuCommand<InventorySession> for FindItem {
    const NAME: &'static str = "find";
    const OPTION: u32 = 3;
    const SUMMARY: &'static str = "Find product";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        let item = session.store.find(self.name.trim())?;
        write_item(out, item)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change the price and/or quantity of a product.
pub struct UpdateItem {
    #[argh(positional)]
    /// product name.
    pub name: String,

    #[argh(option)]
    /// new unit price.
    pub price: Option<String>,

    #[argh(option)]
    /// new quantity.
    pub quantity: Option<String>,
}

impl MenuCommand<InventorySession> for UpdateItem {
    const NAME: &'static str = "update";
    const OPTION: u32 = 4;
    const SUMMARY: &'static str = "Update product";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        let patch = ItemPatch {
            price: self
                .price
                .as_deref()
                .map(|p| parse_amount("price", p))
                .transpose()?,
            quantity: self
                .quantity
                .as_deref()
                .map(|q| parse_count("quantity", q))
                .transpose()?,
        };
        if patch.is_empty() {
            // Still report unknown names.
            session.store.find(self.name.trim())?;
            writeln!(out, "Nothing to update; pass --price and/or --quantity.")?;
            return Ok(Flow::Continue);
        }
        let item = session.store.update(self.name.trim(), &patch)?;
        writeln!(out, "Updated:")?;
        write_item(out, item)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Remove a product.
pub struct DeleteItem {
    #[argh(positional)]
    /// product name.
    pub name: String,
}

impl MenuCommand<InventorySession> for DeleteItem {
    const NAME: &'static str = "delete";
    const OPTION: u32 = 5;
    const SUMMARY: &'static str = "Delete product";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        let removed = session.store.delete(self.name.trim())?;
        writeln!(out, "Deleted '{}'.", removed.name)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Show totals and the most expensive and most stocked products.
pub struct ItemStats {}

impl MenuCommand<InventorySession> for ItemStats {
    const NAME: &'static str = "stats";
    const OPTION: u32 = 6;
    const SUMMARY: &'static str = "Statistics";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        match session.store.statistics() {
            Statistics::Empty => writeln!(out, "No products to summarize.")?,
            Statistics::Summary {
                records,
                total_units,
                total_value,
                max_price,
                max_quantity,
            } => {
                writeln!(out, "Products:        {records}")?;
                writeln!(out, "Units in stock:  {total_units}")?;
                writeln!(out, "Total value:     {}", money(total_value))?;
                writeln!(
                    out,
                    "Most expensive:  {} ({})",
                    max_price.name,
                    money(max_price.price)
                )?;
                writeln!(
                    out,
                    "Most stocked:    {} ({} units)",
                    max_quantity.name, max_quantity.quantity
                )?;
            }
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Save the inventory as CSV.
pub struct SaveItems {
    #[argh(positional)]
    /// target file; the configured data file by default.
    pub path: Option<PathBuf>,
}

impl MenuCommand<InventorySession> for SaveItems {
    const NAME: &'static str = "save";
    const OPTION: u32 = 7;
    const SUMMARY: &'static str = "Save to CSV";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        let path = self.path.unwrap_or_else(|| session.data_file.clone());
        save_store(&session.store, &path, out)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Load products from CSV.
pub struct LoadItems {
    #[argh(positional)]
    /// source file; the configured data file by default.
    pub path: Option<PathBuf>,

    #[argh(option, short = 'm')]
    /// merge or overwrite; required when the inventory is not empty.
    pub mode: Option<String>,
}

impl MenuCommand<InventorySession> for LoadItems {
    const NAME: &'static str = "load";
    const OPTION: u32 = 8;
    const SUMMARY: &'static str = "Load from CSV";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        let mode = parse_load_mode(self.mode.as_deref())?;
        let path = self.path.unwrap_or_else(|| session.data_file.clone());
        load_store(&mut session.store, &path, mode, out)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Search product names with a regular expression.
pub struct SearchItems {
    #[argh(positional)]
    /// pattern, e.g. '^mouse'.
    pub pattern: String,

    #[argh(switch, short = 'i')]
    /// ignore case.
    pub ignore_case: bool,
}

impl MenuCommand<InventorySession> for SearchItems {
    const NAME: &'static str = "search";
    const OPTION: u32 = 9;
    const SUMMARY: &'static str = "Search products";

    fn execute(self, out: &mut dyn Write, session: &mut InventorySession) -> Result<Flow> {
        let pattern = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.ignore_case)
            .build()?;
        let mut found = 0;
        for item in session.store.search(&pattern) {
            write_item(out, item)?;
            found += 1;
        }
        if found == 0 {
            writeln!(out, "No product matches '{}'.", self.pattern)?;
        }
        Ok(Flow::Continue)
    }
}
