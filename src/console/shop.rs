use super::command::{CommandFactory, Exit, Factory, Flow, MenuCommand, Session};
use super::{Interpreter, load_store, money, parse_load_mode, save_store};
use crate::catalog::{Product, ProductPatch};
use crate::error::ValidationError;
use crate::record::{Stocked, parse_amount, parse_count, require_text};
use crate::shop::Shop;
use anyhow::Result;
use argh::FromArgs;
use std::io::{self, Write};
use std::path::PathBuf;

pub struct ShopSession {
    pub shop: Shop,
    /// Used by save and load when no path is given.
    pub catalog_file: PathBuf,
}

impl ShopSession {
    pub fn new(shop: Shop, catalog_file: PathBuf) -> Self {
        Self { shop, catalog_file }
    }
}

impl Session for ShopSession {
    fn title(&self) -> &str {
        "Electronics shop"
    }

    fn summary(&self, out: &mut dyn Write) -> io::Result<()> {
        let ledger = self.shop.ledger();
        writeln!(
            out,
            "Closing shop: {} sale(s), revenue {}, {} product(s) in catalog.",
            ledger.len(),
            money(ledger.revenue()),
            self.shop.catalog().len()
        )
    }
}

pub fn shop_console(session: ShopSession) -> Interpreter<ShopSession> {
    let commands: Vec<Box<dyn CommandFactory<ShopSession>>> = vec![
        Box::new(Factory::<AddProduct>::default()),
        Box::new(Factory::<ListProducts>::default()),
        Box::new(Factory::<UpdateProduct>::default()),
        Box::new(Factory::<DeleteProduct>::default()),
        Box::new(Factory::<Sell>::default()),
        Box::new(Factory::<ListSales>::default()),
        Box::new(Factory::<TopSellers>::default()),
        Box::new(Factory::<Brands>::default()),
        Box::new(Factory::<Finance>::default()),
        Box::new(Factory::<Performance>::default()),
        Box::new(Factory::<SaveCatalog>::default()),
        Box::new(Factory::<LoadCatalog>::default()),
        Box::new(Factory::<Exit>::default()),
    ];
    Interpreter::new(session, commands)
}

const NO_SALES: &str = "No sales data yet.";

fn write_product(out: &mut dyn Write, p: &Product) -> io::Result<()> {
    writeln!(
        out,
        "  {:<8} {:<26} {:<10} {:<12} {:>10}  stock {:<4} warranty {}m",
        p.id,
        p.name,
        p.brand,
        p.category,
        money(p.price),
        p.stock,
        p.warranty_months
    )
}

fn optional<T>(
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, ValidationError>,
) -> Result<Option<T>> {
    Ok(value.map(parse).transpose()?)
}

#[derive(FromArgs)]
/// Add a product to the catalog.
pub struct AddProduct {
    #[argh(positional)]
    /// product id, e.g. PROD006.
    pub id: String,

    #[argh(positional)]
    /// product name.
    pub name: String,

    #[argh(positional)]
    /// brand.
    pub brand: String,

    #[argh(positional)]
    /// category.
    pub category: String,

    #[argh(positional)]
    /// unit price, greater than zero.
    pub price: String,

    #[argh(positional)]
    /// units in stock.
    pub stock: String,

    #[argh(positional)]
    /// warranty in months.
    pub warranty: String,
}

impl MenuCommand<ShopSession> for AddProduct {
    const NAME: &'static str = "add";
    const OPTION: u32 = 1;
    const SUMMARY: &'static str = "Add product";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let product = Product::new(
            require_text("id", &self.id)?,
            require_text("name", &self.name)?,
            require_text("brand", &self.brand)?,
            require_text("category", &self.category)?,
            parse_amount("price", &self.price)?,
            parse_count("stock", &self.stock)?,
            parse_count("warranty_months", &self.warranty)?,
        );
        let id = product.id.clone();
        session.shop.catalog_mut().insert(product)?;
        writeln!(out, "Added {id}.")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List the catalog.
pub struct ListProducts {}

impl MenuCommand<ShopSession> for ListProducts {
    const NAME: &'static str = "list";
    const OPTION: u32 = 2;
    const SUMMARY: &'static str = "List catalog";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let catalog = session.shop.catalog();
        if catalog.is_empty() {
            writeln!(out, "The catalog is empty.")?;
        }
        for product in catalog.list() {
            write_product(out, product)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change fields of a product; only the given options are applied.
pub struct UpdateProduct {
    #[argh(positional)]
    /// product id.
    pub id: String,

    #[argh(option)]
    /// new name.
    pub name: Option<String>,

    #[argh(option)]
    /// new brand.
    pub brand: Option<String>,

    #[argh(option)]
    /// new category.
    pub category: Option<String>,

    #[argh(option)]
    /// new unit price.
    pub price: Option<String>,

    #[argh(option)]
    /// new stock.
    pub stock: Option<String>,

    #[argh(option)]
    /// new warranty in months.
    pub warranty: Option<String>,
}

impl MenuCommand<ShopSession> for UpdateProduct {
    const NAME: &'static str = "update";
    const OPTION: u32 = 3;
    const SUMMARY: &'static str = "Update product";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let patch = ProductPatch {
            name: self.name.map(|s| s.trim().to_string()),
            brand: self.brand.map(|s| s.trim().to_string()),
            category: self.category.map(|s| s.trim().to_string()),
            price: optional(self.price.as_deref(), |p| parse_amount("price", p))?,
            stock: optional(self.stock.as_deref(), |s| parse_count("stock", s))?,
            warranty_months: optional(self.warranty.as_deref(), |w| {
                parse_count("warranty_months", w)
            })?,
        };
        let catalog = session.shop.catalog_mut();
        if patch.is_empty() {
            catalog.find(self.id.trim())?;
            writeln!(out, "Nothing to update; pass at least one option.")?;
            return Ok(Flow::Continue);
        }
        let product = catalog.update(self.id.trim(), &patch)?;
        writeln!(out, "Updated:")?;
        write_product(out, product)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Remove a product from the catalog; past sales are kept.
pub struct DeleteProduct {
    #[argh(positional)]
    /// product id.
    pub id: String,
}

impl MenuCommand<ShopSession> for DeleteProduct {
    const NAME: &'static str = "delete";
    const OPTION: u32 = 4;
    const SUMMARY: &'static str = "Delete product";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let removed = session.shop.catalog_mut().delete(self.id.trim())?;
        writeln!(out, "Deleted {} ({}).", removed.id, removed.name)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Register a sale and print the ticket.
pub struct Sell {
    #[argh(positional)]
    /// customer name.
    pub customer: String,

    #[argh(positional)]
    /// regular, member, vip or corporate.
    pub class: String,

    #[argh(positional)]
    /// product id.
    pub product: String,

    #[argh(positional)]
    /// units to sell.
    pub quantity: String,
}

impl MenuCommand<ShopSession> for Sell {
    const NAME: &'static str = "sell";
    const OPTION: u32 = 5;
    const SUMMARY: &'static str = "Register sale";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let quantity = parse_count("quantity", &self.quantity)?;
        let ticket = session
            .shop
            .record_sale(&self.customer, &self.class, &self.product, quantity)?;
        writeln!(out, "----- TICKET -----")?;
        writeln!(out, "Customer:   {} ({})", ticket.customer, ticket.class)?;
        writeln!(out, "Product:    {}", ticket.product_name)?;
        writeln!(
            out,
            "Quantity:   {} x {}",
            ticket.quantity,
            money(ticket.unit_price)
        )?;
        writeln!(out, "Subtotal:   {}", money(ticket.subtotal))?;
        writeln!(
            out,
            "Discount:   {} ({:.0}%)",
            money(ticket.discount),
            ticket.discount_rate * 100.0
        )?;
        writeln!(out, "Total:      {}", money(ticket.total))?;
        writeln!(out, "Stock left: {}", ticket.remaining_stock)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Show the sales history.
pub struct ListSales {}

impl MenuCommand<ShopSession> for ListSales {
    const NAME: &'static str = "sales";
    const OPTION: u32 = 6;
    const SUMMARY: &'static str = "Sales history";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let ledger = session.shop.ledger();
        if ledger.is_empty() {
            writeln!(out, "{NO_SALES}")?;
            return Ok(Flow::Continue);
        }
        for (n, e) in ledger.entries().iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {} {:<14} {:<9} {} x{} {}",
                n + 1,
                e.timestamp.format("%Y-%m-%d %H:%M"),
                e.customer,
                e.class,
                e.product_id,
                e.quantity,
                money(e.total)
            )?;
        }
        writeln!(out, "Total revenue: {}", money(ledger.revenue()))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Best-selling products by units.
pub struct TopSellers {}

impl MenuCommand<ShopSession> for TopSellers {
    const NAME: &'static str = "top";
    const OPTION: u32 = 7;
    const SUMMARY: &'static str = "Top sellers";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let Some(top) = session.shop.top_sellers() else {
            writeln!(out, "{NO_SALES}")?;
            return Ok(Flow::Continue);
        };
        for (rank, share) in top.iter().enumerate() {
            let p = share.item;
            writeln!(
                out,
                "{}. {} ({}) {} units, {:.1}% of units, revenue {}",
                rank + 1,
                p.name,
                p.brand,
                p.units,
                share.percent,
                money(p.revenue)
            )?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Revenue per brand.
pub struct Brands {}

impl MenuCommand<ShopSession> for Brands {
    const NAME: &'static str = "brands";
    const OPTION: u32 = 8;
    const SUMMARY: &'static str = "Sales by brand";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let Some(brands) = session.shop.brand_report() else {
            writeln!(out, "{NO_SALES}")?;
            return Ok(Flow::Continue);
        };
        for share in &brands {
            let b = share.item;
            writeln!(
                out,
                "  {:<12} {:>4} units  {:>12}  {:>5.1}%",
                b.brand,
                b.units,
                money(b.revenue),
                share.percent
            )?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Totals, discounts and a breakdown per customer class.
pub struct Finance {}

impl MenuCommand<ShopSession> for Finance {
    const NAME: &'static str = "finance";
    const OPTION: u32 = 9;
    const SUMMARY: &'static str = "Financial report";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let Some(report) = session.shop.financial_report() else {
            writeln!(out, "{NO_SALES}")?;
            return Ok(Flow::Continue);
        };
        let t = report.totals;
        writeln!(out, "Gross sales:    {}", money(t.subtotal))?;
        writeln!(
            out,
            "Discounts:      {} ({:.1}%)",
            money(t.discounts),
            report.discount_percent
        )?;
        writeln!(out, "Net revenue:    {}", money(t.net))?;
        writeln!(out, "Transactions:   {}", t.transactions)?;
        writeln!(out, "Average ticket: {}", money(report.average_ticket))?;
        writeln!(out, "By customer class:")?;
        for c in &report.classes {
            writeln!(
                out,
                "  {:<10} {:>3} sale(s)  revenue {:>12}  discounts {:>10}  avg {}",
                c.class,
                c.sales,
                money(c.revenue),
                money(c.discounts),
                money(c.average_ticket)
            )?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Cross sales with current stock: status, unsold products and rotation.
pub struct Performance {}

impl MenuCommand<ShopSession> for Performance {
    const NAME: &'static str = "performance";
    const OPTION: u32 = 10;
    const SUMMARY: &'static str = "Inventory performance";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let factor = session.shop.settings().rotation_factor;
        let Some(report) = session.shop.performance() else {
            writeln!(out, "{NO_SALES}")?;
            return Ok(Flow::Continue);
        };

        writeln!(out, "Products with sales:")?;
        for s in &report.sold {
            writeln!(
                out,
                "  {:<26} sold {:>4}  stock {:>4}  {}",
                s.sales.name,
                s.sales.units,
                s.stock,
                s.status.label()
            )?;
        }

        writeln!(out, "Products without sales:")?;
        if report.unsold.is_empty() {
            writeln!(out, "  none")?;
        }
        for p in &report.unsold {
            writeln!(out, "  {:<26} stock {:>4}  {}", p.name, p.stock, money(p.value()))?;
        }
        writeln!(out, "Stagnant inventory value: {}", money(report.stagnant_value))?;

        writeln!(out, "High rotation (sold more than remaining stock):")?;
        for r in &report.high_rotation {
            writeln!(out, "  {:<26} restock {} unit(s)", r.sales.name, r.units)?;
        }
        writeln!(out, "Low rotation (stock above {factor}x units sold):")?;
        for r in &report.low_rotation {
            writeln!(out, "  {:<26} excess {} unit(s)", r.sales.name, r.units)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Save the catalog as CSV.
pub struct SaveCatalog {
    #[argh(positional)]
    /// target file; the configured catalog file by default.
    pub path: Option<PathBuf>,
}

impl MenuCommand<ShopSession> for SaveCatalog {
    const NAME: &'static str = "save";
    const OPTION: u32 = 11;
    const SUMMARY: &'static str = "Save catalog";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let path = self.path.unwrap_or_else(|| session.catalog_file.clone());
        save_store(session.shop.catalog(), &path, out)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Load products from CSV into the catalog.
pub struct LoadCatalog {
    #[argh(positional)]
    /// source file; the configured catalog file by default.
    pub path: Option<PathBuf>,

    #[argh(option, short = 'm')]
    /// merge or overwrite; required when the catalog is not empty.
    pub mode: Option<String>,
}

impl MenuCommand<ShopSession> for LoadCatalog {
    const NAME: &'static str = "load";
    const OPTION: u32 = 12;
    const SUMMARY: &'static str = "Load catalog";

    fn execute(self, out: &mut dyn Write, session: &mut ShopSession) -> Result<Flow> {
        let mode = parse_load_mode(self.mode.as_deref())?;
        let path = self.path.unwrap_or_else(|| session.catalog_file.clone());
        load_store(session.shop.catalog_mut(), &path, mode, out)?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShopSettings;
    use crate::console::interpreter::tests::Script;
    use tempfile::TempDir;

    fn console(dir: &TempDir) -> Interpreter<ShopSession> {
        let shop = Shop::new(ShopSettings::default());
        shop_console(ShopSession::new(shop, dir.path().join("catalogo.csv")))
    }

    fn exec(sh: &mut Interpreter<ShopSession>, line: &str) -> Result<String> {
        let mut out = Vec::new();
        sh.execute_line(line, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_sell_prints_ticket() {
        let dir = TempDir::new().unwrap();
        let mut sh = console(&dir);
        let ticket = exec(&mut sh, "sell Ana corporativo PROD004 2").unwrap();
        assert!(ticket.contains("Customer:   Ana (corporate)"));
        assert!(ticket.contains("Subtotal:   $119.98"));
        assert!(ticket.contains("(15%)"));
        assert!(ticket.contains("Stock left: 58"));
    }

    #[test]
    fn test_sell_errors_leave_state() {
        let dir = TempDir::new().unwrap();
        let mut sh = console(&dir);
        let err = exec(&mut sh, "5 Ana vip PROD003 99").unwrap_err();
        assert!(err.to_string().contains("available 20, requested 99"));
        assert!(exec(&mut sh, "sell Ana vip PROD003 -1").is_err());
        assert!(exec(&mut sh, "sell Ana gold PROD003 1").is_err());
        assert!(sh.session().shop.ledger().is_empty());
    }

    #[test]
    fn test_reports_without_sales() {
        let dir = TempDir::new().unwrap();
        let mut sh = console(&dir);
        for cmd in ["sales", "top", "brands", "finance", "performance"] {
            assert_eq!(exec(&mut sh, cmd).unwrap(), "No sales data yet.\n", "{cmd}");
        }
    }

    #[test]
    fn test_reports_after_sales() {
        let dir = TempDir::new().unwrap();
        let mut sh = console(&dir);
        exec(&mut sh, "sell Ana regular PROD001 3").unwrap();
        exec(&mut sh, "sell Luis vip PROD002 1").unwrap();

        let top = exec(&mut sh, "top").unwrap();
        assert!(top.starts_with("1. Mouse Gamer Inalámbrico (Logitech) 3 units, 75.0% of units"));

        let finance = exec(&mut sh, "finance").unwrap();
        assert!(finance.contains("Transactions:   2"));

        let performance = exec(&mut sh, "10").unwrap();
        assert!(performance.contains("Products without sales:"));
        assert!(performance.contains("Hub USB-C 7 en 1"));
    }

    #[test]
    fn test_catalog_crud() {
        let dir = TempDir::new().unwrap();
        let mut sh = console(&dir);
        exec(&mut sh, "add prod006 'Webcam HD' Logitech Video 89.99 15 12").unwrap();
        assert!(exec(&mut sh, "add PROD006 Otra Marca Cat 1 1 1").is_err());
        assert!(exec(&mut sh, "add PROD007 Cable Anker Acc 0 1 1").is_err());

        exec(&mut sh, "update prod006 --price 79.5 --stock 3").unwrap();
        let p = sh.session().shop.catalog().find("PROD006").unwrap();
        assert_eq!((p.price, p.stock, p.warranty_months), (79.5, 3, 12));

        assert!(exec(&mut sh, "update PROD006 --brand ' '").is_err());
        exec(&mut sh, "delete PROD006").unwrap();
        assert_eq!(sh.session().shop.catalog().len(), 5);
    }

    #[test]
    fn test_catalog_save_and_overwrite_load() {
        let dir = TempDir::new().unwrap();
        let mut sh = console(&dir);
        exec(&mut sh, "save").unwrap();
        exec(&mut sh, "delete PROD001").unwrap();
        assert!(exec(&mut sh, "load").is_err());
        exec(&mut sh, "load --mode overwrite").unwrap();
        assert_eq!(sh.session().shop.catalog().len(), 5);
        assert_eq!(sh.session().shop.catalog().find("PROD001").unwrap().stock, 45);
    }

    #[test]
    fn test_summary_on_exit() {
        let dir = TempDir::new().unwrap();
        let mut sh = console(&dir);
        let mut script = Script::new(&[Some("sell Ana regular PROD004 1"), Some("exit")]);
        let mut out = Vec::new();
        sh.repl(&mut script, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("Closing shop: 1 sale(s), revenue $59.99, 5 product(s) in catalog.\n"));
    }
}
