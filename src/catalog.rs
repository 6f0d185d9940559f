//! Products of the electronics shop and the catalog it starts with.

use crate::error::{RowError, ValidationError};
use crate::persist::{TabularRecord, check_columns};
use crate::record::{
    Patchable, Record, Stocked, check_positive, check_text, parse_amount, parse_count,
    require_text,
};
use csv::StringRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Stored upper-cased, e.g. `PROD001`.
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
    pub warranty_months: u32,
}

impl Product {
    /// Text fields are stored trimmed; the id is also upper-cased.
    pub fn new(
        id: &str,
        name: &str,
        brand: &str,
        category: &str,
        price: f64,
        stock: u32,
        warranty_months: u32,
    ) -> Self {
        Self {
            id: normalize_id(id),
            name: name.trim().to_string(),
            brand: brand.trim().to_string(),
            category: category.trim().to_string(),
            price,
            stock,
            warranty_months,
        }
    }
}

pub fn normalize_id(id: &str) -> String {
    id.trim().to_uppercase()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub warranty_months: Option<u32>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

impl Record for Product {
    fn key(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_text("id", &self.id)?;
        check_text("name", &self.name)?;
        check_text("brand", &self.brand)?;
        check_text("category", &self.category)?;
        check_positive("price", self.price)?;
        Ok(())
    }
}

impl Patchable for Product {
    type Patch = ProductPatch;

    fn patched(&self, patch: &ProductPatch) -> Self {
        Self {
            id: self.id.clone(),
            name: patched_text(&patch.name, &self.name),
            brand: patched_text(&patch.brand, &self.brand),
            category: patched_text(&patch.category, &self.category),
            price: patch.price.unwrap_or(self.price),
            stock: patch.stock.unwrap_or(self.stock),
            warranty_months: patch.warranty_months.unwrap_or(self.warranty_months),
        }
    }
}

fn patched_text(new: &Option<String>, old: &str) -> String {
    new.as_deref().unwrap_or(old).trim().to_string()
}

impl Stocked for Product {
    fn price(&self) -> f64 {
        self.price
    }

    fn quantity(&self) -> u32 {
        self.stock
    }

    fn set_price(&mut self, price: f64) {
        self.price = price;
    }

    fn add_quantity(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_add(quantity);
    }
}

impl TabularRecord for Product {
    const HEADER: &'static [&'static str] = &[
        "id",
        "name",
        "brand",
        "category",
        "price",
        "stock",
        "warranty_months",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.brand.clone(),
            self.category.clone(),
            self.price.to_string(),
            self.stock.to_string(),
            self.warranty_months.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> Result<Self, RowError> {
        check_columns::<Self>(row)?;
        let product = Product::new(
            require_text("id", &row[0])?,
            require_text("name", &row[1])?,
            require_text("brand", &row[2])?,
            require_text("category", &row[3])?,
            parse_amount("price", &row[4])?,
            parse_count("stock", &row[5])?,
            parse_count("warranty_months", &row[6])?,
        );
        product.validate()?;
        Ok(product)
    }
}

/// The five products the shop opens with.
pub fn seed() -> Vec<Product> {
    vec![
        Product::new(
            "PROD001",
            "Mouse Gamer Inalámbrico",
            "Logitech",
            "Periféricos",
            79.99,
            45,
            24,
        ),
        Product::new(
            "PROD002",
            "Teclado Mecánico RGB",
            "Razer",
            "Periféricos",
            149.99,
            30,
            12,
        ),
        Product::new(
            "PROD003",
            "Monitor 27\" 4K",
            "Samsung",
            "Pantallas",
            449.99,
            20,
            36,
        ),
        Product::new(
            "PROD004",
            "Hub USB-C 7 en 1",
            "Anker",
            "Accesorios",
            59.99,
            60,
            18,
        ),
        Product::new(
            "PROD005",
            "Audífonos Inalámbricos",
            "Sony",
            "Audio",
            199.99,
            35,
            24,
        ),
    ]
}
