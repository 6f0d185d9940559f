//! Customer classes, the append-only sale ledger and sale tickets.

use crate::error::SaleError;
use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

/// Customer class, which fixes the discount applied to a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerClass {
    Regular,
    Member,
    Vip,
    Corporate,
}

impl CustomerClass {
    pub const ALL: [CustomerClass; 4] = [
        CustomerClass::Regular,
        CustomerClass::Member,
        CustomerClass::Vip,
        CustomerClass::Corporate,
    ];

    /// Fraction of the subtotal taken off, e.g. `0.05` for 5%.
    pub fn discount_rate(self) -> f64 {
        match self {
            CustomerClass::Regular => 0.0,
            CustomerClass::Member => 0.05,
            CustomerClass::Vip => 0.10,
            CustomerClass::Corporate => 0.15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CustomerClass::Regular => "regular",
            CustomerClass::Member => "member",
            CustomerClass::Vip => "vip",
            CustomerClass::Corporate => "corporate",
        }
    }

    fn valid_labels() -> String {
        Self::ALL
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CustomerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for CustomerClass {
    type Err = SaleError;

    /// Accepts the English labels and the Spanish ones the shop used to print.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Ok(CustomerClass::Regular),
            "member" | "miembro" => Ok(CustomerClass::Member),
            "vip" => Ok(CustomerClass::Vip),
            "corporate" | "corporativo" => Ok(CustomerClass::Corporate),
            _ => Err(SaleError::InvalidClass {
                given: s.trim().to_string(),
                valid: Self::valid_labels(),
            }),
        }
    }
}

/// One completed sale. Entries are never changed once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleEntry {
    pub timestamp: DateTime<Local>,
    pub customer: String,
    pub class: CustomerClass,
    pub product_id: String,
    /// Name and brand at the time of sale.
    pub product_name: String,
    pub brand: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
    pub discount_rate: f64,
    pub discount: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<SaleEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, entry: SaleEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SaleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn revenue(&self) -> f64 {
        self.entries.iter().map(|e| e.total).sum()
    }
}

/// What the customer is shown after a sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub customer: String,
    pub class: CustomerClass,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
    pub discount_rate: f64,
    pub discount: f64,
    pub total: f64,
    pub remaining_stock: u32,
}

impl Ticket {
    pub(crate) fn from_entry(entry: &SaleEntry, remaining_stock: u32) -> Self {
        Self {
            customer: entry.customer.clone(),
            class: entry.class,
            product_name: entry.product_name.clone(),
            quantity: entry.quantity,
            unit_price: entry.unit_price,
            subtotal: entry.subtotal,
            discount_rate: entry.discount_rate,
            discount: entry.discount,
            total: entry.total,
            remaining_stock,
        }
    }
}
