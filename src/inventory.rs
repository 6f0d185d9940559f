//! The plain inventory item: a name, a unit price and a quantity in stock.

use crate::error::{RowError, ValidationError};
use crate::persist::{TabularRecord, check_columns};
use crate::record::{
    Patchable, Record, Stocked, check_non_negative, check_text, parse_amount, parse_count,
    require_text,
};
use csv::StringRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl InventoryItem {
    /// The name is stored trimmed.
    pub fn new(name: &str, price: f64, quantity: u32) -> Self {
        Self {
            name: name.trim().to_string(),
            price,
            quantity,
        }
    }
}

/// Fields to change on an [`InventoryItem`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub price: Option<f64>,
    pub quantity: Option<u32>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.quantity.is_none()
    }
}

impl Record for InventoryItem {
    fn key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_text("name", &self.name)?;
        check_non_negative("price", self.price)?;
        Ok(())
    }
}

impl Patchable for InventoryItem {
    type Patch = ItemPatch;

    fn patched(&self, patch: &ItemPatch) -> Self {
        Self {
            name: self.name.clone(),
            price: patch.price.unwrap_or(self.price),
            quantity: patch.quantity.unwrap_or(self.quantity),
        }
    }
}

impl Stocked for InventoryItem {
    fn price(&self) -> f64 {
        self.price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn set_price(&mut self, price: f64) {
        self.price = price;
    }

    fn add_quantity(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }
}

impl TabularRecord for InventoryItem {
    const HEADER: &'static [&'static str] = &["name", "price", "quantity"];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.price.to_string(),
            self.quantity.to_string(),
        ]
    }

    fn from_row(row: &StringRecord) -> Result<Self, RowError> {
        check_columns::<Self>(row)?;
        let price = parse_amount("price", &row[1])?;
        let quantity = parse_count("quantity", &row[2])?;
        let name = require_text("name", &row[0])?;
        Ok(Self::new(name, price, quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_trims_name() {
        let row = StringRecord::from(vec!["  Mango ", "2.5", "4"]);
        assert_eq!(
            InventoryItem::from_row(&row).unwrap(),
            InventoryItem::new("Mango", 2.5, 4)
        );
    }

    #[test]
    fn test_from_row_rejections() {
        let cases = [
            vec!["Mango", "2.5"],
            vec!["Mango", "x", "4"],
            vec!["Mango", "2.5", "4.5"],
            vec!["Mango", "-2.5", "4"],
            vec!["Mango", "2.5", "-4"],
            vec!["   ", "2.5", "4"],
        ];
        for case in cases {
            let row = StringRecord::from(case.clone());
            assert!(InventoryItem::from_row(&row).is_err(), "accepted {case:?}");
        }
    }

    #[test]
    fn test_new_trims_and_validate_rejects_padding() {
        assert_eq!(InventoryItem::new("  Mango ", 1.0, 1).name, "Mango");

        let padded = InventoryItem {
            name: "Mango ".to_string(),
            price: 1.0,
            quantity: 1,
        };
        assert!(matches!(
            padded.validate(),
            Err(ValidationError::Padded { field: "name", .. })
        ));
    }

    #[test]
    fn test_to_row_uses_plain_decimal() {
        let item = InventoryItem::new("Cable, USB", 0.1, 3);
        assert_eq!(item.to_row(), ["Cable, USB", "0.1", "3"]);
    }

    #[test]
    fn test_patched_keeps_unset_fields() {
        let item = InventoryItem::new("Pera", 1.25, 8);
        let patched = item.patched(&ItemPatch {
            price: Some(2.0),
            quantity: None,
        });
        assert_eq!(patched, InventoryItem::new("Pera", 2.0, 8));
    }
}
