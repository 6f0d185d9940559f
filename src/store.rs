use crate::error::StoreError;
use crate::record::{Patchable, Record, Stocked, keys_match};
use regex::Regex;
use tracing::{debug, info};

/// Insertion-ordered collection of records with case-insensitively unique keys.
///
/// Every mutation goes through the methods below, which keep the key
/// invariant and validate records before they are stored. Lookups are linear
/// scans; the expected scale is tens of records.
#[derive(Debug, Clone)]
pub struct RecordStore<R> {
    records: Vec<R>,
}

impl<R> Default for RecordStore<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Record> RecordStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record`, rejecting invalid fields and duplicate keys.
    ///
    /// A failed insert leaves the store untouched.
    pub fn insert(&mut self, record: R) -> Result<(), StoreError> {
        record.validate()?;
        if self.contains(record.key()) {
            return Err(StoreError::DuplicateKey {
                key: record.key().to_string(),
            });
        }
        info!(key = record.key(), "record inserted");
        self.records.push(record);
        Ok(())
    }

    pub fn find(&self, key: &str) -> Result<&R, StoreError> {
        self.position(key)
            .map(|idx| &self.records[idx])
            .ok_or_else(|| not_found(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Remove and return the record stored under `key`.
    pub fn delete(&mut self, key: &str) -> Result<R, StoreError> {
        let idx = self.position(key).ok_or_else(|| not_found(key))?;
        let removed = self.records.remove(idx);
        info!(key = removed.key(), "record deleted");
        Ok(removed)
    }

    pub fn list(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        debug!(dropped = self.records.len(), "store cleared");
        self.records.clear();
    }

    /// Records whose key matches `pattern`, in insertion order.
    pub fn search<'a>(&'a self, pattern: &'a Regex) -> impl Iterator<Item = &'a R> + 'a {
        self.records.iter().filter(|r| pattern.is_match(r.key()))
    }

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.records.iter().position(|r| keys_match(r.key(), key))
    }

    /// Mutable access for modules that must keep a record valid themselves
    /// (merge and sales never touch the key).
    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut R> {
        let idx = self.position(key)?;
        Some(&mut self.records[idx])
    }

    /// Append without the duplicate check; callers guarantee the key is new.
    pub(crate) fn push_unchecked(&mut self, record: R) {
        self.records.push(record);
    }
}

impl<R: Patchable> RecordStore<R> {
    /// Apply `patch` to the record stored under `key`.
    ///
    /// The patched copy is validated before it replaces the original, so an
    /// invalid field rejects the whole update.
    pub fn update(&mut self, key: &str, patch: &R::Patch) -> Result<&R, StoreError> {
        let idx = self.position(key).ok_or_else(|| not_found(key))?;
        let candidate = self.records[idx].patched(patch);
        candidate.validate()?;
        info!(key = candidate.key(), "record updated");
        self.records[idx] = candidate;
        Ok(&self.records[idx])
    }
}

/// Aggregate figures over a store of [`Stocked`] records.
#[derive(Debug, PartialEq)]
pub enum Statistics<'a, R> {
    /// The store holds no records.
    Empty,
    Summary {
        records: usize,
        total_units: u64,
        total_value: f64,
        max_price: &'a R,
        max_quantity: &'a R,
    },
}

impl<R: Stocked> RecordStore<R> {
    /// Totals and maxima; ties on a maximum go to the earliest record.
    pub fn statistics(&self) -> Statistics<'_, R> {
        let Some(first) = self.records.first() else {
            return Statistics::Empty;
        };

        let mut total_units = 0u64;
        let mut total_value = 0.0;
        let mut max_price = first;
        let mut max_quantity = first;
        for record in &self.records {
            total_units += u64::from(record.quantity());
            total_value += record.value();
            if record.price() > max_price.price() {
                max_price = record;
            }
            if record.quantity() > max_quantity.quantity() {
                max_quantity = record;
            }
        }

        Statistics::Summary {
            records: self.records.len(),
            total_units,
            total_value,
            max_price,
            max_quantity,
        }
    }
}

fn not_found(key: &str) -> StoreError {
    StoreError::NotFound {
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::inventory::{InventoryItem, ItemPatch};
    use proptest::prelude::*;

    fn item(name: &str, price: f64, quantity: u32) -> InventoryItem {
        InventoryItem::new(name, price, quantity)
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut store = RecordStore::new();
        store.insert(item("Pera", 1.0, 3)).unwrap();
        store.insert(item("Mango", 2.0, 1)).unwrap();
        store.insert(item("Banano", 0.5, 12)).unwrap();

        let names: Vec<&str> = store.list().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Pera", "Mango", "Banano"]);
    }

    #[test]
    fn test_insert_duplicate_key_case_insensitive() {
        let mut store = RecordStore::new();
        store.insert(item("Mouse", 10.0, 2)).unwrap();

        let err = store.insert(item("MOUSE", 99.0, 1)).unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateKey {
                key: "MOUSE".to_string()
            }
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("mouse").unwrap().price, 10.0);
    }

    #[test]
    fn test_padded_names_share_one_key() {
        let mut store = RecordStore::new();
        store.insert(item(" Mango", 1.0, 1)).unwrap();
        assert!(matches!(
            store.insert(item("mango ", 2.0, 2)),
            Err(StoreError::DuplicateKey { .. })
        ));
        assert_eq!(store.list(), [item("Mango", 1.0, 1)]);

        let padded = InventoryItem {
            name: "Pera ".to_string(),
            price: 1.0,
            quantity: 1,
        };
        assert!(matches!(
            store.insert(padded),
            Err(StoreError::Validation(ValidationError::Padded { .. }))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_rejects_negative_price() {
        let mut store = RecordStore::new();
        let err = store.insert(item("Mouse", -1.0, 2)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::Negative { field: "price", .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let mut store = RecordStore::new();
        store.insert(item("Teclado", 30.0, 4)).unwrap();
        assert_eq!(store.find("tECLADO").unwrap().name, "Teclado");
        assert!(matches!(
            store.find("Monitor"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_applies_only_supplied_fields() {
        let mut store = RecordStore::new();
        store.insert(item("Teclado", 30.0, 4)).unwrap();

        let patch = ItemPatch {
            price: None,
            quantity: Some(9),
        };
        let updated = store.update("teclado", &patch).unwrap();
        assert_eq!(updated.price, 30.0);
        assert_eq!(updated.quantity, 9);
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut store = RecordStore::new();
        store.insert(item("Teclado", 30.0, 4)).unwrap();

        let patch = ItemPatch {
            price: Some(-5.0),
            quantity: Some(100),
        };
        assert!(matches!(
            store.update("Teclado", &patch),
            Err(StoreError::Validation(_))
        ));
        let kept = store.find("Teclado").unwrap();
        assert_eq!(kept.price, 30.0);
        assert_eq!(kept.quantity, 4);
    }

    #[test]
    fn test_update_missing_key() {
        let mut store: RecordStore<InventoryItem> = RecordStore::new();
        let patch = ItemPatch {
            price: Some(1.0),
            quantity: None,
        };
        assert!(matches!(
            store.update("ghost", &patch),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_on_empty_store_reports_not_found() {
        let mut store: RecordStore<InventoryItem> = RecordStore::new();
        assert_eq!(
            store.delete("anything").unwrap_err(),
            StoreError::NotFound {
                key: "anything".to_string()
            }
        );
        assert_eq!(
            store.delete("anything").unwrap_err(),
            StoreError::NotFound {
                key: "anything".to_string()
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_removes_record() {
        let mut store = RecordStore::new();
        store.insert(item("Pera", 1.0, 3)).unwrap();
        store.insert(item("Mora", 2.0, 3)).unwrap();

        let removed = store.delete("PERA").unwrap();
        assert_eq!(removed.name, "Pera");
        assert_eq!(store.len(), 1);
        assert!(!store.contains("pera"));
    }

    #[test]
    fn test_statistics_empty_store() {
        let store: RecordStore<InventoryItem> = RecordStore::new();
        assert_eq!(store.statistics(), Statistics::Empty);
    }

    #[test]
    fn test_statistics_totals_and_first_max_on_ties() {
        let mut store = RecordStore::new();
        store.insert(item("A", 5.0, 10)).unwrap();
        store.insert(item("B", 8.0, 2)).unwrap();
        store.insert(item("C", 8.0, 10)).unwrap();

        match store.statistics() {
            Statistics::Summary {
                records,
                total_units,
                total_value,
                max_price,
                max_quantity,
            } => {
                assert_eq!(records, 3);
                assert_eq!(total_units, 22);
                assert_eq!(total_value, 50.0 + 16.0 + 80.0);
                assert_eq!(max_price.name, "B");
                assert_eq!(max_quantity.name, "A");
            }
            Statistics::Empty => panic!("expected a summary"),
        }
    }

    #[test]
    fn test_search_filters_by_pattern() {
        let mut store = RecordStore::new();
        store.insert(item("Mouse Gamer", 1.0, 1)).unwrap();
        store.insert(item("Teclado", 1.0, 1)).unwrap();
        store.insert(item("Mouse Pad", 1.0, 1)).unwrap();

        let re = Regex::new("(?i)^mouse").unwrap();
        let found: Vec<&str> = store.search(&re).map(|r| r.name.as_str()).collect();
        assert_eq!(found, ["Mouse Gamer", "Mouse Pad"]);
    }

    proptest! {
        #[test]
        fn prop_distinct_inserts_all_listed_in_order(
            names in proptest::collection::hash_set("[a-z]{1,8}", 0..20)
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let mut store = RecordStore::new();
            for name in &names {
                store.insert(item(name, 1.0, 1)).unwrap();
            }
            prop_assert_eq!(store.len(), names.len());
            let listed: Vec<&String> = store.list().iter().map(|r| &r.name).collect();
            let expected: Vec<&String> = names.iter().collect();
            prop_assert_eq!(listed, expected);
        }

        #[test]
        fn prop_duplicate_insert_never_mutates(
            name in "[a-z]{1,8}",
            price in 0.0f64..1000.0,
            quantity in 0u32..1000,
        ) {
            let mut store = RecordStore::new();
            store.insert(item(&name, price, quantity)).unwrap();
            let before = store.list().to_vec();
            let upper = name.to_uppercase();
            prop_assert!(store.insert(item(&upper, 1.0, 1)).is_err());
            prop_assert_eq!(store.list(), before.as_slice());
        }

        #[test]
        fn prop_total_value_is_sum_of_products(
            rows in proptest::collection::vec((0.0f64..1000.0, 0u32..1000), 1..20)
        ) {
            let mut store = RecordStore::new();
            let mut expected = 0.0;
            for (i, (price, quantity)) in rows.iter().enumerate() {
                store.insert(item(&format!("item{i}"), *price, *quantity)).unwrap();
                expected += price * f64::from(*quantity);
            }
            match store.statistics() {
                Statistics::Summary { total_value, .. } => {
                    prop_assert!((total_value - expected).abs() <= 1e-9 * expected.max(1.0));
                }
                Statistics::Empty => prop_assert!(false, "non-empty store reported Empty"),
            }
        }
    }
}
