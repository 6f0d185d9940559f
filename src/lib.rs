//! Small inventory-style record keeping with interactive consoles.
//!
//! Three programs share one core:
//! - a plain product inventory saved to CSV,
//! - an electronics shop with a catalog, customer-class discounts, a sale
//!   ledger and cached sales reports,
//! - a gradebook of students and their grades.
//!
//! Every variant keeps its records in a [`RecordStore`], an insertion-ordered
//! collection with case-insensitively unique keys. [`persist`] moves stores
//! to and from CSV files. The [`console`] module wraps each variant in a
//! numbered-menu interpreter driven by a line editor.

pub mod catalog;
pub mod config;
pub mod console;
pub mod error;
pub mod gradebook;
pub mod inventory;
pub mod persist;
pub mod record;
pub mod report;
pub mod sales;
pub mod shop;
pub mod store;

pub use error::{PersistError, SaleError, StoreError, ValidationError};
pub use record::{Patchable, Record, Stocked};
pub use store::{RecordStore, Statistics};
