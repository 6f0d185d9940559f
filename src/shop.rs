//! The electronics shop: catalog, ledger and cached reports behind one owner.

use crate::catalog::{self, Product, normalize_id};
use crate::config::ShopSettings;
use crate::error::{SaleError, ValidationError};
use crate::record::require_text;
use crate::report::{
    BrandSales, FinancialReport, PerformanceReport, ProductSales, ReportCache, ReportData,
    Share, inventory_performance,
};
use crate::sales::{CustomerClass, Ledger, SaleEntry, Ticket};
use crate::store::RecordStore;
use chrono::Local;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Shop {
    catalog: RecordStore<Product>,
    ledger: Ledger,
    cache: ReportCache,
    settings: ShopSettings,
}

impl Shop {
    pub fn new(settings: ShopSettings) -> Self {
        let mut catalog = RecordStore::new();
        if settings.seed_catalog {
            for product in catalog::seed() {
                if let Err(err) = catalog.insert(product) {
                    warn!(%err, "skipping seed product");
                }
            }
        }
        Self {
            catalog,
            ledger: Ledger::new(),
            cache: ReportCache::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ShopSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &RecordStore<Product> {
        &self.catalog
    }

    /// Catalog edits never touch the ledger, so the report cache stays valid.
    pub fn catalog_mut(&mut self) -> &mut RecordStore<Product> {
        &mut self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Sell `quantity` units of `product_id` to `customer`.
    ///
    /// Either every effect happens (stock decremented, entry appended, reports
    /// invalidated) or, on error, nothing does.
    pub fn record_sale(
        &mut self,
        customer: &str,
        class: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<Ticket, SaleError> {
        let customer = require_text("customer", customer)?;
        let class: CustomerClass = class.parse()?;
        let product = self
            .catalog
            .get_mut(product_id)
            .ok_or_else(|| SaleError::UnknownProduct {
                key: normalize_id(product_id),
            })?;
        if quantity == 0 {
            return Err(ValidationError::NotPositive {
                field: "quantity",
                value: 0.0,
            }
            .into());
        }
        if quantity > product.stock {
            return Err(SaleError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        let subtotal = product.price * f64::from(quantity);
        let discount_rate = class.discount_rate();
        let discount = subtotal * discount_rate;
        product.stock -= quantity;
        let entry = SaleEntry {
            timestamp: Local::now(),
            customer: customer.to_string(),
            class,
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            brand: product.brand.clone(),
            quantity,
            unit_price: product.price,
            subtotal,
            discount_rate,
            discount,
            total: subtotal - discount,
        };
        let ticket = Ticket::from_entry(&entry, product.stock);
        info!(
            product = %entry.product_id,
            customer = %entry.customer,
            quantity,
            total = entry.total,
            "sale recorded"
        );
        self.ledger.append(entry);
        self.cache.invalidate();
        Ok(ticket)
    }

    /// `None` until the first sale.
    pub fn top_sellers(&mut self) -> Option<Vec<Share<'_, ProductSales>>> {
        let limit = self.settings.top_limit;
        self.report_data().map(|data| data.top_sellers(limit))
    }

    pub fn brand_report(&mut self) -> Option<Vec<Share<'_, BrandSales>>> {
        self.report_data().map(|data| data.brand_report())
    }

    pub fn financial_report(&mut self) -> Option<FinancialReport> {
        self.report_data().map(|data| data.financial_report())
    }

    pub fn performance(&mut self) -> Option<PerformanceReport<'_>> {
        if self.ledger.is_empty() {
            return None;
        }
        let thresholds = self.settings.thresholds();
        let data = self.cache.get_or_build(&self.ledger);
        Some(inventory_performance(data, &self.catalog, &thresholds))
    }

    fn report_data(&mut self) -> Option<&ReportData> {
        if self.ledger.is_empty() {
            return None;
        }
        Some(self.cache.get_or_build(&self.ledger))
    }
}
