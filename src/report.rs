//! Sales reports: a single fold over the ledger, memoized until the next sale.

use crate::catalog::Product;
use crate::record::Record;
use crate::sales::{CustomerClass, Ledger, SaleEntry};
use crate::store::RecordStore;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub units: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandSales {
    pub brand: String,
    pub units: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSales {
    pub class: CustomerClass,
    pub sales: usize,
    pub revenue: f64,
    pub discounts: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FinancialTotals {
    pub subtotal: f64,
    pub discounts: f64,
    pub net: f64,
    pub transactions: usize,
}

/// Everything the report views need, derived from the ledger alone.
///
/// Each list keeps the order in which its key first appeared in the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData {
    pub products: Vec<ProductSales>,
    pub brands: Vec<BrandSales>,
    pub classes: Vec<ClassSales>,
    pub totals: FinancialTotals,
}

impl ReportData {
    pub fn build(entries: &[SaleEntry]) -> Self {
        let mut data = ReportData::default();
        for entry in entries {
            let units = u64::from(entry.quantity);

            match data
                .products
                .iter_mut()
                .find(|p| p.product_id == entry.product_id)
            {
                Some(p) => {
                    p.units += units;
                    p.revenue += entry.total;
                }
                None => data.products.push(ProductSales {
                    product_id: entry.product_id.clone(),
                    name: entry.product_name.clone(),
                    brand: entry.brand.clone(),
                    units,
                    revenue: entry.total,
                }),
            }

            match data.brands.iter_mut().find(|b| b.brand == entry.brand) {
                Some(b) => {
                    b.units += units;
                    b.revenue += entry.total;
                }
                None => data.brands.push(BrandSales {
                    brand: entry.brand.clone(),
                    units,
                    revenue: entry.total,
                }),
            }

            match data.classes.iter_mut().find(|c| c.class == entry.class) {
                Some(c) => {
                    c.sales += 1;
                    c.revenue += entry.total;
                    c.discounts += entry.discount;
                }
                None => data.classes.push(ClassSales {
                    class: entry.class,
                    sales: 1,
                    revenue: entry.total,
                    discounts: entry.discount,
                }),
            }

            data.totals.subtotal += entry.subtotal;
            data.totals.discounts += entry.discount;
            data.totals.net += entry.total;
            data.totals.transactions += 1;
        }
        data
    }

    pub fn total_units(&self) -> u64 {
        self.products.iter().map(|p| p.units).sum()
    }

    /// The `n` best-selling products by units, ties kept in first-sale order.
    pub fn top_sellers(&self, n: usize) -> Vec<Share<'_, ProductSales>> {
        let total = self.total_units() as f64;
        let mut ranked: Vec<&ProductSales> = self.products.iter().collect();
        ranked.sort_by(|a, b| b.units.cmp(&a.units));
        ranked
            .into_iter()
            .take(n)
            .map(|p| Share {
                item: p,
                percent: percent(p.units as f64, total),
            })
            .collect()
    }

    /// Brands by revenue, highest first.
    pub fn brand_report(&self) -> Vec<Share<'_, BrandSales>> {
        let total: f64 = self.brands.iter().map(|b| b.revenue).sum();
        let mut ranked: Vec<&BrandSales> = self.brands.iter().collect();
        ranked.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
        ranked
            .into_iter()
            .map(|b| Share {
                item: b,
                percent: percent(b.revenue, total),
            })
            .collect()
    }

    pub fn financial_report(&self) -> FinancialReport {
        let t = self.totals;
        let mut classes: Vec<ClassBreakdown> = self
            .classes
            .iter()
            .map(|c| ClassBreakdown {
                class: c.class,
                sales: c.sales,
                revenue: c.revenue,
                discounts: c.discounts,
                average_ticket: c.revenue / c.sales as f64,
            })
            .collect();
        classes.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
        FinancialReport {
            totals: t,
            average_ticket: if t.transactions == 0 {
                0.0
            } else {
                t.net / t.transactions as f64
            },
            discount_percent: percent(t.discounts, t.subtotal),
            classes,
        }
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part * 100.0 / whole } else { 0.0 }
}

/// An entry of a ranked report with its share of the column total.
#[derive(Debug, Clone, PartialEq)]
pub struct Share<'a, T> {
    pub item: &'a T,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassBreakdown {
    pub class: CustomerClass,
    pub sales: usize,
    pub revenue: f64,
    pub discounts: f64,
    pub average_ticket: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialReport {
    pub totals: FinancialTotals,
    pub average_ticket: f64,
    pub discount_percent: f64,
    /// Sorted by revenue, highest first.
    pub classes: Vec<ClassBreakdown>,
}

/// Memoized [`ReportData`].
///
/// Writers call [`invalidate`](Self::invalidate) right after appending to the
/// ledger; the next read rebuilds.
#[derive(Debug, Default)]
pub struct ReportCache {
    data: Option<ReportData>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        if self.data.take().is_some() {
            debug!("report cache invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.data.is_some()
    }

    pub fn get_or_build(&mut self, ledger: &Ledger) -> &ReportData {
        if self.data.is_some() {
            debug!("report cache hit");
        }
        self.data.get_or_insert_with(|| {
            debug!(entries = ledger.len(), "report cache miss, rebuilding");
            ReportData::build(ledger.entries())
        })
    }
}

/// Stock level bands used by the inventory performance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    Out,
    Low,
    Normal,
    Optimal,
}

impl StockStatus {
    pub fn classify(stock: u32, thresholds: &StockThresholds) -> Self {
        if stock == 0 {
            StockStatus::Out
        } else if stock < thresholds.low {
            StockStatus::Low
        } else if stock < thresholds.healthy {
            StockStatus::Normal
        } else {
            StockStatus::Optimal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StockStatus::Out => "OUT OF STOCK",
            StockStatus::Low => "LOW",
            StockStatus::Normal => "NORMAL",
            StockStatus::Optimal => "OPTIMAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockThresholds {
    /// Below this (and above zero) stock is low.
    pub low: u32,
    /// At or above this stock is optimal.
    pub healthy: u32,
    /// A product is over-stocked when stock exceeds `units sold × rotation_factor`.
    pub rotation_factor: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoldProduct<'a> {
    pub sales: &'a ProductSales,
    pub stock: u32,
    pub status: StockStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rotation<'a> {
    pub sales: &'a ProductSales,
    pub stock: u32,
    /// Units to restock (high rotation) or surplus units (low rotation).
    pub units: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport<'a> {
    /// Products with sales that are still in the catalog.
    pub sold: Vec<SoldProduct<'a>>,
    pub unsold: Vec<&'a Product>,
    pub stagnant_value: f64,
    /// Sold more than remains in stock; sorted by units sold, highest first.
    pub high_rotation: Vec<Rotation<'a>>,
    pub low_rotation: Vec<Rotation<'a>>,
}

/// Cross the sales figures with the current catalog.
pub fn inventory_performance<'a>(
    data: &'a ReportData,
    catalog: &'a RecordStore<Product>,
    thresholds: &StockThresholds,
) -> PerformanceReport<'a> {
    let live: Vec<(&ProductSales, u32)> = data
        .products
        .iter()
        .filter_map(|s| catalog.find(&s.product_id).ok().map(|p| (s, p.stock)))
        .collect();

    let sold = live
        .iter()
        .map(|&(sales, stock)| SoldProduct {
            sales,
            stock,
            status: StockStatus::classify(stock, thresholds),
        })
        .collect();

    let unsold: Vec<&Product> = catalog
        .list()
        .iter()
        .filter(|p| !data.products.iter().any(|s| s.product_id == p.key()))
        .collect();
    let stagnant_value = unsold
        .iter()
        .map(|p| p.price * f64::from(p.stock))
        .sum();

    let mut high_rotation: Vec<Rotation> = live
        .iter()
        .filter(|(sales, stock)| sales.units > u64::from(*stock))
        .map(|&(sales, stock)| Rotation {
            sales,
            stock,
            units: sales.units - u64::from(stock),
        })
        .collect();
    high_rotation.sort_by(|a, b| b.sales.units.cmp(&a.sales.units));

    let factor = u64::from(thresholds.rotation_factor);
    let low_rotation = live
        .iter()
        .filter(|(sales, stock)| u64::from(*stock) > sales.units * factor)
        .map(|&(sales, stock)| Rotation {
            sales,
            stock,
            units: u64::from(stock) - sales.units * factor,
        })
        .collect();

    PerformanceReport {
        sold,
        unsold,
        stagnant_value,
        high_rotation,
        low_rotation,
    }
}
