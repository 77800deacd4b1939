use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::decimal::{Money, Rate};
use crate::invoice::Invoice;

/// revenue aggregated for one service code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRevenue {
    pub service_code: String,
    pub description: String,
    pub quantity: u64,
    pub revenue: Money,
}

/// collection and revenue figures over a set of invoices
#[derive(Debug, Clone, Copy, Default)]
pub struct RevenueAnalytics;

impl RevenueAnalytics {
    pub fn new() -> Self {
        Self
    }

    /// collected / billed as a percentage, zero when nothing was billed
    pub fn collection_rate(&self, invoices: &[Invoice]) -> Rate {
        let billed: Money = invoices.iter().map(|i| i.total_amount).sum();
        if !billed.is_positive() {
            return Rate::ZERO;
        }
        let collected: Money = invoices.iter().map(|i| i.amount_paid).sum();
        Rate::from_percentage_decimal(
            collected.as_decimal() / billed.as_decimal() * Decimal::ONE_HUNDRED,
        )
        .round_dp(2)
    }

    /// total billed on invoices created within `[now - window, now]`
    pub fn revenue_by_period(&self, invoices: &[Invoice], window: Duration, now: DateTime<Utc>) -> Money {
        let start = now - window;
        invoices
            .iter()
            .filter(|i| i.created_date >= start && i.created_date <= now)
            .map(|i| i.total_amount)
            .sum()
    }

    /// total billed per calendar month of creation, keyed by (year, month)
    pub fn revenue_by_month(&self, invoices: &[Invoice]) -> BTreeMap<(i32, u32), Money> {
        let mut months: BTreeMap<(i32, u32), Money> = BTreeMap::new();
        for invoice in invoices {
            let key = (invoice.created_date.year(), invoice.created_date.month());
            *months.entry(key).or_default() += invoice.total_amount;
        }
        months
    }

    /// services ranked by line revenue, highest first
    pub fn top_services(&self, invoices: &[Invoice], limit: usize) -> Vec<ServiceRevenue> {
        let mut by_code: HashMap<&str, ServiceRevenue> = HashMap::new();
        for item in invoices.iter().flat_map(|i| i.items.iter()) {
            let entry = by_code
                .entry(item.service_code.as_str())
                .or_insert_with(|| ServiceRevenue {
                    service_code: item.service_code.clone(),
                    description: item.description.clone(),
                    quantity: 0,
                    revenue: Money::ZERO,
                });
            entry.quantity += item.quantity as u64;
            entry.revenue += item.total_price;
        }

        let mut ranked: Vec<ServiceRevenue> = by_code.into_values().collect();
        ranked.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.service_code.cmp(&b.service_code))
        });
        ranked.truncate(limit);
        ranked
    }

    /// still owed on open invoices
    pub fn outstanding_total(&self, invoices: &[Invoice]) -> Money {
        invoices
            .iter()
            .filter(|i| !i.status.is_terminal())
            .map(|i| i.balance_due)
            .sum()
    }
}
