//! Income / expense aggregation over a date window.
//!
//! Everything here is a pure function of the transaction table and a
//! [`DateRange`]; results are rebuilt on every request.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::date_utils::DateRange;
use crate::models::Transaction;

pub const TOP_MERCHANT_LIMIT: usize = 10;
pub const RECENT_TRANSACTION_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSummary {
    pub total_income_cents: i64,
    pub total_expenses_cents: i64,
    pub savings_cents: i64,
    /// `savings / income`; `None` when there is no income.
    pub savings_rate: Option<f64>,
}

impl FlowSummary {
    fn new(total_income_cents: i64, total_expenses_cents: i64) -> Self {
        let savings_cents = total_income_cents.saturating_sub(total_expenses_cents);
        Self {
            total_income_cents,
            total_expenses_cents,
            savings_cents,
            savings_rate: fraction_of(savings_cents, total_income_cents),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerchantTotal {
    pub merchant: String,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionLine {
    pub date: NaiveDate,
    pub merchant: String,
    pub amount_cents: i64,
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub category: String,
    /// Sum of the category's amounts, refunds included. May be negative.
    pub net_cents: i64,
    pub transaction_count: usize,
    pub percentage_of_income: Option<f64>,
    pub top_merchants: Vec<MerchantTotal>,
    pub recent_transactions: Vec<TransactionLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeStats {
    pub transaction_count: usize,
    pub category_count: usize,
    pub account_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReport {
    pub summary: FlowSummary,
    pub categories: Vec<CategoryAggregate>,
    pub stats: RangeStats,
}

impl FlowReport {
    pub fn category(&self, name: &str) -> Option<&CategoryAggregate> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// Sum of cent amounts, saturating at the `i64` bounds instead of overflowing.
pub fn sum_cents(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

/// `part / whole`, or `None` when `whole` is not positive.
pub fn fraction_of(part_cents: i64, whole_cents: i64) -> Option<f64> {
    if whole_cents > 0 {
        Some(part_cents as f64 / whole_cents as f64)
    } else {
        None
    }
}

/// Aggregate `transactions` that fall inside `range`.
///
/// Excluded rows are ignored entirely. Income is the absolute sum of
/// income-typed rows; every other row with a non-blank category is an
/// expense (negative amounts being refunds).
pub fn aggregate(transactions: &[Transaction], range: &DateRange) -> FlowReport {
    let in_range: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| range.contains(t.date) && !t.is_excluded())
        .collect();

    let (income_rows, expense_rows): (Vec<&Transaction>, Vec<&Transaction>) =
        in_range.iter().copied().partition(|t| t.is_income());

    let total_income_cents = sum_cents(income_rows.iter().map(|t| t.amount_cents.saturating_abs()));

    let mut by_category: HashMap<&str, Vec<&Transaction>> = HashMap::new();
    for row in expense_rows {
        if let Some(category) = row.category_name() {
            by_category.entry(category).or_default().push(row);
        }
    }

    let mut categories: Vec<CategoryAggregate> = by_category
        .into_iter()
        .map(|(category, rows)| build_category(category, &rows, total_income_cents))
        .collect();

    categories.sort_by(|a, b| {
        b.net_cents
            .cmp(&a.net_cents)
            .then_with(|| a.category.cmp(&b.category))
    });

    let total_expenses_cents = sum_cents(categories.iter().map(|c| c.net_cents));

    FlowReport {
        summary: FlowSummary::new(total_income_cents, total_expenses_cents),
        categories,
        stats: range_stats(&in_range),
    }
}

fn build_category(category: &str, rows: &[&Transaction], total_income_cents: i64) -> CategoryAggregate {
    let net_cents = sum_cents(rows.iter().map(|t| t.amount_cents));

    CategoryAggregate {
        category: category.to_string(),
        net_cents,
        transaction_count: rows.len(),
        percentage_of_income: fraction_of(net_cents, total_income_cents),
        top_merchants: top_merchants(rows, TOP_MERCHANT_LIMIT),
        recent_transactions: recent_transactions(rows, RECENT_TRANSACTION_LIMIT),
    }
}

/// Merchants by descending absolute summed amount, ties broken by name.
pub fn top_merchants(rows: &[&Transaction], limit: usize) -> Vec<MerchantTotal> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for row in rows {
        let total = totals.entry(row.merchant.as_str()).or_insert(0);
        *total = total.saturating_add(row.amount_cents);
    }

    let mut merchants: Vec<MerchantTotal> = totals
        .into_iter()
        .map(|(merchant, total_cents)| MerchantTotal {
            merchant: merchant.to_string(),
            total_cents,
        })
        .collect();

    merchants.sort_by(|a, b| {
        b.total_cents
            .unsigned_abs()
            .cmp(&a.total_cents.unsigned_abs())
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    merchants.truncate(limit);
    merchants
}

/// Newest first. Rows sharing a date keep their file order.
pub fn recent_transactions(rows: &[&Transaction], limit: usize) -> Vec<TransactionLine> {
    let mut sorted: Vec<&Transaction> = rows.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    sorted
        .into_iter()
        .take(limit)
        .map(|t| TransactionLine {
            date: t.date,
            merchant: t.merchant.clone(),
            amount_cents: t.amount_cents,
            account: t.account.clone(),
        })
        .collect()
}

fn range_stats(rows: &[&Transaction]) -> RangeStats {
    let categories: HashSet<&str> = rows.iter().filter_map(|t| t.category_name()).collect();
    let accounts: HashSet<&str> = rows.iter().filter_map(|t| t.account_name()).collect();

    RangeStats {
        transaction_count: rows.len(),
        category_count: categories.len(),
        account_count: accounts.len(),
    }
}
