//! Turns a [`FlowReport`] into chart-ready structures: the Sankey node/link
//! description, the category drill-down and the legend table.

use chrono::NaiveDate;
use serde::Serialize;

use crate::filters::format_rate;
use crate::services::aggregator::{
    fraction_of, sum_cents, CategoryAggregate, FlowReport, MerchantTotal,
};

pub const INCOME_NODE: &str = "Income";
pub const SAVINGS_NODE: &str = "Savings";
pub const INCOME_NODE_ID: &str = "income";
pub const SAVINGS_NODE_ID: &str = "savings";
pub const LEGEND_LIMIT: usize = 10;

const INCOME_COLOR: &str = "rgba(16, 185, 129, 0.8)";
const SAVINGS_COLOR: &str = "rgba(59, 130, 246, 0.8)";
const SAVINGS_LINK_COLOR: &str = "rgba(59, 130, 246, 0.4)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    /// Unique within a graph; links refer to nodes by id.
    pub id: String,
    pub name: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowLink {
    /// Node ids.
    pub source: String,
    pub target: String,
    pub value_cents: i64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantShare {
    pub merchant: String,
    pub total_cents: i64,
    /// Share of the summed absolute merchant totals; `None` when that sum is zero.
    pub share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub date: NaiveDate,
    pub merchant: String,
    pub amount_cents: i64,
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDetail {
    pub category: String,
    pub total_cents: i64,
    pub transaction_count: usize,
    pub average_cents: i64,
    pub percentage_of_income: Option<f64>,
    pub merchants: Vec<MerchantShare>,
    pub transactions: Vec<DetailRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub category: String,
    pub amount_cents: i64,
    pub percentage_of_income: Option<f64>,
}

/// `"{name} ({pct}%)"` with one decimal, or `"{name} (N/A)"`.
pub fn node_label(name: &str, fraction: Option<f64>) -> String {
    format!("{} ({})", name, format_rate(fraction, 1, "en-US"))
}

/// Node id for a category. Prefixed so a category named like a fixed node
/// ("Income", "Savings") stays a separate node.
pub fn category_node_id(category: &str) -> String {
    format!("category:{}", category)
}

/// RGBA color for the `index`-th category with the given alpha.
pub fn category_color(index: usize, alpha: f64) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        (index * 50) % 255,
        (index * 100) % 255,
        (index * 150) % 255,
        alpha
    )
}

/// Income feeds Savings (when savings are not negative) and every category
/// with a positive net amount. All categories get a node.
pub fn build_flow_graph(report: &FlowReport) -> FlowGraph {
    let summary = &report.summary;

    let mut nodes = vec![
        FlowNode {
            id: INCOME_NODE_ID.to_string(),
            name: INCOME_NODE.to_string(),
            label: INCOME_NODE.to_string(),
            color: INCOME_COLOR.to_string(),
        },
        FlowNode {
            id: SAVINGS_NODE_ID.to_string(),
            name: SAVINGS_NODE.to_string(),
            label: node_label(SAVINGS_NODE, summary.savings_rate),
            color: SAVINGS_COLOR.to_string(),
        },
    ];
    let mut links = Vec::new();

    if summary.savings_cents >= 0 {
        links.push(FlowLink {
            source: INCOME_NODE_ID.to_string(),
            target: SAVINGS_NODE_ID.to_string(),
            value_cents: summary.savings_cents,
            color: SAVINGS_LINK_COLOR.to_string(),
        });
    }

    for (idx, category) in report.categories.iter().enumerate() {
        let id = category_node_id(&category.category);
        nodes.push(FlowNode {
            id: id.clone(),
            name: category.category.clone(),
            label: node_label(&category.category, category.percentage_of_income),
            color: category_color(idx, 0.8),
        });

        if category.net_cents > 0 {
            links.push(FlowLink {
                source: INCOME_NODE_ID.to_string(),
                target: id,
                value_cents: category.net_cents,
                color: category_color(idx, 0.4),
            });
        }
    }

    FlowGraph { nodes, links }
}

/// Drill-down for one category, or `None` if it has no rows in the report.
pub fn category_detail(report: &FlowReport, name: &str) -> Option<CategoryDetail> {
    report.category(name).map(detail_for)
}

fn detail_for(category: &CategoryAggregate) -> CategoryDetail {
    let average_cents = if category.transaction_count > 0 {
        category.net_cents / category.transaction_count as i64
    } else {
        0
    };

    CategoryDetail {
        category: category.category.clone(),
        total_cents: category.net_cents,
        transaction_count: category.transaction_count,
        average_cents,
        percentage_of_income: category.percentage_of_income,
        merchants: merchant_shares(&category.top_merchants),
        transactions: category
            .recent_transactions
            .iter()
            .map(|t| DetailRow {
                date: t.date,
                merchant: t.merchant.clone(),
                amount_cents: t.amount_cents,
                account: t.account.clone(),
            })
            .collect(),
    }
}

fn merchant_shares(merchants: &[MerchantTotal]) -> Vec<MerchantShare> {
    let total = sum_cents(merchants.iter().map(|m| m.total_cents.saturating_abs()));
    merchants
        .iter()
        .map(|m| MerchantShare {
            merchant: m.merchant.clone(),
            total_cents: m.total_cents,
            share: fraction_of(m.total_cents.saturating_abs(), total),
        })
        .collect()
}

/// The largest categories, in report order.
pub fn legend(report: &FlowReport, limit: usize) -> Vec<LegendRow> {
    report
        .categories
        .iter()
        .take(limit)
        .map(|c| LegendRow {
            category: c.category.clone(),
            amount_cents: c.net_cents,
            percentage_of_income: c.percentage_of_income,
        })
        .collect()
}

/// Category names for the drill-down selector, alphabetically.
pub fn category_names(report: &FlowReport) -> Vec<String> {
    let mut names: Vec<String> = report
        .categories
        .iter()
        .map(|c| c.category.clone())
        .collect();
    names.sort();
    names
}
