use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_utils::{DateFilterable, DatePreset, DateRange};
use crate::error::{AppResult, RenderHtml};
use crate::models::{Ledger, Settings};
use crate::services::aggregator::{aggregate, FlowReport};
use crate::services::csv_parser::REQUIRED_COLUMNS;
use crate::services::flow_graph::{self, CategoryDetail, LEGEND_LIMIT};
use crate::state::AppState;
use crate::VERSION;

const SKIPPED_ROWS_SHOWN: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub preset: Option<String>,
    pub nav: Option<String>,
    pub category: Option<String>,
}

impl DateFilterable for DashboardParams {
    fn from_date(&self) -> Option<&String> {
        self.from_date.as_ref()
    }
    fn to_date(&self) -> Option<&String> {
        self.to_date.as_ref()
    }
    fn preset(&self) -> Option<&String> {
        self.preset.as_ref()
    }
    fn nav(&self) -> Option<&String> {
        self.nav.as_ref()
    }
}

impl DashboardParams {
    pub fn selected_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Query string for links that keep the range and optionally select a category.
#[derive(Serialize)]
struct LinkQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> LinkQuery<'a> {
    fn for_range(range: &DateRange) -> Self {
        match range.preset {
            Some(preset) => Self {
                preset: Some(preset.as_str()),
                from_date: None,
                to_date: None,
                category: None,
                name: None,
            },
            None => Self {
                preset: None,
                from_date: range.from.map(|_| range.from_str()),
                to_date: range.to.map(|_| range.to_str()),
                category: None,
                name: None,
            },
        }
    }

    fn encode(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

pub struct PresetOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

pub struct CategoryOption {
    pub name: String,
    pub href: String,
    pub selected: bool,
}

pub struct MerchantView {
    pub merchant: String,
    pub amount: String,
    pub share: String,
}

pub struct DetailRowView {
    pub date: String,
    pub merchant: String,
    pub amount: String,
    pub account: String,
}

pub struct DetailView {
    pub name: String,
    pub metrics: Vec<Metric>,
    pub merchants: Vec<MerchantView>,
    pub rows: Vec<DetailRowView>,
    pub chart_url: String,
}

pub struct LegendView {
    pub category: String,
    pub amount: String,
    pub percentage: String,
}

pub struct DashboardView {
    pub source_name: String,
    pub loaded_at: String,
    pub row_count: usize,
    pub skipped_count: usize,
    pub skipped_rows: Vec<String>,
    pub range_label: String,
    pub range_from: String,
    pub range_to: String,
    pub prev_url: String,
    pub next_url: String,
    pub can_navigate: bool,
    pub metrics: Vec<Metric>,
    pub flow_url: String,
    pub categories: Vec<CategoryOption>,
    pub clear_category_url: String,
    pub selected_category: Option<String>,
    pub detail: Option<DetailView>,
    pub stats: Vec<Metric>,
    pub legend: Vec<LegendView>,
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub version: &'static str,
    pub xsrf_token: String,
    /// ISO code handed to the chart script for tooltip formatting.
    pub currency: String,
    pub presets: Vec<PresetOption>,
    pub range_query: String,
    pub required_columns: &'static [&'static str],
    pub view: Option<DashboardView>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> AppResult<Html<String>> {
    let date_range = params.resolve_date_range();

    let view = state.ledger().map(|ledger| {
        let report = aggregate(&ledger.transactions, &date_range);
        debug!(
            rows = ledger.len(),
            categories = report.categories.len(),
            total_income_cents = report.summary.total_income_cents,
            total_expenses_cents = report.summary.total_expenses_cents,
            "Dashboard data aggregated"
        );
        build_view(
            &state.settings,
            &ledger,
            &date_range,
            &report,
            params.selected_category(),
        )
    });

    let presets = DatePreset::all()
        .iter()
        .map(|p| PresetOption {
            value: p.as_str(),
            label: p.label(),
            selected: date_range.is_preset(p),
        })
        .collect();

    let template = DashboardTemplate {
        title: "Money Flow".into(),
        version: VERSION,
        xsrf_token: state.xsrf_token.value().to_string(),
        currency: state.settings.currency.clone(),
        presets,
        range_query: LinkQuery::for_range(&date_range).encode(),
        required_columns: REQUIRED_COLUMNS,
        view,
    };

    template.render_html()
}

fn build_view(
    settings: &Settings,
    ledger: &Ledger,
    date_range: &DateRange,
    report: &FlowReport,
    selected: Option<&str>,
) -> DashboardView {
    let summary = &report.summary;
    let range_query = LinkQuery::for_range(date_range);
    let display_range = date_range.clone().resolve_all(ledger.date_extent());

    let metrics = vec![
        Metric {
            label: "Income",
            value: settings.format_money_plain(&summary.total_income_cents),
        },
        Metric {
            label: "Expenses",
            value: settings.format_money_plain(&summary.total_expenses_cents),
        },
        Metric {
            label: "Savings",
            value: settings.format_money(&summary.savings_cents),
        },
        Metric {
            label: "Savings Rate",
            value: settings.format_rate(&summary.savings_rate),
        },
    ];

    let categories = flow_graph::category_names(report)
        .into_iter()
        .map(|name| {
            let href = format!(
                "/?{}",
                LinkQuery {
                    category: Some(&name),
                    ..LinkQuery::for_range(date_range)
                }
                .encode()
            );
            CategoryOption {
                selected: selected == Some(name.as_str()),
                name,
                href,
            }
        })
        .collect();

    let detail = selected
        .and_then(|name| flow_graph::category_detail(report, name))
        .map(|detail| detail_view(settings, date_range, detail));

    let stats = vec![
        Metric {
            label: "Total Transactions",
            value: report.stats.transaction_count.to_string(),
        },
        Metric {
            label: "Categories",
            value: report.stats.category_count.to_string(),
        },
        Metric {
            label: "Accounts",
            value: report.stats.account_count.to_string(),
        },
    ];

    let legend = flow_graph::legend(report, LEGEND_LIMIT)
        .into_iter()
        .map(|row| LegendView {
            amount: settings.format_money_plain(&row.amount_cents),
            percentage: settings.format_rate(&row.percentage_of_income),
            category: row.category,
        })
        .collect();

    DashboardView {
        source_name: ledger.source_name.clone(),
        loaded_at: ledger.loaded_at_display(),
        row_count: ledger.len(),
        skipped_count: ledger.skipped_rows.len(),
        skipped_rows: ledger
            .skipped_rows
            .iter()
            .take(SKIPPED_ROWS_SHOWN)
            .cloned()
            .collect(),
        range_label: date_range.display_label(),
        range_from: display_range.from_str(),
        range_to: display_range.to_str(),
        prev_url: format!("/?{}&nav=prev", range_query.encode()),
        next_url: format!("/?{}&nav=next", range_query.encode()),
        can_navigate: date_range.from.is_some() && date_range.to.is_some(),
        metrics,
        flow_url: format!("/api/flow?{}", range_query.encode()),
        categories,
        clear_category_url: format!("/?{}", range_query.encode()),
        selected_category: selected.map(str::to_string),
        detail,
        stats,
        legend,
    }
}

fn detail_view(settings: &Settings, date_range: &DateRange, detail: CategoryDetail) -> DetailView {
    let metrics = vec![
        Metric {
            label: "Total Spent",
            value: settings.format_money_plain(&detail.total_cents),
        },
        Metric {
            label: "Transactions",
            value: detail.transaction_count.to_string(),
        },
        Metric {
            label: "Avg Transaction",
            value: settings.format_money_plain(&detail.average_cents),
        },
    ];

    let chart_url = format!(
        "/api/category?{}",
        LinkQuery {
            name: Some(&detail.category),
            ..LinkQuery::for_range(date_range)
        }
        .encode()
    );

    DetailView {
        metrics,
        merchants: detail
            .merchants
            .iter()
            .map(|m| MerchantView {
                merchant: m.merchant.clone(),
                amount: settings.format_money_plain(&m.total_cents),
                share: settings.format_rate(&m.share),
            })
            .collect(),
        rows: detail
            .transactions
            .iter()
            .map(|t| DetailRowView {
                date: t.date.format("%Y-%m-%d").to_string(),
                merchant: t.merchant.clone(),
                amount: settings.format_money_plain(&t.amount_cents),
                account: t.account.clone().unwrap_or_default(),
            })
            .collect(),
        chart_url,
        name: detail.category,
    }
}
