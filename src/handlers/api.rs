use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_utils::{DateFilterable, DatePreset, DateRange};
use crate::error::{AppError, AppResult};
use crate::services::aggregator::{aggregate, FlowReport, FlowSummary, RangeStats};
use crate::services::flow_graph::{build_flow_graph, category_detail, CategoryDetail, FlowGraph};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ApiParams {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub preset: Option<String>,
    pub nav: Option<String>,
    pub name: Option<String>,
}

impl DateFilterable for ApiParams {
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

#[derive(Debug, Serialize)]
pub struct RangeInfo {
    pub from: Option<String>,
    pub to: Option<String>,
    pub preset: Option<DatePreset>,
    pub label: String,
}

impl From<&DateRange> for RangeInfo {
    fn from(range: &DateRange) -> Self {
        Self {
            from: range.from.map(|_| range.from_str()),
            to: range.to.map(|_| range.to_str()),
            preset: range.preset,
            label: range.display_label(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub range: RangeInfo,
    pub summary: FlowSummary,
    pub graph: FlowGraph,
    pub stats: RangeStats,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub net_cents: i64,
    pub transaction_count: usize,
    pub percentage_of_income: Option<f64>,
}

fn report_for(state: &AppState, params: &ApiParams) -> AppResult<(DateRange, FlowReport)> {
    let ledger = state.require_ledger()?;
    let range = params.resolve_date_range();
    let report = aggregate(&ledger.transactions, &range);
    debug!(
        rows = ledger.len(),
        categories = report.categories.len(),
        range = %range.display_label(),
        "Flow report computed"
    );
    Ok((range, report))
}

pub async fn flow(
    State(state): State<AppState>,
    Query(params): Query<ApiParams>,
) -> AppResult<Json<FlowResponse>> {
    let (range, report) = report_for(&state, &params)?;
    let graph = build_flow_graph(&report);

    Ok(Json(FlowResponse {
        range: RangeInfo::from(&range),
        summary: report.summary,
        graph,
        stats: report.stats,
    }))
}

pub async fn categories(
    State(state): State<AppState>,
    Query(params): Query<ApiParams>,
) -> AppResult<Json<Vec<CategorySummary>>> {
    let (_, report) = report_for(&state, &params)?;

    let result = report
        .categories
        .into_iter()
        .map(|c| CategorySummary {
            category: c.category,
            net_cents: c.net_cents,
            transaction_count: c.transaction_count,
            percentage_of_income: c.percentage_of_income,
        })
        .collect();

    Ok(Json(result))
}

pub async fn category(
    State(state): State<AppState>,
    Query(params): Query<ApiParams>,
) -> AppResult<Json<CategoryDetail>> {
    let name = params
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Missing category name".into()))?
        .to_string();

    let (_, report) = report_for(&state, &params)?;

    category_detail(&report, &name)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No transactions in category '{}'", name)))
}
