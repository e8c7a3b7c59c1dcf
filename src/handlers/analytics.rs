use crate::error::AppResult;
use crate::models::{
    AnalyticsResponse, BudgetQuery, ContributionPlan, EntityId, PlanQuery, SubdivisionGoalSeek,
};
use crate::services::{analytics, goal_seek, planner};
use crate::state::AppState;
use crate::utils::coerce_amount;
use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use std::collections::BTreeMap;

fn query_amount(raw: Option<String>) -> rust_decimal::Decimal {
    coerce_amount(&raw.map(Value::String).unwrap_or(Value::Null))
}

pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<BudgetQuery>,
) -> AppResult<Json<AnalyticsResponse>> {
    let portfolio = state.load().await?;
    let budget = query_amount(query.budget);
    Ok(Json(analytics::build_analytics(&portfolio, budget)))
}

pub async fn get_subdivision_goal_seek(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<EntityId, SubdivisionGoalSeek>>> {
    let portfolio = state.load().await?;
    Ok(Json(goal_seek::subdivision_goal_seek_all(&portfolio)))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Query(query): Query<PlanQuery>,
) -> AppResult<Json<ContributionPlan>> {
    let portfolio = state.load().await?;
    let monthly = query_amount(query.monthly);
    let plan = planner::plan_for_portfolio(&portfolio, monthly);
    tracing::debug!(
        months = plan.months.len(),
        completed = plan.completed,
        "Built contribution plan"
    );
    Ok(Json(plan))
}
