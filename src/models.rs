use crate::utils::{de_amount, de_opt_amount, de_opt_percent, de_opt_percent_update, de_percent};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier shared by divisions, subdivisions and holdings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Persisted document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    #[serde(default)]
    pub divisions: Vec<Division>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    /// Share of the whole portfolio's current value.
    #[serde(default, deserialize_with = "de_percent")]
    pub target_percent: Decimal,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub subdivisions: Vec<Subdivision>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subdivision {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    /// Share of the parent division's current value.
    #[serde(default, deserialize_with = "de_percent")]
    pub target_percent: Decimal,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub invested: Decimal,
    #[serde(default, deserialize_with = "de_amount")]
    pub current: Decimal,
    #[serde(
        default,
        deserialize_with = "de_opt_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_percent: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Derived analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Totals {
    pub invested: Decimal,
    pub current: Decimal,
    pub profit: Decimal,
}

/// One analytics row; subdivision rows carry an empty `subdivisions` list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRow {
    pub id: EntityId,
    pub name: String,
    pub target_percent: Decimal,
    pub invested: Decimal,
    pub current: Decimal,
    pub profit: Decimal,
    pub current_percent: Decimal,
    pub delta_percent: Decimal,
    pub required_addition: Decimal,
    pub subdivisions: Vec<AnalyticsRow>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub totals: Totals,
    pub divisions: Vec<AnalyticsRow>,
    pub required_total_addition: Decimal,
    pub budget: Decimal,
    pub budget_additions: BTreeMap<EntityId, Decimal>,
}

/// Division-level goal-seek outcome.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionGoalSeek {
    pub required_total_addition: Decimal,
    pub additions_by_division: BTreeMap<EntityId, Decimal>,
}

impl DivisionGoalSeek {
    pub fn addition_for(&self, id: &EntityId) -> Option<Decimal> {
        self.additions_by_division.get(id).copied()
    }
}

/// Subdivision-level goal-seek outcome for one division.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdivisionGoalSeek {
    pub required_addition: Decimal,
    pub additions_by_subdivision: BTreeMap<EntityId, Decimal>,
}

impl SubdivisionGoalSeek {
    pub fn addition_for(&self, id: &EntityId) -> Option<Decimal> {
        self.additions_by_subdivision.get(id).copied()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAllocation {
    pub division_id: EntityId,
    pub amount: Decimal,
    pub subdivisions: BTreeMap<EntityId, Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMonth {
    pub month: u32,
    pub total: Decimal,
    pub cumulative_invested: Decimal,
    pub remaining: Decimal,
    pub allocations: Vec<PlanAllocation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionPlan {
    pub monthly_amount: Decimal,
    pub required_total_addition: Decimal,
    pub total_planned: Decimal,
    pub completed: bool,
    pub months: Vec<PlanMonth>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDivisionRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_percent")]
    pub target_percent: Decimal,
}

/// Shared by subdivisions since they carry the same editable fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBucketRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_percent_update")]
    pub target_percent: Option<Decimal>,
}

pub type NewSubdivisionRequest = NewDivisionRequest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHoldingRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_amount")]
    pub invested: Decimal,
    #[serde(default, deserialize_with = "de_amount")]
    pub current: Decimal,
    #[serde(default, deserialize_with = "de_opt_percent")]
    pub target_percent: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHoldingRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub invested: Option<Decimal>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub current: Option<Decimal>,
    #[serde(default, deserialize_with = "de_opt_percent_update")]
    pub target_percent: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct BudgetQuery {
    pub budget: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub monthly: Option<String>,
}
