//! Month-by-month contribution schedule.
//!
//! A fixed monthly amount is spread across divisions in proportion to what
//! each still needs, and within a division across its subdivisions the same
//! way, until the required total is reached.

use crate::models::{
    ContributionPlan, DivisionGoalSeek, EntityId, PlanAllocation, PlanMonth, Portfolio,
    SubdivisionGoalSeek,
};
use crate::services::goal_seek::{division_goal_seek, subdivision_goal_seek_all};
use crate::utils::{non_negative, saturating_sum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

pub const MAX_MONTHS: u32 = 120;
pub const EPSILON: Decimal = dec!(0.01);

#[derive(Debug, Clone)]
pub struct Need {
    pub id: EntityId,
    pub remaining: Decimal,
}

#[derive(Debug, Clone)]
pub struct DivisionNeed {
    pub id: EntityId,
    pub remaining: Decimal,
    pub subdivisions: Vec<Need>,
}

/// Outstanding additions in portfolio order, ready for planning.
pub fn division_needs(
    portfolio: &Portfolio,
    goal: &DivisionGoalSeek,
    subdivision_goals: &BTreeMap<EntityId, SubdivisionGoalSeek>,
) -> Vec<DivisionNeed> {
    portfolio
        .divisions
        .iter()
        .filter_map(|division| {
            let remaining = goal.addition_for(&division.id)?;
            if remaining < EPSILON {
                return None;
            }
            let subdivisions = subdivision_goals
                .get(&division.id)
                .map(|sub_goal| {
                    division
                        .subdivisions
                        .iter()
                        .filter_map(|s| {
                            let remaining = sub_goal.addition_for(&s.id)?;
                            (remaining >= EPSILON).then(|| Need {
                                id: s.id.clone(),
                                remaining,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(DivisionNeed {
                id: division.id.clone(),
                remaining,
                subdivisions,
            })
        })
        .collect()
}

/// Split `amount` across subdivisions by remaining share, capped at each
/// subdivision's need. Whatever is not placed stays with the division.
fn split_subdivisions(needs: &mut [Need], amount: Decimal) -> BTreeMap<EntityId, Decimal> {
    let total = saturating_sum(needs.iter().map(|n| n.remaining));
    let mut split = BTreeMap::new();
    if total <= Decimal::ZERO || amount <= Decimal::ZERO {
        return split;
    }
    for need in needs.iter_mut() {
        let share = (need.remaining / total * amount).min(need.remaining);
        need.remaining = non_negative(need.remaining - share);
        split.insert(need.id.clone(), share);
    }
    split
}

pub fn build_plan(
    mut needs: Vec<DivisionNeed>,
    required_total_addition: Decimal,
    monthly_amount: Decimal,
) -> ContributionPlan {
    let monthly_amount = non_negative(monthly_amount);
    let required_total_addition = non_negative(required_total_addition);
    let mut months = Vec::new();
    let mut cumulative = Decimal::ZERO;

    for month in 1..=MAX_MONTHS {
        needs.retain(|n| n.remaining >= EPSILON);
        let total_need = saturating_sum(needs.iter().map(|n| n.remaining));
        if needs.is_empty() || total_need <= Decimal::ZERO {
            break;
        }

        let budget = monthly_amount
            .min(non_negative(required_total_addition - cumulative))
            .min(total_need);
        if budget < EPSILON {
            break;
        }

        let mut allocations = Vec::with_capacity(needs.len());
        let mut month_total = Decimal::ZERO;
        for need in needs.iter_mut() {
            let amount = (need.remaining / total_need * budget)
                .min(need.remaining)
                .min(budget - month_total);
            if amount <= Decimal::ZERO {
                continue;
            }
            need.remaining = non_negative(need.remaining - amount);
            let subdivisions = split_subdivisions(&mut need.subdivisions, amount);
            need.subdivisions.retain(|s| s.remaining >= EPSILON);
            month_total += amount;
            allocations.push(PlanAllocation {
                division_id: need.id.clone(),
                amount,
                subdivisions,
            });
        }

        if month_total < EPSILON {
            break;
        }
        cumulative += month_total;
        months.push(PlanMonth {
            month,
            total: month_total,
            cumulative_invested: cumulative,
            remaining: non_negative(required_total_addition - cumulative),
            allocations,
        });
    }

    let completed = required_total_addition - cumulative < EPSILON
        || needs.iter().all(|n| n.remaining < EPSILON);

    ContributionPlan {
        monthly_amount,
        required_total_addition,
        total_planned: cumulative,
        completed,
        months,
    }
}

/// Plan directly from the persisted tree.
pub fn plan_for_portfolio(portfolio: &Portfolio, monthly_amount: Decimal) -> ContributionPlan {
    let goal = division_goal_seek(portfolio);
    let subdivision_goals = subdivision_goal_seek_all(portfolio);
    let needs = division_needs(portfolio, &goal, &subdivision_goals);
    build_plan(needs, goal.required_total_addition, monthly_amount)
}
