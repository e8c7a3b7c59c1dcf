//! Minimum-capital goal seek.
//!
//! Rebalancing here only ever adds money: overweight entries are never sold
//! down, they are diluted as the total grows. The new total is the smallest
//! one at which no entry with a positive target is above its target share.

use crate::models::{Division, DivisionGoalSeek, EntityId, Portfolio, SubdivisionGoalSeek};
use crate::services::valuation::{
    division_totals, portfolio_totals, subdivision_base, subdivision_totals,
};
use crate::utils::non_negative;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// A sibling entry competing for a share of a common total.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub id: EntityId,
    pub current: Decimal,
    pub target_percent: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rebalance {
    pub required_addition: Decimal,
    pub additions: BTreeMap<EntityId, Decimal>,
}

fn zero_additions(buckets: &[Bucket]) -> BTreeMap<EntityId, Decimal> {
    buckets
        .iter()
        .map(|b| (b.id.clone(), Decimal::ZERO))
        .collect()
}

/// Solve for the smallest `new_total >= base_total` that satisfies every
/// positive target, and each bucket's addition at that total.
pub fn solve(base_total: Decimal, buckets: &[Bucket]) -> Rebalance {
    let base_total = non_negative(base_total);
    let has_target = buckets.iter().any(|b| b.target_percent > Decimal::ZERO);

    if base_total <= Decimal::ZERO || !has_target {
        return Rebalance {
            required_addition: Decimal::ZERO,
            additions: zero_additions(buckets),
        };
    }

    let mut new_total = base_total;
    for bucket in buckets.iter().filter(|b| b.target_percent > Decimal::ZERO) {
        let share = bucket.target_percent / dec!(100);
        // A target too small to divide by cannot be met by adding capital
        if let Some(required) = non_negative(bucket.current).checked_div(share) {
            new_total = new_total.max(required);
        }
    }

    let additions: Option<BTreeMap<EntityId, Decimal>> = buckets
        .iter()
        .map(|b| {
            let addition = if b.target_percent > Decimal::ZERO {
                let target_value = (b.target_percent / dec!(100)).checked_mul(new_total)?;
                non_negative(target_value - non_negative(b.current))
            } else {
                Decimal::ZERO
            };
            Some((b.id.clone(), addition))
        })
        .collect();

    match additions {
        Some(additions) => Rebalance {
            required_addition: new_total - base_total,
            additions,
        },
        // Out of representable range: degrade to the zero result
        None => Rebalance {
            required_addition: Decimal::ZERO,
            additions: zero_additions(buckets),
        },
    }
}

pub fn division_buckets(portfolio: &Portfolio) -> Vec<Bucket> {
    portfolio
        .divisions
        .iter()
        .map(|d| Bucket {
            id: d.id.clone(),
            current: division_totals(d).current,
            target_percent: d.target_percent,
        })
        .collect()
}

pub fn subdivision_buckets(division: &Division) -> Vec<Bucket> {
    division
        .subdivisions
        .iter()
        .map(|s| Bucket {
            id: s.id.clone(),
            current: subdivision_totals(s).current,
            target_percent: s.target_percent,
        })
        .collect()
}

/// Portfolio-wide minimum addition that brings every division to its target.
pub fn division_goal_seek(portfolio: &Portfolio) -> DivisionGoalSeek {
    let base = portfolio_totals(portfolio).current;
    let result = solve(base, &division_buckets(portfolio));
    DivisionGoalSeek {
        required_total_addition: result.required_addition,
        additions_by_division: result.additions,
    }
}

/// Same computation scoped to one division's subdivisions. Direct holdings of
/// the division are not part of the base.
pub fn subdivision_goal_seek(division: &Division) -> SubdivisionGoalSeek {
    let result = solve(subdivision_base(division), &subdivision_buckets(division));
    SubdivisionGoalSeek {
        required_addition: result.required_addition,
        additions_by_subdivision: result.additions,
    }
}

pub fn subdivision_goal_seek_all(portfolio: &Portfolio) -> BTreeMap<EntityId, SubdivisionGoalSeek> {
    portfolio
        .divisions
        .iter()
        .map(|d| (d.id.clone(), subdivision_goal_seek(d)))
        .collect()
}
