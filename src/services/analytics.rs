use crate::models::{AnalyticsResponse, AnalyticsRow, Division, Portfolio, Subdivision};
use crate::services::budget::division_budget_additions;
use crate::services::goal_seek::{division_goal_seek, subdivision_goal_seek};
use crate::services::valuation::{division_totals, portfolio_totals, subdivision_totals};
use crate::utils::non_negative;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Share of `parent_total` held by `current`, in percent. A zero parent, or a
/// ratio too large to represent, gives 0.
pub fn current_percent(current: Decimal, parent_total: Decimal) -> Decimal {
    if parent_total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    non_negative(current)
        .checked_div(parent_total)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .unwrap_or(Decimal::ZERO)
}

pub fn delta_percent(target_percent: Decimal, current_percent: Decimal) -> Decimal {
    target_percent - current_percent
}

fn subdivision_row(
    subdivision: &Subdivision,
    parent_total: Decimal,
    required_addition: Decimal,
) -> AnalyticsRow {
    let totals = subdivision_totals(subdivision);
    let current_pct = current_percent(totals.current, parent_total);
    AnalyticsRow {
        id: subdivision.id.clone(),
        name: subdivision.name.clone(),
        target_percent: subdivision.target_percent,
        invested: totals.invested,
        current: totals.current,
        profit: totals.profit,
        current_percent: current_pct,
        delta_percent: delta_percent(subdivision.target_percent, current_pct),
        required_addition,
        subdivisions: Vec::new(),
    }
}

fn division_row(division: &Division, portfolio_current: Decimal, required_addition: Decimal) -> AnalyticsRow {
    let totals = division_totals(division);
    let current_pct = current_percent(totals.current, portfolio_current);

    let goal = subdivision_goal_seek(division);
    let subdivisions = division
        .subdivisions
        .iter()
        .map(|s| {
            let addition = goal.addition_for(&s.id).unwrap_or(Decimal::ZERO);
            subdivision_row(s, totals.current, addition)
        })
        .collect();

    AnalyticsRow {
        id: division.id.clone(),
        name: division.name.clone(),
        target_percent: division.target_percent,
        invested: totals.invested,
        current: totals.current,
        profit: totals.profit,
        current_percent: current_pct,
        delta_percent: delta_percent(division.target_percent, current_pct),
        required_addition,
        subdivisions,
    }
}

/// Full analytics payload for the overview table and budget planner.
pub fn build_analytics(portfolio: &Portfolio, budget: Decimal) -> AnalyticsResponse {
    let budget = non_negative(budget);
    let totals = portfolio_totals(portfolio);
    let goal = division_goal_seek(portfolio);

    let divisions = portfolio
        .divisions
        .iter()
        .map(|d| {
            let addition = goal.addition_for(&d.id).unwrap_or(Decimal::ZERO);
            division_row(d, totals.current, addition)
        })
        .collect();

    tracing::debug!(
        current = %totals.current,
        required = %goal.required_total_addition,
        budget = %budget,
        "computed portfolio analytics"
    );

    AnalyticsResponse {
        totals,
        divisions,
        required_total_addition: goal.required_total_addition,
        budget,
        budget_additions: division_budget_additions(portfolio, budget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityId;
    use crate::services::goal_seek::fixtures::{division, holding, subdivision};

    #[test]
    fn test_current_and_delta_percent() {
        let pct = current_percent(dec!(250), dec!(1000));
        assert_eq!(pct, dec!(25));
        assert_eq!(delta_percent(dec!(40), pct), dec!(15));
        assert_eq!(delta_percent(dec!(10), pct), dec!(-15));
    }

    #[test]
    fn test_current_percent_with_zero_parent() {
        assert_eq!(current_percent(dec!(10), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_current_percent_out_of_range_is_zero() {
        assert_eq!(current_percent(Decimal::MAX, dec!(0.001)), Decimal::ZERO);
    }

    #[test]
    fn test_analytics_survive_huge_budget_and_holdings() {
        let huge = dec!(50000000000000000000000000000);
        let mut big = division("big", dec!(50), huge);
        big.holdings.push(holding("big-2", huge));
        let portfolio = Portfolio {
            divisions: vec![big, division("small", dec!(50), dec!(10))],
            updated_at: None,
        };
        let analytics = build_analytics(&portfolio, Decimal::MAX);
        assert_eq!(analytics.totals.current, Decimal::MAX);
        assert_eq!(analytics.budget, Decimal::MAX);
        assert!(analytics.budget_additions.values().all(|v| v.is_zero()));
        assert_eq!(analytics.divisions.len(), 2);
    }

    #[test]
    fn test_build_analytics_rows() {
        let mut eq = division("eq", dec!(50), dec!(0));
        eq.holdings.push(holding("direct", dec!(200)));
        eq.subdivisions = vec![
            subdivision("us", dec!(75), dec!(600)),
            subdivision("eu", dec!(25), dec!(200)),
        ];
        let portfolio = Portfolio {
            divisions: vec![eq, division("bonds", dec!(50), dec!(0))],
            updated_at: None,
        };

        let analytics = build_analytics(&portfolio, dec!(500));
        assert_eq!(analytics.totals.current, dec!(1000));
        assert_eq!(analytics.required_total_addition, dec!(1000));
        assert_eq!(analytics.budget, dec!(500));
        assert_eq!(analytics.budget_additions[&EntityId::from("bonds")], dec!(500));

        let eq_row = &analytics.divisions[0];
        assert_eq!(eq_row.current_percent, dec!(100));
        assert_eq!(eq_row.delta_percent, dec!(-50));
        assert_eq!(eq_row.required_addition, Decimal::ZERO);

        let us = &eq_row.subdivisions[0];
        // Measured against the whole division, direct holdings included
        assert_eq!(us.current_percent, dec!(60));
        assert_eq!(us.delta_percent, dec!(15));
        assert_eq!(us.required_addition, Decimal::ZERO);
        assert!(us.subdivisions.is_empty());

        let bonds_row = &analytics.divisions[1];
        assert_eq!(bonds_row.required_addition, dec!(1000));
        assert!(bonds_row.subdivisions.is_empty());
    }

    #[test]
    fn test_negative_budget_is_treated_as_zero() {
        let portfolio = Portfolio {
            divisions: vec![division("a", dec!(100), dec!(10))],
            updated_at: None,
        };
        let analytics = build_analytics(&portfolio, dec!(-20));
        assert_eq!(analytics.budget, Decimal::ZERO);
        assert_eq!(analytics.budget_additions[&EntityId::from("a")], Decimal::ZERO);
    }
}
