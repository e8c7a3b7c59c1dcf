use crate::models::{EntityId, Portfolio};
use crate::services::goal_seek::{division_buckets, Bucket};
use crate::services::valuation::portfolio_totals;
use crate::utils::{checked_sum, non_negative, saturating_sum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Split a fixed budget across buckets in proportion to how far each falls
/// short of its target share of `base_total + budget`.
///
/// The result is never negative and sums exactly to `budget` whenever at least
/// one bucket is short; otherwise every bucket gets zero.
pub fn allocate_budget(
    base_total: Decimal,
    buckets: &[Bucket],
    budget: Decimal,
) -> BTreeMap<EntityId, Decimal> {
    let budget = non_negative(budget);
    let zeros = || -> BTreeMap<EntityId, Decimal> {
        buckets
            .iter()
            .map(|b| (b.id.clone(), Decimal::ZERO))
            .collect()
    };

    // Out of representable range degrades to the zero result
    let Some(projected_total) = non_negative(base_total).checked_add(budget) else {
        return zeros();
    };
    let desired: Option<Vec<(EntityId, Decimal)>> = buckets
        .iter()
        .map(|b| {
            let target_value = (b.target_percent / dec!(100)).checked_mul(projected_total)?;
            Some((b.id.clone(), non_negative(target_value - non_negative(b.current))))
        })
        .collect();
    let Some(desired) = desired else {
        return zeros();
    };

    let desired_sum = match checked_sum(desired.iter().map(|(_, x)| *x)) {
        Some(sum) if sum > Decimal::ZERO && budget > Decimal::ZERO => sum,
        _ => return zeros(),
    };

    // Shares are computed as ratios first so a near-zero sum cannot blow up
    let mut allocations: BTreeMap<EntityId, Decimal> = desired
        .iter()
        .map(|(id, x)| (id.clone(), *x / desired_sum * budget))
        .collect();

    // Hand rounding residue to the largest recipient so the split is exact
    let allocated = saturating_sum(allocations.values().copied());
    let residue = budget - allocated;
    if !residue.is_zero() {
        let largest = allocations
            .iter()
            .max_by(|a, b| a.1.cmp(b.1))
            .map(|(id, _)| id.clone());
        if let Some(amount) = largest.and_then(|id| allocations.get_mut(&id)) {
            *amount = non_negative(amount.saturating_add(residue));
        }
    }

    allocations
}

pub fn division_budget_additions(
    portfolio: &Portfolio,
    budget: Decimal,
) -> BTreeMap<EntityId, Decimal> {
    allocate_budget(
        portfolio_totals(portfolio).current,
        &division_buckets(portfolio),
        budget,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::goal_seek::fixtures::division;

    fn bucket(id: &str, target: Decimal, current: Decimal) -> Bucket {
        Bucket {
            id: EntityId::from(id),
            current,
            target_percent: target,
        }
    }

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    #[test]
    fn test_insufficient_budget_is_rationed() {
        let buckets = vec![
            bucket("a", dec!(50), dec!(1000)),
            bucket("b", dec!(50), dec!(0)),
        ];
        let additions = allocate_budget(dec!(1000), &buckets, dec!(500));
        assert_eq!(additions[&id("a")], Decimal::ZERO);
        assert_eq!(additions[&id("b")], dec!(500));
    }

    #[test]
    fn test_allocations_sum_to_budget() {
        let buckets = vec![
            bucket("eq", dec!(60), dec!(3000)),
            bucket("bonds", dec!(30), dec!(700)),
            bucket("cash", dec!(10), dec!(100)),
        ];
        let budget = dec!(1000);
        let additions = allocate_budget(dec!(3800), &buckets, budget);
        let sum: Decimal = additions.values().copied().sum();
        assert!((sum - budget).abs() < dec!(0.0000001));
        assert!(additions.values().all(|v| *v >= Decimal::ZERO));
    }

    #[test]
    fn test_balanced_portfolio_gets_zeros() {
        let buckets = vec![bucket("a", dec!(0), dec!(500))];
        let additions = allocate_budget(dec!(500), &buckets, dec!(200));
        assert_eq!(additions[&id("a")], Decimal::ZERO);
    }

    #[test]
    fn test_zero_budget_gets_zeros() {
        let buckets = vec![bucket("a", dec!(50), dec!(10)), bucket("b", dec!(50), dec!(0))];
        let additions = allocate_budget(dec!(10), &buckets, Decimal::ZERO);
        assert!(additions.values().all(|v| v.is_zero()));
    }

    #[test]
    fn test_near_zero_desired_sum_is_stable() {
        // b falls short by a hair; the whole budget still goes to it
        let buckets = vec![
            bucket("a", dec!(50), dec!(500.0000000001)),
            bucket("b", dec!(50), dec!(500.0000000000)),
        ];
        let additions = allocate_budget(dec!(1000.0000000001), &buckets, dec!(0.0000000001));
        let sum: Decimal = additions.values().copied().sum();
        assert!((sum - dec!(0.0000000001)).abs() < dec!(0.000000000001));
        assert!(additions[&id("b")] > additions[&id("a")]);
        assert!(additions.values().all(|v| *v >= Decimal::ZERO));
    }

    #[test]
    fn test_targets_not_summing_to_hundred_still_spend_budget() {
        let budget = dec!(700);
        for buckets in [
            vec![
                bucket("a", dec!(30), dec!(600)),
                bucket("b", dec!(20), dec!(100)),
                bucket("rest", dec!(0), dec!(300)),
            ],
            vec![bucket("x", dec!(80), dec!(800)), bucket("y", dec!(60), dec!(200))],
        ] {
            let additions = allocate_budget(dec!(1000), &buckets, budget);
            let sum: Decimal = additions.values().copied().sum();
            assert!((sum - budget).abs() < dec!(0.0000001), "sum {sum}");
            assert!(additions.values().all(|v| *v >= Decimal::ZERO));
            assert_eq!(additions.len(), buckets.len());
        }
    }

    #[test]
    fn test_budget_at_decimal_max_degrades_to_zeros() {
        let buckets = vec![bucket("a", dec!(50), dec!(1000)), bucket("b", dec!(50), dec!(0))];
        let additions = allocate_budget(dec!(1000), &buckets, Decimal::MAX);
        assert_eq!(additions.len(), 2);
        assert!(additions.values().all(|v| v.is_zero()));

        let additions = allocate_budget(Decimal::MAX, &buckets, dec!(1));
        assert!(additions.values().all(|v| *v >= Decimal::ZERO));
    }

    #[test]
    fn test_division_budget_additions_from_portfolio() {
        let portfolio = Portfolio {
            divisions: vec![
                division("a", dec!(50), dec!(1000)),
                division("b", dec!(50), dec!(0)),
            ],
            updated_at: None,
        };
        let additions = division_budget_additions(&portfolio, dec!(500));
        assert_eq!(additions[&id("b")], dec!(500));
    }
}
