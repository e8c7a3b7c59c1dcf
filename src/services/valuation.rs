use crate::models::{Division, Holding, Portfolio, Subdivision, Totals};
use crate::utils::{non_negative, saturating_sum};
use rust_decimal::Decimal;
use std::ops::AddAssign;

// Saturates at the representable bounds so huge trees still aggregate
impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.invested = self.invested.saturating_add(rhs.invested);
        self.current = self.current.saturating_add(rhs.current);
        self.profit = self.profit.saturating_add(rhs.profit);
    }
}

pub fn holding_totals(holding: &Holding) -> Totals {
    let invested = non_negative(holding.invested);
    let current = non_negative(holding.current);
    Totals {
        invested,
        current,
        profit: current - invested,
    }
}

pub fn holdings_totals(holdings: &[Holding]) -> Totals {
    let mut totals = Totals::default();
    for holding in holdings {
        totals += holding_totals(holding);
    }
    totals
}

pub fn subdivision_totals(subdivision: &Subdivision) -> Totals {
    holdings_totals(&subdivision.holdings)
}

/// Direct holdings plus every subdivision's holdings.
pub fn division_totals(division: &Division) -> Totals {
    let mut totals = holdings_totals(&division.holdings);
    for subdivision in &division.subdivisions {
        totals += subdivision_totals(subdivision);
    }
    totals
}

/// Current value of a division's subdivisions only, excluding direct holdings.
pub fn subdivision_base(division: &Division) -> Decimal {
    saturating_sum(
        division
            .subdivisions
            .iter()
            .map(|s| subdivision_totals(s).current),
    )
}

pub fn portfolio_totals(portfolio: &Portfolio) -> Totals {
    let mut totals = Totals::default();
    for division in &portfolio.divisions {
        totals += division_totals(division);
    }
    totals
}
