use crate::error::AppError;
use crate::models::{
    Division, EntityId, Holding, NewDivisionRequest, NewHoldingRequest, NewSubdivisionRequest,
    Portfolio, Subdivision, UpdateBucketRequest, UpdateHoldingRequest,
};

// In-memory edits of the portfolio tree. Callers load, apply one of these and
// save the whole document.

fn new_id(requested: Option<String>) -> EntityId {
    requested
        .filter(|id| !id.trim().is_empty())
        .map(EntityId::from)
        .unwrap_or_else(EntityId::generate)
}

fn require_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

fn id_in_use(portfolio: &Portfolio, id: &EntityId) -> bool {
    portfolio.divisions.iter().any(|d| {
        &d.id == id
            || d.holdings.iter().any(|h| &h.id == id)
            || d.subdivisions
                .iter()
                .any(|s| &s.id == id || s.holdings.iter().any(|h| &h.id == id))
    })
}

fn unique_id(portfolio: &Portfolio, requested: Option<String>) -> Result<EntityId, AppError> {
    let id = new_id(requested);
    if id_in_use(portfolio, &id) {
        return Err(AppError::BadRequest(format!("Id already in use: {}", id)));
    }
    Ok(id)
}

pub fn find_division_mut<'a>(
    portfolio: &'a mut Portfolio,
    division_id: &EntityId,
) -> Result<&'a mut Division, AppError> {
    portfolio
        .divisions
        .iter_mut()
        .find(|d| &d.id == division_id)
        .ok_or_else(|| AppError::not_found("division", division_id))
}

pub fn find_subdivision_mut<'a>(
    portfolio: &'a mut Portfolio,
    division_id: &EntityId,
    subdivision_id: &EntityId,
) -> Result<&'a mut Subdivision, AppError> {
    find_division_mut(portfolio, division_id)?
        .subdivisions
        .iter_mut()
        .find(|s| &s.id == subdivision_id)
        .ok_or_else(|| AppError::not_found("subdivision", subdivision_id))
}

fn find_holding_mut<'a>(
    portfolio: &'a mut Portfolio,
    holding_id: &EntityId,
) -> Result<&'a mut Holding, AppError> {
    portfolio
        .divisions
        .iter_mut()
        .flat_map(|d| {
            let Division {
                holdings,
                subdivisions,
                ..
            } = d;
            let nested = subdivisions.iter_mut().flat_map(|s| s.holdings.iter_mut());
            holdings.iter_mut().chain(nested)
        })
        .find(|h| &h.id == holding_id)
        .ok_or_else(|| AppError::not_found("holding", holding_id))
}

pub fn add_division(
    portfolio: &mut Portfolio,
    request: NewDivisionRequest,
) -> Result<Division, AppError> {
    let division = Division {
        id: unique_id(portfolio, request.id)?,
        name: require_name(&request.name)?,
        target_percent: request.target_percent,
        holdings: Vec::new(),
        subdivisions: Vec::new(),
    };
    portfolio.divisions.push(division.clone());
    Ok(division)
}

pub fn update_division(
    portfolio: &mut Portfolio,
    division_id: &EntityId,
    request: UpdateBucketRequest,
) -> Result<Division, AppError> {
    let division = find_division_mut(portfolio, division_id)?;
    if let Some(name) = request.name {
        division.name = require_name(&name)?;
    }
    if let Some(target) = request.target_percent {
        division.target_percent = target;
    }
    Ok(division.clone())
}

pub fn remove_division(portfolio: &mut Portfolio, division_id: &EntityId) -> Result<Division, AppError> {
    let index = portfolio
        .divisions
        .iter()
        .position(|d| &d.id == division_id)
        .ok_or_else(|| AppError::not_found("division", division_id))?;
    Ok(portfolio.divisions.remove(index))
}

pub fn add_subdivision(
    portfolio: &mut Portfolio,
    division_id: &EntityId,
    request: NewSubdivisionRequest,
) -> Result<Subdivision, AppError> {
    let subdivision = Subdivision {
        id: unique_id(portfolio, request.id)?,
        name: require_name(&request.name)?,
        target_percent: request.target_percent,
        holdings: Vec::new(),
    };
    find_division_mut(portfolio, division_id)?
        .subdivisions
        .push(subdivision.clone());
    Ok(subdivision)
}

pub fn update_subdivision(
    portfolio: &mut Portfolio,
    division_id: &EntityId,
    subdivision_id: &EntityId,
    request: UpdateBucketRequest,
) -> Result<Subdivision, AppError> {
    let subdivision = find_subdivision_mut(portfolio, division_id, subdivision_id)?;
    if let Some(name) = request.name {
        subdivision.name = require_name(&name)?;
    }
    if let Some(target) = request.target_percent {
        subdivision.target_percent = target;
    }
    Ok(subdivision.clone())
}

pub fn remove_subdivision(
    portfolio: &mut Portfolio,
    division_id: &EntityId,
    subdivision_id: &EntityId,
) -> Result<Subdivision, AppError> {
    let division = find_division_mut(portfolio, division_id)?;
    let index = division
        .subdivisions
        .iter()
        .position(|s| &s.id == subdivision_id)
        .ok_or_else(|| AppError::not_found("subdivision", subdivision_id))?;
    Ok(division.subdivisions.remove(index))
}

fn build_holding(portfolio: &Portfolio, request: NewHoldingRequest) -> Result<Holding, AppError> {
    Ok(Holding {
        id: unique_id(portfolio, request.id)?,
        name: require_name(&request.name)?,
        invested: request.invested,
        current: request.current,
        target_percent: request.target_percent,
    })
}

/// Add a holding directly under a division, or under one of its
/// subdivisions when `subdivision_id` is given.
pub fn add_holding(
    portfolio: &mut Portfolio,
    division_id: &EntityId,
    subdivision_id: Option<&EntityId>,
    request: NewHoldingRequest,
) -> Result<Holding, AppError> {
    let holding = build_holding(portfolio, request)?;
    let holdings = match subdivision_id {
        Some(sid) => &mut find_subdivision_mut(portfolio, division_id, sid)?.holdings,
        None => &mut find_division_mut(portfolio, division_id)?.holdings,
    };
    holdings.push(holding.clone());
    Ok(holding)
}

pub fn update_holding(
    portfolio: &mut Portfolio,
    holding_id: &EntityId,
    request: UpdateHoldingRequest,
) -> Result<Holding, AppError> {
    let holding = find_holding_mut(portfolio, holding_id)?;
    if let Some(name) = request.name {
        holding.name = require_name(&name)?;
    }
    if let Some(invested) = request.invested {
        holding.invested = invested;
    }
    if let Some(current) = request.current {
        holding.current = current;
    }
    if request.target_percent.is_some() {
        holding.target_percent = request.target_percent;
    }
    Ok(holding.clone())
}

pub fn remove_holding(portfolio: &mut Portfolio, holding_id: &EntityId) -> Result<Holding, AppError> {
    for division in portfolio.divisions.iter_mut() {
        if let Some(index) = division.holdings.iter().position(|h| &h.id == holding_id) {
            return Ok(division.holdings.remove(index));
        }
        for subdivision in division.subdivisions.iter_mut() {
            if let Some(index) = subdivision.holdings.iter().position(|h| &h.id == holding_id) {
                return Ok(subdivision.holdings.remove(index));
            }
        }
    }
    Err(AppError::not_found("holding", holding_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn division_request(id: &str, name: &str, target: Decimal) -> NewDivisionRequest {
        NewDivisionRequest {
            id: Some(id.to_string()),
            name: name.to_string(),
            target_percent: target,
        }
    }

    fn holding_request(id: &str, current: Decimal) -> NewHoldingRequest {
        NewHoldingRequest {
            id: Some(id.to_string()),
            name: id.to_uppercase(),
            invested: current,
            current,
            target_percent: None,
        }
    }

    fn seeded() -> Portfolio {
        let mut portfolio = Portfolio::default();
        add_division(&mut portfolio, division_request("eq", "Equity", dec!(70))).unwrap();
        add_subdivision(
            &mut portfolio,
            &EntityId::from("eq"),
            division_request("us", "US", dec!(60)),
        )
        .unwrap();
        add_holding(&mut portfolio, &EntityId::from("eq"), None, holding_request("vt", dec!(100)))
            .unwrap();
        add_holding(
            &mut portfolio,
            &EntityId::from("eq"),
            Some(&EntityId::from("us")),
            holding_request("voo", dec!(300)),
        )
        .unwrap();
        portfolio
    }

    #[test]
    fn test_add_generates_id_when_missing() {
        let mut portfolio = Portfolio::default();
        let division = add_division(
            &mut portfolio,
            NewDivisionRequest {
                id: None,
                name: "Cash".to_string(),
                target_percent: dec!(5),
            },
        )
        .unwrap();
        assert!(!division.id.as_str().is_empty());
        assert_eq!(portfolio.divisions.len(), 1);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut portfolio = Portfolio::default();
        let err = add_division(&mut portfolio, division_request("x", "   ", dec!(5))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut portfolio = seeded();
        let err = add_division(&mut portfolio, division_request("voo", "Dup", dec!(5))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_holdings_land_in_the_right_bucket() {
        let portfolio = seeded();
        let eq = &portfolio.divisions[0];
        assert_eq!(eq.holdings[0].id, EntityId::from("vt"));
        assert_eq!(eq.subdivisions[0].holdings[0].id, EntityId::from("voo"));
    }

    #[test]
    fn test_update_holding_anywhere_in_tree() {
        let mut portfolio = seeded();
        let updated = update_holding(
            &mut portfolio,
            &EntityId::from("voo"),
            UpdateHoldingRequest {
                current: Some(dec!(450)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.current, dec!(450));
        assert_eq!(updated.invested, dec!(300));
        assert_eq!(portfolio.divisions[0].subdivisions[0].holdings[0].current, dec!(450));
    }

    #[test]
    fn test_partial_division_update_keeps_other_fields() {
        let mut portfolio = seeded();
        let updated = update_division(
            &mut portfolio,
            &EntityId::from("eq"),
            UpdateBucketRequest {
                target_percent: Some(dec!(80)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Equity");
        assert_eq!(updated.target_percent, dec!(80));
    }

    #[test]
    fn test_remove_entities() {
        let mut portfolio = seeded();
        remove_holding(&mut portfolio, &EntityId::from("voo")).unwrap();
        assert!(portfolio.divisions[0].subdivisions[0].holdings.is_empty());

        remove_subdivision(&mut portfolio, &EntityId::from("eq"), &EntityId::from("us")).unwrap();
        assert!(portfolio.divisions[0].subdivisions.is_empty());

        remove_division(&mut portfolio, &EntityId::from("eq")).unwrap();
        assert!(portfolio.divisions.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let mut portfolio = seeded();
        let missing = EntityId::from("missing");
        assert!(matches!(
            remove_holding(&mut portfolio, &missing),
            Err(AppError::NotFound { kind: "holding", .. })
        ));
        assert!(matches!(
            update_subdivision(
                &mut portfolio,
                &EntityId::from("eq"),
                &missing,
                UpdateBucketRequest::default()
            ),
            Err(AppError::NotFound { kind: "subdivision", .. })
        ));
        assert!(matches!(
            add_holding(&mut portfolio, &missing, None, holding_request("new", dec!(1))),
            Err(AppError::NotFound { kind: "division", .. })
        ));
    }
}
