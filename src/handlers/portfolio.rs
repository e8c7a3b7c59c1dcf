use crate::error::AppResult;
use crate::models::{
    Division, EntityId, Holding, NewDivisionRequest, NewHoldingRequest, NewSubdivisionRequest,
    Portfolio, Subdivision, UpdateBucketRequest, UpdateHoldingRequest,
};
use crate::services::portfolio as tree;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// Load, apply one edit, persist the whole document.
async fn mutate<T>(
    state: &AppState,
    edit: impl FnOnce(&mut Portfolio) -> AppResult<T>,
) -> AppResult<T> {
    let mut portfolio = state.load().await?;
    let result = edit(&mut portfolio)?;
    state.save(portfolio).await?;
    Ok(result)
}

pub async fn get_portfolio(State(state): State<AppState>) -> AppResult<Json<Portfolio>> {
    Ok(Json(state.load().await?))
}

pub async fn create_division(
    State(state): State<AppState>,
    Json(request): Json<NewDivisionRequest>,
) -> AppResult<(StatusCode, Json<Division>)> {
    let division = mutate(&state, |p| tree::add_division(p, request)).await?;
    info!(id = %division.id, name = %division.name, "Created division");
    Ok((StatusCode::CREATED, Json(division)))
}

pub async fn update_division(
    State(state): State<AppState>,
    Path(division_id): Path<String>,
    Json(request): Json<UpdateBucketRequest>,
) -> AppResult<Json<Division>> {
    let id = EntityId::from(division_id);
    let division = mutate(&state, |p| tree::update_division(p, &id, request)).await?;
    info!(id = %division.id, "Updated division");
    Ok(Json(division))
}

pub async fn delete_division(
    State(state): State<AppState>,
    Path(division_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = EntityId::from(division_id);
    mutate(&state, |p| tree::remove_division(p, &id)).await?;
    info!(id = %id, "Deleted division");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_subdivision(
    State(state): State<AppState>,
    Path(division_id): Path<String>,
    Json(request): Json<NewSubdivisionRequest>,
) -> AppResult<(StatusCode, Json<Subdivision>)> {
    let division_id = EntityId::from(division_id);
    let subdivision =
        mutate(&state, |p| tree::add_subdivision(p, &division_id, request)).await?;
    info!(division = %division_id, id = %subdivision.id, "Created subdivision");
    Ok((StatusCode::CREATED, Json(subdivision)))
}

pub async fn update_subdivision(
    State(state): State<AppState>,
    Path((division_id, subdivision_id)): Path<(String, String)>,
    Json(request): Json<UpdateBucketRequest>,
) -> AppResult<Json<Subdivision>> {
    let division_id = EntityId::from(division_id);
    let subdivision_id = EntityId::from(subdivision_id);
    let subdivision = mutate(&state, |p| {
        tree::update_subdivision(p, &division_id, &subdivision_id, request)
    })
    .await?;
    info!(division = %division_id, id = %subdivision.id, "Updated subdivision");
    Ok(Json(subdivision))
}

pub async fn delete_subdivision(
    State(state): State<AppState>,
    Path((division_id, subdivision_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let division_id = EntityId::from(division_id);
    let subdivision_id = EntityId::from(subdivision_id);
    mutate(&state, |p| tree::remove_subdivision(p, &division_id, &subdivision_id)).await?;
    info!(division = %division_id, id = %subdivision_id, "Deleted subdivision");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_division_holding(
    State(state): State<AppState>,
    Path(division_id): Path<String>,
    Json(request): Json<NewHoldingRequest>,
) -> AppResult<(StatusCode, Json<Holding>)> {
    let division_id = EntityId::from(division_id);
    let holding =
        mutate(&state, |p| tree::add_holding(p, &division_id, None, request)).await?;
    info!(division = %division_id, id = %holding.id, "Created holding");
    Ok((StatusCode::CREATED, Json(holding)))
}

pub async fn create_subdivision_holding(
    State(state): State<AppState>,
    Path((division_id, subdivision_id)): Path<(String, String)>,
    Json(request): Json<NewHoldingRequest>,
) -> AppResult<(StatusCode, Json<Holding>)> {
    let division_id = EntityId::from(division_id);
    let subdivision_id = EntityId::from(subdivision_id);
    let holding = mutate(&state, |p| {
        tree::add_holding(p, &division_id, Some(&subdivision_id), request)
    })
    .await?;
    info!(subdivision = %subdivision_id, id = %holding.id, "Created holding");
    Ok((StatusCode::CREATED, Json(holding)))
}

pub async fn update_holding(
    State(state): State<AppState>,
    Path(holding_id): Path<String>,
    Json(request): Json<UpdateHoldingRequest>,
) -> AppResult<Json<Holding>> {
    let id = EntityId::from(holding_id);
    let holding = mutate(&state, |p| tree::update_holding(p, &id, request)).await?;
    info!(id = %holding.id, "Updated holding");
    Ok(Json(holding))
}

pub async fn delete_holding(
    State(state): State<AppState>,
    Path(holding_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = EntityId::from(holding_id);
    mutate(&state, |p| tree::remove_holding(p, &id)).await?;
    info!(id = %id, "Deleted holding");
    Ok(StatusCode::NO_CONTENT)
}
