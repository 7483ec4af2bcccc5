//! Interpretation endpoints, nested under their spread.

use crate::state::AppState;
use arcana_core::model::{Interpretation, InterpretationId, SpreadId, UserId};
use arcana_core::stores::{
    CardCatalog, InterpretationStore, LayoutCatalog, SpreadStore, UserDirectory,
};
use arcana_web::{ApiError, Caller};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct InterpretationRequest {
    body: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct InterpretationResponse {
    id: InterpretationId,
    spread_id: SpreadId,
    author_id: UserId,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<Interpretation> for InterpretationResponse {
    fn from(i: Interpretation) -> Self {
        Self {
            id: i.id,
            spread_id: i.spread_id,
            author_id: i.author_id,
            body: i.body,
            created_at: i.created_at,
        }
    }
}

pub(crate) async fn add<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Caller(ctx): Caller,
    Path(spread_id): Path<SpreadId>,
    Json(request): Json<InterpretationRequest>,
) -> Result<(StatusCode, Json<InterpretationResponse>), ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    let added = state
        .interpretations
        .add(ctx, spread_id, &request.body)
        .await?;
    Ok((StatusCode::CREATED, Json(added.into())))
}

pub(crate) async fn update<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Caller(ctx): Caller,
    Path((spread_id, id)): Path<(SpreadId, InterpretationId)>,
    Json(request): Json<InterpretationRequest>,
) -> Result<Json<InterpretationResponse>, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    let updated = state
        .interpretations
        .update(ctx, spread_id, id, &request.body)
        .await?;
    Ok(Json(updated.into()))
}

pub(crate) async fn delete<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Caller(ctx): Caller,
    Path((spread_id, id)): Path<(SpreadId, InterpretationId)>,
) -> Result<StatusCode, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    state.interpretations.delete(ctx, spread_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
