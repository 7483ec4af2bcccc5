//! Internal service-to-service endpoints. No caller headers here.

use crate::state::AppState;
use arcana_core::model::{SpreadId, UserId};
use arcana_core::stores::{
    CardCatalog, InterpretationStore, LayoutCatalog, SpreadStore, UserDirectory,
};
use arcana_web::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct OwnerResponse {
    author_id: UserId,
}

/// Ownership lookup for callers that need an immediate answer.
pub(crate) async fn owner<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Path(id): Path<SpreadId>,
) -> Result<Json<OwnerResponse>, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    let author_id = state.spreads.owner(id).await?;
    Ok(Json(OwnerResponse { author_id }))
}

/// Synchronous purge, identical in effect to consuming a `UserDeleted`
/// fact. Always 204: purging a user with no content is a no-op.
pub(crate) async fn purge_user_data<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    state.spreads.purge_user_data(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn health() -> StatusCode {
    StatusCode::OK
}

pub(crate) async fn ready<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
) -> Result<StatusCode, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    state.spreads.ready().await?;
    Ok(StatusCode::OK)
}
