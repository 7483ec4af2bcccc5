//! Spread endpoints.

use crate::state::AppState;
use arcana_core::model::{LayoutId, Page, Spread, SpreadId, UserId};
use arcana_core::stores::{CardCatalog, InterpretationStore, LayoutCatalog, SpreadStore, UserDirectory};
use arcana_web::{ApiError, Caller};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::{Json, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response header carrying the next scroll cursor.
pub const AFTER_HEADER: &str = "X-After";

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSpreadRequest {
    question: Option<String>,
    layout_id: LayoutId,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpreadCardResponse {
    card_id: arcana_core::model::CardId,
    card_name: String,
    position: i32,
    reversed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpreadResponse {
    id: SpreadId,
    question: Option<String>,
    author_id: UserId,
    layout_id: LayoutId,
    created_at: DateTime<Utc>,
    cards: Vec<SpreadCardResponse>,
}

impl From<Spread> for SpreadResponse {
    fn from(spread: Spread) -> Self {
        Self {
            id: spread.id,
            question: spread.question,
            author_id: spread.author_id,
            layout_id: spread.layout_id,
            created_at: spread.created_at,
            cards: spread
                .cards
                .into_iter()
                .map(|c| SpreadCardResponse {
                    card_id: c.card_id,
                    card_name: c.card_name,
                    position: c.position,
                    reversed: c.reversed,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PageResponse {
    items: Vec<SpreadResponse>,
    page: u32,
    size: u32,
    total: u64,
}

impl From<Page<Spread>> for PageResponse {
    fn from(page: Page<Spread>) -> Self {
        Self {
            items: page.items.into_iter().map(SpreadResponse::from).collect(),
            page: page.page,
            size: page.size,
            total: page.total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    page: Option<u32>,
    size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrollParams {
    after: Option<SpreadId>,
    size: Option<u32>,
}

const DEFAULT_PAGE_SIZE: u32 = 20;

pub(crate) async fn create<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Caller(ctx): Caller,
    Json(request): Json<CreateSpreadRequest>,
) -> Result<(StatusCode, Json<SpreadResponse>), ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    let spread = state
        .spreads
        .create(ctx, request.question, request.layout_id)
        .await?;
    Ok((StatusCode::CREATED, Json(spread.into())))
}

pub(crate) async fn get<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Path(id): Path<SpreadId>,
) -> Result<Json<SpreadResponse>, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    Ok(Json(state.spreads.get(id).await?.into()))
}

pub(crate) async fn list<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse>, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    let page = state
        .spreads
        .list_page(
            params.page.unwrap_or(0),
            params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page.into()))
}

/// Keyset listing. The next cursor rides in the `X-After` response header
/// and is absent when nothing older remains.
pub(crate) async fn scroll<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Query(params): Query<ScrollParams>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    let (items, next) = state.spreads.list_after(params.after, size).await?;

    let mut headers = HeaderMap::new();
    if let Some(after) = next {
        if let Ok(value) = after.to_string().parse() {
            headers.insert(HeaderName::from_static("x-after"), value);
        }
    }

    let body: Vec<SpreadResponse> = items.into_iter().map(SpreadResponse::from).collect();
    Ok((headers, Json(body)))
}

pub(crate) async fn delete<S, L, C, U, I>(
    State(state): State<AppState<S, L, C, U, I>>,
    Caller(ctx): Caller,
    Path(id): Path<SpreadId>,
) -> Result<StatusCode, ApiError>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    I: InterpretationStore,
{
    state.spreads.delete(ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
