//! HTTP surface of the spreads service.

mod internal;
mod interpretations;
mod spreads;

pub use spreads::AFTER_HEADER;

use crate::state::AppState;
use arcana_core::stores::{
    CardCatalog, InterpretationStore, LayoutCatalog, SpreadStore, UserDirectory,
};
use axum::Router;
use axum::routing::{delete, get, post, put};

/// Build the spreads router.
pub fn router<S, L, C, U, I>(state: AppState<S, L, C, U, I>) -> Router
where
    S: SpreadStore + 'static,
    L: LayoutCatalog + 'static,
    C: CardCatalog + 'static,
    U: UserDirectory + 'static,
    I: InterpretationStore + 'static,
{
    Router::new()
        .route(
            "/spreads",
            post(spreads::create::<S, L, C, U, I>).get(spreads::list::<S, L, C, U, I>),
        )
        .route("/spreads/scroll", get(spreads::scroll::<S, L, C, U, I>))
        .route(
            "/spreads/:id",
            get(spreads::get::<S, L, C, U, I>).delete(spreads::delete::<S, L, C, U, I>),
        )
        .route(
            "/spreads/:id/interpretations",
            post(interpretations::add::<S, L, C, U, I>),
        )
        .route(
            "/spreads/:id/interpretations/:iid",
            put(interpretations::update::<S, L, C, U, I>)
                .delete(interpretations::delete::<S, L, C, U, I>),
        )
        .route(
            "/internal/spreads/:id/owner",
            get(internal::owner::<S, L, C, U, I>),
        )
        .route(
            "/internal/users/:id/data",
            delete(internal::purge_user_data::<S, L, C, U, I>),
        )
        .route("/health", get(internal::health))
        .route("/ready", get(internal::ready::<S, L, C, U, I>))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::mocks::{InMemoryStore, StaticCatalog, StaticDirectory};
    use crate::service::{InterpretationService, SpreadService};
    use arcana_core::model::{LayoutId, UserId};
    use arcana_web::USER_ID_HEADER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    type TestState =
        AppState<InMemoryStore, StaticCatalog, StaticCatalog, StaticDirectory, InMemoryStore>;

    fn fixture() -> (Router, StaticDirectory, LayoutId) {
        let store = InMemoryStore::default();
        let mut catalog = StaticCatalog::with_deck(78);
        let layout_id = catalog.add_layout("three-card", 3);
        let directory = StaticDirectory::default();

        let state: TestState = AppState {
            spreads: Arc::new(SpreadService::new(
                store.clone(),
                catalog.clone(),
                catalog,
                directory.clone(),
            )),
            interpretations: Arc::new(InterpretationService::new(
                store.clone(),
                store,
                directory.clone(),
            )),
        };
        (router(state), directory, layout_id)
    }

    fn post_json(uri: &str, user: UserId, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(USER_ID_HEADER, user.to_string())
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_spread(app: &Router, user: UserId, layout_id: LayoutId) -> Value {
        let response = app
            .clone()
            .oneshot(post_json(
                "/spreads",
                user,
                &json!({ "layout_id": layout_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[tokio::test]
    async fn create_requires_a_caller_identity() {
        let (app, _, layout_id) = fixture();
        let request = Request::builder()
            .method("POST")
            .uri("/spreads")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "layout_id": layout_id }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_returns_the_spread_with_cards() {
        let (app, directory, layout_id) = fixture();
        let user = UserId::new();
        directory.add(user);

        let body = create_spread(&app, user, layout_id).await;
        assert_eq!(body["cards"].as_array().unwrap().len(), 3);
        assert_eq!(body["author_id"], json!(user));
    }

    #[tokio::test]
    async fn duplicate_interpretation_is_a_conflict_on_the_wire() {
        let (app, directory, layout_id) = fixture();
        let user = UserId::new();
        directory.add(user);
        let spread = create_spread(&app, user, layout_id).await;
        let uri = format!("/spreads/{}/interpretations", spread["id"].as_str().unwrap());

        let first = app
            .clone()
            .oneshot(post_json(&uri, user, &json!({ "body": "change" })))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .clone()
            .oneshot(post_json(&uri, user, &json!({ "body": "again" })))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body = body_json(second).await;
        assert_eq!(body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn stranger_deleting_a_spread_is_forbidden() {
        let (app, directory, layout_id) = fixture();
        let author = UserId::new();
        directory.add(author);
        let spread = create_spread(&app, author, layout_id).await;

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/spreads/{}", spread["id"].as_str().unwrap()))
            .header(USER_ID_HEADER, UserId::new().to_string())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn scroll_pages_carry_the_cursor_until_exhausted() {
        let (app, directory, layout_id) = fixture();
        let user = UserId::new();
        directory.add(user);
        let mut created: Vec<String> = Vec::new();
        for _ in 0..5 {
            let body = create_spread(&app, user, layout_id).await;
            created.push(body["id"].as_str().unwrap().to_string());
        }

        let mut seen: Vec<String> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let uri = match &cursor {
                None => "/spreads/scroll?size=2".to_string(),
                Some(after) => format!("/spreads/scroll?size=2&after={after}"),
            };
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let next = response
                .headers()
                .get(AFTER_HEADER)
                .map(|v| v.to_str().unwrap().to_string());
            let page = body_json(response).await;
            for item in page.as_array().unwrap() {
                seen.push(item["id"].as_str().unwrap().to_string());
            }
            match next {
                Some(after) => cursor = Some(after),
                None => break,
            }
        }

        created.sort();
        seen.sort();
        seen.dedup();
        assert_eq!(seen, created, "every spread exactly once");
    }

    #[tokio::test]
    async fn scroll_header_is_absent_on_the_full_last_page() {
        let (app, directory, layout_id) = fixture();
        let user = UserId::new();
        directory.add(user);
        for _ in 0..4 {
            create_spread(&app, user, layout_id).await;
        }

        let first = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/spreads/scroll?size=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let cursor = first
            .headers()
            .get(AFTER_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let last = app
            .oneshot(
                Request::builder()
                    .uri(format!("/spreads/scroll?size=2&after={cursor}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(last.status(), StatusCode::OK);
        assert!(last.headers().get(AFTER_HEADER).is_none());
        assert_eq!(body_json(last).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_scroll_anchor_is_not_found() {
        let (app, _, _) = fixture();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/spreads/scroll?after={}", UserId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_purge_is_idempotent_on_the_wire() {
        let (app, directory, layout_id) = fixture();
        let user = UserId::new();
        directory.add(user);
        create_spread(&app, user, layout_id).await;

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("DELETE")
                        .uri(format!("/internal/users/{user}/data"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/spreads?page=0&size=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn owner_endpoint_resolves_the_author() {
        let (app, directory, layout_id) = fixture();
        let user = UserId::new();
        directory.add(user);
        let spread = create_spread(&app, user, layout_id).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/internal/spreads/{}/owner",
                        spread["id"].as_str().unwrap()
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["author_id"], json!(user));
    }
}
