use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct SeenRequest {
    query: HashMap<String, String>,
    authorization: Option<String>,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: Arc<String>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

async fn handle_catalog(
    State(state): State<StubState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.seen.lock().await.push(SeenRequest {
        query,
        authorization,
    });
    (state.status, state.body.as_ref().clone())
}

async fn spawn_catalog_stub(
    status: StatusCode,
    body: impl Into<String>,
) -> anyhow::Result<(String, Arc<Mutex<Vec<SeenRequest>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        status,
        body: Arc::new(body.into()),
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/catalog", get(handle_catalog))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), seen))
}

fn page_body(ids: &[i64], next_cursor: Option<serde_json::Value>, has_more: bool) -> String {
    let entries: Vec<_> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": id, "title": format!("Movie {id}") }))
        .collect();
    let mut body = serde_json::json!({ "entries": entries, "has_more": has_more });
    if let Some(next_cursor) = next_cursor {
        body["next_cursor"] = next_cursor;
    }
    body.to_string()
}

#[tokio::test]
async fn fetches_and_decodes_a_page() {
    let (server_url, seen) = spawn_catalog_stub(
        StatusCode::OK,
        page_body(&[1, 2, 3], Some(serde_json::json!(2)), true),
    )
    .await
    .expect("spawn stub");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let page = client
        .fetch_page(&PageCursor::initial())
        .await
        .expect("page");

    assert_eq!(page.entries.len(), 3);
    assert_eq!(page.entries[0].title, "Movie 1");
    assert_eq!(page.next_cursor, PageCursor::Page(2));
    assert!(page.has_more);

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].query.get("page").map(String::as_str), Some("1"));
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn sends_token_cursor_and_bearer_token() {
    let (server_url, seen) = spawn_catalog_stub(
        StatusCode::OK,
        page_body(&[4], Some(serde_json::json!("after-4")), true),
    )
    .await
    .expect("spawn stub");
    let client = RemoteCatalogClient::from_settings(&ClientSettings {
        base_url: server_url,
        api_token: Some("secret-token".into()),
        ..ClientSettings::default()
    })
    .expect("client");

    let page = client
        .fetch_page(&PageCursor::Token("after-3".into()))
        .await
        .expect("page");
    assert_eq!(page.next_cursor, PageCursor::Token("after-4".into()));

    let seen = seen.lock().await;
    assert_eq!(
        seen[0].query.get("cursor").map(String::as_str),
        Some("after-3")
    );
    assert!(!seen[0].query.contains_key("page"));
    assert_eq!(
        seen[0].authorization.as_deref(),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn server_error_uses_api_error_message() {
    let body = serde_json::to_string(&ApiError::invalid_cursor("0")).expect("json");
    let (server_url, _seen) = spawn_catalog_stub(StatusCode::BAD_REQUEST, body)
        .await
        .expect("spawn stub");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let err = client
        .fetch_page(&PageCursor::Page(0))
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        FetchError::ServerError {
            status: 400,
            message: "invalid page cursor '0'".into(),
        }
    );
}

#[tokio::test]
async fn server_error_falls_back_to_plain_body_or_reason() {
    let (server_url, _seen) = spawn_catalog_stub(StatusCode::BAD_GATEWAY, "upstream down")
        .await
        .expect("spawn stub");
    let client = RemoteCatalogClient::new(&server_url).expect("client");
    let err = client
        .fetch_page(&PageCursor::initial())
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        FetchError::ServerError {
            status: 502,
            message: "upstream down".into(),
        }
    );

    let (server_url, _seen) = spawn_catalog_stub(StatusCode::SERVICE_UNAVAILABLE, "")
        .await
        .expect("spawn stub");
    let client = RemoteCatalogClient::new(&server_url).expect("client");
    let err = client
        .fetch_page(&PageCursor::initial())
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        FetchError::ServerError {
            status: 503,
            message: "Service Unavailable".into(),
        }
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (server_url, _seen) = spawn_catalog_stub(StatusCode::OK, r#"{"entries": "nope"}"#)
        .await
        .expect("spawn stub");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let err = client
        .fetch_page(&PageCursor::initial())
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchError::Decode(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = RemoteCatalogClient::new(&format!("http://{addr}")).expect("client");
    let err = client
        .fetch_page(&PageCursor::initial())
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchError::Network(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn missing_next_cursor_advances_numeric_page() {
    let (server_url, _seen) = spawn_catalog_stub(StatusCode::OK, page_body(&[7], None, true))
        .await
        .expect("spawn stub");
    let client = RemoteCatalogClient::new(&server_url).expect("client");

    let page = client
        .fetch_page(&PageCursor::Page(3))
        .await
        .expect("page");
    assert_eq!(page.next_cursor, PageCursor::Page(4));
}

#[test]
fn token_page_with_more_but_no_next_cursor_is_rejected() {
    let response = PageResponse {
        entries: Vec::new(),
        next_cursor: None,
        has_more: true,
    };
    let err = resolve_page(&PageCursor::Token("t1".into()), response).expect_err("must fail");
    assert!(matches!(err, FetchError::Decode(_)));
}

#[test]
fn last_page_without_next_cursor_keeps_requested_cursor() {
    let response = PageResponse {
        entries: Vec::new(),
        next_cursor: None,
        has_more: false,
    };
    let page = resolve_page(&PageCursor::Token("t1".into()), response).expect("page");
    assert_eq!(page.next_cursor, PageCursor::Token("t1".into()));
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let client = RemoteCatalogClient::new("http://catalog.test/api/v1").expect("client");
    assert_eq!(
        client.endpoint().as_str(),
        "http://catalog.test/api/v1/catalog"
    );

    let client = RemoteCatalogClient::new("http://catalog.test/").expect("client");
    assert_eq!(client.endpoint().as_str(), "http://catalog.test/catalog");
}

#[test]
fn rejects_empty_or_invalid_base_url() {
    assert!(RemoteCatalogClient::new("  ").is_err());
    assert!(RemoteCatalogClient::new("not a url").is_err());
}
