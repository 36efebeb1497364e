use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{PageResponse, CATALOG_ROUTE, FIRST_PAGE},
};
use tracing::{debug, info, warn};

mod catalog;
mod config;

use catalog::Catalog;
use config::load_settings;

struct AppState {
    catalog: Catalog,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogQuery {
    page: Option<String>,
    cursor: Option<String>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let catalog = match &settings.catalog_file {
        Some(path) => Catalog::from_file(path, settings.page_size)?,
        None => Catalog::seeded(settings.seed_entries, settings.page_size),
    };
    if catalog.is_empty() {
        warn!("catalog has no entries; every page will be empty");
    }
    info!(
        entries = catalog.len(),
        pages = catalog.total_pages(),
        page_size = settings.page_size,
        "catalog ready"
    );

    let app = build_router(Arc::new(AppState {
        catalog,
        api_token: settings.api_token,
    }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "catalog server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(CATALOG_ROUTE, get(list_catalog_page))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_catalog_page(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CatalogQuery>,
    headers: HeaderMap,
) -> ApiResult<PageResponse> {
    authorize(state.api_token.as_deref(), &headers)?;

    let page = parse_page(q.page.as_deref().or(q.cursor.as_deref()))?;
    let response = state
        .catalog
        .page(page)
        .map_err(|exception| api_error(exception.into()))?;
    debug!(
        page,
        returned = response.entries.len(),
        has_more = response.has_more,
        "served catalog page"
    );
    Ok(Json(response))
}

fn authorize(
    expected: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ApiError>)> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if presented == Some(expected) {
        return Ok(());
    }

    warn!("rejected catalog request with missing or invalid bearer token");
    Err(api_error(ApiError::new(
        ErrorCode::Unauthorized,
        "missing or invalid bearer token",
    )))
}

fn parse_page(raw: Option<&str>) -> Result<u32, (StatusCode, Json<ApiError>)> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(FIRST_PAGE);
    };
    raw.parse::<u32>()
        .ok()
        .filter(|page| *page >= FIRST_PAGE)
        .ok_or_else(|| api_error(ApiError::invalid_cursor(raw)))
}

fn api_error(error: ApiError) -> (StatusCode, Json<ApiError>) {
    let status =
        StatusCode::from_u16(error.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
