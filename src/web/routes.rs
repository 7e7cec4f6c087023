use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::AppState;
use crate::catalog::NewCatalogItem;
use crate::source::{SourceKind, SourceReference};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/upload", post(upload))
        .route("/api/search", get(search))
        .route("/api/thumbnails", post(thumbnail))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceRequest {
    title: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Kind from the type label, falling back to what the URL looks like.
fn source_for(state: &AppState, label: &str, url: &str) -> SourceReference {
    let kind = match SourceKind::from_label(label) {
        SourceKind::Unknown => SourceKind::infer(url, state.resolver.hosts()),
        kind => kind,
    };
    SourceReference::url(kind, url).with_name_prefix(label)
}

async fn health() -> &'static str {
    "ok"
}

async fn upload(
    State(state): State<AppState>,
    payload: Result<Json<SourceRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "invalid JSON body");
    };

    let (Some(title), Some(label), Some(url)) = (
        non_empty(request.title.as_ref()),
        non_empty(request.item_type.as_ref()),
        non_empty(request.source_url.as_ref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "title, type and sourceUrl are required",
        );
    };

    let source = source_for(&state, label, url);

    // A thumbnail failure never blocks item creation
    let thumbnail_url = match state.resolver.get_or_create_thumbnail_for_source(&source).await {
        Ok(result) => Some(result.reference),
        Err(e) => {
            error!(url = %url, error = %e, "Thumbnail resolution failed");
            None
        }
    };

    let new_item = NewCatalogItem {
        title: title.to_string(),
        item_type: label.to_string(),
        source_url: url.to_string(),
        thumbnail_url,
    };

    match state.catalog.append(new_item).await {
        Ok(item) => {
            info!(id = %item.id, kind = %source.kind, "Catalog item created");
            Json(json!({ "ok": true, "item": item })).into_response()
        }
        Err(e) => {
            error!("Failed to append catalog item: {e:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to save item")
        }
    }
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let items = state
        .catalog
        .search(params.q.as_deref().unwrap_or_default())
        .await;
    Json(json!({ "items": items })).into_response()
}

async fn thumbnail(
    State(state): State<AppState>,
    payload: Result<Json<SourceRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "invalid JSON body");
    };

    let Some(url) = non_empty(request.source_url.as_ref()) else {
        return error_response(StatusCode::BAD_REQUEST, "sourceUrl is required");
    };
    let label = non_empty(request.item_type.as_ref()).unwrap_or_default();

    let source = source_for(&state, label, url);

    match state.resolver.resolve(&source).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!(url = %url, error = %e, "Thumbnail resolution failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "thumbnail unavailable")
        }
    }
}
