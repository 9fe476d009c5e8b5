use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::Html,
};
use catalog::{SiteData, filter};
use favicon::Resolution;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    auth::{bearer, issue, now_ms, password_matches, verify},
    error::AppError,
    page::render_page,
    state::AppState,
};

type Shared = State<Arc<AppState>>;

#[derive(Deserialize)]
pub struct Search {
    q: Option<String>,
}

impl Search {
    fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("").trim()
    }
}

#[derive(Deserialize)]
pub struct Login {
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconQuery {
    url: Option<String>,
    icon_url: Option<String>,
    icon: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IconResponse {
    Icon {
        url: String,
        source: String,
        failures: usize,
    },
    Glyph {
        glyph: String,
        failures: usize,
    },
}

impl From<Resolution> for IconResponse {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Icon { candidate, failures } => IconResponse::Icon {
                url: candidate.url,
                source: candidate.source.to_string(),
                failures,
            },
            Resolution::Glyph { glyph, failures } => IconResponse::Glyph { glyph, failures },
        }
    }
}

pub async fn sites_handler(
    State(state): Shared,
    Query(search): Query<Search>,
) -> Result<Json<SiteData>, AppError> {
    let data = state.load_sites().await?;

    Ok(Json(filter(&data, search.query())))
}

pub async fn update_sites_handler(
    State(state): Shared,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let authorized = bearer(&headers).is_some_and(|token| {
        verify(
            token,
            &state.config.admin_password,
            now_ms(),
            state.config.token_ttl,
        )
    });

    if !authorized {
        return Err(AppError::Unauthorized);
    }

    let data: SiteData = serde_json::from_slice(&body).map_err(|_| AppError::MalformedPayload)?;
    let stored = state.store_sites(data).await?;

    info!(
        "Catalog replaced: {} categories, {} sites",
        stored.categories.len(),
        stored.sites().count()
    );

    Ok(Json(json!({ "success": true, "message": "saved" })))
}

pub async fn auth_handler(State(state): Shared, body: Bytes) -> Result<Json<Value>, AppError> {
    let login: Login = serde_json::from_slice(&body).map_err(|_| AppError::MalformedPayload)?;

    if !password_matches(&login.password, &state.config.admin_password) {
        return Err(AppError::WrongPassword);
    }

    Ok(Json(json!({
        "success": true,
        "token": issue(&state.config.admin_password, now_ms()),
        "expiresIn": state.config.token_ttl.as_secs(),
    })))
}

pub async fn icon_handler(
    State(state): Shared,
    Query(query): Query<IconQuery>,
) -> Result<Json<IconResponse>, AppError> {
    let url = query.url.ok_or(AppError::MissingParameter("url"))?;
    let classification = state.classifier.classify().await;

    let resolution = state
        .resolver
        .resolve_site(
            &url,
            query.icon_url.as_deref(),
            query.icon.as_deref().unwrap_or_default(),
            classification,
        )
        .await;

    Ok(Json(resolution.into()))
}

pub async fn network_handler(State(state): Shared) -> Json<Value> {
    let classification = state.classifier.classify().await;

    Json(json!({ "classification": classification }))
}

pub async fn page_handler(
    State(state): Shared,
    Query(search): Query<Search>,
) -> Result<Html<String>, AppError> {
    let classification = state.classifier.classify().await;
    let data = filter(&state.load_sites().await?, search.query());

    render_page(
        &data,
        search.query(),
        classification,
        state.config.icon_timeout,
    )
    .map(Html)
}

pub async fn not_found_handler() -> AppError {
    AppError::NotFound
}
