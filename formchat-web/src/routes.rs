//! HTTP routes.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use formchat_application::{FormView, NextForm, SessionKey};
use formchat_core::record::FieldValues;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::cookies::{CookieTokens, visitor_id};
use crate::error::{ApiError, ApiResult};
use crate::qr;
use crate::state::AppState;

/// Optional `?key=` carrying a linking token value.
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The primary message to show
    pub response: String,
    pub messages: Vec<String>,
    pub field_updates: FieldValues,
    pub saved: bool,
    pub next_forms: Vec<NextForm>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/forms/{form}", get(form_page))
        .route("/forms/{form}/context", get(form_context))
        .route("/forms/{form}/chat", post(chat))
        .route("/forms/{form}/qr", get(form_qr))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home(State(state): State<AppState>) -> ApiResult<Html<String>> {
    Ok(Html(state.pages.home(state.service.catalog())?))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "forms": state.service.catalog().forms().len(),
        "sessions": state.service.active_sessions().await,
    }))
}

async fn form_page(
    State(state): State<AppState>,
    Path(form): Path<String>,
    Query(query): Query<KeyQuery>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Html<String>)> {
    let key = query.key.clone();
    let (jar, view) = open_view(&state, form, query, jar).await?;
    let html = state.pages.form(&view, key.as_deref())?;
    Ok((jar, Html(html)))
}

async fn form_context(
    State(state): State<AppState>,
    Path(form): Path<String>,
    Query(query): Query<KeyQuery>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<FormView>)> {
    let (jar, view) = open_view(&state, form, query, jar).await?;
    Ok((jar, Json(view)))
}

async fn chat(
    State(state): State<AppState>,
    Path(form): Path<String>,
    Query(query): Query<KeyQuery>,
    jar: CookieJar,
    Json(request): Json<ChatRequest>,
) -> ApiResult<(CookieJar, Json<ChatResponse>)> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let (jar, visitor) = visitor_id(jar);
    let key = SessionKey::new(form, visitor);
    let mut tokens = CookieTokens::new(jar, query.key);

    let reply = state.service.handle_turn(&key, message, &mut tokens).await?;
    if let Some(token) = &reply.linking_token {
        debug!(form = %key.form, token = %token.name, "Issued linking token");
    }

    Ok((
        tokens.into_jar(),
        Json(ChatResponse {
            response: reply.display_message,
            messages: reply.messages,
            field_updates: reply.field_updates,
            saved: reply.saved,
            next_forms: reply.next_forms,
        }),
    ))
}

async fn form_qr(
    State(state): State<AppState>,
    Path(form): Path<String>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let schema = state.service.catalog().get(&form)?;

    let link_base = &state.service.settings().link_base;
    let base = if link_base.is_empty() {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{host}")
    } else {
        link_base.clone()
    };

    let png = qr::png(&qr::form_url(&base, schema.name()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        png,
    ))
}

async fn open_view(
    state: &AppState,
    form: String,
    query: KeyQuery,
    jar: CookieJar,
) -> ApiResult<(CookieJar, FormView)> {
    let (jar, visitor) = visitor_id(jar);
    let key = SessionKey::new(form, visitor);
    let tokens = CookieTokens::new(jar, query.key);

    let view = state.service.open_form(&key, &tokens).await?;
    Ok((tokens.into_jar(), view))
}
