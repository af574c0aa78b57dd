//! HTTP routes and static assets

use std::{
    convert::Infallible,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{Method, StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{Stream, StreamExt, stream};
use serde::de::DeserializeOwned;

use crate::{
    CompletionReply, CompletionService, Conversation, ConversationStore,
    CosmosConversationStore, HistoryRequest, InMemoryConversationStore, InboundChat, RelayError,
    SaveRequest, Settings,
};

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<CompletionService>,
    pub store: Arc<dyn ConversationStore>,
    pub static_dir: PathBuf,
}

impl AppState {
    /// Cosmos-backed when configured, otherwise an in-memory store
    pub fn from_settings(settings: Arc<Settings>) -> Result<Self, RelayError> {
        let store: Arc<dyn ConversationStore> = match &settings.cosmos {
            Some(cosmos) => Arc::new(CosmosConversationStore::from_settings(cosmos)?),
            None => {
                log::warn!("Cosmos DB is not configured, conversations are kept in memory");
                Arc::new(InMemoryConversationStore::new())
            }
        };

        Ok(Self {
            completion: Arc::new(CompletionService::new(settings.clone())),
            store,
            static_dir: settings.server.static_dir.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/conversation", get(conversation).post(conversation))
        .route(
            "/selectconversationhistory",
            get(conversation_history).post(conversation_history),
        )
        .route(
            "/saveconversation",
            get(save_conversation).post(save_conversation),
        )
        .fallback(static_file)
        .with_state(state)
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, RelayError> {
    serde_json::from_slice(body).map_err(|e| RelayError::parse(format!("invalid request body: {e}")))
}

fn event_stream(frames: impl Stream<Item = String> + Send + 'static) -> Response {
    (
        [(CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(frames.map(Ok::<_, Infallible>)),
    )
        .into_response()
}

async fn conversation(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Response, RelayError> {
    if method == Method::GET && state.completion.streaming() {
        return Ok(event_stream(stream::empty::<String>()));
    }

    let inbound: InboundChat = parse_body(&body)?;
    match state.completion.complete(&inbound).await? {
        CompletionReply::Stream(frames) => Ok(event_stream(frames)),
        CompletionReply::Json(answer) => Ok(Json(answer).into_response()),
    }
}

async fn conversation_history(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, RelayError> {
    let request: HistoryRequest = parse_body(&body)?;
    let documents = state.store.history(&request.user).await?;
    Ok(Json(documents).into_response())
}

async fn save_conversation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, RelayError> {
    let request: SaveRequest = parse_body(&body)?;
    state.store.save(&Conversation::new(request)).await?;
    Ok(([(CONTENT_TYPE, "application/json")], "").into_response())
}

/// Relative file path for a request path, rejecting anything but plain names
fn asset_path(request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let relative = if relative.is_empty() {
        "index.html"
    } else {
        relative
    };

    let path = Path::new(relative);
    path.components()
        .all(|component| matches!(component, Component::Normal(_)))
        .then(|| path.to_path_buf())
}

async fn static_file(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let Some(relative) = asset_path(uri.path()) else {
        log::warn!("rejected static path {}", uri.path());
        return StatusCode::NOT_FOUND.into_response();
    };

    let path = state.static_dir.join(&relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(CONTENT_TYPE, mime.as_ref().to_string())], bytes).into_response()
        }
        Err(e) => {
            log::debug!("static file {}: {e}", path.display());
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path() {
        assert_eq!(asset_path("/"), Some(PathBuf::from("index.html")));
        assert_eq!(asset_path("/assets/app.js"), Some(PathBuf::from("assets/app.js")));
        assert_eq!(asset_path("/../secret"), None);
        assert_eq!(asset_path("/assets/../../secret"), None);
        assert_eq!(asset_path("//etc/passwd"), Some(PathBuf::from("etc/passwd")));
    }
}
