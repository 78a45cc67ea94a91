use std::convert::Infallible;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::prompts::PromptRegistry;
use crate::rpc::{self, JsonRpcRequest};
use crate::server::McpServer;
use crate::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
    pub prompts: Arc<PromptRegistry>,
    pub sessions: Arc<SessionRegistry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sse", get(open_session))
        .route("/messages", post(post_message))
        .with_state(state)
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!(host, port, "HTTP transport listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Frees the session slot when the SSE stream is dropped, whether the client
/// disconnected or the server shut the stream down.
struct SessionGuard {
    sessions: Arc<SessionRegistry>,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.close(&self.id);
    }
}

async fn open_session(State(state): State<AppState>) -> Response {
    let (id, rx) = match state.sessions.open() {
        Ok(opened) => opened,
        Err(e) => return (StatusCode::CONFLICT, e.to_string()).into_response(),
    };

    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id: id.clone(),
    };

    // First frame tells the client where to post requests for this session,
    // then each dispatched response arrives as a `message` event.
    let endpoint = format!("event: endpoint\ndata: /messages?sessionId={id}\n\n");
    let frames = futures::stream::once(async move { endpoint })
        .chain(ReceiverStream::new(rx).map(move |frame| {
            let _keep_alive = &guard;
            format!("event: message\ndata: {frame}\n\n")
        }))
        .map(|frame| Ok::<Bytes, Infallible>(Bytes::from(frame)));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(frames)).into_response()
}

#[derive(Debug, serde::Deserialize)]
struct PostParams {
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn post_message(
    State(state): State<AppState>,
    Query(params): Query<PostParams>,
    body: String,
) -> Response {
    let sender = match state.sessions.sender(&params.session_id) {
        Ok(sender) => sender,
        Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    };

    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("Parse error: {e}")).into_response();
        }
    };

    let server = state.server.clone();
    let prompts = state.prompts.clone();
    tokio::spawn(async move {
        if let Some(response) = rpc::dispatch(&server, &prompts, request).await {
            match serde_json::to_string(&response) {
                Ok(frame) => {
                    if sender.send(frame).await.is_err() {
                        tracing::warn!("session stream closed before response delivery");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to serialize response frame"),
            }
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
