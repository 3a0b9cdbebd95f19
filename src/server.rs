//! Webhook server - decodes Alexa requests and hands them to the dispatcher

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use crate::skill::alexa::{Request, RequestEnvelope, ResponseEnvelope};
use crate::skill::dispatcher::Dispatcher;
use crate::skill::IntentName;

/// Work for the dispatcher, decoded from one request
enum Incoming {
    Launch,
    Intent(String),
}

pub fn routes(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", post(handle_request))
        .with_state(dispatcher)
}

async fn handle_request(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(envelope): Json<RequestEnvelope>,
) -> Json<ResponseEnvelope> {
    if let Some(session) = &envelope.session {
        tracing::debug!(session_id = %session.session_id, new = session.new, "Session");
    }

    let incoming = match envelope.request {
        Request::LaunchRequest { request_id } => {
            tracing::debug!(%request_id, "Launch request");
            Incoming::Launch
        }
        Request::IntentRequest { request_id, intent } => {
            tracing::debug!(%request_id, intent = %intent.name, "Intent request");
            Incoming::Intent(intent.name)
        }
        Request::SessionEndedRequest { request_id, reason } => {
            tracing::debug!(%request_id, ?reason, "Session ended");
            return Json(ResponseEnvelope::empty());
        }
        Request::Other => {
            tracing::debug!("Ignoring unsupported request type");
            return Json(ResponseEnvelope::empty());
        }
    };

    // sensor reads block, keep them off the async workers
    let worker = Arc::clone(&dispatcher);
    let result = tokio::task::spawn_blocking(move || match incoming {
        Incoming::Launch => worker.respond(IntentName::Launch),
        Incoming::Intent(name) => worker.respond_to(&name),
    })
    .await;

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Dispatch task failed: {}", e);
            dispatcher.templates().apology()
        }
    };

    Json(response.into())
}
