//! HTTP handlers for the query surface

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::config::BROAD_RECALL;
use crate::error::{Error, Result};
use crate::generation::build_messages;
use crate::retrieval::funnel;
use crate::types::{AskRequest, AskResponse, EmbedRequest, EmbedResponse};

use super::state::AppState;

/// POST /ask - answer a question with citations
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(Error::InvalidRequest("question is required".to_string()));
    }

    tracing::info!(question = %question, "query received");

    let embedder = state.embedder().await?;
    let query_vector = embedder.lock().await.embed_one(&question)?;

    let candidates = state.store().search(&query_vector, BROAD_RECALL).await?;
    if candidates.is_empty() {
        let messages = build_messages(&question, &[]);
        let answer = state.llm().complete(&messages, &state.model_params()).await?;
        tracing::info!("no candidates, answered ungrounded");
        return Ok(Json(AskResponse::ungrounded(answer)));
    }

    let context = funnel::select_context(&question, candidates);
    let citations = funnel::citations(&context);

    let messages = build_messages(&question, &context);
    let answer = state.llm().complete(&messages, &state.model_params()).await?;

    tracing::info!(
        context = context.len(),
        citations = citations.len(),
        "answered from retrieval"
    );

    Ok(Json(AskResponse::grounded(answer, citations, context)))
}

/// POST /debug/embed - embed arbitrary text
pub async fn debug_embed(
    State(state): State<AppState>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(Error::InvalidRequest("text is required".to_string()));
    }

    let embedder = state.embedder().await?;
    let vector = embedder.lock().await.embed_one(text)?;

    Ok(Json(EmbedResponse {
        dim: vector.len(),
        vector,
    }))
}

/// GET /healthz - liveness probe
pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}
