use axum::{Json, extract::State};

use crate::{
    pkg::{
        internal::ai::{
            analyze::AnalysisRequest,
            spec::Scorecards,
            transcribe::{TranscriptionRequest, TranscriptionResponse},
        },
        server::state::AppState,
    },
    prelude::Result,
};

pub async fn transcribe(
    State(state): State<AppState>,
    Json(request): Json<TranscriptionRequest>,
) -> Result<Json<TranscriptionResponse>> {
    Ok(Json(state.bcq.transcriber().run(&request).await?))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<Scorecards>> {
    Ok(Json(state.bcq.analyzer().run(&request).await?))
}
