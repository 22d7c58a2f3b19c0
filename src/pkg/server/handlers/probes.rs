use axum::{Json, extract::State};
use serde_json::{Value, json};
use sqlx::query_scalar;

use crate::{conf::settings, pkg::server::state::AppState, prelude::Result};

pub async fn livez() -> Result<()> {
    tracing::debug!("service is live");
    Ok(())
}

/// Ready once Postgres answers; storage and the AI gateway are checked lazily per call.
pub async fn healthz(State(state): State<AppState>) -> Result<Json<Value>> {
    let one: i32 = query_scalar("select 1").fetch_one(&*state.db_pool).await?;
    tracing::debug!("service is healthy");
    Ok(Json(json!({
        "service": &settings.service_name,
        "database": one == 1,
    })))
}
