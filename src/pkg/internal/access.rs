use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use uuid::Uuid;

use crate::{
    pkg::internal::{adaptors::applications::spec::ApplicationEntry, store::BcqStore},
    prelude::{AppError, Result},
};

pub const TOKEN_LENGTH: usize = 32;

pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn tokens_match(stored: &str, provided: &str) -> bool {
    stored.len() == provided.len()
        && stored
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Anonymous candidate entry point for the BCQ session.
pub fn session_url(base_url: &str, job_id: Uuid, application_id: Uuid, token: &str) -> String {
    format!(
        "{}/business-case/{}?applicationId={}&token={}",
        base_url.trim_end_matches('/'),
        job_id,
        application_id,
        token
    )
}

/// Checks the bearer token of an anonymous session. A missing application, a
/// missing token and a wrong token are indistinguishable to the caller. The first
/// successful check starts the response-time clock.
pub async fn validate(
    store: &dyn BcqStore,
    application_id: Uuid,
    token: &str,
) -> Result<ApplicationEntry> {
    let Some(mut application) = store.application(application_id).await? else {
        tracing::warn!("bcq access denied, unknown application");
        return Err(AppError::InvalidAccess);
    };
    let accepted = application
        .bcq_access_token
        .as_deref()
        .is_some_and(|stored| tokens_match(stored, token));
    if !accepted {
        tracing::warn!("bcq access denied, token mismatch");
        return Err(AppError::InvalidAccess);
    }
    if application.bcq_link_opened_at.is_none() {
        let now = Utc::now();
        if store.mark_link_opened(application_id, now).await? {
            tracing::info!("bcq link opened for application {}", application_id);
            application.bcq_link_opened_at = Some(now);
        }
    }
    Ok(application)
}
