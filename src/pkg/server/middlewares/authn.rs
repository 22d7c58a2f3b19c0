use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    pkg::server::state::AppState,
    prelude::{AppError, Result},
};

pub fn key_matches(expected: &str, presented: &str) -> bool {
    !expected.is_empty()
        && expected.len() == presented.len()
        && expected
            .bytes()
            .zip(presented.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Recruiter routes take the service key as a bearer token.
pub async fn authenticate(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    let presented = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string());
    match presented {
        Some(token) if key_matches(&state.recruiter_key, &token) => Ok(next.run(request).await),
        _ => {
            tracing::warn!("recruiter key missing or wrong, authentication denied");
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_never_matches() {
        assert!(!key_matches("", ""));
        assert!(key_matches("k3y", "k3y"));
        assert!(!key_matches("k3y", "k3z"));
        assert!(!key_matches("k3y", "k3y "));
    }
}
