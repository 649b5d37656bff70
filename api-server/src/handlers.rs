use std::sync::Arc;

use actix_web::{
    error::{InternalError, JsonPayloadError},
    http::StatusCode,
    web::{Data, Json},
    HttpRequest, HttpResponse, Responder,
};

use crate::clock::now_rfc3339;
use crate::config::AppState;
use crate::response::{internal_error, json_error_with_code};
use crate::store::{ScoreRecord, ScoreStore};
use crate::types::{HealthResponse, SubmitScoreRequest, SubmitScoreResponse};
use crate::verifier::VerifyOutcome;

/// Returns `(error_message, error_code)` on failure.
pub(crate) fn validate_submission(req: &SubmitScoreRequest) -> Result<(), (String, &'static str)> {
    if req.nullifier_hash.trim().is_empty() {
        return Err((
            "nullifier_hash must not be empty".to_string(),
            "missing_nullifier_hash",
        ));
    }
    if req.proof.trim().is_empty() || req.merkle_root.trim().is_empty() {
        return Err((
            "proof and merkle_root must not be empty".to_string(),
            "missing_proof",
        ));
    }
    Ok(())
}

pub(crate) fn json_payload_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = json_error_with_code(
        StatusCode::BAD_REQUEST,
        format!("invalid request body: {err}"),
        Some("invalid_body"),
    );
    InternalError::from_response(err, response).into()
}

/// Runs a store operation on the blocking pool; file IO stays off the workers.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&ScoreStore) -> Result<T, String> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| format!("store task failed: {e}"))?
}

pub(crate) async fn health(state: Data<AppState>) -> impl Responder {
    let stored_scores = match with_store(&state, |store| store.count()).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!("health check failed: {e}");
            return internal_error();
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "invaders-score-gateway",
        verifier: state.verifier.name(),
        stored_scores,
        leaderboard_size: state.leaderboard_size,
    })
}

pub(crate) async fn get_leaderboard(state: Data<AppState>) -> impl Responder {
    let limit = state.leaderboard_size;
    match with_store(&state, move |store| store.leaderboard(limit)).await {
        Ok(scores) => HttpResponse::Ok().json(scores),
        Err(e) => {
            tracing::error!("leaderboard read failed: {e}");
            internal_error()
        }
    }
}

pub(crate) async fn submit_score(
    state: Data<AppState>,
    req: Json<SubmitScoreRequest>,
) -> impl Responder {
    let submission = req.into_inner();
    if let Err((msg, code)) = validate_submission(&submission) {
        return json_error_with_code(StatusCode::BAD_REQUEST, msg, Some(code));
    }

    match state.verifier.verify(&submission).await {
        Ok(VerifyOutcome::Verified) => {}
        Ok(VerifyOutcome::Rejected(reason)) => {
            tracing::warn!(
                nullifier_hash = %submission.nullifier_hash,
                score = submission.score,
                "score submission rejected: {reason}"
            );
            return json_error_with_code(
                StatusCode::BAD_REQUEST,
                "Invalid proof",
                Some("invalid_proof"),
            );
        }
        Err(e) => {
            tracing::error!(nullifier_hash = %submission.nullifier_hash, "proof verification failed: {e}");
            return internal_error();
        }
    }

    let record = ScoreRecord {
        score: submission.score,
        nullifier_hash: submission.nullifier_hash.clone(),
        verification_level: submission.verification_level.clone(),
        timestamp: now_rfc3339(),
    };

    match with_store(&state, move |store| store.submit(record)).await {
        Ok(outcome) => {
            tracing::info!(
                nullifier_hash = %submission.nullifier_hash,
                score = submission.score,
                stored_score = outcome.stored_score,
                position = outcome.position,
                updated = outcome.updated,
                "verified score recorded"
            );
            HttpResponse::Ok().json(SubmitScoreResponse {
                success: true,
                verified_score: submission.score,
                nullifier_hash: submission.nullifier_hash,
                leaderboard_position: outcome.position,
            })
        }
        Err(e) => {
            tracing::error!(nullifier_hash = %submission.nullifier_hash, "score store write failed: {e}");
            internal_error()
        }
    }
}

pub(crate) async fn method_not_allowed() -> impl Responder {
    json_error_with_code(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        Some("method_not_allowed"),
    )
}
