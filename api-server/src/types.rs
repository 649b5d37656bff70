use serde::{Deserialize, Serialize};

/// Score submission as sent by the game client: the score plus the
/// identity proof fields returned by the World ID widget.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmitScoreRequest {
    pub(crate) score: u64,
    pub(crate) nullifier_hash: String,
    pub(crate) verification_level: String,
    pub(crate) merkle_root: String,
    pub(crate) proof: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitScoreResponse {
    pub(crate) success: bool,
    pub(crate) verified_score: u64,
    pub(crate) nullifier_hash: String,
    pub(crate) leaderboard_position: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service: &'static str,
    pub(crate) verifier: &'static str,
    pub(crate) stored_scores: usize,
    pub(crate) leaderboard_size: usize,
}
