use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::SubmitScoreRequest;

/// keccak256 of the empty signal, shifted right 8 bits, as World ID expects
/// when no signal is bound to the proof.
pub(crate) const EMPTY_SIGNAL_HASH: &str =
    "0x00c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VerifyOutcome {
    Verified,
    Rejected(String),
}

#[derive(Debug, Clone)]
pub(crate) struct CloudVerifier {
    pub(crate) api_base: String,
    pub(crate) app_id: String,
    pub(crate) action: String,
    pub(crate) timeout: Duration,
}

#[derive(Debug, Clone)]
pub(crate) enum ProofVerifier {
    /// Checks proofs against the World ID developer portal.
    Cloud(CloudVerifier),
    /// Accepts every proof. Local development only.
    DevAccept,
    #[cfg(test)]
    Reject(&'static str),
}

#[derive(Debug, Serialize)]
struct CloudVerifyRequest<'a> {
    nullifier_hash: &'a str,
    merkle_root: &'a str,
    proof: &'a str,
    verification_level: &'a str,
    action: &'a str,
    signal_hash: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct CloudVerifyError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// awc builds its rustls client config from the process-wide provider.
pub(crate) fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::trace!("rustls crypto provider already installed");
    }
}

impl ProofVerifier {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Cloud(_) => "world_id_cloud",
            Self::DevAccept => "dev_accept",
            #[cfg(test)]
            Self::Reject(_) => "reject",
        }
    }

    /// `Ok(Rejected)` means the proof was checked and refused; `Err` means the
    /// check itself could not be completed.
    pub(crate) async fn verify(
        &self,
        submission: &SubmitScoreRequest,
    ) -> Result<VerifyOutcome, String> {
        match self {
            Self::Cloud(cloud) => cloud.verify(submission).await,
            Self::DevAccept => {
                tracing::warn!(
                    nullifier_hash = %submission.nullifier_hash,
                    "VERIFY_DEV_MODE enabled: accepting proof without verification"
                );
                Ok(VerifyOutcome::Verified)
            }
            #[cfg(test)]
            Self::Reject(reason) => Ok(VerifyOutcome::Rejected(reason.to_string())),
        }
    }
}

impl CloudVerifier {
    pub(crate) fn endpoint(&self) -> String {
        format!(
            "{}/api/v2/verify/{}",
            self.api_base.trim_end_matches('/'),
            self.app_id
        )
    }

    async fn verify(&self, submission: &SubmitScoreRequest) -> Result<VerifyOutcome, String> {
        let body = CloudVerifyRequest {
            nullifier_hash: &submission.nullifier_hash,
            merkle_root: &submission.merkle_root,
            proof: &submission.proof,
            verification_level: &submission.verification_level,
            action: &self.action,
            signal_hash: EMPTY_SIGNAL_HASH,
        };

        install_crypto_provider();
        let client = awc::Client::builder().timeout(self.timeout).finish();
        let mut response = client
            .post(self.endpoint())
            .send_json(&body)
            .await
            .map_err(|err| format!("identity verification request failed: {err}"))?;

        let status = response.status();
        if status.is_success() {
            return Ok(VerifyOutcome::Verified);
        }
        if status.is_server_error() {
            return Err(format!("identity verification service returned {status}"));
        }

        let error = response
            .json::<CloudVerifyError>()
            .await
            .unwrap_or_default();
        let reason = match (error.code, error.detail) {
            (Some(code), Some(detail)) => format!("{code}: {detail}"),
            (None, Some(detail)) => detail,
            (Some(code), None) => code,
            (None, None) => format!("verification rejected with status {status}"),
        };
        Ok(VerifyOutcome::Rejected(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(api_base: &str) -> CloudVerifier {
        CloudVerifier {
            api_base: api_base.to_string(),
            app_id: "app_test".to_string(),
            action: "submit_high_score".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    fn submission() -> SubmitScoreRequest {
        SubmitScoreRequest {
            score: 1_200,
            nullifier_hash: "0xabc".to_string(),
            verification_level: "orb".to_string(),
            merkle_root: "0xroot".to_string(),
            proof: "0xproof".to_string(),
        }
    }

    #[test]
    fn endpoint_joins_base_and_app_id() {
        assert_eq!(
            cloud("https://developer.worldcoin.org/").endpoint(),
            "https://developer.worldcoin.org/api/v2/verify/app_test"
        );
    }

    #[test]
    fn request_body_carries_action_and_empty_signal() {
        let submission = submission();
        let body = serde_json::to_value(CloudVerifyRequest {
            nullifier_hash: &submission.nullifier_hash,
            merkle_root: &submission.merkle_root,
            proof: &submission.proof,
            verification_level: &submission.verification_level,
            action: "submit_high_score",
            signal_hash: EMPTY_SIGNAL_HASH,
        })
        .unwrap();

        assert_eq!(body["action"], "submit_high_score");
        assert_eq!(body["signal_hash"], EMPTY_SIGNAL_HASH);
        assert_eq!(body["nullifier_hash"], "0xabc");
        assert!(body.get("score").is_none());
    }

    #[actix_web::test]
    async fn dev_accept_verifies_everything() {
        let outcome = ProofVerifier::DevAccept.verify(&submission()).await;
        assert_eq!(outcome, Ok(VerifyOutcome::Verified));
    }

    #[actix_web::test]
    async fn unreachable_service_is_an_error_not_a_rejection() {
        // Port 9 (discard) on loopback is not expected to accept connections.
        let verifier = ProofVerifier::Cloud(cloud("http://127.0.0.1:9"));
        assert!(verifier.verify(&submission()).await.is_err());
    }
}
