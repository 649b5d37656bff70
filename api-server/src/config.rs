use std::{env, path::PathBuf, sync::Arc, time::Duration};

use crate::store::ScoreStore;
use crate::verifier::{CloudVerifier, ProofVerifier};

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub(crate) const DEFAULT_SCORES_FILE: &str = "data/scores.json";
// Serverless deployments only have a writable /tmp.
pub(crate) const SERVERLESS_SCORES_FILE: &str = "/tmp/scores.json";
pub(crate) const DEFAULT_ALLOWED_ORIGINS: &str =
    "https://worldcoin-miniapp.vercel.app,http://localhost:5173";
pub(crate) const DEFAULT_WORLD_ID_APP_ID: &str = "app_0b25c0e41ad700c4716ff0054420c269";
pub(crate) const DEFAULT_WORLD_ID_ACTION: &str = "submit_high_score";
pub(crate) const DEFAULT_WORLD_ID_API_BASE: &str = "https://developer.worldcoin.org";
pub(crate) const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_LEADERBOARD_SIZE: usize = 10;
pub(crate) const DEFAULT_JSON_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) bind_addr: String,
    pub(crate) scores_file: PathBuf,
    pub(crate) allowed_origins: Vec<String>,
    pub(crate) verifier: ProofVerifier,
    pub(crate) leaderboard_size: usize,
    pub(crate) json_limit: usize,
}

impl ServerConfig {
    pub(crate) fn from_env() -> Self {
        let verifier = if read_env_bool("VERIFY_DEV_MODE", false) {
            tracing::warn!("VERIFY_DEV_MODE=1: identity proofs will NOT be verified");
            ProofVerifier::DevAccept
        } else {
            ProofVerifier::Cloud(CloudVerifier {
                api_base: read_env_string("WORLD_ID_API_BASE", DEFAULT_WORLD_ID_API_BASE),
                app_id: read_env_string("WORLD_ID_APP_ID", DEFAULT_WORLD_ID_APP_ID),
                action: read_env_string("WORLD_ID_ACTION", DEFAULT_WORLD_ID_ACTION),
                timeout: Duration::from_secs(read_env_u64(
                    "VERIFY_TIMEOUT_SECS",
                    DEFAULT_VERIFY_TIMEOUT_SECS,
                )),
            })
        };

        let allowed_origins =
            parse_origin_list(&read_env_string("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS));
        if allowed_origins.is_empty() {
            tracing::warn!("ALLOWED_ORIGINS is empty: browsers will be refused by CORS");
        } else if allows_any_origin(&allowed_origins) {
            tracing::warn!("ALLOWED_ORIGINS contains '*': any origin allowed, credentials disabled");
        }

        Self {
            bind_addr: read_env_string("API_BIND_ADDR", DEFAULT_BIND_ADDR),
            scores_file: scores_file_from_env(),
            allowed_origins,
            verifier,
            leaderboard_size: read_env_usize("LEADERBOARD_SIZE", DEFAULT_LEADERBOARD_SIZE),
            json_limit: read_env_usize("JSON_LIMIT_BYTES", DEFAULT_JSON_LIMIT_BYTES),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<ScoreStore>,
    pub(crate) verifier: Arc<ProofVerifier>,
    pub(crate) leaderboard_size: usize,
}

/// `SCORES_FILE` wins; otherwise a `VERCEL` deployment stores under /tmp.
pub(crate) fn scores_file_from_env() -> PathBuf {
    if let Ok(path) = env::var("SCORES_FILE") {
        if !path.trim().is_empty() {
            return PathBuf::from(path.trim());
        }
    }
    if env::var_os("VERCEL").is_some() {
        PathBuf::from(SERVERLESS_SCORES_FILE)
    } else {
        PathBuf::from(DEFAULT_SCORES_FILE)
    }
}

pub(crate) fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn allows_any_origin(origins: &[String]) -> bool {
    origins.iter().any(|origin| origin == "*")
}

pub(crate) fn read_env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}
