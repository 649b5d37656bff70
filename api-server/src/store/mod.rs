
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

/// One verified leaderboard entry, keyed by the identity nullifier hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub score: u64,
    pub nullifier_hash: String,
    pub verification_level: String,
    pub timestamp: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoreDocument {
    #[serde(rename = "verifiedScores", default)]
    verified_scores: Vec<ScoreRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// 1-based rank after sorting descending by score.
    pub position: usize,
    /// Score held for the nullifier once the submission is applied.
    pub stored_score: u64,
    pub updated: bool,
}

/// Flat-file JSON score store.
///
/// The whole document is read, modified and rewritten under one lock, so
/// concurrent submissions never interleave their read-modify-write cycles.
/// A missing or unparsable document reads as an empty leaderboard.
pub struct ScoreStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScoreStore {
    /// Open the score file, creating it (and its parent directory) with an
    /// empty document when it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, String> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create score dir {}: {e}", parent.display()))?;
        }

        let store = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };

        if !path.exists() {
            store.write_document(&ScoreDocument::default())?;
            tracing::info!(path = %path.display(), "initialized empty score file");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Top `limit` records, highest score first. Ties keep insertion order.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<ScoreRecord>, String> {
        let _guard = self.lock.lock().map_err(|_| "score store lock poisoned")?;
        let mut scores = self.read_document().verified_scores;
        sort_descending(&mut scores);
        scores.truncate(limit);
        Ok(scores)
    }

    pub fn count(&self) -> Result<usize, String> {
        let _guard = self.lock.lock().map_err(|_| "score store lock poisoned")?;
        Ok(self.read_document().verified_scores.len())
    }

    /// Upsert a verified score.
    ///
    /// An existing record for the same nullifier is only overwritten when the
    /// new score is strictly higher; its score and timestamp are then
    /// refreshed and the verification level is left as first recorded.
    pub fn submit(&self, entry: ScoreRecord) -> Result<SubmitOutcome, String> {
        let _guard = self.lock.lock().map_err(|_| "score store lock poisoned")?;
        let mut document = self.read_document();
        let nullifier_hash = entry.nullifier_hash.clone();

        let updated = match document
            .verified_scores
            .iter_mut()
            .find(|record| record.nullifier_hash == nullifier_hash)
        {
            Some(existing) if entry.score > existing.score => {
                existing.score = entry.score;
                existing.timestamp = entry.timestamp;
                true
            }
            Some(_) => false,
            None => {
                document.verified_scores.push(entry);
                true
            }
        };

        if updated {
            self.write_document(&document)?;
        }

        sort_descending(&mut document.verified_scores);
        let (index, record) = document
            .verified_scores
            .iter()
            .enumerate()
            .find(|(_, record)| record.nullifier_hash == nullifier_hash)
            .ok_or_else(|| format!("record for {nullifier_hash} missing after upsert"))?;

        Ok(SubmitOutcome {
            position: index + 1,
            stored_score: record.score,
            updated,
        })
    }

    fn read_document(&self) -> ScoreDocument {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "score file unreadable, using empty list: {e}");
                return ScoreDocument::default();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "score file corrupt, using empty list: {e}");
            ScoreDocument::default()
        })
    }

    fn write_document(&self, document: &ScoreDocument) -> Result<(), String> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| format!("failed to serialize scores: {e}"))?;
        fs::write(&self.path, json)
            .map_err(|e| format!("failed to write {}: {e}", self.path.display()))
    }
}

fn sort_descending(scores: &mut [ScoreRecord]) {
    scores.sort_by(|a, b| b.score.cmp(&a.score));
}
