//! Best-score and play statistics storage.
//!
//! Records are kept per game identifier and saved as one JSON object:
//!
//! ```json
//! { "color-blocks": { "highScore": 2974, "playCount": 12, "lastPlayed": 1760000000 } }
//! ```
//!
//! `lastPlayed` is in unix seconds and absent for games never played.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Receives session events that outlive a single game.
pub trait ScoreReporter {
    /// Called when a new game starts.
    fn record_play(&mut self, game_id: &str);

    /// Offers a score; implementations keep it only if it beats the best.
    fn report_score(&mut self, game_id: &str, score: u32);

    /// Best score known for `game_id`.
    fn best_score(&self, _game_id: &str) -> u32 {
        0
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ScoreReporter for NullReporter {
    fn record_play(&mut self, _game_id: &str) {}

    fn report_score(&mut self, _game_id: &str, _score: u32) {}
}

/// Stored statistics for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub high_score: u32,
    pub play_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<u64>,
}

/// Key-value store of [`GameRecord`]s backed by a JSON file.
#[derive(Debug, Default)]
pub struct ScoreStore {
    path: Option<PathBuf>,
    records: FxHashMap<String, GameRecord>,
}

impl ScoreStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let records: FxHashMap<String, GameRecord> = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => FxHashMap::default(),
            Err(err) => return Err(err),
        };
        debug!(path = %path.display(), games = records.len(), "opened score store");
        Ok(Self {
            path: Some(path),
            records,
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes all records to the backing file, if any.
    pub fn save(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)
    }

    pub fn record(&self, game_id: &str) -> Option<&GameRecord> {
        self.records.get(game_id)
    }

    /// Raises the high score if `score` beats it. Returns true when it did.
    pub fn update_score(&mut self, game_id: &str, score: u32, now: u64) -> bool {
        let record = self.records.entry(game_id.to_owned()).or_default();
        if score > record.high_score {
            record.high_score = score;
            record.last_played = Some(now);
            true
        } else {
            false
        }
    }

    pub fn increment_play_count(&mut self, game_id: &str, now: u64) {
        let record = self.records.entry(game_id.to_owned()).or_default();
        record.play_count += 1;
        record.last_played = Some(now);
    }

    /// Zeroes the statistics of `game_id`. Returns false if it had none.
    pub fn reset(&mut self, game_id: &str) -> bool {
        match self.records.get_mut(game_id) {
            Some(record) => {
                *record = GameRecord::default();
                true
            }
            None => false,
        }
    }

    /// Played games, most recently played first.
    pub fn recent(&self) -> Vec<(&str, &GameRecord)> {
        let mut played: Vec<(&str, &GameRecord)> = self
            .records
            .iter()
            .filter(|(_, record)| record.last_played.is_some())
            .map(|(id, record)| (id.as_str(), record))
            .collect();
        played.sort_by(|a, b| b.1.last_played.cmp(&a.1.last_played).then(a.0.cmp(b.0)));
        played
    }

    fn save_or_warn(&self) {
        if let Err(err) = self.save() {
            warn!(
                path = ?self.path,
                error = %err,
                "failed to save scores; continuing without persistence"
            );
        }
    }
}

/// Saves after every change. Storage failures are logged, never raised.
impl ScoreReporter for ScoreStore {
    fn record_play(&mut self, game_id: &str) {
        self.increment_play_count(game_id, unix_now());
        self.save_or_warn();
    }

    fn report_score(&mut self, game_id: &str, score: u32) {
        if self.update_score(game_id, score, unix_now()) {
            debug!(game_id, score, "new high score");
            self.save_or_warn();
        }
    }

    fn best_score(&self, game_id: &str) -> u32 {
        self.record(game_id).map_or(0, |record| record.high_score)
    }
}

/// Current time in unix seconds; 0 if the clock is before the epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
