//! Score persistence behind one interface.
//!
//! A [`ScoreStore`] owns the current player's identity and delegates the
//! score ledger to a [`ScoreBackend`]: either the embedded SQLite database
//! kept in the host's key-value storage, or a remote PostgREST table. The
//! backend is chosen once, when the store is built.

pub mod embedded;
pub mod error;
pub mod kv;
pub mod remote;
pub mod round;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LeaderboardConfig;

pub use embedded::EmbeddedBackend;
pub use error::{StoreError, StoreResult};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use remote::RemoteBackend;
pub use round::{record_round, refresh, spawn_record_round, LeaderboardView};

/// Name recorded when a score is saved before any player was set
pub const ANONYMOUS: &str = "Anonymous";

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// A score about to be appended to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub name: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// Which ledger implementation is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Embedded,
    Remote,
}

impl Backend {
    /// Human readable description for the UI
    pub fn label(&self) -> &'static str {
        match self {
            Backend::Embedded => "Local (this machine only)",
            Backend::Remote => "Global (remote)",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Embedded => write!(f, "embedded"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

/// What `save_score` did with its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Input was not a finite number; nothing was written
    Ignored,
}

/// Storage for the score ledger
#[async_trait]
pub trait ScoreBackend: Send + Sync {
    fn kind(&self) -> Backend;

    async fn insert(&self, entry: NewScore) -> StoreResult<()>;

    /// Up to `limit` records, best score first, earlier record first on ties
    async fn fetch_top(&self, limit: usize) -> StoreResult<Vec<ScoreRecord>>;

    /// Highest score recorded under exactly `name`
    async fn fetch_best(&self, name: &str) -> StoreResult<Option<i64>>;
}

/// The leaderboard as seen by the host
pub struct ScoreStore {
    backend: Box<dyn ScoreBackend>,
    kv: Arc<dyn KeyValueStore>,
}

impl ScoreStore {
    /// Build a store around an explicit backend
    pub fn new(backend: Box<dyn ScoreBackend>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self { backend, kv }
    }

    /// Build the backend selected by configuration.
    ///
    /// A remote backend without URL or key, or with an unusable URL, falls
    /// back to the embedded one. Only fails if not even an empty embedded
    /// database can be created.
    pub fn init(config: &LeaderboardConfig, kv: Arc<dyn KeyValueStore>) -> StoreResult<Self> {
        if config.backend == Backend::Remote {
            if config.has_remote_credentials() {
                let timeout = Duration::from_millis(config.request_timeout_ms);
                match RemoteBackend::new(&config.remote_url, &config.remote_key, timeout) {
                    Ok(remote) => {
                        info!(url = %config.remote_url, "using remote leaderboard");
                        return Ok(Self::new(Box::new(remote), kv));
                    }
                    Err(e) => warn!(error = %e, "remote leaderboard unusable, using local one"),
                }
            } else {
                warn!("remote leaderboard selected without url or key, using local one");
            }
        }

        let embedded = EmbeddedBackend::open(Arc::clone(&kv))?;
        info!("using local leaderboard");
        Ok(Self::new(Box::new(embedded), kv))
    }

    pub fn backend(&self) -> Backend {
        self.backend.kind()
    }

    /// Remember who is playing. Blank names are ignored.
    pub fn set_current_player(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Err(e) = self.kv.put_string(kv::PLAYER_KEY, name) {
            warn!(error = %e, "failed to persist player name");
        }
    }

    /// The remembered player, or an empty string
    pub fn current_player(&self) -> String {
        match self.kv.get_string(kv::PLAYER_KEY) {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "failed to read player name");
                String::new()
            }
        }
    }

    /// Append a finished round's score for the current player.
    ///
    /// Non-finite scores are ignored; fractional ones are floored. Errors are
    /// returned for the caller to log, the score itself is then lost.
    pub async fn save_score(&self, score: f64) -> StoreResult<SaveOutcome> {
        if !score.is_finite() {
            return Ok(SaveOutcome::Ignored);
        }

        let player = self.current_player();
        let name = if player.is_empty() {
            ANONYMOUS.to_string()
        } else {
            player
        };

        self.backend
            .insert(NewScore {
                name,
                score: score.floor() as i64,
                created_at: Utc::now(),
            })
            .await?;

        Ok(SaveOutcome::Saved)
    }

    /// Best `limit` records; empty if the backend fails
    pub async fn top(&self, limit: usize) -> Vec<ScoreRecord> {
        match self.backend.fetch_top(limit).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, backend = %self.backend(), "failed to load leaderboard");
                Vec::new()
            }
        }
    }

    /// A player's best score; 0 if they have none or the backend fails
    pub async fn best_for_player(&self, name: &str) -> i64 {
        match self.backend.fetch_best(name).await {
            Ok(best) => best.unwrap_or(0),
            Err(e) => {
                warn!(error = %e, backend = %self.backend(), "failed to load personal best");
                0
            }
        }
    }
}
