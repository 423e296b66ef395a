//! What the host does with a finished round: save it, then reload the
//! leaderboard it shows.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{Backend, SaveOutcome, ScoreRecord, ScoreStore};

/// Leaderboard data the UI renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardView {
    pub backend: Backend,
    /// Empty when nobody has set a name yet
    pub player: String,
    /// Personal best, only when a player is set
    pub best: Option<i64>,
    pub top: Vec<ScoreRecord>,
}

/// Load the top `limit` records and the current player's best
pub async fn refresh(store: &ScoreStore, limit: usize) -> LeaderboardView {
    let top = store.top(limit).await;
    let player = store.current_player();
    let best = if player.is_empty() {
        None
    } else {
        Some(store.best_for_player(&player).await)
    };

    LeaderboardView {
        backend: store.backend(),
        player,
        best,
        top,
    }
}

/// Save a final score, then refresh.
///
/// A failed save loses the score; it is logged and the refresh still runs.
pub async fn record_round(store: &ScoreStore, final_score: u32, limit: usize) -> LeaderboardView {
    match store.save_score(f64::from(final_score)).await {
        Ok(SaveOutcome::Saved) => info!(final_score, "round saved"),
        Ok(SaveOutcome::Ignored) => {}
        Err(e) => error!(error = %e, final_score, "failed to save round, score lost"),
    }

    refresh(store, limit).await
}

/// Run [`record_round`] in the background so the game loop never waits on it
pub fn spawn_record_round(
    store: Arc<ScoreStore>,
    final_score: u32,
    limit: usize,
) -> JoinHandle<LeaderboardView> {
    tokio::spawn(async move { record_round(&store, final_score, limit).await })
}
