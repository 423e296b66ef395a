use std::io::Write;

use anyhow::{Context, Result};

use crate::store::{self, LeaderboardView, ScoreStore};

/// Print the leaderboard to stdout without starting a game
pub struct ScoresMode<'a> {
    store: &'a ScoreStore,
    limit: usize,
}

impl<'a> ScoresMode<'a> {
    pub fn new(store: &'a ScoreStore, limit: usize) -> Self {
        Self { store, limit }
    }

    pub async fn run(&self, out: &mut impl Write) -> Result<()> {
        let view = store::refresh(self.store, self.limit).await;
        write_leaderboard(out, &view).context("Failed to write leaderboard")
    }
}

pub fn write_leaderboard(out: &mut impl Write, view: &LeaderboardView) -> std::io::Result<()> {
    writeln!(out, "Leaderboard: {}", view.backend.label())?;

    if view.top.is_empty() {
        writeln!(out, "No scores yet")?;
    }
    for (i, record) in view.top.iter().enumerate() {
        writeln!(
            out,
            "{:>2}. {:<20} {:>6}  {}",
            i + 1,
            record.name,
            record.score,
            record.created_at.format("%Y-%m-%d %H:%M")
        )?;
    }

    if !view.player.is_empty() {
        writeln!(out, "Your best ({}): {}", view.player, view.best.unwrap_or(0))?;
    }

    Ok(())
}
