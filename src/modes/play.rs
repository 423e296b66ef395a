use std::io::{Stderr, stderr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Instant, Interval, interval, interval_at};
use tracing::{debug, error, info};

use crate::game::{GameConfig, GameEngine, GameEvent, MIN_SPEED_MS};
use crate::input::{InputHandler, KeyAction, PromptAction};
use crate::prefs::Preferences;
use crate::render::{Hud, Renderer};
use crate::store::{self, LeaderboardView, ScoreStore};

/// Rows shown in the leaderboard panel
pub const LEADERBOARD_SIZE: usize = 10;

/// Longest player name the prompt accepts
const MAX_NAME_CHARS: usize = 24;

pub struct PlayMode {
    engine: GameEngine,
    store: Arc<ScoreStore>,
    prefs: Preferences,
    leaderboard: LeaderboardView,
    renderer: Renderer,
    input_handler: InputHandler,
    /// Open while the player is typing a name
    name_prompt: Option<String>,
    should_quit: bool,
    refresh_tx: UnboundedSender<(u64, LeaderboardView)>,
    refresh_rx: UnboundedReceiver<(u64, LeaderboardView)>,
    /// Last sequence number handed to a background refresh
    issued_refresh: u64,
    /// Sequence number of the view on screen
    shown_refresh: u64,
}

impl PlayMode {
    pub fn new(mut config: GameConfig, store: Arc<ScoreStore>, prefs: Preferences) -> Self {
        config.base_speed_ms = prefs.speed_ms();
        let (refresh_tx, refresh_rx) = unbounded_channel();

        // Ask for a name up front if none was ever set
        let name_prompt = if store.current_player().is_empty() {
            Some(String::new())
        } else {
            None
        };

        Self {
            engine: GameEngine::new(config),
            store,
            prefs,
            leaderboard: LeaderboardView::default(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            name_prompt,
            should_quit: false,
            refresh_tx,
            refresh_rx,
            issued_refresh: 0,
            shown_refresh: 0,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.leaderboard = store::refresh(&self.store, LEADERBOARD_SIZE).await;

        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_period = self.tick_period();
        let mut tick_timer = interval(tick_period);

        // Render at 30 FPS (33ms per frame)
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    if self.name_prompt.is_none() {
                        self.update_game();
                    }
                }

                // Leaderboard refreshed in the background
                Some((seq, view)) = self.refresh_rx.recv() => {
                    self.apply_refresh(seq, view);
                }

                // Render frame
                _ = render_timer.tick() => {
                    let hud = Hud {
                        state: self.engine.state(),
                        leaderboard: &self.leaderboard,
                        skin: self.prefs.skin(),
                        base_speed_ms: self.prefs.speed_ms(),
                        name_prompt: self.name_prompt.as_deref(),
                    };
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &hud);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }

            // The interval shrinks as food is eaten or the speed setting changes
            if self.tick_period() != tick_period {
                tick_period = self.tick_period();
                tick_timer = restart_interval(tick_period);
            }
        }

        Ok(())
    }

    fn tick_period(&self) -> Duration {
        Duration::from_millis(self.engine.state().speed_ms.max(MIN_SPEED_MS))
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            if self.name_prompt.is_some() {
                self.handle_prompt_key(key);
            } else {
                self.handle_game_key(key);
            }
        }
    }

    fn handle_game_key(&mut self, key: KeyEvent) {
        match self.input_handler.handle_key_event(key) {
            KeyAction::Turn(direction) => self.engine.set_direction(direction),
            KeyAction::TogglePause => self.engine.toggle_pause(),
            KeyAction::Continue => {
                if self.engine.state().is_over() {
                    self.reset_game();
                }
            }
            KeyAction::Restart => self.reset_game(),
            KeyAction::ChangePlayer => {
                self.name_prompt = Some(self.store.current_player());
            }
            KeyAction::CycleSkin => {
                let skin = self.prefs.cycle_skin();
                debug!(skin = skin.as_str(), "skin changed");
            }
            KeyAction::Faster => {
                let speed = self.prefs.faster();
                self.engine.set_base_speed(speed);
            }
            KeyAction::Slower => {
                let speed = self.prefs.slower();
                self.engine.set_base_speed(speed);
            }
            KeyAction::Quit => self.should_quit = true,
            KeyAction::None => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let action = self.input_handler.handle_prompt_key(key);
        let Some(input) = self.name_prompt.as_mut() else {
            return;
        };

        match action {
            PromptAction::Insert(c) => {
                if input.chars().count() < MAX_NAME_CHARS {
                    input.push(c);
                }
            }
            PromptAction::Backspace => {
                input.pop();
            }
            PromptAction::Submit => {
                let name = input.trim().to_string();
                // A blank name keeps the prompt open
                if !name.is_empty() {
                    self.store.set_current_player(&name);
                    info!(player = %name, "player changed");
                    self.name_prompt = None;
                    self.spawn_refresh();
                }
            }
            PromptAction::Cancel => self.name_prompt = None,
            PromptAction::Quit => self.should_quit = true,
            PromptAction::None => {}
        }
    }

    fn update_game(&mut self) {
        let result = self.engine.advance();

        if let Some(GameEvent::RoundEnded { final_score, outcome }) = result.event {
            info!(final_score, ?outcome, "round over");
            self.spawn_save(final_score);
        }
    }

    /// Save the round in the background and push the refreshed leaderboard
    /// back into the loop when it lands
    fn spawn_save(&mut self, final_score: u32) {
        let seq = self.next_refresh_seq();
        let save = store::spawn_record_round(Arc::clone(&self.store), final_score, LEADERBOARD_SIZE);
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            match save.await {
                Ok(view) => {
                    let _ = tx.send((seq, view));
                }
                Err(e) => error!(error = %e, final_score, "round save task failed"),
            }
        });
    }

    fn spawn_refresh(&mut self) {
        let seq = self.next_refresh_seq();
        let store = Arc::clone(&self.store);
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            let view = store::refresh(&store, LEADERBOARD_SIZE).await;
            let _ = tx.send((seq, view));
        });
    }

    fn next_refresh_seq(&mut self) -> u64 {
        self.issued_refresh += 1;
        self.issued_refresh
    }

    /// Show a background view unless a newer one is already on screen. A view
    /// that arrives late may predate a write, so a fresh reload is requested.
    fn apply_refresh(&mut self, seq: u64, view: LeaderboardView) {
        if seq > self.shown_refresh {
            self.shown_refresh = seq;
            self.leaderboard = view;
        } else {
            debug!(seq, shown = self.shown_refresh, "dropping stale leaderboard");
            self.spawn_refresh();
        }
    }

    fn reset_game(&mut self) {
        self.engine.reset();
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

/// New interval whose first tick is one full period away
fn restart_interval(period: Duration) -> Interval {
    interval_at(Instant::now() + period, period)
}
