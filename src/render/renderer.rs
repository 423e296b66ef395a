use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::game::{GameState, Position};
use crate::prefs::Skin;
use crate::store::LeaderboardView;

/// Everything one frame shows
pub struct Hud<'a> {
    pub state: &'a GameState,
    pub leaderboard: &'a LeaderboardView,
    pub skin: Skin,
    pub base_speed_ms: u64,
    /// Text typed so far while the name prompt is open
    pub name_prompt: Option<&'a str>,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, hud: &Hud) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(hud), chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(32)])
            .split(chunks[1]);

        if hud.state.is_over() {
            frame.render_widget(self.render_game_over(hud.state), body[0]);
        } else {
            frame.render_widget(self.render_grid(hud.state, hud.skin), body[0]);
        }

        frame.render_widget(self.render_leaderboard(hud.leaderboard), body[1]);
        frame.render_widget(self.render_controls(), chunks[2]);

        if let Some(input) = hud.name_prompt {
            let area = centered_rect(40, 7, frame.area());
            frame.render_widget(Clear, area);
            frame.render_widget(self.render_name_prompt(input), area);
        }
    }

    fn render_grid(&self, state: &GameState, skin: Skin) -> Paragraph<'_> {
        let mut lines = Vec::new();

        for y in 0..state.grid_size {
            let mut spans = Vec::new();

            for x in 0..state.grid_size {
                let pos = Position::new(x as i32, y as i32);

                let cell = if let Some(index) = state.snake.body.iter().position(|p| *p == pos) {
                    snake_cell(skin, index)
                } else if pos == state.food {
                    Span::styled(
                        "● ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(". ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        let title = if state.is_paused() {
            Span::styled(
                " Paused - press Space ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(" Snake ")
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(if state.is_paused() {
                        Color::Yellow
                    } else {
                        Color::White
                    }))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, hud: &Hud) -> Paragraph<'_> {
        let player = if hud.leaderboard.player.is_empty() {
            "-".to_string()
        } else {
            hud.leaderboard.player.clone()
        };

        let text = vec![Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                hud.state.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Tick: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{} ms (base {})", hud.state.speed_ms, hud.base_speed_ms),
                Style::default().fg(Color::White),
            ),
            Span::raw("    "),
            Span::styled("Player: ", Style::default().fg(Color::Yellow)),
            Span::styled(player, Style::default().fg(Color::White)),
        ])];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM))
    }

    fn render_leaderboard(&self, view: &LeaderboardView) -> Paragraph<'_> {
        let mut lines = vec![
            Line::from(Span::styled(
                view.backend.label(),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(vec![
                Span::styled("Your best: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    view.best.map(|b| b.to_string()).unwrap_or_else(|| "-".into()),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
        ];

        if view.top.is_empty() {
            lines.push(Line::from(Span::styled(
                "No scores yet",
                Style::default().fg(Color::Gray),
            )));
        }

        for (i, record) in view.top.iter().enumerate() {
            let style = if !view.player.is_empty() && record.name == view.player {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            lines.push(Line::from(Span::styled(
                format!("{:>2}. {:<18} {:>6}", i + 1, truncate(&record.name, 18), record.score),
                style,
            )));
        }

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(" Top Scores "),
        )
    }

    fn render_game_over(&self, state: &GameState) -> Paragraph<'_> {
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    state.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Enter",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_name_prompt<'a>(&self, input: &'a str) -> Paragraph<'a> {
        let text = vec![
            Line::from("Who is playing?"),
            Line::from(""),
            Line::from(vec![
                Span::styled(input, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                Span::styled("_", Style::default().fg(Color::Cyan)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to save, Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Player "),
        )
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" move | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("R", Style::default().fg(Color::Cyan)),
            Span::raw(" restart (unsaved) | "),
            Span::styled("N", Style::default().fg(Color::Cyan)),
            Span::raw(" player | "),
            Span::styled("K", Style::default().fg(Color::Cyan)),
            Span::raw(" skin | "),
            Span::styled("+/-", Style::default().fg(Color::Cyan)),
            Span::raw(" speed | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ])];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn snake_cell(skin: Skin, index: usize) -> Span<'static> {
    match skin {
        Skin::Classic => {
            if index == 0 {
                Span::styled(
                    "■ ",
                    Style::default()
                        .fg(Color::Rgb(0x22, 0xc5, 0x5e))
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled("■ ", Style::default().fg(Color::Rgb(0x16, 0xa3, 0x4a)))
            }
        }
        Skin::Python => {
            if index == 0 {
                Span::styled(
                    "◉ ",
                    Style::default()
                        .fg(Color::Rgb(0x37, 0x76, 0xab))
                        .add_modifier(Modifier::BOLD),
                )
            } else if index % 2 == 1 {
                Span::styled("■ ", Style::default().fg(Color::Rgb(0xff, 0xd4, 0x3b)))
            } else {
                Span::styled("■ ", Style::default().fg(Color::Rgb(0xff, 0xc3, 0x31)))
            }
        }
    }
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(max_chars - 1).collect();
        short.push('…');
        short
    }
}

/// A `width` x `height` box centered in `area`, shrunk to fit
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
