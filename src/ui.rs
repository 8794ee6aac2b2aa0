use crate::{
    crash::{
        CrashPhase,
        CrashSnapshot,
    },
    mines::{
        MinesSnapshot,
        MinesStatus,
    },
    presenter::{
        GameView,
        NoticeKind,
        Presenter,
        format_money,
        format_multiplier,
    },
};
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::{
    io::stdout,
    time::{
        Duration,
        Instant,
    },
};

/// Board layout is a presentation concern only; the engines track flat
/// cell indices.
pub const GRID_COLS: u32 = 5;

const TOAST_TTL: Duration = Duration::from_secs(3);
const INPUT_POLL: Duration = Duration::from_millis(25);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActivePanel {
    Crash,
    Mines,
}

/// Keyboard intents consumed by the run loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    SwitchPanel,
    /// Place-bet-or-cashout, depending on the crash phase (single action
    /// key, matching the one-button layout).
    CrashAction,
    /// Start-or-cashout for mines.
    MinesAction,
    RevealSelected,
    RefreshBalance,
    Redraw,
}

/// Terminal presenter plus input state: latest snapshots, the toast
/// line, the loading label, and the player's staged inputs.
pub struct TuiPresenter {
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
    crash: Option<CrashSnapshot>,
    mines: Option<MinesSnapshot>,
    toast: Option<(String, NoticeKind, Instant)>,
    busy_label: Option<String>,
    pub panel: ActivePanel,
    pub bet_input: f64,
    pub auto_cashout_input: f64,
    pub mine_count_input: u32,
    pub cursor: u32,
    pub username: Option<String>,
}

impl Default for TuiPresenter {
    fn default() -> Self {
        Self {
            terminal: None,
            crash: None,
            mines: None,
            toast: None,
            busy_label: None,
            panel: ActivePanel::Crash,
            bet_input: 1.0,
            auto_cashout_input: 2.0,
            mine_count_input: 3,
            cursor: 0,
            username: None,
        }
    }
}

impl TuiPresenter {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        crossterm::execute!(stdout(), crossterm::terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal: Some(terminal),
            ..Self::default()
        })
    }

    pub fn exit() -> Result<()> {
        disable_raw_mode()?;
        crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn cells(&self) -> u32 {
        self.mines.as_ref().map(|m| m.cells).unwrap_or(25)
    }

    pub fn redraw(&mut self) {
        self.draw();
    }

    fn draw(&mut self) {
        if let Some(mut term) = self.terminal.take() {
            let result = term.draw(|frame| {
                render_frame(frame, self.crash.as_ref(), self.mines.as_ref(), self)
            });
            if let Err(err) = result {
                tracing::error!(error = %err, "terminal draw failed");
            }
            self.terminal = Some(term);
        }
    }

    fn toast_line(&self) -> Option<(String, NoticeKind)> {
        let (message, kind, at) = self.toast.as_ref()?;
        (at.elapsed() < TOAST_TTL).then(|| (message.clone(), *kind))
    }
}

impl Presenter for TuiPresenter {
    fn render(&mut self, view: GameView<'_>) {
        match view {
            GameView::Crash(snapshot) => self.crash = Some(snapshot.clone()),
            GameView::Mines(snapshot) => self.mines = Some(snapshot.clone()),
        }
        self.draw();
    }

    fn notify(&mut self, message: &str, kind: NoticeKind) {
        self.toast = Some((message.to_string(), kind, Instant::now()));
        self.draw();
    }

    fn set_busy(&mut self, busy: bool, label: &str) {
        self.busy_label = busy.then(|| label.to_string());
        self.draw();
    }
}

/// Await the next keyboard intent. Keys are scoped to the active panel;
/// unknown keys are swallowed.
pub async fn next_event(presenter: &mut TuiPresenter) -> Result<UserEvent> {
    loop {
        if !event::poll(Duration::ZERO)? {
            tokio::time::sleep(INPUT_POLL).await;
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(UserEvent::Quit),
            KeyCode::Tab => {
                presenter.panel = match presenter.panel {
                    ActivePanel::Crash => ActivePanel::Mines,
                    ActivePanel::Mines => ActivePanel::Crash,
                };
                return Ok(UserEvent::SwitchPanel);
            }
            KeyCode::Char('f') => return Ok(UserEvent::RefreshBalance),
            _ => {}
        }
        match presenter.panel {
            ActivePanel::Crash => match key.code {
                KeyCode::Enter | KeyCode::Char('b') | KeyCode::Char('c') => {
                    return Ok(UserEvent::CrashAction);
                }
                KeyCode::Up => {
                    presenter.bet_input += 1.0;
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Down => {
                    presenter.bet_input = (presenter.bet_input - 1.0).max(0.0);
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Right => {
                    presenter.auto_cashout_input += 0.1;
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Left => {
                    presenter.auto_cashout_input =
                        (presenter.auto_cashout_input - 0.1).max(1.01);
                    return Ok(UserEvent::Redraw);
                }
                _ => {}
            },
            ActivePanel::Mines => match key.code {
                KeyCode::Char('s') | KeyCode::Char('x') => {
                    return Ok(UserEvent::MinesAction);
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    return Ok(UserEvent::RevealSelected);
                }
                KeyCode::Up => {
                    presenter.cursor = presenter.cursor.saturating_sub(GRID_COLS);
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Down => {
                    if presenter.cursor + GRID_COLS < presenter.cells() {
                        presenter.cursor += GRID_COLS;
                    }
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Left => {
                    presenter.cursor = presenter.cursor.saturating_sub(1);
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Right => {
                    if presenter.cursor + 1 < presenter.cells() {
                        presenter.cursor += 1;
                    }
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Char('+') => {
                    presenter.mine_count_input =
                        presenter.mine_count_input.saturating_add(1);
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Char('-') => {
                    presenter.mine_count_input =
                        presenter.mine_count_input.saturating_sub(1).max(1);
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Char('u') => {
                    presenter.bet_input += 1.0;
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Char('d') => {
                    presenter.bet_input = (presenter.bet_input - 1.0).max(0.0);
                    return Ok(UserEvent::Redraw);
                }
                _ => {}
            },
        }
    }
}

fn render_frame(
    frame: &mut Frame,
    crash: Option<&CrashSnapshot>,
    mines: Option<&MinesSnapshot>,
    state: &TuiPresenter,
) {
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(3),
    ])
    .split(frame.area());

    draw_header(frame, rows[0], crash, mines, state);

    let panes =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
    draw_crash_pane(frame, panes[0], crash, state);
    draw_mines_pane(frame, panes[1], mines, state);
    draw_footer(frame, rows[2], state);
}

fn draw_header(
    frame: &mut Frame,
    area: Rect,
    crash: Option<&CrashSnapshot>,
    mines: Option<&MinesSnapshot>,
    state: &TuiPresenter,
) {
    let balance = crash
        .map(|c| c.balance)
        .or(mines.map(|m| m.balance))
        .unwrap_or(0.0);
    let who = state.username.as_deref().unwrap_or("player");
    let header = Paragraph::new(format!(
        "{} | Balance: {} | [Tab] switch panel | [f] refresh balance | [q] quit",
        who,
        format_money(balance)
    ))
    .block(Block::default().borders(Borders::ALL).title("minicasino"));
    frame.render_widget(header, area);
}

fn panel_title_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn draw_crash_pane(
    frame: &mut Frame,
    area: Rect,
    crash: Option<&CrashSnapshot>,
    state: &TuiPresenter,
) {
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        "Crash",
        panel_title_style(state.panel == ActivePanel::Crash),
    ));

    let mut lines: Vec<Line> = Vec::new();
    match crash {
        Some(snapshot) => {
            let multiplier_style = match snapshot.phase {
                CrashPhase::Crashed => Style::default().fg(Color::Red),
                CrashPhase::Cashed => Style::default().fg(Color::Green),
                _ => Style::default().add_modifier(Modifier::BOLD),
            };
            lines.push(Line::styled(
                format_multiplier(snapshot.multiplier),
                multiplier_style,
            ));
            lines.push(Line::from(format!("Phase: {}", snapshot.phase)));
            match snapshot.window_remaining {
                Some(remaining) => {
                    lines.push(Line::from(format!(
                        "Waiting for players: {remaining}s"
                    )));
                }
                None if snapshot.window_open => {
                    lines.push(Line::styled(
                        "BET NOW!",
                        Style::default().fg(Color::Green),
                    ));
                }
                None => {}
            }
            if snapshot.bet_live {
                lines.push(Line::from(format!(
                    "Bet: {}",
                    format_money(snapshot.bet_amount)
                )));
            }
        }
        None => lines.push(Line::from("connecting...")),
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Stake {} (Up/Down) | Auto cashout {} (Left/Right)",
        format_money(state.bet_input),
        format_multiplier(state.auto_cashout_input)
    )));
    lines.push(Line::from("[Enter] place bet / cash out"));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_mines_pane(
    frame: &mut Frame,
    area: Rect,
    mines: Option<&MinesSnapshot>,
    state: &TuiPresenter,
) {
    let selected = state.panel == ActivePanel::Mines;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("Mines", panel_title_style(selected)));

    let mut lines: Vec<Line> = Vec::new();
    match mines {
        Some(snapshot) => {
            let status = match snapshot.status {
                MinesStatus::Inactive => "INACTIVE",
                MinesStatus::Active => "ACTIVE",
                MinesStatus::Won => "WON",
                MinesStatus::Lost => "LOST",
            };
            lines.push(Line::from(format!(
                "{} | {}",
                status,
                format_multiplier(snapshot.multiplier)
            )));
            lines.push(Line::from(""));
            for row_start in (0..snapshot.cells).step_by(GRID_COLS as usize) {
                let mut spans: Vec<Span> = Vec::new();
                for index in row_start..(row_start + GRID_COLS).min(snapshot.cells) {
                    let glyph = if snapshot.revealed.contains(&index) {
                        " * "
                    } else {
                        " ? "
                    };
                    let style = if selected && index == state.cursor {
                        Style::default().bg(Color::Yellow).fg(Color::Black)
                    } else if snapshot.revealed.contains(&index) {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    spans.push(Span::styled(glyph, style));
                    spans.push(Span::raw(" "));
                }
                lines.push(Line::from(spans));
            }
        }
        None => lines.push(Line::from("connecting...")),
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Stake {} (u/d) | Mines: {} (+/-)",
        format_money(state.bet_input),
        state.mine_count_input
    )));
    lines.push(Line::from("[s] start / cash out | [Enter] reveal"));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &TuiPresenter) {
    let (text, style) = if let Some(label) = &state.busy_label {
        (label.clone(), Style::default().fg(Color::Yellow))
    } else if let Some((message, kind)) = state.toast_line() {
        let style = match kind {
            NoticeKind::Success => Style::default().fg(Color::Green),
            NoticeKind::Failure => Style::default().fg(Color::Red),
            NoticeKind::Info => Style::default(),
        };
        (message, style)
    } else {
        (String::new(), Style::default())
    };
    let footer = Paragraph::new(Line::styled(text, style))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
