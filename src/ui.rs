use crate::client::AppSnapshot;
use coin_flip::{
    Outcome,
    Phase,
    Side,
    game::{
        CoinFace,
        Overlay,
    },
};
use color_eyre::eyre::Result;
use crossterm::event::{
    Event,
    EventStream,
    KeyCode,
    KeyEvent,
    KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode,
    enable_raw_mode,
};
use futures::StreamExt;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::io::stdout;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    Select(Side),
    Flip,
    DismissOverlay,
    ConfirmClear,
    DeclineClear,
    Redraw,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Normal,
    ClearModal,
    QuitModal,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    history_open: bool,
    overlay_visible: bool,
    has_choice: bool,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    // key handling needs to know what is on screen
    state.overlay_visible = snap.overlay.is_some();
    state.has_choice = snap.choice.is_some();
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub async fn next_event(state: &mut UiState, events: &mut EventStream) -> Result<UserEvent> {
    loop {
        let Some(event) = events.next().await else {
            return Ok(UserEvent::Quit);
        };
        match event? {
            Event::Key(k) => {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(ev) = handle_key(state, k) {
                    return Ok(ev);
                }
            }
            Event::Resize(..) => return Ok(UserEvent::Redraw),
            _ => {}
        }
    }
}

fn handle_key(state: &mut UiState, k: KeyEvent) -> Option<UserEvent> {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return Some(UserEvent::Quit);
    }
    match state.mode {
        Mode::ClearModal => {
            return match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::ConfirmClear)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::DeclineClear)
                }
                _ => None,
            };
        }
        Mode::QuitModal => {
            return match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::Normal => {}
    }
    if state.overlay_visible {
        return Some(UserEvent::DismissOverlay);
    }
    match k.code {
        KeyCode::Char('q') => {
            state.mode = Mode::QuitModal;
            Some(UserEvent::Redraw)
        }
        KeyCode::Esc => {
            if state.history_open {
                state.history_open = false;
            } else {
                state.mode = Mode::QuitModal;
            }
            Some(UserEvent::Redraw)
        }
        // like the page shortcuts, h/t only pick when nothing is picked yet
        KeyCode::Char('h') if !state.has_choice => Some(UserEvent::Select(Side::Heads)),
        KeyCode::Char('t') if !state.has_choice => Some(UserEvent::Select(Side::Tails)),
        KeyCode::Left => Some(UserEvent::Select(Side::Heads)),
        KeyCode::Right => Some(UserEvent::Select(Side::Tails)),
        KeyCode::Char(' ') | KeyCode::Enter => Some(UserEvent::Flip),
        KeyCode::Tab => {
            state.history_open = !state.history_open;
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('c') => {
            state.mode = Mode::ClearModal;
            Some(UserEvent::Redraw)
        }
        _ => None,
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let history_height = if state.history_open {
        Constraint::Min(6)
    } else {
        Constraint::Length(0)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // status + stats
            Constraint::Length(9), // coin
            Constraint::Length(3), // result
            history_height,
            Constraint::Length(3), // notices
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_top(f, chunks[0], snap);
    draw_coin(f, chunks[1], snap);
    draw_result(f, chunks[2], snap);
    if state.history_open {
        draw_history(f, chunks[3], snap);
    }
    draw_notices(f, chunks[4], snap);
    draw_help(f, chunks[5]);
    draw_overlay(f, snap);
    draw_modals(f, state);
}

fn draw_top(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let choice = match snap.choice {
        Some(side) => side.name().to_uppercase(),
        None => String::from("none"),
    };
    let stats = &snap.stats;
    let text = vec![
        Line::from(format!(
            "Choice: {} | {} | {}",
            choice,
            phase_label(snap.phase),
            snap.status
        )),
        Line::from(format!(
            "Flips: {} | Wins: {} | Losses: {} | Win rate: {}% | History: {}",
            stats.total, stats.wins, stats.losses, stats.win_rate, snap.storage_label
        )),
    ];
    let top = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Coin Flip"));
    f.render_widget(top, area);
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "waiting for a choice",
        Phase::Ready => "ready",
        Phase::Flipping => "flipping",
        Phase::Resolved => "resolved",
    }
}

const SPIN_FRAMES: [&str; 4] = ["H", "|", "T", "|"];

fn draw_coin(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let (glyph, label, style) = match snap.face {
        CoinFace::Spinning => {
            let glyph = SPIN_FRAMES[(snap.frame % SPIN_FRAMES.len() as u64) as usize];
            (glyph, "", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        }
        CoinFace::Resting(side) => (
            coin_glyph(side),
            side_label(side),
            Style::default().fg(Color::Yellow),
        ),
    };
    let lines = vec![
        Line::from(""),
        Line::styled("  .-----.  ", style),
        Line::styled(" /       \\ ", style),
        Line::styled(format!("|    {}    |", glyph), style),
        Line::styled(" \\       / ", style),
        Line::styled("  '-----'  ", style),
        Line::from(label),
    ];
    let coin = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Coin"));
    f.render_widget(coin, area);
}

fn coin_glyph(side: Side) -> &'static str {
    match side {
        Side::Heads => "H",
        Side::Tails => "T",
    }
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Heads => "HEADS",
        Side::Tails => "TAILS",
    }
}

fn outcome_style(outcome: Outcome) -> Style {
    match outcome {
        Outcome::Win => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Outcome::Loss => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn draw_result(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let line = match &snap.announcement {
        Some((outcome, text)) => Line::styled(text.clone(), outcome_style(*outcome)),
        None => Line::styled("", Style::default()),
    };
    let result = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Result"));
    f.render_widget(result, area);
}

fn draw_history(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = Vec::new();
    if snap.recent.is_empty() {
        lines.push(Line::styled("No flips yet!", Style::default().fg(Color::DarkGray)));
    } else {
        for row in &snap.recent {
            let verdict = match row.outcome {
                Outcome::Win => "WIN",
                Outcome::Loss => "LOSS",
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} - {}", side_label(row.coin_result), verdict),
                    outcome_style(row.outcome),
                ),
                Span::styled(format!("  {}", row.time), Style::default().fg(Color::DarkGray)),
            ]));
        }
    }
    let history = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("History (latest first, c to clear)"),
    );
    f.render_widget(history, area);
}

fn draw_notices(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let (text, color) = match snap.notices.first() {
        Some(latest) => (latest.clone(), Color::Red),
        None => (String::from("No notices"), Color::DarkGray),
    };
    let notices = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title("Notices"));
    f.render_widget(notices, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "h heads | t tails | ←/→ change | space/enter flip | tab history | c clear | q/Esc quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_overlay(f: &mut Frame, snap: &AppSnapshot) {
    let Some(overlay) = snap.overlay else {
        return;
    };
    let (title, text, color) = match overlay {
        Overlay::Victory => ("Victory", "YOU WIN!", Color::Green),
        Overlay::Defeat => ("Defeat", "YOU LOSE", Color::Red),
    };
    let area = centered_rect(40, 25, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title);
    let p = Paragraph::new(vec![
        Line::from(""),
        Line::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::styled("any key to close", Style::default().fg(Color::DarkGray)),
    ])
    .alignment(Alignment::Center);
    f.render_widget(Clear, area);
    f.render_widget(block.clone(), area);
    f.render_widget(p, block.inner(area));
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    let (title, prompt) = match state.mode {
        Mode::ClearModal => (
            "Clear History",
            "Are you sure you want to clear all history? (Y/N)",
        ),
        Mode::QuitModal => ("Confirm Quit", "Quit the game? (Y/N)"),
        Mode::Normal => return,
    };
    let area = centered_rect(50, 20, f.area());
    let block = Block::default().borders(Borders::ALL).title(title);
    let p = Paragraph::new(prompt).wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(block.clone(), area);
    f.render_widget(p, block.inner(area));
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
