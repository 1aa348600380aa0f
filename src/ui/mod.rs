pub mod home;
pub mod topics;

use crate::app::{AppState, InputMode, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

pub const APP_TITLE: &str = "Vibe News";

pub fn render(frame: &mut Frame, state: &AppState, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_navbar(frame, chunks[0], state.view);

    match state.view {
        View::Home => home::render(frame, chunks[1], state),
        View::Topics => topics::render(frame, chunks[1], state),
    }

    render_status(frame, chunks[2], state, now);

    match &state.input {
        InputMode::Adding(buffer) => render_input_modal(frame, "Add Topic", buffer),
        InputMode::Renaming { buffer, .. } => render_input_modal(frame, "Rename Topic", buffer),
        InputMode::Normal => {}
    }
}

fn render_navbar(frame: &mut Frame, area: Rect, view: View) {
    let tab = |label: &'static str, active: bool| {
        if active {
            Span::styled(
                label,
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(label, Style::default().fg(Color::Gray))
        }
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", APP_TITLE),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        tab(" 1 Home ", view == View::Home),
        Span::raw(" "),
        tab(" 2 Topics ", view == View::Topics),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_status(frame: &mut Frame, area: Rect, state: &AppState, now: Instant) {
    let mut spans = Vec::new();

    if let Some(remaining) = state.cooldown_remaining(now) {
        spans.push(Span::styled(
            format!(" cooldown {}s ", remaining.as_secs() + 1),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
        spans.push(Span::raw(" "));
    } else if state.is_loading() {
        spans.push(Span::styled(
            " fetching ",
            Style::default().fg(Color::Black).bg(Color::Green),
        ));
        spans.push(Span::raw(" "));
    }

    match &state.status {
        Some(message) => spans.push(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Yellow),
        )),
        None => spans.push(Span::styled(
            match state.view {
                View::Home => "←/→ topic  ↑/↓ article  Enter open  q quit",
                View::Topics => "a add  e rename  d delete  Enter select  Esc back  q quit",
            },
            Style::default().fg(Color::DarkGray),
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input_modal(frame: &mut Frame, title: &str, buffer: &str) {
    let modal_area = center_rect(60, 20, frame.area());
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", title));

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let text = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw(buffer),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to save | Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

pub fn center_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Flatten a rendered buffer into newline-separated rows.
pub fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Action;
    use crate::resolver::ArticleCache;
    use crate::topics::TopicStore;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| render(frame, state, Instant::now()))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn state() -> AppState {
        AppState::new(
            TopicStore::new(vec!["Rust".to_string(), "Go".to_string()]),
            ArticleCache::new(),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_navbar_shows_app_and_views() {
        let text = draw(&state());
        assert!(text.contains("Vibe News"));
        assert!(text.contains("1 Home"));
        assert!(text.contains("2 Topics"));
    }

    #[test]
    fn test_loading_indicator_while_pass_in_flight() {
        let mut state = state();
        state.update(Action::Startup, Instant::now());
        let text = draw(&state);
        assert!(text.contains("fetching"));
        assert!(text.contains("Loading..."));
    }

    #[test]
    fn test_input_modal_is_drawn() {
        let mut state = state();
        state.update(Action::ShowView(View::Topics), Instant::now());
        state.input = InputMode::Adding("Zig".to_string());
        let text = draw(&state);
        assert!(text.contains("Add Topic"));
        assert!(text.contains("Zig"));
    }

    #[test]
    fn test_center_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = center_rect(60, 20, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 10);
        assert!(inner.x >= 20 && inner.y >= 20);
    }

    #[test]
    fn test_home_hint_lists_only_bound_keys() {
        let text = draw(&state());
        assert!(text.contains("Enter open  q quit"));
        assert!(!text.contains("refresh"));
    }
}
