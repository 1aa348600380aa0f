use crate::app::AppState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let block = Block::default()
        .title(" Manage Topics ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let topics = state.topics.topics();
    if topics.is_empty() {
        let empty = List::new(vec![ListItem::new("No topics. Press a to add one.")]).block(block);
        frame.render_widget(empty, chunks[0]);
    } else {
        let selected = state.topics.selected();
        let items: Vec<ListItem> = topics
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                let is_selected = !selected.is_empty() && topic == selected;
                let marker = if is_selected { "✓ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        marker,
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        topic.as_str(),
                        if is_selected {
                            Style::default().fg(Color::Cyan)
                        } else {
                            Style::default().fg(Color::White)
                        },
                    ),
                ]))
            })
            .collect();

        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        let mut list_state = ListState::default();
        list_state.select(Some(state.topic_cursor.min(topics.len() - 1)));
        frame.render_stateful_widget(list, chunks[0], &mut list_state);
    }

    let help = Paragraph::new(Line::from(Span::styled(
        " Topics are searched as typed. Renames are saved exactly as entered.",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ArticleCache;
    use crate::topics::TopicStore;
    use crate::ui::buffer_text;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn state(names: &[&str]) -> AppState {
        AppState::new(
            TopicStore::new(names.iter().map(|s| s.to_string()).collect()),
            ArticleCache::new(),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_lists_topics_and_marks_selection() {
        let text = draw(&state(&["Trump", "Steelers", "AI"]));
        assert!(text.contains("Manage Topics"));
        assert!(text.contains("✓ 1. Trump"));
        assert!(text.contains("2. Steelers"));
        assert!(!text.contains("✓ 2. Steelers"));
    }

    #[test]
    fn test_empty_list_hint() {
        let text = draw(&state(&[]));
        assert!(text.contains("No topics. Press a to add one."));
    }
}
