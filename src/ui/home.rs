use crate::app::AppState;
use crate::feeds::Article;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

const COLUMNS: usize = 3;
const CARD_HEIGHT: u16 = 9;
const EMPTY_TEXT: &str = "No news found for this topic.";

/// One cell of the card grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Card<'a> {
    Article(&'a Article),
    Placeholder(&'a Article),
}

pub fn cards(articles: &[Article]) -> Vec<Card<'_>> {
    articles
        .iter()
        .map(|a| {
            if a.is_placeholder() {
                Card::Placeholder(a)
            } else {
                Card::Article(a)
            }
        })
        .collect()
}

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    render_tabs(frame, chunks[0], state);

    let heading = Paragraph::new(Span::styled(
        "Trending News",
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(heading, chunks[1]);

    let body = chunks[2];
    if state.topics.is_empty() {
        render_message(frame, body, "No topics yet. Press 2 to add some.");
        return;
    }

    match state.selected_articles() {
        Some(articles) if !articles.is_empty() => {
            render_grid(frame, body, &cards(articles), state.card_cursor)
        }
        None if state.is_loading() && !state.topics.selected().is_empty() => {
            render_message(frame, body, "Loading...")
        }
        _ => render_message(frame, body, EMPTY_TEXT),
    }
}

fn render_tabs(frame: &mut Frame, area: Rect, state: &AppState) {
    let titles: Vec<Line> = state
        .topics
        .topics()
        .iter()
        .map(|t| Line::from(format!(" {} ", t)))
        .collect();

    let mut tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider("|");
    if let Some(index) = state.topics.selected_index() {
        tabs = tabs.select(index);
    }

    frame.render_widget(tabs, area);
}

fn render_message(frame: &mut Frame, area: Rect, message: &str) {
    let paragraph = Paragraph::new(vec![Line::from(""), Line::from(message)])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_grid(frame: &mut Frame, area: Rect, cards: &[Card], focused: usize) {
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let focused_row = focused / COLUMNS;
    let first_row = focused_row.saturating_sub(visible_rows - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (slot, row_cards) in cards
        .chunks(COLUMNS)
        .skip(first_row)
        .take(visible_rows)
        .enumerate()
    {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, COLUMNS as u32); COLUMNS])
            .split(row_areas[slot]);

        for (col, card) in row_cards.iter().enumerate() {
            let index = (first_row + slot) * COLUMNS + col;
            render_card(frame, cells[col], card, index == focused);
        }
    }
}

fn render_card(frame: &mut Frame, area: Rect, card: &Card, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.max(1) as usize;
    let height = inner.height as usize;
    let mut lines: Vec<Line> = Vec::new();

    match card {
        Card::Article(article) => {
            lines.extend(wrapped(&article.title, width, 2, title_style()));
            let url = article.url.as_deref().unwrap_or_default();
            let room = height.saturating_sub(lines.len() + 1);
            lines.extend(wrapped(
                &article.description,
                width,
                room,
                Style::default().fg(Color::White),
            ));
            while lines.len() + 1 < height {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                truncate(url, width),
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            )));
        }
        Card::Placeholder(article) => {
            lines.extend(wrapped(&article.title, width, 2, title_style()));
            let room = height.saturating_sub(lines.len());
            lines.extend(wrapped(
                &article.description,
                width,
                room,
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn title_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Wrap `text` to `width`, keeping at most `max_lines` and marking the cut.
fn wrapped(text: &str, width: usize, max_lines: usize, style: Style) -> Vec<Line<'static>> {
    if max_lines == 0 {
        return Vec::new();
    }
    let all = textwrap::wrap(text, width);
    let truncated = all.len() > max_lines;
    all.into_iter()
        .take(max_lines)
        .enumerate()
        .map(|(i, segment)| {
            let mut segment = segment.into_owned();
            if truncated && i + 1 == max_lines {
                segment = truncate(&format!("{}…", segment), width);
            }
            Line::from(Span::styled(segment, style))
        })
        .collect()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Action;
    use crate::resolver::{no_results, ArticleCache};
    use crate::topics::TopicStore;
    use crate::ui::buffer_text;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::{Duration, Instant};

    fn article(title: &str, description: &str) -> Article {
        Article {
            title: title.to_string(),
            description: description.to_string(),
            url: Some(format!("https://news.example/{}", title.to_lowercase())),
            image: None,
        }
    }

    fn draw(state: &AppState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn state_with(cache: Vec<(&str, Vec<Article>)>, topics: &[&str]) -> AppState {
        let cache: ArticleCache = cache
            .into_iter()
            .map(|(t, a)| (t.to_string(), a))
            .collect();
        AppState::new(
            TopicStore::new(topics.iter().map(|s| s.to_string()).collect()),
            cache,
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_cards_split_articles_and_placeholders() {
        let articles = vec![article("A", ""), no_results().remove(0)];
        let cards = cards(&articles);
        assert!(matches!(cards[0], Card::Article(_)));
        assert!(matches!(cards[1], Card::Placeholder(_)));
    }

    #[test]
    fn test_renders_article_cards_and_tabs() {
        let state = state_with(
            vec![(
                "Rust",
                vec![
                    article("Borrowck", "The checker got faster"),
                    article("Editions", "Another one ships"),
                ],
            )],
            &["Rust", "Go"],
        );
        let text = draw(&state, 120, 30);

        assert!(text.contains("Rust"));
        assert!(text.contains("Go"));
        assert!(text.contains("Trending News"));
        assert!(text.contains("Borrowck"));
        assert!(text.contains("The checker got faster"));
        assert!(text.contains("https://news.example/editions"));
    }

    #[test]
    fn test_placeholder_card_shows_text_without_url() {
        let state = state_with(vec![("Go", no_results())], &["Go"]);
        let text = draw(&state, 120, 30);

        assert!(text.contains("No results"));
        assert!(text.contains("No news found for this topic."));
        assert!(!text.contains("https://"));
    }

    #[test]
    fn test_missing_entry_shows_empty_text() {
        let state = state_with(vec![], &["Go"]);
        let text = draw(&state, 120, 30);
        assert!(text.contains(EMPTY_TEXT));
    }

    #[test]
    fn test_missing_entry_while_loading() {
        let mut state = state_with(vec![], &["Go"]);
        state.update(Action::Startup, Instant::now());
        let text = draw(&state, 120, 30);
        assert!(text.contains("Loading..."));
    }

    #[test]
    fn test_no_topics_hint() {
        let state = state_with(vec![], &[]);
        let text = draw(&state, 120, 30);
        assert!(text.contains("No topics yet"));
    }

    #[test]
    fn test_grid_scrolls_to_focused_card() {
        let articles: Vec<Article> = (0..9)
            .map(|i| article(&format!("Story{}", i), "body"))
            .collect();
        let mut state = state_with(vec![("Rust", articles)], &["Rust"]);
        state.card_cursor = 8;

        // Room for one row of cards only.
        let text = draw(&state, 120, 4 + CARD_HEIGHT);
        assert!(text.contains("Story8"));
        assert!(!text.contains("Story0"));
    }

    #[test]
    fn test_wrapped_marks_truncation() {
        let lines = wrapped("one two three four five six", 9, 2, Style::default());
        assert_eq!(lines.len(), 2);
        let last: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(last.ends_with('…'));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
