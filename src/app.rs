use crate::feeds::{Article, NewsFetcher};
use crate::resolver::{
    self, ArticleCache, Generation, RateLimitCooldown, Resolution, ResultsMap,
};
use crate::storage::{self, KeyValueStore};
use crate::topics::TopicStore;
use crate::ui;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const TICK_RATE: Duration = Duration::from_millis(100);
const RATE_LIMIT_STATUS: &str = "Rate limited; pausing requests";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Topics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Adding(String),
    Renaming { index: usize, buffer: String },
}

/// Every state transition the app knows about.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Startup,
    AddTopic(String),
    RenameTopic(usize, String),
    RemoveTopic(usize),
    SelectTopic(usize),
    CycleTopic(isize),
    MoveCursor(isize),
    ShowView(View),
    OpenFocused,
    Resolved {
        generation: Generation,
        resolution: Resolution,
    },
    Tick,
    Quit,
}

/// A background pass to start: fetch `topics` under `generation`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    pub generation: Generation,
    pub topics: Vec<String>,
    pub cooldown_active: bool,
}

/// Side effects requested by [`AppState::update`], carried out by [`App`].
#[derive(Debug, Default, PartialEq)]
pub struct Effects {
    pub save_topics: bool,
    pub save_cache: bool,
    pub resolve: Option<ResolveRequest>,
    pub open_url: Option<String>,
    pub quit: bool,
}

/// All state the UI renders from. Mutated only through [`AppState::update`]
/// and the input helpers below; persistence and networking happen outside.
#[derive(Debug)]
pub struct AppState {
    pub topics: TopicStore,
    pub cache: ArticleCache,
    pub results: ResultsMap,
    pub view: View,
    pub input: InputMode,
    pub topic_cursor: usize,
    pub card_cursor: usize,
    pub status: Option<String>,
    generation: Generation,
    in_flight: Option<Generation>,
    cooldown: RateLimitCooldown,
}

impl AppState {
    pub fn new(topics: TopicStore, cache: ArticleCache, cooldown: Duration) -> Self {
        let results = resolver::results_from_cache(topics.topics(), &cache);
        Self {
            topics,
            cache,
            results,
            view: View::Home,
            input: InputMode::Normal,
            topic_cursor: 0,
            card_cursor: 0,
            status: None,
            generation: Generation::default(),
            in_flight: None,
            cooldown: RateLimitCooldown::new(cooldown),
        }
    }

    pub fn selected_articles(&self) -> Option<&[Article]> {
        self.results
            .get(self.topics.selected())
            .map(|articles| articles.as_slice())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        self.cooldown.remaining(now)
    }

    pub fn update(&mut self, action: Action, now: Instant) -> Effects {
        match action {
            Action::Startup => Effects {
                save_topics: true,
                resolve: self.begin_resolution(now),
                ..Effects::default()
            },
            Action::AddTopic(name) => {
                let changed = self.topics.add(&name);
                if changed {
                    tracing::debug!(topic = name.trim(), "topic added");
                }
                self.topics_changed(changed, now)
            }
            Action::RenameTopic(index, name) => {
                let changed = self.topics.rename(index, &name);
                if changed {
                    tracing::debug!(index, topic = %name, "topic renamed");
                }
                self.topics_changed(changed, now)
            }
            Action::RemoveTopic(index) => {
                let changed = self.topics.remove(index);
                if changed {
                    tracing::debug!(index, "topic removed");
                    self.topic_cursor = self.topic_cursor.min(self.topics.len().saturating_sub(1));
                }
                self.topics_changed(changed, now)
            }
            Action::SelectTopic(index) => {
                if self.topics.select_index(index) {
                    self.card_cursor = 0;
                }
                Effects::default()
            }
            Action::CycleTopic(offset) => {
                self.topics.cycle(offset);
                self.card_cursor = 0;
                Effects::default()
            }
            Action::MoveCursor(offset) => {
                match self.view {
                    View::Home => {
                        let len = self.selected_articles().map_or(0, |a| a.len());
                        self.card_cursor = step(self.card_cursor, offset, len);
                    }
                    View::Topics => {
                        self.topic_cursor = step(self.topic_cursor, offset, self.topics.len());
                    }
                }
                Effects::default()
            }
            Action::ShowView(view) => {
                self.view = view;
                if view == View::Topics {
                    self.topic_cursor = self.topics.selected_index().unwrap_or(0);
                }
                Effects::default()
            }
            Action::OpenFocused => {
                let url = self
                    .selected_articles()
                    .and_then(|a| a.get(self.card_cursor))
                    .and_then(|a| a.url.clone());
                Effects {
                    open_url: url,
                    ..Effects::default()
                }
            }
            Action::Resolved {
                generation,
                resolution,
            } => self.land(generation, resolution, now),
            Action::Tick => {
                // An in-flight pass must land before the window can close.
                if self.in_flight.is_none() && self.cooldown.expire(now) {
                    tracing::info!("rate limit cooldown elapsed");
                    if self.status.as_deref() == Some(RATE_LIMIT_STATUS) {
                        self.status = None;
                    }
                    return Effects {
                        resolve: self.begin_resolution(now),
                        ..Effects::default()
                    };
                }
                Effects::default()
            }
            Action::Quit => Effects {
                quit: true,
                ..Effects::default()
            },
        }
    }

    fn topics_changed(&mut self, changed: bool, now: Instant) -> Effects {
        if !changed {
            return Effects::default();
        }
        let listed = self.topics.topics();
        self.results.retain(|topic, _| listed.contains(topic));
        self.results
            .extend(resolver::results_from_cache(listed, &self.cache));
        Effects {
            save_topics: true,
            resolve: self.begin_resolution(now),
            ..Effects::default()
        }
    }

    /// Invalidate any pass in flight and, if some topics lack a cache entry,
    /// ask for a new one.
    fn begin_resolution(&mut self, now: Instant) -> Option<ResolveRequest> {
        let generation = self.generation.bump();
        let pending = resolver::pending_topics(self.topics.topics(), &self.cache);
        if pending.is_empty() {
            self.in_flight = None;
            return None;
        }
        self.in_flight = Some(generation);
        Some(ResolveRequest {
            generation,
            topics: pending,
            cooldown_active: self.cooldown.is_active(now),
        })
    }

    fn land(&mut self, generation: Generation, resolution: Resolution, now: Instant) -> Effects {
        if resolution.rate_limited {
            self.cooldown.trip(now);
            self.status = Some(RATE_LIMIT_STATUS.to_string());
        }

        if !self.generation.is_current(generation) {
            tracing::debug!(?generation, "discarding stale resolution");
            // The pass that replaced this one started before the 429 was seen;
            // supersede it with one that honors the cooldown.
            if resolution.rate_limited && self.in_flight.is_some() {
                return Effects {
                    resolve: self.begin_resolution(now),
                    ..Effects::default()
                };
            }
            return Effects::default();
        }
        self.in_flight = None;

        let save_cache = !resolution.fetched.is_empty();
        self.cache.extend(resolution.fetched);
        self.results.extend(resolution.results);
        Effects {
            save_cache,
            ..Effects::default()
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Effects {
        if key.kind != KeyEventKind::Press {
            return Effects::default();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.update(Action::Quit, now);
        }
        if self.input != InputMode::Normal {
            return self.handle_input_key(key, now);
        }

        let action = match (self.view, key.code) {
            (_, KeyCode::Char('q')) => Action::Quit,
            (_, KeyCode::Char('1')) => Action::ShowView(View::Home),
            (_, KeyCode::Char('2')) => Action::ShowView(View::Topics),
            (_, KeyCode::Up | KeyCode::Char('k')) => Action::MoveCursor(-1),
            (_, KeyCode::Down | KeyCode::Char('j')) => Action::MoveCursor(1),

            (View::Home, KeyCode::Tab | KeyCode::Right | KeyCode::Char('l')) => {
                Action::CycleTopic(1)
            }
            (View::Home, KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h')) => {
                Action::CycleTopic(-1)
            }
            (View::Home, KeyCode::Enter | KeyCode::Char('o')) => Action::OpenFocused,
            (View::Home, KeyCode::Char('t')) => Action::ShowView(View::Topics),

            (View::Topics, KeyCode::Esc) => Action::ShowView(View::Home),
            (View::Topics, KeyCode::Enter | KeyCode::Char(' ')) => {
                Action::SelectTopic(self.topic_cursor)
            }
            (View::Topics, KeyCode::Char('d') | KeyCode::Delete) => {
                Action::RemoveTopic(self.topic_cursor)
            }
            (View::Topics, KeyCode::Char('a')) => {
                self.input = InputMode::Adding(String::new());
                return Effects::default();
            }
            (View::Topics, KeyCode::Char('e')) => {
                if let Some(current) = self.topics.topics().get(self.topic_cursor) {
                    self.input = InputMode::Renaming {
                        index: self.topic_cursor,
                        buffer: current.clone(),
                    };
                }
                return Effects::default();
            }
            _ => return Effects::default(),
        };

        self.update(action, now)
    }

    fn handle_input_key(&mut self, key: KeyEvent, now: Instant) -> Effects {
        match key.code {
            KeyCode::Esc => {
                self.input = InputMode::Normal;
                Effects::default()
            }
            KeyCode::Enter => {
                let action = match std::mem::replace(&mut self.input, InputMode::Normal) {
                    InputMode::Adding(buffer) => Action::AddTopic(buffer),
                    InputMode::Renaming { index, buffer } => Action::RenameTopic(index, buffer),
                    InputMode::Normal => return Effects::default(),
                };
                self.update(action, now)
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.input_buffer_mut() {
                    buffer.pop();
                }
                Effects::default()
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.input_buffer_mut() {
                    buffer.push(c);
                }
                Effects::default()
            }
            _ => Effects::default(),
        }
    }

    fn input_buffer_mut(&mut self) -> Option<&mut String> {
        match &mut self.input {
            InputMode::Adding(buffer) | InputMode::Renaming { buffer, .. } => Some(buffer),
            InputMode::Normal => None,
        }
    }
}

fn step(current: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(offset).min(len - 1)
}

/// Completion of a background pass, sent back to the event loop.
#[derive(Debug)]
pub struct ResolveMessage {
    pub generation: Generation,
    pub resolution: Resolution,
}

/// Owns the state plus the side-effecting pieces: storage, the news
/// fetcher, and the channel that background passes report on.
pub struct App {
    state: AppState,
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn NewsFetcher>,
    tx: mpsc::UnboundedSender<ResolveMessage>,
    rx: mpsc::UnboundedReceiver<ResolveMessage>,
}

impl App {
    pub fn new(state: AppState, store: Arc<dyn KeyValueStore>, fetcher: Arc<dyn NewsFetcher>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            store,
            fetcher,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let effects = self.state.update(Action::Startup, Instant::now());
        if self.apply(effects) {
            return Ok(());
        }

        loop {
            let now = Instant::now();
            terminal.draw(|frame| ui::render(frame, &self.state, now))?;

            while let Ok(msg) = self.rx.try_recv() {
                let effects = self.state.update(
                    Action::Resolved {
                        generation: msg.generation,
                        resolution: msg.resolution,
                    },
                    Instant::now(),
                );
                self.apply(effects);
            }

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    let effects = self.state.handle_key(key, Instant::now());
                    if self.apply(effects) {
                        break;
                    }
                }
            }

            let effects = self.state.update(Action::Tick, Instant::now());
            self.apply(effects);
        }

        Ok(())
    }

    /// Carries out requested effects. Returns true when the app should exit.
    pub fn apply(&mut self, effects: Effects) -> bool {
        if effects.save_topics {
            if let Err(e) = storage::save_topics(self.store.as_ref(), self.state.topics.topics()) {
                tracing::warn!(error = %e, "failed to persist topics");
            }
        }
        if effects.save_cache {
            if let Err(e) = storage::save_cache(self.store.as_ref(), &self.state.cache) {
                tracing::warn!(error = %e, "failed to persist news cache");
            }
        }
        if let Some(request) = effects.resolve {
            self.spawn_resolution(request);
        }
        if let Some(url) = effects.open_url {
            if let Err(e) = open::that(&url) {
                tracing::warn!(url = %url, error = %e, "failed to open browser");
                self.state.status = Some(format!("Could not open {}", url));
            }
        }
        effects.quit
    }

    fn spawn_resolution(&self, request: ResolveRequest) {
        tracing::debug!(
            generation = ?request.generation,
            topics = request.topics.len(),
            "starting resolution pass"
        );
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let resolution =
                resolver::resolve_pending(fetcher.as_ref(), &request.topics, request.cooldown_active)
                    .await;
            // The receiver only disappears on shutdown.
            let _ = tx.send(ResolveMessage {
                generation: request.generation,
                resolution,
            });
        });
    }

    /// Wait for the next background pass to report and land it.
    pub async fn next_resolution(&mut self) -> Option<Effects> {
        let msg = self.rx.recv().await?;
        let effects = self.state.update(
            Action::Resolved {
                generation: msg.generation,
                resolution: msg.resolution,
            },
            Instant::now(),
        );
        Some(effects)
    }

    pub fn dispatch(&mut self, action: Action) -> bool {
        let effects = self.state.update(action, Instant::now());
        self.apply(effects)
    }
}
