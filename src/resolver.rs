//! Decides, per topic, whether to serve cached articles or hit the network,
//! and merges the outcomes into a topic-to-articles map.

use crate::feeds::{Article, FetchError, NewsFetcher};
use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

/// Topic to its most recently resolved articles.
pub type ResultsMap = BTreeMap<String, Vec<Article>>;

/// Persisted form of [`ResultsMap`]. Entries never expire on their own.
pub type ArticleCache = ResultsMap;

pub const RATE_LIMIT_TITLE: &str = "Rate limit exceeded";
pub const RATE_LIMIT_DESCRIPTION: &str = "Please wait before making another request.";
pub const NO_RESULTS_TITLE: &str = "No results";
pub const NO_RESULTS_DESCRIPTION: &str = "No news found for this topic.";
pub const ERROR_TITLE: &str = "Error";
pub const ERROR_DESCRIPTION: &str = "Failed to fetch news.";

pub fn rate_limited() -> Vec<Article> {
    vec![Article::placeholder(RATE_LIMIT_TITLE, RATE_LIMIT_DESCRIPTION)]
}

pub fn no_results() -> Vec<Article> {
    vec![Article::placeholder(NO_RESULTS_TITLE, NO_RESULTS_DESCRIPTION)]
}

pub fn fetch_failed() -> Vec<Article> {
    vec![Article::placeholder(ERROR_TITLE, ERROR_DESCRIPTION)]
}

/// Turn a search outcome into what the view shows. Failures never escape
/// as errors; they become a single placeholder entry.
pub fn classify(topic: &str, outcome: Result<Vec<Article>, FetchError>) -> Vec<Article> {
    match outcome {
        Ok(articles) if articles.is_empty() => {
            tracing::info!(topic, "no articles found");
            no_results()
        }
        Ok(articles) => articles,
        Err(FetchError::RateLimited) => {
            tracing::warn!(topic, "news search rate limited");
            rate_limited()
        }
        Err(e) => {
            tracing::warn!(topic, error = %e, "news search failed");
            fetch_failed()
        }
    }
}

/// Resolve every topic in order, one request at a time.
///
/// Cached topics are reused verbatim; everything else is fetched once and
/// written to both the returned map and the returned cache.
pub async fn resolve_all(
    fetcher: &dyn NewsFetcher,
    topics: &[String],
    cache: &ArticleCache,
) -> (ResultsMap, ArticleCache) {
    let mut results = ResultsMap::new();
    let mut updated = cache.clone();

    for topic in topics {
        if let Some(cached) = updated.get(topic) {
            results.insert(topic.clone(), cached.clone());
            continue;
        }
        let articles = classify(topic, fetcher.search(topic).await);
        results.insert(topic.clone(), articles.clone());
        updated.insert(topic.clone(), articles);
    }

    (results, updated)
}

/// Distinct topics, in list order, that have no cache entry yet.
pub fn pending_topics(topics: &[String], cache: &ArticleCache) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for topic in topics {
        if !cache.contains_key(topic) && seen.insert(topic.as_str()) {
            pending.push(topic.clone());
        }
    }
    pending
}

/// Map of every listed topic that already has a cache entry.
pub fn results_from_cache(topics: &[String], cache: &ArticleCache) -> ResultsMap {
    topics
        .iter()
        .filter_map(|t| cache.get(t).map(|a| (t.clone(), a.clone())))
        .collect()
}

/// Outcome of one background resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Articles for every topic the pass looked at, placeholders included.
    pub results: ResultsMap,
    /// Entries to merge into the cache. Rate-limited topics are left out so
    /// they are fetched again after the cooldown.
    pub fetched: ArticleCache,
    /// A 429 was seen during this pass.
    pub rate_limited: bool,
}

/// Fetch `pending` topics sequentially, honoring the rate-limit cooldown.
///
/// Once a 429 arrives (or if `cooldown_active` is already set) no further
/// requests are issued; the remaining topics get the rate-limit placeholder.
pub async fn resolve_pending(
    fetcher: &dyn NewsFetcher,
    pending: &[String],
    cooldown_active: bool,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut suppressed = cooldown_active;

    for topic in pending {
        if suppressed {
            resolution.results.insert(topic.clone(), rate_limited());
            continue;
        }

        let outcome = fetcher.search(topic).await;
        if matches!(outcome, Err(FetchError::RateLimited)) {
            suppressed = true;
            resolution.rate_limited = true;
        }

        let articles = classify(topic, outcome);
        if !suppressed {
            resolution.fetched.insert(topic.clone(), articles.clone());
        }
        resolution.results.insert(topic.clone(), articles);
    }

    resolution
}

/// Monotonic token attached to each resolution pass. Only the pass started
/// under the latest generation may land its results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn bump(&mut self) -> Generation {
        self.0 += 1;
        *self
    }

    pub fn is_current(&self, token: Generation) -> bool {
        *self == token
    }
}

/// Fixed window during which no new searches are issued after a 429.
/// Lives only in memory.
#[derive(Debug, Clone)]
pub struct RateLimitCooldown {
    window: Duration,
    until: Option<Instant>,
}

impl RateLimitCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            until: None,
        }
    }

    pub fn trip(&mut self, now: Instant) {
        self.until = Some(now + self.window);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Clears an elapsed window. Returns true exactly once per expiry.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.until {
            Some(until) if now >= until => {
                self.until = None;
                true
            }
            _ => false,
        }
    }
}
