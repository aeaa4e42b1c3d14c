//! Live, debounced search over the merged records.
//!
//! [`RecordsSearch`] keeps an in-memory snapshot of the repository, replaces
//! it wholesale on every change signal, and filters it against the current
//! free-text query and structured filters. Query input is debounced
//! (trailing edge); filter changes apply immediately.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{Record, RecordKind};
use crate::repository::RecordsRepository;
use crate::store::Subscription;

/// Quiet period before a query edit takes effect.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(120);

/// Structured filters; `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub kind: Option<RecordKind>,
    /// Exact `dateISO` match (YYYY-MM-DD).
    pub date: Option<String>,
}

impl SearchFilters {
    pub fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Lowercased whitespace-separated tokens of a query.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Text a query is matched against: kind, type, notes, date, unit, value
/// and duration, space-joined and lowercased. Fields a record does not
/// have contribute an empty string.
pub fn search_text(record: &Record) -> String {
    let (unit, value, duration) = match record {
        Record::Activity(a) => (String::new(), String::new(), a.duration.to_string()),
        Record::Metric(m) => (m.unit.clone(), m.value.to_string(), String::new()),
    };

    format!(
        "{} {} {} {} {} {} {}",
        record.kind(),
        record.type_name(),
        record.notes(),
        record.date_iso(),
        unit,
        value,
        duration
    )
    .to_lowercase()
}

/// True when the record passes the filters and contains every token as a
/// substring of its search text.
pub fn matches(record: &Record, tokens: &[String], filters: &SearchFilters) -> bool {
    if filters.kind.is_some_and(|kind| kind != record.kind()) {
        return false;
    }
    if filters
        .date
        .as_deref()
        .is_some_and(|date| date != record.date_iso())
    {
        return false;
    }
    if tokens.is_empty() {
        return true;
    }

    let haystack = search_text(record);
    tokens.iter().all(|token| haystack.contains(token.as_str()))
}

/// Applies a query and filters to a snapshot, keeping snapshot order.
pub fn filter_records(all: &[Record], query: &str, filters: &SearchFilters) -> Vec<Record> {
    let tokens = tokenize(query);
    all.iter()
        .filter(|record| matches(record, &tokens, filters))
        .cloned()
        .collect()
}

struct SearchState {
    query: String,
    /// Query value the results are computed from.
    debounced: String,
    filters: SearchFilters,
    all: Vec<Record>,
    loading: bool,
    /// Cleared on teardown; completions arriving later are dropped.
    alive: bool,
    /// Token of the most recently issued fetch.
    issued: u64,
    /// Token of the fetch whose rows are in `all`.
    applied: u64,
    debounce: Option<JoinHandle<()>>,
}

impl SearchState {
    fn new() -> Self {
        Self {
            query: String::new(),
            debounced: String::new(),
            filters: SearchFilters::default(),
            all: Vec::new(),
            loading: true,
            alive: true,
            issued: 0,
            applied: 0,
            debounce: None,
        }
    }
}

/// Shared pieces the background tasks need.
struct Shared<R> {
    repo: Weak<R>,
    state: Arc<Mutex<SearchState>>,
    revision: Arc<watch::Sender<u64>>,
    runtime: Handle,
}

impl<R> Clone for Shared<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Weak::clone(&self.repo),
            state: Arc::clone(&self.state),
            revision: Arc::clone(&self.revision),
            runtime: self.runtime.clone(),
        }
    }
}

impl<R: RecordsRepository + 'static> Shared<R> {
    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Issues a new fetch token and re-reads the repository in the background.
    fn spawn_fetch(&self) {
        let token = {
            let mut state = self.state.lock();
            state.issued += 1;
            state.issued
        };

        let shared = self.clone();
        self.runtime.spawn(async move {
            let Some(repo) = shared.repo.upgrade() else {
                return;
            };
            let rows = repo.get_all().await;
            drop(repo);
            shared.apply(token, rows);
        });
    }

    fn apply(&self, token: u64, rows: Vec<Record>) {
        {
            let mut state = self.state.lock();
            if !state.alive {
                tracing::debug!("Search torn down, dropping fetch #{}", token);
                return;
            }
            if token < state.applied {
                tracing::warn!(
                    "Dropping stale fetch #{} (already showing #{})",
                    token,
                    state.applied
                );
                return;
            }
            tracing::debug!("Applying fetch #{} with {} record(s)", token, rows.len());
            state.all = rows;
            state.applied = token;
            state.loading = false;
        }
        self.bump();
    }
}

/// Search engine bound to one repository.
///
/// Must be created inside a tokio runtime. Dropping it tears it down: the
/// repository subscription is released, any pending debounce is cancelled
/// and fetches still in flight are discarded when they complete.
pub struct RecordsSearch<R: RecordsRepository + 'static> {
    shared: Shared<R>,
    debounce_delay: Duration,
    _repo: Arc<R>,
    _subscription: Subscription,
}

impl<R: RecordsRepository + 'static> RecordsSearch<R> {
    /// Starts the initial load and subscribes to repository changes.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(repo: Arc<R>, debounce_delay: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        let shared = Shared {
            repo: Arc::downgrade(&repo),
            state: Arc::new(Mutex::new(SearchState::new())),
            revision: Arc::new(revision),
            runtime: Handle::current(),
        };

        shared.spawn_fetch();

        let on_change = shared.clone();
        let subscription = repo.subscribe(Box::new(move || on_change.spawn_fetch()));

        Self {
            shared,
            debounce_delay,
            _repo: repo,
            _subscription: subscription,
        }
    }

    pub fn with_default_debounce(repo: Arc<R>) -> Self {
        Self::new(repo, DEFAULT_DEBOUNCE)
    }

    /// Records the raw query and (re)arms the debounce timer.
    ///
    /// Only the value from the last call within the quiet period reaches
    /// the results.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut state = self.shared.state.lock();
        state.query = query.clone();
        if let Some(pending) = state.debounce.take() {
            pending.abort();
        }

        let shared = self.shared.clone();
        let delay = self.debounce_delay;
        state.debounce = Some(self.shared.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = shared.state.lock();
                if !state.alive {
                    return;
                }
                state.debounced = query;
                state.debounce = None;
            }
            shared.bump();
        }));
    }

    /// Raw query as last typed.
    pub fn query(&self) -> String {
        self.shared.state.lock().query.clone()
    }

    /// Query the current results were computed from.
    pub fn debounced_query(&self) -> String {
        self.shared.state.lock().debounced.clone()
    }

    pub fn set_filters(&self, filters: SearchFilters) {
        self.shared.state.lock().filters = filters;
        self.shared.bump();
    }

    pub fn filters(&self) -> SearchFilters {
        self.shared.state.lock().filters.clone()
    }

    /// Snapshot records passing the debounced query and the filters.
    pub fn results(&self) -> Vec<Record> {
        let state = self.shared.state.lock();
        if state.all.is_empty() {
            return Vec::new();
        }
        filter_records(&state.all, &state.debounced, &state.filters)
    }

    /// True until the initial load has been applied.
    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().loading
    }

    /// Size of the unfiltered snapshot.
    pub fn all_count(&self) -> usize {
        self.shared.state.lock().all.len()
    }

    /// Receiver bumped whenever something that feeds `results` changes.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Waits until the initial load has been applied.
    pub async fn loaded(&self) {
        let mut changes = self.changes();
        while self.is_loading() {
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Waits until the initial load has been applied and the debounced
    /// query has caught up with the raw one.
    pub async fn settled(&self) {
        let mut changes = self.changes();
        loop {
            {
                let state = self.shared.state.lock();
                if !state.loading && state.debounced == state.query {
                    return;
                }
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }
}

impl<R: RecordsRepository + 'static> Drop for RecordsSearch<R> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.alive = false;
        if let Some(pending) = state.debounce.take() {
            pending.abort();
        }
    }
}
