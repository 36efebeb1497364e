//! Paginated list state machine.
//!
//! [`PaginatedListController`] is the single owner of the loaded entries, the
//! resume cursor and the load state. Presentation code reads snapshots or
//! subscribes to [`ListEvent`]s and drives loading through
//! [`PaginatedListController::load_initial`] and
//! [`PaginatedListController::load_next_if_needed`].

use std::{collections::HashSet, sync::Arc};

use shared::{
    domain::{CatalogEntry, EntryId},
    protocol::PageCursor,
};
use tokio::sync::{broadcast, Mutex, Notify};
use tracing::{debug, info, warn};

use crate::{
    config::DEFAULT_MAX_EMPTY_PAGES,
    error::FetchError,
    remote::{CatalogSource, PageResult},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Exhausted,
    Failed(FetchError),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone)]
pub enum ListEvent {
    LoadStateChanged(LoadState),
    EntriesAppended { appended: usize, total: usize },
    ErrorChanged(Option<String>),
    /// Always followed by `LoadStateChanged(Idle)` and `ErrorChanged(None)`.
    Reset,
}

/// Result of a single load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The request did not qualify for a fetch.
    Ignored,
    /// A page was fetched and applied.
    Applied,
    /// The fetch failed and the controller moved to `Failed`.
    Failed,
    /// The response arrived after a reset, or the fetch was cancelled.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub entries: Vec<CatalogEntry>,
    pub load_state: LoadState,
    pub cursor: PageCursor,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Initial,
    After(EntryId),
}

struct ListState {
    entries: Vec<CatalogEntry>,
    known_ids: HashSet<EntryId>,
    cursor: PageCursor,
    load_state: LoadState,
    error: Option<String>,
    generation: u64,
    consecutive_empty_pages: u32,
}

impl ListState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            known_ids: HashSet::new(),
            cursor: PageCursor::initial(),
            load_state: LoadState::Idle,
            error: None,
            generation: 0,
            consecutive_empty_pages: 0,
        }
    }

    fn accepts(&self, trigger: Trigger) -> bool {
        match trigger {
            // An empty Loaded list has no last entry to trigger from, so the
            // initial load stays available until something has been appended.
            Trigger::Initial => match self.load_state {
                LoadState::Idle | LoadState::Failed(_) => true,
                LoadState::Loaded => self.entries.is_empty(),
                LoadState::Loading | LoadState::Exhausted => false,
            },
            Trigger::After(id) => {
                matches!(self.load_state, LoadState::Loaded | LoadState::Failed(_))
                    && self.entries.last().map(|last| last.id) == Some(id)
            }
        }
    }

    /// Appends entries not seen before, in arrival order, and returns how many
    /// were added.
    fn append_unique(&mut self, entries: Vec<CatalogEntry>) -> usize {
        let before = self.entries.len();
        for entry in entries {
            if self.known_ids.insert(entry.id) {
                self.entries.push(entry);
            }
        }
        self.entries.len() - before
    }
}

pub struct PaginatedListController {
    source: Arc<dyn CatalogSource>,
    max_empty_pages: u32,
    inner: Mutex<ListState>,
    cancel: Notify,
    events: broadcast::Sender<ListEvent>,
}

impl PaginatedListController {
    pub fn new(source: Arc<dyn CatalogSource>) -> Arc<Self> {
        Self::new_with_empty_page_limit(source, DEFAULT_MAX_EMPTY_PAGES)
    }

    /// `max_empty_pages` bounds how many consecutive pages without new
    /// entries are followed before the list is treated as exhausted.
    pub fn new_with_empty_page_limit(
        source: Arc<dyn CatalogSource>,
        max_empty_pages: u32,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            source,
            max_empty_pages: max_empty_pages.max(1),
            inner: Mutex::new(ListState::new()),
            cancel: Notify::new(),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    /// Fetches the page at the current cursor when nothing has been loaded
    /// yet (including after empty pages), or retries after a failure.
    pub async fn load_initial(&self) -> LoadOutcome {
        self.load(Trigger::Initial).await
    }

    /// Fetches the next page when `trigger` is the last loaded entry.
    pub async fn load_next_if_needed(&self, trigger: &CatalogEntry) -> LoadOutcome {
        self.load(Trigger::After(trigger.id)).await
    }

    /// Drops all loaded state and returns to `Idle`. A fetch still in flight
    /// is cancelled and its response discarded.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        let generation = inner.generation.wrapping_add(1);
        *inner = ListState::new();
        inner.generation = generation;
        self.cancel.notify_waiters();
        info!(generation, "catalog list reset");
        let _ = self.events.send(ListEvent::Reset);
        let _ = self
            .events
            .send(ListEvent::LoadStateChanged(LoadState::Idle));
        let _ = self.events.send(ListEvent::ErrorChanged(None));
    }

    /// Clears the user-facing error without retrying.
    pub async fn dismiss_error(&self) {
        let mut inner = self.inner.lock().await;
        if inner.error.take().is_some() {
            let _ = self.events.send(ListEvent::ErrorChanged(None));
        }
    }

    pub async fn entries(&self) -> Vec<CatalogEntry> {
        self.inner.lock().await.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    pub async fn load_state(&self) -> LoadState {
        self.inner.lock().await.load_state.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.load_state.is_loading()
    }

    pub async fn current_error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    pub async fn cursor(&self) -> PageCursor {
        self.inner.lock().await.cursor.clone()
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let inner = self.inner.lock().await;
        ListSnapshot {
            entries: inner.entries.clone(),
            load_state: inner.load_state.clone(),
            cursor: inner.cursor.clone(),
            error: inner.error.clone(),
        }
    }

    async fn load(&self, trigger: Trigger) -> LoadOutcome {
        let cancelled;
        let (cursor, generation, resume_state) = {
            let mut inner = self.inner.lock().await;
            if !inner.accepts(trigger) {
                debug!(?trigger, state = ?inner.load_state, "load request ignored");
                return LoadOutcome::Ignored;
            }
            // Armed under the lock: any reset after this point cancels the fetch.
            cancelled = self.cancel.notified();
            let resume_state = std::mem::replace(&mut inner.load_state, LoadState::Loading);
            let _ = self
                .events
                .send(ListEvent::LoadStateChanged(LoadState::Loading));
            (inner.cursor.clone(), inner.generation, resume_state)
        };
        tokio::pin!(cancelled);

        debug!(%cursor, generation, "fetching catalog page");
        let result = tokio::select! {
            result = self.source.fetch_page(&cursor) => result,
            _ = &mut cancelled => Err(FetchError::Cancelled),
        };

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(
                %cursor,
                generation,
                current_generation = inner.generation,
                "discarding stale catalog response"
            );
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(page) => {
                self.apply_page(&mut inner, &cursor, page);
                LoadOutcome::Applied
            }
            Err(FetchError::Cancelled) => {
                debug!(%cursor, "catalog fetch cancelled");
                inner.load_state = resume_state;
                let _ = self
                    .events
                    .send(ListEvent::LoadStateChanged(inner.load_state.clone()));
                LoadOutcome::Discarded
            }
            Err(error) => {
                warn!(%cursor, %error, kept = inner.entries.len(), "catalog page fetch failed");
                let message = error.user_message();
                inner.load_state = LoadState::Failed(error);
                inner.error = Some(message.clone());
                let _ = self
                    .events
                    .send(ListEvent::LoadStateChanged(inner.load_state.clone()));
                let _ = self.events.send(ListEvent::ErrorChanged(Some(message)));
                LoadOutcome::Failed
            }
        }
    }

    fn apply_page(&self, inner: &mut ListState, requested: &PageCursor, page: PageResult) {
        let received = page.entries.len();
        let appended = inner.append_unique(page.entries);
        inner.cursor = page.next_cursor;

        if appended == 0 {
            inner.consecutive_empty_pages += 1;
        } else {
            inner.consecutive_empty_pages = 0;
        }

        inner.load_state = if !page.has_more {
            info!(page = %requested, appended, total = inner.entries.len(), "catalog exhausted");
            LoadState::Exhausted
        } else if inner.consecutive_empty_pages >= self.max_empty_pages {
            warn!(
                page = %requested,
                empty_pages = inner.consecutive_empty_pages,
                "catalog keeps returning pages without new entries; treating as exhausted"
            );
            LoadState::Exhausted
        } else {
            info!(
                page = %requested,
                received,
                appended,
                total = inner.entries.len(),
                next = %inner.cursor,
                "catalog page applied"
            );
            LoadState::Loaded
        };

        if appended > 0 {
            let _ = self.events.send(ListEvent::EntriesAppended {
                appended,
                total: inner.entries.len(),
            });
        }
        let _ = self
            .events
            .send(ListEvent::LoadStateChanged(inner.load_state.clone()));
        if inner.error.take().is_some() {
            let _ = self.events.send(ListEvent::ErrorChanged(None));
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
