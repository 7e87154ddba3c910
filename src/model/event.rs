//! Explorer events - observable notifications about navigation and tree changes
//!
//! The core never calls into a view. It records what happened in an
//! [`EventBroadcaster`] and whoever renders the tree or the list drains
//! the events and reacts:
//! - `explorer:current_directory_changed` once per logical change of the
//!   current directory
//! - `explorer:tree_changed` when roots or a node's children changed
//! - `explorer:navigation_state_changed` after every navigation attempt
//! - `explorer:notice` for messages meant for the user

use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Enabled state of the back/forward/up commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavigationState {
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub can_go_up: bool,
}

/// Message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum UserNotice {
    /// Informational, e.g. an operation the user cancelled
    Info(String),
    Error(String),
}

impl UserNotice {
    pub fn is_error(&self) -> bool {
        matches!(self, UserNotice::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            UserNotice::Info(m) | UserNotice::Error(m) => m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExplorerEvent {
    CurrentDirectoryChanged {
        path: PathBuf,
        /// Name of the entry to highlight in the listing, if any
        selected: Option<String>,
    },
    /// `parent: None` means the drive roots changed
    TreeChanged { parent: Option<PathBuf> },
    NavigationStateChanged(NavigationState),
    Notice(UserNotice),
}

impl ExplorerEvent {
    /// Namespaced event name
    pub fn name(&self) -> &'static str {
        match self {
            ExplorerEvent::CurrentDirectoryChanged { .. } => "explorer:current_directory_changed",
            ExplorerEvent::TreeChanged { .. } => "explorer:tree_changed",
            ExplorerEvent::NavigationStateChanged(_) => "explorer:navigation_state_changed",
            ExplorerEvent::Notice(_) => "explorer:notice",
        }
    }

    /// Check if the event name matches a pattern
    ///
    /// Patterns can use a single "*" as wildcard: "explorer:*", "*:notice"
    pub fn matches(&self, pattern: &str) -> bool {
        let name = self.name();
        if pattern == "*" {
            return true;
        }
        match pattern.split_once('*') {
            Some((prefix, suffix)) => name.starts_with(prefix) && name.ends_with(suffix),
            None => name == pattern,
        }
    }
}

/// Events kept by [`EventBroadcaster::default`] before the oldest is dropped
pub const DEFAULT_EVENT_HISTORY: usize = 1000;

/// Bounded queue of emitted events, shared by clones
///
/// When full, emitting drops the oldest event. Drops are logged at `warn`
/// and counted in [`dropped`](Self::dropped), so a consumer that falls
/// behind can tell it missed something and re-read the navigator state.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    events: Arc<Mutex<VecDeque<ExplorerEvent>>>,
    dropped: Arc<AtomicUsize>,
    max_history: usize,
}

impl EventBroadcaster {
    pub fn new(max_history: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_history))),
            dropped: Arc::new(AtomicUsize::new(0)),
            max_history,
        }
    }

    /// Events discarded so far because nobody drained the queue in time
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ExplorerEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit an event, dropping the oldest one when full
    pub fn emit(&self, event: ExplorerEvent) {
        tracing::trace!("Emitting {}", event.name());
        let mut events = self.lock();
        if events.len() >= self.max_history {
            if let Some(oldest) = events.pop_front() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Event queue full ({}), dropped {}",
                    self.max_history,
                    oldest.name()
                );
            }
        }
        events.push_back(event);
    }

    pub fn notice(&self, notice: UserNotice) {
        self.emit(ExplorerEvent::Notice(notice));
    }

    /// Check if any pending event matches the name pattern
    pub fn has_match(&self, pattern: &str) -> bool {
        self.lock().iter().any(|e| e.matches(pattern))
    }

    /// Take first event matching pattern (removes it and all events before it)
    pub fn take_match(&self, pattern: &str) -> Option<ExplorerEvent> {
        let mut events = self.lock();
        let idx = events.iter().position(|e| e.matches(pattern))?;
        let event = events.get(idx).cloned();
        events.drain(..=idx);
        event
    }

    /// Number of pending events matching the pattern
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.lock().iter().filter(|e| e.matches(pattern)).count()
    }

    pub fn drain(&self) -> Vec<ExplorerEvent> {
        self.lock().drain(..).collect()
    }

    pub fn peek(&self) -> Vec<ExplorerEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_HISTORY)
    }
}
