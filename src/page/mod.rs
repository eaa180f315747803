//! Host page model (document, history, location, visibility, timers).
//!
//! This is the environment the corrector runs against: a single-threaded
//! tab whose events are queued and delivered at the host's next checkpoint.

pub mod history;
pub mod timers;

use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

use crate::dom::Document;
pub use history::{History, HistoryMethod, PatchError};
pub use timers::{TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Events dispatched on the page's global event target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    DomContentLoaded,
    PopState,
    HashChange,
    /// Synthetic notification sent after a wrapped history call.
    LocationChange,
    VisibilityChange(Visibility),
}

type Listener = Box<dyn FnMut(&PageEvent)>;

pub struct Page {
    url: String,
    document: Document,
    history: History,
    timers: TimerQueue,
    events: VecDeque<PageEvent>,
    ready_state: ReadyState,
    visibility: Visibility,
    listeners: Vec<Listener>,
}

impl Page {
    /// A page whose document has finished parsing.
    pub fn new(url: impl Into<String>, html: &str) -> Self {
        let url = url.into();
        Self {
            history: History::new(url.clone()),
            url,
            document: Document::parse(html),
            timers: TimerQueue::default(),
            events: VecDeque::new(),
            ready_state: ReadyState::Interactive,
            visibility: Visibility::Visible,
            listeners: Vec::new(),
        }
    }

    /// A page still loading; call [`Page::finish_loading`] to fire
    /// `DOMContentLoaded`.
    pub fn loading(url: impl Into<String>, html: &str) -> Self {
        let mut page = Self::new(url, html);
        page.ready_state = ReadyState::Loading;
        page
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerQueue {
        &mut self.timers
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn finish_loading(&mut self) {
        if self.ready_state == ReadyState::Loading {
            self.ready_state = ReadyState::Interactive;
            self.dispatch(PageEvent::DomContentLoaded);
        }
    }

    pub fn push_state(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.history.push_state(self.url.clone());
    }

    pub fn replace_state(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.history.replace_state(self.url.clone());
    }

    pub fn back(&mut self) {
        if self.history.back() {
            self.url = self.history.current().to_string();
            self.dispatch(PageEvent::PopState);
        }
    }

    pub fn forward(&mut self) {
        if self.history.forward() {
            self.url = self.history.current().to_string();
            self.dispatch(PageEvent::PopState);
        }
    }

    /// Navigate to a fragment of the current URL.
    pub fn set_hash(&mut self, hash: &str) {
        let base = self.url.split('#').next().unwrap_or_default();
        let hash = hash.trim_start_matches('#');
        let url = format!("{base}#{hash}");
        if url == self.url {
            return;
        }
        self.url = url.clone();
        self.history.push_entry(url);
        self.dispatch(PageEvent::HashChange);
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        if self.visibility != visibility {
            self.visibility = visibility;
            self.dispatch(PageEvent::VisibilityChange(visibility));
        }
    }

    pub fn add_event_listener(&mut self, listener: impl FnMut(&PageEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Run listeners now and queue the event for the host checkpoint.
    pub fn dispatch(&mut self, event: PageEvent) {
        trace!(?event, "Dispatching page event");
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.events.push_back(event);
    }

    pub fn take_events(&mut self) -> Vec<PageEvent> {
        self.events.drain(..).collect()
    }
}
