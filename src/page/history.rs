//! Session history with wrappable state-mutation entry points.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

/// The two history methods a single-page app navigates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryMethod {
    PushState,
    ReplaceState,
}

impl HistoryMethod {
    pub fn name(self) -> &'static str {
        match self {
            HistoryMethod::PushState => "pushState",
            HistoryMethod::ReplaceState => "replaceState",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("history.{} is not writable", .0.name())]
    NotWritable(HistoryMethod),
}

/// Entries plus the set of wrapped methods.
///
/// A wrapped method records each call so the host can notify the wrapper
/// after the original behaviour has run.
#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    index: usize,
    wrapped: HashSet<HistoryMethod>,
    locked: HashSet<HistoryMethod>,
    calls: VecDeque<HistoryMethod>,
}

impl History {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            entries: vec![initial_url.into()],
            index: 0,
            wrapped: HashSet::new(),
            locked: HashSet::new(),
            calls: VecDeque::new(),
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make `method` refuse wrapping, as a page that freezes it would.
    pub fn lock(&mut self, method: HistoryMethod) {
        self.locked.insert(method);
    }

    /// Wrap `method`. Wrapping is permanent.
    pub fn wrap(&mut self, method: HistoryMethod) -> Result<(), PatchError> {
        if self.locked.contains(&method) {
            return Err(PatchError::NotWritable(method));
        }
        self.wrapped.insert(method);
        Ok(())
    }

    pub fn is_wrapped(&self, method: HistoryMethod) -> bool {
        self.wrapped.contains(&method)
    }

    pub fn push_state(&mut self, url: impl Into<String>) {
        self.push_entry(url.into());
        self.notify(HistoryMethod::PushState);
    }

    pub fn replace_state(&mut self, url: impl Into<String>) {
        self.entries[self.index] = url.into();
        self.notify(HistoryMethod::ReplaceState);
    }

    /// Add an entry without going through a wrappable method.
    pub(crate) fn push_entry(&mut self, url: String) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    /// Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Drain calls made through wrapped methods.
    pub fn take_calls(&mut self) -> Vec<HistoryMethod> {
        self.calls.drain(..).collect()
    }

    fn notify(&mut self, method: HistoryMethod) {
        if self.wrapped.contains(&method) {
            self.calls.push_back(method);
        }
    }
}
