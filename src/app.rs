//! Tab adapter: delivers page activity to the watcher
//!
//! A [`Tab`] owns the page and, once [`start`] has run, the watcher state.
//! Mutation records, wrapped history calls and page events are turned into
//! [`Message`]s at each checkpoint ([`Tab::pump`]), and timers fire as the
//! virtual clock moves ([`Tab::advance`]).

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::dom::{Document, MutationRecord, QueryableNode};
use crate::flags::FlagCorrector;
use crate::model::{App, Message, ScanStats};
use crate::page::{Page, PageEvent, ReadyState, Visibility};
use crate::scanner::Scanner;
use crate::update;

/// Upper bound on checkpoint rounds per pump. Contradictory labels flip
/// their flags on every round and would otherwise never settle.
pub const MAX_PUMP_ROUNDS: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("flag corrector already started on this tab")]
    AlreadyStarted,
}

pub struct Tab {
    page: Page,
    app: Option<App>,
}

impl Tab {
    pub fn new(page: Page) -> Self {
        Self { page, app: None }
    }

    /// A tab showing an already parsed document.
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        Self::new(Page::new(url, html))
    }

    /// A tab whose document is still loading.
    pub fn loading(url: impl Into<String>, html: &str) -> Self {
        Self::new(Page::loading(url, html))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn document(&self) -> &Document {
        self.page.document()
    }

    pub fn app(&self) -> Option<&App> {
        self.app.as_ref()
    }

    pub fn stats(&self) -> ScanStats {
        self.app.as_ref().map(|a| a.stats).unwrap_or_default()
    }

    pub fn is_started(&self) -> bool {
        self.app.is_some()
    }

    pub fn add_event_listener(&mut self, listener: impl FnMut(&PageEvent) + 'static) {
        self.page.add_event_listener(listener);
    }

    pub fn finish_loading(&mut self) {
        self.page.finish_loading();
        self.pump();
    }

    pub fn push_state(&mut self, url: impl Into<String>) {
        self.page.push_state(url);
        self.pump();
    }

    pub fn replace_state(&mut self, url: impl Into<String>) {
        self.page.replace_state(url);
        self.pump();
    }

    pub fn back(&mut self) {
        self.page.back();
        self.pump();
    }

    pub fn forward(&mut self) {
        self.page.forward();
        self.pump();
    }

    pub fn set_hash(&mut self, hash: &str) {
        self.page.set_hash(hash);
        self.pump();
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.page.set_visibility(visibility);
        self.pump();
    }

    /// Deliver everything queued, round after round, until nothing is left.
    ///
    /// Returns the number of rounds that delivered at least one message.
    pub fn pump(&mut self) -> usize {
        let Some(app) = self.app.as_mut() else {
            self.page.take_events();
            return 0;
        };

        let mut rounds = 0;
        loop {
            let messages = collect_messages(&mut self.page);
            if messages.is_empty() {
                break;
            }
            if rounds == MAX_PUMP_ROUNDS {
                warn!(
                    dropped = messages.len(),
                    "Page did not settle, dropping pending changes"
                );
                break;
            }
            rounds += 1;
            for message in messages {
                update::update(app, &mut self.page, message);
            }
        }
        rounds
    }

    /// Move the virtual clock forward by `by`, firing due timers in order.
    pub fn advance(&mut self, by: Duration) {
        self.pump();
        let until = self.page.now() + by;
        while let Some(id) = self.page.timers_mut().pop_due(until) {
            if let Some(app) = self.app.as_mut() {
                update::update(app, &mut self.page, Message::TimerFired(id));
            }
            self.pump();
        }
        self.page.timers_mut().advance_to(until);
    }

    /// Pump and fire timers until no work remains.
    pub fn run_until_idle(&mut self) {
        self.pump();
        while let Some(deadline) = self.page.timers().next_deadline() {
            let by = deadline.saturating_sub(self.page.now());
            self.advance(by);
        }
    }

    pub fn serialize(&self) -> std::io::Result<String> {
        self.page.document().serialize()
    }
}

fn collect_messages(page: &mut Page) -> Vec<Message> {
    let mut messages = Vec::new();
    for record in page.document().take_records() {
        match record {
            MutationRecord::ChildList { added, .. } if !added.is_empty() => {
                messages.push(Message::NodesAdded(added));
            }
            MutationRecord::ChildList { .. } => {}
            MutationRecord::Attribute { target, name } => {
                // One delivery per node and attribute per round.
                let seen = messages.iter().any(|m| {
                    matches!(m, Message::AttributeChanged { target: t, name: n }
                        if *n == name && t.is_same_node(&target))
                });
                if !seen {
                    messages.push(Message::AttributeChanged { target, name });
                }
            }
        }
    }
    messages.extend(
        page.history_mut()
            .take_calls()
            .into_iter()
            .map(Message::HistoryCalled),
    );
    messages.extend(page.take_events().into_iter().map(|event| match event {
        PageEvent::DomContentLoaded => Message::Ready,
        PageEvent::PopState => Message::PopState,
        PageEvent::HashChange => Message::HashChange,
        PageEvent::LocationChange => Message::LocationChange,
        PageEvent::VisibilityChange(v) => Message::VisibilityChanged(v),
    }));
    messages
}

/// Start the flag corrector on `tab`. Runs once per tab.
///
/// If the document is still loading, the first scan waits for
/// `DOMContentLoaded`; otherwise it runs before this returns.
pub fn start(tab: &mut Tab, config: &Config) -> Result<(), StartError> {
    if tab.app.is_some() {
        return Err(StartError::AlreadyStarted);
    }

    let corrector = FlagCorrector::new(config.icon_base_url.clone(), config.cache_bust);
    let mut app = App::new(
        Scanner::new(corrector),
        Duration::from_millis(config.debounce_ms),
    );
    info!(
        url = %tab.page.url(),
        debounce_ms = config.debounce_ms,
        cache_bust = config.cache_bust,
        "Starting flag corrector"
    );

    // Events queued before start were never listened for.
    tab.page.take_events();
    if tab.page.ready_state() == ReadyState::Loading {
        info!("Document still loading, waiting for DOMContentLoaded");
    } else {
        update::initialize(&mut app, &mut tab.page);
    }
    tab.app = Some(app);
    tab.pump();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_is_rejected() {
        let mut tab = Tab::from_html("https://site.test/", "<p>hi</p>");
        assert_eq!(start(&mut tab, &Config::default()), Ok(()));
        assert_eq!(
            start(&mut tab, &Config::default()),
            Err(StartError::AlreadyStarted)
        );
        assert_eq!(tab.stats().full_scans, 1);
    }

    #[test]
    fn pump_without_watcher_is_a_no_op() {
        let mut tab = Tab::from_html("https://site.test/", "");
        tab.set_visibility(Visibility::Hidden);
        assert_eq!(tab.pump(), 0);
        assert_eq!(tab.stats(), ScanStats::default());
    }

    #[test]
    fn run_until_idle_drains_timers() {
        let mut tab = Tab::from_html("https://site.test/", "");
        start(&mut tab, &Config::default()).unwrap();
        tab.push_state("/a");
        assert_eq!(tab.page().timers().pending(), 1);
        tab.run_until_idle();
        assert_eq!(tab.page().timers().pending(), 0);
        assert_eq!(tab.stats().full_scans, 2);
        assert_eq!(tab.page().now(), Duration::from_millis(50));
    }
}
