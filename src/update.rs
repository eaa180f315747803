//! Watcher reactions to page activity

use tracing::{debug, info, trace};

use crate::dom::{DomNode, QueryableNode};
use crate::model::{App, Message, Phase};
use crate::page::{HistoryMethod, Page, PageEvent, Visibility};
use crate::scanner::{is_candidate, ScanOutcome};

const WRAPPED_METHODS: [HistoryMethod; 2] = [HistoryMethod::PushState, HistoryMethod::ReplaceState];

/// First full scan, then observer, then history wrapping.
///
/// The observer starts only after the scan so no mutation is missed and
/// the scan's own writes are not replayed.
pub fn initialize(app: &mut App, page: &mut Page) {
    full_scan(app, page, "initial");
    page.document().observe();

    for method in WRAPPED_METHODS {
        match page.history_mut().wrap(method) {
            Ok(()) => trace!(method = method.name(), "Wrapped history method"),
            Err(e) => debug!(error = %e, "Leaving history method unwrapped"),
        }
    }
    app.phase = Phase::Running;
    info!(
        matched = app.stats.matched,
        corrected = app.stats.corrected,
        "Flag corrector running"
    );
}

pub fn update(app: &mut App, page: &mut Page, message: Message) {
    if app.phase == Phase::WaitingForReady {
        if matches!(message, Message::Ready) {
            initialize(app, page);
        }
        return;
    }

    match message {
        Message::Ready => {}
        Message::NodesAdded(nodes) => {
            for node in nodes.iter().filter(|n| n.is_element()) {
                subtree_scan(app, node);
            }
        }
        Message::AttributeChanged { target, name } => {
            if !(name == "src" || name == "alt") || !target.has_tag("img") {
                return;
            }
            match target.nearest_ancestor_matching(|n| is_candidate(n)) {
                Some(candidate) => subtree_scan(app, &candidate),
                None => trace!(attribute = %name, "Image change outside any language option"),
            }
        }
        Message::HistoryCalled(method) => {
            debug!(method = method.name(), url = %page.url(), "History navigation");
            page.dispatch(PageEvent::LocationChange);
            schedule_rescan(app, page);
        }
        Message::PopState | Message::HashChange | Message::LocationChange => {
            schedule_rescan(app, page);
        }
        Message::VisibilityChanged(Visibility::Visible) => schedule_rescan(app, page),
        Message::VisibilityChanged(Visibility::Hidden) => {}
        Message::TimerFired(id) => {
            if app.debouncer.fire(id) {
                full_scan(app, page, "debounced");
            } else {
                trace!(?id, "Ignoring stale timer");
            }
        }
    }
}

fn schedule_rescan(app: &mut App, page: &mut Page) {
    let id = app.debouncer.schedule(page.timers_mut());
    app.stats.rescans_scheduled += 1;
    trace!(?id, window = ?app.debouncer.window(), "Rescan scheduled");
}

fn full_scan(app: &mut App, page: &Page, reason: &'static str) {
    let outcome = app.scanner.scan(&page.document().root());
    app.stats.full_scans += 1;
    record(app, outcome);
    debug!(
        reason,
        candidates = outcome.candidates,
        matched = outcome.matched,
        corrected = outcome.corrected,
        "Full document scan"
    );
}

fn subtree_scan(app: &mut App, root: &DomNode) {
    let outcome = app.scanner.scan(root);
    app.stats.subtree_scans += 1;
    record(app, outcome);
    if outcome.corrected > 0 {
        debug!(root = ?root, corrected = outcome.corrected, "Subtree scan corrected flags");
    }
}

fn record(app: &mut App, outcome: ScanOutcome) {
    app.stats.matched += outcome.matched;
    app.stats.corrected += outcome.corrected;
}
