//! Domain model for the watcher state

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dom::DomNode;
use crate::page::{HistoryMethod, TimerId, Visibility};
use crate::scanner::Scanner;
use crate::scheduler::Debouncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Started before `DOMContentLoaded`; everything but `Ready` is ignored.
    WaitingForReady,
    Running,
}

#[derive(Debug, Clone)]
pub enum Message {
    Ready,
    NodesAdded(Vec<DomNode>),
    AttributeChanged { target: DomNode, name: String },
    HistoryCalled(HistoryMethod),
    PopState,
    HashChange,
    LocationChange,
    VisibilityChanged(Visibility),
    TimerFired(TimerId),
}

/// Running totals, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub full_scans: usize,
    pub subtree_scans: usize,
    pub rescans_scheduled: usize,
    pub matched: usize,
    pub corrected: usize,
}

/// Watcher state owned by a tab once the corrector has started.
#[derive(Debug)]
pub struct App {
    pub phase: Phase,
    pub scanner: Scanner,
    pub debouncer: Debouncer,
    pub stats: ScanStats,
}

impl App {
    pub fn new(scanner: Scanner, debounce: Duration) -> Self {
        Self {
            phase: Phase::WaitingForReady,
            scanner,
            debouncer: Debouncer::new(debounce),
            stats: ScanStats::default(),
        }
    }
}
