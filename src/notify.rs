//! User-facing notifications.

use std::sync::Mutex;

use tracing::{info, warn};

/// Where progress messages and failure alerts go.
pub trait Notifier {
    /// Informational progress message.
    fn notify(&self, msg: &str);
    /// A failure the user must see.
    fn alert(&self, msg: &str);
}

/// Logs through `tracing`; alerts are also printed to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, msg: &str) {
        info!("{}", msg);
    }

    fn alert(&self, msg: &str) {
        warn!("{}", msg);
        eprintln!("{}", msg);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Alert(String),
}

/// Keeps every message, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Alert(msg) => Some(msg),
                Notice::Info(_) => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, msg: &str) {
        self.push(Notice::Info(msg.to_string()));
    }

    fn alert(&self, msg: &str) {
        self.push(Notice::Alert(msg.to_string()));
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, msg: &str) {
        (**self).notify(msg)
    }

    fn alert(&self, msg: &str) {
        (**self).alert(msg)
    }
}
