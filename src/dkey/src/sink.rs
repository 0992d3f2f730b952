//! Diagnostic channel for deprecation notices.
//!
//! Mappings emit into a [`WarningSink`]. Tests usually hand a
//! [`RecordingSink`] to [`DeprecatedKeys::with_sink`](crate::DeprecatedKeys::with_sink);
//! production code can rely on the process-wide sink, which defaults to
//! [`TracingSink`] behind the built-in [`WarningFilter`].

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::{error, warn};

use crate::descriptor::Severity;
use crate::filter::{WarningAction, WarningFilter};
use crate::notice::DeprecationNotice;

/// Receiver of deprecation notices.
pub trait WarningSink: Send + Sync {
    fn emit(&self, notice: &DeprecationNotice);
}

impl<S: WarningSink + ?Sized> WarningSink for Arc<S> {
    fn emit(&self, notice: &DeprecationNotice) {
        (**self).emit(notice);
    }
}

/// Emits notices as `tracing` events on target `dkey::deprecation`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn emit(&self, notice: &DeprecationNotice) {
        if notice.escalated {
            error!(
                target: "dkey::deprecation",
                category = %notice.severity,
                key = %notice.key,
                "{}",
                notice.message
            );
        } else {
            warn!(
                target: "dkey::deprecation",
                category = %notice.severity,
                key = %notice.key,
                "{}",
                notice.message
            );
        }
    }
}

/// Keeps every notice in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<DeprecationNotice>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded notices.
    pub fn notices(&self) -> Vec<DeprecationNotice> {
        self.notices.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .map(|notice| notice.message.clone())
            .collect()
    }

    /// Number of recorded notices of one category.
    pub fn count_for(&self, severity: &Severity) -> usize {
        self.notices
            .lock()
            .iter()
            .filter(|notice| &notice.severity == severity)
            .count()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }

    /// Drain the recorded notices.
    pub fn take(&self) -> Vec<DeprecationNotice> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl WarningSink for RecordingSink {
    fn emit(&self, notice: &DeprecationNotice) {
        self.notices.lock().push(notice.clone());
    }
}

/// Applies a [`WarningFilter`] before forwarding to another sink.
#[derive(Debug)]
pub struct FilteredSink<S> {
    inner: S,
    filter: WarningFilter,
    /// `(category, message)` pairs already forwarded under [`WarningAction::Once`].
    seen: Mutex<HashSet<(String, String)>>,
}

impl<S> FilteredSink<S> {
    pub fn new(inner: S, filter: WarningFilter) -> Self {
        Self {
            inner,
            filter,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn filter(&self) -> &WarningFilter {
        &self.filter
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Forget which notices were already shown once.
    pub fn reset_seen(&self) {
        self.seen.lock().clear();
    }
}

impl<S: WarningSink> WarningSink for FilteredSink<S> {
    fn emit(&self, notice: &DeprecationNotice) {
        match self.filter.action_for(&notice.severity) {
            WarningAction::Ignore => {}
            WarningAction::Once => {
                let first = self
                    .seen
                    .lock()
                    .insert((notice.severity.to_string(), notice.message.clone()));
                if first {
                    self.inner.emit(notice);
                }
            }
            WarningAction::Error => self.inner.emit(&notice.clone().escalate()),
            WarningAction::Always | WarningAction::Default => self.inner.emit(notice),
        }
    }
}

static GLOBAL_SINK: Lazy<RwLock<Arc<dyn WarningSink>>> =
    Lazy::new(|| RwLock::new(default_global_sink()));

fn default_global_sink() -> Arc<dyn WarningSink> {
    Arc::new(FilteredSink::new(TracingSink, WarningFilter::default()))
}

/// The sink currently installed for the whole process.
pub fn global_sink() -> Arc<dyn WarningSink> {
    GLOBAL_SINK.read().clone()
}

/// Install a process-wide sink, returning the previous one.
pub fn set_global_sink(sink: Arc<dyn WarningSink>) -> Arc<dyn WarningSink> {
    std::mem::replace(&mut *GLOBAL_SINK.write(), sink)
}

/// Restore the default process-wide sink.
pub fn reset_global_sink() {
    *GLOBAL_SINK.write() = default_global_sink();
}

/// Handle to the process-wide sink.
///
/// Resolves the installed sink at emission time, so mappings built before
/// [`set_global_sink`] follow the new sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalSink;

impl WarningSink for GlobalSink {
    fn emit(&self, notice: &DeprecationNotice) {
        // Clone out of the lock so a sink may reinstall itself.
        let sink = global_sink();
        sink.emit(notice);
    }
}
