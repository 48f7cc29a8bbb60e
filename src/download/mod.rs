// Download status shared between the background fetch worker and the Home screen.
// The worker is a real OS thread, so the record sits behind a mutex.

#[cfg(feature = "fetch")]
pub mod fetch;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DownloadState {
    #[default]
    Idle,
    Downloading,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStatus {
    pub title: String,
    pub state: DownloadState,
}

/// Single-writer, single-reader cell holding the latest download status.
#[derive(Debug, Clone, Default)]
pub struct DownloadStatusCell {
    inner: Arc<Mutex<DownloadStatus>>,
}

impl DownloadStatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, DownloadStatus> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DownloadStatus {
        self.guard().clone()
    }

    pub fn publish(&self, title: impl Into<String>, state: DownloadState) {
        let mut status = self.guard();
        status.title = title.into();
        status.state = state;
    }

    /// Go back to idle, but only if the record still describes `title`.
    /// A download that started in the meantime is left alone.
    pub fn reset_if(&self, title: &str) -> bool {
        let mut status = self.guard();
        if status.title == title && status.state != DownloadState::Downloading {
            *status = DownloadStatus::default();
            true
        } else {
            false
        }
    }
}

/// What the track list should do after a poll of the status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadUpdate {
    /// Upsert a placeholder labelled as in progress.
    Progress(String),
    /// Relabel the entry as finished.
    Completed(String),
    /// Relabel the entry as failed.
    Failed(String),
    /// Drop the badge, leaving the plain title.
    Revert(String),
    /// Remove the placeholder of a failed download.
    Remove(String),
}

impl DownloadUpdate {
    pub fn title(&self) -> &str {
        match self {
            DownloadUpdate::Progress(title)
            | DownloadUpdate::Completed(title)
            | DownloadUpdate::Failed(title)
            | DownloadUpdate::Revert(title)
            | DownloadUpdate::Remove(title) => title,
        }
    }
}

#[derive(Debug, Clone)]
struct Notice {
    title: String,
    failed: bool,
    since: Instant,
}

/// Turns periodic reads of the status record into list updates.
///
/// A finished (or failed) download keeps its notice for `hold`, then the
/// entry is restored and the record reset to idle.
///
/// Another bridge may settle and reset the record while this one is not
/// being polled. A placeholder whose outcome was never seen is settled as
/// `Remove` once the record moves on; the list keeps the entry if the file
/// made it into the library.
#[derive(Debug, Clone)]
pub struct DownloadBridge {
    cell: DownloadStatusCell,
    hold: Duration,
    notice: Option<Notice>,
    in_progress: Option<String>,
}

impl DownloadBridge {
    pub fn new(cell: DownloadStatusCell, hold: Duration) -> Self {
        Self {
            cell,
            hold,
            notice: None,
            in_progress: None,
        }
    }

    pub fn poll(&mut self, now: Instant) -> Vec<DownloadUpdate> {
        let mut updates = Vec::new();

        if let Some(notice) = &self.notice {
            if now.saturating_duration_since(notice.since) >= self.hold {
                if let Some(notice) = self.notice.take() {
                    self.cell.reset_if(&notice.title);
                    updates.push(Self::expire(notice));
                }
            }
        }

        let status = self.cell.snapshot();
        let moved_on = status.state == DownloadState::Idle
            || self
                .in_progress
                .as_deref()
                .is_some_and(|title| title != status.title);
        if moved_on {
            if let Some(title) = self.in_progress.take() {
                debug!("Missed the outcome of '{}'", title);
                updates.push(DownloadUpdate::Remove(title));
            }
        }

        match status.state {
            DownloadState::Idle => {}
            DownloadState::Downloading => {
                self.in_progress = Some(status.title.clone());
                updates.push(DownloadUpdate::Progress(status.title));
            }
            DownloadState::Complete | DownloadState::Failed => {
                self.in_progress = None;
                let failed = status.state == DownloadState::Failed;
                let already_shown = self
                    .notice
                    .as_ref()
                    .is_some_and(|n| n.title == status.title && n.failed == failed);
                if !already_shown {
                    // A second download finished while an older notice was up
                    if let Some(previous) = self.notice.take() {
                        updates.push(Self::expire(previous));
                    }
                    debug!("Download of '{}' settled (failed: {})", status.title, failed);
                    self.notice = Some(Notice {
                        title: status.title.clone(),
                        failed,
                        since: now,
                    });
                    updates.push(if failed {
                        DownloadUpdate::Failed(status.title)
                    } else {
                        DownloadUpdate::Completed(status.title)
                    });
                }
            }
        }

        updates
    }

    fn expire(notice: Notice) -> DownloadUpdate {
        if notice.failed {
            DownloadUpdate::Remove(notice.title)
        } else {
            DownloadUpdate::Revert(notice.title)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_secs(3);

    #[test]
    fn full_cycle_reverts_after_hold_and_resets_record() {
        let cell = DownloadStatusCell::new();
        let mut bridge = DownloadBridge::new(cell.clone(), HOLD);
        let t0 = Instant::now();

        assert!(bridge.poll(t0).is_empty());

        cell.publish("X.mp3", DownloadState::Downloading);
        assert_eq!(bridge.poll(t0), vec![DownloadUpdate::Progress("X.mp3".into())]);

        cell.publish("X.mp3", DownloadState::Complete);
        let t1 = t0 + Duration::from_secs(1);
        assert_eq!(bridge.poll(t1), vec![DownloadUpdate::Completed("X.mp3".into())]);
        // Still inside the hold window: nothing new
        assert!(bridge.poll(t1 + Duration::from_secs(2)).is_empty());

        assert_eq!(
            bridge.poll(t1 + HOLD),
            vec![DownloadUpdate::Revert("X.mp3".into())]
        );
        assert_eq!(cell.snapshot(), DownloadStatus::default());
        assert!(bridge.poll(t1 + HOLD * 2).is_empty());
    }

    #[test]
    fn failure_removes_placeholder() {
        let cell = DownloadStatusCell::new();
        let mut bridge = DownloadBridge::new(cell.clone(), HOLD);
        let t0 = Instant::now();

        cell.publish("bad.mp3", DownloadState::Failed);
        assert_eq!(bridge.poll(t0), vec![DownloadUpdate::Failed("bad.mp3".into())]);
        assert_eq!(bridge.poll(t0 + HOLD), vec![DownloadUpdate::Remove("bad.mp3".into())]);
    }

    #[test]
    fn newer_download_is_not_reset_by_older_notice() {
        let cell = DownloadStatusCell::new();
        let mut bridge = DownloadBridge::new(cell.clone(), HOLD);
        let t0 = Instant::now();

        cell.publish("one.mp3", DownloadState::Complete);
        bridge.poll(t0);
        cell.publish("two.mp3", DownloadState::Downloading);

        let updates = bridge.poll(t0 + HOLD);
        assert_eq!(
            updates,
            vec![
                DownloadUpdate::Revert("one.mp3".into()),
                DownloadUpdate::Progress("two.mp3".into()),
            ]
        );
        assert_eq!(cell.snapshot().state, DownloadState::Downloading);
    }

    #[test]
    fn back_to_back_completions_expire_the_older_notice() {
        let cell = DownloadStatusCell::new();
        let mut bridge = DownloadBridge::new(cell.clone(), HOLD);
        let t0 = Instant::now();

        cell.publish("one.mp3", DownloadState::Complete);
        bridge.poll(t0);
        cell.publish("two.mp3", DownloadState::Complete);

        assert_eq!(
            bridge.poll(t0 + Duration::from_secs(1)),
            vec![
                DownloadUpdate::Revert("one.mp3".into()),
                DownloadUpdate::Completed("two.mp3".into()),
            ]
        );
    }

    #[test]
    fn outcome_settled_elsewhere_still_clears_the_placeholder() {
        let cell = DownloadStatusCell::new();
        let mut idle_bridge = DownloadBridge::new(cell.clone(), HOLD);
        let t0 = Instant::now();

        cell.publish("X.mp3", DownloadState::Downloading);
        assert_eq!(idle_bridge.poll(t0), vec![DownloadUpdate::Progress("X.mp3".into())]);

        // Someone else showed the failure and reset the record
        cell.publish("X.mp3", DownloadState::Failed);
        assert!(cell.reset_if("X.mp3"));

        assert_eq!(
            idle_bridge.poll(t0 + HOLD),
            vec![DownloadUpdate::Remove("X.mp3".into())]
        );
        assert!(idle_bridge.poll(t0 + HOLD * 2).is_empty());
    }

    #[test]
    fn next_download_settles_the_unseen_one_first() {
        let cell = DownloadStatusCell::new();
        let mut bridge = DownloadBridge::new(cell.clone(), HOLD);
        let t0 = Instant::now();

        cell.publish("one.mp3", DownloadState::Downloading);
        bridge.poll(t0);
        cell.publish("two.mp3", DownloadState::Downloading);

        assert_eq!(
            bridge.poll(t0),
            vec![
                DownloadUpdate::Remove("one.mp3".into()),
                DownloadUpdate::Progress("two.mp3".into()),
            ]
        );
    }

    #[test]
    fn cell_is_shared_across_threads() {
        let cell = DownloadStatusCell::new();
        let writer = cell.clone();
        std::thread::spawn(move || writer.publish("t.mp3", DownloadState::Complete))
            .join()
            .unwrap();
        assert_eq!(cell.snapshot().state, DownloadState::Complete);
        assert!(cell.reset_if("t.mp3"));
        assert!(!cell.reset_if("t.mp3"));
    }
}
