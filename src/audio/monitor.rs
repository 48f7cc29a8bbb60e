use super::player::{lock, PlayerEvent, Session, StopReason};
use super::{AudioBackend, Track};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The track ran out and the completion was reported.
    Finished,
    /// A later `load()` or `play()` took over.
    Superseded,
    /// Output was halted on purpose.
    Stopped(StopReason),
}

/// Watches one playback attempt and reports its natural end at most once.
pub struct TrackEndMonitor {
    generation: u64,
    track: Track,
    session: Arc<Mutex<Session>>,
    backend: Arc<dyn AudioBackend>,
    interval: Duration,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl TrackEndMonitor {
    pub(crate) fn new(
        generation: u64,
        track: Track,
        session: Arc<Mutex<Session>>,
        backend: Arc<dyn AudioBackend>,
        interval: Duration,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            generation,
            track,
            session,
            backend,
            interval,
            events,
        }
    }

    pub fn spawn(self) -> JoinHandle<MonitorOutcome> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) -> MonitorOutcome {
        let outcome = loop {
            if let Some(outcome) = self.check() {
                break outcome;
            }
            tokio::time::sleep(self.interval).await;
        };

        if outcome == MonitorOutcome::Finished {
            let _ = self.events.send(PlayerEvent::TrackFinished {
                generation: self.generation,
                track: self.track.clone(),
            });
        }
        debug!(
            "Monitor for generation {} retired: {:?}",
            self.generation, outcome
        );
        outcome
    }

    /// `None` while the attempt is still live (playing or paused).
    fn check(&self) -> Option<MonitorOutcome> {
        let session = lock(&self.session);
        if session.generation != self.generation {
            return Some(MonitorOutcome::Superseded);
        }
        if let Some(reason) = session.stopped {
            return Some(MonitorOutcome::Stopped(reason));
        }
        if session.paused || self.backend.is_busy() {
            return None;
        }
        Some(MonitorOutcome::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakeBackend;

    fn monitor_for(
        generation: u64,
        session: &Arc<Mutex<Session>>,
        backend: &Arc<FakeBackend>,
    ) -> (TrackEndMonitor, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = TrackEndMonitor::new(
            generation,
            Track::new("/music/a.mp3".into()),
            Arc::clone(session),
            backend.clone(),
            Duration::from_millis(500),
            tx,
        );
        (monitor, rx)
    }

    fn session_at(generation: u64) -> Arc<Mutex<Session>> {
        Arc::new(Mutex::new(Session {
            generation,
            ..Session::default()
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn reports_finish_after_backend_drains() {
        let session = session_at(3);
        let backend = Arc::new(FakeBackend::playing());
        let (monitor, mut rx) = monitor_for(3, &session, &backend);

        let handle = monitor.spawn();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err(), "still busy, nothing to report");

        backend.finish();
        assert_eq!(handle.await.unwrap(), MonitorOutcome::Finished);
        assert!(matches!(
            rx.try_recv(),
            Ok(PlayerEvent::TrackFinished { generation: 3, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_retires_silently() {
        let session = session_at(1);
        let backend = Arc::new(FakeBackend::playing());
        let (monitor, mut rx) = monitor_for(1, &session, &backend);
        let handle = monitor.spawn();

        lock(&session).generation = 2;
        backend.finish();

        assert_eq!(handle.await.unwrap(), MonitorOutcome::Superseded);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn user_stop_is_distinguished_from_finish() {
        let session = session_at(1);
        let backend = Arc::new(FakeBackend::playing());
        let (monitor, mut rx) = monitor_for(1, &session, &backend);
        let handle = monitor.spawn();

        lock(&session).stopped = Some(StopReason::User);
        backend.finish();

        assert_eq!(
            handle.await.unwrap(),
            MonitorOutcome::Stopped(StopReason::User)
        );
        assert!(rx.try_recv().is_err());
    }
}
