//! Event dispatch: the bridge's main loop.
//!
//! # Data Flow
//! ```text
//! EventSource::next()
//!     → render (status → severity + message text)
//!     → every Notifier, in order, one POST each
//!     → failures logged, next sink still called
//!
//! next() returns None:
//!     → take_err() decides the exit status
//! ```
//!
//! # Design Decisions
//! - Sinks are called sequentially; a slow sink delays the rest
//! - An unknown status is an invariant violation and panics

use async_trait::async_trait;

use crate::consul::{HealthEvent, Status, WatchClient, WatchError};
use crate::notify::{Notifier, NotifyResult, Severity};
use crate::observability::metrics;

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub text: String,
}

/// Map an event to its severity and message.
///
/// Returns `None` for statuses the bridge cannot present.
pub fn render(event: &HealthEvent) -> Option<Notification> {
    let HealthEvent {
        node,
        service_id,
        notes,
        output,
        ..
    } = event;

    let (severity, text) = match &event.status {
        Status::Passing => (
            Severity::Good,
            format!("[{node}] {service_id} is back to normal\nNotes: {notes}\nOutput: {output}"),
        ),
        Status::Warning => (
            Severity::Warning,
            format!("[{node}] {service_id} is having problems\nNotes: {notes}\nOutput: {output}"),
        ),
        Status::Critical => (
            Severity::Danger,
            format!("[{node}] {service_id} is critical\nNotes: {notes}\nOutput: {output}"),
        ),
        Status::Maintenance => (
            Severity::Message,
            format!("[{node}] {service_id} is under maintenance\nNotes: {notes}"),
        ),
        Status::Unknown(_) => return None,
    };

    Some(Notification { severity, text })
}

/// Producer of health events, consumed one at a time.
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` when the stream has ended.
    async fn next(&mut self) -> Option<HealthEvent>;

    /// Why the stream ended; `None` means a clean shutdown.
    fn take_err(&mut self) -> Option<WatchError>;
}

#[async_trait]
impl EventSource for WatchClient {
    async fn next(&mut self) -> Option<HealthEvent> {
        WatchClient::next(self).await
    }

    fn take_err(&mut self) -> Option<WatchError> {
        WatchClient::take_err(self)
    }
}

/// Outcome of fanning one event out to every sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans events out to every configured sink.
pub struct Dispatcher {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Deliver one event to every sink.
    ///
    /// # Panics
    /// If the event carries a status outside the known set.
    pub async fn dispatch(&self, event: &HealthEvent) -> DispatchReport {
        metrics::record_event(event.status.as_str());

        let Some(notification) = render(event) else {
            panic!("unknown status {:?}", event.status.as_str());
        };

        let mut report = DispatchReport::default();
        for notifier in &self.notifiers {
            match deliver(notifier.as_ref(), &notification).await {
                Ok(()) => {
                    report.delivered += 1;
                    metrics::record_notification(notifier.name(), true);
                }
                Err(e) => {
                    report.failed += 1;
                    metrics::record_notification(notifier.name(), false);
                    tracing::error!(
                        sink = notifier.name(),
                        node = %event.node,
                        service_id = %event.service_id,
                        status = %event.status,
                        error = %e,
                        "Failed to deliver notification"
                    );
                }
            }
        }
        report
    }

    /// Pump events from `source` until it ends.
    ///
    /// Returns the source's terminal error, or `Ok(())` on clean shutdown.
    pub async fn run<S: EventSource + ?Sized>(&self, source: &mut S) -> Result<(), WatchError> {
        tracing::info!(sinks = self.notifiers.len(), "Dispatcher running");

        while let Some(event) = source.next().await {
            tracing::info!(
                node = %event.node,
                service_id = %event.service_id,
                status = %event.status,
                "Health status changed"
            );
            self.dispatch(&event).await;
        }

        match source.take_err() {
            Some(e) => Err(e),
            None => {
                tracing::info!("Dispatcher stopped");
                Ok(())
            }
        }
    }
}

async fn deliver(notifier: &dyn Notifier, notification: &Notification) -> NotifyResult<()> {
    let text = notification.text.as_str();
    match notification.severity {
        Severity::Good => notifier.good(text).await,
        Severity::Warning => notifier.warning(text).await,
        Severity::Danger => notifier.danger(text).await,
        Severity::Message => notifier.message(text).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<(String, Severity, String)>>>;

    struct Recording {
        name: &'static str,
        fail: bool,
        calls: Calls,
    }

    impl Recording {
        fn record(&self, severity: Severity, message: &str) -> NotifyResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((self.name.to_string(), severity, message.to_string()));
            if self.fail {
                Err(NotifyError::Status {
                    status: 500,
                    body: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &str {
            self.name
        }

        async fn good(&self, message: &str) -> NotifyResult<()> {
            self.record(Severity::Good, message)
        }

        async fn warning(&self, message: &str) -> NotifyResult<()> {
            self.record(Severity::Warning, message)
        }

        async fn danger(&self, message: &str) -> NotifyResult<()> {
            self.record(Severity::Danger, message)
        }

        async fn message(&self, message: &str) -> NotifyResult<()> {
            self.record(Severity::Message, message)
        }
    }

    struct FakeSource {
        events: VecDeque<HealthEvent>,
        err: Option<WatchError>,
    }

    #[async_trait]
    impl EventSource for FakeSource {
        async fn next(&mut self) -> Option<HealthEvent> {
            self.events.pop_front()
        }

        fn take_err(&mut self) -> Option<WatchError> {
            self.err.take()
        }
    }

    fn event(status: Status) -> HealthEvent {
        HealthEvent {
            node: "node1".into(),
            service_id: "web".into(),
            status,
            notes: "timeout".into(),
            output: "curl failed".into(),
        }
    }

    fn dispatcher(fail_first: bool) -> (Dispatcher, Calls) {
        let calls: Calls = Arc::default();
        let sinks: Vec<Box<dyn Notifier>> = vec![
            Box::new(Recording {
                name: "a",
                fail: fail_first,
                calls: calls.clone(),
            }),
            Box::new(Recording {
                name: "b",
                fail: false,
                calls: calls.clone(),
            }),
        ];
        (Dispatcher::new(sinks), calls)
    }

    #[test]
    fn test_render_critical_example() {
        let n = render(&event(Status::Critical)).unwrap();
        assert_eq!(n.severity, Severity::Danger);
        assert_eq!(n.text, "[node1] web is critical\nNotes: timeout\nOutput: curl failed");
    }

    #[test]
    fn test_render_severity_mapping() {
        let cases = [
            (
                Status::Passing,
                Severity::Good,
                "[node1] web is back to normal\nNotes: timeout\nOutput: curl failed",
            ),
            (
                Status::Warning,
                Severity::Warning,
                "[node1] web is having problems\nNotes: timeout\nOutput: curl failed",
            ),
            (
                Status::Critical,
                Severity::Danger,
                "[node1] web is critical\nNotes: timeout\nOutput: curl failed",
            ),
            (
                Status::Maintenance,
                Severity::Message,
                "[node1] web is under maintenance\nNotes: timeout",
            ),
        ];
        for (status, severity, text) in cases {
            let n = render(&event(status)).unwrap();
            assert_eq!(n.severity, severity);
            assert_eq!(n.text, text);
        }
    }

    #[test]
    fn test_maintenance_omits_output() {
        let n = render(&event(Status::Maintenance)).unwrap();
        assert_eq!(n.text, "[node1] web is under maintenance\nNotes: timeout");
        assert!(!n.text.contains("Output"));
        assert!(!n.text.contains("curl failed"));
    }

    #[test]
    fn test_render_unknown_is_none() {
        assert!(render(&event(Status::Unknown("degraded".into()))).is_none());
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_every_sink() {
        let (d, calls) = dispatcher(false);
        let report = d.dispatch(&event(Status::Critical)).await;
        assert_eq!(report, DispatchReport { delivered: 2, failed: 0 });

        let calls = calls.lock().unwrap();
        let expected = "[node1] web is critical\nNotes: timeout\nOutput: curl failed";
        assert_eq!(
            *calls,
            vec![
                ("a".to_string(), Severity::Danger, expected.to_string()),
                ("b".to_string(), Severity::Danger, expected.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let (d, calls) = dispatcher(true);
        let report = d.dispatch(&event(Status::Passing)).await;
        assert_eq!(report, DispatchReport { delivered: 1, failed: 1 });

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "b");
        assert_eq!(calls[1].1, Severity::Good);
    }

    #[tokio::test]
    #[should_panic(expected = "unknown status")]
    async fn test_unknown_status_panics() {
        let (d, _) = dispatcher(false);
        d.dispatch(&event(Status::Unknown("degraded".into()))).await;
    }

    #[tokio::test]
    async fn test_run_drains_source_and_reports_clean_exit() {
        let (d, calls) = dispatcher(true);
        let mut source = FakeSource {
            events: VecDeque::from(vec![event(Status::Warning), event(Status::Maintenance)]),
            err: None,
        };

        assert!(d.run(&mut source).await.is_ok());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3].1, Severity::Message);
    }

    #[tokio::test]
    async fn test_run_surfaces_terminal_error() {
        let (d, _) = dispatcher(false);
        let mut source = FakeSource {
            events: VecDeque::new(),
            err: Some(WatchError::MissingIndex),
        };

        let err = d.run(&mut source).await.unwrap_err();
        assert!(matches!(err, WatchError::MissingIndex));
    }
}
