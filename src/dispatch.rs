//! Broadcast dispatcher.
//!
//! Delivers one message to an ordered list of groups, one at a time, with a
//! pause between sends. A failed target is recorded and the batch moves on;
//! every target ends up with exactly one outcome in the report.

use std::io;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::metrics;
use crate::weibo::{MessageSender, SendFailure, SendOutcome, SendRequest};

/// Waits between two sends.
#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn pause(&self, delay: Duration);
}

impl<T: Pacer + ?Sized> Pacer for &T {
    async fn pause(&self, delay: Duration) {
        (**self).pause(delay).await;
    }
}

/// Real-time pacing on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        sleep(delay).await;
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum DispatchEvent<'a> {
    Sending {
        index: usize,
        total: usize,
        group_id: i64,
    },
    Finished {
        index: usize,
        total: usize,
        outcome: &'a SendOutcome,
    },
    Pausing {
        delay: Duration,
    },
    Cancelled {
        remaining: usize,
    },
}

/// Outcomes of one batch, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    succeeded: usize,
    failed: usize,
    outcomes: Vec<SendOutcome>,
}

impl BatchReport {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            outcomes: Vec::with_capacity(capacity),
        }
    }

    fn record(&mut self, outcome: SendOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[SendOutcome] {
        &self.outcomes
    }

    /// Failed outcomes, in submission order.
    pub fn failures(&self) -> impl Iterator<Item = &SendOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Export one CSV row per outcome.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["gid", "status", "kind", "http_status", "detail"])?;

        for outcome in &self.outcomes {
            let gid = outcome.group_id.to_string();
            match &outcome.result {
                Ok(body) => csv.write_record([gid.as_str(), "ok", "", "", body.as_str()])?,
                Err(failure) => {
                    let http_status = failure.status.map(|s| s.to_string()).unwrap_or_default();
                    csv.write_record([
                        gid.as_str(),
                        "failed",
                        failure.kind.as_str(),
                        http_status.as_str(),
                        failure.detail.as_str(),
                    ])?
                }
            }
        }

        csv.flush()?;
        Ok(())
    }
}

/// Sequential broadcaster bound to one sender, `source` and pacing.
pub struct Dispatcher<S, P = TokioPacer> {
    sender: S,
    pacer: P,
    source: String,
    delay: Duration,
    cancel: CancellationToken,
}

impl<S: MessageSender> Dispatcher<S> {
    pub fn new(sender: S, source: impl Into<String>, delay: Duration) -> Self {
        Self {
            sender,
            pacer: TokioPacer,
            source: source.into(),
            delay,
            cancel: CancellationToken::new(),
        }
    }
}

impl<S: MessageSender, P: Pacer> Dispatcher<S, P> {
    /// Replace the pacer (tests use a recording one).
    pub fn with_pacer<Q: Pacer>(self, pacer: Q) -> Dispatcher<S, Q> {
        Dispatcher {
            sender: self.sender,
            pacer,
            source: self.source,
            delay: self.delay,
            cancel: self.cancel,
        }
    }

    /// Checked before every send; once cancelled the rest of the batch is
    /// recorded as cancelled instead of being attempted.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn dispatch(&self, targets: &[i64], message: &str) -> BatchReport {
        self.dispatch_with(targets, message, |_| {}).await
    }

    /// Like [`dispatch`](Self::dispatch), reporting progress to `on_event`.
    pub async fn dispatch_with<F>(
        &self,
        targets: &[i64],
        message: &str,
        mut on_event: F,
    ) -> BatchReport
    where
        F: FnMut(DispatchEvent<'_>),
    {
        let total = targets.len();
        let mut report = BatchReport::with_capacity(total);

        if targets.is_empty() {
            info!("No targets selected, nothing to send");
            return report;
        }

        info!(
            total,
            delay_secs = self.delay.as_secs_f64(),
            "Starting broadcast"
        );

        for (index, &group_id) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                let remaining = total - index;
                warn!(remaining, "Broadcast cancelled, skipping remaining targets");
                on_event(DispatchEvent::Cancelled { remaining });
                for &skipped in &targets[index..] {
                    report.record(SendOutcome::failure(skipped, SendFailure::cancelled()));
                }
                break;
            }

            on_event(DispatchEvent::Sending {
                index,
                total,
                group_id,
            });

            let request = SendRequest::plain(group_id, message, self.source.as_str());
            let outcome = self.sender.send(&request).await;
            metrics::record_send(outcome.kind());

            on_event(DispatchEvent::Finished {
                index,
                total,
                outcome: &outcome,
            });
            report.record(outcome);

            if index + 1 < total && !self.cancel.is_cancelled() {
                on_event(DispatchEvent::Pausing { delay: self.delay });
                self.pacer.pause(self.delay).await;
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Broadcast finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers per group id; unknown ids succeed.
    #[derive(Default)]
    struct ScriptedSender {
        failures: HashMap<i64, SendFailure>,
        calls: Mutex<Vec<SendRequest>>,
        cancel_after_first: Option<CancellationToken>,
    }

    impl ScriptedSender {
        fn failing(mut self, gid: i64, status: u16) -> Self {
            let kind = if matches!(status, 401 | 403) {
                FailureKind::Unauthorized
            } else {
                FailureKind::RequestFailed
            };
            self.failures.insert(
                gid,
                SendFailure {
                    kind,
                    status: Some(status),
                    detail: format!("HTTP {}", status),
                },
            );
            self
        }

        fn sent_ids(&self) -> Vec<i64> {
            self.calls.lock().unwrap().iter().map(|r| r.group_id).collect()
        }
    }

    impl MessageSender for ScriptedSender {
        async fn send(&self, request: &SendRequest) -> SendOutcome {
            self.calls.lock().unwrap().push(request.clone());
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            match self.failures.get(&request.group_id) {
                Some(failure) => SendOutcome::failure(request.group_id, failure.clone()),
                None => SendOutcome::success(request.group_id, "{}".to_string()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingPacer {
        pauses: Mutex<Vec<Duration>>,
    }

    impl Pacer for RecordingPacer {
        async fn pause(&self, delay: Duration) {
            self.pauses.lock().unwrap().push(delay);
        }
    }

    fn dispatcher<'a>(
        sender: &'a ScriptedSender,
        pacer: &'a RecordingPacer,
        delay: Duration,
    ) -> Dispatcher<&'a ScriptedSender, &'a RecordingPacer> {
        Dispatcher::new(sender, "209678993", delay).with_pacer(pacer)
    }

    #[tokio::test]
    async fn every_target_gets_one_outcome_in_order() {
        let sender = ScriptedSender::default().failing(20, 500);
        let pacer = RecordingPacer::default();
        let targets = [10, 20, 30, 40];

        let report = dispatcher(&sender, &pacer, Duration::ZERO)
            .dispatch(&targets, "hello")
            .await;

        assert_eq!(report.total(), targets.len());
        assert_eq!(report.succeeded() + report.failed(), targets.len());
        let ids: Vec<i64> = report.outcomes().iter().map(|o| o.group_id).collect();
        assert_eq!(ids, targets);
        assert_eq!(sender.sent_ids(), targets);
    }

    #[tokio::test]
    async fn pauses_only_between_sends() {
        let sender = ScriptedSender::default();
        let pacer = RecordingPacer::default();
        let delay = Duration::from_secs(2);

        dispatcher(&sender, &pacer, delay)
            .dispatch(&[1, 2, 3], "hello")
            .await;

        assert_eq!(sender.sent_ids().len(), 3);
        assert_eq!(*pacer.pauses.lock().unwrap(), vec![delay, delay]);
    }

    #[tokio::test]
    async fn single_target_never_pauses() {
        let sender = ScriptedSender::default();
        let pacer = RecordingPacer::default();

        let report = dispatcher(&sender, &pacer, Duration::from_secs(2))
            .dispatch(&[1], "hello")
            .await;

        assert_eq!(report.succeeded(), 1);
        assert!(pacer.pauses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_target_list_sends_nothing() {
        let sender = ScriptedSender::default();
        let pacer = RecordingPacer::default();

        let report = dispatcher(&sender, &pacer, Duration::from_secs(2))
            .dispatch(&[], "hello")
            .await;

        assert!(report.is_empty());
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 0);
        assert!(sender.sent_ids().is_empty());
        assert!(pacer.pauses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_does_not_abort_batch() {
        let sender = ScriptedSender::default().failing(1, 500);
        let pacer = RecordingPacer::default();

        let report = dispatcher(&sender, &pacer, Duration::ZERO)
            .dispatch(&[1, 2, 3], "hello")
            .await;

        assert_eq!(sender.sent_ids(), vec![1, 2, 3]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        let failed: Vec<i64> = report.failures().map(|o| o.group_id).collect();
        assert_eq!(failed, vec![1]);
    }

    #[tokio::test]
    async fn forbidden_target_is_classified_unauthorized() {
        let sender = ScriptedSender::default().failing(200, 403);
        let pacer = RecordingPacer::default();

        let report = dispatcher(&sender, &pacer, Duration::ZERO)
            .dispatch(&[100, 200], "hi")
            .await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        let failure = report.outcomes()[1].failure_ref().expect("failure");
        assert_eq!(failure.kind, FailureKind::Unauthorized);
        assert_eq!(failure.status, Some(403));
    }

    #[tokio::test]
    async fn requests_carry_message_and_source() {
        let sender = ScriptedSender::default();
        let pacer = RecordingPacer::default();

        dispatcher(&sender, &pacer, Duration::ZERO)
            .dispatch(&[5], "broadcast text")
            .await;

        let calls = sender.calls.lock().unwrap();
        assert_eq!(calls[0], SendRequest::plain(5, "broadcast text", "209678993"));
    }

    #[tokio::test]
    async fn cancellation_records_remaining_targets() {
        let token = CancellationToken::new();
        let sender = ScriptedSender {
            cancel_after_first: Some(token.clone()),
            ..Default::default()
        };
        let pacer = RecordingPacer::default();
        let mut paused = false;

        let report = dispatcher(&sender, &pacer, Duration::from_secs(60))
            .with_cancellation(token)
            .dispatch_with(&[1, 2, 3], "hello", |event| {
                if matches!(event, DispatchEvent::Pausing { .. }) {
                    paused = true;
                }
            })
            .await;

        assert_eq!(sender.sent_ids(), vec![1]);
        assert!(pacer.pauses.lock().unwrap().is_empty());
        assert!(!paused);
        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.outcomes()[1].kind(), Some(FailureKind::Cancelled));
        assert_eq!(report.outcomes()[2].kind(), Some(FailureKind::Cancelled));
    }

    #[tokio::test]
    async fn events_follow_state_machine() {
        let sender = ScriptedSender::default().failing(2, 500);
        let pacer = RecordingPacer::default();
        let mut log = Vec::new();

        dispatcher(&sender, &pacer, Duration::from_secs(1))
            .dispatch_with(&[1, 2], "hello", |event| {
                log.push(match event {
                    DispatchEvent::Sending { group_id, .. } => format!("send {}", group_id),
                    DispatchEvent::Finished { outcome, .. } => {
                        format!("done {} {}", outcome.group_id, outcome.is_success())
                    }
                    DispatchEvent::Pausing { .. } => "pause".to_string(),
                    DispatchEvent::Cancelled { remaining } => format!("cancel {}", remaining),
                })
            })
            .await;

        assert_eq!(
            log,
            vec!["send 1", "done 1 true", "pause", "send 2", "done 2 false"]
        );
    }

    #[tokio::test]
    async fn report_exports_csv() {
        let sender = ScriptedSender::default().failing(2, 403);
        let pacer = RecordingPacer::default();

        let report = dispatcher(&sender, &pacer, Duration::ZERO)
            .dispatch(&[1, 2], "hello")
            .await;

        let mut buffer = Vec::new();
        report.write_csv(&mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "gid,status,kind,http_status,detail");
        assert_eq!(lines[1], "1,ok,,,{}");
        assert_eq!(lines[2], "2,failed,unauthorized,403,HTTP 403");
    }
}
