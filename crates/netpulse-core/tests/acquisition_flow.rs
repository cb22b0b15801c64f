//! End-to-end acquisition flows over scripted fakes: manual submission,
//! partial batch commits, continuous monitoring, and session expiry.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::block_on;
use netpulse_core::api::{AnalysisPoint, AnalysisReport, CredentialProvider, TelemetryApi};
use netpulse_core::controller::{AcquisitionController, TimerFactory, HISTORY_LIMIT};
use netpulse_core::error::{ApiError, TelemetryError};
use netpulse_core::sample::{MetricField, MetricPreset, MetricReading};

/// Replays a scripted outcome per submission and records what was sent.
#[derive(Clone, Default)]
struct ScriptedApi {
    script: Rc<RefCell<VecDeque<Result<(), ApiError>>>>,
    sent: Rc<RefCell<Vec<MetricReading>>>,
    analysis: Rc<RefCell<Option<Result<AnalysisReport, ApiError>>>>,
}

impl ScriptedApi {
    fn push_outcome(&self, outcome: Result<(), ApiError>) {
        self.script.borrow_mut().push_back(outcome);
    }

    fn sent(&self) -> Vec<MetricReading> {
        self.sent.borrow().clone()
    }
}

impl TelemetryApi for ScriptedApi {
    async fn submit_reading(&self, token: &str, reading: &MetricReading) -> Result<(), ApiError> {
        assert_eq!(token, "tok-1");
        let outcome = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(()));
        if outcome.is_ok() {
            self.sent.borrow_mut().push(*reading);
        }
        outcome
    }

    async fn analyze(&self, token: &str, data: &[f64]) -> Result<AnalysisReport, ApiError> {
        assert_eq!(token, "tok-1");
        self.analysis.borrow_mut().take().unwrap_or_else(|| {
            Ok(AnalysisReport {
                results: data
                    .iter()
                    .map(|&value| AnalysisPoint {
                        value,
                        similarity: 1.0,
                        anomaly: false,
                    })
                    .collect(),
                average_similarity: 1.0,
                total_anomalies: 0,
                data_points_analyzed: data.len() as u32,
            })
        })
    }
}

struct FixedToken(Option<&'static str>);

impl CredentialProvider for FixedToken {
    fn token(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

/// Records armed periods; the returned handle flips a flag on drop so
/// tests can observe cancellation.
#[derive(Clone, Default)]
struct RecordingTimers {
    periods: Rc<RefCell<Vec<Duration>>>,
    cancelled: Rc<Cell<u32>>,
}

struct TimerHandle(Rc<Cell<u32>>);

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

impl TimerFactory for RecordingTimers {
    type Handle = TimerHandle;

    fn every(&self, period: Duration, _tick: Box<dyn FnMut()>) -> Self::Handle {
        self.periods.borrow_mut().push(period);
        TimerHandle(self.cancelled.clone())
    }
}

type Controller = AcquisitionController<ScriptedApi, FixedToken, RecordingTimers>;

fn controller() -> (Controller, ScriptedApi, RecordingTimers) {
    let api = ScriptedApi::default();
    let timers = RecordingTimers::default();
    let c = AcquisitionController::new(api.clone(), FixedToken(Some("tok-1")), timers.clone());
    (c, api, timers)
}

fn fill_form(c: &mut Controller) {
    c.validate_field(MetricField::Latency, "45.5");
    c.validate_field(MetricField::Bandwidth, "100.2");
    c.validate_field(MetricField::PacketLoss, "0.5");
    c.validate_field(MetricField::Jitter, "2.1");
}

#[test]
fn manual_submit_appends_and_records_history() {
    let (mut c, api, _) = controller();
    fill_form(&mut c);

    block_on(c.submit_manual()).unwrap();

    assert_eq!(api.sent().len(), 1);
    assert_eq!(api.sent()[0].latency, 45.5);
    assert_eq!(c.snapshot().latency, vec![45.5]);
    assert_eq!(c.history().count(), 1);
    assert!(c.field(MetricField::Latency).is_empty());
}

#[test]
fn manual_submit_without_token_makes_no_remote_call() {
    let api = ScriptedApi::default();
    let mut c = AcquisitionController::new(
        api.clone(),
        FixedToken(None),
        RecordingTimers::default(),
    );
    fill_form(&mut c);

    let err = block_on(c.submit_manual()).unwrap_err();
    assert!(matches!(err, TelemetryError::AuthRequired));
    assert!(err.requires_login());
    assert!(api.sent().is_empty());
    assert!(c.snapshot().is_empty());
}

#[test]
fn network_failure_leaves_state_unchanged() {
    let (mut c, api, _) = controller();
    fill_form(&mut c);
    api.push_outcome(Err(ApiError::Network("timeout".into())));

    let err = block_on(c.submit_manual()).unwrap_err();
    assert!(matches!(err, TelemetryError::Api(ApiError::Network(_))));
    assert!(c.snapshot().is_empty());
    assert_eq!(c.history().count(), 0);
    assert_eq!(c.field(MetricField::Latency), "45.5");
}

#[test]
fn history_keeps_only_the_most_recent_submissions() {
    let (mut c, _, _) = controller();
    for i in 0..(HISTORY_LIMIT + 2) {
        c.validate_field(MetricField::Latency, &format!("{}", 10 + i));
        c.validate_field(MetricField::Bandwidth, "100");
        c.validate_field(MetricField::PacketLoss, "0.5");
        c.validate_field(MetricField::Jitter, "2");
        block_on(c.submit_manual()).unwrap();
    }

    let latencies: Vec<f64> = c.history().map(|s| s.reading.latency).collect();
    assert_eq!(latencies.len(), HISTORY_LIMIT);
    assert_eq!(latencies[0], 16.0);
    assert_eq!(latencies[HISTORY_LIMIT - 1], 12.0);
}

#[test]
fn batch_commit_stops_at_the_first_failure() {
    let (mut c, api, _) = controller();
    c.set_batch_mode(true).unwrap();
    for latency in ["10", "20", "30"] {
        c.validate_field(MetricField::Latency, latency);
        c.validate_field(MetricField::Bandwidth, "100");
        c.validate_field(MetricField::PacketLoss, "0.5");
        c.validate_field(MetricField::Jitter, "2");
        c.stage_batch_entry().unwrap();
    }
    api.push_outcome(Ok(()));
    api.push_outcome(Err(ApiError::Network("timeout".into())));

    let err = block_on(c.commit_batch()).unwrap_err();
    match err {
        TelemetryError::Submission {
            failed_index,
            committed,
            ..
        } => {
            assert_eq!(failed_index, 1);
            assert_eq!(committed, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The committed entry left staging and reached the window.
    assert_eq!(c.snapshot().latency, vec![10.0]);
    let staged: Vec<f64> = c.batch_entries().iter().map(|r| r.latency).collect();
    assert_eq!(staged, vec![20.0, 30.0]);
}

#[test]
fn batch_commit_success_clears_staging() {
    let (mut c, api, _) = controller();
    c.set_batch_mode(true).unwrap();
    for _ in 0..2 {
        fill_form(&mut c);
        c.stage_batch_entry().unwrap();
    }

    let committed = block_on(c.commit_batch()).unwrap();
    assert_eq!(committed, 2);
    assert!(c.batch_entries().is_empty());
    assert_eq!(api.sent().len(), 2);
    assert_eq!(c.snapshot().len(), 2);
}

#[test]
fn monitor_ticks_immediately_and_arms_the_period() {
    let (mut c, _, timers) = controller();
    c.set_continuous_mode(true).unwrap();
    c.set_interval_secs(2);

    let ticks = Rc::new(Cell::new(0u32));
    let seen = ticks.clone();
    c.start_continuous_monitoring(Box::new(move || seen.set(seen.get() + 1)))
        .unwrap();

    assert_eq!(ticks.get(), 1);
    assert_eq!(*timers.periods.borrow(), vec![Duration::from_secs(2)]);
    assert!(c.is_monitoring());

    // Re-arming while active is a no-op.
    let seen = ticks.clone();
    c.start_continuous_monitoring(Box::new(move || seen.set(seen.get() + 1)))
        .unwrap();
    assert_eq!(ticks.get(), 1);
    assert_eq!(timers.periods.borrow().len(), 1);
}

#[test]
fn stopping_the_monitor_drops_the_timer() {
    let (mut c, _, timers) = controller();
    c.set_continuous_mode(true).unwrap();
    c.start_continuous_monitoring(Box::new(|| {})).unwrap();

    c.stop_continuous_monitoring();
    assert!(!c.is_monitoring());
    assert_eq!(timers.cancelled.get(), 1);

    c.stop_continuous_monitoring();
    assert_eq!(timers.cancelled.get(), 1);
}

#[test]
fn continuous_mode_keeps_form_values_between_ticks() {
    let (mut c, _, _) = controller();
    c.set_continuous_mode(true).unwrap();
    c.apply_preset(MetricPreset::Optimal);

    block_on(c.submit_manual()).unwrap();
    assert_eq!(c.field(MetricField::Latency), "10");

    block_on(c.submit_manual()).unwrap();
    assert_eq!(c.snapshot().len(), 2);
}

#[test]
fn expired_credential_ends_monitoring() {
    let (mut c, api, timers) = controller();
    c.set_continuous_mode(true).unwrap();
    c.apply_preset(MetricPreset::Optimal);
    c.start_continuous_monitoring(Box::new(|| {})).unwrap();

    api.push_outcome(Err(ApiError::CredentialRejected));
    let err = block_on(c.submit_manual()).unwrap_err();
    assert!(matches!(err, TelemetryError::SessionExpired));
    assert!(err.requires_login());
    assert!(!c.is_monitoring());
    assert_eq!(timers.cancelled.get(), 1);
}

#[test]
fn controller_stays_borrowable_while_a_submission_is_in_flight() {
    // The begin/complete split lets a host behind Rc<RefCell<...>> release
    // the borrow during the remote call, so UI actions (stopping the
    // monitor, toggling modes) land between the two halves without
    // panicking, and the in-flight result still applies safely afterwards.
    let (c, api, timers) = controller();
    let shared = Rc::new(RefCell::new(c));

    shared.borrow_mut().set_continuous_mode(true).unwrap();
    shared.borrow_mut().apply_preset(MetricPreset::Optimal);
    shared
        .borrow_mut()
        .start_continuous_monitoring(Box::new(|| {}))
        .unwrap();

    let (token, reading) = shared.borrow().begin_manual().unwrap();

    // Cancellation arrives while the submission is outstanding.
    shared.borrow_mut().stop_continuous_monitoring();
    assert!(!shared.borrow().is_monitoring());
    assert_eq!(timers.cancelled.get(), 1);

    let result = block_on(api.submit_reading(&token, &reading));
    shared
        .borrow_mut()
        .complete_manual(reading, result)
        .unwrap();
    assert_eq!(shared.borrow().snapshot().len(), 1);
}

#[test]
fn batch_entries_commit_one_at_a_time_through_the_split() {
    let (c, api, _) = controller();
    let shared = Rc::new(RefCell::new(c));
    shared.borrow_mut().set_batch_mode(true).unwrap();
    for _ in 0..2 {
        let mut guard = shared.borrow_mut();
        guard.apply_preset(MetricPreset::Degraded);
        guard.stage_batch_entry().unwrap();
    }

    let mut committed = 0;
    loop {
        // Bind first so the `Ref` guard is dropped before the body runs;
        // a `while let` scrutinee borrow would live across `borrow_mut`.
        let next = shared.borrow().begin_batch_entry().unwrap();
        let Some((token, reading)) = next else { break };
        let result = block_on(api.submit_reading(&token, &reading));
        shared
            .borrow_mut()
            .complete_batch_entry(reading, result, committed)
            .unwrap();
        committed += 1;
    }

    assert_eq!(committed, 2);
    assert!(shared.borrow().batch_entries().is_empty());
    assert_eq!(shared.borrow().snapshot().len(), 2);
}

#[test]
fn continuous_mode_cannot_be_disabled_while_monitoring() {
    let (mut c, _, _) = controller();
    c.set_continuous_mode(true).unwrap();
    c.start_continuous_monitoring(Box::new(|| {})).unwrap();

    assert!(matches!(
        c.set_continuous_mode(false),
        Err(TelemetryError::ModeConflict)
    ));

    c.stop_continuous_monitoring();
    c.set_continuous_mode(false).unwrap();
}

#[test]
fn analyze_sends_the_flattened_window() {
    let (mut c, _, _) = controller();
    c.load_csv(
        "timestamp,latency,bandwidth,packet_loss,jitter\n\
         10:00:00,45.5,100.2,0.5,2.1\n\
         10:00:05,48.2,98.7,0.6,2.3\n",
    )
    .unwrap();

    let report = block_on(c.analyze()).unwrap();
    assert_eq!(report.data_points_analyzed, 8);
    assert_eq!(report.results[0].value, 45.5);
    assert_eq!(report.fault_risk(), 0.0);
}
