//! The acquisition state machine.
//!
//! Owns the input form, the staged batch, the rolling telemetry window,
//! and the continuous-monitoring timer. Constructed over three injected
//! capabilities so the whole machine runs in tests without a browser:
//! a [`TelemetryApi`], a [`CredentialProvider`], and a [`TimerFactory`].

use std::collections::VecDeque;
use std::time::Duration;

use crate::api::{CredentialProvider, TelemetryApi};
use crate::buffer::{TelemetryBuffer, TelemetrySeries};
use crate::chart::{self, ChartView};
use crate::csv;
use crate::error::{ApiError, TelemetryError};
use crate::sample::{FieldUpdate, MetricField, MetricForm, MetricPreset, MetricReading, MetricSample};

pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const MIN_INTERVAL_SECS: u64 = 1;
pub const MAX_INTERVAL_SECS: u64 = 3600;
/// Most recent manual submissions kept for the history panel.
pub const HISTORY_LIMIT: usize = 5;

/// Produces repeating timers. Dropping the handle cancels the timer; no
/// tick fires after the drop.
pub trait TimerFactory {
    type Handle;

    fn every(&self, period: Duration, tick: Box<dyn FnMut()>) -> Self::Handle;
}

/// Where the controller currently is. Derived from its flags rather than
/// stored, so it can never disagree with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    Idle,
    ManualPending,
    BatchStaging,
    ContinuousArmed,
    ContinuousActive,
}

pub struct AcquisitionController<A, C, T: TimerFactory> {
    api: A,
    credentials: C,
    timers: T,
    form: MetricForm,
    buffer: TelemetryBuffer,
    batch: Vec<MetricReading>,
    history: VecDeque<MetricSample>,
    batch_mode: bool,
    continuous_mode: bool,
    interval_secs: u64,
    monitor: Option<T::Handle>,
}

impl<A, C, T> AcquisitionController<A, C, T>
where
    A: TelemetryApi,
    C: CredentialProvider,
    T: TimerFactory,
{
    pub fn new(api: A, credentials: C, timers: T) -> Self {
        Self {
            api,
            credentials,
            timers,
            form: MetricForm::default(),
            buffer: TelemetryBuffer::new(),
            batch: Vec::new(),
            history: VecDeque::new(),
            batch_mode: false,
            continuous_mode: false,
            interval_secs: DEFAULT_INTERVAL_SECS,
            monitor: None,
        }
    }

    pub fn mode(&self) -> AcquisitionMode {
        if self.monitor.is_some() {
            AcquisitionMode::ContinuousActive
        } else if self.continuous_mode {
            AcquisitionMode::ContinuousArmed
        } else if self.batch_mode {
            AcquisitionMode::BatchStaging
        } else if self.form.is_empty() {
            AcquisitionMode::Idle
        } else {
            AcquisitionMode::ManualPending
        }
    }

    // ---- form ----

    /// Per-field range check; a rejected update leaves the field at its
    /// last valid value.
    pub fn validate_field(&mut self, field: MetricField, raw: &str) -> FieldUpdate {
        self.form.set(field, raw)
    }

    pub fn apply_preset(&mut self, preset: MetricPreset) {
        self.form.apply_preset(preset);
    }

    pub fn field(&self, field: MetricField) -> &str {
        self.form.get(field)
    }

    // ---- mode toggles ----

    /// Batch and continuous acquisition are mutually exclusive, and an
    /// active monitor pins the continuous flag until it is stopped.
    pub fn set_batch_mode(&mut self, enabled: bool) -> Result<(), TelemetryError> {
        if enabled && self.continuous_mode {
            return Err(TelemetryError::ModeConflict);
        }
        self.batch_mode = enabled;
        if !enabled {
            self.batch.clear();
        }
        Ok(())
    }

    pub fn set_continuous_mode(&mut self, enabled: bool) -> Result<(), TelemetryError> {
        if enabled && self.batch_mode {
            return Err(TelemetryError::ModeConflict);
        }
        if !enabled && self.monitor.is_some() {
            return Err(TelemetryError::ModeConflict);
        }
        self.continuous_mode = enabled;
        Ok(())
    }

    pub fn is_batch_mode(&self) -> bool {
        self.batch_mode
    }

    pub fn is_continuous_mode(&self) -> bool {
        self.continuous_mode
    }

    /// Clamped to the allowed range; ignored while a monitor is running
    /// (the running timer keeps its period until restarted).
    pub fn set_interval_secs(&mut self, secs: u64) {
        if self.monitor.is_some() {
            return;
        }
        self.interval_secs = secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    // ---- batch staging ----

    /// Move the current form values into the staged batch and clear the
    /// form. Does not touch the telemetry window.
    pub fn stage_batch_entry(&mut self) -> Result<(), TelemetryError> {
        if !self.batch_mode {
            return Err(TelemetryError::ModeConflict);
        }
        let reading = self.form.commit_reading()?;
        self.batch.push(reading);
        self.form.clear();
        Ok(())
    }

    /// No-op when `index` is out of bounds.
    pub fn remove_batch_entry(&mut self, index: usize) {
        if index < self.batch.len() {
            self.batch.remove(index);
        }
    }

    pub fn batch_entries(&self) -> &[MetricReading] {
        &self.batch
    }

    // Every remote operation is split into a begin/complete pair so hosts
    // that share the controller through single-threaded interior
    // mutability (Rc<RefCell<...>>) can release the borrow for the
    // duration of the network call. `begin_*` reads the state a call
    // needs, `complete_*` applies its outcome; the async methods compose
    // the two around the injected API.

    /// First staged entry plus the token needed to submit it, or `None`
    /// when staging is empty. Does not mutate.
    pub fn begin_batch_entry(&self) -> Result<Option<(String, MetricReading)>, TelemetryError> {
        if self.batch.is_empty() {
            return Ok(None);
        }
        let token = self.require_token()?;
        Ok(Some((token, self.batch[0])))
    }

    /// Apply the outcome of one staged-entry submission: success removes
    /// the entry from staging and appends it to the window, a rejected
    /// credential ends the session, any other failure surfaces the point
    /// of failure with `committed` entries already applied.
    pub fn complete_batch_entry(
        &mut self,
        reading: MetricReading,
        result: Result<(), ApiError>,
        committed: usize,
    ) -> Result<(), TelemetryError> {
        match result {
            Ok(()) => {
                self.batch.remove(0);
                self.buffer.append(&MetricSample::now(reading)?);
                Ok(())
            }
            Err(ApiError::CredentialRejected) => {
                self.stop_continuous_monitoring();
                Err(TelemetryError::SessionExpired)
            }
            Err(source) => Err(TelemetryError::Submission {
                failed_index: committed,
                committed,
                source,
            }),
        }
    }

    /// Submit staged entries in order, appending each to the window only
    /// after its remote call succeeds. Stops at the first failure; entries
    /// committed before it stay committed and leave staging, the rest
    /// remain staged. Returns the number committed.
    pub async fn commit_batch(&mut self) -> Result<usize, TelemetryError> {
        let mut committed = 0;
        while let Some((token, reading)) = self.begin_batch_entry()? {
            let result = self.api.submit_reading(&token, &reading).await;
            self.complete_batch_entry(reading, result, committed)?;
            committed += 1;
        }
        Ok(committed)
    }

    // ---- manual / continuous submission ----

    /// Validate the form and return the token plus the reading to submit.
    /// Does not mutate; the form stays intact until the outcome is applied.
    pub fn begin_manual(&self) -> Result<(String, MetricReading), TelemetryError> {
        let token = self.require_token()?;
        let reading = self.form.commit_reading()?;
        Ok((token, reading))
    }

    /// Apply a manual-submission outcome: append to the window, record the
    /// sample in the recent history, and clear the form unless continuous
    /// mode keeps the values for the next tick. Appending is safe even
    /// when monitoring was stopped while the call was in flight.
    pub fn complete_manual(
        &mut self,
        reading: MetricReading,
        result: Result<(), ApiError>,
    ) -> Result<(), TelemetryError> {
        match result {
            Ok(()) => {}
            Err(ApiError::CredentialRejected) => {
                self.stop_continuous_monitoring();
                return Err(TelemetryError::SessionExpired);
            }
            Err(err) => return Err(err.into()),
        }
        let sample = MetricSample::now(reading)?;
        self.buffer.append(&sample);
        self.history.push_front(sample);
        self.history.truncate(HISTORY_LIMIT);
        if !self.continuous_mode {
            self.form.clear();
        }
        Ok(())
    }

    /// Validate the form, submit, append to the window, and record the
    /// sample in the recent history. Continuous mode keeps the form values
    /// so the next tick resubmits them.
    pub async fn submit_manual(&mut self) -> Result<(), TelemetryError> {
        let (token, reading) = self.begin_manual()?;
        let result = self.api.submit_reading(&token, &reading).await;
        self.complete_manual(reading, result)
    }

    pub fn history(&self) -> impl Iterator<Item = &MetricSample> {
        self.history.iter()
    }

    /// Arm the repeating monitor. `tick` runs once immediately and then on
    /// every period; the caller's tick drives `submit_manual` however its
    /// runtime requires. No-op when already active.
    pub fn start_continuous_monitoring(
        &mut self,
        mut tick: Box<dyn FnMut()>,
    ) -> Result<(), TelemetryError> {
        if !self.continuous_mode || self.batch_mode {
            return Err(TelemetryError::ModeConflict);
        }
        if self.monitor.is_some() {
            return Ok(());
        }
        log::debug!("monitor armed, period {}s", self.interval_secs);
        tick();
        let period = Duration::from_secs(self.interval_secs);
        self.monitor = Some(self.timers.every(period, tick));
        Ok(())
    }

    /// Cancel the monitor. Idempotent; no tick fires after this returns.
    pub fn stop_continuous_monitoring(&mut self) {
        if self.monitor.take().is_some() {
            log::debug!("monitor stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_some()
    }

    // ---- window / analysis ----

    /// Parse an uploaded CSV payload and swap it in as the new window.
    /// Returns the number of rows loaded; a failing parse or shape check
    /// leaves the window untouched.
    pub fn load_csv(&mut self, text: &str) -> Result<usize, TelemetryError> {
        let series = csv::parse(text)?;
        let rows = series.len();
        self.buffer.replace(series)?;
        Ok(rows)
    }

    pub fn snapshot(&self) -> TelemetrySeries {
        self.buffer.snapshot()
    }

    pub fn chart_view(&self) -> ChartView {
        chart::project(&self.buffer.snapshot())
    }

    /// Token plus the flattened window for an analysis call.
    pub fn begin_analysis(&self) -> Result<(String, Vec<f64>), TelemetryError> {
        Ok((self.require_token()?, self.buffer.flattened()))
    }

    /// Apply an analysis outcome; a rejected credential ends the session.
    pub fn complete_analysis(
        &mut self,
        result: Result<crate::api::AnalysisReport, ApiError>,
    ) -> Result<crate::api::AnalysisReport, TelemetryError> {
        match result {
            Ok(report) => Ok(report),
            Err(ApiError::CredentialRejected) => {
                self.stop_continuous_monitoring();
                Err(TelemetryError::SessionExpired)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Run anomaly analysis over the current window's flattened metrics.
    pub async fn analyze(&mut self) -> Result<crate::api::AnalysisReport, TelemetryError> {
        let (token, data) = self.begin_analysis()?;
        let result = self.api.analyze(&token, &data).await;
        self.complete_analysis(result)
    }

    fn require_token(&self) -> Result<String, TelemetryError> {
        self.credentials.token().ok_or(TelemetryError::AuthRequired)
    }
}
