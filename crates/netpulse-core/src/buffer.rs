//! Bounded rolling window over the telemetry series.
//!
//! Four metric series plus a timestamp series, kept at equal length at all
//! times. Live appends evict from the front once the window is full; CSV
//! replacement swaps the whole window atomically and is not capped.

use crate::error::ShapeError;
use crate::sample::MetricSample;

/// Default window size `W`: the chart shows the most recent 30 points.
pub const DEFAULT_WINDOW: usize = 30;

/// Five parallel series. Timestamps are display labels (live commits) or
/// the literal CSV tokens (uploads).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySeries {
    pub timestamps: Vec<String>,
    pub latency: Vec<f64>,
    pub bandwidth: Vec<f64>,
    pub packet_loss: Vec<f64>,
    pub jitter: Vec<f64>,
}

impl TelemetrySeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// All five series must be the same length.
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        let n = self.timestamps.len();
        if self.latency.len() == n
            && self.bandwidth.len() == n
            && self.packet_loss.len() == n
            && self.jitter.len() == n
        {
            Ok(())
        } else {
            Err(ShapeError {
                timestamps: self.timestamps.len(),
                latency: self.latency.len(),
                bandwidth: self.bandwidth.len(),
                packet_loss: self.packet_loss.len(),
                jitter: self.jitter.len(),
            })
        }
    }
}

/// Sliding window of the most recent `window` samples.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    series: TelemetrySeries,
    window: usize,
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBuffer {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            series: TelemetrySeries::default(),
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Push one sample onto every series, evicting the oldest entries
    /// while the window is over capacity. Validation happens before this
    /// point, never inside it, so the series can never diverge in length.
    pub fn append(&mut self, sample: &MetricSample) {
        self.series.timestamps.push(sample.timestamp.clone());
        self.series.latency.push(sample.reading.latency);
        self.series.bandwidth.push(sample.reading.bandwidth);
        self.series.packet_loss.push(sample.reading.packet_loss);
        self.series.jitter.push(sample.reading.jitter);
        while self.series.len() > self.window {
            self.series.timestamps.remove(0);
            self.series.latency.remove(0);
            self.series.bandwidth.remove(0);
            self.series.packet_loss.remove(0);
            self.series.jitter.remove(0);
        }
    }

    /// Swap the window for `series` wholesale. The shape check runs first,
    /// so a failing replace leaves the previous contents fully intact.
    /// No capacity cap applies: uploaded content is authoritative.
    pub fn replace(&mut self, series: TelemetrySeries) -> Result<(), ShapeError> {
        series.check_shape()?;
        self.series = series;
        Ok(())
    }

    /// Owned copy of the current series for chart projection; callers
    /// cannot mutate the window through it.
    pub fn snapshot(&self) -> TelemetrySeries {
        self.series.clone()
    }

    /// Concatenated metric values (latency, bandwidth, packet loss,
    /// jitter) for anomaly analysis.
    pub fn flattened(&self) -> Vec<f64> {
        let mut data = Vec::with_capacity(self.series.len() * 4);
        data.extend_from_slice(&self.series.latency);
        data.extend_from_slice(&self.series.bandwidth);
        data.extend_from_slice(&self.series.packet_loss);
        data.extend_from_slice(&self.series.jitter);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::MetricReading;

    fn sample(latency: f64, ts: &str) -> MetricSample {
        MetricSample::at(
            MetricReading {
                latency,
                bandwidth: 100.0,
                packet_loss: 0.5,
                jitter: 2.0,
            },
            ts,
        )
        .unwrap()
    }

    #[test]
    fn append_grows_all_series_together() {
        let mut buffer = TelemetryBuffer::new();
        buffer.append(&sample(45.0, "10:00:00"));
        buffer.append(&sample(48.0, "10:00:05"));
        let snap = buffer.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(snap.check_shape().is_ok());
        assert_eq!(snap.latency, vec![45.0, 48.0]);
        assert_eq!(snap.timestamps, vec!["10:00:00", "10:00:05"]);
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut buffer = TelemetryBuffer::with_window(3);
        for i in 0..5 {
            buffer.append(&sample(i as f64, &format!("t{i}")));
        }
        let snap = buffer.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.latency, vec![2.0, 3.0, 4.0]);
        assert_eq!(snap.timestamps, vec!["t2", "t3", "t4"]);
    }

    #[test]
    fn replace_is_not_capped_by_window() {
        let mut buffer = TelemetryBuffer::with_window(2);
        let series = TelemetrySeries {
            timestamps: (0..5).map(|i| format!("t{i}")).collect(),
            latency: vec![1.0; 5],
            bandwidth: vec![2.0; 5],
            packet_loss: vec![0.1; 5],
            jitter: vec![0.5; 5],
        };
        buffer.replace(series).unwrap();
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn failed_replace_leaves_previous_window_intact() {
        let mut buffer = TelemetryBuffer::new();
        buffer.append(&sample(45.0, "10:00:00"));

        let lopsided = TelemetrySeries {
            timestamps: vec!["a".into(), "b".into()],
            latency: vec![1.0],
            bandwidth: vec![2.0, 3.0],
            packet_loss: vec![0.1, 0.2],
            jitter: vec![0.5, 0.6],
        };
        assert!(buffer.replace(lopsided).is_err());

        let snap = buffer.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.latency, vec![45.0]);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut buffer = TelemetryBuffer::new();
        buffer.append(&sample(45.0, "10:00:00"));
        let mut snap = buffer.snapshot();
        snap.latency.push(99.0);
        assert_eq!(buffer.snapshot().latency, vec![45.0]);
    }

    #[test]
    fn flattened_concatenates_metrics_in_order() {
        let mut buffer = TelemetryBuffer::new();
        buffer.append(&sample(45.0, "10:00:00"));
        buffer.append(&sample(48.0, "10:00:05"));
        assert_eq!(
            buffer.flattened(),
            vec![45.0, 48.0, 100.0, 100.0, 0.5, 0.5, 2.0, 2.0]
        );
    }
}
