//! Property-based tests for the rolling telemetry window.
//!
//! These tests verify the window invariants under arbitrary append
//! sequences: equal-length series, capacity never exceeded, FIFO eviction.

use netpulse_core::buffer::{TelemetryBuffer, TelemetrySeries};
use netpulse_core::sample::{MetricReading, MetricSample};
use proptest::prelude::*;

/// Strategy for a valid reading: finite non-negative values, loss ≤ 100.
fn reading() -> impl Strategy<Value = MetricReading> {
    (0.0f64..=1000.0, 0.0f64..=1000.0, 0.0f64..=100.0, 0.0f64..=100.0).prop_map(
        |(latency, bandwidth, packet_loss, jitter)| MetricReading {
            latency,
            bandwidth,
            packet_loss,
            jitter,
        },
    )
}

fn sample_seq(max_len: usize) -> impl Strategy<Value = Vec<MetricReading>> {
    prop::collection::vec(reading(), 0..max_len)
}

proptest! {
    #[test]
    fn series_stay_equal_length_and_within_window(
        readings in sample_seq(100),
        window in 1usize..40,
    ) {
        let mut buffer = TelemetryBuffer::with_window(window);
        for (i, reading) in readings.iter().enumerate() {
            let sample = MetricSample::at(*reading, format!("t{i}")).unwrap();
            buffer.append(&sample);

            let snap = buffer.snapshot();
            prop_assert!(snap.check_shape().is_ok());
            prop_assert!(snap.len() <= window);
            prop_assert_eq!(snap.len(), (i + 1).min(window));
        }
    }

    #[test]
    fn window_retains_the_most_recent_samples(readings in sample_seq(80)) {
        let mut buffer = TelemetryBuffer::with_window(10);
        for (i, reading) in readings.iter().enumerate() {
            buffer.append(&MetricSample::at(*reading, format!("t{i}")).unwrap());
        }

        let snap = buffer.snapshot();
        let start = readings.len().saturating_sub(10);
        let expected: Vec<f64> = readings[start..].iter().map(|r| r.latency).collect();
        prop_assert_eq!(snap.latency, expected);

        let labels: Vec<String> = (start..readings.len()).map(|i| format!("t{i}")).collect();
        prop_assert_eq!(snap.timestamps, labels);
    }

    #[test]
    fn flattened_length_is_four_times_the_window(readings in sample_seq(60)) {
        let mut buffer = TelemetryBuffer::new();
        for (i, reading) in readings.iter().enumerate() {
            buffer.append(&MetricSample::at(*reading, format!("t{i}")).unwrap());
        }
        prop_assert_eq!(buffer.flattened().len(), buffer.len() * 4);
    }

    #[test]
    fn replace_accepts_any_well_shaped_series(len in 0usize..120) {
        let series = TelemetrySeries {
            timestamps: (0..len).map(|i| format!("t{i}")).collect(),
            latency: vec![1.0; len],
            bandwidth: vec![2.0; len],
            packet_loss: vec![0.5; len],
            jitter: vec![0.1; len],
        };
        let mut buffer = TelemetryBuffer::new();
        buffer.replace(series).unwrap();
        prop_assert_eq!(buffer.len(), len);
    }
}
