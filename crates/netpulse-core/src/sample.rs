//! Metric samples, per-field validation ranges, and the input form.

use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;

/// One of the four acquired network metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    Latency,
    Bandwidth,
    PacketLoss,
    Jitter,
}

impl MetricField {
    pub const ALL: [MetricField; 4] = [
        MetricField::Latency,
        MetricField::Bandwidth,
        MetricField::PacketLoss,
        MetricField::Jitter,
    ];

    /// Wire and CSV column name.
    pub fn name(self) -> &'static str {
        match self {
            MetricField::Latency => "latency",
            MetricField::Bandwidth => "bandwidth",
            MetricField::PacketLoss => "packet_loss",
            MetricField::Jitter => "jitter",
        }
    }

    /// Display label with unit.
    pub fn label(self) -> &'static str {
        match self {
            MetricField::Latency => "Latency (ms)",
            MetricField::Bandwidth => "Bandwidth (Mbps)",
            MetricField::PacketLoss => "Packet Loss (%)",
            MetricField::Jitter => "Jitter (ms)",
        }
    }

    /// Inclusive range accepted by the input form.
    pub fn range(self) -> (f64, f64) {
        match self {
            MetricField::Latency => (0.0, 1000.0),
            MetricField::Bandwidth => (0.0, 1000.0),
            MetricField::PacketLoss => (0.0, 100.0),
            MetricField::Jitter => (0.0, 100.0),
        }
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The four metric values of a single measurement. Serializes as the
/// manual-metrics request body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub latency: f64,
    pub bandwidth: f64,
    pub packet_loss: f64,
    pub jitter: f64,
}

impl MetricReading {
    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Latency => self.latency,
            MetricField::Bandwidth => self.bandwidth,
            MetricField::PacketLoss => self.packet_loss,
            MetricField::Jitter => self.jitter,
        }
    }

    /// Data-model invariant: every value finite and non-negative, packet
    /// loss a percentage in 0–100.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        for field in MetricField::ALL {
            let value = self.get(field);
            if !value.is_finite() || value < 0.0 {
                return Err(TelemetryError::validation(
                    field.name(),
                    format!("{value} is not a non-negative number"),
                ));
            }
        }
        if self.packet_loss > 100.0 {
            return Err(TelemetryError::validation(
                MetricField::PacketLoss.name(),
                format!("{} exceeds 100%", self.packet_loss),
            ));
        }
        Ok(())
    }
}

/// A committed measurement: a validated reading plus its timestamp label.
///
/// Live commits stamp the current wall-clock time; CSV rows keep their
/// literal timestamp token.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub reading: MetricReading,
    pub timestamp: String,
}

impl MetricSample {
    /// Validates the reading first; a failing reading is never stored.
    pub fn at(reading: MetricReading, timestamp: impl Into<String>) -> Result<Self, TelemetryError> {
        reading.validate()?;
        Ok(Self {
            reading,
            timestamp: timestamp.into(),
        })
    }

    /// Stamp a reading with the current time.
    pub fn now(reading: MetricReading) -> Result<Self, TelemetryError> {
        Self::at(reading, chrono::Utc::now().format("%H:%M:%S").to_string())
    }
}

/// Canned form values for quick entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPreset {
    Optimal,
    Degraded,
    Poor,
    Custom,
}

impl MetricPreset {
    pub const ALL: [MetricPreset; 4] = [
        MetricPreset::Optimal,
        MetricPreset::Degraded,
        MetricPreset::Poor,
        MetricPreset::Custom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricPreset::Optimal => "Optimal",
            MetricPreset::Degraded => "Degraded",
            MetricPreset::Poor => "Poor",
            MetricPreset::Custom => "Custom",
        }
    }

    /// Field values in form order (latency, bandwidth, packet_loss,
    /// jitter); `None` clears the form. Presets are authored in-range.
    pub fn values(self) -> Option<[&'static str; 4]> {
        match self {
            MetricPreset::Optimal => Some(["10", "1000", "0", "1"]),
            MetricPreset::Degraded => Some(["100", "500", "2", "5"]),
            MetricPreset::Poor => Some(["200", "100", "5", "10"]),
            MetricPreset::Custom => None,
        }
    }
}

/// Outcome of a single form-field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    Accepted,
    Rejected,
}

/// Raw form state. Updates are validated on entry; a rejected update
/// leaves the previous value in place, so text that is out of range or
/// non-numeric never reaches staging or commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricForm {
    latency: String,
    bandwidth: String,
    packet_loss: String,
    jitter: String,
}

impl MetricForm {
    pub fn get(&self, field: MetricField) -> &str {
        match field {
            MetricField::Latency => &self.latency,
            MetricField::Bandwidth => &self.bandwidth,
            MetricField::PacketLoss => &self.packet_loss,
            MetricField::Jitter => &self.jitter,
        }
    }

    fn slot(&mut self, field: MetricField) -> &mut String {
        match field {
            MetricField::Latency => &mut self.latency,
            MetricField::Bandwidth => &mut self.bandwidth,
            MetricField::PacketLoss => &mut self.packet_loss,
            MetricField::Jitter => &mut self.jitter,
        }
    }

    /// Accepts empty input (clears the field) or a number within the
    /// field's range; anything else is rejected and the field keeps its
    /// last valid value.
    pub fn set(&mut self, field: MetricField, raw: &str) -> FieldUpdate {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.slot(field).clear();
            return FieldUpdate::Accepted;
        }
        let (min, max) = field.range();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= min && value <= max => {
                *self.slot(field) = trimmed.to_string();
                FieldUpdate::Accepted
            }
            _ => FieldUpdate::Rejected,
        }
    }

    pub fn apply_preset(&mut self, preset: MetricPreset) {
        match preset.values() {
            Some([latency, bandwidth, packet_loss, jitter]) => {
                self.latency = latency.to_string();
                self.bandwidth = bandwidth.to_string();
                self.packet_loss = packet_loss.to_string();
                self.jitter = jitter.to_string();
            }
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        for field in MetricField::ALL {
            self.slot(field).clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        MetricField::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    pub fn is_complete(&self) -> bool {
        MetricField::ALL.iter().all(|f| !self.get(*f).is_empty())
    }

    /// Parse the four fields into a reading. Fails with a validation error
    /// naming the first offending field when any is empty or non-numeric.
    pub fn commit_reading(&self) -> Result<MetricReading, TelemetryError> {
        let mut values = [0.0f64; 4];
        for (slot, field) in values.iter_mut().zip(MetricField::ALL) {
            let raw = self.get(field);
            if raw.is_empty() {
                return Err(TelemetryError::validation(field.name(), "field is empty"));
            }
            *slot = raw.parse::<f64>().map_err(|_| {
                TelemetryError::validation(field.name(), format!("{raw:?} is not a number"))
            })?;
        }
        let [latency, bandwidth, packet_loss, jitter] = values;
        let reading = MetricReading {
            latency,
            bandwidth,
            packet_loss,
            jitter,
        };
        reading.validate()?;
        Ok(reading)
    }
}
