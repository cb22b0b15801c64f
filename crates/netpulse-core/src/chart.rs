//! Chart projection: turns the buffer snapshot into render-ready series.

use crate::buffer::TelemetrySeries;
use crate::sample::MetricField;

/// One plottable series with its fixed axis styling.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: &'static str,
    pub unit: &'static str,
    pub color: &'static str,
    /// Upper bound of the series' own axis.
    pub axis_max: f64,
    pub points: Vec<f64>,
}

/// Labels plus one series per metric, each on its own scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartView {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

fn style(field: MetricField) -> (&'static str, &'static str, f64) {
    match field {
        MetricField::Latency => ("Latency", "ms", 200.0),
        MetricField::Bandwidth => ("Bandwidth", "Mbps", 150.0),
        MetricField::PacketLoss => ("Packet Loss", "%", 10.0),
        MetricField::Jitter => ("Jitter", "ms", 30.0),
    }
}

fn color(field: MetricField) -> &'static str {
    match field {
        MetricField::Latency => "#4bc0c0",
        MetricField::Bandwidth => "#ff6384",
        MetricField::PacketLoss => "#9966ff",
        MetricField::Jitter => "#ff9f40",
    }
}

/// Project a buffer snapshot into the four-axis chart model.
pub fn project(series: &TelemetrySeries) -> ChartView {
    let dataset = |field: MetricField, points: &[f64]| {
        let (name, unit, axis_max) = style(field);
        ChartSeries {
            name,
            unit,
            color: color(field),
            axis_max,
            points: points.to_vec(),
        }
    };

    ChartView {
        labels: series.timestamps.clone(),
        series: vec![
            dataset(MetricField::Latency, &series.latency),
            dataset(MetricField::Bandwidth, &series.bandwidth),
            dataset(MetricField::PacketLoss, &series.packet_loss),
            dataset(MetricField::Jitter, &series.jitter),
        ],
    }
}
