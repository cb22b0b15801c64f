//! Core logic for the netpulse telemetry dashboard.
//!
//! This crate contains:
//! - **Acquisition state machine** — manual, batch, and continuous
//!   submission over injected API/credential/timer capabilities
//! - **Telemetry window** — bounded rolling series behind the chart
//! - **CSV ingestion** — historical uploads validated into the window
//! - **Topology highlighting** — routing paths folded onto the graph
//! - **API contracts** — typed request/response shapes per endpoint
//!
//! Everything here is platform-neutral and runs natively under test; the
//! dashboard crate supplies the browser-backed capability implementations.

pub mod api;
pub mod buffer;
pub mod chart;
pub mod controller;
pub mod csv;
pub mod error;
pub mod sample;
pub mod topology;

pub use api::{CredentialProvider, TelemetryApi};
pub use buffer::{TelemetryBuffer, TelemetrySeries, DEFAULT_WINDOW};
pub use controller::{AcquisitionController, AcquisitionMode, TimerFactory};
pub use error::{ApiError, CsvError, ShapeError, TelemetryError};
pub use sample::{MetricField, MetricForm, MetricPreset, MetricReading, MetricSample};
