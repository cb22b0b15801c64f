//! Typed contracts for the consumed REST services and the capability
//! traits the controller is constructed over.
//!
//! Response shapes are validated at the boundary: a payload that does not
//! match the documented shape fails with a typed decode error instead of
//! leaking absent fields into the rest of the crate.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::sample::MetricReading;
use crate::topology::TopologyGraph;

/// Detail substring the server uses for a rejected or expired credential.
pub const CREDENTIAL_REJECTED_DETAIL: &str = "Could not validate user credentials";

/// Source of the bearer token. Injected so tests can substitute fakes for
/// browser storage.
pub trait CredentialProvider {
    fn token(&self) -> Option<String>;
}

/// The consumed telemetry/analytics endpoints.
#[allow(async_fn_in_trait)]
pub trait TelemetryApi {
    /// Submit one manual reading.
    async fn submit_reading(&self, token: &str, reading: &MetricReading) -> Result<(), ApiError>;

    /// Run anomaly analysis over a flattened metric array.
    async fn analyze(&self, token: &str, data: &[f64]) -> Result<AnalysisReport, ApiError>;
}

/// Request body of the anomaly-analysis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPoint {
    pub value: f64,
    pub similarity: f64,
    pub anomaly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub results: Vec<AnalysisPoint>,
    pub average_similarity: f64,
    pub total_anomalies: u32,
    pub data_points_analyzed: u32,
}

impl AnalysisReport {
    /// Fault risk is the complement of the average similarity.
    pub fn fault_risk(&self) -> f64 {
        (1.0 - self.average_similarity).clamp(0.0, 1.0)
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &AnalysisPoint> {
        self.results.iter().filter(|p| p.anomaly)
    }
}

/// Path-finding algorithms offered by the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAlgorithm {
    Dijkstra,
    Astar,
    KShortest,
}

impl RoutingAlgorithm {
    pub const ALL: [RoutingAlgorithm; 3] = [
        RoutingAlgorithm::Dijkstra,
        RoutingAlgorithm::Astar,
        RoutingAlgorithm::KShortest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoutingAlgorithm::Dijkstra => "dijkstra",
            RoutingAlgorithm::Astar => "astar",
            RoutingAlgorithm::KShortest => "k_shortest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoutingAlgorithm::Dijkstra => "Dijkstra",
            RoutingAlgorithm::Astar => "A*",
            RoutingAlgorithm::KShortest => "K-Shortest Paths",
        }
    }
}

impl std::fmt::Display for RoutingAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoutingAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dijkstra" => Ok(RoutingAlgorithm::Dijkstra),
            "astar" => Ok(RoutingAlgorithm::Astar),
            "k_shortest" => Ok(RoutingAlgorithm::KShortest),
            other => Err(format!("unknown routing algorithm: {other}")),
        }
    }
}

pub const NODE_ID_MIN: u32 = 1;
pub const NODE_ID_MAX: u32 = 11;
pub const K_PATHS_MAX: u32 = 10;

/// Request body of the routing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub source: u32,
    pub target: u32,
    pub algorithm: RoutingAlgorithm,
    pub k_paths: u32,
}

impl RouteRequest {
    /// Checked before the request leaves the client: node ids within the
    /// topology, distinct endpoints, a sane path count.
    pub fn validate(&self) -> Result<(), crate::error::TelemetryError> {
        use crate::error::TelemetryError;

        for (name, id) in [("source", self.source), ("target", self.target)] {
            if !(NODE_ID_MIN..=NODE_ID_MAX).contains(&id) {
                return Err(TelemetryError::validation(
                    name,
                    format!("node id {id} outside {NODE_ID_MIN}..={NODE_ID_MAX}"),
                ));
            }
        }
        if self.source == self.target {
            return Err(TelemetryError::validation(
                "target",
                "source and target must differ",
            ));
        }
        if !(1..=K_PATHS_MAX).contains(&self.k_paths) {
            return Err(TelemetryError::validation(
                "k_paths",
                format!("{} outside 1..={K_PATHS_MAX}", self.k_paths),
            ));
        }
        Ok(())
    }
}

/// End-to-end quality figures for the primary path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QosMetrics {
    pub end_to_end_latency: f64,
    pub available_bandwidth: f64,
    pub packet_loss_probability: f64,
    pub total_jitter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub paths: Vec<Vec<u32>>,
    pub costs: Vec<f64>,
    pub qos_metrics: QosMetrics,
    pub visualization_data: TopologyGraph,
}

impl RouteResponse {
    /// Reject a payload whose paths and costs disagree in count.
    pub fn checked(self) -> Result<Self, ApiError> {
        if self.paths.len() == self.costs.len() {
            Ok(self)
        } else {
            Err(ApiError::Decode(format!(
                "{} paths but {} costs",
                self.paths.len(),
                self.costs.len()
            )))
        }
    }

    pub fn primary_path(&self) -> &[u32] {
        self.paths.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHistoryEntry {
    pub source: u32,
    pub target: u32,
    pub algorithm: RoutingAlgorithm,
    pub path: Vec<u32>,
    pub cost: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteHistory {
    #[serde(rename = "history")]
    pub entries: Vec<RouteHistoryEntry>,
}

/// The single tunable exposed by the configuration endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(rename = "SIMILARITY_THRESH")]
    pub similarity_thresh: f64,
}

impl ThresholdConfig {
    pub fn new(similarity_thresh: f64) -> Result<Self, crate::error::TelemetryError> {
        if (0.0..=1.0).contains(&similarity_thresh) {
            Ok(Self { similarity_thresh })
        } else {
            Err(crate::error::TelemetryError::validation(
                "SIMILARITY_THRESH",
                format!("{similarity_thresh} outside 0..=1"),
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(rename = "SIMILARITY_THRESH")]
    pub similarity_thresh: f64,
}

/// Failure payload shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: String,
}

impl ApiError {
    /// Classify a non-success response by its detail message. The
    /// credential-rejection detail maps to its own variant so callers can
    /// end the session.
    pub fn from_detail(status: u16, detail: String) -> Self {
        if detail.contains(CREDENTIAL_REJECTED_DETAIL) {
            ApiError::CredentialRejected
        } else {
            ApiError::Remote { status, detail }
        }
    }
}
