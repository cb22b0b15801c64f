//! Topology path highlighting.
//!
//! The routing service returns a graph description plus one or more paths
//! (ordered node-id lists). [`highlight`] folds a path into the graph,
//! marking the nodes and the directed consecutive-pair edges it covers.

use serde::{Deserialize, Serialize};

/// Per-edge link metrics as reported by the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetrics {
    pub latency: f64,
    pub bandwidth: f64,
    /// Load factor in `[0, 1]`.
    pub congestion: f64,
    pub packet_loss: f64,
    pub jitter: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub source: u32,
    pub target: u32,
    pub metrics: EdgeMetrics,
}

/// Fixed node/edge description; refreshed wholesale from routing
/// responses, never mutated piecemeal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}

/// Congestion band used for edge styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionBand {
    Low,
    Moderate,
    High,
}

impl EdgeMetrics {
    pub fn congestion_band(&self) -> CongestionBand {
        if self.congestion > 0.7 {
            CongestionBand::High
        } else if self.congestion > 0.3 {
            CongestionBand::Moderate
        } else {
            CongestionBand::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderNode {
    pub id: u32,
    pub in_path: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderEdge {
    pub source: u32,
    pub target: u32,
    pub metrics: EdgeMetrics,
    pub in_path: bool,
}

/// Styled copy of the graph produced by [`highlight`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

/// Mark the nodes and edges of `graph` covered by `path`.
///
/// An edge is in-path when its `(source, target)` pair equals a consecutive
/// pair of `path`, direction-sensitive. Paths shorter than two nodes yield
/// no in-path edges; pairs without a matching edge are skipped, not an
/// error. The input graph is not mutated.
pub fn highlight(graph: &TopologyGraph, path: &[u32]) -> RenderGraph {
    let pairs: Vec<(u32, u32)> = path.windows(2).map(|w| (w[0], w[1])).collect();

    let nodes = graph
        .nodes
        .iter()
        .map(|node| RenderNode {
            id: node.id,
            in_path: path.contains(&node.id),
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|edge| RenderEdge {
            source: edge.source,
            target: edge.target,
            metrics: edge.metrics,
            in_path: pairs.contains(&(edge.source, edge.target)),
        })
        .collect();

    RenderGraph { nodes, edges }
}
