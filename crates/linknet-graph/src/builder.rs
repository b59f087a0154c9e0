//! Star-graph construction from connection records.

use std::collections::{BTreeSet, HashMap, HashSet};

use linknet_core::models::{truncate_chars, Tabular};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Label of the hub node representing the archive owner.
pub const HUB_LABEL: &str = "you";

/// Default maximum node-label length in characters.
pub const LABEL_MAX_LEN: usize = 50;

/// Node size per connection on the linear scale.
pub const LINEAR_SIZE_FACTOR: f64 = 2.0;

/// Node size per ln(connections) on the logarithmic scale.
pub const LOG_SIZE_FACTOR: f64 = 7.0;

// ── Config ────────────────────────────────────────────────────────────────────

/// How node counts map to visual sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeScale {
    /// `count * 2.0`.
    Linear,
    /// `ln(count) * 7.0`, useful when one value dominates.
    Log,
}

/// Tuning knobs for [`build_graph`].
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Column whose values become the spoke nodes.
    pub column: String,
    /// Minimum count (inclusive) for a value to get a node.
    pub cutoff: u64,
    /// Count-to-size mapping.
    pub size_scale: SizeScale,
    /// Maximum label length; longer labels are truncated.
    pub label_max: usize,
    /// Column whose distinct values fill each node's tooltip. `None` derives
    /// it from `column`: company nodes show positions and vice versa.
    pub secondary_column: Option<String>,
}

impl GraphConfig {
    pub fn new(column: &str, cutoff: u64) -> Self {
        Self {
            column: column.to_string(),
            cutoff,
            size_scale: SizeScale::Linear,
            label_max: LABEL_MAX_LEN,
            secondary_column: None,
        }
    }

    fn effective_secondary(&self) -> Option<&str> {
        match &self.secondary_column {
            Some(column) => Some(column.as_str()),
            None => match self.column.as_str() {
                "company" => Some("position"),
                "position" => Some("company"),
                _ => None,
            },
        }
    }
}

// ── Graph types ───────────────────────────────────────────────────────────────

/// One spoke node of the relationship graph, or the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: String,
    /// Visual size per the configured [`SizeScale`]; the hub takes the
    /// largest spoke size.
    pub size: f64,
    /// Connection count behind this node (0 for the hub).
    pub count: u64,
    /// Distinct secondary-column values, sorted.
    pub tooltip: Vec<String>,
    pub is_hub: bool,
}

/// An undirected hub-to-spoke edge, by node label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// A star-shaped graph with the archive owner at the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub hub: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl RelationshipGraph {
    /// Spoke nodes only, hub excluded.
    pub fn spokes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| !n.is_hub)
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

/// Build the star graph: one spoke per distinct value of the configured
/// column whose count is at least `config.cutoff`, each connected to the hub.
///
/// Values the record type does not expose produce no spokes. When two
/// distinct values truncate to the same label, the first-seen value keeps
/// the node and later ones are dropped with a warning.
pub fn build_graph<T: Tabular>(records: &[T], config: &GraphConfig) -> RelationshipGraph {
    // Counts and tooltip material, keyed by the untruncated value.
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut secondary: HashMap<String, BTreeSet<String>> = HashMap::new();
    let secondary_column = config.effective_secondary();

    for record in records {
        let Some(value) = record.field(&config.column) else {
            continue;
        };
        if !counts.contains_key(value) {
            order.push(value.to_string());
        }
        *counts.entry(value.to_string()).or_insert(0) += 1;

        if let Some(column) = secondary_column {
            if let Some(extra) = record.field(column) {
                if !extra.is_empty() {
                    secondary
                        .entry(value.to_string())
                        .or_default()
                        .insert(extra.to_string());
                }
            }
        }
    }

    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut taken_labels: HashSet<String> = HashSet::new();
    taken_labels.insert(HUB_LABEL.to_string());

    for value in &order {
        let count = counts[value];
        if count < config.cutoff {
            continue;
        }

        let label = truncate_chars(value, config.label_max);
        if !taken_labels.insert(label.clone()) {
            warn!("Dropping node \"{}\": label \"{}\" already taken", value, label);
            continue;
        }

        let tooltip: Vec<String> = secondary
            .get(value)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        nodes.push(GraphNode {
            label: label.clone(),
            size: node_size(count, config.size_scale),
            count,
            tooltip,
            is_hub: false,
        });
        edges.push(GraphEdge {
            from: HUB_LABEL.to_string(),
            to: label,
        });
    }

    let hub_size = nodes
        .iter()
        .map(|n| n.size)
        .fold(LINEAR_SIZE_FACTOR, f64::max);
    nodes.insert(
        0,
        GraphNode {
            label: HUB_LABEL.to_string(),
            size: hub_size,
            count: 0,
            tooltip: Vec::new(),
            is_hub: true,
        },
    );

    RelationshipGraph {
        hub: HUB_LABEL.to_string(),
        nodes,
        edges,
    }
}

fn node_size(count: u64, scale: SizeScale) -> f64 {
    match scale {
        SizeScale::Linear => count as f64 * LINEAR_SIZE_FACTOR,
        SizeScale::Log => (count as f64).ln() * LOG_SIZE_FACTOR,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
