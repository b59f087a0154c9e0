//! Graph serialization backends.

use linknet_core::error::Result;

use crate::builder::RelationshipGraph;

/// Serialization seam for [`RelationshipGraph`] outputs.
pub trait GraphRenderer {
    /// File extension the output should carry, without the dot.
    fn extension(&self) -> &'static str;

    /// Render `graph` to its textual form.
    fn render(&self, graph: &RelationshipGraph) -> Result<String>;
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Pretty-printed JSON, the canonical machine-readable form.
pub struct JsonRenderer;

impl GraphRenderer for JsonRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, graph: &RelationshipGraph) -> Result<String> {
        Ok(serde_json::to_string_pretty(graph).map_err(anyhow::Error::from)?)
    }
}

// ── DOT ───────────────────────────────────────────────────────────────────────

/// Graphviz DOT, an undirected star for quick visual inspection.
pub struct DotRenderer;

impl GraphRenderer for DotRenderer {
    fn extension(&self) -> &'static str {
        "dot"
    }

    fn render(&self, graph: &RelationshipGraph) -> Result<String> {
        let mut out = String::from("graph connections {\n");
        for node in &graph.nodes {
            let shape = if node.is_hub { "doublecircle" } else { "circle" };
            out.push_str(&format!(
                "    \"{}\" [shape={}, width={:.2}];\n",
                escape(&node.label),
                shape,
                node.size / 10.0
            ));
        }
        for edge in &graph.edges {
            out.push_str(&format!(
                "    \"{}\" -- \"{}\";\n",
                escape(&edge.from),
                escape(&edge.to)
            ));
        }
        out.push_str("}\n");
        Ok(out)
    }
}

/// Escape a label for use inside a DOT double-quoted string.
fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
