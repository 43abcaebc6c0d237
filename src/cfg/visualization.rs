//! CFG visualization module
//!
//! This module contains DOT export for a function's CFG.

use crate::cfg::{Cfg, EdgeKind};
use crate::ir::Function;
use petgraph::visit::EdgeRef;

/// DOT generation options
#[derive(Debug, Clone)]
pub struct DotOptions {
    /// Include edge labels
    pub include_labels: bool,
    /// Include edge colors
    pub include_colors: bool,
    /// List instructions inside each node
    pub include_node_details: bool,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            include_labels: true,
            include_colors: true,
            include_node_details: false,
        }
    }
}

/// Generate DOT representation of a function's CFG
pub fn generate_dot(func: &Function, cfg: &Cfg, options: &DotOptions) -> String {
    let graph = cfg.graph();
    let mut dot = String::new();
    dot.push_str(&format!("digraph \"{}\" {{\n", func.name));
    dot.push_str("  rankdir=TB;\n");
    dot.push_str("  node [shape=box];\n\n");

    for node in graph.node_indices() {
        let label = format_block_label(func, graph[node], options);
        dot.push_str(&format!("  {} [label=\"{}\"];\n", node.index(), label));
    }

    dot.push('\n');

    for edge in graph.edge_references() {
        let mut edge_str = format!("  {} -> {}", edge.source().index(), edge.target().index());
        let mut attributes = Vec::new();

        if options.include_labels {
            if let Some(label) = get_edge_label(edge.weight()) {
                attributes.push(format!("label=\"{}\"", label));
            }
        }

        if options.include_colors {
            attributes.push(format!("color=\"{}\"", get_edge_color(edge.weight())));
        }

        if !attributes.is_empty() {
            edge_str.push_str(&format!(" [{}]", attributes.join(", ")));
        }

        edge_str.push_str(";\n");
        dot.push_str(&edge_str);
    }

    dot.push_str("}\n");
    dot
}

/// Format a block label for DOT
fn format_block_label(func: &Function, block: crate::ir::BlockId, options: &DotOptions) -> String {
    let name = escape(func.block_name(block));
    if !options.include_node_details {
        return name;
    }
    let mut label = format!("{}:\\l", name);
    for inst in func.block_insts(block) {
        label.push_str(&escape(&func.display_inst(inst)));
        label.push_str("\\l");
    }
    label
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Get edge label for DOT
fn get_edge_label(edge_kind: &EdgeKind) -> Option<&'static str> {
    match edge_kind {
        EdgeKind::True => Some("T"),
        EdgeKind::False => Some("F"),
        EdgeKind::Uncond => None, // No label for unconditional edges
    }
}

/// Get edge color for DOT
fn get_edge_color(edge_kind: &EdgeKind) -> &'static str {
    match edge_kind {
        EdgeKind::True => "green",
        EdgeKind::False => "red",
        EdgeKind::Uncond => "black",
    }
}
