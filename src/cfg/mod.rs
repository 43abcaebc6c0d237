//! Control Flow Graph (CFG) module
//!
//! This module derives a successor/predecessor graph from block terminators.
//! The graph is a read-only view: it is rebuilt after any transformation that
//! changes terminators or moves instructions between blocks.

pub mod visualization;

use crate::error::{Error, Result};
use crate::ir::{BlockId, Function, InstKind};
use petgraph::algo::dominators::{self, Dominators};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Edge kind in the control flow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Unconditional jump
    Uncond,
    /// Conditional branch (true side)
    True,
    /// Conditional branch (false side)
    False,
}

/// CFG of one function with dominator information
pub struct Cfg {
    /// The underlying graph; node weights are block handles
    graph: DiGraph<BlockId, EdgeKind>,
    /// Mapping from block handle to graph node
    nodes: HashMap<BlockId, NodeIndex>,
    entry: NodeIndex,
    dominators: Dominators<NodeIndex>,
}

impl Cfg {
    /// Build the CFG of `func`
    ///
    /// Blocks without a terminator have no successors; this is the normal
    /// state of a block right after it has been split.
    pub fn compute(func: &Function) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for &block in func.layout() {
            nodes.insert(block, graph.add_node(block));
        }

        let entry_block = func.entry_block().ok_or_else(|| Error::EmptyFunction {
            function: func.name.clone(),
        })?;

        for &block in func.layout() {
            let Some(term) = func.terminator(block) else {
                continue;
            };
            let edges: Vec<(BlockId, EdgeKind)> = match func.inst_kind(term) {
                InstKind::Jump { dest } => vec![(*dest, EdgeKind::Uncond)],
                InstKind::Branch {
                    then_dest,
                    else_dest,
                    ..
                } => vec![(*then_dest, EdgeKind::True), (*else_dest, EdgeKind::False)],
                _ => Vec::new(),
            };
            for (target, kind) in edges {
                let target_node = *nodes.get(&target).ok_or_else(|| Error::UnknownBlock {
                    inst: term.to_string(),
                    target: target.to_string(),
                })?;
                graph.add_edge(nodes[&block], target_node, kind);
            }
        }

        let entry = nodes[&entry_block];
        let dominators = dominators::simple_fast(&graph, entry);
        log::trace!(
            "built CFG for @{}: {} blocks, {} edges",
            func.name,
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            graph,
            nodes,
            entry,
            dominators,
        })
    }

    /// Get the underlying graph
    pub fn graph(&self) -> &DiGraph<BlockId, EdgeKind> {
        &self.graph
    }

    pub fn entry_block(&self) -> BlockId {
        self.graph[self.entry]
    }

    pub fn node(&self, block: BlockId) -> Option<NodeIndex> {
        self.nodes.get(&block).copied()
    }

    fn neighbors(&self, block: BlockId, direction: Direction) -> Vec<BlockId> {
        let Some(node) = self.node(block) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| (edge.id(), edge.source(), edge.target()))
            .collect();
        // petgraph walks adjacency lists newest first; report insertion order
        edges.sort_by_key(|&(id, _, _)| id);
        edges
            .into_iter()
            .map(|(_, source, target)| match direction {
                Direction::Outgoing => self.graph[target],
                Direction::Incoming => self.graph[source],
            })
            .collect()
    }

    /// Successor blocks, one entry per edge
    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Outgoing)
    }

    /// Predecessor blocks, one entry per edge
    pub fn predecessors(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Incoming)
    }

    /// Whether `block` can be reached from the entry block
    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.node(block)
            .is_some_and(|node| self.dominators.dominators(node).is_some())
    }

    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        let node = self.node(block)?;
        self.dominators
            .immediate_dominator(node)
            .map(|idom| self.graph[idom])
    }

    /// Check if `dominator` dominates `block`; a block dominates itself
    pub fn dominates(&self, dominator: BlockId, block: BlockId) -> bool {
        if dominator == block {
            return true;
        }
        let (Some(dominator), Some(node)) = (self.node(dominator), self.node(block)) else {
            return false;
        };

        let mut current = node;
        while let Some(immediate_dom) = self.dominators.immediate_dominator(current) {
            if immediate_dom == dominator {
                return true;
            }
            current = immediate_dom;
        }
        false
    }

    /// Export CFG to DOT format for visualization
    pub fn to_dot(&self, func: &Function) -> String {
        visualization::generate_dot(func, self, &visualization::DotOptions::default())
    }
}
