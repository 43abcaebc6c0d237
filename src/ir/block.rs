//! Basic block module
//!
//! This module contains the BlockData struct. Instruction order inside a block
//! is an intrusive doubly-linked list threaded through the instructions
//! themselves, so a block only records its two ends.

use super::entities::Inst;
use serde::{Deserialize, Serialize};

/// Basic block header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    /// Advisory label, used for dumps only
    pub name: String,
    /// First instruction in this block
    pub(crate) first: Option<Inst>,
    /// Last instruction in this block
    pub(crate) last: Option<Inst>,
    /// Number of instructions in this block
    pub(crate) len: usize,
}

impl BlockData {
    /// Create a new empty block
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            first: None,
            last: None,
            len: 0,
        }
    }

    /// Get the block name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the first instruction in this block
    pub fn first_inst(&self) -> Option<Inst> {
        self.first
    }

    /// Get the last instruction in this block
    pub fn last_inst(&self) -> Option<Inst> {
        self.last
    }

    /// Get the number of instructions in this block
    pub fn instruction_count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
