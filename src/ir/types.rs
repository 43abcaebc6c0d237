use super::entities::{BlockId, Inst, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    I1,
    I32,
    I64,
    Ptr,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Void => "void",
            Type::I1 => "i1",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::Ptr => "ptr",
        };
        f.write_str(name)
    }
}

/// Two-operand arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }
}

/// Integer comparison condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpCond {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl CmpCond {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CmpCond::Eq => "eq",
            CmpCond::Ne => "ne",
            CmpCond::Slt => "slt",
            CmpCond::Sle => "sle",
            CmpCond::Sgt => "sgt",
            CmpCond::Sge => "sge",
        }
    }
}

/// Definition site of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueDef {
    /// Result of an instruction
    Result(Inst),
    /// Function parameter at the given position
    Param(usize),
    /// Compile-time integer constant
    Const(i64),
}

/// Instruction payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstKind {
    Binary {
        op: BinaryOp,
        args: [Value; 2],
    },
    Compare {
        cond: CmpCond,
        args: [Value; 2],
    },
    Call {
        callee: String,
        args: Vec<Value>,
    },
    /// Merge instruction: one `(value, predecessor)` pair per incoming edge
    Phi {
        incoming: Vec<(Value, BlockId)>,
    },
    Jump {
        dest: BlockId,
    },
    Branch {
        cond: Value,
        then_dest: BlockId,
        else_dest: BlockId,
    },
    Return {
        value: Option<Value>,
    },
    Unreachable,
}

impl InstKind {
    /// Operands in slot order
    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstKind::Binary { args, .. } | InstKind::Compare { args, .. } => args.to_vec(),
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Phi { incoming } => incoming.iter().map(|&(value, _)| value).collect(),
            InstKind::Branch { cond, .. } => vec![*cond],
            InstKind::Return { value } => value.iter().copied().collect(),
            InstKind::Jump { .. } | InstKind::Unreachable => Vec::new(),
        }
    }

    /// Mutable reference to the operand in `slot`
    pub(crate) fn operand_mut(&mut self, slot: usize) -> Option<&mut Value> {
        match self {
            InstKind::Binary { args, .. } | InstKind::Compare { args, .. } => args.get_mut(slot),
            InstKind::Call { args, .. } => args.get_mut(slot),
            InstKind::Phi { incoming } => incoming.get_mut(slot).map(|(value, _)| value),
            InstKind::Branch { cond, .. } if slot == 0 => Some(cond),
            InstKind::Return { value } if slot == 0 => value.as_mut(),
            _ => None,
        }
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, InstKind::Phi { .. })
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Jump { .. }
                | InstKind::Branch { .. }
                | InstKind::Return { .. }
                | InstKind::Unreachable
        )
    }

    /// Successor blocks of a terminator, with one entry per outgoing edge
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            InstKind::Jump { dest } => vec![*dest],
            InstKind::Branch {
                then_dest,
                else_dest,
                ..
            } => vec![*then_dest, *else_dest],
            _ => Vec::new(),
        }
    }

    /// Incoming pairs of a phi, empty for every other instruction
    pub fn phi_incoming(&self) -> &[(Value, BlockId)] {
        match self {
            InstKind::Phi { incoming } => incoming,
            _ => &[],
        }
    }

    pub fn opcode_name(&self) -> &'static str {
        match self {
            InstKind::Binary { op, .. } => op.mnemonic(),
            InstKind::Compare { .. } => "icmp",
            InstKind::Call { .. } => "call",
            InstKind::Phi { .. } => "phi",
            InstKind::Jump { .. } => "jump",
            InstKind::Branch { .. } => "br",
            InstKind::Return { .. } => "ret",
            InstKind::Unreachable => "unreachable",
        }
    }
}
