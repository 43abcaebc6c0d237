use miette::Diagnostic;
use thiserror::Error;

/// Result type for IR checks
pub type Result<T> = std::result::Result<T, Error>;

/// Invariant violations reported by the verifier and CFG construction
///
/// Entities are carried as their rendered names so an error outlives the
/// function it was produced from.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Function {function} has no blocks")]
    #[diagnostic(code(ssa_split::empty_function))]
    EmptyFunction { function: String },

    #[error("Broken instruction list in block {block}: {message}")]
    #[diagnostic(code(ssa_split::broken_layout))]
    BrokenLayout { block: String, message: String },

    #[error("{inst} refers to block {target}, which is not in the layout")]
    #[diagnostic(code(ssa_split::unknown_block))]
    UnknownBlock { inst: String, target: String },

    #[error("`{inst}` uses {value}, which is erased or unplaced")]
    #[diagnostic(code(ssa_split::dangling_operand))]
    DanglingOperand { inst: String, value: String },

    #[error("Def-use list of {value} is inconsistent: {message}")]
    #[diagnostic(code(ssa_split::use_list_mismatch))]
    UseListMismatch { value: String, message: String },

    #[error("Block {block} does not end with a terminator")]
    #[diagnostic(code(ssa_split::missing_terminator))]
    MissingTerminator { block: String },

    #[error("Terminator `{inst}` is not the last instruction of block {block}")]
    #[diagnostic(code(ssa_split::terminator_not_last))]
    TerminatorNotLast { block: String, inst: String },

    #[error("Phi `{inst}` follows a non-phi instruction in block {block}")]
    #[diagnostic(code(ssa_split::misplaced_phi))]
    MisplacedPhi { block: String, inst: String },

    #[error("Phi `{inst}` in block {block} has {got} incoming pairs, expected {expected}")]
    #[diagnostic(code(ssa_split::phi_predecessor_count))]
    PhiPredecessorCount {
        block: String,
        inst: String,
        expected: usize,
        got: usize,
    },

    #[error("Phi `{inst}` names {pred}, which is not a predecessor of {block}")]
    #[diagnostic(code(ssa_split::unknown_predecessor))]
    UnknownPredecessor {
        block: String,
        inst: String,
        pred: String,
    },

    #[error("Definition of {value} does not dominate its use in `{user}`")]
    #[diagnostic(code(ssa_split::dominance_violation))]
    DominanceViolation { value: String, user: String },
}

impl Error {
    /// Create a broken layout error
    pub fn broken_layout(block: impl Into<String>, message: impl Into<String>) -> Self {
        Error::BrokenLayout {
            block: block.into(),
            message: message.into(),
        }
    }

    /// Create a use list error
    pub fn use_list(value: impl Into<String>, message: impl Into<String>) -> Self {
        Error::UseListMismatch {
            value: value.into(),
            message: message.into(),
        }
    }
}
