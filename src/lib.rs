//! ssa-split: basic block splitting for an SSA intermediate representation
//!
//! This library provides an arena-based SSA IR, a CFG view over it, and the
//! block splitting primitive used by lowering passes that need a resume point
//! in the middle of a block (for example after a call that may suspend).

pub mod cfg;
pub mod error;
pub mod ir;
pub mod transform;
pub mod verify;

pub use error::{Error as IrError, Result as IrResult};

// Re-export commonly used types
pub use cfg::{Cfg, EdgeKind};
pub use ir::{BlockId, Function, FunctionBuilder, Inst, InstKind, Type, Value};
pub use transform::{enumerate_users, split_basic_block};
pub use verify::{verify_function, verify_function_with_options, VerifierOptions};
