//! SSA intermediate representation
//!
//! This module contains the arena-backed function representation that the
//! transformations in [`crate::transform`] operate on.

pub mod block;
pub mod builder;
pub mod display;
pub mod entities;
pub mod function;
pub mod types;

pub use block::BlockData;
pub use builder::{FunctionBuilder, InsertPoint};
pub use entities::{BlockId, Inst, Value};
pub use function::{Function, InstData, Use, ValueData};
pub use types::{BinaryOp, CmpCond, InstKind, Type, ValueDef};
