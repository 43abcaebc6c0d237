//! Entity handles
//!
//! Values, instructions and blocks are referred to by small `Copy` indices into
//! the arenas of the owning [`Function`](super::Function). Handles from one
//! function are meaningless in another.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an SSA value (instruction result, parameter or constant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Value(pub(crate) u32);

/// Handle to an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Inst(pub(crate) u32);

/// Handle to a basic block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub(crate) u32);

macro_rules! entity_impl {
    ($entity:ident, $prefix:expr) => {
        impl $entity {
            pub(crate) fn new(index: usize) -> Self {
                Self(u32::try_from(index).expect("entity arena overflow"))
            }

            /// Arena index of this entity
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $entity {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

entity_impl!(Value, "v");
entity_impl!(Inst, "inst");
entity_impl!(BlockId, "block");
