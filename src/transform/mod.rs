//! Graph surgery on the IR
//!
//! Every operation here snapshots the lists it walks (def-use lists, block
//! instruction order) into owned vectors before it starts mutating them.

pub mod split;
pub mod uses;

pub use split::split_basic_block;
pub use uses::enumerate_users;
