//! Basic block splitting
//!
//! [`split_basic_block`] moves every instruction after a split point into a
//! fresh block and rebuilds the phis whose recorded predecessor went stale
//! because the value feeding them moved. It does not connect the two halves:
//! the original block is left without a terminator and the caller appends
//! whatever control transfer it needs.

use super::uses::enumerate_users;
use crate::ir::{BlockId, Function, FunctionBuilder, Inst, Value};
use std::collections::HashSet;

/// Split `block` after `split_point` into `block` and a new block named `name`
///
/// `split_point` of `None` splits before the first instruction, moving the
/// whole block. The new block is placed right after `insert_after` in the
/// layout. On return the builder cursor is at the end of `block`.
///
/// Phis that used a moved instruction are replaced by new phis; handles to the
/// old phis are invalid afterwards.
///
/// # Panics
///
/// Panics if `block` or `insert_after` is not in the function, or if
/// `split_point` is not an instruction of `block`.
pub fn split_basic_block(
    builder: &mut FunctionBuilder<'_>,
    block: BlockId,
    split_point: Option<Inst>,
    insert_after: BlockId,
    name: &str,
) -> BlockId {
    let func = builder.func();
    assert!(
        func.contains_block(block),
        "{} is not a block of @{}",
        block,
        func.name
    );
    assert!(
        func.contains_block(insert_after),
        "anchor {} is not a block of @{}",
        insert_after,
        func.name
    );
    if let Some(inst) = split_point {
        assert_eq!(
            func.inst_block(inst),
            Some(block),
            "split point {} does not belong to {}",
            inst,
            block
        );
    }

    // Nothing is mutated until both snapshots exist.
    let tail = collect_tail(func, block, split_point);
    let phis = collect_phi_users(func, &tail);
    log::debug!(
        "splitting {} ({}) of @{}: moving {} instruction(s) into {:?}, {} phi(s) to repair",
        block,
        func.block_name(block),
        func.name,
        tail.len(),
        name,
        phis.len()
    );

    let new_block = builder.func_mut().insert_block_after(insert_after, name);

    builder.set_insert_point_at_end(new_block);
    for &inst in &tail {
        builder.func_mut().detach_inst(inst);
        builder.insert(inst);
    }

    for phi in phis {
        repair_phi(builder, phi, block, new_block);
    }

    builder.set_insert_point_at_end(block);
    new_block
}

/// Instructions following `split_point` in `block`, in order
fn collect_tail(func: &Function, block: BlockId, split_point: Option<Inst>) -> Vec<Inst> {
    let mut tail = Vec::new();
    let mut cursor = match split_point {
        Some(inst) => func.next_inst(inst),
        None => func.first_inst(block),
    };
    while let Some(inst) = cursor {
        tail.push(inst);
        cursor = func.next_inst(inst);
    }
    tail
}

/// Phis reading any of `insts`, deduplicated in first-seen order
fn collect_phi_users(func: &Function, insts: &[Inst]) -> Vec<Inst> {
    let mut seen = HashSet::new();
    let mut phis = Vec::new();
    for &inst in insts {
        for user in enumerate_users(func, Some(func.inst_result(inst))) {
            if func.is_phi(user) && seen.insert(user) {
                phis.push(user);
            }
        }
    }
    phis
}

/// Predecessor to record for an incoming `(value, pred)` pair after the split
///
/// A pair naming the split block is stale when its value now lives in the new
/// block, either because it was moved or because it is the replacement of a
/// moved phi. Constants, parameters and values that stayed put keep their
/// predecessor.
fn corrected_predecessor(
    func: &Function,
    value: Value,
    pred: BlockId,
    split_block: BlockId,
    new_block: BlockId,
) -> BlockId {
    if pred == split_block && func.value_block(value) == Some(new_block) {
        new_block
    } else {
        pred
    }
}

/// Replace `old` with an equivalent phi carrying corrected predecessors
fn repair_phi(
    builder: &mut FunctionBuilder<'_>,
    old: Inst,
    split_block: BlockId,
    new_block: BlockId,
) {
    let func = builder.func();
    if !func.is_inst_live(old) {
        log::trace!("skipping {}: already replaced", old);
        return;
    }

    let old_value = func.inst_result(old);
    let ty = func.value_type(old_value);
    let name = func.value_name(old_value).map(str::to_owned);
    let incoming: Vec<(Value, BlockId)> = func
        .inst_kind(old)
        .phi_incoming()
        .iter()
        .map(|&(value, pred)| {
            (
                value,
                corrected_predecessor(func, value, pred, split_block, new_block),
            )
        })
        .collect();

    builder.set_insert_point_before(old);
    let new = builder.phi(ty, None);

    let func = builder.func_mut();
    for (value, pred) in incoming {
        func.add_phi_incoming(new, value, pred);
    }
    let new_value = func.inst_result(new);
    func.replace_all_uses_with(old_value, new_value);
    if let Some(name) = name {
        func.set_value_name(new_value, name);
    }
    func.erase_inst(old);

    log::trace!("replaced phi {} with {}: {}", old, new, func.display_inst(new));
}
