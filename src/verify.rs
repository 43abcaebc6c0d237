//! IR verifier
//!
//! Checks the structural invariants every transformation must preserve (block
//! instruction lists, def-use lists, operand liveness) and, optionally, the
//! stricter invariants of a finished function: terminators, phi/predecessor
//! agreement and SSA dominance.

use crate::cfg::Cfg;
use crate::error::{Error, Result};
use crate::ir::{BlockId, Function, Inst, Use, Value, ValueDef};
use std::collections::HashMap;

/// Verifier configuration
#[derive(Debug, Clone)]
pub struct VerifierOptions {
    /// Every block must end with exactly one terminator, and every phi must
    /// have one incoming pair per predecessor edge
    pub require_terminators: bool,
    /// Definitions must dominate their uses
    pub check_dominance: bool,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            require_terminators: true,
            check_dominance: true,
        }
    }
}

impl VerifierOptions {
    /// Only the invariants that hold in the middle of a transformation
    pub fn structural() -> Self {
        Self {
            require_terminators: false,
            check_dominance: false,
        }
    }
}

/// Verify `func` with the default (strict) options
pub fn verify_function(func: &Function) -> Result<()> {
    verify_function_with_options(func, &VerifierOptions::default())
}

pub fn verify_function_with_options(func: &Function, options: &VerifierOptions) -> Result<()> {
    let positions = check_layout(func)?;
    check_operands(func, &positions)?;
    check_use_lists(func)?;
    check_block_shapes(func, options)?;

    if options.require_terminators || options.check_dominance {
        let cfg = Cfg::compute(func)?;
        if options.require_terminators {
            check_phi_predecessors(func, &cfg)?;
        }
        if options.check_dominance {
            check_dominance(func, &cfg, &positions)?;
        }
    }

    log::debug!("verified @{} ({} blocks)", func.name, func.layout().len());
    Ok(())
}

/// Placed instructions with their block and position inside it
type Positions = HashMap<Inst, (BlockId, usize)>;

fn check_layout(func: &Function) -> Result<Positions> {
    let mut positions = HashMap::new();
    for &block in func.layout() {
        let name = func.block_name(block);
        let mut prev = None;
        let mut count = 0;
        let mut cursor = func.first_inst(block);
        while let Some(inst) = cursor {
            if count > func.inst_count() {
                return Err(Error::broken_layout(name, "instruction list is cyclic"));
            }
            if !func.is_inst_live(inst) {
                return Err(Error::broken_layout(name, format!("{} is erased", inst)));
            }
            if func.inst_block(inst) != Some(block) {
                return Err(Error::broken_layout(
                    name,
                    format!("{} records a different owning block", inst),
                ));
            }
            if func.prev_inst(inst) != prev {
                return Err(Error::broken_layout(
                    name,
                    format!("{} has a stale back link", inst),
                ));
            }
            if positions.insert(inst, (block, count)).is_some() {
                return Err(Error::broken_layout(
                    name,
                    format!("{} is listed twice", inst),
                ));
            }
            prev = Some(inst);
            count += 1;
            cursor = func.next_inst(inst);
        }
        if func.last_inst(block) != prev || func.block(block).instruction_count() != count {
            return Err(Error::broken_layout(
                name,
                "block header disagrees with its instruction list",
            ));
        }
    }
    Ok(positions)
}

fn describe(func: &Function, inst: Inst) -> String {
    if func.is_inst_live(inst) {
        func.display_inst(inst)
    } else {
        format!("<erased {}>", inst)
    }
}

fn check_operands(func: &Function, positions: &Positions) -> Result<()> {
    for &inst in positions.keys() {
        for (slot, operand) in func.inst_kind(inst).operands().into_iter().enumerate() {
            let placed = match func.value_def(operand) {
                ValueDef::Result(def) => func.is_inst_live(def) && positions.contains_key(&def),
                ValueDef::Param(_) | ValueDef::Const(_) => true,
            };
            if !placed {
                return Err(Error::DanglingOperand {
                    inst: describe(func, inst),
                    value: operand.to_string(),
                });
            }
            if !func.value_uses(operand).contains(&Use { user: inst, slot }) {
                return Err(Error::use_list(
                    func.display_value(operand),
                    format!("missing use by `{}` in slot {}", describe(func, inst), slot),
                ));
            }
        }
    }
    Ok(())
}

fn check_use_lists(func: &Function) -> Result<()> {
    for index in 0..func.value_count() {
        let value = Value::new(index);
        for &Use { user, slot } in func.value_uses(value) {
            if !func.is_inst_live(user) {
                return Err(Error::use_list(
                    func.display_value(value),
                    format!("used by erased {}", user),
                ));
            }
            if func.inst_kind(user).operands().get(slot) != Some(&value) {
                return Err(Error::use_list(
                    func.display_value(value),
                    format!("`{}` does not read it in slot {}", describe(func, user), slot),
                ));
            }
        }
    }
    Ok(())
}

fn check_block_shapes(func: &Function, options: &VerifierOptions) -> Result<()> {
    for &block in func.layout() {
        let insts = func.block_insts(block);
        let mut seen_non_phi = false;
        for (index, &inst) in insts.iter().enumerate() {
            let kind = func.inst_kind(inst);
            if kind.is_terminator() && index + 1 != insts.len() {
                return Err(Error::TerminatorNotLast {
                    block: func.block_name(block).to_string(),
                    inst: func.display_inst(inst),
                });
            }
            if kind.is_phi() {
                if seen_non_phi {
                    return Err(Error::MisplacedPhi {
                        block: func.block_name(block).to_string(),
                        inst: func.display_inst(inst),
                    });
                }
            } else {
                seen_non_phi = true;
            }
        }
        if options.require_terminators && func.terminator(block).is_none() {
            return Err(Error::MissingTerminator {
                block: func.block_name(block).to_string(),
            });
        }
    }
    Ok(())
}

fn check_phi_predecessors(func: &Function, cfg: &Cfg) -> Result<()> {
    for &block in func.layout() {
        let preds = cfg.predecessors(block);
        for inst in func.block_insts(block) {
            if !func.is_phi(inst) {
                break;
            }
            let incoming = func.inst_kind(inst).phi_incoming();
            if incoming.len() != preds.len() {
                return Err(Error::PhiPredecessorCount {
                    block: func.block_name(block).to_string(),
                    inst: func.display_inst(inst),
                    expected: preds.len(),
                    got: incoming.len(),
                });
            }
            let mut remaining = preds.clone();
            for &(_, pred) in incoming {
                match remaining.iter().position(|&p| p == pred) {
                    Some(position) => {
                        remaining.swap_remove(position);
                    }
                    None => {
                        return Err(Error::UnknownPredecessor {
                            block: func.block_name(block).to_string(),
                            inst: func.display_inst(inst),
                            pred: func.block_name(pred).to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_dominance(func: &Function, cfg: &Cfg, positions: &Positions) -> Result<()> {
    for (&inst, &(block, position)) in positions {
        if !cfg.is_reachable(block) {
            continue;
        }
        let kind = func.inst_kind(inst);
        if kind.is_phi() {
            // The definition must be available at the end of the predecessor.
            for &(value, pred) in kind.phi_incoming() {
                let Some(def) = func.value_inst(value) else {
                    continue;
                };
                let def_block = positions[&def].0;
                if cfg.is_reachable(pred) && !cfg.dominates(def_block, pred) {
                    return Err(Error::DominanceViolation {
                        value: func.display_value(value),
                        user: func.display_inst(inst),
                    });
                }
            }
            continue;
        }
        for operand in kind.operands() {
            let Some(def) = func.value_inst(operand) else {
                continue;
            };
            let (def_block, def_position) = positions[&def];
            let dominated = if def_block == block {
                def_position < position
            } else {
                cfg.dominates(def_block, block)
            };
            if !dominated {
                return Err(Error::DominanceViolation {
                    value: func.display_value(operand),
                    user: func.display_inst(inst),
                });
            }
        }
    }
    Ok(())
}
