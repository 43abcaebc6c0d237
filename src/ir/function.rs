//! Function arenas
//!
//! A [`Function`] owns every value, instruction and block it contains. Handles
//! are plain indices, so relocating an instruction never invalidates another
//! handle, and def-use edges are stored as `(user, slot)` pairs on the used value.

use super::block::BlockData;
use super::entities::{BlockId, Inst, Value};
use super::types::{InstKind, Type, ValueDef};
use serde::{Deserialize, Serialize};

/// A def-use edge: `user` reads the referenced value in operand `slot`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Use {
    pub user: Inst,
    pub slot: usize,
}

/// Per-value record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueData {
    pub ty: Type,
    pub name: Option<String>,
    pub def: ValueDef,
    /// Ordered def-use list (insertion order)
    pub(crate) uses: Vec<Use>,
}

/// Per-instruction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstData {
    pub kind: InstKind,
    pub result: Value,
    pub(crate) block: Option<BlockId>,
    pub(crate) prev: Option<Inst>,
    pub(crate) next: Option<Inst>,
    pub(crate) erased: bool,
}

/// An SSA function: arenas plus the textual block order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    params: Vec<Value>,
    values: Vec<ValueData>,
    insts: Vec<InstData>,
    blocks: Vec<BlockData>,
    /// Block order for dumps; the first entry is the entry block
    layout: Vec<BlockId>,
}

impl Function {
    /// Create an empty function with the given parameter types
    pub fn new(name: impl Into<String>, param_types: &[Type]) -> Self {
        let mut func = Self {
            name: name.into(),
            params: Vec::with_capacity(param_types.len()),
            values: Vec::new(),
            insts: Vec::new(),
            blocks: Vec::new(),
            layout: Vec::new(),
        };
        for (index, &ty) in param_types.iter().enumerate() {
            let value = func.push_value(ty, None, ValueDef::Param(index));
            func.params.push(value);
        }
        func
    }

    fn push_value(&mut self, ty: Type, name: Option<String>, def: ValueDef) -> Value {
        let value = Value::new(self.values.len());
        self.values.push(ValueData {
            ty,
            name,
            def,
            uses: Vec::new(),
        });
        value
    }

    // ---- values ----

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Value {
        self.params[index]
    }

    /// Create an integer constant. Constants have no owning block.
    pub fn iconst(&mut self, ty: Type, imm: i64) -> Value {
        self.push_value(ty, None, ValueDef::Const(imm))
    }

    pub fn set_value_name(&mut self, value: Value, name: impl Into<String>) {
        self.values[value.index()].name = Some(name.into());
    }

    pub fn value(&self, value: Value) -> &ValueData {
        &self.values[value.index()]
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn value_type(&self, value: Value) -> Type {
        self.value(value).ty
    }

    pub fn value_name(&self, value: Value) -> Option<&str> {
        self.value(value).name.as_deref()
    }

    pub fn value_def(&self, value: Value) -> ValueDef {
        self.value(value).def
    }

    /// Ordered def-use list of `value`
    pub fn value_uses(&self, value: Value) -> &[Use] {
        &self.value(value).uses
    }

    pub fn is_constant(&self, value: Value) -> bool {
        matches!(self.value_def(value), ValueDef::Const(_))
    }

    /// Defining instruction of `value`, if it is an instruction result
    pub fn value_inst(&self, value: Value) -> Option<Inst> {
        match self.value_def(value) {
            ValueDef::Result(inst) => Some(inst),
            ValueDef::Param(_) | ValueDef::Const(_) => None,
        }
    }

    /// Block currently holding the definition of `value`
    ///
    /// Constants and parameters have no owning block.
    pub fn value_block(&self, value: Value) -> Option<BlockId> {
        self.value_inst(value).and_then(|inst| self.inst_block(inst))
    }

    /// Whether `value` may still be referenced as an operand
    pub fn is_value_live(&self, value: Value) -> bool {
        if value.index() >= self.values.len() {
            return false;
        }
        match self.value_inst(value) {
            Some(inst) => self.is_inst_live(inst),
            None => true,
        }
    }

    // ---- blocks ----

    /// Append a new empty block at the end of the layout
    pub fn create_block(&mut self, name: impl Into<String>) -> BlockId {
        let block = BlockId::new(self.blocks.len());
        self.blocks.push(BlockData::new(name));
        self.layout.push(block);
        block
    }

    /// Create a new empty block placed right after `anchor` in the layout
    pub fn insert_block_after(&mut self, anchor: BlockId, name: impl Into<String>) -> BlockId {
        let position = self
            .layout_position(anchor)
            .unwrap_or_else(|| panic!("{} is not in the layout of {}", anchor, self.name));
        let block = BlockId::new(self.blocks.len());
        self.blocks.push(BlockData::new(name));
        self.layout.insert(position + 1, block);
        block
    }

    fn layout_position(&self, block: BlockId) -> Option<usize> {
        self.layout.iter().position(|&b| b == block)
    }

    pub fn contains_block(&self, block: BlockId) -> bool {
        self.layout_position(block).is_some()
    }

    pub fn block(&self, block: BlockId) -> &BlockData {
        &self.blocks[block.index()]
    }

    pub fn block_name(&self, block: BlockId) -> &str {
        self.block(block).name()
    }

    /// Blocks in layout order
    pub fn layout(&self) -> &[BlockId] {
        &self.layout
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.layout.first().copied()
    }

    pub fn first_inst(&self, block: BlockId) -> Option<Inst> {
        self.block(block).first
    }

    pub fn last_inst(&self, block: BlockId) -> Option<Inst> {
        self.block(block).last
    }

    /// Snapshot of the instructions of `block`, in order
    pub fn block_insts(&self, block: BlockId) -> Vec<Inst> {
        let mut insts = Vec::with_capacity(self.block(block).len);
        let mut cursor = self.first_inst(block);
        while let Some(inst) = cursor {
            insts.push(inst);
            cursor = self.next_inst(inst);
        }
        insts
    }

    /// The block terminator, if its last instruction is one
    pub fn terminator(&self, block: BlockId) -> Option<Inst> {
        self.last_inst(block)
            .filter(|&inst| self.inst_kind(inst).is_terminator())
    }

    // ---- instructions ----

    pub fn inst(&self, inst: Inst) -> &InstData {
        &self.insts[inst.index()]
    }

    pub fn inst_count(&self) -> usize {
        self.insts.len()
    }

    pub fn inst_kind(&self, inst: Inst) -> &InstKind {
        &self.inst(inst).kind
    }

    pub fn inst_result(&self, inst: Inst) -> Value {
        self.inst(inst).result
    }

    /// Block currently holding `inst`, `None` if detached or erased
    pub fn inst_block(&self, inst: Inst) -> Option<BlockId> {
        self.inst(inst).block
    }

    pub fn next_inst(&self, inst: Inst) -> Option<Inst> {
        self.inst(inst).next
    }

    pub fn prev_inst(&self, inst: Inst) -> Option<Inst> {
        self.inst(inst).prev
    }

    pub fn is_inst_live(&self, inst: Inst) -> bool {
        self.insts.get(inst.index()).is_some_and(|data| !data.erased)
    }

    pub fn is_phi(&self, inst: Inst) -> bool {
        self.inst_kind(inst).is_phi()
    }

    /// Create an unplaced instruction and register its operand uses
    pub fn make_inst(&mut self, kind: InstKind, ty: Type, name: Option<String>) -> Inst {
        let inst = Inst::new(self.insts.len());
        let result = self.push_value(ty, name, ValueDef::Result(inst));
        let operands = kind.operands();
        self.insts.push(InstData {
            kind,
            result,
            block: None,
            prev: None,
            next: None,
            erased: false,
        });
        for (slot, operand) in operands.into_iter().enumerate() {
            self.link_use(operand, inst, slot);
        }
        inst
    }

    fn link_use(&mut self, value: Value, user: Inst, slot: usize) {
        assert!(
            self.is_value_live(value),
            "{} references erased value {}",
            user,
            value
        );
        self.values[value.index()].uses.push(Use { user, slot });
    }

    fn unlink_use(&mut self, value: Value, user: Inst, slot: usize) {
        let uses = &mut self.values[value.index()].uses;
        if let Some(position) = uses.iter().position(|u| u.user == user && u.slot == slot) {
            uses.remove(position);
        }
    }

    /// Place a detached instruction at the end of `block`
    pub fn append_inst(&mut self, block: BlockId, inst: Inst) {
        self.assert_detached(inst);
        let last = self.blocks[block.index()].last;
        {
            let data = &mut self.insts[inst.index()];
            data.block = Some(block);
            data.prev = last;
            data.next = None;
        }
        match last {
            Some(last) => self.insts[last.index()].next = Some(inst),
            None => self.blocks[block.index()].first = Some(inst),
        }
        let header = &mut self.blocks[block.index()];
        header.last = Some(inst);
        header.len += 1;
    }

    /// Place a detached instruction immediately before `before`
    pub fn insert_inst_before(&mut self, before: Inst, inst: Inst) {
        self.assert_detached(inst);
        let block = self
            .inst_block(before)
            .unwrap_or_else(|| panic!("{} is not placed in a block", before));
        let prev = self.insts[before.index()].prev;
        {
            let data = &mut self.insts[inst.index()];
            data.block = Some(block);
            data.prev = prev;
            data.next = Some(before);
        }
        self.insts[before.index()].prev = Some(inst);
        match prev {
            Some(prev) => self.insts[prev.index()].next = Some(inst),
            None => self.blocks[block.index()].first = Some(inst),
        }
        self.blocks[block.index()].len += 1;
    }

    fn assert_detached(&self, inst: Inst) {
        let data = self.inst(inst);
        assert!(!data.erased, "{} has been erased", inst);
        assert!(data.block.is_none(), "{} is already placed in a block", inst);
    }

    /// Unlink `inst` from its block; operands and uses are left untouched
    pub fn detach_inst(&mut self, inst: Inst) {
        let (block, prev, next) = {
            let data = &self.insts[inst.index()];
            let block = data
                .block
                .unwrap_or_else(|| panic!("{} is not placed in a block", inst));
            (block, data.prev, data.next)
        };
        match prev {
            Some(prev) => self.insts[prev.index()].next = next,
            None => self.blocks[block.index()].first = next,
        }
        match next {
            Some(next) => self.insts[next.index()].prev = prev,
            None => self.blocks[block.index()].last = prev,
        }
        self.blocks[block.index()].len -= 1;
        let data = &mut self.insts[inst.index()];
        data.block = None;
        data.prev = None;
        data.next = None;
    }

    /// Remove `inst` from the function. Its result must be unused.
    pub fn erase_inst(&mut self, inst: Inst) {
        assert!(self.is_inst_live(inst), "{} has already been erased", inst);
        let result = self.inst_result(inst);
        assert!(
            self.value_uses(result).is_empty(),
            "cannot erase {}: result {} still has {} use(s)",
            inst,
            result,
            self.value_uses(result).len()
        );
        if self.inst_block(inst).is_some() {
            self.detach_inst(inst);
        }
        let operands = self.inst_kind(inst).operands();
        for (slot, operand) in operands.into_iter().enumerate() {
            self.unlink_use(operand, inst, slot);
        }
        self.insts[inst.index()].erased = true;
    }

    /// Point operand `slot` of `inst` at `value`, keeping both use lists in sync
    pub fn set_operand(&mut self, inst: Inst, slot: usize, value: Value) {
        let old = {
            let operand = self.insts[inst.index()]
                .kind
                .operand_mut(slot)
                .unwrap_or_else(|| panic!("{} has no operand slot {}", inst, slot));
            std::mem::replace(operand, value)
        };
        self.unlink_use(old, inst, slot);
        self.link_use(value, inst, slot);
    }

    /// Redirect every use of `old` to `new`
    pub fn replace_all_uses_with(&mut self, old: Value, new: Value) {
        assert_ne!(old, new, "cannot replace {} with itself", old);
        let uses = self.value_uses(old).to_vec();
        for Use { user, slot } in uses {
            self.set_operand(user, slot, new);
        }
        debug_assert!(self.value_uses(old).is_empty());
    }

    /// Append an incoming `(value, block)` pair to a phi
    pub fn add_phi_incoming(&mut self, phi: Inst, value: Value, block: BlockId) {
        let slot = match &mut self.insts[phi.index()].kind {
            InstKind::Phi { incoming } => {
                incoming.push((value, block));
                incoming.len() - 1
            }
            other => panic!("{} is not a phi: {}", phi, other.opcode_name()),
        };
        self.link_use(value, phi, slot);
    }

    /// Live instructions in layout order, block by block
    pub fn layout_insts(&self) -> Vec<(BlockId, Inst)> {
        self.layout
            .iter()
            .flat_map(|&block| {
                self.block_insts(block)
                    .into_iter()
                    .map(move |inst| (block, inst))
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
