//! Transformation context
//!
//! [`FunctionBuilder`] borrows one function exclusively for the duration of a
//! transformation and carries the insertion cursor used by every instruction
//! constructor. Passes receive it explicitly instead of sharing ambient state.

use super::entities::{BlockId, Inst, Value};
use super::function::Function;
use super::types::{BinaryOp, CmpCond, InstKind, Type};

/// Where new instructions are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    /// Instructions are created but left unplaced
    Nowhere,
    /// Append to the end of a block
    End(BlockId),
    /// Insert immediately before an instruction
    Before(Inst),
}

pub struct FunctionBuilder<'f> {
    func: &'f mut Function,
    position: InsertPoint,
}

impl<'f> FunctionBuilder<'f> {
    pub fn new(func: &'f mut Function) -> Self {
        Self {
            func,
            position: InsertPoint::Nowhere,
        }
    }

    pub fn func(&self) -> &Function {
        &*self.func
    }

    pub fn func_mut(&mut self) -> &mut Function {
        &mut *self.func
    }

    pub fn insert_point(&self) -> InsertPoint {
        self.position
    }

    pub fn set_insert_point_at_end(&mut self, block: BlockId) {
        self.position = InsertPoint::End(block);
    }

    pub fn set_insert_point_before(&mut self, inst: Inst) {
        self.position = InsertPoint::Before(inst);
    }

    pub fn clear_insert_point(&mut self) {
        self.position = InsertPoint::Nowhere;
    }

    /// Block the cursor currently points into
    pub fn current_block(&self) -> Option<BlockId> {
        match self.position {
            InsertPoint::Nowhere => None,
            InsertPoint::End(block) => Some(block),
            InsertPoint::Before(inst) => self.func.inst_block(inst),
        }
    }

    /// Place an existing detached instruction at the cursor
    ///
    /// # Panics
    ///
    /// Panics if no insertion point is set.
    pub fn insert(&mut self, inst: Inst) {
        assert!(
            self.position != InsertPoint::Nowhere,
            "cannot place {} without an insertion point",
            inst
        );
        self.place(inst);
    }

    fn place(&mut self, inst: Inst) {
        match self.position {
            InsertPoint::Nowhere => {}
            InsertPoint::End(block) => self.func.append_inst(block, inst),
            InsertPoint::Before(before) => self.func.insert_inst_before(before, inst),
        }
    }

    /// Fresh instructions stay unplaced while the cursor is cleared
    fn build(&mut self, kind: InstKind, ty: Type, name: Option<&str>) -> Inst {
        let inst = self.func.make_inst(kind, ty, name.map(str::to_owned));
        self.place(inst);
        inst
    }

    pub fn iconst(&mut self, ty: Type, imm: i64) -> Value {
        self.func.iconst(ty, imm)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value, name: &str) -> Value {
        let ty = self.func.value_type(lhs);
        let inst = self.build(InstKind::Binary { op, args: [lhs, rhs] }, ty, Some(name));
        self.func.inst_result(inst)
    }

    pub fn compare(&mut self, cond: CmpCond, lhs: Value, rhs: Value, name: &str) -> Value {
        let inst = self.build(
            InstKind::Compare {
                cond,
                args: [lhs, rhs],
            },
            Type::I1,
            Some(name),
        );
        self.func.inst_result(inst)
    }

    /// Call `callee`; a `Void` call gets no name
    pub fn call(&mut self, callee: &str, args: &[Value], ty: Type, name: &str) -> Inst {
        let name = (ty != Type::Void).then_some(name);
        self.build(
            InstKind::Call {
                callee: callee.to_owned(),
                args: args.to_vec(),
            },
            ty,
            name,
        )
    }

    /// Empty phi; add pairs with [`Function::add_phi_incoming`]
    pub fn phi(&mut self, ty: Type, name: Option<&str>) -> Inst {
        self.build(InstKind::Phi { incoming: Vec::new() }, ty, name)
    }

    pub fn jump(&mut self, dest: BlockId) -> Inst {
        self.build(InstKind::Jump { dest }, Type::Void, None)
    }

    pub fn branch(&mut self, cond: Value, then_dest: BlockId, else_dest: BlockId) -> Inst {
        self.build(
            InstKind::Branch {
                cond,
                then_dest,
                else_dest,
            },
            Type::Void,
            None,
        )
    }

    pub fn ret(&mut self, value: Option<Value>) -> Inst {
        self.build(InstKind::Return { value }, Type::Void, None)
    }

    pub fn unreachable(&mut self) -> Inst {
        self.build(InstKind::Unreachable, Type::Void, None)
    }
}
