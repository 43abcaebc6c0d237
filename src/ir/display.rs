//! Textual listing of a function, for logs and test failure messages

use super::entities::{BlockId, Inst, Value};
use super::function::Function;
use super::types::{InstKind, Type, ValueDef};
use std::fmt::{self, Write};

impl Function {
    /// Operand spelling: constants inline, everything else as `%name`
    pub fn display_value(&self, value: Value) -> String {
        match (self.value_def(value), self.value_name(value)) {
            (ValueDef::Const(imm), _) => imm.to_string(),
            (_, Some(name)) => format!("%{}", name),
            (_, None) => format!("%{}", value),
        }
    }

    fn display_typed(&self, value: Value) -> String {
        format!("{} {}", self.value_type(value), self.display_value(value))
    }

    /// Single-line rendering of one instruction
    pub fn display_inst(&self, inst: Inst) -> String {
        let mut out = String::new();
        let _ = self.write_inst(&mut out, inst);
        out
    }

    fn write_inst(&self, out: &mut impl Write, inst: Inst) -> fmt::Result {
        let result = self.inst_result(inst);
        let ty = self.value_type(result);
        if ty != Type::Void {
            write!(out, "{} = ", self.display_value(result))?;
        }
        let kind = self.inst_kind(inst);
        match kind {
            InstKind::Binary { args, .. } | InstKind::Compare { args, .. } => {
                let opcode = match kind {
                    InstKind::Compare { cond, .. } => format!("icmp {}", cond.mnemonic()),
                    _ => kind.opcode_name().to_string(),
                };
                write!(
                    out,
                    "{} {} {}, {}",
                    opcode,
                    self.value_type(args[0]),
                    self.display_value(args[0]),
                    self.display_value(args[1])
                )
            }
            InstKind::Call { callee, args } => {
                let args: Vec<_> = args.iter().map(|&arg| self.display_typed(arg)).collect();
                write!(out, "call {} @{}({})", ty, callee, args.join(", "))
            }
            InstKind::Phi { incoming } => {
                let pairs: Vec<_> = incoming
                    .iter()
                    .map(|&(value, block)| {
                        format!("[ {}, {} ]", self.display_value(value), self.block_label(block))
                    })
                    .collect();
                write!(out, "phi {} {}", ty, pairs.join(", "))
            }
            InstKind::Jump { dest } => write!(out, "jump {}", self.block_label(*dest)),
            InstKind::Branch {
                cond,
                then_dest,
                else_dest,
            } => write!(
                out,
                "br {}, {}, {}",
                self.display_typed(*cond),
                self.block_label(*then_dest),
                self.block_label(*else_dest)
            ),
            InstKind::Return { value: Some(value) } => write!(out, "ret {}", self.display_typed(*value)),
            InstKind::Return { value: None } => write!(out, "ret void"),
            InstKind::Unreachable => write!(out, "unreachable"),
        }
    }

    fn block_label(&self, block: BlockId) -> String {
        let name = self.block_name(block);
        if name.is_empty() {
            block.to_string()
        } else {
            name.to_string()
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<_> = self.params().iter().map(|&p| self.display_typed(p)).collect();
        writeln!(f, "fn @{}({}) {{", self.name, params.join(", "))?;
        for &block in self.layout() {
            writeln!(f, "{}:", self.block_label(block))?;
            for inst in self.block_insts(block) {
                f.write_str("  ")?;
                self.write_inst(f, inst)?;
                f.write_char('\n')?;
            }
        }
        f.write_str("}")
    }
}
