use crate::ir::{Function, Inst, Value};

/// Instructions that read `value`, in def-use list order
///
/// The result is an owned snapshot, so callers may rewrite operands or erase
/// instructions while iterating it. An absent value has no users. An
/// instruction that reads the value in several slots is reported once per slot.
pub fn enumerate_users(func: &Function, value: Option<Value>) -> Vec<Inst> {
    let Some(value) = value else {
        return Vec::new();
    };
    func.value_uses(value).iter().map(|u| u.user).collect()
}
