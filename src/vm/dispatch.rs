//! Table-driven dispatch.

use std::str::FromStr;

use crate::{
    errors::Error,
    instr::{BinaryOpKind, Instruction, Opcode, UnaryOpKind, OPCODE_COUNT},
    value::Value,
};

use super::{binary, collections, Vm};

/// What a handler tells the dispatch loop to do next.
pub(crate) enum Flow {
    Advance,
    Jump(usize),
    Return(Value),
}

type Handler = fn(&mut Vm, &Instruction, usize) -> Result<Flow, Error>;

/// Ordered to match `Opcode`'s declaration order exactly — `Opcode as u8`
/// indexes straight into this array.
const DISPATCH_TABLE: [Handler; OPCODE_COUNT] = [
    Vm::op_nop,
    Vm::op_load_const,
    Vm::op_pop,
    Vm::op_swap,
    Vm::op_rotate3,
    Vm::op_load_name,
    Vm::op_store_name,
    Vm::op_create_var,
    Vm::op_jump,
    Vm::op_jump_if_false,
    Vm::op_return,
    Vm::op_binary_op,
    Vm::op_unary_op,
    Vm::op_new_struct,
    Vm::op_new_slice,
    Vm::op_get_field,
    Vm::op_set_field,
    Vm::op_set_struct_field,
    Vm::op_get_index,
    Vm::op_set_index,
    Vm::op_len,
    Vm::op_get_element,
    Vm::op_call,
    Vm::op_call_method,
    Vm::op_regist_function,
    Vm::op_import,
    Vm::op_enter_scope,
    Vm::op_exit_scope,
    Vm::op_break,
];

impl Vm {
    /// Looks up `instr.opcode` in [`DISPATCH_TABLE`] and invokes its handler.
    /// An opcode outside the table is unreachable: `Opcode` is a closed enum
    /// and every variant has a handler above.
    pub(crate) fn dispatch(&mut self, instr: &Instruction, pc: usize) -> Result<Flow, Error> {
        let index = instr.opcode as u8 as usize;
        DISPATCH_TABLE[index](self, instr, pc)
    }

    fn op_nop(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        Ok(Flow::Advance)
    }

    fn op_load_const(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let value = instr.arg.as_value().cloned().ok_or_else(|| Error::type_mismatch("LOAD_CONST", "expected a value operand"))?;
        self.stack.push(value)?;
        Ok(Flow::Advance)
    }

    fn op_pop(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        self.stack.pop()?;
        Ok(Flow::Advance)
    }

    fn op_swap(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        self.stack.swap_top()?;
        Ok(Flow::Advance)
    }

    fn op_rotate3(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        self.stack.rotate3()?;
        Ok(Flow::Advance)
    }

    /// `LOAD_NAME name`. A dotted `"a.b"` form
    /// first tries a struct-field read on the value bound to `a`; if `a`
    /// does not resolve to a mapping value (e.g. it is a module sentinel, or
    /// unbound), the whole dotted string is looked up as a plain identifier
    /// so module-qualified names and literal dotted bindings still resolve.
    fn op_load_name(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("LOAD_NAME", "expected a name"))?;
        let value = match name.split_once('.') {
            Some((head, field)) => match self.contexts.get(head) {
                Some(receiver @ Value::Struct(_)) => collections::get_field(&receiver, field)?,
                _ => self.contexts.get(name).ok_or_else(|| Error::undefined_variable(name))?,
            },
            None => self.contexts.get(name).ok_or_else(|| Error::undefined_variable(name))?,
        };
        self.stack.push(value)?;
        Ok(Flow::Advance)
    }

    fn op_store_name(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("STORE_NAME", "expected a name"))?;
        let value = self.stack.pop()?;
        self.contexts.set(name, value)?;
        Ok(Flow::Advance)
    }

    /// `CREATE_VAR name`. Declares `name` in the
    /// current context with a placeholder `nil`; the `STORE_NAME` the
    /// compiler always emits right after this overwrites it with
    /// the actual initializer value.
    fn op_create_var(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("CREATE_VAR", "expected a name"))?;
        self.contexts.create(name.to_string(), Value::Nil, "unknown");
        Ok(Flow::Advance)
    }

    fn op_jump(&mut self, instr: &Instruction, pc: usize) -> Result<Flow, Error> {
        let target = jump_target(instr, pc)?;
        Ok(Flow::Jump(target))
    }

    fn op_jump_if_false(&mut self, instr: &Instruction, pc: usize) -> Result<Flow, Error> {
        let cond = self.stack.pop()?;
        if cond.is_truthy() {
            Ok(Flow::Advance)
        } else {
            Ok(Flow::Jump(jump_target(instr, pc)?))
        }
    }

    fn op_return(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let value = self.stack.pop()?;
        Ok(Flow::Return(value))
    }

    fn op_binary_op(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let kind = instr.arg.as_str().and_then(|s| BinaryOpKind::from_str(s).ok()).ok_or_else(|| {
            Error::type_mismatch("BINARY_OP", "expected a known operator selector")
        })?;
        let rhs = self.stack.pop()?;
        let lhs = self.stack.pop()?;
        let result = binary::apply_binary(kind, lhs, rhs)?;
        self.stack.push(result)?;
        Ok(Flow::Advance)
    }

    fn op_unary_op(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let kind = instr.arg.as_str().and_then(|s| UnaryOpKind::from_str(s).ok()).ok_or_else(|| {
            Error::type_mismatch("UNARY_OP", "expected a known operator selector")
        })?;
        let operand = self.stack.pop()?;
        let result = binary::apply_unary(kind, operand)?;
        self.stack.push(result)?;
        Ok(Flow::Advance)
    }

    fn op_new_struct(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let type_name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("NEW_STRUCT", "expected a type name"))?;
        let value = {
            let registry = self.registry.read().expect("registry lock poisoned");
            collections::new_struct(&registry, type_name)
        };
        self.stack.push(value)?;
        Ok(Flow::Advance)
    }

    fn op_new_slice(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let n = instr.arg.as_int().ok_or_else(|| Error::type_mismatch("NEW_SLICE", "expected an element count"))? as usize;
        let items = self.stack.pop_n(n)?;
        self.stack.push(Value::slice(items))?;
        Ok(Flow::Advance)
    }

    fn op_get_field(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("GET_FIELD", "expected a field name"))?;
        let receiver = self.stack.pop()?;
        let value = collections::get_field(&receiver, name)?;
        self.stack.push(value)?;
        Ok(Flow::Advance)
    }

    /// `SET_FIELD name` — plain `x.f = value` assignment: the
    /// compiler pushes the receiver then the value, so both are popped here.
    fn op_set_field(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("SET_FIELD", "expected a field name"))?;
        let value = self.stack.pop()?;
        let receiver = self.stack.pop()?;
        collections::set_field(&receiver, name, value)?;
        Ok(Flow::Advance)
    }

    /// `SET_STRUCT_FIELD name` — composite-literal variant: the
    /// struct stays on the stack so the next field write can reuse it.
    fn op_set_struct_field(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name =
            instr.arg.as_str().ok_or_else(|| Error::type_mismatch("SET_STRUCT_FIELD", "expected a field name"))?;
        let value = self.stack.pop()?;
        let receiver = self.stack.peek()?.clone();
        collections::set_struct_field(&receiver, name, value)?;
        Ok(Flow::Advance)
    }

    fn op_get_index(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let index = self.stack.pop()?;
        let receiver = self.stack.pop()?;
        let value = collections::get_index(&receiver, &index)?;
        self.stack.push(value)?;
        Ok(Flow::Advance)
    }

    fn op_set_index(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let value = self.stack.pop()?;
        let index = self.stack.pop()?;
        let receiver = self.stack.pop()?;
        collections::set_index(&receiver, &index, value)?;
        Ok(Flow::Advance)
    }

    fn op_len(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let receiver = self.stack.pop()?;
        let value = collections::len(&receiver)?;
        self.stack.push(value)?;
        Ok(Flow::Advance)
    }

    fn op_get_element(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let index = self.stack.pop()?;
        let receiver = self.stack.pop()?;
        let value = collections::get_element(&receiver, &index)?;
        self.stack.push(value)?;
        Ok(Flow::Advance)
    }

    fn op_enter_scope(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let key = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("ENTER_SCOPE", "expected a scope key"))?;
        self.contexts.enter(key.to_string());
        Ok(Flow::Advance)
    }

    fn op_exit_scope(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        self.contexts.exit();
        Ok(Flow::Advance)
    }

    /// `BREAK`: the compiler patches this
    /// instruction's target to the instruction after the enclosing loop's
    /// back-edge at compile time (`compiler::stmt::compile_for`/
    /// `compile_for_range`), so at dispatch time it behaves exactly like `JUMP`.
    fn op_break(&mut self, instr: &Instruction, pc: usize) -> Result<Flow, Error> {
        Ok(Flow::Jump(jump_target(instr, pc)?))
    }
}

fn jump_target(instr: &Instruction, pc: usize) -> Result<usize, Error> {
    match instr.arg.as_int() {
        Some(target) if target >= 0 => Ok(target as usize),
        Some(target) => Err(Error::invalid_jump_target(pc, target)),
        None => Err(Error::type_mismatch("JUMP", "expected an integer target")),
    }
}
