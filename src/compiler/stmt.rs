//! Lowering of statements, including jump patching for control flow.

use super::{Compiler, LoopFrame};
use crate::{
    ast::{Block, Expr, Stmt},
    errors::Error,
    instr::{Opcode, Operand},
    value::Value,
};

impl Compiler {
    pub(super) fn compile_block(&mut self, block: &Block) -> Result<(), Error> {
        for stmt in block {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    /// Lowers a block as its own nested scope.
    fn compile_scoped_block(&mut self, block: &Block) -> Result<(), Error> {
        let key = self.new_block_key("block");
        self.emit(Opcode::EnterScope, Operand::Str(key), Operand::None);
        self.compile_block(block)?;
        self.emit_simple(Opcode::ExitScope);
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match stmt {
            Stmt::Assign { target, value, define } => self.compile_assign(target, value, *define)?,
            Stmt::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit_simple(Opcode::Pop);
            }
            Stmt::If { cond, then_block, else_block } => self.compile_if(cond, then_block, else_block.as_ref())?,
            Stmt::For { init, cond, post, body } => self.compile_for(init.as_deref(), cond.as_ref(), post.as_deref(), body)?,
            Stmt::ForRange { key, value, expr, body } => {
                self.compile_for_range(key.as_deref(), value.as_deref(), expr, body)?;
            }
            Stmt::Return(expr) => {
                match expr {
                    Some(e) => self.compile_expr(e)?,
                    None => {
                        self.emit(Opcode::LoadConst, Operand::Value(Value::Nil), Operand::None);
                    }
                }
                self.emit_simple(Opcode::Return);
            }
            Stmt::Break => {
                let site = self.emit(Opcode::Break, Operand::Int(-1), Operand::None);
                match self.loop_stack.last_mut() {
                    Some(frame) => frame.break_patches.push(site),
                    None => return Err(Error::compile_failure("break outside of a loop")),
                }
            }
            Stmt::Block(inner) => self.compile_scoped_block(inner)?,
            Stmt::Goto(label) => {
                let site = self.emit(Opcode::Jump, Operand::Int(-1), Operand::None);
                if let Some(&target) = self.label_positions.get(label) {
                    self.patch(site, target);
                } else {
                    self.pending_gotos.push((label.clone(), site));
                }
            }
            Stmt::Label(name, inner) => {
                self.label_positions.insert(name.clone(), self.here());
                self.compile_stmt(inner)?;
            }
            Stmt::Switch { tag, cases, default } => self.compile_switch(tag.as_ref(), cases, default.as_ref())?,
        }
        Ok(())
    }

    fn compile_assign(&mut self, target: &Expr, value: &Expr, define: bool) -> Result<(), Error> {
        if define {
            let Expr::Ident(name) = target else {
                return Err(Error::compile_failure("`:=` requires an identifier target"));
            };
            self.emit(Opcode::CreateVar, Operand::Str(name.clone()), Operand::None);
            self.compile_expr(value)?;
            self.emit(Opcode::StoreName, Operand::Str(name.clone()), Operand::None);
            return Ok(());
        }
        match target {
            Expr::Ident(name) => {
                self.compile_expr(value)?;
                self.emit(Opcode::StoreName, Operand::Str(name.clone()), Operand::None);
            }
            Expr::Selector { expr, field } => {
                self.compile_expr(expr)?;
                self.compile_expr(value)?;
                self.emit(Opcode::SetField, Operand::Str(field.clone()), Operand::None);
            }
            Expr::Index { expr, index } => {
                self.compile_expr(expr)?;
                self.compile_expr(index)?;
                self.compile_expr(value)?;
                self.emit_simple(Opcode::SetIndex);
            }
            other => return Err(Error::compile_failure(format!("invalid assignment target {other:?}"))),
        }
        Ok(())
    }

    fn compile_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>) -> Result<(), Error> {
        self.compile_expr(cond)?;
        let jump_to_else = self.emit(Opcode::JumpIfFalse, Operand::Int(-1), Operand::None);
        self.compile_scoped_block(then_block)?;
        match else_block {
            Some(else_body) => {
                let jump_to_end = self.emit(Opcode::Jump, Operand::Int(-1), Operand::None);
                let else_start = self.here();
                self.patch(jump_to_else, else_start);
                self.compile_scoped_block(else_body)?;
                let end = self.here();
                self.patch(jump_to_end, end);
            }
            None => {
                let end = self.here();
                self.patch(jump_to_else, end);
            }
        }
        Ok(())
    }

    fn compile_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Block,
    ) -> Result<(), Error> {
        let scope_key = self.new_block_key("for");
        self.emit(Opcode::EnterScope, Operand::Str(scope_key), Operand::None);

        if let Some(init) = init {
            self.compile_stmt(init)?;
        }
        let cond_target = self.here();
        let exit_patch = match cond {
            Some(cond) => {
                self.compile_expr(cond)?;
                Some(self.emit(Opcode::JumpIfFalse, Operand::Int(-1), Operand::None))
            }
            None => None,
        };

        self.loop_stack.push(LoopFrame { break_patches: Vec::new() });
        self.compile_scoped_block(body)?;
        if let Some(post) = post {
            self.compile_stmt(post)?;
        }
        self.emit(Opcode::Jump, Operand::Int(cond_target as i64), Operand::None);

        let loop_exit = self.here();
        if let Some(site) = exit_patch {
            self.patch(site, loop_exit);
        }
        let frame = self.loop_stack.pop().expect("loop frame pushed above");
        for site in frame.break_patches {
            self.patch(site, loop_exit);
        }
        self.emit_simple(Opcode::ExitScope);
        Ok(())
    }

    /// Lowers `for k, v := range expr { ... }` using `LEN`/`GET_ELEMENT` over a
    /// hidden index counter.
    fn compile_for_range(
        &mut self,
        key: Option<&str>,
        value: Option<&str>,
        expr: &Expr,
        body: &Block,
    ) -> Result<(), Error> {
        let scope_key = self.new_block_key("range");
        self.emit(Opcode::EnterScope, Operand::Str(scope_key.clone()), Operand::None);

        let src_var = format!("%range_src.{scope_key}");
        let idx_var = format!("%range_idx.{scope_key}");

        self.compile_expr(expr)?;
        self.emit(Opcode::CreateVar, Operand::Str(src_var.clone()), Operand::None);
        self.emit(Opcode::StoreName, Operand::Str(src_var.clone()), Operand::None);

        self.emit(Opcode::LoadConst, Operand::Value(Value::Int(0)), Operand::None);
        self.emit(Opcode::CreateVar, Operand::Str(idx_var.clone()), Operand::None);
        self.emit(Opcode::StoreName, Operand::Str(idx_var.clone()), Operand::None);

        let cond_target = self.here();
        self.emit(Opcode::LoadName, Operand::Str(idx_var.clone()), Operand::None);
        self.emit(Opcode::LoadName, Operand::Str(src_var.clone()), Operand::None);
        self.emit_simple(Opcode::Len);
        self.emit(Opcode::BinaryOp, Operand::Str("Lt".to_string()), Operand::None);
        let exit_patch = self.emit(Opcode::JumpIfFalse, Operand::Int(-1), Operand::None);

        self.loop_stack.push(LoopFrame { break_patches: Vec::new() });

        let body_scope_key = self.new_block_key("block");
        self.emit(Opcode::EnterScope, Operand::Str(body_scope_key), Operand::None);
        if let Some(key_name) = key {
            self.emit(Opcode::LoadName, Operand::Str(idx_var.clone()), Operand::None);
            self.emit(Opcode::CreateVar, Operand::Str(key_name.to_string()), Operand::None);
            self.emit(Opcode::StoreName, Operand::Str(key_name.to_string()), Operand::None);
        }
        if let Some(value_name) = value {
            self.emit(Opcode::LoadName, Operand::Str(src_var.clone()), Operand::None);
            self.emit(Opcode::LoadName, Operand::Str(idx_var.clone()), Operand::None);
            self.emit_simple(Opcode::GetElement);
            self.emit(Opcode::CreateVar, Operand::Str(value_name.to_string()), Operand::None);
            self.emit(Opcode::StoreName, Operand::Str(value_name.to_string()), Operand::None);
        }
        self.compile_block(body)?;
        self.emit_simple(Opcode::ExitScope);

        self.emit(Opcode::LoadName, Operand::Str(idx_var.clone()), Operand::None);
        self.emit(Opcode::LoadConst, Operand::Value(Value::Int(1)), Operand::None);
        self.emit(Opcode::BinaryOp, Operand::Str("Add".to_string()), Operand::None);
        self.emit(Opcode::StoreName, Operand::Str(idx_var), Operand::None);
        self.emit(Opcode::Jump, Operand::Int(cond_target as i64), Operand::None);

        let loop_exit = self.here();
        self.patch(exit_patch, loop_exit);
        let frame = self.loop_stack.pop().expect("loop frame pushed above");
        for site in frame.break_patches {
            self.patch(site, loop_exit);
        }
        self.emit_simple(Opcode::ExitScope);
        Ok(())
    }

    /// Lowers `switch` to a chain of equality tests (or, for a tagless
    /// switch, direct boolean tests) followed by a trailing default.
    /// Fallthrough is never emitted.
    fn compile_switch(
        &mut self,
        tag: Option<&Expr>,
        cases: &[(Vec<Expr>, Block)],
        default: Option<&Block>,
    ) -> Result<(), Error> {
        let hidden_tag = tag.map(|_| format!("%switch.{}", self.new_block_key("tag")));
        if let (Some(tag_expr), Some(hidden)) = (tag, &hidden_tag) {
            self.compile_expr(tag_expr)?;
            self.emit(Opcode::CreateVar, Operand::Str(hidden.clone()), Operand::None);
            self.emit(Opcode::StoreName, Operand::Str(hidden.clone()), Operand::None);
        }

        let mut end_patches = Vec::new();
        for (exprs, block) in cases {
            let mut case_fail_patches = Vec::new();
            let mut success_patches = Vec::new();
            for (i, expr) in exprs.iter().enumerate() {
                match &hidden_tag {
                    Some(hidden) => {
                        self.emit(Opcode::LoadName, Operand::Str(hidden.clone()), Operand::None);
                        self.compile_expr(expr)?;
                        self.emit(Opcode::BinaryOp, Operand::Str("Eq".to_string()), Operand::None);
                    }
                    None => self.compile_expr(expr)?,
                }
                let fail_site = self.emit(Opcode::JumpIfFalse, Operand::Int(-1), Operand::None);
                if i + 1 < exprs.len() {
                    // Matched: short-circuit straight to the body instead of
                    // falling through into the next label's test.
                    success_patches.push(self.emit(Opcode::Jump, Operand::Int(-1), Operand::None));
                    let next_test = self.here();
                    self.patch(fail_site, next_test);
                } else {
                    case_fail_patches.push(fail_site);
                }
            }
            let body_start = self.here();
            for site in success_patches {
                self.patch(site, body_start);
            }
            self.compile_scoped_block(block)?;
            end_patches.push(self.emit(Opcode::Jump, Operand::Int(-1), Operand::None));
            let next = self.here();
            for site in case_fail_patches {
                self.patch(site, next);
            }
        }

        if let Some(default_block) = default {
            self.compile_scoped_block(default_block)?;
        }

        let end = self.here();
        for site in end_patches {
            self.patch(site, end);
        }
        Ok(())
    }
}
