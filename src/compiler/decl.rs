//! Lowering of top-level declarations.

use super::Compiler;
use crate::{
    ast,
    code::{qualify_func, qualify_method, InstructionSet, ReceiverMode, ScriptFunction},
    errors::Error,
    instr::{Opcode, Operand},
};

impl Compiler {
    /// Runs `emit`-style work against `target` instead of `self.current`,
    /// restoring `self.current` afterwards. Used for declarations (imports,
    /// package-level vars) whose instructions belong to `"<pkg>.init"`
    /// rather than whatever function happens to be mid-compile.
    fn with_target<T>(&mut self, target: &mut InstructionSet, f: impl FnOnce(&mut Self) -> T) -> T {
        std::mem::swap(&mut self.current, target);
        let result = f(self);
        std::mem::swap(&mut self.current, target);
        result
    }

    pub(super) fn compile_imports(&mut self, file: &ast::File, init_body: &mut InstructionSet) {
        for import in &file.imports {
            let name = import
                .alias
                .clone()
                .unwrap_or_else(|| import.path.rsplit('/').next().unwrap_or(&import.path).to_string());
            self.with_target(init_body, |c| {
                c.emit(Opcode::Import, Operand::Str(name.clone()), Operand::None);
            });
        }
    }

    pub(super) fn compile_package_var(
        &mut self,
        var_decl: &ast::VarDecl,
        init_body: &mut InstructionSet,
    ) -> Result<(), Error> {
        std::mem::swap(&mut self.current, init_body);
        let result = (|| {
            self.emit(Opcode::CreateVar, Operand::Str(var_decl.name.clone()), Operand::None);
            if let Some(value) = &var_decl.value {
                self.compile_expr(value)?;
                self.emit(Opcode::StoreName, Operand::Str(var_decl.name.clone()), Operand::None);
            }
            Ok(())
        })();
        std::mem::swap(&mut self.current, init_body);
        result
    }

    pub(super) fn compile_func(&mut self, package: &str, func: &ast::FuncDecl) -> Result<(), Error> {
        let (key, param_names, receiver_kind) = match &func.receiver {
            Some(receiver) => {
                let mut params = vec![receiver.name.clone()];
                params.extend(func.params.iter().cloned());
                (
                    qualify_method(&receiver.type_name, &func.name, receiver.kind),
                    params,
                    ReceiverMode::from(receiver.kind),
                )
            }
            None => (qualify_func(package, &func.name), func.params.clone(), ReceiverMode::None),
        };

        self.current = InstructionSet::new();
        self.loop_stack.clear();
        self.label_positions.clear();
        self.pending_gotos.clear();

        self.compile_block(&func.body)?;
        // Implicit `return nil` if control falls off the end of the body.
        self.emit(Opcode::LoadConst, Operand::Value(crate::value::Value::Nil), Operand::None);
        self.emit_simple(Opcode::Return);

        self.resolve_gotos()?;

        let set = std::mem::take(&mut self.current);
        let descriptor = ScriptFunction { param_names, receiver_kind };
        self.sets.insert(key, (set, descriptor));
        Ok(())
    }
}
