//! AST → instruction set compiler.
//!
//! There is no packed-byte encoding step here: `Instruction` is already the
//! thing the VM dispatches, so compiling means building `Vec<Instruction>`
//! directly. A single-pass walk over the AST, a forward-jump patch list, and
//! a per-function loop stack handle backpatching control flow.

mod decl;
mod expr;
mod stmt;
mod types;

pub use types::TypeTable;

use ahash::{AHashMap, AHashSet};

use crate::{
    ast,
    code::{qualify_init, InstructionSet, ScriptFunction},
    errors::Error,
    instr::{Instruction, Opcode, Operand},
};

/// One open loop being compiled, tracking where `continue` (back-edge) and
/// `break` (forward, patched at loop close) should land.
struct LoopFrame {
    break_patches: Vec<usize>,
}

/// Drives a single-pass lowering of one or more `ast::File`s into instruction
/// sets, a struct-field type table, and the set of module names referenced
/// by `import` declarations.
pub struct Compiler {
    sets: AHashMap<String, (InstructionSet, ScriptFunction)>,
    /// The instruction set currently being built.
    current: InstructionSet,
    loop_stack: Vec<LoopFrame>,
    imported_modules: AHashSet<String>,
    type_table: TypeTable,
    label_counter: usize,
    /// `(label, patch site)` pairs still waiting for their target within the
    /// instruction set currently being compiled.
    pending_gotos: Vec<(String, usize)>,
    /// Label name → instruction index, scoped to the instruction set
    /// currently being compiled.
    label_positions: AHashMap<String, usize>,
}

/// What a compiled AST produces, ready to be loaded into a [`crate::registry::FunctionRegistry`].
pub struct CompiledProgram {
    pub sets: AHashMap<String, (InstructionSet, ScriptFunction)>,
    pub struct_fields: AHashMap<String, Vec<String>>,
    pub imported_modules: AHashSet<String>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: AHashMap::new(),
            current: InstructionSet::new(),
            loop_stack: Vec::new(),
            imported_modules: AHashSet::new(),
            type_table: TypeTable::new(),
            label_counter: 0,
            pending_gotos: Vec::new(),
            label_positions: AHashMap::new(),
        }
    }

    /// Lowers one compiled source file, adding its declarations to the
    /// program under construction.
    pub fn compile_file(&mut self, file: &ast::File) -> Result<(), Error> {
        for import in &file.imports {
            let name = import.alias.clone().unwrap_or_else(|| {
                import.path.rsplit('/').next().unwrap_or(&import.path).to_string()
            });
            self.imported_modules.insert(name);
        }

        // Struct field lists must be known before any function body compiles,
        // since a composite literal can reference a type declared later in
        // the same file.
        for decl in &file.decls {
            if let ast::Decl::Type(type_decl) = decl {
                self.record_type(type_decl);
            }
        }

        let init_key = qualify_init(&file.package);
        let mut init_body = InstructionSet::new();
        self.compile_imports(file, &mut init_body);
        for decl in &file.decls {
            match decl {
                ast::Decl::Func(func) => self.compile_func(&file.package, func)?,
                ast::Decl::Type(_) => {}
                ast::Decl::Var(var_decl) => self.compile_package_var(var_decl, &mut init_body)?,
            }
        }
        if !init_body.is_empty() {
            let (existing, _) = self.sets.entry(init_key.clone()).or_insert_with(|| {
                (InstructionSet::new(), ScriptFunction::default())
            });
            existing.instructions.extend(init_body.instructions);
        }

        Ok(())
    }

    /// Finishes compilation, handing back everything the registry needs.
    #[must_use]
    pub fn finish(self) -> CompiledProgram {
        CompiledProgram {
            sets: self.sets,
            struct_fields: self.type_table.into_fields_map(),
            imported_modules: self.imported_modules,
        }
    }

    // --- low-level emission helpers, shared by decl/stmt/expr ---

    fn emit(&mut self, opcode: Opcode, arg: Operand, arg2: Operand) -> usize {
        let index = self.current.instructions.len();
        self.current.instructions.push(Instruction::new(opcode, arg, arg2));
        index
    }

    fn emit_simple(&mut self, opcode: Opcode) -> usize {
        self.emit(opcode, Operand::None, Operand::None)
    }

    fn here(&self) -> usize {
        self.current.instructions.len()
    }

    /// Rewrites the jump-target operand of a previously emitted instruction.
    ///
    /// Patches only ever happen before an instruction set is handed to
    /// [`Compiler::finish`]; once compiled, instructions are never mutated
    /// again.
    fn patch(&mut self, site: usize, target: usize) {
        self.current.instructions[site].arg = Operand::Int(target as i64);
    }

    fn new_block_key(&mut self, prefix: &str) -> String {
        let id = self.label_counter;
        self.label_counter += 1;
        format!("{prefix}.{id}")
    }

    fn record_type(&mut self, decl: &ast::TypeDecl) {
        if let ast::TypeKind::Struct { fields } = &decl.kind {
            self.type_table.record_struct(decl.name.clone(), fields.clone());
        }
    }

    /// Resolves every pending forward `goto` against labels seen by the end
    /// of the function body. Unresolved labels are a compile error.
    fn resolve_gotos(&mut self) -> Result<(), Error> {
        let pending = std::mem::take(&mut self.pending_gotos);
        for (label, site) in pending {
            match self.label_positions.get(&label) {
                Some(&target) => self.patch(site, target),
                None => return Err(Error::compile_failure(format!("undefined label {label}"))),
            }
        }
        self.label_positions.clear();
        Ok(())
    }
}
