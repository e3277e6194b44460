//! Host-facing API.
//!
//! `Script` is the thing a host actually holds: it owns the compiled
//! program's registry, the variables a host has registered, and the limits
//! it wants enforced, and builds a fresh [`crate::vm::Vm`] for every `run`/
//! `call_function`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock,
};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    ast,
    code::{is_main_candidate, is_package_init, DEFAULT_ENTRY_POINT},
    compiler::Compiler,
    errors::Error,
    modules,
    registry::{FunctionRegistry, ModuleExecutor, NativeFn},
    resource::ResourceLimits,
    tracer::StderrTracer,
    value::Value,
    vm::Vm,
};

/// Seam a host's own Go parser plugs into. Not implemented by this crate outside of
/// `#[cfg(test)]` helpers used to build literal source snippets for tests.
pub trait Parser {
    fn parse(&self, source: &[u8]) -> Result<ast::File, Error>;
}

/// Execution statistics reported post-run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub wall_time: Duration,
    pub instructions_executed: u64,
    pub error_count: u32,
}

/// A cooperative cancellation flag a host can share with a running `Script`
/// and flip from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A compiled program plus the host-registered state around it.
pub struct Script {
    registry: Arc<RwLock<FunctionRegistry>>,
    package: String,
    compile_error: Option<Error>,
    vars: Vec<(String, Value, String)>,
    limits: ResourceLimits,
    debug: bool,
    last_stats: ExecutionStats,
}

impl Script {
    /// Compiles an already-parsed source file.
    ///
    /// A compile failure (e.g. an unresolved `goto` label) is not returned
    /// here — it is stored and surfaced from `run`/`call_function` as a
    /// `CompileFailure`, matching "errors flow back through the host API as
    /// typed values" uniformly with runtime errors.
    #[must_use]
    pub fn from_ast(file: ast::File) -> Self {
        let package = file.package.clone();
        let mut compiler = Compiler::new();
        let compile_error = compiler.compile_file(&file).err();

        let mut registry = FunctionRegistry::new();
        modules::register_builtins(&mut registry);
        if compile_error.is_none() {
            let program = compiler.finish();
            for (key, (set, descriptor)) in program.sets {
                registry.register_instruction_set(key, set, descriptor);
            }
            for (name, fields) in program.struct_fields {
                registry.register_struct_fields(name, fields);
            }
        }

        Self {
            registry: Arc::new(RwLock::new(registry)),
            package,
            compile_error,
            vars: Vec::new(),
            limits: ResourceLimits::default(),
            debug: false,
            last_stats: ExecutionStats::default(),
        }
    }

    /// Parses and compiles `source` via a host-supplied `Parser`. No parser ships with this crate.
    pub fn compile_source<P: Parser>(source: &[u8], parser: &P) -> Result<Self, Error> {
        let file = parser.parse(source)?;
        Ok(Self::from_ast(file))
    }

    /// Unconditionally sets a host variable, adding it if absent.
    pub fn add_variable(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let tag = value.type_tag().to_string();
        match self.vars.iter_mut().find(|(n, _, _)| *n == name) {
            Some(slot) => *slot = (name, value, tag),
            None => self.vars.push((name, value, tag)),
        }
    }

    /// Updates an existing host variable.
    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<(), Error> {
        match self.vars.iter_mut().find(|(n, _, _)| n == name) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => Err(Error::undefined_variable(name)),
        }
    }

    /// Reads a host variable: the last value set by the host, or — after a
    /// `run`/`call_function` — the value a script left it at.
    #[must_use]
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.vars.iter().find(|(n, _, _)| n == name).map(|(_, v, _)| v.clone())
    }

    /// Registers a native callable.
    pub fn add_function(&mut self, name: impl Into<String>, f: NativeFn) {
        self.registry.write().expect("registry lock poisoned").register_native(name, f);
    }

    /// Registers a module executor.
    pub fn register_module(&mut self, name: impl Into<String>, executor: ModuleExecutor) {
        self.registry.write().expect("registry lock poisoned").register_module(name, executor);
    }

    /// Every callable name known to this script: directly registered native
    /// functions and modules, plus every compiled function/method (package
    /// initializers excluded, since a host can't invoke one directly). Lets
    /// a host discover what's callable before compiling a program against
    /// it, rather than finding out via `UndefinedFunction` at run time.
    #[must_use]
    pub fn list_functions(&self) -> Vec<String> {
        let registry = self.registry.read().expect("registry lock poisoned");
        let mut names = registry.list_all();
        names.extend(registry.instruction_set_keys().filter(|key| !is_package_init(key)).cloned());
        names.sort();
        names.dedup();
        names
    }

    /// Whether `name` has been bound by an `import` this script actually ran
    /// (as opposed to merely being a known built-in or host-registered
    /// module that no compiled program has imported yet).
    #[must_use]
    pub fn has_imported(&self, name: &str) -> bool {
        self.registry.read().expect("registry lock poisoned").is_module_active(name)
    }

    /// Every module a compiled program has actually `import`ed so far, sorted.
    #[must_use]
    pub fn imported_modules(&self) -> Vec<String> {
        self.registry.read().expect("registry lock poisoned").active_modules()
    }

    /// Attaches built-ins early, without waiting
    /// for the compiled program's own `IMPORT` instructions to run.
    pub fn import_module(&mut self, names: &[&str]) -> Result<(), Error> {
        let mut registry = self.registry.write().expect("registry lock poisoned");
        for name in names {
            if !registry.is_module_registered(name) {
                return Err(Error::unsupported_module(name));
            }
            registry.activate_module(name);
        }
        Ok(())
    }

    /// Sets the instruction budget; `0` disables it.
    pub fn set_max_instructions(&mut self, n: usize) {
        self.limits.max_instructions = n;
    }

    /// Sets the operand stack ceiling.
    pub fn set_max_stack(&mut self, n: usize) {
        self.limits.max_stack = n;
    }

    /// Sets a wall-clock deadline for a single execution.
    pub fn set_max_duration(&mut self, duration: Duration) {
        self.limits.max_duration = Some(duration);
    }

    /// Opts into per-instruction tracing to stderr.
    pub fn set_debug(&mut self, on: bool) {
        self.debug = on;
    }

    /// Runs the program's entry point.
    pub fn run(&mut self) -> (Option<Value>, Option<Error>) {
        self.run_inner(None)
    }

    /// Runs the program's entry point, polling `token` for cancellation
    /// between dispatched instructions.
    pub fn run_with_cancel(&mut self, token: &CancelToken) -> (Option<Value>, Option<Error>) {
        self.run_inner(Some(token.clone()))
    }

    fn run_inner(&mut self, cancel: Option<CancelToken>) -> (Option<Value>, Option<Error>) {
        if let Some(err) = self.compile_error.clone() {
            return (None, Some(err));
        }
        let entry = self.resolve_entry_point();
        let package = entry.split_once('.').map_or_else(|| self.package.clone(), |(pkg, _)| pkg.to_string());
        let mut vm = self.build_vm(package);
        if let Some(token) = cancel {
            vm.set_cancel_hook(Arc::new(move || token.is_cancelled()));
        }
        let result = vm.execute(&entry);
        self.sync_after_run(&vm);
        split_result(result)
    }

    /// Invokes `name` directly without running the package initializer.
    pub fn call_function(&mut self, name: &str, args: &[Value]) -> (Option<Value>, Option<Error>) {
        if let Some(err) = self.compile_error.clone() {
            return (None, Some(err));
        }
        let mut vm = self.build_vm(self.package.clone());
        let result = vm.call_function(name, args.to_vec());
        self.sync_after_run(&vm);
        split_result(result)
    }

    /// Statistics from the most recent `run`/`call_function`.
    #[must_use]
    pub fn stats(&self) -> ExecutionStats {
        self.last_stats
    }

    fn build_vm(&self, package: String) -> Vm {
        let mut vm = Vm::new(Arc::clone(&self.registry), package, self.limits.clone());
        vm.contexts_mut().seed_root(self.vars.clone());
        if self.debug {
            vm.set_tracer(Box::new(StderrTracer));
        }
        vm
    }

    fn sync_after_run(&mut self, vm: &Vm) {
        self.vars = vm.contexts().export_root();
        self.last_stats = ExecutionStats {
            wall_time: vm.elapsed(),
            instructions_executed: vm.instructions_executed(),
            error_count: vm.error_count() as u32,
        };
    }

    /// Entry-point resolution: default `"main.main"`; if absent,
    /// any instruction set ending in `".main"`.
    fn resolve_entry_point(&self) -> String {
        let registry = self.registry.read().expect("registry lock poisoned");
        if registry.has_instruction_set(DEFAULT_ENTRY_POINT) {
            return DEFAULT_ENTRY_POINT.to_string();
        }
        registry
            .instruction_set_keys()
            .find(|key| is_main_candidate(key.as_str()))
            .cloned()
            .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string())
    }
}

fn split_result(result: Result<Value, Error>) -> (Option<Value>, Option<Error>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_file() -> ast::File {
        ast::File { package: "main".to_string(), imports: Vec::new(), decls: Vec::new() }
    }

    #[test]
    fn add_then_get_variable_round_trips() {
        let mut script = Script::from_ast(empty_file());
        script.add_variable("x", Value::Int(42));
        assert!(script.get_variable("x").unwrap().deep_eq(&Value::Int(42)));
    }

    #[test]
    fn set_variable_without_add_fails() {
        let mut script = Script::from_ast(empty_file());
        assert!(script.set_variable("missing", Value::Int(1)).is_err());
    }

    #[test]
    fn import_unregistered_module_fails() {
        let mut script = Script::from_ast(empty_file());
        assert!(script.import_module(&["no-such-module"]).is_err());
    }

    #[test]
    fn import_known_builtin_succeeds() {
        let mut script = Script::from_ast(empty_file());
        assert!(script.import_module(&["strings"]).is_ok());
    }

    #[test]
    fn empty_source_has_no_entry_point() {
        let mut script = Script::from_ast(empty_file());
        let (value, error) = script.run();
        assert!(value.is_none());
        assert!(error.is_some());
    }

    #[test]
    fn cancel_token_starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn list_functions_includes_builtins_and_host_natives_but_not_init() {
        let mut script = Script::from_ast(empty_file());
        script.add_function("double", Arc::new(|args: &[Value]| Ok(args[0].clone())));
        let names = script.list_functions();
        assert!(names.contains(&"double".to_string()));
        assert!(names.contains(&"strings".to_string()));
        assert!(!names.iter().any(|n| n.ends_with(".init")));
    }

    #[test]
    fn imported_modules_tracks_only_modules_actually_imported() {
        let mut script = Script::from_ast(empty_file());
        assert!(!script.has_imported("strings"));
        assert!(script.imported_modules().is_empty());
        script.import_module(&["strings"]).unwrap();
        assert!(script.has_imported("strings"));
        assert_eq!(script.imported_modules(), vec!["strings".to_string()]);
    }
}
