//! Call, method-dispatch, and module-binding semantics.

use crate::{
    code::{qualify_func, ScriptFunction},
    errors::Error,
    instr::Instruction,
    registry::ResolvedCall,
    value::{NativeHandle, Value},
};

use super::{dispatch::Flow, Vm};

impl Vm {
    /// Resolves `name` against the registry and invokes it, following a
    /// four-step precedence:
    /// 1. native function registry (including module-qualified wrappers)
    /// 2. script-defined instruction set under the exact key
    /// 3. script-defined instruction set under a package-qualified key
    /// 4. `UndefinedFunction`
    ///
    /// Shared by the `CALL` opcode and `Script::call_function`.
    pub(crate) fn resolve_and_invoke(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let resolved = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.resolve_native(name)
        };
        if let Some(resolved) = resolved {
            return self.invoke_resolved(resolved, &args);
        }

        let has_exact = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.has_instruction_set(name)
        };
        if has_exact {
            return self.invoke_script_key(name, args);
        }

        let qualified = qualify_func(&self.current_package, name);
        let has_qualified = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.has_instruction_set(&qualified)
        };
        if has_qualified {
            return self.invoke_script_key(&qualified, args);
        }

        Err(Error::undefined_function(name))
    }

    fn invoke_resolved(&mut self, resolved: ResolvedCall, args: &[Value]) -> Result<Value, Error> {
        match resolved {
            ResolvedCall::Native(f) => f(args),
            ResolvedCall::Module { module, executor, entrypoint } => {
                executor(&entrypoint, args).map_err(|cause| Error::module_function_failure(&module, &entrypoint, &cause))
            }
        }
    }

    /// Invokes a script-defined instruction set under its exact qualified
    /// key, binding `args` to declared parameter names and restoring the
    /// caller's context on return.
    pub(crate) fn invoke_script_key(&mut self, key: &str, args: Vec<Value>) -> Result<Value, Error> {
        let (instructions, descriptor) = {
            let registry = self.registry.read().expect("registry lock poisoned");
            let (set, descriptor) = registry
                .instruction_set(key)
                .ok_or_else(|| Error::undefined_function(key))?;
            (set.clone(), descriptor.clone())
        };

        if args.len() != descriptor.param_count() {
            return Err(Error::arity_mismatch(key, descriptor.param_count(), args.len()));
        }

        let caller_ctx = self.contexts.current();
        self.contexts.enter_under(&caller_ctx, key.to_string());
        self.bind_params(&descriptor, args);

        let result = self.run_instructions(&instructions.instructions, key);
        self.contexts.exit();
        result
    }

    fn bind_params(&mut self, descriptor: &ScriptFunction, args: Vec<Value>) {
        for (i, arg) in args.into_iter().enumerate() {
            let name = descriptor.param_name_or_fallback(i);
            let tag = arg.type_tag().to_string();
            self.contexts.create(name, arg, tag);
        }
    }

    /// `CALL fname argc`.
    pub(super) fn op_call(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("CALL", "expected a function name"))?;
        let argc = instr.arg2.as_int().unwrap_or(0) as usize;
        let args = self.stack.pop_n(argc)?;
        let result = self.resolve_and_invoke(name, args)?;
        self.stack.push(result)?;
        Ok(Flow::Advance)
    }

    /// `CALL_METHOD mname argc`. The receiver was pushed before
    /// the arguments; the VM inspects it at dispatch time to decide between
    /// module-qualified dispatch and struct method dispatch.
    pub(super) fn op_call_method(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let method = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("CALL_METHOD", "expected a method name"))?;
        let argc = instr.arg2.as_int().unwrap_or(0) as usize;
        let args = self.stack.pop_n(argc)?;
        let receiver = self.stack.pop()?;

        let result = match &receiver {
            Value::Native(handle) => match handle.as_ref() {
                NativeHandle::Module(name) => self.call_module(name, method, &args)?,
                NativeHandle::Function(name) => self.resolve_and_invoke(name, args)?,
            },
            Value::Struct(_) => self.call_method_on_struct(&receiver, method, args)?,
            other => return Err(Error::type_mismatch("CALL_METHOD", other.type_tag())),
        };
        self.stack.push(result)?;
        Ok(Flow::Advance)
    }

    fn call_module(&mut self, module: &str, entrypoint: &str, args: &[Value]) -> Result<Value, Error> {
        let executor = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.module(module).cloned().ok_or_else(|| Error::unsupported_module(module))?
        };
        executor(entrypoint, args).map_err(|cause| Error::module_function_failure(module, entrypoint, &cause))
    }

    /// Struct method dispatch.
    ///
    /// Tries the value-receiver key first, then the pointer-receiver key.
    /// Pointer receivers pass the original (shared) struct through so
    /// mutations are observable in the caller; value receivers pass a deep
    /// copy. When a pointer-receiver method falls through to its implicit
    /// `return nil`, the (possibly mutated) receiver is pushed instead of
    /// that nil, since the method would otherwise return no useful value.
    fn call_method_on_struct(&mut self, receiver: &Value, method: &str, args: Vec<Value>) -> Result<Value, Error> {
        let Some(type_name) = receiver.struct_type_name() else {
            return Err(Error::undefined_method("<unknown>", method));
        };

        let value_key = format!("{type_name}.{method}");
        let pointer_key = format!("*{type_name}.{method}");

        let (key, pointer_receiver) = {
            let registry = self.registry.read().expect("registry lock poisoned");
            if registry.has_instruction_set(&value_key) {
                (value_key, false)
            } else if registry.has_instruction_set(&pointer_key) {
                (pointer_key, true)
            } else {
                return Err(Error::undefined_method(&type_name, method));
            }
        };

        let bound_receiver = if pointer_receiver { receiver.clone() } else { receiver.deep_clone() };
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(bound_receiver);
        call_args.extend(args);

        let result = self.invoke_script_key(&key, call_args)?;
        if pointer_receiver && matches!(result, Value::Nil) {
            return Ok(receiver.clone());
        }
        Ok(result)
    }

    /// `IMPORT path alias`.
    ///
    /// The compiler has already resolved `path`/`alias` down to a single
    /// bound name; the VM's job is to verify the module is known, mark it
    /// active, and bind a module sentinel into the current context so a
    /// later selector call resolves through `op_call_method`.
    pub(super) fn op_import(&mut self, instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        let name = instr.arg.as_str().ok_or_else(|| Error::type_mismatch("IMPORT", "expected a module name"))?.to_string();
        {
            let mut registry = self.registry.write().expect("registry lock poisoned");
            if !registry.is_module_registered(&name) {
                return Err(Error::unsupported_module(&name));
            }
            registry.activate_module(&name);
        }
        let handle = Value::Native(std::rc::Rc::new(NativeHandle::Module(name.clone())));
        self.contexts.create(name, handle, "module");
        Ok(Flow::Advance)
    }

    /// `REGIST_FUNCTION key descriptor`.
    ///
    /// Reserved for dynamic function registration; this crate's AST has no
    /// function-literal expressions, so the compiler never emits it, and no
    /// host-exposed way to carry a full instruction set through an
    /// `Instruction`'s operand exists either. The handler exists so the
    /// closed opcode set stays total over every `Opcode` value.
    pub(super) fn op_regist_function(&mut self, _instr: &Instruction, _pc: usize) -> Result<Flow, Error> {
        Ok(Flow::Advance)
    }
}
