//! Package-level `var` declarations.

mod support;
use support::*;

use gosling::ast::{Decl, Expr, Stmt, VarDecl};
use gosling::{Script, Value};

/// A package-level `var`'s initializer runs (as part of `"<pkg>.init"`)
/// before `main`, and the binding is visible from it.
#[test]
fn package_level_var_runs_before_main() {
    let greeting = Decl::Var(VarDecl { name: "greeting".to_string(), value: Some(Expr::StringLit("hello".to_string())) });
    let main_body = vec![Stmt::Return(Some(ident("greeting")))];
    let mut script = Script::from_ast(file_with(vec![greeting, Decl::Func(main_func(main_body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::str("hello")));
}
