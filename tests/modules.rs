//! Built-in module calls via `import`.

mod support;
use support::*;

use gosling::ast::{Decl, Expr, ImportSpec, Stmt};
use gosling::{Script, Value};

/// `import "strings"` binds a module sentinel that `strings.ToUpper(...)` dispatches through.
#[test]
fn strings_module_call() {
    let body = vec![Stmt::Return(Some(Expr::Call {
        func: Box::new(Expr::Selector { expr: Box::new(ident("strings")), field: "ToUpper".to_string() }),
        args: vec![Expr::StringLit("hi".to_string())],
    }))];
    let mut file = file_with(vec![Decl::Func(main_func(body))]);
    file.imports.push(ImportSpec { path: "strings".to_string(), alias: None });

    let mut script = Script::from_ast(file);
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::str("HI")));
}
