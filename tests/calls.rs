//! Function invocation: recursion, direct native calls with no compiled
//! program at all, and wrong-arity calls.

mod support;
use support::*;

use gosling::ast::{BinOp, Decl, Expr, FuncDecl, Stmt};
use gosling::{ErrorKind, Script, Value};
use std::sync::Arc;

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call { func: Box::new(ident(name)), args }
}

/// `func fact(n){ if n<=1 {return 1}; return n*fact(n-1) }` called from `main`.
#[test]
fn recursive_factorial() {
    let fact_body = vec![
        Stmt::If {
            cond: bin(BinOp::Le, ident("n"), Expr::IntLit(1)),
            then_block: vec![Stmt::Return(Some(Expr::IntLit(1)))],
            else_block: None,
        },
        Stmt::Return(Some(bin(
            BinOp::Mul,
            ident("n"),
            call("fact", vec![bin(BinOp::Sub, ident("n"), Expr::IntLit(1))]),
        ))),
    ];
    let fact = FuncDecl { name: "fact".to_string(), receiver: None, params: vec!["n".to_string()], body: fact_body };

    let main_body = vec![Stmt::Return(Some(call("fact", vec![Expr::IntLit(5)])))];
    let mut script =
        Script::from_ast(file_with(vec![Decl::Func(fact), Decl::Func(main_func(main_body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(120)));
}

/// A host can invoke a registered native directly via `call_function` even
/// when the source has no declarations at all.
#[test]
fn empty_source_still_allows_native_calls() {
    let mut script = Script::from_ast(file_with(vec![]));
    script.add_function("double", Arc::new(|args: &[Value]| {
        let Value::Int(n) = args[0] else { unreachable!() };
        Ok(Value::Int(n * 2))
    }));
    let (result, err) = script.call_function("double", &[Value::Int(21)]);
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(42)));
}

/// `func add(a,b){ return a+b }` called with one argument is a `TypeMismatch`,
/// not a silently mis-bound parameter.
#[test]
fn calling_function_with_wrong_arity_is_an_error() {
    let add = FuncDecl {
        name: "add".to_string(),
        receiver: None,
        params: vec!["a".to_string(), "b".to_string()],
        body: vec![Stmt::Return(Some(bin(BinOp::Add, ident("a"), ident("b"))))],
    };
    let main_body = vec![Stmt::Return(Some(call("add", vec![Expr::IntLit(1)])))];
    let mut script =
        Script::from_ast(file_with(vec![Decl::Func(add), Decl::Func(main_func(main_body))]));
    let (result, err) = script.run();
    assert!(result.is_none());
    assert_eq!(err.unwrap().kind(), ErrorKind::TypeMismatch);
}
