//! `goto`/label jumps.

mod support;
use support::*;

use gosling::ast::{BinOp, Decl, Expr, Stmt};
use gosling::{Script, Value};

/// `goto skip` jumps over an assignment straight to its label.
#[test]
fn goto_skips_to_label() {
    let body = vec![
        define("x", Expr::IntLit(0)),
        Stmt::Goto("skip".to_string()),
        assign("x", Expr::IntLit(99)),
        Stmt::Label("skip".to_string(), Box::new(assign("x", bin(BinOp::Add, ident("x"), Expr::IntLit(1))))),
        Stmt::Return(Some(ident("x"))),
    ];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(1)));
}
