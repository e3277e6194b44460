//! Expression evaluation: arithmetic, unary/comparison operators, bare
//! `return`, and out-of-range slice indexing.

mod support;
use support::*;

use gosling::ast::{BinOp, Decl, Expr, Stmt, UnOp};
use gosling::{ErrorKind, Script, Value};

/// `func main(){ x:=10; y:=20; return x+y }` -> 30.
#[test]
fn addition_of_two_locals() {
    let body = vec![
        define("x", Expr::IntLit(10)),
        define("y", Expr::IntLit(20)),
        Stmt::Return(Some(bin(BinOp::Add, ident("x"), ident("y")))),
    ];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(30)));
}

/// `apply_unary` `Not` and string comparisons, exercised through a whole program.
#[test]
fn unary_not_and_string_comparison() {
    let body = vec![
        define(
            "ok",
            Expr::Unary {
                op: UnOp::Not,
                expr: Box::new(bin(BinOp::Lt, Expr::StringLit("b".to_string()), Expr::StringLit("a".to_string()))),
            },
        ),
        Stmt::Return(Some(ident("ok"))),
    ];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Bool(true)));
}

/// A bare `return` yields `nil`.
#[test]
fn bare_return_yields_nil() {
    let body = vec![Stmt::Return(None)];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Nil));
}

/// Out-of-range slice indexing is a real error, not a silent nil (see
/// DESIGN.md for why this crate departs from the source corpus here).
#[test]
fn out_of_range_index_is_an_error() {
    let body = vec![
        define("s", Expr::SliceLit { elems: vec![Expr::IntLit(1), Expr::IntLit(2)] }),
        Stmt::Return(Some(Expr::Index { expr: Box::new(ident("s")), index: Box::new(Expr::IntLit(5)) })),
    ];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    let (result, err) = script.run();
    assert!(result.is_none());
    assert_eq!(err.unwrap().kind(), ErrorKind::IndexOutOfRange);
}
