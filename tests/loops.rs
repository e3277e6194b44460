//! Classic `for`, `for range`, and `break` scoping.

mod support;
use support::*;

use gosling::ast::{BinOp, Decl, Expr, Stmt};
use gosling::{Script, Value};

/// `for _, v := range nums { total += v }`.
#[test]
fn range_loop_sum() {
    let body = vec![
        define("total", Expr::IntLit(0)),
        define("nums", Expr::SliceLit { elems: vec![Expr::IntLit(1), Expr::IntLit(2), Expr::IntLit(3), Expr::IntLit(4)] }),
        Stmt::ForRange {
            key: None,
            value: Some("v".to_string()),
            expr: ident("nums"),
            body: vec![assign("total", bin(BinOp::Add, ident("total"), ident("v")))],
        },
        Stmt::Return(Some(ident("total"))),
    ];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(10)));
}

/// A `break` inside a nested `for` only exits the innermost loop.
#[test]
fn break_exits_innermost_loop_only() {
    let inner_body = vec![
        Stmt::If { cond: bin(BinOp::Eq, ident("j"), Expr::IntLit(1)), then_block: vec![Stmt::Break], else_block: None },
        assign("count", bin(BinOp::Add, ident("count"), Expr::IntLit(1))),
    ];
    let outer_body = vec![Stmt::For {
        init: Some(Box::new(define("j", Expr::IntLit(0)))),
        cond: Some(bin(BinOp::Lt, ident("j"), Expr::IntLit(3))),
        post: Some(Box::new(assign("j", bin(BinOp::Add, ident("j"), Expr::IntLit(1))))),
        body: inner_body,
    }];
    let body = vec![
        define("count", Expr::IntLit(0)),
        Stmt::For {
            init: Some(Box::new(define("i", Expr::IntLit(0)))),
            cond: Some(bin(BinOp::Lt, ident("i"), Expr::IntLit(3))),
            post: Some(Box::new(assign("i", bin(BinOp::Add, ident("i"), Expr::IntLit(1))))),
            body: outer_body,
        },
        Stmt::Return(Some(ident("count"))),
    ];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(3)));
}
