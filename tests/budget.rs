//! Instruction budget enforcement.

mod support;
use support::*;

use gosling::ast::{BinOp, Decl, Expr, Stmt};
use gosling::{ErrorKind, Script};

/// A tight instruction budget trips before a long-running loop can finish.
#[test]
fn instruction_budget_exceeded() {
    let body = vec![
        define("x", Expr::IntLit(0)),
        Stmt::For {
            init: None,
            cond: Some(bin(BinOp::Lt, ident("x"), Expr::IntLit(1_000_000))),
            post: None,
            body: vec![assign("x", bin(BinOp::Add, ident("x"), Expr::IntLit(1)))],
        },
        Stmt::Return(Some(ident("x"))),
    ];
    let mut script = Script::from_ast(file_with(vec![Decl::Func(main_func(body))]));
    script.set_max_instructions(20);
    let (result, err) = script.run();
    assert!(result.is_none());
    assert_eq!(err.unwrap().kind(), ErrorKind::InstructionLimitExceeded);
}
