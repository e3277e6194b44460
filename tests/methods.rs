//! Struct value and pointer receiver methods.

mod support;
use support::*;

use gosling::ast::{BinOp, Decl, Expr, FuncDecl, Receiver, ReceiverKind, Stmt, TypeDecl, TypeKind};
use gosling::{Script, Value};

fn field(target: &str, name: &str) -> Expr {
    Expr::Selector { expr: Box::new(ident(target)), field: name.to_string() }
}

fn call_method(target: &str, method: &str, args: Vec<Expr>) -> Expr {
    Expr::Call { func: Box::new(Expr::Selector { expr: Box::new(ident(target)), field: method.to_string() }), args }
}

/// A pointer-receiver method's mutation is observable through the caller's own binding.
#[test]
fn struct_value_and_pointer_receiver_methods() {
    let counter_type = Decl::Type(TypeDecl { name: "Counter".to_string(), kind: TypeKind::Struct { fields: vec!["n".to_string()] } });

    let inc = FuncDecl {
        name: "Inc".to_string(),
        receiver: Some(Receiver { name: "c".to_string(), type_name: "Counter".to_string(), kind: ReceiverKind::Pointer }),
        params: Vec::new(),
        body: vec![Stmt::Assign {
            target: field("c", "n"),
            value: bin(BinOp::Add, field("c", "n"), Expr::IntLit(1)),
            define: false,
        }],
    };

    let main_body = vec![
        define("c", Expr::CompositeLit { type_name: "Counter".to_string(), fields: vec![("n".to_string(), Expr::IntLit(5))] }),
        Stmt::Expr(call_method("c", "Inc", vec![])),
        Stmt::Return(Some(field("c", "n"))),
    ];

    let mut script =
        Script::from_ast(file_with(vec![counter_type, Decl::Func(inc), Decl::Func(main_func(main_body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(6)));
}

/// A value-receiver method's mutation is invisible to the caller.
#[test]
fn value_receiver_method_leaves_caller_unchanged() {
    let box_type = Decl::Type(TypeDecl { name: "Box".to_string(), kind: TypeKind::Struct { fields: vec!["n".to_string()] } });

    let double = FuncDecl {
        name: "Double".to_string(),
        receiver: Some(Receiver { name: "b".to_string(), type_name: "Box".to_string(), kind: ReceiverKind::Value }),
        params: Vec::new(),
        body: vec![
            Stmt::Assign { target: field("b", "n"), value: bin(BinOp::Mul, field("b", "n"), Expr::IntLit(2)), define: false },
            Stmt::Return(Some(ident("b"))),
        ],
    };

    let main_body = vec![
        define("orig", Expr::CompositeLit { type_name: "Box".to_string(), fields: vec![("n".to_string(), Expr::IntLit(3))] }),
        Stmt::Expr(call_method("orig", "Double", vec![])),
        Stmt::Return(Some(field("orig", "n"))),
    ];

    let mut script =
        Script::from_ast(file_with(vec![box_type, Decl::Func(double), Decl::Func(main_func(main_body))]));
    let (result, err) = script.run();
    assert!(err.is_none(), "unexpected error: {err:?}");
    assert!(result.unwrap().deep_eq(&Value::Int(3)));
}
