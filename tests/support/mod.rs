//! Shared AST-builder helpers for the integration tests.
//!
//! No parser ships with this crate, so every integration test assembles an
//! `ast::File` node by node instead of writing source text. These helpers
//! trim the boilerplate that's otherwise identical across every test file.
#![allow(dead_code)]

use gosling::ast::{BinOp, Block, Decl, Expr, File, FuncDecl, Stmt};

pub fn ident(name: &str) -> Expr {
    Expr::Ident(name.to_string())
}

pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}

pub fn define(name: &str, value: Expr) -> Stmt {
    Stmt::Assign { target: ident(name), value, define: true }
}

pub fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::Assign { target: ident(name), value, define: false }
}

pub fn main_func(body: Block) -> FuncDecl {
    FuncDecl { name: "main".to_string(), receiver: None, params: Vec::new(), body }
}

pub fn file_with(decls: Vec<Decl>) -> File {
    File { package: "main".to_string(), imports: Vec::new(), decls }
}
