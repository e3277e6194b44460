//! The AST node contract an external parser is assumed to produce.
//!
//! Lexing and parsing are explicitly out of scope for this crate — the host
//! language's own parser produces the AST, with the usual Go-flavored node
//! kinds. This module defines that contract as plain data — no lexer or
//! parser ships here. A host embeds
//! this interpreter by building `ast::File` values with its own Go parser
//! (or any other front end that targets this shape) and passing them to
//! `Script::from_ast`.

/// A compiled source file: a package clause, imports, and top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub path: String,
    /// Explicit alias, or `None` to default to the path's final segment.
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeDecl),
    /// Package-level variable declaration; initializers are collected into `"<pkg>.init"`.
    Var(VarDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub params: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    Value,
    Pointer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub name: String,
    pub type_name: String,
    pub kind: ReceiverKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Struct { fields: Vec<String> },
    Interface { methods: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub value: Option<Expr>,
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `:=` (define=true) or `=` (define=false). `:=` emits a CREATE_VAR
    /// before the store; plain `=` emits STORE_NAME only.
    Assign { target: Expr, value: Expr, define: bool },
    Expr(Expr),
    If { cond: Expr, then_block: Block, else_block: Option<Block> },
    /// Classic three-clause or bare-infinite `for`.
    For { init: Option<Box<Stmt>>, cond: Option<Expr>, post: Option<Box<Stmt>>, body: Block },
    /// `for k, v := range expr { ... }`.
    ForRange { key: Option<String>, value: Option<String>, expr: Expr, body: Block },
    Return(Option<Expr>),
    Break,
    Block(Block),
    Goto(String),
    Label(String, Box<Stmt>),
    Switch { tag: Option<Expr>, cases: Vec<(Vec<Expr>, Block)>, default: Option<Block> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    BoolLit(bool),
    NilLit,
    Ident(String),
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnOp, expr: Box<Expr> },
    /// `x.f` — struct field read or a module-qualified identifier.
    Selector { expr: Box<Expr>, field: String },
    Index { expr: Box<Expr>, index: Box<Expr> },
    Call { func: Box<Expr>, args: Vec<Expr> },
    /// `T{f1: v1, f2: v2}`.
    CompositeLit { type_name: String, fields: Vec<(String, Expr)> },
    /// `[]T{e0, e1, ...}`.
    SliceLit { elems: Vec<Expr> },
}
