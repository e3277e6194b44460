//! Lowering of expressions.

use super::Compiler;
use crate::{
    ast::{BinOp, Expr, UnOp},
    errors::Error,
    instr::{BinaryOpKind, Opcode, Operand, UnaryOpKind},
    value::Value,
};

impl Compiler {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<(), Error> {
        match expr {
            Expr::IntLit(i) => {
                self.emit(Opcode::LoadConst, Operand::Value(Value::Int(*i)), Operand::None);
            }
            Expr::FloatLit(f) => {
                self.emit(Opcode::LoadConst, Operand::Value(Value::Float(*f)), Operand::None);
            }
            Expr::StringLit(s) => {
                self.emit(Opcode::LoadConst, Operand::Value(Value::str(s.clone())), Operand::None);
            }
            Expr::BoolLit(b) => {
                self.emit(Opcode::LoadConst, Operand::Value(Value::Bool(*b)), Operand::None);
            }
            Expr::NilLit => {
                self.emit(Opcode::LoadConst, Operand::Value(Value::Nil), Operand::None);
            }
            Expr::Ident(name) => {
                self.emit(Opcode::LoadName, Operand::Str(name.clone()), Operand::None);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.compile_expr(lhs)?;
                self.compile_expr(rhs)?;
                self.emit(Opcode::BinaryOp, Operand::Str(binop_kind(*op).to_string()), Operand::None);
            }
            Expr::Unary { op, expr } => {
                self.compile_expr(expr)?;
                self.emit(Opcode::UnaryOp, Operand::Str(unop_kind(*op).to_string()), Operand::None);
            }
            Expr::Selector { expr, field } => {
                self.compile_expr(expr)?;
                self.emit(Opcode::GetField, Operand::Str(field.clone()), Operand::None);
            }
            Expr::Index { expr, index } => {
                self.compile_expr(expr)?;
                self.compile_expr(index)?;
                self.emit_simple(Opcode::GetIndex);
            }
            Expr::Call { func, args } => self.compile_call(func, args)?,
            Expr::CompositeLit { type_name, fields } => {
                self.emit(Opcode::NewStruct, Operand::Str(type_name.clone()), Operand::None);
                for (name, value) in fields {
                    self.compile_expr(value)?;
                    self.emit(Opcode::SetStructField, Operand::Str(name.clone()), Operand::None);
                }
            }
            Expr::SliceLit { elems } => {
                for elem in elems {
                    self.compile_expr(elem)?;
                }
                self.emit(Opcode::NewSlice, Operand::Int(elems.len() as i64), Operand::None);
            }
        }
        Ok(())
    }

    /// Lowers a call expression.
    ///
    /// A plain identifier callee emits `CALL name argc`. A selector callee
    /// `x.m(...)` pushes the receiver expression's value first, then the
    /// arguments, then emits `CALL_METHOD m argc`: the VM decides at
    /// dispatch time whether the receiver is a struct (method dispatch) or a
    /// module sentinel (module-qualified call), since the compiler cannot
    /// always tell which without running type inference this crate doesn't do.
    fn compile_call(&mut self, func: &Expr, args: &[Expr]) -> Result<(), Error> {
        match func {
            Expr::Ident(name) => {
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(Opcode::Call, Operand::Str(name.clone()), Operand::Int(args.len() as i64));
            }
            Expr::Selector { expr, field } => {
                self.compile_expr(expr)?;
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(Opcode::CallMethod, Operand::Str(field.clone()), Operand::Int(args.len() as i64));
            }
            other => {
                return Err(Error::compile_failure(format!("unsupported call target {other:?}")));
            }
        }
        Ok(())
    }
}

fn binop_kind(op: BinOp) -> BinaryOpKind {
    match op {
        BinOp::Add => BinaryOpKind::Add,
        BinOp::Sub => BinaryOpKind::Sub,
        BinOp::Mul => BinaryOpKind::Mul,
        BinOp::Div => BinaryOpKind::Div,
        BinOp::Mod => BinaryOpKind::Mod,
        BinOp::Eq => BinaryOpKind::Eq,
        BinOp::Neq => BinaryOpKind::Neq,
        BinOp::Lt => BinaryOpKind::Lt,
        BinOp::Le => BinaryOpKind::Le,
        BinOp::Gt => BinaryOpKind::Gt,
        BinOp::Ge => BinaryOpKind::Ge,
        BinOp::And => BinaryOpKind::And,
        BinOp::Or => BinaryOpKind::Or,
    }
}

fn unop_kind(op: UnOp) -> UnaryOpKind {
    match op {
        UnOp::Neg => UnaryOpKind::Neg,
        UnOp::Not => UnaryOpKind::Not,
    }
}
