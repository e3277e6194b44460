//! `BINARY_OP` / `UNARY_OP` semantics and coercions.

use crate::{
    errors::Error,
    instr::{BinaryOpKind, UnaryOpKind},
    value::Value,
};

/// Applies a binary operator to two already-popped operands.
///
/// Numeric coercion: `int op float` and `float op int` promote to float.
/// `Eq`/`Neq` use deep structural equality over any value pair.
/// `And`/`Or` are plain (non-short-circuiting) logical operators over
/// truthiness.
pub fn apply_binary(op: BinaryOpKind, lhs: Value, rhs: Value) -> Result<Value, Error> {
    use BinaryOpKind::{Add, And, Div, Eq, Ge, Gt, Le, Lt, Mod, Mul, Neq, Or, Sub};

    match op {
        Eq => return Ok(Value::Bool(lhs.deep_eq(&rhs))),
        Neq => return Ok(Value::Bool(!lhs.deep_eq(&rhs))),
        And => return Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
        Or => return Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
        _ => {}
    }

    if let (Value::Str(a), Value::Str(b)) = (&lhs, &rhs) {
        return match op {
            Add => Ok(Value::str(format!("{a}{b}"))),
            Lt => Ok(Value::Bool(a.as_ref() < b.as_ref())),
            Le => Ok(Value::Bool(a.as_ref() <= b.as_ref())),
            Gt => Ok(Value::Bool(a.as_ref() > b.as_ref())),
            Ge => Ok(Value::Bool(a.as_ref() >= b.as_ref())),
            _ => Err(Error::type_mismatch("binary op on strings", "unsupported operator")),
        };
    }

    match (op, as_number(&lhs), as_number(&rhs)) {
        (Mod, _, _) => {
            let (a, b) = as_int_pair(&lhs, &rhs)?;
            if b == 0 {
                return Err(Error::modulo_by_zero());
            }
            Ok(Value::Int(a % b))
        }
        (_, Some(Number::Int(a)), Some(Number::Int(b))) => match op {
            Add => Ok(Value::Int(a + b)),
            Sub => Ok(Value::Int(a - b)),
            Mul => Ok(Value::Int(a * b)),
            Div => {
                if b == 0 {
                    Err(Error::division_by_zero())
                } else {
                    Ok(Value::Int(a / b))
                }
            }
            Lt => Ok(Value::Bool(a < b)),
            Le => Ok(Value::Bool(a <= b)),
            Gt => Ok(Value::Bool(a > b)),
            Ge => Ok(Value::Bool(a >= b)),
            And | Or | Eq | Neq | Mod => unreachable!("handled above"),
        },
        (_, Some(a), Some(b)) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            match op {
                Add => Ok(Value::Float(a + b)),
                Sub => Ok(Value::Float(a - b)),
                Mul => Ok(Value::Float(a * b)),
                Div => {
                    if b == 0.0 {
                        Err(Error::division_by_zero())
                    } else {
                        Ok(Value::Float(a / b))
                    }
                }
                Lt => Ok(Value::Bool(a < b)),
                Le => Ok(Value::Bool(a <= b)),
                Gt => Ok(Value::Bool(a > b)),
                Ge => Ok(Value::Bool(a >= b)),
                And | Or | Eq | Neq | Mod => unreachable!("handled above"),
            }
        }
        _ => Err(Error::type_mismatch("binary op", "operands are not both numeric")),
    }
}

/// Applies a unary operator to an already-popped operand.
pub fn apply_unary(op: UnaryOpKind, operand: Value) -> Result<Value, Error> {
    match (op, &operand) {
        (UnaryOpKind::Neg, Value::Int(i)) => Ok(Value::Int(-i)),
        (UnaryOpKind::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOpKind::Neg, _) => Err(Error::type_mismatch("unary -", operand.type_tag())),
        (UnaryOpKind::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
        }
    }
}

fn as_number(v: &Value) -> Option<Number> {
    match v {
        Value::Int(i) => Some(Number::Int(*i)),
        Value::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

fn as_int_pair(lhs: &Value, rhs: &Value) -> Result<(i64, i64), Error> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        _ => Err(Error::type_mismatch("%", "modulo requires two integers")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_add() {
        let result = apply_binary(BinaryOpKind::Add, Value::Int(2), Value::Int(3)).unwrap();
        assert!(result.deep_eq(&Value::Int(5)));
    }

    #[test]
    fn mixed_int_float_promotes_to_float() {
        let result = apply_binary(BinaryOpKind::Add, Value::Int(2), Value::Float(0.5)).unwrap();
        assert!(result.deep_eq(&Value::Float(2.5)));
    }

    #[test]
    fn string_concatenation() {
        let result = apply_binary(BinaryOpKind::Add, Value::str("foo"), Value::str("bar")).unwrap();
        assert!(result.deep_eq(&Value::str("foobar")));
    }

    #[test]
    fn division_by_zero_errors() {
        assert!(apply_binary(BinaryOpKind::Div, Value::Int(1), Value::Int(0)).is_err());
    }

    #[test]
    fn modulo_by_zero_errors() {
        assert!(apply_binary(BinaryOpKind::Mod, Value::Int(1), Value::Int(0)).is_err());
    }

    #[test]
    fn modulo_requires_integers() {
        assert!(apply_binary(BinaryOpKind::Mod, Value::Float(1.5), Value::Int(1)).is_err());
    }

    #[test]
    fn unary_not_uses_truthiness() {
        assert!(apply_unary(UnaryOpKind::Not, Value::Int(0)).unwrap().deep_eq(&Value::Bool(true)));
        assert!(apply_unary(UnaryOpKind::Not, Value::Int(1)).unwrap().deep_eq(&Value::Bool(false)));
    }
}
