//! Operator semantics on primitive values.
//!
//! Callers convert objects to primitives first (that step may run script
//! `toString` methods and therefore lives in the interpreter).

use crate::ast::BinaryOperator;
use crate::runtime::value::Value;

/// Abstract equality comparison (`==`), with type coercion.
pub fn abstract_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (Value::Null | Value::Undefined, _) | (_, Value::Null | Value::Undefined) => false,

        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            *n == Value::String(s.clone()).to_number()
        }

        (Value::Boolean(b_val), other) if !matches!(other, Value::Boolean(_)) => {
            abstract_equals(&Value::Number(if *b_val { 1.0 } else { 0.0 }), other)
        }
        (other, Value::Boolean(b_val)) if !matches!(other, Value::Boolean(_)) => {
            abstract_equals(other, &Value::Number(if *b_val { 1.0 } else { 0.0 }))
        }

        _ => strict_equals(a, b),
    }
}

/// Strict equality comparison (`===`). References compare by identity.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    a == b
}

/// `+` on primitives: concatenation when either side is a string.
pub fn add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::String(x), y) => Value::String(format!("{}{}", x, y)),
        (x, Value::String(y)) => Value::String(format!("{}{}", x, y)),
        (x, y) => Value::Number(x.to_number() + y.to_number()),
    }
}

/// Numeric and relational binary operators on primitives.
///
/// Returns `None` for operators that need the interpreter (`+`,
/// `instanceof`).
pub fn binary(operator: BinaryOperator, a: &Value, b: &Value) -> Option<Value> {
    let value = match operator {
        BinaryOperator::Subtract => Value::Number(a.to_number() - b.to_number()),
        BinaryOperator::Multiply => Value::Number(a.to_number() * b.to_number()),
        BinaryOperator::Divide => Value::Number(a.to_number() / b.to_number()),
        BinaryOperator::Modulo => Value::Number(a.to_number() % b.to_number()),
        BinaryOperator::Equal => Value::Boolean(abstract_equals(a, b)),
        BinaryOperator::NotEqual => Value::Boolean(!abstract_equals(a, b)),
        BinaryOperator::StrictEqual => Value::Boolean(strict_equals(a, b)),
        BinaryOperator::StrictNotEqual => Value::Boolean(!strict_equals(a, b)),
        BinaryOperator::LessThan => compare(a, b, |o| o.is_lt()),
        BinaryOperator::LessThanEqual => compare(a, b, |o| o.is_le()),
        BinaryOperator::GreaterThan => compare(a, b, |o| o.is_gt()),
        BinaryOperator::GreaterThanEqual => compare(a, b, |o| o.is_ge()),
        BinaryOperator::Add | BinaryOperator::InstanceOf => return None,
    };
    Some(value)
}

fn compare(a: &Value, b: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    let ordering = match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    };
    // NaN compares false both ways
    Value::Boolean(ordering.is_some_and(test))
}
