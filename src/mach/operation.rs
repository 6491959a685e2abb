use super::{Opcode, Stack, Val};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

pub struct Operation {}

impl Operation {
    /// Evaluate a pure expression opcode against the operand stack.
    /// Returns `false` when the opcode needs the machine.
    pub fn apply(opcode: &Opcode, stack: &mut Stack<Val>) -> Result<bool> {
        use Opcode::*;
        match opcode {
            Literal(val) => stack.push(val.clone())?,
            Neg => {
                let val = stack.pop()?;
                stack.push(Operation::negate(val)?)?
            }
            Not => {
                let val = stack.pop()?;
                stack.push(Operation::not(val)?)?
            }
            Add | Sub | Mul | Div | Eq | NotEq | Lt | LtEq | Gt | GtEq | And | Or => {
                let (lhs, rhs) = stack.pop_2()?;
                stack.push(Operation::binary(opcode, lhs, rhs)?)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn binary(opcode: &Opcode, lhs: Val, rhs: Val) -> Result<Val> {
        use std::cmp::Ordering::*;
        use Opcode::*;
        match opcode {
            Add => Operation::sum(lhs, rhs),
            Sub => Operation::subtract(lhs, rhs),
            Mul => Operation::multiply(lhs, rhs),
            Div => Operation::divide(lhs, rhs),
            Eq => Operation::compare(lhs, rhs, |o| o == Equal),
            NotEq => Operation::compare(lhs, rhs, |o| o != Equal),
            Lt => Operation::compare(lhs, rhs, |o| o == Less),
            LtEq => Operation::compare(lhs, rhs, |o| o != Greater),
            Gt => Operation::compare(lhs, rhs, |o| o == Greater),
            GtEq => Operation::compare(lhs, rhs, |o| o != Less),
            And => Operation::and(lhs, rhs),
            Or => Operation::or(lhs, rhs),
            _ => Err(error!(InternalError; "NOT A BINARY OPERATION")),
        }
    }

    pub fn negate(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Overflow)),
            },
            Double(n) => Ok(Double(-n)),
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn not(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Integer(n) => Ok(Integer(!n)),
            Double(_) => Ok(Integer(!i32::try_from(val)?)),
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn sum(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(l), String(r)) => Ok(String((l.to_string() + &r).into())),
            (Integer(l), Integer(r)) => match l.checked_add(r) {
                Some(i) => Ok(Integer(i)),
                None => Err(error!(Overflow)),
            },
            (String(_), _) | (_, String(_)) => Err(error!(TypeMismatch)),
            (l, r) => Ok(Double(f64::try_from(l)? + f64::try_from(r)?)),
        }
    }

    pub fn subtract(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Integer(l), Integer(r)) => match l.checked_sub(r) {
                Some(i) => Ok(Integer(i)),
                None => Err(error!(Overflow)),
            },
            (String(_), _) | (_, String(_)) => Err(error!(TypeMismatch)),
            (l, r) => Ok(Double(f64::try_from(l)? - f64::try_from(r)?)),
        }
    }

    pub fn multiply(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Integer(l), Integer(r)) => match l.checked_mul(r) {
                Some(i) => Ok(Integer(i)),
                None => Err(error!(Overflow)),
            },
            (String(_), _) | (_, String(_)) => Err(error!(TypeMismatch)),
            (l, r) => Ok(Double(f64::try_from(l)? * f64::try_from(r)?)),
        }
    }

    /// Division always produces a double.
    pub fn divide(lhs: Val, rhs: Val) -> Result<Val> {
        let l = f64::try_from(lhs)?;
        let r = f64::try_from(rhs)?;
        if r == 0.0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Double(l / r))
    }

    /// Comparisons yield -1 for true and 0 for false.
    pub fn compare(
        lhs: Val,
        rhs: Val,
        test: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Val> {
        use Val::*;
        let ordering = match (lhs, rhs) {
            (String(l), String(r)) => l.cmp(&r),
            (Integer(l), Integer(r)) => l.cmp(&r),
            (String(_), _) | (_, String(_)) => return Err(error!(TypeMismatch)),
            (l, r) => match f64::try_from(l)?.partial_cmp(&f64::try_from(r)?) {
                Some(o) => o,
                None => return Err(error!(Overflow)),
            },
        };
        Ok(Integer(if test(ordering) { -1 } else { 0 }))
    }

    pub fn and(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::Integer(i32::try_from(lhs)? & i32::try_from(rhs)?))
    }

    pub fn or(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::Integer(i32::try_from(lhs)? | i32::try_from(rhs)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        assert_eq!(
            Operation::sum(Val::Integer(2), Val::Integer(3)),
            Ok(Val::Integer(5))
        );
        assert_eq!(
            Operation::sum(Val::Integer(2), Val::Double(0.5)),
            Ok(Val::Double(2.5))
        );
        assert_eq!(
            Operation::sum(Val::String("A".into()), Val::String("B".into())),
            Ok(Val::String("AB".into()))
        );
        assert_eq!(
            Operation::sum(Val::Integer(i32::MAX), Val::Integer(1)).map_err(|e| e.code()),
            Err(crate::lang::ErrorCode::Overflow)
        );
    }

    #[test]
    fn test_divide() {
        assert_eq!(
            Operation::divide(Val::Integer(7), Val::Integer(2)),
            Ok(Val::Double(3.5))
        );
        assert_eq!(
            Operation::divide(Val::Integer(7), Val::Integer(0)).map_err(|e| e.code()),
            Err(crate::lang::ErrorCode::DivisionByZero)
        );
    }

    #[test]
    fn test_apply() {
        let mut stack: Stack<Val> = Stack::new("TEST STACK");
        for op in &[
            Opcode::Literal(Val::Integer(2)),
            Opcode::Literal(Val::Integer(3)),
            Opcode::Lt,
            Opcode::Not,
        ] {
            assert!(Operation::apply(op, &mut stack).unwrap());
        }
        assert_eq!(stack.pop(), Ok(Val::Integer(0)));
        assert!(!Operation::apply(&Opcode::Print, &mut stack).unwrap());
    }
}
