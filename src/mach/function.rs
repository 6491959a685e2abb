use super::Val;
use crate::error;
use crate::lang::Error;
use std::ops::RangeInclusive;

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in functions

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Function {
    Abs,
    Int,
    Len,
    Str,
    Err,
}

impl Function {
    pub fn find(name: &str) -> Option<Function> {
        match name {
            "ABS" => Some(Function::Abs),
            "INT" => Some(Function::Int),
            "LEN" => Some(Function::Len),
            "STR$" => Some(Function::Str),
            "ERR" => Some(Function::Err),
            _ => None,
        }
    }

    pub fn arity(self) -> RangeInclusive<usize> {
        match self {
            Function::Err => 0..=0,
            _ => 1..=1,
        }
    }

    /// `err` is the error register, the code of the last trapped error.
    pub fn call(self, mut args: Vec<Val>, err: i32) -> Result<Val> {
        if !self.arity().contains(&args.len()) {
            return Err(error!(IllegalFunctionCall; "WRONG NUMBER OF ARGUMENTS"));
        }
        if self == Function::Err {
            return Ok(Val::Integer(err));
        }
        let val = match args.pop() {
            Some(val) => val,
            None => return Err(error!(InternalError)),
        };
        use Val::*;
        match self {
            Function::Abs => match val {
                Integer(n) => match n.checked_abs() {
                    Some(n) => Ok(Integer(n)),
                    None => Err(error!(Overflow)),
                },
                Double(n) => Ok(Double(n.abs())),
                String(_) => Err(error!(TypeMismatch)),
            },
            Function::Int => match val {
                Integer(n) => Ok(Integer(n)),
                Double(n) => Ok(Double(n.floor())),
                String(_) => Err(error!(TypeMismatch)),
            },
            Function::Len => match val {
                String(s) => Ok(Integer(s.chars().count() as i32)),
                _ => Err(error!(TypeMismatch)),
            },
            Function::Str => match val {
                String(_) => Err(error!(TypeMismatch)),
                _ => Ok(String(val.to_string().into())),
            },
            Function::Err => Ok(Integer(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let f = Function::find("ABS").unwrap();
        assert_eq!(f.call(vec![Val::Integer(-3)], 0), Ok(Val::Integer(3)));
        let f = Function::find("STR$").unwrap();
        assert_eq!(
            f.call(vec![Val::Integer(12)], 0),
            Ok(Val::String(" 12".into()))
        );
        let f = Function::find("ERR").unwrap();
        assert_eq!(f.call(vec![], 11), Ok(Val::Integer(11)));
        assert!(f.call(vec![Val::Integer(1)], 11).is_err());
        assert_eq!(Function::find("FACT"), None);
    }
}
