use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use std::rc::Rc;

/// ## Runtime values

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Integer(i32),
    Double(f64),
    String(Rc<str>),
}

impl Val {
    pub fn is_true(&self) -> Result<bool, Error> {
        match self {
            Val::Integer(n) => Ok(*n != 0),
            Val::Double(n) => Ok(*n != 0.0),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }

    /// Assembly form; strings are quoted and doubles always show a fraction.
    pub fn to_asm(&self) -> String {
        match self {
            Val::Integer(n) => n.to_string(),
            Val::Double(n) => format!("{:?}", n),
            Val::String(s) => format!("\"{}\"", s),
        }
    }

    pub fn from_asm(s: &str) -> Result<Val, Error> {
        if let Some(stripped) = s.strip_prefix('"') {
            if let Some(inner) = stripped.strip_suffix('"') {
                return Ok(Val::String(inner.into()));
            }
            return Err(error!(SyntaxError; "UNTERMINATED STRING"));
        }
        if let Ok(n) = s.parse::<i32>() {
            return Ok(Val::Integer(n));
        }
        match s.parse::<f64>() {
            Ok(n) => Ok(Val::Double(n)),
            Err(_) => Err(error!(SyntaxError; "INVALID LITERAL")),
        }
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Val::*;
        match self {
            String(s) => write!(f, "{}", s),
            Integer(num) => {
                if *num < 0 {
                    write!(f, "{}", num)
                } else {
                    write!(f, " {}", num)
                }
            }
            Double(num) => {
                let s = format!("{}", num);
                if *num < 0.0 {
                    write!(f, "{}", s)
                } else {
                    write!(f, " {}", s)
                }
            }
        }
    }
}

impl TryFrom<Val> for i32 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self, Self::Error> {
        match val {
            Val::Integer(n) => Ok(n),
            Val::Double(n) => {
                let n = n.floor();
                if n.is_finite() && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
                    Ok(n as i32)
                } else {
                    Err(error!(Overflow))
                }
            }
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<Val> for f64 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self, Self::Error> {
        match val {
            Val::Integer(n) => Ok(n as f64),
            Val::Double(n) => Ok(n),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<Val> for Rc<str> {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self, Self::Error> {
        match val {
            Val::String(s) => Ok(s),
            _ => Err(error!(TypeMismatch)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Val::Integer(5).to_string(), " 5");
        assert_eq!(Val::Integer(-5).to_string(), "-5");
        assert_eq!(Val::Double(2.5).to_string(), " 2.5");
        assert_eq!(Val::String("A".into()).to_string(), "A");
    }

    #[test]
    fn test_asm() {
        assert_eq!(Val::Double(3.0).to_asm(), "3.0");
        assert_eq!(Val::from_asm("3.0"), Ok(Val::Double(3.0)));
        assert_eq!(Val::from_asm("-7"), Ok(Val::Integer(-7)));
        assert_eq!(Val::from_asm("\"HI THERE\""), Ok(Val::String("HI THERE".into())));
    }
}
