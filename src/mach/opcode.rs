use super::{LocalFunction, Val};
use crate::error;
use crate::lang::{Error, LineNumber};
use std::rc::Rc;

/// ## Virtual machine instruction set
///
/// The BASIC virtual machine has no registers for expressions.
/// Every operation is performed on the stack.
///
/// For example: `LET A=3*B` compiles to `[Literal(3), Push(B), Mul, Pop(A)]`
///
/// Branches are symbolic. A `Target` is resolved through the line and
/// label maps of the linked executable, so statement fragments can be
/// compiled one at a time and concatenated without relocation.

#[derive(Clone, PartialEq)]
pub enum Opcode {
    // *** Stack manipulation
    /// Push literal value on to the stack.
    Literal(Val),
    /// Push stack value of named variable. Infallible.
    Push(Rc<str>),
    /// Pop stack value to named variable. This is the `LET` statement
    /// and may generate errors.
    Pop(Rc<str>),

    // *** Branch control
    /// Start of a statement. Debug only; removed when stripping.
    Line(LineNumber),
    Goto(Target),
    /// Pop stack and branch if true.
    JumpIf(Target),
    Gosub(Target),
    Return,
    /// Pop the result of a function program and end the activation.
    Exit,
    /// Pop step, to and from; start a loop on the named variable.
    For(Rc<str>),
    Next(Option<Rc<str>>),

    // *** Blocks skipped during execution
    /// A DATA statement: the following `len` opcodes are `Item` blocks.
    Data(usize),
    /// One DATA value computed by the following `len` opcodes.
    Item(usize),
    /// Inline function: name, parameters, body length.
    DefFn(Rc<str>, Rc<[Rc<str>]>, usize),

    // *** Statements
    Read(Rc<str>),
    Restore(Option<Target>),
    /// Function call with argument count.
    Fn(FnTarget, usize),
    /// CALL a program with argument count.
    Call(Rc<str>, usize),
    OnError(Option<Target>),
    Lock,
    Unlock,
    End,
    Stop,
    Print,
    Newline,

    // *** Expression operations
    Neg,
    Not,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Line(LineNumber),
    Label(Rc<str>),
}

/// Resolution state of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum FnTarget {
    /// Resolved at runtime: local table, builtins, then the catalog.
    Named(Rc<str>),
    /// Bound to a hoisted local function.
    Local(Rc<LocalFunction>),
}

impl FnTarget {
    pub fn name(&self) -> &Rc<str> {
        match self {
            FnTarget::Named(name) => name,
            FnTarget::Local(f) => &f.name,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Target::Line(n) => write!(f, "{}", n),
            Target::Label(s) => write!(f, "@{}", s),
        }
    }
}

impl std::str::FromStr for Target {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(label) = s.strip_prefix('@') {
            if !label.is_empty() {
                return Ok(Target::Label(label.into()));
            }
        } else if let Ok(n) = s.parse::<LineNumber>() {
            return Ok(Target::Line(n));
        }
        Err(error!(SyntaxError; "INVALID TARGET"))
    }
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        match self {
            Literal(v) => write!(f, "LIT {}", v.to_asm()),
            Push(s) => write!(f, "PUSH {}", s),
            Pop(s) => write!(f, "POP {}", s),

            Line(n) => write!(f, "LINE {}", n),
            Goto(t) => write!(f, "GOTO {}", t),
            JumpIf(t) => write!(f, "JUMPIF {}", t),
            Gosub(t) => write!(f, "GOSUB {}", t),
            Return => write!(f, "RETURN"),
            Exit => write!(f, "EXIT"),
            For(s) => write!(f, "FOR {}", s),
            Next(None) => write!(f, "NEXT"),
            Next(Some(s)) => write!(f, "NEXT {}", s),

            Data(len) => write!(f, "DATA {}", len),
            Item(len) => write!(f, "ITEM {}", len),
            DefFn(name, params, len) => {
                write!(f, "DEFFN {} {}", name, len)?;
                for param in params.iter() {
                    write!(f, " {}", param)?;
                }
                Ok(())
            }

            Read(s) => write!(f, "READ {}", s),
            Restore(None) => write!(f, "RESTORE"),
            Restore(Some(t)) => write!(f, "RESTORE {}", t),
            Fn(FnTarget::Named(name), argc) => write!(f, "FN {} {}", name, argc),
            Fn(FnTarget::Local(func), argc) => write!(f, "FNLOCAL {} {}", func.name, argc),
            Call(name, argc) => write!(f, "CALL {} {}", name, argc),
            OnError(None) => write!(f, "ONERROR"),
            OnError(Some(t)) => write!(f, "ONERROR {}", t),
            Lock => write!(f, "LOCK"),
            Unlock => write!(f, "UNLOCK"),
            End => write!(f, "END"),
            Stop => write!(f, "STOP"),
            Print => write!(f, "PRINT"),
            Newline => write!(f, "NEWLINE"),

            Neg => write!(f, "NEG"),
            Not => write!(f, "NOT"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            Eq => write!(f, "EQ"),
            NotEq => write!(f, "NOTEQ"),
            Lt => write!(f, "LT"),
            LtEq => write!(f, "LTEQ"),
            Gt => write!(f, "GT"),
            GtEq => write!(f, "GTEQ"),
            And => write!(f, "AND"),
            Or => write!(f, "OR"),
        }
    }
}

impl std::str::FromStr for Opcode {
    type Err = Error;

    /// Parse the assembly form. `FNLOCAL` reads back unresolved; hoisting
    /// binds it again after the next link.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (mnemonic, rest) = match s.find(' ') {
            Some(i) => (&s[..i], s[i + 1..].trim()),
            None => (s, ""),
        };
        let mut args = rest.split_whitespace();
        fn name(arg: Option<&str>) -> Result<Rc<str>, Error> {
            match arg {
                Some(s) => Ok(s.into()),
                None => Err(error!(SyntaxError; "MISSING OPERAND")),
            }
        }
        fn number<T: std::str::FromStr>(arg: Option<&str>) -> Result<T, Error> {
            match arg.map(str::parse::<T>) {
                Some(Ok(n)) => Ok(n),
                _ => Err(error!(SyntaxError; "INVALID OPERAND")),
            }
        }
        fn target(arg: Option<&str>) -> Result<Option<Target>, Error> {
            match arg {
                Some(s) => Ok(Some(s.parse()?)),
                None => Ok(None),
            }
        }
        fn required(t: Option<Target>) -> Result<Target, Error> {
            t.ok_or_else(|| error!(SyntaxError; "MISSING TARGET"))
        }
        use Opcode::*;
        let opcode = match mnemonic {
            "LIT" => Literal(Val::from_asm(rest)?),
            "PUSH" => Push(name(args.next())?),
            "POP" => Pop(name(args.next())?),
            "LINE" => Line(number(args.next())?),
            "GOTO" => Goto(required(target(args.next())?)?),
            "JUMPIF" => JumpIf(required(target(args.next())?)?),
            "GOSUB" => Gosub(required(target(args.next())?)?),
            "RETURN" => Return,
            "EXIT" => Exit,
            "FOR" => For(name(args.next())?),
            "NEXT" => Next(args.next().map(Rc::from)),
            "DATA" => Data(number(args.next())?),
            "ITEM" => Item(number(args.next())?),
            "DEFFN" => {
                let fn_name = name(args.next())?;
                let len = number(args.next())?;
                let params: Vec<Rc<str>> = args.by_ref().map(Rc::from).collect();
                DefFn(fn_name, params.into(), len)
            }
            "READ" => Read(name(args.next())?),
            "RESTORE" => Restore(target(args.next())?),
            "FN" | "FNLOCAL" => {
                let fn_name = name(args.next())?;
                Fn(FnTarget::Named(fn_name), number(args.next())?)
            }
            "CALL" => {
                let program = name(args.next())?;
                Call(program, number(args.next())?)
            }
            "ONERROR" => OnError(target(args.next())?),
            "LOCK" => Lock,
            "UNLOCK" => Unlock,
            "END" => End,
            "STOP" => Stop,
            "PRINT" => Print,
            "NEWLINE" => Newline,
            "NEG" => Neg,
            "NOT" => Not,
            "ADD" => Add,
            "SUB" => Sub,
            "MUL" => Mul,
            "DIV" => Div,
            "EQ" => Eq,
            "NOTEQ" => NotEq,
            "LT" => Lt,
            "LTEQ" => LtEq,
            "GT" => Gt,
            "GTEQ" => GtEq,
            "AND" => And,
            "OR" => Or,
            _ => return Err(error!(SyntaxError; format!("UNKNOWN OPCODE {}", mnemonic))),
        };
        if mnemonic != "LIT" && mnemonic != "DEFFN" && args.next().is_some() {
            return Err(error!(SyntaxError; "EXTRA OPERAND"));
        }
        Ok(opcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Opcode::Literal(Val::Double(3.0)).to_string(), "LIT 3.0");
        assert_eq!(
            Opcode::Goto(Target::Label("DONE".into())).to_string(),
            "GOTO @DONE"
        );
        assert_eq!(
            Opcode::DefFn("FNSQ".into(), vec![Rc::from("X")].into(), 3).to_string(),
            "DEFFN FNSQ 3 X"
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "LIT \"A B\"".parse::<Opcode>(),
            Ok(Opcode::Literal(Val::String("A B".into())))
        );
        assert_eq!(
            "JUMPIF 200".parse::<Opcode>(),
            Ok(Opcode::JumpIf(Target::Line(200)))
        );
        assert_eq!(
            "FNLOCAL FNSQ 1".parse::<Opcode>(),
            Ok(Opcode::Fn(FnTarget::Named("FNSQ".into()), 1))
        );
        assert_eq!("RESTORE".parse::<Opcode>(), Ok(Opcode::Restore(None)));
        assert!("GOTO".parse::<Opcode>().is_err());
        assert!("BOGUS".parse::<Opcode>().is_err());
        assert!("END 5".parse::<Opcode>().is_err());
    }
}
