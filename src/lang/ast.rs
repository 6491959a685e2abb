use super::token::Word;
use super::LineNumber;
use std::rc::Rc;

/// One parsed source line: an optional label and at most one statement.
#[derive(Debug, PartialEq, Default)]
pub struct Parsed {
    pub label: Option<Rc<str>>,
    pub statement: Option<Statement>,
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    Call(Rc<str>, Vec<Expression>),
    Data(Vec<Expression>),
    /// `PROGRAM`, `FUNCTION`, `VERB` or `TEST` header.
    Declare(Word, Rc<str>, Vec<Rc<str>>),
    Def(Rc<str>, Vec<Rc<str>>, Expression),
    End,
    For(Rc<str>, Expression, Expression, Option<Expression>),
    Gosub(Target),
    Goto(Target),
    If(Expression, Target, Option<Target>),
    Let(Rc<str>, Expression),
    Lock(Expression),
    Next(Option<Rc<str>>),
    /// `ON ERROR GOTO 0` parses to `None` and disables the trap.
    OnErrorGoto(Option<Target>),
    Print(Vec<PrintItem>, bool),
    Read(Vec<Rc<str>>),
    Rem,
    Restore(Option<Target>),
    Return(Option<Expression>),
    Stop,
    Unlock(Expression),
}

/// A branch destination as written in the source.
#[derive(Debug, PartialEq, Clone)]
pub enum Target {
    /// Line number and the index of its token in the line.
    Line(LineNumber, usize),
    Label(Rc<str>),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOp {
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

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Integer(i32),
    Double(f64),
    String(Rc<str>),
    Var(Rc<str>),
    Call(Rc<str>, Vec<Expression>),
    Negation(Box<Expression>),
    Not(Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

#[derive(Debug, PartialEq)]
pub enum PrintItem {
    Expression(Expression),
    Tab,
}

impl Expression {
    /// True when the expression can be evaluated without variables or calls.
    pub fn is_constant(&self) -> bool {
        use Expression::*;
        match self {
            Integer(_) | Double(_) | String(_) => true,
            Var(_) | Call(..) => false,
            Negation(expr) | Not(expr) => expr.is_constant(),
            Binary(_, lhs, rhs) => lhs.is_constant() && rhs.is_constant(),
        }
    }
}

pub trait Visitor {
    fn visit_statement(&mut self, _: &Statement) {}
    fn visit_target(&mut self, _: &Target) {}
    fn visit_expression(&mut self, _: &Expression) {}
}

pub trait AcceptVisitor {
    fn accept<V: Visitor>(&self, visitor: &mut V);
}

impl AcceptVisitor for Target {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_target(self)
    }
}

impl AcceptVisitor for Statement {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        use Statement::*;
        match self {
            Declare(..) | End | Next(_) | Read(_) | Rem | Stop => {}
            Call(_, vec_expr) | Data(vec_expr) => {
                for expr in vec_expr {
                    expr.accept(visitor);
                }
            }
            Def(_, _, expr) | Let(_, expr) | Lock(expr) | Unlock(expr) => expr.accept(visitor),
            For(_, expr1, expr2, expr3) => {
                expr1.accept(visitor);
                expr2.accept(visitor);
                if let Some(expr3) = expr3 {
                    expr3.accept(visitor);
                }
            }
            Gosub(target) | Goto(target) => target.accept(visitor),
            If(predicate, then, otherwise) => {
                predicate.accept(visitor);
                then.accept(visitor);
                if let Some(otherwise) = otherwise {
                    otherwise.accept(visitor);
                }
            }
            OnErrorGoto(target) | Restore(target) => {
                if let Some(target) = target {
                    target.accept(visitor);
                }
            }
            Print(items, _) => {
                for item in items {
                    if let PrintItem::Expression(expr) = item {
                        expr.accept(visitor);
                    }
                }
            }
            Return(expr) => {
                if let Some(expr) = expr {
                    expr.accept(visitor);
                }
            }
        }
        visitor.visit_statement(self)
    }
}

impl AcceptVisitor for Expression {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        use Expression::*;
        match self {
            Integer(_) | Double(_) | String(_) | Var(_) => {}
            Call(_, vec_expr) => {
                for expr in vec_expr {
                    expr.accept(visitor);
                }
            }
            Negation(expr) | Not(expr) => expr.accept(visitor),
            Binary(_, expr1, expr2) => {
                expr1.accept(visitor);
                expr2.accept(visitor);
            }
        }
        visitor.visit_expression(self)
    }
}
