use super::{Address, DataFragment, Executable, LocalFunction, Statement, Val};
use crate::error;
use crate::lang::token::Word;
use crate::lang::{Error, LineNumber};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Program
///
/// An editable list of statements plus everything derived from it:
/// the linked executable, hoisted local functions and the DATA cache.
/// One `Program` is shared by all of its recursive activations.

#[derive(Debug, Clone)]
pub struct Program {
    pub(super) name: Rc<str>,
    pub(super) kind: ProgramKind,
    pub(super) params: Vec<Rc<str>>,
    pub(super) statements: Vec<Statement>,
    pub(super) cursor: Option<LineNumber>,
    pub(super) run_count: usize,
    pub(super) registered: bool,
    pub(super) system: bool,
    pub(super) modified: bool,
    pub(super) protected: bool,
    pub(super) static_types: bool,
    pub(super) active: bool,
    pub(super) executable: Option<Executable>,
    pub(super) local_functions: HashMap<Rc<str>, Rc<LocalFunction>>,
    pub(super) data: Option<Vec<DataFragment>>,
    pub(super) data_cursor: usize,
    pub(super) data_end: bool,
    pub(super) loops: Vec<LoopFrame>,
    pub(super) gosubs: Vec<Address>,
    pub(super) source: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Program,
    Function,
    Verb,
    Test,
}

/// A `PROGRAM`, `FUNCTION`, `VERB` or `TEST` header statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: ProgramKind,
    pub name: Rc<str>,
    pub params: Vec<Rc<str>>,
}

/// An open FOR loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopFrame {
    pub var: Rc<str>,
    pub to: Val,
    pub step: Val,
    pub body: Address,
}

impl ProgramKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ProgramKind::Program => "",
            ProgramKind::Function => "FUNC$",
            ProgramKind::Verb => "VERB$",
            ProgramKind::Test => "TEST$",
        }
    }

    /// Catalog name for a program of this kind.
    pub fn qualify(self, name: &str) -> Rc<str> {
        format!("{}{}", self.prefix(), name.to_ascii_uppercase()).into()
    }

    pub fn from_word(word: Word) -> Option<ProgramKind> {
        match word {
            Word::Program => Some(ProgramKind::Program),
            Word::Function => Some(ProgramKind::Function),
            Word::Verb => Some(ProgramKind::Verb),
            Word::Test => Some(ProgramKind::Test),
            _ => None,
        }
    }

    pub fn word(self) -> Word {
        match self {
            ProgramKind::Program => Word::Program,
            ProgramKind::Function => Word::Function,
            ProgramKind::Verb => Word::Verb,
            ProgramKind::Test => Word::Test,
        }
    }
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.word(), self.name)?;
        if !self.params.is_empty() {
            let params: Vec<&str> = self.params.iter().map(|p| p.as_ref()).collect();
            write!(f, "({})", params.join(", "))?;
        }
        Ok(())
    }
}

impl Program {
    pub fn new(name: &str) -> Program {
        Program::with_kind(ProgramKind::Program, name)
    }

    pub fn with_kind(kind: ProgramKind, name: &str) -> Program {
        Program {
            name: name.to_ascii_uppercase().into(),
            kind,
            params: vec![],
            statements: vec![],
            cursor: None,
            run_count: 0,
            registered: false,
            system: false,
            modified: false,
            protected: false,
            static_types: true,
            active: false,
            executable: None,
            local_functions: HashMap::new(),
            data: None,
            data_cursor: 0,
            data_end: false,
            loops: vec![],
            gosubs: vec![],
            source: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn params(&self) -> &[Rc<str>] {
        &self.params
    }

    /// Catalog key: the name with its kind prefix.
    pub fn qualified_name(&self) -> Rc<str> {
        self.kind.qualify(&self.name)
    }

    pub fn declaration(&self) -> Declaration {
        Declaration {
            kind: self.kind,
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }

    pub fn rename(&mut self, name: &str) {
        let name: Rc<str> = name.to_ascii_uppercase().into();
        if name != self.name {
            debug!("rename {} to {}", self.name, name);
            self.name = name;
            self.modified = true;
            if let Some(exe) = self.executable.as_mut() {
                exe.owner = self.kind.qualify(&self.name);
            }
            let header = match self.statements.first() {
                Some(first) => match &first.declaration {
                    Some(declaration) if declaration.name != self.name => Some(first.number),
                    _ => None,
                },
                None => None,
            };
            if let Some(number) = header {
                self.statements[0] = Statement::new(number, &self.declaration().to_string());
            }
        }
    }

    /// A declaration statement names the program.
    pub(super) fn declare(&mut self, declaration: &Declaration) {
        self.kind = declaration.kind;
        self.params = declaration.params.clone();
        self.rename(&declaration.name);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Line of the statement executing now, or last executed.
    pub fn cursor(&self) -> Option<LineNumber> {
        self.cursor
    }

    pub fn run_count(&self) -> usize {
        self.run_count
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    pub fn set_system(&mut self, system: bool) {
        self.system = system;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_saved(&mut self) {
        self.modified = false;
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn static_types(&self) -> bool {
        self.static_types
    }

    pub fn set_static_types(&mut self, static_types: bool) {
        self.static_types = static_types;
    }

    /// True while any activation of this program is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn executable(&self) -> Option<&Executable> {
        self.executable.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.executable.is_some()
    }

    pub fn local_functions(&self) -> impl Iterator<Item = &Rc<LocalFunction>> {
        self.local_functions.values()
    }

    pub fn loops(&self) -> &[LoopFrame] {
        &self.loops
    }

    pub fn gosubs(&self) -> &[Address] {
        &self.gosubs
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn set_source<P: Into<PathBuf>>(&mut self, path: P) {
        self.source = Some(path.into());
    }

    /// Irreversibly reduce the program to a stripped executable.
    /// Only a regenerated declaration statement remains.
    pub fn protect(&mut self) -> Result<()> {
        if self.protected {
            return Ok(());
        }
        self.link(true)?;
        let number = match self.statements.first() {
            Some(statement) if statement.declaration.is_some() => statement.number,
            _ => 10,
        };
        let header = Statement::new(number, &self.declaration().to_string());
        self.statements = vec![header];
        self.protected = true;
        self.modified = true;
        debug!("protected {}", self.qualified_name());
        Ok(())
    }

    pub(super) fn check_editable(&self) -> Result<()> {
        if self.protected {
            return Err(error!(ProtectedProgram; self.qualified_name()));
        }
        if let Some(exe) = &self.executable {
            if exe.running && exe.debugger {
                return Err(error!(EditWhileRunning));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_names() {
        assert_eq!(&*Program::new("hello").qualified_name(), "HELLO");
        assert_eq!(
            &*Program::with_kind(ProgramKind::Function, "fact").qualified_name(),
            "FUNC$FACT"
        );
        assert_eq!(&*ProgramKind::Verb.qualify("dir"), "VERB$DIR");
        assert_eq!(&*ProgramKind::Test.qualify("t1"), "TEST$T1");
    }

    #[test]
    fn test_declaration_display() {
        let d = Declaration {
            kind: ProgramKind::Function,
            name: "FACT".into(),
            params: vec!["N".into(), "M$".into()],
        };
        assert_eq!(d.to_string(), "FUNCTION FACT(N, M$)");
    }

    #[test]
    fn test_protect_is_idempotent() {
        let mut p = Program::new("P");
        p.append("PRINT 1").unwrap();
        p.append("END").unwrap();
        p.protect().unwrap();
        p.protect().unwrap();
        assert!(p.is_protected());
        assert_eq!(p.len(), 1);
        assert_eq!(p.statements()[0].text(), "PROGRAM P");
        assert_eq!(
            p.insert(20, "PRINT 2").map_err(|e| e.code()),
            Err(crate::lang::ErrorCode::ProtectedProgram)
        );
    }
}
