use super::{Program, ProgramKind};
use crate::error;
use crate::lang::Error;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Program catalog
///
/// Programs a session can reach by name, keyed by qualified name
/// (`FUNC$FACT`, `VERB$DIR`, `HELLO`).

#[derive(Debug, Default)]
pub struct Catalog {
    programs: HashMap<Rc<str>, Rc<RefCell<Program>>>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Add a program, replacing any program of the same name.
    pub fn register(&mut self, mut program: Program) -> Rc<RefCell<Program>> {
        program.registered = true;
        let name = program.qualified_name();
        debug!("register {}", name);
        let program = Rc::new(RefCell::new(program));
        if let Some(old) = self.programs.insert(name, program.clone()) {
            if let Ok(mut old) = old.try_borrow_mut() {
                old.registered = false;
            }
        }
        program
    }

    pub fn register_system(&mut self, mut program: Program) -> Rc<RefCell<Program>> {
        program.system = true;
        self.register(program)
    }

    pub fn get(&self, name: &str) -> Option<Rc<RefCell<Program>>> {
        self.programs.get(name).cloned()
    }

    pub fn find(&self, kind: ProgramKind, name: &str) -> Option<Rc<RefCell<Program>>> {
        self.get(&kind.qualify(name))
    }

    /// Remove one program. Returns false if it wasn't registered.
    pub fn clear(&mut self, name: &str) -> bool {
        match self.programs.remove(name) {
            Some(program) => {
                if let Ok(mut program) = program.try_borrow_mut() {
                    program.registered = false;
                }
                debug!("clear {}", name);
                true
            }
            None => false,
        }
    }

    /// Remove every program the system didn't provide.
    pub fn clear_all(&mut self) {
        let names: Vec<Rc<str>> = self
            .programs
            .iter()
            .filter(|(_, p)| !p.try_borrow().map_or(false, |p| p.system))
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            self.clear(&name);
        }
    }

    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<Rc<str>> {
        let program = match self.programs.get(name) {
            Some(program) => program.clone(),
            None => return Err(error!(UndefinedProgram; name)),
        };
        let mut borrowed = match program.try_borrow_mut() {
            Ok(borrowed) => borrowed,
            Err(_) => return Err(error!(ProgramBusy; name)),
        };
        let qualified = borrowed.kind.qualify(new_name);
        if *qualified != *name && self.programs.contains_key(&qualified) {
            return Err(error!(IllegalFunctionCall; format!("{} EXISTS", qualified)));
        }
        borrowed.rename(new_name);
        drop(borrowed);
        self.programs.remove(name);
        self.programs.insert(qualified.clone(), program);
        Ok(qualified)
    }

    pub fn names(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = self.programs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy every program as text for a session on another thread.
    pub fn fork(&self) -> Result<CatalogImage> {
        let mut programs = vec![];
        for (name, program) in &self.programs {
            let program = match program.try_borrow() {
                Ok(program) => program,
                Err(_) => return Err(error!(ProgramBusy; name)),
            };
            programs.push(ImageEntry {
                kind: program.kind,
                name: program.name.to_string(),
                listing: program.listing(),
                system: program.system,
            });
        }
        Ok(CatalogImage { programs })
    }
}

/// A catalog in sendable form.
#[derive(Debug, Clone)]
pub struct CatalogImage {
    programs: Vec<ImageEntry>,
}

#[derive(Debug, Clone)]
struct ImageEntry {
    kind: ProgramKind,
    name: String,
    listing: Vec<String>,
    system: bool,
}

impl CatalogImage {
    pub fn load(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for entry in &self.programs {
            let mut program = Program::with_kind(entry.kind, &entry.name);
            for line in &entry.listing {
                program.append(line)?;
            }
            program.set_saved();
            program.system = entry.system;
            catalog.register(program);
        }
        Ok(catalog)
    }
}
