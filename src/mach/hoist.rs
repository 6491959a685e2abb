use super::{FnTarget, Opcode, Program};
use log::trace;
use std::rc::Rc;

/// ## Local functions
///
/// A `DEF` body lifted out of the linked stream so call sites can run it
/// directly.

#[derive(Debug, PartialEq)]
pub struct LocalFunction {
    pub name: Rc<str>,
    pub params: Rc<[Rc<str>]>,
    pub code: Vec<Opcode>,
}

impl Program {
    /// Populate the local function table from the executable and bind
    /// call sites to it. Does nothing while the table is populated;
    /// unlinking clears it.
    pub(super) fn hoist(&mut self) {
        if !self.local_functions.is_empty() {
            return;
        }
        let exe = match self.executable.as_mut() {
            Some(exe) => exe,
            None => return,
        };
        let mut addr = 0;
        while addr < exe.code.len() {
            if let Opcode::DefFn(name, params, len) = &exe.code[addr] {
                let end = (addr + 1 + len).min(exe.code.len());
                let function = LocalFunction {
                    name: name.clone(),
                    params: params.clone(),
                    code: exe.code[addr + 1..end].to_vec(),
                };
                trace!("hoisted {} from {}", name, exe.owner);
                self.local_functions.insert(name.clone(), Rc::new(function));
                addr = end;
            } else {
                addr += 1;
            }
        }
        for op in exe.code.iter_mut() {
            if let Opcode::Fn(target, _) = op {
                let name = target.name().clone();
                *target = match self.local_functions.get(&name) {
                    Some(function) => FnTarget::Local(function.clone()),
                    None => FnTarget::Named(name),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(lines: &[&str]) -> Program {
        let mut p = Program::new("HOIST");
        for line in lines {
            p.append(line).unwrap();
        }
        p.link(false).unwrap();
        p
    }

    fn calls(p: &Program) -> Vec<String> {
        p.executable()
            .unwrap()
            .code()
            .iter()
            .filter(|op| matches!(op, Opcode::Fn(..)))
            .map(|op| op.to_string())
            .collect()
    }

    #[test]
    fn test_call_sites_bound() {
        let p = linked(&["10 DEF FNSQ(X)=X*X", "20 PRINT FNSQ(3)+ABS(-1)"]);
        assert_eq!(calls(&p), ["FNLOCAL FNSQ 1", "FN ABS 1"]);
        let f = p.local_functions().next().unwrap();
        assert_eq!(&*f.name, "FNSQ");
        assert_eq!(f.code.len(), 3);
    }

    #[test]
    fn test_hoist_is_idempotent() {
        let mut p = linked(&["10 DEF FNSQ(X)=X*X", "20 PRINT FNSQ(3)"]);
        let before = p.local_functions().next().unwrap().clone();
        p.hoist();
        let after = p.local_functions().next().unwrap().clone();
        assert!(Rc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_unbound_call_demoted() {
        let mut p = linked(&["10 DEF FNSQ(X)=X*X", "20 PRINT FNSQ(3)"]);
        p.local_functions.clear();
        if let Some(exe) = p.executable.as_mut() {
            exe.code.retain(|op| !matches!(op, Opcode::DefFn(..)));
        }
        p.hoist();
        assert_eq!(calls(&p), ["FN FNSQ 1"]);
    }
}
