use super::{Address, LoopFrame, Program, Registers, Stack, Val};
use crate::lang::LineNumber;
use std::ops::{Deref, DerefMut};

/// ## Execution snapshot
///
/// The mutable execution state of a program. Activations of the same
/// program nest, so each one captures this on entry and puts it back
/// on exit.

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    gosubs: Vec<Address>,
    cursor: Option<LineNumber>,
    data_cursor: usize,
    data_end: bool,
    loops: Vec<LoopFrame>,
    active: bool,
    machine: Option<Machine>,
}

#[derive(Debug, Clone, PartialEq)]
struct Machine {
    pc: Address,
    registers: Registers,
    stack: Stack<Val>,
    running: bool,
    debugger: bool,
}

impl Snapshot {
    pub fn capture(program: &Program) -> Snapshot {
        Snapshot {
            gosubs: program.gosubs.clone(),
            cursor: program.cursor,
            data_cursor: program.data_cursor,
            data_end: program.data_end,
            loops: program.loops.clone(),
            active: program.active,
            machine: program.executable.as_ref().map(|exe| Machine {
                pc: exe.pc,
                registers: exe.registers.clone(),
                stack: exe.stack.clone(),
                running: exe.running,
                debugger: exe.debugger,
            }),
        }
    }

    pub fn restore(self, program: &mut Program) {
        program.gosubs = self.gosubs;
        program.cursor = self.cursor;
        program.data_cursor = self.data_cursor;
        program.data_end = self.data_end;
        program.loops = self.loops;
        program.active = self.active;
        if let Some(exe) = program.executable.as_mut() {
            let machine = self.machine.unwrap_or(Machine {
                pc: 0,
                registers: Registers::default(),
                stack: Stack::new("EXPRESSION TOO COMPLEX"),
                running: false,
                debugger: false,
            });
            exe.pc = machine.pc;
            exe.registers = machine.registers;
            exe.stack = machine.stack;
            exe.running = machine.running;
            exe.debugger = machine.debugger;
        }
    }
}

/// A program borrowed for one activation. Dropping it restores the
/// snapshot taken when it was created, on every exit path.
pub struct Activation<'a> {
    program: &'a mut Program,
    snapshot: Option<Snapshot>,
}

impl<'a> Activation<'a> {
    pub fn new(program: &'a mut Program) -> Activation<'a> {
        let snapshot = Snapshot::capture(program);
        Activation {
            program,
            snapshot: Some(snapshot),
        }
    }
}

impl Deref for Activation<'_> {
    type Target = Program;
    fn deref(&self) -> &Program {
        self.program
    }
}

impl DerefMut for Activation<'_> {
    fn deref_mut(&mut self) -> &mut Program {
        self.program
    }
}

impl Drop for Activation<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.restore(self.program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_on_drop() {
        let mut p = Program::new("SNAP");
        p.append("10 DATA 1, 2").unwrap();
        p.link(false).unwrap();
        p.read_data().unwrap();
        p.cursor = Some(10);
        let before = Snapshot::capture(&p);
        {
            let mut activation = Activation::new(&mut p);
            activation.cursor = Some(99);
            activation.gosubs.push(7);
            activation.read_data().unwrap();
            assert!(activation.is_data_end());
            if let Some(exe) = activation.executable.as_mut() {
                exe.pc = 5;
                exe.running = true;
            }
        }
        assert_eq!(Snapshot::capture(&p), before);
    }

    #[test]
    fn test_restore_resets_new_executable() {
        let mut p = Program::new("SNAP");
        p.append("10 PRINT 1").unwrap();
        {
            let mut activation = Activation::new(&mut p);
            activation.link(false).unwrap();
            if let Some(exe) = activation.executable.as_mut() {
                exe.pc = 2;
                exe.running = true;
            }
        }
        let exe = p.executable().unwrap();
        assert_eq!(exe.pc(), 0);
        assert!(!exe.is_running());
    }
}
