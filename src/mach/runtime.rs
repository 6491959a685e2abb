use super::{
    Activation, Debugger, Executable, FnTarget, Function, LocalFunction, LoopFrame,
    Opcode, Operation, Program, ProgramKind, Registers, Scope, Session, Stack, Target, Val,
};
use crate::error;
use crate::lang::{Error, LineNumber};
use log::{debug, trace};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Running programs
///
/// A program runs through its own executable, so running it again from
/// inside itself would clobber the caller. Every run therefore goes
/// through an `Activation`, which puts the caller's state back when the
/// run ends, however it ends.

impl Program {
    pub fn run(
        &mut self,
        session: &mut Session,
        scope: &mut Scope,
        start: Option<LineNumber>,
        debugger: Option<&mut dyn Debugger>,
    ) -> Result<Option<Val>> {
        if session.depth() >= session.config.depth_limit() {
            let mut error = error!(CallDepthExceeded; self.qualified_name());
            session.report(&mut error);
            return Err(error);
        }
        let mut activation = Activation::new(self);
        activation.activate(session, scope, start, debugger)
    }

    fn activate(
        &mut self,
        session: &mut Session,
        scope: &mut Scope,
        start: Option<LineNumber>,
        debugger: Option<&mut dyn Debugger>,
    ) -> Result<Option<Val>> {
        let name = self.qualified_name();
        let result = match self.prepare(start, debugger.is_some()) {
            Ok(()) => {
                let mark = session.handlers.push(name.clone());
                let previous = session.current_program.replace(name);
                self.active = true;
                let result = Machine {
                    program: &mut *self,
                    session: &mut *session,
                    scope,
                    debugger,
                    nesting: 0,
                }
                .execute();
                session.handlers.pop(mark);
                session.current_program = previous;
                result
            }
            Err(error) => Err(error),
        };
        match result {
            Err(mut error) => {
                if error.code().is_fatal() || !session.handlers.is_trapped() {
                    session.report(&mut error);
                }
                Err(error)
            }
            ok => ok,
        }
    }

    /// Link if needed and reset the per-activation state.
    fn prepare(&mut self, start: Option<LineNumber>, debugger: bool) -> Result<()> {
        if self.executable.is_none() {
            self.link(false)?;
        }
        self.hoist();
        self.ensure_data()?;
        self.loops.clear();
        self.gosubs.clear();
        self.restore_data();
        self.cursor = None;
        let exe = match self.executable.as_mut() {
            Some(exe) => exe,
            None => return Err(error!(InternalError; "NOT LINKED")),
        };
        exe.pc = match start {
            None => 0,
            Some(line) => match exe.address_of_line(line) {
                Some(addr) => addr,
                None => return Err(error!(UndefinedLine; line.to_string())),
            },
        };
        exe.stack.clear();
        exe.registers = Registers::default();
        exe.running = true;
        exe.debugger = debugger;
        self.run_count += 1;
        Ok(())
    }
}

/// Bind arguments in a new scope frame and run a program.
fn invoke(
    program: &mut Program,
    session: &mut Session,
    scope: &mut Scope,
    args: Vec<Val>,
) -> Result<Option<Val>> {
    if args.len() != program.params.len() {
        return Err(error!(IllegalFunctionCall; "WRONG NUMBER OF ARGUMENTS"));
    }
    scope.push_frame()?;
    let params = program.params.clone();
    let result = bind(scope, &params, args, program.static_types)
        .and_then(|_| program.run(session, scope, None, None));
    scope.pop_frame();
    result
}

fn bind(scope: &mut Scope, params: &[Rc<str>], args: Vec<Val>, typed: bool) -> Result<()> {
    for (param, val) in params.iter().zip(args) {
        if typed && param.ends_with('$') != matches!(val, Val::String(_)) {
            return Err(error!(TypeMismatch; param));
        }
        scope.define(param, val)?;
    }
    Ok(())
}

struct Machine<'a, 'd> {
    program: &'a mut Program,
    session: &'a mut Session,
    scope: &'a mut Scope,
    debugger: Option<&'d mut dyn Debugger>,
    nesting: usize,
}

impl<'a, 'd> Machine<'a, 'd> {
    fn exe(&mut self) -> Result<&mut Executable> {
        match self.program.executable.as_mut() {
            Some(exe) => Ok(exe),
            None => Err(error!(InternalError; "NOT LINKED")),
        }
    }

    fn stack(&mut self) -> Result<&mut Stack<Val>> {
        Ok(&mut self.exe()?.stack)
    }

    fn execute(&mut self) -> Result<Option<Val>> {
        loop {
            let addr = self.exe()?.pc;
            match self.step() {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    let line = self.exe()?.line_number_for(addr);
                    let error = error.or_in_line_number(line);
                    if error.code().is_fatal() {
                        return Err(error);
                    }
                    let target = match self.session.handlers.take_trap() {
                        Some(target) => target,
                        None => return Err(error),
                    };
                    debug!("trapped {} in {}", error, self.program.qualified_name());
                    let exe = self.exe()?;
                    exe.registers.error = i32::from(error.code().number());
                    exe.stack.clear();
                    exe.pc = exe.resolve(&target)?;
                }
            }
        }
        Ok(self.exe()?.registers.result.take())
    }

    fn poll(&mut self) -> Result<()> {
        if self.session.take_interrupt() {
            return Err(error!(Break));
        }
        if self.session.is_aborted() {
            return Err(error!(Aborted));
        }
        Ok(())
    }

    fn jump(&mut self, target: &Target) -> Result<()> {
        self.poll()?;
        let exe = self.exe()?;
        let addr = exe.resolve(target)?;
        exe.pc = addr;
        Ok(())
    }

    fn store(&mut self, var_name: &Rc<str>, val: Val) -> Result<()> {
        if self.program.static_types {
            self.scope.store(var_name, val)
        } else {
            self.scope.assign(var_name, val)
        }
    }

    /// Execute one opcode. Returns false when the activation is done.
    fn step(&mut self) -> Result<bool> {
        let op = {
            let exe = self.exe()?;
            let op = match exe.code.get(exe.pc) {
                Some(op) => op.clone(),
                None => return Ok(false),
            };
            exe.pc += 1;
            op
        };
        if Operation::apply(&op, self.stack()?)? {
            return Ok(true);
        }
        match op {
            Opcode::Push(var_name) => {
                let val = self.scope.fetch(&var_name);
                self.stack()?.push(val)?;
            }
            Opcode::Pop(var_name) => {
                let val = self.stack()?.pop()?;
                self.store(&var_name, val)?;
            }
            Opcode::Line(line) => {
                trace!("{} {}", self.program.qualified_name(), line);
                self.program.cursor = Some(line);
                self.poll()?;
                if let Some(debugger) = self.debugger.as_mut() {
                    debugger.statement(self.program, line)?;
                }
            }
            Opcode::Goto(target) => self.jump(&target)?,
            Opcode::JumpIf(target) => {
                if self.stack()?.pop()?.is_true()? {
                    self.jump(&target)?;
                }
            }
            Opcode::Gosub(target) => {
                if self.program.gosubs.len() > u16::max_value() as usize {
                    return Err(error!(OutOfMemory; "TOO MANY GOSUBS"));
                }
                let ret = self.exe()?.pc;
                self.program.gosubs.push(ret);
                self.jump(&target)?;
            }
            Opcode::Return => match self.program.gosubs.pop() {
                Some(addr) => self.exe()?.pc = addr,
                None => return Err(error!(ReturnWithoutGosub)),
            },
            Opcode::Exit => {
                let val = self.stack()?.pop()?;
                self.exe()?.registers.result = Some(val);
                return Ok(false);
            }
            Opcode::For(var_name) => self.r#for(var_name)?,
            Opcode::Next(var_name) => self.next(var_name)?,
            Opcode::Data(len) | Opcode::Item(len) | Opcode::DefFn(_, _, len) => {
                self.exe()?.pc += len;
            }
            Opcode::Read(var_name) => match self.program.read_data()? {
                Some(val) => self.store(&var_name, val)?,
                None => return Err(error!(OutOfData)),
            },
            Opcode::Restore(target) => self.program.restore_to(target.as_ref())?,
            Opcode::Fn(target, argc) => {
                let args = self.stack()?.pop_n(argc)?;
                let val = self.call_function(&target, args)?;
                self.stack()?.push(val)?;
            }
            Opcode::Call(name, argc) => {
                let args = self.stack()?.pop_n(argc)?;
                self.call_program(name, args)?;
            }
            Opcode::OnError(Some(target)) => {
                let owner = self.program.qualified_name();
                self.session.handlers.trap(owner, target);
            }
            Opcode::OnError(None) => self.session.handlers.clear_trap(),
            Opcode::Lock => {
                let name = Rc::<str>::try_from(self.stack()?.pop()?)?;
                let id = self.session.id();
                self.session.locks().acquire(&name, id)?;
            }
            Opcode::Unlock => {
                let name = Rc::<str>::try_from(self.stack()?.pop()?)?;
                let id = self.session.id();
                self.session.locks().release(&name, id)?;
            }
            Opcode::End => return Ok(false),
            Opcode::Stop => {
                debug!("{} stopped at {:?}", self.program.qualified_name(), self.program.cursor);
                return Ok(false);
            }
            Opcode::Print => {
                let val = self.stack()?.pop()?;
                self.session.print(&val.to_string());
            }
            Opcode::Newline => self.session.print("\n"),
            _ => return Err(error!(InternalError; format!("UNEXPECTED {}", op))),
        }
        Ok(true)
    }

    /// Loops always run their body at least once.
    fn r#for(&mut self, var_name: Rc<str>) -> Result<()> {
        let stack = self.stack()?;
        let step = stack.pop()?;
        let to = stack.pop()?;
        let from = stack.pop()?;
        self.store(&var_name, from)?;
        let body = self.exe()?.pc;
        let loops = &mut self.program.loops;
        if let Some(i) = loops.iter().rposition(|l| l.var == var_name) {
            loops.truncate(i);
        }
        if loops.len() > u16::max_value() as usize {
            return Err(error!(OutOfMemory; "TOO MANY LOOPS"));
        }
        loops.push(LoopFrame {
            var: var_name,
            to,
            step,
            body,
        });
        Ok(())
    }

    fn next(&mut self, var_name: Option<Rc<str>>) -> Result<()> {
        let loops = &mut self.program.loops;
        let index = match &var_name {
            Some(var_name) => loops.iter().rposition(|l| &l.var == var_name),
            None => loops.len().checked_sub(1),
        };
        let frame = match index {
            Some(index) => {
                loops.truncate(index + 1);
                loops[index].clone()
            }
            None => return Err(error!(NextWithoutFor)),
        };
        let val = Operation::sum(self.scope.fetch(&frame.var), frame.step.clone())?;
        self.store(&frame.var, val.clone())?;
        let step = f64::try_from(frame.step)?;
        let val = f64::try_from(val)?;
        let to = f64::try_from(frame.to)?;
        let done = if step < 0.0 { val < to } else { val > to };
        if done {
            self.program.loops.pop();
        } else {
            self.poll()?;
            self.exe()?.pc = frame.body;
        }
        Ok(())
    }

    fn call_function(&mut self, target: &FnTarget, args: Vec<Val>) -> Result<Val> {
        let local = match target {
            FnTarget::Local(function) => Some(function.clone()),
            FnTarget::Named(name) => self.program.local_functions.get(name).cloned(),
        };
        if let Some(function) = local {
            return self.call_local(&function, args);
        }
        let name = target.name();
        if let Some(function) = Function::find(name) {
            let err = self.exe()?.registers.error;
            return function.call(args, err);
        }
        let result = if *self.program.qualified_name() == *ProgramKind::Function.qualify(name) {
            invoke(self.program, self.session, self.scope, args)?
        } else {
            let program = match self.session.catalog.find(ProgramKind::Function, name) {
                Some(program) => program,
                None => return Err(error!(UndefinedUserFunction; name)),
            };
            let mut program = match program.try_borrow_mut() {
                Ok(program) => program,
                Err(_) => return Err(error!(ProgramBusy; name)),
            };
            invoke(&mut program, self.session, self.scope, args)?
        };
        match result {
            Some(val) => Ok(val),
            None => Err(error!(IllegalFunctionCall; format!("{} RETURNED NO VALUE", name))),
        }
    }

    fn call_program(&mut self, name: Rc<str>, args: Vec<Val>) -> Result<()> {
        let own = self.program.qualified_name();
        if [ProgramKind::Program, ProgramKind::Verb]
            .iter()
            .any(|kind| kind.qualify(&name) == own)
        {
            invoke(self.program, self.session, self.scope, args)?;
            return Ok(());
        }
        let program = match self.session.catalog.find(ProgramKind::Program, &name) {
            Some(program) => program,
            None => match self.session.catalog.find(ProgramKind::Verb, &name) {
                Some(program) => program,
                None => return Err(error!(UndefinedProgram; name)),
            },
        };
        let mut program = match program.try_borrow_mut() {
            Ok(program) => program,
            Err(_) => return Err(error!(ProgramBusy; name)),
        };
        invoke(&mut program, self.session, self.scope, args)?;
        Ok(())
    }

    fn call_local(&mut self, function: &LocalFunction, args: Vec<Val>) -> Result<Val> {
        if args.len() != function.params.len() {
            return Err(error!(IllegalFunctionCall; "WRONG NUMBER OF ARGUMENTS"));
        }
        if self.nesting >= self.session.config.max_call_depth {
            return Err(error!(CallDepthExceeded; &function.name));
        }
        self.scope.push_frame()?;
        let typed = self.program.static_types;
        let result = bind(self.scope, &function.params, args, typed).and_then(|_| {
            self.nesting += 1;
            let result = self.evaluate(&function.code);
            self.nesting -= 1;
            result
        });
        self.scope.pop_frame();
        result
    }

    fn evaluate(&mut self, code: &[Opcode]) -> Result<Val> {
        let mut stack: Stack<Val> = Stack::new("EXPRESSION TOO COMPLEX");
        for op in code {
            if Operation::apply(op, &mut stack)? {
                continue;
            }
            match op {
                Opcode::Push(var_name) => stack.push(self.scope.fetch(var_name))?,
                Opcode::Fn(target, argc) => {
                    let args = stack.pop_n(*argc)?;
                    let val = self.call_function(target, args)?;
                    stack.push(val)?;
                }
                _ => return Err(error!(InternalError; format!("UNEXPECTED {}", op))),
            }
        }
        stack.pop()
    }
}
