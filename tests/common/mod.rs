#![allow(dead_code)]
use basic::mach::{Program, Scope, Session};

pub fn program(name: &str, lines: &[&str]) -> Program {
    let mut program = Program::new(name);
    for line in lines {
        program.append(line).unwrap();
    }
    program
}

pub fn exec(session: &mut Session, program: &mut Program) -> String {
    let mut scope = Scope::new();
    let _ = program.run(session, &mut scope, None, None);
    let mut s = session.take_output();
    for error in session.take_errors() {
        s.push_str(&format!("{}\n", error));
    }
    s
}

pub fn run(lines: &[&str]) -> String {
    let mut session = Session::default();
    exec(&mut session, &mut program("MAIN", lines))
}

pub fn listing(program: &Program) -> Vec<String> {
    program.listing()
}
