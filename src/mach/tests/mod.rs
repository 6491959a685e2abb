use crate::mach::{Program, Scope, Session};

mod for_test;

fn program(lines: &[&str]) -> Program {
    let mut program = Program::new("TEST");
    for line in lines {
        program.append(line).unwrap();
    }
    program
}

fn run(lines: &[&str]) -> String {
    let mut session = Session::default();
    let mut program = program(lines);
    run_in(&mut session, &mut program)
}

fn run_in(session: &mut Session, program: &mut Program) -> String {
    let mut scope = Scope::new();
    let _ = program.run(session, &mut scope, None, None);
    let mut s = session.take_output();
    for error in session.take_errors() {
        s.push_str(&format!("{}\n", error));
    }
    s
}
