mod common;
use basic::lang::ErrorCode;
use basic::mach::{Opcode, Program, Session, Val};
use common::*;

const SQUARES: &[&str] = &[
    "10 PROGRAM SQUARES",
    "20 DEF FNSQ(X)=X*X",
    "30 FOR I=1 TO 3",
    "40 PRINT FNSQ(I);",
    "50 NEXT I",
    "60 RESTORE 100",
    "70 READ A, B",
    "80 PRINT A+B",
    "100 DATA 5, 6",
];

#[test]
fn test_link_is_lazy() {
    let mut session = Session::default();
    let mut p = program("X", SQUARES);
    assert!(!p.is_linked());
    assert_eq!(exec(&mut session, &mut p), " 1 4 9 11\n");
    assert!(p.is_linked());
    p.insert(80, "PRINT A*B").unwrap();
    assert!(!p.is_linked());
    assert_eq!(exec(&mut session, &mut p), " 1 4 9 30\n");
}

#[test]
fn test_strip_removes_line_markers() {
    let mut p = program("X", SQUARES);
    p.link(false).unwrap();
    let markers = |p: &Program| {
        p.executable()
            .unwrap()
            .code()
            .iter()
            .filter(|op| matches!(op, Opcode::Line(_)))
            .count()
    };
    assert_eq!(markers(&p), 8);
    p.link(true).unwrap();
    assert_eq!(markers(&p), 0);
    assert!(p.executable().unwrap().is_stripped());
    assert_eq!(run(SQUARES), " 1 4 9 11\n");
}

#[test]
fn test_local_functions_hoisted() {
    let mut p = program("X", SQUARES);
    p.link(false).unwrap();
    let names: Vec<String> = p.local_functions().map(|f| f.name.to_string()).collect();
    assert_eq!(names, ["FNSQ"]);
    let calls: Vec<String> = p
        .executable()
        .unwrap()
        .code()
        .iter()
        .filter(|op| matches!(op, Opcode::Fn(..)))
        .map(|op| op.to_string())
        .collect();
    assert_eq!(calls, ["FNLOCAL FNSQ 1"]);
}

#[test]
fn test_unlinked_errors_carry_cause() {
    let mut session = Session::default();
    let mut p = program("X", &["10 GOTO NOWHERE"]);
    assert_eq!(exec(&mut session, &mut p), "LINK FAILED IN 10\n");
    let error = p.link(false).unwrap_err();
    assert_eq!(error.code(), ErrorCode::LinkFailed);
    assert_eq!(error.cause().map(|e| e.code()), Some(ErrorCode::UndefinedLabel));
}

#[test]
fn test_protect() {
    let mut session = Session::default();
    let mut p = program("X", SQUARES);
    p.protect().unwrap();
    p.protect().unwrap();
    assert!(p.is_protected());
    assert_eq!(p.len(), 1);
    assert_eq!(p.statements()[0].text(), "PROGRAM SQUARES");
    assert_eq!(
        p.insert(20, "PRINT 1").map_err(|e| e.code()),
        Err(ErrorCode::ProtectedProgram)
    );
    assert_eq!(
        p.renumber(10, 10).map_err(|e| e.code()),
        Err(ErrorCode::ProtectedProgram)
    );
    assert_eq!(exec(&mut session, &mut p), " 1 4 9 11\n");
    assert_eq!(exec(&mut session, &mut p), " 1 4 9 11\n");
}

#[test]
fn test_protected_listing_loads() {
    let mut session = Session::default();
    let mut p = program("X", SQUARES);
    p.protect().unwrap();
    let text = p.listing().join("\n");
    assert!(p.listing()[1].starts_with("_ASM "));
    let mut copy = Program::new("COPY");
    copy.load_str(&text).unwrap();
    assert_eq!(copy.name(), "SQUARES");
    assert!(copy.is_protected());
    assert_eq!(exec(&mut session, &mut copy), " 1 4 9 11\n");
    assert_eq!(copy.listing(), p.listing());
}

#[test]
fn test_protected_restore_label() {
    let mut session = Session::default();
    let lines = &[
        "10 DATA 1",
        "20 MORE: DATA 2",
        "30 RESTORE MORE",
        "40 READ A",
        "50 PRINT A",
    ];
    let mut p = program("X", lines);
    assert_eq!(exec(&mut session, &mut p), " 2\n");
    p.protect().unwrap();
    assert_eq!(exec(&mut session, &mut p), " 2\n");
    p.seek_data_label("MORE").unwrap();
    assert_eq!(p.read_data().unwrap(), Some(Val::Integer(2)));
}

#[test]
fn test_assembly_refused_over_code() {
    let mut session = Session::default();
    let mut p = program("X", &["10 PRINT 1", "20 PRINT 2"]);
    assert_eq!(
        p.append("_ASM END").map_err(|e| e.code()),
        Err(ErrorCode::StructureError)
    );
    assert_eq!(p.len(), 2);
    assert!(!p.is_protected());
    p.protect().unwrap();
    assert_eq!(
        p.append("_ASM END").map_err(|e| e.code()),
        Err(ErrorCode::ProtectedProgram)
    );
    assert_eq!(exec(&mut session, &mut p), " 1\n 2\n");
}

#[test]
fn test_protected_errors_keep_line_numbers() {
    let mut session = Session::default();
    let mut p = program("X", &["10 PRINT 1", "20 PRINT 1/0"]);
    p.protect().unwrap();
    assert_eq!(exec(&mut session, &mut p), " 1\nDIVISION BY ZERO IN 20\n");
}
