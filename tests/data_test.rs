mod common;
use basic::lang::ErrorCode;
use basic::mach::Val;
use common::*;

#[test]
fn test_read_wraps_around() {
    let mut p = program("DATA", &["10 DATA 1, 2", "20 DATA 3"]);
    p.link(false).unwrap();
    let mut values = vec![];
    for _ in 0..4 {
        values.push(p.read_data().unwrap());
    }
    assert_eq!(
        values,
        [
            Some(Val::Integer(1)),
            Some(Val::Integer(2)),
            Some(Val::Integer(3)),
            Some(Val::Integer(1))
        ]
    );
}

#[test]
fn test_end_flag() {
    let mut p = program("DATA", &["10 DATA \"A\""]);
    p.link(false).unwrap();
    assert!(!p.is_data_end());
    assert_eq!(p.read_data().unwrap(), Some(Val::String("A".into())));
    assert!(p.is_data_end());
    p.restore_data();
    assert!(!p.is_data_end());
}

#[test]
fn test_no_data() {
    let mut p = program("DATA", &["10 PRINT 1"]);
    p.link(false).unwrap();
    assert_eq!(p.read_data().unwrap(), None);
    assert!(p.is_data_end());
    assert_eq!(run(&["10 READ A"]), "OUT OF DATA IN 10\n");
}

#[test]
fn test_restore_to_line_and_label() {
    let lines = &[
        "10 DATA 1, 2",
        "15 REM MORE",
        "20 MORE: DATA 3",
        "30 READ A, B, C",
        "40 RESTORE MORE",
        "50 READ D",
        "60 RESTORE 15",
        "70 READ E",
        "80 RESTORE",
        "90 READ F",
        "100 PRINT A;B;C;D;E;F",
    ];
    assert_eq!(run(lines), " 1 2 3 3 3 1\n");
}

#[test]
fn test_restore_past_last_data() {
    let mut p = program("DATA", &["10 DATA 1", "20 PRINT 2"]);
    p.link(false).unwrap();
    assert_eq!(
        p.seek_data_line(20).map_err(|e| e.code()),
        Err(ErrorCode::UndefinedLine)
    );
    assert!(p.is_data_end());
    p.seek_data_line(5).unwrap();
    assert_eq!(p.read_data().unwrap(), Some(Val::Integer(1)));
}

#[test]
fn test_data_inside_def_is_skipped() {
    let lines = &[
        "10 DEF FNA(X)=X+100",
        "20 DATA 7",
        "30 READ A",
        "40 PRINT FNA(A)",
    ];
    assert_eq!(run(lines), " 107\n");
}

#[test]
fn test_data_expressions() {
    assert_eq!(
        run(&["10 DATA -1, 2*3, \"X\"+\"Y\"", "20 READ A, B, C$", "30 PRINT A;B;C$"]),
        "-1 6XY\n"
    );
}
