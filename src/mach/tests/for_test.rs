use super::*;

#[test]
fn test_breaking_out_of_loop_with_goto() {
    let s = run(&[
        "10 FOR Y=1 TO 2",
        "20 FOR X=8 TO 9",
        "30 PRINT Y;X",
        "40 GOTO 60",
        "50 NEXT",
        "60 NEXT Y",
    ]);
    assert_eq!(s, " 1 8\n 2 8\n");
}

#[test]
fn test_negative_step() {
    let s = run(&["10 FOR I=3 TO 1 STEP -1", "20 PRINT I;", "30 NEXT I", "40 PRINT", "50 PRINT I"]);
    assert_eq!(s, " 3 2 1\n 0\n");
}

#[test]
fn test_body_runs_once() {
    assert_eq!(run(&["10 FOR I=5 TO 1", "20 PRINT I", "30 NEXT"]), " 5\n");
}

#[test]
fn test_double_step() {
    let s = run(&["10 FOR I=0 TO 1 STEP 0.5", "20 PRINT I;", "30 NEXT"]);
    assert_eq!(s, " 0 0.5 1");
}

#[test]
fn test_next_without_for() {
    assert_eq!(run(&["10 NEXT"]), "NEXT WITHOUT FOR IN 10\n");
    assert_eq!(
        run(&["10 FOR I=1 TO 2", "20 NEXT J"]),
        "NEXT WITHOUT FOR IN 20\n"
    );
}
