//! Tests for sequencing, short-circuiting and conditional primitives.

use assert_matches::assert_matches;

use rapids_eval::{ErrorKind, Value};

use crate::{evaluate, frame_column, session, try_evaluate};

#[test]
fn sequence_returns_last_value() {
    let session = session();
    assert_eq!(evaluate(&session, "(, 1 2 3)"), Value::Num(3.0));
    assert_matches!(evaluate(&session, "(,)"), Value::Num(x) if x.is_nan());

    let value = evaluate(&session, "(, (cols data [1])->b (+ b 1))");
    assert_eq!(frame_column(&value, 0), [11.0, 21.0, 31.0, 41.0]);
    assert_eq!(session.temp_names(), ["b"]);
}

#[test]
fn and_short_circuits() {
    let session = session();
    let value = evaluate(&session, "(&& 0 (, (cols data [0])->x 1))");
    assert_eq!(value, Value::Num(0.0));
    assert!(session.temp("x").is_none());

    let value = evaluate(&session, "(&& 1 (, (cols data [0])->x 1))");
    assert_eq!(value, Value::Num(1.0));
    assert!(session.temp("x").is_some());
}

#[test]
fn or_short_circuits() {
    let session = session();
    let value = evaluate(&session, "(|| 1 (, (cols data [0])->x 0))");
    assert_eq!(value, Value::Num(1.0));
    assert!(session.temp("x").is_none());

    let value = evaluate(&session, "(|| 0 (, (cols data [0])->x 0))");
    assert_eq!(value, Value::Num(0.0));
    assert!(session.temp("x").is_some());
}

#[test]
fn logic_with_nan() {
    let session = session();
    assert_eq!(evaluate(&session, "(&& NaN 0)"), Value::Num(0.0));
    assert_matches!(evaluate(&session, "(&& NaN 1)"), Value::Num(x) if x.is_nan());
    assert_eq!(evaluate(&session, "(|| NaN 1)"), Value::Num(1.0));
    assert_matches!(evaluate(&session, "(|| NaN 0)"), Value::Num(x) if x.is_nan());
    assert_matches!(evaluate(&session, "(! NaN)"), Value::Num(x) if x.is_nan());
    assert_eq!(evaluate(&session, "(! 0)"), Value::Num(1.0));
}

#[test]
fn logic_requires_scalars() {
    let err = try_evaluate(&session(), "(&& 1 data)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::InvalidArg { name, .. } if name == "&&");
}

#[test]
fn ifelse_evaluates_single_branch() {
    let session = session();
    let code = "(ifelse (> 2 1) 10 (, (cols data [0])->x 20))";
    assert_eq!(evaluate(&session, code), Value::Num(10.0));
    assert!(session.temp("x").is_none());

    let code = "(ifelse 0 (, (cols data [0])->x 10) 20)";
    assert_eq!(evaluate(&session, code), Value::Num(20.0));
    assert!(session.temp("x").is_none());

    let code = "(ifelse NA (, (cols data [0])->x 10) 20)";
    assert_matches!(evaluate(&session, code), Value::Num(x) if x.is_nan());
    assert!(session.temp("x").is_none());
}

#[test]
fn ifelse_over_frame() {
    let session = session();
    let code = "(ifelse (> (cols data [0]) 2) (cols data [1]) -1)";
    let value = evaluate(&session, code);
    assert_eq!(frame_column(&value, 0), [-1.0, -1.0, 30.0, 40.0]);

    let err = try_evaluate(&session, "(ifelse data 1 0)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::ShapeMismatch { .. });
}
