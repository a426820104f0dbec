//! Integration tests for the Rapids interpreter.

use assert_matches::assert_matches;

use rapids_eval::{
    prims::{Arity, Primitives},
    Error, ErrorCategory, ErrorKind, Frame, Session, SessionConfig, Store, Value, ValueType,
};
use rapids_parser::num_list::NumListError;

mod flow;
mod frames;
mod functions;
mod session;

/// Creates a store with a `data` frame with columns `a = [1, 2, 3, 4]` and
/// `b = [10, 20, 30, 40]`.
fn data_store() -> Store {
    let store = Store::new();
    let frame = Frame::from_nums([
        ("a", vec![1.0, 2.0, 3.0, 4.0]),
        ("b", vec![10.0, 20.0, 30.0, 40.0]),
    ])
    .unwrap();
    store.insert(frame.with_key("data"));
    store
}

fn session() -> Session {
    Session::new(data_store())
}

fn try_evaluate(session: &Session, code: &str) -> Result<Value, Error> {
    session.exec(code)
}

fn evaluate(session: &Session, code: &str) -> Value {
    match session.exec(code) {
        Ok(value) => value,
        Err(err) => panic!("failed evaluating `{}`: {}", code, err),
    }
}

fn frame_column(value: &Value, idx: usize) -> Vec<f64> {
    value.as_frame().unwrap().columns()[idx].nums().unwrap()
}

#[test]
fn adding_numbers() {
    assert_eq!(evaluate(&session(), "(+ 1 2)"), Value::Num(3.0));
    assert_eq!(evaluate(&session(), "(- (* 2 #3) (/ 1 4))"), Value::Num(5.75));
    assert_eq!(evaluate(&session(), "(^ 2 10)"), Value::Num(1024.0));
}

#[test]
fn applying_fn_definition() {
    let value = evaluate(&session(), "({x y . (+ x y)} 3 4)");
    assert_eq!(value, Value::Num(7.0));
}

#[test]
fn expanding_number_list() {
    let value = evaluate(&session(), "[0,5:15:2]");
    assert_eq!(value, Value::Nums(vec![0.0, 5.0, 7.0, 9.0, 11.0, 13.0]));
}

#[test]
fn huge_number_list_is_not_expanded() {
    let session = session();
    let err = try_evaluate(&session, "(sum [0:1e12])").unwrap_err();
    assert_matches!(
        err.kind(),
        ErrorKind::ListTooLong { count: 1_000_000_000_000, .. }
    );
    assert_eq!(err.category(), ErrorCategory::Domain);
    assert_eq!(err.location().unwrap().location_offset(), 5);

    // Selectors resolve lists without expanding them.
    let err = try_evaluate(&session, "(rows data [0:1e12])").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::RowOutOfRange { index: 4, len: 4 });
    let value = evaluate(&session, "(cols data [-1e12:-1])");
    assert_eq!(value.as_frame().unwrap().names(), ["a"]);
    let value = evaluate(&session, "(cols data [-1e12:-2])");
    assert_eq!(value.as_frame().unwrap().names(), ["a", "b"]);
    let err = try_evaluate(&session, "(cols data [-1e12:1])").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Selector(NumListError::MixedSigns));
    session.check_refs().unwrap();

    let config = SessionConfig {
        max_list_len: 3,
        ..SessionConfig::default()
    };
    let session = Session::with_config(Primitives::standard(), data_store(), config);
    assert_eq!(evaluate(&session, "(sum [0:3])"), Value::Num(3.0));
    let err = try_evaluate(&session, "(sum [0:4])").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::ListTooLong { count: 4, limit: 3 });
}

#[test]
fn literals_and_constants() {
    let session = session();
    assert_eq!(evaluate(&session, "'abc'"), Value::Str("abc".to_owned()));
    assert_eq!(
        evaluate(&session, r#"["a" "b\tc"]"#),
        Value::Strs(vec!["a".to_owned(), "b\tc".to_owned()])
    );
    assert_eq!(evaluate(&session, "TRUE"), Value::Num(1.0));
    assert_matches!(evaluate(&session, "NA"), Value::Num(x) if x.is_nan());
    assert_matches!(evaluate(&session, "+"), Value::Fun(fun) if fun.name() == "+");
}

#[test]
fn math_on_frames() {
    let session = session();
    let value = evaluate(&session, "(+ data 1)");
    assert_eq!(frame_column(&value, 0), [2.0, 3.0, 4.0, 5.0]);
    assert_eq!(frame_column(&value, 1), [11.0, 21.0, 31.0, 41.0]);

    let value = evaluate(&session, "(sqrt (* (cols data [0]) (cols data [0])))");
    assert_eq!(frame_column(&value, 0), [1.0, 2.0, 3.0, 4.0]);

    assert_eq!(evaluate(&session, "(sum data)"), Value::Num(110.0));
    assert_eq!(evaluate(&session, "(mean (cols data ['a']))"), Value::Num(2.5));
    assert_eq!(evaluate(&session, "(max data 100)"), Value::Num(100.0));
}

#[test]
fn comparisons_propagate_nan() {
    let session = session();
    assert_eq!(evaluate(&session, "(< 1 2)"), Value::Num(1.0));
    assert_eq!(evaluate(&session, "(>= 1 2)"), Value::Num(0.0));
    assert_matches!(evaluate(&session, "(== NaN NaN)"), Value::Num(x) if x.is_nan());

    let value = evaluate(&session, "(> (cols data [0]) 2)");
    assert_eq!(frame_column(&value, 0), [0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn unknown_identifier() {
    let err = try_evaluate(&session(), "(foo 1 2)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnknownIdentifier(name) if name == "foo");
    assert_eq!(err.category(), ErrorCategory::UnknownIdentifier);

    let location = err.location().unwrap();
    assert_eq!(location.location_offset(), 1);
    assert_eq!(location.location_line(), 1);
}

#[test]
fn parse_errors_are_located() {
    let err = try_evaluate(&session(), "(+ 1\n  ({x x . x} 2))").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
    assert_matches!(err.kind(), ErrorKind::Parse(_));
    assert_eq!(err.location().unwrap().location_line(), 2);

    let err = try_evaluate(&session(), "(+ 1 2").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
}

#[test]
fn calling_non_function() {
    let err = try_evaluate(&session(), "((+ 1 2) 3)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::NotCallable(ValueType::Num));
    assert_eq!(err.location().unwrap().location_offset(), 1);
}

#[test]
fn arity_mismatch_before_side_effects() {
    let session = session();
    let err = try_evaluate(&session, "(ifelse (, (cols data [0])->x 1) 2)").unwrap_err();
    assert_matches!(
        err.kind(),
        ErrorKind::ArityMismatch { name, expected: Arity::Exact(3), actual: 2 } if name == "ifelse"
    );
    assert_eq!(err.category(), ErrorCategory::Arity);
    assert!(session.temp("x").is_none());
    assert!(session.temp_names().is_empty());
}

#[test]
fn arity_mismatch_for_closure() {
    let err = try_evaluate(&session(), "({x y . (+ x y)} 1)").unwrap_err();
    assert_matches!(
        err.kind(),
        ErrorKind::ArityMismatch { expected: Arity::Exact(2), actual: 1, .. }
    );
    let call = err.backtrace().calls().next().unwrap();
    assert_eq!(call.fn_name, "{x y . ..}");
    assert_eq!(call.def_location.as_ref().unwrap().location_offset(), 1);
}

#[test]
fn error_backtrace_through_closures() {
    let code = "({f . (f 1)} {x . (+ x missing)})";
    let err = try_evaluate(&session(), code).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnknownIdentifier(name) if name == "missing");
    assert_eq!(err.location().unwrap().location_offset(), code.find("missing").unwrap());

    let fn_names: Vec<_> = err.backtrace().calls().map(|call| call.fn_name.as_str()).collect();
    assert_eq!(fn_names, ["+", "{x . ..}", "{f . ..}"]);
}

#[test]
fn failed_evaluation_keeps_session_usable() {
    let session = session();
    evaluate(&session, "(cols data [0])->first");
    let err = try_evaluate(&session, "(sum (+ first 1) (cols first [5]))").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Domain);

    session.check_refs().unwrap();
    assert_eq!(evaluate(&session, "(sum first)"), Value::Num(10.0));
    session.end_quietly();
    assert!(session.temp_names().is_empty());
}

#[test]
fn session_is_shareable() {
    static_assertions::assert_impl_all!(Session: Send, Sync);
    static_assertions::assert_impl_all!(Value: Send, Sync, Clone);
    static_assertions::assert_impl_all!(Error: Send, Sync, std::error::Error);
}
