//! Tests for frame access and assignment primitives.

use assert_matches::assert_matches;

use std::sync::Arc;

use rapids_eval::{
    prims::Primitives, ErrorCategory, ErrorKind, Frame, Session, SessionConfig, Value,
};
use rapids_parser::num_list::{ColumnBounds, NumListError};

use crate::{data_store, evaluate, frame_column, session, try_evaluate};

#[test]
fn selecting_columns() {
    let session = session();
    let value = evaluate(&session, "(cols data [1])");
    let frame = value.as_frame().unwrap();
    assert_eq!(frame.names(), ["b"]);

    let data = session.store().get("data").unwrap();
    assert!(frame.columns()[0].ptr_eq(&data.columns()[1]));

    let value = evaluate(&session, "(cols data [-1])");
    assert_eq!(value.as_frame().unwrap().names(), ["b"]);
    let value = evaluate(&session, "(cols data ['b' 'a'])");
    assert_eq!(value.as_frame().unwrap().names(), ["b", "a"]);

    let err = try_evaluate(&session, "(cols data [-1 0])").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Selector(NumListError::MixedSigns));
    let err = try_evaluate(&session, "(cols data 'c')").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnknownColumn(name) if name == "c");
}

#[test]
fn column_bounds_are_configurable() {
    let session = session();
    let err = try_evaluate(&session, "(cols data [1:5])").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Domain);

    let config = SessionConfig {
        column_bounds: ColumnBounds::Ignore,
        ..SessionConfig::default()
    };
    let session = Session::with_config(Primitives::standard(), data_store(), config);
    let value = evaluate(&session, "(cols data [1:5])");
    assert_eq!(value.as_frame().unwrap().names(), ["b"]);
}

#[test]
fn selecting_rows() {
    let session = session();
    let value = evaluate(&session, "(rows data [1 3])");
    assert_eq!(frame_column(&value, 0), [2.0, 4.0]);
    assert_eq!(frame_column(&value, 1), [20.0, 40.0]);

    let value = evaluate(&session, "(rows data [-1])");
    assert_eq!(frame_column(&value, 0), [2.0, 3.0, 4.0]);

    let value = evaluate(&session, "(rows data (> (cols data [0]) 2))");
    assert_eq!(frame_column(&value, 1), [30.0, 40.0]);

    let err = try_evaluate(&session, "(rows data [4])").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::RowOutOfRange { index: 4, len: 4 });
}

#[test]
fn frame_shape() {
    let session = session();
    assert_eq!(evaluate(&session, "(nrow data)"), Value::Num(4.0));
    assert_eq!(evaluate(&session, "(ncol data)"), Value::Num(2.0));
    assert_eq!(
        evaluate(&session, "(names data)"),
        Value::Strs(vec!["a".to_owned(), "b".to_owned()])
    );
}

#[test]
fn binding_columns() {
    let session = session();
    let value = evaluate(&session, "(cbind data (cols data [0]) 5)");
    let frame = value.as_frame().unwrap();
    assert_eq!(frame.names(), ["a", "b", "a0", "C4"]);
    assert_eq!(frame_column(&value, 3), [5.0; 4]);

    let value = evaluate(&session, "(getrow (rows data [2]))");
    let row = value.as_row().unwrap();
    assert_eq!(row.values(), [3.0, 30.0]);
    assert_eq!(row.get("b"), Some(30.0));
}

#[test]
fn rectangle_assignment_on_fresh_frame() {
    let session = session();
    let value = evaluate(&session, "(:= (+ data 0) 0 [1] [0 2])");
    assert_eq!(frame_column(&value, 0), [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(frame_column(&value, 1), [0.0, 20.0, 0.0, 40.0]);

    let value = evaluate(&session, "(:= (+ data 0) -1 [] [])");
    assert_eq!(frame_column(&value, 0), [-1.0; 4]);
    assert_eq!(frame_column(&value, 1), [-1.0; 4]);

    let value = evaluate(&session, "(:= (+ data 0) (rows (cols data [0]) [0 1]) [1] [2 3])");
    assert_eq!(frame_column(&value, 1), [10.0, 20.0, 1.0, 2.0]);
}

#[test]
fn rectangle_assignment_appends_column() {
    let session = session();
    let value = evaluate(&session, "(:= (+ data 0) 7 [2] [1])");
    let frame = value.as_frame().unwrap();
    assert_eq!(frame.names(), ["a", "b", "C3"]);
    let appended = frame_column(&value, 2);
    assert!(appended[0].is_nan());
    assert_eq!(appended[1], 7.0);
}

#[test]
fn rectangle_assignment_copies_shared_columns() {
    let session = session();
    evaluate(&session, "(cols data [0])->first");
    let first = session.temp("first").unwrap();

    let value = evaluate(&session, "(:= first 0 [] [0])");
    let frame = value.as_frame().unwrap();
    assert_eq!(frame_column(&value, 0), [0.0, 2.0, 3.0, 4.0]);
    assert!(!frame.columns()[0].ptr_eq(&first.columns()[0]));
    assert_ne!(frame.key(), "first");

    // Neither the temp nor the global frame are changed.
    assert_eq!(evaluate(&session, "(sum first)"), Value::Num(10.0));
    let data = session.store().get("data").unwrap();
    assert_eq!(data.columns()[0].nums().unwrap(), [1.0, 2.0, 3.0, 4.0]);
    session.check_refs().unwrap();
}

#[test]
fn rectangle_assignment_errors() {
    let session = session();
    let err = try_evaluate(&session, "(:= (+ data 0) data [0] [])").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::ShapeMismatch { .. });
    let err = try_evaluate(&session, "(:= (+ data 0) 'x' [0] [])").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnexpectedColumnType { .. });
}

#[test]
fn assigning_to_categorical_column() {
    let store = data_store();
    let levels = rapids_eval::Column::cat(
        vec!["lo".to_owned(), "hi".to_owned()],
        vec![Some(0), Some(1), None],
    );
    store.insert(Frame::new(vec!["level".to_owned()], vec![levels]).unwrap().with_key("cats"));
    let session = Session::with_config(Primitives::standard(), store, SessionConfig::default());

    let value = evaluate(&session, "(:= cats 'mid' [] [2])");
    let column = &value.as_frame().unwrap().columns()[0];
    assert_eq!(column.domain().unwrap().unwrap(), ["lo", "hi", "mid"]);
    assert_eq!(column.str_at(2).unwrap().as_deref(), Some("mid"));

    // The global frame has been copied rather than mutated.
    let cats = session.store().get("cats").unwrap();
    assert_eq!(cats.columns()[0].str_at(2).unwrap(), None);
}

#[test]
fn assigning_global_frame() {
    let session = session();
    let value = evaluate(&session, "(assign doubled (* data 2))");
    assert_eq!(value.as_frame().unwrap().key(), "doubled");
    assert_eq!(evaluate(&session, "(sum (cols doubled [0]))"), Value::Num(20.0));

    // Columns already owned by another global frame are copied.
    let value = evaluate(&session, "(assign alias (cols data [0]))");
    let data = session.store().get("data").unwrap();
    assert!(!value.as_frame().unwrap().columns()[0].ptr_eq(&data.columns()[0]));

    evaluate(&session, "(cols data [0])->tmp");
    let err = try_evaluate(&session, "(assign tmp data)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::InvalidArg { name, .. } if name == "assign");
}

#[test]
fn removing_frames_by_name() {
    let session = session();
    evaluate(&session, "(* data 2)->doubled");
    let doubled = session.temp("doubled").unwrap();

    assert_eq!(evaluate(&session, "(rm doubled)"), Value::Num(1.0));
    assert!(session.temp("doubled").is_none());
    assert!(doubled.columns().iter().all(|column| column.is_freed()));
    assert_eq!(evaluate(&session, "(rm doubled)"), Value::Num(0.0));

    assert_eq!(evaluate(&session, "(rm data)"), Value::Num(1.0));
    assert!(!session.store().contains("data"));
    let err = try_evaluate(&session, "(sum data)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnknownIdentifier(_));
}

#[test]
fn temp_names_cannot_be_reused_or_shadow_primitives() {
    let session = session();
    evaluate(&session, "(cols data [0])->x");
    let err = try_evaluate(&session, "(cols data [1])->x").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::TempExists(name) if name == "x");

    let err = try_evaluate(&session, "(tmp= sum data)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::InvalidArg { name, .. } if name == "tmp=");
    session.check_refs().unwrap();
}

#[test]
fn custom_registry_without_assignment() {
    let mut primitives = Primitives::new();
    primitives.extend(&rapids_eval::prims::Arithmetic);
    let session = Session::with_config(Arc::new(primitives), data_store(), SessionConfig::default());
    assert_eq!(evaluate(&session, "(+ 1 2)"), Value::Num(3.0));

    let err = try_evaluate(&session, "(cols data [0])->x").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnknownIdentifier(name) if name == "tmp=");
}
