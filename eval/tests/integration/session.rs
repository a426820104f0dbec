//! Tests for session bookkeeping: temps, reference counts and copy-on-write.

use assert_matches::assert_matches;
use proptest::prelude::*;

use rapids_eval::{Column, ErrorKind, Frame, Session, Store, Value};

use crate::{evaluate, session};

fn fresh_frame(values: &[f64]) -> Frame {
    Frame::from_nums([("x", values.to_vec()), ("y", values.to_vec())]).unwrap()
}

#[test]
fn tracking_then_removing_temp_reclaims_columns() {
    let session = Session::new(Store::new());
    let frame = session.track_tmp(fresh_frame(&[1.0, 2.0]).with_key("a")).unwrap();
    for column in frame.columns() {
        assert_eq!(session.ref_count(column), 1);
    }

    assert!(session.remove(&frame));
    for column in frame.columns() {
        assert_eq!(session.ref_count(column), 0);
        assert!(column.is_freed());
    }

    // Removal is idempotent.
    assert!(!session.remove(&frame));
    for column in frame.columns() {
        assert_eq!(session.ref_count(column), 0);
    }
    session.check_refs().unwrap();
}

#[test]
fn removing_temp_keeps_global_columns() {
    let session = session();
    evaluate(&session, "(cols data [0])->first");
    let first = session.temp("first").unwrap();
    let column = &first.columns()[0];
    assert_eq!(session.ref_count(column), 1);
    assert!(session.is_global(column));

    assert!(session.remove(&first));
    assert_eq!(session.ref_count(column), 0);
    assert!(!column.is_freed());
    assert_eq!(evaluate(&session, "(sum data)"), Value::Num(110.0));
}

#[test]
fn copy_on_write_identity() {
    let session = Session::new(Store::new());
    let frame = fresh_frame(&[1.0, 2.0, 3.0]);

    // Nothing else refers to the frame, so columns are mutated in place.
    let output = session.copy_on_write(&frame, &[0]).unwrap();
    assert!(output.is_same(&frame));
    assert!(output.columns()[0].ptr_eq(&frame.columns()[0]));

    // Shared with a temp: the column is copied, the other one is left as is.
    let temp = session.track_tmp(frame.clone().with_key("t")).unwrap();
    let output = session.copy_on_write(&temp, &[1]).unwrap();
    assert!(output.columns()[0].ptr_eq(&temp.columns()[0]));
    assert!(!output.columns()[1].ptr_eq(&temp.columns()[1]));
    assert_ne!(output.key(), temp.key());
    assert_eq!(session.ref_count(&temp.columns()[1]), 1);
    assert_eq!(session.ref_count(&output.columns()[1]), 0);

    output.columns()[1]
        .write(|data| {
            if let rapids_eval::ColumnData::Num(values) = data {
                values[0] = -1.0;
            }
        })
        .unwrap();
    assert_eq!(temp.columns()[1].nums().unwrap(), [1.0, 2.0, 3.0]);
    assert_eq!(output.columns()[1].nums().unwrap(), [-1.0, 2.0, 3.0]);
}

#[test]
fn ending_session_with_frame() {
    let session = session();
    evaluate(&session, "(* data 2)->doubled");
    let value = evaluate(&session, "(cbind doubled (cols data [1]))");

    let value = session.end(value).unwrap();
    assert!(session.temp_names().is_empty());
    let frame = value.as_frame().unwrap();
    // The first column belonged to a temp, but is still referenced by the returned frame.
    assert_eq!(frame.columns()[0].nums().unwrap(), [2.0, 4.0, 6.0, 8.0]);
    // The second column has been detached from the global frame.
    let data = session.store().get("data").unwrap();
    assert!(!frame.columns()[2].ptr_eq(&data.columns()[1]));
    assert_eq!(frame.columns()[2].nums().unwrap(), [10.0, 20.0, 30.0, 40.0]);

    let data_column = &data.columns()[1];
    assert!(!session.is_global(data_column));
    assert_eq!(session.ref_count(data_column), 0);
}

#[test]
fn tracking_duplicate_temp() {
    let session = Session::new(Store::new());
    let frame = session.track_tmp(fresh_frame(&[1.0]).with_key("a")).unwrap();

    let err = session.track_tmp(fresh_frame(&[2.0]).with_key("a")).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::TempExists(name) if name == "a");
    assert!(session.temp("a").unwrap().is_same(&frame));
    session.check_refs().unwrap();
}

#[test]
fn sessions_are_independent() {
    let store = crate::data_store();
    let first = Session::new(store.clone());
    let second = Session::new(store);

    evaluate(&first, "(cols data [0])->x");
    assert!(second.temp("x").is_none());
    assert_eq!(evaluate(&second, "(sum (cols data [0]))"), Value::Num(10.0));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let session = &second;
                scope.spawn(move || {
                    let code = format!("(sum (+ (cols data [1]) {}))", i);
                    session.exec(&code).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let expected = 100.0 + 4.0 * i as f64;
            assert_eq!(handle.join().unwrap(), Value::Num(expected));
        }
    });
    second.check_refs().unwrap();
}

#[derive(Debug, Clone)]
enum Op {
    /// Tracks a new temp, either with fresh columns or sharing columns of another temp.
    Track { name: usize, shared_with: Option<usize> },
    /// Removes a temp (possibly a second time).
    Remove(usize),
    /// Prepares a column of a temp for mutation.
    CopyOnWrite { name: usize, column: usize },
    /// Evaluates an expression over temps.
    Exec(usize),
}

const NAMES: usize = 4;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NAMES, proptest::option::of(0..NAMES))
            .prop_map(|(name, shared_with)| Op::Track { name, shared_with }),
        (0..NAMES).prop_map(Op::Remove),
        (0..NAMES, 0..2_usize).prop_map(|(name, column)| Op::CopyOnWrite { name, column }),
        (0..NAMES).prop_map(Op::Exec),
    ]
}

fn temp_name(idx: usize) -> String {
    format!("t{}", idx)
}

fn apply_op(session: &Session, removed: &mut Vec<Frame>, op: &Op) {
    match *op {
        Op::Track { name, shared_with } => {
            let source = shared_with.and_then(|idx| session.temp(&temp_name(idx)));
            let frame = match source {
                Some(source) => source.select(&[1, 0]).unwrap(),
                None => fresh_frame(&[1.0, 2.0, 3.0]),
            };
            let is_taken = session.temp(&temp_name(name)).is_some();
            let result = session.track_tmp(frame.with_key(temp_name(name)));
            if is_taken {
                assert_matches!(result.unwrap_err().kind(), ErrorKind::TempExists(_));
            } else {
                result.unwrap();
            }
        }
        Op::Remove(name) => {
            let existing = session.temp(&temp_name(name));
            // Without a live temp, either re-remove a removed frame (unless its name
            // has been reused since) or remove a frame unknown to the session.
            let stale = removed
                .last()
                .filter(|frame| session.temp(frame.key()).is_none())
                .cloned();
            let frame = existing
                .clone()
                .or(stale)
                .unwrap_or_else(|| fresh_frame(&[0.0]));
            let was_removed = session.remove(&frame);
            assert_eq!(was_removed, existing.is_some());
            if existing.is_some() {
                removed.push(frame);
            }
        }
        Op::CopyOnWrite { name, column } => {
            if let Some(temp) = session.temp(&temp_name(name)) {
                let output = session.copy_on_write(&temp, &[column]).unwrap();
                // A temp always holds a reference, so the column must be copied.
                assert!(!output.columns()[column].ptr_eq(&temp.columns()[column]));
                assert_eq!(
                    output.columns()[column].nums().unwrap(),
                    temp.columns()[column].nums().unwrap()
                );
            }
        }
        Op::Exec(name) => {
            let code = format!("(sum (+ {} 1))", temp_name(name));
            let result = session.exec(&code);
            if session.temp(&temp_name(name)).is_some() {
                assert_eq!(result.unwrap(), Value::Num(18.0));
            } else {
                assert_matches!(result.unwrap_err().kind(), ErrorKind::UnknownIdentifier(_));
            }
        }
    }
}

proptest! {
    #[test]
    fn refcount_invariant_holds(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let session = Session::new(Store::new());
        let mut removed = vec![];
        for op in &ops {
            apply_op(&session, &mut removed, op);
            session.check_refs().unwrap();

            // Columns are reclaimed exactly when no temp refers to them.
            for frame in &removed {
                for column in frame.columns() {
                    let referenced = session.ref_count(column) > 0;
                    prop_assert_eq!(column.is_freed(), !referenced);
                }
            }
        }

        let live: Vec<Frame> = session
            .temp_names()
            .iter()
            .filter_map(|name| session.temp(name))
            .collect();
        session.end_quietly();
        for column in live.iter().chain(&removed).flat_map(Frame::columns) {
            prop_assert!(column.is_freed());
            prop_assert_eq!(session.ref_count(column), 0);
        }
    }
}

#[test]
fn freed_column_cannot_be_read() {
    let session = Session::new(Store::new());
    let frame = session.track_tmp(fresh_frame(&[1.0]).with_key("a")).unwrap();
    session.remove(&frame);
    let column: &Column = &frame.columns()[0];
    assert_matches!(column.nums(), Err(ErrorKind::FreedColumn(id)) if id == column.id());
}
