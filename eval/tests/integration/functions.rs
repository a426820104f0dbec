//! Tests for interpreted functions and lexical scoping.

use assert_matches::assert_matches;

use rapids_eval::{ErrorKind, Value};

use crate::{evaluate, frame_column, session, try_evaluate};

#[test]
fn nested_closure() {
    let value = evaluate(&session(), "(({x . {y . (+ x y)}} 1) 2)");
    assert_eq!(value, Value::Num(3.0));
}

#[test]
fn closure_ignores_outer_rebinding() {
    let code = "({x . (({x . {y . (+ x y)}} 1) 2)} 100)";
    assert_eq!(evaluate(&session(), code), Value::Num(3.0));
}

#[test]
fn scoping_is_lexical() {
    // `f` is applied in a scope where `x` is bound to 100, but sees `x = 1`
    // from its definition.
    let code = "({f . ({x . (f 2)} 100)} ({x . {y . (+ x y)}} 1))";
    assert_eq!(evaluate(&session(), code), Value::Num(3.0));
}

#[test]
fn free_identifier_in_closure_is_unbound_at_call_site() {
    let code = "({g . ({y . (g)} 5)} {. y})";
    let err = try_evaluate(&session(), code).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnknownIdentifier(name) if name == "y");
}

#[test]
fn params_shadow_primitives() {
    let session = session();
    assert_eq!(evaluate(&session, "({sum . (+ sum 1)} 5)"), Value::Num(6.0));
    // ...but only within the function body.
    assert_eq!(evaluate(&session, "(, ({sum . sum} 5) (sum 1 2))"), Value::Num(3.0));
}

#[test]
fn higher_order_functions() {
    let session = session();
    let code = "({f x . (f (f x))} {x . (* x 3)} 2)";
    assert_eq!(evaluate(&session, code), Value::Num(18.0));

    let code = "({compose . ((compose {x . (+ x 1)} {x . (* x 2)}) 5)} \
        {f g . {x . (f (g x))}})";
    assert_eq!(evaluate(&session, code), Value::Num(11.0));
}

#[test]
fn functions_are_values() {
    let session = session();
    let value = evaluate(&session, "{x . x}");
    let fun = value.as_fun().unwrap();
    assert_eq!(fun.name(), "{x . ..}");
    assert!(fun.def_location().is_some());

    let value = evaluate(&session, "({f . f} +)");
    assert_matches!(value, Value::Fun(fun) if fun.name() == "+");
}

#[test]
fn closures_over_frames() {
    let session = session();
    let code = "({x . ({y . (+ x y)} 1)} (* (cols data [1]) 2))";
    let value = evaluate(&session, code);
    assert_eq!(frame_column(&value, 0), [21.0, 41.0, 61.0, 81.0]);
    session.check_refs().unwrap();

    // Frames captured by a returned closure stay readable while the closure is applied.
    let code = "(({x . {y . (sum x y)}} (+ (cols data [0]) 1)) 0)";
    assert_eq!(evaluate(&session, code), Value::Num(14.0));
}

#[test]
fn side_effects_in_args_are_ordered() {
    let session = session();
    let code = "({a b . (sum b)} (cols data [0])->first (+ first 1))";
    assert_eq!(evaluate(&session, code), Value::Num(14.0));
    assert!(session.temp("first").is_some());
}
