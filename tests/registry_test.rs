// Tests for the process-wide filter registry

mod common;

use filterchain::{
    apply_filter, filter_exists, override_filter, register_filter, replace_filter, Bindings,
    ErrorKind, Value,
};
use std::thread;

#[test]
fn test_register_duplicate_keeps_first() {
    common::init_test_logging();
    register_filter("reg_dup", |_, _, _| Ok(Value::from("f"))).unwrap();

    let err = register_filter("reg_dup", |_, _, _| Ok(Value::from("g"))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateRegistration("reg_dup".to_string()));

    let out = apply_filter("reg_dup", &Value::Nil, None, &Bindings::new()).unwrap();
    assert_eq!(out, Value::from("f"));
}

#[test]
fn test_replace_unregistered_fails() {
    let err = replace_filter("reg_never_registered", |_, _, _| Ok(Value::Nil)).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MissingRegistration("reg_never_registered".to_string())
    );
    assert!(!filter_exists("reg_never_registered"));
}

#[test]
fn test_replace_registered() {
    register_filter("reg_replace", |_, _, _| Ok(Value::from("old"))).unwrap();
    replace_filter("reg_replace", |_, _, _| Ok(Value::from("new"))).unwrap();

    let out = apply_filter("reg_replace", &Value::Nil, None, &Bindings::new()).unwrap();
    assert_eq!(out, Value::from("new"));
}

#[test]
fn test_override_regardless_of_state() {
    // Fresh name
    override_filter("reg_override", |_, _, _| Ok(Value::from(1))).unwrap();
    assert!(filter_exists("reg_override"));

    // Existing name
    override_filter("reg_override", |_, _, _| Ok(Value::from(2))).unwrap();
    let out = apply_filter("reg_override", &Value::Nil, None, &Bindings::new()).unwrap();
    assert_eq!(out, Value::Integer(2));
}

#[test]
fn test_apply_unknown_filter() {
    let err = apply_filter("reg_unknown", &Value::from(1), None, &Bindings::new()).unwrap_err();
    assert_eq!(err.sender, "applyfilter");
    assert_eq!(err.kind, ErrorKind::UnknownFilter("reg_unknown".to_string()));
}

#[test]
fn test_apply_without_parameter_passes_nil() {
    register_filter("reg_sentinel", |_, param, _| {
        assert!(param.is_nil());
        Ok(Value::from("saw nil"))
    })
    .unwrap();

    let out = apply_filter("reg_sentinel", &Value::from("in"), None, &Bindings::new()).unwrap();
    assert_eq!(out, Value::from("saw nil"));
}

#[test]
fn test_apply_builtin_with_parameter() {
    let out = apply_filter(
        "truncatechars",
        &Value::from("Hello World"),
        Some(&Value::from(8)),
        &Bindings::new(),
    )
    .unwrap();
    assert_eq!(out, Value::from("Hello..."));
}

#[test]
fn test_concurrent_registration_of_distinct_names() {
    let handles: Vec<_> = (0..8)
        .map(|t| {
            thread::spawn(move || {
                for i in 0..25 {
                    register_filter(&format!("reg_concurrent_{}_{}", t, i), move |_, _, _| {
                        Ok(Value::from(i))
                    })
                    .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..8 {
        for i in 0..25 {
            assert!(filter_exists(&format!("reg_concurrent_{}_{}", t, i)));
        }
    }
}
