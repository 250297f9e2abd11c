use pretty_assertions::assert_eq;
use qail_typemap::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn int8() -> CoderRef {
    Arc::new(Int8Encoder)
}

fn homogeneous_ints(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| !items.is_empty() && items.iter().all(|v| v.as_int().is_some()))
}

#[test]
fn test_assign_nil_then_lookup() {
    let mut map = TypeMapByCategory::new();
    for category in Category::ALL {
        map.assign(category.name(), int8()).unwrap();
        map.assign(category.name(), Slot::Empty).unwrap();
        assert_eq!(map.lookup(category.name()).unwrap(), Slot::Empty);
    }
}

#[test]
fn test_assign_coder_then_lookup() {
    let coder = int8();
    let mut map = TypeMapByCategory::new();
    for category in Category::ALL {
        map.assign(category.name(), coder.clone()).unwrap();
        let slot = map.lookup(category.name()).unwrap();
        assert!(same_coder(slot.coder().unwrap(), &coder));
    }
}

#[test]
fn test_lookup_unknown_category() {
    let map = TypeMapByCategory::new();
    let err = map.lookup("T_UNDEF").unwrap_err();
    assert!(matches!(err, TypeMapError::UnknownCategory(ref n) if n == "T_UNDEF"));
}

#[test]
fn test_assign_unknown_category_keeps_state() {
    let mut map = TypeMapByCategory::new();
    map.assign("T_FLOAT", int8()).unwrap();
    let before = map.all_assignments();
    for bad in ["T_NIL", "T_fixnum", "fixnum", "", "T_FIXNUM\0"] {
        assert!(map.assign(bad, int8()).is_err());
        assert!(map.assign(bad, Resolver::method("x")).is_err());
    }
    assert_eq!(map.all_assignments(), before);
}

#[test]
fn test_all_assignments_tracks_latest() {
    let first = int8();
    let second: CoderRef = Arc::new(TextEncoder);
    let mut map = TypeMapByCategory::new();
    map.assign("T_STRING", first.clone()).unwrap();
    map.assign("T_STRING", second.clone()).unwrap();
    map.assign("T_HASH", Resolver::method("hash_coder")).unwrap();
    map.assign("T_REGEXP", first.clone()).unwrap();
    map.assign("T_REGEXP", Slot::Empty).unwrap();

    let all = map.all_assignments();
    assert_eq!(all.len(), Category::COUNT);

    let names: Vec<&str> = all.iter().map(|(name, _)| name).collect();
    let expected: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();
    assert_eq!(names, expected);

    assert_eq!(all.get("T_STRING"), Some(&Slot::Static(second)));
    assert_eq!(
        all.get("T_HASH"),
        Some(&Slot::Dynamic(Resolver::method("hash_coder")))
    );
    assert_eq!(all.get("T_REGEXP"), Some(&Slot::Empty));
    assert_eq!(all.get("T_ARRAY"), Some(&Slot::Empty));
    assert_eq!(all.get("T_NIL"), None);
}

#[test]
fn test_snapshot_is_detached() {
    let mut map = TypeMapByCategory::new();
    let snapshot = map.all_assignments();
    map.assign("T_FIXNUM", int8()).unwrap();
    assert_eq!(snapshot.get("T_FIXNUM"), Some(&Slot::Empty));
}

#[test]
fn test_integer_and_array_scenario() {
    let int_coder = int8();
    let array_coder: CoderRef = Arc::new(TextEncoder);
    let chosen = array_coder.clone();

    let mut map = TypeMapByCategory::new();
    map.assign("T_FIXNUM", int_coder.clone()).unwrap();
    map.assign(
        "T_ARRAY",
        Resolver::callable(move |value| {
            if homogeneous_ints(value) {
                Resolved::Coder(chosen.clone())
            } else {
                Resolved::Nil
            }
        }),
    )
    .unwrap();

    let got = map.typecast_query_param(&Value::Integer(5), 0).unwrap();
    assert!(same_coder(&got.unwrap(), &int_coder));

    let ints = Value::from(vec![Value::Integer(1), Value::Integer(2)]);
    let got = map.typecast_query_param(&ints, 1).unwrap();
    assert!(same_coder(&got.unwrap(), &array_coder));

    let mixed = Value::from(vec![Value::from("a"), Value::Integer(2)]);
    assert!(map.typecast_query_param(&mixed, 2).unwrap().is_none());
}

#[test]
fn test_bad_resolver_reports_position_and_type() {
    let mut map = TypeMapByCategory::new();
    map.assign(
        "T_STRING",
        Resolver::callable(|_| Resolved::Value(Value::Integer(42))),
    )
    .unwrap();

    let err = map.typecast_query_param(&Value::from("text"), 2).unwrap_err();
    assert!(matches!(
        err,
        TypeMapError::TypeMismatch { position: 3, ref type_name } if type_name == "integer"
    ));
    assert_eq!(
        err.to_string(),
        "argument 3 has invalid type integer (should be nil or some kind of Coder)"
    );
}

#[test]
fn test_mismatch_reports_object_class() {
    let mut map = TypeMapByCategory::new();
    map.assign(
        "T_OBJECT",
        Resolver::callable(|v| Resolved::Value(v.clone())),
    )
    .unwrap();
    let obj = Value::Object {
        class: "Invoice".into(),
        fields: vec![("total".into(), Value::Integer(10))],
    };
    let err = map.typecast_query_param(&obj, 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "argument 1 has invalid type Invoice (should be nil or some kind of Coder)"
    );
}

#[test]
fn test_empty_slot_never_calls_resolvers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut map = TypeMapByCategory::new();
    map.assign(
        "T_ARRAY",
        Resolver::callable(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Resolved::Nil
        }),
    )
    .unwrap();

    assert!(map.typecast_query_param(&Value::Float(2.5), 0).unwrap().is_none());
    assert!(map.typecast_query_param(&Value::Nil, 1).unwrap().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    map.typecast_query_param(&Value::Array(vec![]), 2).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_true_and_false_are_separate() {
    let yes: CoderRef = Arc::new(BoolEncoder);
    let mut map = TypeMapByCategory::new();
    map.assign("T_TRUE", yes.clone()).unwrap();

    assert!(map.typecast_query_param(&Value::Bool(true), 0).unwrap().is_some());
    assert!(map.typecast_query_param(&Value::Bool(false), 0).unwrap().is_none());
}

// Extension methods resolved by name at dispatch time.
#[derive(Debug, Default)]
struct ArrayMethods {
    array_coder: Option<CoderRef>,
}

impl MethodTable for ArrayMethods {
    const TYPE_NAME: &'static str = "ArrayTypeMap";

    fn call(map: &TypeMapByCategory<Self>, name: &str, value: &Value) -> Option<Resolved> {
        match name {
            "array_coder" => {
                let coder = map.methods().array_coder.clone();
                Some(if homogeneous_ints(value) {
                    coder.into()
                } else {
                    Resolved::Nil
                })
            }
            "broken" => Some(Resolved::Value(Value::Symbol("oops".into()))),
            _ => None,
        }
    }
}

#[test]
fn test_named_method_late_binding() {
    let mut map = TypeMapByCategory::with_methods(ArrayMethods::default());
    map.assign("T_ARRAY", Resolver::method("array_coder")).unwrap();

    let ints = Value::from(vec![Value::Integer(1)]);
    assert!(map.typecast_query_param(&ints, 0).unwrap().is_none());

    // The method reads extension state at call time.
    let coder = int8();
    map.methods_mut().array_coder = Some(coder.clone());
    let got = map.typecast_query_param(&ints, 0).unwrap().unwrap();
    assert!(same_coder(&got, &coder));
}

#[test]
fn test_named_method_errors() {
    let mut map = TypeMapByCategory::with_methods(ArrayMethods::default());
    map.assign("T_HASH", Resolver::method("broken")).unwrap();
    map.assign("T_STRUCT", Resolver::method("nope")).unwrap();

    let err = map.typecast_query_param(&Value::Hash(vec![]), 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "argument 2 has invalid type symbol (should be nil or some kind of Coder)"
    );

    let record = Value::Struct {
        name: "Point".into(),
        fields: vec![],
    };
    let err = map.typecast_query_param(&record, 0).unwrap_err();
    assert_eq!(err.to_string(), "undefined method `nope' for ArrayTypeMap");
}

#[test]
fn test_result_decoding_is_unsupported() {
    let map = TypeMapByCategory::new();
    let fields = vec![FieldDescription {
        name: "id".into(),
        type_oid: 20,
        format: 1,
    }];
    let Err(err) = map.fit_to_result(&fields) else {
        panic!("result decoding should be unsupported");
    };
    assert_eq!(
        err.to_string(),
        "type map TypeMapByCategory is not suitable to map result values"
    );
    assert!(map.typecast_result_value(Some(b"1"), 0, 0).is_err());
    assert!(map.typecast_copy_get(b"1", 0, 0).is_err());
}

#[test]
fn test_coders_shared_between_maps() {
    let coder = int8();
    let mut a = TypeMapByCategory::new();
    let mut b = TypeMapByCategory::new();
    a.assign("T_FIXNUM", coder.clone()).unwrap();
    b.assign("T_BIGNUM", coder.clone()).unwrap();
    assert_eq!(Arc::strong_count(&coder), 3);

    drop(a);
    assert_eq!(Arc::strong_count(&coder), 2);
    b.assign("T_BIGNUM", Slot::Empty).unwrap();
    assert_eq!(Arc::strong_count(&coder), 1);
}

#[test]
fn test_config_to_params() {
    let config = TypeMapConfig::from_toml_str(
        r#"
        [coders]
        T_FIXNUM = "int8"
        T_FLOAT = "float8"
        T_TRUE = "bool"
        T_FALSE = "bool"
        "#,
    )
    .unwrap();
    let map = config.build(&CoderRegistry::builtin()).unwrap();

    let params = vec![
        Value::Integer(1),
        Value::Float(0.5),
        Value::Bool(false),
        Value::from("plain"),
    ];
    let encoded = typecast_params(&map, &params).unwrap();
    let coders: Vec<Option<&str>> = encoded.iter().map(|p| p.coder.as_deref()).collect();
    assert_eq!(coders, vec![Some("int8"), Some("float8"), Some("bool"), None]);
    assert_eq!(encoded[2].value, Some(vec![0]));
    assert_eq!(encoded[3].value, Some(b"plain".to_vec()));
}

#[test]
fn test_configured_array_method() {
    let config = TypeMapConfig::from_toml_str(
        r#"
        [coders]
        T_FIXNUM = "int8"
        T_ARRAY = { method = "array_coder" }
        "#,
    )
    .unwrap();
    let map = config.build_with_registry(&CoderRegistry::builtin()).unwrap();

    let params = vec![
        Value::Integer(42),
        Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
    ];
    let encoded = typecast_params(&map, &params).unwrap();
    assert_eq!(encoded[0].coder.as_deref(), Some("int8"));
    assert_eq!(encoded[1].coder.as_deref(), Some("int8[]"));
    assert_eq!(encoded[1].value, Some(b"{1,2}".to_vec()));
}
