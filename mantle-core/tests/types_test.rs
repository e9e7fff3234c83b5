// mantle-core - Type algebra integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for the type algebra: membership, assignability,
//! generalization, inference, and the type expression parser.

use mantle_core::types::{parse, UNBOUNDED};
use mantle_core::{infer, AliasType, RecursionGuard, Type, Value, ValueHash};

fn instance(type_expression: &str, value: &Value) -> bool {
    let ty = parse(type_expression).expect("type expression parses");
    let mut guard = RecursionGuard::new();
    ty.is_instance(value, &mut guard)
}

fn assignable(target: &str, source: &str) -> bool {
    let target = parse(target).expect("target type parses");
    let source = parse(source).expect("source type parses");
    let mut guard = RecursionGuard::new();
    target.is_assignable(&source, &mut guard)
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn any_matches_everything() {
    for value in [
        Value::Undef,
        Value::Default,
        Value::Boolean(true),
        Value::Integer(0),
        Value::Float(1.5),
        Value::string("s"),
    ] {
        assert!(instance("Any", &value));
    }
}

#[test]
fn undef_and_notundef_partition_values() {
    assert!(instance("Undef", &Value::Undef));
    assert!(!instance("Undef", &Value::Integer(0)));
    assert!(instance("NotUndef", &Value::Integer(0)));
    assert!(!instance("NotUndef", &Value::Undef));
    assert!(instance("NotUndef[Integer]", &Value::Integer(0)));
    assert!(!instance("NotUndef[Integer]", &Value::string("s")));
}

#[test]
fn integer_ranges_are_inclusive() {
    assert!(instance("Integer[0, 10]", &Value::Integer(0)));
    assert!(instance("Integer[0, 10]", &Value::Integer(10)));
    assert!(!instance("Integer[0, 10]", &Value::Integer(11)));
    assert!(!instance("Integer[0, 10]", &Value::Float(5.0)));
    assert!(instance("Integer[0]", &Value::Integer(i64::MAX)));
}

#[test]
fn string_length_is_counted_in_codepoints() {
    assert!(instance("String[1, 3]", &Value::string("abc")));
    // Three codepoints even though more than three bytes.
    assert!(instance("String[1, 3]", &Value::string("äöü")));
    assert!(!instance("String[1, 3]", &Value::string("abcd")));
    assert!(!instance("String[1, 3]", &Value::string("")));
}

#[test]
fn pattern_and_enum_match_strings() {
    assert!(instance("Pattern[/^a/, /b$/]", &Value::string("abc")));
    assert!(instance("Pattern[/^a/, /b$/]", &Value::string("cab")));
    assert!(!instance("Pattern[/^a/]", &Value::string("ba")));
    assert!(instance("Enum['red', 'green']", &Value::string("red")));
    // Enum matching is case sensitive.
    assert!(!instance("Enum['red', 'green']", &Value::string("RED")));
}

#[test]
fn scalar_and_data_are_abstract_unions() {
    for value in [
        Value::Integer(1),
        Value::Float(1.0),
        Value::string("s"),
        Value::Boolean(false),
    ] {
        assert!(instance("Scalar", &value));
        assert!(instance("Data", &value));
    }
    assert!(!instance("Scalar", &Value::Undef));
    assert!(instance("Data", &Value::Undef));
    let nested = Value::array([
        Value::Integer(1),
        Value::array([Value::string("x")]),
    ]);
    assert!(instance("Data", &nested));
    let keyed: ValueHash = [(Value::Integer(1), Value::Integer(2))].into_iter().collect();
    assert!(!instance("Data", &Value::Hash(keyed)));
}

#[test]
fn array_bounds_and_element_types() {
    let value = Value::array([Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
    assert!(instance("Array[Integer[0, 10], 2, 4]", &value));
    let two = Value::array([Value::Integer(1), Value::Integer(2)]);
    assert!(instance("Array[Integer[0, 10], 2, 4]", &two));
    let one = Value::array([Value::Integer(1)]);
    assert!(!instance("Array[Integer[0, 10], 2, 4]", &one));
    let out_of_range = Value::array([Value::Integer(1), Value::Integer(11)]);
    assert!(!instance("Array[Integer[0, 10], 2, 4]", &out_of_range));
}

#[test]
fn collection_checks_size_only() {
    let array = Value::array([Value::Integer(1), Value::string("s")]);
    assert!(instance("Collection[1, 2]", &array));
    assert!(!instance("Collection[3, 4]", &array));
    let hash: ValueHash = [(Value::string("a"), Value::Integer(1))].into_iter().collect();
    assert!(instance("Collection", &Value::Hash(hash)));
    assert!(!instance("Collection", &Value::Integer(1)));
}

#[test]
fn tuple_types_repeat_their_tail() {
    let value = Value::array([
        Value::Integer(1),
        Value::string("a"),
        Value::string("b"),
    ]);
    assert!(instance("Tuple[Integer, String, 2, 4]", &value));
    assert!(!instance("Tuple[Integer, String]", &value));
    assert!(instance(
        "Tuple[Integer, String]",
        &Value::array([Value::Integer(1), Value::string("a")]),
    ));
}

#[test]
fn struct_members_check_presence_and_types() {
    let value: ValueHash = [
        (Value::string("mode"), Value::string("0644")),
        (Value::string("owner"), Value::string("root")),
    ]
    .into_iter()
    .collect();
    let value = Value::Hash(value);
    assert!(instance(
        "Struct[{'mode' => String, 'owner' => String}]",
        &value
    ));
    assert!(instance(
        "Struct[{'mode' => String, 'owner' => String, Optional['group'] => String}]",
        &value
    ));
    // A required key is missing.
    assert!(!instance(
        "Struct[{'mode' => String, 'owner' => String, 'group' => String}]",
        &value
    ));
    // Extra keys are not allowed.
    assert!(!instance("Struct[{'mode' => String}]", &value));
}

#[test]
fn type_metatype_uses_assignability() {
    let value = Value::from_type(parse("Integer[1, 2]").unwrap());
    assert!(instance("Type", &value));
    assert!(instance("Type[Integer]", &value));
    assert!(!instance("Type[String]", &value));
}

#[test]
fn iterable_covers_the_streamable_values() {
    assert!(instance("Iterable", &Value::array([])));
    assert!(instance("Iterable", &Value::string("abc")));
    assert!(instance("Iterable", &Value::Integer(3)));
    assert!(!instance("Iterable", &Value::Integer(-1)));
    assert!(!instance("Iterable", &Value::Boolean(true)));
}

// ============================================================================
// Assignability
// ============================================================================

#[test]
fn numeric_range_assignability() {
    assert!(assignable("Integer", "Integer[0, 10]"));
    assert!(assignable("Integer[0, 10]", "Integer[2, 8]"));
    assert!(!assignable("Integer[2, 8]", "Integer[0, 10]"));
    assert!(!assignable("Integer", "Float"));
    assert!(assignable("Numeric", "Float[0.5, 1.5]"));
    assert!(assignable("Float", "Float[0.5, 1.5]"));
}

#[test]
fn array_assignability_covers_bounds_and_elements() {
    assert!(assignable("Array[Numeric]", "Array[Integer[0, 10]]"));
    assert!(!assignable("Array[Integer]", "Array[Numeric]"));
    assert!(assignable("Array[Integer, 0, 10]", "Array[Integer, 2, 4]"));
    assert!(!assignable("Array[Integer, 2, 4]", "Array[Integer]"));
    // A tuple fits an array when every element type fits.
    assert!(assignable("Array[Scalar]", "Tuple[Integer, String]"));
    assert!(!assignable("Array[Integer]", "Tuple[Integer, String]"));
}

#[test]
fn variant_distributes_on_both_sides() {
    assert!(assignable("Variant[Integer, String]", "Integer"));
    assert!(assignable(
        "Variant[Integer, String]",
        "Variant[Integer[0, 5], String[1, 2]]"
    ));
    assert!(!assignable("Variant[Integer, String]", "Variant[Integer, Boolean]"));
    assert!(assignable("Scalar", "Variant[Integer, String, Boolean]"));
}

#[test]
fn optional_admits_undef() {
    assert!(assignable("Optional[String]", "Undef"));
    assert!(assignable("Optional[String]", "String"));
    assert!(!assignable("String", "Optional[String]"));
    assert!(assignable("Optional[String]", "Optional[String[1, 3]]"));
    assert!(!assignable("NotUndef", "Optional[String]"));
    // Stripping undef out of the source makes it fit again.
    assert!(assignable("NotUndef[String]", "NotUndef[Optional[String]]"));
}

#[test]
fn string_accepts_enums_by_length() {
    assert!(assignable("String", "Enum['a', 'bc']"));
    assert!(assignable("String[1, 2]", "Enum['a', 'bc']"));
    assert!(!assignable("String[2, 2]", "Enum['a', 'bc']"));
    assert!(assignable("Enum['a', 'b']", "Enum['a']"));
    assert!(!assignable("Enum['a']", "Enum['a', 'b']"));
    assert!(assignable("Pattern[/^a/]", "Enum['ab', 'ac']"));
    assert!(!assignable("Pattern[/^a/]", "Enum['ab', 'xc']"));
}

#[test]
fn struct_assignability_checks_required_members() {
    assert!(assignable(
        "Struct[{'a' => Integer, Optional['b'] => String}]",
        "Struct[{'a' => Integer[0, 5]}]"
    ));
    assert!(!assignable(
        "Struct[{'a' => Integer, 'b' => String}]",
        "Struct[{'a' => Integer}]"
    ));
    // Extra keys in the source are disallowed.
    assert!(!assignable(
        "Struct[{'a' => Integer}]",
        "Struct[{'a' => Integer, 'b' => String}]"
    ));
    assert!(assignable(
        "Hash[String, Integer]",
        "Struct[{'a' => Integer, 'b' => Integer[0, 1]}]"
    ));
}

#[test]
fn callable_parameters_are_contravariant_shapes() {
    assert!(assignable("Callable", "Callable[Integer, Integer]"));
    assert!(assignable(
        "Callable[Numeric, Numeric]",
        "Callable[Integer, Integer]"
    ));
    assert!(!assignable(
        "Callable[Integer, Integer]",
        "Callable[Integer]"
    ));
}

#[test]
fn data_accepts_its_recursive_closure() {
    assert!(assignable("Data", "Scalar"));
    assert!(assignable("Data", "Array[Data]"));
    assert!(assignable("Data", "Hash[String, Data]"));
    assert!(assignable("Data", "Tuple[Integer, String]"));
    assert!(!assignable("Data", "Hash[Integer, Integer]"));
    assert!(!assignable("Data", "Any"));
}

#[test]
fn subtype_relation_is_transitive_over_a_type_pool() {
    let pool: Vec<Type> = [
        "Any",
        "Scalar",
        "Data",
        "Numeric",
        "Integer",
        "Integer[0, 10]",
        "Integer[2, 8]",
        "Float",
        "String",
        "String[1, 3]",
        "Enum['a', 'b']",
        "Enum['a']",
        "Pattern[/a/]",
        "Boolean",
        "Undef",
        "Optional[String]",
        "NotUndef",
        "Collection",
        "Array[Integer]",
        "Array[Integer[0, 10], 2, 4]",
        "Tuple[Integer, String]",
        "Hash[String, Integer]",
        "Struct[{'a' => Integer}]",
        "Variant[Integer, String]",
        "Iterable",
        "Type",
        "Type[Integer]",
        "CatalogEntry",
        "Class['app']",
        "Regexp",
    ]
    .iter()
    .map(|s| parse(s).expect("pool type parses"))
    .collect();

    for t in &pool {
        for u in &pool {
            for v in &pool {
                let mut guard = RecursionGuard::new();
                let tu = t.is_assignable(u, &mut guard);
                let mut guard = RecursionGuard::new();
                let uv = u.is_assignable(v, &mut guard);
                if tu && uv {
                    let mut guard = RecursionGuard::new();
                    assert!(
                        t.is_assignable(v, &mut guard),
                        "transitivity violated: {t} from {u} and {u} from {v}, but not {t} from {v}"
                    );
                }
            }
        }
    }
}

// ============================================================================
// Recursive aliases
// ============================================================================

#[test]
fn self_referential_aliases_terminate() {
    // type A = Array[A]; type B = Array[B]
    let a = AliasType::unresolved("A");
    a.resolve_to(Type::array_of(Type::Alias(a.clone())));
    let b = AliasType::unresolved("B");
    b.resolve_to(Type::array_of(Type::Alias(b.clone())));

    let a = Type::Alias(a);
    let b = Type::Alias(b);
    let mut guard = RecursionGuard::new();
    assert!(a.is_assignable(&b, &mut guard));
    let mut guard = RecursionGuard::new();
    assert!(b.is_assignable(&a, &mut guard));

    // [[], [[]]] is an instance of A.
    let value = Value::array([Value::array([]), Value::array([Value::array([])])]);
    let mut guard = RecursionGuard::new();
    assert!(a.is_instance(&value, &mut guard));
    let mut guard = RecursionGuard::new();
    assert!(!a.is_instance(&Value::array([Value::Integer(1)]), &mut guard));
}

#[test]
fn mutually_recursive_aliases_terminate() {
    // type Even = Variant[Integer, Array[Odd]]; type Odd = Array[Even]
    let even = AliasType::unresolved("Even");
    let odd = AliasType::unresolved("Odd");
    even.resolve_to(Type::Variant(vec![
        Type::any_integer(),
        Type::array_of(Type::Alias(odd.clone())),
    ]));
    odd.resolve_to(Type::array_of(Type::Alias(even.clone())));

    let even = Type::Alias(even);
    let odd = Type::Alias(odd);
    let mut guard = RecursionGuard::new();
    assert!(even.is_assignable(&even.clone(), &mut guard));
    let mut guard = RecursionGuard::new();
    assert!(Type::Any.is_assignable(&odd, &mut guard));
}

// ============================================================================
// Generalization and inference
// ============================================================================

#[test]
fn generalize_widens_every_range() {
    let ty = parse("Array[Integer[0, 10], 2, 4]").unwrap();
    let generalized = ty.generalize();
    assert_eq!(generalized, parse("Array[Integer]").unwrap());
    assert_eq!(
        parse("String[2, 4]").unwrap().generalize(),
        parse("String").unwrap()
    );
    assert_eq!(
        parse("Hash[String[1, 2], Integer[0, 1], 1, 2]").unwrap().generalize(),
        parse("Hash[String, Integer]").unwrap()
    );
}

#[test]
fn generalize_is_idempotent() {
    for source in [
        "Integer[3, 7]",
        "Array[Integer[0, 10], 2, 4]",
        "Tuple[Integer[1, 1], String[0, 4]]",
        "Struct[{'a' => Integer[0, 5]}]",
        "Variant[Integer[0, 1], String[2, 3]]",
        "Optional[String[1, 5]]",
    ] {
        let ty = parse(source).unwrap();
        let once = ty.generalize();
        assert_eq!(once.generalize(), once, "generalize not idempotent for {source}");
    }
}

#[test]
fn infer_returns_the_tightest_type() {
    assert_eq!(infer(&Value::Integer(5)), parse("Integer[5, 5]").unwrap());
    assert_eq!(infer(&Value::string("ab")), parse("Enum['ab']").unwrap());
    assert_eq!(infer(&Value::Boolean(true)), Type::Boolean);
    assert_eq!(infer(&Value::Undef), Type::Undef);
    let inferred = infer(&Value::array([Value::Integer(1), Value::string("a")]));
    assert_eq!(
        inferred,
        parse("Tuple[Integer[1, 1], Enum['a']]").unwrap()
    );
}

#[test]
fn instance_and_inference_agree() {
    let values = [
        Value::Integer(5),
        Value::string("abc"),
        Value::Boolean(false),
        Value::Float(1.5),
        Value::Undef,
        Value::array([Value::Integer(1), Value::Integer(2)]),
    ];
    let types = [
        "Any",
        "Integer[0, 10]",
        "String[1, 3]",
        "Enum['abc']",
        "Pattern[/b/]",
        "Scalar",
        "Data",
        "Boolean",
        "Float[1.0, 2.0]",
        "Undef",
        "Optional[Integer]",
        "Array[Integer, 1, 3]",
        "Collection[2, 2]",
        "Iterable",
    ];
    for value in &values {
        let inferred = infer(value);
        for source in &types {
            let ty = parse(source).unwrap();
            let mut guard = RecursionGuard::new();
            let direct = ty.is_instance(value, &mut guard);
            let mut guard = RecursionGuard::new();
            let via_inference = ty.is_assignable(&inferred, &mut guard);
            assert_eq!(
                direct, via_inference,
                "is_instance and infer disagree for value '{value}' against {source}"
            );
        }
    }
}

// ============================================================================
// Parsing and display
// ============================================================================

#[test]
fn parse_round_trips_through_display() {
    for source in [
        "Integer[0, 10]",
        "Array[Integer[0, 10], 2, 4]",
        "Hash[String, Integer]",
        "Variant[Integer, String]",
        "Optional[String]",
        "Enum['a', 'b']",
        "Tuple[Integer, String]",
    ] {
        let ty = parse(source).expect("parses");
        assert_eq!(ty.to_string(), *source);
        let reparsed = parse(&ty.to_string()).expect("display reparses");
        assert_eq!(ty, reparsed);
    }
}

#[test]
fn parse_rejects_malformed_expressions() {
    assert!(parse("Integer[").is_err());
    assert!(parse("Unknown").is_err());
    assert!(parse("Integer[0, 10] trailing").is_err());
    assert!(parse("Boolean[1]").is_err());
    assert!(parse("Pattern[5]").is_err());
}

#[test]
fn unbounded_is_the_default_upper_bound() {
    match parse("Array[Integer, 2]").unwrap() {
        Type::Array { from, to, .. } => {
            assert_eq!(from, 2);
            assert_eq!(to, UNBOUNDED);
        }
        other => panic!("expected an array type, got {other}"),
    }
}
