//! Template substitution integration tests

use proptest::prelude::*;
use rstest::rstest;
use taql_subst::{
    evaluate_expression, serialize_value, substitute, EvalError, GrammarConfig, HostObject,
    ObjectRef, ObjectRule, ParseError, RuleError, Scope, Substituter, Value, MAX_NESTING,
    MAX_SEQUENCE_LEN,
};

#[derive(Debug)]
struct Table {
    name: String,
}

impl Table {
    fn open(name: &str) -> ObjectRef {
        ObjectRef::new(Table {
            name: name.to_string(),
        })
    }
}

impl HostObject for Table {
    fn kind(&self) -> &str {
        "table"
    }

    fn describe(&self) -> String {
        format!("Table({})", self.name)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scope() -> Scope {
    Scope::new()
        .with("a", 2)
        .with("b", 3)
        .with("c", "xyz")
        .with("d1", true)
        .with("s1", vec![1, 2, 3])
        .with("s2", vec!["ab", "cde", "f", "ghij"])
}

// === Named placeholders ===

#[rstest]
#[case("$a $b $c $d1", "2 3 \"xyz\" T")]
#[case("$b $0 $a \"$a\" $b", "3 $0 2 \"$a\" 3")]
#[case(" $s1  $s2 ", " [1,2,3]  [\"ab\",\"cde\",\"f\",\"ghij\"] ")]
#[case("$zzz", "$zzz")]
#[case("select from t where COL > $a", "select from t where COL > 2")]
fn test_named_placeholders(#[case] template: &str, #[case] expected: &str) {
    init_tracing();
    assert_eq!(substitute(template, &mut [], &scope()), expected);
}

// === Expression fragments ===

#[rstest]
#[case("$(a) $(b) $(c) $(d1)", "2 3 \"xyz\" T")]
#[case("$(a+b)", "5")]
#[case("$((a+b)*(a+b))", "25")]
#[case("$((a+b)*(a+c))", "$((a+b)*(a+c))")]
#[case("\"$(a+b)\"", "\"$(a+b)\"")]
#[case("$(a+b)+$a", "5+2")]
#[case("$((a+b)+a)", "7")]
#[case("$(len(\"ab cd( de\"))", "9")]
#[case("abc$(1+2", "abc$(1+2")]
#[case("$(s1[0] < b and c == 'xyz')", "T")]
#[case("x=$('ab' * 9223372036854775807)", "x=$('ab' * 9223372036854775807)")]
#[case("x=$([1] * 9223372036854775807)", "x=$([1] * 9223372036854775807)")]
#[case("$(range(10**18))", "$(range(10**18))")]
#[case("$(len(range(3)) * 'ab')", "\"ababab\"")]
fn test_fragments(#[case] template: &str, #[case] expected: &str) {
    init_tracing();
    assert_eq!(substitute(template, &mut [], &scope()), expected);
}

// Fragments too deeply nested to evaluate are echoed like any failure
#[rstest]
#[case(format!("$({}a{})", "(".repeat(500), ")".repeat(500)))]
#[case(format!("$({}1)", "-".repeat(200_000)))]
#[case(format!("$({}a)", "not ".repeat(1_000)))]
#[case(format!("$(s1{})", "[0]".repeat(1_000)))]
fn test_deeply_nested_fragments_are_echoed(#[case] template: String) {
    init_tracing();
    assert_eq!(substitute(&template, &mut [], &scope()), template);
}

#[test]
fn test_long_flat_fragment_is_evaluated() {
    let template = format!("$({}a)", "a + ".repeat(50_000));
    assert_eq!(substitute(&template, &mut [], &scope()), "100002");
}

// === Quoting ===

#[rstest]
#[case("\"abc $a", "\"abc $a")]
#[case("it's $a", "it's $a")]
#[case("$a \"$(a+b)", "2 \"$(a+b)")]
fn test_unterminated_quote_runs_to_end(#[case] template: &str, #[case] expected: &str) {
    assert_eq!(substitute(template, &mut [], &scope()), expected);
}

#[test]
fn test_backslash_escapes() {
    assert_eq!(
        substitute("\\$(a+b) \\\\$a \\$a", &mut [], &scope()),
        "\\$(a+b) \\\\2 \\$a"
    );
}

// === Serialization through templates ===

#[test]
fn test_string_with_double_quote() {
    let scope = Scope::new().with("s", "ab\"cd");
    assert_eq!(substitute("$s", &mut [], &scope), "\"ab\"'\"'\"cd\"");
}

#[rstest]
#[case(true, "T")]
#[case(false, "F")]
fn test_booleans(#[case] b: bool, #[case] expected: &str) {
    let scope = Scope::new().with("b", b);
    assert_eq!(substitute("$b", &mut [], &scope), expected);
}

#[test]
fn test_vector() {
    let scope = Scope::new().with("v", vec![1, 2, 3]);
    assert_eq!(substitute("$v", &mut [], &scope), "[1,2,3]");
}

#[test]
fn test_tuple_fragment_becomes_vector() {
    assert_eq!(substitute("$((a, b))", &mut [], &scope()), "[2,3]");
}

// === Scope tiers ===

#[test]
fn test_caller_frames_are_searched_innermost_first() {
    let mut scope = Scope::new().with_global("limit", 100);
    scope.push_frame([("a".to_string(), Value::Int(1))].into_iter().collect());
    scope.push_frame([("a".to_string(), Value::Int(7))].into_iter().collect());

    assert_eq!(substitute("$a < $limit", &mut [], &scope), "7 < 100");
    scope.pop_frame();
    assert_eq!(substitute("$a < $limit", &mut [], &scope), "1 < 100");
}

#[test]
fn test_json_scope() {
    let scope = Scope::from_json(r#"{"x": 1.5, "names": ["a", "b"], "flag": false}"#).unwrap();
    assert_eq!(
        substitute("$x $names $flag", &mut [], &scope),
        "1.5 [\"a\",\"b\"] F"
    );
}

// === Object rules ===

#[test]
fn test_objects_get_sequential_placeholders() {
    let o1 = Table::open("a.ms");
    let o2 = Table::open("b.ms");
    let scope = Scope::new().with("o1", o1.clone()).with("o2", o2.clone());
    let mut rules = vec![ObjectRule::new("table", "t").unwrap()];

    let out = substitute("$o1 join $o2", &mut rules, &scope);

    assert_eq!(out, "$t1 join $t2");
    assert_eq!(rules[0].objects(), &[o1, o2]);
}

#[test]
fn test_same_object_twice_appends_twice() {
    let t = Table::open("a.ms");
    let scope = Scope::new().with("t", t.clone());
    let mut rules = vec![ObjectRule::new("table", "").unwrap()];

    assert_eq!(substitute("$t, $t", &mut rules, &scope), "$1, $2");
    assert_eq!(rules[0].len(), 2);
    assert!(rules[0].objects().iter().all(|o| o.ptr_eq(&t)));
}

#[test]
fn test_malformed_rule_is_rejected_up_front() {
    assert_eq!(ObjectRule::new("", ""), Err(RuleError::EmptyKind));
    assert!(ObjectRule::new("table", "$").is_err());
}

// === Direct evaluation ===

#[test]
fn test_evaluate_expression_surfaces_errors() {
    assert_eq!(evaluate_expression("a*b", &scope()).unwrap(), Value::Int(6));
    assert!(matches!(
        evaluate_expression("a +* b", &scope()),
        Err(EvalError::Parse(_))
    ));
    assert_eq!(
        evaluate_expression("zzz + 1", &scope()),
        Err(EvalError::UnknownName("zzz".to_string()))
    );
    assert_eq!(
        evaluate_expression("[1] * 9223372036854775807", &scope()),
        Err(EvalError::TooLarge(MAX_SEQUENCE_LEN))
    );
    assert_eq!(
        evaluate_expression(&format!("{}1", "-".repeat(200_000)), &scope()),
        Err(EvalError::Parse(ParseError::TooDeep(MAX_NESTING)))
    );
}

#[test]
fn test_grammar_from_toml() {
    let grammar = GrammarConfig::from_toml(
        r#"
true_token = "TRUE"
false_token = "FALSE"
list_separator = ", "
"#,
    )
    .unwrap();
    let scope = scope();
    let out = Substituter::new(&scope)
        .with_grammar(grammar)
        .substitute("$d1 $s1", &mut []);
    assert_eq!(out, "TRUE [1, 2, 3]");
}

// === Properties ===

proptest! {
    #[test]
    fn test_dollar_free_text_is_unchanged(text in "[^$]{0,60}") {
        prop_assert_eq!(substitute(&text, &mut [], &scope()), text);
    }

    #[test]
    fn test_quoted_placeholders_are_untouched(name in "[a-z_][a-z0-9_]{0,8}") {
        let template = format!("\"${}\"", name);
        prop_assert_eq!(substitute(&template, &mut [], &scope()), template.clone());

        let template = format!("'$({})'", name);
        prop_assert_eq!(substitute(&template, &mut [], &scope()), template.clone());
    }

    #[test]
    fn test_escaped_dollar_is_untouched(name in "[a-z_][a-z0-9_]{0,8}") {
        let template = format!("\\${}", name);
        prop_assert_eq!(substitute(&template, &mut [], &scope()), template.clone());
    }

    #[test]
    fn test_bound_integer_serializes_like_serializer(n in any::<i64>()) {
        let scope = Scope::new().with("n", n);
        let expected = serialize_value(&Value::Int(n), &GrammarConfig::default());
        prop_assert_eq!(substitute("$n", &mut [], &scope), expected.clone());
        prop_assert_eq!(substitute("$(n)", &mut [], &scope), expected);
    }

    #[test]
    fn test_output_without_dollar_is_a_fixed_point(x in -1000i64..1000, y in -1000i64..1000) {
        let scope = Scope::new().with("x", x).with("y", y);
        let once = substitute("x=$x y=$(x*y)", &mut [], &scope);
        prop_assume!(!once.contains('$'));
        prop_assert_eq!(substitute(&once, &mut [], &scope), once.clone());
    }
}
