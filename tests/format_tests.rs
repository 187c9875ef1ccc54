// tests/format_tests.rs

use jsonata_fmt::equality::json_structurally_equal;
use jsonata_fmt::{
    CommentPreservingFormatter, FormatError, FormatOptions, format_document, format_document_with,
    parse_expression, structurally_equal, try_format,
};
use serde_json::json;

const SAMPLES: &[&str] = &[
    "{\"a\":1,\"b\":[1,2,3]}",
    "Account.Order[0].Product.\"Product Name\"",
    "$sum(Account.Order.Product.(Price * Quantity))",
    "($f := function($a, $b) { $a + $b }; $f(1, 2))",
    "function($n){$n>0?$loop($n-1):0}",
    "x > 1 ? 'big' : x < -1 ? 'small' : 'zero'",
    "Order{Product: $sum(Price)}",
    "$.Account[Balance >= 100 and Status != 'closed'][]",
    "**.Price ~> $sum() & ' total'",
    "[1..5, [], {}, ()]",
    "-price * %.rate",
    "$match(Name, /^[A-Z]+$/i)",
];

// String steps print as back-quoted names
const REWRITES_TOKENS: &[&str] = &["Account.Order[0].Product.\"Product Name\""];

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn verified() -> FormatOptions {
    FormatOptions {
        verify: true,
        ..FormatOptions::default()
    }
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_idempotent() {
    for source in SAMPLES {
        let once = format_document(source);
        let twice = format_document(&once);
        assert_eq!(once, twice, "not idempotent for {:?}", source);
    }
}

#[test]
fn test_round_trip_preserves_tree() {
    for source in SAMPLES {
        let original = parse_expression(source).unwrap();
        let formatted = format_document(source);
        let reparsed = parse_expression(&formatted)
            .unwrap_or_else(|e| panic!("{:?} printed unparseable text: {}", source, e));
        assert!(
            structurally_equal(&original, &reparsed, "position"),
            "tree changed for {:?}:\n{}",
            source,
            formatted
        );
    }
}

#[test]
fn test_whitespace_does_not_matter() {
    assert_eq!(
        format_document("{\"a\":1,\"b\":[1,2]}"),
        format_document("{ \"a\" : 1 ,\n\n   \"b\" : [ 1 , 2 ] }")
    );
}

#[test]
fn test_only_whitespace_changes() {
    let commented = ["{\"a\": 1 /* tag */, \"b\": 2}", "( /* first */\n$a:=1; $a )"];
    for source in SAMPLES
        .iter()
        .filter(|source| !REWRITES_TOKENS.contains(*source))
        .chain(commented.iter())
    {
        assert_eq!(
            without_whitespace(&format_document(source)),
            without_whitespace(source),
            "tokens changed for {:?}",
            source
        );
    }
}

#[test]
fn test_verify_accepts_samples() {
    for source in SAMPLES {
        assert!(try_format(source, &verified()).is_ok(), "{:?}", source);
    }
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comment_survives_on_own_line() {
    let formatted = format_document("{ /* note */ \"a\": 1 }");
    assert_eq!(formatted, "{\n  /* note */\n  \"a\": 1\n}");

    let lines: Vec<&str> = formatted.lines().collect();
    let at = lines.iter().position(|l| l.trim() == "\"a\": 1").unwrap();
    assert_eq!(lines[at - 1].trim(), "/* note */");
}

#[test]
fn test_inline_comment_spacing() {
    assert_eq!(
        format_document("{\"a\": 1 /* tag */, \"b\": 2}"),
        "{\n  \"a\": 1 /* tag */,\n  \"b\": 2\n}"
    );
}

#[test]
fn test_standalone_comment_in_block() {
    let source = "(\n  /* first */\n  $a := 1;\n  $a\n)";
    assert_eq!(format_document("( /* first */\n$a:=1; $a )"), source);
    assert_eq!(format_document(source), source);
}

#[test]
fn test_header_and_trailing_comments() {
    assert_eq!(format_document("/* header */\n$x"), "/* header */\n$x");
    assert_eq!(format_document("$x   /* end */"), "$x /* end */");
}

#[test]
fn test_comment_after_comment() {
    let source = "{\n  \"a\": 1, /* x */\n  /* y */\n  \"b\": 2\n}";
    assert_eq!(format_document("{\"a\": 1, /* x */\n/* y */\n\"b\": 2}"), source);
    assert_eq!(format_document(source), source);
}

#[test]
fn test_comment_with_vanished_anchor_is_dropped() {
    // The quotes around "b" are not printed, so the second comment has no anchor
    assert_eq!(
        format_document("/* keep */ a.\"b\" /* gone */"),
        "/* keep */ a.b"
    );
}

#[test]
fn test_comment_markers_inside_literals_are_not_comments() {
    let source = "\"a /* not a comment */ b\"";
    let formatted = format_document(source);
    assert_eq!(formatted, source);
    assert!(structurally_equal(
        &parse_expression(source).unwrap(),
        &parse_expression(&formatted).unwrap(),
        "position"
    ));

    assert_eq!(
        format_document("{\"glob\": \"src/*.rs\", \"other\": \"*/x\"}"),
        "{\n  \"glob\": \"src/*.rs\",\n  \"other\": \"*/x\"\n}"
    );
    assert_eq!(format_document("`a /* b */ c`.d"), "`a /* b */ c`.d");
    assert_eq!(format_document("$match(s, /x\\/*y/)"), "$match(s, /x\\/*y/)");
}

#[test]
fn test_real_comment_next_to_marker_in_string() {
    assert_eq!(
        format_document("{\"glob\": \"src/*.rs\" /* real */}"),
        "{\n  \"glob\": \"src/*.rs\" /* real */\n}"
    );
}

#[test]
fn test_lambda_keyword_keeps_later_anchors() {
    // Printing `function` for `λ` would move the anchor onto its `n`
    assert_eq!(
        format_document("λ($x){$x} ~> fun /* c */"),
        "λ($x) {\n  $x\n} ~> fun /* c */"
    );
}

#[test]
fn test_trailing_semicolon_is_dropped() {
    assert_eq!(format_document("($a := 1; $a;)"), "(\n  $a := 1;\n  $a\n)");
}

#[test]
fn test_formatter_exposes_comments() {
    let formatter = CommentPreservingFormatter::new("[1, /* a */ 2] /* b */");
    assert_eq!(formatter.comments().len(), 2);
    assert_eq!(formatter.format(), "[\n  1, /* a */\n  2\n] /* b */");
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_parse_failure_returns_original() {
    for source in ["{\"a\": }", "1 /* open", "a := 1", "$f(?)"] {
        assert_eq!(format_document(source), source);
    }
}

#[test]
fn test_parse_failure_is_reported_by_try_format() {
    match try_format("[1, 2", &FormatOptions::default()) {
        Err(FormatError::Parse(e)) => assert_eq!(e.offset, 5),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_printer_failure_returns_original() {
    assert_eq!(format_document("flag ? 1"), "flag ? 1");
    assert!(matches!(
        try_format("flag ? 1", &FormatOptions::default()),
        Err(FormatError::MissingField { node: "condition", field: "else" })
    ));
}

#[test]
fn test_verify_rejects_dumped_constructs() {
    let source = "Order^(>Price)";
    assert!(matches!(
        try_format(source, &verified()),
        Err(FormatError::Unstable)
    ));
    assert_eq!(format_document_with(source, &verified()), source);
    // Without verification the dump is printed
    assert!(format_document(source).contains("\"type\": \"sort\""));
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_indent_option() {
    let options = FormatOptions {
        indent: 4,
        verify: false,
    };
    assert_eq!(
        format_document_with("{ /* n */ 'a': [1,2] }", &options),
        "{\n    /* n */\n    'a': [\n        1,\n        2\n    ]\n}"
    );
}

// ============================================================================
// Structural equality
// ============================================================================

#[test]
fn test_structural_equality_ignores_named_field() {
    let a = parse_expression("a+b").unwrap();
    let b = parse_expression("a   +   b").unwrap();
    assert!(structurally_equal(&a, &b, "position"));
    assert!(!structurally_equal(&a, &b, ""));
    assert!(!structurally_equal(&a, &parse_expression("a-b").unwrap(), "position"));
}

#[test]
fn test_json_structural_equality() {
    let left = json!({"type": "name", "value": "a", "position": 1, "extra": [1, 2]});
    let right = json!({"type": "name", "value": "a", "position": 7, "extra": [1, 2]});
    assert!(json_structurally_equal(&left, &right, "position"));
    assert!(!json_structurally_equal(&left, &json!({"type": "name"}), "position"));
    assert!(!json_structurally_equal(&json!([1, 2]), &json!([1, 2, 3]), "position"));
}

// ============================================================================
// Scale
// ============================================================================

#[test]
#[ntest::timeout(10000)]
fn test_many_comments() {
    let mut source = String::from("[");
    let mut expected = String::from("[\n");
    for i in 0..499 {
        source.push_str(&format!("{}, /* c{} */ ", i, i));
        expected.push_str(&format!("  {}, /* c{} */\n", i, i));
    }
    source.push_str("499]");
    expected.push_str("  499\n]");

    assert_eq!(format_document(&source), expected);
}

#[test]
#[ntest::timeout(10000)]
fn test_nesting_beyond_limit_returns_original() {
    let depth = 100_000;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(format_document(&source), source);
    assert!(matches!(
        try_format(&source, &FormatOptions::default()),
        Err(FormatError::Parse(_))
    ));

    let chain = format!("1{}", " & 'x'".repeat(1000));
    assert_eq!(format_document(&chain), chain);
}

#[test]
#[ntest::timeout(10000)]
fn test_deep_nesting() {
    let source = format!("{}1{}", "[".repeat(100), "]".repeat(100));
    assert_eq!(format_document(&source), source);
}
