// tests/parser_tests.rs

use jsonata_fmt::ast::{BinOp, Expr, ExprKind, Literal, Step};
use jsonata_fmt::lexer::{Lexer, Position};
use jsonata_fmt::parser::{MAX_NESTING, ParseErrorKind, Parser, parse_expression, parse_with_comments};

fn parse(source: &str) -> Expr {
    parse_expression(source).unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
}

fn error_kind(source: &str) -> ParseErrorKind {
    parse_expression(source).unwrap_err().kind
}

fn steps(expr: &Expr) -> &[Step] {
    match &expr.kind {
        ExprKind::Path { steps, .. } => steps,
        other => panic!("expected path, got {:?}", other),
    }
}

fn step_name(step: &Step) -> &str {
    match &step.expr.kind {
        ExprKind::Name(name) => name,
        other => panic!("expected name step, got {:?}", other),
    }
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_arithmetic_precedence() {
    // Should be: Add(1, Multiply(2, 3))
    match parse("1 + 2 * 3").kind {
        ExprKind::Binary {
            op: BinOp::Add,
            lhs,
            rhs,
        } => {
            assert!(matches!(lhs.kind, ExprKind::Number { value, .. } if value == 1.0));
            assert!(matches!(rhs.kind, ExprKind::Binary { op: BinOp::Multiply, .. }));
        }
        other => panic!("expected addition, got {:?}", other),
    }
}

#[test]
fn test_parentheses_are_kept_as_block() {
    match parse("(1 + 2) * 3").kind {
        ExprKind::Binary {
            op: BinOp::Multiply,
            lhs,
            ..
        } => match lhs.kind {
            ExprKind::Block(items) => {
                assert_eq!(items.len(), 1);
                assert!(matches!(items[0].kind, ExprKind::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("expected block, got {:?}", other),
        },
        other => panic!("expected multiplication, got {:?}", other),
    }
}

#[test]
fn test_left_associative_subtraction() {
    match parse("10 - 4 - 3").kind {
        ExprKind::Binary {
            op: BinOp::Subtract,
            lhs,
            rhs,
        } => {
            assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::Subtract, .. }));
            assert!(matches!(rhs.kind, ExprKind::Number { value, .. } if value == 3.0));
        }
        other => panic!("expected subtraction, got {:?}", other),
    }
}

#[test]
fn test_logical_operators_bind_looser_than_comparison() {
    match parse("a > 1 and b < 2 or c").kind {
        ExprKind::Binary {
            op: BinOp::Or, lhs, ..
        } => assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::And, .. })),
        other => panic!("expected or, got {:?}", other),
    }
}

#[test]
fn test_negative_numbers_are_folded() {
    let expr = parse("-5");
    assert_eq!(
        expr.kind,
        ExprKind::Number {
            value: -5.0,
            raw: "-5".to_string()
        }
    );
    assert!(matches!(parse("-price").kind, ExprKind::Negate(_)));
}

#[test]
fn test_bind_is_right_associative() {
    match parse("$a := $b := 1").kind {
        ExprKind::Bind { lhs, rhs } => {
            assert_eq!(lhs.kind, ExprKind::Variable("a".to_string()));
            assert!(matches!(rhs.kind, ExprKind::Bind { .. }));
        }
        other => panic!("expected binding, got {:?}", other),
    }
}

#[test]
fn test_bind_requires_variable() {
    assert_eq!(error_kind("a := 1"), ParseErrorKind::InvalidBind);
}

#[test]
fn test_apply_chain() {
    assert!(matches!(parse("$x ~> $uppercase()").kind, ExprKind::Apply { .. }));
}

#[test]
fn test_range_in_array() {
    match parse("[1..5]").kind {
        ExprKind::Array(items) => {
            assert!(matches!(items[0].kind, ExprKind::Binary { op: BinOp::Range, .. }));
        }
        other => panic!("expected array, got {:?}", other),
    }
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_condition_with_else() {
    match parse("x > 1 ? 'big' : 'small'").kind {
        ExprKind::Condition {
            condition,
            otherwise,
            ..
        } => {
            assert!(matches!(condition.kind, ExprKind::Binary { op: BinOp::GreaterThan, .. }));
            assert!(otherwise.is_some());
        }
        other => panic!("expected condition, got {:?}", other),
    }
}

#[test]
fn test_condition_without_else() {
    assert!(matches!(
        parse("flag ? 1").kind,
        ExprKind::Condition {
            otherwise: None,
            ..
        }
    ));
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_bare_name_is_single_step_path() {
    let expr = parse("Account");
    assert_eq!(steps(&expr).len(), 1);
    assert_eq!(step_name(&steps(&expr)[0]), "Account");
}

#[test]
fn test_path_with_predicate_stage() {
    let expr = parse("Account.Order[0].Product");
    let steps = steps(&expr);
    assert_eq!(
        steps.iter().map(step_name).collect::<Vec<_>>(),
        vec!["Account", "Order", "Product"]
    );
    assert!(steps[0].stages.is_empty());
    assert_eq!(steps[1].stages.len(), 1);
    match &steps[1].stages[0].kind {
        ExprKind::Filter(predicate) => {
            assert!(matches!(predicate.kind, ExprKind::Number { value, .. } if value == 0.0));
        }
        other => panic!("expected filter, got {:?}", other),
    }
}

#[test]
fn test_string_step_becomes_name() {
    let expr = parse("Account.\"Order Total\"");
    assert_eq!(step_name(&steps(&expr)[1]), "Order Total");
}

#[test]
fn test_number_step_is_rejected() {
    assert_eq!(error_kind("a.1"), ParseErrorKind::InvalidStep("a number"));
    assert_eq!(error_kind("a.true"), ParseErrorKind::InvalidStep("a literal value"));
}

#[test]
fn test_keep_array() {
    let expr = parse("a.b[]");
    assert!(steps(&expr)[1].keep_array);
    assert!(!steps(&expr)[0].keep_array);
}

#[test]
fn test_context_marker_step() {
    let expr = parse("$.Account");
    assert!(steps(&expr)[0].is_context_marker());
    assert_eq!(step_name(&steps(&expr)[1]), "Account");
}

#[test]
fn test_predicate_on_constructor_wraps_into_path() {
    let expr = parse("[1, 2, 3][0]");
    let steps = steps(&expr);
    assert_eq!(steps.len(), 1);
    assert!(matches!(steps[0].expr.kind, ExprKind::Array(_)));
    assert_eq!(steps[0].stages.len(), 1);
}

#[test]
fn test_wildcards_and_parent() {
    let expr = parse("**.Product.*.%");
    let kinds: Vec<&ExprKind> = steps(&expr).iter().map(|s| &s.expr.kind).collect();
    assert!(matches!(kinds[0], ExprKind::Descendant));
    assert!(matches!(kinds[2], ExprKind::Wildcard));
    assert!(matches!(kinds[3], ExprKind::Parent));
}

#[test]
fn test_group_by() {
    match parse("Order{Product: Price}").kind {
        ExprKind::Path {
            steps,
            group: Some(pairs),
        } => {
            assert_eq!(steps.len(), 1);
            assert_eq!(pairs.len(), 1);
        }
        other => panic!("expected grouped path, got {:?}", other),
    }
}

#[test]
fn test_group_must_be_last() {
    assert_eq!(error_kind("a{'k': 1}.b"), ParseErrorKind::GroupNotLast);
    assert_eq!(error_kind("a{'k': 1}[0]"), ParseErrorKind::GroupNotLast);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_function_call_arguments() {
    match parse("$substring(Name, 0, 3)").kind {
        ExprKind::Function {
            procedure,
            arguments,
        } => {
            assert_eq!(procedure.kind, ExprKind::Variable("substring".to_string()));
            assert_eq!(arguments.len(), 3);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_lambda_parameters() {
    match parse("function($a, $b) { $a + $b }").kind {
        ExprKind::Lambda {
            keyword,
            params,
            body,
            thunk,
        } => {
            assert_eq!(keyword, "function");
            assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
            assert!(!thunk);
            assert!(matches!(body.kind, ExprKind::Binary { op: BinOp::Add, .. }));
        }
        other => panic!("expected lambda, got {:?}", other),
    }
}

#[test]
fn test_tail_call_becomes_thunk() {
    let ExprKind::Lambda { body, .. } = parse("λ($n) { $n > 0 ? $loop($n - 1) : 0 }").kind else {
        panic!("expected lambda");
    };
    let ExprKind::Condition {
        then, otherwise, ..
    } = body.kind
    else {
        panic!("expected condition body");
    };
    match then.kind {
        ExprKind::Lambda {
            params,
            body,
            thunk: true,
            ..
        } => {
            assert!(params.is_empty());
            assert!(matches!(body.kind, ExprKind::Function { .. }));
        }
        other => panic!("expected thunk, got {:?}", other),
    }
    // A literal is not a call
    assert!(matches!(
        otherwise.as_deref().map(|e| &e.kind),
        Some(ExprKind::Number { .. })
    ));
}

#[test]
fn test_lambda_keyword_is_kept() {
    assert!(matches!(
        parse("λ($x) { $x }").kind,
        ExprKind::Lambda { keyword: "λ", .. }
    ));
}

#[test]
fn test_tail_call_in_block_body() {
    let ExprKind::Lambda { body, .. } = parse("function($x) { ($y := $x; $f($y)) }").kind else {
        panic!("expected lambda");
    };
    match body.kind {
        ExprKind::Block(items) => {
            assert!(matches!(items[0].kind, ExprKind::Bind { .. }));
            assert!(matches!(items[1].kind, ExprKind::Lambda { thunk: true, .. }));
        }
        other => panic!("expected block, got {:?}", other),
    }
}

#[test]
fn test_calls_outside_lambdas_are_not_thunked() {
    assert!(matches!(parse("$f(1)").kind, ExprKind::Function { .. }));
}

// ============================================================================
// Constructs carried as dumps
// ============================================================================

#[test]
fn test_sort_is_carried_as_other() {
    let expr = parse("Order^(>Price, Name)");
    let dump = expr.to_json();
    assert_eq!(dump["type"], "sort");
    assert_eq!(dump["terms"][0]["descending"], true);
    assert_eq!(dump["terms"][1]["descending"], false);
}

#[test]
fn test_transform_is_carried_as_other() {
    let expr = parse("| Account | {'status': 'closed'}, ['temp'] |");
    match &expr.kind {
        ExprKind::Other { kind, fields } => {
            assert_eq!(kind, "transform");
            assert!(fields.contains_key("pattern"));
            assert!(fields.contains_key("update"));
            assert!(fields.contains_key("delete"));
        }
        other => panic!("expected transform, got {:?}", other),
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_literal_values() {
    assert_eq!(parse("true").kind, ExprKind::Value(Literal::True));
    assert_eq!(parse("null").kind, ExprKind::Value(Literal::Null));
    assert!(matches!(parse("/^ab+$/i").kind, ExprKind::Regex { .. }));
}

#[test]
fn test_trailing_semicolon_in_block() {
    match parse("($a := 1; $a;)").kind {
        ExprKind::Block(items) => assert_eq!(items.len(), 2),
        other => panic!("expected block, got {:?}", other),
    }
}

#[test]
fn test_empty_constructors() {
    assert_eq!(parse("[]").kind, ExprKind::Array(vec![]));
    assert_eq!(parse("{}").kind, ExprKind::Object(vec![]));
    assert_eq!(parse("()").kind, ExprKind::Block(vec![]));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_error_position() {
    let err = parse_expression("{\"a\": }").unwrap_err();
    assert_eq!(err.offset, 6);
    assert_eq!(err.position, Position { line: 1, column: 7 });
    assert_eq!(err.to_string(), "ParseError (@1:7): unexpected token RBrace");
}

#[test]
fn test_error_position_on_later_line() {
    let err = parse_expression("(\n  1 +\n)").unwrap_err();
    assert_eq!(err.position, Position { line: 3, column: 1 });
}

#[test]
fn test_trailing_tokens_are_rejected() {
    let err = parse_expression("1 2").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken(_)));
    assert_eq!(err.offset, 2);
}

#[test]
fn test_unsupported_syntax() {
    assert_eq!(
        error_kind("$f(?, 1)"),
        ParseErrorKind::Unsupported("partial application (?)")
    );
    assert_eq!(
        error_kind("function($x)<n:n> { $x }"),
        ParseErrorKind::Unsupported("function signature")
    );
    assert_eq!(
        error_kind("@$x"),
        ParseErrorKind::Unsupported("context binding (@)")
    );
}

#[test]
fn test_parser_from_lexer() {
    let mut parser = Parser::new(Lexer::new("a.b")).unwrap();
    let expr = parser.parse().unwrap();
    assert_eq!(steps(&expr).len(), 2);
}

// ============================================================================
// Nesting
// ============================================================================

#[test]
#[ntest::timeout(10000)]
fn test_deep_parentheses_are_rejected() {
    let depth = 100_000;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(error_kind(&source), ParseErrorKind::TooDeep(MAX_NESTING));
}

#[test]
#[ntest::timeout(10000)]
fn test_deep_negation_is_rejected() {
    let source = format!("{}x", "-".repeat(100_000));
    assert_eq!(error_kind(&source), ParseErrorKind::TooDeep(MAX_NESTING));
}

#[test]
fn test_long_operator_chain_is_rejected() {
    // Each `+` nests the sum so far one level deeper
    let source = format!("1{}", " + 1".repeat(MAX_NESTING * 2));
    assert_eq!(error_kind(&source), ParseErrorKind::TooDeep(MAX_NESTING));
}

#[test]
fn test_nesting_below_limit_parses() {
    let depth = MAX_NESTING / 2;
    let source = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    assert!(parse_expression(&source).is_ok());
}

#[test]
fn test_long_paths_do_not_count_as_nesting() {
    let source = format!("a{}", ".b[0]".repeat(MAX_NESTING * 2));
    assert_eq!(steps(&parse(&source)).len(), MAX_NESTING * 2 + 1);
}

// ============================================================================
// Comment spans
// ============================================================================

#[test]
fn test_comment_spans_skip_literals() {
    let source = "{'glob': 'src/*.rs' /* real */, `a/*b*/`: /x\\/*y/}";
    let (result, spans) = parse_with_comments(source);
    assert!(result.is_ok());
    let texts: Vec<String> = spans
        .iter()
        .map(|span| source.chars().skip(span.start).take(span.len()).collect())
        .collect();
    assert_eq!(texts, vec!["/* real */".to_string()]);
}

#[test]
fn test_comment_spans_before_parse_error() {
    let (result, spans) = parse_with_comments("/* a */ [1, /* b */ ");
    assert!(result.is_err());
    assert_eq!(spans.len(), 2);
}
