use crate::ast::{BinOp, Literal};
use serde_json::{Map, Value, json};

/// A parsed expression together with the character offset it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: usize,
}

/// Abstract Syntax Tree node representing one parsed construct.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // Constructors
    /// Object constructor
    ///
    /// # Example
    /// ```text
    /// {"name": Name, "total": $sum(Price)}
    /// ```
    Object(Vec<(Expr, Expr)>),

    /// Array constructor
    ///
    /// # Example
    /// ```text
    /// [1, 2, 3]
    /// ```
    Array(Vec<Expr>),

    /// Parenthesised block; also produced for a single parenthesised expression
    ///
    /// # Example
    /// ```text
    /// ($x := 1; $x + 1)
    /// ```
    Block(Vec<Expr>),

    // Literals
    /// String literal; `raw` is the lexeme as written, quotes included
    String { value: String, raw: String },

    /// Number literal; a negation applied to a number literal is folded in
    Number { value: f64, raw: String },

    /// Regex literal
    ///
    /// # Example
    /// ```text
    /// /^a.*z$/i
    /// ```
    Regex { pattern: String, flags: String },

    /// `true`, `false` or `null`
    Value(Literal),

    // References
    /// Variable reference (`$name`); the empty name is the context `$`
    Variable(String),

    /// Field name, only ever found as a path step
    Name(String),

    /// `*`
    Wildcard,

    /// `**`
    Descendant,

    /// `%`
    Parent,

    // Operations
    /// Unary negation of a non-literal operand
    Negate(Box<Expr>),

    /// Binary operation (arithmetic, comparison, logical, range)
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Function chaining (`~>`)
    Apply { lhs: Box<Expr>, rhs: Box<Expr> },

    /// Variable binding (`:=`)
    Bind { lhs: Box<Expr>, rhs: Box<Expr> },

    /// Conditional (`? :`); the else branch may be missing in source
    Condition {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },

    /// Navigation path
    ///
    /// # Example
    /// ```text
    /// $.Account.Order[0].Product{ `Product Name`: Price }
    /// ```
    Path {
        steps: Vec<Step>,
        group: Option<Vec<(Expr, Expr)>>,
    },

    /// Function definition
    ///
    /// A `thunk` wraps a tail call inside a lambda body; it has no syntax of
    /// its own and prints as its body.
    Lambda {
        /// `function` or `λ`, as written
        keyword: &'static str,
        params: Vec<String>,
        body: Box<Expr>,
        thunk: bool,
    },

    /// Function invocation
    Function {
        procedure: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// Predicate attached to a path step (`[expr]`)
    Filter(Box<Expr>),

    /// Construct without a layout rule; `fields` is its structured dump
    Other {
        kind: String,
        fields: Map<String, Value>,
    },
}

/// One step of a path with the stages attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub expr: Expr,
    /// `Filter` expressions applied to this step, in source order
    pub stages: Vec<Expr>,
    /// Set by a trailing `[]`
    pub keep_array: bool,
}

impl Step {
    pub fn new(expr: Expr) -> Self {
        Step {
            expr,
            stages: Vec::new(),
            keep_array: false,
        }
    }

    /// The leading `$` of `$.field`, which refers to the context value.
    pub fn is_context_marker(&self) -> bool {
        matches!(&self.expr.kind, ExprKind::Variable(name) if name.is_empty())
    }

    fn to_json(&self) -> Value {
        let mut node = self.expr.to_json();
        if let Value::Object(fields) = &mut node {
            if !self.stages.is_empty() {
                fields.insert("stages".into(), dump_all(&self.stages));
            }
            if self.keep_array {
                fields.insert("keepArray".into(), Value::Bool(true));
            }
        }
        node
    }
}

impl Expr {
    pub fn new(kind: ExprKind, position: usize) -> Self {
        Expr { kind, position }
    }

    /// Structured dump of the node and its children.
    ///
    /// Every node is an object with a `type` and a `position` field, in the
    /// shape the JSONata reference implementation uses for its own tree.
    pub fn to_json(&self) -> Value {
        let (kind, fields) = match &self.kind {
            ExprKind::Object(pairs) => ("unary", json!({ "value": "{", "lhs": dump_pairs(pairs) })),
            ExprKind::Array(items) => ("unary", json!({ "value": "[", "expressions": dump_all(items) })),
            ExprKind::Block(items) => ("block", json!({ "expressions": dump_all(items) })),
            ExprKind::String { value, .. } => ("string", json!({ "value": value })),
            ExprKind::Number { value, .. } => ("number", json!({ "value": number(*value) })),
            ExprKind::Regex { pattern, flags } => {
                ("regex", json!({ "value": { "pattern": pattern, "flags": flags } }))
            }
            ExprKind::Value(literal) => {
                let value = match literal {
                    Literal::True => Value::Bool(true),
                    Literal::False => Value::Bool(false),
                    Literal::Null => Value::Null,
                };
                ("value", json!({ "value": value }))
            }
            ExprKind::Variable(name) => ("variable", json!({ "value": name })),
            ExprKind::Name(name) => ("name", json!({ "value": name })),
            ExprKind::Wildcard => ("wildcard", json!({ "value": "*" })),
            ExprKind::Descendant => ("descendant", json!({ "value": "**" })),
            ExprKind::Parent => ("parent", json!({})),
            ExprKind::Negate(operand) => {
                ("unary", json!({ "value": "-", "expression": operand.to_json() }))
            }
            ExprKind::Binary { op, lhs, rhs } => (
                "binary",
                json!({ "value": op.symbol(), "lhs": lhs.to_json(), "rhs": rhs.to_json() }),
            ),
            ExprKind::Apply { lhs, rhs } => (
                "apply",
                json!({ "value": "~>", "lhs": lhs.to_json(), "rhs": rhs.to_json() }),
            ),
            ExprKind::Bind { lhs, rhs } => (
                "bind",
                json!({ "value": ":=", "lhs": lhs.to_json(), "rhs": rhs.to_json() }),
            ),
            ExprKind::Condition {
                condition,
                then,
                otherwise,
            } => {
                let mut node = json!({ "condition": condition.to_json(), "then": then.to_json() });
                if let (Some(otherwise), Value::Object(fields)) = (otherwise, &mut node) {
                    fields.insert("else".into(), otherwise.to_json());
                }
                ("condition", node)
            }
            ExprKind::Path { steps, group } => {
                let steps: Vec<Value> = steps.iter().map(Step::to_json).collect();
                let mut node = json!({ "steps": steps });
                if let (Some(group), Value::Object(fields)) = (group, &mut node) {
                    fields.insert("group".into(), json!({ "lhs": dump_pairs(group) }));
                }
                ("path", node)
            }
            ExprKind::Lambda {
                params,
                body,
                thunk,
                ..
            } => {
                let arguments: Vec<Value> = params
                    .iter()
                    .map(|name| json!({ "type": "variable", "value": name }))
                    .collect();
                (
                    "lambda",
                    json!({ "arguments": arguments, "body": body.to_json(), "thunk": thunk }),
                )
            }
            ExprKind::Function {
                procedure,
                arguments,
            } => (
                "function",
                json!({ "value": "(", "procedure": procedure.to_json(), "arguments": dump_all(arguments) }),
            ),
            ExprKind::Filter(predicate) => ("filter", json!({ "expr": predicate.to_json() })),
            ExprKind::Other { kind, fields } => (kind.as_str(), Value::Object(fields.clone())),
        };

        let mut node = Map::new();
        node.insert("type".into(), Value::String(kind.to_string()));
        if let Value::Object(fields) = fields {
            node.extend(fields);
        }
        node.insert("position".into(), json!(self.position));
        Value::Object(node)
    }
}

fn dump_all(items: &[Expr]) -> Value {
    Value::Array(items.iter().map(Expr::to_json).collect())
}

fn dump_pairs(pairs: &[(Expr, Expr)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(key, value)| Value::Array(vec![key.to_json(), value.to_json()]))
            .collect(),
    )
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
