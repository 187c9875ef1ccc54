//! Canonical source printing for JSONata expression trees.
//!
//! The printer walks an [`Expr`] and writes it back out with a fixed layout.
//! There is no line-width based wrapping: every compound construct expands
//! onto multiple lines, except arrays and blocks holding a single element.
//!
//! # Layout
//!
//! - **Objects** put each `key: value` pair on its own line
//! - **Arrays / blocks** with one element stay inline (`[x]`, `(x)`), others
//!   put each element on its own line, separated by `,` / `;`
//! - **Conditionals** put `? then` and `: else` on indented lines
//! - **Lambdas** put their body on an indented line between `{` and `}`
//! - **Operators** are surrounded by single spaces
//!
//! # Examples
//!
//! ```
//! use jsonata_fmt::parser::parse_expression;
//! use jsonata_fmt::printer::Printer;
//!
//! let expr = parse_expression("{'a':1,'b':[1,2]}").unwrap();
//! let text = Printer::new(2).print(&expr).unwrap();
//! assert_eq!(text, "{\n  'a': 1,\n  'b': [\n    1,\n    2\n  ]\n}");
//! ```

use crate::ast::{Expr, ExprKind, Step};
use crate::format::FormatError;
use regex::Regex;
use std::sync::LazyLock;

/// Width of one indentation level, in spaces.
pub const DEFAULT_INDENT: usize = 2;

const KEYWORDS: &[&str] = &["and", "or", "in", "true", "false", "null", "function"];

/// What the lexer reads as a name without back-quotes.
static PLAIN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{Alphabetic}_][\p{Alphabetic}\p{N}_]*$").expect("name pattern is valid")
});

pub struct Printer {
    indent_step: usize,
    depth: usize,
    out: String,
}

impl Printer {
    pub fn new(indent_step: usize) -> Self {
        Printer {
            indent_step,
            depth: 0,
            out: String::new(),
        }
    }

    pub fn print(mut self, expr: &Expr) -> Result<String, FormatError> {
        self.print_expr(expr)?;
        Ok(self.out)
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.out.push_str(&" ".repeat(self.depth));
    }

    fn indent(&mut self) {
        self.depth += self.indent_step;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(self.indent_step);
    }

    fn print_expr(&mut self, expr: &Expr) -> Result<(), FormatError> {
        match &expr.kind {
            ExprKind::Object(pairs) => self.print_object(pairs)?,
            ExprKind::Array(items) => self.print_sequence(items, "[", ",", "]")?,
            ExprKind::Block(items) => self.print_sequence(items, "(", ";", ")")?,
            ExprKind::String { raw, .. } | ExprKind::Number { raw, .. } => self.write(raw),
            ExprKind::Regex { pattern, flags } => {
                self.write("/");
                self.write(pattern);
                self.write("/");
                self.write(flags);
            }
            ExprKind::Value(literal) => self.write(literal.as_str()),
            ExprKind::Variable(name) => {
                self.write("$");
                self.write(name);
            }
            ExprKind::Name(name) => self.print_name(name),
            ExprKind::Wildcard => self.write("*"),
            ExprKind::Descendant => self.write("**"),
            ExprKind::Parent => self.write("%"),
            ExprKind::Negate(operand) => {
                self.write("-");
                self.print_expr(operand)?;
            }
            ExprKind::Binary { op, lhs, rhs } => self.print_infix(lhs, op.symbol(), rhs)?,
            ExprKind::Apply { lhs, rhs } => self.print_infix(lhs, "~>", rhs)?,
            ExprKind::Bind { lhs, rhs } => self.print_infix(lhs, ":=", rhs)?,
            ExprKind::Condition {
                condition,
                then,
                otherwise,
            } => {
                let otherwise = otherwise.as_ref().ok_or(FormatError::MissingField {
                    node: "condition",
                    field: "else",
                })?;
                self.print_expr(condition)?;
                self.indent();
                self.newline();
                self.write("? ");
                self.print_expr(then)?;
                self.newline();
                self.write(": ");
                self.print_expr(otherwise)?;
                self.dedent();
            }
            ExprKind::Path { steps, group } => {
                if steps.is_empty() {
                    return Err(FormatError::MissingField {
                        node: "path",
                        field: "steps",
                    });
                }
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 {
                        self.write(".");
                    }
                    self.print_step(step)?;
                }
                if let Some(group) = group {
                    self.print_object(group)?;
                }
            }
            ExprKind::Lambda {
                keyword,
                params,
                body,
                thunk,
            } => {
                if *thunk {
                    return self.print_expr(body);
                }
                let params: Vec<String> = params.iter().map(|p| format!("${}", p)).collect();
                self.write(keyword);
                self.write("(");
                self.write(&params.join(", "));
                self.write(") {");
                self.indent();
                self.newline();
                self.print_expr(body)?;
                self.dedent();
                self.newline();
                self.write("}");
            }
            ExprKind::Function {
                procedure,
                arguments,
            } => {
                self.print_expr(procedure)?;
                self.write("(");
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print_expr(argument)?;
                }
                self.write(")");
            }
            ExprKind::Filter(predicate) => {
                self.write("[");
                self.print_expr(predicate)?;
                self.write("]");
            }
            ExprKind::Other { .. } => self.print_dump(expr)?,
        }
        Ok(())
    }

    fn print_infix(&mut self, lhs: &Expr, symbol: &str, rhs: &Expr) -> Result<(), FormatError> {
        self.print_expr(lhs)?;
        self.write(" ");
        self.write(symbol);
        self.write(" ");
        self.print_expr(rhs)
    }

    fn print_object(&mut self, pairs: &[(Expr, Expr)]) -> Result<(), FormatError> {
        if pairs.is_empty() {
            self.write("{}");
            return Ok(());
        }

        self.write("{");
        self.indent();
        for (i, (key, value)) in pairs.iter().enumerate() {
            self.newline();
            self.print_expr(key)?;
            self.write(": ");
            self.print_expr(value)?;
            if i + 1 != pairs.len() {
                self.write(",");
            }
        }
        self.dedent();
        self.newline();
        self.write("}");
        Ok(())
    }

    fn print_sequence(
        &mut self,
        items: &[Expr],
        open: &str,
        separator: &str,
        close: &str,
    ) -> Result<(), FormatError> {
        if items.len() < 2 {
            self.write(open);
            if let Some(item) = items.first() {
                self.print_expr(item)?;
            }
            self.write(close);
            return Ok(());
        }

        self.write(open);
        self.indent();
        for (i, item) in items.iter().enumerate() {
            self.newline();
            self.print_expr(item)?;
            if i + 1 != items.len() {
                self.write(separator);
            }
        }
        self.dedent();
        self.newline();
        self.write(close);
        Ok(())
    }

    fn print_step(&mut self, step: &Step) -> Result<(), FormatError> {
        if step.is_context_marker() {
            self.write("$");
        } else {
            self.print_expr(&step.expr)?;
        }
        for stage in &step.stages {
            self.print_expr(stage)?;
        }
        if step.keep_array {
            self.write("[]");
        }
        Ok(())
    }

    fn print_name(&mut self, name: &str) {
        if name.contains('`') {
            // Back-quotes cannot be escaped; a string step reads back as a name
            let quoted = serde_json::Value::String(name.to_string()).to_string();
            self.write(&quoted);
        } else if is_plain_name(name) {
            self.write(name);
        } else {
            self.write("`");
            self.write(name);
            self.write("`");
        }
    }

    /// Fallback for constructs without a layout rule: a pretty-printed dump.
    fn print_dump(&mut self, expr: &Expr) -> Result<(), FormatError> {
        let dump = serde_json::to_string_pretty(&expr.to_json())?;
        for (i, line) in dump.lines().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.write(line);
        }
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    PLAIN_NAME.is_match(name) && !KEYWORDS.contains(&name) && name != "λ"
}

/// Prints an expression with the default two-space indentation.
pub fn print(expr: &Expr) -> Result<String, FormatError> {
    Printer::new(DEFAULT_INDENT).print(expr)
}
