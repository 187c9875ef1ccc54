use crate::{
    ast::{BinOp, Expr, ExprKind, Literal, Step, Token},
    lexer::{Lexer, Position},
};
use serde_json::{Map, Value, json};
use std::mem;
use std::ops::Range;
use thiserror::Error;

/// How deeply expressions may nest before parsing gives up.
///
/// The tree is walked recursively by the printer, the dump and `Drop`, so
/// its depth has to stay well inside the stack.
pub const MAX_NESTING: usize = 200;

/// What went wrong while reading an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("unterminated back-quoted name")]
    UnterminatedName,

    #[error("unterminated regular expression")]
    UnterminatedRegex,

    #[error("empty regular expression")]
    EmptyRegex,

    #[error("invalid escape sequence {0}")]
    InvalidEscape(String),

    #[error("invalid number {0}")]
    InvalidNumber(String),

    #[error("{0} cannot be used as a path step")]
    InvalidStep(&'static str),

    #[error("the left side of := must be a variable")]
    InvalidBind,

    #[error("a group-by clause must be the last part of a path")]
    GroupNotLast,

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("expression nested more than {0} levels deep")]
    TooDeep(usize),
}

/// A failure to parse, located in the source text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("ParseError (@{}:{}): {kind}", .position.line, .position.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Character offset of the offending input
    pub offset: usize,
    pub position: Position,
}

/// Parses a complete expression.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(source))?.parse()
}

/// Parses a complete expression, also returning the character ranges of the
/// comments read before parsing finished or failed.
pub fn parse_with_comments(source: &str) -> (Result<Expr, ParseError>, Vec<Range<usize>>) {
    let mut parser = match Parser::new(Lexer::new(source)) {
        Ok(parser) => parser,
        Err(e) => return (Err(e), Vec::new()),
    };
    let result = parser.parse();
    (result, parser.lexer.take_comments())
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_offset: usize,
    /// Nesting of the expression being parsed
    depth: usize,
}

/// Left binding power of a token in infix position.
fn binding_power(token: &Token) -> Option<u8> {
    match token {
        Token::ColonEqual => Some(10),
        Token::Question | Token::DotDot => Some(20),
        Token::Or => Some(25),
        Token::And => Some(30),
        Token::Equal
        | Token::NotEqual
        | Token::Lt
        | Token::LtEq
        | Token::Gt
        | Token::GtEq
        | Token::In
        | Token::Apply => Some(40),
        Token::Plus | Token::Minus | Token::Ampersand => Some(50),
        Token::Star | Token::Slash | Token::Percent => Some(60),
        Token::LBrace => Some(70),
        Token::Dot => Some(75),
        Token::LBracket | Token::LParen | Token::Caret => Some(80),
        _ => None,
    }
}

fn binary_op(token: &Token) -> Option<BinOp> {
    let op = match token {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Subtract,
        Token::Star => BinOp::Multiply,
        Token::Slash => BinOp::Divide,
        Token::Percent => BinOp::Modulo,
        Token::Equal => BinOp::Equal,
        Token::NotEqual => BinOp::NotEqual,
        Token::Lt => BinOp::LessThan,
        Token::LtEq => BinOp::LessEqual,
        Token::Gt => BinOp::GreaterThan,
        Token::GtEq => BinOp::GreaterEqual,
        Token::Ampersand => BinOp::Concat,
        Token::And => BinOp::And,
        Token::Or => BinOp::Or,
        Token::In => BinOp::In,
        Token::DotDot => BinOp::Range,
        _ => return None,
    };
    Some(op)
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token(true)?;
        let current_offset = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_offset,
            depth: 0,
        })
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(ParseErrorKind::TooDeep(MAX_NESTING)));
        }
        Ok(())
    }

    fn bump(&mut self, operand_expected: bool) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token(operand_expected)?;
        self.current_offset = self.lexer.token_start();
        Ok(())
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        let operand_expected = !self.current_token.ends_operand();
        self.bump(operand_expected)
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.error(ParseErrorKind::Expected {
                expected: format!("{:?}", expected),
                found: format!("{:?}", self.current_token),
            }));
        }
        self.advance()
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.lexer.error_at(self.current_offset, kind)
    }

    fn unexpected(&self) -> ParseError {
        self.error(ParseErrorKind::UnexpectedToken(format!(
            "{:?}",
            self.current_token
        )))
    }

    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression(0)?;
        if !self.check(&Token::Eof) {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    pub fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let entered = self.depth;
        self.enter()?;
        let mut lhs = self.parse_primary()?;

        while let Some(bp) = binding_power(&self.current_token) {
            if bp <= min_bp {
                break;
            }
            // Steps and predicates are flattened into the path; every other
            // operator wraps the expression so far one level deeper
            if !matches!(self.current_token, Token::Dot | Token::LBracket) {
                self.enter()?;
            }
            lhs = self.parse_infix(lhs, bp)?;
        }

        self.depth = entered;
        Ok(lhs)
    }

    /// Parse primary expressions (operands and prefix operators)
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.current_offset;
        let kind = match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::String { value, raw } => {
                self.bump(false)?;
                ExprKind::String { value, raw }
            }
            Token::Number { value, raw } => {
                self.bump(false)?;
                ExprKind::Number { value, raw }
            }
            Token::Regex { pattern, flags } => {
                self.bump(false)?;
                ExprKind::Regex { pattern, flags }
            }
            Token::True => {
                self.bump(false)?;
                ExprKind::Value(Literal::True)
            }
            Token::False => {
                self.bump(false)?;
                ExprKind::Value(Literal::False)
            }
            Token::Null => {
                self.bump(false)?;
                ExprKind::Value(Literal::Null)
            }

            // References
            Token::Name(name) => {
                self.bump(false)?;
                // A bare name is always a path, even with a single step
                ExprKind::Path {
                    steps: vec![Step::new(Expr::new(ExprKind::Name(name), position))],
                    group: None,
                }
            }
            Token::Variable(name) => {
                self.bump(false)?;
                ExprKind::Variable(name)
            }
            Token::Star => {
                self.bump(false)?;
                ExprKind::Wildcard
            }
            Token::DoubleStar => {
                self.bump(false)?;
                ExprKind::Descendant
            }
            Token::Percent => {
                self.bump(false)?;
                ExprKind::Parent
            }

            // Unary minus, folded into number literals
            Token::Minus => {
                self.bump(true)?;
                let operand = self.parse_expression(70)?;
                match operand.kind {
                    ExprKind::Number { value, raw } => ExprKind::Number {
                        value: -value,
                        raw: format!("-{}", raw),
                    },
                    kind => ExprKind::Negate(Box::new(Expr::new(kind, operand.position))),
                }
            }

            // Constructors
            Token::LParen => {
                self.bump(true)?;
                ExprKind::Block(self.parse_block_body()?)
            }
            Token::LBracket => {
                self.bump(true)?;
                ExprKind::Array(self.parse_array_body()?)
            }
            Token::LBrace => {
                self.bump(true)?;
                let pairs = self.parse_object_body()?;
                self.expect(Token::RBrace)?;
                ExprKind::Object(pairs)
            }

            Token::Function => {
                self.bump(false)?;
                self.parse_lambda("function")?
            }
            Token::Lambda => {
                self.bump(false)?;
                self.parse_lambda("λ")?
            }
            Token::Pipe => {
                self.bump(true)?;
                self.parse_transform()?
            }

            Token::At => return Err(self.error(ParseErrorKind::Unsupported("context binding (@)"))),
            Token::Hash => return Err(self.error(ParseErrorKind::Unsupported("positional binding (#)"))),
            Token::Question => {
                return Err(self.error(ParseErrorKind::Unsupported("partial application (?)")));
            }

            token => {
                self.current_token = token;
                return Err(self.unexpected());
            }
        };
        Ok(Expr::new(kind, position))
    }

    fn parse_infix(&mut self, lhs: Expr, bp: u8) -> Result<Expr, ParseError> {
        let position = self.current_offset;

        if let Some(op) = binary_op(&self.current_token) {
            self.advance()?;
            let rhs = self.parse_expression(bp)?;
            return Ok(Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                position,
            ));
        }

        let kind = match self.current_token {
            Token::Apply => {
                self.advance()?;
                let rhs = self.parse_expression(bp)?;
                ExprKind::Apply {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            Token::ColonEqual => {
                if !matches!(lhs.kind, ExprKind::Variable(_)) {
                    return Err(self.error(ParseErrorKind::InvalidBind));
                }
                self.advance()?;
                // Right associative
                let rhs = self.parse_expression(bp - 1)?;
                ExprKind::Bind {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            Token::Question => {
                self.advance()?;
                let then = self.parse_expression(0)?;
                let otherwise = if self.check(&Token::Colon) {
                    self.advance()?;
                    Some(Box::new(self.parse_expression(0)?))
                } else {
                    None
                };
                ExprKind::Condition {
                    condition: Box::new(lhs),
                    then: Box::new(then),
                    otherwise,
                }
            }
            Token::Dot => {
                self.advance()?;
                let rhs = self.parse_expression(bp)?;
                let mut steps = self.into_steps(lhs)?;
                steps.extend(self.into_steps(rhs)?);
                return Ok(path(steps, None));
            }
            Token::LBracket => {
                self.advance()?;
                if self.check(&Token::RBracket) {
                    self.advance()?;
                    let (mut steps, group) = self.into_predicated(lhs)?;
                    if let Some(last) = steps.last_mut() {
                        last.keep_array = true;
                    }
                    return Ok(path(steps, group));
                }
                let predicate = self.parse_expression(0)?;
                self.expect(Token::RBracket)?;
                let stage = Expr::new(ExprKind::Filter(Box::new(predicate)), position);
                let (mut steps, group) = self.into_predicated(lhs)?;
                if let Some(last) = steps.last_mut() {
                    last.stages.push(stage);
                }
                return Ok(path(steps, group));
            }
            Token::LBrace => {
                self.advance()?;
                let pairs = self.parse_object_body()?;
                self.expect(Token::RBrace)?;
                let lhs_position = lhs.position;
                return match lhs.kind {
                    ExprKind::Path { group: Some(_), .. } => Err(self.error(ParseErrorKind::GroupNotLast)),
                    ExprKind::Path { steps, group: None } => Ok(Expr::new(
                        ExprKind::Path {
                            steps,
                            group: Some(pairs),
                        },
                        lhs_position,
                    )),
                    kind => Ok(Expr::new(
                        ExprKind::Path {
                            steps: vec![Step::new(Expr::new(kind, lhs_position))],
                            group: Some(pairs),
                        },
                        lhs_position,
                    )),
                };
            }
            Token::LParen => {
                self.advance()?;
                let mut arguments = vec![];
                while !self.check(&Token::RParen) {
                    arguments.push(self.parse_expression(0)?);
                    if !self.check(&Token::RParen) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RParen)?;
                ExprKind::Function {
                    procedure: Box::new(lhs),
                    arguments,
                }
            }
            Token::Caret => {
                self.advance()?;
                self.expect(Token::LParen)?;
                let mut terms = vec![];
                while !self.check(&Token::RParen) {
                    let descending = match self.current_token {
                        Token::Gt => {
                            self.advance()?;
                            true
                        }
                        Token::Lt => {
                            self.advance()?;
                            false
                        }
                        _ => false,
                    };
                    let expression = self.parse_expression(0)?;
                    terms.push(json!({ "descending": descending, "expression": expression.to_json() }));
                    if !self.check(&Token::RParen) {
                        self.expect(Token::Comma)?;
                    }
                }
                self.expect(Token::RParen)?;
                let mut fields = Map::new();
                fields.insert("lhs".into(), lhs.to_json());
                fields.insert("terms".into(), Value::Array(terms));
                ExprKind::Other {
                    kind: "sort".to_string(),
                    fields,
                }
            }
            _ => return Err(self.unexpected()),
        };
        Ok(Expr::new(kind, position))
    }

    /// Splits an operand of `.` into path steps.
    fn into_steps(&self, expr: Expr) -> Result<Vec<Step>, ParseError> {
        let position = expr.position;
        match expr.kind {
            ExprKind::Path { group: Some(_), .. } => Err(self.error(ParseErrorKind::GroupNotLast)),
            ExprKind::Path { steps, group: None } => Ok(steps),
            ExprKind::String { value, .. } => {
                Ok(vec![Step::new(Expr::new(ExprKind::Name(value), position))])
            }
            ExprKind::Number { .. } => Err(self.error(ParseErrorKind::InvalidStep("a number"))),
            ExprKind::Value(_) => Err(self.error(ParseErrorKind::InvalidStep("a literal value"))),
            kind => Ok(vec![Step::new(Expr::new(kind, position))]),
        }
    }

    /// The steps a predicate attaches to; anything but a path becomes a single step.
    fn into_predicated(
        &self,
        expr: Expr,
    ) -> Result<(Vec<Step>, Option<Vec<(Expr, Expr)>>), ParseError> {
        let position = expr.position;
        match expr.kind {
            ExprKind::Path { group: Some(_), .. } => Err(self.error(ParseErrorKind::GroupNotLast)),
            ExprKind::Path { steps, group } => Ok((steps, group)),
            kind => Ok((vec![Step::new(Expr::new(kind, position))], None)),
        }
    }

    fn parse_block_body(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut expressions = vec![];
        while !self.check(&Token::RParen) {
            expressions.push(self.parse_expression(0)?);
            if !self.check(&Token::Semicolon) {
                break;
            }
            self.advance()?;
        }
        self.expect(Token::RParen)?;
        Ok(expressions)
    }

    fn parse_array_body(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut elements = vec![];
        while !self.check(&Token::RBracket) {
            elements.push(self.parse_expression(0)?);
            if !self.check(&Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RBracket)?;
        Ok(elements)
    }

    fn parse_object_body(&mut self) -> Result<Vec<(Expr, Expr)>, ParseError> {
        let mut pairs = vec![];
        while !self.check(&Token::RBrace) {
            let key = self.parse_expression(0)?;
            self.expect(Token::Colon)?;
            let value = self.parse_expression(0)?;
            pairs.push((key, value));
            if !self.check(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }
        Ok(pairs)
    }

    fn parse_lambda(&mut self, keyword: &'static str) -> Result<ExprKind, ParseError> {
        self.expect(Token::LParen)?;
        let mut params = vec![];
        while !self.check(&Token::RParen) {
            match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Variable(name) => {
                    self.bump(false)?;
                    params.push(name);
                }
                token => {
                    self.current_token = token;
                    return Err(self.error(ParseErrorKind::Expected {
                        expected: "parameter variable".to_string(),
                        found: format!("{:?}", self.current_token),
                    }));
                }
            }
            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RParen)?;

        if self.check(&Token::Lt) {
            return Err(self.error(ParseErrorKind::Unsupported("function signature")));
        }

        self.expect(Token::LBrace)?;
        let body = self.parse_expression(0)?;
        self.expect(Token::RBrace)?;

        Ok(ExprKind::Lambda {
            keyword,
            params,
            body: Box::new(tail_call_optimize(body)),
            thunk: false,
        })
    }

    fn parse_transform(&mut self) -> Result<ExprKind, ParseError> {
        let pattern = self.parse_expression(0)?;
        self.expect(Token::Pipe)?;
        let update = self.parse_expression(0)?;
        let delete = if self.check(&Token::Comma) {
            self.advance()?;
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        // The closing pipe ends an operand
        if !self.check(&Token::Pipe) {
            return Err(self.error(ParseErrorKind::Expected {
                expected: format!("{:?}", Token::Pipe),
                found: format!("{:?}", self.current_token),
            }));
        }
        self.bump(false)?;

        let mut fields = Map::new();
        fields.insert("pattern".into(), pattern.to_json());
        fields.insert("update".into(), update.to_json());
        if let Some(delete) = delete {
            fields.insert("delete".into(), delete.to_json());
        }
        Ok(ExprKind::Other {
            kind: "transform".to_string(),
            fields,
        })
    }
}

fn path(steps: Vec<Step>, group: Option<Vec<(Expr, Expr)>>) -> Expr {
    let position = steps.first().map_or(0, |step| step.expr.position);
    Expr::new(ExprKind::Path { steps, group }, position)
}

/// Wraps function calls in tail position of a lambda body in a thunk.
fn tail_call_optimize(expr: Expr) -> Expr {
    let position = expr.position;
    if matches!(expr.kind, ExprKind::Function { .. }) {
        return Expr::new(
            ExprKind::Lambda {
                keyword: "function",
                params: vec![],
                body: Box::new(expr),
                thunk: true,
            },
            position,
        );
    }

    let kind = match expr.kind {
        ExprKind::Condition {
            condition,
            then,
            otherwise,
        } => ExprKind::Condition {
            condition,
            then: Box::new(tail_call_optimize(*then)),
            otherwise: otherwise.map(|e| Box::new(tail_call_optimize(*e))),
        },
        ExprKind::Block(mut expressions) => {
            if let Some(last) = expressions.pop() {
                expressions.push(tail_call_optimize(last));
            }
            ExprKind::Block(expressions)
        }
        kind => kind,
    };
    Expr::new(kind, position)
}
