use crate::ast::Token;
use crate::parser::{ParseError, ParseErrorKind};
use std::ops::Range;

/// A 1-based line/column location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn from_offset(input: &[char], offset: usize) -> Self {
        let mut position = Position { line: 1, column: 1 };
        for &ch in input.iter().take(offset) {
            if ch == '\n' {
                position.line += 1;
                position.column = 1;
            } else {
                position.column += 1;
            }
        }
        position
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
    /// Character ranges of the comments skipped so far, delimiters included
    comments: Vec<Range<usize>>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
            comments: Vec::new(),
        }
    }

    /// Comments skipped so far, as character ranges into the input.
    pub fn comments(&self) -> &[Range<usize>] {
        &self.comments
    }

    pub fn take_comments(&mut self) -> Vec<Range<usize>> {
        std::mem::take(&mut self.comments)
    }

    /// Character offset of the most recently returned token.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    pub fn error_at(&self, offset: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset,
            position: Position::from_offset(&self.input, offset),
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.position, kind)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn slice(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            while let Some(ch) = self.current_char() {
                if ch.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.current_char() == Some('/') && self.peek_char(1) == Some('*') {
                let start = self.position;
                self.advance();
                self.advance();
                loop {
                    match self.current_char() {
                        None => {
                            return Err(self.error_at(start, ParseErrorKind::UnterminatedComment));
                        }
                        Some('*') if self.peek_char(1) == Some('/') => {
                            self.advance();
                            self.advance();
                            self.comments.push(start..self.position);
                            break;
                        }
                        Some(_) => self.advance(),
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.slice(start)
    }

    fn read_variable(&mut self) -> String {
        self.advance(); // Consume '$'
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                self.advance();
            } else {
                break;
            }
        }
        self.slice(start)
    }

    fn read_backtick_name(&mut self) -> Result<String, ParseError> {
        let start = self.position;
        self.advance(); // Consume opening backtick
        let name_start = self.position;
        while let Some(ch) = self.current_char() {
            if ch == '`' {
                let name = self.slice(name_start);
                self.advance();
                return Ok(name);
            }
            self.advance();
        }
        Err(self.error_at(start, ParseErrorKind::UnterminatedName))
    }

    fn read_hex4(&mut self) -> Result<u32, ParseError> {
        let start = self.position;
        for _ in 0..4 {
            match self.current_char() {
                Some(ch) if ch.is_ascii_hexdigit() => self.advance(),
                _ => {
                    return Err(self.error(ParseErrorKind::InvalidEscape(format!(
                        "\\u{}",
                        self.slice(start)
                    ))));
                }
            }
        }
        u32::from_str_radix(&self.slice(start), 16)
            .map_err(|_| self.error(ParseErrorKind::InvalidEscape(self.slice(start))))
    }

    fn read_unicode_escape(&mut self) -> Result<char, ParseError> {
        let high = self.read_hex4()?;
        if (0xD800..0xDC00).contains(&high)
            && self.current_char() == Some('\\')
            && self.peek_char(1) == Some('u')
        {
            self.advance();
            self.advance();
            let low = self.read_hex4()?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let start = self.position;
        let mut value = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(Token::String {
                        value,
                        raw: self.slice(start),
                    });
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    let escaped = match self.current_char() {
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{0008}',
                        Some('f') => '\u{000C}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => {
                            self.advance();
                            value.push(self.read_unicode_escape()?);
                            continue;
                        }
                        Some(other) => {
                            return Err(self.error(ParseErrorKind::InvalidEscape(format!(
                                "\\{}",
                                other
                            ))));
                        }
                        None => break,
                    };
                    value.push(escaped);
                    self.advance();
                }
                _ => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error_at(start, ParseErrorKind::UnterminatedString))
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let start = self.position;

        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // `1..5` is a range, so a fraction needs a digit after the dot
        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_char(1), Some('+' | '-')));
            if self.peek_char(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..=sign {
                    self.advance();
                }
                while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let raw = self.slice(start);
        let value = raw
            .parse::<f64>()
            .map_err(|_| self.error_at(start, ParseErrorKind::InvalidNumber(raw.clone())))?;
        Ok(Token::Number { value, raw })
    }

    fn is_escaped(&self, at: usize) -> bool {
        let backslashes = self.input[..at]
            .iter()
            .rev()
            .take_while(|&&c| c == '\\')
            .count();
        backslashes % 2 == 1
    }

    fn read_regex(&mut self) -> Result<Token, ParseError> {
        let start = self.position;
        self.advance(); // Consume opening slash
        let pattern_start = self.position;
        let mut depth: i32 = 0;

        while let Some(ch) = self.current_char() {
            match ch {
                '/' if depth == 0 && !self.is_escaped(self.position) => {
                    let pattern = self.slice(pattern_start);
                    if pattern.is_empty() {
                        return Err(self.error_at(start, ParseErrorKind::EmptyRegex));
                    }
                    self.advance();
                    let flags_start = self.position;
                    while matches!(self.current_char(), Some('i' | 'm')) {
                        self.advance();
                    }
                    return Ok(Token::Regex {
                        pattern,
                        flags: self.slice(flags_start),
                    });
                }
                '(' | '[' | '{' if !self.is_escaped(self.position) => depth += 1,
                ')' | ']' | '}' if !self.is_escaped(self.position) => depth -= 1,
                _ => {}
            }
            self.advance();
        }

        Err(self.error_at(start, ParseErrorKind::UnterminatedRegex))
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn pair(&mut self, second: char, paired: Token, single: Token) -> Token {
        if self.peek_char(1) == Some(second) {
            self.advance();
            self.advance();
            paired
        } else {
            self.advance();
            single
        }
    }

    /// Reads the next token.
    ///
    /// `operand_expected` is set by the parser when the token may start an
    /// operand; only then is `/` read as the start of a regex literal.
    pub fn next_token(&mut self, operand_expected: bool) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        self.token_start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('/') if operand_expected => self.read_regex()?,
            Some('/') => self.single(Token::Slash),
            Some('.') => self.pair('.', Token::DotDot, Token::Dot),
            Some(':') => self.pair('=', Token::ColonEqual, Token::Colon),
            Some('*') => self.pair('*', Token::DoubleStar, Token::Star),
            Some('<') => self.pair('=', Token::LtEq, Token::Lt),
            Some('>') => self.pair('=', Token::GtEq, Token::Gt),
            Some('!') if self.peek_char(1) == Some('=') => {
                self.advance();
                self.single(Token::NotEqual)
            }
            Some('~') if self.peek_char(1) == Some('>') => {
                self.advance();
                self.single(Token::Apply)
            }
            Some('?') => self.single(Token::Question),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('%') => self.single(Token::Percent),
            Some('=') => self.single(Token::Equal),
            Some('&') => self.single(Token::Ampersand),
            Some('^') => self.single(Token::Caret),
            Some('|') => self.single(Token::Pipe),
            Some('@') => self.single(Token::At),
            Some('#') => self.single(Token::Hash),
            Some(',') => self.single(Token::Comma),
            Some(';') => self.single(Token::Semicolon),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('[') => self.single(Token::LBracket),
            Some(']') => self.single(Token::RBracket),
            Some('{') => self.single(Token::LBrace),
            Some('}') => self.single(Token::RBrace),
            Some('"') => self.read_string('"')?,
            Some('\'') => self.read_string('\'')?,
            Some('`') => Token::Name(self.read_backtick_name()?),
            Some('$') => Token::Variable(self.read_variable()),
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "in" => Token::In,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    "function" => Token::Function,
                    "λ" => Token::Lambda,
                    _ => Token::Name(ident),
                }
            }
            Some(ch) => return Err(self.error(ParseErrorKind::UnexpectedChar(ch))),
        };

        Ok(token)
    }
}
