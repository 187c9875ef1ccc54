#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// String literal in double or single quotes
    ///
    /// `value` is the decoded text, `raw` the lexeme including its quotes.
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'it\'s'
    /// ```
    String { value: String, raw: String },

    /// Number literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 1e-3
    /// ```
    Number { value: f64, raw: String },

    /// Regular expression literal
    ///
    /// Only recognised where an operand is expected; elsewhere `/` divides.
    ///
    /// # Examples
    /// ```text
    /// /^[a-z]+$/i
    /// ```
    Regex { pattern: String, flags: String },

    /// `true`
    True,

    /// `false`
    False,

    /// `null`
    Null,

    // Identifiers and References
    /// Field name, either bare or back-quoted
    ///
    /// # Examples
    /// ```text
    /// Account
    /// `Order Total`
    /// ```
    Name(String),

    /// Variable reference; the name excludes the leading `$`
    ///
    /// # Examples
    /// ```text
    /// $        // Variable("")
    /// $$       // Variable("$")
    /// $price   // Variable("price")
    /// ```
    Variable(String),

    /// `function`
    Function,

    /// `λ`, the short spelling of `function`
    Lambda,

    // Keyword operators
    /// `and`
    And,
    /// `or`
    Or,
    /// `in`
    In,

    // Operators
    /// Path separator
    Dot,
    /// Range
    DotDot,
    /// Object pair separator and conditional else
    Colon,
    /// Variable binding
    ColonEqual,
    /// Conditional
    Question,
    /// Function application chain (`~>`)
    Apply,
    /// Addition
    Plus,
    /// Subtraction or negation
    Minus,
    /// Multiplication or wildcard
    Star,
    /// Descendant wildcard (`**`)
    DoubleStar,
    /// Division
    Slash,
    /// Modulo or parent reference
    Percent,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// String concatenation
    Ampersand,
    /// Order-by (`^(...)`)
    Caret,
    /// Transform delimiter (`|...|...|`)
    Pipe,
    /// Context variable binding (`@`)
    At,
    /// Positional variable binding (`#`)
    Hash,

    // Delimiters
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    /// End of input
    Eof,
}

impl Token {
    /// Whether this token can end an operand, which makes a following `/`
    /// a division rather than the start of a regex.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::String { .. }
                | Token::Number { .. }
                | Token::Regex { .. }
                | Token::True
                | Token::False
                | Token::Null
                | Token::Name(_)
                | Token::Variable(_)
                | Token::DoubleStar
                | Token::RParen
                | Token::RBracket
                | Token::RBrace
        )
    }
}
