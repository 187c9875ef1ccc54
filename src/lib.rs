pub mod ast;
pub mod cli;
pub mod comments;
pub mod equality;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use ast::{BinOp, Expr, ExprKind, Step, Token};
pub use comments::{AnchorKey, Comment, CommentKind, CommentMap};
pub use equality::structurally_equal;
pub use format::{
    CommentPreservingFormatter, FormatError, FormatOptions, format_document, format_document_with,
    try_format,
};
pub use lexer::{Lexer, Position};
pub use parser::{ParseError, ParseErrorKind, Parser, parse_expression};
pub use printer::Printer;
