//! The formatting pipeline: parse, print, reinsert comments.
//!
//! Comments are invisible to the parser, so they are lifted out of the raw
//! text before printing and spliced back into the canonical output
//! afterwards (see [`crate::comments`]).
//!
//! [`format_document`] never fails: on any error it logs a warning and hands
//! back the original text, so applying its result is always safe.
//! [`try_format`] exposes the error for callers that want to report it.

use crate::ast::Expr;
use crate::comments::{self, CommentMap};
use crate::equality::structurally_equal;
use crate::parser::{ParseError, parse_expression, parse_with_comments};
use crate::printer::{DEFAULT_INDENT, Printer};
use log::{debug, warn};
use thiserror::Error;

/// Errors that stop a document from being formatted.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The source is not a valid expression
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The tree handed to the printer lacks a part its layout needs
    #[error("malformed {node} expression: missing {field}")]
    MissingField {
        node: &'static str,
        field: &'static str,
    },

    /// A node could not be dumped by the fallback printer
    #[error("failed to dump expression: {0}")]
    Dump(#[from] serde_json::Error),

    /// The printed text does not read back as the same expression
    #[error("formatted output does not parse back to the same expression")]
    Unstable,
}

/// Formatter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per indentation level
    pub indent: usize,
    /// Re-parse the printed text and compare it with the source tree
    pub verify: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            indent: DEFAULT_INDENT,
            verify: false,
        }
    }
}

/// Formats one document, carrying its comments over to the output.
///
/// The source is parsed and its comments extracted when the formatter is
/// built; [`format`](Self::format) and [`try_format`](Self::try_format) print
/// the tree and write the comments back into it.
pub struct CommentPreservingFormatter<'a> {
    source: &'a str,
    tree: Result<Expr, ParseError>,
    comments: CommentMap,
    options: FormatOptions,
}

impl<'a> CommentPreservingFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        let (tree, spans) = parse_with_comments(source);
        CommentPreservingFormatter {
            source,
            tree,
            comments: comments::extract_spans(source, &spans),
            options: FormatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn comments(&self) -> &CommentMap {
        &self.comments
    }

    pub fn try_format(&self) -> Result<String, FormatError> {
        let tree = self.tree.as_ref().map_err(|e| FormatError::Parse(e.clone()))?;
        let printed = Printer::new(self.options.indent).print(tree)?;

        if self.options.verify {
            let reparsed = parse_expression(&printed).map_err(|e| {
                debug!("printed text failed to parse: {}", e);
                FormatError::Unstable
            })?;
            if !structurally_equal(tree, &reparsed, "position") {
                return Err(FormatError::Unstable);
            }
        }

        // If no comments, skip reinserting comments
        if self.comments.is_empty() {
            return Ok(printed);
        }
        Ok(comments::reinsert(&printed, &self.comments))
    }

    /// Formats the document, or returns it unchanged if that fails.
    pub fn format(&self) -> String {
        match self.try_format() {
            Ok(text) => text,
            Err(e) => {
                warn!("formatting failed, leaving document unchanged: {}", e);
                self.source.to_string()
            }
        }
    }
}

pub fn try_format(source: &str, options: &FormatOptions) -> Result<String, FormatError> {
    CommentPreservingFormatter::new(source)
        .with_options(*options)
        .try_format()
}

/// Returns the formatted document, or `source` unchanged on any failure.
pub fn format_document(source: &str) -> String {
    format_document_with(source, &FormatOptions::default())
}

pub fn format_document_with(source: &str, options: &FormatOptions) -> String {
    CommentPreservingFormatter::new(source)
        .with_options(*options)
        .format()
}
