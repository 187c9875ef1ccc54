//! Format a single document for the command line

use super::CliError;
use crate::format::{try_format, FormatOptions};

/// One document to format
#[derive(Debug, Clone, Default)]
pub struct FormatRequest {
    /// The JSONata source text
    pub source: String,
    /// Indentation and verification settings
    pub options: FormatOptions,
}

/// Result of a format operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatResult {
    /// The document is already formatted
    Unchanged,
    /// The document's formatted text
    Reformatted(String),
}

/// The printer never ends its output with a newline; keep the one the file had
fn preserve_trailing_newline(source: &str, mut formatted: String) -> String {
    if source.ends_with('\n') && !formatted.ends_with('\n') {
        formatted.push('\n');
    }
    formatted
}

/// Execute a format operation
///
/// Unlike [`crate::format_document`] this reports failures instead of
/// handing back the original text, so callers can tell the two apart.
pub fn execute_format(request: &FormatRequest) -> Result<FormatResult, CliError> {
    let formatted = try_format(&request.source, &request.options)?;
    let formatted = preserve_trailing_newline(&request.source, formatted);

    if formatted == request.source {
        Ok(FormatResult::Unchanged)
    } else {
        Ok(FormatResult::Reformatted(formatted))
    }
}
