use super::{AnchorKey, Comment, CommentKind, CommentMap};
use crate::parser::parse_with_comments;
use std::iter;
use std::ops::Range;

fn is_horizontal_whitespace(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

/// Collects every comment in `source`, keyed by its anchor.
///
/// Comments are found by the lexer, so `/*` inside string literals,
/// back-quoted names and regex literals is left alone. Only the comments
/// read before a parse error are collected.
pub fn extract(source: &str) -> CommentMap {
    let (_, spans) = parse_with_comments(source);
    extract_spans(source, &spans)
}

/// Builds the comment map from comment spans given as character ranges.
///
/// The anchor is the closest non-whitespace character before the comment,
/// looking past line breaks when the comment starts its own line. A comment
/// with only whitespace before it anchors to the start of the document.
pub fn extract_spans(source: &str, spans: &[Range<usize>]) -> CommentMap {
    // Byte offset of every character, then the end of the text
    let offsets: Vec<usize> = source
        .char_indices()
        .map(|(at, _)| at)
        .chain(iter::once(source.len()))
        .collect();
    let mut comments = CommentMap::new();

    for span in spans {
        let (Some(&start), Some(&end)) = (offsets.get(span.start), offsets.get(span.end)) else {
            continue;
        };
        let before = &source[..start];
        let after = &source[end..];

        // `None` means the scan ran into the edge of the document, which
        // counts as a line boundary
        let previous = before.chars().rev().find(|&c| !is_horizontal_whitespace(c));
        let next = after.chars().find(|&c| !is_horizontal_whitespace(c));

        let anchor = match previous {
            Some('\n') => before.chars().rev().find(|c| !c.is_whitespace()),
            other => other,
        };

        let starts_line = matches!(previous, None | Some('\n'));
        let ends_line = matches!(next, None | Some('\n'));
        let kind = if starts_line && ends_line {
            CommentKind::Standalone
        } else {
            CommentKind::Inline
        };

        let key = match anchor {
            None => AnchorKey::StartOfDocument,
            Some(anchor) => AnchorKey::Char {
                anchor,
                // The anchor itself is among the occurrences before the comment
                occurrence: before.matches(anchor).count().saturating_sub(1),
            },
        };

        comments.insert(
            key,
            Comment {
                text: source[start..end].to_string(),
                kind,
            },
        );
    }

    comments
}
