use super::{AnchorKey, Comment, CommentKind, CommentMap};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Spliced into the current line
    Inline,
    /// Placed on a line of its own
    OwnLine,
}

/// Writes extracted comments back into formatted text.
///
/// Groups are placed one after another in the order they were extracted;
/// each group is located in the text as left by the groups before it. A group
/// whose anchor no longer occurs often enough is dropped.
pub fn reinsert(formatted: &str, comments: &CommentMap) -> String {
    let mut text = formatted.to_string();

    for (key, group) in comments.iter() {
        // All comments of a group share the same kind
        let Some(kind) = group.first().map(|comment| comment.kind) else {
            continue;
        };
        let Some(at) = insertion_point(&text, key) else {
            debug!(
                "dropping {} comment(s): anchor {:?} not found in formatted text",
                group.len(),
                key
            );
            continue;
        };
        text = splice(&text, at, key, kind, group);
    }

    text
}

/// Byte offset just past the anchor occurrence.
fn insertion_point(text: &str, key: &AnchorKey) -> Option<usize> {
    match *key {
        AnchorKey::StartOfDocument => Some(0),
        AnchorKey::Char { anchor, occurrence } => text
            .match_indices(anchor)
            .nth(occurrence)
            .map(|(at, matched)| at + matched.len()),
    }
}

fn layout(key: &AnchorKey, kind: CommentKind, back: &str) -> Layout {
    match (kind, key) {
        (CommentKind::Standalone, _) => Layout::OwnLine,
        // A comment leading the first element of an expanded object, array
        // or block stays with that element
        (CommentKind::Inline, AnchorKey::Char { anchor: '{' | '[' | '(', .. })
            if back.starts_with('\n') =>
        {
            Layout::OwnLine
        }
        (CommentKind::Inline, _) => Layout::Inline,
    }
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Indentation for a comment line placed between `front` and `back`.
fn own_line_indent(front: &str, back: &str) -> String {
    let current = front.rsplit('\n').next().map_or(0, leading_spaces);
    let following = back
        .strip_prefix('\n')
        .map_or(0, |rest| leading_spaces(rest.split('\n').next().unwrap_or("")));
    " ".repeat(current.max(following))
}

fn splice(text: &str, at: usize, key: &AnchorKey, kind: CommentKind, group: &[Comment]) -> String {
    let (front, back) = text.split_at(at);
    let comments: Vec<&str> = group.iter().map(|comment| comment.text.as_str()).collect();

    let mut out = String::with_capacity(text.len() + comments.iter().map(|c| c.len() + 8).sum::<usize>());
    out.push_str(front);
    let mut back = back;

    match layout(key, kind, back) {
        Layout::Inline => {
            if front.ends_with(|c: char| !c.is_whitespace()) {
                out.push(' ');
            }
            out.push_str(&comments.join(" "));
            // Only at the very start is there nothing in front to separate from
            if front.is_empty() && back.starts_with(|c: char| !c.is_whitespace()) {
                out.push(' ');
            }
        }
        Layout::OwnLine => {
            let indent = own_line_indent(front, back);
            if !front.is_empty() && !front.ends_with('\n') {
                out.push('\n');
            }
            for (i, comment) in comments.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(&indent);
                out.push_str(comment);
            }
            if !back.is_empty() && !back.starts_with('\n') {
                out.push('\n');
                out.push_str(&indent);
                back = back.trim_start_matches(' ');
            }
        }
    }

    out.push_str(back);
    out
}
