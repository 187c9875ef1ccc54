//! Comment extraction and reinsertion.
//!
//! JSONata comments (`/* ... */`) are skipped by the lexer and never reach
//! the tree, and reformatting changes every offset in the document. Each
//! comment is therefore remembered relative to the nearest non-whitespace
//! character before it: *the Nth occurrence of character C*. Printing keeps
//! punctuation and literal text in order, so the same occurrence can be
//! found again in the reformatted text.
//!
//! ```text
//! {
//!   "a": 1, /* first */
//!   "b": 2
//! }
//! ```
//!
//! Here `/* first */` is anchored after the first `,` and is written back
//! after the first `,` of the printed output.

mod extract;
mod reinsert;

pub use extract::{extract, extract_spans};
pub use reinsert::reinsert;

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    /// Shares a line with code
    Inline,
    /// Alone on its line
    Standalone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The comment including its delimiters
    pub text: String,
    pub kind: CommentKind,
}

/// Where a comment goes back into the reformatted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKey {
    /// Nothing but whitespace precedes the comment
    StartOfDocument,
    /// Directly after the `occurrence`-th (zero-based) `anchor` character
    Char { anchor: char, occurrence: usize },
}

/// Comments grouped by anchor, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentMap {
    entries: Vec<(AnchorKey, Vec<Comment>)>,
    index: HashMap<AnchorKey, usize>,
}

impl CommentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a comment to the group for `key`, creating the group on first use.
    pub fn insert(&mut self, key: AnchorKey, comment: Comment) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1.push(comment),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, vec![comment]));
            }
        }
    }

    pub fn get(&self, key: &AnchorKey) -> Option<&[Comment]> {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    /// Number of anchor groups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnchorKey, &[Comment])> {
        self.entries
            .iter()
            .map(|(key, comments)| (key, comments.as_slice()))
    }
}
