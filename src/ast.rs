//! # JSONata Expression Tree
//!
//! This module defines the tree that the parser produces and the printer
//! consumes. The shape follows the tree the JSONata reference implementation
//! hands to its evaluator (after its optimisation pass), so a document printed
//! from this tree parses back into the same tree.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes, path steps and the structured dump
//! - **[operators]** - Binary operators and literal keywords
//!
//! ## Core Concepts
//!
//! ### Paths and stages
//!
//! A navigation such as `Account.Order[0].Product` is a single
//! [`ExprKind::Path`] with three [`Step`]s. The predicate `[0]` is a *stage*
//! attached to the `Order` step and is printed directly after it:
//!
//! ```text
//! Account.Order[0].Product
//! ```
//!
//! A trailing group clause (`Account.Order{ Product: Price }`) belongs to the
//! whole path and is printed like an object constructor.
//!
//! ### Positions
//!
//! Every [`Expr`] records the character offset it was parsed from. Positions
//! change whenever a document is reformatted, so structural comparisons skip
//! the `position` field of the dump.
//!
//! ### Unrecognised constructs
//!
//! Constructs the printer has no layout rule for (order-by clauses, transform
//! expressions) are carried as [`ExprKind::Other`] with their fields already
//! dumped, so formatting never fails just because the grammar grew.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, ExprKind, Step};
pub use operators::{BinOp, Literal};
pub use tokens::Token;
