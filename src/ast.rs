//! # JMESPath - Abstract Syntax Tree
//!
//! This module defines the tokens and the syntax tree produced by the
//! [`Parser`](crate::parser::Parser).
//!
//! - **[tokens]** - Lexical tokens and their binding powers
//! - **[expressions]** - The [`Expression`] node set
//! - **[operators]** - Comparison operators
//!
//! ## Quick Start
//!
//! ```text
//! people[?age > `20`].name | sort(@)
//! ```
//!
//! parses to a pipe whose left side is a filter projection over `people` and
//! whose right side is a call to `sort`.
//!
//! ## Projections
//!
//! `[*]`, `*`, `[]`, `[?...]` and slices start a projection: everything to the
//! right of them, up to a pipe or a lower-precedence operator, is applied to
//! each element and `null` results are dropped.
//!
//! ```text
//! foo[*].bar.baz     Projection { left: foo, right: bar.baz }
//! foo[*].bar | [0]   Subexpression { left: Projection { .. }, right: [0], pipe: true }
//! ```
//!
//! ## Positions
//!
//! Every node carries the line and column of the token that introduced it.
//! Positions are diagnostics only: they take no part in equality.

pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expression, Node};
pub use operators::Comparator;
pub use tokens::Token;
