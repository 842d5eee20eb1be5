//! Foundation types for estlint.
//!
//! This crate provides the small value types shared across the estlint stack.
//! Its only dependency is the optional `serde` feature.
//!
//! # Type Categories
//!
//! - **Position types**: [`OffsetRange`], [`Position`], [`Range`], [`LineIndex`]
//! - **Severity types**: [`Severity`]
//! - **Edit types**: [`Fix`]

mod edits;
mod position;
mod severity;

pub use edits::Fix;
pub use position::{LineIndex, OffsetRange, Position, Range};
pub use severity::{ParseSeverityError, Severity};
