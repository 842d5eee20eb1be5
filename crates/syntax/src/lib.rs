//! # JavaScript Syntax
//!
//! Tokens, comments and an ESTree-shaped syntax tree for JavaScript
//! source, produced by a logos lexer and a recursive-descent parser.
//!
//! The linter consumes parsing through the [`SourceParser`] trait, so the
//! built-in [`JsParser`] can be swapped for another implementation that
//! produces the same [`Parsed`] shape.
//!
//! ```rust,ignore
//! let parsed = estlint_syntax::parse("new Promise(async () => {})", &ParseOptions::default())?;
//! let program = parsed.ast.root();
//! assert_eq!(program.kind(), NodeKind::Program);
//! ```
//!
//! ## Supported language
//!
//! Scripts up to ES2020 expressions and statements, gated by
//! [`ParseOptions::ecma_version`]. Modules, class fields and JSX are not
//! parsed.

mod ast;
mod lexer;
mod parser;
mod token;

pub use ast::{Ast, FieldValue, Node, NodeData, NodeId, NodeKind, UnknownNodeKind};
pub use lexer::{is_keyword, tokenize, unescape, Lexed};
pub use parser::MAX_PARSE_DEPTH;
pub use token::{Comment, CommentKind, Token, TokenKind};

use estlint_types::OffsetRange;
use serde::{Deserialize, Deserializer, Serialize};

/// A parse error with position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Byte offset where the error occurred
    pub offset: usize,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.offset)
    }
}

impl std::error::Error for ParseError {}

/// Newest language edition the parser understands.
pub const LATEST_ECMA_VERSION: u16 = 2024;

/// Parser configuration.
///
/// `ecmaVersion` accepts an edition year (`2015`), its short alias (`6`),
/// the legacy editions `3` and `5`, or the string `"latest"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    #[serde(default = "latest", deserialize_with = "deserialize_ecma_version")]
    pub ecma_version: u16,
}

fn latest() -> u16 {
    LATEST_ECMA_VERSION
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ecma_version: LATEST_ECMA_VERSION,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub const fn new(ecma_version: u16) -> Self {
        Self { ecma_version }
    }

    /// The edition as a year; `3` and `5` stay as they are since those
    /// editions predate yearly naming.
    #[must_use]
    pub const fn year(&self) -> u16 {
        match self.ecma_version {
            v @ 6..=15 => 2009 + v,
            v => v,
        }
    }
}

fn deserialize_ecma_version<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Number(u16),
        Name(String),
    }

    match Version::deserialize(deserializer)? {
        Version::Number(v) if v == 3 || v == 5 || (6..=15).contains(&v) => Ok(v),
        Version::Number(v) if (2015..=LATEST_ECMA_VERSION).contains(&v) => Ok(v),
        Version::Number(v) => Err(serde::de::Error::custom(format!(
            "unsupported ecmaVersion {v}"
        ))),
        Version::Name(name) if name == "latest" => Ok(LATEST_ECMA_VERSION),
        Version::Name(name) => Err(serde::de::Error::custom(format!(
            "unsupported ecmaVersion \"{name}\""
        ))),
    }
}

/// Everything a parse produces for one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub ast: Ast,
    /// Tokens in source order, comments excluded
    pub tokens: Vec<Token>,
    /// Comments in source order
    pub comments: Vec<Comment>,
}

/// Source-to-tree parser used by the linter.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &str, options: &ParseOptions) -> Result<Parsed, ParseError>;
}

/// The built-in JavaScript parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsParser;

impl SourceParser for JsParser {
    fn parse(&self, source: &str, options: &ParseOptions) -> Result<Parsed, ParseError> {
        parse(source, options)
    }
}

/// Parse `source` as a script.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Parsed, ParseError> {
    let Lexed { tokens, comments } = tokenize(source)?;
    let ast = parser::parse_program(source, tokens.clone(), options.year())?;
    Ok(Parsed {
        ast,
        tokens,
        comments,
    })
}

/// Anything with a byte range in the source: nodes, tokens, comments and
/// raw ranges.
pub trait Spanned {
    fn span(&self) -> OffsetRange;
}

impl Spanned for OffsetRange {
    fn span(&self) -> OffsetRange {
        *self
    }
}

impl Spanned for Token {
    fn span(&self) -> OffsetRange {
        self.range
    }
}

impl Spanned for Comment {
    fn span(&self) -> OffsetRange {
        self.range
    }
}

impl Spanned for Node<'_> {
    fn span(&self) -> OffsetRange {
        self.range()
    }
}

impl<T: Spanned + ?Sized> Spanned for &T {
    fn span(&self) -> OffsetRange {
        (**self).span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("Unexpected token )", 12);
        assert_eq!(err.to_string(), "Unexpected token ) (at offset 12)");
    }

    #[test]
    fn test_parse_options_year_aliases() {
        assert_eq!(ParseOptions::new(6).year(), 2015);
        assert_eq!(ParseOptions::new(9).year(), 2018);
        assert_eq!(ParseOptions::new(2018).year(), 2018);
        assert_eq!(ParseOptions::new(5).year(), 5);
    }

    #[test]
    fn test_parse_options_deserialize() {
        let options: ParseOptions = serde_json::from_str(r#"{"ecmaVersion": 2018}"#).unwrap();
        assert_eq!(options.ecma_version, 2018);

        let options: ParseOptions = serde_json::from_str(r#"{"ecmaVersion": "latest"}"#).unwrap();
        assert_eq!(options.ecma_version, LATEST_ECMA_VERSION);

        let options: ParseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ParseOptions::default());

        assert!(serde_json::from_str::<ParseOptions>(r#"{"ecmaVersion": 4}"#).is_err());
    }

    #[test]
    fn test_spanned_is_uniform() {
        let parsed = parse("a;", &ParseOptions::default()).unwrap();
        let statement = parsed.ast.root().children("body")[0];
        assert_eq!(statement.span(), OffsetRange::new(0, 2));
        assert_eq!(parsed.tokens[0].span(), OffsetRange::new(0, 1));
        assert_eq!((&OffsetRange::new(1, 2)).span(), OffsetRange::new(1, 2));
    }
}
