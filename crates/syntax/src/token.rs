//! Tokens and comments produced by the lexer.

use estlint_types::OffsetRange;

/// Token type tags, named the way ESTree tooling names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Reserved word such as `function` or `return`
    Keyword,
    /// Identifier, including contextual words like `async`, `let` and `of`
    Identifier,
    /// Operator or delimiter
    Punctuator,
    /// String literal (value keeps its quotes)
    String,
    /// Numeric literal
    Numeric,
    /// `true` or `false`
    Boolean,
    /// `null`
    Null,
    /// One piece of a template literal, from its opening delimiter to the next
    /// `${` or closing backtick
    Template,
    /// Regular expression literal
    RegularExpression,
}

impl TokenKind {
    /// The ESTree name of this token type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "Keyword",
            Self::Identifier => "Identifier",
            Self::Punctuator => "Punctuator",
            Self::String => "String",
            Self::Numeric => "Numeric",
            Self::Boolean => "Boolean",
            Self::Null => "Null",
            Self::Template => "Template",
            Self::RegularExpression => "RegularExpression",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexical token with its source range and literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: OffsetRange,
    /// Exact source text of the token
    pub value: String,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, range: OffsetRange, value: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            value: value.into(),
        }
    }

    /// Returns `true` for a punctuator with exactly this text.
    #[must_use]
    pub fn is_punctuator(&self, value: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.value == value
    }

    /// Returns `true` for a keyword with exactly this text.
    #[must_use]
    pub fn is_keyword(&self, value: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == value
    }

    /// Returns `true` for an identifier token with exactly this text.
    #[must_use]
    pub fn is_identifier(&self, value: &str) -> bool {
        self.kind == TokenKind::Identifier && self.value == value
    }

    /// Returns `true` for any word-like token (identifier, keyword, boolean, null).
    #[must_use]
    pub const fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Boolean | TokenKind::Null
        )
    }
}

/// Comment flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
    /// `#!...` on the first line
    Shebang,
}

/// A comment with its source range. `value` excludes the delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub range: OffsetRange,
    pub value: String,
}

impl Comment {
    #[must_use]
    pub fn new(kind: CommentKind, range: OffsetRange, value: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            value: value.into(),
        }
    }
}
