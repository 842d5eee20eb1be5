//! Recursive-descent parser producing the ESTree-shaped [`Ast`].
//!
//! The parser works over the token list from [`crate::lexer`]. Comments
//! never reach it. Statement parsing lives in `stmt`, expressions in
//! `expr`, and destructuring targets in `pattern`.

mod expr;
mod pattern;
mod stmt;

use crate::ast::{Ast, AstBuilder, FieldValue, NodeId, NodeKind};
use crate::token::{Token, TokenKind};
use crate::ParseError;
use estlint_types::OffsetRange;

/// Maximum nesting of statements and expressions before the parser gives up.
///
/// Each level costs several stack frames, so this stays well below what a
/// debug build can recurse through on a test thread.
pub const MAX_PARSE_DEPTH: usize = 64;

type PResult<T> = Result<T, ParseError>;

/// Function context flags, saved and restored around function bodies.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_function: bool,
    in_async: bool,
    in_generator: bool,
}

pub(crate) struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    ast: AstBuilder,
    year: u16,
    depth: usize,
    ctx: Context,
    /// `in` is not a binary operator while parsing a `for` head
    no_in: bool,
    /// Offsets of `{ a = 1 }` shorthand defaults not yet turned into patterns
    cover_inits: Vec<usize>,
}

/// Parse `source` into an [`Ast`] using its pre-lexed `tokens`.
pub(crate) fn parse_program(source: &str, tokens: Vec<Token>, year: u16) -> PResult<Ast> {
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        ast: AstBuilder::default(),
        year,
        depth: 0,
        ctx: Context::default(),
        no_in: false,
        cover_inits: Vec::new(),
    };
    parser.program()
}

pub(crate) fn node(id: NodeId) -> FieldValue {
    FieldValue::Node(Some(id))
}

pub(crate) fn opt(id: Option<NodeId>) -> FieldValue {
    FieldValue::Node(id)
}

pub(crate) fn list(ids: Vec<NodeId>) -> FieldValue {
    FieldValue::Nodes(ids.into_iter().map(Some).collect())
}

pub(crate) fn text(value: impl Into<String>) -> FieldValue {
    FieldValue::Str(value.into())
}

pub(crate) fn flag(value: bool) -> FieldValue {
    FieldValue::Bool(value)
}

impl Parser<'_> {
    fn program(&mut self) -> PResult<Ast> {
        let mut body = Vec::new();
        while !self.is_eof() {
            body.push(self.statement()?);
            if let Some(offset) = self.cover_inits.first() {
                return Err(ParseError::new("Invalid shorthand property initializer", *offset));
            }
        }
        let root = self.ast.push(
            NodeKind::Program,
            OffsetRange::new(0, self.source.len()),
            vec![("body", list(body)), ("sourceType", text("script"))],
        );
        let ast = std::mem::take(&mut self.ast).finish(root);
        tracing::trace!(nodes = ast.len(), "parsed program");
        Ok(ast)
    }

    // ---------------------------------------------------------------
    // Token access
    // ---------------------------------------------------------------

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    /// Text of the current token, empty at end of input.
    fn value(&self) -> &str {
        self.current().map_or("", |t| t.value.as_str())
    }

    /// Returns `true` if the current token is a word or punctuator with this
    /// exact text.
    fn at(&self, value: &str) -> bool {
        self.current().is_some_and(|t| {
            !matches!(
                t.kind,
                TokenKind::String | TokenKind::Template | TokenKind::RegularExpression
            ) && t.value == value
        })
    }

    fn peek_is(&self, n: usize, value: &str) -> bool {
        self.peek(n).is_some_and(|t| {
            !matches!(
                t.kind,
                TokenKind::String | TokenKind::Template | TokenKind::RegularExpression
            ) && t.value == value
        })
    }

    fn at_identifier(&self) -> bool {
        self.kind() == Some(TokenKind::Identifier)
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, value: &str) -> bool {
        if self.at(value) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, value: &str) -> PResult<()> {
        if self.eat(value) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Start offset of the current token.
    fn start(&self) -> usize {
        self.current().map_or(self.source.len(), |t| t.range.start)
    }

    /// End offset of the previously consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.range.end)
    }

    /// Returns `true` if a line terminator separates the current token from
    /// the previous one.
    fn newline_before(&self) -> bool {
        if self.pos == 0 {
            return false;
        }
        let gap = &self.source[self.prev_end()..self.start()];
        gap.contains(['\n', '\r', '\u{2028}', '\u{2029}'])
    }

    /// Returns `true` if a line terminator separates token `n` ahead from
    /// the one before it.
    fn newline_before_peek(&self, n: usize) -> bool {
        if n == 0 {
            return self.newline_before();
        }
        match (self.peek(n - 1), self.peek(n)) {
            (Some(a), Some(b)) => self.source[a.range.end..b.range.start]
                .contains(['\n', '\r', '\u{2028}', '\u{2029}']),
            _ => false,
        }
    }

    /// Consume a statement-ending `;`, applying automatic semicolon
    /// insertion.
    fn semicolon(&mut self) -> PResult<()> {
        if self.eat(";") || self.at("}") || self.is_eof() || self.newline_before() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.current() {
            Some(token) => ParseError::new(
                format!("Unexpected token {}", token.value),
                token.range.start,
            ),
            None => ParseError::new("Unexpected end of input", self.source.len()),
        }
    }

    /// Fail unless the configured ecmaVersion is at least `year`.
    fn require(&self, feature: &str, year: u16, offset: usize) -> PResult<()> {
        if self.year >= year {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("{feature} requires ecmaVersion {year} or later"),
                offset,
            ))
        }
    }

    // ---------------------------------------------------------------
    // Node construction
    // ---------------------------------------------------------------

    /// Push a node spanning `start` to the end of the last consumed token.
    fn finish(
        &mut self,
        kind: NodeKind,
        start: usize,
        fields: Vec<(&'static str, FieldValue)>,
    ) -> NodeId {
        let end = self.prev_end().max(start);
        self.ast.push(kind, OffsetRange::new(start, end), fields)
    }

    fn push_at(
        &mut self,
        kind: NodeKind,
        range: OffsetRange,
        fields: Vec<(&'static str, FieldValue)>,
    ) -> NodeId {
        self.ast.push(kind, range, fields)
    }

    fn range_of(&self, id: NodeId) -> OffsetRange {
        self.ast.get(id).range
    }

    fn kind_of(&self, id: NodeId) -> NodeKind {
        self.ast.get(id).kind
    }

    /// Consume the current token as an `Identifier` node.
    fn identifier(&mut self) -> PResult<NodeId> {
        match self.current() {
            Some(token) if token.kind == TokenKind::Identifier => {
                let (range, name) = (token.range, token.value.clone());
                self.bump();
                Ok(self.push_at(NodeKind::Identifier, range, vec![("name", text(name))]))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Consume any word token (keywords included) as an `Identifier`, as
    /// property names allow.
    fn identifier_name(&mut self) -> PResult<NodeId> {
        match self.current() {
            Some(token) if token.is_word() => {
                let (range, name) = (token.range, token.value.clone());
                self.bump();
                Ok(self.push_at(NodeKind::Identifier, range, vec![("name", text(name))]))
            }
            _ => Err(self.unexpected()),
        }
    }

    // ---------------------------------------------------------------
    // Guards
    // ---------------------------------------------------------------

    /// Run `f` one nesting level deeper, failing past [`MAX_PARSE_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(ParseError::new(
                format!("Nesting exceeds maximum depth of {MAX_PARSE_DEPTH}"),
                self.start(),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Run `f` with `in` treated as a binary operator again.
    fn allow_in<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    /// Run `f` inside a function body with the given flags.
    fn in_function<T>(
        &mut self,
        is_async: bool,
        generator: bool,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let saved = std::mem::replace(
            &mut self.ctx,
            Context {
                in_function: true,
                in_async: is_async,
                in_generator: generator,
            },
        );
        let saved_in = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.ctx = saved;
        self.no_in = saved_in;
        result
    }
}
