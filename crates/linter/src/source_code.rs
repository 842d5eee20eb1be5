//! Read-only view of one parsed source snapshot.
//!
//! Token queries take anything [`Spanned`], so rules can ask for the tokens
//! of a node, a token or a raw range the same way.

use estlint_syntax::{Ast, Comment, Node, Parsed, Spanned, Token};
use estlint_types::{LineIndex, OffsetRange, Position, Range};

/// Text, tokens and comments of the source being linted.
#[derive(Debug)]
pub struct SourceCode<'a> {
    text: &'a str,
    parsed: &'a Parsed,
    lines: LineIndex,
}

#[allow(clippy::needless_pass_by_value)]
impl<'a> SourceCode<'a> {
    #[must_use]
    pub fn new(text: &'a str, parsed: &'a Parsed) -> Self {
        Self {
            text,
            parsed,
            lines: LineIndex::new(text),
        }
    }

    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    #[must_use]
    pub fn ast(&self) -> &'a Ast {
        &self.parsed.ast
    }

    #[must_use]
    pub fn root(&self) -> Node<'a> {
        self.parsed.ast.root()
    }

    /// Source text covered by `span`; empty when the span is out of bounds.
    #[must_use]
    pub fn text_of(&self, span: impl Spanned) -> &'a str {
        let range = span.span();
        self.text.get(range.start..range.end).unwrap_or_default()
    }

    #[must_use]
    pub fn tokens(&self) -> &'a [Token] {
        &self.parsed.tokens
    }

    #[must_use]
    pub fn comments(&self) -> &'a [Comment] {
        &self.parsed.comments
    }

    /// Tokens lying entirely inside `span`.
    #[must_use]
    pub fn tokens_of(&self, span: impl Spanned) -> &'a [Token] {
        let range = span.span();
        let tokens = self.tokens();
        let start = tokens.partition_point(|t| t.range.start < range.start);
        let end = tokens.partition_point(|t| t.range.end <= range.end);
        tokens.get(start..end.max(start)).unwrap_or_default()
    }

    #[must_use]
    pub fn first_token(&self, span: impl Spanned) -> Option<&'a Token> {
        self.tokens_of(span).first()
    }

    /// First token inside `span` satisfying `predicate`.
    #[must_use]
    pub fn first_token_by(
        &self,
        span: impl Spanned,
        predicate: impl Fn(&Token) -> bool,
    ) -> Option<&'a Token> {
        self.tokens_of(span).iter().find(|t| predicate(t))
    }

    /// The token `skip` places after the first one inside `span`.
    #[must_use]
    pub fn first_token_skip(&self, span: impl Spanned, skip: usize) -> Option<&'a Token> {
        self.tokens_of(span).get(skip)
    }

    #[must_use]
    pub fn last_token(&self, span: impl Spanned) -> Option<&'a Token> {
        self.tokens_of(span).last()
    }

    /// The token ending at or before the start of `span`.
    #[must_use]
    pub fn token_before(&self, span: impl Spanned) -> Option<&'a Token> {
        self.token_before_by(span, |_| true)
    }

    #[must_use]
    pub fn token_before_by(
        &self,
        span: impl Spanned,
        predicate: impl Fn(&Token) -> bool,
    ) -> Option<&'a Token> {
        let start = span.span().start;
        let tokens = self.tokens();
        let end = tokens.partition_point(|t| t.range.end <= start);
        tokens[..end].iter().rev().find(|t| predicate(t))
    }

    /// The token starting at or after the end of `span`.
    #[must_use]
    pub fn token_after(&self, span: impl Spanned) -> Option<&'a Token> {
        self.token_after_by(span, |_| true)
    }

    #[must_use]
    pub fn token_after_by(
        &self,
        span: impl Spanned,
        predicate: impl Fn(&Token) -> bool,
    ) -> Option<&'a Token> {
        let end = span.span().end;
        let tokens = self.tokens();
        let start = tokens.partition_point(|t| t.range.start < end);
        tokens[start..].iter().find(|t| predicate(t))
    }

    /// Tokens between the end of `left` and the start of `right`.
    #[must_use]
    pub fn tokens_between(&self, left: impl Spanned, right: impl Spanned) -> &'a [Token] {
        self.tokens_of(OffsetRange::new(left.span().end, right.span().start))
    }

    #[must_use]
    pub fn first_token_between_by(
        &self,
        left: impl Spanned,
        right: impl Spanned,
        predicate: impl Fn(&Token) -> bool,
    ) -> Option<&'a Token> {
        self.tokens_between(left, right).iter().find(|t| predicate(t))
    }

    /// Comments lying entirely inside `span`.
    #[must_use]
    pub fn comments_inside(&self, span: impl Spanned) -> &'a [Comment] {
        let range = span.span();
        let comments = self.comments();
        let start = comments.partition_point(|c| c.range.start < range.start);
        let end = comments.partition_point(|c| c.range.end <= range.end);
        comments.get(start..end.max(start)).unwrap_or_default()
    }

    /// Whether any comment sits between the end of `left` and the start of
    /// `right`.
    #[must_use]
    pub fn comments_exist_between(&self, left: impl Spanned, right: impl Spanned) -> bool {
        !self
            .comments_inside(OffsetRange::new(left.span().end, right.span().start))
            .is_empty()
    }

    /// 1-based line and UTF-16 column of a byte offset.
    #[must_use]
    pub fn location(&self, offset: usize) -> Position {
        self.lines.position(self.text, offset)
    }

    #[must_use]
    pub fn range_of(&self, span: impl Spanned) -> Range {
        self.lines.range(self.text, span.span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estlint_syntax::{parse, NodeKind, ParseOptions};

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_token_queries() {
        let text = "foo(a, /* c */ b);";
        let parsed = parse(text, &ParseOptions::default()).unwrap();
        let source = SourceCode::new(text, &parsed);
        let call = source.root().children("body")[0].child("expression").unwrap();
        assert!(call.is(NodeKind::CallExpression));

        assert_eq!(values(source.tokens_of(call)), ["foo", "(", "a", ",", "b", ")"]);
        assert_eq!(source.first_token(call).unwrap().value, "foo");
        assert_eq!(source.first_token_skip(call, 1).unwrap().value, "(");
        assert_eq!(source.last_token(call).unwrap().value, ")");
        assert_eq!(
            source
                .first_token_by(call, |t| t.is_punctuator(","))
                .unwrap()
                .range,
            OffsetRange::new(5, 6)
        );

        let args = call.children("arguments");
        assert_eq!(values(source.tokens_between(args[0], args[1])), [","]);
        assert!(source.comments_exist_between(args[0], args[1]));
        assert!(!source.comments_exist_between(call, args[1]));
        assert_eq!(source.comments_inside(call).len(), 1);

        assert_eq!(source.token_before(args[0]).unwrap().value, "(");
        assert_eq!(source.token_after(args[1]).unwrap().value, ")");
        assert_eq!(source.token_after(call).unwrap().value, ";");
        assert!(source.token_before(call).is_none());
        assert_eq!(
            source
                .token_before_by(args[1], |t| t.is_identifier("foo"))
                .unwrap()
                .range,
            OffsetRange::new(0, 3)
        );
        assert_eq!(
            source
                .first_token_between_by(args[0], call, |t| t.is_punctuator(")"))
                .map(|t| t.range),
            None
        );
    }

    #[test]
    fn test_text_and_locations() {
        let text = "let a = 1;\nlet é = '𝒳';";
        let parsed = parse(text, &ParseOptions::default()).unwrap();
        let source = SourceCode::new(text, &parsed);
        let second = source.root().children("body")[1];

        assert_eq!(source.text_of(second), "let é = '𝒳';");
        assert_eq!(source.text_of(OffsetRange::new(100, 200)), "");
        assert_eq!(source.location(second.range().start), Position::new(2, 1));
        assert_eq!(
            source.range_of(second),
            Range::new(Position::new(2, 1), Position::new(2, 14))
        );
    }
}
