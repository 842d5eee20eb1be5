//! Node selectors.
//!
//! A small subset of esquery, the selector language ESLint rules use to
//! pick the nodes they listen to:
//!
//! ```text
//! NewExpression[callee.name='Promise'][arguments.0.async=true]
//! CatchClause > BlockStatement
//! Property[method=false], MethodDefinition
//! ```
//!
//! Compiled selectors are plain predicate trees evaluated against a node and
//! its parent chain.

use crate::error::SelectorError;
use estlint_syntax::{FieldValue, Node, NodeId, NodeKind};

/// Tie-breaker used when ordering diagnostics: attribute count, then kind
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Specificity {
    pub attributes: u32,
    pub kinds: u32,
}

/// A compiled selector.
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
    specificity: Specificity,
    candidates: Option<Vec<NodeKind>>,
}

/// Compile a selector pattern.
pub fn compile(pattern: &str) -> Result<Selector, SelectorError> {
    Selector::parse(pattern)
}

impl Selector {
    pub fn parse(pattern: &str) -> Result<Self, SelectorError> {
        let alternatives = SelectorParser::new(pattern).parse()?;

        let specificity = alternatives
            .iter()
            .map(Complex::specificity)
            .max()
            .unwrap_or_default();

        let mut candidates = Some(Vec::new());
        for complex in &alternatives {
            match (complex.subject().kind, candidates.as_mut()) {
                (Some(kind), Some(kinds)) => {
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                _ => candidates = None,
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            alternatives,
            specificity,
            candidates,
        })
    }

    /// The pattern this selector was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Node kinds this selector can match, or `None` when it can match any
    /// kind.
    #[must_use]
    pub fn candidate_kinds(&self) -> Option<&[NodeKind]> {
        self.candidates.as_deref()
    }

    /// Cheap pre-filter on the node kind alone.
    #[must_use]
    pub fn may_match(&self, kind: NodeKind) -> bool {
        self.candidates
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&kind))
    }

    #[must_use]
    pub fn matches(&self, node: Node<'_>) -> bool {
        self.may_match(node.kind())
            && self
                .alternatives
                .iter()
                .any(|complex| complex.matches_at(complex.compounds.len() - 1, node))
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    /// `a > b`
    Child,
    /// `a b`
    Descendant,
}

/// Compound selectors joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Complex {
    /// The rightmost compound, which the event node itself must match.
    fn subject(&self) -> &Compound {
        &self.compounds[self.compounds.len() - 1]
    }

    fn specificity(&self) -> Specificity {
        self.compounds
            .iter()
            .fold(Specificity::default(), |acc, compound| Specificity {
                attributes: acc.attributes + compound.attributes.len() as u32,
                kinds: acc.kinds + u32::from(compound.kind.is_some()),
            })
    }

    fn matches_at(&self, index: usize, node: Node<'_>) -> bool {
        if !self.compounds[index].matches(node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => node
                .parent()
                .is_some_and(|parent| self.matches_at(index - 1, parent)),
            Combinator::Descendant => node
                .ancestors()
                .any(|ancestor| self.matches_at(index - 1, ancestor)),
        }
    }
}

#[derive(Debug, Clone)]
struct Compound {
    /// `None` for `*` or an attribute-only compound
    kind: Option<NodeKind>,
    attributes: Vec<Attribute>,
}

impl Compound {
    fn matches(&self, node: Node<'_>) -> bool {
        self.kind.is_none_or(|kind| node.is(kind))
            && self.attributes.iter().all(|attr| attr.matches(node))
    }
}

#[derive(Debug, Clone)]
struct Attribute {
    path: Vec<String>,
    test: AttributeTest,
}

#[derive(Debug, Clone)]
enum AttributeTest {
    /// `[path]`
    Present,
    /// `[path=value]`
    Equals(Literal),
    /// `[path!=value]`
    NotEquals(Literal),
}

#[derive(Debug, Clone)]
enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Regex(regex::Regex),
}

impl Literal {
    #[allow(clippy::float_cmp)]
    fn matches(&self, value: &Resolved<'_>) -> bool {
        match (self, value) {
            (Self::Str(expected), Resolved::Str(actual)) => expected.as_str() == *actual,
            (Self::Num(expected), Resolved::Num(actual)) => expected == actual,
            (Self::Bool(expected), Resolved::Bool(actual)) => expected == actual,
            (Self::Null, Resolved::Null) => true,
            (Self::Regex(regex), Resolved::Str(actual)) => regex.is_match(actual),
            _ => false,
        }
    }
}

impl Attribute {
    fn matches(&self, node: Node<'_>) -> bool {
        let Some(value) = resolve(node, &self.path) else {
            return false;
        };
        match &self.test {
            AttributeTest::Present => !matches!(value, Resolved::Null),
            AttributeTest::Equals(literal) => literal.matches(&value),
            AttributeTest::NotEquals(literal) => !literal.matches(&value),
        }
    }
}

/// A value reached by following an attribute path.
enum Resolved<'a> {
    Node(Node<'a>),
    List(&'a [Option<NodeId>]),
    Str(&'a str),
    Num(f64),
    Bool(bool),
    Null,
}

impl<'a> Resolved<'a> {
    fn from_field(node: Node<'a>, value: &'a FieldValue) -> Self {
        match value {
            FieldValue::Node(Some(id)) => Self::Node(node.ast().node(*id)),
            FieldValue::Node(None) | FieldValue::Null => Self::Null,
            FieldValue::Nodes(ids) => Self::List(ids),
            FieldValue::Str(s) => Self::Str(s),
            FieldValue::Bool(b) => Self::Bool(*b),
            FieldValue::Num(n) => Self::Num(*n),
        }
    }
}

/// Follow `path` from `node`. `None` when some segment does not exist.
fn resolve<'a>(node: Node<'a>, path: &[String]) -> Option<Resolved<'a>> {
    let mut current = Resolved::Node(node);
    for segment in path {
        current = match current {
            Resolved::Node(node) if segment == "type" => Resolved::Str(node.kind().as_str()),
            Resolved::Node(node) => Resolved::from_field(node, node.field(segment)?),
            Resolved::List(ids) if segment == "length" => {
                Resolved::Num(f64::from(u32::try_from(ids.len()).unwrap_or(u32::MAX)))
            }
            Resolved::List(ids) => {
                let index: usize = segment.parse().ok()?;
                match ids.get(index)? {
                    Some(id) => Resolved::Node(node.ast().node(*id)),
                    None => Resolved::Null,
                }
            }
            _ => return None,
        };
    }
    Some(current)
}

struct SelectorParser<'p> {
    pattern: &'p str,
    pos: usize,
}

impl<'p> SelectorParser<'p> {
    const fn new(pattern: &'p str) -> Self {
        Self { pattern, pos: 0 }
    }

    fn parse(mut self) -> Result<Vec<Complex>, SelectorError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.complex()?);
            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            if self.peek().is_none() {
                return Ok(alternatives);
            }
            return Err(self.unexpected());
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_whitespace = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_whitespace => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.unexpected()),
            }
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut kind = None;
        let mut has_head = false;

        if self.eat('*') {
            has_head = true;
        } else if self.peek().is_some_and(is_ident_start) {
            let name = self.ident();
            kind = Some(
                name.parse::<NodeKind>()
                    .map_err(|_| self.error_at(start, format!("unknown node type '{name}'")))?,
            );
            has_head = true;
        }

        let mut attributes = Vec::new();
        while self.peek() == Some('[') {
            attributes.push(self.attribute()?);
        }

        if self.peek() == Some(':') {
            return Err(self.error("pseudo-classes are not supported"));
        }
        if !has_head && attributes.is_empty() {
            return Err(self.error("expected a node type, '*' or '['"));
        }
        Ok(Compound { kind, attributes })
    }

    fn attribute(&mut self) -> Result<Attribute, SelectorError> {
        self.expect('[')?;
        self.skip_whitespace();

        let mut path = vec![self.path_segment()?];
        while self.eat('.') {
            path.push(self.path_segment()?);
        }
        self.skip_whitespace();

        let test = if self.eat(']') {
            return Ok(Attribute {
                path,
                test: AttributeTest::Present,
            });
        } else if self.pattern[self.pos..].starts_with("!=") {
            self.pos += 2;
            self.skip_whitespace();
            AttributeTest::NotEquals(self.literal()?)
        } else if self.eat('=') {
            self.skip_whitespace();
            AttributeTest::Equals(self.literal()?)
        } else {
            return Err(self.error("expected '=', '!=' or ']'"));
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(Attribute { path, test })
    }

    fn path_segment(&mut self) -> Result<String, SelectorError> {
        if self.peek().is_some_and(|c| is_ident_start(c) || c.is_ascii_digit()) {
            Ok(self.ident().to_string())
        } else {
            Err(self.error("expected an attribute name"))
        }
    }

    fn literal(&mut self) -> Result<Literal, SelectorError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => self.string(quote).map(Literal::Str),
            Some('/') => self.regex(),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => self.number(),
            Some(c) if is_ident_start(c) => Ok(match self.ident() {
                "true" => Literal::Bool(true),
                "false" => Literal::Bool(false),
                "null" => Literal::Null,
                word => Literal::Str(word.to_string()),
            }),
            _ => Err(self.error("expected a value")),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, SelectorError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                '\\' => {
                    let escaped = self
                        .peek()
                        .ok_or_else(|| self.error_at(start, "unterminated string"))?;
                    self.pos += escaped.len_utf8();
                    out.push(escaped);
                }
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(self.error_at(start, "unterminated string"))
    }

    fn regex(&mut self) -> Result<Literal, SelectorError> {
        let start = self.pos;
        self.pos += 1;
        let mut source = String::new();
        loop {
            let c = self
                .peek()
                .ok_or_else(|| self.error_at(start, "unterminated regular expression"))?;
            self.pos += c.len_utf8();
            match c {
                '/' => break,
                '\\' => {
                    source.push(c);
                    if let Some(next) = self.peek() {
                        self.pos += next.len_utf8();
                        source.push(next);
                    }
                }
                c => source.push(c),
            }
        }

        let mut builder = regex::RegexBuilder::new(&source);
        while let Some(flag) = self.peek().filter(char::is_ascii_alphabetic) {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'u' => builder.unicode(true),
                other => return Err(self.error(format!("unsupported regex flag '{other}'"))),
            };
            self.pos += 1;
        }

        builder
            .build()
            .map(Literal::Regex)
            .map_err(|err| self.error_at(start, format!("invalid regular expression: {err}")))
    }

    fn number(&mut self) -> Result<Literal, SelectorError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        let text = &self.pattern[start..self.pos];
        text.parse::<f64>()
            .map(Literal::Num)
            .map_err(|_| self.error_at(start, format!("invalid number '{text}'")))
    }

    fn ident(&mut self) -> &'p str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        &self.pattern[start..self.pos]
    }

    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SelectorError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    /// Returns whether any whitespace was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += self.peek().map_or(1, char::len_utf8);
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(c) => self.error(format!("unexpected '{c}'")),
            None => self.error("unexpected end of selector"),
        }
    }

    fn error(&self, message: impl Into<String>) -> SelectorError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> SelectorError {
        SelectorError {
            pattern: self.pattern.to_string(),
            offset,
            message: message.into(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use estlint_syntax::{parse, Ast, ParseOptions};

    fn ast(source: &str) -> Ast {
        parse(source, &ParseOptions::default()).unwrap().ast
    }

    /// `Kind@range` of every node the selector matches, in traversal order.
    fn matching(selector: &str, source: &str) -> Vec<String> {
        let selector = compile(selector).unwrap();
        let ast = ast(source);
        let mut out = Vec::new();
        ast.root().walk(|node| {
            if selector.matches(node) {
                out.push(format!("{node:?}"));
            }
            true
        });
        out
    }

    #[test]
    fn test_kind_selector() {
        assert_eq!(
            matching("Identifier", "a + b;"),
            vec!["Identifier@0..1", "Identifier@4..5"]
        );
    }

    #[test]
    fn test_attribute_string_and_boolean() {
        let selector = "NewExpression[callee.name='Promise'][arguments.0.async=true]";
        assert_eq!(
            matching(selector, "new Promise(async () => {}); new Promise(() => {}); new Foo(async () => {});"),
            vec!["NewExpression@0..27"]
        );
    }

    #[test]
    fn test_missing_path_is_non_match() {
        assert!(matching("NewExpression[arguments.0.async=true]", "new Promise;").is_empty());
        assert!(matching("NewExpression[arguments.0.async!=true]", "new Promise;").is_empty());
        assert!(matching("Identifier[callee.name='x']", "x;").is_empty());
    }

    #[test]
    fn test_presence_and_null() {
        assert_eq!(
            matching("VariableDeclarator[init]", "var a, b = 1;"),
            vec!["VariableDeclarator@7..12"]
        );
        assert_eq!(
            matching("VariableDeclarator[init=null]", "var a, b = 1;"),
            vec!["VariableDeclarator@4..5"]
        );
    }

    #[test]
    fn test_not_equals_and_bareword() {
        assert_eq!(
            matching("BinaryExpression[operator!='+']", "a + b; c - d;"),
            vec!["BinaryExpression@7..12"]
        );
        assert_eq!(
            matching("Property[kind=get]", "({ get a() {}, b: 1 });"),
            vec!["Property@3..13"]
        );
    }

    #[test]
    fn test_type_and_number_and_regex() {
        assert_eq!(
            matching("CallExpression[callee.type='MemberExpression']", "a.b(); c();"),
            vec!["CallExpression@0..5"]
        );
        assert_eq!(
            matching("Literal[value=2]", "1; 2; '2';"),
            vec!["Literal@3..4"]
        );
        assert_eq!(
            matching("Identifier[name=/^_/]", "_a; b; _c;"),
            vec!["Identifier@0..2", "Identifier@7..9"]
        );
        assert_eq!(
            matching("Identifier[name=/^A/i]", "abc; Bcd;"),
            vec!["Identifier@0..3"]
        );
    }

    #[test]
    fn test_list_length() {
        assert_eq!(
            matching("CallExpression[arguments.length=2]", "f(1); g(1, 2);"),
            vec!["CallExpression@6..13"]
        );
    }

    #[test]
    fn test_combinators() {
        let source = "try {} catch (e) { { x; } }";
        assert_eq!(
            matching("CatchClause > BlockStatement", source),
            vec!["BlockStatement@17..27"]
        );
        assert_eq!(
            matching("CatchClause BlockStatement", source),
            vec!["BlockStatement@17..27", "BlockStatement@19..25"]
        );
        assert_eq!(
            matching("CatchClause Identifier", source),
            vec!["Identifier@14..15", "Identifier@21..22"]
        );
    }

    #[test]
    fn test_alternatives_and_wildcard() {
        assert_eq!(
            matching("ReturnStatement, ThrowStatement", "function f() { if (a) return; throw b; }"),
            vec!["ReturnStatement@22..29", "ThrowStatement@30..38"]
        );
        assert_eq!(matching("*", "a;").len(), 3);
        assert_eq!(matching("[name='a']", "a; b;"), vec!["Identifier@0..1"]);
    }

    #[test]
    fn test_specificity_and_candidates() {
        let selector = compile("NewExpression[callee.name='Promise'][arguments.0.async=true]").unwrap();
        assert_eq!(
            selector.specificity(),
            Specificity {
                attributes: 2,
                kinds: 1
            }
        );
        assert_eq!(selector.candidate_kinds(), Some(&[NodeKind::NewExpression][..]));

        let selector = compile("CatchClause > BlockStatement, Identifier").unwrap();
        assert_eq!(
            selector.specificity(),
            Specificity {
                attributes: 0,
                kinds: 2
            }
        );
        assert_eq!(
            selector.candidate_kinds(),
            Some(&[NodeKind::BlockStatement, NodeKind::Identifier][..])
        );

        assert_eq!(compile("CatchClause *").unwrap().candidate_kinds(), None);
        assert_eq!(compile("[name]").unwrap().candidate_kinds(), None);
    }

    #[test]
    fn test_compile_errors() {
        let err = compile("Foo").unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(err.message, "unknown node type 'Foo'");

        let err = compile("Identifier[name").unwrap_err();
        assert_eq!(err.offset, 15);

        let err = compile("Identifier:not(Literal)").unwrap_err();
        assert_eq!(err.message, "pseudo-classes are not supported");

        let err = compile("Identifier[name='a]").unwrap_err();
        assert_eq!(err.message, "unterminated string");
        assert_eq!(err.offset, 16);

        assert!(compile("").is_err());
        assert!(compile("Identifier,").is_err());
        assert!(compile("Identifier >").is_err());
        assert!(compile("Identifier[name=/a/x]").is_err());
    }
}
