//! JavaScript lexer built on logos.
//!
//! Logos handles the regular part of the grammar. Three constructs need
//! context the generated automaton cannot carry, so the driver in
//! [`tokenize`] finishes them by hand:
//!
//! - template literals, whose `${ ... }` substitutions nest inside braces
//! - regular expression literals, which share their first character with
//!   the division operators
//! - a leading `#!` line

use crate::token::{Comment, CommentKind, Token, TokenKind};
use crate::ParseError;
use estlint_types::OffsetRange;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\x0B\x0C\u{A0}\u{1680}\u{2000}-\u{200A}\u{2028}\u{2029}\u{202F}\u{205F}\u{3000}\u{FEFF}]+")]
enum RawToken {
    #[regex(r"//[^\n\r\u{2028}\u{2029}]*")]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    #[regex(r"[a-zA-Z_$\u{AA}-\u{167F}\u{1681}-\u{1FFF}\u{200B}-\u{2027}\u{202A}-\u{202E}\u{2030}-\u{205E}\u{2060}-\u{2FFF}\u{3001}-\u{FEFE}\u{FF00}-\u{10FFFF}][a-zA-Z0-9_$\u{AA}-\u{167F}\u{1681}-\u{1FFF}\u{200B}-\u{2027}\u{202A}-\u{202E}\u{2030}-\u{205E}\u{2060}-\u{2FFF}\u{3001}-\u{FEFE}\u{FF00}-\u{10FFFF}]*")]
    Word,

    #[regex(r"0[xX][0-9a-fA-F](_?[0-9a-fA-F])*n?")]
    #[regex(r"0[oO][0-7](_?[0-7])*n?")]
    #[regex(r"0[bB][01](_?[01])*n?")]
    #[regex(r"[0-9](_?[0-9])*(\.([0-9](_?[0-9])*)?)?([eE][+-]?[0-9](_?[0-9])*)?n?")]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?")]
    Number,

    #[regex(r#""([^"\\\n\r]|\\[^\r]|\\\r\n?)*""#)]
    #[regex(r"'([^'\\\n\r]|\\[^\r]|\\\r\n?)*'")]
    String,

    #[token("`")]
    Backtick,

    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    #[token("/")]
    #[token("/=")]
    Slash,

    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token(";")]
    #[token(",")]
    #[token("<")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token("===")]
    #[token("!==")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("%")]
    #[token("**")]
    #[token("++")]
    #[token("--")]
    #[token("<<")]
    #[token(">>")]
    #[token(">>>")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("!")]
    #[token("~")]
    #[token("&&")]
    #[token("||")]
    #[token("??")]
    #[token("?")]
    #[token("?.")]
    #[token(":")]
    #[token("=")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("%=")]
    #[token("**=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token(">>>=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("&&=")]
    #[token("||=")]
    #[token("??=")]
    #[token("=>")]
    #[token(".")]
    #[token("...")]
    Punct,
}

fn lex_block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    let remainder = lex.remainder();
    if let Some(end) = remainder.find("*/") {
        lex.bump(end + 2);
        true
    } else {
        lex.bump(remainder.len());
        false
    }
}

/// Reserved words reported as `Keyword` tokens.
const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "export",
    "extends",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "new",
    "return",
    "super",
    "switch",
    "this",
    "throw",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
];

/// Keywords after which a `/` starts a regular expression.
const REGEX_AFTER_KEYWORDS: &[&str] = &[
    "case",
    "delete",
    "do",
    "else",
    "in",
    "instanceof",
    "new",
    "return",
    "throw",
    "typeof",
    "void",
];

/// Returns `true` if `word` is a reserved word.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn classify_word(word: &str) -> TokenKind {
    match word {
        "true" | "false" => TokenKind::Boolean,
        "null" => TokenKind::Null,
        w if is_keyword(w) => TokenKind::Keyword,
        _ => TokenKind::Identifier,
    }
}

/// Tokens and comments of one source text, each list ordered by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

/// What an open `{` belongs to, so the matching `}` can resume a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    Template,
}

/// Split `source` into tokens and comments.
pub fn tokenize(source: &str) -> Result<Lexed, ParseError> {
    let mut out = Lexed::default();
    let mut braces: Vec<Brace> = Vec::new();

    let start = if source.starts_with("#!") {
        let end = source
            .find(['\n', '\r', '\u{2028}', '\u{2029}'])
            .unwrap_or(source.len());
        out.comments.push(Comment::new(
            CommentKind::Shebang,
            OffsetRange::new(0, end),
            &source[2..end],
        ));
        end
    } else {
        0
    };

    let mut lexer = RawToken::lexer(&source[start..]);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let range = OffsetRange::new(start + span.start, start + span.end);
        let Ok(raw) = result else {
            return Err(lex_error(source, range.start));
        };

        match raw {
            RawToken::LineComment => {
                out.comments.push(Comment::new(
                    CommentKind::Line,
                    range,
                    &source[range.start + 2..range.end],
                ));
            }
            RawToken::BlockComment => {
                out.comments.push(Comment::new(
                    CommentKind::Block,
                    range,
                    &source[range.start + 2..range.end - 2],
                ));
            }
            RawToken::Word => {
                let word = &source[range.start..range.end];
                out.tokens.push(Token::new(classify_word(word), range, word));
            }
            RawToken::Number => push_token(&mut out, source, TokenKind::Numeric, range),
            RawToken::String => push_token(&mut out, source, TokenKind::String, range),
            RawToken::Backtick => {
                let (len, opens) = scan_template(lexer.remainder())
                    .ok_or_else(|| ParseError::new("Unterminated template", range.start))?;
                lexer.bump(len);
                if opens {
                    braces.push(Brace::Template);
                }
                let range = OffsetRange::new(range.start, range.end + len);
                push_token(&mut out, source, TokenKind::Template, range);
            }
            RawToken::OpenBrace => {
                braces.push(Brace::Block);
                push_token(&mut out, source, TokenKind::Punctuator, range);
            }
            RawToken::CloseBrace => {
                if braces.pop() == Some(Brace::Template) {
                    let (len, opens) = scan_template(lexer.remainder())
                        .ok_or_else(|| ParseError::new("Unterminated template", range.start))?;
                    lexer.bump(len);
                    if opens {
                        braces.push(Brace::Template);
                    }
                    let range = OffsetRange::new(range.start, range.end + len);
                    push_token(&mut out, source, TokenKind::Template, range);
                } else {
                    push_token(&mut out, source, TokenKind::Punctuator, range);
                }
            }
            RawToken::Slash => {
                if regex_allowed(out.tokens.last()) {
                    let end = scan_regex(source, range.start).ok_or_else(|| {
                        ParseError::new("Invalid regular expression: missing /", range.start)
                    })?;
                    lexer.bump(end - range.end);
                    let range = OffsetRange::new(range.start, end);
                    push_token(&mut out, source, TokenKind::RegularExpression, range);
                } else {
                    push_token(&mut out, source, TokenKind::Punctuator, range);
                }
            }
            RawToken::Punct => push_token(&mut out, source, TokenKind::Punctuator, range),
        }
    }

    tracing::trace!(
        tokens = out.tokens.len(),
        comments = out.comments.len(),
        "tokenized source"
    );
    Ok(out)
}

fn push_token(out: &mut Lexed, source: &str, kind: TokenKind, range: OffsetRange) {
    out.tokens
        .push(Token::new(kind, range, &source[range.start..range.end]));
}

fn lex_error(source: &str, offset: usize) -> ParseError {
    let rest = &source[offset..];
    if rest.starts_with("/*") {
        ParseError::new("Unterminated comment", offset)
    } else if rest.starts_with(['"', '\'']) {
        ParseError::new("Unterminated string constant", offset)
    } else {
        match rest.chars().next() {
            Some(c) => ParseError::new(format!("Unexpected character '{c}'"), offset),
            None => ParseError::new("Unexpected end of input", offset),
        }
    }
}

/// Scan the body of a template piece that starts right after a backtick or
/// the `}` closing a substitution. Returns the consumed length and whether
/// the piece ends by opening a `${` substitution.
fn scan_template(rest: &str) -> Option<(usize, bool)> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some((i + 1, false)),
            b'$' if bytes.get(i + 1) == Some(&b'{') => return Some((i + 2, true)),
            _ => i += 1,
        }
    }
    None
}

/// Decide whether a `/` following `previous` starts a regular expression.
fn regex_allowed(previous: Option<&Token>) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    match previous.kind {
        TokenKind::Identifier
        | TokenKind::Numeric
        | TokenKind::String
        | TokenKind::Boolean
        | TokenKind::Null
        | TokenKind::RegularExpression => false,
        TokenKind::Template => !previous.value.ends_with('`'),
        TokenKind::Keyword => REGEX_AFTER_KEYWORDS.contains(&previous.value.as_str()),
        TokenKind::Punctuator => !matches!(previous.value.as_str(), ")" | "]" | "}"),
    }
}

/// Find the end offset (exclusive, flags included) of a regular expression
/// literal starting at `start`.
fn scan_regex(source: &str, start: usize) -> Option<usize> {
    let mut in_class = false;
    let mut chars = source[start + 1..].char_indices();
    let body_end = loop {
        let (i, c) = chars.next()?;
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                if matches!(escaped, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                    return None;
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => break start + 1 + i + 1,
            '\n' | '\r' | '\u{2028}' | '\u{2029}' => return None,
            _ => {}
        }
    };
    let flags = source[body_end..]
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(source.len() - body_end, |(i, _)| i);
    Some(body_end + flags)
}

/// Decode the escape sequences of a string literal or template body.
///
/// Unknown escapes yield the escaped character itself; lone surrogates
/// become U+FFFD.
#[must_use]
pub fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{C}'),
            Some('v') => result.push('\u{B}'),
            Some('0') if !chars.peek().is_some_and(char::is_ascii_digit) => result.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_unit(&mut result, &mut chars, u32::from_str_radix(&hex, 16).ok());
            }
            Some('u') => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    u32::from_str_radix(&hex, 16).ok()
                };
                push_code_unit(&mut result, &mut chars, code);
            }
            // line continuation
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n' | '\u{2028}' | '\u{2029}') => {}
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}

/// Push a decoded code unit, pairing a high surrogate with a following
/// `\uXXXX` low surrogate.
fn push_code_unit(
    result: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    code: Option<u32>,
) {
    let Some(code) = code else {
        result.push('\u{FFFD}');
        return;
    };
    if (0xD800..0xDC00).contains(&code) {
        let mut lookahead = chars.clone();
        if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
            let hex: String = lookahead.by_ref().take(4).collect();
            if let Ok(low) = u32::from_str_radix(&hex, 16) {
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    *chars = lookahead;
                    result.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
                    return;
                }
            }
        }
    }
    result.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
}

/// Numeric value of a numeric literal token.
#[must_use]
pub fn parse_number(raw: &str) -> f64 {
    let digits: String = raw
        .trim_end_matches('n')
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let radix = match digits.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return digits.parse().unwrap_or(f64::NAN),
    };
    digits[2..].chars().fold(0.0, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    })
}
