//! Expressions.

use super::stmt::FunctionKind;
use super::{flag, list, node, opt, text, PResult, Parser};
use crate::ast::{FieldValue, NodeId, NodeKind};
use crate::lexer::{parse_number, unescape};
use crate::token::TokenKind;
use crate::ParseError;
use estlint_types::OffsetRange;

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=",
    "||=", "??=",
];

/// Binding power of a binary operator.
fn binary_precedence(op: &str) -> Option<u8> {
    let precedence = match op {
        "??" => 1,
        "||" => 2,
        "&&" => 3,
        "|" => 4,
        "^" => 5,
        "&" => 6,
        "==" | "!=" | "===" | "!==" => 7,
        "<" | ">" | "<=" | ">=" | "in" | "instanceof" => 8,
        "<<" | ">>" | ">>>" => 9,
        "+" | "-" => 10,
        "*" | "/" | "%" => 11,
        "**" => 12,
        _ => return None,
    };
    Some(precedence)
}

impl Parser<'_> {
    /// Comma-separated expression list.
    pub(super) fn expression(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let first = self.assignment()?;
        if !self.at(",") {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(",") {
            expressions.push(self.assignment()?);
        }
        Ok(self.finish(
            NodeKind::SequenceExpression,
            start,
            vec![("expressions", list(expressions))],
        ))
    }

    pub(super) fn assignment(&mut self) -> PResult<NodeId> {
        self.nested(Self::assignment_inner)
    }

    fn assignment_inner(&mut self) -> PResult<NodeId> {
        if self.ctx.in_generator && self.at("yield") {
            return self.yield_expression();
        }
        if let Some(is_async) = self.arrow_ahead() {
            return self.arrow_function(is_async);
        }

        let start = self.start();
        let left = self.conditional()?;
        let Some(op) = self
            .current()
            .filter(|t| t.kind == TokenKind::Punctuator)
            .map(|t| t.value.clone())
            .filter(|v| ASSIGNMENT_OPERATORS.contains(&v.as_str()))
        else {
            return Ok(left);
        };

        match op.as_str() {
            "=" => {
                self.to_assignment_target(left)?;
            }
            "**=" => {
                self.require("exponentiation", 2016, self.start())?;
                self.check_simple_target(left)?;
            }
            "&&=" | "||=" | "??=" => {
                self.require("logical assignment", 2021, self.start())?;
                self.check_simple_target(left)?;
            }
            _ => self.check_simple_target(left)?,
        }
        self.bump();
        let right = self.assignment()?;
        Ok(self.finish(
            NodeKind::AssignmentExpression,
            start,
            vec![
                ("operator", text(op)),
                ("left", node(left)),
                ("right", node(right)),
            ],
        ))
    }

    /// Detect an arrow function at the current position. Returns whether it
    /// is `async`.
    fn arrow_ahead(&self) -> Option<bool> {
        let (is_async, offset) = if self.at("async")
            && !self.newline_before_peek(1)
            && (self.peek(1).is_some_and(|t| t.kind == TokenKind::Identifier)
                || self.peek_is(1, "("))
        {
            (true, 1)
        } else {
            (false, 0)
        };

        let token = self.peek(offset)?;
        let arrow_at = if token.kind == TokenKind::Identifier {
            offset + 1
        } else if token.value == "(" && token.kind == TokenKind::Punctuator {
            self.matching_paren(offset)? + 1
        } else {
            return None;
        };
        (self.peek_is(arrow_at, "=>") && !self.newline_before_peek(arrow_at)).then_some(is_async)
    }

    /// Index (relative to the current token) of the `)` closing the `(` at
    /// `offset`.
    fn matching_paren(&self, offset: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens[self.pos + offset..].iter().enumerate() {
            if token.kind != TokenKind::Punctuator {
                continue;
            }
            match token.value.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(offset + i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn arrow_function(&mut self, is_async: bool) -> PResult<NodeId> {
        let start = self.start();
        self.require("arrow functions", 2015, start)?;
        if is_async {
            self.require("async functions", 2017, start)?;
            self.bump();
        }
        let params = if self.at("(") {
            self.in_function(is_async, false, Self::params)?
        } else {
            vec![self.identifier()?]
        };
        self.expect("=>")?;

        let saved_no_in = self.no_in;
        let (body, expression) = if self.at("{") {
            (self.in_function(is_async, false, Self::function_body)?, false)
        } else {
            let saved = self.ctx;
            self.ctx.in_async = is_async;
            self.ctx.in_generator = false;
            self.ctx.in_function = true;
            let body = self.assignment();
            self.ctx = saved;
            (body?, true)
        };
        self.no_in = saved_no_in;

        Ok(self.finish(
            NodeKind::ArrowFunctionExpression,
            start,
            vec![
                ("id", opt(None)),
                ("params", list(params)),
                ("body", node(body)),
                ("async", flag(is_async)),
                ("generator", flag(false)),
                ("expression", flag(expression)),
            ],
        ))
    }

    fn yield_expression(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let ends = self.is_eof()
            || self.newline_before()
            || [")", "]", "}", ",", ";", ":"].iter().any(|v| self.at(v));
        if ends {
            return Ok(self.finish(
                NodeKind::YieldExpression,
                start,
                vec![("argument", opt(None)), ("delegate", flag(false))],
            ));
        }
        let delegate = self.eat("*");
        let argument = self.assignment()?;
        Ok(self.finish(
            NodeKind::YieldExpression,
            start,
            vec![("argument", node(argument)), ("delegate", flag(delegate))],
        ))
    }

    fn conditional(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let test = self.binary(0)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.allow_in(Self::assignment)?;
        self.expect(":")?;
        let alternate = self.assignment()?;
        Ok(self.finish(
            NodeKind::ConditionalExpression,
            start,
            vec![
                ("test", node(test)),
                ("consequent", node(consequent)),
                ("alternate", node(alternate)),
            ],
        ))
    }

    fn binary_operator(&self) -> Option<(String, u8)> {
        let token = self.current()?;
        if !matches!(token.kind, TokenKind::Punctuator | TokenKind::Keyword) {
            return None;
        }
        if self.no_in && token.value == "in" {
            return None;
        }
        let precedence = binary_precedence(&token.value)?;
        Some((token.value.clone(), precedence))
    }

    fn binary(&mut self, min_precedence: u8) -> PResult<NodeId> {
        let start = self.start();
        let mut left = self.unary()?;
        while let Some((op, precedence)) = self.binary_operator() {
            if precedence < min_precedence {
                break;
            }
            if op == "**" {
                self.require("exponentiation", 2016, self.start())?;
                let left_range = self.range_of(left);
                if matches!(
                    self.kind_of(left),
                    NodeKind::UnaryExpression | NodeKind::AwaitExpression
                ) && left_range.start == start
                {
                    return Err(ParseError::new(
                        "Unary operator used immediately before exponentiation expression",
                        start,
                    ));
                }
            }
            if op == "??" {
                self.require("nullish coalescing", 2020, self.start())?;
            }
            self.bump();
            let next = if op == "**" { precedence } else { precedence + 1 };
            let right = self.binary(next)?;
            let kind = if matches!(op.as_str(), "||" | "&&" | "??") {
                NodeKind::LogicalExpression
            } else {
                NodeKind::BinaryExpression
            };
            left = self.finish(
                kind,
                start,
                vec![
                    ("operator", text(op)),
                    ("left", node(left)),
                    ("right", node(right)),
                ],
            );
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let Some(token) = self.current() else {
            return Err(self.unexpected());
        };
        let (kind, value) = (token.kind, token.value.clone());

        let is_unary = match kind {
            TokenKind::Punctuator => matches!(value.as_str(), "!" | "~" | "+" | "-"),
            TokenKind::Keyword => matches!(value.as_str(), "typeof" | "void" | "delete"),
            _ => false,
        };
        if is_unary {
            self.bump();
            let argument = self.nested(Self::unary)?;
            return Ok(self.finish(
                NodeKind::UnaryExpression,
                start,
                vec![
                    ("operator", text(value)),
                    ("argument", node(argument)),
                    ("prefix", flag(true)),
                ],
            ));
        }

        if kind == TokenKind::Punctuator && (value == "++" || value == "--") {
            self.bump();
            let argument = self.nested(Self::unary)?;
            self.check_simple_target(argument)?;
            return Ok(self.finish(
                NodeKind::UpdateExpression,
                start,
                vec![
                    ("operator", text(value)),
                    ("argument", node(argument)),
                    ("prefix", flag(true)),
                ],
            ));
        }

        if kind == TokenKind::Identifier && value == "await" && self.ctx.in_async {
            self.require("async functions", 2017, start)?;
            self.bump();
            let argument = self.nested(Self::unary)?;
            return Ok(self.finish(
                NodeKind::AwaitExpression,
                start,
                vec![("argument", node(argument))],
            ));
        }

        let expression = self.left_hand_side()?;
        if (self.at("++") || self.at("--")) && !self.newline_before() {
            self.check_simple_target(expression)?;
            let operator = self.value().to_string();
            self.bump();
            return Ok(self.finish(
                NodeKind::UpdateExpression,
                start,
                vec![
                    ("operator", text(operator)),
                    ("argument", node(expression)),
                    ("prefix", flag(false)),
                ],
            ));
        }
        Ok(expression)
    }

    /// Member accesses, calls, optional chains and tagged templates.
    pub(super) fn left_hand_side(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut expression = if self.at("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };
        let mut chained = false;

        loop {
            if self.eat(".") {
                expression = self.dot_member(start, expression, false)?;
            } else if self.at("?.") {
                self.require("optional chaining", 2020, self.start())?;
                self.bump();
                chained = true;
                if self.at("(") {
                    expression = self.call(start, expression, true)?;
                } else if self.at("[") {
                    expression = self.computed_member(start, expression, true)?;
                } else {
                    expression = self.dot_member(start, expression, true)?;
                }
            } else if self.at("[") {
                expression = self.computed_member(start, expression, false)?;
            } else if self.at("(") {
                expression = self.call(start, expression, false)?;
            } else if self.at_template_head() {
                if chained {
                    return Err(ParseError::new(
                        "Invalid tagged template on optional chain",
                        self.start(),
                    ));
                }
                expression = self.tagged_template(start, expression)?;
            } else {
                break;
            }
        }

        if chained {
            expression = self.finish(
                NodeKind::ChainExpression,
                start,
                vec![("expression", node(expression))],
            );
        }
        Ok(expression)
    }

    fn at_template_head(&self) -> bool {
        self.current()
            .is_some_and(|t| t.kind == TokenKind::Template && t.value.starts_with('`'))
    }

    fn dot_member(&mut self, start: usize, object: NodeId, optional: bool) -> PResult<NodeId> {
        let property = self.identifier_name()?;
        Ok(self.finish(
            NodeKind::MemberExpression,
            start,
            vec![
                ("object", node(object)),
                ("property", node(property)),
                ("computed", flag(false)),
                ("optional", flag(optional)),
            ],
        ))
    }

    fn computed_member(&mut self, start: usize, object: NodeId, optional: bool) -> PResult<NodeId> {
        self.expect("[")?;
        let property = self.allow_in(Self::expression)?;
        self.expect("]")?;
        Ok(self.finish(
            NodeKind::MemberExpression,
            start,
            vec![
                ("object", node(object)),
                ("property", node(property)),
                ("computed", flag(true)),
                ("optional", flag(optional)),
            ],
        ))
    }

    fn call(&mut self, start: usize, callee: NodeId, optional: bool) -> PResult<NodeId> {
        let arguments = self.arguments()?;
        Ok(self.finish(
            NodeKind::CallExpression,
            start,
            vec![
                ("callee", node(callee)),
                ("arguments", list(arguments)),
                ("optional", flag(optional)),
            ],
        ))
    }

    fn tagged_template(&mut self, start: usize, tag: NodeId) -> PResult<NodeId> {
        let quasi = self.template()?;
        Ok(self.finish(
            NodeKind::TaggedTemplateExpression,
            start,
            vec![("tag", node(tag)), ("quasi", node(quasi))],
        ))
    }

    fn arguments(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut arguments = Vec::new();
        while !self.at(")") {
            if self.at("...") {
                arguments.push(self.spread_element()?);
            } else {
                arguments.push(self.allow_in(Self::assignment)?);
            }
            if !self.eat(",") {
                break;
            }
            if self.at(")") {
                self.require("trailing commas in argument lists", 2017, self.start())?;
            }
        }
        self.expect(")")?;
        Ok(arguments)
    }

    fn spread_element(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.require("spread elements", 2015, start)?;
        self.expect("...")?;
        let argument = self.allow_in(Self::assignment)?;
        Ok(self.finish(
            NodeKind::SpreadElement,
            start,
            vec![("argument", node(argument))],
        ))
    }

    fn new_expression(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let meta_range = self.current().map(|t| t.range).unwrap_or_default();
        self.expect("new")?;

        if self.eat(".") {
            if !self.at("target") {
                return Err(self.unexpected());
            }
            if !self.ctx.in_function {
                return Err(ParseError::new(
                    "new.target can only be used in functions",
                    start,
                ));
            }
            let meta = self.push_at(NodeKind::Identifier, meta_range, vec![("name", text("new"))]);
            let property = self.identifier_name()?;
            return Ok(self.finish(
                NodeKind::MetaProperty,
                start,
                vec![("meta", node(meta)), ("property", node(property))],
            ));
        }

        let callee_start = self.start();
        let mut callee = if self.at("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };
        loop {
            if self.eat(".") {
                callee = self.dot_member(callee_start, callee, false)?;
            } else if self.at("[") {
                callee = self.computed_member(callee_start, callee, false)?;
            } else if self.at_template_head() {
                callee = self.tagged_template(callee_start, callee)?;
            } else if self.at("?.") {
                return Err(ParseError::new(
                    "Invalid optional chain from new expression",
                    self.start(),
                ));
            } else {
                break;
            }
        }

        let arguments = if self.at("(") {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(self.finish(
            NodeKind::NewExpression,
            start,
            vec![("callee", node(callee)), ("arguments", list(arguments))],
        ))
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let Some(token) = self.current() else {
            return Err(self.unexpected());
        };
        let (kind, range, value) = (token.kind, token.range, token.value.clone());

        match kind {
            TokenKind::Identifier => {
                if value == "async" && self.peek_is(1, "function") && !self.newline_before_peek(1) {
                    self.require("async functions", 2017, range.start)?;
                    self.bump();
                    return self.function(range.start, true, FunctionKind::Expression);
                }
                self.identifier()
            }
            TokenKind::Keyword => match value.as_str() {
                "this" => {
                    self.bump();
                    Ok(self.push_at(NodeKind::ThisExpression, range, vec![]))
                }
                "super" => {
                    self.bump();
                    Ok(self.push_at(NodeKind::Super, range, vec![]))
                }
                "function" => self.function(range.start, false, FunctionKind::Expression),
                "class" => self.class(FunctionKind::Expression),
                _ => Err(self.unexpected()),
            },
            TokenKind::Boolean => {
                self.bump();
                Ok(self.literal(range, FieldValue::Bool(value == "true"), value))
            }
            TokenKind::Null => {
                self.bump();
                Ok(self.literal(range, FieldValue::Null, value))
            }
            TokenKind::Numeric => {
                self.bump();
                let number = FieldValue::Num(parse_number(&value));
                let id = self.literal(range, number, value.clone());
                if let Some(digits) = value.strip_suffix('n') {
                    self.require("BigInt literals", 2020, range.start)?;
                    let digits = digits.replace('_', "");
                    self.ast.get_mut(id).fields.push(("bigint", text(digits)));
                }
                Ok(id)
            }
            TokenKind::String => {
                self.bump();
                let cooked = unescape(&value[1..value.len() - 1]);
                Ok(self.literal(range, FieldValue::Str(cooked), value))
            }
            TokenKind::RegularExpression => {
                self.bump();
                let close = value.rfind('/').unwrap_or(0);
                let pattern = value[1..close].to_string();
                let flags = value[close + 1..].to_string();
                Ok(self.push_at(
                    NodeKind::Literal,
                    range,
                    vec![
                        ("raw", text(value)),
                        ("pattern", text(pattern)),
                        ("flags", text(flags)),
                    ],
                ))
            }
            TokenKind::Template if value.starts_with('`') => self.template(),
            TokenKind::Punctuator => match value.as_str() {
                "(" => {
                    self.bump();
                    let expression = self.allow_in(Self::expression)?;
                    self.expect(")")?;
                    Ok(expression)
                }
                "[" => self.array_literal(),
                "{" => self.object_literal(),
                _ => Err(self.unexpected()),
            },
            TokenKind::Template => Err(self.unexpected()),
        }
    }

    fn literal(&mut self, range: OffsetRange, value: FieldValue, raw: String) -> NodeId {
        self.push_at(
            NodeKind::Literal,
            range,
            vec![("value", value), ("raw", text(raw))],
        )
    }

    fn template(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.require("template literals", 2015, start)?;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        loop {
            let Some(token) = self.current().filter(|t| t.kind == TokenKind::Template) else {
                return Err(self.unexpected());
            };
            let (range, piece) = (token.range, token.value.clone());
            self.bump();
            let tail = piece.ends_with('`') && piece.len() >= 2;
            let inner_end = if tail { piece.len() - 1 } else { piece.len() - 2 };
            let raw = piece[1..inner_end].to_string();
            let cooked = unescape(&raw.replace("\r\n", "\n").replace('\r', "\n"));
            quasis.push(self.push_at(
                NodeKind::TemplateElement,
                range,
                vec![
                    ("raw", text(raw)),
                    ("cooked", text(cooked)),
                    ("tail", flag(tail)),
                ],
            ));
            if tail {
                break;
            }
            expressions.push(self.allow_in(Self::expression)?);
            if !self.current().is_some_and(|t| t.kind == TokenKind::Template && t.value.starts_with('}')) {
                return Err(self.unexpected());
            }
        }
        Ok(self.finish(
            NodeKind::TemplateLiteral,
            start,
            vec![("quasis", list(quasis)), ("expressions", list(expressions))],
        ))
    }

    fn array_literal(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("[")?;
        let mut elements = Vec::new();
        while !self.at("]") {
            if self.eat(",") {
                elements.push(None);
                continue;
            }
            let element = if self.at("...") {
                self.spread_element()?
            } else {
                self.allow_in(Self::assignment)?
            };
            elements.push(Some(element));
            if !self.at("]") {
                self.expect(",")?;
            }
        }
        self.expect("]")?;
        Ok(self.finish(
            NodeKind::ArrayExpression,
            start,
            vec![("elements", FieldValue::Nodes(elements))],
        ))
    }

    /// A word is a property modifier (`async`, `get`, `set`) only when a
    /// property name follows it.
    fn at_property_modifier(&self, word: &str) -> bool {
        self.at(word)
            && !self.newline_before_peek(1)
            && self.peek(1).is_some_and(|next| {
                next.kind != TokenKind::Punctuator || matches!(next.value.as_str(), "[" | "*")
            })
    }

    fn object_literal(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut properties = Vec::new();
        while !self.at("}") {
            if self.at("...") {
                self.require("object spread properties", 2018, self.start())?;
                properties.push(self.spread_element()?);
            } else {
                properties.push(self.property()?);
            }
            if !self.at("}") {
                self.expect(",")?;
            }
        }
        self.expect("}")?;
        Ok(self.finish(
            NodeKind::ObjectExpression,
            start,
            vec![("properties", list(properties))],
        ))
    }

    fn property(&mut self) -> PResult<NodeId> {
        let start = self.start();

        let is_async = self.at_property_modifier("async");
        if is_async {
            self.require("async methods", 2017, start)?;
            self.bump();
        }
        let generator = if self.at("*") {
            self.require("generators", 2015, self.start())?;
            self.bump();
            true
        } else {
            false
        };
        let mut accessor = None;
        if !is_async && !generator {
            for word in ["get", "set"] {
                if self.at_property_modifier(word) && !self.peek_is(1, "*") {
                    self.bump();
                    accessor = Some(word);
                    break;
                }
            }
        }

        let key_is_identifier = self.kind() == Some(TokenKind::Identifier);
        let (key, computed) = self.property_key()?;

        let (value, kind, method, shorthand) = if let Some(word) = accessor {
            (self.method_function(false, false)?, word, false, false)
        } else if is_async || generator || self.at("(") {
            self.require("method shorthand", 2015, start)?;
            (self.method_function(is_async, generator)?, "init", true, false)
        } else if self.eat(":") {
            (self.allow_in(Self::assignment)?, "init", false, false)
        } else if key_is_identifier && !computed && (self.at(",") || self.at("}") || self.at("=")) {
            self.require("shorthand properties", 2015, start)?;
            let value = self.clone_identifier(key);
            if self.at("=") {
                self.cover_inits.push(self.start());
                self.bump();
                let right = self.allow_in(Self::assignment)?;
                let pattern = self.finish(
                    NodeKind::AssignmentPattern,
                    start,
                    vec![("left", node(value)), ("right", node(right))],
                );
                (pattern, "init", false, true)
            } else {
                (value, "init", false, true)
            }
        } else {
            return Err(self.unexpected());
        };

        Ok(self.finish(
            NodeKind::Property,
            start,
            vec![
                ("key", node(key)),
                ("value", node(value)),
                ("kind", text(kind)),
                ("method", flag(method)),
                ("shorthand", flag(shorthand)),
                ("computed", flag(computed)),
            ],
        ))
    }

    /// Property name of an object member or class method. Returns the key
    /// node and whether it is computed.
    pub(super) fn property_key(&mut self) -> PResult<(NodeId, bool)> {
        let Some(token) = self.current() else {
            return Err(self.unexpected());
        };
        let (kind, range, value) = (token.kind, token.range, token.value.clone());
        match kind {
            TokenKind::Punctuator if value == "[" => {
                self.require("computed property names", 2015, range.start)?;
                self.bump();
                let key = self.allow_in(Self::assignment)?;
                self.expect("]")?;
                Ok((key, true))
            }
            TokenKind::String => {
                self.bump();
                let cooked = unescape(&value[1..value.len() - 1]);
                Ok((self.literal(range, FieldValue::Str(cooked), value), false))
            }
            TokenKind::Numeric => {
                self.bump();
                let number = FieldValue::Num(parse_number(&value));
                Ok((self.literal(range, number, value), false))
            }
            _ => Ok((self.identifier_name()?, false)),
        }
    }

    /// Name of a non-computed key: identifier name or string value.
    pub(super) fn static_key_name(&self, key: NodeId) -> Option<String> {
        let data = self.ast.get(key);
        let field = |name: &str| {
            data.fields
                .iter()
                .find_map(|(n, value)| (*n == name).then_some(value))
        };
        match (data.kind, field("name"), field("value")) {
            (NodeKind::Identifier, Some(FieldValue::Str(name)), _) => Some(name.clone()),
            (NodeKind::Literal, _, Some(FieldValue::Str(value))) => Some(value.clone()),
            _ => None,
        }
    }
}
