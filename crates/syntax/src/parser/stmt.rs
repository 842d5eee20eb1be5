//! Statements and declarations.

use super::{flag, list, node, opt, text, PResult, Parser};
use crate::ast::{NodeId, NodeKind};
use crate::token::TokenKind;
use crate::ParseError;

/// Whether a function is parsed as a declaration or an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FunctionKind {
    Declaration,
    Expression,
}

impl Parser<'_> {
    pub(super) fn statement(&mut self) -> PResult<NodeId> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> PResult<NodeId> {
        let Some(kind) = self.kind() else {
            return Err(self.unexpected());
        };

        let value = self.value().to_string();
        match (kind, value.as_str()) {
            (TokenKind::Punctuator, "{") => self.block(),
            (TokenKind::Punctuator, ";") => {
                let start = self.start();
                self.bump();
                Ok(self.finish(NodeKind::EmptyStatement, start, vec![]))
            }
            (TokenKind::Keyword, "var") => self.variable_statement("var"),
            (TokenKind::Keyword, "const") => {
                self.require("const declarations", 2015, self.start())?;
                self.variable_statement("const")
            }
            (TokenKind::Identifier, "let") if self.at_let_declaration() => {
                self.variable_statement("let")
            }
            (TokenKind::Keyword, "function") => {
                let start = self.start();
                self.function(start, false, FunctionKind::Declaration)
            }
            (TokenKind::Identifier, "async")
                if self.peek_is(1, "function") && !self.newline_before_peek(1) =>
            {
                let start = self.start();
                self.require("async functions", 2017, start)?;
                self.bump();
                self.function(start, true, FunctionKind::Declaration)
            }
            (TokenKind::Keyword, "class") => self.class(FunctionKind::Declaration),
            (TokenKind::Keyword, "if") => self.if_statement(),
            (TokenKind::Keyword, "for") => self.for_statement(),
            (TokenKind::Keyword, "while") => self.while_statement(),
            (TokenKind::Keyword, "do") => self.do_while_statement(),
            (TokenKind::Keyword, "return") => self.return_statement(),
            (TokenKind::Keyword, "break") => self.jump_statement(NodeKind::BreakStatement),
            (TokenKind::Keyword, "continue") => self.jump_statement(NodeKind::ContinueStatement),
            (TokenKind::Keyword, "throw") => self.throw_statement(),
            (TokenKind::Keyword, "try") => self.try_statement(),
            (TokenKind::Keyword, "switch") => self.switch_statement(),
            (TokenKind::Keyword, "with") => self.with_statement(),
            (TokenKind::Keyword, "debugger") => {
                let start = self.start();
                self.bump();
                self.semicolon()?;
                Ok(self.finish(NodeKind::DebuggerStatement, start, vec![]))
            }
            (TokenKind::Identifier, _) if self.peek_is(1, ":") => self.labeled_statement(),
            _ => self.expression_statement(),
        }
    }

    fn at_let_declaration(&self) -> bool {
        self.year >= 2015
            && self.peek(1).is_some_and(|next| {
                next.kind == TokenKind::Identifier || next.value == "[" || next.value == "{"
            })
    }

    pub(super) fn block(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut body = Vec::new();
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.statement()?);
        }
        self.bump();
        Ok(self.finish(NodeKind::BlockStatement, start, vec![("body", list(body))]))
    }

    fn expression_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let expression = self.expression()?;
        self.semicolon()?;
        Ok(self.finish(
            NodeKind::ExpressionStatement,
            start,
            vec![("expression", node(expression))],
        ))
    }

    fn variable_statement(&mut self, kind: &str) -> PResult<NodeId> {
        let start = self.start();
        let declarations = self.variable_declarators(false)?;
        self.semicolon()?;
        Ok(self.finish(
            NodeKind::VariableDeclaration,
            start,
            vec![("declarations", list(declarations)), ("kind", text(kind))],
        ))
    }

    /// Parse the declaration keyword and its declarators. In a `for` head
    /// the initializer checks are left to the caller.
    fn variable_declarators(&mut self, in_for: bool) -> PResult<Vec<NodeId>> {
        let is_const = self.at("const");
        self.bump();
        let mut declarations = Vec::new();
        loop {
            let start = self.start();
            let id = self.binding_target()?;
            let init = if self.eat("=") {
                Some(self.assignment()?)
            } else {
                None
            };
            if init.is_none() && !in_for {
                if is_const {
                    return Err(ParseError::new(
                        "Missing initializer in const declaration",
                        self.start(),
                    ));
                }
                if self.kind_of(id) != NodeKind::Identifier {
                    return Err(ParseError::new(
                        "Missing initializer in destructuring declaration",
                        self.start(),
                    ));
                }
            }
            declarations.push(self.finish(
                NodeKind::VariableDeclarator,
                start,
                vec![("id", node(id)), ("init", opt(init))],
            ));
            if !self.eat(",") {
                break;
            }
        }
        Ok(declarations)
    }

    /// Parse `function [*] [name] (params) { body }`. `start` may precede the
    /// `function` keyword when an `async` prefix was already consumed.
    pub(super) fn function(
        &mut self,
        start: usize,
        is_async: bool,
        kind: FunctionKind,
    ) -> PResult<NodeId> {
        self.expect("function")?;
        let generator = if self.at("*") {
            self.require("generators", 2015, self.start())?;
            self.bump();
            true
        } else {
            false
        };
        let id = if self.at_identifier() {
            Some(self.identifier()?)
        } else if kind == FunctionKind::Declaration {
            return Err(self.unexpected());
        } else {
            None
        };
        let (params, body) = self.in_function(is_async, generator, |p| {
            let params = p.params()?;
            let body = p.function_body()?;
            Ok((params, body))
        })?;
        let node_kind = match kind {
            FunctionKind::Declaration => NodeKind::FunctionDeclaration,
            FunctionKind::Expression => NodeKind::FunctionExpression,
        };
        Ok(self.finish(
            node_kind,
            start,
            vec![
                ("id", opt(id)),
                ("params", list(params)),
                ("body", node(body)),
                ("async", flag(is_async)),
                ("generator", flag(generator)),
                ("expression", flag(false)),
            ],
        ))
    }

    /// Parse `(params) { body }` as the `FunctionExpression` value of a
    /// method. Its range starts at the opening parenthesis.
    pub(super) fn method_function(&mut self, is_async: bool, generator: bool) -> PResult<NodeId> {
        let start = self.start();
        let (params, body) = self.in_function(is_async, generator, |p| {
            let params = p.params()?;
            let body = p.function_body()?;
            Ok((params, body))
        })?;
        Ok(self.finish(
            NodeKind::FunctionExpression,
            start,
            vec![
                ("id", opt(None)),
                ("params", list(params)),
                ("body", node(body)),
                ("async", flag(is_async)),
                ("generator", flag(generator)),
                ("expression", flag(false)),
            ],
        ))
    }

    /// Parse a parenthesized formal parameter list.
    pub(super) fn params(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut params = Vec::new();
        while !self.at(")") {
            if self.at("...") {
                params.push(self.rest_element()?);
                if !self.at(")") {
                    return Err(ParseError::new(
                        "Rest parameter must be last formal parameter",
                        self.start(),
                    ));
                }
                break;
            }
            params.push(self.binding_element()?);
            if !self.eat(",") {
                break;
            }
            if self.at(")") {
                self.require("trailing commas in parameter lists", 2017, self.start())?;
            }
        }
        self.expect(")")?;
        Ok(params)
    }

    pub(super) fn function_body(&mut self) -> PResult<NodeId> {
        self.block()
    }

    pub(super) fn class(&mut self, kind: FunctionKind) -> PResult<NodeId> {
        let start = self.start();
        self.require("classes", 2015, start)?;
        self.expect("class")?;
        let id = if self.at_identifier() {
            Some(self.identifier()?)
        } else if kind == FunctionKind::Declaration {
            return Err(self.unexpected());
        } else {
            None
        };
        let super_class = if self.eat("extends") {
            Some(self.left_hand_side()?)
        } else {
            None
        };
        let body = self.class_body()?;
        let node_kind = match kind {
            FunctionKind::Declaration => NodeKind::ClassDeclaration,
            FunctionKind::Expression => NodeKind::ClassExpression,
        };
        Ok(self.finish(
            node_kind,
            start,
            vec![
                ("id", opt(id)),
                ("superClass", opt(super_class)),
                ("body", node(body)),
            ],
        ))
    }

    fn class_body(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut members = Vec::new();
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            if self.eat(";") {
                continue;
            }
            members.push(self.method_definition()?);
        }
        self.bump();
        Ok(self.finish(NodeKind::ClassBody, start, vec![("body", list(members))]))
    }

    /// A modifier word such as `static` or `get` is a modifier only when a
    /// member name follows it.
    fn at_modifier(&self, word: &str) -> bool {
        self.at(word) && !self.peek_is(1, "(") && !self.peek_is(1, ";") && !self.peek_is(1, "}")
            && !self.peek_is(1, "=")
    }

    fn method_definition(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let is_static = self.at_modifier("static");
        if is_static {
            self.bump();
        }
        let is_async = self.at_modifier("async") && !self.newline_before_peek(1);
        if is_async {
            self.require("async methods", 2017, self.start())?;
            self.bump();
        }
        let generator = self.eat("*");
        let mut accessor = None;
        if !is_async && !generator {
            for word in ["get", "set"] {
                if self.at_modifier(word) {
                    self.bump();
                    accessor = Some(word);
                    break;
                }
            }
        }
        let (key, computed) = self.property_key()?;
        if !self.at("(") {
            return Err(self.unexpected());
        }
        let is_constructor = !is_static
            && !computed
            && self.static_key_name(key).as_deref() == Some("constructor");
        let value = self.method_function(is_async, generator)?;
        let kind = match accessor {
            Some(word) => word,
            None if is_constructor => "constructor",
            None => "method",
        };
        Ok(self.finish(
            NodeKind::MethodDefinition,
            start,
            vec![
                ("key", node(key)),
                ("value", node(value)),
                ("kind", text(kind)),
                ("computed", flag(computed)),
                ("static", flag(is_static)),
            ],
        ))
    }

    fn if_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let test = self.paren_expression()?;
        let consequent = self.statement()?;
        let alternate = if self.eat("else") {
            Some(self.statement()?)
        } else {
            None
        };
        Ok(self.finish(
            NodeKind::IfStatement,
            start,
            vec![
                ("test", node(test)),
                ("consequent", node(consequent)),
                ("alternate", opt(alternate)),
            ],
        ))
    }

    fn paren_expression(&mut self) -> PResult<NodeId> {
        self.expect("(")?;
        let expression = self.allow_in(Self::expression)?;
        self.expect(")")?;
        Ok(expression)
    }

    fn for_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let is_await = if self.at("await") && self.ctx.in_async {
            self.require("for await", 2018, self.start())?;
            self.bump();
            true
        } else {
            false
        };
        self.expect("(")?;

        let init = if self.at(";") {
            None
        } else if self.at("var") || self.at("const") || (self.at("let") && self.at_let_declaration())
        {
            let decl_start = self.start();
            let kind = self.value().to_string();
            if kind == "const" {
                self.require("const declarations", 2015, decl_start)?;
            }
            let saved = std::mem::replace(&mut self.no_in, true);
            let declarations = self.variable_declarators(true);
            self.no_in = saved;
            let declarations = declarations?;
            let single = declarations.len() == 1;
            let declaration = self.finish(
                NodeKind::VariableDeclaration,
                decl_start,
                vec![("declarations", list(declarations)), ("kind", text(kind))],
            );
            if single && (self.at("in") || self.at("of")) {
                return self.for_in_of(start, declaration, is_await);
            }
            Some(declaration)
        } else {
            let saved = std::mem::replace(&mut self.no_in, true);
            let expression = self.expression();
            self.no_in = saved;
            let expression = expression?;
            if self.at("in") || self.at("of") {
                let target = self.to_assignment_target(expression)?;
                return self.for_in_of(start, target, is_await);
            }
            Some(expression)
        };

        if is_await {
            return Err(self.unexpected());
        }
        self.expect(";")?;
        let test = if self.at(";") {
            None
        } else {
            Some(self.allow_in(Self::expression)?)
        };
        self.expect(";")?;
        let update = if self.at(")") {
            None
        } else {
            Some(self.allow_in(Self::expression)?)
        };
        self.expect(")")?;
        let body = self.statement()?;
        Ok(self.finish(
            NodeKind::ForStatement,
            start,
            vec![
                ("init", opt(init)),
                ("test", opt(test)),
                ("update", opt(update)),
                ("body", node(body)),
            ],
        ))
    }

    fn for_in_of(&mut self, start: usize, left: NodeId, is_await: bool) -> PResult<NodeId> {
        let is_of = self.at("of");
        if is_of {
            self.require("for-of loops", 2015, self.start())?;
        } else if is_await {
            return Err(self.unexpected());
        }
        self.bump();
        let right = if is_of {
            self.allow_in(Self::assignment)?
        } else {
            self.allow_in(Self::expression)?
        };
        self.expect(")")?;
        let body = self.statement()?;
        let mut fields = vec![("left", node(left)), ("right", node(right)), ("body", node(body))];
        let kind = if is_of {
            fields.push(("await", flag(is_await)));
            NodeKind::ForOfStatement
        } else {
            NodeKind::ForInStatement
        };
        Ok(self.finish(kind, start, fields))
    }

    fn while_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let test = self.paren_expression()?;
        let body = self.statement()?;
        Ok(self.finish(
            NodeKind::WhileStatement,
            start,
            vec![("test", node(test)), ("body", node(body))],
        ))
    }

    fn do_while_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let body = self.statement()?;
        self.expect("while")?;
        let test = self.paren_expression()?;
        self.eat(";");
        Ok(self.finish(
            NodeKind::DoWhileStatement,
            start,
            vec![("body", node(body)), ("test", node(test))],
        ))
    }

    fn return_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let argument = if self.at(";") || self.at("}") || self.is_eof() || self.newline_before() {
            None
        } else {
            Some(self.expression()?)
        };
        self.semicolon()?;
        Ok(self.finish(
            NodeKind::ReturnStatement,
            start,
            vec![("argument", opt(argument))],
        ))
    }

    fn jump_statement(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let label = if self.at_identifier() && !self.newline_before() {
            Some(self.identifier()?)
        } else {
            None
        };
        self.semicolon()?;
        Ok(self.finish(kind, start, vec![("label", opt(label))]))
    }

    fn throw_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        if self.newline_before() {
            return Err(ParseError::new("Illegal newline after throw", self.prev_end()));
        }
        let argument = self.expression()?;
        self.semicolon()?;
        Ok(self.finish(
            NodeKind::ThrowStatement,
            start,
            vec![("argument", node(argument))],
        ))
    }

    fn try_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let block = self.block()?;

        let handler = if self.at("catch") {
            let catch_start = self.start();
            self.bump();
            let param = if self.eat("(") {
                let param = self.binding_target()?;
                self.expect(")")?;
                Some(param)
            } else {
                self.require("optional catch binding", 2019, self.start())?;
                None
            };
            let body = self.block()?;
            Some(self.finish(
                NodeKind::CatchClause,
                catch_start,
                vec![("param", opt(param)), ("body", node(body))],
            ))
        } else {
            None
        };

        let finalizer = if self.eat("finally") {
            Some(self.block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(ParseError::new("Missing catch or finally after try", self.start()));
        }

        Ok(self.finish(
            NodeKind::TryStatement,
            start,
            vec![
                ("block", node(block)),
                ("handler", opt(handler)),
                ("finalizer", opt(finalizer)),
            ],
        ))
    }

    fn switch_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let discriminant = self.paren_expression()?;
        self.expect("{")?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.at("}") {
            let case_start = self.start();
            let test = if self.eat("case") {
                Some(self.allow_in(Self::expression)?)
            } else if self.at("default") {
                if seen_default {
                    return Err(ParseError::new(
                        "Multiple default clauses",
                        self.start(),
                    ));
                }
                seen_default = true;
                self.bump();
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(":")?;
            let mut consequent = Vec::new();
            while !self.at("case") && !self.at("default") && !self.at("}") {
                if self.is_eof() {
                    return Err(self.unexpected());
                }
                consequent.push(self.statement()?);
            }
            cases.push(self.finish(
                NodeKind::SwitchCase,
                case_start,
                vec![("test", opt(test)), ("consequent", list(consequent))],
            ));
        }
        self.bump();
        Ok(self.finish(
            NodeKind::SwitchStatement,
            start,
            vec![("discriminant", node(discriminant)), ("cases", list(cases))],
        ))
    }

    fn with_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.bump();
        let object = self.paren_expression()?;
        let body = self.statement()?;
        Ok(self.finish(
            NodeKind::WithStatement,
            start,
            vec![("object", node(object)), ("body", node(body))],
        ))
    }

    fn labeled_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let label = self.identifier()?;
        self.expect(":")?;
        let body = self.statement()?;
        Ok(self.finish(
            NodeKind::LabeledStatement,
            start,
            vec![("label", node(label)), ("body", node(body))],
        ))
    }
}
