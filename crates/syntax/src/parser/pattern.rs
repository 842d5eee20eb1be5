//! Binding patterns and assignment targets.
//!
//! Binding positions (declarations, parameters, catch clauses) are parsed
//! as patterns directly. Assignment targets are first parsed as
//! expressions and then rewritten in place, since `[a, b] = c` is only
//! known to be destructuring once the `=` is seen.

use super::{flag, list, node, text, PResult, Parser};
use crate::ast::{FieldValue, NodeId, NodeKind};
use crate::token::TokenKind;
use crate::ParseError;

impl Parser<'_> {
    /// Identifier, array pattern or object pattern.
    pub(super) fn binding_target(&mut self) -> PResult<NodeId> {
        if self.at("[") {
            self.require("destructuring", 2015, self.start())?;
            self.array_pattern()
        } else if self.at("{") {
            self.require("destructuring", 2015, self.start())?;
            self.object_pattern()
        } else {
            self.identifier()
        }
    }

    /// A binding target with an optional `= default`.
    pub(super) fn binding_element(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let target = self.binding_target()?;
        if self.at("=") {
            self.require("default values", 2015, self.start())?;
            self.bump();
            let right = self.allow_in(Self::assignment)?;
            Ok(self.finish(
                NodeKind::AssignmentPattern,
                start,
                vec![("left", node(target)), ("right", node(right))],
            ))
        } else {
            Ok(target)
        }
    }

    pub(super) fn rest_element(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.require("rest elements", 2015, start)?;
        self.expect("...")?;
        let argument = self.binding_target()?;
        Ok(self.finish(
            NodeKind::RestElement,
            start,
            vec![("argument", node(argument))],
        ))
    }

    fn array_pattern(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("[")?;
        let mut elements = Vec::new();
        while !self.at("]") {
            if self.eat(",") {
                elements.push(None);
                continue;
            }
            if self.at("...") {
                elements.push(Some(self.rest_element()?));
                if !self.at("]") {
                    return Err(ParseError::new(
                        "Rest element must be last element",
                        self.start(),
                    ));
                }
                break;
            }
            elements.push(Some(self.binding_element()?));
            if !self.at("]") {
                self.expect(",")?;
            }
        }
        self.expect("]")?;
        Ok(self.finish(
            NodeKind::ArrayPattern,
            start,
            vec![("elements", FieldValue::Nodes(elements))],
        ))
    }

    fn object_pattern(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect("{")?;
        let mut properties = Vec::new();
        while !self.at("}") {
            if self.at("...") {
                self.require("object rest properties", 2018, self.start())?;
                let rest_start = self.start();
                self.bump();
                let argument = self.identifier()?;
                properties.push(self.finish(
                    NodeKind::RestElement,
                    rest_start,
                    vec![("argument", node(argument))],
                ));
                if !self.at("}") {
                    return Err(ParseError::new(
                        "Rest element must be last element",
                        self.start(),
                    ));
                }
                break;
            }

            let prop_start = self.start();
            let key_is_identifier = self.kind() == Some(TokenKind::Identifier);
            let (key, computed) = self.property_key()?;
            let (value, shorthand) = if self.eat(":") {
                (self.binding_element()?, false)
            } else if key_is_identifier && !computed {
                let value = self.clone_identifier(key);
                if self.at("=") {
                    self.bump();
                    let right = self.allow_in(Self::assignment)?;
                    let pattern = self.finish(
                        NodeKind::AssignmentPattern,
                        prop_start,
                        vec![("left", node(value)), ("right", node(right))],
                    );
                    (pattern, true)
                } else {
                    (value, true)
                }
            } else {
                return Err(self.unexpected());
            };

            properties.push(self.finish(
                NodeKind::Property,
                prop_start,
                vec![
                    ("key", node(key)),
                    ("value", node(value)),
                    ("kind", text("init")),
                    ("method", flag(false)),
                    ("shorthand", flag(shorthand)),
                    ("computed", flag(computed)),
                ],
            ));
            if !self.at("}") {
                self.expect(",")?;
            }
        }
        self.expect("}")?;
        Ok(self.finish(
            NodeKind::ObjectPattern,
            start,
            vec![("properties", list(properties))],
        ))
    }

    /// A second `Identifier` node with the same name and range, used as the
    /// value of a shorthand property.
    pub(super) fn clone_identifier(&mut self, id: NodeId) -> NodeId {
        let data = self.ast.get(id).clone();
        self.push_at(NodeKind::Identifier, data.range, data.fields)
    }

    /// Rewrite an expression parsed before a `=` (or a `for-in/of` head)
    /// into an assignment target.
    pub(super) fn to_assignment_target(&mut self, id: NodeId) -> PResult<NodeId> {
        self.convert_target(id)?;
        let range = self.range_of(id);
        self.cover_inits
            .retain(|offset| !(range.start <= *offset && *offset < range.end));
        Ok(id)
    }

    fn convert_target(&mut self, id: NodeId) -> PResult<()> {
        match self.kind_of(id) {
            NodeKind::Identifier | NodeKind::MemberExpression | NodeKind::AssignmentPattern => {
                Ok(())
            }
            NodeKind::ObjectExpression => {
                let properties = self.list_field(id, "properties");
                let count = properties.len();
                for (i, property) in properties.into_iter().enumerate() {
                    match self.kind_of(property) {
                        NodeKind::SpreadElement => self.convert_rest(property, i + 1 == count)?,
                        NodeKind::Property => {
                            let data = self.ast.get(property);
                            let is_method = data.fields.iter().any(|(name, value)| {
                                (*name == "method" && *value == FieldValue::Bool(true))
                                    || (*name == "kind" && *value != FieldValue::Str("init".into()))
                            });
                            if is_method {
                                return Err(self.invalid_target(property));
                            }
                            if let Some(value) = self.node_field(property, "value") {
                                self.convert_target(value)?;
                            }
                        }
                        _ => return Err(self.invalid_target(property)),
                    }
                }
                self.ast.get_mut(id).kind = NodeKind::ObjectPattern;
                Ok(())
            }
            NodeKind::ArrayExpression => {
                let elements = self.list_field(id, "elements");
                let count = elements.len();
                for (i, element) in elements.into_iter().enumerate() {
                    if self.kind_of(element) == NodeKind::SpreadElement {
                        self.convert_rest(element, i + 1 == count)?;
                    } else {
                        self.convert_target(element)?;
                    }
                }
                self.ast.get_mut(id).kind = NodeKind::ArrayPattern;
                Ok(())
            }
            NodeKind::AssignmentExpression => {
                let data = self.ast.get(id);
                let is_plain = data
                    .fields
                    .iter()
                    .any(|(name, value)| *name == "operator" && *value == FieldValue::Str("=".into()));
                if !is_plain {
                    return Err(self.invalid_target(id));
                }
                let data = self.ast.get_mut(id);
                data.kind = NodeKind::AssignmentPattern;
                data.fields.retain(|(name, _)| *name != "operator");
                Ok(())
            }
            _ => Err(self.invalid_target(id)),
        }
    }

    fn convert_rest(&mut self, id: NodeId, is_last: bool) -> PResult<()> {
        if !is_last {
            return Err(ParseError::new(
                "Rest element must be last element",
                self.range_of(id).start,
            ));
        }
        if let Some(argument) = self.node_field(id, "argument") {
            if self.kind_of(argument) == NodeKind::AssignmentExpression {
                return Err(self.invalid_target(argument));
            }
            self.convert_target(argument)?;
        }
        self.ast.get_mut(id).kind = NodeKind::RestElement;
        Ok(())
    }

    /// Targets of compound assignment and `++`/`--`.
    pub(super) fn check_simple_target(&self, id: NodeId) -> PResult<()> {
        match self.kind_of(id) {
            NodeKind::Identifier | NodeKind::MemberExpression => Ok(()),
            _ => Err(self.invalid_target(id)),
        }
    }

    fn invalid_target(&self, id: NodeId) -> ParseError {
        ParseError::new(
            "Invalid left-hand side in assignment",
            self.range_of(id).start,
        )
    }

    fn list_field(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.ast
            .get(id)
            .fields
            .iter()
            .find_map(|(n, value)| match value {
                FieldValue::Nodes(ids) if *n == name => Some(ids.iter().flatten().copied().collect()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub(super) fn node_field(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ast
            .get(id)
            .fields
            .iter()
            .find_map(|(n, value)| match value {
                FieldValue::Node(child) if *n == name => *child,
                _ => None,
            })
    }
}
