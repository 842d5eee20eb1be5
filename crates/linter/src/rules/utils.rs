//! Syntax helpers shared by rules: pattern bindings, declared names and
//! static property names.

use estlint_syntax::{Node, NodeKind};

/// Identifiers bound or written by a pattern, in source order.
///
/// Member expression targets (`a.b = c`) bind nothing and are skipped.
pub(crate) fn pattern_identifiers(pattern: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    collect_pattern(pattern, &mut out);
    out
}

fn collect_pattern<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    match node.kind() {
        NodeKind::Identifier => out.push(node),
        NodeKind::ObjectPattern => {
            for property in node.children("properties") {
                if property.is(NodeKind::Property) {
                    if let Some(value) = property.child("value") {
                        collect_pattern(value, out);
                    }
                } else {
                    collect_pattern(property, out);
                }
            }
        }
        NodeKind::ArrayPattern => {
            for element in node.children("elements") {
                collect_pattern(element, out);
            }
        }
        NodeKind::AssignmentPattern => {
            if let Some(left) = node.child("left") {
                collect_pattern(left, out);
            }
        }
        NodeKind::RestElement => {
            if let Some(argument) = node.child("argument") {
                collect_pattern(argument, out);
            }
        }
        _ => {}
    }
}

fn pattern_names<'a>(pattern: Node<'a>, out: &mut Vec<&'a str>) {
    out.extend(pattern_identifiers(pattern).into_iter().filter_map(Node::name));
}

/// Names declared by `var` anywhere under `root`, not counting nested
/// functions.
fn var_names<'a>(root: Node<'a>, out: &mut Vec<&'a str>) {
    root.walk(|node| {
        if node != root && node.kind().is_function() {
            return false;
        }
        if node.is(NodeKind::VariableDeclaration) && node.str("kind") == Some("var") {
            for declarator in node.children("declarations") {
                if let Some(id) = declarator.child("id") {
                    pattern_names(id, out);
                }
            }
        }
        true
    });
}

/// Names declared by `let`, `const`, `class` and `function` directly in a
/// statement list.
fn lexical_names<'a>(statements: &[Node<'a>], out: &mut Vec<&'a str>) {
    for statement in statements {
        match statement.kind() {
            NodeKind::VariableDeclaration if statement.str("kind") != Some("var") => {
                for declarator in statement.children("declarations") {
                    if let Some(id) = declarator.child("id") {
                        pattern_names(id, out);
                    }
                }
            }
            NodeKind::FunctionDeclaration | NodeKind::ClassDeclaration => {
                if let Some(name) = statement.child("id").and_then(Node::name) {
                    out.push(name);
                }
            }
            _ => {}
        }
    }
}

/// Names a scope-creating node binds for the code nested inside it.
///
/// Nodes that do not open a scope bind nothing. A function declaration's
/// own name belongs to the enclosing scope and is reported there.
pub(crate) fn scope_bindings(node: Node<'_>) -> Vec<&str> {
    let mut out = Vec::new();
    match node.kind() {
        NodeKind::Program => {
            var_names(node, &mut out);
            lexical_names(&node.children("body"), &mut out);
        }
        kind if kind.is_function() => {
            if kind == NodeKind::FunctionExpression {
                if let Some(name) = node.child("id").and_then(Node::name) {
                    out.push(name);
                }
            }
            for param in node.children("params") {
                pattern_names(param, &mut out);
            }
            if let Some(body) = node.child("body") {
                var_names(body, &mut out);
                lexical_names(&body.children("body"), &mut out);
            }
        }
        NodeKind::BlockStatement => lexical_names(&node.children("body"), &mut out),
        NodeKind::SwitchStatement => {
            for case in node.children("cases") {
                lexical_names(&case.children("consequent"), &mut out);
            }
        }
        NodeKind::ForStatement | NodeKind::ForInStatement | NodeKind::ForOfStatement => {
            let head = node.child("init").or_else(|| node.child("left"));
            if let Some(head) = head.filter(|head| head.is(NodeKind::VariableDeclaration)) {
                lexical_names(&[head], &mut out);
            }
        }
        NodeKind::CatchClause => {
            if let Some(param) = node.child("param") {
                pattern_names(param, &mut out);
            }
        }
        NodeKind::ClassExpression => {
            if let Some(name) = node.child("id").and_then(Node::name) {
                out.push(name);
            }
        }
        _ => {}
    }
    out
}

/// `true` for a string `Literal`.
pub(crate) fn is_string_literal(node: Node<'_>) -> bool {
    node.is(NodeKind::Literal) && node.str("value").is_some()
}

/// The name a property key resolves to without evaluating code.
///
/// Identifiers count only when the key is not computed; string and number
/// literals count either way, as do templates without expressions.
pub(crate) fn static_property_name(property: Node<'_>) -> Option<String> {
    let key = property.child("key")?;
    let computed = property.flag("computed");
    match key.kind() {
        NodeKind::Identifier if !computed => key.name().map(str::to_string),
        NodeKind::Literal => key
            .str("value")
            .map(str::to_string)
            .or_else(|| key.num("value").map(number_to_string)),
        NodeKind::TemplateLiteral if key.children("expressions").is_empty() => key
            .children("quasis")
            .first()
            .and_then(|quasi| quasi.str("cooked"))
            .map(str::to_string),
        _ => None,
    }
}

/// Render a number the way JavaScript's `String(n)` does for the common
/// cases.
#[allow(clippy::float_cmp)]
fn number_to_string(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
