use crate::context::Report;
use crate::error::RuleError;
use crate::rule::{Listeners, Rule, RuleKind, RuleMeta, RuleOptions};
use crate::rules::utils::{pattern_identifiers, scope_bindings};
use estlint_syntax::{Node, NodeKind};

static META: RuleMeta = RuleMeta {
    name: "no-ex-assign",
    kind: RuleKind::Problem,
    description: "Disallow reassigning exceptions in `catch` clauses",
    recommended: true,
    fixable: None,
    has_suggestions: false,
    messages: &[("unexpected", "Do not assign to the exception parameter.")],
};

/// Lint rule that flags writes to a `catch` clause parameter
///
/// Assigning to the exception parameter destroys the only reference to the
/// caught error.
pub struct NoExAssign;

/// Identifiers written by `node` itself, not by its children.
fn written_identifiers(node: Node<'_>) -> Vec<Node<'_>> {
    match node.kind() {
        NodeKind::AssignmentExpression => node
            .child("left")
            .map(pattern_identifiers)
            .unwrap_or_default(),
        NodeKind::UpdateExpression => node
            .child("argument")
            .filter(|argument| argument.is(NodeKind::Identifier))
            .into_iter()
            .collect(),
        NodeKind::ForInStatement | NodeKind::ForOfStatement => node
            .child("left")
            .filter(|left| !left.is(NodeKind::VariableDeclaration))
            .map(pattern_identifiers)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Collect writes to `names` under `node`, dropping names once a nested
/// scope redeclares them.
fn collect_writes<'a>(node: Node<'a>, names: &[&str], out: &mut Vec<Node<'a>>) {
    let shadowed = scope_bindings(node);
    let visible: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !shadowed.contains(name))
        .collect();
    if visible.is_empty() {
        return;
    }

    out.extend(
        written_identifiers(node)
            .into_iter()
            .filter(|id| id.name().is_some_and(|name| visible.contains(&name))),
    );
    for child in node.child_nodes() {
        collect_writes(child, &visible, out);
    }
}

impl Rule for NoExAssign {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on("CatchClause[param]", |node, ctx| {
            let Some(param) = node.child("param") else {
                return Ok(());
            };
            let names: Vec<&str> = pattern_identifiers(param)
                .into_iter()
                .filter_map(Node::name)
                .collect();
            let Some(body) = node.child("body") else {
                return Ok(());
            };

            let mut writes = Vec::new();
            collect_writes(body, &names, &mut writes);
            for identifier in writes {
                ctx.report(Report::node("unexpected", identifier))?;
            }
            Ok(())
        }))
    }
}
