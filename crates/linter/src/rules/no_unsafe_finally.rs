use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Listeners, Rule, RuleKind, RuleMeta, RuleOptions};
use estlint_syntax::{Node, NodeKind};

static META: RuleMeta = RuleMeta {
    name: "no-unsafe-finally",
    kind: RuleKind::Problem,
    description: "Disallow control flow statements in `finally` blocks",
    recommended: true,
    fixable: None,
    has_suggestions: false,
    messages: &[("unsafeUsage", "Unsafe usage of {{nodeType}}.")],
};

/// Lint rule that flags `return`, `throw`, `break` and `continue` statements
/// that jump out of a `finally` block
///
/// A jump out of `finally` silently overrides the outcome of the `try` and
/// `catch` blocks.
pub struct NoUnsafeFinally;

/// Where the upward search for a `finally` block stops.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    /// `return`, `throw` and labeled `break`
    Function,
    /// Unlabeled `break`
    Break,
    /// `continue`
    Continue,
}

impl Boundary {
    fn of(statement: Node<'_>) -> Self {
        match statement.kind() {
            NodeKind::BreakStatement if statement.child("label").is_none() => Self::Break,
            NodeKind::ContinueStatement => Self::Continue,
            _ => Self::Function,
        }
    }

    fn stops_at(self, kind: NodeKind) -> bool {
        let function = kind == NodeKind::Program || kind.is_function() || kind.is_class();
        match self {
            Self::Function => function,
            Self::Break => function || kind.is_loop() || kind == NodeKind::SwitchStatement,
            Self::Continue => function || kind.is_loop(),
        }
    }
}

/// Whether `statement` jumps out of an enclosing `finally` block.
fn jumps_out_of_finally(statement: Node<'_>) -> bool {
    let boundary = Boundary::of(statement);
    let label = statement.child("label").and_then(Node::name);
    let mut label_inside = false;

    let mut current = statement;
    while !boundary.stops_at(current.kind()) {
        let Some(parent) = current.parent() else {
            break;
        };
        if label.is_some()
            && parent.is(NodeKind::LabeledStatement)
            && parent.child("label").and_then(Node::name) == label
        {
            label_inside = true;
        }
        if parent.is(NodeKind::TryStatement) && parent.child("finalizer") == Some(current) {
            return !(label.is_some() && label_inside);
        }
        current = parent;
    }
    false
}

fn check(node: Node<'_>, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
    if jumps_out_of_finally(node) {
        ctx.report(Report::node("unsafeUsage", node).data("nodeType", node.kind().as_str()))?;
    }
    Ok(())
}

impl Rule for NoUnsafeFinally {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new()
            .on("ReturnStatement", check)
            .on("ThrowStatement", check)
            .on("BreakStatement", check)
            .on("ContinueStatement", check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estlint_syntax::{parse, ParseOptions};

    fn jumps(text: &str) -> Vec<&'static str> {
        let parsed = parse(text, &ParseOptions::default()).unwrap();
        let mut out = Vec::new();
        parsed.ast.root().walk(|node| {
            if matches!(
                node.kind(),
                NodeKind::ReturnStatement
                    | NodeKind::ThrowStatement
                    | NodeKind::BreakStatement
                    | NodeKind::ContinueStatement
            ) && jumps_out_of_finally(node)
            {
                out.push(node.kind().as_str());
            }
            true
        });
        out
    }

    #[test]
    fn test_jumps_out_of_finally() {
        assert_eq!(jumps("function f() { try {} finally { return 1; } }"), ["ReturnStatement"]);
        assert_eq!(jumps("try {} finally { throw new Error(); }"), ["ThrowStatement"]);
        assert_eq!(
            jumps("while (a) { try {} finally { break; } }"),
            ["BreakStatement"]
        );
        assert_eq!(
            jumps("while (a) { try {} finally { continue; } }"),
            ["ContinueStatement"]
        );
        assert_eq!(
            jumps("label: while (a) { try {} finally { break label; } }"),
            ["BreakStatement"]
        );
    }

    #[test]
    fn test_contained_jumps() {
        assert!(jumps("function f() { try { return 1; } finally { x(); } }").is_empty());
        assert!(jumps("try {} finally { function g() { return 1; } }").is_empty());
        assert!(jumps("try {} finally { (() => { throw e; })(); }").is_empty());
        assert!(jumps("try {} finally { while (a) { break; } }").is_empty());
        assert!(jumps("try {} finally { switch (a) { case 1: break; } }").is_empty());
        assert!(jumps("try {} finally { for (;;) { continue; } }").is_empty());
        assert!(jumps("try {} finally { label: { break label; } }").is_empty());
        assert!(jumps("try {} finally { class C { m() { return 1; } } }").is_empty());
    }

    #[test]
    fn test_continue_ignores_switch() {
        assert_eq!(
            jumps("while (a) { try {} finally { switch (b) { case 1: continue; } } }"),
            ["ContinueStatement"]
        );
    }
}
