use crate::context::Report;
use crate::error::RuleError;
use crate::rule::{Listeners, Rule, RuleKind, RuleMeta, RuleOptions};

static META: RuleMeta = RuleMeta {
    name: "no-async-promise-executor",
    kind: RuleKind::Problem,
    description: "Disallow using an async function as a Promise executor",
    recommended: true,
    fixable: None,
    has_suggestions: false,
    messages: &[("async", "Promise executor functions should not be async.")],
};

/// Lint rule that flags `new Promise(async (resolve, reject) => {})`
///
/// Errors thrown inside an async executor are lost instead of rejecting the
/// promise. The report points at the `async` keyword.
pub struct NoAsyncPromiseExecutor;

impl Rule for NoAsyncPromiseExecutor {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on(
            "NewExpression[callee.name='Promise'][arguments.0.async=true]",
            |node, ctx| {
                let Some(executor) = node.children("arguments").first().copied() else {
                    return Ok(());
                };
                let report = match ctx
                    .source()
                    .first_token_by(executor, |token| token.value == "async")
                {
                    Some(token) => Report::token("async", token),
                    None => Report::node("async", executor),
                };
                ctx.report(report)
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ConfiguredRule;
    use crate::Linter;
    use estlint_types::Severity;
    use std::sync::Arc;

    fn lint(text: &str) -> Vec<(u32, u32, u32, u32)> {
        let rule = ConfiguredRule::new(
            Arc::new(NoAsyncPromiseExecutor),
            Severity::Error,
            RuleOptions::empty(),
        );
        let linter = Linter::with_rules([rule]).unwrap();
        linter
            .verify(text)
            .unwrap()
            .diagnostics
            .iter()
            .map(|d| (d.line, d.column, d.end_line, d.end_column))
            .collect()
    }

    #[test]
    fn test_reports_async_keyword() {
        assert_eq!(lint("new Promise(async (resolve) => {})"), [(1, 13, 1, 18)]);
        assert_eq!(
            lint("new Promise(async function foo(resolve, reject) {})"),
            [(1, 13, 1, 18)]
        );
    }

    #[test]
    fn test_ignores_sync_executors_and_other_callees() {
        assert!(lint("new Promise((resolve, reject) => {})").is_empty());
        assert!(lint("new Promise(((resolve, reject) => {}).bind(this))").is_empty());
        assert!(lint("new Foo(async (resolve, reject) => {})").is_empty());
        assert!(lint("Promise(async (resolve) => {})").is_empty());
    }
}
