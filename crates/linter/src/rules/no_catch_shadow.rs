use crate::context::Report;
use crate::error::RuleError;
use crate::rule::{Listeners, Rule, RuleKind, RuleMeta, RuleOptions};
use crate::rules::utils::scope_bindings;

static META: RuleMeta = RuleMeta {
    name: "no-catch-shadow",
    kind: RuleKind::Suggestion,
    description: "Disallow `catch` clause parameters from shadowing variables in the outer scope",
    recommended: false,
    fixable: None,
    has_suggestions: false,
    messages: &[(
        "mutable",
        "Value of '{{name}}' may be overwritten in IE 8 and earlier.",
    )],
};

/// Lint rule that flags a `catch` parameter named like a binding of an
/// enclosing scope
///
/// Old engines leak the parameter into the enclosing scope, overwriting the
/// outer binding.
pub struct NoCatchShadow;

impl Rule for NoCatchShadow {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on("CatchClause[param.type='Identifier']", |node, ctx| {
            let Some(name) = node.child("param").and_then(|param| param.name()) else {
                return Ok(());
            };
            let shadows = node
                .ancestors()
                .any(|scope| scope_bindings(scope).contains(&name));
            if shadows {
                ctx.report(Report::node("mutable", node).data("name", name))?;
            }
            Ok(())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ConfiguredRule;
    use crate::Linter;
    use estlint_types::Severity;
    use std::sync::Arc;

    fn messages(text: &str) -> Vec<String> {
        let rule = ConfiguredRule::new(Arc::new(NoCatchShadow), Severity::Warn, RuleOptions::empty());
        Linter::with_rules([rule])
            .unwrap()
            .verify(text)
            .unwrap()
            .diagnostics
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_outer_bindings() {
        let expected = ["Value of 'foo' may be overwritten in IE 8 and earlier."];
        assert_eq!(messages("var foo = 1; try { bar(); } catch(foo) { }"), expected);
        assert_eq!(messages("function foo(){} try { bar(); } catch(foo) { }"), expected);
        assert_eq!(messages("function foo(){ try { bar(); } catch(foo) { } }"), expected);
        assert_eq!(messages("var foo = function(){ try { bar(); } catch(foo) { } };"), expected);
        assert_eq!(messages("function f(foo) { try {} catch (foo) {} }"), expected);
        assert_eq!(messages("try {} catch (foo) { try {} catch (foo) {} }"), expected);
        assert_eq!(messages("try {} catch (foo) {} var foo;"), expected);
    }

    #[test]
    fn test_unrelated_names() {
        assert!(messages("var foo = 1; try { bar(); } catch(baz) { }").is_empty());
        assert!(messages("try {} catch (error) {}").is_empty());
        assert!(messages("try {} catch {}").is_empty());
        assert!(messages("function f() { var foo; } try {} catch (foo) {}").is_empty());
        assert!(messages("try {} catch ({foo}) {} var foo;").is_empty());
    }
}
