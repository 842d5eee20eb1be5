//! # estlint rule tester
//!
//! Conformance harness for lint rules. A [`RuleTester`] runs a rule over
//! literal fixtures and checks every declared diagnostic field and the
//! exact fixed output, after validating the rule's metadata once.
//!
//! ```rust,ignore
//! use estlint_rule_tester::RuleTester;
//!
//! #[test]
//! fn no_ex_assign() {
//!     let rule = estlint_linter::find_rule("no-ex-assign").unwrap();
//!     RuleTester::new(rule.clone()).run_json(include_str!("fixtures/no-ex-assign.json"));
//! }
//! ```
//!
//! Cases run in parallel; each case lints on a single thread with its own
//! [`Linter`](estlint_linter::Linter).

mod cases;
mod error;
mod tester;

pub use cases::{
    ErrorMatcher, ExpectedErrors, InvalidCase, SuggestionMatcher, TestCases, ValidCase,
    ValidCaseDetails,
};
pub use error::{CaseError, CaseFailure, CaseKind, ConformanceError};
pub use tester::RuleTester;

use estlint_linter::Diagnostic;

/// One line per diagnostic, as shown in failure messages.
#[must_use]
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diagnostic| {
            let message_id = diagnostic.message_id.unwrap_or("-");
            let node_type = diagnostic.node_type.as_deref().unwrap_or("-");
            format!(
                "  {}:{}-{}:{} [{message_id}] {node_type}: {}",
                diagnostic.line,
                diagnostic.column,
                diagnostic.end_line,
                diagnostic.end_column,
                diagnostic.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use estlint_linter::{
        FixKind, Listeners, Report, Rule, RuleError, RuleKind, RuleMeta, RuleOptions,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    static UPPER: RuleMeta = RuleMeta {
        name: "upper-identifiers",
        kind: RuleKind::Suggestion,
        description: "Identifiers should be uppercase",
        recommended: false,
        fixable: Some(FixKind::Code),
        has_suggestions: true,
        messages: &[
            ("lower", "Identifier '{{name}}' is not uppercase."),
            ("rename", "Rename to '{{upper}}'."),
        ],
    };

    /// Reports lowercase identifiers, fixing them to uppercase and offering
    /// the same change as a suggestion.
    struct UpperIdentifiers;

    impl Rule for UpperIdentifiers {
        fn meta(&self) -> &'static RuleMeta {
            &UPPER
        }

        fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
            Ok(Listeners::new().on("Identifier", |node, ctx| {
                let name = node.name().unwrap_or_default();
                let upper = name.to_uppercase();
                if upper == name {
                    return Ok(());
                }
                let fixed = upper.clone();
                ctx.report(
                    Report::node("lower", node)
                        .data("name", name)
                        .fix(move |fixer| vec![fixer.replace_text(node, fixed)])
                        .suggest("rename", vec![("upper", upper.clone())], move |fixer| {
                            vec![fixer.replace_text(node, upper)]
                        }),
                )
            }))
        }
    }

    fn tester() -> RuleTester {
        RuleTester::new(Arc::new(UpperIdentifiers))
    }

    fn failure(fixture: &str) -> CaseError {
        match tester().check_json(fixture) {
            Err(ConformanceError::Cases { mut failures, .. }) => failures.remove(0).reason,
            other => panic!("expected a case failure, got {other:?}"),
        }
    }

    #[test]
    fn test_passing_fixture() {
        tester().run_json(
            r#"{
                "valid": ["FOO;", "A + B;"],
                "invalid": [{
                    "code": "foo;",
                    "output": "FOO;",
                    "errors": [{
                        "messageId": "lower",
                        "data": { "name": "foo" },
                        "type": "Identifier",
                        "line": 1, "column": 1, "endLine": 1, "endColumn": 4,
                        "suggestions": [{ "messageId": "rename", "data": { "upper": "FOO" }, "output": "FOO;" }]
                    }]
                }, {
                    "code": "a + b;",
                    "output": "A + B;",
                    "errors": ["Identifier 'a' is not uppercase.", "Identifier 'b' is not uppercase."]
                }]
            }"#,
        );
    }

    #[test]
    fn test_valid_case_with_errors() {
        let reason = failure(r#"{ "valid": ["foo;"] }"#);
        assert_eq!(
            reason,
            CaseError::UnexpectedErrors {
                count: 1,
                diagnostics: "  1:1-1:4 [lower] Identifier: Identifier 'foo' is not uppercase."
                    .to_string(),
            }
        );
    }

    #[test]
    fn test_error_count_mismatch() {
        let reason = failure(r#"{ "invalid": [{ "code": "a + b;", "output": "A + B;", "errors": 1 }] }"#);
        assert!(matches!(
            reason,
            CaseError::ErrorCount { expected: 1, actual: 2, .. }
        ));
    }

    #[test]
    fn test_field_mismatches_name_the_field() {
        let reason = failure(
            r#"{ "invalid": [{ "code": "foo;", "output": "FOO;", "errors": [{ "messageId": "lower", "column": 2 }] }] }"#,
        );
        assert_eq!(
            reason.to_string(),
            "error 0: column should be 2 but was 1"
        );

        let reason = failure(
            r#"{ "invalid": [{ "code": "foo;", "output": "FOO;", "errors": [{ "messageId": "lower", "data": { "name": "bar" } }] }] }"#,
        );
        assert!(matches!(reason, CaseError::Field { field: "message", .. }));

        let reason = failure(
            r#"{ "invalid": [{ "code": "foo;", "output": "FOO;", "errors": [{ "messageId": "missing" }] }] }"#,
        );
        assert!(matches!(reason, CaseError::UnknownMessageId { .. }));

        let reason = failure(
            r#"{ "invalid": [{ "code": "foo;", "output": "FOO;", "errors": [{ "messageId": "lower", "message": "x" }] }] }"#,
        );
        assert_eq!(reason, CaseError::MessageAndMessageId { index: 0 });
    }

    #[test]
    fn test_suggestion_output_mismatch() {
        let reason = failure(
            r#"{ "invalid": [{ "code": "foo;", "output": "FOO;", "errors": [{ "suggestions": [{ "output": "foo;" }] }] }] }"#,
        );
        assert!(matches!(
            reason,
            CaseError::Suggestion { field: "output", suggestion: 0, .. }
        ));
    }

    #[test]
    fn test_output_rules() {
        let reason = failure(r#"{ "invalid": [{ "code": "foo;", "errors": 1 }] }"#);
        assert_eq!(
            reason,
            CaseError::MissingOutput {
                actual: "FOO;".to_string()
            }
        );

        let reason = failure(r#"{ "invalid": [{ "code": "foo;", "output": null, "errors": 1 }] }"#);
        assert!(matches!(reason, CaseError::Output { .. }));

        let reason = failure(r#"{ "invalid": [{ "code": "foo;", "output": "foo;", "errors": 1 }] }"#);
        assert_eq!(reason, CaseError::OutputSameAsCode);
    }

    #[test]
    fn test_parse_errors_fail_the_case() {
        let reason = failure(r#"{ "valid": ["var = ;"] }"#);
        assert!(matches!(reason, CaseError::Parse(message) if message.starts_with("Parsing error: ")));
    }

    #[test]
    fn test_options_are_validated() {
        let reason = failure(r#"{ "valid": [{ "code": "FOO;", "options": ["always"] }] }"#);
        assert!(matches!(reason, CaseError::Setup(_)));
    }

    #[test]
    fn test_duplicate_cases() {
        let err = tester()
            .check_json(r#"{ "valid": ["FOO;", "FOO;"] }"#)
            .unwrap_err();
        assert_eq!(err.to_string(), r#"duplicate valid test case: "FOO;""#);
    }

    #[test]
    fn test_failure_report_lists_every_case() {
        let err = tester()
            .check_json(r#"{ "valid": ["foo;", "FOO;", "bar;"] }"#)
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r#"
        2 case(s) failed for rule 'upper-identifiers':
        valid[0] "foo;": should have no errors but had 1:
          1:1-1:4 [lower] Identifier: Identifier 'foo' is not uppercase.
        valid[2] "bar;": should have no errors but had 1:
          1:1-1:4 [lower] Identifier: Identifier 'bar' is not uppercase.
        "#);
    }

    static BROKEN: RuleMeta = RuleMeta {
        name: "broken-meta",
        kind: RuleKind::Problem,
        description: "Declares an unbalanced template",
        recommended: false,
        fixable: None,
        has_suggestions: false,
        messages: &[("oops", "Missing {{name.")],
    };

    struct BrokenMeta;

    impl Rule for BrokenMeta {
        fn meta(&self) -> &'static RuleMeta {
            &BROKEN
        }

        fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
            Ok(Listeners::new())
        }
    }

    #[test]
    fn test_meta_is_checked_before_cases() {
        let err = RuleTester::new(Arc::new(BrokenMeta))
            .check(&TestCases::default())
            .unwrap_err();
        assert!(matches!(err, ConformanceError::Meta { .. }));
        assert_eq!(
            err.to_string(),
            r#"rule 'broken-meta' has invalid metadata: message 'oops' has unbalanced placeholders: "Missing {{name.""#
        );
    }
}
