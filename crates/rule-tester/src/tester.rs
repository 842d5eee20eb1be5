use crate::cases::{
    ErrorMatcher, ExpectedErrors, InvalidCase, SuggestionMatcher, TestCases, ValidCase,
};
use crate::error::{CaseError, CaseFailure, CaseKind, ConformanceError};
use crate::format_diagnostics;
use estlint_linter::{
    interpolate, ConfiguredRule, Diagnostic, FixOptions, LintError, LintResult, Linter, Rule,
    RuleOptions, Suggestion,
};
use estlint_syntax::ParseOptions;
use estlint_types::Severity;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Runs fixture cases against one rule.
///
/// ```rust,ignore
/// RuleTester::new(Arc::new(NoExAssign)).run(&TestCases {
///     valid: vec!["try {} catch (e) { x = e; }".into()],
///     invalid: vec![InvalidCase::new(
///         "try {} catch (e) { e = 1; }",
///         vec![ErrorMatcher::message_id("unexpected").at(1, 20)],
///     )],
/// });
/// ```
pub struct RuleTester {
    rule: Arc<dyn Rule>,
    parse_options: ParseOptions,
}

impl RuleTester {
    #[must_use]
    pub fn new(rule: Arc<dyn Rule>) -> Self {
        Self {
            rule,
            parse_options: ParseOptions::default(),
        }
    }

    /// Parse options for cases that do not set their own.
    #[must_use]
    pub fn with_parse_options(mut self, parse_options: ParseOptions) -> Self {
        self.parse_options = parse_options;
        self
    }

    /// Run `cases`, panicking with every failure.
    ///
    /// # Panics
    ///
    /// Panics when the rule does not conform.
    pub fn run(&self, cases: &TestCases) {
        if let Err(err) = self.check(cases) {
            panic!("{err}");
        }
    }

    /// Run cases read from a JSON fixture, panicking with every failure.
    ///
    /// # Panics
    ///
    /// Panics when the fixture is malformed or the rule does not conform.
    pub fn run_json(&self, fixture: &str) {
        if let Err(err) = self.check_json(fixture) {
            panic!("{err}");
        }
    }

    pub fn check_json(&self, fixture: &str) -> Result<(), ConformanceError> {
        let cases = TestCases::from_json(fixture)?;
        self.check(&cases)
    }

    /// Check the rule's metadata, then every case.
    #[tracing::instrument(skip_all, fields(rule = self.rule.name()))]
    pub fn check(&self, cases: &TestCases) -> Result<(), ConformanceError> {
        check_meta(self.rule.as_ref())?;
        check_duplicates(cases)?;

        let valid = cases.valid.par_iter().enumerate().filter_map(|(index, case)| {
            self.run_valid(case).err().map(|reason| CaseFailure {
                kind: CaseKind::Valid,
                index,
                code: case.code().to_string(),
                reason,
            })
        });
        let invalid = cases.invalid.par_iter().enumerate().filter_map(|(index, case)| {
            self.run_invalid(case).err().map(|reason| CaseFailure {
                kind: CaseKind::Invalid,
                index,
                code: case.code.clone(),
                reason,
            })
        });
        let failures: Vec<CaseFailure> = valid.chain(invalid).collect();

        tracing::debug!(
            valid = cases.valid.len(),
            invalid = cases.invalid.len(),
            failed = failures.len(),
            "Conformance run finished"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConformanceError::Cases {
                rule_id: self.rule.name().to_string(),
                failures,
            })
        }
    }

    fn linter(
        &self,
        options: &[Value],
        parse_options: Option<ParseOptions>,
    ) -> Result<Linter, CaseError> {
        let configured = ConfiguredRule::new(
            Arc::clone(&self.rule),
            Severity::Error,
            RuleOptions::new(options.to_vec()),
        );
        let linter = Linter::with_rules([configured]).map_err(|err| CaseError::Setup(err.to_string()))?;
        Ok(linter.with_parse_options(parse_options.unwrap_or(self.parse_options)))
    }

    fn run_valid(&self, case: &ValidCase) -> Result<(), CaseError> {
        let linter = self.linter(case.options(), case.parse_options())?;
        let result = lint(&linter, case.code())?;
        if result.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(CaseError::UnexpectedErrors {
                count: result.diagnostics.len(),
                diagnostics: format_diagnostics(&result.diagnostics),
            })
        }
    }

    fn run_invalid(&self, case: &InvalidCase) -> Result<(), CaseError> {
        let linter = self.linter(&case.options, case.parse_options)?;
        let result = lint(&linter, &case.code)?;

        let expected = case.expected_count();
        if result.diagnostics.len() != expected {
            return Err(CaseError::ErrorCount {
                expected,
                actual: result.diagnostics.len(),
                diagnostics: format_diagnostics(&result.diagnostics),
            });
        }
        if let ExpectedErrors::List(matchers) = &case.errors {
            for (index, (matcher, diagnostic)) in matchers.iter().zip(&result.diagnostics).enumerate()
            {
                self.match_error(index, matcher, diagnostic, &case.code)?;
            }
        }

        self.check_output(&linter, case)
    }

    fn check_output(&self, linter: &Linter, case: &InvalidCase) -> Result<(), CaseError> {
        let options = FixOptions::default().with_max_passes(case.passes);
        let report = linter
            .verify_and_fix(&case.code, &options)
            .map_err(|err| setup_error(&err))?;
        let actual = report.output;

        match &case.output {
            Some(Some(expected)) => {
                if *expected == case.code {
                    return Err(CaseError::OutputSameAsCode);
                }
                if self.rule.meta().fixable.is_none() {
                    return Err(CaseError::OutputForNonFixable);
                }
                if actual != *expected {
                    return Err(CaseError::Output {
                        expected: expected.clone(),
                        actual,
                    });
                }
            }
            Some(None) => {
                if actual != case.code {
                    return Err(CaseError::Output {
                        expected: case.code.clone(),
                        actual,
                    });
                }
            }
            None => {
                if actual != case.code {
                    return Err(CaseError::MissingOutput { actual });
                }
            }
        }
        Ok(())
    }

    fn match_error(
        &self,
        index: usize,
        matcher: &ErrorMatcher,
        diagnostic: &Diagnostic,
        code: &str,
    ) -> Result<(), CaseError> {
        let meta = self.rule.meta();
        let field = |field: &'static str, expected: String, actual: String| CaseError::Field {
            index,
            field,
            expected,
            actual,
        };

        if matcher.message.is_some() && matcher.message_id.is_some() {
            return Err(CaseError::MessageAndMessageId { index });
        }
        if let Some(message) = &matcher.message {
            if *message != diagnostic.message {
                return Err(field("message", quoted(message), quoted(&diagnostic.message)));
            }
        }
        if let Some(message_id) = &matcher.message_id {
            let Some(template) = meta.message(message_id) else {
                return Err(CaseError::UnknownMessageId {
                    index,
                    message_id: message_id.clone(),
                });
            };
            let actual = diagnostic.message_id.unwrap_or_default();
            if message_id != actual {
                return Err(field("messageId", quoted(message_id), quoted(actual)));
            }
            if let Some(data) = &matcher.data {
                let rendered = interpolate(template, &data_pairs(data));
                if rendered != diagnostic.message {
                    return Err(field("message", quoted(&rendered), quoted(&diagnostic.message)));
                }
            }
        }
        if let Some(node_type) = &matcher.node_type {
            let actual = diagnostic.node_type.as_deref().unwrap_or_default();
            if node_type != actual {
                return Err(field("type", quoted(node_type), quoted(actual)));
            }
        }

        let positions = [
            ("line", matcher.line, diagnostic.line),
            ("column", matcher.column, diagnostic.column),
            ("endLine", matcher.end_line, diagnostic.end_line),
            ("endColumn", matcher.end_column, diagnostic.end_column),
        ];
        for (name, expected, actual) in positions {
            if let Some(expected) = expected {
                if expected != actual {
                    return Err(field(name, expected.to_string(), actual.to_string()));
                }
            }
        }

        if let Some(suggestions) = &matcher.suggestions {
            self.match_suggestions(index, suggestions, &diagnostic.suggestions, code)?;
        }
        Ok(())
    }

    fn match_suggestions(
        &self,
        index: usize,
        expected: &[SuggestionMatcher],
        actual: &[Suggestion],
        code: &str,
    ) -> Result<(), CaseError> {
        if expected.len() != actual.len() {
            return Err(CaseError::Field {
                index,
                field: "suggestions",
                expected: format!("{} suggestion(s)", expected.len()),
                actual: format!("{} suggestion(s)", actual.len()),
            });
        }

        let meta = self.rule.meta();
        for (suggestion, (matcher, actual)) in expected.iter().zip(actual).enumerate() {
            let mismatch = |field: &'static str, expected: String, actual: String| {
                CaseError::Suggestion {
                    index,
                    suggestion,
                    field,
                    expected,
                    actual,
                }
            };

            if let Some(message_id) = &matcher.message_id {
                if meta.message(message_id).is_none() {
                    return Err(CaseError::UnknownMessageId {
                        index,
                        message_id: message_id.clone(),
                    });
                }
                if message_id != actual.message_id {
                    return Err(mismatch("messageId", quoted(message_id), quoted(actual.message_id)));
                }
                if let (Some(data), Some(template)) = (&matcher.data, meta.message(message_id)) {
                    let rendered = interpolate(template, &data_pairs(data));
                    if rendered != actual.desc {
                        return Err(mismatch("desc", quoted(&rendered), quoted(&actual.desc)));
                    }
                }
            }
            if let Some(desc) = &matcher.desc {
                if *desc != actual.desc {
                    return Err(mismatch("desc", quoted(desc), quoted(&actual.desc)));
                }
            }

            let output = actual.fix.apply(code).unwrap_or_else(|| code.to_string());
            if output != matcher.output {
                return Err(mismatch("output", quoted(&matcher.output), quoted(&output)));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RuleTester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleTester")
            .field("rule", &self.rule.name())
            .field("parse_options", &self.parse_options)
            .finish()
    }
}

/// Lint once, turning parse errors and listener failures into case errors.
fn lint(linter: &Linter, code: &str) -> Result<LintResult, CaseError> {
    let result = linter.verify(code).map_err(|err| setup_error(&err))?;
    if let Some(fatal) = result.diagnostics.iter().find(|d| d.fatal) {
        return Err(CaseError::Parse(fatal.message.clone()));
    }
    if let Some(failure) = result.failures.first() {
        return Err(CaseError::Listener(failure.to_string()));
    }
    Ok(result)
}

fn setup_error(err: &LintError) -> CaseError {
    CaseError::Setup(err.to_string())
}

fn quoted(text: &str) -> String {
    format!("{text:?}")
}

fn data_pairs(data: &BTreeMap<String, String>) -> Vec<(&str, &str)> {
    data.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Static checks of a rule's metadata and schema.
pub(crate) fn check_meta(rule: &dyn Rule) -> Result<(), ConformanceError> {
    let meta = rule.meta();
    let invalid = |message: String| ConformanceError::Meta {
        rule_id: meta.name.to_string(),
        message,
    };

    if meta.messages.is_empty() {
        return Err(invalid("message catalog is empty".to_string()));
    }
    let mut seen = HashSet::new();
    for (id, template) in meta.messages {
        if !seen.insert(*id) {
            return Err(invalid(format!("message id '{id}' is declared twice")));
        }
        if template.matches("{{").count() != template.matches("}}").count() {
            return Err(invalid(format!(
                "message '{id}' has unbalanced placeholders: {template:?}"
            )));
        }
    }
    rule.schema()
        .compile(meta.name)
        .map_err(|err| invalid(err.to_string()))?;
    Ok(())
}

fn check_duplicates(cases: &TestCases) -> Result<(), ConformanceError> {
    let mut seen = HashSet::new();
    for case in &cases.valid {
        let key = serde_json::to_string(&(case.code(), case.options(), case.parse_options()))?;
        if !seen.insert(key) {
            return Err(ConformanceError::DuplicateCase {
                kind: CaseKind::Valid,
                code: case.code().to_string(),
            });
        }
    }

    let mut seen = HashSet::new();
    for case in &cases.invalid {
        let key = serde_json::to_string(case)?;
        if !seen.insert(key) {
            return Err(ConformanceError::DuplicateCase {
                kind: CaseKind::Invalid,
                code: case.code.clone(),
            });
        }
    }
    Ok(())
}
