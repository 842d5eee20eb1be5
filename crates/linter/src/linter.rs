use crate::config::LintConfig;
use crate::diagnostics::{sort_reports, Diagnostic};
use crate::dispatcher::{ConfiguredRule, Dispatcher, SelectorCache};
use crate::error::{LintError, ListenerFailure};
use crate::fixer::{
    apply_fixes, select_fixes, AppliedFix, Candidate, FixOptions, FixReport, FixStatus,
    FixedDiagnostic, Termination,
};
use crate::registry;
use crate::source_code::SourceCode;
use estlint_syntax::{JsParser, ParseError, ParseOptions, SourceParser};
use estlint_types::{Fix, LineIndex};
use std::sync::Arc;

/// Diagnostics for one source text.
#[derive(Debug, Default)]
pub struct LintResult {
    /// Sorted by range start, then rule registration order
    pub diagnostics: Vec<Diagnostic>,
    /// Listeners that failed; their rules stopped for the rest of the pass
    pub failures: Vec<ListenerFailure>,
    /// Dropped fixes and similar non-fatal problems
    pub warnings: Vec<String>,
}

impl LintResult {
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Whether the text failed to parse.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.fatal)
    }
}

/// One pass over one text.
struct Pass {
    /// Diagnostics with the registration index of the reporting rule
    diagnostics: Vec<(Diagnostic, Option<usize>)>,
    failures: Vec<ListenerFailure>,
    warnings: Vec<String>,
    parsed: bool,
}

/// Runs configured rules over source text.
pub struct Linter {
    rules: Vec<ConfiguredRule>,
    selectors: SelectorCache,
    parser: Arc<dyn SourceParser>,
    parse_options: ParseOptions,
    compute_fixes: bool,
}

impl Linter {
    /// Create a linter running the registry's rules as configured.
    ///
    /// The config is validated first: unknown rules and options rejected by
    /// a rule's schema fail here, before any source is parsed.
    pub fn new(config: &LintConfig) -> Result<Self, LintError> {
        config.validate(registry::all_rules())?;

        let mut rules = Vec::new();
        for rule in registry::all_rules() {
            let rule_name = rule.name();
            let severity = config.severity_of(rule_name);
            if !severity.is_enabled() {
                tracing::trace!(rule = rule_name, "Rule not enabled, skipping");
                continue;
            }
            rules.push(ConfiguredRule::new(
                Arc::clone(rule),
                severity,
                config.options_of(rule_name),
            ));
        }

        tracing::debug!(rules_count = rules.len(), "Linter configured");
        Self::from_validated(rules)
    }

    /// Create a linter from an explicit list of rules, in registration
    /// order. Each rule's options are checked against its schema.
    pub fn with_rules(rules: impl IntoIterator<Item = ConfiguredRule>) -> Result<Self, LintError> {
        let mut enabled = Vec::new();
        for configured in rules {
            if !configured.severity.is_enabled() {
                tracing::trace!(rule = configured.id(), "Rule not enabled, skipping");
                continue;
            }
            configured
                .rule
                .schema()
                .validate(configured.id(), &configured.options)?;
            enabled.push(configured);
        }
        Self::from_validated(enabled)
    }

    /// Every rule's listeners are created and their selectors compiled once
    /// here, so a bad selector fails construction instead of the first
    /// [`verify`](Self::verify).
    fn from_validated(rules: Vec<ConfiguredRule>) -> Result<Self, LintError> {
        let selectors = SelectorCache::compile(&rules)?;
        Ok(Self {
            rules,
            selectors,
            parser: Arc::new(JsParser),
            parse_options: ParseOptions::default(),
            compute_fixes: true,
        })
    }

    /// Replace the parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_parse_options(mut self, parse_options: ParseOptions) -> Self {
        self.parse_options = parse_options;
        self
    }

    /// Whether [`verify`](Self::verify) runs fix functions and attaches
    /// fixes to diagnostics. On by default.
    #[must_use]
    pub fn with_compute_fixes(mut self, compute_fixes: bool) -> Self {
        self.compute_fixes = compute_fixes;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[ConfiguredRule] {
        &self.rules
    }

    #[must_use]
    pub const fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    /// Lint `text` once without changing it.
    #[tracing::instrument(skip_all, fields(len = text.len()))]
    pub fn verify(&self, text: &str) -> Result<LintResult, LintError> {
        let pass = self.run_pass(text, self.compute_fixes)?;
        Ok(LintResult {
            diagnostics: pass.diagnostics.into_iter().map(|(d, _)| d).collect(),
            failures: pass.failures,
            warnings: pass.warnings,
        })
    }

    /// Lint `text`, applying fixes pass after pass until nothing is left to
    /// apply or `options.max_passes` passes have applied fixes.
    #[tracing::instrument(skip_all, fields(len = text.len(), max_passes = options.max_passes))]
    pub fn verify_and_fix(&self, text: &str, options: &FixOptions) -> Result<FixReport, LintError> {
        let mut output = text.to_string();
        let mut applied = Vec::new();
        let mut diagnostics = Vec::new();
        let mut warnings = Vec::new();
        let mut passes = 0;

        let (last, termination) = loop {
            let pass = self.run_pass(&output, true)?;
            warnings.extend(pass.warnings.iter().cloned());

            if !pass.parsed {
                break (pass, Termination::ParseFailure);
            }

            let eligible: Vec<Candidate<'_>> = pass
                .diagnostics
                .iter()
                .enumerate()
                .filter_map(|(index, (diagnostic, rule_index))| {
                    let rule_index = (*rule_index)?;
                    let fix = diagnostic.fix.as_ref()?;
                    options
                        .fix_kinds
                        .contains(&self.rules[rule_index].kind())
                        .then_some(Candidate {
                            index,
                            rule_index,
                            fix,
                        })
                })
                .collect();

            if eligible.is_empty() {
                break (pass, Termination::Converged);
            }
            if passes >= options.max_passes {
                break (pass, Termination::PassCap);
            }

            passes += 1;
            let (accepted, deferred) = select_fixes(eligible);
            tracing::debug!(
                pass = passes,
                accepted = accepted.len(),
                deferred,
                "Applying fixes"
            );

            let fixes: Vec<&Fix> = accepted.iter().map(|c| c.fix).collect();
            let rewritten = apply_fixes(&output, &fixes);

            for candidate in &accepted {
                let (diagnostic, _) = &pass.diagnostics[candidate.index];
                applied.push(AppliedFix {
                    pass: passes,
                    rule_id: diagnostic.rule_id.unwrap_or_default(),
                    message_id: diagnostic.message_id.unwrap_or_default(),
                    range: candidate.fix.range,
                    text: candidate.fix.text.clone(),
                });
                diagnostics.push(FixedDiagnostic {
                    diagnostic: diagnostic.clone(),
                    status: FixStatus::Applied { pass: passes },
                });
            }
            output = rewritten;
        };

        tracing::debug!(passes, ?termination, "Fix loop finished");

        diagnostics.extend(last.diagnostics.into_iter().map(|(diagnostic, _)| {
            let status = if diagnostic.has_fix() {
                FixStatus::Unapplied
            } else {
                FixStatus::NoFix
            };
            FixedDiagnostic { diagnostic, status }
        }));

        Ok(FixReport {
            output,
            passes,
            termination,
            applied,
            diagnostics,
            failures: last.failures,
            warnings,
        })
    }

    fn run_pass(&self, text: &str, compute_fixes: bool) -> Result<Pass, LintError> {
        let parsed = match self.parser.parse(text, &self.parse_options) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(error = %err, "Source has parse errors, skipping rules");
                return Ok(Pass {
                    diagnostics: vec![(parse_failure(text, &err), None)],
                    failures: Vec::new(),
                    warnings: Vec::new(),
                    parsed: false,
                });
            }
        };

        let source = SourceCode::new(text, &parsed);
        let dispatcher = Dispatcher::new(&self.rules, &self.selectors)?;
        let mut output = dispatcher.run(&source, compute_fixes);
        sort_reports(&mut output.reports);

        tracing::debug!(
            diagnostics = output.reports.len(),
            failures = output.failures.len(),
            "Pass complete"
        );

        Ok(Pass {
            diagnostics: output
                .reports
                .into_iter()
                .map(|r| (r.report.diagnostic, Some(r.rule_index)))
                .collect(),
            failures: output.failures,
            warnings: output.warnings,
            parsed: true,
        })
    }
}

impl std::fmt::Debug for Linter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linter")
            .field("rules", &self.rules)
            .field("parse_options", &self.parse_options)
            .field("compute_fixes", &self.compute_fixes)
            .finish_non_exhaustive()
    }
}

fn parse_failure(text: &str, err: &ParseError) -> Diagnostic {
    let offset = err.offset.min(text.len());
    let position = LineIndex::new(text).position(text, offset);
    Diagnostic::parse_failure(&err.message, offset, position.line, position.column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LintRuleConfig;
    use estlint_types::Severity;

    fn linter(rules: &[(&str, LintRuleConfig)]) -> Linter {
        let mut config = LintConfig::default();
        for (name, rule) in rules {
            config = config.with_rule(name, rule.clone());
        }
        Linter::new(&config).unwrap()
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let linter = linter(&[("no-ex-assign", LintRuleConfig::Severity(Severity::Error))]);
        let result = linter.verify("var = ;\n").unwrap();
        assert!(result.is_fatal());
        assert_eq!(result.diagnostics.len(), 1);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.rule_id, None);
        assert!(diagnostic.message.starts_with("Parsing error: "));
        assert_eq!((diagnostic.line, diagnostic.column), (1, 5));
    }

    #[test]
    fn test_disabled_rules_are_not_run() {
        let linter = linter(&[("no-ex-assign", LintRuleConfig::Severity(Severity::Off))]);
        assert!(linter.rules().is_empty());
        let result = linter.verify("try {} catch (e) { e = 1; }").unwrap();
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_severity_is_applied() {
        let linter = linter(&[("no-ex-assign", LintRuleConfig::Severity(Severity::Warn))]);
        let result = linter.verify("try {} catch (e) { e = 1; }").unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Warn);
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn test_unknown_rule_fails_before_linting() {
        let config = LintConfig::default()
            .with_rule("no-ex-asign", LintRuleConfig::Severity(Severity::Error));
        let err = Linter::new(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown rule 'no-ex-asign', did you mean 'no-ex-assign'?"
        );
    }

    #[test]
    fn test_selectors_are_compiled_at_construction() {
        let linter = linter(&[
            ("no-ex-assign", LintRuleConfig::Severity(Severity::Error)),
            ("no-unsafe-finally", LintRuleConfig::Severity(Severity::Error)),
        ]);
        for pattern in [
            "CatchClause[param]",
            "ReturnStatement",
            "ThrowStatement",
            "BreakStatement",
            "ContinueStatement",
        ] {
            assert!(linter.selectors.contains(pattern), "{pattern} not compiled");
        }
        assert!(!linter.selectors.contains("Identifier"));

        let report = linter
            .verify_and_fix("try {} finally { return 1; }", &FixOptions::default())
            .unwrap();
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_fix_loop_with_nothing_to_fix() {
        let linter = linter(&[("object-shorthand", LintRuleConfig::Severity(Severity::Warn))]);
        let report = linter
            .verify_and_fix("var x = {a, b() {}};", &FixOptions::default())
            .unwrap();
        assert_eq!(report.output, "var x = {a, b() {}};");
        assert_eq!(report.passes, 0);
        assert_eq!(report.termination, Termination::Converged);
        assert!(!report.fixed());
    }

    #[test]
    fn test_fix_kinds_filter() {
        let linter = linter(&[("object-shorthand", LintRuleConfig::Severity(Severity::Warn))]);
        let options = FixOptions::default().with_fix_kinds(vec![crate::rule::RuleKind::Layout]);
        let report = linter.verify_and_fix("var x = {a: a};", &options).unwrap();
        assert_eq!(report.output, "var x = {a: a};");
        assert_eq!(report.termination, Termination::Converged);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].status, FixStatus::Unapplied);
    }

    #[test]
    fn test_zero_pass_cap() {
        let linter = linter(&[("object-shorthand", LintRuleConfig::Severity(Severity::Warn))]);
        let options = FixOptions::default().with_max_passes(0);
        let report = linter.verify_and_fix("var x = {a: a};", &options).unwrap();
        assert_eq!(report.output, "var x = {a: a};");
        assert_eq!(report.termination, Termination::PassCap);
        assert_eq!(report.diagnostics[0].status, FixStatus::Unapplied);
    }
}
