//! Integration tests for the linter
//!
//! These tests drive the public API end to end: configuration, the
//! built-in rules, dispatch and the multi-pass fix loop.

use estlint_linter::{
    ConfiguredRule, FixKind, FixOptions, FixStatus, LintConfig, LintError, LintRuleConfig, Linter,
    Listeners, Report, Rule, RuleError, RuleKind, RuleMeta, RuleOptions, Termination,
};
use estlint_syntax::{JsParser, ParseError, ParseOptions, Parsed, SourceParser};
use estlint_types::{OffsetRange, Severity};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn recommended() -> Linter {
    Linter::new(&LintConfig::recommended()).unwrap()
}

fn with_rule(name: &str, rule: LintRuleConfig) -> Linter {
    Linter::new(&LintConfig::default().with_rule(name, rule)).unwrap()
}

fn configured(rule: impl Rule + 'static) -> ConfiguredRule {
    ConfiguredRule::new(Arc::new(rule), Severity::Error, RuleOptions::empty())
}

#[test]
fn test_async_promise_executor() {
    let result = recommended()
        .verify("new Promise(async (resolve) => {})")
        .unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.rule_id, Some("no-async-promise-executor"));
    assert_eq!(diagnostic.message_id, Some("async"));
    assert!(diagnostic.fix.is_none());
}

#[test]
fn test_unsafe_finally_return() {
    let result = recommended().verify("try {} finally { return 1; }").unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.message_id, Some("unsafeUsage"));
    assert_eq!(diagnostic.node_type.as_deref(), Some("ReturnStatement"));
    assert_eq!(diagnostic.message, "Unsafe usage of ReturnStatement.");
    assert_eq!((diagnostic.column, diagnostic.end_column), (18, 27));
}

#[test]
fn test_object_shorthand_single_pass() {
    let linter = with_rule(
        "object-shorthand",
        LintRuleConfig::Severity(Severity::Warn),
    );
    let text = "var x = {y: y, x: x}";

    let result = linter.verify(text).unwrap();
    let ids: Vec<_> = result.diagnostics.iter().map(|d| d.message_id).collect();
    assert_eq!(ids, [Some("expectedPropertyShorthand"); 2]);

    let report = linter
        .verify_and_fix(text, &FixOptions::default().with_max_passes(1))
        .unwrap();
    assert_eq!(report.output, "var x = {y, x}");
    assert_eq!(report.passes, 1);
    assert_eq!(report.termination, Termination::Converged);
    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.remaining().count(), 0);
}

#[test]
fn test_ex_assign_has_no_fix() {
    let result = recommended()
        .verify("try { } catch (ex) { ex = 10; }")
        .unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.message_id, Some("unexpected"));
    assert_eq!(diagnostic.node_type.as_deref(), Some("Identifier"));
    assert_eq!(diagnostic.range, OffsetRange::new(21, 23));
    assert!(diagnostic.fix.is_none());
}

static SWAP: RuleMeta = RuleMeta {
    name: "swap-assignment",
    kind: RuleKind::Suggestion,
    description: "Rewrite `x = a` as `a = x`",
    recommended: false,
    fixable: Some(FixKind::Code),
    has_suggestions: false,
    messages: &[("swap", "Swap the assignment.")],
};

struct SwapAssignment;

impl Rule for SwapAssignment {
    fn meta(&self) -> &'static RuleMeta {
        &SWAP
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on(
            "AssignmentExpression[left.name='x'][right.type='Identifier']",
            |node, ctx| {
                let Some(right) = node.child("right").and_then(|right| right.name()) else {
                    return Ok(());
                };
                let replacement = format!("{right} = x");
                ctx.report(
                    Report::node("swap", node)
                        .fix(move |fixer| vec![fixer.replace_text(node, replacement)]),
                )
            },
        ))
    }
}

static RENAME: RuleMeta = RuleMeta {
    name: "rename-a",
    kind: RuleKind::Suggestion,
    description: "Rename `a` to `b`",
    recommended: false,
    fixable: Some(FixKind::Code),
    has_suggestions: false,
    messages: &[("rename", "Rename '{{name}}'.")],
};

struct RenameA;

impl Rule for RenameA {
    fn meta(&self) -> &'static RuleMeta {
        &RENAME
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on("Identifier[name='a']", |node, ctx| {
            ctx.report(
                Report::node("rename", node)
                    .data("name", "a")
                    .fix(move |fixer| vec![fixer.replace_text(node, "b")]),
            )
        }))
    }
}

#[test]
fn test_overlapping_fixes_across_passes() {
    let linter = Linter::with_rules([configured(RenameA), configured(SwapAssignment)]).unwrap();
    let report = linter
        .verify_and_fix("x = a;", &FixOptions::default())
        .unwrap();

    assert_eq!(report.output, "b = x;");
    assert_eq!(report.passes, 2);
    assert_eq!(report.termination, Termination::Converged);
    let applied: Vec<_> = report
        .applied
        .iter()
        .map(|fix| (fix.pass, fix.rule_id, fix.text.as_str()))
        .collect();
    assert_eq!(
        applied,
        [(1, "swap-assignment", "a = x"), (2, "rename-a", "b")]
    );
}

#[test]
fn test_pass_cap_leaves_fixes_unapplied() {
    let linter = Linter::with_rules([configured(RenameA), configured(SwapAssignment)]).unwrap();
    let report = linter
        .verify_and_fix("x = a;", &FixOptions::default().with_max_passes(1))
        .unwrap();

    assert_eq!(report.output, "a = x;");
    assert_eq!(report.termination, Termination::PassCap);
    let remaining: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.status == FixStatus::Unapplied)
        .map(|d| d.diagnostic.rule_id)
        .collect();
    assert_eq!(remaining, [Some("rename-a")]);
}

#[test]
fn test_fixed_output_is_a_fix_point() {
    let linter = with_rule(
        "object-shorthand",
        LintRuleConfig::Severity(Severity::Error),
    );
    let text = "var o = {a: a, b: function() { return 1; }, 'c': c, d: d};";
    let first = linter.verify_and_fix(text, &FixOptions::default()).unwrap();
    assert_eq!(first.output, "var o = {a, b() { return 1; }, c, d};");

    let second = linter
        .verify_and_fix(&first.output, &FixOptions::default())
        .unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.output, first.output);
    assert_eq!(second.passes, 0);
}

#[test]
fn test_runs_are_deterministic() {
    let config = LintConfig::recommended().with_rule(
        "object-shorthand",
        LintRuleConfig::Severity(Severity::Warn),
    );
    let text = "var o = {a: a};\ntry {} catch (e) { e = 1; }\nnew Promise(async () => {});\n";

    let runs: Vec<_> = (0..3)
        .map(|_| {
            let linter = Linter::new(&config).unwrap();
            let result = linter.verify(text).unwrap();
            let fixed = linter.verify_and_fix(text, &FixOptions::default()).unwrap();
            (result.diagnostics, fixed.output)
        })
        .collect();
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

static FLAKY: RuleMeta = RuleMeta {
    name: "flaky",
    kind: RuleKind::Problem,
    description: "Fails on identifiers named `boom`",
    recommended: false,
    fixable: None,
    has_suggestions: false,
    messages: &[("seen", "Saw '{{name}}'.")],
};

struct Flaky;

impl Rule for Flaky {
    fn meta(&self) -> &'static RuleMeta {
        &FLAKY
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on("Identifier", |node, ctx| {
            let name = node.name().unwrap_or_default();
            if name == "boom" {
                return Err(anyhow::anyhow!("cannot handle '{name}'").into());
            }
            ctx.report(Report::node("seen", node).data("name", name))
        }))
    }
}

#[test]
fn test_listener_failure_disables_only_that_rule() {
    let linter = Linter::with_rules([configured(Flaky), configured(RenameA)]).unwrap();
    let result = linter.verify("first; boom; a;").unwrap();

    let messages: Vec<_> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, ["Saw 'first'.", "Rename 'a'."]);

    assert_eq!(result.failures.len(), 1);
    let failure = &result.failures[0];
    assert_eq!(failure.rule_id, "flaky");
    assert_eq!(failure.node_kind, "Identifier");
    assert_eq!((failure.line, failure.column), (1, 8));
    assert_eq!(
        failure.to_string(),
        "rule 'flaky' failed on Identifier at 1:8: cannot handle 'boom'"
    );
}

static UNDECLARED: RuleMeta = RuleMeta {
    name: "undeclared-message",
    kind: RuleKind::Problem,
    description: "Reports a message id it never declared",
    recommended: false,
    fixable: None,
    has_suggestions: false,
    messages: &[("declared", "Declared.")],
};

struct UndeclaredMessage;

impl Rule for UndeclaredMessage {
    fn meta(&self) -> &'static RuleMeta {
        &UNDECLARED
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on("Program", |node, ctx| {
            ctx.report(Report::node("missing", node))
        }))
    }
}

#[test]
fn test_undeclared_message_id_is_a_failure() {
    let linter = Linter::with_rules([configured(UndeclaredMessage)]).unwrap();
    let result = linter.verify("foo();").unwrap();
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert!(matches!(
        &result.failures[0].source,
        RuleError::UnknownMessageId { message_id } if message_id == "missing"
    ));
}

struct BadSelector;

impl Rule for BadSelector {
    fn meta(&self) -> &'static RuleMeta {
        &UNDECLARED
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on("Identifier[name=", |_, _| Ok(())))
    }
}

#[test]
fn test_bad_selector_fails_at_construction() {
    let err = Linter::with_rules([configured(BadSelector)]).err().unwrap();
    assert!(matches!(
        err,
        LintError::Setup {
            rule_id: "undeclared-message",
            source: RuleError::InvalidSelector(_),
        }
    ));
}

#[test]
fn test_invalid_options_fail_at_configuration() {
    let config = LintConfig::from_json(
        r#"{ "rules": { "object-shorthand": ["error", "sometimes"] } }"#,
    )
    .unwrap();
    let err = Linter::new(&config).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("invalid options for rule 'object-shorthand':"));
}

#[test]
fn test_yaml_config_end_to_end() {
    let config = LintConfig::from_yaml(
        "extends: recommended\nrules:\n  object-shorthand: [warn, properties]\n  no-unsafe-finally: 'off'\n",
    )
    .unwrap();
    let linter = Linter::new(&config).unwrap();
    let text = "new Promise(async (resolve) => {});\n\
                try { } catch (ex) { ex = 10; }\n\
                function f() { try {} finally { return 1; } }\n\
                var o = {f: function() {}, x: x};\n";

    let result = linter.verify(text).unwrap();
    let formatted: Vec<String> = result.diagnostics.iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(formatted.join("\n"), @r"
    1:13 error Promise executor functions should not be async. (no-async-promise-executor)
    2:22 error Do not assign to the exception parameter. (no-ex-assign)
    4:28 warn Expected property shorthand. (object-shorthand)
    ");
    assert_eq!(result.error_count(), 2);
    assert_eq!(result.warning_count(), 1);
}

#[test]
fn test_parse_failure_stops_the_fix_loop() {
    let linter = with_rule(
        "object-shorthand",
        LintRuleConfig::Severity(Severity::Error),
    );
    let report = linter
        .verify_and_fix("var o = {a: a", &FixOptions::default())
        .unwrap();
    assert_eq!(report.termination, Termination::ParseFailure);
    assert_eq!(report.passes, 0);
    assert_eq!(report.output, "var o = {a: a");
    assert!(report.diagnostics[0].diagnostic.fatal);
}

static OPEN_PAREN: RuleMeta = RuleMeta {
    name: "open-paren",
    kind: RuleKind::Problem,
    description: "Rewrites `a` into a lone parenthesis",
    recommended: false,
    fixable: Some(FixKind::Code),
    has_suggestions: false,
    messages: &[("paren", "Replace with a parenthesis.")],
};

/// Its fix turns valid code into code that no longer parses.
struct OpenParen;

impl Rule for OpenParen {
    fn meta(&self) -> &'static RuleMeta {
        &OPEN_PAREN
    }

    fn create(&self, _options: &RuleOptions) -> Result<Listeners, RuleError> {
        Ok(Listeners::new().on("Identifier[name='a']", |node, ctx| {
            ctx.report(Report::node("paren", node).fix(move |fixer| vec![fixer.replace_text(node, "(")]))
        }))
    }
}

#[test]
fn test_unparseable_fix_output_ends_the_loop() {
    let linter = Linter::with_rules([configured(OpenParen)]).unwrap();
    let report = linter.verify_and_fix("a;", &FixOptions::default()).unwrap();

    assert_eq!(report.termination, Termination::ParseFailure);
    assert_eq!(report.passes, 1);
    assert_eq!(report.output, "(;");
    assert_eq!(report.applied.len(), 1);

    let statuses: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| (d.diagnostic.fatal, d.status))
        .collect();
    assert_eq!(
        statuses,
        [(false, FixStatus::Applied { pass: 1 }), (true, FixStatus::NoFix)]
    );
    assert!(report.diagnostics[1]
        .diagnostic
        .message
        .starts_with("Parsing error: "));
}

/// Delegates to the built-in parser and counts the calls.
#[derive(Default)]
struct CountingParser {
    calls: AtomicUsize,
}

impl SourceParser for CountingParser {
    fn parse(&self, source: &str, options: &ParseOptions) -> Result<Parsed, ParseError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        JsParser.parse(source, options)
    }
}

struct RejectingParser;

impl SourceParser for RejectingParser {
    fn parse(&self, _source: &str, _options: &ParseOptions) -> Result<Parsed, ParseError> {
        Err(ParseError::new("unsupported syntax", 2))
    }
}

#[test]
fn test_custom_parser_is_used_for_every_pass() {
    let parser = Arc::new(CountingParser::default());
    let linter = with_rule(
        "object-shorthand",
        LintRuleConfig::Severity(Severity::Error),
    )
    .with_parser(Arc::clone(&parser) as Arc<dyn SourceParser>);

    linter.verify("var o = {a: a};").unwrap();
    assert_eq!(parser.calls.load(Ordering::Relaxed), 1);

    let report = linter
        .verify_and_fix("var o = {a: a};", &FixOptions::default())
        .unwrap();
    assert_eq!(report.output, "var o = {a};");
    assert_eq!(report.termination, Termination::Converged);
    // one parse per pass, plus the pass that finds nothing left to fix
    assert_eq!(parser.calls.load(Ordering::Relaxed), 1 + report.passes + 1);
}

#[test]
fn test_custom_parser_errors_are_fatal() {
    let linter = recommended().with_parser(Arc::new(RejectingParser));
    let result = linter.verify("foo();").unwrap();
    assert!(result.is_fatal());
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.message, "Parsing error: unsupported syntax");
    assert_eq!((diagnostic.line, diagnostic.column), (1, 3));
}
