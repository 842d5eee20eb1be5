//! Single-walk event dispatch.
//!
//! The tree is walked once per pass, depth first. Entering a node fires
//! every matching enter listener, leaving it fires the `:exit` listeners.
//! For one event, rules fire in registration order and each rule's
//! listeners in declaration order.

use crate::context::RuleContext;
use crate::diagnostics::{PendingReport, Reported};
use crate::error::{LintError, ListenerFailure, SelectorError};
use crate::rule::{Listener, Rule, RuleKind, RuleOptions};
use crate::selector::Selector;
use crate::source_code::SourceCode;
use estlint_syntax::Node;
use estlint_types::Severity;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// A rule enabled for a lint run, with its severity and validated options.
#[derive(Clone)]
pub struct ConfiguredRule {
    pub rule: Arc<dyn Rule>,
    pub severity: Severity,
    pub options: RuleOptions,
}

impl ConfiguredRule {
    #[must_use]
    pub fn new(rule: Arc<dyn Rule>, severity: Severity, options: RuleOptions) -> Self {
        Self {
            rule,
            severity,
            options,
        }
    }

    #[must_use]
    pub fn id(&self) -> &'static str {
        self.rule.meta().name
    }

    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.rule.meta().kind
    }
}

impl std::fmt::Debug for ConfiguredRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredRule")
            .field("rule", &self.id())
            .field("severity", &self.severity)
            .field("options", &self.options)
            .finish()
    }
}

/// Listener selectors compiled once per linter, keyed by pattern.
#[derive(Debug, Default)]
pub(crate) struct SelectorCache {
    selectors: HashMap<String, Selector>,
}

impl SelectorCache {
    /// Create each rule's listeners once and compile every selector they
    /// register.
    pub(crate) fn compile(rules: &[ConfiguredRule]) -> Result<Self, LintError> {
        let mut selectors = HashMap::new();
        for configured in rules {
            let rule_id = configured.id();
            let listeners = configured
                .rule
                .create(&configured.options)
                .map_err(|source| LintError::Setup { rule_id, source })?;
            for (key, _) in listeners.into_entries() {
                let (pattern, _) = split_exit(&key);
                if selectors.contains_key(pattern) {
                    continue;
                }
                let selector = Selector::parse(pattern).map_err(|err| LintError::Setup {
                    rule_id,
                    source: err.into(),
                })?;
                selectors.insert(pattern.to_string(), selector);
            }
        }
        tracing::trace!(selectors = selectors.len(), "Compiled listener selectors");
        Ok(Self { selectors })
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, pattern: &str) -> bool {
        self.selectors.contains_key(pattern)
    }

    /// The cached selector, or a fresh compile for a pattern `create`
    /// did not register at construction.
    fn get(&self, pattern: &str) -> Result<Cow<'_, Selector>, SelectorError> {
        match self.selectors.get(pattern) {
            Some(selector) => Ok(Cow::Borrowed(selector)),
            None => Selector::parse(pattern).map(Cow::Owned),
        }
    }
}

fn split_exit(key: &str) -> (&str, bool) {
    match key.strip_suffix(":exit") {
        Some(pattern) => (pattern, true),
        None => (key, false),
    }
}

struct CompiledListener<'r> {
    selector: Cow<'r, Selector>,
    exit: bool,
    callback: Listener,
}

struct RuleListeners<'r> {
    rule: &'r ConfiguredRule,
    listeners: Vec<CompiledListener<'r>>,
}

/// Everything one traversal produced.
pub(crate) struct PassOutput {
    pub reports: Vec<Reported>,
    pub failures: Vec<ListenerFailure>,
    pub warnings: Vec<String>,
}

/// Listeners of every enabled rule for one pass.
pub(crate) struct Dispatcher<'r> {
    rules: Vec<RuleListeners<'r>>,
}

impl<'r> Dispatcher<'r> {
    /// Create each rule's listeners and pair them with their compiled
    /// selectors.
    pub(crate) fn new(
        rules: &'r [ConfiguredRule],
        selectors: &'r SelectorCache,
    ) -> Result<Self, LintError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for configured in rules {
            let rule_id = configured.id();
            let setup_error = |source| LintError::Setup { rule_id, source };

            let listeners = configured
                .rule
                .create(&configured.options)
                .map_err(setup_error)?;

            let mut entries = Vec::with_capacity(listeners.len());
            for (key, callback) in listeners.into_entries() {
                let (pattern, exit) = split_exit(&key);
                let selector = selectors
                    .get(pattern)
                    .map_err(|err| setup_error(err.into()))?;
                entries.push(CompiledListener {
                    selector,
                    exit,
                    callback,
                });
            }

            compiled.push(RuleListeners {
                rule: configured,
                listeners: entries,
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Walk the tree once, firing listeners.
    pub(crate) fn run(&self, source: &SourceCode<'_>, compute_fixes: bool) -> PassOutput {
        let mut contexts: Vec<RuleContext<'_>> = self
            .rules
            .iter()
            .map(|entry| {
                RuleContext::new(
                    entry.rule.rule.meta(),
                    &entry.rule.options,
                    source,
                    entry.rule.severity,
                    compute_fixes,
                )
            })
            .collect();
        let mut disabled = vec![false; self.rules.len()];
        let mut failures = Vec::new();

        let mut stack = vec![(source.root(), false)];
        while let Some((node, exit)) = stack.pop() {
            if !exit {
                stack.push((node, true));
                stack.extend(node.child_nodes().into_iter().rev().map(|child| (child, false)));
            }
            self.fire(node, exit, source, &mut contexts, &mut disabled, &mut failures);
        }

        let mut reports = Vec::new();
        let mut warnings = Vec::new();
        for (rule_index, context) in contexts.into_iter().enumerate() {
            let (pending, rule_warnings) = context.finish();
            reports.extend(pending.into_iter().map(|report: PendingReport| Reported {
                rule_index,
                report,
            }));
            warnings.extend(rule_warnings);
        }

        PassOutput {
            reports,
            failures,
            warnings,
        }
    }

    fn fire<'s>(
        &self,
        node: Node<'s>,
        exit: bool,
        source: &SourceCode<'s>,
        contexts: &mut [RuleContext<'_>],
        disabled: &mut [bool],
        failures: &mut Vec<ListenerFailure>,
    ) {
        let kind = node.kind();
        for (index, entry) in self.rules.iter().enumerate() {
            if disabled[index] {
                continue;
            }
            for listener in &entry.listeners {
                if listener.exit != exit
                    || !listener.selector.may_match(kind)
                    || !listener.selector.matches(node)
                {
                    continue;
                }
                let context = &mut contexts[index];
                context.set_specificity(listener.selector.specificity());
                if let Err(err) = (listener.callback)(node, context) {
                    let rule_id = entry.rule.id();
                    let position = source.location(node.range().start);
                    tracing::warn!(
                        rule = rule_id,
                        node = %node.kind(),
                        error = %err,
                        "Listener failed, rule disabled for the rest of the pass"
                    );
                    failures.push(ListenerFailure {
                        rule_id,
                        node_kind: node.kind().as_str().to_string(),
                        line: position.line,
                        column: position.column,
                        source: err,
                    });
                    disabled[index] = true;
                    break;
                }
            }
        }
    }
}
