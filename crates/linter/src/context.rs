//! Per-rule facade handed to listeners.
//!
//! Each rule gets one [`RuleContext`] per pass. Reports are checked against
//! the rule's metadata as they arrive; a contract violation comes back as an
//! error from [`RuleContext::report`] and is attributed to the rule by the
//! dispatcher.

use crate::diagnostics::{Diagnostic, PendingReport, Suggestion};
use crate::error::RuleError;
use crate::rule::{RuleMeta, RuleOptions};
use crate::selector::Specificity;
use crate::source_code::SourceCode;
use estlint_syntax::{Node, Spanned, Token};
use estlint_types::{Fix, OffsetRange, Severity};

type FixFn<'r> = Box<dyn FnOnce(&RuleFixer) -> Vec<Fix> + 'r>;

/// Builds the fixes of one report.
///
/// Every method returns a [`Fix`] against the source snapshot of the current
/// pass; fix functions return any number of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleFixer;

#[allow(clippy::unused_self, clippy::needless_pass_by_value)]
impl RuleFixer {
    #[must_use]
    pub fn replace_text(&self, target: impl Spanned, text: impl Into<String>) -> Fix {
        Fix::replace(target.span(), text)
    }

    #[must_use]
    pub fn replace_text_range(&self, range: OffsetRange, text: impl Into<String>) -> Fix {
        Fix::replace(range, text)
    }

    #[must_use]
    pub fn insert_text_before(&self, target: impl Spanned, text: impl Into<String>) -> Fix {
        Fix::insert(target.span().start, text)
    }

    #[must_use]
    pub fn insert_text_before_range(&self, range: OffsetRange, text: impl Into<String>) -> Fix {
        Fix::insert(range.start, text)
    }

    #[must_use]
    pub fn insert_text_after(&self, target: impl Spanned, text: impl Into<String>) -> Fix {
        Fix::insert(target.span().end, text)
    }

    #[must_use]
    pub fn insert_text_after_range(&self, range: OffsetRange, text: impl Into<String>) -> Fix {
        Fix::insert(range.end, text)
    }

    #[must_use]
    pub fn remove(&self, target: impl Spanned) -> Fix {
        Fix::remove(target.span())
    }

    #[must_use]
    pub fn remove_range(&self, range: OffsetRange) -> Fix {
        Fix::remove(range)
    }
}

struct SuggestionRequest<'r> {
    message_id: &'static str,
    data: Vec<(&'static str, String)>,
    fix: FixFn<'r>,
}

/// What a listener reports: a message id, a location and optionally data,
/// a fix and suggestions.
///
/// ```rust,ignore
/// ctx.report(
///     Report::node("expectedPropertyShorthand", property)
///         .data("name", name)
///         .fix(|fixer| vec![fixer.replace_text(property, name)]),
/// )?;
/// ```
pub struct Report<'r> {
    message_id: &'static str,
    range: OffsetRange,
    node_type: Option<String>,
    data: Vec<(&'static str, String)>,
    fix: Option<FixFn<'r>>,
    suggestions: Vec<SuggestionRequest<'r>>,
}

impl<'r> Report<'r> {
    /// Report on a node; the diagnostic covers the node's range.
    #[must_use]
    pub fn node(message_id: &'static str, node: Node<'_>) -> Self {
        Self::new(message_id, node.range(), Some(node.kind().as_str().to_string()))
    }

    /// Report on a single token.
    #[must_use]
    pub fn token(message_id: &'static str, token: &Token) -> Self {
        Self::new(message_id, token.range, Some(token.kind.as_str().to_string()))
    }

    /// Report on an explicit range.
    #[must_use]
    pub fn range(message_id: &'static str, range: OffsetRange) -> Self {
        Self::new(message_id, range, None)
    }

    fn new(message_id: &'static str, range: OffsetRange, node_type: Option<String>) -> Self {
        Self {
            message_id,
            range,
            node_type,
            data: Vec::new(),
            fix: None,
            suggestions: Vec::new(),
        }
    }

    /// Value for a `{{ key }}` placeholder in the message.
    #[must_use]
    pub fn data(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.data.push((key, value.into()));
        self
    }

    /// Attach a fix. The function only runs when fixes are being computed.
    #[must_use]
    pub fn fix(mut self, fix: impl FnOnce(&RuleFixer) -> Vec<Fix> + 'r) -> Self {
        self.fix = Some(Box::new(fix));
        self
    }

    /// Attach a suggestion rendered from the rule's `message_id` template.
    #[must_use]
    pub fn suggest(
        mut self,
        message_id: &'static str,
        data: Vec<(&'static str, String)>,
        fix: impl FnOnce(&RuleFixer) -> Vec<Fix> + 'r,
    ) -> Self {
        self.suggestions.push(SuggestionRequest {
            message_id,
            data,
            fix: Box::new(fix),
        });
        self
    }
}

/// A rule's view of the current pass.
pub struct RuleContext<'a> {
    meta: &'static RuleMeta,
    options: &'a RuleOptions,
    source: &'a SourceCode<'a>,
    severity: Severity,
    compute_fixes: bool,
    specificity: Specificity,
    reports: Vec<PendingReport>,
    warnings: Vec<String>,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        meta: &'static RuleMeta,
        options: &'a RuleOptions,
        source: &'a SourceCode<'a>,
        severity: Severity,
        compute_fixes: bool,
    ) -> Self {
        Self {
            meta,
            options,
            source,
            severity,
            compute_fixes,
            specificity: Specificity::default(),
            reports: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// The rule id.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.meta.name
    }

    #[must_use]
    pub const fn meta(&self) -> &'static RuleMeta {
        self.meta
    }

    #[must_use]
    pub const fn options(&self) -> &'a RuleOptions {
        self.options
    }

    #[must_use]
    pub const fn source(&self) -> &'a SourceCode<'a> {
        self.source
    }

    pub(crate) fn set_specificity(&mut self, specificity: Specificity) {
        self.specificity = specificity;
    }

    pub(crate) fn finish(self) -> (Vec<PendingReport>, Vec<String>) {
        (self.reports, self.warnings)
    }

    /// Record a diagnostic.
    pub fn report(&mut self, report: Report<'_>) -> Result<(), RuleError> {
        let Report {
            message_id,
            range,
            node_type,
            data,
            fix,
            suggestions,
        } = report;

        let template = self.template(message_id)?;
        if fix.is_some() && self.meta.fixable.is_none() {
            return Err(RuleError::FixOnNonFixableRule);
        }
        if !suggestions.is_empty() && !self.meta.has_suggestions {
            return Err(RuleError::SuggestionsNotDeclared);
        }

        let fix = match fix {
            Some(fix) if self.compute_fixes => self.build_fix(fix)?,
            _ => None,
        };

        let mut rendered = Vec::new();
        for suggestion in suggestions {
            let template = self.template(suggestion.message_id)?;
            if !self.compute_fixes {
                continue;
            }
            if let Some(fix) = self.build_fix(suggestion.fix)? {
                rendered.push(Suggestion {
                    message_id: suggestion.message_id,
                    desc: interpolate(template, &suggestion.data),
                    fix,
                });
            }
        }

        let location = self.source.range_of(range);
        let diagnostic = Diagnostic {
            rule_id: Some(self.meta.name),
            message_id: Some(message_id),
            message: interpolate(template, &data),
            severity: self.severity,
            fatal: false,
            node_type,
            range,
            line: location.start.line,
            column: location.start.column,
            end_line: location.end.line,
            end_column: location.end.column,
            fix,
            suggestions: rendered,
        };

        let sequence = self.reports.len();
        self.reports.push(PendingReport {
            diagnostic,
            specificity: self.specificity,
            sequence,
        });
        Ok(())
    }

    fn template(&self, message_id: &str) -> Result<&'static str, RuleError> {
        self.meta
            .message(message_id)
            .ok_or_else(|| RuleError::UnknownMessageId {
                message_id: message_id.to_string(),
            })
    }

    fn build_fix(&mut self, fix: FixFn<'_>) -> Result<Option<Fix>, RuleError> {
        let fixes = fix(&RuleFixer);
        if fixes.is_empty() {
            return Ok(None);
        }

        let text = self.source.text();
        let invalid = fixes.iter().find(|fix| {
            !fix.range.is_valid_for(text.len())
                || !text.is_char_boundary(fix.range.start)
                || !text.is_char_boundary(fix.range.end)
        });
        if let Some(invalid) = invalid {
            tracing::warn!(
                rule = self.meta.name,
                range = %invalid.range,
                "Dropping fix with invalid range"
            );
            self.warnings.push(format!(
                "rule '{}' proposed a fix with invalid range {}; the fix was dropped",
                self.meta.name, invalid.range
            ));
            return Ok(None);
        }

        merge_fixes(text, fixes).map(Some)
    }
}

/// Merge the fixes of one report into a single fix spanning all of them.
fn merge_fixes(text: &str, mut fixes: Vec<Fix>) -> Result<Fix, RuleError> {
    if fixes.len() == 1 {
        if let Some(fix) = fixes.pop() {
            return Ok(fix);
        }
    }

    fixes.sort_by_key(|fix| (fix.range.start, fix.range.end));
    let start = fixes.first().map_or(0, |fix| fix.range.start);
    let mut merged = String::new();
    let mut last = start;
    let mut previous: Option<OffsetRange> = None;

    for fix in &fixes {
        if fix.range.start < last {
            return Err(RuleError::OverlappingFixes {
                first: previous.unwrap_or(fix.range),
                second: fix.range,
            });
        }
        merged.push_str(text.get(last..fix.range.start).unwrap_or_default());
        merged.push_str(&fix.text);
        last = fix.range.end;
        previous = Some(fix.range);
    }

    Ok(Fix::replace(OffsetRange::new(start, last), merged))
}

/// Fill `{{ name }}` placeholders from `data`. Unknown placeholders are
/// left as written.
pub fn interpolate<K: AsRef<str>, V: AsRef<str>>(template: &str, data: &[(K, V)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let name = after_open[..close].trim();
        out.push_str(&rest[..open]);
        match data.iter().find(|(key, _)| key.as_ref() == name) {
            Some((_, value)) => out.push_str(value.as_ref()),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    out
}
