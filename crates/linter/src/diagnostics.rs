use crate::selector::Specificity;
use estlint_types::{Fix, OffsetRange, Severity};
use serde::Serialize;

/// An alternative fix offered to the user but never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub message_id: &'static str,
    /// Rendered suggestion message
    pub desc: String,
    pub fix: Fix,
}

/// A problem reported by a rule, or a fatal parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// `None` for parse failures
    pub rule_id: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<&'static str>,
    pub message: String,
    pub severity: Severity,
    /// Set when the source could not be parsed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
    /// Node type or token type the report was attached to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Byte offsets in the linted text
    #[serde(skip)]
    pub range: OffsetRange,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    /// Single merged fix, present when the rule proposed one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

impl Diagnostic {
    /// A fatal diagnostic for a parse error.
    #[must_use]
    pub fn parse_failure(message: &str, offset: usize, line: u32, column: u32) -> Self {
        Self {
            rule_id: None,
            message_id: None,
            message: format!("Parsing error: {message}"),
            severity: Severity::Error,
            fatal: true,
            node_type: None,
            range: OffsetRange::at(offset),
            line,
            column,
            end_line: line,
            end_column: column,
            fix: None,
            suggestions: Vec::new(),
        }
    }

    #[must_use]
    pub const fn has_fix(&self) -> bool {
        self.fix.is_some()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} {} {}",
            self.line, self.column, self.severity, self.message
        )?;
        if let Some(rule_id) = self.rule_id {
            write!(f, " ({rule_id})")?;
        }
        Ok(())
    }
}

/// A diagnostic collected during a pass, with the keys used to order it.
#[derive(Debug, Clone)]
pub(crate) struct PendingReport {
    pub diagnostic: Diagnostic,
    pub specificity: Specificity,
    /// Emission order within the rule
    pub sequence: usize,
}

/// A collected diagnostic tagged with the rule's registration index.
#[derive(Debug, Clone)]
pub(crate) struct Reported {
    pub rule_index: usize,
    pub report: PendingReport,
}

/// Order diagnostics by range start, then rule registration order, then
/// listener specificity, then emission order.
pub(crate) fn sort_reports(reports: &mut [Reported]) {
    reports.sort_by_key(|r| {
        (
            r.report.diagnostic.range.start,
            r.rule_index,
            r.report.specificity,
            r.report.sequence,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(rule_id: &'static str, start: usize) -> Diagnostic {
        Diagnostic {
            rule_id: Some(rule_id),
            message_id: Some("m"),
            message: "message".to_string(),
            severity: Severity::Warn,
            fatal: false,
            node_type: Some("Identifier".to_string()),
            range: OffsetRange::new(start, start + 1),
            line: 1,
            column: start as u32 + 1,
            end_line: 1,
            end_column: start as u32 + 2,
            fix: None,
            suggestions: Vec::new(),
        }
    }

    fn reported(rule_index: usize, start: usize, attributes: u32, sequence: usize) -> Reported {
        Reported {
            rule_index,
            report: PendingReport {
                diagnostic: diagnostic(if rule_index == 0 { "a" } else { "b" }, start),
                specificity: Specificity {
                    attributes,
                    kinds: 1,
                },
                sequence,
            },
        }
    }

    #[test]
    fn test_sort_order() {
        let mut reports = vec![
            reported(1, 4, 0, 0),
            reported(0, 4, 1, 1),
            reported(0, 4, 1, 0),
            reported(0, 4, 0, 2),
            reported(1, 0, 0, 1),
        ];
        sort_reports(&mut reports);
        let order: Vec<_> = reports
            .iter()
            .map(|r| (r.report.diagnostic.range.start, r.rule_index, r.report.sequence))
            .collect();
        assert_eq!(order, [(0, 1, 1), (4, 0, 2), (4, 0, 0), (4, 0, 1), (4, 1, 0)]);
    }

    #[test]
    fn test_parse_failure() {
        let diagnostic = Diagnostic::parse_failure("Unexpected token )", 3, 1, 4);
        assert!(diagnostic.fatal);
        assert_eq!(diagnostic.rule_id, None);
        assert_eq!(diagnostic.message, "Parsing error: Unexpected token )");
        assert_eq!(diagnostic.to_string(), "1:4 error Parsing error: Unexpected token )");
    }

    #[test]
    fn test_serialize_shape() {
        let mut diagnostic = diagnostic("no-ex-assign", 0);
        diagnostic.fix = Some(Fix::replace(OffsetRange::new(0, 1), "b"));
        insta::assert_yaml_snapshot!(diagnostic, @r#"
        ruleId: no-ex-assign
        messageId: m
        message: message
        severity: warn
        nodeType: Identifier
        line: 1
        column: 1
        endLine: 1
        endColumn: 2
        fix:
          range:
            start: 0
            end: 1
          text: b
        "#);
    }
}
