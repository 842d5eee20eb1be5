//! Autofix conflict resolution.
//!
//! Each pass offers one fix per diagnostic. Fixes are taken greedily in
//! source order; a fix that overlaps one already taken waits for the next
//! pass, where it is recomputed against the rewritten text.

use crate::diagnostics::Diagnostic;
use crate::error::ListenerFailure;
use crate::rule::RuleKind;
use estlint_types::{Fix, OffsetRange};
use serde::{Deserialize, Serialize};

/// Default cap on fix passes.
pub const MAX_FIX_PASSES: usize = 10;

/// Options for [`Linter::verify_and_fix`](crate::Linter::verify_and_fix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixOptions {
    /// Maximum number of passes that apply fixes
    pub max_passes: usize,
    /// Only rules of these kinds have their fixes applied
    pub fix_kinds: Vec<RuleKind>,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            max_passes: MAX_FIX_PASSES,
            fix_kinds: vec![RuleKind::Problem, RuleKind::Suggestion, RuleKind::Layout],
        }
    }
}

impl FixOptions {
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    #[must_use]
    pub fn with_fix_kinds(mut self, fix_kinds: Vec<RuleKind>) -> Self {
        self.fix_kinds = fix_kinds;
        self
    }
}

/// How the fix loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    /// A pass had nothing left to apply
    Converged,
    /// The pass cap was reached with fixes still pending
    PassCap,
    /// The rewritten text no longer parses
    ParseFailure,
}

/// A fix that was written into the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFix {
    /// 1-based pass the fix was applied in
    pub pass: usize,
    pub rule_id: &'static str,
    pub message_id: &'static str,
    /// Range in the text of that pass
    pub range: OffsetRange,
    pub text: String,
}

/// What happened to a diagnostic's fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum FixStatus {
    /// Applied in the given pass; the diagnostic is from that pass
    Applied { pass: usize },
    /// Has a fix that was not applied, because of a conflict, the pass cap
    /// or the fix kind filter
    Unapplied,
    NoFix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedDiagnostic {
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
    #[serde(flatten)]
    pub status: FixStatus,
}

/// Result of running the fix loop.
#[derive(Debug)]
pub struct FixReport {
    /// The text after every applied fix
    pub output: String,
    /// Number of passes that applied at least one fix
    pub passes: usize,
    pub termination: Termination,
    pub applied: Vec<AppliedFix>,
    /// Diagnostics whose fix was applied, followed by the diagnostics of the
    /// final text
    pub diagnostics: Vec<FixedDiagnostic>,
    /// Listener failures of the final pass
    pub failures: Vec<ListenerFailure>,
    /// Warnings from every pass
    pub warnings: Vec<String>,
}

impl FixReport {
    /// Whether the output differs from the input.
    #[must_use]
    pub fn fixed(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Diagnostics describing the output text.
    pub fn remaining(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| !matches!(d.status, FixStatus::Applied { .. }))
            .map(|d| &d.diagnostic)
    }
}

/// A fix offered in one pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<'d> {
    /// Position of the owning diagnostic in the pass
    pub index: usize,
    pub rule_index: usize,
    pub fix: &'d Fix,
}

/// Pick a non-conflicting subset of `candidates`.
///
/// Candidates are considered by range start, range end, then rule
/// registration order. A fix is accepted when it does not overlap an
/// accepted fix; touching ranges are fine, except two insertions at the
/// same offset, whose relative order would be arbitrary.
pub(crate) fn select_fixes(mut candidates: Vec<Candidate<'_>>) -> (Vec<Candidate<'_>>, usize) {
    candidates.sort_by_key(|c| (c.fix.range.start, c.fix.range.end, c.rule_index));

    let mut accepted: Vec<Candidate<'_>> = Vec::new();
    let mut deferred = 0;
    for candidate in candidates {
        let conflicts = accepted
            .last()
            .is_some_and(|last| conflicts(last.fix.range, candidate.fix.range));
        if conflicts {
            deferred += 1;
        } else {
            accepted.push(candidate);
        }
    }
    (accepted, deferred)
}

/// `earlier` sorts before or with `later`.
fn conflicts(earlier: OffsetRange, later: OffsetRange) -> bool {
    if earlier.is_empty() && later.is_empty() {
        return earlier.start == later.start;
    }
    later.start < earlier.end
}

/// Apply non-overlapping fixes sorted by range in one rewrite.
pub(crate) fn apply_fixes(text: &str, fixes: &[&Fix]) -> String {
    let mut out = text.to_string();
    for fix in fixes.iter().rev() {
        out.replace_range(fix.range.start..fix.range.end, &fix.text);
    }
    out
}
