//! # estlint linter
//!
//! A selector-driven lint engine for JavaScript. Rules register listeners
//! keyed by CSS-like selectors (`"CatchClause[param.type='Identifier']"`,
//! `"Property:exit"`), the dispatcher walks the syntax tree once per pass
//! and fires every matching listener, and the fixer applies
//! non-overlapping fixes pass after pass until the output stops changing.
//!
//! ```rust,ignore
//! use estlint_linter::prelude::*;
//!
//! let config = LintConfig::from_yaml("rules:\n  object-shorthand: warn\n")?;
//! let linter = Linter::new(&config)?;
//! let report = linter.verify_and_fix("var x = {a: a};", &FixOptions::default())?;
//! assert_eq!(report.output, "var x = {a};");
//! ```

mod config;
mod context;
mod diagnostics;
mod dispatcher;
mod error;
mod fixer;
mod linter;
mod registry;
mod rule;
mod rules;
mod selector;
mod source_code;

pub use config::{ExtendsConfig, FullLintConfig, LintConfig, LintRuleConfig, PRESETS};
pub use context::{interpolate, Report, RuleContext, RuleFixer};
pub use diagnostics::{Diagnostic, Suggestion};
pub use dispatcher::ConfiguredRule;
pub use error::{ConfigError, LintError, ListenerFailure, RuleError, SelectorError};
pub use fixer::{
    AppliedFix, FixOptions, FixReport, FixStatus, FixedDiagnostic, Termination, MAX_FIX_PASSES,
};
pub use linter::{LintResult, Linter};
pub use registry::{all_rule_names, all_rules, find_rule};
pub use rule::{
    FixKind, Listener, Listeners, OptionsSchema, Rule, RuleKind, RuleMeta, RuleOptions,
};
pub use rules::{
    NoAsyncPromiseExecutor, NoCatchShadow, NoExAssign, NoUnsafeFinally, ObjectShorthand,
};
pub use selector::{compile, Selector, Specificity};
pub use source_code::SourceCode;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use estlint_linter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{LintConfig, LintRuleConfig};
    pub use crate::context::{Report, RuleContext};
    pub use crate::diagnostics::Diagnostic;
    pub use crate::dispatcher::ConfiguredRule;
    pub use crate::fixer::{FixOptions, FixReport};
    pub use crate::linter::{LintResult, Linter};
    pub use crate::rule::{Listeners, Rule, RuleKind, RuleMeta, RuleOptions};
}
