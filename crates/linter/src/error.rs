use thiserror::Error;

/// A selector pattern that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector '{pattern}' at offset {offset}: {message}")]
pub struct SelectorError {
    pub pattern: String,
    /// Byte offset into `pattern`
    pub offset: usize,
    pub message: String,
}

/// A rule broke its contract, or a listener failed.
#[derive(Debug, Error)]
pub enum RuleError {
    /// `report` named a message id missing from the rule's catalog
    #[error("message id '{message_id}' is not declared in the rule's messages")]
    UnknownMessageId { message_id: String },

    /// A fix was proposed by a rule whose meta does not declare `fixable`
    #[error("fixable rules must declare `fixable` in their meta")]
    FixOnNonFixableRule,

    /// Suggestions were proposed by a rule that does not declare them
    #[error("rules with suggestions must set `has_suggestions` in their meta")]
    SuggestionsNotDeclared,

    /// Two fixes from a single report overlap
    #[error("fixes from one report must not overlap ({first} and {second})")]
    OverlappingFixes {
        first: estlint_types::OffsetRange,
        second: estlint_types::OffsetRange,
    },

    /// A listener key is not a valid selector
    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),

    /// Options passed the schema but the rule could not use them
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Anything else a listener wants to surface
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A listener error caught at the dispatch boundary.
#[derive(Debug, Error)]
#[error("rule '{rule_id}' failed on {node_kind} at {line}:{column}: {source}")]
pub struct ListenerFailure {
    pub rule_id: &'static str,
    pub node_kind: String,
    pub line: u32,
    pub column: u32,
    pub source: RuleError,
}

/// Invalid lint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configured rule does not exist
    #[error("unknown rule '{name}'{}", .suggestion.as_ref().map(|s| format!(", did you mean '{s}'?")).unwrap_or_default())]
    UnknownRule {
        name: String,
        suggestion: Option<String>,
    },

    /// A preset named in `extends` does not exist
    #[error("unknown preset '{0}', valid presets are: recommended")]
    UnknownPreset(String),

    /// Options rejected by the rule's schema
    #[error("invalid options for rule '{rule_id}':\n{}", .errors.join("\n"))]
    InvalidOptions {
        rule_id: String,
        errors: Vec<String>,
    },

    /// The rule's own schema does not compile
    #[error("rule '{rule_id}' has an invalid options schema: {message}")]
    InvalidSchema { rule_id: String, message: String },

    /// The config value could not be deserialized
    #[error("failed to read lint config: {0}")]
    Deserialize(String),
}

/// Errors that stop a lint run before traversal.
#[derive(Debug, Error)]
pub enum LintError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A rule could not set up its listeners
    #[error("rule '{rule_id}' failed to set up: {source}")]
    Setup {
        rule_id: &'static str,
        source: RuleError,
    },
}
