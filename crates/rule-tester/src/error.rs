use thiserror::Error;

/// A rule failed its conformance run.
#[derive(Debug, Error)]
pub enum ConformanceError {
    /// The rule's metadata is inconsistent
    #[error("rule '{rule_id}' has invalid metadata: {message}")]
    Meta { rule_id: String, message: String },

    /// The same case appears twice
    #[error("duplicate {kind} test case: {code:?}")]
    DuplicateCase { kind: CaseKind, code: String },

    /// The fixture file could not be read
    #[error("invalid fixture: {0}")]
    Fixture(#[from] serde_json::Error),

    /// One or more cases did not behave as declared
    #[error("{} case(s) failed for rule '{rule_id}':\n{}", .failures.len(), format_failures(.failures))]
    Cases {
        rule_id: String,
        failures: Vec<CaseFailure>,
    },
}

fn format_failures(failures: &[CaseFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether a case was listed under `valid` or `invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    Valid,
    Invalid,
}

impl std::fmt::Display for CaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// A single failing case.
#[derive(Debug, Error)]
#[error("{kind}[{index}] {code:?}: {reason}")]
pub struct CaseFailure {
    pub kind: CaseKind,
    /// Position of the case in its list
    pub index: usize,
    pub code: String,
    pub reason: CaseError,
}

/// Why a case failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    /// The options were rejected before linting
    #[error("rule could not be configured: {0}")]
    Setup(String),

    /// The code does not parse
    #[error("parsing failed: {0}")]
    Parse(String),

    /// A listener failed while linting
    #[error("listener failed: {0}")]
    Listener(String),

    /// A valid case produced diagnostics
    #[error("should have no errors but had {count}:\n{diagnostics}")]
    UnexpectedErrors { count: usize, diagnostics: String },

    /// Wrong number of diagnostics
    #[error("should have {expected} error(s) but had {actual}:\n{diagnostics}")]
    ErrorCount {
        expected: usize,
        actual: usize,
        diagnostics: String,
    },

    /// A matcher gave both `message` and `messageId`
    #[error("error {index}: 'message' and 'messageId' cannot both be set")]
    MessageAndMessageId { index: usize },

    /// A matcher named a message id the rule does not declare
    #[error("error {index}: rule has no message id '{message_id}'")]
    UnknownMessageId { index: usize, message_id: String },

    /// A matcher field differs from the diagnostic
    #[error("error {index}: {field} should be {expected} but was {actual}")]
    Field {
        index: usize,
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// A suggestion field differs from the diagnostic's suggestion
    #[error("error {index}, suggestion {suggestion}: {field} should be {expected} but was {actual}")]
    Suggestion {
        index: usize,
        suggestion: usize,
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// The fixed text differs from `output`
    #[error("output should be {expected:?} but was {actual:?}")]
    Output { expected: String, actual: String },

    /// `output` repeats `code`
    #[error("'output' matches 'code'; use null to assert that no fix is applied")]
    OutputSameAsCode,

    /// The rule fixed the code but the case has no `output`
    #[error("the rule fixed the code, add 'output': {actual:?}")]
    MissingOutput { actual: String },

    /// `output` was given for a rule that cannot fix
    #[error("'output' is set but the rule is not fixable")]
    OutputForNonFixable,
}
