use thiserror::Error;

/// Errors raised by the analysis pipeline.
///
/// The variants line up with the pipeline stages: the interpreter raises
/// [`AnalystError::Parse`], acquisition raises
/// [`AnalystError::SourceUnavailable`] (as does the interpreter when the task
/// names no fetchable source), the analysis engine raises
/// [`AnalystError::Computation`] and the renderer raises
/// [`AnalystError::SizeExceeded`].
#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source unavailable: {source_ref}: {reason}")]
    SourceUnavailable { source_ref: String, reason: String },

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Image payload of {actual} characters exceeds the {limit} character ceiling")]
    SizeExceeded { limit: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalystError {
    pub fn parse(msg: impl Into<String>) -> Self {
        AnalystError::Parse(msg.into())
    }

    pub fn computation(msg: impl Into<String>) -> Self {
        AnalystError::Computation(msg.into())
    }

    pub fn source_unavailable(source_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalystError::SourceUnavailable {
            source_ref: source_ref.into(),
            reason: reason.into(),
        }
    }

    /// Parse errors are answered with the fallback echo instead of failing the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalystError::Parse(_))
    }

    /// Short machine-readable label, used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalystError::Parse(_) => "parse",
            AnalystError::SourceUnavailable { .. } => "source_unavailable",
            AnalystError::Computation(_) => "computation",
            AnalystError::SizeExceeded { .. } => "size_exceeded",
            AnalystError::Config(_) => "config",
            AnalystError::Serialization(_) => "serialization",
            AnalystError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalystError>;

impl From<serde_json::Error> for AnalystError {
    fn from(err: serde_json::Error) -> Self {
        AnalystError::Serialization(err.to_string())
    }
}
