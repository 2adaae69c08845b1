//! Error types of the sentiment pipeline.
//!
//! [`ArtifactError`] and [`PipelineError`] are fatal and reach the caller.
//! [`TranslationError`] and [`ProbabilityError`] are absorbed inside the
//! pipeline, which falls back to the original text or to a label-only result.

/// Loading or validating a serialized model artifact failed.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid artifact: {0}")]
    Invalid(String),
    #[error("vectorizer produces {vectorizer} features but classifier expects {classifier}")]
    Incompatible { vectorizer: usize, classifier: usize },
}

/// Scoring failed in the vectorizer or classifier. Not recoverable.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("feature vector has {found} columns but the classifier expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("classifier produced a non-finite decision value")]
    NonFiniteDecision,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("translation is disabled")]
    Disabled,
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation service returned an unexpected payload")]
    UnexpectedPayload,
    #[error("translation service returned no text")]
    EmptyResponse,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProbabilityError {
    #[error("classifier does not support probability estimates")]
    Unsupported,
    #[error("classifier produced non-finite probabilities")]
    NonFinite,
}
