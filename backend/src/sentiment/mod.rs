//! Sentiment classification of short texts.
//!
//! A [`SentimentPipeline`] owns a fitted [`TfidfVectorizer`] and a binary
//! classifier loaded once at startup, plus an optional [`Translator`] used for
//! non-English input:
//!
//! ```rust,no_run
//! use sentiment_backend::sentiment::SentimentPipelineBuilder;
//!
//! # fn main() -> Result<(), sentiment_backend::sentiment::ArtifactError> {
//! let pipeline = SentimentPipelineBuilder::from_paths(
//!     "models/sentiment_model.json",
//!     "models/tfidf_vectorizer.json",
//! )
//! .build()?;
//!
//! let result = pipeline.classify("Great leadership!", None).expect("scoring failed");
//! println!("{} ({:?})", result.label, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod error;
pub mod pipeline;
pub mod translate;
pub mod vectorizer;

pub use classifier::{ClassifierArtifact, TextClassifier};
pub use error::{ArtifactError, PipelineError, ProbabilityError, TranslationError};
pub use pipeline::{Classification, SentimentPipeline, SentimentPipelineBuilder};
pub use translate::{DisabledTranslator, GoogleTranslator, Translator, needs_translation};
pub use vectorizer::{TextVectorizer, TfidfVectorizer};
