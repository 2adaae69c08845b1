use super::artifacts::{load_classifier, load_vectorizer};
use super::classifier::TextClassifier;
use super::error::{ArtifactError, PipelineError, ProbabilityError};
use super::translate::{
    needs_translation, DisabledTranslator, Translator, SOURCE_AUTO, TARGET_ENGLISH,
};
use super::vectorizer::TextVectorizer;
use ndarray::ArrayView1;
use shared::SentimentLabel;
use std::path::PathBuf;

/// Outcome of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Max class probability as a percentage, `None` when unavailable.
    pub confidence: Option<f64>,
    /// Lower-cased text that was vectorized.
    pub scored_text: String,
    pub translated: bool,
}

/// Translate, normalize, vectorize, predict.
///
/// Holds the model artifacts immutably for the lifetime of the process and is
/// shared between request handlers behind an `Arc`.
pub struct SentimentPipeline {
    vectorizer: Box<dyn TextVectorizer>,
    classifier: Box<dyn TextClassifier>,
    translator: Box<dyn Translator>,
}

impl SentimentPipeline {
    pub fn new(
        vectorizer: Box<dyn TextVectorizer>,
        classifier: Box<dyn TextClassifier>,
        translator: Box<dyn Translator>,
    ) -> Result<Self, ArtifactError> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(ArtifactError::Incompatible {
                vectorizer: vectorizer.n_features(),
                classifier: classifier.n_features(),
            });
        }
        Ok(Self {
            vectorizer,
            classifier,
            translator,
        })
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn n_features(&self) -> usize {
        self.classifier.n_features()
    }

    pub fn classify(
        &self,
        text: &str,
        lang_hint: Option<&str>,
    ) -> Result<Classification, PipelineError> {
        let (text, translated) = self.translate_or_original(text, lang_hint);
        let scored_text = text.to_lowercase();

        let features = self.vectorizer.transform(&scored_text)?;
        if features.len() != self.classifier.n_features() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.classifier.n_features(),
                found: features.len(),
            });
        }

        let label = self.classifier.predict(features.view())?;
        let confidence = self.confidence(features.view());

        Ok(Classification {
            label,
            confidence,
            scored_text,
            translated,
        })
    }

    fn translate_or_original(&self, text: &str, lang_hint: Option<&str>) -> (String, bool) {
        if !needs_translation(text, lang_hint) {
            return (text.to_string(), false);
        }
        match self.translator.translate(text, SOURCE_AUTO, TARGET_ENGLISH) {
            Ok(translated) => (translated, true),
            Err(e) => {
                log::warn!("Translation failed, scoring original text: {}", e);
                (text.to_string(), false)
            }
        }
    }

    fn confidence(&self, features: ArrayView1<f64>) -> Option<f64> {
        match self.classifier.predict_proba(features) {
            Ok([negative, positive]) => Some(negative.max(positive) * 100.0),
            Err(ProbabilityError::Unsupported) => None,
            Err(e) => {
                log::warn!("No confidence for prediction: {}", e);
                None
            }
        }
    }
}

enum ArtifactSource {
    Paths {
        classifier: PathBuf,
        vectorizer: PathBuf,
    },
    Loaded {
        classifier: Box<dyn TextClassifier>,
        vectorizer: Box<dyn TextVectorizer>,
    },
}

/// Builder for [`SentimentPipeline`].
///
/// Translation is disabled unless a translator is supplied.
pub struct SentimentPipelineBuilder {
    source: ArtifactSource,
    translator: Box<dyn Translator>,
}

impl SentimentPipelineBuilder {
    /// Loads both artifacts from disk when [`Self::build`] is called.
    pub fn from_paths(classifier: impl Into<PathBuf>, vectorizer: impl Into<PathBuf>) -> Self {
        Self {
            source: ArtifactSource::Paths {
                classifier: classifier.into(),
                vectorizer: vectorizer.into(),
            },
            translator: Box::new(DisabledTranslator),
        }
    }

    pub fn from_artifacts(
        classifier: Box<dyn TextClassifier>,
        vectorizer: Box<dyn TextVectorizer>,
    ) -> Self {
        Self {
            source: ArtifactSource::Loaded {
                classifier,
                vectorizer,
            },
            translator: Box::new(DisabledTranslator),
        }
    }

    pub fn translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// # Errors
    ///
    /// Fails if an artifact cannot be read, is malformed, or the two artifacts
    /// disagree on the feature space.
    pub fn build(self) -> Result<SentimentPipeline, ArtifactError> {
        let (classifier, vectorizer) = match self.source {
            ArtifactSource::Paths {
                classifier,
                vectorizer,
            } => (
                load_classifier(&classifier)?,
                Box::new(load_vectorizer(&vectorizer)?) as Box<dyn TextVectorizer>,
            ),
            ArtifactSource::Loaded {
                classifier,
                vectorizer,
            } => (classifier, vectorizer),
        };
        SentimentPipeline::new(vectorizer, classifier, self.translator)
    }
}
