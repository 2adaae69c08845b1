//! Binary linear classifiers over vectorized text.

use super::error::{ArtifactError, PipelineError, ProbabilityError};
use ndarray::ArrayView1;
use serde::Deserialize;
use shared::SentimentLabel;

const BINARY_CLASSES: [i64; 2] = [0, 1];

/// A fitted binary classifier mapping features to a sentiment label.
pub trait TextClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn n_features(&self) -> usize;

    fn predict(&self, features: ArrayView1<f64>) -> Result<SentimentLabel, PipelineError>;

    /// Class probabilities `[p_negative, p_positive]`.
    fn predict_proba(&self, features: ArrayView1<f64>) -> Result<[f64; 2], ProbabilityError>;
}

/// Serialized classifier, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression(LogisticRegression),
    MultinomialNb(MultinomialNb),
    LinearSvc(LinearSvc),
}

impl ClassifierArtifact {
    pub fn from_json(raw: &str) -> Result<Self, ArtifactError> {
        let artifact: ClassifierArtifact = serde_json::from_str(raw)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ClassifierArtifact::LogisticRegression(model) => model.linear.validate(),
            ClassifierArtifact::LinearSvc(model) => model.linear.validate(),
            ClassifierArtifact::MultinomialNb(model) => model.validate(),
        }
    }

    pub fn into_classifier(self) -> Box<dyn TextClassifier> {
        match self {
            ClassifierArtifact::LogisticRegression(model) => Box::new(model),
            ClassifierArtifact::MultinomialNb(model) => Box::new(model),
            ClassifierArtifact::LinearSvc(model) => Box::new(model),
        }
    }
}

fn validate_classes(classes: &[i64]) -> Result<(), ArtifactError> {
    if classes != BINARY_CLASSES.as_slice() {
        return Err(ArtifactError::Invalid(format!(
            "expected classes {:?}, found {:?}",
            BINARY_CLASSES, classes
        )));
    }
    Ok(())
}

fn validate_finite(what: &str, values: &[f64]) -> Result<(), ArtifactError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::Invalid(format!("{} contains non-finite values", what)));
    }
    Ok(())
}

fn check_dimension(expected: usize, features: &ArrayView1<f64>) -> Result<(), PipelineError> {
    if features.len() != expected {
        return Err(PipelineError::DimensionMismatch {
            expected,
            found: features.len(),
        });
    }
    Ok(())
}

/// Weights shared by the linear models.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearWeights {
    coef: Vec<f64>,
    intercept: f64,
    classes: Vec<i64>,
}

impl LinearWeights {
    fn validate(&self) -> Result<(), ArtifactError> {
        validate_classes(&self.classes)?;
        if self.coef.is_empty() {
            return Err(ArtifactError::Invalid("classifier has no coefficients".into()));
        }
        validate_finite("coef", &self.coef)?;
        validate_finite("intercept", &[self.intercept])
    }

    fn decision(&self, features: &ArrayView1<f64>) -> Result<f64, PipelineError> {
        check_dimension(self.coef.len(), features)?;
        let score = ArrayView1::from(&self.coef[..]).dot(features) + self.intercept;
        if !score.is_finite() {
            return Err(PipelineError::NonFiniteDecision);
        }
        Ok(score)
    }

    fn label(&self, score: f64) -> SentimentLabel {
        if score > 0.0 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    #[serde(flatten)]
    linear: LinearWeights,
}

impl TextClassifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.linear.coef.len()
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<SentimentLabel, PipelineError> {
        let score = self.linear.decision(&features)?;
        Ok(self.linear.label(score))
    }

    fn predict_proba(&self, features: ArrayView1<f64>) -> Result<[f64; 2], ProbabilityError> {
        let score = self
            .linear
            .decision(&features)
            .map_err(|_| ProbabilityError::NonFinite)?;
        let positive = 1.0 / (1.0 + (-score).exp());
        Ok([1.0 - positive, positive])
    }
}

/// Margin classifier without calibrated probabilities.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearSvc {
    #[serde(flatten)]
    linear: LinearWeights,
}

impl TextClassifier for LinearSvc {
    fn name(&self) -> &'static str {
        "linear_svc"
    }

    fn n_features(&self) -> usize {
        self.linear.coef.len()
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<SentimentLabel, PipelineError> {
        let score = self.linear.decision(&features)?;
        Ok(self.linear.label(score))
    }

    fn predict_proba(&self, _features: ArrayView1<f64>) -> Result<[f64; 2], ProbabilityError> {
        Err(ProbabilityError::Unsupported)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultinomialNb {
    class_log_prior: Vec<f64>,
    /// One row of per-feature log probabilities per class.
    feature_log_prob: Vec<Vec<f64>>,
    classes: Vec<i64>,
}

impl MultinomialNb {
    fn validate(&self) -> Result<(), ArtifactError> {
        validate_classes(&self.classes)?;
        if self.class_log_prior.len() != 2 || self.feature_log_prob.len() != 2 {
            return Err(ArtifactError::Invalid(
                "naive bayes model must have exactly two classes".into(),
            ));
        }
        let n_features = self.feature_log_prob[0].len();
        if n_features == 0 || self.feature_log_prob[1].len() != n_features {
            return Err(ArtifactError::Invalid(
                "naive bayes feature log probabilities have inconsistent widths".into(),
            ));
        }
        validate_finite("class_log_prior", &self.class_log_prior)?;
        for row in &self.feature_log_prob {
            validate_finite("feature_log_prob", row)?;
        }
        Ok(())
    }

    fn joint_log_likelihood(&self, features: &ArrayView1<f64>) -> Result<[f64; 2], PipelineError> {
        check_dimension(self.n_features(), features)?;
        let mut jll = [0.0; 2];
        for (class, slot) in jll.iter_mut().enumerate() {
            let log_prob = ArrayView1::from(&self.feature_log_prob[class][..]);
            *slot = self.class_log_prior[class] + log_prob.dot(features);
        }
        if jll.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::NonFiniteDecision);
        }
        Ok(jll)
    }
}

impl TextClassifier for MultinomialNb {
    fn name(&self) -> &'static str {
        "multinomial_nb"
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob[0].len()
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<SentimentLabel, PipelineError> {
        let [negative, positive] = self.joint_log_likelihood(&features)?;
        // Ties resolve to the first class.
        if positive > negative {
            Ok(SentimentLabel::Positive)
        } else {
            Ok(SentimentLabel::Negative)
        }
    }

    fn predict_proba(&self, features: ArrayView1<f64>) -> Result<[f64; 2], ProbabilityError> {
        let jll = self
            .joint_log_likelihood(&features)
            .map_err(|_| ProbabilityError::NonFinite)?;
        let max = jll[0].max(jll[1]);
        let exp = [(jll[0] - max).exp(), (jll[1] - max).exp()];
        let total = exp[0] + exp[1];
        Ok([exp[0] / total, exp[1] / total])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn logistic() -> Box<dyn TextClassifier> {
        ClassifierArtifact::from_json(
            r#"{"kind": "logistic_regression", "coef": [2.0, -3.0], "intercept": 0.0,
                "classes": [0, 1]}"#,
        )
        .unwrap()
        .into_classifier()
    }

    #[test]
    fn logistic_regression_predicts_and_scores() {
        let model = logistic();
        let features = array![1.0, 0.0];
        assert_eq!(model.predict(features.view()).unwrap(), SentimentLabel::Positive);

        let [negative, positive] = model.predict_proba(features.view()).unwrap();
        assert!((positive - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
        assert!((negative + positive - 1.0).abs() < 1e-12);

        let features = array![0.0, 1.0];
        assert_eq!(model.predict(features.view()).unwrap(), SentimentLabel::Negative);
    }

    #[test]
    fn zero_decision_is_negative() {
        let model = logistic();
        let features = array![0.0, 0.0];
        assert_eq!(model.predict(features.view()).unwrap(), SentimentLabel::Negative);
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let model = logistic();
        let features = array![1.0, 0.0, 0.5];
        let err = model.predict(features.view()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn linear_svc_has_no_probabilities() {
        let model = ClassifierArtifact::from_json(
            r#"{"kind": "linear_svc", "coef": [1.0], "intercept": -0.5, "classes": [0, 1]}"#,
        )
        .unwrap()
        .into_classifier();
        let features = array![1.0];
        assert_eq!(model.predict(features.view()).unwrap(), SentimentLabel::Positive);
        assert_eq!(
            model.predict_proba(features.view()),
            Err(ProbabilityError::Unsupported)
        );
    }

    #[test]
    fn naive_bayes_softmax_probabilities() {
        let model = ClassifierArtifact::from_json(
            r#"{"kind": "multinomial_nb",
                "class_log_prior": [-0.6931471805599453, -0.6931471805599453],
                "feature_log_prob": [[-0.2, -2.0], [-2.0, -0.2]],
                "classes": [0, 1]}"#,
        )
        .unwrap()
        .into_classifier();
        let features = array![0.0, 1.0];
        assert_eq!(model.predict(features.view()).unwrap(), SentimentLabel::Positive);
        let [negative, positive] = model.predict_proba(features.view()).unwrap();
        let expected = 1.0 / (1.0 + (-1.8f64).exp());
        assert!((positive - expected).abs() < 1e-12);
        assert!((negative + positive - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_binary_classes() {
        let err = ClassifierArtifact::from_json(
            r#"{"kind": "logistic_regression", "coef": [1.0], "intercept": 0.0,
                "classes": [-1, 1]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = ClassifierArtifact::from_json(r#"{"kind": "random_forest"}"#).unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed(_)));
    }

    #[test]
    fn rejects_ragged_naive_bayes() {
        let err = ClassifierArtifact::from_json(
            r#"{"kind": "multinomial_nb", "class_log_prior": [-0.7, -0.7],
                "feature_log_prob": [[-0.2, -2.0], [-2.0]], "classes": [0, 1]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }
}
