use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Column appended to batch output holding the predicted label.
pub const SENTIMENT_COLUMN: &str = "Sentiment";
/// Column appended to batch output holding the formatted confidence.
pub const CONFIDENCE_COLUMN: &str = "Confidence";

/// Shown when a prediction is requested for blank text.
pub const EMPTY_TEXT_WARNING: &str = "Please enter some text to analyze.";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum SentimentLabel {
    Negative,
    Positive,
}

impl SentimentLabel {
    pub fn class_id(self) -> u8 {
        match self {
            SentimentLabel::Negative => 0,
            SentimentLabel::Positive => 1,
        }
    }
}

/// Formats a confidence percentage the way it is shown in history and exports.
pub fn format_confidence(confidence: Option<f64>) -> String {
    match confidence {
        Some(value) => format!("{:.2}%", value),
        None => "N/A".to_string(),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictRequest {
    pub text: String,
    #[serde(default)]
    pub lang_hint: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictResponse {
    pub label: SentimentLabel,
    pub class_id: u8,
    /// Percentage of the most likely class; absent when the classifier has no probabilities.
    pub confidence: Option<f64>,
    pub scored_text: String,
    pub translated: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub text: String,
    pub label: SentimentLabel,
    pub confidence: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        text: impl Into<String>,
        label: SentimentLabel,
        confidence: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            label,
            confidence: format_confidence(confidence),
            created_at,
        }
    }
}

/// Label counts backing the history pie chart.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
}

impl HistorySummary {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let positive = entries
            .iter()
            .filter(|entry| entry.label == SentimentLabel::Positive)
            .count();
        Self {
            total: entries.len(),
            positive,
            negative: entries.len() - positive,
        }
    }

    pub fn count(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
        }
    }

    /// Percentage of entries carrying `label`, 0 for an empty history.
    pub fn share(&self, label: SentimentLabel) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(label) as f64 * 100.0 / self.total as f64
    }

    /// Non-empty `(label, count)` pairs in a stable order.
    pub fn breakdown(&self) -> Vec<(SentimentLabel, usize)> {
        SentimentLabel::iter()
            .map(|label| (label, self.count(label)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
    pub summary: HistorySummary,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BatchResponse {
    /// Original CSV headers followed by the sentiment and confidence columns.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub scored: usize,
    pub skipped: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
