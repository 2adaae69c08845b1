//! CSV batch prediction.

use crate::sentiment::{PipelineError, SentimentPipeline};
use chrono::Utc;
use shared::{format_confidence, BatchResponse, HistoryEntry, CONFIDENCE_COLUMN, SENTIMENT_COLUMN};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("could not parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV file has no '{0}' column")]
    MissingColumn(String),
    #[error("uploaded file is empty")]
    Empty,
    #[error("failed to write CSV: {0}")]
    Write(String),
}

/// Uploaded CSV with the position of its text column.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    text_index: usize,
}

impl BatchTable {
    pub fn parse(data: &[u8], text_column: &str) -> Result<Self, BatchError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(BatchError::Empty);
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let text_index = headers
            .iter()
            .position(|h| h.trim() == text_column)
            .ok_or_else(|| BatchError::MissingColumn(text_column.to_string()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let mut row: Vec<String> = record?.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            text_index,
        })
    }

    pub fn text(&self, row: usize) -> &str {
        &self.rows[row][self.text_index]
    }
}

/// Scored table plus the history entries produced for its non-blank rows.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub response: BatchResponse,
    pub history: Vec<HistoryEntry>,
}

/// Classifies every row. Blank rows keep empty sentiment and confidence cells.
pub fn score_table(
    pipeline: &SentimentPipeline,
    table: BatchTable,
) -> Result<BatchOutcome, PipelineError> {
    let mut history = Vec::new();
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut skipped = 0;

    for index in 0..table.rows.len() {
        let text = table.text(index);
        let mut row = table.rows[index].clone();

        if text.trim().is_empty() {
            skipped += 1;
            row.extend([String::new(), String::new()]);
        } else {
            let result = pipeline.classify(text, None)?;
            row.push(result.label.to_string());
            row.push(format_confidence(result.confidence));
            history.push(HistoryEntry::new(text, result.label, result.confidence, Utc::now()));
        }
        rows.push(row);
    }

    let mut columns = table.headers;
    columns.push(SENTIMENT_COLUMN.to_string());
    columns.push(CONFIDENCE_COLUMN.to_string());

    log::info!("Scored {} batch rows, skipped {} blank", history.len(), skipped);
    Ok(BatchOutcome {
        response: BatchResponse {
            columns,
            rows,
            scored: history.len(),
            skipped,
        },
        history,
    })
}

pub fn to_csv(response: &BatchResponse) -> Result<Vec<u8>, BatchError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&response.columns)?;
    for row in &response.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| BatchError::Write(e.to_string()))
}
