//! History exports: CSV and a paginated PDF report.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use shared::HistoryEntry;

pub const REPORT_TITLE: &str = "Sentiment Analysis Report";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 10;
const LINE_HEIGHT: i64 = 15;
const TITLE_GAP: i64 = 30;
const PREVIEW_CHARS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to build PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

pub fn history_csv(entries: &[HistoryEntry]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Text", "Sentiment", "Confidence"])?;
    for entry in entries {
        let label = entry.label.to_string();
        writer.write_record([entry.text.as_str(), label.as_str(), entry.confidence.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}

/// One report line: `"<first 50 chars>... | <label> | <confidence>"`.
pub fn report_line(entry: &HistoryEntry) -> String {
    let preview: String = entry.text.chars().take(PREVIEW_CHARS).collect();
    format!("{}... | {} | {}", preview, entry.label, entry.confidence)
}

/// The standard Type1 fonts only cover printable ASCII.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}

/// Splits report lines into pages. The first page also carries the title.
pub fn paginate(lines: &[String]) -> Vec<&[String]> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut cursor = PAGE_HEIGHT - MARGIN - TITLE_GAP;

    for index in 0..lines.len() {
        if cursor < MARGIN {
            pages.push(&lines[start..index]);
            start = index;
            cursor = PAGE_HEIGHT - MARGIN;
        }
        cursor -= LINE_HEIGHT;
    }
    pages.push(&lines[start..]);
    pages
}

fn text_at(operations: &mut Vec<Operation>, size: i64, y: i64, text: &str) {
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec!["F1".into(), Object::Integer(size)],
    ));
    operations.push(Operation::new(
        "Td",
        vec![Object::Integer(MARGIN), Object::Integer(y)],
    ));
    operations.push(Operation::new(
        "Tj",
        vec![Object::string_literal(pdf_safe(text))],
    ));
    operations.push(Operation::new("ET", vec![]));
}

fn page_content(lines: &[String], with_title: bool) -> Content {
    let mut operations = Vec::new();
    let mut cursor = PAGE_HEIGHT - MARGIN;
    if with_title {
        text_at(&mut operations, TITLE_SIZE, cursor, REPORT_TITLE);
        cursor -= TITLE_GAP;
    }
    for line in lines {
        text_at(&mut operations, BODY_SIZE, cursor, line);
        cursor -= LINE_HEIGHT;
    }
    Content { operations }
}

pub fn history_pdf(entries: &[HistoryEntry]) -> Result<Vec<u8>, ReportError> {
    let lines: Vec<String> = entries.iter().map(report_line).collect();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<ObjectId> = Vec::new();
    for (index, page_lines) in paginate(&lines).into_iter().enumerate() {
        let content = page_content(page_lines, index == 0);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        kids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(kids.len() as i64),
        "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<Object>>(),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    log::debug!("Rendered {} history entries into a {} byte PDF", entries.len(), buffer.len());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::SentimentLabel;

    fn entry(text: &str) -> HistoryEntry {
        HistoryEntry::new(text, SentimentLabel::Positive, Some(91.234), Utc::now())
    }

    #[test]
    fn csv_has_header_and_escapes_text() {
        let entries = vec![
            entry("Great, truly great"),
            HistoryEntry::new("meh", SentimentLabel::Negative, None, Utc::now()),
        ];
        let csv = String::from_utf8(history_csv(&entries).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Text,Sentiment,Confidence\n\"Great, truly great\",Positive,91.23%\nmeh,Negative,N/A\n"
        );
    }

    #[test]
    fn report_line_truncates_to_fifty_chars() {
        let long = "x".repeat(80);
        let line = report_line(&entry(&long));
        assert_eq!(line, format!("{}... | Positive | 91.23%", "x".repeat(50)));
        assert_eq!(report_line(&entry("short")), "short... | Positive | 91.23%");
    }

    #[test]
    fn non_ascii_is_replaced() {
        assert_eq!(pdf_safe("अच्छा ok"), "????? ok");
    }

    #[test]
    fn pagination_starts_new_page_at_bottom_margin() {
        let first_page = ((PAGE_HEIGHT - MARGIN - TITLE_GAP - MARGIN) / LINE_HEIGHT + 1) as usize;
        let lines: Vec<String> = (0..first_page).map(|i| i.to_string()).collect();
        assert_eq!(paginate(&lines).len(), 1);

        let lines: Vec<String> = (0..=first_page).map(|i| i.to_string()).collect();
        let pages = paginate(&lines);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), first_page);
        assert_eq!(pages[1], &lines[first_page..]);
    }

    #[test]
    fn empty_history_still_renders_title_page() {
        assert_eq!(paginate(&[]).len(), 1);
        let pdf = history_pdf(&[]).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn pdf_contains_one_page_per_chunk() {
        let entries: Vec<HistoryEntry> = (0..120).map(|i| entry(&format!("tweet {i}"))).collect();
        let pdf = history_pdf(&entries).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let lines: Vec<String> = entries.iter().map(report_line).collect();
        assert_eq!(doc.get_pages().len(), paginate(&lines).len());
        assert!(doc.get_pages().len() > 1);
    }
}
