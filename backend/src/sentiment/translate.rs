use super::error::TranslationError;
use serde_json::Value;
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

pub const SOURCE_AUTO: &str = "auto";
pub const TARGET_ENGLISH: &str = "en";

const DEVANAGARI: RangeInclusive<char> = '\u{0900}'..='\u{097F}';

/// Converts text into another language.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: &str, target: &str)
    -> Result<String, TranslationError>;
}

/// Whether text is sent through translation before scoring.
///
/// Only Devanagari is detected from the text itself; other scripts are
/// translated only when the caller passes a non-English language hint.
pub fn needs_translation(text: &str, lang_hint: Option<&str>) -> bool {
    let hinted = lang_hint
        .map(str::trim)
        .filter(|hint| !hint.is_empty())
        .is_some_and(|hint| !hint.eq_ignore_ascii_case(TARGET_ENGLISH));
    hinted || text.chars().any(|c| DEVANAGARI.contains(&c))
}

/// Client for the public Google translate endpoint.
pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
    endpoint: Url,
}

impl GoogleTranslator {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, TranslationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

impl Translator for GoogleTranslator {
    fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        log::debug!("Translating {} chars from '{}' to '{}'", text.len(), source, target);
        let payload: Value = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        parse_translation(&payload)
    }
}

/// Joins the translated segments of a `translate_a/single` response.
fn parse_translation(payload: &Value) -> Result<String, TranslationError> {
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or(TranslationError::UnexpectedPayload)?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(TranslationError::EmptyResponse);
    }
    Ok(translated)
}

/// Used when translation is switched off; every call degrades to the original text.
pub struct DisabledTranslator;

impl Translator for DisabledTranslator {
    fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslationError> {
        Err(TranslationError::Disabled)
    }
}
