use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::websearch::CandidatePage;

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: u32,
    /// Provider-side timeout in milliseconds.
    pub timeout: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: Vec<CandidatePage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeFormat {
    Markdown,
}

impl ScrapeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeFormat::Markdown => "markdown",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub formats: Vec<ScrapeFormat>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeResponse {
    pub data: ScrapeData,
}

/// The `data` object of a scrape response, keyed by format name.
///
/// Decoding fails when `data` is missing or not an object. Individual format
/// fields stay untyped until [`ScrapeData::content`] looks them up.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ScrapeData(Map<String, Value>);

impl ScrapeData {
    /// Text for `format`, or `None` when the field is absent or not a string.
    pub fn content(&self, format: ScrapeFormat) -> Option<&str> {
        match self.0.get(format.as_str()) {
            Some(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
impl From<Value> for ScrapeData {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ScrapeData(map),
            _ => ScrapeData::default(),
        }
    }
}
