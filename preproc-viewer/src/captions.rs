//! Caption cache and client-side filtering.
//!
//! The cache holds the image descriptions of exactly one file. Filtering
//! never touches the cached list; it produces a derived display list.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::CaptionRecord;

/// OCR presence filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OcrFilter {
    #[default]
    Any,
    /// Non-empty OCR text after trimming
    WithText,
    /// Empty OCR text after trimming
    WithoutText,
}

impl OcrFilter {
    pub fn accepts(&self, record: &CaptionRecord) -> bool {
        match self {
            OcrFilter::Any => true,
            OcrFilter::WithText => record.has_ocr_text(),
            OcrFilter::WithoutText => !record.has_ocr_text(),
        }
    }
}

/// Filter control values, read when "apply filters" is triggered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionFilter {
    pub query: String,
    pub ocr: OcrFilter,
}

impl CaptionFilter {
    pub fn new(query: impl Into<String>, ocr: OcrFilter) -> Self {
        Self {
            query: query.into(),
            ocr,
        }
    }

    /// Case-insensitive substring match over description, metadata JSON and OCR text
    pub fn matches(&self, record: &CaptionRecord) -> bool {
        if !self.ocr.accepts(record) {
            return false;
        }
        if self.query.is_empty() {
            return true;
        }
        record
            .search_text()
            .to_lowercase()
            .contains(&self.query.to_lowercase())
    }
}

/// Image descriptions for the active file
#[derive(Debug, Clone, Default)]
pub struct CaptionCache {
    file_id: Option<String>,
    items: Vec<CaptionRecord>,
    loaded: bool,
}

impl CaptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn items(&self) -> &[CaptionRecord] {
        &self.items
    }

    /// Whether a load has completed for the cached file
    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Drop everything; the cache belongs to a file that is no longer active
    pub fn invalidate(&mut self) {
        self.file_id = None;
        self.items.clear();
        self.loaded = false;
    }

    /// Replace the cached list with a freshly loaded one
    pub fn replace(&mut self, file_id: &str, items: Vec<CaptionRecord>) {
        self.file_id = Some(file_id.to_string());
        self.items = items;
        self.loaded = true;
    }

    /// Derived display list, in cache order
    pub fn filter(&self, filter: &CaptionFilter) -> Vec<&CaptionRecord> {
        self.items.iter().filter(|r| filter.matches(r)).collect()
    }

    pub fn described_count(&self) -> usize {
        self.items
            .iter()
            .filter(|r| !r.description.trim().is_empty())
            .count()
    }
}
