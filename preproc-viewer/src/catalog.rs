//! Stored-file catalog.
//!
//! Uploads of byte-identical PDFs share a content hash; the grouped
//! listing shows each hash once.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::backend::FileGrouping;
use crate::model::{FileList, FileSummary};

/// Compute SHA-256 hash of a byte slice, returning a hex string.
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// A selectable catalog row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub file_id: String,
    pub pdf_hash: Option<String>,
    pub label: String,
}

impl CatalogEntry {
    fn from_summary(summary: &FileSummary) -> Self {
        let name = if summary.original_filename.is_empty() {
            summary.file_id.as_str()
        } else {
            summary.original_filename.as_str()
        };
        Self {
            file_id: summary.file_id.clone(),
            pdf_hash: summary.pdf_hash.clone(),
            label: format!(
                "{} (imgs:{} descr:{} tabs:{})",
                name, summary.images, summary.images_described, summary.tables
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build the catalog from a listing, in listing order.
    ///
    /// Grouped listings keep only the first entry per content hash; entries
    /// without a hash are always kept.
    pub fn from_listing(list: &FileList, grouping: FileGrouping) -> Self {
        let mut seen = HashSet::new();
        let entries = list
            .items
            .iter()
            .filter(|summary| match (&summary.pdf_hash, grouping) {
                (Some(hash), FileGrouping::ByPdf) => seen.insert(hash.clone()),
                _ => true,
            })
            .map(CatalogEntry::from_summary)
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, file_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.file_id == file_id)
    }

    /// Entry already holding a PDF with this content hash
    pub fn find_by_hash(&self, pdf_hash: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.pdf_hash.as_deref() == Some(pdf_hash))
    }
}
