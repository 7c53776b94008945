//! Payloads exchanged with the pre-processing backend.
//!
//! Every field tolerates being absent or `null`; the renderer turns missing
//! values into empty strings, never into "null".

use serde::{Deserialize, Deserializer, Serialize};

/// Free-form JSON object (document metadata, caption provenance)
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Deserialize `null` as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured output of server-side processing for one uploaded file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub upload: Option<UploadInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: Vec<PageRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<TableRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: JsonMap,
    #[serde(default)]
    pub download: Option<DownloadInfo>,
    /// Content hash shared by byte-identical uploads
    #[serde(default)]
    pub pdf_hash: Option<String>,
}

impl ExtractionResult {
    /// File id the backend stamped on this result
    pub fn file_id(&self) -> Option<&str> {
        self.upload.as_ref().map(|u| u.file_id.as_str())
    }

    /// Link to the packaged artifacts, when the backend produced one
    pub fn zip_url(&self) -> Option<&str> {
        self.download
            .as_ref()
            .and_then(|d| d.zip_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadInfo {
    pub file_id: String,
    #[serde(default)]
    pub original_filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadInfo {
    #[serde(default)]
    pub zip_url: Option<String>,
}

/// One page of extracted content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ImageRef>,
}

/// Reference to an extracted image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, alias = "hash", deserialize_with = "null_as_default")]
    pub image_hash: String,
}

/// A detected table, rows of raw cell text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    #[serde(default)]
    pub page: Option<u32>,
    /// Position within its page
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<Vec<Option<String>>>,
}

/// Server-generated description and OCR output for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub image_hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Empty means "not yet described"
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub metadata: Option<JsonMap>,
    /// Empty means no OCR text was detected
    #[serde(default, deserialize_with = "null_as_default")]
    pub ocr_text: String,
    #[serde(default, alias = "page")]
    pub pagina: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl CaptionRecord {
    pub fn has_ocr_text(&self) -> bool {
        !self.ocr_text.trim().is_empty()
    }

    /// Text the caption filter searches: description, compact metadata JSON, OCR text
    pub fn search_text(&self) -> String {
        let metadata = match &self.metadata {
            Some(map) => serde_json::Value::Object(map.clone()).to_string(),
            None => "{}".to_string(),
        };
        format!("{} {} {}", self.description, metadata, self.ocr_text)
    }
}

/// `POST /api/upload` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
}

/// `POST /api/caption/{file_id}` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescribeResponse {
    /// Newly generated descriptions; zero means every image was a cache hit
    #[serde(default)]
    pub count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<serde_json::Value>,
}

/// `GET /api/caption/{file_id}` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CaptionRecord>,
}

/// One stored upload as listed by `GET /api/files`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_id: String,
    #[serde(default)]
    pub pdf_hash: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_filename: String,
    #[serde(default)]
    pub images: u64,
    #[serde(default)]
    pub images_described: u64,
    #[serde(default)]
    pub tables: u64,
}

/// `GET /api/files` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<FileSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extraction_result_full_payload() {
        let result: ExtractionResult = serde_json::from_value(json!({
            "pdf_hash": "ab12",
            "pages": [
                {"page": 1, "text": "Hello", "images": [{"url": "/public/images/h1.png", "hash": "h1"}]},
                {"page": 2, "text": null, "images": null}
            ],
            "tables": [{"page": 1, "index": 1, "rows": [["a", null], ["c", "d"]]}],
            "metadata": {"title": "Report"},
            "upload": {"file_id": "f1", "original_filename": "report.pdf"},
            "download": {"zip_url": "/public/report-f1.zip"}
        }))
        .unwrap();

        assert_eq!(result.file_id(), Some("f1"));
        assert_eq!(result.zip_url(), Some("/public/report-f1.zip"));
        assert_eq!(result.pages[0].images[0].image_hash, "h1");
        assert_eq!(result.pages[1].text, "");
        assert!(result.pages[1].images.is_empty());
        assert_eq!(result.tables[0].rows[0][1], None);
        assert_eq!(result.image_count(), 1);
    }

    #[test]
    fn test_db_synthesized_result_without_text_or_rows() {
        let result: ExtractionResult = serde_json::from_value(json!({
            "pdf_hash": "ab12",
            "pages": [{"page": 3, "images": [{"hash": "h9", "url": "/public/images/h9.png"}], "tables": []}],
            "tables": [{"hash": "t1", "url": "/public/tables/t1.json"}],
            "upload": {"file_id": "f2"}
        }))
        .unwrap();

        assert!(result.metadata.is_empty());
        assert!(result.tables[0].rows.is_empty());
        assert_eq!(result.tables[0].page, None);
        assert_eq!(result.zip_url(), None);
    }

    #[test]
    fn test_caption_record_nulls_and_aliases() {
        let record: CaptionRecord = serde_json::from_value(json!({
            "image_hash": "h1",
            "url": "/public/images/h1.png",
            "description": null,
            "metadata": null,
            "ocr_text": "  ",
            "page": 4
        }))
        .unwrap();

        assert_eq!(record.description, "");
        assert_eq!(record.metadata, None);
        assert_eq!(record.pagina, Some(4));
        assert!(!record.has_ocr_text());
        assert_eq!(record.search_text(), " {}   ");
    }

    #[test]
    fn test_search_text_uses_compact_metadata() {
        let record: CaptionRecord = serde_json::from_value(json!({
            "image_hash": "h1",
            "description": "Mapa",
            "metadata": {"regiao": "Sul"},
            "ocr_text": "ESCALA"
        }))
        .unwrap();

        assert_eq!(record.search_text(), r#"Mapa {"regiao":"Sul"} ESCALA"#);
    }

    #[test]
    fn test_search_text_keeps_metadata_key_order() {
        let record: CaptionRecord = serde_json::from_str(
            r#"{"image_hash": "h1", "description": "", "metadata": {"zona": 2, "area": 1}}"#,
        )
        .unwrap();

        assert_eq!(record.search_text(), r#" {"zona":2,"area":1} "#);
    }
}
