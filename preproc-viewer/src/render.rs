//! Tab renderers.
//!
//! Pure functions from view-model state to panel markup. Extracted text
//! only reaches markup through [`Html::text`]; payload URLs are used as-is
//! for link and image sources.

pub mod report;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use crate::captions::{CaptionCache, CaptionFilter};
use crate::html::{Element, Html};
use crate::model::{CaptionRecord, ExtractionResult, JsonMap, PageRecord, TableRecord};

/// Viewer tabs, in display order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Tab {
    #[default]
    Text,
    Images,
    Tables,
    Metadata,
    Captions,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Text => "Text",
            Tab::Images => "Images",
            Tab::Tables => "Tables",
            Tab::Metadata => "Metadata",
            Tab::Captions => "Descriptions",
        }
    }
}

pub const NO_IMAGES: &str = "No images found";
pub const NO_TABLES: &str = "No tables detected";
pub const NO_CAPTIONS: &str = "No descriptions found. Use \"Describe images\" to generate them.";
pub const NO_CAPTION_MATCHES: &str = "No descriptions match the current filters";

fn muted(message: &str) -> Html {
    Element::new("div").class("muted").text(message).build()
}

fn code_block(raw: &str) -> Html {
    Element::new("pre").class("code").text(raw).build()
}

fn section_label(raw: &str) -> Html {
    Element::new("div").class("section-label").text(raw).build()
}

fn display_opt(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn pretty_json(map: &JsonMap) -> String {
    serde_json::to_string_pretty(map).unwrap_or_else(|_| "{}".to_string())
}

/// Page texts as one preformatted block, pages in array order
pub fn render_text_tab(extract: &ExtractionResult) -> Html {
    let text = extract
        .pages
        .iter()
        .map(|page| format!("--- PAGE {} ---\n{}", page.page, page.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    code_block(&text)
}

fn render_page_images(page: &PageRecord) -> Html {
    let thumbnails = page.images.iter().map(|image| {
        Element::new("a")
            .attr("href", &image.url)
            .attr("target", "_blank")
            .child(
                Element::void("img")
                    .attr("src", &image.url)
                    .attr("alt", format!("img p{}", page.page)),
            )
            .build()
    });

    Element::new("div")
        .child(section_label(&format!("Page {}", page.page)))
        .child(Element::new("div").class("img-grid").children(thumbnails))
        .build()
}

/// Thumbnails grouped by page; pages without images are skipped
pub fn render_images_tab(extract: &ExtractionResult) -> Html {
    let groups: Vec<Html> = extract
        .pages
        .iter()
        .filter(|page| !page.images.is_empty())
        .map(render_page_images)
        .collect();

    if groups.is_empty() {
        muted(NO_IMAGES)
    } else {
        Html::concat(groups)
    }
}

fn render_table(table: &TableRecord) -> Html {
    let rows = table.rows.iter().map(|row| {
        let cells = row.iter().map(|cell| {
            Element::new("td")
                .text(cell.as_deref().unwrap_or_default())
                .build()
        });
        Element::new("tr").children(cells).build()
    });

    let label = format!(
        "Page {} - Table {}",
        display_opt(table.page),
        display_opt(table.index)
    );

    Element::new("div")
        .class("table-block")
        .child(section_label(&label))
        .child(
            Element::new("table")
                .class("table")
                .child(Element::new("tbody").children(rows)),
        )
        .build()
}

/// One headerless table per detected table, in array order
pub fn render_tables_tab(extract: &ExtractionResult) -> Html {
    if extract.tables.is_empty() {
        return muted(NO_TABLES);
    }
    Html::concat(extract.tables.iter().map(render_table))
}

/// Pretty-printed document metadata
pub fn render_metadata_tab(extract: &ExtractionResult) -> Html {
    code_block(&pretty_json(&extract.metadata))
}

fn render_caption_row(record: &CaptionRecord) -> Html {
    let metadata = record.metadata.as_ref().map(pretty_json).unwrap_or_default();
    let image = Element::void("img")
        .class("caption-thumb")
        .attr("src", &record.url)
        .attr("alt", &record.image_hash);

    let cell = |content: Html| Element::new("td").child(content).build();

    Element::new("tr")
        .child(cell(image.build()))
        .child(cell(Element::new("code").text(&record.image_hash).build()))
        .child(cell(code_block(&record.description)))
        .child(cell(code_block(&metadata)))
        .child(cell(code_block(&record.ocr_text)))
        .child(cell(Html::text_opt(record.pagina)))
        .build()
}

/// Filtered caption list as a table.
///
/// An empty cache renders the "no descriptions" message instead of an empty table.
pub fn render_captions_tab(cache: &CaptionCache, filter: &CaptionFilter) -> Html {
    if cache.items().is_empty() {
        return muted(NO_CAPTIONS);
    }

    let visible = cache.filter(filter);
    if visible.is_empty() {
        return muted(NO_CAPTION_MATCHES);
    }

    let header = ["Image", "Hash", "Description", "Metadata", "OCR", "Page"]
        .iter()
        .map(|title| Element::new("th").text(title).build());

    Element::new("table")
        .class("table")
        .child(Element::new("thead").child(Element::new("tr").children(header)))
        .child(
            Element::new("tbody").child(Html::lines(
                visible.into_iter().map(render_caption_row),
            )),
        )
        .build()
}
