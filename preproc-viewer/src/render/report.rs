//! Static HTML page for the whole view state.

use strum::IntoEnumIterator;

use crate::captions::OcrFilter;
use crate::diagnostics::LogEntry;
use crate::html::{Element, Html};
use crate::render::Tab;
use crate::view::ViewState;

const STYLE: &str = "body{font-family:sans-serif;background:#111827;color:#e5e7eb;margin:16px}\
.muted,.section-label{color:#9ca3af;margin:6px 0}\
.code{white-space:pre-wrap;background:#1f2937;padding:8px}\
.img-grid img,.caption-thumb{max-width:160px}\
.table td,.table th{border:1px solid #374151;padding:4px}\
.tab.active{font-weight:bold}\
#log{background:#030712;padding:8px}";

fn button(id: &'static str, label: &str, enabled: bool) -> Html {
    let element = Element::new("button").attr("id", id).text(label);
    if enabled {
        element.build()
    } else {
        element.attr("disabled", "").build()
    }
}

fn controls(view: &ViewState) -> Html {
    let download = match &view.download_url {
        Some(url) => Element::new("a")
            .attr("id", "download")
            .attr("href", url)
            .text("Download artifacts")
            .build(),
        None => Html::empty(),
    };

    let options = view.catalog.entries().iter().map(|entry| {
        Element::new("option")
            .attr("value", &entry.file_id)
            .text(&entry.label)
            .build()
    });

    Element::new("div")
        .class("controls")
        .child(button("btnExtract", "Extract", view.extract_enabled))
        .child(button("btnDescribe", "Describe images", view.describe_enabled))
        .child(download)
        .child(Element::new("select").attr("id", "dbFiles").children(options))
        .build()
}

fn pager(view: &ViewState, canvas_src: Option<&str>) -> Html {
    let canvas = match canvas_src {
        Some(src) => Element::void("img")
            .attr("id", "canvas")
            .attr("src", src)
            .attr("alt", "page")
            .build(),
        None => Html::empty(),
    };

    Element::new("div")
        .class("pager")
        .child(button("prevPage", "Previous", view.pager.previous_enabled))
        .child(
            Element::new("span")
                .attr("id", "pageInfo")
                .child(Html::text_opt(view.pager.label.as_deref())),
        )
        .child(button("nextPage", "Next", view.pager.next_enabled))
        .child(canvas)
        .build()
}

fn filter_box(view: &ViewState) -> Html {
    if !view.filters_visible {
        return Html::empty();
    }

    let choices = [
        (OcrFilter::Any, "Any"),
        (OcrFilter::WithText, "With OCR text"),
        (OcrFilter::WithoutText, "Without OCR text"),
    ];
    let options = choices.into_iter().map(|(value, label)| {
        let option = Element::new("option").attr("value", value.to_string());
        let option = if value == view.filter.ocr {
            option.attr("selected", "")
        } else {
            option
        };
        option.text(label).build()
    });

    Element::new("div")
        .attr("id", "captionFilters")
        .child(
            Element::void("input")
                .attr("id", "captionQuery")
                .attr("value", &view.filter.query),
        )
        .child(Element::new("select").attr("id", "captionOcr").children(options))
        .build()
}

fn tabs(view: &ViewState) -> Html {
    let buttons = Tab::iter().map(|tab| {
        let class = if tab == view.active_tab {
            "tab active"
        } else {
            "tab"
        };
        Element::new("button")
            .class(class)
            .attr("data-tab", tab.to_string())
            .text(tab.title())
            .build()
    });

    let panels = view.panels().into_iter().map(|(tab, html, visible)| {
        let panel = Element::new("div")
            .attr("id", format!("tab-{}", tab))
            .class("panel");
        let panel = if visible { panel } else { panel.attr("hidden", "") };
        let panel = if tab == Tab::Captions {
            panel.child(filter_box(view))
        } else {
            panel
        };
        panel.child(html.cloned().unwrap_or_default()).build()
    });

    Element::new("div")
        .child(Element::new("nav").class("tabs").children(buttons))
        .child(Html::lines(panels))
        .build()
}

fn log_panel(entries: &[LogEntry]) -> Html {
    let text = entries
        .iter()
        .map(LogEntry::line)
        .collect::<Vec<_>>()
        .join("\n");
    Element::new("pre").attr("id", "log").text(&text).build()
}

/// Full page: controls, pager, tab panels (only the active one visible) and log panel
pub fn render_report(
    title: &str,
    view: &ViewState,
    log: &[LogEntry],
    canvas_src: Option<&str>,
) -> String {
    let head = Element::new("head")
        .child(Element::void("meta").attr("charset", "utf-8"))
        .child(Element::new("title").text(title))
        .child(Element::new("style").text(STYLE));

    let body = Element::new("body")
        .child(Element::new("h1").text(title))
        .child(controls(view))
        .child(pager(view, canvas_src))
        .child(tabs(view))
        .child(log_panel(log));

    let page = Element::new("html").child(head).child(body).build();
    format!("<!doctype html>\n{}\n", page)
}
