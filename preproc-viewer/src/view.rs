//! In-memory view state: rendered panels, control enablement, pager and catalog.

use std::collections::HashMap;

use strum::IntoEnumIterator;

use crate::captions::CaptionFilter;
use crate::catalog::Catalog;
use crate::html::Html;
use crate::render::Tab;
use crate::viewer::PdfViewer;

/// Page navigation controls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pager {
    /// `Page {current}/{total}`, absent until a document is loaded
    pub label: Option<String>,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl Pager {
    pub fn from_viewer(viewer: &PdfViewer) -> Self {
        Self {
            label: viewer
                .position()
                .map(|(page, total)| format!("Page {}/{}", page, total)),
            previous_enabled: viewer.can_previous(),
            next_enabled: viewer.can_next(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub active_tab: Tab,
    panels: HashMap<Tab, Html>,
    pub extract_enabled: bool,
    pub describe_enabled: bool,
    /// Shown only while the current extraction has an artifact package
    pub download_url: Option<String>,
    /// Becomes true the first time the captions panel is rendered
    pub filters_visible: bool,
    /// Filter control values; read when filters are applied
    pub filter: CaptionFilter,
    pub pager: Pager,
    pub catalog: Catalog,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `tab`; every other panel is hidden
    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn set_panel(&mut self, tab: Tab, html: Html) {
        if tab == Tab::Captions {
            self.filters_visible = true;
        }
        self.panels.insert(tab, html);
    }

    pub fn panel(&self, tab: Tab) -> Option<&Html> {
        self.panels.get(&tab)
    }

    /// Panels in tab order, with whether each one is visible
    pub fn panels(&self) -> Vec<(Tab, Option<&Html>, bool)> {
        Tab::iter()
            .map(|tab| (tab, self.panels.get(&tab), tab == self.active_tab))
            .collect()
    }

    pub fn clear_panels(&mut self) {
        self.panels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_panel_visible() {
        let mut view = ViewState::new();
        view.select_tab(Tab::Tables);

        let visible: Vec<Tab> = view
            .panels()
            .into_iter()
            .filter(|(_, _, visible)| *visible)
            .map(|(tab, _, _)| tab)
            .collect();

        assert_eq!(visible, vec![Tab::Tables]);
        assert_eq!(view.panels().len(), 5);
    }

    #[test]
    fn test_captions_panel_reveals_filters() {
        let mut view = ViewState::new();
        view.set_panel(Tab::Text, Html::text("A"));
        assert!(!view.filters_visible);

        view.set_panel(Tab::Captions, Html::text("B"));

        assert!(view.filters_visible);
        assert_eq!(view.panel(Tab::Captions).unwrap().as_str(), "B");
    }

    #[test]
    fn test_pager_for_unloaded_viewer() {
        let pager = Pager::from_viewer(&PdfViewer::new(1.3));

        assert_eq!(pager, Pager::default());
    }
}
