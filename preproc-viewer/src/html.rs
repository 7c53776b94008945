//! Escaped markup.
//!
//! [`Html`] can only be built by escaping raw text or through [`Element`],
//! so extracted text never reaches a panel unescaped.

use std::fmt;

/// Escape text for insertion into an HTML text node.
///
/// Replaces `&`, `<` and `>` (in that order, every occurrence). Already
/// escaped entities are escaped again.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an optional value; absent values become the empty string.
pub fn escape_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| escape_html(&v.to_string())).unwrap_or_default()
}

fn escape_attr(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}

/// A fragment of markup that is safe to insert into a panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html(String);

impl Html {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Escaped text node
    pub fn text(raw: &str) -> Self {
        Self(escape_html(raw))
    }

    /// Escaped text of an optional value; absent renders as nothing
    pub fn text_opt<T: ToString>(value: Option<T>) -> Self {
        Self(escape_opt(value))
    }

    pub fn concat(parts: impl IntoIterator<Item = Html>) -> Self {
        Self(parts.into_iter().map(|p| p.0).collect())
    }

    /// Join fragments with a newline, the way panel rows are laid out
    pub fn lines(parts: impl IntoIterator<Item = Html>) -> Self {
        Self(
            parts
                .into_iter()
                .map(|p| p.0)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element builder. Attribute values are quoted and escaped, children are
/// already-escaped [`Html`].
#[derive(Debug, Clone)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Html>,
    void: bool,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
            void: false,
        }
    }

    /// Element without a closing tag (`img`, `meta`, ...)
    pub fn void(tag: &'static str) -> Self {
        Self {
            void: true,
            ..Self::new(tag)
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl AsRef<str>) -> Self {
        self.attrs.push((name, escape_attr(value.as_ref())));
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, child: impl Into<Html>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Html>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(self, raw: &str) -> Self {
        self.child(Html::text(raw))
    }

    pub fn build(self) -> Html {
        let mut out = format!("<{}", self.tag);
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, value));
        }
        out.push('>');
        if self.void {
            return Html(out);
        }
        for child in self.children {
            out.push_str(&child.0);
        }
        out.push_str(&format!("</{}>", self.tag));
        Html(out)
    }
}

impl From<Element> for Html {
    fn from(element: Element) -> Self {
        element.build()
    }
}
