//! A minimal XML element tree for emitting clipboard snippets.
//!
//! Elements are always written with an explicit end tag and no whitespace
//! between children, matching what FileMaker itself puts on the clipboard.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Element(Element),
    Text(String),
    CData(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Content>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Content::Element(child));
    }

    /// Append escaped character data.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Content::Text(text.into()));
        self
    }

    /// Append a CDATA section.
    pub fn cdata(mut self, text: impl Into<String>) -> Self {
        self.children.push(Content::CData(text.into()));
        self
    }

    /// `<Calculation><![CDATA[value]]></Calculation>`
    pub fn calculation(value: &str) -> Self {
        Element::new("Calculation").cdata(value)
    }

    /// `<name><Calculation>…</Calculation></name>`
    pub fn wrapped_calculation(name: &str, value: &str) -> Self {
        Element::new(name).child(Element::calculation(value))
    }

    /// `<name state="True|False"></name>`
    pub fn state(name: &str, on: bool) -> Self {
        Element::new(name).attr("state", flag(on))
    }

    /// `<name value="…"></name>`
    pub fn valued(name: &str, value: &str) -> Self {
        Element::new(name).attr("value", value)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.attrs {
            write!(f, " {}=\"{}\"", key, escape(value))?;
        }
        f.write_str(">")?;
        for child in &self.children {
            match child {
                Content::Element(el) => write!(f, "{}", el)?,
                Content::Text(text) => f.write_str(&escape(text))?,
                Content::CData(text) => write_cdata(f, text)?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}

/// FileMaker's boolean attribute spelling.
pub fn flag(on: bool) -> &'static str {
    if on { "True" } else { "False" }
}

/// Escape `& < > "` and encode newlines as `&#10;`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A CDATA section cannot contain `]]>`, so it is split across two sections.
fn write_cdata(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}
