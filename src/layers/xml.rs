use std::fmt::{self, Write as _};

use serde::Serialize;

/// Minimal SVG element tree. Attribute order is preserved as inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn write_to(&self, out: &mut String, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(out, "{indent}<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(out, " {key}=\"{}\"", escape(value))?;
        }
        if self.children.is_empty() {
            return writeln!(out, " />");
        }
        writeln!(out, ">")?;
        for child in &self.children {
            child.write_to(out, depth + 1)?;
        }
        writeln!(out, "{indent}</{}>", self.tag)
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out, 0)?;
        formatter.write_str(out.trim_end())
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
