//! KeyValues (VDF) text documents
//!
//! The update client parses responses as Valve KeyValues text: quoted keys,
//! nested sections in braces, one tab of indentation per level.

use indexmap::IndexMap;

/// A KeyValues node: either a string value or a nested section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Value(String),
    Section(Document),
}

/// Ordered key to node mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    entries: IndexMap<String, Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a string value, keeping the position of an existing key.
    pub fn insert_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Node::Value(value.into()));
    }

    /// Insert a nested section.
    pub fn insert_section(&mut self, key: impl Into<String>, section: Document) {
        self.entries.insert(key.into(), Node::Section(section));
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    /// Nested section under `key`, if that key holds one.
    pub fn section(&self, key: &str) -> Option<&Document> {
        match self.entries.get(key)? {
            Node::Section(doc) => Some(doc),
            Node::Value(_) => None,
        }
    }

    /// String value under `key`, if that key holds one.
    pub fn value(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            Node::Value(value) => Some(value),
            Node::Section(_) => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render with tab indentation.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        write_document(&mut out, self, 0);
        out
    }
}

fn write_document(out: &mut String, doc: &Document, level: usize) {
    let indent = "\t".repeat(level);
    for (key, node) in &doc.entries {
        match node {
            Node::Value(value) => {
                out.push_str(&format!(
                    "{}\"{}\" \"{}\"\n",
                    indent,
                    escape(key),
                    escape(value)
                ));
            }
            Node::Section(section) => {
                out.push_str(&format!("{}\"{}\"\n{}{{\n", indent, escape(key), indent));
                write_document(out, section, level + 1);
                out.push_str(&format!("{}}}\n", indent));
            }
        }
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\u{0B}' => escaped.push_str("\\v"),
            '\u{08}' => escaped.push_str("\\b"),
            '\u{07}' => escaped.push_str("\\a"),
            other => escaped.push(other),
        }
    }
    escaped
}
