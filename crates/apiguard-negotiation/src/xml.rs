//! XML formatter for structured payloads.
//!
//! Objects become nested elements, arrays repeat the element of their key, and
//! scalars become text:
//!
//! ```text
//! {"mimetypes": ["application/json", "application/xml"]}
//! ```
//!
//! renders as
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <response><mimetypes>application/json</mimetypes><mimetypes>application/xml</mimetypes></response>
//! ```

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use serde_json::Value;

use crate::error::FormatError;
use crate::registry::{FormatContext, Formatter};

/// Element used for array items that have no key of their own.
const ITEM_ELEMENT: &str = "item";

/// Renders JSON payloads as XML documents.
#[derive(Debug, Clone)]
pub struct XmlFormatter {
    root: String,
}

impl Default for XmlFormatter {
    fn default() -> Self {
        Self::new("response")
    }
}

impl XmlFormatter {
    /// Create a formatter wrapping documents in `root`.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: element_name(&root.into()),
        }
    }
}

impl Formatter for XmlFormatter {
    fn format(&self, payload: &Value, _ctx: &FormatContext) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::with_capacity(256);
        let mut writer = Writer::new(&mut buf);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| FormatError::Xml(e.to_string()))?;
        write_element(&mut writer, &self.root, payload)
            .map_err(|e| FormatError::Xml(e.to_string()))?;

        Ok(buf)
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, tag: &str, value: &Value) -> io::Result<()> {
    match value {
        Value::Null => {
            writer.create_element(tag).write_empty()?;
        }
        Value::Bool(b) => {
            writer
                .create_element(tag)
                .write_text_content(BytesText::new(if *b { "true" } else { "false" }))?;
        }
        Value::Number(n) => {
            writer
                .create_element(tag)
                .write_text_content(BytesText::new(&n.to_string()))?;
        }
        Value::String(s) => {
            writer
                .create_element(tag)
                .write_text_content(BytesText::new(s))?;
        }
        Value::Array(items) => {
            writer
                .create_element(tag)
                .write_inner_content(|w| write_items(w, ITEM_ELEMENT, items))?;
        }
        Value::Object(map) => {
            writer.create_element(tag).write_inner_content(|w| {
                for (key, child) in map {
                    let name = element_name(key);
                    match child {
                        Value::Array(items) => write_items(w, &name, items)?,
                        other => write_element(w, &name, other)?,
                    }
                }
                Ok(())
            })?;
        }
    }
    Ok(())
}

fn write_items<W: Write>(writer: &mut Writer<W>, tag: &str, items: &[Value]) -> io::Result<()> {
    for item in items {
        write_element(writer, tag, item)?;
    }
    Ok(())
}

/// Map an arbitrary key onto a valid XML element name.
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}
