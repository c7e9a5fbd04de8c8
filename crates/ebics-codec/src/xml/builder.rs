//! Streaming, namespace-aware XML builder.
//!
//! `el("a/b/c")` opens a sequence of nested elements in one call; the
//! innermost element stays "open" (able to receive [`Builder::attr`] calls)
//! until a child `text`/`el` call or the closing of its scope forces it out.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum XmlBuildError {
    #[error("xml writer error: {0}")]
    Writer(#[from] quick_xml::Error),
    #[error("attr() called with no open element")]
    NoOpenElement,
    #[error("empty element path")]
    EmptyPath,
}

/// Streaming XML document builder. Produces UTF-8 with a
/// `standalone="yes"` declaration, matching the EBICS wire convention.
pub struct Builder {
    writer: Writer<Cursor<Vec<u8>>>,
    /// Stack of open element local names, one level per `/`-separated
    /// segment across all still-open `el()` scopes.
    open_stack: Vec<String>,
    /// The most recently opened element's start tag, buffered so that
    /// `attr()` can still add to it before it is flushed.
    pending: Option<BytesStart<'static>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let decl = BytesDecl::new("1.0", Some("UTF-8"), Some("yes"));
        writer
            .write_event(Event::Decl(decl))
            .expect("writing to an in-memory buffer cannot fail");
        Builder {
            writer,
            open_stack: Vec::new(),
            pending: None,
        }
    }

    fn flush_pending(&mut self) -> Result<(), XmlBuildError> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    /// Opens a sequence of nested elements named by `/`-separated `path`
    /// segments, runs `body`, then closes them in reverse order.
    pub fn el<F>(&mut self, path: &str, body: F) -> Result<&mut Self, XmlBuildError>
    where
        F: FnOnce(&mut Self) -> Result<(), XmlBuildError>,
    {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(XmlBuildError::EmptyPath);
        }
        self.flush_pending()?;
        for segment in &segments[..segments.len() - 1] {
            self.writer
                .write_event(Event::Start(BytesStart::new(segment.to_string())))?;
            self.open_stack.push(segment.to_string());
        }
        let last = segments[segments.len() - 1];
        self.pending = Some(BytesStart::new(last.to_string()));
        self.open_stack.push(last.to_string());

        body(self)?;

        self.flush_pending_or_empty(last)?;
        for _ in 0..segments.len() {
            let name = self.open_stack.pop().expect("balanced open/close stack");
            self.writer
                .write_event(Event::End(BytesEnd::new(name)))?;
        }
        Ok(self)
    }

    fn flush_pending_or_empty(&mut self, _name: &str) -> Result<(), XmlBuildError> {
        self.flush_pending()
    }

    /// Adds an attribute to the element most recently opened by `el()`,
    /// which must still be pending (no child written yet).
    pub fn attr(&mut self, name: &str, value: &str) -> Result<&mut Self, XmlBuildError> {
        match &mut self.pending {
            Some(start) => {
                start.push_attribute((name, value));
                Ok(self)
            }
            None => Err(XmlBuildError::NoOpenElement),
        }
    }

    /// Writes a text node, flushing any pending start tag first.
    pub fn text(&mut self, content: &str) -> Result<&mut Self, XmlBuildError> {
        self.flush_pending()?;
        self.writer
            .write_event(Event::Text(BytesText::new(content)))?;
        Ok(self)
    }

    /// Consumes the builder and returns the finished UTF-8 document.
    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_path_with_attr_and_text() {
        let mut b = Builder::new();
        b.el("root/child", |b| {
            b.attr("authenticate", "true")?;
            b.text("value")?;
            Ok(())
        })
        .unwrap();
        let xml = String::from_utf8(b.finish()).unwrap();
        assert!(xml.contains("<root>"));
        assert!(xml.contains(r#"<child authenticate="true">value</child>"#));
        assert!(xml.contains("</root>"));
    }

    #[test]
    fn empty_element_has_no_children() {
        let mut b = Builder::new();
        b.el("root/empty", |_| Ok(())).unwrap();
        let xml = String::from_utf8(b.finish()).unwrap();
        assert!(xml.contains("<empty/>") || xml.contains("<empty></empty>"));
    }
}
