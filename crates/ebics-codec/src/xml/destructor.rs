//! DOM-backed, local-name based XML teardown.

use roxmltree::{Document, Node};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum DestructionError {
    #[error("xml parse error: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("at {path}: expected exactly one <{tag}>, found {found}")]
    NotExactlyOne {
        path: String,
        tag: String,
        found: usize,
    },
    #[error("at {path}: missing attribute {attr}")]
    MissingAttr { path: String, attr: String },
    #[error("at {path}: could not parse {what}: {value:?}")]
    BadLeaf {
        path: String,
        what: &'static str,
        value: String,
    },
}

/// A node in the document, addressed by the path of local names that led
/// to it (used only for error messages).
#[derive(Clone, Copy)]
pub struct Destructor<'a, 'input> {
    node: Node<'a, 'input>,
    path: &'a str,
}

impl<'a, 'input> Destructor<'a, 'input> {
    /// Builds a destructor rooted at the document's root element.
    pub fn root(doc: &'a Document<'input>) -> Self {
        Destructor {
            node: doc.root_element(),
            path: "/",
        }
    }

    fn child_path(&self, tag: &str) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), tag)
    }

    fn matching_children(&self, tag: &str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        let tag = tag.to_string();
        self.node
            .children()
            .filter(move |n| n.is_element() && n.tag_name().name() == tag)
    }

    /// Requires exactly one child named `tag`; fails otherwise.
    pub fn one(&self, tag: &str) -> Result<Destructor<'a, 'input>, DestructionError> {
        let matches: Vec<_> = self.matching_children(tag).collect();
        match matches.len() {
            1 => Ok(Destructor {
                node: matches[0],
                path: Box::leak(self.child_path(tag).into_boxed_str()),
            }),
            found => Err(DestructionError::NotExactlyOne {
                path: self.path.to_string(),
                tag: tag.to_string(),
                found,
            }),
        }
    }

    /// Allows zero or one child named `tag`.
    pub fn opt(&self, tag: &str) -> Result<Option<Destructor<'a, 'input>>, DestructionError> {
        let matches: Vec<_> = self.matching_children(tag).collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(Destructor {
                node: matches[0],
                path: Box::leak(self.child_path(tag).into_boxed_str()),
            })),
            found => Err(DestructionError::NotExactlyOne {
                path: self.path.to_string(),
                tag: tag.to_string(),
                found,
            }),
        }
    }

    /// Yields every child named `tag`, in document order.
    pub fn each(&self, tag: &str) -> Vec<Destructor<'a, 'input>> {
        let path: &'a str = Box::leak(self.child_path(tag).into_boxed_str());
        self.matching_children(tag)
            .map(|node| Destructor { node, path })
            .collect()
    }

    /// Projects every child named `tag` through `f`, collecting the results.
    pub fn map<T>(
        &self,
        tag: &str,
        f: impl Fn(Destructor<'a, 'input>) -> Result<T, DestructionError>,
    ) -> Result<Vec<T>, DestructionError> {
        self.each(tag).into_iter().map(f).collect()
    }

    /// The element's local name.
    pub fn tag(&self) -> &'input str {
        self.node.tag_name().name()
    }

    /// Required attribute lookup.
    pub fn attr(&self, name: &str) -> Result<&'input str, DestructionError> {
        self.node
            .attribute(name)
            .ok_or_else(|| DestructionError::MissingAttr {
                path: self.path.to_string(),
                attr: name.to_string(),
            })
    }

    /// Optional attribute lookup.
    pub fn attr_opt(&self, name: &str) -> Option<&'input str> {
        self.node.attribute(name)
    }

    /// Concatenated, trimmed text content of this element.
    pub fn text(&self) -> Result<String, DestructionError> {
        Ok(self
            .node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect::<String>()
            .trim()
            .to_string())
    }

    /// Parses `text()` as an EBICS-style boolean (`"true"`/`"1"` or
    /// `"false"`/`"0"`).
    pub fn bool(&self) -> Result<bool, DestructionError> {
        let text = self.text()?;
        match text.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(DestructionError::BadLeaf {
                path: self.path.to_string(),
                what: "boolean",
                value: other.to_string(),
            }),
        }
    }

    /// Parses `text()` as an ISO 8601 calendar date (`YYYY-MM-DD`).
    pub fn date(&self) -> Result<chrono::NaiveDate, DestructionError> {
        let text = self.text()?;
        chrono::NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
            DestructionError::BadLeaf {
                path: self.path.to_string(),
                what: "date",
                value: text,
            }
        })
    }

    /// Parses `text()` as an RFC 3339 date-time.
    pub fn datetime(&self) -> Result<chrono::DateTime<chrono::Utc>, DestructionError> {
        let text = self.text()?;
        chrono::DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|_| DestructionError::BadLeaf {
                path: self.path.to_string(),
                what: "datetime",
                value: text,
            })
    }

    /// Parses `text()` against a closed set of allowed values.
    pub fn enum_value<T: Copy>(&self, variants: &[(&str, T)]) -> Result<T, DestructionError> {
        let text = self.text()?;
        variants
            .iter()
            .find(|(tag, _)| *tag == text)
            .map(|(_, value)| *value)
            .ok_or_else(|| DestructionError::BadLeaf {
                path: self.path.to_string(),
                what: "enum",
                value: text,
            })
    }
}

impl fmt::Debug for Destructor<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Destructor({})", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_requires_exactly_one() {
        let doc = Document::parse("<root><a/><a/></root>").unwrap();
        let root = Destructor::root(&doc);
        let err = root.one("a").unwrap_err();
        assert!(matches!(err, DestructionError::NotExactlyOne { found: 2, .. }));
    }

    #[test]
    fn opt_and_each() {
        let doc = Document::parse("<root><a>1</a><a>2</a><b>x</b></root>").unwrap();
        let root = Destructor::root(&doc);
        assert!(root.opt("missing").unwrap().is_none());
        let values: Vec<String> = root.map("a", |d| d.text()).unwrap();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn leaf_accessors() {
        let doc =
            Document::parse("<root><flag>true</flag><d>2024-01-05</d></root>").unwrap();
        let root = Destructor::root(&doc);
        assert!(root.one("flag").unwrap().bool().unwrap());
        let date = root.one("d").unwrap().date().unwrap();
        assert_eq!(date.to_string(), "2024-01-05");
    }
}
