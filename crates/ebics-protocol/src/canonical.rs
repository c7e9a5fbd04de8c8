//! A minimal canonicalizer for the node-set the EBICS authentication
//! signature covers: all descendants-or-self of elements carrying
//! `authenticate="true"`. We don't need general-purpose XML canonical
//! form — only a canonicalisation that is stable across our own
//! build/parse round trip, covering the parts of
//! <http://www.w3.org/TR/2001/REC-xml-c14n-20010315> that matter here:
//! sorted attributes, expanded (non-self-closing) elements, escaped text.

use roxmltree::Node;
use std::fmt::Write as _;

/// Renders the canonical byte serialisation of `node` and all of its
/// descendants that are marked `authenticate="true"`, or are descendants of
/// such a node.
pub fn canonicalize_authenticated(root: Node) -> String {
    let mut out = String::new();
    write_subtree(root, &mut out, false);
    out
}

fn write_subtree(node: Node, out: &mut String, mut inside_authenticated: bool) {
    if !node.is_element() {
        return;
    }
    if !inside_authenticated && node.attribute("authenticate") == Some("true") {
        inside_authenticated = true;
    }
    if inside_authenticated {
        write_element(node, out);
        return;
    }
    for child in node.children() {
        write_subtree(child, out, false);
    }
}

fn write_element(node: Node, out: &mut String) {
    let tag = qualified_name(node);
    write!(out, "<{tag}").unwrap();

    let mut attrs: Vec<(String, &str)> = node
        .attributes()
        .map(|a| (qualified_attr_name(node, a.name()), a.value()))
        .collect();
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in &attrs {
        write!(out, " {name}=\"{}\"", escape_attr(value)).unwrap();
    }
    out.push('>');

    for child in node.children() {
        if child.is_element() {
            write_element(child, out);
        } else if let Some(text) = child.text() {
            out.push_str(&escape_text(text));
        }
    }

    write!(out, "</{tag}>").unwrap();
}

fn qualified_name(node: Node) -> String {
    match node.tag_name().namespace() {
        Some(ns) if node.lookup_prefix(ns).is_some() => {
            format!("{}:{}", node.lookup_prefix(ns).unwrap(), node.tag_name().name())
        }
        _ => node.tag_name().name().to_string(),
    }
}

fn qualified_attr_name(_node: Node, name: &str) -> String {
    name.to_string()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\r', "&#xD;")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
        .replace('\t', "&#x9;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn only_authenticated_subtree_is_rendered() {
        let xml = r#"<root><a authenticate="true"><b>1</b></a><c>2</c></root>"#;
        let doc = Document::parse(xml).unwrap();
        let out = canonicalize_authenticated(doc.root_element());
        assert_eq!(out, r#"<a authenticate="true"><b>1</b></a>"#);
    }

    #[test]
    fn attributes_are_sorted() {
        let xml = r#"<root><a authenticate="true" z="1" a="2"/></root>"#;
        let doc = Document::parse(xml).unwrap();
        let out = canonicalize_authenticated(doc.root_element());
        assert!(out.contains(r#"a="2" authenticate="true" z="1""#));
    }
}
