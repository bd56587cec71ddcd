//! SVG serialization back to XML.
//!
//! Output always starts with a UTF-8 XML declaration. Everything else is
//! written as parsed: prefixes, `xmlns` declarations, attribute order, text
//! and comments.

use crate::ast::*;

/// Serialize a Document to an SVG string.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();

    let version = doc
        .xml_declaration
        .as_ref()
        .map(|d| d.version.as_str())
        .unwrap_or("1.0");
    out.push_str("<?xml version=\"");
    out.push_str(version);
    out.push_str("\" encoding=\"UTF-8\"");
    if let Some(standalone) = doc.xml_declaration.as_ref().and_then(|d| d.standalone) {
        out.push_str(" standalone=\"");
        out.push_str(if standalone { "yes" } else { "no" });
        out.push('"');
    }
    out.push_str("?>\n");

    if let Some(ref dt) = doc.doctype {
        out.push_str("<!DOCTYPE ");
        out.push_str(dt.trim_start());
        out.push_str(">\n");
    }

    for node in &doc.prolog {
        serialize_node(&mut out, node);
        out.push('\n');
    }

    serialize_element(&mut out, &doc.root);

    for node in &doc.epilog {
        out.push('\n');
        serialize_node(&mut out, node);
    }
    out.push('\n');

    out
}

fn serialize_element(out: &mut String, elem: &Element) {
    out.push('<');
    out.push_str(&elem.name.full_name());

    for attr in &elem.attributes {
        out.push(' ');
        out.push_str(&attr.name.full_name());
        out.push_str("=\"");
        push_escaped_attr(out, &attr.value);
        out.push('"');
    }

    if elem.children.is_empty() {
        out.push_str(" />");
    } else {
        out.push('>');

        for child in &elem.children {
            serialize_node(out, child);
        }

        out.push_str("</");
        out.push_str(&elem.name.full_name());
        out.push('>');
    }
}

fn serialize_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(elem) => serialize_element(out, elem),
        Node::Text(text) => push_escaped_text(out, text),
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        Node::ProcessingInstruction { target, content } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(c) = content {
                out.push(' ');
                out.push_str(c);
            }
            out.push_str("?>");
        }
    }
}

fn push_escaped_attr(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_text(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
