//! SVG parsing from XML.

use std::collections::HashMap;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesPI, BytesStart, Event};
use regex::Regex;

use crate::ast::*;
use crate::error::WhitenError;

static RE_ENTITY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!ENTITY\s+([^\s%"'<>]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
        .expect("valid entity declaration regex")
});

/// General entities declared in the DOCTYPE internal subset.
///
/// Only internal entities (`<!ENTITY name "value">`) are collected; parameter
/// and external entities are never expanded.
#[derive(Debug, Default)]
struct Entities(HashMap<String, String>);

impl Entities {
    fn from_doctype(doctype: &str) -> Self {
        let mut entities = HashMap::new();
        for caps in RE_ENTITY_DECL.captures_iter(doctype) {
            let Some(value) = caps.get(2).or_else(|| caps.get(3)) else {
                continue;
            };
            let value = value.as_str();
            let value = unescape(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            // First declaration wins.
            entities.entry(caps[1].to_string()).or_insert(value);
        }
        Self(entities)
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        resolve_predefined_entity(name).or_else(|| self.0.get(name).map(String::as_str))
    }
}

/// Parse an SVG string into a Document.
///
/// Anything that is not well-formed is rejected: unclosed or mismatched tags,
/// a missing root, content other than comments and processing instructions
/// around the root, undeclared entities, unbound namespace prefixes, and a
/// raw `<` in an attribute value.
pub fn parse_svg(svg: &str) -> Result<Document, WhitenError> {
    let svg = svg.strip_prefix('\u{feff}').unwrap_or(svg);
    let mut reader = Reader::from_str(svg);

    let mut xml_declaration = None;
    let mut doctype = None;
    let mut entities = Entities::default();
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Decl(decl) if root.is_none() && doctype.is_none() => {
                xml_declaration = Some(XmlDeclaration {
                    version: String::from_utf8_lossy(decl.version()?.as_ref()).into_owned(),
                    standalone: decl.standalone().transpose().ok().flatten().map(|s| {
                        let s = String::from_utf8_lossy(s.as_ref());
                        s == "yes"
                    }),
                });
            }
            Event::DocType(dt) if root.is_none() && doctype.is_none() => {
                let dt = String::from_utf8_lossy(&dt).into_owned();
                entities = Entities::from_doctype(&dt);
                doctype = Some(dt);
            }
            Event::Start(start) if root.is_none() => {
                root = Some(parse_element(
                    &mut reader,
                    &start,
                    &entities,
                    &Namespaces::new(),
                )?);
            }
            Event::Empty(start) if root.is_none() => {
                let (element, _) = parse_element_start(&start, &entities, &Namespaces::new())?;
                root = Some(element);
            }
            Event::Comment(comment) => {
                let node = Node::Comment(String::from_utf8_lossy(&comment).into_owned());
                if root.is_none() {
                    prolog.push(node);
                } else {
                    epilog.push(node);
                }
            }
            Event::PI(pi) => {
                let node = processing_instruction(&pi);
                if root.is_none() {
                    prolog.push(node);
                } else {
                    epilog.push(node);
                }
            }
            Event::Text(text) => {
                if !String::from_utf8_lossy(&text).trim().is_empty() {
                    return Err(WhitenError::InvalidSvg(
                        "Text outside the root element".into(),
                    ));
                }
            }
            Event::Eof => break,
            Event::End(_) => {
                return Err(WhitenError::InvalidSvg("Unmatched end tag".into()));
            }
            _ => {
                return Err(WhitenError::InvalidSvg(
                    "Unexpected content outside the root element".into(),
                ));
            }
        }
    }

    let root = root.ok_or_else(|| WhitenError::InvalidSvg("No root element found".into()))?;

    Ok(Document {
        xml_declaration,
        doctype,
        prolog,
        root,
        epilog,
    })
}

fn parse_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    entities: &Entities,
    inherited: &Namespaces,
) -> Result<Element, WhitenError> {
    let (mut element, scope) = parse_element_start(start, entities, inherited)?;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                element
                    .children
                    .push(Node::Element(parse_element(reader, &start, entities, &scope)?));
            }
            Event::Empty(start) => {
                let (child, _) = parse_element_start(&start, entities, &scope)?;
                element.children.push(Node::Element(child));
            }
            Event::End(_) => {
                break;
            }
            Event::Text(text) => {
                let text = text.unescape_with(|name| entities.resolve(name))?;
                element.children.push(Node::Text(text.into_owned()));
            }
            Event::Comment(comment) => {
                element
                    .children
                    .push(Node::Comment(String::from_utf8_lossy(&comment).into_owned()));
            }
            Event::CData(cdata) => {
                element
                    .children
                    .push(Node::CData(String::from_utf8_lossy(&cdata).into_owned()));
            }
            Event::PI(pi) => {
                element.children.push(processing_instruction(&pi));
            }
            Event::Eof => {
                return Err(WhitenError::InvalidSvg("Unexpected end of file".into()));
            }
            _ => {
                return Err(WhitenError::InvalidSvg(
                    "Unexpected markup inside an element".into(),
                ));
            }
        }
    }

    Ok(element)
}

/// Build an element from its start tag, returning it with the namespace
/// bindings in scope for its children.
fn parse_element_start(
    start: &BytesStart,
    entities: &Entities,
    inherited: &Namespaces,
) -> Result<(Element, Namespaces), WhitenError> {
    let name_bytes = start.name();
    let name = std::str::from_utf8(name_bytes.as_ref())?;

    let mut element = Element {
        name: QName::parse(name),
        attributes: Vec::new(),
        children: Vec::new(),
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| WhitenError::InvalidSvg(format!("Invalid attribute: {}", e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        if attr.value.contains(&b'<') {
            return Err(WhitenError::InvalidSvg(format!(
                "Raw '<' in value of attribute {}",
                key
            )));
        }
        let value = attr.unescape_value_with(|name| entities.resolve(name))?;
        element.attributes.push(Attribute {
            name: QName::parse(key),
            value: value.into_owned(),
        });
    }

    let (_, scope) = element.resolve_namespace(inherited);
    check_prefixes(&element, &scope)?;

    Ok((element, scope))
}

/// Every prefix used on the element or its attributes must be bound.
fn check_prefixes(element: &Element, scope: &Namespaces) -> Result<(), WhitenError> {
    let is_bound = |prefix: &str| {
        prefix == "xml"
            || scope
                .get(&Some(prefix.to_string()))
                .is_some_and(|uri| !uri.is_empty())
    };

    if let Some(prefix) = &element.name.prefix
        && !is_bound(prefix.as_str())
    {
        return Err(WhitenError::InvalidSvg(format!(
            "Unbound prefix on element {}",
            element.name.full_name()
        )));
    }

    for attr in &element.attributes {
        if let Some(prefix) = &attr.name.prefix
            && prefix != "xmlns"
            && !is_bound(prefix.as_str())
        {
            return Err(WhitenError::InvalidSvg(format!(
                "Unbound prefix on attribute {}",
                attr.name.full_name()
            )));
        }
    }

    Ok(())
}

fn processing_instruction(pi: &BytesPI) -> Node {
    let content = String::from_utf8_lossy(pi).into_owned();
    let (target, rest) = content
        .split_once(char::is_whitespace)
        .map(|(t, r)| (t.to_string(), Some(r.to_string())))
        .unwrap_or_else(|| (content, None));
    Node::ProcessingInstruction {
        target,
        content: rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_svg() {
        let svg = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
    <rect x="10" y="10" width="80" height="80" fill="red"/>
</svg>"#;

        let doc = parse_svg(svg).unwrap();
        assert!(doc.xml_declaration.is_some());
        assert!(doc.root.is("svg"));
        assert_eq!(doc.root.get_attr("width"), Some("100"));
        assert_eq!(doc.root.child_elements().count(), 1);
    }

    #[test]
    fn test_parse_keeps_whitespace_text() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\">\n  <rect/>\n</svg>";
        let doc = parse_svg(svg).unwrap();
        let texts: Vec<_> = doc
            .root
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["\n  ", "\n"]);
    }

    #[test]
    fn test_parse_prolog_and_epilog() {
        let svg = r#"<!-- before --><svg xmlns="http://www.w3.org/2000/svg"/><!-- after -->"#;
        let doc = parse_svg(svg).unwrap();
        assert_eq!(doc.prolog.len(), 1);
        assert_eq!(doc.epilog.len(), 1);
    }

    #[test]
    fn test_parse_namespaced() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
    <use xlink:href="#foo"/>
</svg>"##;

        let doc = parse_svg(svg).unwrap();
        let ns = doc.root.namespaces();
        assert!(ns.contains_key(&None));
        assert!(ns.contains_key(&Some("xlink")));
    }

    #[test]
    fn test_parse_strips_bom() {
        let svg = "\u{feff}<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        assert!(parse_svg(svg).is_ok());
    }

    #[test]
    fn test_rejects_unclosed_root() {
        let err = parse_svg(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/>"#).unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_rejects_mismatched_tags() {
        let err = parse_svg("<svg><g></rect></svg>").unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_rejects_junk_after_root() {
        let err = parse_svg("<svg/>trailing").unwrap_err();
        assert!(err.is_parse_failure());

        let err = parse_svg("<svg/><svg/>").unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_rejects_empty_input() {
        let err = parse_svg("   ").unwrap_err();
        assert!(matches!(err, WhitenError::InvalidSvg(_)));
    }

    const ILLUSTRATOR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- Generator: Adobe Illustrator 24.0.0, SVG Export Plug-In . SVG Version: 6.00 Build 0)  -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" [
	<!ENTITY ns_extend "http://ns.adobe.com/Extensibility/1.0/">
	<!ENTITY ns_svg "http://www.w3.org/2000/svg">
	<!ENTITY ns_xlink "http://www.w3.org/1999/xlink">
	<!ENTITY st_label 'Layer &amp; 1'>
]>
<svg version="1.1" xmlns:x="&ns_extend;" xmlns="&ns_svg;" xmlns:xlink="&ns_xlink;" viewBox="0 0 24 24">
<g id="&st_label;"><path d="M0 0h24v24z"/></g>
<text>&st_label; &lt;</text>
</svg>"#;

    #[test]
    fn test_parse_internal_entities() {
        let doc = parse_svg(ILLUSTRATOR).unwrap();
        assert!(doc.doctype.as_deref().unwrap().contains("<!ENTITY ns_svg"));

        let ns = doc.root.namespaces();
        assert_eq!(ns.get(&None), Some(&"http://www.w3.org/2000/svg"));
        assert_eq!(ns.get(&Some("x")), Some(&"http://ns.adobe.com/Extensibility/1.0/"));

        let g = doc.root.child_elements().next().unwrap();
        assert_eq!(g.get_attr("id"), Some("Layer & 1"));

        let text = doc.root.child_elements().find(|e| e.is("text")).unwrap();
        assert!(matches!(&text.children[..], [Node::Text(t)] if t == "Layer & 1 <"));
    }

    #[test]
    fn test_rejects_undeclared_entity() {
        let err = parse_svg("<svg><text>&nbsp;</text></svg>").unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_parameter_and_external_entities_not_declared() {
        let svg = r#"<!DOCTYPE svg [
  <!ENTITY % param "x">
  <!ENTITY ext SYSTEM "ext.xml">
]><svg title="&ext;"/>"#;
        let err = parse_svg(svg).unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_rejects_unbound_prefixes() {
        let err = parse_svg(r#"<svg xmlns="http://www.w3.org/2000/svg"><x:rect/></svg>"#)
            .unwrap_err();
        assert!(matches!(err, WhitenError::InvalidSvg(_)));

        let err = parse_svg(r##"<svg xmlns="http://www.w3.org/2000/svg"><use xlink:href="#a"/></svg>"##)
            .unwrap_err();
        assert!(matches!(err, WhitenError::InvalidSvg(_)));

        // A binding only covers the declaring element's subtree.
        let err = parse_svg(r#"<svg><g xmlns:x="urn:x"/><x:rect/></svg>"#).unwrap_err();
        assert!(matches!(err, WhitenError::InvalidSvg(_)));
    }

    #[test]
    fn test_accepts_bound_and_reserved_prefixes() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xml:space="preserve">
            <g xmlns:x="urn:x"><x:rect x:a="1"/></g>
        </svg>"#;
        assert!(parse_svg(svg).is_ok());
    }

    #[test]
    fn test_rejects_raw_lt_in_attribute() {
        let err = parse_svg(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect a="<"/></svg>"#)
            .unwrap_err();
        assert!(matches!(err, WhitenError::InvalidSvg(_)));

        let doc = parse_svg(r#"<svg a="&lt;"/>"#).unwrap();
        assert_eq!(doc.root.get_attr("a"), Some("<"));
    }
}
