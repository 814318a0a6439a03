//! Minimal XML-to-tree parser for fiscal documents.
//!
//! Every child element lands in a `Vec`, even when it occurs once, so that
//! downstream extraction can index `[0]` uniformly regardless of which
//! structural variant of the document was emitted.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlParseError {
    #[error("xml syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("unbalanced closing tag </{0}>")]
    Unbalanced(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlNode {
    attributes: HashMap<String, String>,
    children: HashMap<String, Vec<XmlNode>>,
    text: Option<String>,
}

impl XmlNode {
    /// Parses a full document into a synthetic root node whose children
    /// hold the document's root element.
    pub fn parse(xml: &str) -> Result<XmlNode, XmlParseError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<(String, XmlNode)> = vec![(String::new(), XmlNode::default())];

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let name = local_name(start.local_name().as_ref());
                    let mut node = XmlNode::default();
                    for attribute in start.attributes() {
                        let attribute = attribute?;
                        let key = local_name(attribute.key.local_name().as_ref());
                        let value = attribute.unescape_value()?.into_owned();
                        node.attributes.insert(key, value);
                    }
                    stack.push((name, node));
                }
                Event::Empty(empty) => {
                    let name = local_name(empty.local_name().as_ref());
                    let mut node = XmlNode::default();
                    for attribute in empty.attributes() {
                        let attribute = attribute?;
                        let key = local_name(attribute.key.local_name().as_ref());
                        let value = attribute.unescape_value()?.into_owned();
                        node.attributes.insert(key, value);
                    }
                    if let Some((_, parent)) = stack.last_mut() {
                        parent.children.entry(name).or_default().push(node);
                    }
                }
                Event::Text(text) => {
                    let value = text.unescape()?.into_owned();
                    if !value.is_empty() {
                        if let Some((_, node)) = stack.last_mut() {
                            match node.text.as_mut() {
                                Some(existing) => existing.push_str(&value),
                                None => node.text = Some(value),
                            }
                        }
                    }
                }
                Event::CData(cdata) => {
                    let value = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    if let Some((_, node)) = stack.last_mut() {
                        match node.text.as_mut() {
                            Some(existing) => existing.push_str(&value),
                            None => node.text = Some(value),
                        }
                    }
                }
                Event::End(end) => {
                    let name = local_name(end.local_name().as_ref());
                    let (opened, node) = match stack.pop() {
                        Some(_) if stack.is_empty() => {
                            return Err(XmlParseError::Unbalanced(name));
                        }
                        Some(top) => top,
                        None => return Err(XmlParseError::Unbalanced(name)),
                    };
                    if opened != name {
                        return Err(XmlParseError::Unbalanced(name));
                    }
                    if let Some((_, parent)) = stack.last_mut() {
                        parent.children.entry(opened).or_default().push(node);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        match stack.pop() {
            Some((_, root)) if stack.is_empty() => Ok(root),
            Some((name, _)) => Err(XmlParseError::Unbalanced(name)),
            None => Ok(XmlNode::default()),
        }
    }

    /// First child with the given element name, the `[0]` of the legacy
    /// array-wrapped shape.
    pub fn first(&self, name: &str) -> Option<&XmlNode> {
        self.children.get(name).and_then(|nodes| nodes.first())
    }

    /// All children with the given element name.
    pub fn list(&self, name: &str) -> &[XmlNode] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Walks a fixed path of element names, taking the first node at each
    /// step.
    pub fn path(&self, segments: &[&str]) -> Option<&XmlNode> {
        let mut node = self;
        for segment in segments {
            node = node.first(segment)?;
        }
        Some(node)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text content of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(XmlNode::text)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Names of the direct children, for structural diagnostics.
    pub fn child_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.children.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::{XmlNode, XmlParseError};

    #[test]
    fn every_child_is_array_wrapped() {
        let root = XmlNode::parse("<doc><item>a</item><item>b</item><only>c</only></doc>")
            .expect("parse");
        let doc = root.first("doc").expect("doc element");

        assert_eq!(doc.list("item").len(), 2);
        assert_eq!(doc.list("only").len(), 1);
        assert_eq!(doc.first("only").and_then(XmlNode::text), Some("c"));
    }

    #[test]
    fn namespace_prefixes_are_stripped() {
        let root = XmlNode::parse(
            r#"<ns:doc xmlns:ns="http://example.com"><ns:leaf>v</ns:leaf></ns:doc>"#,
        )
        .expect("parse");

        assert_eq!(root.path(&["doc", "leaf"]).and_then(XmlNode::text), Some("v"));
    }

    #[test]
    fn attributes_are_reachable() {
        let root = XmlNode::parse(r#"<doc Id="CTe123" versao="3.00"/>"#).expect("parse");
        let doc = root.first("doc").expect("doc element");

        assert_eq!(doc.attr("Id"), Some("CTe123"));
        assert_eq!(doc.attr("versao"), Some("3.00"));
    }

    #[test]
    fn unbalanced_document_is_rejected() {
        let error = XmlNode::parse("<a><b></a>").expect_err("must fail");
        assert!(matches!(error, XmlParseError::Unbalanced(_) | XmlParseError::Syntax(_)));
    }

    #[test]
    fn entities_are_unescaped() {
        let root = XmlNode::parse("<doc><name>P &amp; G</name></doc>").expect("parse");
        assert_eq!(root.path(&["doc", "name"]).and_then(XmlNode::text), Some("P & G"));
    }
}
