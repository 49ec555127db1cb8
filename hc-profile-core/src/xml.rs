//! Minimal typed XML tree built on `quick-xml`.
//!
//! Element and attribute names are stored by local name (namespace prefixes are
//! stripped, `xmlns` declarations dropped). Whitespace-only text is discarded.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ProfileError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
    pub text: Option<String>,
}

impl XmlNode {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content, or `""` for elements without text.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(xml: &str) -> Result<XmlNode, ProfileError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ProfileError::XmlFormat(e.to_string()))?;
        match event {
            Event::Start(start) => stack.push(open_node(&start)?),
            Event::Empty(start) => {
                let node = open_node(&start)?;
                attach(node, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    ProfileError::XmlFormat("closing tag without matching opening tag".to_string())
                })?;
                attach(node, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| ProfileError::XmlFormat(e.to_string()))?;
                    push_text(top, &text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    push_text(top, &String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ProfileError::XmlFormat(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| ProfileError::XmlFormat("document has no root element".to_string()))
}

fn open_node(start: &BytesStart<'_>) -> Result<XmlNode, ProfileError> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..XmlNode::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ProfileError::XmlFormat(e.to_string()))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ProfileError::XmlFormat(e.to_string()))?
            .into_owned();
        node.attributes.insert(key, value);
    }
    Ok(node)
}

fn attach(
    node: XmlNode,
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
) -> Result<(), ProfileError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => {
            return Err(ProfileError::XmlFormat(format!(
                "second root element <{}>",
                node.name
            )))
        }
        None => *root = Some(node),
    }
    Ok(())
}

fn push_text(node: &mut XmlNode, text: &str) {
    match node.text.as_mut() {
        Some(existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<device xmlns="http://www.bsh-group.com/device">
  <description>
    <brand>SIEMENS</brand>
    <deviceInfo/>
  </description>
  <statusList uid="0004">
    <status uid="0001" access="read" enumerationType="0003"/>
  </statusList>
</device>"#;
        let root = parse_document(doc).unwrap();
        assert_eq!(root.name, "device");
        assert!(root.attributes.is_empty(), "xmlns must not become an attribute");

        let description = root.child("description").unwrap();
        assert_eq!(description.child("brand").unwrap().text(), "SIEMENS");
        assert_eq!(description.child("deviceInfo").unwrap().text(), "");

        let list = root.child("statusList").unwrap();
        assert_eq!(list.attribute("uid"), Some("0004"));
        let status: Vec<_> = list.children_named("status").collect();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].attribute("enumerationType"), Some("0003"));
    }

    #[test]
    fn strips_namespace_prefixes_and_unescapes() {
        let doc = r#"<a:root xmlns:a="urn:x"><a:item a:key="x &amp; y">1 &lt; 2</a:item></a:root>"#;
        let root = parse_document(doc).unwrap();
        assert_eq!(root.name, "root");
        let item = root.child("item").unwrap();
        assert_eq!(item.attribute("key"), Some("x & y"));
        assert_eq!(item.text(), "1 < 2");
    }

    #[test]
    fn rejects_malformed_documents() {
        for doc in ["", "<device>", "<a></b>", "<a/><b/>", "just text"] {
            let err = parse_document(doc).unwrap_err();
            assert!(matches!(err, ProfileError::XmlFormat(_)), "{doc:?} -> {err:?}");
        }
    }
}
