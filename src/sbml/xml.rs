//! Lightweight element tree built from SBML text.
//!
//! The tree keeps local element names, attributes and text. For `<annotation>` and `<notes>`
//! blocks the verbatim source text is kept as well, since annotation fragments are later
//! deserialized on their own.

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::sbml::error::SBMLError;

/// Elements whose source text is preserved verbatim in [`XmlElement::raw`].
const RAW_ELEMENTS: [&str; 2] = ["annotation", "notes"];

/// A parsed XML element with its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Local name, without namespace prefix
    pub name: String,
    pub prefix: Option<String>,
    /// Attributes with their qualified names, in document order
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Character data directly inside this element, split by a space at every child element
    pub text: String,
    /// Verbatim source of the element, only kept for annotation and notes blocks
    pub raw: Option<String>,
}

impl XmlElement {
    /// Parses an XML document into its root element.
    ///
    /// # Arguments
    /// * `xml` - The complete XML text
    ///
    /// # Returns
    /// The root element of the document
    ///
    /// # Errors
    /// * `SBMLError::XmlError` - The document is not well-formed
    /// * `SBMLError::NotSbml` - The document has no root element
    pub fn parse(xml: &str) -> Result<XmlElement, SBMLError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<(XmlElement, usize)> = Vec::new();
        let mut root = None;

        loop {
            let before = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Start(start) => {
                    separate_text(&mut stack);
                    stack.push((XmlElement::from_start(&start)?, before));
                }
                Event::Empty(start) => {
                    separate_text(&mut stack);
                    let mut element = XmlElement::from_start(&start)?;
                    let after = reader.buffer_position() as usize;
                    element.keep_raw(xml, before, after);
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    if let Some((mut element, begin)) = stack.pop() {
                        let after = reader.buffer_position() as usize;
                        element.keep_raw(xml, begin, after);
                        attach(&mut stack, &mut root, element);
                    }
                }
                Event::Text(text) => {
                    if let Some((element, _)) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&text);
                        let unescaped = unescape(&text).unwrap_or(Cow::Borrowed(text.as_ref()));
                        element.text.push_str(&unescaped);
                    }
                }
                Event::GeneralRef(reference) => {
                    if let Some((element, _)) = stack.last_mut() {
                        let entity = format!("&{};", String::from_utf8_lossy(&reference));
                        match unescape(&entity) {
                            Ok(resolved) => element.text.push_str(&resolved),
                            Err(_) => element.text.push_str(&entity),
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some((element, _)) = stack.last_mut() {
                        element.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.ok_or_else(|| SBMLError::NotSbml(String::new()))
    }

    fn from_start(start: &BytesStart) -> Result<XmlElement, SBMLError> {
        let qualified = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let (prefix, name) = split_qualified(&qualified);

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = String::from_utf8_lossy(attribute.value.as_ref()).into_owned();
            let value = unescape(&value)
                .map(Cow::into_owned)
                .unwrap_or(value.clone());
            attributes.push((key, value));
        }

        Ok(XmlElement {
            name: name.to_string(),
            prefix: prefix.map(str::to_string),
            attributes,
            ..Default::default()
        })
    }

    fn keep_raw(&mut self, xml: &str, begin: usize, end: usize) {
        if RAW_ELEMENTS.contains(&self.name.as_str()) {
            if let Some(source) = xml.get(begin..end) {
                self.raw = Some(source.trim().to_string());
            }
        }
    }

    /// Value of an attribute, matched by qualified or by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name || split_qualified(key).1 == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Items of an SBML `listOf*` container, e.g. `list("listOfSpecies", "species")`.
    pub fn list<'a>(
        &'a self,
        container: &'a str,
        item: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child(container)
            .into_iter()
            .flat_map(move |list| list.children_named(item))
    }

    /// Own character data with surrounding whitespace removed.
    pub fn text_content(&self) -> &str {
        self.text.trim()
    }
}

fn attach(stack: &mut [(XmlElement, usize)], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some((parent, _)) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Child elements split the character data of their parent, e.g. `<cn>1<sep/>3</cn>`.
fn separate_text(stack: &mut [(XmlElement, usize)]) {
    if let Some((parent, _)) = stack.last_mut() {
        parent.text.push(' ');
    }
}

fn split_qualified(qualified: &str) -> (Option<&str>, &str) {
    match qualified.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qualified),
    }
}
