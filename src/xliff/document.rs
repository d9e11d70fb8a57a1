use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Writer};
use regex::bytes::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// XLIFF 1.2 namespace every step of the unit path must be bound to
pub const XLIFF_NAMESPACE: &str = "urn:oasis:names:tc:xliff:document:1.2";

/// Element path from the document root to the `trans-unit` holding a translatable `target`
const UNIT_PATH: [&str; 5] = ["xliff", "file", "body", "group", "trans-unit"];

const BOM: char = '\u{feff}';

/// Matches the `encoding` pseudo-attribute of a leading XML declaration
const DECLARED_ENCODING: &str = r#"^\s*<\?xml[^>]*?\sencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#;

#[derive(Debug, Error)]
pub enum XliffError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to serialize document: {0}")]
    Write(#[from] std::io::Error),

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// A `target` element found on the unit path.
///
/// Its content is kept as a list of child events so the element can be
/// written back untouched unless [`set_text`](Self::set_text) replaces it.
#[derive(Debug, Clone)]
pub struct TargetElement {
    start: BytesStart<'static>,
    children: Vec<Event<'static>>,
    end: Option<BytesEnd<'static>>,
    unit_id: Option<String>,
    state: Option<String>,
    text: String,
}

impl TargetElement {
    fn new(start: BytesStart<'static>, unit_id: Option<String>) -> Result<Self, XliffError> {
        let state = attribute_value(&start, b"state")?;
        Ok(Self {
            start,
            children: Vec::new(),
            end: None,
            unit_id,
            state,
            text: String::new(),
        })
    }

    /// `id` of the enclosing `trans-unit`, if it has one
    pub fn unit_id(&self) -> Option<&str> {
        self.unit_id.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Concatenated text of every descendant text and CDATA node, unescaped.
    pub fn inner_text(&self) -> &str {
        &self.text
    }

    /// Rewrites the `state` attribute, keeping every other attribute in place.
    pub fn set_state(&mut self, state: &str) -> Result<(), XliffError> {
        let original = self.start.clone();
        self.start.clear_attributes();

        let mut replaced = false;
        for attr in original.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if key == "state" {
                self.start.push_attribute(("state", state));
                replaced = true;
            } else {
                let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
                self.start.push_attribute((key.as_str(), &*value));
            }
        }
        if !replaced {
            self.start.push_attribute(("state", state));
        }

        self.state = Some(state.to_string());
        Ok(())
    }

    /// Replaces all children with a single text node.
    ///
    /// Only `<`, `>` and `&` are escaped; quotes and apostrophes are written as is.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Event::Text(BytesText::from_escaped(partial_escape(text)).into_owned())];
        if self.end.is_none() {
            self.end = Some(self.start.to_end().into_owned());
        }
        self.text = text.to_string();
    }

    fn push_child(&mut self, event: Event<'static>) -> Result<(), XliffError> {
        match &event {
            Event::Text(text) => {
                let unescaped = text.unescape().map_err(quick_xml::Error::from)?;
                self.text.push_str(&unescaped);
            }
            Event::CData(cdata) => self.text.push_str(&String::from_utf8_lossy(cdata)),
            _ => {}
        }
        self.children.push(event);
        Ok(())
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), XliffError> {
        match &self.end {
            None if self.children.is_empty() => {
                writer.write_event(Event::Empty(self.start.clone()))?;
            }
            end => {
                writer.write_event(Event::Start(self.start.clone()))?;
                for child in &self.children {
                    writer.write_event(child.clone())?;
                }
                let end = end.clone().unwrap_or_else(|| self.start.to_end().into_owned());
                writer.write_event(Event::End(end))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Event(Event<'static>),
    Target(TargetElement),
}

#[derive(Debug)]
struct OpenElement {
    local_name: String,
    in_xliff: bool,
    id: Option<String>,
}

/// An XLIFF 1.2 document held as a flat list of XML events.
///
/// Everything outside the `target` elements on the unit path is kept as the
/// reader produced it, so saving a document without edits writes the same
/// bytes back. The file encoding and byte-order mark are kept as well.
#[derive(Debug, Clone)]
pub struct XliffDocument {
    segments: Vec<Segment>,
    encoding: &'static Encoding,
    bom: bool,
}

impl XliffDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, XliffError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| XliffError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let document = Self::from_bytes(&bytes)?;
        debug!(
            "Loaded XLIFF document {} ({}, {} targets)",
            path.display(),
            document.encoding.name(),
            document.targets().count()
        );
        Ok(document)
    }

    /// Decodes raw file content before parsing it.
    ///
    /// A byte-order mark decides the encoding, then the `encoding` of the XML
    /// declaration, then UTF-8. Content that does not decode cleanly is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XliffError> {
        let (encoding, bom_len) = match Encoding::for_bom(bytes) {
            Some(found) => found,
            None => (declared_encoding(bytes).unwrap_or(UTF_8), 0),
        };

        let (content, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return Err(XliffError::Malformed(format!("content is not valid {}", encoding.name())));
        }

        let mut document = Self::parse(&content)?;
        document.encoding = encoding;
        document.bom |= bom_len > 0;
        Ok(document)
    }

    pub fn parse(xml: &str) -> Result<Self, XliffError> {
        let (bom, xml) = match xml.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, xml),
        };

        let mut reader = NsReader::from_str(xml);
        let mut segments = Vec::new();
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut open_target: Option<TargetElement> = None;
        let mut target_depth = 0usize;
        let mut seen_root = false;

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            let in_xliff = matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == XLIFF_NAMESPACE.as_bytes());

            if let Some(mut target) = open_target.take() {
                match event {
                    Event::Start(start) => {
                        target_depth += 1;
                        target.push_child(Event::Start(start.into_owned()))?;
                    }
                    Event::End(end) if target_depth == 0 => {
                        target.end = Some(end.into_owned());
                        segments.push(Segment::Target(target));
                        continue;
                    }
                    Event::End(end) => {
                        target_depth -= 1;
                        target.push_child(Event::End(end.into_owned()))?;
                    }
                    Event::Eof => {
                        return Err(XliffError::Malformed("unclosed <target> element".to_string()));
                    }
                    other => target.push_child(other.into_owned())?,
                }
                open_target = Some(target);
                continue;
            }

            match event {
                Event::Start(start) => {
                    check_root(&stack, &mut seen_root)?;
                    let local_name = local_name(&start);
                    if in_xliff && local_name == "target" && on_unit_path(&stack) {
                        open_target = Some(TargetElement::new(start.into_owned(), enclosing_unit_id(&stack))?);
                        target_depth = 0;
                        continue;
                    }
                    let id = if in_xliff && local_name == "trans-unit" {
                        attribute_value(&start, b"id")?
                    } else {
                        None
                    };
                    stack.push(OpenElement { local_name, in_xliff, id });
                    segments.push(Segment::Event(Event::Start(start.into_owned())));
                }
                Event::Empty(start) => {
                    check_root(&stack, &mut seen_root)?;
                    if in_xliff && local_name(&start) == "target" && on_unit_path(&stack) {
                        let target = TargetElement::new(start.into_owned(), enclosing_unit_id(&stack))?;
                        segments.push(Segment::Target(target));
                    } else {
                        segments.push(Segment::Event(Event::Empty(start.into_owned())));
                    }
                }
                Event::End(end) => {
                    if stack.pop().is_none() {
                        return Err(XliffError::Malformed("unexpected closing tag".to_string()));
                    }
                    segments.push(Segment::Event(Event::End(end.into_owned())));
                }
                Event::Text(text) if stack.is_empty() => {
                    if !text.iter().all(u8::is_ascii_whitespace) {
                        return Err(XliffError::Malformed("text outside the root element".to_string()));
                    }
                    segments.push(Segment::Event(Event::Text(text.into_owned())));
                }
                Event::Eof => break,
                other => segments.push(Segment::Event(other.into_owned())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(XliffError::Malformed(format!("unclosed <{}> element", open.local_name)));
        }
        if !seen_root {
            return Err(XliffError::Malformed("document has no root element".to_string()));
        }

        Ok(Self {
            segments,
            encoding: UTF_8,
            bom,
        })
    }

    /// Indices of the `target` elements on the unit path whose `state` is exactly `new`.
    pub fn untranslated_targets(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(idx, segment)| match segment {
                Segment::Target(target) if target.state() == Some("new") => Some(idx),
                _ => None,
            })
            .collect()
    }

    #[cfg(test)]
    pub fn target(&self, idx: usize) -> Option<&TargetElement> {
        match self.segments.get(idx) {
            Some(Segment::Target(target)) => Some(target),
            _ => None,
        }
    }

    pub fn target_mut(&mut self, idx: usize) -> Option<&mut TargetElement> {
        match self.segments.get_mut(idx) {
            Some(Segment::Target(target)) => Some(target),
            _ => None,
        }
    }

    /// All `target` elements on the unit path, whatever their state.
    pub fn targets(&self) -> impl Iterator<Item = &TargetElement> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Target(target) => Some(target),
            Segment::Event(_) => None,
        })
    }

    #[cfg(test)]
    pub fn to_xml_string(&self) -> Result<String, XliffError> {
        let body = self.serialize()?;
        if self.bom {
            Ok(format!("{}{}", BOM, body))
        } else {
            Ok(body)
        }
    }

    /// The serialized document in the encoding it was loaded with.
    pub fn to_bytes(&self) -> Result<Vec<u8>, XliffError> {
        let body = self.serialize()?;
        let mut bytes = Vec::with_capacity(body.len() + 3);

        if self.encoding == UTF_16LE || self.encoding == UTF_16BE {
            // encoding_rs only decodes UTF-16
            let little_endian = self.encoding == UTF_16LE;
            if self.bom {
                bytes.extend_from_slice(if little_endian { &[0xFF, 0xFE] } else { &[0xFE, 0xFF] });
            }
            for unit in body.encode_utf16() {
                let pair = if little_endian { unit.to_le_bytes() } else { unit.to_be_bytes() };
                bytes.extend_from_slice(&pair);
            }
        } else {
            if self.bom {
                bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
            }
            let (encoded, _, unmappable) = self.encoding.encode(&body);
            if unmappable {
                warn!("Characters not representable in {} were written as character references", self.encoding.name());
            }
            bytes.extend_from_slice(&encoded);
        }
        Ok(bytes)
    }

    /// Overwrites `path` with the serialized document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), XliffError> {
        let path = path.as_ref();
        let content = self.to_bytes()?;
        fs::write(path, content).map_err(|source| XliffError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Saved XLIFF document {}", path.display());
        Ok(())
    }

    fn serialize(&self) -> Result<String, XliffError> {
        let mut writer = Writer::new(Vec::new());
        for segment in &self.segments {
            match segment {
                Segment::Event(event) => writer.write_event(event.clone())?,
                Segment::Target(target) => target.write_to(&mut writer)?,
            }
        }

        String::from_utf8(writer.into_inner())
            .map_err(|e| XliffError::Malformed(format!("serialized document is not UTF-8: {}", e)))
    }
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let pattern = Regex::new(DECLARED_ENCODING).ok()?;
    let captures = pattern.captures(bytes)?;
    // a declaration readable as ASCII rules out UTF-16
    Encoding::for_label(&captures[1]).map(Encoding::output_encoding)
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn attribute_value(start: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, XliffError> {
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn check_root(stack: &[OpenElement], seen_root: &mut bool) -> Result<(), XliffError> {
    if stack.is_empty() {
        if *seen_root {
            return Err(XliffError::Malformed("more than one root element".to_string()));
        }
        *seen_root = true;
    }
    Ok(())
}

fn on_unit_path(stack: &[OpenElement]) -> bool {
    stack.len() == UNIT_PATH.len()
        && stack
            .iter()
            .zip(UNIT_PATH)
            .all(|(open, name)| open.in_xliff && open.local_name == name)
}

fn enclosing_unit_id(stack: &[OpenElement]) -> Option<String> {
    stack.last().and_then(|open| open.id.clone())
}
