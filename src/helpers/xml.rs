//! XML parsing utilities for the SpreadsheetML parts of an xlsx workbook
//! Wraps quick-xml with the configuration the workbook parts need and adds
//! attribute and text helpers

use crate::error::DashboardError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors specific to XML parsing operations
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '{0}'")]
    UnknownEntity(String),

    #[error("Invalid value '{value}' for attribute '{name}'")]
    InvalidAttributeValue { name: String, value: String },
}

/// Pull reader over one XML part, reusing a single event buffer
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // `<c r="A1"/>` must produce Start + End so cell bookkeeping stays uniform
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Reads the next event, `None` at end of document
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, DashboardError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(DashboardError::XmlError(error)),
        }
    }
}

/// Attribute access on start tags
pub(crate) trait XmlNodeHelper<'a> {
    /// Gets the unescaped value of an attribute by name
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, DashboardError>;

    /// Parses an attribute value to the requested type
    fn parse_attribute_value<T: FromStr>(&'a self, name: &str) -> Result<Option<T>, DashboardError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, DashboardError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }

    fn parse_attribute_value<T: FromStr>(&'a self, name: &str) -> Result<Option<T>, DashboardError> {
        match self.get_attribute_value(name)? {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| XmlError::InvalidAttributeValue {
                    name: name.to_owned(),
                    value: value.to_string(),
                }.into()),
            None => Ok(None),
        }
    }
}

/// Appends character and entity references to a text buffer
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), DashboardError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), DashboardError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                number.parse::<u32>()?
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::UnknownEntity(raw.to_string()))?;
        }
        Ok(())
    }
}

/// Loops over the events of an [`XmlReader`] until end of document,
/// dispatching each one to the given match arms.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_xml_events;
    use quick_xml::name::QName;

    fn collect(xml: &str) -> Result<(Vec<String>, String), DashboardError> {
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut refs = Vec::new();
        let mut text = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == QName(b"c") => {
                if let Some(reference) = event.get_attribute_value("r")? {
                    refs.push(reference.to_string());
                }
            }
            Event::Text(event) => text.push_str(&event.xml_content()?),
            Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
        });
        Ok((refs, text))
    }

    #[test]
    fn xml_reader_expands_empty_elements() {
        let (refs, _) = collect(r#"<row><c r="A1"/><c r="B1"></c></row>"#).unwrap();
        assert_eq!(refs, vec!["A1", "B1"]);
    }

    #[test]
    fn xml_reader_resolves_references() {
        let (_, text) = collect("<t>TPS &amp; DP &#65;&#x42;</t>").unwrap();
        assert_eq!(text, "TPS & DP AB");
    }

    #[test]
    fn xml_reader_rejects_unknown_entity() {
        assert!(collect("<t>&bogus;</t>").is_err());
    }

    #[test]
    fn parse_attribute_value_reports_invalid_value() -> Result<(), DashboardError> {
        let mut reader = XmlReader::new(r#"<c s="x1" t="7"/>"#.as_bytes());
        let mut outcome = None;
        let mut kind = None;
        match_xml_events!(reader => {
            Event::Start(event) => {
                outcome = Some(event.parse_attribute_value::<usize>("s").map_err(|e| e.to_string()));
                kind = event.parse_attribute_value::<usize>("t")?;
            }
        });
        assert_eq!(outcome, Some(Err("Invalid value 'x1' for attribute 's'".to_owned())));
        assert_eq!(kind, Some(7));
        Ok(())
    }
}
