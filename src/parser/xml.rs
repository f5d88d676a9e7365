//! Comment extraction for the board-game XML API
//!
//! The `thing` endpoint answers with
//!
//! ```xml
//! <items>
//!   <item type="boardgame" id="13">
//!     <name type="primary" value="CATAN"/>
//!     <comments page="1" totalitems="1234">
//!       <comment username="..." rating="7" value="..."/>
//!     </comments>
//!   </item>
//! </items>
//! ```
//!
//! and with an `<error>`/`<errors>` document when it refuses a request.
//! Pages past the end come back with an empty `<comments>` element.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::models::{CandidateRecord, PageCursor, Rating};
use crate::parser::sanitize::{non_empty, strip_bbcode};
use crate::parser::{ExtractedPage, RawPage, RecordExtractor};
use crate::utils::error::ParseError;

/// Extracts comments from `thing?comments=1` responses
#[derive(Debug, Clone, Default)]
pub struct XmlCommentExtractor;

impl XmlCommentExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn xml_error(err: impl std::fmt::Display) -> ParseError {
    ParseError::Xml(err.to_string())
}

/// Look up an attribute by name, unescaping its value
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ParseError> {
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[derive(Default)]
struct CommentDocument {
    root: Option<String>,
    parent_name: Option<String>,
    candidates: Vec<CandidateRecord>,
    error_message: String,
}

impl CommentDocument {
    fn visit(&mut self, element: &BytesStart<'_>) -> Result<(), ParseError> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();

        if self.root.is_none() {
            self.root = Some(name);
            return Ok(());
        }

        match name.as_str() {
            "name" if self.parent_name.is_none() => {
                if attribute(element, b"type")?.as_deref() == Some("primary") {
                    self.parent_name = attribute(element, b"value")?
                        .as_deref()
                        .and_then(non_empty);
                }
            }
            "comment" => {
                let rating = attribute(element, b"rating")?
                    .as_deref()
                    .and_then(Rating::parse);
                let body = attribute(element, b"value")?
                    .map(|v| strip_bbcode(&v))
                    .as_deref()
                    .and_then(non_empty);
                self.candidates.push(CandidateRecord {
                    rating,
                    title: None,
                    body,
                });
            }
            _ => {}
        }

        Ok(())
    }

    fn is_error_document(&self) -> bool {
        matches!(self.root.as_deref(), Some("error" | "errors"))
    }
}

impl RecordExtractor for XmlCommentExtractor {
    fn extract(&self, page: &RawPage) -> Result<ExtractedPage, ParseError> {
        if page.body.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let mut reader = Reader::from_str(&page.body);
        reader.config_mut().trim_text(true);

        let mut doc = CommentDocument::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => doc.visit(e)?,
                Ok(Event::Text(ref text)) if doc.is_error_document() => {
                    let text = text.unescape().map_err(xml_error)?;
                    if !doc.error_message.is_empty() {
                        doc.error_message.push(' ');
                    }
                    doc.error_message.push_str(text.trim());
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::Xml(format!(
                        "at position {}: {e}",
                        reader.error_position()
                    )))
                }
                Ok(_) => {}
            }
        }

        match doc.root.as_deref() {
            None => return Err(ParseError::EmptyDocument),
            Some("items") => {}
            Some(_) if doc.is_error_document() => {
                return Err(ParseError::ErrorDocument(doc.error_message));
            }
            Some(other) => return Err(ParseError::UnexpectedRoot(other.to_string())),
        }

        // Numbered pagination: advance only while pages keep yielding records
        let next_cursor = match (&page.cursor, doc.candidates.is_empty()) {
            (PageCursor::Page(n), false) => Some(PageCursor::Page(n + 1)),
            _ => None,
        };

        Ok(ExtractedPage {
            candidates: doc.candidates,
            parent_name: doc.parent_name,
            next_cursor,
        })
    }
}
