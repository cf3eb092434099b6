//! DOCX text extraction: `word/document.xml` read out of the zip container

use crate::TextError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

/// Text of a DOCX body, one line per paragraph, and the paragraph count
pub(crate) fn extract_docx(bytes: &[u8]) -> Result<(String, usize), TextError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| TextError::Docx(format!("Failed to open DOCX: {}", e)))?;

    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| TextError::Docx(format!("Failed to find document.xml: {}", e)))?;

    let mut xml = String::new();
    document_xml
        .read_to_string(&mut xml)
        .map_err(|e| TextError::Docx(format!("Failed to read document.xml: {}", e)))?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<(String, usize), TextError> {
    // No trimming: whitespace inside <w:t> runs is significant
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut paragraphs = 0;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    text.push('\n');
                    paragraphs += 1;
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let decoded = e
                    .unescape()
                    .map_err(|e| TextError::Docx(format!("Bad text run: {}", e)))?;
                text.push_str(&decoded);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TextError::Docx(format!("XML parsing error: {}", e)));
            }
            _ => {}
        }
    }

    Ok((text, paragraphs))
}
