//! PDF text extraction via `lopdf`

use crate::TextError;
use tracing::warn;

/// Text of a PDF and the number of pages it has
pub(crate) fn extract_pdf(bytes: &[u8]) -> Result<(String, usize), TextError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| TextError::Pdf(format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    let mut text = String::new();

    for (page_num, _) in &pages {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            // Scanned or oddly encoded pages are skipped; the length check
            // downstream catches documents with no usable text at all.
            Err(e) => warn!(page = *page_num, error = %e, "Could not extract text from PDF page"),
        }
    }

    Ok((text, pages.len()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one page per entry of `pages`
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        let resources_id = doc.new_object_id();

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
            }),
        );
        doc.objects.insert(
            resources_id,
            Object::Dictionary(dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            }),
        );

        let mut kids: Vec<Object> = Vec::new();
        for line in pages {
            let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", line);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_counts_pages() {
        let bytes = build_pdf(&["Article 1", "Article 2", "Article 3"]);
        let (_, pages) = extract_pdf(&bytes).unwrap();
        assert_eq!(pages, 3);
    }

    #[test]
    fn test_corrupted_pdf_error() {
        match extract_pdf(b"not a valid pdf content") {
            Err(TextError::Pdf(msg)) => assert!(msg.contains("Failed to load PDF")),
            other => panic!("Expected Pdf error, got {:?}", other),
        }
    }
}
