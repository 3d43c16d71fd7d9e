//! Core page-concatenation implementation.

use lopdf::{Document, Object, ObjectId};

use crate::error::{MergeError, Result};

/// Statistics about a concatenation.
#[derive(Debug, Clone)]
pub struct ConcatStats {
    /// Number of input documents merged.
    pub documents: usize,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Total size of the input byte streams.
    pub input_bytes: u64,
}

/// Concatenate named PDF byte streams into one document.
///
/// Inputs are appended in slice order; each document's internal page order
/// is preserved. Returns the serialized merged PDF and statistics.
///
/// # Errors
///
/// Returns an error if any input fails to parse, contributes no pages, or
/// the merged page tree cannot be assembled.
pub fn concat(inputs: &[(String, Vec<u8>)]) -> Result<(Vec<u8>, ConcatStats)> {
    if inputs.is_empty() {
        return Err(MergeError::NoDocuments);
    }

    let input_bytes: u64 = inputs.iter().map(|(_, data)| data.len() as u64).sum();

    let mut documents = Vec::with_capacity(inputs.len());
    for (name, data) in inputs {
        let doc = Document::load_mem(data).map_err(|e| MergeError::InvalidPdf {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        if doc.get_pages().is_empty() {
            return Err(MergeError::EmptyDocument(name.clone()));
        }
        documents.push(doc);
    }

    let mut documents = documents.into_iter();
    let mut merged = documents.next().expect("at least one document");
    let mut max_id = merged.max_id;

    for mut doc in documents {
        // Renumber objects to avoid ID conflicts
        doc.renumber_objects_with(max_id + 1);
        max_id = doc.max_id;

        let doc_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

        merged.objects.extend(doc.objects);
        add_pages_to_tree(&mut merged, &doc_pages)?;
    }

    // Always renumber for consistency
    merged.renumber_objects();

    let total_pages = merged.get_pages().len();

    let mut buffer = Vec::new();
    merged
        .save_to(&mut buffer)
        .map_err(|e| MergeError::WriteFailed(e.to_string()))?;

    tracing::debug!(
        documents = inputs.len(),
        total_pages,
        input_bytes,
        output_bytes = buffer.len(),
        "Concatenated documents"
    );

    Ok((
        buffer,
        ConcatStats {
            documents: inputs.len(),
            total_pages,
            input_bytes,
        },
    ))
}

/// Append page references to the merged document's page tree.
fn add_pages_to_tree(merged: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let catalog = merged
        .catalog_mut()
        .map_err(|e| MergeError::merge_failed(format!("Failed to get catalog: {}", e)))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(|p| p.as_reference())
        .map_err(|e| MergeError::merge_failed(format!("Failed to get pages reference: {}", e)))?;

    let pages_dict = merged
        .get_object_mut(pages_id)
        .map_err(|e| MergeError::merge_failed(format!("Failed to get pages object: {}", e)))?;

    if let Object::Dictionary(dict) = pages_dict {
        let kids = dict
            .get_mut(b"Kids")
            .map_err(|_| MergeError::merge_failed("Pages dictionary missing Kids array"))?;

        if let Object::Array(kids_array) = kids {
            for &page_id in page_ids {
                kids_array.push(Object::Reference(page_id));
            }
        } else {
            return Err(MergeError::merge_failed("Kids is not an array"));
        }

        let current_count = dict.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
        dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));
    } else {
        return Err(MergeError::merge_failed("Pages object is not a dictionary"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    /// Build a minimal one-page PDF whose content stream contains `marker`.
    fn one_page_pdf(marker: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(marker)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save pdf");
        buffer
    }

    /// Content stream bytes of every page, in page order.
    fn page_contents(data: &[u8]) -> Vec<Vec<u8>> {
        let doc = Document::load_mem(data).expect("load merged pdf");
        doc.get_pages()
            .into_values()
            .map(|page_id| doc.get_page_content(page_id).expect("page content"))
            .collect()
    }

    #[test]
    fn test_concat_two_documents() {
        let inputs = vec![
            ("a.pdf".to_string(), one_page_pdf("alpha")),
            ("b.pdf".to_string(), one_page_pdf("beta")),
        ];

        let (merged, stats) = concat(&inputs).expect("concat");
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.total_pages, 2);

        let contents = page_contents(&merged);
        assert_eq!(contents.len(), 2);
        assert!(contents[0].windows(5).any(|w| w == b"alpha"));
        assert!(contents[1].windows(4).any(|w| w == b"beta"));
    }

    #[test]
    fn test_concat_preserves_caller_order() {
        let inputs = vec![
            ("c.pdf".to_string(), one_page_pdf("charlie")),
            ("a.pdf".to_string(), one_page_pdf("alpha")),
            ("b.pdf".to_string(), one_page_pdf("beta")),
        ];

        let (merged, stats) = concat(&inputs).expect("concat");
        assert_eq!(stats.total_pages, 3);

        let contents = page_contents(&merged);
        assert!(contents[0].windows(7).any(|w| w == b"charlie"));
        assert!(contents[1].windows(5).any(|w| w == b"alpha"));
        assert!(contents[2].windows(4).any(|w| w == b"beta"));
    }

    #[test]
    fn test_concat_single_document_passthrough() {
        let inputs = vec![("only.pdf".to_string(), one_page_pdf("solo"))];
        let (merged, stats) = concat(&inputs).expect("concat");
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.total_pages, 1);
        assert!(Document::load_mem(&merged).is_ok());
    }

    #[test]
    fn test_concat_rejects_invalid_pdf() {
        let inputs = vec![
            ("a.pdf".to_string(), one_page_pdf("alpha")),
            ("bad.pdf".to_string(), b"this is not a pdf".to_vec()),
        ];

        match concat(&inputs) {
            Err(MergeError::InvalidPdf { name, .. }) => assert_eq!(name, "bad.pdf"),
            other => panic!("expected InvalidPdf, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_concat_rejects_empty_input() {
        assert!(matches!(concat(&[]), Err(MergeError::NoDocuments)));
    }
}
