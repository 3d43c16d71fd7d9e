//! The ordered batch of files selected for a merge.
//!
//! Files are validated as they are added: non-PDF content types, duplicate
//! names, empty files, and anything that would push the batch past the byte
//! ceiling are rejected individually while the rest of the selection is
//! kept. Merge order is the explicit `sequence` on each entry, not whatever
//! order an internal map happens to iterate in.

use bytes::Bytes;

use pdfbind_core::constants::DEFAULT_MAX_BATCH_SIZE_BYTES;
use pdfbind_core::validation::{is_pdf_content_type, validate_file_name, ValidationError};

/// One file picked by the user, before any network activity.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        SelectedFile {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A batch entry with its merge position.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// Position in the merged output, starting at 0. Reordering rewrites
    /// every sequence so positions stay dense.
    pub sequence: usize,
    pub file: SelectedFile,
}

/// Files accepted for merging, in merge order.
#[derive(Debug, Clone)]
pub struct OrderedFileBatch {
    entries: Vec<BatchEntry>,
    max_batch_size_bytes: u64,
}

impl Default for OrderedFileBatch {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_SIZE_BYTES)
    }
}

impl OrderedFileBatch {
    pub fn new(max_batch_size_bytes: u64) -> Self {
        OrderedFileBatch {
            entries: Vec::new(),
            max_batch_size_bytes,
        }
    }

    /// Add files to the end of the batch.
    ///
    /// Each file is validated independently; rejected files are returned
    /// with the reason and the rest are kept. A file whose size brings the
    /// batch total exactly to the ceiling is accepted, one byte past it is
    /// not.
    pub fn add_files(
        &mut self,
        files: impl IntoIterator<Item = SelectedFile>,
    ) -> Vec<(String, ValidationError)> {
        let mut rejected = Vec::new();
        let mut total = self.total_bytes();

        for file in files {
            if let Err(e) = validate_file_name(&file.name) {
                rejected.push((file.name, e));
                continue;
            }
            if !is_pdf_content_type(&file.content_type) {
                rejected.push((
                    file.name.clone(),
                    ValidationError::NotPdf {
                        name: file.name,
                        content_type: file.content_type,
                    },
                ));
                continue;
            }
            if file.data.is_empty() {
                rejected.push((file.name.clone(), ValidationError::EmptyFile(file.name)));
                continue;
            }
            if self.contains(&file.name) {
                rejected.push((
                    file.name.clone(),
                    ValidationError::DuplicateName(file.name),
                ));
                continue;
            }
            if total + file.size_bytes() > self.max_batch_size_bytes {
                rejected.push((
                    file.name.clone(),
                    ValidationError::BatchTooLarge {
                        name: file.name,
                        max_bytes: self.max_batch_size_bytes,
                    },
                ));
                continue;
            }

            total += file.size_bytes();
            self.entries.push(BatchEntry {
                sequence: self.entries.len(),
                file,
            });
        }

        rejected
    }

    /// Move the named file to a new position, shifting the rest.
    pub fn reorder(&mut self, name: &str, new_position: usize) -> Result<(), ValidationError> {
        let from = self
            .entries
            .iter()
            .position(|e| e.file.name == name)
            .ok_or_else(|| ValidationError::InvalidFileName(format!("'{}' is not in the batch", name)))?;

        let to = new_position.min(self.entries.len() - 1);
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        self.resequence();
        Ok(())
    }

    /// Remove the named file from the batch.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.file.name != name);
        let removed = self.entries.len() != before;
        if removed {
            self.resequence();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.file.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.file.size_bytes()).sum()
    }

    /// Entries in merge order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// File names in merge order.
    pub fn file_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.file.name.clone()).collect()
    }

    /// Whether the batch can be merged at all.
    pub fn validate_for_merge(&self) -> Result<(), ValidationError> {
        if self.entries.len() < 2 {
            return Err(ValidationError::TooFewFiles(self.entries.len()));
        }
        Ok(())
    }

    fn resequence(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.sequence = i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, size: usize) -> SelectedFile {
        SelectedFile::new(name, "application/pdf", Bytes::from(vec![0u8; size]))
    }

    #[test]
    fn test_add_files_assigns_dense_sequences() {
        let mut batch = OrderedFileBatch::default();
        let rejected = batch.add_files(vec![pdf("a.pdf", 10), pdf("b.pdf", 10)]);
        assert!(rejected.is_empty());
        assert_eq!(batch.entries()[0].sequence, 0);
        assert_eq!(batch.entries()[1].sequence, 1);
    }

    #[test]
    fn test_rejects_non_pdf_and_keeps_rest() {
        let mut batch = OrderedFileBatch::default();
        let rejected = batch.add_files(vec![
            pdf("a.pdf", 10),
            SelectedFile::new("image.png", "image/png", Bytes::from_static(b"png")),
            pdf("b.pdf", 10),
        ]);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(rejected[0].1, ValidationError::NotPdf { .. }));
        assert_eq!(batch.file_names(), vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_rejects_duplicates_and_empty_files() {
        let mut batch = OrderedFileBatch::default();
        let rejected = batch.add_files(vec![pdf("a.pdf", 10), pdf("a.pdf", 20), pdf("e.pdf", 0)]);
        assert_eq!(rejected.len(), 2);
        assert!(matches!(rejected[0].1, ValidationError::DuplicateName(_)));
        assert!(matches!(rejected[1].1, ValidationError::EmptyFile(_)));
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_batch_ceiling_boundary_is_exact() {
        let mut batch = OrderedFileBatch::new(100);
        let rejected = batch.add_files(vec![pdf("exact.pdf", 100)]);
        assert!(rejected.is_empty(), "total == ceiling is allowed");

        let rejected = batch.add_files(vec![pdf("one-more.pdf", 1)]);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(
            rejected[0].1,
            ValidationError::BatchTooLarge { .. }
        ));
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_oversized_file_rejected_but_smaller_sibling_kept() {
        let mut batch = OrderedFileBatch::new(100);
        let rejected = batch.add_files(vec![pdf("big.pdf", 101), pdf("small.pdf", 50)]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "big.pdf");
        assert_eq!(batch.file_names(), vec!["small.pdf"]);
    }

    #[test]
    fn test_reorder_rewrites_sequences() {
        let mut batch = OrderedFileBatch::default();
        batch.add_files(vec![pdf("a.pdf", 1), pdf("b.pdf", 1), pdf("c.pdf", 1)]);

        batch.reorder("c.pdf", 0).expect("reorder");
        assert_eq!(batch.file_names(), vec!["c.pdf", "a.pdf", "b.pdf"]);
        let sequences: Vec<usize> = batch.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);

        assert!(batch.reorder("missing.pdf", 0).is_err());
    }

    #[test]
    fn test_remove_and_merge_validation() {
        let mut batch = OrderedFileBatch::default();
        batch.add_files(vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]);
        assert!(batch.validate_for_merge().is_ok());

        assert!(batch.remove("a.pdf"));
        assert!(!batch.remove("a.pdf"));
        assert!(matches!(
            batch.validate_for_merge(),
            Err(ValidationError::TooFewFiles(1))
        ));
    }
}
