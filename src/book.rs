//! The book-handle boundary.
//!
//! The session only needs a title and an ordered run of chapter resources
//! that yield raw bytes on demand; `Book` captures that contract and
//! `EpubBook` fulfils it with the `epub` crate. Keeping the container format
//! behind this seam lets the rest of the core be exercised with in-memory
//! books.

use anyhow::{Context, Result, bail};
use epub::doc::EpubDoc;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// An opened book: a title plus an ordered spine of chapter resources.
pub trait Book {
    /// Book title as recorded in the container metadata; empty when the
    /// container carries none.
    fn title(&self) -> &str;

    /// Number of spine items (chapters) in reading order.
    fn chapter_count(&self) -> usize;

    /// Raw bytes of the spine resource at `index`. Callers keep `index`
    /// within `0..chapter_count()`.
    fn chapter_bytes(&mut self, index: usize) -> Result<Vec<u8>>;
}

/// Whether a source path carries the EPUB extension marker. Anything else is
/// reported to the user as unsupported before we touch the file.
pub fn is_epub_source(source: &str) -> bool {
    matches!(
        Path::new(source)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase()),
        Some(ext) if ext == "epub"
    )
}

/// Production `Book` over an EPUB container on disk.
pub struct EpubBook {
    doc: EpubDoc<BufReader<File>>,
    title: String,
}

impl EpubBook {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = EpubDoc::new(path)
            .with_context(|| format!("Failed to open EPUB at {}", path.display()))?;
        let title = doc
            .mdata("title")
            .map(|item| item.value.clone())
            .unwrap_or_default();
        Ok(Self { doc, title })
    }
}

impl Book for EpubBook {
    fn title(&self) -> &str {
        &self.title
    }

    fn chapter_count(&self) -> usize {
        self.doc.get_num_chapters()
    }

    fn chapter_bytes(&mut self, index: usize) -> Result<Vec<u8>> {
        if !self.doc.set_current_chapter(index) {
            bail!("spine index {index} is out of range");
        }
        let (data, _mime) = self
            .doc
            .get_current()
            .with_context(|| format!("spine item {index} has no readable resource"))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_epub_extension_case_insensitively() {
        assert!(is_epub_source("shelf/alpha.epub"));
        assert!(is_epub_source("Alpha.EPUB"));
    }

    #[test]
    fn rejects_sources_without_the_marker() {
        assert!(!is_epub_source("notes.txt"));
        assert!(!is_epub_source("epub"));
        assert!(!is_epub_source("archive.epub.zip"));
    }

    fn fixture_path() -> &'static Path {
        Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/alpha.epub"
        ))
    }

    #[test]
    fn opens_a_container_and_reads_its_title() {
        let book = EpubBook::open(fixture_path()).unwrap();
        assert_eq!(book.title(), "Alpha Fixture");
        assert_eq!(book.chapter_count(), 2);
    }

    #[test]
    fn yields_raw_spine_bytes_in_reading_order() {
        let mut book = EpubBook::open(fixture_path()).unwrap();
        let first = String::from_utf8(book.chapter_bytes(0).unwrap()).unwrap();
        assert!(first.contains("opening words"));
        let second = String::from_utf8(book.chapter_bytes(1).unwrap()).unwrap();
        assert!(second.contains("second chapter text"));
        assert!(book.chapter_bytes(9).is_err());
    }
}
