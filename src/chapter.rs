//! Chapter loading and cleanup.
//!
//! Turns one spine resource into a flat run of words: fetch the raw bytes,
//! decode UTF-8, drop comment blocks, strip markup, and flatten whitespace.
//! Loading is fail-soft on purpose: a chapter that cannot be read becomes an
//! empty string so playback rolls on instead of crashing the reader.

use crate::book::Book;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

// Comment bodies may span lines, hence (?s).
static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Error, Debug)]
pub enum ChapterReadError {
    #[error("failed to read chapter {index}: {cause}")]
    Fetch { index: usize, cause: anyhow::Error },

    #[error("chapter {index} is not valid UTF-8")]
    Decode {
        index: usize,
        source: std::string::FromUtf8Error,
    },
}

/// Load the chapter at `index` as clean flat text.
///
/// `index` is expected to be within `0..book.chapter_count()`. Read and
/// decode failures are logged and substituted with an empty string.
pub fn load_chapter(book: &mut dyn Book, index: usize) -> String {
    match try_load_chapter(book, index) {
        Ok(text) => {
            debug!(chapter = index, chars = text.len(), "Loaded chapter text");
            text
        }
        Err(err) => {
            warn!(chapter = index, "Substituting empty chapter text: {err}");
            String::new()
        }
    }
}

fn try_load_chapter(book: &mut dyn Book, index: usize) -> Result<String, ChapterReadError> {
    let bytes = book
        .chapter_bytes(index)
        .map_err(|cause| ChapterReadError::Fetch { index, cause })?;
    let raw = String::from_utf8(bytes).map_err(|source| ChapterReadError::Decode { index, source })?;
    Ok(clean_chapter_text(&raw))
}

/// Strip comments and markup and flatten the text onto a single line.
pub fn clean_chapter_text(raw: &str) -> String {
    let uncommented = RE_COMMENT.replace_all(raw, " ");
    // The plain renderer handles entities and structure without markdown
    // decoration; fall back to a bare tag strip so malformed markup still
    // yields words rather than nothing.
    let plain = match html2text::config::plain_no_decorate().string_from_read(uncommented.as_bytes(), 10_000) {
        Ok(text) => text,
        Err(err) => {
            warn!("html2text failed, stripping tags directly: {err}");
            RE_TAG.replace_all(&uncommented, " ").into_owned()
        }
    };
    let flat = plain.replace(['\n', '\r'], " ");
    RE_WHITESPACE.replace_all(&flat, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct FixtureBook {
        chapters: Vec<Vec<u8>>,
    }

    impl Book for FixtureBook {
        fn title(&self) -> &str {
            "Fixture"
        }

        fn chapter_count(&self) -> usize {
            self.chapters.len()
        }

        fn chapter_bytes(&mut self, index: usize) -> anyhow::Result<Vec<u8>> {
            match self.chapters.get(index) {
                Some(bytes) => Ok(bytes.clone()),
                None => bail!("no chapter {index}"),
            }
        }
    }

    struct BrokenBook;

    impl Book for BrokenBook {
        fn title(&self) -> &str {
            "Broken"
        }

        fn chapter_count(&self) -> usize {
            1
        }

        fn chapter_bytes(&mut self, _index: usize) -> anyhow::Result<Vec<u8>> {
            bail!("resource unreadable")
        }
    }

    #[test]
    fn strips_markup_and_flattens_lines() {
        let text = clean_chapter_text("<html><body><p>Call me\nIshmael.</p><p>Some <b>years</b> ago</p></body></html>");
        assert!(!text.contains('<'));
        assert!(!text.contains('>'));
        assert!(!text.contains('\n'));
        assert!(text.contains("Call me"));
        assert!(text.contains("Ishmael."));
        assert!(text.contains("years ago"));
    }

    #[test]
    fn emphasis_carries_no_decoration_into_the_word_stream() {
        let text = clean_chapter_text("<p>Some <b>years</b> ago, <i>never</i> mind how long</p>");
        assert!(!text.contains('*'), "unexpected decoration in: {text}");
        assert!(text.contains("Some years ago,"));
        assert!(text.contains("never mind"));
    }

    #[test]
    fn removes_comment_blocks_spanning_lines() {
        let text = clean_chapter_text("<p>before</p><!-- first\nsecond\nthird --><p>after</p>");
        assert!(!text.contains("<!--"));
        assert!(!text.contains("first"));
        assert!(!text.contains("second"));
        assert!(text.contains("before"));
        assert!(text.contains("after"));
    }

    #[test]
    fn every_chapter_loads_without_markup() {
        let mut book = FixtureBook {
            chapters: vec![
                b"<h1>One</h1><p>alpha beta</p>".to_vec(),
                b"<p>gamma <!-- note --> delta</p>".to_vec(),
                b"plain words only".to_vec(),
            ],
        };
        for index in 0..book.chapter_count() {
            let text = load_chapter(&mut book, index);
            assert!(!text.contains('<'), "chapter {index}: {text}");
            assert!(!text.contains('>'), "chapter {index}: {text}");
            assert!(!text.contains("<!--"), "chapter {index}: {text}");
        }
    }

    #[test]
    fn unreadable_chapter_becomes_empty_text() {
        let mut book = BrokenBook;
        assert_eq!(load_chapter(&mut book, 0), "");
    }

    #[test]
    fn invalid_utf8_becomes_empty_text() {
        let mut book = FixtureBook {
            chapters: vec![vec![0xff, 0xfe, 0xfd]],
        };
        assert_eq!(load_chapter(&mut book, 0), "");
    }
}
