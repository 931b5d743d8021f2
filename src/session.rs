//! The reading session: one open book, one word cursor, one speed.
//!
//! The session owns the book handle and a [`SpritzEngine`] and is driven by
//! an external timer: each tick consumes one word, and exhausting a
//! chapter's queue during requested playback rolls into the next spine item.
//! Progress is persisted on every chapter advance and manual jump (and by
//! the shell on quit), then reconciled against the freshly opened book's
//! title on the next open.

use crate::book::{Book, EpubBook, is_epub_source};
use crate::chapter::load_chapter;
use crate::engine::SpritzEngine;
use crate::progress::{ProgressRecord, ProgressStore};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0} is not recognized as an EPUB book")]
    UnsupportedSource(String),

    #[error("could not open book: {0}")]
    Open(anyhow::Error),
}

/// Fire-and-forget notifications for the shell, drained after each action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Playback rolled into a chapter; carries the index of the chapter now
    /// on screen.
    ChapterAdvanced(usize),
}

/// How saved progress should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// Nothing open yet: re-open the last saved source from scratch.
    ColdStart,
    /// A book was just parsed: reconcile the saved record against its title.
    PostOpen,
}

pub struct ReadingSession {
    book: Option<Box<dyn Book>>,
    source: Option<String>,
    /// Next chapter the advance loop will load; runs up to `max_chapter`.
    current_chapter: usize,
    /// Chapter whose words are in the engine right now. This is what gets
    /// persisted and announced, keeping resume free of off-by-one drift.
    loaded_chapter: usize,
    max_chapter: usize,
    engine: SpritzEngine,
    playing: bool,
    play_requested: bool,
    store: ProgressStore,
    events: Vec<SessionEvent>,
}

impl ReadingSession {
    pub fn new(store: ProgressStore, wpm: u32) -> Self {
        Self {
            book: None,
            source: None,
            current_chapter: 0,
            loaded_chapter: 0,
            max_chapter: 0,
            engine: SpritzEngine::new(wpm),
            playing: false,
            play_requested: false,
            store,
            events: Vec::new(),
        }
    }

    /// Open a book source, replacing any current book on success. An
    /// unrecognized or unreadable source leaves prior state untouched.
    pub fn open(&mut self, source: &str) -> Result<(), SessionError> {
        if !is_epub_source(source) {
            return Err(SessionError::UnsupportedSource(source.to_string()));
        }
        let book = EpubBook::open(Path::new(source)).map_err(SessionError::Open)?;
        info!(source, title = book.title(), "Opened book");
        self.install_book(source.to_string(), Box::new(book));
        Ok(())
    }

    /// Pause playback, then open a new source.
    pub fn set_source(&mut self, source: &str) -> Result<(), SessionError> {
        self.pause();
        self.open(source)
    }

    fn install_book(&mut self, source: String, book: Box<dyn Book>) {
        self.max_chapter = book.chapter_count();
        self.book = Some(book);
        self.source = Some(source);
        self.playing = false;
        self.play_requested = false;
        self.restore(RestoreMode::PostOpen);
    }

    /// Apply saved progress. `ColdStart` only does anything while no book is
    /// open; `PostOpen` runs as part of every successful open.
    pub fn restore(&mut self, mode: RestoreMode) {
        match mode {
            RestoreMode::ColdStart => {
                if self.book.is_some() {
                    return;
                }
                let Some(record) = self.store.load() else {
                    debug!("Nothing to resume");
                    return;
                };
                if let Err(err) = self.open(&record.source) {
                    warn!(source = %record.source, "Could not reopen last book: {err}");
                }
            }
            RestoreMode::PostOpen => {
                match self.applicable_record() {
                    Some(record) => {
                        self.current_chapter = record.chapter;
                        self.engine.set_wpm(record.wpm);
                        self.load_into_engine(record.chapter);
                        self.engine.fast_forward(record.word_offset);
                        info!(
                            chapter = record.chapter,
                            word_offset = record.word_offset,
                            wpm = record.wpm,
                            "Resumed saved position"
                        );
                    }
                    None => {
                        self.current_chapter = 0;
                        self.load_into_engine(0);
                    }
                }
            }
        }
    }

    // A saved record applies when its title exactly matches the open book's
    // and its chapter still exists in this book's spine.
    fn applicable_record(&self) -> Option<ProgressRecord> {
        let record = self.store.load()?;
        let title = self.book.as_ref().map(|book| book.title())?;
        if title.is_empty() || title != record.title {
            debug!(
                book = title,
                saved = %record.title,
                "Saved progress is for a different book"
            );
            return None;
        }
        if record.chapter >= self.max_chapter {
            warn!(
                chapter = record.chapter,
                max_chapter = self.max_chapter,
                "Saved chapter no longer exists, starting over"
            );
            return None;
        }
        Some(record)
    }

    /// Jump straight to `chapter` (caller keeps it within range) and persist
    /// the new position. The word cursor resets to the chapter start.
    pub fn print_chapter(&mut self, chapter: usize) {
        self.current_chapter = chapter;
        self.load_into_engine(chapter);
        self.save_progress();
        info!(chapter, "Jumped to chapter");
    }

    fn load_into_engine(&mut self, chapter: usize) {
        let text = match self.book.as_mut() {
            Some(book) if chapter < self.max_chapter => load_chapter(book.as_mut(), chapter),
            _ => String::new(),
        };
        self.engine.set_text(&text);
        self.loaded_chapter = chapter;
    }

    pub fn play(&mut self) {
        if self.book.is_none() {
            return;
        }
        self.playing = true;
        self.play_requested = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.play_requested = false;
    }

    /// One timer tick: consume a word and roll into the next chapter when
    /// the queue has emptied. Returns the word to display, if any.
    pub fn tick(&mut self) -> Option<String> {
        if !self.playing {
            return None;
        }
        let word = self.engine.next_word();
        self.advance();
        word
    }

    // The advance hook the playback loop fires after consuming the last
    // queued word: load the chapter the cursor points at, move the cursor
    // on, persist, announce. A no-op while words remain queued or once the
    // cursor has reached the end of the spine.
    fn advance(&mut self) {
        if !self.playing || !self.play_requested {
            return;
        }
        if !self.engine.is_empty() {
            return;
        }
        if self.current_chapter >= self.max_chapter {
            return;
        }
        let chapter = self.current_chapter;
        self.load_into_engine(chapter);
        self.current_chapter += 1;
        self.save_progress();
        self.events.push(SessionEvent::ChapterAdvanced(chapter));
        info!(chapter, "Playback rolled into chapter");
    }

    /// Persist the current position; a no-op while no book is open. The
    /// saved chapter is the one on screen, with the offset of words already
    /// consumed from it.
    pub fn save_progress(&mut self) {
        let (Some(book), Some(source)) = (self.book.as_ref(), self.source.as_ref()) else {
            return;
        };
        let record = ProgressRecord {
            source: source.clone(),
            title: book.title().to_string(),
            chapter: self.loaded_chapter,
            word_offset: self.engine.consumed(),
            wpm: self.engine.wpm(),
        };
        self.store.save(&record);
    }

    /// Take all notifications queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_open(&self) -> bool {
        self.book.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The end of the book: the cursor has passed the last chapter and its
    /// words are spent. Not an error; playback just stops producing words.
    pub fn is_finished(&self) -> bool {
        self.book.is_some() && self.current_chapter >= self.max_chapter && self.engine.is_empty()
    }

    /// Index of the chapter currently on screen.
    pub fn chapter(&self) -> usize {
        self.loaded_chapter
    }

    pub fn max_chapter(&self) -> usize {
        self.max_chapter
    }

    pub fn title(&self) -> Option<&str> {
        self.book.as_deref().map(|book| book.title())
    }

    pub fn wpm(&self) -> u32 {
        self.engine.wpm()
    }

    pub fn set_wpm(&mut self, wpm: u32) {
        self.engine.set_wpm(wpm);
    }

    pub fn word_interval(&self) -> std::time::Duration {
        self.engine.word_interval()
    }

    #[cfg(test)]
    fn remaining_words(&self) -> usize {
        self.engine.remaining()
    }
}
