//! Generic word-spritzing engine.
//!
//! Holds the word queue for whatever text it was last given and the pacing
//! derived from words-per-minute. It knows nothing about books or chapters;
//! the session feeds it text and pulls one word per tick.

use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_WPM: u32 = 500;
const MIN_WPM: u32 = 1;

pub struct SpritzEngine {
    queue: VecDeque<String>,
    total_words: usize,
    wpm: u32,
}

impl SpritzEngine {
    pub fn new(wpm: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            total_words: 0,
            wpm: wpm.max(MIN_WPM),
        }
    }

    /// Replace the queue with the words of `text`, cursor at the start.
    pub fn set_text(&mut self, text: &str) {
        self.queue = text.split_whitespace().map(String::from).collect();
        self.total_words = self.queue.len();
        debug!(words = self.total_words, "Queued new text");
    }

    pub fn set_wpm(&mut self, wpm: u32) {
        self.wpm = wpm.max(MIN_WPM);
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    /// Time one word stays on screen.
    pub fn word_interval(&self) -> Duration {
        Duration::from_millis(60_000 / u64::from(self.wpm))
    }

    /// Consume and return the next word, if any.
    pub fn next_word(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Discard words from the front until `remaining() == total - offset`,
    /// resuming playback mid-text. Offsets past the end drain the queue.
    pub fn fast_forward(&mut self, offset: usize) {
        let target = self.total_words.saturating_sub(offset);
        while self.queue.len() > target {
            self.queue.pop_front();
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    /// Words already consumed from the current text.
    pub fn consumed(&self) -> usize {
        self.total_words - self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_words_in_order() {
        let mut engine = SpritzEngine::new(DEFAULT_WPM);
        engine.set_text("one  two\nthree");
        assert_eq!(engine.total_words(), 3);
        assert_eq!(engine.next_word().as_deref(), Some("one"));
        assert_eq!(engine.next_word().as_deref(), Some("two"));
        assert_eq!(engine.next_word().as_deref(), Some("three"));
        assert_eq!(engine.next_word(), None);
    }

    #[test]
    fn tracks_consumed_against_total() {
        let mut engine = SpritzEngine::new(DEFAULT_WPM);
        engine.set_text("a b c d e");
        engine.next_word();
        engine.next_word();
        assert_eq!(engine.consumed(), 2);
        assert_eq!(engine.remaining(), 3);
    }

    #[test]
    fn fast_forward_leaves_total_minus_offset() {
        let mut engine = SpritzEngine::new(DEFAULT_WPM);
        engine.set_text("a b c d e");
        engine.fast_forward(3);
        assert_eq!(engine.remaining(), 2);
        assert_eq!(engine.next_word().as_deref(), Some("d"));
    }

    #[test]
    fn fast_forward_past_end_empties_the_queue() {
        let mut engine = SpritzEngine::new(DEFAULT_WPM);
        engine.set_text("a b");
        engine.fast_forward(10);
        assert!(engine.is_empty());
    }

    #[test]
    fn new_text_resets_the_cursor() {
        let mut engine = SpritzEngine::new(DEFAULT_WPM);
        engine.set_text("a b c");
        engine.next_word();
        engine.set_text("x y");
        assert_eq!(engine.consumed(), 0);
        assert_eq!(engine.total_words(), 2);
    }

    #[test]
    fn interval_follows_wpm() {
        let mut engine = SpritzEngine::new(500);
        assert_eq!(engine.word_interval(), Duration::from_millis(120));
        engine.set_wpm(0);
        assert_eq!(engine.wpm(), 1);
    }
}
