use tracing::debug;
use crate::config::config::WordConfig;

/// WordAssembler turns a stream of confirmed letters into a word.
///
/// A letter held across consecutive frames is only appended once, and a long
/// pause between letters inserts a space.
#[derive(Debug, Clone)]
pub struct WordAssembler {
    config: WordConfig,
    word: String,
    last_confirmed_at: Option<f64>,
}

impl Default for WordAssembler {
    fn default() -> Self {
        WordAssembler::new(WordConfig::new())
    }
}

impl WordAssembler {
    pub fn new(config: WordConfig) -> Self {
        WordAssembler { config, word: String::new(), last_confirmed_at: None }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn last_confirmed_at(&self) -> Option<f64> {
        self.last_confirmed_at
    }

    pub fn reset(&mut self) {
        self.word.clear();
        self.last_confirmed_at = None;
    }

    /// confirm feeds one confirmed letter observed at `timestamp` seconds.
    /// Non-finite timestamps are ignored.
    ///
    /// # Returns
    /// * `bool` - whether the letter was appended
    pub fn confirm(&mut self, letter: char, timestamp: f64) -> bool {
        if !timestamp.is_finite() {
            return false
        }
        if let Some(last) = self.last_confirmed_at {
            let delta = timestamp - last;
            if delta <= self.config.letter_pause_secs {
                return false
            }
            if self.config.idle_reset_secs.is_some_and(|idle| delta > idle) {
                debug!(delta, "idle gap, starting a new word");
                self.word.clear();
            } else if delta > self.config.space_pause_secs && !self.word.is_empty() {
                self.word.push(' ');
            }
        }

        self.word.push(letter);
        self.last_confirmed_at = Some(timestamp);
        self.truncate_front();
        true
    }

    fn truncate_front(&mut self) {
        let excess = self.word.chars().count().saturating_sub(self.config.max_word_len);
        if excess > 0 {
            self.word = self.word.chars().skip(excess).collect();
            if self.word.starts_with(' ') {
                self.word.remove(0);
            }
        }
    }
}
