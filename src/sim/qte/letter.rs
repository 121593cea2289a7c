//! Letter QTE: type the word shown, one key at a time
//!
//! A wrong letter throws away all progress.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{InputEvent, Key, MiniGame, QteCore};
use crate::sim::SimRng;
use crate::tuning;

const WORDS_3: &[&str] = &["cat", "run", "zap", "hop", "fox", "key", "map", "jet"];
const WORDS_4: &[&str] = &["jump", "dash", "bolt", "fire", "maze", "gold", "wave", "claw"];
const WORDS_5: &[&str] = &["quick", "storm", "ghost", "flame", "blade", "crypt", "swift"];
const WORDS_6: &[&str] = &["dragon", "shadow", "frozen", "portal", "rocket", "spirit"];
const WORDS_7: &[&str] = &["crystal", "phantom", "lantern", "thunder", "monster"];
const WORDS_8: &[&str] = &["skeleton", "midnight", "treasure", "guardian", "electric"];

/// Candidate words of (roughly) a given length
pub fn words_for_length(len: usize) -> &'static [&'static str] {
    match len {
        0..=3 => WORDS_3,
        4 => WORDS_4,
        5 => WORDS_5,
        6 => WORDS_6,
        7 => WORDS_7,
        _ => WORDS_8,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterQte {
    pub word: String,
    /// Letters typed correctly so far
    pub typed: usize,
    pub mistakes: u32,
}

impl LetterQte {
    pub fn new(depth: i32, rng: &mut SimRng) -> Self {
        let words = words_for_length(tuning::letter_word_length(depth));
        let word = words[rng.random_range(0..words.len())];
        Self::with_word(word)
    }

    pub fn with_word(word: &str) -> Self {
        Self {
            word: word.to_ascii_lowercase(),
            typed: 0,
            mistakes: 0,
        }
    }

    /// The letter the player must press next
    pub fn next_letter(&self) -> Option<char> {
        self.word.chars().nth(self.typed)
    }
}

impl MiniGame for LetterQte {
    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore) {
        let InputEvent::KeyDown(Key::Char(c)) = *event else {
            return;
        };
        let Some(expected) = self.next_letter() else {
            return;
        };

        if c.to_ascii_lowercase() == expected {
            self.typed += 1;
            if self.typed == self.word.chars().count() {
                core.succeed();
            }
        } else {
            self.typed = 0;
            self.mistakes += 1;
        }
    }
}
