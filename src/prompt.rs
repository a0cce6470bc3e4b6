use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

pub const DEFAULT_WORD_COUNT: usize = 50;

/// Words that get a trailing comma whenever they appear as a whole word.
const PAUSE_WORDS: [&str; 4] = ["important", "different", "always", "never"];

#[derive(Debug, thiserror::Error)]
pub enum WordBankError {
    #[error("word bank {0} not found")]
    NotFound(String),

    #[error("word bank {0} is not valid utf-8")]
    NotUtf8(String),

    #[error("unable to deserialize word bank: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("word bank {0} has no words")]
    Empty(String),
}

/// A fixed list of words prompts are drawn from
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct WordBank {
    pub name: String,
    pub words: Vec<String>,
}

impl WordBank {
    /// The bundled ~100 word bank
    pub fn common() -> Result<Self, WordBankError> {
        Self::embedded("common")
    }

    pub fn embedded(name: &str) -> Result<Self, WordBankError> {
        let file = WORDS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| WordBankError::NotFound(name.to_string()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| WordBankError::NotUtf8(name.to_string()))?;

        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, WordBankError> {
        let bank: WordBank = serde_json::from_str(json)?;
        bank.validated()
    }

    pub fn from_words<S: Into<String>>(name: S, words: Vec<String>) -> Result<Self, WordBankError> {
        WordBank {
            name: name.into(),
            words,
        }
        .validated()
    }

    fn validated(self) -> Result<Self, WordBankError> {
        if self.words.is_empty() {
            return Err(WordBankError::Empty(self.name));
        }
        Ok(self)
    }
}

/// The text a user has to reproduce. Immutable once generated.
///
/// Lengths and indices count chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
    chars: Vec<char>,
}

impl Prompt {
    pub fn new<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Appends a comma to every whole-word occurrence of a pause word
pub fn add_pauses(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            if PAUSE_WORDS.contains(&word) {
                format!("{word},")
            } else {
                word.to_string()
            }
        })
        .join(" ")
}

/// Draws prompts from a word bank using an owned random source
#[derive(Debug)]
pub struct PromptGenerator {
    bank: WordBank,
    rng: StdRng,
    generated: u64,
}

impl PromptGenerator {
    pub fn new(bank: WordBank) -> Self {
        Self::with_rng(bank, StdRng::from_entropy())
    }

    pub fn with_seed(bank: WordBank, seed: u64) -> Self {
        Self::with_rng(bank, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bank: WordBank, rng: StdRng) -> Self {
        Self {
            bank,
            rng,
            generated: 0,
        }
    }

    /// Pick `word_count` words with replacement, join them and add pauses.
    /// A zero count still yields one word.
    pub fn generate(&mut self, word_count: usize) -> Prompt {
        let words = &self.bank.words;
        let rng = &mut self.rng;
        let text = (0..word_count.max(1))
            .filter_map(|_| words.choose(rng))
            .join(" ");

        self.generated += 1;
        debug!(
            bank = %self.bank.name,
            word_count,
            generated = self.generated,
            "generated prompt"
        );

        Prompt::new(add_pauses(&text))
    }

    /// Number of prompts generated so far
    pub fn generated(&self) -> u64 {
        self.generated
    }

    pub fn bank(&self) -> &WordBank {
        &self.bank
    }
}
