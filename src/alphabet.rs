//! Branching alphabet
//!
//! The set of characters appended to a confirmed prefix when it is branched. Characters
//! are kept sorted and unique so that children are produced in a stable order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const DIGITS: &str = "0123456789";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
const WHITESPACE: &str = " \t\n\r\x0b\x0c";

/// Characters dropped from the `printable` preset because pattern languages treat them
/// as wildcards.
pub const PRINTABLE_EXCLUDED: &[char] = &['?', '%'];

/// Named character sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphabetPreset {
    /// Digits, letters, punctuation and whitespace, minus `?` and `%`.
    #[default]
    Printable,
    Lowercase,
    Alphanumeric,
    Hex,
}

impl AlphabetPreset {
    fn chars(self) -> Vec<char> {
        match self {
            AlphabetPreset::Printable => [DIGITS, LOWERCASE, UPPERCASE, PUNCTUATION, WHITESPACE]
                .iter()
                .flat_map(|s| s.chars())
                .filter(|c| !PRINTABLE_EXCLUDED.contains(c))
                .collect(),
            AlphabetPreset::Lowercase => LOWERCASE.chars().collect(),
            AlphabetPreset::Alphanumeric => [DIGITS, LOWERCASE, UPPERCASE]
                .iter()
                .flat_map(|s| s.chars())
                .collect(),
            AlphabetPreset::Hex => DIGITS.chars().chain("abcdef".chars()).collect(),
        }
    }
}

/// Alphabet section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphabetConfig {
    /// Base character set, ignored when `chars` is set
    #[serde(default)]
    pub preset: AlphabetPreset,

    /// Explicit characters; overrides `preset`
    #[serde(default)]
    pub chars: Option<String>,

    /// Characters removed from the base set
    #[serde(default)]
    pub exclude: String,
}

impl Default for AlphabetConfig {
    fn default() -> Self {
        Self {
            preset: AlphabetPreset::default(),
            chars: None,
            exclude: String::new(),
        }
    }
}

impl AlphabetConfig {
    pub fn build(&self) -> Alphabet {
        let base = match &self.chars {
            Some(chars) => Alphabet::from_chars(chars.chars()),
            None => Alphabet::preset(self.preset),
        };
        base.without(self.exclude.chars())
    }
}

/// Ordered, de-duplicated branching characters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        let set: BTreeSet<char> = chars.into_iter().collect();
        Self {
            chars: set.into_iter().collect(),
        }
    }

    pub fn preset(preset: AlphabetPreset) -> Self {
        Self::from_chars(preset.chars())
    }

    /// The default branching alphabet (`printable`).
    pub fn printable() -> Self {
        Self::preset(AlphabetPreset::Printable)
    }

    pub fn lowercase() -> Self {
        Self::preset(AlphabetPreset::Lowercase)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// This alphabet with every character of `excluded` removed.
    pub fn without(self, excluded: impl IntoIterator<Item = char>) -> Self {
        let excluded: BTreeSet<char> = excluded.into_iter().collect();
        Self {
            chars: self
                .chars
                .into_iter()
                .filter(|c| !excluded.contains(c))
                .collect(),
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.binary_search(&ch).is_ok()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

impl FromIterator<char> for Alphabet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self::from_chars(iter)
    }
}

impl From<&str> for Alphabet {
    fn from(chars: &str) -> Self {
        Self::from_chars(chars.chars())
    }
}
