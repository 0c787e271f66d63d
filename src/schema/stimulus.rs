use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::condition::ListCondition;

/// Plain-word stimulus categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordCategory {
    /// "ADJ"
    Adjective,
    /// "AN"
    AnimateNoun,
    /// "IN"
    InanimateNoun,
}

impl WordCategory {
    /// Pool shuffle order when a frame is built.
    pub const SHUFFLE_ORDER: [WordCategory; 3] = [
        WordCategory::AnimateNoun,
        WordCategory::InanimateNoun,
        WordCategory::Adjective,
    ];

    /// Returns the short tag for this category (e.g., "ADJ").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Adjective => "ADJ",
            Self::AnimateNoun => "AN",
            Self::InanimateNoun => "IN",
        }
    }
}

/// One position in a trial template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Word(WordCategory),
    /// The critical verb slot, filled with a `VerbPair`.
    Critical,
}

impl Slot {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Word(category) => category.tag(),
            Self::Critical => "CRIT",
        }
    }

    /// The slot order used by the original experiment: ADJ AN CRIT ADJ AN IN.
    pub fn default_order() -> Vec<Slot> {
        vec![
            Slot::Word(WordCategory::Adjective),
            Slot::Word(WordCategory::AnimateNoun),
            Slot::Critical,
            Slot::Word(WordCategory::Adjective),
            Slot::Word(WordCategory::AnimateNoun),
            Slot::Word(WordCategory::InanimateNoun),
        ]
    }

    /// Parse a slice of tags like `["ADJ", "AN", "CRIT"]`.
    pub fn parse_order<S: AsRef<str>>(tags: &[S]) -> Result<Vec<Slot>, UnknownSlotTag> {
        tags.iter().map(|t| t.as_ref().parse()).collect()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown slot tag '{0}' (expected ADJ, AN, IN or CRIT)")]
pub struct UnknownSlotTag(pub String);

impl FromStr for Slot {
    type Err = UnknownSlotTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ADJ" => Ok(Slot::Word(WordCategory::Adjective)),
            "AN" => Ok(Slot::Word(WordCategory::AnimateNoun)),
            "IN" => Ok(Slot::Word(WordCategory::InanimateNoun)),
            "CRIT" => Ok(Slot::Critical),
            other => Err(UnknownSlotTag(other.to_string())),
        }
    }
}

/// A critical verb in both transitivity variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerbPair {
    pub intransitive: String,
    pub ditransitive: String,
}

impl VerbPair {
    pub fn new(intransitive: impl Into<String>, ditransitive: impl Into<String>) -> Self {
        Self {
            intransitive: intransitive.into(),
            ditransitive: ditransitive.into(),
        }
    }

    /// The verb form shown under `condition`.
    pub fn resolve(&self, condition: ListCondition) -> &str {
        match condition {
            ListCondition::Intransitive => &self.intransitive,
            ListCondition::Ditransitive => &self.ditransitive,
        }
    }
}

impl fmt::Display for VerbPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'intransitive': {}, 'ditransitive': {}}}",
            quoted_literal(&self.intransitive),
            quoted_literal(&self.ditransitive)
        )
    }
}

/// Render `s` as a quoted string literal, the form analysis scripts read
/// back from `crit_pair` and `study_list` cells.
///
/// Single quotes unless `s` holds a `'` and no `"`. Backslashes, the
/// chosen quote and control characters are escaped.
pub fn quoted_literal(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// All stimulus pools for one experiment.
///
/// Word pools are keyed by category; critical verbs live in their own
/// sequence. Cloning gives a fully independent copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimulusPools {
    words: FxHashMap<WordCategory, Vec<String>>,
    pub critical: Vec<VerbPair>,
}

impl StimulusPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for a word pool.
    pub fn with_words<I, S>(mut self, category: WordCategory, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_words(category, words.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_critical(mut self, pairs: Vec<VerbPair>) -> Self {
        self.critical = pairs;
        self
    }

    pub fn set_words(&mut self, category: WordCategory, words: Vec<String>) {
        self.words.insert(category, words);
    }

    /// Words for `category`; empty if the pool was never set.
    pub fn words(&self, category: WordCategory) -> &[String] {
        self.words.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn words_mut(&mut self, category: WordCategory) -> &mut Vec<String> {
        self.words.entry(category).or_default()
    }

    /// Number of items remaining for a slot's pool.
    pub fn remaining(&self, slot: Slot) -> usize {
        match slot {
            Slot::Word(category) => self.words(category).len(),
            Slot::Critical => self.critical.len(),
        }
    }
}
