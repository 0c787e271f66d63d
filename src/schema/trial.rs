use serde::{Deserialize, Serialize};

use super::condition::{FrameLabel, ListCondition};
use super::stimulus::{quoted_literal, VerbPair};

/// A single item placed in a trial slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialItem {
    Word(String),
    /// Unresolved critical verb; replaced by a `Word` once a list
    /// condition is chosen.
    Critical(VerbPair),
}

/// Ordered items for one trial, one per slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrialTemplate {
    pub items: Vec<TrialItem>,
}

impl TrialTemplate {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The first unresolved critical pair, if any.
    pub fn critical_pair(&self) -> Option<&VerbPair> {
        self.items.iter().find_map(|item| match item {
            TrialItem::Critical(pair) => Some(pair),
            TrialItem::Word(_) => None,
        })
    }

    /// Replace every critical item with its word under `condition`.
    /// Returns the original pair, or `None` when nothing was unresolved.
    pub fn resolve(&mut self, condition: ListCondition) -> Option<VerbPair> {
        let mut original = None;
        for item in &mut self.items {
            if let TrialItem::Critical(pair) = item {
                let word = pair.resolve(condition).to_string();
                if original.is_none() {
                    original = Some(pair.clone());
                }
                *item = TrialItem::Word(word);
            }
        }
        original
    }

    /// Words in slot order. Unresolved pairs render as their display form.
    pub fn words(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| match item {
                TrialItem::Word(w) => w.clone(),
                TrialItem::Critical(pair) => pair.to_string(),
            })
            .collect()
    }
}

/// One counterbalancing version: every trial template, in build order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub label: FrameLabel,
    pub trials: Vec<TrialTemplate>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

/// A flattened output row: one studied word with its trial metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub participant_id: usize,
    pub experiment_section: String,
    pub frame_condition: FrameLabel,
    pub block_num: usize,
    pub trial_num: usize,
    pub list_condition: ListCondition,
    pub crit_pair: VerbPair,
    pub crit_word: String,
    pub study_list: Vec<String>,
    pub study_position: usize,
    pub study_word: String,
}

impl ParticipantRow {
    /// Column names, in file order.
    pub const COLUMNS: [&'static str; 11] = [
        "participant_id",
        "experiment_section",
        "frame_condition",
        "block_num",
        "trial_num",
        "list_condition",
        "crit_pair",
        "crit_word",
        "study_list",
        "study_position",
        "study_word",
    ];

    /// Field values in `COLUMNS` order.
    pub fn fields(&self) -> [String; 11] {
        [
            self.participant_id.to_string(),
            self.experiment_section.clone(),
            self.frame_condition.to_string(),
            self.block_num.to_string(),
            self.trial_num.to_string(),
            self.list_condition.to_string(),
            self.crit_pair.to_string(),
            self.crit_word.clone(),
            render_list(&self.study_list),
            self.study_position.to_string(),
            self.study_word.clone(),
        ]
    }
}

fn render_list(words: &[String]) -> String {
    let quoted: Vec<String> = words.iter().map(|w| quoted_literal(w)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Every row generated for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub participant_id: usize,
    pub frame_condition: FrameLabel,
    pub rows: Vec<ParticipantRow>,
}
