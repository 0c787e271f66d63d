//! Experiment configuration, loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::loader::StimulusSources;
use crate::schema::condition::FrameLabel;
use crate::schema::stimulus::{Slot, UnknownSlotTag};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error(transparent)]
    SlotTag(#[from] UnknownSlotTag),
}

/// Everything needed for one generation run. Missing fields in a RON
/// file fall back to the defaults of the original experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub seed: u64,
    pub num_participants: usize,
    pub num_blocks: usize,
    /// Slot tags, e.g. `["ADJ", "AN", "CRIT", "ADJ", "AN", "IN"]`.
    pub trial_slot_order: Vec<String>,
    pub frame_labels: Vec<FrameLabel>,
    pub output_dir: PathBuf,
    pub stimuli: StimulusSources,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 9,
            num_participants: 300,
            num_blocks: 4,
            trial_slot_order: Slot::default_order()
                .iter()
                .map(|s| s.tag().to_string())
                .collect(),
            frame_labels: vec![FrameLabel::from("a"), FrameLabel::from("b")],
            output_dir: PathBuf::from("participants_trial_info"),
            stimuli: StimulusSources::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load a config from a RON file. Relative stimulus paths are resolved
    /// against the file's directory.
    pub fn load_from_ron(path: &Path) -> Result<ExperimentConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse_ron(&contents)?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.stimuli = config.stimuli.rebased(base);
        }
        Ok(config)
    }

    pub fn parse_ron(input: &str) -> Result<ExperimentConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    pub fn slot_order(&self) -> Result<Vec<Slot>, ConfigError> {
        Ok(Slot::parse_order(&self.trial_slot_order)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_experiment() {
        let c = ExperimentConfig::default();
        assert_eq!(c.seed, 9);
        assert_eq!(c.num_participants, 300);
        assert_eq!(c.num_blocks, 4);
        assert_eq!(c.slot_order().unwrap(), Slot::default_order());
        assert_eq!(c.output_dir, PathBuf::from("participants_trial_info"));
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let c = ExperimentConfig::parse_ron("(seed: 42, num_participants: 10)").unwrap();
        assert_eq!(c.seed, 42);
        assert_eq!(c.num_participants, 10);
        assert_eq!(c.num_blocks, 4);
        assert_eq!(c.stimuli.critical_verbs.intransitive_column, "verb_intransitive");
    }

    #[test]
    fn custom_columns_from_ron() {
        let c = ExperimentConfig::parse_ron(
            r#"(
                trial_slot_order: ["AN", "CRIT", "IN"],
                stimuli: (
                    animate_nouns: (path: "an.tsv", column: "noun"),
                    inanimate_nouns: (path: "in.csv"),
                    adjectives: (path: "adj.csv"),
                    critical_verbs: (path: "v.csv", intransitive_column: "intr"),
                ),
            )"#,
        )
        .unwrap();
        assert_eq!(c.slot_order().unwrap().len(), 3);
        assert_eq!(c.stimuli.animate_nouns.column, "noun");
        assert_eq!(c.stimuli.inanimate_nouns.column, "word");
        assert_eq!(c.stimuli.critical_verbs.intransitive_column, "intr");
        assert_eq!(c.stimuli.critical_verbs.ditransitive_column, "verb_ditransitive");
    }

    #[test]
    fn bad_slot_tag_error() {
        let c = ExperimentConfig::parse_ron(r#"(trial_slot_order: ["ADJ", "NOUN"])"#).unwrap();
        assert!(matches!(c.slot_order(), Err(ConfigError::SlotTag(_))));
    }

    #[test]
    fn ron_round_trip() {
        let c = ExperimentConfig::default();
        let text = ron::to_string(&c).unwrap();
        assert_eq!(ExperimentConfig::parse_ron(&text).unwrap(), c);
    }
}
