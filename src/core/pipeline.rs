//! The generation pipeline: pools → frames → per-participant files.
//!
//! All randomness flows through one seeded `StdRng`, consumed in a fixed
//! order: frames in label order, then the frame-condition batch, then
//! per participant a trial shuffle followed by list conditions.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ExperimentConfig;
use crate::core::conditions::{generate_frame_conditions, generate_list_conditions, ConditionError};
use crate::core::frame::{check_capacity, generate_list_frame, validate_slot_order, FrameError};
use crate::core::loader::{load_pools, LoaderError, StimulusSources};
use crate::core::participant::{generate_participant, write_participant, ParticipantError};
use crate::schema::condition::FrameLabel;
use crate::schema::stimulus::{Slot, StimulusPools, WordCategory};
use crate::schema::trial::{Frame, ParticipantRecord};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("loading stimuli: {0}")]
    Load(#[from] LoaderError),
    #[error("invalid slot order: {0}")]
    SlotOrder(FrameError),
    #[error("{category:?} pool has {available} items but {required} are needed")]
    InsufficientPool {
        category: WordCategory,
        available: usize,
        required: usize,
    },
    #[error("no frame labels configured")]
    NoFrames,
    #[error("frame label '{0}' is listed more than once")]
    DuplicateFrameLabel(FrameLabel),
    #[error("building frame '{label}': {source}")]
    Frame {
        label: FrameLabel,
        #[source]
        source: FrameError,
    },
    #[error("assigning conditions: {0}")]
    Condition(#[from] ConditionError),
    #[error("participant {id}: {source}")]
    Participant {
        id: usize,
        #[source]
        source: ParticipantError,
    },
    #[error("no stimulus pools or sources given")]
    NoStimuli,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub files: Vec<PathBuf>,
    pub trials_per_participant: usize,
    pub participants_per_frame: FxHashMap<FrameLabel, usize>,
}

/// Drives list generation. Built via `StimulusGenerator::builder()`.
pub struct StimulusGenerator {
    pools: StimulusPools,
    frame_labels: Vec<FrameLabel>,
    slot_order: Vec<Slot>,
    num_participants: usize,
    num_blocks: usize,
    output_dir: PathBuf,
    rng: StdRng,
    seed: u64,
}

/// Builder for constructing a `StimulusGenerator`.
pub struct StimulusGeneratorBuilder {
    seed: u64,
    num_participants: usize,
    num_blocks: usize,
    slot_order: Vec<Slot>,
    frame_labels: Vec<FrameLabel>,
    output_dir: PathBuf,
    sources: Option<StimulusSources>,
    /// Directly provided pools (for testing without files).
    pools: Option<StimulusPools>,
}

impl StimulusGenerator {
    pub fn builder() -> StimulusGeneratorBuilder {
        let defaults = ExperimentConfig::default();
        StimulusGeneratorBuilder {
            seed: defaults.seed,
            num_participants: defaults.num_participants,
            num_blocks: defaults.num_blocks,
            slot_order: Slot::default_order(),
            frame_labels: defaults.frame_labels,
            output_dir: defaults.output_dir,
            sources: None,
            pools: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn pools(&self) -> &StimulusPools {
        &self.pools
    }

    /// Build one frame per label, in label order.
    pub fn build_frames(&mut self) -> Result<Vec<Frame>, PipelineError> {
        self.frame_labels
            .clone()
            .into_iter()
            .map(|label| {
                generate_list_frame(label.clone(), &self.pools, &self.slot_order, &mut self.rng)
                    .map_err(|source| PipelineError::Frame { label, source })
            })
            .collect()
    }

    /// Produce every participant's record without touching the filesystem.
    pub fn generate_records(&mut self) -> Result<Vec<ParticipantRecord>, PipelineError> {
        let frames = self.build_frames()?;
        let frame_refs: Vec<&Frame> = frames.iter().collect();
        let assignments =
            generate_frame_conditions(self.num_participants, &frame_refs, &mut self.rng)?;

        let mut records = Vec::with_capacity(self.num_participants);
        for (id, frame) in assignments.into_iter().enumerate() {
            let label = &frame.label;
            let mut trials = frame.trials.clone();
            trials.shuffle(&mut self.rng);
            let list_conditions = generate_list_conditions(trials.len(), &mut self.rng);

            let record =
                generate_participant(trials, label, &list_conditions, self.num_blocks, id)
                    .map_err(|source| PipelineError::Participant { id, source })?;
            debug!(participant = id, frame = %label, rows = record.rows.len(), "generated participant");
            records.push(record);
        }
        Ok(records)
    }

    /// Generate all participants and write one file each. Stops at the
    /// first failure.
    pub fn run(&mut self) -> Result<GenerationReport, PipelineError> {
        info!(
            seed = self.seed,
            participants = self.num_participants,
            trials = self.pools.critical.len(),
            output_dir = %self.output_dir.display(),
            "generating participant lists"
        );

        let records = self.generate_records()?;

        let mut report = GenerationReport {
            trials_per_participant: self.pools.critical.len(),
            ..GenerationReport::default()
        };
        for record in &records {
            let path = write_participant(record, &self.output_dir).map_err(|source| {
                PipelineError::Participant {
                    id: record.participant_id,
                    source,
                }
            })?;
            report.files.push(path);
            *report
                .participants_per_frame
                .entry(record.frame_condition.clone())
                .or_default() += 1;
        }

        info!(files = report.files.len(), "finished writing participant lists");
        Ok(report)
    }
}

impl StimulusGeneratorBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn num_participants(mut self, n: usize) -> Self {
        self.num_participants = n;
        self
    }

    pub fn num_blocks(mut self, n: usize) -> Self {
        self.num_blocks = n;
        self
    }

    pub fn slot_order(mut self, order: Vec<Slot>) -> Self {
        self.slot_order = order;
        self
    }

    pub fn frame_labels(mut self, labels: Vec<FrameLabel>) -> Self {
        self.frame_labels = labels;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn sources(mut self, sources: StimulusSources) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Provide pools directly (for testing without files).
    pub fn with_pools(mut self, pools: StimulusPools) -> Self {
        self.pools = Some(pools);
        self
    }

    /// Apply every setting from a loaded config. Slot tags must already be
    /// valid.
    pub fn from_config(config: &ExperimentConfig) -> Result<Self, crate::config::ConfigError> {
        Ok(StimulusGenerator::builder()
            .seed(config.seed)
            .num_participants(config.num_participants)
            .num_blocks(config.num_blocks)
            .slot_order(config.slot_order()?)
            .frame_labels(config.frame_labels.clone())
            .output_dir(config.output_dir.clone())
            .sources(config.stimuli.clone()))
    }

    /// Load pools and run the preflight checks. Nothing is written.
    pub fn build(self) -> Result<StimulusGenerator, PipelineError> {
        let pools = match (self.pools, &self.sources) {
            (Some(pools), _) => pools,
            (None, Some(sources)) => load_pools(sources)?,
            (None, None) => return Err(PipelineError::NoStimuli),
        };

        validate_slot_order(&self.slot_order).map_err(PipelineError::SlotOrder)?;
        if let Some(short) = check_capacity(&pools, &self.slot_order).into_iter().next() {
            return Err(PipelineError::InsufficientPool {
                category: short.category,
                available: short.available,
                required: short.required,
            });
        }
        if self.frame_labels.is_empty() {
            return Err(PipelineError::NoFrames);
        }
        let mut seen = FxHashSet::default();
        if let Some(dup) = self.frame_labels.iter().find(|l| !seen.insert(*l)) {
            return Err(PipelineError::DuplicateFrameLabel(dup.clone()));
        }
        if self.num_blocks == 0 {
            return Err(PipelineError::Condition(ConditionError::NoBlocks));
        }

        Ok(StimulusGenerator {
            pools,
            frame_labels: self.frame_labels,
            slot_order: self.slot_order,
            num_participants: self.num_participants,
            num_blocks: self.num_blocks,
            output_dir: self.output_dir,
            rng: StdRng::seed_from_u64(self.seed),
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stimulus::VerbPair;
    use crate::schema::trial::TrialItem;

    fn test_pools(trials: usize) -> StimulusPools {
        let words = |prefix: &str, n: usize| {
            (0..n).map(|i| format!("{}{}", prefix, i)).collect::<Vec<_>>()
        };
        StimulusPools::new()
            .with_words(WordCategory::Adjective, words("adj", trials * 2))
            .with_words(WordCategory::AnimateNoun, words("an", trials * 2))
            .with_words(WordCategory::InanimateNoun, words("in", trials))
            .with_critical(
                (0..trials)
                    .map(|i| VerbPair::new(format!("vi{}", i), format!("vd{}", i)))
                    .collect(),
            )
    }

    fn build(seed: u64, participants: usize) -> StimulusGenerator {
        StimulusGenerator::builder()
            .seed(seed)
            .num_participants(participants)
            .with_pools(test_pools(8))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_defaults() {
        let gen = StimulusGenerator::builder()
            .with_pools(test_pools(2))
            .build()
            .unwrap();
        assert_eq!(gen.seed(), 9);
        assert_eq!(gen.num_participants, 300);
        assert_eq!(gen.num_blocks, 4);
        assert_eq!(gen.slot_order, Slot::default_order());
    }

    #[test]
    fn records_deterministic_same_seed() {
        let a = build(9, 6).generate_records().unwrap();
        let b = build(9, 6).generate_records().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn records_differ_with_different_seed() {
        let a = build(9, 6).generate_records().unwrap();
        let found_different = (10..40).any(|seed| build(seed, 6).generate_records().unwrap() != a);
        assert!(found_different, "Expected different output with different seeds");
    }

    #[test]
    fn frames_are_built_independently() {
        let mut gen = build(9, 0);
        let frames = gen.build_frames().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].label, FrameLabel::from("a"));
        assert_eq!(frames[1].label, FrameLabel::from("b"));
        assert_eq!(frames[0].len(), 8);
        for frame in &frames {
            for trial in &frame.trials {
                assert!(matches!(trial.items[2], TrialItem::Critical(_)));
            }
        }
    }

    #[test]
    fn participants_balanced_across_frames() {
        let records = build(9, 11).generate_records().unwrap();
        let a = records
            .iter()
            .filter(|r| r.frame_condition == FrameLabel::from("a"))
            .count();
        assert!(a == 5 || a == 6, "got {} participants in frame a", a);
        for (id, record) in records.iter().enumerate() {
            assert_eq!(record.participant_id, id);
            assert_eq!(record.rows.len(), 8 * 6);
        }
    }

    #[test]
    fn insufficient_pool_rejected_before_generation() {
        let pools = test_pools(4).with_words(WordCategory::InanimateNoun, ["cup"]);
        let err = StimulusGenerator::builder()
            .with_pools(pools)
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PipelineError::InsufficientPool {
                category: WordCategory::InanimateNoun,
                available: 1,
                required: 4,
            }
        ));
    }

    #[test]
    fn duplicate_frame_labels_rejected() {
        let err = StimulusGenerator::builder()
            .with_pools(test_pools(2))
            .frame_labels(vec![
                FrameLabel::from("a"),
                FrameLabel::from("b"),
                FrameLabel::from("a"),
            ])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::DuplicateFrameLabel(ref l) if l.as_str() == "a"));
    }

    #[test]
    fn empty_frame_labels_rejected() {
        let err = StimulusGenerator::builder()
            .with_pools(test_pools(2))
            .frame_labels(Vec::new())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::NoFrames));
    }

    #[test]
    fn records_use_their_own_frame() {
        let frames = build(5, 0).build_frames().unwrap();
        let records = build(5, 10).generate_records().unwrap();

        for record in &records {
            let frame = frames
                .iter()
                .find(|f| f.label == record.frame_condition)
                .unwrap();
            let frame_words: Vec<Vec<String>> = frame
                .trials
                .iter()
                .map(|t| {
                    t.items
                        .iter()
                        .filter_map(|item| match item {
                            TrialItem::Word(w) => Some(w.clone()),
                            TrialItem::Critical(_) => None,
                        })
                        .collect()
                })
                .collect();
            for row in record.rows.iter().filter(|r| r.study_position == 0) {
                let mut fillers = row.study_list.clone();
                fillers.retain(|w| *w != row.crit_word);
                assert!(
                    frame_words.contains(&fillers),
                    "participant {} trial {} not from frame {}",
                    record.participant_id,
                    row.trial_num,
                    record.frame_condition
                );
            }
        }
    }

    #[test]
    fn missing_stimuli_rejected() {
        let err = StimulusGenerator::builder().build().err().unwrap();
        assert!(matches!(err, PipelineError::NoStimuli));
    }

    #[test]
    fn bad_slot_order_rejected() {
        let err = StimulusGenerator::builder()
            .with_pools(test_pools(2))
            .slot_order(vec![Slot::Word(WordCategory::Adjective)])
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PipelineError::SlotOrder(FrameError::CriticalSlotCount(0))
        ));
    }
}
