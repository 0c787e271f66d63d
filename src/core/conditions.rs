//! Condition assignment — near-balanced shuffled label sequences and
//! block numbering.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::schema::condition::{FrameLabel, ListCondition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("cannot assign {0} items from an empty label set")]
    NoLabels(usize),
    #[error("block count must be at least 1")]
    NoBlocks,
}

/// Shuffle the labels, repeat them until `count` is covered, truncate,
/// then shuffle again. Label counts differ by at most one.
pub fn balanced_shuffle<T: Clone>(
    count: usize,
    labels: &[T],
    rng: &mut StdRng,
) -> Result<Vec<T>, ConditionError> {
    if labels.is_empty() {
        return Err(ConditionError::NoLabels(count));
    }
    Ok(cycle_shuffle(labels.to_vec(), count, rng))
}

fn cycle_shuffle<T: Clone>(mut base: Vec<T>, count: usize, rng: &mut StdRng) -> Vec<T> {
    base.shuffle(rng);
    let mut out: Vec<T> = base.iter().cycle().take(count).cloned().collect();
    out.shuffle(rng);
    out
}

/// One list condition per trial.
pub fn generate_list_conditions(num_lists: usize, rng: &mut StdRng) -> Vec<ListCondition> {
    cycle_shuffle(ListCondition::ALL.to_vec(), num_lists, rng)
}

/// One frame per participant, drawn from `frames` (labels or the built
/// frames themselves).
pub fn generate_frame_conditions<F: Clone>(
    num_participants: usize,
    frames: &[F],
    rng: &mut StdRng,
) -> Result<Vec<F>, ConditionError> {
    balanced_shuffle(num_participants, frames, rng)
}

/// Block number for each trial position: `0..num_blocks` repeated,
/// truncated to `num_trials`, sorted ascending.
pub fn assign_blocks(num_blocks: usize, num_trials: usize) -> Result<Vec<usize>, ConditionError> {
    if num_blocks == 0 {
        return Err(ConditionError::NoBlocks);
    }
    let mut blocks: Vec<usize> = (0..num_blocks).cycle().take(num_trials).collect();
    blocks.sort_unstable();
    Ok(blocks)
}
