//! Frame builder — turns shuffled stimulus pools into trial templates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use crate::schema::condition::FrameLabel;
use crate::schema::stimulus::{Slot, StimulusPools, WordCategory};
use crate::schema::trial::{Frame, TrialItem, TrialTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("slot order is empty")]
    EmptySlotOrder,
    #[error("slot order needs exactly one CRIT slot, found {0}")]
    CriticalSlotCount(usize),
    #[error("{slot} pool exhausted while building trial {trial}")]
    PoolExhausted { slot: Slot, trial: usize },
}

/// A word pool too small for the requested number of trials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityShortfall {
    pub category: WordCategory,
    pub available: usize,
    pub required: usize,
}

/// Check that `slot_order` is usable for frame building.
pub fn validate_slot_order(slot_order: &[Slot]) -> Result<(), FrameError> {
    if slot_order.is_empty() {
        return Err(FrameError::EmptySlotOrder);
    }
    let crit = slot_order.iter().filter(|s| **s == Slot::Critical).count();
    if crit != 1 {
        return Err(FrameError::CriticalSlotCount(crit));
    }
    Ok(())
}

/// Every word pool that cannot cover one item per slot occurrence per
/// critical item.
pub fn check_capacity(pools: &StimulusPools, slot_order: &[Slot]) -> Vec<CapacityShortfall> {
    let trials = pools.critical.len();
    let mut shortfalls = Vec::new();
    for category in WordCategory::SHUFFLE_ORDER {
        let per_trial = slot_order
            .iter()
            .filter(|s| **s == Slot::Word(category))
            .count();
        let required = per_trial * trials;
        let available = pools.words(category).len();
        if available < required {
            shortfalls.push(CapacityShortfall {
                category,
                available,
                required,
            });
        }
    }
    shortfalls
}

/// Shuffle every pool in place, in a fixed order so draws are reproducible.
pub fn shuffle_pools(pools: &mut StimulusPools, rng: &mut StdRng) {
    for category in WordCategory::SHUFFLE_ORDER {
        pools.words_mut(category).shuffle(rng);
    }
    pools.critical.shuffle(rng);
}

/// Take one item from each slot's pool, in slot order. Each take removes
/// the last remaining item of that pool.
pub fn generate_trial_frame(
    pools: &mut StimulusPools,
    slot_order: &[Slot],
    trial: usize,
) -> Result<TrialTemplate, FrameError> {
    let mut items = Vec::with_capacity(slot_order.len());
    for &slot in slot_order {
        let item = match slot {
            Slot::Word(category) => pools.words_mut(category).pop().map(TrialItem::Word),
            Slot::Critical => pools.critical.pop().map(TrialItem::Critical),
        };
        items.push(item.ok_or(FrameError::PoolExhausted { slot, trial })?);
    }
    Ok(TrialTemplate { items })
}

/// Build one frame: copy and shuffle the pools, then build one trial per
/// critical item.
pub fn generate_list_frame(
    label: FrameLabel,
    pools: &StimulusPools,
    slot_order: &[Slot],
    rng: &mut StdRng,
) -> Result<Frame, FrameError> {
    validate_slot_order(slot_order)?;

    let mut working = pools.clone();
    shuffle_pools(&mut working, rng);

    let num_trials = pools.critical.len();
    let trials = (0..num_trials)
        .map(|trial| generate_trial_frame(&mut working, slot_order, trial))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(frame = %label, trials = trials.len(), "built frame");
    Ok(Frame { label, trials })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stimulus::VerbPair;
    use rand::SeedableRng;

    fn pools() -> StimulusPools {
        StimulusPools::new()
            .with_words(WordCategory::Adjective, ["big", "small", "red", "old"])
            .with_words(WordCategory::AnimateNoun, ["dog", "cat", "cow", "pig"])
            .with_words(WordCategory::InanimateNoun, ["cup", "box"])
            .with_critical(vec![
                VerbPair::new("ran", "gave"),
                VerbPair::new("slept", "sent"),
            ])
    }

    #[test]
    fn frame_has_one_trial_per_critical_item() {
        let mut rng = StdRng::seed_from_u64(1);
        let frame =
            generate_list_frame("a".into(), &pools(), &Slot::default_order(), &mut rng).unwrap();
        assert_eq!(frame.len(), 2);
        for trial in &frame.trials {
            assert_eq!(trial.len(), 6);
            assert!(matches!(trial.items[2], TrialItem::Critical(_)));
        }
    }

    #[test]
    fn source_pools_untouched() {
        let source = pools();
        let mut rng = StdRng::seed_from_u64(1);
        generate_list_frame("a".into(), &source, &Slot::default_order(), &mut rng).unwrap();
        assert_eq!(source, pools());
    }

    #[test]
    fn trial_frame_pops_last_item() {
        let mut p = pools();
        let t = generate_trial_frame(&mut p, &Slot::default_order(), 0).unwrap();
        assert_eq!(
            t.items,
            vec![
                TrialItem::Word("old".to_string()),
                TrialItem::Word("pig".to_string()),
                TrialItem::Critical(VerbPair::new("slept", "sent")),
                TrialItem::Word("red".to_string()),
                TrialItem::Word("cow".to_string()),
                TrialItem::Word("box".to_string()),
            ]
        );
        assert_eq!(p.words(WordCategory::Adjective).len(), 2);
    }

    #[test]
    fn exhausted_pool_fails_loudly() {
        let p = pools().with_words(WordCategory::InanimateNoun, ["cup"]);
        let mut rng = StdRng::seed_from_u64(3);
        let err =
            generate_list_frame("a".into(), &p, &Slot::default_order(), &mut rng).unwrap_err();
        assert_eq!(
            err,
            FrameError::PoolExhausted {
                slot: Slot::Word(WordCategory::InanimateNoun),
                trial: 1,
            }
        );
    }

    #[test]
    fn slot_order_needs_one_critical() {
        assert_eq!(validate_slot_order(&[]), Err(FrameError::EmptySlotOrder));
        let none = [Slot::Word(WordCategory::Adjective)];
        assert_eq!(validate_slot_order(&none), Err(FrameError::CriticalSlotCount(0)));
        let two = [Slot::Critical, Slot::Critical];
        assert_eq!(validate_slot_order(&two), Err(FrameError::CriticalSlotCount(2)));
    }

    #[test]
    fn capacity_reports_short_pools() {
        let p = pools().with_words(WordCategory::Adjective, ["big", "small", "red"]);
        let shortfalls = check_capacity(&p, &Slot::default_order());
        assert_eq!(
            shortfalls,
            vec![CapacityShortfall {
                category: WordCategory::Adjective,
                available: 3,
                required: 4,
            }]
        );
        assert!(check_capacity(&pools(), &Slot::default_order()).is_empty());
    }

    #[test]
    fn same_seed_same_frame() {
        let order = Slot::default_order();
        let a = generate_list_frame("a".into(), &pools(), &order, &mut StdRng::seed_from_u64(9));
        let b = generate_list_frame("a".into(), &pools(), &order, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.unwrap(), b.unwrap());
    }
}
