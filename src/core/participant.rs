//! Participant materializer — resolve critical verbs, attach block and
//! condition labels, flatten to one row per studied word, write TSV.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::conditions::{assign_blocks, ConditionError};
use crate::schema::condition::{FrameLabel, ListCondition};
use crate::schema::trial::{ParticipantRecord, ParticipantRow, TrialTemplate};

/// Section label written to every presentation row.
pub const PRESENTATION_SECTION: &str = "presentation";

#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error("{trials} trials but {conditions} list conditions")]
    ConditionCountMismatch { trials: usize, conditions: usize },
    #[error("trial {0} has no critical verb to resolve")]
    NoCriticalItem(usize),
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// File name for a participant's trial structure.
pub fn participant_file_name(participant_id: usize) -> String {
    format!("trial_structure_participant_{}.tsv", participant_id)
}

/// Flatten an already copied and shuffled frame into rows.
///
/// `trials[i]` is presented at position `i` with `list_conditions[i]`.
/// Block numbers follow position, not trial identity.
pub fn generate_participant(
    mut trials: Vec<TrialTemplate>,
    frame_condition: &FrameLabel,
    list_conditions: &[ListCondition],
    num_blocks: usize,
    participant_id: usize,
) -> Result<ParticipantRecord, ParticipantError> {
    if trials.len() != list_conditions.len() {
        return Err(ParticipantError::ConditionCountMismatch {
            trials: trials.len(),
            conditions: list_conditions.len(),
        });
    }

    let blocks = assign_blocks(num_blocks, trials.len())?;
    let slots = trials.first().map_or(0, TrialTemplate::len);
    let mut rows = Vec::with_capacity(trials.len() * slots);

    for (trial_num, (trial, &condition)) in trials.iter_mut().zip(list_conditions).enumerate() {
        let crit_pair = trial
            .resolve(condition)
            .ok_or(ParticipantError::NoCriticalItem(trial_num))?;
        let crit_word = crit_pair.resolve(condition).to_string();
        let study_list = trial.words();

        for (study_position, study_word) in study_list.iter().enumerate() {
            rows.push(ParticipantRow {
                participant_id,
                experiment_section: PRESENTATION_SECTION.to_string(),
                frame_condition: frame_condition.clone(),
                block_num: blocks[trial_num],
                trial_num,
                list_condition: condition,
                crit_pair: crit_pair.clone(),
                crit_word: crit_word.clone(),
                study_list: study_list.clone(),
                study_position,
                study_word: study_word.clone(),
            });
        }
    }

    Ok(ParticipantRecord {
        participant_id,
        frame_condition: frame_condition.clone(),
        rows,
    })
}

/// Write `rows` as tab-separated text with a header line.
///
/// Cells holding a tab, quote or line break are quoted, so every line
/// reads back as exactly `COLUMNS.len()` fields.
pub fn write_rows<W: Write>(out: W, rows: &[ParticipantRow]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(ParticipantRow::COLUMNS)?;
    for row in rows {
        writer.write_record(row.fields())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a participant file under `dir`, creating `dir` if needed.
/// Returns the written path.
pub fn write_participant(
    record: &ParticipantRecord,
    dir: &Path,
) -> Result<PathBuf, ParticipantError> {
    fs::create_dir_all(dir).map_err(|source| ParticipantError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(participant_file_name(record.participant_id));
    let file = fs::File::create(&path).map_err(|source| ParticipantError::Io {
        path: path.clone(),
        source,
    })?;
    write_rows(file, &record.rows).map_err(|source| ParticipantError::Csv {
        path: path.clone(),
        source,
    })?;

    debug!(
        participant = record.participant_id,
        rows = record.rows.len(),
        path = %path.display(),
        "wrote participant file"
    );
    Ok(path)
}
