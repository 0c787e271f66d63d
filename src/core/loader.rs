//! Stimulus loader: delimited tables with named columns → typed pools.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::schema::stimulus::{StimulusPools, VerbPair, WordCategory};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} is empty (no header row)")]
    EmptyTable { path: PathBuf },
    #[error("{path} has no column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{path} line {line}: row has {found} fields, column '{column}' needs {needed}")]
    ShortRow {
        path: PathBuf,
        line: usize,
        column: String,
        found: usize,
        needed: usize,
    },
}

/// Column naming for a plain word table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTable {
    pub path: PathBuf,
    #[serde(default = "default_word_column")]
    pub column: String,
}

impl WordTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            column: default_word_column(),
        }
    }
}

/// Column naming for the paired critical verb table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbTable {
    pub path: PathBuf,
    #[serde(default = "default_intransitive_column")]
    pub intransitive_column: String,
    #[serde(default = "default_ditransitive_column")]
    pub ditransitive_column: String,
}

impl VerbTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            intransitive_column: default_intransitive_column(),
            ditransitive_column: default_ditransitive_column(),
        }
    }
}

fn default_word_column() -> String {
    "word".to_string()
}

fn default_intransitive_column() -> String {
    "verb_intransitive".to_string()
}

fn default_ditransitive_column() -> String {
    "verb_ditransitive".to_string()
}

/// Where each stimulus pool is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusSources {
    pub animate_nouns: WordTable,
    pub inanimate_nouns: WordTable,
    pub adjectives: WordTable,
    pub critical_verbs: VerbTable,
}

impl Default for StimulusSources {
    fn default() -> Self {
        Self::in_dir(Path::new("stimuli"))
    }
}

impl StimulusSources {
    /// The standard file names under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            animate_nouns: WordTable::new(dir.join("animate_nouns.csv")),
            inanimate_nouns: WordTable::new(dir.join("inanimate_nouns.csv")),
            adjectives: WordTable::new(dir.join("adjectives.csv")),
            critical_verbs: VerbTable::new(dir.join("critical_verbs.csv")),
        }
    }

    /// Resolve relative table paths against `base`.
    pub fn rebased(mut self, base: &Path) -> Self {
        for path in [
            &mut self.animate_nouns.path,
            &mut self.inanimate_nouns.path,
            &mut self.adjectives.path,
            &mut self.critical_verbs.path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// An in-memory delimited table.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    /// Read a table from disk. `.tsv` files split on tabs, everything
    /// else on commas.
    pub fn read(path: &Path) -> Result<Table, LoaderError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let delimiter = if path.extension().and_then(|s| s.to_str()) == Some("tsv") {
            b'\t'
        } else {
            b','
        };
        Self::parse(path, &contents, delimiter)
    }

    /// Parse table text. `path` is only used in error messages.
    ///
    /// Quoted fields may contain the delimiter, doubled quotes and line
    /// breaks. A leading UTF-8 byte order mark is ignored.
    pub fn parse(path: &Path, contents: &str, delimiter: u8) -> Result<Table, LoaderError> {
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
        let csv_err = |source| LoaderError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let header: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();
        if header.iter().all(String::is_empty) {
            return Err(LoaderError::EmptyTable {
                path: path.to_path_buf(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            rows.push((line, record.iter().map(str::to_string).collect()));
        }

        Ok(Table {
            path: path.to_path_buf(),
            header,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Result<usize, LoaderError> {
        self.header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LoaderError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })
    }

    /// All values of `column`, in row order.
    pub fn column(&self, column: &str) -> Result<Vec<String>, LoaderError> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .map(|(line, fields)| {
                fields
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| LoaderError::ShortRow {
                        path: self.path.clone(),
                        line: *line,
                        column: column.to_string(),
                        found: fields.len(),
                        needed: idx + 1,
                    })
            })
            .collect()
    }
}

/// Read one named column from a delimited table.
pub fn read_column(path: &Path, column: &str) -> Result<Vec<String>, LoaderError> {
    Table::read(path)?.column(column)
}

/// Read paired verb columns, zipped row by row.
pub fn read_verb_pairs(
    path: &Path,
    intransitive_column: &str,
    ditransitive_column: &str,
) -> Result<Vec<VerbPair>, LoaderError> {
    let table = Table::read(path)?;
    let intransitives = table.column(intransitive_column)?;
    let ditransitives = table.column(ditransitive_column)?;
    Ok(intransitives
        .into_iter()
        .zip(ditransitives)
        .map(|(i, d)| VerbPair::new(i, d))
        .collect())
}

/// Load all four pools. Row counts are not cross-checked here; see
/// `frame::check_capacity`.
pub fn load_pools(sources: &StimulusSources) -> Result<StimulusPools, LoaderError> {
    let mut pools = StimulusPools::new();

    for (category, table) in [
        (WordCategory::AnimateNoun, &sources.animate_nouns),
        (WordCategory::InanimateNoun, &sources.inanimate_nouns),
        (WordCategory::Adjective, &sources.adjectives),
    ] {
        let words = read_column(&table.path, &table.column)?;
        debug!(
            category = category.tag(),
            path = %table.path.display(),
            count = words.len(),
            "loaded word pool"
        );
        pools.set_words(category, words);
    }

    let verbs = &sources.critical_verbs;
    pools.critical = read_verb_pairs(
        &verbs.path,
        &verbs.intransitive_column,
        &verbs.ditransitive_column,
    )?;
    debug!(
        path = %verbs.path.display(),
        count = pools.critical.len(),
        "loaded critical verb pairs"
    );

    Ok(pools)
}
