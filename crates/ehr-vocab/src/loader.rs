//! Vocabulary file loader.
//!
//! A vocabulary directory holds one CSV per coding standard and one CSV
//! per registered cross map:
//!
//! ```text
//! vocab/
//!   ICD9CM.csv        code,name,parent_code
//!   ICD9PROC.csv      code,name,parent_code
//!   ATC.csv           code,name
//!   NDC_to_ATC.csv    NDC,ATC
//! ```
//!
//! Header names are matched case-insensitively; a UTF-8 BOM on the first
//! header is ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

use crate::crossmap::CrossMap;
use crate::error::{Result, VocabError};
use crate::standard::CodingStandard;
use crate::vocabulary::{Concept, VocabularyMap};

/// Path of a standard's vocabulary table inside `dir`.
pub fn vocabulary_path(dir: &Path, standard: CodingStandard) -> PathBuf {
    dir.join(format!("{}.csv", standard.name()))
}

/// Path of a cross-map table inside `dir`.
pub fn cross_map_path(dir: &Path, source: CodingStandard, target: CodingStandard) -> PathBuf {
    dir.join(format!("{}_to_{}.csv", source.name(), target.name()))
}

/// Load the code-to-term table for one standard.
pub fn load_vocabulary(dir: &Path, standard: CodingStandard) -> Result<VocabularyMap> {
    ensure_dir(dir)?;
    let path = vocabulary_path(dir, standard);
    if !path.is_file() {
        return Err(VocabError::MissingStandard { standard, path });
    }

    let table = read_csv_table(&path)?;
    let code_idx = table.require("code", &path)?;
    let name_idx = table.require("name", &path)?;
    let parent_idx = table.column("parent_code");

    let mut concepts = BTreeMap::new();
    let mut skipped = 0usize;
    for row in &table.rows {
        let code = standard
            .canonical_code(field(row, code_idx))
            .into_owned();
        let name = field(row, name_idx);
        if code.is_empty() || name.is_empty() {
            skipped += 1;
            continue;
        }
        let parent = parent_idx
            .map(|idx| standard.canonical_code(field(row, idx)).into_owned())
            .filter(|parent| !parent.is_empty());
        concepts.entry(code).or_insert_with(|| Concept {
            name: name.to_string(),
            parent,
        });
    }
    debug!(
        standard = %standard,
        path = %path.display(),
        concept_count = concepts.len(),
        skipped,
        "vocabulary loaded"
    );
    Ok(VocabularyMap::from_concepts(standard, concepts))
}

/// Load the `source -> target` cross map.
pub fn load_cross_map(
    dir: &Path,
    source: CodingStandard,
    target: CodingStandard,
) -> Result<CrossMap> {
    ensure_dir(dir)?;
    let path = cross_map_path(dir, source, target);
    if !path.is_file() {
        return Err(VocabError::MissingCrossMap {
            source_standard: source,
            target,
            path,
        });
    }

    let table = read_csv_table(&path)?;
    let source_idx = table.require(source.name(), &path)?;
    let target_idx = table.require(target.name(), &path)?;
    let pairs = table
        .rows
        .iter()
        .map(|row| (field(row, source_idx), field(row, target_idx)));
    let map = CrossMap::from_pairs(source, target, pairs);
    debug!(
        source = %source,
        target = %target,
        path = %path.display(),
        mapping_count = map.len(),
        "cross map loaded"
    );
    Ok(map)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(VocabError::DirectoryNotFound {
            path: dir.to_path_buf(),
        })
    }
}

struct CsvTable {
    /// Uppercase header -> column index.
    headers: BTreeMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.get(&name.to_uppercase()).copied()
    }

    fn require(&self, name: &str, path: &Path) -> Result<usize> {
        self.column(name).ok_or_else(|| VocabError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    }
}

fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|error| match error.into_kind() {
            csv::ErrorKind::Io(source) => VocabError::io(path, source),
            kind => VocabError::Csv {
                path: path.to_path_buf(),
                message: format!("{kind:?}"),
            },
        })?;

    let mut headers = BTreeMap::new();
    for (idx, header) in reader
        .headers()
        .map_err(|error| VocabError::csv(path, &error))?
        .iter()
        .enumerate()
    {
        let key = header.trim_matches('\u{feff}').trim().to_uppercase();
        headers.entry(key).or_insert(idx);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| VocabError::csv(path, &error))?;
        rows.push(record.iter().map(|value| value.trim().to_string()).collect());
    }
    Ok(CsvTable { headers, rows })
}

fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map_or("", String::as_str)
}
