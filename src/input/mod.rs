use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::Serialize;

pub mod merge;
pub mod proteins;

use crate::error::{QcError, Result};
use crate::model::dataset::{Dataset, SampleKey};
use proteins::extract_proteins;

const PATIENT_HEADERS: &[&str] = &["patientid", "patient_id", "patient"];
const TIMEPOINT_HEADERS: &[&str] = &["timepoint", "time_point", "time"];
const MISSING_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "-"];

/// A cell that held text which is neither a number nor a missing-value token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseIssue {
    /// File the cell came from, as given on the command line.
    pub source: String,
    /// 1-based data row, header excluded.
    pub row: usize,
    pub column: String,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub dataset: Dataset,
    pub issues: Vec<ParseIssue>,
    pub skipped_rows: usize,
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Tab for `.tsv`/`.txt` (a trailing `.gz` is ignored), comma otherwise.
pub fn detect_delimiter(path: &Path) -> u8 {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".tsv") || name.ends_with(".txt") {
        b'\t'
    } else {
        b','
    }
}

pub fn load_dataset(path: &Path) -> Result<LoadedInput> {
    tracing::info!(path = %path.display(), "loading dataset");
    let reader = open_maybe_gz(path)?;
    let source = path.display().to_string();
    let loaded = read_table(reader, detect_delimiter(path), &source)?;
    tracing::info!(
        records = loaded.dataset.n_records(),
        proteins = loaded.dataset.n_proteins(),
        parse_issues = loaded.issues.len(),
        "dataset loaded"
    );
    Ok(loaded)
}

pub fn read_table<R: Read>(reader: R, delimiter: u8, source: &str) -> Result<LoadedInput> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let patient_col = find_column(&headers, PATIENT_HEADERS)
        .ok_or_else(|| QcError::MissingColumn("PatientID".to_string()))?;
    let timepoint_col = find_column(&headers, TIMEPOINT_HEADERS)
        .ok_or_else(|| QcError::MissingColumn("Timepoint".to_string()))?;

    let extracted = extract_proteins(&headers, &[patient_col, timepoint_col])?;
    if extracted.is_empty() {
        return Err(QcError::EmptyData("no protein columns".to_string()));
    }

    let mut samples = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); extracted.len()];
    let mut issues = Vec::new();
    let mut skipped_rows = 0usize;

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let patient = record.get(patient_col).unwrap_or("");
        if patient.is_empty() {
            tracing::warn!(row, "row has empty patient ID; skipping");
            skipped_rows += 1;
            continue;
        }
        samples.push(SampleKey {
            patient_id: patient.to_string(),
            timepoint: record.get(timepoint_col).unwrap_or("").to_string(),
        });
        for (slot, (col, protein)) in extracted.iter().enumerate() {
            let raw = record.get(*col).unwrap_or("");
            let value = match parse_cell(raw) {
                Cell::Value(v) => Some(v),
                Cell::Missing => None,
                Cell::Invalid => {
                    issues.push(ParseIssue {
                        source: source.to_string(),
                        row,
                        column: protein.source_header.clone(),
                        raw: raw.to_string(),
                    });
                    None
                }
            };
            columns[slot].push(value);
        }
    }

    if samples.is_empty() {
        return Err(QcError::EmptyData("no sample rows".to_string()));
    }
    for issue in issues.iter().take(10) {
        tracing::warn!(
            source = %issue.source,
            row = issue.row,
            column = %issue.column,
            raw = %issue.raw,
            "non-numeric cell treated as missing"
        );
    }
    if issues.len() > 10 {
        tracing::warn!(more = issues.len() - 10, "further non-numeric cells suppressed");
    }

    Ok(LoadedInput {
        dataset: Dataset {
            samples,
            proteins: extracted.into_iter().map(|(_, p)| p).collect(),
            columns,
        },
        issues,
        skipped_rows,
    })
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Value(f64),
    Missing,
    Invalid,
}

// Non-finite numbers count as missing.
fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if MISSING_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Cell::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        Ok(_) => Cell::Missing,
        Err(_) => Cell::Invalid,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
