use std::path::Path;

use crate::error::Result;
use crate::input::merge::{MergeAudit, merge_datasets};
use crate::input::{ParseIssue, load_dataset};
use crate::model::dataset::Dataset;

#[derive(Debug, Clone)]
pub struct Stage1Output {
    pub dataset: Dataset,
    pub parse_issues: Vec<ParseIssue>,
    pub skipped_rows: usize,
    pub merge: Option<MergeAudit>,
}

pub fn run_stage1(input: &Path, merge: Option<&Path>) -> Result<Stage1Output> {
    let primary = load_dataset(input)?;
    let Some(merge_path) = merge else {
        return Ok(Stage1Output {
            dataset: primary.dataset,
            parse_issues: primary.issues,
            skipped_rows: primary.skipped_rows,
            merge: None,
        });
    };

    let secondary = load_dataset(merge_path)?;
    let (dataset, audit) = merge_datasets(&primary.dataset, &secondary.dataset);
    let mut parse_issues = primary.issues;
    parse_issues.extend(secondary.issues);
    Ok(Stage1Output {
        dataset,
        parse_issues,
        skipped_rows: primary.skipped_rows + secondary.skipped_rows,
        merge: Some(audit),
    })
}
