use std::collections::HashMap;

use serde::Serialize;

use crate::model::dataset::{Dataset, SampleKey};

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeAudit {
    pub overlapping_proteins: Vec<String>,
    pub added_proteins: usize,
    pub added_records: usize,
    /// Cells of overlapping proteins filled from the secondary table.
    pub filled_cells: usize,
}

/// Outer join on (patient, timepoint). Overlapping proteins keep the primary value
/// and take the secondary one only where the primary is missing. Primary records come
/// first, then secondary-only records in their original order.
pub fn merge_datasets(primary: &Dataset, secondary: &Dataset) -> (Dataset, MergeAudit) {
    let mut audit = MergeAudit::default();

    let mut samples = primary.samples.clone();
    let mut index: HashMap<&SampleKey, usize> = HashMap::new();
    for (row, key) in primary.samples.iter().enumerate() {
        index.entry(key).or_insert(row);
    }

    // Row of each secondary record in the merged table.
    let mut secondary_rows = Vec::with_capacity(secondary.n_records());
    for key in &secondary.samples {
        match index.get(key) {
            Some(&row) => secondary_rows.push(row),
            None => {
                let row = samples.len();
                samples.push(key.clone());
                index.insert(key, row);
                secondary_rows.push(row);
                audit.added_records += 1;
            }
        }
    }
    let n_rows = samples.len();

    let mut proteins = primary.proteins.clone();
    let mut columns: Vec<Vec<Option<f64>>> = primary
        .columns
        .iter()
        .map(|col| {
            let mut c = col.clone();
            c.resize(n_rows, None);
            c
        })
        .collect();

    for (p, protein) in secondary.proteins.iter().enumerate() {
        let source = secondary.column(p);
        match primary.protein_index(&protein.name) {
            Some(target) => {
                audit.overlapping_proteins.push(protein.name.clone());
                let before = columns[target].iter().flatten().count();
                for (r, value) in source.iter().enumerate() {
                    let row = secondary_rows[r];
                    if columns[target][row].is_none() {
                        columns[target][row] = *value;
                    }
                }
                let after = columns[target].iter().flatten().count();
                audit.filled_cells += after - before;
                tracing::debug!(
                    protein = %protein.name,
                    before,
                    after,
                    "merged overlapping protein"
                );
            }
            None => {
                let mut column = vec![None; n_rows];
                for (r, value) in source.iter().enumerate() {
                    let row = secondary_rows[r];
                    if column[row].is_none() {
                        column[row] = *value;
                    }
                }
                proteins.push(protein.clone());
                columns.push(column);
                audit.added_proteins += 1;
            }
        }
    }

    tracing::info!(
        overlapping = audit.overlapping_proteins.len(),
        added_proteins = audit.added_proteins,
        added_records = audit.added_records,
        filled_cells = audit.filled_cells,
        "datasets merged"
    );

    (
        Dataset {
            samples,
            proteins,
            columns,
        },
        audit,
    )
}
