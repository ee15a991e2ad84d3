use std::collections::HashMap;

use crate::error::{QcError, Result};
use crate::model::dataset::{LabelScheme, Protein};

pub const FUSED_SEPARATOR: char = '|';

/// Maps one raw header to a protein identity. `None` for blank headers.
pub fn protein_from_header(header: &str) -> Option<Protein> {
    let trimmed = header.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some((left, right)) = trimmed.split_once(FUSED_SEPARATOR) {
        let left = left.trim();
        let right = right.trim();
        if !left.is_empty() && !right.is_empty() {
            return Some(Protein {
                name: format!("{left}_{right}"),
                scheme: LabelScheme::Fused,
                source_header: header.to_string(),
            });
        }
        // A dangling separator still names a single-source protein.
        let single = if left.is_empty() { right } else { left };
        return Some(Protein {
            name: single.to_string(),
            scheme: LabelScheme::Af,
            source_header: header.to_string(),
        });
    }
    Some(Protein {
        name: trimmed.to_string(),
        scheme: LabelScheme::Af,
        source_header: header.to_string(),
    })
}

/// Protein columns of a header row as `(column index, protein)`, skipping the
/// identifier columns. Duplicate protein names are rejected.
pub fn extract_proteins(headers: &[String], id_columns: &[usize]) -> Result<Vec<(usize, Protein)>> {
    let mut out = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if id_columns.contains(&idx) {
            continue;
        }
        let Some(protein) = protein_from_header(header) else {
            tracing::warn!(column = idx, "blank protein header; skipping column");
            continue;
        };
        if let Some(first) = seen.get(&protein.name) {
            return Err(QcError::DuplicateProtein {
                name: protein.name.clone(),
                first: first.clone(),
                second: header.clone(),
            });
        }
        seen.insert(protein.name.clone(), header.clone());
        out.push((idx, protein));
    }
    let fused = out
        .iter()
        .filter(|(_, p)| p.scheme == LabelScheme::Fused)
        .count();
    tracing::debug!(af = out.len() - fused, fused, "protein labels extracted");
    Ok(out)
}
