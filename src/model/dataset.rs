use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelScheme {
    /// Simple label taken from a single source column.
    Af,
    /// Composite ID built from two source columns.
    Fused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protein {
    pub name: String,
    pub scheme: LabelScheme,
    pub source_header: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey {
    pub patient_id: String,
    pub timepoint: String,
}

/// Column-major patient × timepoint × protein table. `columns[p][r]` is the value
/// of protein `p` in record `r`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub samples: Vec<SampleKey>,
    pub proteins: Vec<Protein>,
    pub columns: Vec<Vec<Option<f64>>>,
}

impl Dataset {
    pub fn n_records(&self) -> usize {
        self.samples.len()
    }

    pub fn n_proteins(&self) -> usize {
        self.proteins.len()
    }

    pub fn n_patients(&self) -> usize {
        self.samples
            .iter()
            .map(|s| s.patient_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn n_timepoints(&self) -> usize {
        self.samples
            .iter()
            .map(|s| s.timepoint.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn column(&self, protein: usize) -> &[Option<f64>] {
        &self.columns[protein]
    }

    pub fn protein_index(&self, name: &str) -> Option<usize> {
        self.proteins.iter().position(|p| p.name == name)
    }

    pub fn count_scheme(&self, scheme: LabelScheme) -> usize {
        self.proteins.iter().filter(|p| p.scheme == scheme).count()
    }
}
