use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityFlag {
    HighMissingness,
    HighCv,
    ManyZeros,
    ManyNegatives,
    IqrOutliers,
    ZScoreOutliers,
}

pub fn flag_order() -> &'static [QualityFlag] {
    &[
        QualityFlag::HighMissingness,
        QualityFlag::HighCv,
        QualityFlag::ManyZeros,
        QualityFlag::ManyNegatives,
        QualityFlag::IqrOutliers,
        QualityFlag::ZScoreOutliers,
    ]
}

pub fn flag_name(flag: QualityFlag) -> &'static str {
    match flag {
        QualityFlag::HighMissingness => "HIGH_MISSINGNESS",
        QualityFlag::HighCv => "HIGH_CV",
        QualityFlag::ManyZeros => "MANY_ZEROS",
        QualityFlag::ManyNegatives => "MANY_NEGATIVES",
        QualityFlag::IqrOutliers => "IQR_OUTLIERS",
        QualityFlag::ZScoreOutliers => "ZSCORE_OUTLIERS",
    }
}

pub fn flag_description(flag: QualityFlag) -> &'static str {
    match flag {
        QualityFlag::HighMissingness => "High missingness",
        QualityFlag::HighCv => "High CV",
        QualityFlag::ManyZeros => "Many zeros",
        QualityFlag::ManyNegatives => "Many negative values",
        QualityFlag::IqrOutliers => "Many IQR outliers",
        QualityFlag::ZScoreOutliers => "Many Z-score outliers",
    }
}

/// Canonical-order copy of `flags` with duplicates dropped.
pub fn ordered(flags: &[QualityFlag]) -> Vec<QualityFlag> {
    flag_order()
        .iter()
        .copied()
        .filter(|f| flags.contains(f))
        .collect()
}
