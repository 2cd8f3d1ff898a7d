use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Name of the function analysis starts from.
    pub entry: String,
    /// When a stored value has no alias facts and is not an allocation site, record the value
    /// itself as the pointer's target.
    pub stored_value_surrogate: bool,
    /// Snapshot facts around every level and fail if any set shrank.
    pub verify_monotonicity: bool,
    /// Report every drained propagation edge as a diagnostic.
    pub record_steps: bool,
}

impl AnalysisConfig {
    pub fn with_entry(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            ..Self::default()
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            entry: "main".to_string(),
            stored_value_surrogate: true,
            verify_monotonicity: true,
            record_steps: false,
        }
    }
}
