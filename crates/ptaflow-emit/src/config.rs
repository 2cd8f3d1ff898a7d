use crate::output::OutputFormat;
use ptaflow_core::analysis::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub use_colors: bool,
    /// Spaces per nesting level in text output.
    pub indent: usize,
    pub format: OutputFormat,
    pub verbosity: VerbosityLevel,
}

impl EmitterConfig {
    /// Text output without escape codes, as written to files and compared in tests.
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            indent: 2,
            format: OutputFormat::Text,
            verbosity: VerbosityLevel::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl VerbosityLevel {
    /// Worklist, memory, points-to and alias sections.
    pub fn should_print_facts(&self) -> bool {
        !matches!(self, VerbosityLevel::Quiet)
    }

    /// Labels and the def-use graph.
    pub fn should_print_graph(&self) -> bool {
        matches!(self, VerbosityLevel::Verbose | VerbosityLevel::Debug)
    }

    pub fn should_print_ids(&self) -> bool {
        matches!(self, VerbosityLevel::Debug)
    }

    /// Least severe diagnostic still shown.
    pub fn min_severity(&self) -> Severity {
        match self {
            VerbosityLevel::Quiet => Severity::Warning,
            VerbosityLevel::Normal | VerbosityLevel::Verbose => Severity::Info,
            VerbosityLevel::Debug => Severity::Debug,
        }
    }
}
