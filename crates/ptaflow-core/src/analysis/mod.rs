/*! Level-ordered points-to and alias analysis.
 *
 * Allocations are bucketed by how many pointer layers their type carries, loads and stores are
 * labelled with the values they define and use, and a def-use graph links each definition of a
 * tracked pointer to its consumers. Facts then flow along that graph, deepest indirection level
 * first, until nothing changes.
 */

pub mod config;
pub mod def_use;
pub mod diagnostics;
pub mod driver;
pub mod facts;
pub mod labels;
pub mod level;
pub mod memory;
pub mod propagate;
pub mod result;
pub mod session;
pub mod worklist;

pub use config::AnalysisConfig;
pub use def_use::{reaching_definitions, DefUseEdge, DefUseGraph, UseList};
pub use diagnostics::{Diagnostic, DiagnosticSink, NullSink, Severity, TracingSink};
pub use driver::{analyze, analyze_with_config, PointerAnalysis};
pub use facts::{AliasMap, FactKind, FactMap, PointsToMap, Target};
pub use labels::{Label, LabelKind, LabelMap};
pub use level::{classify, pointer_level};
pub use memory::{LocationId, MemoryLocation, MemoryLocations};
pub use propagate::PropagationEdge;
pub use result::{AnalysisResult, FunctionFacts};
pub use session::AnalysisSession;
pub use worklist::Worklist;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("entry function not found: @{name}")]
    EntryNotFound { name: String },
    #[error("@{name} is a declaration and has no body to analyze")]
    NotADefinition { name: String },
    #[error("{kind} facts for {value} at {context} in @{function} shrank between propagation steps")]
    MonotonicityViolation {
        function: String,
        context: String,
        value: String,
        kind: FactKind,
    },
}
