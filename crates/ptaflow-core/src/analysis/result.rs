use super::{
    def_use::{DefUseGraph, UseList},
    diagnostics::{Diagnostic, Severity},
    facts::{AliasMap, PointsToMap, Target},
    labels::LabelMap,
    memory::MemoryLocations,
    worklist::Worklist,
};
use crate::function::Function;
use crate::values::{InstId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything the analysis learned about one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFacts {
    pub function: String,
    pub max_level: usize,
    pub memory: MemoryLocations,
    pub labels: LabelMap,
    pub worklist: Worklist,
    pub use_list: UseList,
    pub def_use: DefUseGraph,
    pub points_to: PointsToMap,
    pub aliases: AliasMap,
    pub steps: usize,
}

impl FunctionFacts {
    pub fn points_to_at(&self, context: InstId, value: Value) -> BTreeSet<Target> {
        self.points_to.at(context, value)
    }

    pub fn aliases_at(&self, context: InstId, value: Value) -> BTreeSet<Value> {
        self.aliases.at(context, value)
    }

    /// Printable form of a target, naming the allocation behind a location.
    pub fn target_name(&self, function: &Function, target: Target) -> String {
        match target {
            Target::Location(id) => match self.memory.get(id) {
                Some(location) => {
                    format!("{}({})", id, function.value_name(Value::Inst(location.site)))
                }
                None => id.to_string(),
            },
            Target::Value(value) => function.value_name(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub entry: Option<String>,
    pub functions: IndexMap<String, FunctionFacts>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionFacts> {
        self.functions.get(name)
    }

    pub fn diagnostics_at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity() >= severity)
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics_at_least(Severity::Warning).count()
    }
}
