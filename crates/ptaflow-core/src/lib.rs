/*! Program model and pointer analysis engine.
 *
 * Reasoning about what a pointer may reference needs a program representation in which every
 * allocation, load and store is explicit. This crate provides that model (functions, typed
 * instructions, data layout, call graph) together with the level-ordered points-to analysis that
 * runs over it.
 */

pub mod analysis;
pub mod builder;
pub mod call_graph;
pub mod format;
pub mod function;
pub mod instructions;
pub mod layout;
pub mod module;
pub mod persist;
pub mod types;
pub mod values;

pub use analysis::{analyze, AnalysisConfig, AnalysisError, AnalysisResult, PointerAnalysis};
pub use builder::{FunctionBuilder, ModuleBuilder};
pub use call_graph::{CallGraph, CallGraphNode};
pub use function::{Function, Parameter};
pub use instructions::{InstKind, Instruction, OpcodeClass};
pub use layout::DataLayout;
pub use module::Module;
pub use types::Type;
pub use values::{ConstId, Constant, InstId, ParamId, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Builder error: {0}")]
    BuilderError(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
