/*! Unified interface for pointer analysis over textual IR.
 *
 * Single import for the whole pipeline: parse a module, run the level-ordered points-to analysis
 * from an entry function, and print what it found.
 */

pub use ptaflow_core as core;
pub use ptaflow_emit as emit;
pub use ptaflow_parser as parser;

pub use ptaflow_core::analysis::{
    analyze, analyze_with_config, AnalysisConfig, AnalysisError, AnalysisResult, FunctionFacts,
    PointerAnalysis, Target,
};
pub use ptaflow_core::{Function, InstId, Instruction, Module, Type, Value};

pub use ptaflow_emit::{IrEmitter, ReportEmitter};

pub use ptaflow_parser::{parse, parse_module};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ptaflow_parser::ParseError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Parses `text` and analyzes it from `entry`. The module is returned alongside the result since
/// printing facts needs the values' names.
pub fn analyze_source(text: &str, entry: &str) -> Result<(Module, AnalysisResult), Error> {
    let module = parse_module(text)?;
    let result = analyze(&module, entry)?;
    Ok((module, result))
}
