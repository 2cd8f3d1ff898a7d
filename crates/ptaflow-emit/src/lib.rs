/*! Turn modules and analysis results into readable output.
 *
 * Points-to facts are only useful if someone can read them. These emitters print the program the
 * analysis ran over and a sectioned report of what it found, either as colored text for a terminal
 * or as JSON for other tools.
 */

pub mod config;
pub mod emitter;
pub mod ir_emitter;
pub mod output;
pub mod report_emitter;

pub use config::{EmitterConfig, VerbosityLevel};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter, Tone};
pub use ir_emitter::IrEmitter;
pub use output::OutputFormat;
pub use report_emitter::ReportEmitter;
