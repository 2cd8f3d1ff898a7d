/*! Fluent API for constructing modules programmatically.
 *
 * The builders number instructions, intern constants, and infer load result types from the
 * pointer operand so test programs and front ends do not have to do that bookkeeping by hand.
 */

pub mod function_builder;
pub mod module_builder;

pub use function_builder::FunctionBuilder;
pub use module_builder::ModuleBuilder;
