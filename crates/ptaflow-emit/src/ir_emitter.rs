use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter, Tone};
use ptaflow_core::format::{format_instruction, format_signature};
use ptaflow_core::{Function, Module};
use std::io::Write;

/// Prints a module in the textual IR syntax. Without colors or ids the output parses back to the
/// same module.
pub struct IrEmitter {
    config: EmitterConfig,
}

impl IrEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    fn emit_function<W: Write>(
        &self,
        function: &Function,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let signature = format_signature(function);
        if function.is_declaration {
            return EmitHelper::write_toned_line(writer, context, &signature, Tone::Keyword);
        }

        EmitHelper::write_toned_line(writer, context, &format!("{} {{", signature), Tone::Keyword)?;
        context.indent();
        for inst in &function.instructions {
            let mut line = format_instruction(function, inst);
            if self.config.verbosity.should_print_ids() {
                line.push_str(&Tone::Muted.paint(&format!("  ; {}", inst.id), context.use_colors));
            }
            let tone = if inst.is_allocation() {
                Tone::Location
            } else {
                Tone::Plain
            };
            EmitHelper::write_toned_line(writer, context, &line, tone)?;
        }
        context.dedent();
        EmitHelper::write_toned_line(writer, context, "}", Tone::Keyword)
    }
}

impl Default for IrEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::plain())
    }
}

impl Emitter for IrEmitter {
    type Item = Module;

    fn config(&self) -> &EmitterConfig {
        &self.config
    }

    fn emit<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        EmitHelper::write_comment(writer, context, &format!("module: {}", module.name))?;
        EmitHelper::write_line(
            writer,
            context,
            &format!("layout pointer_size={}", module.layout.pointer_size),
        )?;
        for function in module.functions.values() {
            writeln!(writer)?;
            self.emit_function(function, writer, context)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerbosityLevel;
    use pretty_assertions::assert_eq;
    use ptaflow_core::format::format_module;
    use ptaflow_core::{ModuleBuilder, Type};

    fn module() -> Module {
        let mut builder = ModuleBuilder::new("emit");
        builder.declare("free", Type::Void, vec![Type::ptr_to(Type::Int(8))]);
        let mut f = builder.function("main", Type::Void);
        let p = f.alloca("p", Type::Int(32));
        let one = f.const_int(1, Type::Int(32));
        f.store(one, p);
        f.load("r", p);
        f.ret(None);
        f.build().unwrap();
        builder.build()
    }

    #[test]
    fn test_plain_output_matches_text_form() {
        let module = module();
        let text = IrEmitter::default().emit_to_string(&module).unwrap();
        assert_eq!(text, format_module(&module));
    }

    #[test]
    fn test_debug_verbosity_tags_instructions() {
        let emitter =
            IrEmitter::new(EmitterConfig::plain().with_verbosity(VerbosityLevel::Debug));
        let text = emitter.emit_to_string(&module()).unwrap();
        assert!(text.contains("  %p = alloca i32  ; inst0\n"));
        assert!(text.contains("  %r = load i32, i32* %p  ; inst2\n"));
        assert!(text.contains("declare void @free(i8*)\n"));
    }
}
