use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter, Tone};
use crate::output::{JsonFormatter, OutputFormat};
use anyhow::bail;
use chrono::{DateTime, Utc};
use ptaflow_core::analysis::{AnalysisResult, Diagnostic, FunctionFacts, Severity};
use ptaflow_core::{Function, Module, Value};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;

/// Renders an [`AnalysisResult`] for the module it was computed on.
pub struct ReportEmitter<'m> {
    module: &'m Module,
    config: EmitterConfig,
    generated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    module: &'a str,
    fingerprint: String,
    generated_at: DateTime<Utc>,
    result: &'a AnalysisResult,
}

impl<'m> ReportEmitter<'m> {
    pub fn new(module: &'m Module, config: EmitterConfig) -> Self {
        Self {
            module,
            config,
            generated_at: Utc::now(),
        }
    }

    /// Pins the header timestamp.
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    fn emit_json<W: Write>(&self, result: &AnalysisResult, writer: &mut W) -> EmitResult {
        let report = JsonReport {
            module: &self.module.name,
            fingerprint: self.module.fingerprint(),
            generated_at: self.generated_at,
            result,
        };
        JsonFormatter::write_pretty(writer, &report)
    }

    fn emit_text<W: Write>(
        &self,
        result: &AnalysisResult,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        EmitHelper::write_comment(
            writer,
            context,
            &format!("ptaflow report for module {}", self.module.name),
        )?;
        EmitHelper::write_comment(
            writer,
            context,
            &format!("fingerprint {}", self.module.fingerprint()),
        )?;
        EmitHelper::write_comment(
            writer,
            context,
            &format!("generated {}", self.generated_at.to_rfc3339()),
        )?;
        if let Some(entry) = &result.entry {
            EmitHelper::write_comment(writer, context, &format!("entry @{}", entry))?;
        }

        let verbosity = self.config.verbosity;
        if verbosity.should_print_facts() {
            for facts in result.functions.values() {
                let Some(function) = self.module.get_function(&facts.function) else {
                    bail!(
                        "result mentions @{} which module {} does not define",
                        facts.function,
                        self.module.name
                    );
                };
                self.emit_function(function, facts, writer, context)?;
            }
        }

        let shown: Vec<&Diagnostic> = result
            .diagnostics_at_least(verbosity.min_severity())
            .collect();
        if !shown.is_empty() {
            EmitHelper::write_section(writer, context, "diagnostics")?;
            for diagnostic in shown {
                let severity = diagnostic.severity();
                let tone = match severity {
                    Severity::Error => Tone::Error,
                    Severity::Warning => Tone::Warning,
                    Severity::Info => Tone::Plain,
                    Severity::Debug => Tone::Muted,
                };
                EmitHelper::write_toned_line(
                    writer,
                    context,
                    &format!("{}: {}", severity, diagnostic),
                    tone,
                )?;
            }
        }
        Ok(())
    }

    fn emit_function<W: Write>(
        &self,
        function: &Function,
        facts: &FunctionFacts,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let name = |value: Value| function.value_name(value);

        EmitHelper::write_section(writer, context, &format!("@{}", function.name))?;
        EmitHelper::write_line(
            writer,
            context,
            &format!("levels {}, propagation steps {}", facts.max_level, facts.steps),
        )?;

        let worklist: Vec<String> = facts
            .worklist
            .levels()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|(level, bucket)| {
                let names: Vec<String> = bucket.iter().map(|id| name(Value::Inst(*id))).collect();
                format!("level {}: {}", level, names.join(", "))
            })
            .collect();
        EmitHelper::write_list(writer, context, "worklist", &worklist)?;

        let memory: Vec<String> = facts
            .memory
            .iter()
            .map(|location| {
                format!(
                    "{}: {}, {} bytes",
                    location.id,
                    name(Value::Inst(location.site)),
                    location.size
                )
            })
            .collect();
        EmitHelper::write_list(writer, context, "memory", &memory)?;

        if self.config.verbosity.should_print_graph() {
            let labels: Vec<String> = facts
                .labels
                .instructions()
                .map(|inst| {
                    let summary: Vec<String> = facts
                        .labels
                        .summary(inst)
                        .into_iter()
                        .map(|label| format!("{} {}", label.kind, name(label.value)))
                        .collect();
                    format!("{}: {}", inst, summary.join(", "))
                })
                .collect();
            EmitHelper::write_list(writer, context, "labels", &labels)?;

            let edges: Vec<String> = facts
                .def_use
                .edges()
                .map(|edge| format!("{} -> {}: {}", edge.def, edge.use_site, name(edge.value)))
                .collect();
            EmitHelper::write_list(writer, context, "def-use", &edges)?;
        }

        let points_to: Vec<String> = facts
            .points_to
            .iter()
            .map(|(at, value, targets)| {
                let targets: Vec<String> = targets
                    .iter()
                    .map(|target| facts.target_name(function, *target))
                    .collect();
                format!("{} {}: {}", at, name(value), braced(&targets))
            })
            .collect();
        EmitHelper::write_list(writer, context, "points-to", &points_to)?;

        let aliases: Vec<String> = facts
            .aliases
            .iter()
            .map(|(at, value, aliases)| {
                format!("{} {}: {}", at, name(value), braced_values(function, aliases))
            })
            .collect();
        EmitHelper::write_list(writer, context, "aliases", &aliases)?;

        Ok(())
    }
}

fn braced(items: &[String]) -> String {
    format!("{{{}}}", items.join(", "))
}

fn braced_values(function: &Function, values: &BTreeSet<Value>) -> String {
    let names: Vec<String> = values.iter().map(|v| function.value_name(*v)).collect();
    braced(&names)
}

impl Emitter for ReportEmitter<'_> {
    type Item = AnalysisResult;

    fn config(&self) -> &EmitterConfig {
        &self.config
    }

    fn emit<W: Write>(
        &self,
        result: &AnalysisResult,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        match self.config.format {
            OutputFormat::Text => self.emit_text(result, writer, context),
            OutputFormat::Json => self.emit_json(result, writer),
        }
    }
}
