use super::{
    config::AnalysisConfig,
    diagnostics::{Diagnostic, DiagnosticSink, TracingSink},
    result::AnalysisResult,
    session::AnalysisSession,
    AnalysisError,
};
use crate::{call_graph::CallGraph, function::Function, module::Module};
use indexmap::IndexSet;
use tracing::info;

/// Runs the per-function analysis starting from a designated entry function.
///
/// Each function is analyzed at most once; analyzing a visited function again is a no-op.
/// Callees are not followed: [`PointerAnalysis::analyze_function`] is the hook for doing so.
pub struct PointerAnalysis<'m> {
    module: &'m Module,
    call_graph: CallGraph<'m>,
    config: AnalysisConfig,
    visited: IndexSet<String>,
    result: AnalysisResult,
    sink: Box<dyn DiagnosticSink + 'm>,
}

impl<'m> PointerAnalysis<'m> {
    pub fn new(module: &'m Module, config: AnalysisConfig) -> Self {
        Self {
            module,
            call_graph: CallGraph::build(module),
            config,
            visited: IndexSet::new(),
            result: AnalysisResult::new(),
            sink: Box::new(TracingSink),
        }
    }

    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'm) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn call_graph(&self) -> &CallGraph<'m> {
        &self.call_graph
    }

    /// Analyzes the configured entry function.
    pub fn run(&mut self) -> Result<(), AnalysisError> {
        let entry = self.config.entry.clone();
        self.analyze_entry(&entry)
    }

    /// Looks `name` up in the call graph and analyzes it. A missing entry is reported and
    /// returned as an error before any state is touched.
    pub fn analyze_entry(&mut self, name: &str) -> Result<(), AnalysisError> {
        let Some(function) = self.call_graph.lookup(name) else {
            self.sink.report(&Diagnostic::EntryNotFound {
                name: name.to_string(),
            });
            return Err(AnalysisError::EntryNotFound {
                name: name.to_string(),
            });
        };

        self.emit(Diagnostic::EntryFound {
            name: name.to_string(),
        });
        info!(entry = name, module = %self.module.name, "starting pointer analysis");
        self.result.entry = Some(name.to_string());
        self.analyze_function(function)
    }

    pub fn analyze_function(&mut self, function: &'m Function) -> Result<(), AnalysisError> {
        if function.is_declaration {
            return Err(AnalysisError::NotADefinition {
                name: function.name.clone(),
            });
        }
        if self.is_visited(&function.name) {
            return Ok(());
        }

        let mut session = AnalysisSession::initialize(function, &self.module.layout, &self.config);
        let max_level = session.max_level();
        for level in (1..=max_level).rev() {
            let before = self
                .config
                .verify_monotonicity
                .then(|| session.snapshot());
            session.propagate_level(level);
            if let Some(before) = before {
                session.verify_monotone(&before)?;
            }
        }

        let (facts, diagnostics) = session.finish();
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
        self.emit(Diagnostic::FunctionAnalyzed {
            function: function.name.clone(),
            levels: max_level,
            steps: facts.steps,
        });
        info!(
            function = %function.name,
            levels = max_level,
            steps = facts.steps,
            "function analyzed"
        );

        self.result.functions.insert(function.name.clone(), facts);
        self.visited.insert(function.name.clone());
        Ok(())
    }

    pub fn is_visited(&self, name: &str) -> bool {
        self.visited.contains(name)
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    pub fn into_result(self) -> AnalysisResult {
        self.result
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
        self.result.diagnostics.push(diagnostic);
    }
}

/// Analyzes `entry` in `module` with default settings.
pub fn analyze(module: &Module, entry: &str) -> Result<AnalysisResult, AnalysisError> {
    analyze_with_config(module, AnalysisConfig::with_entry(entry))
}

pub fn analyze_with_config(
    module: &Module,
    config: AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let mut analysis = PointerAnalysis::new(module, config);
    analysis.run()?;
    Ok(analysis.into_result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::diagnostics::NullSink;
    use crate::builder::ModuleBuilder;
    use crate::types::Type;

    fn module() -> Module {
        let mut builder = ModuleBuilder::new("m");
        builder.declare("puts", Type::Int(32), vec![Type::ptr_to(Type::Int(8))]);
        let mut f = builder.function("main", Type::Void);
        let p = f.alloca("p", Type::Int(32));
        let one = f.const_int(1, Type::Int(32));
        f.store(one, p);
        f.ret(None);
        f.build().unwrap();
        builder.build()
    }

    #[test]
    fn test_missing_entry_reports_and_leaves_state() {
        let module = module();
        let mut seen: Vec<Diagnostic> = Vec::new();
        {
            let mut analysis =
                PointerAnalysis::new(&module, AnalysisConfig::with_entry("start"))
                    .with_sink(&mut seen);
            let err = analysis.run().unwrap_err();
            assert_eq!(
                err,
                AnalysisError::EntryNotFound {
                    name: "start".to_string()
                }
            );
            assert!(analysis.result().functions.is_empty());
            assert!(analysis.result().diagnostics.is_empty());
            assert!(analysis.result().entry.is_none());
        }
        assert_eq!(
            seen,
            vec![Diagnostic::EntryNotFound {
                name: "start".to_string()
            }]
        );
    }

    #[test]
    fn test_declarations_are_not_entries() {
        let module = module();
        let err = analyze(&module, "puts").unwrap_err();
        assert!(matches!(err, AnalysisError::EntryNotFound { .. }));

        let mut analysis =
            PointerAnalysis::new(&module, AnalysisConfig::default()).with_sink(NullSink);
        let puts = module.get_function("puts").unwrap();
        assert!(matches!(
            analysis.analyze_function(puts),
            Err(AnalysisError::NotADefinition { .. })
        ));
    }

    #[test]
    fn test_revisit_is_a_no_op() {
        let module = module();
        let mut analysis =
            PointerAnalysis::new(&module, AnalysisConfig::default()).with_sink(NullSink);
        analysis.run().unwrap();
        let first = analysis.result().clone();

        analysis.run().unwrap();
        let main = module.get_function("main").unwrap();
        analysis.analyze_function(main).unwrap();

        assert!(analysis.is_visited("main"));
        assert_eq!(analysis.result().functions, first.functions);
        assert_eq!(
            analysis
                .result()
                .diagnostics
                .iter()
                .filter(|d| matches!(d, Diagnostic::FunctionAnalyzed { .. }))
                .count(),
            1
        );
    }
}
