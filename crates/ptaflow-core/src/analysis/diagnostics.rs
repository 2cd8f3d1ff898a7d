use crate::values::InstId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Something the analysis wants a human to know. Values are carried in printed form so a
/// diagnostic outlives the function it was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    EntryFound {
        name: String,
    },
    EntryNotFound {
        name: String,
    },
    WorklistBucket {
        function: String,
        level: usize,
        allocations: Vec<String>,
    },
    UnsupportedConsumer {
        function: String,
        pointer: String,
        consumer: InstId,
        opcode: String,
    },
    UnusedAllocation {
        function: String,
        allocation: String,
    },
    PointsToUpdated {
        function: String,
        context: InstId,
        value: String,
        targets: Vec<String>,
    },
    AliasUpdated {
        function: String,
        context: InstId,
        value: String,
        aliases: Vec<String>,
    },
    PropagationStep {
        function: String,
        from: InstId,
        to: InstId,
        value: String,
    },
    FunctionAnalyzed {
        function: String,
        levels: usize,
        steps: usize,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::EntryNotFound { .. } => Severity::Error,
            Diagnostic::UnsupportedConsumer { .. } | Diagnostic::UnusedAllocation { .. } => {
                Severity::Warning
            }
            Diagnostic::EntryFound { .. }
            | Diagnostic::WorklistBucket { .. }
            | Diagnostic::FunctionAnalyzed { .. } => Severity::Info,
            Diagnostic::PointsToUpdated { .. }
            | Diagnostic::AliasUpdated { .. }
            | Diagnostic::PropagationStep { .. } => Severity::Debug,
        }
    }

    pub fn function(&self) -> Option<&str> {
        match self {
            Diagnostic::EntryFound { .. } | Diagnostic::EntryNotFound { .. } => None,
            Diagnostic::WorklistBucket { function, .. }
            | Diagnostic::UnsupportedConsumer { function, .. }
            | Diagnostic::UnusedAllocation { function, .. }
            | Diagnostic::PointsToUpdated { function, .. }
            | Diagnostic::AliasUpdated { function, .. }
            | Diagnostic::PropagationStep { function, .. }
            | Diagnostic::FunctionAnalyzed { function, .. } => Some(function),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EntryFound { name } => write!(f, "found entry function @{}", name),
            Diagnostic::EntryNotFound { name } => {
                write!(f, "entry function @{} not found, nothing analyzed", name)
            }
            Diagnostic::WorklistBucket {
                function,
                level,
                allocations,
            } => write!(
                f,
                "@{}: level {} holds [{}]",
                function,
                level,
                allocations.join(", ")
            ),
            Diagnostic::UnsupportedConsumer {
                function,
                pointer,
                consumer,
                opcode,
            } => write!(
                f,
                "@{}: {} is consumed by unsupported `{}` at {}",
                function, pointer, opcode, consumer
            ),
            Diagnostic::UnusedAllocation {
                function,
                allocation,
            } => write!(
                f,
                "@{}: {} is never loaded from or stored to",
                function, allocation
            ),
            Diagnostic::PointsToUpdated {
                function,
                context,
                value,
                targets,
            } => write!(
                f,
                "@{}: pts({}) at {} = {{{}}}",
                function,
                value,
                context,
                targets.join(", ")
            ),
            Diagnostic::AliasUpdated {
                function,
                context,
                value,
                aliases,
            } => write!(
                f,
                "@{}: alias({}) at {} = {{{}}}",
                function,
                value,
                context,
                aliases.join(", ")
            ),
            Diagnostic::PropagationStep {
                function,
                from,
                to,
                value,
            } => write!(f, "@{}: {} -> {} carrying {}", function, from, to, value),
            Diagnostic::FunctionAnalyzed {
                function,
                levels,
                steps,
            } => write!(
                f,
                "@{}: analyzed {} level(s) in {} propagation step(s)",
                function, levels, steps
            ),
        }
    }
}

/// Receiver for diagnostics raised during analysis.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: &Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` at the level matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity() {
            Severity::Debug => tracing::debug!(target: "ptaflow::analysis", "{}", diagnostic),
            Severity::Info => tracing::info!(target: "ptaflow::analysis", "{}", diagnostic),
            Severity::Warning => tracing::warn!(target: "ptaflow::analysis", "{}", diagnostic),
            Severity::Error => tracing::error!(target: "ptaflow::analysis", "{}", diagnostic),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: &Diagnostic) {}
}
