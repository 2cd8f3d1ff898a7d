use super::{
    config::AnalysisConfig,
    def_use::{reaching_definitions, DefUseGraph, UseList},
    diagnostics::Diagnostic,
    facts::{AliasMap, FactKind, FactMap, PointsToMap, Target},
    labels::{LabelKind, LabelMap},
    level::classify,
    memory::MemoryLocations,
    propagate::PropagationEdge,
    result::FunctionFacts,
    worklist::Worklist,
    AnalysisError,
};
use crate::function::{Function, UserMap};
use crate::instructions::InstKind;
use crate::layout::DataLayout;
use crate::values::{InstId, Value};
use indexmap::IndexSet;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, trace};

/// Mutable state of one function's analysis. Created by [`AnalysisSession::initialize`],
/// driven level by level, and turned into [`FunctionFacts`] by [`AnalysisSession::finish`].
pub struct AnalysisSession<'f> {
    pub(crate) function: &'f Function,
    pub(crate) config: &'f AnalysisConfig,
    pub(crate) users: UserMap,
    pub(crate) memory: MemoryLocations,
    pub(crate) labels: LabelMap,
    pub(crate) worklist: Worklist,
    pub(crate) use_list: UseList,
    pub(crate) def_use: DefUseGraph,
    pub(crate) points_to: PointsToMap,
    pub(crate) aliases: AliasMap,
    /// (store, value) pairs whose outgoing def-use edges were already enqueued once.
    pub(crate) expanded: HashSet<(InstId, Value)>,
    /// (store, stored load result, defined value) waiting for the level to drain before the
    /// stored value may stand in for its own target.
    pub(crate) deferred: IndexSet<(InstId, Value, Value)>,
    pub(crate) settled: HashSet<(InstId, Value, Value)>,
    pub(crate) unsupported: HashSet<(InstId, Value)>,
    pub(crate) unused: HashSet<InstId>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) steps: usize,
}

/// Copy of the fact maps taken before a level, compared against the maps after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactSnapshot {
    points_to: PointsToMap,
    aliases: AliasMap,
}

impl<'f> AnalysisSession<'f> {
    /// Creates a memory location and a self Def label for every allocation and buckets it by
    /// indirection level.
    pub fn initialize(
        function: &'f Function,
        layout: &DataLayout,
        config: &'f AnalysisConfig,
    ) -> Self {
        let mut session = Self {
            function,
            config,
            users: function.user_map(),
            memory: MemoryLocations::new(),
            labels: LabelMap::new(),
            worklist: Worklist::new(),
            use_list: UseList::new(),
            def_use: DefUseGraph::new(),
            points_to: FactMap::new(),
            aliases: FactMap::new(),
            expanded: HashSet::new(),
            deferred: IndexSet::new(),
            settled: HashSet::new(),
            unsupported: HashSet::new(),
            unused: HashSet::new(),
            diagnostics: Vec::new(),
            steps: 0,
        };

        for inst in function.allocations() {
            let (InstKind::Alloca { allocated }, Some(level)) = (&inst.kind, classify(inst)) else {
                continue;
            };
            let location = session
                .memory
                .create(inst.id, layout.type_alloc_size(allocated));
            session
                .labels
                .insert(inst.id, Value::Inst(inst.id), LabelKind::Def);
            session.worklist.insert(level, inst.id);
            let allocation = function.value_name(Value::Inst(inst.id));
            debug!(
                function = %function.name,
                %allocation,
                level,
                size = location.size,
                "allocation indexed"
            );
        }

        let buckets: Vec<Diagnostic> = session
            .worklist
            .levels()
            .map(|(level, bucket)| Diagnostic::WorklistBucket {
                function: function.name.clone(),
                level,
                allocations: bucket
                    .iter()
                    .map(|id| function.value_name(Value::Inst(*id)))
                    .collect(),
            })
            .collect();
        session.diagnostics.extend(buckets);

        session
    }

    pub fn function(&self) -> &'f Function {
        self.function
    }

    pub fn max_level(&self) -> usize {
        self.worklist.max_level()
    }

    /// Processes every allocation bucketed at `level`. Returns the number of drained queue entries.
    pub fn propagate_level(&mut self, level: usize) -> usize {
        let mut steps = 0;
        for ptr in self.worklist.bucket(level) {
            self.prepare_pointer(ptr);
            let seeds = self.seed_edges(ptr);
            steps += self.drain(seeds);
        }
        steps + self.settle_deferred()
    }

    /// Gives every parked store whose loaded value still has no aliases its surrogate target and
    /// propagates the result. Repeats until nothing new gets parked.
    pub fn settle_deferred(&mut self) -> usize {
        let mut steps = 0;
        while !self.deferred.is_empty() {
            let pending: Vec<_> = self.deferred.drain(..).collect();
            let mut queue = Vec::new();
            for (store, stored, defined) in pending {
                self.settled.insert((store, stored, defined));
                if !self.aliases_of(store, stored).is_empty() {
                    continue;
                }
                let Some(target) = self.target_of(stored) else {
                    continue;
                };
                if self.join_points_to(store, defined, [target]) {
                    queue.extend(
                        self.def_use
                            .consumers(store, defined)
                            .into_iter()
                            .map(|to| PropagationEdge::new(store, to, defined)),
                    );
                }
            }
            if !queue.is_empty() {
                steps += self.drain(queue);
            }
        }
        steps
    }

    /// Labels the consumers of `ptr` and links each registered use to its reaching definition.
    pub fn prepare_pointer(&mut self, ptr: InstId) {
        let function = self.function;
        let value = Value::Inst(ptr);
        let users = self.users.users(value).to_vec();

        if users.is_empty() && self.unused.insert(ptr) {
            self.diagnostics.push(Diagnostic::UnusedAllocation {
                function: function.name.clone(),
                allocation: function.value_name(value),
            });
        }

        for user in users {
            let Some(inst) = function.inst(user) else {
                continue;
            };
            match &inst.kind {
                InstKind::Store {
                    value: stored,
                    ptr: address,
                } => {
                    if *address == value {
                        self.labels.insert(user, value, LabelKind::Def);
                        self.labels.insert(user, value, LabelKind::Use);
                        self.labels.insert(user, *stored, LabelKind::Alias);
                        self.use_list.push(value, user);
                    }
                    if *stored == value {
                        self.labels.insert(user, value, LabelKind::Alias);
                    }
                }
                InstKind::Load { .. } => {
                    self.labels.insert(user, value, LabelKind::Use);
                    self.labels
                        .insert(user, Value::Inst(user), LabelKind::AliasDefine);
                    self.use_list.push(value, user);
                }
                InstKind::Alloca { .. } | InstKind::Call { .. } | InstKind::Other { .. } => {
                    self.report_unsupported(user, value);
                }
            }
        }

        for use_site in self.use_list.uses(value).to_vec() {
            for def in reaching_definitions(function, &self.labels, use_site, value) {
                if self.def_use.add_edge(def, use_site, value) {
                    trace!(
                        function = %function.name,
                        %def,
                        use_site = %use_site,
                        value = %function.value_name(value),
                        "def-use edge"
                    );
                }
            }
        }
    }

    /// Queue entries leaving the allocation itself along edges that carry it.
    pub fn seed_edges(&self, ptr: InstId) -> Vec<PropagationEdge> {
        let value = Value::Inst(ptr);
        self.def_use
            .consumers(ptr, value)
            .into_iter()
            .map(|to| PropagationEdge::new(ptr, to, value))
            .collect()
    }

    pub fn snapshot(&self) -> FactSnapshot {
        FactSnapshot {
            points_to: self.points_to.clone(),
            aliases: self.aliases.clone(),
        }
    }

    /// Fails if any fact set recorded in `before` is no longer contained in the current one.
    pub fn verify_monotone(&self, before: &FactSnapshot) -> Result<(), AnalysisError> {
        if let Some((context, value)) = before.points_to.first_shrink(&self.points_to) {
            return Err(self.violation(context, value, FactKind::PointsTo));
        }
        if let Some((context, value)) = before.aliases.first_shrink(&self.aliases) {
            return Err(self.violation(context, value, FactKind::Alias));
        }
        Ok(())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn finish(self) -> (FunctionFacts, Vec<Diagnostic>) {
        let facts = FunctionFacts {
            function: self.function.name.clone(),
            max_level: self.worklist.max_level(),
            memory: self.memory,
            labels: self.labels,
            worklist: self.worklist,
            use_list: self.use_list,
            def_use: self.def_use,
            points_to: self.points_to,
            aliases: self.aliases,
            steps: self.steps,
        };
        (facts, self.diagnostics)
    }

    /// Alias facts for `value` at `context`, joined with those recorded where `value` is defined.
    pub(crate) fn aliases_of(&self, context: InstId, value: Value) -> BTreeSet<Value> {
        let mut aliases = self.aliases.at(context, value);
        if let Some(def) = value.as_inst() {
            if def != context {
                aliases.extend(self.aliases.at(def, value));
            }
        }
        aliases
    }

    /// What storing `value` makes a pointer reference.
    pub(crate) fn target_of(&self, value: Value) -> Option<Target> {
        if let Some(location) = value.as_inst().and_then(|id| self.memory.at_site(id)) {
            return Some(Target::Location(location.id));
        }
        self.config
            .stored_value_surrogate
            .then_some(Target::Value(value))
    }

    fn is_load_result(&self, value: Value) -> bool {
        matches!(
            self.function.defining_inst(value).map(|inst| &inst.kind),
            Some(InstKind::Load { .. })
        )
    }

    pub(crate) fn value_of(&self, target: Target) -> Option<Value> {
        match target {
            Target::Location(id) => self.memory.get(id).map(|l| Value::Inst(l.site)),
            Target::Value(value) => Some(value),
        }
    }

    /// Targets written into each of `defined` by a store of `stored` observed at `store`: the
    /// targets of its aliases if it has any, otherwise its own. A load result without aliases
    /// may still gain some, so its own target waits for [`AnalysisSession::settle_deferred`].
    pub(crate) fn stored_targets(
        &mut self,
        store: InstId,
        stored: Value,
        defined: &[Value],
    ) -> BTreeSet<Target> {
        let aliases = self.aliases_of(store, stored);
        if aliases.is_empty() {
            if self.is_load_result(stored) {
                for value in defined {
                    let key = (store, stored, *value);
                    if !self.settled.contains(&key) {
                        self.deferred.insert(key);
                    }
                }
                return BTreeSet::new();
            }
            self.target_of(stored).into_iter().collect()
        } else {
            aliases
                .into_iter()
                .filter_map(|alias| self.target_of(alias))
                .collect()
        }
    }

    pub(crate) fn join_points_to(
        &mut self,
        context: InstId,
        value: Value,
        targets: impl IntoIterator<Item = Target>,
    ) -> bool {
        let changed = self.points_to.join(context, value, targets);
        if changed {
            let function = self.function;
            let targets = self
                .points_to
                .at(context, value)
                .into_iter()
                .map(|target| self.render_target(target))
                .collect();
            self.diagnostics.push(Diagnostic::PointsToUpdated {
                function: function.name.clone(),
                context,
                value: function.value_name(value),
                targets,
            });
        }
        changed
    }

    pub(crate) fn join_aliases(
        &mut self,
        context: InstId,
        value: Value,
        aliases: impl IntoIterator<Item = Value>,
    ) -> bool {
        let changed = self.aliases.join(context, value, aliases);
        if changed {
            let function = self.function;
            let aliases = self
                .aliases
                .at(context, value)
                .into_iter()
                .map(|alias| function.value_name(alias))
                .collect();
            self.diagnostics.push(Diagnostic::AliasUpdated {
                function: function.name.clone(),
                context,
                value: function.value_name(value),
                aliases,
            });
        }
        changed
    }

    pub(crate) fn report_unsupported(&mut self, consumer: InstId, pointer: Value) {
        if !self.unsupported.insert((consumer, pointer)) {
            return;
        }
        let function = self.function;
        let opcode = function
            .inst(consumer)
            .map(|inst| inst.opcode().to_string())
            .unwrap_or_default();
        self.diagnostics.push(Diagnostic::UnsupportedConsumer {
            function: function.name.clone(),
            pointer: function.value_name(pointer),
            consumer,
            opcode,
        });
    }

    fn render_target(&self, target: Target) -> String {
        match target {
            Target::Location(id) => match self.memory.get(id) {
                Some(location) => format!(
                    "{}({})",
                    id,
                    self.function.value_name(Value::Inst(location.site))
                ),
                None => id.to_string(),
            },
            Target::Value(value) => self.function.value_name(value),
        }
    }

    fn violation(&self, context: InstId, value: Value, kind: FactKind) -> AnalysisError {
        AnalysisError::MonotonicityViolation {
            function: self.function.name.clone(),
            context: context.to_string(),
            value: self.function.value_name(value),
            kind,
        }
    }
}
