use super::{diagnostics::Diagnostic, labels::LabelKind, session::AnalysisSession};
use crate::instructions::InstKind;
use crate::values::{InstId, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use tracing::debug;

/// One queue entry: facts about `value` flow from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropagationEdge {
    pub from: InstId,
    pub to: InstId,
    pub value: Value,
}

impl PropagationEdge {
    pub fn new(from: InstId, to: InstId, value: Value) -> Self {
        Self { from, to, value }
    }
}

impl fmt::Display for PropagationEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.from, self.to, self.value)
    }
}

type Queue = VecDeque<PropagationEdge>;

impl<'f> AnalysisSession<'f> {
    /// Runs the FIFO queue to a fixpoint starting from `seeds`. Entries are only added when some
    /// fact set grew, so the loop ends once the function's finite value universe is saturated.
    pub fn drain(&mut self, seeds: impl IntoIterator<Item = PropagationEdge>) -> usize {
        let function = self.function;
        let mut queue: Queue = seeds.into_iter().collect();
        let mut steps = 0;

        while let Some(edge) = queue.pop_front() {
            steps += 1;
            if self.config.record_steps {
                self.diagnostics.push(Diagnostic::PropagationStep {
                    function: function.name.clone(),
                    from: edge.from,
                    to: edge.to,
                    value: function.value_name(edge.value),
                });
            }

            let forwarded = self.forward(edge);
            let Some(target) = function.inst(edge.to) else {
                continue;
            };
            match &target.kind {
                InstKind::Store { value, ptr } => {
                    self.transfer_store(edge, *value, *ptr, forwarded, &mut queue)
                }
                InstKind::Load { ptr, .. } => self.transfer_load(edge.to, *ptr, &mut queue),
                _ => {}
            }
        }

        debug!(function = %function.name, steps, "queue drained");
        self.steps += steps;
        steps
    }

    /// Copies the source's facts for the carried value into the target's context.
    fn forward(&mut self, edge: PropagationEdge) -> bool {
        let targets = self.points_to.at(edge.from, edge.value);
        let aliases = self.aliases.at(edge.from, edge.value);
        let pts_changed = self.join_points_to(edge.to, edge.value, targets);
        let alias_changed = self.join_aliases(edge.to, edge.value, aliases);
        pts_changed || alias_changed
    }

    fn transfer_store(
        &mut self,
        edge: PropagationEdge,
        stored: Value,
        address: Value,
        forwarded: bool,
        queue: &mut Queue,
    ) {
        let store = edge.to;
        let defines =
            edge.value == address || self.aliases_of(store, address).contains(&edge.value);
        if !defines {
            return;
        }

        let targets = self.stored_targets(store, stored, &[edge.value]);
        let changed = self.join_points_to(store, edge.value, targets);
        let first = self.expanded.insert((store, edge.value));
        if changed || forwarded || first {
            self.enqueue_consumers(store, edge.value, queue);
        }
    }

    fn transfer_load(&mut self, load: InstId, address: Value, queue: &mut Queue) {
        let result = Value::Inst(load);
        let mut sources = self.aliases_of(load, address);
        if sources.is_empty() {
            sources.insert(address);
        }

        let targets: BTreeSet<_> = sources
            .iter()
            .flat_map(|source| self.points_to.at(load, *source))
            .collect();
        let aliases: BTreeSet<Value> = targets
            .iter()
            .filter_map(|target| self.value_of(*target))
            .collect();

        let alias_changed = self.join_aliases(load, result, aliases);
        let pts_changed = self.join_points_to(load, result, targets);
        if !(alias_changed || pts_changed) {
            return;
        }

        let function = self.function;
        for consumer in self.users.users(result).to_vec() {
            let Some(inst) = function.inst(consumer) else {
                continue;
            };
            match &inst.kind {
                InstKind::Store { value, ptr } if *ptr == result || *value == result => {
                    if *ptr == result {
                        self.store_through_loaded(load, consumer, *value, queue);
                    }
                    if *value == result {
                        self.store_of_loaded(load, consumer, *ptr, queue);
                    }
                }
                InstKind::Load { .. } => self.load_through_loaded(load, consumer, queue),
                _ => self.report_unsupported(consumer, result),
            }
        }
    }

    /// `store stored -> r` where `r` was loaded at `load`: every value `r` aliases is now
    /// defined here and points wherever the stored value does.
    fn store_through_loaded(
        &mut self,
        load: InstId,
        store: InstId,
        stored: Value,
        queue: &mut Queue,
    ) {
        let result = Value::Inst(load);
        let aliases = self.aliases_of(load, result);
        let mut changed = self.join_aliases(store, result, aliases.iter().copied());

        let defined: Vec<Value> = std::iter::once(result)
            .chain(aliases.iter().copied())
            .collect();
        let targets = self.stored_targets(store, stored, &defined);
        changed |= self.join_points_to(store, result, targets.iter().copied());
        for alias in &aliases {
            changed |= self.join_points_to(store, *alias, targets.iter().copied());
            self.labels.insert(store, *alias, LabelKind::Def);
            self.labels.insert(store, *alias, LabelKind::Use);
            self.use_list.push(*alias, store);
        }

        if changed {
            self.enqueue_consumers(store, result, queue);
            for alias in aliases {
                self.enqueue_consumers(store, alias, queue);
            }
        }
    }

    /// `store r -> address` where `r` was loaded at `load`: whatever `address` may reference
    /// now points where `r` points.
    fn store_of_loaded(
        &mut self,
        load: InstId,
        store: InstId,
        address: Value,
        queue: &mut Queue,
    ) {
        let result = Value::Inst(load);
        let aliases = self.aliases_of(load, result);
        self.join_aliases(store, result, aliases);

        let targets = self.points_to.at(load, result);
        let mut slots = self.aliases_of(store, address);
        slots.insert(address);
        for slot in slots {
            if self.join_points_to(store, slot, targets.iter().copied()) {
                self.enqueue_consumers(store, slot, queue);
            }
        }
    }

    /// `r2 = load r` where `r` was loaded at `load`: the inner load reads through every value `r`
    /// aliases.
    fn load_through_loaded(&mut self, load: InstId, inner: InstId, queue: &mut Queue) {
        let result = Value::Inst(load);
        let aliases = self.aliases_of(load, result);
        let changed = self.join_aliases(inner, result, aliases.iter().copied());
        for alias in aliases {
            self.labels.insert(inner, alias, LabelKind::Use);
            self.use_list.push(alias, inner);
        }
        if changed {
            queue.push_back(PropagationEdge::new(load, inner, result));
        }
    }

    fn enqueue_consumers(&self, def: InstId, value: Value, queue: &mut Queue) {
        queue.extend(
            self.def_use
                .consumers(def, value)
                .into_iter()
                .map(|to| PropagationEdge::new(def, to, value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{config::AnalysisConfig, facts::Target, memory::LocationId};
    use crate::builder::ModuleBuilder;
    use crate::module::Module;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn run_all(session: &mut AnalysisSession<'_>) {
        for level in (1..=session.max_level()).rev() {
            session.propagate_level(level);
        }
    }

    fn store_then_load() -> Module {
        let mut builder = ModuleBuilder::new("m");
        let mut f = builder.function("main", Type::Void);
        let v = f.param("v", Type::Int(32));
        let p = f.alloca("p", Type::Int(32));
        f.store(v, p);
        f.load("r", p);
        f.ret(None);
        f.build().unwrap();
        builder.build()
    }

    #[test]
    fn test_load_reads_stored_value() {
        let module = store_then_load();
        let function = module.get_function("main").unwrap();
        let config = AnalysisConfig::default();
        let mut session = AnalysisSession::initialize(function, &module.layout, &config);
        run_all(&mut session);

        let v = function.find_value("v").unwrap();
        let p = function.find_value("p").unwrap();
        let r = function.find_value("r").unwrap();
        let load = r.as_inst().unwrap();

        assert!(session.aliases.contains(load, r, &v));
        assert_eq!(
            session.points_to.at(load, r),
            session.points_to.at(load, p)
        );
        assert_eq!(
            session.points_to.at(load, r).into_iter().collect::<Vec<_>>(),
            vec![Target::Value(v)]
        );
    }

    #[test]
    fn test_store_of_allocation_targets_its_location() {
        let mut builder = ModuleBuilder::new("m");
        let mut f = builder.function("main", Type::Void);
        let p = f.alloca("p", Type::Int(32));
        let q = f.alloca("q", Type::ptr_to(Type::Int(32)));
        f.store(p, q);
        f.load("r", q);
        f.ret(None);
        f.build().unwrap();
        let module = builder.build();

        let function = module.get_function("main").unwrap();
        let config = AnalysisConfig {
            stored_value_surrogate: false,
            ..AnalysisConfig::default()
        };
        let mut session = AnalysisSession::initialize(function, &module.layout, &config);
        run_all(&mut session);

        let r = function.find_value("r").unwrap();
        let load = r.as_inst().unwrap();
        assert_eq!(
            session.points_to.at(load, r).into_iter().collect::<Vec<_>>(),
            vec![Target::Location(LocationId(0))]
        );
        assert!(session.aliases.contains(load, r, &p));
    }

    #[test]
    fn test_store_through_loaded_pointer_defines_alias() {
        // q holds p; storing through the loaded pointer writes p's storage.
        let mut builder = ModuleBuilder::new("m");
        let mut f = builder.function("main", Type::Void);
        let p = f.alloca("p", Type::Int(32));
        let q = f.alloca("q", Type::ptr_to(Type::Int(32)));
        let seven = f.const_int(7, Type::Int(32));
        f.store(p, q);
        let r = f.load("r", q);
        f.store(seven, r);
        f.load("x", p);
        f.ret(None);
        f.build().unwrap();
        let module = builder.build();

        let function = module.get_function("main").unwrap();
        let config = AnalysisConfig::default();
        let mut session = AnalysisSession::initialize(function, &module.layout, &config);
        run_all(&mut session);

        let store = InstId(4);
        let x = function.find_value("x").unwrap();
        let x_load = x.as_inst().unwrap();
        assert!(session.labels.defines(store, p));
        assert!(session.use_list.uses(p).contains(&store));
        assert!(session.def_use.contains(store, x_load, p));
        assert!(session.points_to.contains(store, p, &Target::Value(seven)));
        assert!(session.points_to.contains(x_load, x, &Target::Value(seven)));
        assert!(session.aliases.contains(x_load, x, &seven));
    }

    #[test]
    fn test_unaliased_loaded_value_is_its_own_target_once_settled() {
        // %s is never written, so %v never aliases anything.
        let mut builder = ModuleBuilder::new("m");
        let mut f = builder.function("main", Type::Void);
        let s = f.alloca("s", Type::ptr_to(Type::Int(32)));
        let p = f.alloca("p", Type::ptr_to(Type::Int(32)));
        let v = f.load("v", s);
        f.store(v, p);
        f.load("r", p);
        f.ret(None);
        f.build().unwrap();
        let module = builder.build();

        let function = module.get_function("main").unwrap();
        let config = AnalysisConfig::default();
        let mut session = AnalysisSession::initialize(function, &module.layout, &config);
        let store = InstId(3);

        session.prepare_pointer(InstId(1));
        let seeds = session.seed_edges(InstId(1));
        session.drain(seeds);
        assert!(session.points_to.at(store, p).is_empty());
        assert_eq!(session.deferred.len(), 1);

        session.settle_deferred();
        let r = function.find_value("r").unwrap();
        let load = r.as_inst().unwrap();
        assert!(session.deferred.is_empty());
        assert!(session.points_to.contains(store, p, &Target::Value(v)));
        assert!(session.points_to.contains(load, r, &Target::Value(v)));
        assert!(session.aliases.contains(load, r, &v));
        assert_eq!(session.settle_deferred(), 0);
    }

    #[test]
    fn test_drain_counts_steps_and_records_them() {
        let module = store_then_load();
        let function = module.get_function("main").unwrap();
        let config = AnalysisConfig {
            record_steps: true,
            ..AnalysisConfig::default()
        };
        let mut session = AnalysisSession::initialize(function, &module.layout, &config);
        session.prepare_pointer(InstId(0));
        let seeds = session.seed_edges(InstId(0));
        let steps = session.drain(seeds);

        assert_eq!(steps, 2);
        let recorded = session
            .diagnostics()
            .iter()
            .filter(|d| matches!(d, Diagnostic::PropagationStep { .. }))
            .count();
        assert_eq!(recorded, steps);
        assert_eq!(session.drain(Vec::new()), 0);
    }
}
