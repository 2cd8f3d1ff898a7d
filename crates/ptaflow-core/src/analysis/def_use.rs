use super::labels::LabelMap;
use crate::function::Function;
use crate::values::{InstId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Instructions that read or write through each tracked pointer, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseList {
    #[serde(with = "indexmap::map::serde_seq")]
    uses: IndexMap<Value, Vec<InstId>>,
}

impl UseList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `inst` as a use of `ptr`. Returns false if it was already registered.
    pub fn push(&mut self, ptr: Value, inst: InstId) -> bool {
        let entry = self.uses.entry(ptr).or_default();
        if entry.contains(&inst) {
            return false;
        }
        entry.push(inst);
        true
    }

    pub fn uses(&self, ptr: Value) -> &[InstId] {
        self.uses.get(&ptr).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Value, &[InstId])> {
        self.uses.iter().map(|(ptr, uses)| (*ptr, uses.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.uses.values().map(|uses| uses.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefUseEdge {
    pub def: InstId,
    pub use_site: InstId,
    pub value: Value,
}

/// def -> use -> pointers carried on that edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefUseGraph {
    edges: IndexMap<InstId, IndexMap<InstId, Vec<Value>>>,
}

impl DefUseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, def: InstId, use_site: InstId, value: Value) -> bool {
        let carried = self
            .edges
            .entry(def)
            .or_default()
            .entry(use_site)
            .or_default();
        if carried.contains(&value) {
            return false;
        }
        carried.push(value);
        true
    }

    pub fn contains(&self, def: InstId, use_site: InstId, value: Value) -> bool {
        self.carried(def, use_site).contains(&value)
    }

    pub fn carried(&self, def: InstId, use_site: InstId) -> &[Value] {
        self.edges
            .get(&def)
            .and_then(|uses| uses.get(&use_site))
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    /// Use sites reached from `def` along edges carrying `value`.
    pub fn consumers(&self, def: InstId, value: Value) -> Vec<InstId> {
        self.edges
            .get(&def)
            .map(|uses| {
                uses.iter()
                    .filter(|(_, carried)| carried.contains(&value))
                    .map(|(use_site, _)| *use_site)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn edges(&self) -> impl Iterator<Item = DefUseEdge> + '_ {
        self.edges.iter().flat_map(|(def, uses)| {
            uses.iter().flat_map(move |(use_site, carried)| {
                carried.iter().map(move |value| DefUseEdge {
                    def: *def,
                    use_site: *use_site,
                    value: *value,
                })
            })
        })
    }

    pub fn len(&self) -> usize {
        self.edges().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Definitions of `ptr` that reach `use_site`. Bodies are straight-line, so this is the nearest
/// earlier instruction labelled as defining `ptr`, if any.
pub fn reaching_definitions(
    function: &Function,
    labels: &LabelMap,
    use_site: InstId,
    ptr: Value,
) -> Vec<InstId> {
    function.instructions[..use_site.index().min(function.instructions.len())]
        .iter()
        .rev()
        .find(|inst| labels.defines(inst.id, ptr))
        .map(|inst| vec![inst.id])
        .unwrap_or_default()
}
