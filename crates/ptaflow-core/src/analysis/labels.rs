use crate::values::{InstId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelKind {
    Use,
    Def,
    DefUse,
    Alias,
    AliasDefine,
}

impl LabelKind {
    pub fn is_def(self) -> bool {
        matches!(self, LabelKind::Def | LabelKind::DefUse)
    }

    pub fn is_use(self) -> bool {
        matches!(self, LabelKind::Use | LabelKind::DefUse)
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelKind::Use => "use",
            LabelKind::Def => "def",
            LabelKind::DefUse => "def-use",
            LabelKind::Alias => "alias",
            LabelKind::AliasDefine => "alias-define",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub value: Value,
    pub kind: LabelKind,
}

impl Label {
    pub fn new(value: Value, kind: LabelKind) -> Self {
        Self { value, kind }
    }
}

/// Per-instruction label sets. Inserting an existing (value, kind) pair is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    labels: IndexMap<InstId, BTreeSet<Label>>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, inst: InstId, value: Value, kind: LabelKind) -> bool {
        self.labels
            .entry(inst)
            .or_default()
            .insert(Label::new(value, kind))
    }

    pub fn labels(&self, inst: InstId) -> impl Iterator<Item = &Label> {
        self.labels.get(&inst).into_iter().flatten()
    }

    pub fn contains(&self, inst: InstId, value: Value, kind: LabelKind) -> bool {
        self.labels
            .get(&inst)
            .map(|set| set.contains(&Label::new(value, kind)))
            .unwrap_or(false)
    }

    pub fn defines(&self, inst: InstId, value: Value) -> bool {
        self.labels(inst)
            .any(|label| label.value == value && label.kind.is_def())
    }

    pub fn uses(&self, inst: InstId, value: Value) -> bool {
        self.labels(inst)
            .any(|label| label.value == value && label.kind.is_use())
    }

    /// Labels of `inst` with a Def and a Use of the same value folded into one DefUse.
    pub fn summary(&self, inst: InstId) -> Vec<Label> {
        let mut folded: Vec<Label> = Vec::new();
        for label in self.labels(inst) {
            let merged = match label.kind {
                LabelKind::Def | LabelKind::Use => {
                    self.defines(inst, label.value) && self.uses(inst, label.value)
                }
                _ => false,
            };
            let label = if merged {
                Label::new(label.value, LabelKind::DefUse)
            } else {
                *label
            };
            if !folded.contains(&label) {
                folded.push(label);
            }
        }
        folded
    }

    pub fn instructions(&self) -> impl Iterator<Item = InstId> + '_ {
        self.labels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.labels.values().map(|set| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_labels_collapse() {
        let mut labels = LabelMap::new();
        let p = Value::Inst(InstId(0));
        assert!(labels.insert(InstId(1), p, LabelKind::Def));
        assert!(!labels.insert(InstId(1), p, LabelKind::Def));
        assert!(labels.insert(InstId(1), p, LabelKind::Use));
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_summary_folds_def_and_use() {
        let mut labels = LabelMap::new();
        let p = Value::Inst(InstId(0));
        let v = Value::Inst(InstId(3));
        labels.insert(InstId(4), p, LabelKind::Def);
        labels.insert(InstId(4), p, LabelKind::Use);
        labels.insert(InstId(4), v, LabelKind::Alias);

        assert!(labels.defines(InstId(4), p));
        assert!(labels.uses(InstId(4), p));
        assert!(!labels.defines(InstId(4), v));
        assert_eq!(
            labels.summary(InstId(4)),
            vec![
                Label::new(p, LabelKind::DefUse),
                Label::new(v, LabelKind::Alias)
            ]
        );
    }
}
