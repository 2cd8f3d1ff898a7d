use super::memory::LocationId;
use crate::values::{InstId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What a pointer may reference: storage of an allocation site, or a value standing in for
/// storage the analysis does not model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Target {
    Location(LocationId),
    Value(Value),
}

impl Target {
    pub fn location(self) -> Option<LocationId> {
        match self {
            Target::Location(id) => Some(id),
            Target::Value(_) => None,
        }
    }

    pub fn is_surrogate(self) -> bool {
        matches!(self, Target::Value(_))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Location(id) => write!(f, "{}", id),
            Target::Value(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactKind {
    PointsTo,
    Alias,
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactKind::PointsTo => write!(f, "points-to"),
            FactKind::Alias => write!(f, "alias"),
        }
    }
}

/// Sets keyed by (instruction context, value). Sets only grow: the one mutating entry point is
/// a union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Ord"
))]
pub struct FactMap<T: Ord> {
    #[serde(with = "indexmap::map::serde_seq")]
    facts: IndexMap<(InstId, Value), BTreeSet<T>>,
}

pub type PointsToMap = FactMap<Target>;
pub type AliasMap = FactMap<Value>;

impl<T: Ord> Default for FactMap<T> {
    fn default() -> Self {
        Self {
            facts: IndexMap::new(),
        }
    }
}

impl<T: Ord + Clone> FactMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, context: InstId, value: Value) -> Option<&BTreeSet<T>> {
        self.facts.get(&(context, value))
    }

    /// Owned copy of the set, empty when nothing is recorded.
    pub fn at(&self, context: InstId, value: Value) -> BTreeSet<T> {
        self.get(context, value).cloned().unwrap_or_default()
    }

    pub fn contains(&self, context: InstId, value: Value, item: &T) -> bool {
        self.get(context, value)
            .map(|set| set.contains(item))
            .unwrap_or(false)
    }

    /// Unions `items` into the set at (context, value). Returns whether the set grew.
    pub fn join(
        &mut self,
        context: InstId,
        value: Value,
        items: impl IntoIterator<Item = T>,
    ) -> bool {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return false;
        }
        let set = self.facts.entry((context, value)).or_default();
        let before = set.len();
        set.extend(items);
        set.len() != before
    }

    /// Union of the value's sets over every context it was recorded in.
    pub fn across_contexts(&self, value: Value) -> BTreeSet<T> {
        self.facts
            .iter()
            .filter(|((_, v), _)| *v == value)
            .flat_map(|(_, set)| set.iter().cloned())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstId, Value, &BTreeSet<T>)> {
        self.facts
            .iter()
            .map(|((context, value), set)| (*context, *value, set))
    }

    /// First key whose set in `self` is not contained in the set `later` holds for it.
    pub fn first_shrink(&self, later: &Self) -> Option<(InstId, Value)> {
        self.facts
            .iter()
            .find(|(key, set)| match later.facts.get(*key) {
                Some(after) => !set.is_subset(after),
                None => !set.is_empty(),
            })
            .map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(n: u32) -> Value {
        Value::Inst(InstId(n))
    }

    #[test]
    fn test_join_reports_growth() {
        let mut pts = PointsToMap::new();
        assert!(!pts.join(InstId(1), v(0), std::iter::empty()));
        assert!(pts.is_empty());

        assert!(pts.join(InstId(1), v(0), [Target::Location(LocationId(0))]));
        assert!(!pts.join(InstId(1), v(0), [Target::Location(LocationId(0))]));
        assert!(pts.join(InstId(1), v(0), [Target::Value(v(5))]));
        assert_eq!(pts.at(InstId(1), v(0)).len(), 2);
        assert!(pts.at(InstId(2), v(0)).is_empty());
    }

    #[test]
    fn test_first_shrink_detects_lost_facts() {
        let mut before = AliasMap::new();
        before.join(InstId(1), v(0), [v(3)]);
        let mut after = before.clone();
        after.join(InstId(1), v(0), [v(4)]);
        after.join(InstId(2), v(5), [v(0)]);

        assert_eq!(before.first_shrink(&after), None);
        assert_eq!(after.first_shrink(&before), Some((InstId(1), v(0))));
    }

    #[test]
    fn test_across_contexts_unions_sets() {
        let mut aliases = AliasMap::new();
        aliases.join(InstId(1), v(0), [v(3)]);
        aliases.join(InstId(2), v(0), [v(4)]);
        aliases.join(InstId(2), v(1), [v(9)]);
        assert_eq!(
            aliases.across_contexts(v(0)).into_iter().collect::<Vec<_>>(),
            vec![v(3), v(4)]
        );
    }

    #[test]
    fn test_json_round_trip_keeps_tuple_keys() {
        let mut pts = PointsToMap::new();
        pts.join(InstId(4), v(2), [Target::Location(LocationId(1))]);
        let json = serde_json::to_string(&pts).unwrap();
        let back: PointsToMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pts);
    }
}
