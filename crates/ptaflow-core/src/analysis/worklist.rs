use crate::values::InstId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Allocations bucketed by indirection level. Each allocation lives in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worklist {
    buckets: BTreeMap<usize, IndexSet<InstId>>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the allocation is already bucketed, at this or any other level.
    pub fn insert(&mut self, level: usize, inst: InstId) -> bool {
        if self.level_of(inst).is_some() {
            return false;
        }
        self.buckets.entry(level).or_default().insert(inst)
    }

    pub fn bucket(&self, level: usize) -> Vec<InstId> {
        self.buckets
            .get(&level)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn level_of(&self, inst: InstId) -> Option<usize> {
        self.buckets
            .iter()
            .find(|(_, bucket)| bucket.contains(&inst))
            .map(|(level, _)| *level)
    }

    /// Highest non-empty level, or 0 when there are no allocations.
    pub fn max_level(&self) -> usize {
        self.buckets
            .iter()
            .rev()
            .find(|(_, bucket)| !bucket.is_empty())
            .map(|(level, _)| *level)
            .unwrap_or(0)
    }

    pub fn levels(&self) -> impl Iterator<Item = (usize, &IndexSet<InstId>)> {
        self.buckets.iter().map(|(level, bucket)| (*level, bucket))
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_stay_disjoint() {
        let mut worklist = Worklist::new();
        assert!(worklist.insert(1, InstId(0)));
        assert!(worklist.insert(2, InstId(1)));
        assert!(!worklist.insert(2, InstId(0)));

        assert_eq!(worklist.bucket(1), vec![InstId(0)]);
        assert_eq!(worklist.bucket(2), vec![InstId(1)]);
        assert_eq!(worklist.level_of(InstId(0)), Some(1));
        assert_eq!(worklist.len(), 2);
    }

    #[test]
    fn test_max_level_skips_gaps() {
        let mut worklist = Worklist::new();
        assert_eq!(worklist.max_level(), 0);
        worklist.insert(1, InstId(0));
        worklist.insert(4, InstId(1));
        assert_eq!(worklist.max_level(), 4);
        assert!(worklist.bucket(3).is_empty());
    }
}
