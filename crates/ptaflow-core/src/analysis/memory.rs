use crate::values::InstId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub u32);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loc{}", self.0)
    }
}

/// Storage rooted at one allocation site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLocation {
    pub id: LocationId,
    pub site: InstId,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLocations {
    by_site: IndexMap<InstId, MemoryLocation>,
}

impl MemoryLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locations are created once per site; later calls return the existing one unchanged.
    pub fn create(&mut self, site: InstId, size: u64) -> MemoryLocation {
        let next = LocationId(self.by_site.len() as u32);
        *self.by_site.entry(site).or_insert(MemoryLocation {
            id: next,
            site,
            size,
        })
    }

    pub fn at_site(&self, site: InstId) -> Option<&MemoryLocation> {
        self.by_site.get(&site)
    }

    pub fn get(&self, id: LocationId) -> Option<&MemoryLocation> {
        self.by_site
            .get_index(id.0 as usize)
            .map(|(_, location)| location)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryLocation> {
        self.by_site.values()
    }

    pub fn len(&self) -> usize {
        self.by_site.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_site.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locations_are_created_once() {
        let mut locations = MemoryLocations::new();
        let first = locations.create(InstId(0), 4);
        let second = locations.create(InstId(3), 8);
        let again = locations.create(InstId(0), 16);

        assert_eq!(first, again);
        assert_eq!(again.size, 4);
        assert_eq!(second.id, LocationId(1));
        assert_eq!(locations.get(LocationId(1)).map(|l| l.site), Some(InstId(3)));
        assert_eq!(locations.len(), 2);
    }
}
