//! Demo dataset
//!
//! Populates a [`MemoryStore`] with numbered companies and three collections:
//! "My List", "My List 2" and "Liked Companies", each holding a prefix of the
//! company ids.

use bulkops_core::{CollectionId, Result};

use crate::memory::MemoryStore;

/// Sizes of the seeded dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    /// Number of companies created
    pub companies: usize,
    /// Members of "My List"
    pub my_list: usize,
    /// Members of "My List 2"
    pub my_list_2: usize,
    /// Members of "Liked Companies"
    pub liked: usize,
}

impl SeedPlan {
    /// The full-size demo: 100 000 companies, lists of 50 000, 1 000 and 10
    pub fn demo() -> Self {
        Self {
            companies: 100_000,
            my_list: 50_000,
            my_list_2: 1_000,
            liked: 10,
        }
    }

    /// Populate `store`
    ///
    /// Collection sizes are capped at the number of companies.
    pub fn apply(&self, store: &MemoryStore) -> Result<SeededCollections> {
        let ids = store.add_entities((0..self.companies).map(|i| format!("Company {}", i)));

        let fill = |name: &str, size: usize| -> Result<CollectionId> {
            let id = store.create_collection(name);
            store.associate(id, ids.iter().take(size).copied())?;
            Ok(id)
        };

        Ok(SeededCollections {
            my_list: fill("My List", self.my_list)?,
            my_list_2: fill("My List 2", self.my_list_2)?,
            liked: fill("Liked Companies", self.liked)?,
        })
    }
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self::demo()
    }
}

/// Ids of the seeded collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededCollections {
    /// "My List"
    pub my_list: CollectionId,
    /// "My List 2"
    pub my_list_2: CollectionId,
    /// "Liked Companies"
    pub liked: CollectionId,
}
