//! Declared collections and the schema-version history that creates them.

use std::collections::HashSet;

use super::Collection;
use crate::errors::{DatabaseError, Result};

/// Schema version this build writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// One schema upgrade: the collections it introduces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub version: u32,
    pub description: &'static str,
    pub collections: &'static [Collection],
}

const DEFAULT_STEPS: [MigrationStep; 3] = [
    MigrationStep {
        version: 1,
        description: "wallets, categories, transactions, budgets and gold tracking",
        collections: &[
            Collection::Wallets,
            Collection::Categories,
            Collection::Transactions,
            Collection::Budgets,
            Collection::GoldWallets,
            Collection::GoldTransactions,
            Collection::CurrentGoldPrice,
        ],
    },
    MigrationStep {
        version: 2,
        description: "savings goals, bill reminders and liabilities",
        collections: &[
            Collection::SavingsGoals,
            Collection::SavingsTransactions,
            Collection::BillReminders,
            Collection::Liabilities,
            Collection::LiabilityPayments,
        ],
    },
    MigrationStep {
        version: 3,
        description: "calendar schedules and user profile",
        collections: &[Collection::Schedules, Collection::UserProfile],
    },
];

/// Ordered list of schema upgrades.
///
/// Versions start at 1 and increase by one per step; every collection is
/// introduced by exactly one step.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    steps: Vec<MigrationStep>,
}

impl SchemaRegistry {
    pub fn new(steps: Vec<MigrationStep>) -> Result<Self> {
        let mut introduced = HashSet::new();
        for (index, step) in steps.iter().enumerate() {
            let expected = index as u32 + 1;
            if step.version != expected {
                return Err(DatabaseError::MigrationFailed(format!(
                    "migration step {} found where version {} was expected",
                    step.version, expected
                ))
                .into());
            }
            for collection in step.collections {
                if !introduced.insert(*collection) {
                    return Err(DatabaseError::MigrationFailed(format!(
                        "collection '{}' is introduced twice (again at version {})",
                        collection, step.version
                    ))
                    .into());
                }
            }
        }
        Ok(SchemaRegistry { steps })
    }

    pub fn current_version(&self) -> u32 {
        self.steps.last().map(|s| s.version).unwrap_or(0)
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Steps still to apply to a store at `stored_version`.
    ///
    /// A store written by a newer schema is refused rather than downgraded.
    pub fn pending_steps(&self, stored_version: u32) -> Result<&[MigrationStep]> {
        let current = self.current_version();
        if stored_version > current {
            return Err(DatabaseError::MigrationFailed(format!(
                "on-disk schema version {} is newer than supported version {}",
                stored_version, current
            ))
            .into());
        }
        Ok(&self.steps[stored_version as usize..])
    }

    /// Every declared collection, in declaration order.
    pub fn collections(&self) -> impl Iterator<Item = Collection> + '_ {
        self.steps.iter().flat_map(|s| s.collections.iter().copied())
    }

    /// The version at which `collection` was introduced.
    pub fn introduced_in(&self, collection: Collection) -> Option<u32> {
        self.steps
            .iter()
            .find(|s| s.collections.contains(&collection))
            .map(|s| s.version)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry {
            steps: DEFAULT_STEPS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_declares_every_collection() {
        let registry = SchemaRegistry::default();
        assert_eq!(registry.current_version(), CURRENT_SCHEMA_VERSION);

        let declared: HashSet<_> = registry.collections().collect();
        assert_eq!(declared.len(), Collection::ALL.len());
        for collection in Collection::ALL {
            assert!(declared.contains(&collection), "{} missing", collection);
        }
    }

    #[test]
    fn test_default_steps_are_valid() {
        assert!(SchemaRegistry::new(DEFAULT_STEPS.to_vec()).is_ok());
    }

    #[test]
    fn test_pending_steps() {
        let registry = SchemaRegistry::default();
        assert_eq!(registry.pending_steps(0).unwrap().len(), 3);
        assert_eq!(registry.pending_steps(1).unwrap()[0].version, 2);
        assert!(registry.pending_steps(3).unwrap().is_empty());
        assert!(registry.pending_steps(4).is_err());
    }

    #[test]
    fn test_introduced_in() {
        let registry = SchemaRegistry::default();
        assert_eq!(registry.introduced_in(Collection::Wallets), Some(1));
        assert_eq!(registry.introduced_in(Collection::Liabilities), Some(2));
        assert_eq!(registry.introduced_in(Collection::Schedules), Some(3));
    }

    #[test]
    fn test_rejects_version_gap() {
        let steps = vec![
            MigrationStep {
                version: 1,
                description: "first",
                collections: &[Collection::Wallets],
            },
            MigrationStep {
                version: 3,
                description: "skips two",
                collections: &[Collection::Categories],
            },
        ];
        assert!(SchemaRegistry::new(steps).is_err());
    }

    #[test]
    fn test_rejects_collection_introduced_twice() {
        let steps = vec![
            MigrationStep {
                version: 1,
                description: "first",
                collections: &[Collection::Wallets],
            },
            MigrationStep {
                version: 2,
                description: "again",
                collections: &[Collection::Wallets],
            },
        ];
        assert!(SchemaRegistry::new(steps).is_err());
    }
}
