//! Aggregate root trait and optimistic concurrency primitives.

use crate::error::{DomainError, DomainResult};

/// Version assigned to every aggregate by its validating factory.
pub const INITIAL_VERSION: u64 = 1;

/// Aggregate root marker + minimal interface.
///
/// Catalog aggregates are state-based: they validate their own invariants in
/// their constructors and mutators, and are persisted as whole documents.
/// The version is owned by storage; domain code only reads it.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Optimistic concurrency token of the persisted state this instance was
    /// built from (starts at [`INITIAL_VERSION`]).
    fn version(&self) -> u64;
}

/// Version a writer expects the stored aggregate to be at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpectedVersion(pub u64);

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        self.0 == actual
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {}, actual: {actual})",
                self.0
            )))
        }
    }
}
