//! Constructors for new trees, groups and conditions.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::{CriteriaCondition, CriteriaGroup, CriteriaOperator, CriteriaTree, CriteriaType};

/// Source of process-unique identifiers for groups and conditions.
pub trait IdGenerator: Send + Sync {
    fn unique_id(&self, prefix: &str) -> String;
}

/// Hands out `"{prefix}-{n}"` ids from a shared counter.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn unique_id(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", prefix, n)
    }
}

pub fn create_criteria(criteria_type: CriteriaType, groups: Vec<CriteriaGroup>) -> CriteriaTree {
    CriteriaTree {
        criteria_type,
        operator: CriteriaOperator::And,
        groups: Some(groups),
    }
}

pub fn create_criteria_group<G: IdGenerator + ?Sized>(
    id_generator: &G,
    criteria: Vec<CriteriaCondition>,
) -> CriteriaGroup {
    CriteriaGroup {
        id: id_generator.unique_id("criteria-group"),
        operator: CriteriaOperator::And,
        criteria,
    }
}

pub fn create_criteria_condition<G: IdGenerator + ?Sized>(id_generator: &G) -> CriteriaCondition {
    CriteriaCondition::new(id_generator.unique_id("criteria"))
}
