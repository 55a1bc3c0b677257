//! Resource and credential scoping.

use serde::{Deserialize, Serialize};

use crate::id::{ExecutionId, OrganizationId, ProjectId, WorkflowId};

/// The lifecycle scope a resource, credential, or cached value is bound to.
///
/// Broader scopes outlive narrower ones: a `Global` resource is shared
/// across the whole process, while an `Execution` resource is torn down
/// when that execution completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ScopeLevel {
    /// Shared across the entire process. Singletons live here.
    Global,
    /// Scoped to a single organization/tenant.
    Organization(OrganizationId),
    /// Scoped to a single project.
    Project(ProjectId),
    /// Scoped to a single workflow definition.
    Workflow(WorkflowId),
    /// Scoped to a single execution; torn down on completion/archival.
    Execution(ExecutionId),
}

impl ScopeLevel {
    /// Returns `true` if this is the process-wide global scope.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Returns `true` if this scope is narrower than or equal to `other`.
    ///
    /// Ordering: `Execution < Workflow < Project < Organization < Global`.
    #[must_use]
    pub fn is_within(&self, other: &ScopeLevel) -> bool {
        self.rank() <= other.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Execution(_) => 0,
            Self::Workflow(_) => 1,
            Self::Project(_) => 2,
            Self::Organization(_) => 3,
            Self::Global => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_is_global() {
        assert!(ScopeLevel::Global.is_global());
        assert!(!ScopeLevel::Execution(ExecutionId::v4()).is_global());
    }

    #[test]
    fn execution_is_within_global() {
        let exec = ScopeLevel::Execution(ExecutionId::v4());
        assert!(exec.is_within(&ScopeLevel::Global));
        assert!(!ScopeLevel::Global.is_within(&exec));
    }

    #[test]
    fn equal_scopes_are_within_each_other() {
        assert!(ScopeLevel::Global.is_within(&ScopeLevel::Global));
    }

    #[test]
    fn serde_roundtrip() {
        let scope = ScopeLevel::Execution(ExecutionId::v4());
        let json = serde_json::to_string(&scope).unwrap();
        let back: ScopeLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(scope, back);
    }
}
