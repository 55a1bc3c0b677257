//! Common multi-tenancy and identity/access-management types.

use serde::{Deserialize, Serialize};

/// The kind of project a [`crate::id::ProjectId`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    /// A personal, single-owner project.
    Personal,
    /// A project shared within an organization/team.
    Team,
    /// A system-managed project used for internal workflows.
    System,
}

/// The scope at which a [`crate::id::RoleId`] grants its permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Applies across the whole organization.
    Organization,
    /// Applies to a single project.
    Project,
    /// Applies to a single workflow.
    Workflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_type_serde_roundtrip() {
        let json = serde_json::to_string(&ProjectType::Team).unwrap();
        assert_eq!(json, "\"team\"");
        let back: ProjectType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProjectType::Team);
    }

    #[test]
    fn role_scope_serde_roundtrip() {
        let json = serde_json::to_string(&RoleScope::Project).unwrap();
        let back: RoleScope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RoleScope::Project);
    }
}
