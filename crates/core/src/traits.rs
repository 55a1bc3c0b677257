//! Shared base traits implemented across Nebula entity types.

use crate::scope::ScopeLevel;

/// A type that carries an identity of type `Id`.
pub trait Identifiable {
    /// The identifier type.
    type Id;

    /// Returns this entity's identifier.
    fn id(&self) -> Self::Id;
}

/// A type bound to a [`ScopeLevel`].
pub trait Scoped {
    /// Returns the scope this value is bound to.
    fn scope(&self) -> ScopeLevel;
}

/// A type that carries request-scoped contextual fields (user, tenant,
/// correlation id) without itself being the context.
pub trait HasContext {
    /// Returns the acting user id, if any.
    fn user_id(&self) -> Option<crate::id::UserId>;

    /// Returns the tenant/organization id, if any.
    fn tenant_id(&self) -> Option<crate::id::OrganizationId>;
}

/// Semantic version of an interface contract (config schema, wire
/// format) independent of crate/package versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct InterfaceVersion {
    /// Major version; bumped on breaking changes.
    pub major: u32,
    /// Minor version; bumped on additive changes.
    pub minor: u32,
}

impl InterfaceVersion {
    /// The initial interface version, `1.0`.
    pub const INITIAL: Self = Self { major: 1, minor: 0 };

    /// Construct a new interface version.
    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns `true` if `other` is backward compatible with `self`
    /// (same major version, minor version no lower).
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && other.minor >= self.minor
    }
}

impl std::fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
