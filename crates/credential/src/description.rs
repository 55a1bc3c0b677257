//! Static credential metadata a node declares against its `NodeMetadata`.

/// Describes a kind of credential a node accepts (e.g. "HTTP Basic Auth",
/// "AWS Access Key"). Purely descriptive, for building node-configuration
/// UIs and validating that a workflow-authored `credential_id` is used
/// where a compatible credential type is expected. Resolution itself goes
/// through [`crate::CredentialResolver`], keyed by that `credential_id` --
/// not by this description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDescription {
    key: String,
    name: String,
    description: String,
}

impl CredentialDescription {
    /// `key` is the stable identifier other configuration references this
    /// credential type by (e.g. `"httpBasicAuth"`).
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_constructed_fields() {
        let desc = CredentialDescription::new("httpBasicAuth", "HTTP Basic Auth", "username/password pair");
        assert_eq!(desc.key(), "httpBasicAuth");
        assert_eq!(desc.name(), "HTTP Basic Auth");
        assert_eq!(desc.description(), "username/password pair");
    }
}
