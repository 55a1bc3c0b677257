use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to every parameter definition.
///
/// This is the human-facing information: labels, hints, placeholders.
/// It is separate from the parameter's type and value semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    /// Unique key identifying this parameter within its parent scope.
    pub key: String,

    /// Human-readable display name.
    pub name: String,

    /// Longer description shown as tooltip or help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the user must provide a value.
    #[serde(default)]
    pub required: bool,

    /// Placeholder text shown in empty input fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Short contextual hint displayed near the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Whether the value should be masked in the UI and logs.
    #[serde(default)]
    pub sensitive: bool,
}

impl ParameterMetadata {
    /// Create metadata with the required key and display name.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}
