use serde::{Deserialize, Serialize};

use crate::def::ParameterDef;
use crate::display::ParameterDisplay;
use crate::metadata::ParameterMetadata;
use crate::validation::ValidationRule;

/// Options specific to list parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Minimum number of items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    /// Maximum number of items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Label for the add button in the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_button_label: Option<String>,

    /// Whether items can be reordered by dragging.
    #[serde(default)]
    pub sortable: bool,
}

/// A repeatable list of items sharing the same template.
///
/// Use case: HTTP headers, email recipients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListParameter {
    #[serde(flatten)]
    pub metadata: ParameterMetadata,

    /// Shape of each item in the list (boxed to avoid infinite size).
    pub item_template: Box<ParameterDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ListOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<ParameterDisplay>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
}

impl ListParameter {
    /// Create a new list parameter. The item template is required.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        item_template: ParameterDef,
    ) -> Self {
        Self {
            metadata: ParameterMetadata::new(key, name),
            item_template: Box::new(item_template),
            default: None,
            options: None,
            display: None,
            validation: Vec::new(),
        }
    }
}
