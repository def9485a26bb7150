// Label module
// Personal labels attached to tasks by name

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Label {
    /// Trimmed name, rejecting blanks and names already present in `existing`
    /// (compared case-insensitively).
    pub fn validate_name(name: &str, existing: &[Label]) -> Result<String, String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("Label name cannot be empty".to_string());
        }
        if existing
            .iter()
            .any(|label| label.name.eq_ignore_ascii_case(trimmed))
        {
            return Err(format!("Label '{}' already exists", trimmed));
        }
        Ok(trimmed.to_string())
    }
}
