// Project module
// Remote projects that own tasks

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_inbox_project: bool,
}

impl Project {
    pub fn validate_name(name: &str) -> Result<String, String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("Project name cannot be empty".to_string());
        }
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Project;

    #[test]
    fn test_validate_name() {
        assert_eq!(Project::validate_name("  Home ").unwrap(), "Home");
        assert!(Project::validate_name(" ").is_err());
    }

    #[test]
    fn test_deserialize_minimal() {
        let project: Project = serde_json::from_str(r#"{"id":"p1","name":"Inbox"}"#).unwrap();
        assert_eq!(project.name, "Inbox");
        assert!(!project.is_inbox_project);
        assert!(project.color.is_none());
    }
}
