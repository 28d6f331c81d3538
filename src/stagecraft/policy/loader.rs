// SPDX-License-Identifier: MIT

//! Policy loader - YAML/JSON file loading and parsing

use super::builtin::builtin;
use super::types::PolicyRegistry;
use crate::kit::error::StageError;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Loads policy registries from YAML or JSON files
pub struct PolicyLoader;

impl PolicyLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a registry from a file, choosing the format by extension
    /// (`.json` is JSON, anything else is YAML)
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<PolicyRegistry, StageError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let registry = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::parse_json(&content)?,
            _ => Self::parse_yaml(&content)?,
        };
        log::info!(
            "Loaded policy from {}: {} tags, {} components, {} templates",
            path.display(),
            registry.tags.len(),
            registry.components.len(),
            registry.templates.len()
        );
        Ok(registry)
    }

    /// Load from `path` when given, otherwise clone the builtin registry
    pub fn load_or_builtin<P: AsRef<Path>>(
        &self,
        path: Option<P>,
    ) -> Result<Arc<PolicyRegistry>, StageError> {
        match path {
            Some(path) => Ok(Arc::new(self.load(path)?)),
            None => Ok(Arc::new(builtin().clone())),
        }
    }

    pub fn parse_yaml(content: &str) -> Result<PolicyRegistry, StageError> {
        let registry: PolicyRegistry = serde_yaml::from_str(content)?;
        registry.check_references()?;
        Ok(registry)
    }

    pub fn parse_json(content: &str) -> Result<PolicyRegistry, StageError> {
        let registry: PolicyRegistry = serde_json::from_str(content)?;
        registry.check_references()?;
        Ok(registry)
    }
}

impl Default for PolicyLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::error::PolicyError;
    use std::io::Write;

    #[test]
    fn test_parse_yaml_policy() {
        let yaml = r#"
styles:
  allow: [width]
  deny: [position]
tags:
  div:
    styleGroups:
      spacing: [margin]
"#;
        let registry = PolicyLoader::parse_yaml(yaml).unwrap();
        assert_eq!(registry.styles.deny, vec!["position"]);
        assert!(registry.tag("div").is_some());
        assert!(registry.components.is_empty());
    }

    #[test]
    fn test_parse_json_policy() {
        let json = r#"{"tags": {"img": {"attributes": ["src"]}}}"#;
        let registry = PolicyLoader::parse_json(json).unwrap();
        let img = registry.tag("img").unwrap();
        assert!(img.allows_attribute("src"));
        assert!(!img.allows_attribute("onerror"));
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let yaml = r#"
tags:
  - not a map
"#;
        let result = PolicyLoader::parse_yaml(yaml);
        assert!(matches!(result, Err(StageError::Yaml(_))));
    }

    #[test]
    fn test_dangling_tag_is_policy_error() {
        let yaml = r#"
tags:
  div: {}
components:
  Video:
    tags: [video]
"#;
        let result = PolicyLoader::parse_yaml(yaml);
        assert!(matches!(
            result,
            Err(StageError::Policy(PolicyError::UnknownTag { ref tag, .. })) if tag == "video"
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("stagecraft-policy-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("policy.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{"styles": {"allow": ["color"]}}"#).unwrap();

        let registry = PolicyLoader::new().load(&path).unwrap();
        assert_eq!(registry.styles.allow, vec!["color"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PolicyLoader::new().load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(StageError::Io(_))));
    }

    #[test]
    fn test_builtin_when_no_path() {
        let registry = PolicyLoader::new()
            .load_or_builtin(None::<&str>)
            .unwrap();
        assert_eq!(registry.as_ref(), builtin());
    }
}
