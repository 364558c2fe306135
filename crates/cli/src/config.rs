//! TOML configuration for survey runs.
//!
//! Every field has a default, so a surveyor.toml may set only the knobs
//! it cares about. Command-line flags override whatever the file says.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyorConfig {
    pub project: ProjectConfig,
    pub run: RunConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Name used in the report header. Defaults to the directory name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Upper bound on analysis tasks running at once.
    pub concurrency: usize,
    /// Seconds to wait for a single model call.
    pub task_timeout_secs: u64,
    /// Attempts per model call before giving up on it.
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Model identifier used for every phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// OpenRouter-compatible base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            task_timeout_secs: 120,
            max_attempts: 3,
        }
    }
}

impl SurveyorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SurveyorConfig::default();
        assert_eq!(config.run.concurrency, 4);
        assert_eq!(config.run.task_timeout_secs, 120);
        assert_eq!(config.run.max_attempts, 3);
        assert!(config.project.name.is_none());
        assert!(config.backend.model.is_none());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surveyor.toml");
        fs::write(&path, "[run]\nconcurrency = 8\n").unwrap();

        let config = SurveyorConfig::load(&path).unwrap();

        assert_eq!(config.run.concurrency, 8);
        assert_eq!(config.run.task_timeout_secs, 120);
        assert!(config.backend.base_url.is_none());
    }

    #[test]
    fn test_full_file_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surveyor.toml");
        fs::write(
            &path,
            r#"
[project]
name = "billing-service"

[run]
concurrency = 2
task_timeout_secs = 30
max_attempts = 5

[backend]
model = "anthropic/claude-3.5-sonnet"
base_url = "http://localhost:8080/v1"
"#,
        )
        .unwrap();

        let config = SurveyorConfig::load(&path).unwrap();

        assert_eq!(config.project.name.as_deref(), Some("billing-service"));
        assert_eq!(config.run.concurrency, 2);
        assert_eq!(config.run.max_attempts, 5);
        assert_eq!(
            config.backend.model.as_deref(),
            Some("anthropic/claude-3.5-sonnet")
        );
        assert_eq!(
            config.backend.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surveyor.toml");

        let config = SurveyorConfig::load_or_default(&path).unwrap();

        assert_eq!(config.run.concurrency, 4);
    }

    #[test]
    fn test_roundtrips_through_toml() {
        let mut config = SurveyorConfig::default();
        config.project.name = Some("demo".to_string());
        config.backend.model = Some("openai/gpt-4o-mini".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: SurveyorConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.project.name.as_deref(), Some("demo"));
        assert_eq!(parsed.backend.model.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(parsed.run.concurrency, config.run.concurrency);
    }
}
