use serde::{Deserialize, Serialize};

use crate::domain::profile::ModelProfile;
use crate::error::CoreError;

/// A validated unit of planned work for the dynamic phase.
///
/// Definitions only come out of the plan parser or the fallback policy, and
/// both construct them through the checked constructors here, so downstream
/// code never sees an empty name or responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub responsibility: String,
    pub files: Vec<String>,
    pub profile: ModelProfile,
}

impl TaskDefinition {
    /// Build a definition with a non-empty file scope.
    pub fn new(
        name: impl Into<String>,
        responsibility: impl Into<String>,
        files: Vec<String>,
        profile: ModelProfile,
    ) -> Result<Self, CoreError> {
        let definition = Self::unscoped(name, responsibility, files, profile)?;
        if definition.files.is_empty() {
            return Err(CoreError::Validation(format!(
                "task '{}' has no files assigned",
                definition.name
            )));
        }
        Ok(definition)
    }

    /// Build a definition whose file scope may be empty.
    ///
    /// Only the fallback roles use this; their buckets are legitimately
    /// empty when the scanned inventory itself has no files to distribute.
    pub fn unscoped(
        name: impl Into<String>,
        responsibility: impl Into<String>,
        files: Vec<String>,
        profile: ModelProfile,
    ) -> Result<Self, CoreError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CoreError::Validation("task name is empty".to_string()));
        }
        let responsibility = responsibility.into().trim().to_string();
        if responsibility.is_empty() {
            return Err(CoreError::Validation(format!(
                "task '{name}' has no responsibility"
            )));
        }
        Ok(Self {
            name,
            responsibility,
            files,
            profile,
        })
    }
}

/// How the dynamic phase's task set was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Parsed,
    Fallback,
}

impl PlanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Fallback => "fallback",
        }
    }
}

/// The task set the dynamic phase will execute. Never empty: when parsing
/// yields nothing usable the fallback roles fill it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub source: PlanSource,
    pub tasks: Vec<TaskDefinition>,
}

impl PlanOutcome {
    pub fn parsed(tasks: Vec<TaskDefinition>) -> Self {
        Self {
            source: PlanSource::Parsed,
            tasks,
        }
    }

    pub fn fallback(tasks: Vec<TaskDefinition>) -> Self {
        Self {
            source: PlanSource::Fallback,
            tasks,
        }
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_fields() {
        let profile = ModelProfile::default();

        assert!(TaskDefinition::new("", "scan things", vec!["a.rs".into()], profile.clone()).is_err());
        assert!(TaskDefinition::new("Scanner", "  ", vec!["a.rs".into()], profile.clone()).is_err());
        assert!(TaskDefinition::new("Scanner", "scan things", vec![], profile).is_err());
    }

    #[test]
    fn test_new_trims_whitespace() {
        let task = TaskDefinition::new(
            "  Scanner  ",
            " scan things ",
            vec!["a.rs".to_string()],
            ModelProfile::default(),
        )
        .unwrap();

        assert_eq!(task.name, "Scanner");
        assert_eq!(task.responsibility, "scan things");
    }

    #[test]
    fn test_unscoped_allows_empty_files() {
        let task = TaskDefinition::unscoped(
            "Structure Survey",
            "map the layout",
            vec![],
            ModelProfile::default(),
        )
        .unwrap();

        assert!(task.files.is_empty());
        assert!(
            TaskDefinition::unscoped("", "map the layout", vec![], ModelProfile::default())
                .is_err()
        );
    }

    #[test]
    fn test_plan_outcome_task_names() {
        let profile = ModelProfile::default();
        let outcome = PlanOutcome::parsed(vec![
            TaskDefinition::new("A", "first", vec!["a.rs".into()], profile.clone()).unwrap(),
            TaskDefinition::new("B", "second", vec!["b.rs".into()], profile).unwrap(),
        ]);

        assert_eq!(outcome.source, PlanSource::Parsed);
        assert_eq!(outcome.task_names(), vec!["A", "B"]);
    }
}
