use surveyor_core::{FileInventory, ModelProfile, TaskDefinition};

/// Generic survey roles used when no model-produced plan is available.
/// Names are stable; tests and progress output rely on them.
const FALLBACK_ROLES: [(&str, &str); 3] = [
    (
        "Structure Survey",
        "Map the directory layout, entry points, and how the modules fit together.",
    ),
    (
        "Dependency Survey",
        "Catalog external dependencies, build configuration, and how they are wired in.",
    ),
    (
        "Technology Profile",
        "Identify the languages, frameworks, and tooling in use across the codebase.",
    ),
];

/// Produces a plan of last resort: three generic roles that together cover
/// the whole inventory. Used when planning failed outright or its output
/// could not be salvaged.
pub struct FallbackPolicy;

impl FallbackPolicy {
    /// Distributes the inventory round-robin across the fixed roles. Every
    /// file lands in exactly one task. An empty inventory still yields all
    /// three roles, scoped to nothing but free to work from prior findings.
    pub fn tasks(inventory: &FileInventory, profile: &ModelProfile) -> Vec<TaskDefinition> {
        let mut buckets: Vec<Vec<String>> = vec![Vec::new(); FALLBACK_ROLES.len()];
        for (index, path) in inventory.paths().enumerate() {
            buckets[index % FALLBACK_ROLES.len()].push(path.to_string());
        }

        FALLBACK_ROLES
            .iter()
            .zip(buckets)
            .filter_map(|((name, responsibility), files)| {
                TaskDefinition::unscoped(*name, *responsibility, files, profile.clone()).ok()
            })
            .collect()
    }

    pub fn role_names() -> Vec<&'static str> {
        FALLBACK_ROLES.iter().map(|(name, _)| *name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use surveyor_core::FileMeta;

    fn inventory(count: usize) -> FileInventory {
        FileInventory::from_entries(
            (0..count)
                .map(|i| (format!("src/file_{i}.rs"), FileMeta { size: 10 }))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_role_names_are_stable() {
        assert_eq!(
            FallbackPolicy::role_names(),
            vec!["Structure Survey", "Dependency Survey", "Technology Profile"]
        );
    }

    #[test]
    fn test_every_file_assigned_exactly_once() {
        let inventory = inventory(10);
        let tasks = FallbackPolicy::tasks(&inventory, &ModelProfile::default());

        assert_eq!(tasks.len(), 3);

        let mut seen = HashSet::new();
        for task in &tasks {
            for file in &task.files {
                assert!(seen.insert(file.clone()), "{file} assigned twice");
                assert!(inventory.contains(file));
            }
        }
        assert_eq!(seen.len(), inventory.len());
    }

    #[test]
    fn test_distribution_is_balanced() {
        let tasks = FallbackPolicy::tasks(&inventory(9), &ModelProfile::default());

        for task in &tasks {
            assert_eq!(task.files.len(), 3);
        }
    }

    #[test]
    fn test_empty_inventory_still_yields_all_roles() {
        let tasks = FallbackPolicy::tasks(&FileInventory::new(), &ModelProfile::default());

        assert_eq!(tasks.len(), 3);
        for task in &tasks {
            assert!(task.files.is_empty());
            assert!(!task.responsibility.is_empty());
        }
    }

    #[test]
    fn test_fewer_files_than_roles() {
        let tasks = FallbackPolicy::tasks(&inventory(2), &ModelProfile::default());

        assert_eq!(tasks.len(), 3);
        let total: usize = tasks.iter().map(|task| task.files.len()).sum();
        assert_eq!(total, 2);
    }
}
