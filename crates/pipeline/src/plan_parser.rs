//! Plan parser for extracting analysis tasks from planning output
//!
//! Parses the planning phase's markdown into validated task definitions.
//! Tolerant of format drift: header levels, `Agent`/`Task` labels, optional
//! numbering, bold field labels, and `-`/`*` bullets all work. Anything that
//! cannot be salvaged is dropped with a warning, and when nothing survives
//! the generic fallback roles take over. Parsing never fails the run.

use std::collections::HashSet;

use regex::Regex;
use tracing::{debug, info, warn};

use surveyor_core::{FileInventory, ModelProfile, PlanOutcome, TaskDefinition};

use crate::fallback::FallbackPolicy;

/// Parse planning output into the task set for the dynamic phase.
///
/// Validation applied to each block, in order:
/// - a responsibility line must be present
/// - listed files not in the inventory are dropped
/// - a task left with no files is dropped
/// - of tasks sharing a name, the first usable one wins
pub fn parse_plan(text: &str, inventory: &FileInventory, profile: &ModelProfile) -> PlanOutcome {
    let mut tasks: Vec<TaskDefinition> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for block in extract_task_blocks(text) {
        if block.name.is_empty() {
            warn!("dropping task block with an empty name");
            continue;
        }

        let Some(responsibility) = extract_responsibility(&block.body) else {
            warn!(task = %block.name, "dropping task without a responsibility line");
            continue;
        };

        let listed = extract_files(&block.body);
        let (known, unknown): (Vec<String>, Vec<String>) = listed
            .into_iter()
            .partition(|path| inventory.contains(path));
        if !unknown.is_empty() {
            warn!(
                task = %block.name,
                dropped = unknown.len(),
                "dropping listed files not present in the inventory"
            );
        }
        if known.is_empty() {
            warn!(task = %block.name, "dropping task with no verifiable files");
            continue;
        }

        if !seen.insert(block.name.clone()) {
            warn!(task = %block.name, "dropping duplicate task name; keeping the first");
            continue;
        }

        match TaskDefinition::new(block.name, responsibility, known, profile.clone()) {
            Ok(task) => tasks.push(task),
            Err(err) => warn!(error = %err, "dropping malformed task block"),
        }
    }

    if tasks.is_empty() {
        info!("plan yielded no usable tasks; falling back to generic survey roles");
        return PlanOutcome::fallback(FallbackPolicy::tasks(inventory, profile));
    }

    debug!(count = tasks.len(), "parsed analysis plan");
    PlanOutcome::parsed(tasks)
}

struct TaskBlock {
    name: String,
    body: String,
}

/// Slice the text into one block per task header. A block runs from the end
/// of its header line to the start of the next header (or end of text).
fn extract_task_blocks(text: &str) -> Vec<TaskBlock> {
    let header_pattern = Regex::new(r"(?m)^#{2,3}\s*(?:Agent|Task)(?:\s+\d+)?\s*[:\-–]\s*(.+)$")
        .expect("Invalid task header regex pattern");

    let captures: Vec<_> = header_pattern.captures_iter(text).collect();
    if captures.is_empty() {
        return Vec::new();
    }

    let spans: Vec<(usize, usize)> = header_pattern
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut blocks = Vec::new();
    for (i, caps) in captures.iter().enumerate() {
        let name = caps
            .get(1)
            .map(|m| clean_fragment(m.as_str()))
            .unwrap_or_default();

        let body_start = spans[i].1;
        let body_end = spans.get(i + 1).map(|span| span.0).unwrap_or(text.len());

        blocks.push(TaskBlock {
            name,
            body: text[body_start..body_end].to_string(),
        });
    }

    blocks
}

fn extract_responsibility(block: &str) -> Option<String> {
    let pattern = Regex::new(r"(?mi)^[ \t]*\*{0,2}Responsibility\s*\*{0,2}\s*[:\-]\s*(.+)$")
        .expect("Invalid responsibility regex pattern");

    let caps = pattern.captures(block)?;
    let value = clean_fragment(caps.get(1)?.as_str());
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Collect the bullet run following a `Files:` marker. Bullets may use `-`
/// or `*` and paths may be wrapped in backticks.
fn extract_files(block: &str) -> Vec<String> {
    let pattern = Regex::new(
        r"(?mi)^[ \t]*\*{0,2}Files\*{0,2}[ \t]*:?[ \t]*\*{0,2}[ \t]*\n((?:[ \t]*[-*][ \t]*.+\n?)+)",
    )
    .expect("Invalid files regex pattern");

    let mut files = Vec::new();
    if let Some(caps) = pattern.captures(block) {
        if let Some(list) = caps.get(1) {
            for line in list.as_str().lines() {
                let line = line.trim();
                let stripped = line
                    .strip_prefix('-')
                    .or_else(|| line.strip_prefix('*'))
                    .unwrap_or(line);
                let path = stripped.trim().trim_matches('`').trim();
                if !path.is_empty() {
                    files.push(path.to_string());
                }
            }
        }
    }

    files
}

fn clean_fragment(raw: &str) -> String {
    raw.trim().trim_matches('*').trim_matches('`').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveyor_core::{FileMeta, PlanSource};

    fn inventory() -> FileInventory {
        FileInventory::from_entries(vec![
            ("src/main.rs".to_string(), FileMeta { size: 100 }),
            ("src/parser.rs".to_string(), FileMeta { size: 200 }),
            ("src/scheduler.rs".to_string(), FileMeta { size: 300 }),
            ("Cargo.toml".to_string(), FileMeta { size: 50 }),
        ])
    }

    #[test]
    fn test_parse_well_formed_plan() {
        let plan = r#"
Here is the survey plan.

### Agent: Parser Survey
Responsibility: Explain how input text becomes task definitions.
Files:
- src/parser.rs
- src/main.rs

### Agent: Scheduler Survey
Responsibility: Describe the concurrent execution path.
Files:
- src/scheduler.rs
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Parsed);
        assert_eq!(outcome.task_names(), vec!["Parser Survey", "Scheduler Survey"]);
        assert_eq!(
            outcome.tasks[0].responsibility,
            "Explain how input text becomes task definitions."
        );
        assert_eq!(outcome.tasks[0].files, vec!["src/parser.rs", "src/main.rs"]);
    }

    #[test]
    fn test_task_and_numbered_headers() {
        let plan = r#"
## Task 1 - Build Files
Responsibility: Review the build configuration.
Files:
- Cargo.toml

## Task 2 - Entry Point
Responsibility: Review the binary entry point.
Files:
- src/main.rs
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Parsed);
        assert_eq!(outcome.task_names(), vec!["Build Files", "Entry Point"]);
    }

    #[test]
    fn test_bold_labels_and_backticked_bullets() {
        let plan = r#"
### Agent: **Core Survey**
**Responsibility:** Cover the core modules.
**Files:**
* `src/main.rs`
* `src/parser.rs`
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Parsed);
        assert_eq!(outcome.task_names(), vec!["Core Survey"]);
        assert_eq!(outcome.tasks[0].files, vec!["src/main.rs", "src/parser.rs"]);
    }

    #[test]
    fn test_unknown_files_are_dropped_but_task_survives() {
        let plan = r#"
### Agent: Mixed Survey
Responsibility: Cover a mix of real and invented paths.
Files:
- src/parser.rs
- src/imaginary.rs
- docs/missing.md
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Parsed);
        assert_eq!(outcome.tasks[0].files, vec!["src/parser.rs"]);
    }

    #[test]
    fn test_task_with_only_unknown_files_is_dropped() {
        let plan = r#"
### Agent: Ghost Survey
Responsibility: Cover files that do not exist.
Files:
- src/ghost.rs

### Agent: Real Survey
Responsibility: Cover the entry point.
Files:
- src/main.rs
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Parsed);
        assert_eq!(outcome.task_names(), vec!["Real Survey"]);
    }

    #[test]
    fn test_task_without_responsibility_is_dropped() {
        let plan = r#"
### Agent: Silent Survey
Files:
- src/main.rs

### Agent: Spoken Survey
Responsibility: Cover the parser.
Files:
- src/parser.rs
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.task_names(), vec!["Spoken Survey"]);
    }

    #[test]
    fn test_duplicate_names_keep_the_first() {
        let plan = r#"
### Agent: Scanner
Responsibility: Scan the parser.
Files:
- src/parser.rs

### Agent: Scanner
Responsibility: Scan the scheduler.
Files:
- src/scheduler.rs
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Parsed);
        assert_eq!(outcome.task_names(), vec!["Scanner"]);
        assert_eq!(outcome.tasks[0].responsibility, "Scan the parser.");
        assert_eq!(outcome.tasks[0].files, vec!["src/parser.rs"]);
    }

    #[test]
    fn test_unparseable_plan_falls_back() {
        let plan = "I'm sorry, I cannot produce a plan for this repository.";

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Fallback);
        assert_eq!(outcome.task_names(), FallbackPolicy::role_names());
    }

    #[test]
    fn test_empty_text_falls_back() {
        let outcome = parse_plan("", &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Fallback);
        assert_eq!(outcome.tasks.len(), 3);
    }

    #[test]
    fn test_all_blocks_unusable_falls_back() {
        let plan = r#"
### Agent: First
Files:
- src/main.rs

### Agent: Second
Responsibility: Cover nothing real.
Files:
- src/ghost.rs
"#;

        let outcome = parse_plan(plan, &inventory(), &ModelProfile::default());

        assert_eq!(outcome.source, PlanSource::Fallback);
        assert_eq!(outcome.task_names(), FallbackPolicy::role_names());
    }

    #[test]
    fn test_tasks_carry_the_given_profile() {
        let profile = ModelProfile::new("test/model").with_temperature(0.5);
        let plan = r#"
### Agent: Profiled
Responsibility: Check profile propagation.
Files:
- src/main.rs
"#;

        let outcome = parse_plan(plan, &inventory(), &profile);

        assert_eq!(outcome.tasks[0].profile, profile);
    }
}
