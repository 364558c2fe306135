use surveyor_core::{FileInventory, Phase, TaskDefinition};

/// Listing every path in a huge repository would blow the context window;
/// past this many we summarize the remainder as a count.
const MAX_LISTED_FILES: usize = 200;

/// Prompt templates for each phase. The instructions become the system
/// message; accumulated findings travel separately as the user message.
pub struct PhasePrompts;

impl PhasePrompts {
    pub fn role(phase: Phase) -> &'static str {
        match phase {
            Phase::Discovery => "Repository Scout",
            Phase::Planning => "Survey Planner",
            Phase::Analysis => "Code Analyst",
            Phase::Synthesis => "Architecture Writer",
            Phase::Consolidation => "Findings Editor",
            Phase::Report => "Report Author",
        }
    }

    /// System instructions for a sequential phase. The dynamic phase does
    /// not use this; its tasks carry their own instructions.
    pub fn instructions(phase: Phase, inventory: &FileInventory) -> String {
        match phase {
            Phase::Discovery => Self::discovery(inventory),
            Phase::Planning => Self::planning(inventory),
            Phase::Analysis => Self::analysis(),
            Phase::Synthesis => Self::synthesis(),
            Phase::Consolidation => Self::consolidation(),
            Phase::Report => Self::report(),
        }
    }

    /// System instructions for a single analysis task.
    pub fn task_instructions(task: &TaskDefinition) -> String {
        let files = if task.files.is_empty() {
            "(no specific files assigned; work from the findings so far)".to_string()
        } else {
            task.files
                .iter()
                .map(|path| format!("- {path}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"You are "{name}", one analyst on a team surveying a codebase.

Your responsibility: {responsibility}

Focus on these files:
{files}

Report your findings in Markdown. Describe the purpose, structure, and notable
patterns of your assigned area. Call out anything surprising or fragile. Stay
within your responsibility; other analysts cover the rest of the codebase."#,
            name = task.name,
            responsibility = task.responsibility,
        )
    }

    fn discovery(inventory: &FileInventory) -> String {
        format!(
            r#"You are a repository scout performing the first pass over an unfamiliar
codebase. Below is the complete file inventory.

{inventory}

Produce a short orientation in Markdown:
- What kind of project this appears to be (application, library, service, ...)
- Languages and notable frameworks in use
- The top-level layout and what each major directory is for
- Where the entry points likely are

Be concrete and cite paths from the inventory. Do not speculate beyond what
the file listing supports."#,
            inventory = format_inventory(inventory),
        )
    }

    fn planning(inventory: &FileInventory) -> String {
        format!(
            r#"You are planning a parallel survey of a codebase. Prior findings are in
the conversation. The file inventory is:

{inventory}

Divide the codebase among three to six analysis agents. Every agent gets a
descriptive name, a single-sentence responsibility, and the files it should
examine. Only use paths that appear in the inventory above.

Respond with one block per agent, in exactly this format:

### Agent: <descriptive name>
Responsibility: <one sentence>
Files:
- <path>
- <path>

Do not add commentary outside the blocks."#,
            inventory = format_inventory(inventory),
        )
    }

    fn analysis() -> String {
        "You are a code analyst. Examine your assigned files and report findings \
         in Markdown."
            .to_string()
    }

    fn synthesis() -> String {
        r#"You are an architecture writer. The conversation contains findings from a
team of analysts who each examined part of a codebase.

Weave their findings into a coherent architectural overview in Markdown:
- How the major components relate to each other
- The main data and control flows
- Cross-cutting concerns (configuration, errors, logging, persistence)

Resolve overlaps between analysts; do not simply concatenate their reports."#
            .to_string()
    }

    fn consolidation() -> String {
        r#"You are editing the findings of a codebase survey. The conversation contains
everything gathered so far.

Tighten it into a consistent whole:
- Remove duplicated observations
- Reconcile contradictions, noting which reading the evidence favors
- Normalize terminology and file path references

Return the consolidated findings in Markdown. Preserve all substantive
content; cut only redundancy."#
            .to_string()
    }

    fn report() -> String {
        r#"You are writing the final survey report for a codebase. The conversation
contains the consolidated findings.

Produce a complete Markdown document with these sections:
1. Overview - what the project is and does
2. Architecture - components and how they interact
3. Key Areas - a walkthrough of each significant part
4. Observations - risks, rough edges, and opportunities

Write for an engineer joining the project tomorrow. Be specific, cite file
paths, and keep the prose tight."#
            .to_string()
    }
}

fn format_inventory(inventory: &FileInventory) -> String {
    if inventory.is_empty() {
        return "(the inventory is empty)".to_string();
    }

    let mut lines: Vec<String> = inventory
        .paths()
        .take(MAX_LISTED_FILES)
        .map(|path| format!("- {path}"))
        .collect();

    let remaining = inventory.len().saturating_sub(MAX_LISTED_FILES);
    if remaining > 0 {
        lines.push(format!("(and {remaining} more)"));
    }

    lines.join("\n")
}
