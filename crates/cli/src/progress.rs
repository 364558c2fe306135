//! Live progress lines driven by the run's event stream.

use colored::Colorize;
use events::{Event, EventBus, EventEnvelope};
use surveyor_core::Phase;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Subscribe to `bus` and print a line per event until the run finishes.
pub fn spawn_printer(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    let done = matches!(envelope.event, Event::RunCompleted { .. });
                    print_event(&envelope);
                    if done {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_event(envelope: &EventEnvelope) {
    let total = Phase::SEQUENCE.len();

    match &envelope.event {
        Event::RunStarted {
            project,
            file_count,
        } => {
            println!(
                "{} surveying {} ({} files)",
                "▸".cyan(),
                project.bold(),
                file_count
            );
        }
        Event::PhaseStarted { phase, ordinal } => {
            println!("{} [{}/{}] {}", "◐".cyan(), ordinal, total, phase);
        }
        Event::PhaseCompleted {
            phase,
            ordinal,
            status,
        } => {
            let icon = match status.as_str() {
                "complete" => "●".green(),
                "degraded" => "◑".yellow(),
                _ => "○".red(),
            };
            println!("{} [{}/{}] {} ({})", icon, ordinal, total, phase, status);
        }
        Event::PlanResolved { source, task_count } => {
            println!("    plan: {} ({} tasks)", source, task_count);
        }
        Event::TaskStarted { task_name } => {
            println!("    {} {}", "→".dimmed(), task_name.dimmed());
        }
        Event::TaskCompleted {
            task_name,
            status,
            attempts,
        } => {
            let icon = if status == "succeeded" {
                "✓".green()
            } else {
                "✗".red()
            };
            if *attempts > 1 {
                println!("    {} {} ({} attempts)", icon, task_name, attempts);
            } else {
                println!("    {} {}", icon, task_name);
            }
        }
        Event::RunCompleted {
            status,
            warning_count,
        } => {
            let line = format!("survey {} ({} warnings)", status, warning_count);
            match status.as_str() {
                "complete" => println!("{} {}", "●".green(), line.green()),
                "degraded" => println!("{} {}", "◑".yellow(), line.yellow()),
                _ => println!("{} {}", "○".red(), line.red()),
            }
        }
    }
}
