//! Console Progress
//!
//! Renders [`PlanEvent`]s from a run: stage changes and log lines print as
//! they arrive, detail progress redraws a single bar line in place.

use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

use console::style;

use crate::plan::{PlanEvent, PlanObserver, PlanStage};

/// Observer that prints run progress to stdout
pub struct ConsoleObserver {
    started: Instant,
    quiet: bool,
    /// Whether the last write left a bar line without a newline
    bar_open: Mutex<bool>,
}

impl ConsoleObserver {
    pub fn new(quiet: bool) -> Self {
        Self {
            started: Instant::now(),
            quiet,
            bar_open: Mutex::new(false),
        }
    }

    /// Time since the observer was created, formatted for display
    pub fn elapsed(&self) -> String {
        format_duration(self.started.elapsed().as_secs())
    }

    fn print_line(&self, line: String) {
        let mut bar_open = self.bar_open.lock().unwrap_or_else(|p| p.into_inner());
        if *bar_open {
            println!();
            *bar_open = false;
        }
        println!("{}", line);
    }

    fn print_bar(&self, completed: usize, total: usize) {
        let mut bar_open = self.bar_open.lock().unwrap_or_else(|p| p.into_inner());
        print!(
            "\r\x1B[K  {} {}/{}",
            render_progress_bar(completed, total, 30),
            completed,
            total
        );
        if completed >= total {
            println!();
            *bar_open = false;
        } else {
            let _ = std::io::stdout().flush();
            *bar_open = true;
        }
    }
}

impl PlanObserver for ConsoleObserver {
    fn notify(&self, event: &PlanEvent) {
        if self.quiet {
            return;
        }
        match event {
            PlanEvent::Stage(stage) => {
                let marker = match stage {
                    PlanStage::Merged => style("✓").green(),
                    _ => style("▸").cyan(),
                };
                self.print_line(format!("{} {}", marker, style(stage.to_string()).bold()));
            }
            PlanEvent::Log(message) => {
                self.print_line(format!("  {}", style(message).dim()));
            }
            PlanEvent::DetailProgress(progress) => {
                self.print_bar(progress.completed, progress.total);
            }
        }
    }
}

/// Render a simple progress bar
fn render_progress_bar(completed: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return format!("[{}]", " ".repeat(width));
    }

    let progress = (completed as f32 / total as f32).min(1.0);
    let filled = (progress * width as f32) as usize;
    let empty = width.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format duration as human-readable string
fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Progress;

    #[test]
    fn test_progress_bar_render() {
        assert_eq!(render_progress_bar(0, 10, 10), "[░░░░░░░░░░]");
        assert_eq!(render_progress_bar(5, 10, 10), "[█████░░░░░]");
        assert_eq!(render_progress_bar(10, 10, 10), "[██████████]");
        assert_eq!(render_progress_bar(0, 0, 4), "[    ]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3700), "1h 1m");
    }

    #[test]
    fn test_bar_state_closes_on_completion() {
        let observer = ConsoleObserver::new(false);
        observer.notify(&PlanEvent::DetailProgress(Progress {
            completed: 1,
            total: 2,
        }));
        assert!(*observer.bar_open.lock().unwrap());

        observer.notify(&PlanEvent::DetailProgress(Progress {
            completed: 2,
            total: 2,
        }));
        assert!(!*observer.bar_open.lock().unwrap());
    }

    #[test]
    fn test_quiet_observer_prints_nothing() {
        let observer = ConsoleObserver::new(true);
        observer.notify(&PlanEvent::DetailProgress(Progress {
            completed: 1,
            total: 2,
        }));
        assert!(!*observer.bar_open.lock().unwrap());
    }
}
